//! On-disk layout of generated policies.

mod tree;

pub use tree::OutputTree;
pub(crate) use tree::STAGING_PATHSPEC;
