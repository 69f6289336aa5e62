//! Generated policy documents and the modes that produce them.

mod document;
mod mode;

pub use document::{PolicyDocument, STATUS_FIELD};
pub use mode::GenerationMode;
