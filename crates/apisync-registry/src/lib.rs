#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod error;
mod service;

pub use crate::connect::{RegistryClient, RegistryConfig, TRACING_TARGET};
pub use crate::error::{Error, Result};
