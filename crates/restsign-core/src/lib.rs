//! Core types, configuration, and errors for RestSign.
//!
//! This crate provides the building blocks shared by the signing core and the
//! HTTP layer: the process-wide [`RestSignConfig`], the [`SharedSecret`] used
//! for HMAC verification, per-request [`TraceId`]s, and the file
//! [`DigestAlgorithm`] selection.

mod config;
mod error;
mod types;

pub use config::RestSignConfig;
pub use error::{RestSignError, RestSignResult};
pub use types::{DigestAlgorithm, ParseDigestAlgorithmError, SharedSecret, TraceId};
