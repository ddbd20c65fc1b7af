//! Canonical request construction and HMAC signature verification for RestSign.
//!
//! This crate is the signing core. Given an immutable [`RequestSnapshot`] it
//! builds a deterministic canonical string, verifies the caller's HMAC-SHA256
//! signature against it, and produces a value-truncated shadow of the same
//! string that is safe to write to logs.
//!
//! # Overview
//!
//! The canonical string is built in three passes joined by a reserved
//! delimiter (`$` by default):
//!
//! ```text
//! METHOD$URL[?RAW_QUERY]$
//! header-name$value$value$...      (headers not excluded by the filter)
//! param-name$value$value$...       (sorted, minus raw-query params)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use restsign_auth::{Canonicalizer, RequestSnapshot, SignatureReason, verify};
//! use restsign_core::SharedSecret;
//!
//! let snapshot = RequestSnapshot::new("GET", "http://host/orders")
//!     .with_query("status=open")
//!     .with_header("X-Client", "abc");
//!
//! let canonical = Canonicalizer::default().canonicalize(&snapshot);
//! assert_eq!(canonical.sign_string, "GET$http://host/orders?status=open$X-Client$abc$");
//!
//! let secret = SharedSecret::from("k");
//! let result = verify(&canonical.sign_string, Some("wrong"), &secret);
//! assert_eq!(result.reason, SignatureReason::Mismatch);
//! ```
//!
//! # Modules
//!
//! - [`abbreviate`] - Value truncation for the logged canonical string
//! - [`canonical`] - Canonical string construction
//! - [`digest`] - Content digests replacing uploaded files
//! - [`error`] - Signing error taxonomy
//! - [`filter`] - Header exclusion rules
//! - [`signature`] - HMAC-SHA256 computation and verification
//! - [`snapshot`] - The request view consumed by the canonicalizer

pub mod abbreviate;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod filter;
pub mod signature;
pub mod snapshot;

pub use abbreviate::Abbreviation;
pub use canonical::{CanonicalPair, Canonicalizer};
pub use error::SignError;
pub use filter::HeaderFilter;
pub use signature::{SignatureReason, SignatureResult, compute_signature, sign_snapshot, verify};
pub use snapshot::RequestSnapshot;
