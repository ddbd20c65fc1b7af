//! HTTP layer of RestSign: a hyper service that authenticates signed requests.
//!
//! This crate sits in front of an application handler and:
//!
//! - **Extracts** ([`request`]) a [`RequestSnapshot`](restsign_auth::RequestSnapshot)
//!   from the collected request, parsing urlencoded and multipart bodies
//!   ([`multipart`]).
//!
//! - **Enforces** ([`policy`]) signatures on the routes that require them and
//!   rejects failures with `416` ([`response`]).
//!
//! - **Audits** ([`audit`]) every request and response under a trace id
//!   ([`trace`]).
//!
//! - **Dispatches** ([`dispatch`]) authenticated requests to a
//!   [`SignedHandler`](dispatch::SignedHandler).
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> SignHttpService (hyper Service)
//!     -> Health check interception
//!     -> Trace id (hici header or fresh UUID)
//!     -> Body collection
//!     -> Snapshot + canonical string (skipped when unsigned and unaudited)
//!     -> Audit log (abbreviated canonical string, capped body)
//!     -> HMAC-SHA256 verification (hisv header) on enforced routes
//!     -> dispatch_request (SignedHandler trait)
//!     -> Common response headers (hici, Rest-Server) + response audit
//!   <- HTTP Response
//! ```
//!
//! # Wire contract
//!
//! The `http` crate lowercases header names, so the canonical string built
//! from a live request always carries lowercase names. A client sending
//! `X-Client: abc` must sign `x-client$abc$`, not `X-Client$abc$`:
//!
//! ```text
//! GET http://host/orders?status=open
//! X-Client: abc
//!
//! signed string: GET$http://host/orders?status=open$x-client$abc$
//! ```
//!
//! Header values, the URL and the raw query string are signed exactly as
//! sent.
//!
//! # Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use hyper::service::Service;
//! use restsign_http::{EchoHandler, SignHttpConfig, SignHttpService, SigningPolicy};
//!
//! let config = SignHttpConfig {
//!     policy: SigningPolicy::new(true),
//!     ..SignHttpConfig::default()
//! };
//! let service = SignHttpService::new(EchoHandler, config);
//!
//! # tokio_test::block_on(async {
//! let request = http::Request::get("http://host/orders")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//! let response = service.call(request).await.unwrap();
//! assert_eq!(response.status().as_u16(), 416);
//! # });
//! ```

pub mod audit;
pub mod body;
pub mod dispatch;
pub mod multipart;
pub mod policy;
pub mod request;
pub mod response;
pub mod service;
pub mod trace;

pub use body::SignResponseBody;
pub use dispatch::{EchoHandler, SignedHandler};
pub use policy::SigningPolicy;
pub use service::{SignHttpConfig, SignHttpService};
pub use trace::TraceContext;
