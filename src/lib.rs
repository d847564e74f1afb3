//! # resilient-fetch
//!
//! A single-shot HTTP fetcher for callers that poll remote resources (feeds,
//! pages, APIs) from unreliable hosts.
//!
//! ## Design Philosophy
//!
//! resilient-fetch is designed to be:
//! - **Predictable** - One job, one outcome value; nothing is thrown
//! - **Forgiving** - Scheme-less URLs work, and a GET survives a broken TLS
//!   setup by retrying once over plain HTTP
//! - **Cache-aware** - Redirects can be rejected so a moved resource shows up
//!   as stale instead of silently changing identity
//! - **Explainable** - Every job carries an ordered diagnostic log
//!
//! ## Quick Start
//!
//! ```no_run
//! use resilient_fetch::{FetchJob, Fetcher};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fetcher = Fetcher::new();
//!
//!     let outcome = fetcher
//!         .fetch(
//!             FetchJob::new("example.com/feed.xml")
//!                 .timeout(Duration::from_secs(20))
//!                 .reject_redirects(),
//!         )
//!         .await;
//!
//!     if let Some(fetched) = outcome.fetched() {
//!         println!("status {}: {}", fetched.status, outcome.preview());
//!     }
//!     println!("last modified: {:?}", outcome.modified);
//!     print!("{}", outcome.diagnostics);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Transport failure classification
pub mod classify;
/// Configuration types
pub mod config;
/// Hosting-runtime capabilities
pub mod environment;
/// Error types
pub mod error;
/// The fetch job state machine (decomposed into focused submodules)
pub mod fetcher;
/// URL normalization
pub mod normalize;
/// Redirect inspection
pub mod redirect;
/// HTTP transport abstraction and the reqwest implementation
pub mod transport;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{FetchConfig, Protocol, RedirectPolicy};
pub use error::{Error, Result, TransportError};
pub use fetcher::Fetcher;
pub use types::{
    ContextToken, Diagnostics, FetchJob, FetchOutcome, FetchRequest, FetchTarget, Fetched,
    RequestSpec,
};
