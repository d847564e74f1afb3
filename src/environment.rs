//! Hosting-runtime capabilities
//!
//! Some deployments hand the fetcher an execution-context token from their
//! hosting runtime. When a context can be derived from it, the runtime's own
//! transport is used instead of the standard one, and development instances
//! of that runtime may have to talk plain HTTP.
//!
//! Everything runtime-specific sits behind [`HostEnvironment`], so the fetch
//! logic runs the same with or without a hosting runtime.

use crate::transport::{ClientFactory, ReqwestClientFactory};
use crate::types::ContextToken;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;

/// Environment variable read by [`StandaloneEnvironment::from_env`]
pub const DEV_ENV_VAR: &str = "RESILIENT_FETCH_DEV";

/// A context derived from a [`ContextToken`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    /// The token the context was derived from
    pub token: ContextToken,
    /// Human-readable name of the runtime, recorded in diagnostics
    pub runtime: String,
}

/// Why no execution context could be derived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// There is no hosting runtime in this process
    #[error("no hosting runtime available")]
    NoRuntime,

    /// The runtime refused the token
    #[error("context derivation failed: {0}")]
    Failed(String),

    /// The runtime's derivation code panicked
    #[error("context derivation panicked: {0}")]
    Panicked(String),
}

/// Capabilities of the hosting runtime
pub trait HostEnvironment: Send + Sync {
    /// Derive an execution context from an opaque token
    fn derive_context(&self, token: &ContextToken) -> Result<ExecutionContext, ContextError>;

    /// Whether this is a development instance of the runtime
    fn is_dev_environment(&self) -> bool;

    /// Client factory for requests made within `context`
    fn client_factory(&self, context: &ExecutionContext) -> Arc<dyn ClientFactory>;
}

/// Derive a context, turning a panic inside the runtime into [`ContextError::Panicked`]
pub fn derive_context_guarded(
    environment: &dyn HostEnvironment,
    token: &ContextToken,
) -> Result<ExecutionContext, ContextError> {
    match catch_unwind(AssertUnwindSafe(|| environment.derive_context(token))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(ContextError::Panicked(message))
        }
    }
}

/// Environment of a plain process without hosting runtime
///
/// Context derivation always fails with [`ContextError::NoRuntime`], so the
/// standard client is used for every job.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandaloneEnvironment {
    dev: bool,
}

impl StandaloneEnvironment {
    /// Create a standalone environment
    pub fn new(dev: bool) -> Self {
        Self { dev }
    }

    /// Read the development flag from [`DEV_ENV_VAR`] ("1", "true" or "yes")
    pub fn from_env() -> Self {
        let dev = std::env::var(DEV_ENV_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { dev }
    }
}

impl HostEnvironment for StandaloneEnvironment {
    fn derive_context(&self, _token: &ContextToken) -> Result<ExecutionContext, ContextError> {
        Err(ContextError::NoRuntime)
    }

    fn is_dev_environment(&self) -> bool {
        self.dev
    }

    fn client_factory(&self, _context: &ExecutionContext) -> Arc<dyn ClientFactory> {
        Arc::new(ReqwestClientFactory::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct Panicking;

    impl HostEnvironment for Panicking {
        fn derive_context(&self, _token: &ContextToken) -> Result<ExecutionContext, ContextError> {
            panic!("not inside a request");
        }

        fn is_dev_environment(&self) -> bool {
            false
        }

        fn client_factory(&self, _context: &ExecutionContext) -> Arc<dyn ClientFactory> {
            Arc::new(ReqwestClientFactory::new())
        }
    }

    #[test]
    fn standalone_never_derives_a_context() {
        let env = StandaloneEnvironment::default();
        assert_eq!(
            env.derive_context(&ContextToken::new("abc")),
            Err(ContextError::NoRuntime)
        );
        assert!(!env.is_dev_environment());
    }

    #[test]
    fn guarded_derivation_contains_panics() {
        let result = derive_context_guarded(&Panicking, &ContextToken::new("abc"));
        assert_eq!(
            result,
            Err(ContextError::Panicked("not inside a request".to_string()))
        );
    }

    #[test]
    fn guarded_derivation_passes_errors_through() {
        let result = derive_context_guarded(&StandaloneEnvironment::new(true), &"t".into());
        assert_eq!(result, Err(ContextError::NoRuntime));
    }

    #[test]
    #[serial]
    fn dev_flag_from_environment() {
        // SAFETY: serialized with the other env-var tests
        unsafe { std::env::set_var(DEV_ENV_VAR, "true") };
        assert!(StandaloneEnvironment::from_env().is_dev_environment());

        unsafe { std::env::set_var(DEV_ENV_VAR, "0") };
        assert!(!StandaloneEnvironment::from_env().is_dev_environment());

        unsafe { std::env::remove_var(DEV_ENV_VAR) };
        assert!(!StandaloneEnvironment::from_env().is_dev_environment());
    }
}
