//! Memoized formatter resolution.
//!
//! The first call resolves the configured [`FormatterRef`] against the registry
//! and publishes the outcome; later calls return the published outcome. A
//! failed resolution is cached too, so a misconfigured formatter fails every
//! call with the same error instead of being retried.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, warn};

use super::registry::{FormatterError, FormatterRef, FormatterRegistry};
use super::Formatter;

type Resolution = Result<Arc<dyn Formatter>, FormatterError>;

/// Resolves one formatter reference at most once per instance.
///
/// Concurrent first calls may each resolve; the first outcome published
/// through the `ArcSwapOption` wins and every caller returns it.
pub struct FormatterResolver {
    reference: FormatterRef,
    registry: Arc<FormatterRegistry>,
    resolved: ArcSwapOption<Resolution>,
}

impl FormatterResolver {
    #[must_use]
    pub fn new(reference: FormatterRef, registry: Arc<FormatterRegistry>) -> Self {
        Self {
            reference,
            registry,
            resolved: ArcSwapOption::empty(),
        }
    }

    /// Returns the resolved formatter.
    ///
    /// # Errors
    ///
    /// Returns the cached [`FormatterError`] if resolution failed.
    pub fn formatter(&self) -> Result<Arc<dyn Formatter>, FormatterError> {
        if let Some(resolution) = self.resolved.load_full() {
            return (*resolution).clone();
        }

        let candidate = Arc::new(self.registry.resolve(&self.reference));
        match &*candidate {
            Ok(_) => debug!(reference = ?self.reference, "formatter resolved"),
            Err(error) => warn!(reference = ?self.reference, %error, "formatter resolution failed"),
        }

        let previous = self
            .resolved
            .compare_and_swap(&None::<Arc<Resolution>>, Some(Arc::clone(&candidate)));
        let winner = match &*previous {
            Some(existing) => Arc::clone(existing),
            None => candidate,
        };
        (*winner).clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
