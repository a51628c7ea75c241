//! Producer configuration.

use crate::retry::RetryPolicy;

/// Access ID the gateway uses when validating a producer's configuration.
pub const DEFAULT_DRY_RUN_ACCESS_ID: &str = "p-custom";

/// Prefix of revocation IDs produced by a configuration dry run.
pub const DEFAULT_DRY_RUN_ID_PREFIX: &str = "tmp";

/// Configuration for the [`crate::Producer`].
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// The gateway access ID every request must be authenticated as.
    pub allowed_access_id: String,
    /// If set, the validation service also checks the issuing item's name.
    pub allowed_item_name: Option<String>,
    /// Create requests from this access ID are dry runs.
    pub dry_run_access_id: String,
    /// Revocation IDs with this prefix are dry runs.
    pub dry_run_id_prefix: String,
    /// Retry policy for each principal during revoke.
    pub revoke_retry: RetryPolicy,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            allowed_access_id: String::new(),
            allowed_item_name: None,
            dry_run_access_id: DEFAULT_DRY_RUN_ACCESS_ID.to_string(),
            dry_run_id_prefix: DEFAULT_DRY_RUN_ID_PREFIX.to_string(),
            revoke_retry: RetryPolicy::default(),
        }
    }
}

impl ProducerConfig {
    /// Configuration accepting requests from a single gateway access ID.
    pub fn new(allowed_access_id: impl Into<String>) -> Self {
        Self {
            allowed_access_id: allowed_access_id.into(),
            ..Self::default()
        }
    }

    pub fn with_allowed_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.allowed_item_name = Some(item_name.into());
        self
    }

    pub fn with_revoke_retry(mut self, retry: RetryPolicy) -> Self {
        self.revoke_retry = retry;
        self
    }

    /// Whether a revocation ID belongs to a dry run.
    pub fn is_dry_run_id(&self, id: &str) -> bool {
        id.starts_with(&self.dry_run_id_prefix)
    }
}
