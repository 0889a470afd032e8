//! Viewer configuration.

use std::time::Duration;

use dv_resolver::ResolverConfig;

/// Configuration for the [`Viewer`](crate::Viewer).
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Physical prefix under which documents are served.
    pub fetch_root: String,
    /// Version prefix used when the context carries no current version.
    pub production_version: String,
    /// Bound on waiting for the renderer's mount signal.
    pub mount_timeout: Duration,
    /// Pause after reconciliation before content is revealed.
    pub settle_delay: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fetch_root: "assets/docs".to_owned(),
            production_version: "stable".to_owned(),
            mount_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl ViewerConfig {
    /// The resolver view of this configuration.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            fetch_root: self.fetch_root.clone(),
            production_version: self.production_version.clone(),
        }
    }
}
