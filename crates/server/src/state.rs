use std::sync::Arc;

use hlsrelay_core::{Config, OverlayStore, SanitizedConfig, StreamManager};

/// Shared application state
pub struct AppState {
    config: Config,
    streams: Arc<StreamManager>,
    overlays: Arc<dyn OverlayStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        streams: Arc<StreamManager>,
        overlays: Arc<dyn OverlayStore>,
    ) -> Self {
        Self {
            config,
            streams,
            overlays,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn streams(&self) -> &StreamManager {
        self.streams.as_ref()
    }

    pub fn overlays(&self) -> &dyn OverlayStore {
        self.overlays.as_ref()
    }
}
