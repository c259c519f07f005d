pub mod config;
pub mod metrics;
pub mod overlay;
pub mod stream;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use overlay::{Overlay, OverlayError, OverlayStore, SqliteOverlayStore};
pub use stream::{
    JobRegistry, JobState, StartedStream, StreamError, StreamJob, StreamManager, StreamsConfig,
};
