use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::stream::StreamsConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub streams: StreamsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Database configuration (overlay documents)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hlsrelay.db")
}

/// Config view for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub streams: SanitizedStreamsConfig,
    pub database: DatabaseConfig,
}

/// Stream settings without transcoder argument lists
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStreamsConfig {
    pub output_root: PathBuf,
    pub public_base_url: String,
    pub playlist_name: String,
    pub transcoder: String,
    pub segment_duration_secs: u32,
    pub playlist_size: u32,
    pub readiness_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub grace_period_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let streams = &config.streams;
        Self {
            server: config.server.clone(),
            streams: SanitizedStreamsConfig {
                output_root: streams.output_root.clone(),
                public_base_url: streams.public_base_url.clone(),
                playlist_name: streams.playlist_name.clone(),
                transcoder: streams.transcoder.binary.clone(),
                segment_duration_secs: streams.transcoder.segment_duration_secs,
                playlist_size: streams.transcoder.playlist_size,
                readiness_timeout_ms: streams.readiness.timeout_ms,
                poll_interval_ms: streams.readiness.poll_interval_ms,
                grace_period_ms: streams.shutdown.grace_period_ms,
            },
            database: config.database.clone(),
        }
    }
}
