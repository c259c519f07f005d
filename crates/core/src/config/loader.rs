use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Plain environment variables honoured alongside the prefixed ones.
const PLAIN_ENV_KEYS: [(&str, &str); 4] = [
    ("HLS_OUTPUT_ROOT", "streams.output_root"),
    ("HLS_SERVER_URL", "streams.public_base_url"),
    ("PORT", "server.port"),
    ("DATABASE_PATH", "database.path"),
];

/// Environment providers, lowest priority first.
fn env_layers(figment: Figment) -> Figment {
    let plain = Env::raw()
        .only(&PLAIN_ENV_KEYS.map(|(var, _)| var))
        .map(|key| {
            let var = key.as_str().to_ascii_uppercase();
            PLAIN_ENV_KEYS
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, path)| path.to_string())
                .unwrap_or(var)
                .into()
        });

    figment
        .merge(plain)
        .merge(Env::prefixed("HLSRELAY_").split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path));

    env_layers(figment)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    env_layers(Figment::from(Serialized::defaults(Config::default())))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::path::PathBuf;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[streams]
public_base_url = "http://cams.local/hls/"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.streams.public_base_url, "http://cams.local/hls/");
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("[server]\nport = \"eighty\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file_with_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[server]
host = "127.0.0.1"
port = 3000

[streams]
output_root = "/from/file"
"#,
            )?;
            jail.set_env("HLSRELAY_SERVER__PORT", "4000");
            jail.set_env("HLSRELAY_STREAMS__READINESS__TIMEOUT_MS", "1500");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.server.host.to_string(), "127.0.0.1");
            assert_eq!(config.streams.output_root, PathBuf::from("/from/file"));
            assert_eq!(config.streams.readiness.timeout_ms, 1500);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_plain_env() {
        Jail::expect_with(|jail| {
            jail.set_env("HLS_OUTPUT_ROOT", "/srv/hls");
            jail.set_env("HLS_SERVER_URL", "http://cams.local:8000/hls/");
            jail.set_env("PORT", "8123");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.streams.output_root, PathBuf::from("/srv/hls"));
            assert_eq!(config.streams.public_base_url, "http://cams.local:8000/hls/");
            assert_eq!(config.server.port, 8123);
            assert_eq!(config.streams.playlist_name, "index.m3u8");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_wins_over_plain_env() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "8123");
            jail.set_env("HLSRELAY_SERVER__PORT", "9123");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.server.port, 9123);
            Ok(())
        });
    }
}
