// Service configuration - config/service.toml overlaid by PROFILER__* environment variables
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub elevation: ElevationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Largest KML document a KMZ upload may inflate to.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElevationSettings {
    #[serde(default = "default_elevation_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_document_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_elevation_url() -> String {
    "https://api.open-elevation.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    100
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_upload_bytes: default_max_upload_bytes(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl Default for ElevationSettings {
    fn default() -> Self {
        Self {
            base_url: default_elevation_url(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{}': {}", self.bind_address, e))
    }
}

impl ElevationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/service").required(false))
        .add_source(config::Environment::with_prefix("PROFILER").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> ServiceConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_config() {
        let config = from_toml(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"
            max_upload_bytes = 2048
            max_document_bytes = 65536

            [elevation]
            base_url = "http://elevation.internal"
            timeout_secs = 5
            batch_size = 25
            "#,
        );

        assert_eq!(config.server.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.server.max_upload_bytes, 2048);
        assert_eq!(config.server.max_document_bytes, 65536);
        assert_eq!(config.elevation.base_url, "http://elevation.internal");
        assert_eq!(config.elevation.timeout(), Duration::from_secs(5));
        assert_eq!(config.elevation.batch_size, 25);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = from_toml("[elevation]\nbatch_size = 10\n");

        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.max_document_bytes, 64 * 1024 * 1024);
        assert_eq!(config.elevation.batch_size, 10);
        assert_eq!(config.elevation.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_bind_address() {
        let settings = ServerSettings {
            bind_address: "not-an-address".to_string(),
            ..ServerSettings::default()
        };
        assert!(settings.socket_addr().is_err());
    }
}
