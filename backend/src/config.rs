//! Configuration loading for the student records server.
//!
//! Values come from (later sources override earlier):
//! 1. Defaults
//! 2. `students.toml` in the working directory, if present
//! 3. Environment variables prefixed with `STUDENTS_`
//! 4. `PORT`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "students.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub bind_address: IpAddr,
    /// JSON document holding the student list
    pub data_file: PathBuf,
    /// Directory served for static assets and uploaded images
    pub public_dir: PathBuf,
    /// Managed upload directory, normally inside `public_dir`
    pub upload_dir: PathBuf,
    /// Prefix of upload references, i.e. the upload directory's URL path
    /// relative to `public_dir`
    pub upload_url_prefix: String,
    pub orphan_sweep_interval_secs: u64,
    /// Unreferenced uploads younger than this are never swept
    pub orphan_min_age_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            data_file: PathBuf::from("students.json"),
            public_dir: PathBuf::from("public"),
            upload_dir: PathBuf::from("public").join("uploads"),
            upload_url_prefix: "uploads".to_string(),
            orphan_sweep_interval_secs: 60 * 60,
            orphan_min_age_secs: 24 * 60 * 60,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load configuration with a custom config file path.
    pub fn load_from(config_file: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("STUDENTS_"))
            .merge(Env::raw().only(&["PORT"]));

        Self::from_figment(&figment)
    }

    /// Extract and validate configuration from an assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration with every path rooted under `root`, using the
    /// default file layout
    pub fn with_data_root(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            data_file: root.join(&defaults.data_file),
            public_dir: root.join(&defaults.public_dir),
            upload_dir: root.join(&defaults.upload_dir),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation {
                message: "port must be greater than 0".to_string(),
            });
        }

        if self.orphan_sweep_interval_secs == 0 {
            return Err(ConfigError::Validation {
                message: "orphan_sweep_interval_secs must be greater than 0".to_string(),
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Validation {
                message: "max_upload_bytes must be greater than 0".to_string(),
            });
        }

        if self.upload_url_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation {
                message: "upload_url_prefix cannot be empty".to_string(),
            });
        }

        // The orphan sweep deletes anything in upload_dir that no student points at
        if without_cur_dir(&self.data_file).starts_with(without_cur_dir(&self.upload_dir)) {
            return Err(ConfigError::Validation {
                message: format!(
                    "data_file {} must not be inside upload_dir {}",
                    self.data_file.display(),
                    self.upload_dir.display()
                ),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    #[must_use]
    pub fn orphan_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.orphan_sweep_interval_secs)
    }

    #[must_use]
    pub fn orphan_min_age(&self) -> Duration {
        Duration::from_secs(self.orphan_min_age_secs)
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components().filter(|c| *c != Component::CurDir).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Figment {
        Figment::new().merge(Serialized::defaults(Config::default()))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_figment(&defaults()).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.data_file, PathBuf::from("students.json"));
        assert_eq!(config.upload_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.orphan_min_age(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.orphan_sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = defaults().merge(Toml::string(
            r#"
            port = 8081
            bind_address = "127.0.0.1"
            data_file = "/var/lib/students/students.json"
            orphan_min_age_secs = 60
            "#,
        ));
        let config = Config::from_figment(&figment).unwrap();

        assert_eq!(config.port, 8081);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8081");
        assert_eq!(config.data_file, PathBuf::from("/var/lib/students/students.json"));
        assert_eq!(config.orphan_min_age(), Duration::from_secs(60));
        assert_eq!(config.upload_url_prefix, "uploads");
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let figment = defaults().merge(Toml::string("port = 0"));
        let err = Config::from_figment(&figment).unwrap_err().to_string();
        assert!(err.contains("port"));

        let mut config = Config::default();
        config.orphan_sweep_interval_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("orphan_sweep_interval_secs"));

        let mut config = Config::default();
        config.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upload_url_prefix = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_data_file_inside_upload_dir() {
        let figment = defaults().merge(Toml::string(r#"data_file = "./public/uploads/students.json""#));
        let err = Config::from_figment(&figment).unwrap_err().to_string();
        assert!(err.contains("upload_dir"));

        let mut config = Config::default();
        config.data_file = PathBuf::from("public/uploads-data.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_value_is_load_error() {
        let figment = defaults().merge(Toml::string(r#"port = "not a port""#));
        assert!(matches!(Config::from_figment(&figment), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_with_data_root() {
        let config = Config::with_data_root(Path::new("/tmp/app"));
        assert_eq!(config.data_file, PathBuf::from("/tmp/app/students.json"));
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/app/public/uploads"));
        assert_eq!(config.port, 3000);
    }
}
