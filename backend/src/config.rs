use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "PREDICTOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/predictor.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tabular: TabularConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    pub enabled: bool,
    pub bind: String,
    pub model_path: PathBuf,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1:8000".into(),
            model_path: PathBuf::from("models/titanic.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    pub bind: String,
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
    pub log_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1:5000".into(),
            model_path: PathBuf::from("models/model_resnet18.safetensors"),
            meta_path: PathBuf::from("models/model_meta.json"),
            log_path: PathBuf::from("logs.csv"),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Loads the YAML config named by `PREDICTOR_CONFIG`, or the default
    /// path when unset. A missing default file falls back to built-in
    /// defaults; an explicitly named file must exist.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => {
                log::warn!(
                    "No config file at {}, using built-in defaults",
                    DEFAULT_CONFIG_PATH
                );
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(config_str)
    }

    /// Environment variables win over the file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("TABULAR_BIND") {
            self.tabular.bind = bind;
        }
        if let Some(path) = lookup("TABULAR_MODEL") {
            self.tabular.model_path = PathBuf::from(path);
        }
        if let Some(bind) = lookup("IMAGE_BIND") {
            self.image.bind = bind;
        }
        if let Some(path) = lookup("IMAGE_MODEL") {
            self.image.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("IMAGE_META") {
            self.image.meta_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PREDICTION_LOG") {
            self.image.log_path = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
image:
  bind: "0.0.0.0:9000"
  max_upload_bytes: 1024
"#,
        )
        .unwrap();

        assert_eq!(config.image.bind, "0.0.0.0:9000");
        assert_eq!(config.image.max_upload_bytes, 1024);
        assert_eq!(config.image.log_path, PathBuf::from("logs.csv"));
        assert!(config.tabular.enabled);
        assert_eq!(config.tabular.bind, "127.0.0.1:8000");
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = AppConfig::default();
        let env: HashMap<&str, &str> = [
            ("TABULAR_BIND", "0.0.0.0:8080"),
            ("PREDICTION_LOG", "/var/log/predictions.csv"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tabular.bind, "0.0.0.0:8080");
        assert_eq!(
            config.image.log_path,
            PathBuf::from("/var/log/predictions.csv")
        );
        assert_eq!(config.image.bind, "127.0.0.1:5000");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/predictor.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
