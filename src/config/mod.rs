mod types;
mod validate;

pub use types::{
    Configuration, Endpoint, HttpEndpoint, HttpMethod, ServerConfig, TcpEndpoint, ValueSource,
};
pub use validate::{validate, ValidationError};

use std::path::{Path, PathBuf};

/// Configuration file name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl Configuration {
    /// Read and validate the configuration file. Validation runs on
    /// every load so a hand-edited file fails fast here, not mid-probe.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: Self = serde_json::from_str(&content)?;
        validate::validate(&config)?;
        Ok(config)
    }

    pub fn server(&self, id: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|server| server.id == id)
    }

    /// Create the data directory and, when absent, a default
    /// configuration file. An existing file is left untouched.
    pub async fn init(data_dir: &Path) -> Result<(), ConfigError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|source| ConfigError::Write {
                path: data_dir.to_path_buf(),
                source,
            })?;

        let path = data_dir.join(CONFIG_FILE);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        let content = serde_json::to_string_pretty(&Self::default())?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ConfigError::Write { path, source })?;

        Ok(())
    }
}
