/*!
Typed configuration model.

`config.json` is edited by the out-of-scope configuration UI; this crate
only consumes it. The model decodes with exhaustive shape validation at
the boundary - an unknown `serverType` or a malformed indirect value is a
decode error, not a downstream surprise.
*/

use serde::{Deserialize, Serialize};

/// HTTP request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration value read either literally from the file or, at
/// probe time, from the process environment.
///
/// Resolution is deliberately lazy: an `env` value names a variable that
/// is dereferenced on every probe invocation, so rotated secrets take
/// effect without touching the stored configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "lowercase")]
pub enum ValueSource<T> {
    /// Literal value stored in the configuration file.
    Config { value: T },
    /// Name of an environment variable holding the value.
    Env { value: String },
}

impl ValueSource<String> {
    /// `None` when an `env` variable is unset - a defined state, not an
    /// error; callers let it degrade into ordinary attempt failures.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Config { value } => Some(value.clone()),
            Self::Env { value } => std::env::var(value).ok(),
        }
    }
}

impl ValueSource<u16> {
    /// `None` when an `env` variable is unset or not a number in range.
    pub fn resolve(&self) -> Option<u16> {
        match self {
            Self::Config { value } => Some(*value),
            Self::Env { value } => std::env::var(value).ok()?.trim().parse().ok(),
        }
    }
}

impl<T> ValueSource<T> {
    /// The referenced environment variable name, if any.
    pub fn env_name(&self) -> Option<&str> {
        match self {
            Self::Env { value } => Some(value),
            Self::Config { .. } => None,
        }
    }
}

/// HTTP endpoint fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEndpoint {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: ValueSource<String>,
    /// Accepted-status expression; any listed code or range counts the
    /// attempt as successful.
    #[serde(default = "default_status_codes")]
    pub status_codes: String,
}

/// TCP endpoint fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpEndpoint {
    pub host: ValueSource<String>,
    #[serde(default = "default_port")]
    pub port: ValueSource<u16>,
}

/// Target-specific fields, discriminated by `serverType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "serverType", rename_all = "lowercase")]
pub enum Endpoint {
    Http(HttpEndpoint),
    Tcp(TcpEndpoint),
}

impl Endpoint {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Tcp(_) => "tcp",
        }
    }
}

/// One monitored endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Unique id; doubles as the per-target record directory name.
    pub id: String,
    /// Display name for the status page.
    pub name: String,
    /// Cron schedule consumed by the workflow generator, opaque here.
    #[serde(default = "default_ping_cron")]
    pub ping_cron: String,
    /// Connection/request attempts per probe invocation.
    #[serde(default = "default_ping_attempts")]
    pub ping_attempts: u32,
    /// Retention window in milliseconds, measured backwards from the
    /// moment a record is written.
    #[serde(default = "default_max_record_history")]
    pub max_record_history: u64,
    #[serde(flatten)]
    pub endpoint: Endpoint,
}

/// Top-level configuration file.
///
/// `buildCron` and `basePath` belong to the static-site workflow
/// generator; they are carried so a round-trip through this model never
/// loses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub build_cron: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            build_cron: default_ping_cron(),
            base_path: String::new(),
            servers: Vec::new(),
        }
    }
}

fn default_status_codes() -> String {
    "200-299".to_string()
}

fn default_port() -> ValueSource<u16> {
    ValueSource::Config { value: 80 }
}

fn default_ping_cron() -> String {
    "0 0 * * *".to_string()
}

fn default_ping_attempts() -> u32 {
    1
}

fn default_max_record_history() -> u64 {
    86_400_000
}
