//! Configuration validation, run on every load.
//!
//! Only `config`-sourced values are shape-checked; an `env`-sourced value
//! is a variable name, and the variable's content is unknowable until
//! probe time.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::types::{Configuration, Endpoint, ServerConfig, ValueSource};
use crate::core::probe::status_range::{self, StatusExprError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server id \"{0}\" is not a valid identifier")]
    InvalidId(String),
    #[error("duplicate server id \"{0}\"")]
    DuplicateId(String),
    #[error("server \"{id}\": accepted status list: {source}")]
    StatusCodes {
        id: String,
        #[source]
        source: StatusExprError,
    },
    #[error("server \"{id}\": \"{url}\" is not a valid url")]
    InvalidUrl { id: String, url: String },
    #[error("server \"{id}\": \"{host}\" is not a valid host")]
    InvalidHost { id: String, host: String },
    #[error("server \"{id}\": port 0 is out of range")]
    PortOutOfRange { id: String },
    #[error("server \"{id}\": record history window must be positive")]
    EmptyRetention { id: String },
}

/// Ids become directory names, so they stay to a conservative charset.
fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Za-z._-]+$").expect("id pattern compiles"))
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[0-9A-Za-z](?:[0-9A-Za-z-]{0,61}[0-9A-Za-z])?(?:\.[0-9A-Za-z](?:[0-9A-Za-z-]{0,61}[0-9A-Za-z])?)*\.?$",
        )
        .expect("hostname pattern compiles")
    })
}

fn is_host(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.len() <= 255 && hostname_pattern().is_match(hostname)
}

pub fn validate(config: &Configuration) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for server in &config.servers {
        if !id_pattern().is_match(&server.id) {
            return Err(ValidationError::InvalidId(server.id.clone()));
        }
        if !ids.insert(server.id.as_str()) {
            return Err(ValidationError::DuplicateId(server.id.clone()));
        }
        validate_server(server)?;
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ValidationError> {
    if server.max_record_history == 0 {
        return Err(ValidationError::EmptyRetention {
            id: server.id.clone(),
        });
    }

    match &server.endpoint {
        Endpoint::Http(http) => {
            status_range::validate(&http.status_codes).map_err(|source| {
                ValidationError::StatusCodes {
                    id: server.id.clone(),
                    source,
                }
            })?;
            if let ValueSource::Config { value } = &http.url {
                if Url::parse(value).is_err() {
                    return Err(ValidationError::InvalidUrl {
                        id: server.id.clone(),
                        url: value.clone(),
                    });
                }
            }
        }
        Endpoint::Tcp(tcp) => {
            if let ValueSource::Config { value } = &tcp.host {
                if !is_host(value) {
                    return Err(ValidationError::InvalidHost {
                        id: server.id.clone(),
                        host: value.clone(),
                    });
                }
            }
            if let ValueSource::Config { value: 0 } = &tcp.port {
                return Err(ValidationError::PortOutOfRange {
                    id: server.id.clone(),
                });
            }
        }
    }

    Ok(())
}
