use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env { var: String },
    InlineToken { token: String },
    None,
}

impl CredentialRef {
    pub fn env(var: impl Into<String>) -> Self {
        Self::Env { var: var.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait CredentialProvider: Send + Sync {
    /// `Ok(None)` means the reference deliberately carries no secret.
    fn resolve(
        &self,
        reference: &CredentialRef,
        purpose: &str,
    ) -> Result<Option<String>, ConfigurationError>;
}

#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(
        &self,
        reference: &CredentialRef,
        purpose: &str,
    ) -> Result<Option<String>, ConfigurationError> {
        match reference {
            CredentialRef::Env { var } => {
                let value = env::var(var).map_err(|_| {
                    ConfigurationError::new(format!(
                        "missing credential environment variable {} for {}",
                        var, purpose
                    ))
                })?;
                if value.trim().is_empty() {
                    return Err(ConfigurationError::new(format!(
                        "credential environment variable {} for {} is empty",
                        var, purpose
                    )));
                }
                Ok(Some(value))
            }
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(ConfigurationError::new(format!(
                        "inline credential token for {} cannot be empty",
                        purpose
                    )));
                }
                Ok(Some(token.clone()))
            }
            CredentialRef::None => Ok(None),
        }
    }
}
