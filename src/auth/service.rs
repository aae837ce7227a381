use std::{collections::HashMap, sync::Arc, time::Duration};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{self, Claims, TokenError},
        types::{AuthConfig, Role, UserPublic},
    },
    credentials::{ConfigurationError, CredentialProvider},
    store::Clock,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("server auth is not configured")]
    NotConfigured,
    #[error("could not validate credentials")]
    InvalidToken(#[from] TokenError),
    #[error("unknown user {0}")]
    UnknownUser(String),
}

struct StoredUser {
    role: Role,
    salt: [u8; 16],
    digest: Vec<u8>,
}

/// In-memory demo accounts with stateless bearer tokens.
pub struct AuthService {
    users: HashMap<String, StoredUser>,
    secret: Option<String>,
    token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        credentials: &dyn CredentialProvider,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let secret = match credentials.resolve(&config.jwt_secret, "token signing") {
            Ok(secret) => secret,
            Err(err) => {
                tracing::warn!(target: "auth", error = %err, "jwt_secret_unavailable");
                None
            }
        };

        let users = config
            .users
            .iter()
            .map(|account| {
                let salt = *Uuid::new_v4().as_bytes();
                let digest = password_digest(&salt, &account.password);
                (
                    account.username.clone(),
                    StoredUser {
                        role: account.role,
                        salt,
                        digest,
                    },
                )
            })
            .collect();

        Self {
            users,
            secret,
            token_ttl: Duration::from_secs(config.access_token_expires_minutes.saturating_mul(60)),
            clock,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserPublic> {
        let user = self.users.get(username)?;
        let mut mac = HmacSha256::new_from_slice(&user.salt).ok()?;
        mac.update(password.as_bytes());
        mac.verify_slice(&user.digest).ok()?;
        Some(UserPublic {
            username: username.to_string(),
            role: user.role,
        })
    }

    pub fn get_user(&self, username: &str) -> Option<UserPublic> {
        self.users.get(username).map(|user| UserPublic {
            username: username.to_string(),
            role: user.role,
        })
    }

    pub fn create_access_token(&self, user: &UserPublic) -> Result<String, ConfigurationError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| ConfigurationError::new("JWT secret is not configured"))?;

        let now = self.clock.wall_now().unix_timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.token_ttl.as_secs() as i64),
        };
        jwt::encode(&claims, secret.as_bytes())
            .map_err(|err| ConfigurationError::new(format!("unable to sign token: {err}")))
    }

    /// Resolves a bearer token to a currently known user.
    pub fn verify_token(&self, token: &str) -> Result<UserPublic, AuthError> {
        let secret = self.secret.as_deref().ok_or(AuthError::NotConfigured)?;
        let claims = jwt::decode(
            token,
            secret.as_bytes(),
            self.clock.wall_now().unix_timestamp(),
        )?;
        self.get_user(&claims.sub)
            .ok_or(AuthError::UnknownUser(claims.sub))
    }
}

fn password_digest(salt: &[u8], password: &str) -> Vec<u8> {
    match HmacSha256::new_from_slice(salt) {
        Ok(mut mac) => {
            mac.update(password.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}
