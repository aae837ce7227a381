use serde::{Deserialize, Serialize};

use crate::credentials::CredentialRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Officer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Officer => "officer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: CredentialRef,
    #[serde(default = "default_access_token_expires_minutes")]
    pub access_token_expires_minutes: u64,
    #[serde(default = "default_users")]
    pub users: Vec<UserAccount>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_expires_minutes: default_access_token_expires_minutes(),
            users: default_users(),
        }
    }
}

fn default_jwt_secret() -> CredentialRef {
    CredentialRef::env("JWT_SECRET_KEY")
}

fn default_access_token_expires_minutes() -> u64 {
    30
}

fn default_users() -> Vec<UserAccount> {
    vec![
        UserAccount {
            username: "farmer01".to_string(),
            password: "passfarm1".to_string(),
            role: Role::Farmer,
        },
        UserAccount {
            username: "agrioff01".to_string(),
            password: "agripass@gov".to_string(),
            role: Role::Officer,
        },
    ]
}
