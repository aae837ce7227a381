pub mod jwt;
pub mod service;
pub mod types;

pub use service::{AuthError, AuthService};
pub use types::{AuthConfig, Role, UserAccount, UserPublic};
