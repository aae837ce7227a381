pub mod admission;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod escalation;
pub mod logging;
pub mod orchestrator;
pub mod reasoning;
pub mod server;
pub mod state;
pub mod store;
pub mod text;
pub mod transcription;
pub mod types;
pub mod vision;

pub const SERVICE_NAME: &str = "agri-advisory";
