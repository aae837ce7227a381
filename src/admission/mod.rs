pub mod controller;

pub use controller::{AdmissionController, AdmissionKey, AdmissionPolicy, RateLimited};
