//! Provision runner
//!
//! Runs `terraform init` and `terraform apply --auto-approve` for the
//! `./objects` workspace and logs the captured output.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

pub use config::ProvisionConfig;
pub use error::{ConfigError, ProvisionError, ProvisionResult};
pub use services::provision::run;
