//! 业务服务模块

pub mod provision;

pub use provision::{log_finished, provision_span, run};
