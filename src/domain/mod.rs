//! 领域模型模块
//!
//! 纯数据结构，不依赖 tokio

pub mod provision;

pub use provision::{CommandOutput, LogLine, ProvisionOutcome, TerraformStep};
