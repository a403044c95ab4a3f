//! 配置模块
//!
//! properties 文件解析与运行配置

pub mod properties;
pub mod provision;

pub use properties::Properties;
pub use provision::{constants, parse_log_level, ProvisionConfig};
