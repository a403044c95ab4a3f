//! 基础设施模块
//!
//! 封装外部依赖（命令执行、日志输出）

pub mod command;
pub mod logging;

pub use command::{CommandError, CommandRunner};
pub use logging::{filter_for, init_logging, subscriber};
