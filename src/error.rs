//! 统一错误处理
//!
//! 配置错误与供应错误；命令执行错误见 `infra::command::CommandError`

use std::path::PathBuf;
use thiserror::Error;

use crate::infra::command::CommandError;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Properties file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {}: {content:?}", .path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Missing required key `{key}` in {}", .path.display())]
    MissingKey { key: String, path: PathBuf },

    #[error("Invalid log level: {0:?}")]
    InvalidLogLevel(String),
}

/// 供应运行错误
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open log file {}: {message}", .path.display())]
    LogInit { path: PathBuf, message: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    /// 命令链以非零状态退出
    #[error("Provisioning command failed (exit code: {})", display_code(.exit_code))]
    ProcessExecution {
        exit_code: Option<i32>,
        /// 失败前捕获的输出
        output: String,
    },
}

impl ProvisionError {
    /// 进程退出码
    ///
    /// 子进程失败时沿用其退出码，其余情况为 1
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::ProcessExecution {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// 失败前捕获的部分输出
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            ProvisionError::ProcessExecution { output, .. } if !output.is_empty() => Some(output.as_str()),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "terminated by signal".to_string())
}

/// 便捷类型别名
pub type ProvisionResult<T> = Result<T, ProvisionError>;
