//! 运行配置
//!
//! 从 properties 构建显式的 `ProvisionConfig`，由调用方传给 runner

use std::path::{Path, PathBuf};
use tracing::Level;

use crate::config::properties::Properties;
use crate::domain::provision::{shell_chain, TerraformStep};
use crate::error::ConfigError;

use constants::*;

/// 供应运行配置
#[derive(Clone, Debug)]
pub struct ProvisionConfig {
    /// 日志级别 (`deployment_log_level`)
    pub log_level: Level,
    /// 日志文件 (`log_file`)，相对路径基于项目根目录
    pub log_file: PathBuf,
    /// 项目根目录（properties 文件所在目录）
    pub project_root: PathBuf,
    /// Terraform 配置目录，相对于项目根目录
    pub objects_dir: String,
    /// terraform 可执行文件
    pub terraform_bin: String,
}

impl ProvisionConfig {
    /// 从 properties 文件加载，项目根目录取文件所在目录
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let props = Properties::load_with_fallback(config_path, &fallback_path(config_path))?;
        let root = project_root_of(props.source())?;
        Self::from_properties(&props, &root)
    }

    /// 从已加载的 properties 构建
    pub fn from_properties(props: &Properties, project_root: &Path) -> Result<Self, ConfigError> {
        let log_level = parse_log_level(props.require(KEY_LOG_LEVEL)?)?;
        let log_file = project_root.join(props.require(KEY_LOG_FILE)?);

        let objects_dir = props
            .get(KEY_OBJECTS_DIR)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_OBJECTS_DIR)
            .to_string();
        let terraform_bin = props
            .get(KEY_TERRAFORM_BINARY)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_TERRAFORM_BINARY)
            .to_string();

        Ok(Self {
            log_level,
            log_file,
            project_root: project_root.to_path_buf(),
            objects_dir,
            terraform_bin,
        })
    }

    /// 完整 shell 命令
    pub fn command_line(&self) -> String {
        shell_chain(&self.objects_dir, &self.terraform_bin, &TerraformStep::SEQUENCE)
    }
}

/// 解析日志级别（不区分大小写）
///
/// 可选值：`TRACE`、`DEBUG`、`INFO`、`WARN`/`WARNING`、`ERROR`/`CRITICAL`/`FATAL`
pub fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(Level::ERROR),
        _ => Err(ConfigError::InvalidLogLevel(value.to_string())),
    }
}

/// `local.properties` -> `default.properties` 位于同一目录
fn fallback_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name(DEFAULT_FALLBACK_FILE)
}

fn project_root_of(config_path: &Path) -> Result<PathBuf, ConfigError> {
    let parent = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if parent.is_absolute() {
        return Ok(parent);
    }
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Read {
        path: parent.clone(),
        source: e,
    })?;
    Ok(cwd.join(parent))
}

/// 常量
pub mod constants {
    /// 默认配置文件
    pub const DEFAULT_CONFIG_PATH: &str = "./local.properties";

    /// 主配置文件缺失时的备用文件名
    pub const DEFAULT_FALLBACK_FILE: &str = "default.properties";

    pub const KEY_LOG_LEVEL: &str = "deployment_log_level";
    pub const KEY_LOG_FILE: &str = "log_file";
    pub const KEY_OBJECTS_DIR: &str = "objects_dir";
    pub const KEY_TERRAFORM_BINARY: &str = "terraform_binary";

    pub const DEFAULT_OBJECTS_DIR: &str = "./objects";
    pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";

    /// 日志来源标签
    pub const SOURCE_LABEL: &str = "apply-config";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
