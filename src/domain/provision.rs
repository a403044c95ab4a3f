//! 供应（provision）相关领域模型

use chrono::{DateTime, Utc};

/// Terraform 子命令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerraformStep {
    Init,
    Apply,
}

impl TerraformStep {
    /// 默认执行序列：init 成功后才 apply
    pub const SEQUENCE: [TerraformStep; 2] = [TerraformStep::Init, TerraformStep::Apply];

    /// 子命令参数
    pub fn args(&self) -> &'static str {
        match self {
            TerraformStep::Init => "init",
            TerraformStep::Apply => "apply --auto-approve",
        }
    }

    /// 拼接完整命令行
    pub fn command_line(&self, terraform_bin: &str) -> String {
        format!("{} {}", shell_quote(terraform_bin), self.args())
    }
}

/// 构建单次 shell 调用：`cd <dir> && <bin> init && <bin> apply --auto-approve`
///
/// 各步骤以 `&&` 连接，任一步失败即停止
pub fn shell_chain(objects_dir: &str, terraform_bin: &str, steps: &[TerraformStep]) -> String {
    let mut parts = Vec::with_capacity(steps.len() + 1);
    parts.push(format!("cd {}", shell_quote(objects_dir)));
    parts.extend(steps.iter().map(|step| step.command_line(terraform_bin)));
    parts.join(" && ")
}

/// 含特殊字符时为 `sh` 加单引号
fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '+' | ':' | '='));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// 日志行
#[derive(Clone, Debug)]
pub struct LogLine {
    pub stream: String, // stdout | stderr
    pub content: String,
}

impl LogLine {
    /// 创建新日志行
    pub fn new(stream: &str, content: impl Into<String>) -> Self {
        Self {
            stream: stream.to_string(),
            content: content.into(),
        }
    }
}

/// 单次 shell 调用的捕获结果
#[derive(Clone, Debug)]
pub struct CommandOutput {
    /// 被信号终止时为 `None`
    pub exit_code: Option<i32>,
    pub success: bool,
    /// stdout/stderr 按到达顺序排列
    pub lines: Vec<LogLine>,
}

impl CommandOutput {
    /// 合并输出文本
    pub fn combined(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 一次成功供应的结果
#[derive(Clone, Debug)]
pub struct ProvisionOutcome {
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProvisionOutcome {
    /// 持续时间（毫秒）
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
