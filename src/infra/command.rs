//! 命令执行器
//!
//! 执行 shell 命令并捕获输出：
//! - stdout/stderr 按到达顺序合并
//! - 每行实时写入 debug 日志
//! - 工作目录只作用于子进程

use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::provision::{CommandOutput, LogLine};

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug)]
pub enum CommandError {
    /// 命令启动失败
    SpawnFailed(std::io::Error),
    /// 等待命令完成失败
    WaitFailed(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed(e) => write!(f, "Failed to spawn command: {}", e),
            CommandError::WaitFailed(e) => write!(f, "Failed to wait for command: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed(e) | CommandError::WaitFailed(e) => Some(e),
        }
    }
}

impl CommandRunner {
    /// 执行命令并捕获合并输出
    ///
    /// # Arguments
    /// * `program` - 要执行的程序
    /// * `args` - 命令行参数
    /// * `work_dir` - 子进程工作目录
    ///
    /// # Returns
    /// 退出状态与输出行；非零退出码不视为错误，由调用方判断
    pub async fn run_capture(
        program: &str,
        args: &[&str],
        work_dir: &Path,
    ) -> Result<CommandOutput, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        let (tx, mut rx) = mpsc::unbounded_channel();

        let stdout_task = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(forward_lines(stdout, "stdout", tx.clone())));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(forward_lines(stderr, "stderr", tx.clone())));
        drop(tx);

        // 两个读取任务结束后通道关闭
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            debug!(stream = %line.stream, "{}", line.content);
            lines.push(line);
        }

        let status = child.wait().await.map_err(CommandError::WaitFailed)?;

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            let _ = task.await;
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            success: status.success(),
            lines,
        })
    }

    /// 执行 shell 命令
    ///
    /// 使用 sh -c 执行命令字符串
    pub async fn run_shell(command: &str, work_dir: &Path) -> Result<CommandOutput, CommandError> {
        Self::run_capture("sh", &["-c", command], work_dir).await
    }
}

/// 按行转发输出，直到管道关闭
///
/// 非 UTF-8 字节按 lossy 转换，读取不中断，子进程不会因管道关闭收到 SIGPIPE
async fn forward_lines<R>(reader: R, stream: &'static str, tx: mpsc::UnboundedSender<LogLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_ending(&buf));
                let _ = tx.send(LogLine::new(stream, line));
            }
            Err(e) => {
                warn!(stream, error = %e, "Failed to read command output");
                break;
            }
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_run_shell_success() {
        let output = CommandRunner::run_shell("echo hello && echo world", &PathBuf::from("/tmp"))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.combined(), "hello\nworld");
    }

    #[tokio::test]
    async fn test_run_shell_captures_stderr() {
        let output = CommandRunner::run_shell("echo oops >&2", &PathBuf::from("/tmp"))
            .await
            .unwrap();

        assert_eq!(output.lines.len(), 1);
        assert_eq!(output.lines[0].stream, "stderr");
        assert_eq!(output.lines[0].content, "oops");
    }

    #[tokio::test]
    async fn test_run_shell_non_zero_exit() {
        let output = CommandRunner::run_shell("echo partial; exit 7", &PathBuf::from("/tmp"))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(7));
        assert_eq!(output.combined(), "partial");
    }

    #[tokio::test]
    async fn test_run_shell_uses_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("objects")).unwrap();
        let before = std::env::current_dir().unwrap();

        let output = CommandRunner::run_shell("cd ./objects && pwd", dir.path())
            .await
            .unwrap();

        let reported = PathBuf::from(output.combined());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().join("objects").canonicalize().unwrap()
        );
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_shell_keeps_reading_after_invalid_utf8() {
        let output = CommandRunner::run_shell(
            "printf 'before\\n\\377\\r\\n'; for i in $(seq 1 20000); do echo line$i; done; echo done-after",
            &PathBuf::from("/tmp"),
        )
        .await
        .unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.lines.len(), 20003);
        assert_eq!(output.lines[0].content, "before");
        assert_eq!(output.lines[1].content, "\u{FFFD}");
        assert_eq!(output.lines[20001].content, "line20000");
        assert_eq!(output.lines[20002].content, "done-after");
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
    }

    #[tokio::test]
    async fn test_run_capture_not_found() {
        let result =
            CommandRunner::run_capture("nonexistent_command_12345", &[], &PathBuf::from("/tmp")).await;

        assert!(matches!(result, Err(CommandError::SpawnFailed(_))));
    }
}
