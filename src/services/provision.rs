//! Terraform provisioning run
//!
//! `init` then `apply --auto-approve` inside the objects directory, as one
//! shell invocation. A non-zero exit fails the run; nothing is retried or
//! rolled back.

use chrono::Utc;
use tracing::{info, info_span, Instrument, Span};

use crate::config::constants::SOURCE_LABEL;
use crate::config::ProvisionConfig;
use crate::domain::provision::ProvisionOutcome;
use crate::error::{ProvisionError, ProvisionResult};
use crate::infra::CommandRunner;

/// Span carrying the source label for every record of a run
pub fn provision_span() -> Span {
    info_span!("provision", source = %SOURCE_LABEL)
}

/// Execute a provisioning run
pub async fn run(config: &ProvisionConfig) -> ProvisionResult<ProvisionOutcome> {
    run_inner(config).instrument(provision_span()).await
}

async fn run_inner(config: &ProvisionConfig) -> ProvisionResult<ProvisionOutcome> {
    let started_at = Utc::now();
    info!("{} starting.", SOURCE_LABEL);

    info!("Processing terraform");
    let command = config.command_line();
    tracing::debug!(
        command = %command,
        work_dir = %config.project_root.display(),
        "Running provisioning command"
    );

    let result = CommandRunner::run_shell(&command, &config.project_root).await?;
    let output = result.combined();

    if !result.success {
        return Err(ProvisionError::ProcessExecution {
            exit_code: result.exit_code,
            output,
        });
    }

    info!("Output:\n{}", output);

    let outcome = ProvisionOutcome {
        output,
        started_at,
        finished_at: Utc::now(),
    };
    tracing::debug!(duration_ms = outcome.duration_ms(), "Provisioning command finished");
    Ok(outcome)
}

/// Logs the completion line inside the run span
pub fn log_finished() {
    provision_span().in_scope(|| info!("{} finished.", SOURCE_LABEL));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tracing::Level;

    /// Writes an executable fake terraform that records its arguments
    fn fake_terraform(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-terraform");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config_for(root: &Path, terraform_bin: &Path) -> ProvisionConfig {
        ProvisionConfig {
            log_level: Level::INFO,
            log_file: root.join("deploy.log"),
            project_root: root.to_path_buf(),
            objects_dir: "./objects".to_string(),
            terraform_bin: terraform_bin.display().to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_success_runs_init_then_apply() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("objects")).unwrap();
        let bin = fake_terraform(dir.path(), r#"echo "$@" >> calls.txt; echo "ran $1""#);

        let outcome = run(&config_for(dir.path(), &bin)).await.unwrap();

        assert_eq!(outcome.output, "ran init\nran apply");
        let calls = fs::read_to_string(dir.path().join("objects").join("calls.txt")).unwrap();
        assert_eq!(calls, "init\napply --auto-approve\n");
        assert!(outcome.duration_ms() >= 0);
    }

    #[tokio::test]
    async fn test_run_init_failure_skips_apply() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("objects")).unwrap();
        let bin = fake_terraform(
            dir.path(),
            r#"echo "$1" >> calls.txt; echo "Error: backend" >&2; exit 4"#,
        );

        let err = run(&config_for(dir.path(), &bin)).await.unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.partial_output(), Some("Error: backend"));
        let calls = fs::read_to_string(dir.path().join("objects").join("calls.txt")).unwrap();
        assert_eq!(calls, "init\n");
    }

    #[tokio::test]
    async fn test_run_missing_objects_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_terraform(dir.path(), "exit 0");

        let err = run(&config_for(dir.path(), &bin)).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ProcessExecution { .. }));
        assert_ne!(err.exit_code(), 0);
    }
}
