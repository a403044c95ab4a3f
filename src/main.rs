//! apply-config - terraform provisioning runner
//!
//! Usage:
//! - Default: `apply-config` (reads `./local.properties`)
//! - Custom properties file: `apply-config --config /srv/infra/local.properties`

use std::path::PathBuf;

use provision_runner::config::constants::{DEFAULT_CONFIG_PATH, SOURCE_LABEL, VERSION};
use provision_runner::infra::init_logging;
use provision_runner::services::{log_finished, provision_span};
use provision_runner::{ProvisionConfig, ProvisionResult};
use tracing::error;

/// Command line arguments
struct CliArgs {
    config_path: PathBuf,
}

/// Parse command line arguments
fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                cli.config_path = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", SOURCE_LABEL, VERSION);
                std::process::exit(0);
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
                i += 1;
            }
        }
    }

    cli
}

fn print_help() {
    println!("apply-config - run terraform init/apply for ./objects");
    println!();
    println!("USAGE:");
    println!("    apply-config [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Properties file (default: ./local.properties)");
    println!("    -h, --help             Print help information");
    println!("    -V, --version          Print version");
    println!();
    println!("REQUIRED PROPERTIES:");
    println!("    deployment_log_level   TRACE | DEBUG | INFO | WARNING | ERROR");
    println!("    log_file               Log file, relative to the properties file");
}

/// Loads configuration and installs logging; nothing external runs if this fails
fn prepare(cli: &CliArgs) -> ProvisionResult<ProvisionConfig> {
    let config = ProvisionConfig::load(&cli.config_path)?;
    init_logging(&config)?;
    Ok(config)
}

async fn run_main(cli: CliArgs) -> i32 {
    let config = match prepare(&cli) {
        Ok(config) => config,
        Err(e) => {
            let exit_code = e.exit_code();
            let e = anyhow::Error::new(e).context(format!(
                "Failed to prepare run from {}",
                cli.config_path.display()
            ));
            eprintln!("Error: {:#}", e);
            return exit_code;
        }
    };

    match provision_runner::run(&config).await {
        Ok(_) => {
            log_finished();
            0
        }
        Err(e) => {
            let exit_code = e.exit_code();
            provision_span().in_scope(|| {
                if let Some(output) = e.partial_output() {
                    error!("Output:\n{}", output);
                }
                error!(exit_code, "{}", e);
            });
            exit_code
        }
    }
}

fn main() {
    let cli = parse_args();

    // Single-threaded runtime; the only blocking work is the terraform child
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(run_main(cli));
    std::process::exit(code);
}
