//! MIP CLI - Main entry point

use clap::Parser;
use mip_cli::planner::PlanOptions;
use mip_cli::retry::RetryPolicy;
use mip_cli::uploader::UploadOptions;
use mip_cli::{Cli, Commands};
use mip_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use std::time::Duration;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbose flag and environment
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let mut builder = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("mip-cli".to_string());

    if let Some(log_file) = &cli.log_file {
        builder = builder.output(LogOutput::File);
        if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
            builder = builder.log_dir(dir.to_path_buf());
        }
        if let Some(name) = log_file.file_stem().and_then(|s| s.to_str()) {
            builder = builder.log_file_prefix(name.to_string());
        }
    }

    // Merge with environment variables (they take precedence)
    let flag_config = builder.build();
    let log_config = flag_config
        .clone()
        .with_env_overrides()
        .unwrap_or(flag_config);

    // Initialize logging (ignore errors as the CLI should work without it)
    let _ = init_logging(&log_config);

    // Execute command
    let result = execute_command(cli).await;

    // Handle result
    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: Cli) -> mip_cli::Result<()> {
    match cli.command {
        Commands::Plan {
            input,
            out_dir,
            chunk_size,
            gzip,
            input_format,
            idem_key,
            prefix,
            start_seq,
        } => {
            let options = PlanOptions {
                chunk_size,
                gzip,
                format: input_format.parse()?,
                idem_key,
                prefix,
                start_seq,
            };
            mip_cli::commands::plan::run(&input, &out_dir, options).await
        }

        Commands::Upload {
            out_dir,
            endpoint,
            bearer,
            status_endpoint,
            auto_resume,
            resume_from,
            no_resume_local,
            emit_curl,
            max_attempts,
            retry_base_ms,
        } => {
            let options = UploadOptions {
                endpoint,
                status_endpoint,
                bearer,
                auto_resume,
                resume_from,
                no_resume_local,
                emit_curl,
                retry: RetryPolicy::new(
                    max_attempts,
                    Duration::from_millis(retry_base_ms),
                    Duration::from_secs(30),
                ),
                show_progress: !emit_curl,
            };
            mip_cli::commands::upload::run(&out_dir, options).await
        }

        Commands::Status {
            out_dir,
            idem_key,
            status_endpoint,
            bearer,
        } => {
            mip_cli::commands::status::run(out_dir, idem_key, status_endpoint, bearer).await
        }
    }
}
