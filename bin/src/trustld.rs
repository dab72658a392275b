// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `trustld` binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trustl_pipeline::{LoggingConfig, Pipeline};
use trustl_server::Settings;

/// A trust decision engine over ETSI TS 119612 Trust Status Lists.
#[derive(Debug, Parser)]
#[command(name = "trustld", version)]
struct Cli {
    /// Path to the pipeline configuration file.
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Parse and validate the pipeline document, then exit.
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("trustld: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let document = std::fs::read_to_string(&cli.config)
        .map_err(|e| format!("cannot read {}: {e}", cli.config.display()))?;
    let pipeline = Pipeline::from_yaml(&document)?;

    init_logging(pipeline.logging())?;

    if cli.validate {
        info!(
            steps = pipeline.steps().len(),
            config = %cli.config.display(),
            "pipeline document is valid"
        );
        return Ok(());
    }

    let settings = Settings::from_config(pipeline.config_value())?;
    trustl_server::serve(Arc::new(pipeline), settings).await?;
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let level = match config.level.as_str() {
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        // tracing has no fatal level
        "error" | "fatal" => "error",
        other => return Err(format!("unknown log level {other:?}").into()),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        "text" => tracing_subscriber::fmt().with_env_filter(filter).init(),
        other => return Err(format!("unknown log format {other:?}").into()),
    }
    Ok(())
}
