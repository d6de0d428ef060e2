// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: capture, decode, and classify barcodes.
//
// Entry point. Initialises logging, loads services, and runs one command.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use scanwerk_core::classify::NOTHING_FOUND_TEXT;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::types::ImageReference;
use scanwerk_detect::unsupported_formats;
use scanwerk_session::{CancelHandle, CaptureSession};

use cli::{Cli, Command};
use services::app_services::{AppServices, ConfigOverrides};

/// Conventional exit status for a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Scanwerk starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut svc = match cli.data_dir {
        Some(dir) => AppServices::with_data_dir(dir)?,
        None => AppServices::init()?,
    };

    match cli.command {
        Command::Scan {
            photo,
            deny_permission,
        } => scan(&svc, photo, deny_permission).await,
        Command::Decode { path, json } => decode(&svc, path, json).await,
        Command::Resume => resume(&svc),
        Command::Reset => svc.clear_session(),
        Command::Config {
            formats,
            max_width,
            max_height,
        } => configure(
            &mut svc,
            ConfigOverrides {
                formats,
                max_width,
                max_height,
            },
        ),
    }
}

async fn scan(svc: &AppServices, photo: Option<std::path::PathBuf>, deny_permission: bool) -> Result<()> {
    let grant = svc.config().auto_grant_permission && !deny_permission;
    let mut scanner = svc.scanner(photo, grant)?;

    // Ctrl-C while the camera is open abandons the capture. Any other
    // Ctrl-C stops the process.
    let handle = scanner.cancel_handle();
    let watcher = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if let Some(code) = interrupt_exit_code(&handle) {
                tracing::info!("interrupted");
                std::process::exit(code);
            }
        }
    });

    let outcome = scanner.run_cycle().await;
    watcher.abort();
    let phase = outcome?;

    tracing::info!(%phase, records = scanner.last_records().len(), "scan complete");
    println!("{}", scanner.session().result_text());
    svc.save_session(&scanner.suspend())
}

/// Exit status for a Ctrl-C, or `None` when it abandoned a pending capture.
fn interrupt_exit_code(handle: &CancelHandle) -> Option<i32> {
    if handle.cancel() {
        None
    } else {
        Some(INTERRUPTED_EXIT_CODE)
    }
}

async fn decode(svc: &AppServices, path: std::path::PathBuf, json: bool) -> Result<()> {
    let pipeline = svc.pipeline();
    let reference = ImageReference::from_path(path);
    let outcome = tokio::task::spawn_blocking(move || pipeline.scan(&reference))
        .await
        .map_err(|e| ScanwerkError::DecodeFailed(format!("decode worker failed: {e}")))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    } else if outcome.is_empty() {
        println!("{NOTHING_FOUND_TEXT}");
    } else {
        for record in &outcome.records {
            println!("{}\t{}\t{}", record.kind_name(), record.payload(), record.display_value());
        }
    }
    Ok(())
}

fn resume(svc: &AppServices) -> Result<()> {
    let session = CaptureSession::resume(
        svc.config(),
        svc.capture_target(),
        svc.pipeline().detector_operational(),
        svc.load_session()?,
    );

    println!("phase: {}", session.phase());
    if let Some(reference) = session.image_reference() {
        println!("photo: {reference}");
    }
    println!("result: {}", session.result_text());
    Ok(())
}

fn configure(svc: &mut AppServices, overrides: ConfigOverrides) -> Result<()> {
    if svc.apply_overrides(overrides)? {
        println!("config saved");
    }
    for format in unsupported_formats(&svc.config().formats) {
        eprintln!("warning: {format:?} is configured but will not be detected");
    }
    println!("data dir: {}", svc.data_dir().display());
    println!("{}", serde_json::to_string_pretty(svc.config())?);
    Ok(())
}
