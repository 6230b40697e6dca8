// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Oddbench - benchmark result aggregation and hardware index
//!
//! Entry point for the Oddbench CLI. The binary is a thin shell: every
//! command goes through the catalog's ingest/read interfaces.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use oddbench::benchmarks::AdapterRegistry;
use oddbench::catalog::Catalog;
use oddbench::cli::{Cli, Commands, ImportArgs, ShowArgs};
use oddbench::config::Settings;
use oddbench::fingerprint::HardwareKind;
use oddbench::hardware::HardwareInfo;
use oddbench::store::FsRunStore;
use oddbench::upload::{request_from_parts, UploadPart};
use oddbench::OddbenchError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing: default WARN, -v raises the crate's own targets,
    // RUST_LOG still takes precedence.
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if cli.verbose > 0 {
        if let Ok(parsed) = "oddbench=debug".parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    settings.ensure_directories()?;

    let store = Arc::new(FsRunStore::new(&settings.data_dir)?);
    let registry = Arc::new(AdapterRegistry::builtin());
    let catalog = Catalog::new(store, registry, &settings.cache)
        .with_index_artifact(settings.data_dir.join("cache").join("index.json"));

    match cli.command {
        Commands::Import(args) => import(&catalog, args),
        Commands::List => {
            let index = catalog.list_hardware()?;
            println!("{}", serde_json::to_string_pretty(&index)?);
            Ok(())
        }
        Commands::Show(args) => show(&catalog, args),
        Commands::Stats => {
            let stats = catalog.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn import(catalog: &Catalog, args: ImportArgs) -> anyhow::Result<()> {
    let mut parts = Vec::new();
    for path in &args.files {
        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
            anyhow::anyhow!("cannot name a benchmark type for {}", path.display())
        })?;
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        parts.push(UploadPart::new(stem, body));
    }

    let hardware = match &args.hardware_info {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let info: HardwareInfo = serde_json::from_str(&text).map_err(|e| {
                OddbenchError::MalformedInput(format!("invalid hardware info file: {}", e))
            })?;
            Some(info)
        }
        None => None,
    };

    let request = request_from_parts(parts, args.run_id, hardware, None)?;
    let outcome = catalog.ingest(request)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn show(catalog: &Catalog, args: ShowArgs) -> anyhow::Result<()> {
    let kind = HardwareKind::parse(&args.kind).ok_or_else(|| {
        anyhow::anyhow!("kind must be 'cpu' or 'gpu', got '{}'", args.kind)
    })?;

    match catalog.get_hardware_detail(kind, &args.id) {
        Ok(detail) => {
            println!("{}", serde_json::to_string_pretty(&detail)?);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            // A miss is an answer, not a stack trace.
            eprintln!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
