// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! The CLI is a thin shell over the catalog: it only ever calls the ingest
//! and read interfaces, never the pipeline internals.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Oddbench - benchmark result aggregation and hardware index
#[derive(Parser, Debug)]
#[command(name = "oddbench")]
#[command(version = crate::version(), about = "Benchmark result aggregation and hardware index")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to ~/.oddbench/data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest one benchmark run from result files
    Import(ImportArgs),

    /// Print the hardware index as JSON
    List,

    /// Print detail for one piece of hardware as JSON
    Show(ShowArgs),

    /// Print store-level statistics as JSON
    Stats,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Result files, one per benchmark type; the type is the file stem with
    /// any `_results` suffix stripped (llama_results.json -> llama)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Run id to use instead of the generated timestamp+hardware id
    #[arg(long)]
    pub run_id: Option<String>,

    /// JSON file with hardware facts, bypassing auto-extraction
    #[arg(long)]
    pub hardware_info: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Hardware kind: cpu or gpu
    pub kind: String,

    /// Hardware id (the normalized slug)
    pub id: String,
}
