//! Command-line interface for maintrack.
//!
//! This module provides the CLI structure for the `maintrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BackupCommand, ChecklistCommand, ChecklistTarget, ConfigCommand, EquipmentAddArgs,
    EquipmentCommand, OrderAddArgs, OrderCommand, OutputFormat, SearchCommand, StatusCommand,
    TaskAddArgs, TaskCommand, VariantArg,
};

/// maintrack - Track equipment, maintenance tasks, work orders and checklists
///
/// Records are kept in a local database. Use `backup export` and
/// `backup restore` to move them between machines.
#[derive(Debug, Parser)]
#[command(name = "maintrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides configuration)
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage equipment
    #[command(subcommand)]
    Equipment(EquipmentCommand),

    /// Manage scheduled maintenance tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage work orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// Manage per-equipment checklists
    #[command(subcommand)]
    Checklist(ChecklistCommand),

    /// Search equipment by name
    Search(SearchCommand),

    /// Export or restore a JSON backup
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Show record counts
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
