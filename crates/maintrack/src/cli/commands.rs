//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands. Each `add`
//! command mirrors one form of the maintenance page.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::BackupVariant;
use crate::records::{Equipment, NewTask, NewWorkOrder};

/// Equipment commands.
#[derive(Debug, Subcommand)]
pub enum EquipmentCommand {
    /// Register new equipment
    Add(EquipmentAddArgs),

    /// List all equipment with its index
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Fields of a new equipment record.
#[derive(Debug, Args)]
pub struct EquipmentAddArgs {
    /// Equipment name (also the checklist key)
    #[arg(short, long)]
    pub name: String,

    /// Manufacturer
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Model designation
    #[arg(short, long)]
    pub model: Option<String>,

    /// Year of manufacture or installation
    #[arg(short, long)]
    pub year: Option<String>,

    /// Plant area or location
    #[arg(short, long)]
    pub area: Option<String>,

    /// Rated power
    #[arg(short, long)]
    pub power: Option<String>,

    /// Equipment type
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl From<EquipmentAddArgs> for Equipment {
    fn from(args: EquipmentAddArgs) -> Self {
        Self {
            name: args.name,
            brand: args.brand,
            model: args.model,
            year: args.year,
            area: args.area,
            power: args.power,
            kind: args.kind,
            notes: args.notes,
        }
    }
}

/// Task commands.
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Schedule a task for an equipment
    Add(TaskAddArgs),

    /// List all scheduled tasks
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Fields of a new task.
#[derive(Debug, Args)]
pub struct TaskAddArgs {
    /// Equipment index, as shown by `equipment list`
    #[arg(short, long, value_name = "INDEX")]
    pub equipment: usize,

    /// Scheduled date
    #[arg(short, long)]
    pub date: String,

    /// What to do
    #[arg(short = 'D', long)]
    pub description: String,

    /// How often
    #[arg(short, long)]
    pub frequency: String,
}

impl From<TaskAddArgs> for NewTask {
    fn from(args: TaskAddArgs) -> Self {
        Self {
            equipment_index: args.equipment,
            date: args.date,
            description: args.description,
            frequency: args.frequency,
        }
    }
}

/// Work order commands.
#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Log a work order for an equipment
    Add(OrderAddArgs),

    /// List all work orders
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Fields of a new work order.
#[derive(Debug, Args)]
pub struct OrderAddArgs {
    /// Equipment index, as shown by `equipment list`
    #[arg(short, long, value_name = "INDEX")]
    pub equipment: usize,

    /// Person responsible
    #[arg(short, long)]
    pub person: String,

    /// Date
    #[arg(short, long)]
    pub date: String,

    /// Work performed or requested
    #[arg(short = 'D', long)]
    pub description: String,
}

impl From<OrderAddArgs> for NewWorkOrder {
    fn from(args: OrderAddArgs) -> Self {
        Self {
            equipment_index: args.equipment,
            person: args.person,
            date: args.date,
            description: args.description,
        }
    }
}

/// Checklist commands.
#[derive(Debug, Subcommand)]
pub enum ChecklistCommand {
    /// Add a step to an equipment's checklist
    Add {
        /// Equipment index, as shown by `equipment list`
        #[arg(short, long, value_name = "INDEX")]
        equipment: usize,

        /// Part or step to check
        text: String,
    },

    /// Show the checklist of one equipment
    Show {
        /// Which checklist to show
        #[command(flatten)]
        target: ChecklistTarget,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete the whole checklist stored under an equipment name
    Remove {
        /// Exact equipment name
        name: String,
    },
}

/// Which checklist to show: by equipment index or by exact name.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ChecklistTarget {
    /// Equipment index, as shown by `equipment list`
    #[arg(short, long, value_name = "INDEX")]
    pub equipment: Option<usize>,

    /// Exact equipment name (case-sensitive)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in equipment names (case-insensitive)
    #[arg(default_value = "")]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Backup commands.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write every collection to a JSON file
    Export {
        /// Output file (defaults to the configured backup file name)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Which collections to include (defaults to the configured variant)
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Replace every collection from a JSON file
    Restore {
        /// Backup file to read
        file: PathBuf,

        /// Confirm the destructive overwrite
        #[arg(short, long)]
        yes: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Backup variant argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Equipment, tasks, work orders and checklists
    Full,
    /// Equipment, tasks and work orders
    Reduced,
}

impl From<VariantArg> for BackupVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Full => Self::Full,
            VariantArg::Reduced => Self::Reduced,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
