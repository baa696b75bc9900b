//! `maintrack` - CLI for the maintenance record store
//!
//! Each subcommand is one request against the store: it loads what it
//! needs, applies at most one change, prints the result and exits.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use maintrack::cli::{
    BackupCommand, ChecklistCommand, Cli, Command, ConfigCommand, EquipmentCommand, OrderCommand,
    OutputFormat, SearchCommand, TaskCommand,
};
use maintrack::{init_logging, read_backup, write_backup, Config, Equipment, MaintenanceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(database) = cli.database.clone() {
        config.storage.database_path = Some(database);
    }

    match cli.command {
        Command::Equipment(cmd) => handle_equipment(&mut open_store(&config)?, cmd),
        Command::Task(cmd) => handle_task(&mut open_store(&config)?, cmd),
        Command::Order(cmd) => handle_order(&mut open_store(&config)?, cmd),
        Command::Checklist(cmd) => handle_checklist(&mut open_store(&config)?, cmd),
        Command::Search(cmd) => handle_search(&open_store(&config)?, &cmd),
        Command::Backup(cmd) => handle_backup(&mut open_store(&config)?, &config, cmd).await,
        Command::Status(cmd) => handle_status(&open_store(&config)?, &config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<MaintenanceStore> {
    MaintenanceStore::open(config)
        .with_context(|| format!("opening store at {}", config.database_path().display()))
}

fn handle_equipment(store: &mut MaintenanceStore, cmd: EquipmentCommand) -> anyhow::Result<()> {
    match cmd {
        EquipmentCommand::Add(args) => {
            let equipment = Equipment::from(args);
            let label = equipment.to_string();
            let index = store.add_equipment(equipment)?;
            println!("Added equipment [{index}] {label}");
        }
        EquipmentCommand::List { format } => {
            let equipment = store.equipment()?;
            print_equipment(&equipment, format)?;
        }
    }
    Ok(())
}

fn handle_task(store: &mut MaintenanceStore, cmd: TaskCommand) -> anyhow::Result<()> {
    match cmd {
        TaskCommand::Add(args) => {
            let task = store.add_task(args.into())?;
            println!("Added task: {task}");
        }
        TaskCommand::List { format } => {
            let tasks = store.tasks()?;
            print_list(&tasks, format, "scheduled tasks")?;
        }
    }
    Ok(())
}

fn handle_order(store: &mut MaintenanceStore, cmd: OrderCommand) -> anyhow::Result<()> {
    match cmd {
        OrderCommand::Add(args) => {
            let order = store.add_work_order(args.into())?;
            println!("Added work order: {order}");
        }
        OrderCommand::List { format } => {
            let orders = store.work_orders()?;
            print_list(&orders, format, "open work orders")?;
        }
    }
    Ok(())
}

fn handle_checklist(store: &mut MaintenanceStore, cmd: ChecklistCommand) -> anyhow::Result<()> {
    match cmd {
        ChecklistCommand::Add { equipment, text } => {
            let name = store.add_checklist_entry_for(equipment, &text)?;
            println!("Added checklist entry for {name}: {text}");
        }
        ChecklistCommand::Show { target, format } => {
            let name = match (target.equipment, target.name) {
                (Some(index), _) => store.resolve_equipment(index)?,
                (None, Some(name)) => name,
                (None, None) => bail!("either --equipment or --name is required"),
            };
            let entries = store.checklist_for(&name)?;
            match format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Plain => {
                    println!("Checklist for {name}");
                    for entry in &entries {
                        println!("  - {entry}");
                    }
                    println!("{} entries", entries.len());
                }
            }
        }
        ChecklistCommand::Remove { name } => {
            if store.remove_checklist(&name)? {
                println!("Removed checklist for {name}");
            } else {
                println!("No checklist stored for {name}");
            }
        }
    }
    Ok(())
}

fn handle_search(store: &MaintenanceStore, cmd: &SearchCommand) -> anyhow::Result<()> {
    let found = store.search(&cmd.query)?;
    match cmd.format {
        OutputFormat::Json => print_json(&found)?,
        OutputFormat::Plain => {
            for equipment in &found {
                println!("{equipment}");
            }
        }
    }
    Ok(())
}

async fn handle_backup(
    store: &mut MaintenanceStore,
    config: &Config,
    cmd: BackupCommand,
) -> anyhow::Result<()> {
    match cmd {
        BackupCommand::Export {
            output,
            variant,
            pretty,
        } => {
            let path = output.unwrap_or_else(|| config.backup_path());
            let variant = variant.map_or(config.backup.variant, Into::into);
            let document = store.export_all(variant)?;
            write_backup(&path, &document, pretty || config.backup.pretty)
                .await
                .with_context(|| format!("writing backup to {}", path.display()))?;
            println!("Exported backup to {}", path.display());
        }
        BackupCommand::Restore { file, yes } => {
            if !yes {
                bail!(
                    "restore replaces every collection, including ones missing from {}; rerun with --yes",
                    file.display()
                );
            }
            let document = read_backup(&file)
                .await
                .with_context(|| format!("reading backup {}", file.display()))?;
            store.import_all(document)?;
            let summary = store.summary()?;
            println!(
                "Restored {} equipment, {} tasks, {} work orders, {} checklists from {}",
                summary.equipment,
                summary.tasks,
                summary.work_orders,
                summary.checklist_buckets,
                file.display()
            );
        }
    }
    Ok(())
}

fn handle_status(store: &MaintenanceStore, config: &Config, json: bool) -> anyhow::Result<()> {
    let summary = store.summary()?;
    let stats = store.storage().stats()?;
    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "database_bytes": stats.db_size_bytes,
            "summary": summary,
        });
        print_json(&status)?;
    } else {
        println!("maintrack status");
        println!("----------------");
        println!("Database:          {}", config.database_path().display());
        println!("Equipment:         {}", summary.equipment);
        println!("Scheduled tasks:   {}", summary.tasks);
        println!("Open work orders:  {}", summary.work_orders);
        println!(
            "Checklists:        {} ({} entries)",
            summary.checklist_buckets, summary.checklist_entries
        );
        match summary.last_updated {
            Some(at) => println!("Last updated:      {}", at.to_rfc3339()),
            None => println!("Last updated:      never"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  On corrupt record:  {:?}", config.storage.on_corrupt);
                println!();
                println!("[Backup]");
                println!("  File name:          {}", config.backup.file_name);
                println!("  Variant:            {:?}", config.backup.variant);
                println!("  Pretty:             {}", config.backup.pretty);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_equipment(equipment: &[Equipment], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(equipment)?,
        OutputFormat::Plain => {
            for (index, eq) in equipment.iter().enumerate() {
                println!("[{index}] {eq}");
            }
            println!("{} equipment", equipment.len());
        }
    }
    Ok(())
}

fn print_list<T>(items: &[T], format: OutputFormat, noun: &str) -> anyhow::Result<()>
where
    T: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Json => print_json(items)?,
        OutputFormat::Plain => {
            for item in items {
                println!("{item}");
            }
            println!("{} {noun}", items.len());
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
