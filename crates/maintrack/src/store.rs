//! The maintenance record store.
//!
//! [`MaintenanceStore`] owns the four collections. Every mutation loads the
//! full collection, appends, and saves it back inside a single storage
//! transaction. Dependent records (tasks, work orders, checklist entries)
//! refer to equipment by its current list index; the index is resolved to
//! the equipment name at write time and the name is stored as a snapshot.
//!
//! A mutation never replaces a collection whose stored text fails to decode;
//! it returns `Error::CorruptRecord` instead, and `backup restore` is the way
//! to rewrite it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::backup::BackupDocument;
use crate::config::{BackupVariant, Config};
use crate::error::{Error, Result};
use crate::records::{Checklists, Equipment, NewTask, NewWorkOrder, Task, WorkOrder};
use crate::storage::{Batch, Storage};

/// Store key holding the equipment list.
pub const EQUIPMENT_KEY: &str = "equipos";
/// Store key holding the task list.
pub const TASKS_KEY: &str = "tareas";
/// Store key holding the work order list.
pub const WORK_ORDERS_KEY: &str = "ots";
/// Store key holding the checklist mapping.
pub const CHECKLIST_KEY: &str = "checklist";

/// Equipment, tasks, work orders and checklists over one [`Storage`].
#[derive(Debug)]
pub struct MaintenanceStore {
    storage: Storage,
}

/// Record counts across all collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of equipment records.
    pub equipment: usize,
    /// Number of scheduled tasks.
    pub tasks: usize,
    /// Number of work orders.
    pub work_orders: usize,
    /// Number of equipment names with a checklist.
    pub checklist_buckets: usize,
    /// Total checklist entries.
    pub checklist_entries: usize,
    /// Most recent write to any collection.
    pub last_updated: Option<DateTime<Utc>>,
}

impl MaintenanceStore {
    /// Wrap an opened storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self> {
        let storage =
            Storage::open(config.database_path())?.with_corrupt_policy(config.storage.on_corrupt);
        Ok(Self::new(storage))
    }

    /// Open an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?))
    }

    /// The underlying key-value storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // === Equipment ===

    /// All equipment in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn equipment(&self) -> Result<Vec<Equipment>> {
        self.storage.load(EQUIPMENT_KEY, Vec::new())
    }

    /// Append `equipment` and return its index.
    ///
    /// Names are not required to be unique.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` if the name is blank, or a storage error.
    pub fn add_equipment(&mut self, equipment: Equipment) -> Result<usize> {
        equipment.validate()?;
        let index = self
            .storage
            .update(EQUIPMENT_KEY, Vec::new(), |list: &mut Vec<Equipment>| {
                list.push(equipment);
                Ok(list.len() - 1)
            })?;
        info!(index, "Added equipment");
        Ok(index)
    }

    /// Equipment whose name contains `query`, ignoring case.
    ///
    /// Only names are searched. Results keep insertion order; an empty query
    /// returns everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn search(&self, query: &str) -> Result<Vec<Equipment>> {
        let needle = query.to_lowercase();
        let mut equipment = self.equipment()?;
        equipment.retain(|eq| eq.name.to_lowercase().contains(&needle));
        debug!(query, matches = equipment.len(), "Searched equipment");
        Ok(equipment)
    }

    /// Resolve an equipment index to the name stored at that index.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPrerequisite` if there is no equipment and
    /// `Error::InvalidReference` if `index` is out of range.
    pub fn resolve_equipment(&self, index: usize) -> Result<String> {
        resolve_name(&self.equipment()?, index, "equipment reference")
    }

    // === Tasks ===

    /// All tasks in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.storage.load(TASKS_KEY, Vec::new())
    }

    /// Schedule a task for the equipment at `request.equipment_index`.
    ///
    /// The equipment name is copied into the task; later changes to the
    /// equipment list do not affect it. On any error the task list is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField`, `Error::EmptyPrerequisite`,
    /// `Error::InvalidReference`, or a storage error.
    pub fn add_task(&mut self, request: NewTask) -> Result<Task> {
        request.validate()?;
        let task = self.storage.batch(|batch| {
            let name = resolve_in(batch, request.equipment_index, "task")?;
            let task = request.into_task(name);
            let mut tasks: Vec<Task> = batch.load(TASKS_KEY, Vec::new())?;
            tasks.push(task.clone());
            batch.save(TASKS_KEY, &tasks)?;
            Ok(task)
        })?;
        info!(equipment = %task.equipment, "Added task");
        Ok(task)
    }

    // === Work orders ===

    /// All work orders in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn work_orders(&self) -> Result<Vec<WorkOrder>> {
        self.storage.load(WORK_ORDERS_KEY, Vec::new())
    }

    /// Log a work order for the equipment at `request.equipment_index`.
    ///
    /// Same snapshot and failure rules as [`MaintenanceStore::add_task`].
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField`, `Error::EmptyPrerequisite`,
    /// `Error::InvalidReference`, or a storage error.
    pub fn add_work_order(&mut self, request: NewWorkOrder) -> Result<WorkOrder> {
        request.validate()?;
        let order = self.storage.batch(|batch| {
            let name = resolve_in(batch, request.equipment_index, "work order")?;
            let order = request.into_work_order(name);
            let mut orders: Vec<WorkOrder> = batch.load(WORK_ORDERS_KEY, Vec::new())?;
            orders.push(order.clone());
            batch.save(WORK_ORDERS_KEY, &orders)?;
            Ok(order)
        })?;
        info!(equipment = %order.equipment, "Added work order");
        Ok(order)
    }

    // === Checklists ===

    /// The whole checklist mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn checklists(&self) -> Result<Checklists> {
        self.storage.load(CHECKLIST_KEY, Checklists::default())
    }

    /// Checklist entries for the exact equipment name `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn checklist_for(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.checklists()?.entries_for(name).to_vec())
    }

    /// Append `text` to the checklist keyed by `name`.
    ///
    /// The name is used verbatim; it is not checked against the equipment
    /// list beyond requiring that some equipment exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPrerequisite` if no equipment exists,
    /// `Error::MissingField` if `text` is blank, or a storage error.
    pub fn add_checklist_entry(&mut self, name: &str, text: &str) -> Result<()> {
        require_entry(text)?;
        self.storage.batch(|batch| {
            let equipment: Vec<Equipment> = batch.load(EQUIPMENT_KEY, Vec::new())?;
            if equipment.is_empty() {
                return Err(Error::EmptyPrerequisite {
                    record: "checklist entry",
                });
            }
            push_entry(batch, name, text)
        })?;
        info!(equipment = name, "Added checklist entry");
        Ok(())
    }

    /// Append `text` to the checklist of the equipment at `index`.
    ///
    /// Returns the resolved equipment name.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPrerequisite`, `Error::InvalidReference`,
    /// `Error::MissingField`, or a storage error.
    pub fn add_checklist_entry_for(&mut self, index: usize, text: &str) -> Result<String> {
        require_entry(text)?;
        let name = self.storage.batch(|batch| {
            let name = resolve_in(batch, index, "checklist entry")?;
            push_entry(batch, &name, text)?;
            Ok(name)
        })?;
        info!(equipment = %name, "Added checklist entry");
        Ok(name)
    }

    /// Drop the whole checklist for `name`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded or saved.
    pub fn remove_checklist(&mut self, name: &str) -> Result<bool> {
        let removed = self
            .storage
            .update(CHECKLIST_KEY, Checklists::default(), |lists: &mut Checklists| {
                Ok(lists.remove(name))
            })?;
        if removed {
            info!(equipment = name, "Removed checklist");
        }
        Ok(removed)
    }

    // === Backup ===

    /// Snapshot every collection into a backup document.
    ///
    /// The reduced variant leaves out the checklist.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be loaded.
    pub fn export_all(&self, variant: BackupVariant) -> Result<BackupDocument> {
        let checklist = match variant {
            BackupVariant::Full => Some(self.checklists()?),
            BackupVariant::Reduced => None,
        };
        Ok(BackupDocument {
            equipment: Some(self.equipment()?),
            tasks: Some(self.tasks()?),
            work_orders: Some(self.work_orders()?),
            checklist,
        })
    }

    /// Replace every collection from `document`.
    ///
    /// Collections missing from the document are reset to empty. All four
    /// keys are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the collections cannot be saved.
    pub fn import_all(&mut self, document: BackupDocument) -> Result<()> {
        let equipment = document.equipment.unwrap_or_default();
        let tasks = document.tasks.unwrap_or_default();
        let work_orders = document.work_orders.unwrap_or_default();
        let checklist = document.checklist.unwrap_or_default();

        self.storage.batch(|batch| {
            batch.save(EQUIPMENT_KEY, &equipment)?;
            batch.save(TASKS_KEY, &tasks)?;
            batch.save(WORK_ORDERS_KEY, &work_orders)?;
            batch.save(CHECKLIST_KEY, &checklist)
        })?;

        info!(
            equipment = equipment.len(),
            tasks = tasks.len(),
            work_orders = work_orders.len(),
            checklists = checklist.len(),
            "Restored backup"
        );
        Ok(())
    }

    // === Summary ===

    /// Counts for every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be loaded.
    pub fn summary(&self) -> Result<Summary> {
        let checklists = self.checklists()?;
        let mut last_updated = None;
        for key in [EQUIPMENT_KEY, TASKS_KEY, WORK_ORDERS_KEY, CHECKLIST_KEY] {
            last_updated = last_updated.max(self.storage.updated_at(key)?);
        }

        Ok(Summary {
            equipment: self.equipment()?.len(),
            tasks: self.tasks()?.len(),
            work_orders: self.work_orders()?.len(),
            checklist_buckets: checklists.len(),
            checklist_entries: checklists.entry_count(),
            last_updated,
        })
    }
}

fn resolve_name(equipment: &[Equipment], index: usize, record: &'static str) -> Result<String> {
    if equipment.is_empty() {
        return Err(Error::EmptyPrerequisite { record });
    }
    equipment
        .get(index)
        .map(|eq| eq.name.clone())
        .ok_or(Error::InvalidReference {
            index,
            len: equipment.len(),
        })
}

fn resolve_in(batch: &Batch<'_>, index: usize, record: &'static str) -> Result<String> {
    let equipment: Vec<Equipment> = batch.load(EQUIPMENT_KEY, Vec::new())?;
    resolve_name(&equipment, index, record)
}

fn push_entry(batch: &Batch<'_>, name: &str, text: &str) -> Result<()> {
    let mut lists: Checklists = batch.load(CHECKLIST_KEY, Checklists::default())?;
    lists.push(name, text.to_string());
    batch.save(CHECKLIST_KEY, &lists)
}

fn require_entry(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        Err(Error::missing_field("checklist entry", "text"))
    } else {
        Ok(())
    }
}
