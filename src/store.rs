use crate::db::CounterRepository;
use crate::model::{CounterRecord, DEFAULT_COUNTER_NAME};
use crate::remote::{self, RemoteCommand, RemoteControl};
use crate::transfer::{self, ImportEntry};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;

/// What subscribers render: every counter plus the active id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub counters: Vec<CounterRecord>,
    pub active_id: Option<i64>,
}

impl CountersSnapshot {
    pub fn active(&self) -> Option<&CounterRecord> {
        let id = self.active_id?;
        self.counters.iter().find(|c| c.id == id)
    }
}

/// In-memory owner of the counter list and of the active counter.
///
/// The active counter is tracked by id only and always read out of the list,
/// so there is a single copy of every record. Value changes stay in memory
/// until [`CounterStore::persist_all`]; structural changes (add, delete) go
/// to the repository immediately. When a repository call fails the in-memory
/// change is kept and the error is returned.
pub struct CounterStore {
    repo: Arc<dyn CounterRepository>,
    counters: Vec<CounterRecord>,
    active_id: Option<i64>,
    tx: watch::Sender<CountersSnapshot>,
    remote: RemoteControl,
    remote_rx: UnboundedReceiver<RemoteCommand>,
}

impl CounterStore {
    pub fn new(repo: Arc<dyn CounterRepository>) -> Self {
        let (tx, _) = watch::channel(CountersSnapshot::default());
        let (remote, remote_rx) = remote::channel();
        Self {
            repo,
            counters: Vec::new(),
            active_id: None,
            tx,
            remote,
            remote_rx,
        }
    }

    /// Replaces the in-memory state with what the repository holds.
    ///
    /// An empty database gets one default counter. `active_hint` is the id
    /// that was active last session; the first counter is used if it is gone.
    pub fn load(&mut self, active_hint: Option<i64>) -> Result<()> {
        self.counters = self.repo.get_all()?;
        self.active_id = None;

        if self.counters.is_empty() {
            self.add_counter(None, None)?;
            return Ok(());
        }

        self.active_id = active_hint
            .filter(|id| self.index_of(*id).is_some())
            .or_else(|| self.counters.first().map(|c| c.id));
        log::info!(
            "Loaded {} counters, active: {:?}",
            self.counters.len(),
            self.active_id
        );
        self.publish();
        Ok(())
    }

    // --- QUERIES ---

    pub fn counters(&self) -> &[CounterRecord] {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&CounterRecord> {
        self.counters.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<i64> {
        self.active_id
    }

    pub fn active(&self) -> Option<&CounterRecord> {
        self.get(self.active_id?)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.index_of(self.active_id?)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            counters: self.counters.clone(),
            active_id: self.active_id,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CountersSnapshot> {
        self.tx.subscribe()
    }

    pub fn remote_control(&self) -> RemoteControl {
        self.remote.clone()
    }

    /// Name suggested by the "new counter" dialog, based on the next id the
    /// database will hand out.
    pub fn next_default_name(&self) -> Result<String> {
        let last_id = self.repo.get_last_id()?.unwrap_or(0);
        Ok(format!("{}{}", DEFAULT_COUNTER_NAME, last_id + 1))
    }

    fn index_of(&self, id: i64) -> Option<usize> {
        self.counters.iter().position(|c| c.id == id)
    }

    fn active_mut(&mut self) -> Option<&mut CounterRecord> {
        let id = self.active_id?;
        self.counters.iter_mut().find(|c| c.id == id)
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }

    // --- COLLECTION ---

    /// Inserts a new counter, appends it and makes it active. A blank or
    /// missing name gets the placeholder.
    pub fn add_counter(&mut self, name: Option<&str>, value: Option<i64>) -> Result<CounterRecord> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_COUNTER_NAME);
        let record = self.repo.insert(name, value.unwrap_or(0))?;
        log::info!("Added counter {} ({})", record.id, record.display_name());

        self.counters.push(record.clone());
        self.active_id = Some(record.id);
        self.publish();
        Ok(record)
    }

    /// Removes a counter and picks the element before it as the new active
    /// counter (or the first one). Deleting the last remaining counter
    /// creates a fresh default counter.
    pub fn delete_counter(&mut self, id: i64) -> Result<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| anyhow!("Counter {} not found", id))?;
        self.counters.remove(index);

        let deleted = self.repo.delete_by_id(id);
        if let Err(e) = &deleted {
            log::warn!("Counter {} removed from memory only: {:#}", id, e);
        }

        if self.counters.is_empty() {
            self.active_id = None;
            self.publish();
            let added = self.add_counter(None, None);
            deleted?;
            added?;
            return Ok(());
        }

        let next = index.saturating_sub(1).min(self.counters.len() - 1);
        self.active_id = Some(self.counters[next].id);
        self.publish();
        deleted
    }

    /// Empties the collection and the database, then starts over with one
    /// default counter.
    pub fn delete_all(&mut self) -> Result<CounterRecord> {
        self.counters.clear();
        self.active_id = None;
        self.publish();

        let cleared = self.repo.delete_all();
        if let Err(e) = &cleared {
            log::warn!("Counters cleared from memory only: {:#}", e);
        }
        let record = self.add_counter(None, None)?;
        cleared?;
        Ok(record)
    }

    /// Returns `false` when no counter has this id.
    pub fn set_active_counter(&mut self, id: i64) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.active_id = Some(id);
        self.publish();
        true
    }

    // --- ACTIVE COUNTER ---

    fn modify_active<F>(&mut self, f: F) -> Option<i64>
    where
        F: FnOnce(&mut CounterRecord),
    {
        let counter = self.active_mut()?;
        f(counter);
        let value = counter.value;
        self.publish();
        Some(value)
    }

    pub fn increment_active(&mut self) -> Option<i64> {
        self.modify_active(CounterRecord::increment)
    }

    pub fn decrement_active(&mut self) -> Option<i64> {
        self.modify_active(CounterRecord::decrement)
    }

    pub fn reset_active(&mut self) -> Option<i64> {
        self.modify_active(CounterRecord::reset)
    }

    pub fn set_active_value(&mut self, value: i64) -> Option<i64> {
        self.modify_active(|c| c.value = value)
    }

    /// A blank name restores the placeholder.
    pub fn rename_active(&mut self, name: &str) -> bool {
        let name = match name.trim() {
            "" => DEFAULT_COUNTER_NAME.to_string(),
            n => n.to_string(),
        };
        self.modify_active(|c| c.name = name).is_some()
    }

    /// The active counter is its own collection entry, so nothing needs
    /// copying; this re-announces the current state so subscribers redraw it.
    pub fn synchronize_collection_with_active(&self) {
        self.publish();
    }

    /// Applies every queued remote command to the active counter.
    pub fn apply_remote_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.remote_rx.try_recv() {
            let Some(counter) = self.active_mut() else {
                log::debug!("Remote command {:?} ignored: no active counter", command);
                continue;
            };
            match command {
                RemoteCommand::Increment => counter.increment(),
                RemoteCommand::Decrement => counter.decrement(),
            }
            applied += 1;
        }
        if applied > 0 {
            self.synchronize_collection_with_active();
        }
        applied
    }

    // --- PERSISTENCE ---

    /// Writes every counter to the repository. All counters are attempted
    /// even if some fail.
    pub fn persist_all(&self) -> Result<()> {
        persist_records(self.repo.as_ref(), &self.counters)
    }

    /// Adds the entries that do not already exist with the same name and
    /// value. Returns how many counters were added.
    pub fn import_entries(&mut self, entries: Vec<ImportEntry>) -> Result<usize> {
        let fresh = transfer::select_new_entries(&self.counters, entries);
        let mut added = 0;
        for entry in fresh {
            self.add_counter(Some(&entry.name), Some(entry.value))?;
            added += 1;
        }
        log::info!("Imported {} counters", added);
        Ok(added)
    }
}

/// Writes a snapshot of counters, e.g. from a background task.
pub fn persist_records(repo: &dyn CounterRepository, counters: &[CounterRecord]) -> Result<()> {
    let mut failures = Vec::new();
    for counter in counters {
        if let Err(e) = repo.update(counter) {
            log::warn!("{:#}", e);
            failures.push(counter.id);
        }
    }
    if failures.is_empty() {
        log::debug!("Persisted {} counters", counters.len());
        Ok(())
    } else {
        Err(anyhow!(
            "Failed to save {} of {} counters (ids {:?})",
            failures.len(),
            counters.len(),
            failures
        ))
    }
}
