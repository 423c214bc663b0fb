//! Process-wide shared state store.
//!
//! The store is the only mutable state shared between tasks. It keeps a
//! flat `key -> value` space partitioned by record type, a monotonically
//! increasing `.count` counter per record type, and a publish/subscribe
//! channel per record type carrying counter values.
//!
//! # Guarantees
//!
//! - `save` writes every field of a record and bumps its counter as one
//!   transaction; readers never observe a partial write.
//! - `load` returns a counter-consistent snapshot; fields that were never
//!   written take the record default.
//! - `publish` emits the counter current at publish time on the record's
//!   channel. Subscribers are expected to `load` if they want data. There
//!   is no ordering guarantee across distinct channels.
//! - A bare `save` (or `update`) and a following `publish` are two
//!   independent lock acquisitions: a concurrent saver can slip between
//!   them, so the emitted counter may be newer than the one written. The
//!   fused [`Store::save_and_publish`] / [`Store::update_and_publish`]
//!   run both halves under a single lock and emit exactly the counter
//!   they wrote - one wakeup per write. Every writer in this daemon uses
//!   the fused forms.
//! - `update` is a read-modify-write under the same lock, for records with
//!   more than one logical writer (the alarm bitmap).

mod record;
mod value;

pub use record::{FieldReader, FieldWriter, Record};
pub use value::{now_timestamp, Value};

use std::collections::HashMap;
use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::{Error, Result};

#[derive(Default)]
struct Inner {
    fields: HashMap<String, Value>,
    subscribers: HashMap<&'static str, Vec<Sender<u64>>>,
}

/// Shared typed key/value store with per-record-type counters.
#[derive(Default)]
pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Initialize a record's default field values, only where absent.
    /// Idempotent.
    pub fn setup<R: Record>(&self) -> Result<()> {
        let mut inner = self.lock()?;

        let mut defaults = HashMap::new();
        R::default().pack(&mut FieldWriter::new(R::NAME, &mut defaults));
        defaults
            .entry(counter_key(R::NAME))
            .or_insert(Value::Int(0));

        for (key, value) in defaults {
            inner.fields.entry(key).or_insert(value);
        }
        Ok(())
    }

    /// Persist every field of `record` and bump its counter, atomically.
    /// Returns the new counter value.
    pub fn save<R: Record>(&self, record: &R) -> Result<u64> {
        let mut inner = self.lock()?;
        Ok(save_locked(&mut inner, record))
    }

    /// Counter-consistent snapshot of a record.
    pub fn load<R: Record>(&self) -> Result<R> {
        let inner = self.lock()?;
        Ok(R::unpack(&FieldReader::new(R::NAME, &inner.fields)))
    }

    /// Read-modify-write a record under a single lock acquisition.
    pub fn update<R: Record, F: FnOnce(&mut R)>(&self, mutate: F) -> Result<u64> {
        let mut inner = self.lock()?;
        Ok(update_locked(&mut inner, mutate))
    }

    /// Current counter of a record type.
    pub fn counter<R: Record>(&self) -> Result<u64> {
        let inner = self.lock()?;
        Ok(current_counter(&inner, R::NAME))
    }

    /// Emit the counter current at this moment on the record's channel.
    ///
    /// Disconnected subscribers are dropped silently.
    pub fn publish<R: Record>(&self) -> Result<()> {
        let mut inner = self.lock()?;
        let counter = current_counter(&inner, R::NAME);
        notify_locked(&mut inner, R::NAME, counter);
        Ok(())
    }

    /// Save and emit the written counter under one lock acquisition, so
    /// the wakeup subscribers receive is the one this save produced.
    pub fn save_and_publish<R: Record>(&self, record: &R) -> Result<u64> {
        let mut inner = self.lock()?;
        let counter = save_locked(&mut inner, record);
        notify_locked(&mut inner, R::NAME, counter);
        Ok(counter)
    }

    /// Read-modify-write and emit the written counter, all under one
    /// lock acquisition.
    pub fn update_and_publish<R: Record, F: FnOnce(&mut R)>(&self, mutate: F) -> Result<u64> {
        let mut inner = self.lock()?;
        let counter = update_locked(&mut inner, mutate);
        notify_locked(&mut inner, R::NAME, counter);
        Ok(counter)
    }

    /// Subscribe to a record type's counter channel.
    pub fn subscribe<R: Record>(&self) -> Result<Receiver<u64>> {
        let mut inner = self.lock()?;
        let (tx, rx) = unbounded();
        inner.subscribers.entry(R::NAME).or_default().push(tx);
        Ok(rx)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::State("store lock poisoned".to_string()))
    }
}

fn counter_key(name: &str) -> String {
    format!("{}.count", name)
}

fn current_counter(inner: &Inner, name: &'static str) -> u64 {
    inner
        .fields
        .get(&counter_key(name))
        .and_then(Value::as_i64)
        .unwrap_or(0) as u64
}

fn save_locked<R: Record>(inner: &mut Inner, record: &R) -> u64 {
    record.pack(&mut FieldWriter::new(R::NAME, &mut inner.fields));
    bump_counter(inner, R::NAME)
}

fn update_locked<R: Record, F: FnOnce(&mut R)>(inner: &mut Inner, mutate: F) -> u64 {
    let mut record = R::unpack(&FieldReader::new(R::NAME, &inner.fields));
    mutate(&mut record);
    record.pack(&mut FieldWriter::new(R::NAME, &mut inner.fields));
    bump_counter(inner, R::NAME)
}

fn bump_counter(inner: &mut Inner, name: &'static str) -> u64 {
    let counter = current_counter(inner, name) + 1;
    inner
        .fields
        .insert(counter_key(name), Value::Int(counter as i64));
    counter
}

fn notify_locked(inner: &mut Inner, name: &'static str, counter: u64) {
    if let Some(senders) = inner.subscribers.get_mut(name) {
        senders.retain(|tx| tx.send(counter).is_ok());
    }
}
