//! Change reconciliation for a single collection.
//!
//! [`Collection`] holds the rows of one table in display order and applies
//! [`ChangeEvent`]s to it. After every operation:
//! - no two entries share an id;
//! - in [`CacheScope::VisibleOnly`], every entry is visible.
//!
//! An update that changes a row's primary key is refused and leaves the
//! collection untouched.

use crate::cache::CacheScope;
use bistro_model::Record;
use bistro_types::{ChangeEvent, RecordId};
use tracing::{debug, warn};

/// The effect an event had on a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A row entered the collection.
    Added(String),
    /// A row was replaced with a different version.
    Updated(String),
    /// A row left the collection.
    Removed(String),
}

/// Rows of one table, newest first.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    scope: CacheScope,
    rows: Vec<R>,
}

impl<R: Record> Collection<R> {
    pub fn new(scope: CacheScope) -> Self {
        Self {
            scope,
            rows: Vec::new(),
        }
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    fn admits(&self, record: &R) -> bool {
        self.scope == CacheScope::All || record.is_visible()
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.rows.iter().position(|r| r.id() == id)
    }

    /// Replaces every row. Later duplicates of an id and rows outside the
    /// scope are dropped.
    pub fn replace_all(&mut self, rows: Vec<R>) {
        let mut kept: Vec<R> = Vec::with_capacity(rows.len());
        for row in rows {
            if self.admits(&row) && !kept.iter().any(|k| k.id() == row.id()) {
                kept.push(row);
            }
        }
        self.rows = kept;
    }

    /// Applies one change. Returns `None` when the collection is unchanged.
    pub fn apply(&mut self, event: ChangeEvent<R>) -> Option<Applied> {
        let applied = match event {
            ChangeEvent::Insert(record) => self.upsert(record),
            ChangeEvent::Update { old, new } => {
                if new.id() != old.id() {
                    warn!(
                        "Refused {} update changing key {} to {}",
                        R::TABLE,
                        old.id(),
                        new.id()
                    );
                    return None;
                }
                if self.admits(&new) {
                    self.upsert(new)
                } else {
                    self.remove(old.id())
                }
            }
            ChangeEvent::Delete(id) => self.remove(&id),
        };
        if let Some(applied) = &applied {
            debug!("Applied {:?} to {}", applied, R::TABLE);
        }
        applied
    }

    /// Replaces the entry with the same id in place, or prepends.
    fn upsert(&mut self, record: R) -> Option<Applied> {
        if !self.admits(&record) {
            return None;
        }
        match self.position(record.id()) {
            Some(i) if self.rows[i] == record => None,
            Some(i) => {
                let name = record.display_name().to_string();
                self.rows[i] = record;
                Some(Applied::Updated(name))
            }
            None => {
                let name = record.display_name().to_string();
                self.rows.insert(0, record);
                Some(Applied::Added(name))
            }
        }
    }

    fn remove(&mut self, id: &RecordId) -> Option<Applied> {
        let i = self.position(id)?;
        let removed = self.rows.remove(i);
        Some(Applied::Removed(removed.display_name().to_string()))
    }
}
