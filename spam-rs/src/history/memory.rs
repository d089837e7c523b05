//! In-memory history store

use std::sync::RwLock;

use super::store::HistoryStore;
use super::types::{ClassificationEvent, HistoryQuery, StructuredProjection};
use crate::error::{Result, SpamError};

/// History held in process memory; nothing survives a restart
#[derive(Default)]
pub struct MemoryHistoryStore {
    events: RwLock<Vec<ClassificationEvent>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> SpamError {
    SpamError::Storage("history lock poisoned".to_string())
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, event: &ClassificationEvent) -> Result<()> {
        self.events.write().map_err(poisoned)?.push(event.clone());
        Ok(())
    }

    fn query(&self, query: &HistoryQuery) -> Result<Vec<String>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(query.apply(events.iter().map(|e| e.render())))
    }

    fn clear(&self) -> Result<()> {
        self.events.write().map_err(poisoned)?.clear();
        Ok(())
    }

    fn read_structured(&self) -> Result<Option<StructuredProjection>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(StructuredProjection::from_events(events.iter()))
    }
}
