#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use flowctl::{
    engine::{EngineError, LogicalClock, NotificationSource},
    inmem::{MemoryEngine, WriteBatch},
    mvcc::Timestamp,
    query::Column,
};

/// Replays a fixed sequence of `(clock_before, outstanding, clock_after)`
/// samples, reporting the engine as unavailable once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    clocks: Mutex<VecDeque<u64>>,
    counts: Mutex<VecDeque<u64>>,
}

impl ScriptedSource {
    pub fn new(samples: &[(u64, u64, u64)]) -> Self {
        let mut clocks = VecDeque::new();
        let mut counts = VecDeque::new();
        for &(before, outstanding, after) in samples {
            clocks.push_back(before);
            counts.push_back(outstanding);
            clocks.push_back(after);
        }
        Self {
            clocks: Mutex::new(clocks),
            counts: Mutex::new(counts),
        }
    }

    pub fn remaining_counts(&self) -> usize {
        self.counts.lock().unwrap().len()
    }
}

impl NotificationSource for ScriptedSource {
    async fn count(&self) -> Result<u64, EngineError> {
        self.counts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::Unavailable("script exhausted".to_string()))
    }
}

impl LogicalClock for ScriptedSource {
    async fn now(&self) -> Result<Timestamp, EngineError> {
        self.clocks
            .lock()
            .unwrap()
            .pop_front()
            .map(Timestamp::new)
            .ok_or_else(|| EngineError::Unavailable("script exhausted".to_string()))
    }
}

pub fn column(raw: &str) -> Column {
    match raw.split_once(':') {
        Some((family, qualifier)) => Column::new(family.to_string(), qualifier.to_string()),
        None => Column::new(raw.to_string(), String::new()),
    }
}

/// Engine holding `rows`, each a row key with its `(column, value)` cells.
pub fn engine_with(rows: &[(&str, &[(&str, &str)])]) -> MemoryEngine {
    let engine = MemoryEngine::new();
    let mut batch = WriteBatch::new();
    for (row, cells) in rows {
        for (raw_column, value) in cells.iter() {
            batch = batch.set(row.to_string(), column(raw_column), value.to_string());
        }
    }
    if !batch.is_empty() {
        engine.commit(batch).unwrap();
    }
    engine
}
