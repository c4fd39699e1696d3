use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Level;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub level: Level,
    pub entity_id: String,
    pub theta: f64,
    pub attempts: u32,
    pub correct: u32,
    pub mastered: bool,
    pub updated_at: i64,
}

/// Denormalized learner view, one record per (level, entity).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    records: HashMap<Level, HashMap<String, ProfileRecord>>,
}

impl LearnerProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: Level, entity_id: &str) -> Option<&ProfileRecord> {
        self.records.get(&level)?.get(entity_id)
    }

    /// Inserts or refreshes the record for `(level, entity_id)`.
    pub fn upsert(
        &mut self,
        level: Level,
        entity_id: &str,
        theta: f64,
        correct: bool,
        now_ms: i64,
    ) -> &mut ProfileRecord {
        let record = self
            .records
            .entry(level)
            .or_default()
            .entry(entity_id.to_string())
            .or_insert_with(|| ProfileRecord {
                level,
                entity_id: entity_id.to_string(),
                theta,
                attempts: 0,
                correct: 0,
                mastered: false,
                updated_at: now_ms,
            });
        record.theta = theta;
        record.attempts += 1;
        if correct {
            record.correct += 1;
        }
        record.updated_at = now_ms;
        record
    }

    pub fn mark_mastered(&mut self, level: Level, entity_id: &str, theta: f64, now_ms: i64) {
        if let Some(record) = self
            .records
            .get_mut(&level)
            .and_then(|m| m.get_mut(entity_id))
        {
            record.theta = theta;
            record.mastered = true;
            record.updated_at = now_ms;
        }
    }

    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileRecord> {
        self.records.values().flat_map(HashMap::values)
    }
}
