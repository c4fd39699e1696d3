//! Tunable engine constants.
//!
//! `EngineConstants` is a plain value passed by reference into every call.
//! `ConstantsStore` holds the one long-lived copy and swaps whole snapshots, so
//! a reader never observes a half-applied batch.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::dataset::ConstantRow;
use crate::error::ConfigError;
use crate::types::{BlendWeights, LearningRates, Level, LevelVector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZpdRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ZpdRange {
    fn default() -> Self {
        Self { min: 0.5, max: 0.8 }
    }
}

impl ZpdRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn contains(&self, probability: f64) -> bool {
        probability >= self.min && probability <= self.max
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("zpdRange.min", self.min), ("zpdRange.max", self.max)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if self.min > self.max || self.min < 0.0 || self.max > 1.0 {
            return Err(ConfigError::InvalidZpd {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

pub fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if !threshold.is_finite() {
        return Err(ConfigError::NonFinite {
            field: "masteredThreshold".to_string(),
            value: threshold,
        });
    }
    if threshold <= 0.0 || threshold > 1.0 {
        return Err(ConfigError::InvalidThreshold(threshold));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConstants {
    pub blend_weights: BlendWeights,
    pub learning_rates: LearningRates,
    pub zpd_range: ZpdRange,
    pub mastered_threshold: f64,
    pub scale: f64,
}

impl Default for EngineConstants {
    fn default() -> Self {
        Self {
            blend_weights: LevelVector {
                skill: 0.40,
                outcome: 0.25,
                competency: 0.15,
                domain: 0.10,
                subject: 0.10,
                grade: 0.0,
            },
            learning_rates: LevelVector {
                skill: 0.40,
                outcome: 0.20,
                competency: 0.10,
                domain: 0.05,
                subject: 0.05,
                grade: 0.0,
            },
            zpd_range: ZpdRange::default(),
            mastered_threshold: 0.8,
            scale: 1.0,
        }
    }
}

impl EngineConstants {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.blend_weights.validate("blendWeights")?;
        self.learning_rates.validate("learningRates")?;
        self.zpd_range.validate()?;
        validate_threshold(self.mastered_threshold)?;
        if !self.scale.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "scale".to_string(),
                value: self.scale,
            });
        }
        if self.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        Ok(())
    }

    /// Defaults overlaid with `SKILLPATH_*` environment variables. An overlay
    /// that fails validation is dropped in favour of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_f64("SKILLPATH_ZPD_MIN") {
            config.zpd_range.min = val;
        }
        if let Some(val) = env_f64("SKILLPATH_ZPD_MAX") {
            config.zpd_range.max = val;
        }
        if let Some(val) = env_f64("SKILLPATH_MASTERED_THRESHOLD") {
            config.mastered_threshold = val;
        }
        if let Some(val) = env_f64("SKILLPATH_SCALE") {
            config.scale = val;
        }

        match config.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid constants from environment");
                Self::default()
            }
        }
    }

    /// Returns a copy with every row applied. The whole batch is rejected on the
    /// first invalid row; `self` is never modified.
    pub fn with_rows(&self, rows: &[ConstantRow]) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        for row in rows {
            next.apply_row(row)?;
        }
        next.validate()?;
        Ok(next)
    }

    fn apply_row(&mut self, row: &ConstantRow) -> Result<(), ConfigError> {
        let key = row.key.trim();
        if !row.value.is_finite() {
            return Err(ConfigError::NonFinite {
                field: format!("{}.{}", row.category, key),
                value: row.value,
            });
        }

        let unknown_key = || ConfigError::UnknownKey {
            category: row.category.clone(),
            key: key.to_string(),
        };

        match row.category.trim() {
            "blendWeights" => {
                let level = Level::parse(key).ok_or_else(unknown_key)?;
                self.blend_weights.set(level, row.value);
            }
            "learningRates" => {
                let level = Level::parse(key).ok_or_else(unknown_key)?;
                self.learning_rates.set(level, row.value);
            }
            "zpdRange" => match key {
                "min" => self.zpd_range.min = row.value,
                "max" => self.zpd_range.max = row.value,
                _ => return Err(unknown_key()),
            },
            "masteredThreshold" => self.mastered_threshold = row.value,
            "scale" => self.scale = row.value,
            other => return Err(ConfigError::UnknownCategory(other.to_string())),
        }
        Ok(())
    }
}

fn env_f64(name: &str) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring non-numeric environment value");
            None
        }
    }
}

pub struct ConstantsStore {
    defaults: Arc<EngineConstants>,
    current: RwLock<Arc<EngineConstants>>,
}

impl ConstantsStore {
    pub fn new(defaults: EngineConstants) -> Result<Self, ConfigError> {
        defaults.validate()?;
        let defaults = Arc::new(defaults);
        Ok(Self {
            current: RwLock::new(Arc::clone(&defaults)),
            defaults,
        })
    }

    pub fn get(&self) -> Arc<EngineConstants> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, constants: EngineConstants) -> Result<Arc<EngineConstants>, ConfigError> {
        if let Err(err) = constants.validate() {
            tracing::warn!(error = %err, "rejected constants replacement");
            return Err(err);
        }
        let next = Arc::new(constants);
        *self.current.write() = Arc::clone(&next);
        tracing::info!("engine constants replaced");
        Ok(next)
    }

    pub fn apply_rows(&self, rows: &[ConstantRow]) -> Result<Arc<EngineConstants>, ConfigError> {
        let mut guard = self.current.write();
        let next = match guard.with_rows(rows) {
            Ok(next) => Arc::new(next),
            Err(err) => {
                tracing::warn!(error = %err, rows = rows.len(), "rejected constants batch");
                return Err(err);
            }
        };
        *guard = Arc::clone(&next);
        tracing::info!(rows = rows.len(), "engine constants updated");
        Ok(next)
    }

    pub fn reset(&self) -> Arc<EngineConstants> {
        *self.current.write() = Arc::clone(&self.defaults);
        tracing::info!("engine constants reset to defaults");
        Arc::clone(&self.defaults)
    }
}

impl Default for ConstantsStore {
    fn default() -> Self {
        let defaults = Arc::new(EngineConstants::default());
        Self {
            current: RwLock::new(Arc::clone(&defaults)),
            defaults,
        }
    }
}

static CORE_CONSTANTS: OnceLock<ConstantsStore> = OnceLock::new();

/// Process-wide store, seeded from the environment on first use. Hosts should
/// treat writes as admin-only configuration.
pub fn core_constants_store() -> &'static ConstantsStore {
    CORE_CONSTANTS.get_or_init(|| {
        ConstantsStore::new(EngineConstants::from_env()).unwrap_or_default()
    })
}

pub fn core_constants() -> Arc<EngineConstants> {
    core_constants_store().get()
}

pub fn update_core_constants(rows: &[ConstantRow]) -> Result<Arc<EngineConstants>, ConfigError> {
    core_constants_store().apply_rows(rows)
}

pub fn reset_core_constants() -> Arc<EngineConstants> {
    core_constants_store().reset()
}
