//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. Configs load from TOML; any field
//! left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{HiveError, Result};
use crate::core::types::Tick;
use crate::entity::behavior::{forager_table, harvester_table, BehaviorConfig, BehaviorKind};

/// Configuration for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TIME ===
    /// Simulated ticks per simulated second
    ///
    /// All `*_secs` settings are converted with this rate.
    pub ticks_per_second: u32,

    /// Longest an agent may spend seeking before giving up and returning
    ///
    /// At 40s and 20 ticks/s an agent gets 800 ticks to reach a node.
    pub seek_timeout_secs: f32,

    /// Longest an agent may spend flying home before being relocated
    ///
    /// When it fires the agent is placed next to its hive rather than left
    /// stuck against terrain.
    pub return_timeout_secs: f32,

    // === GOALS ===
    /// Health fraction below which an agent flees to its hive
    pub critical_health_ratio: f32,

    // === HIVE ===
    /// Resident slots per hive
    pub hive_slots: usize,

    /// Radius of the hive's periodic resource scan (blocks)
    ///
    /// Scan cost grows with the cube of this value.
    pub hive_scan_radius: i32,

    /// Ticks between hive resource scans
    pub rescan_cooldown_ticks: u32,

    /// Ticks an agent stays inside after returning
    pub rest_ticks: u32,

    /// Ticks after leaving before a slot may start seeking again
    pub forage_cooldown_ticks: u32,

    /// Health regained per tick while inside
    pub rest_heal_per_tick: f32,

    /// Hive honey level cap; each nectar delivery adds one
    pub max_honey_level: u32,

    // === NAVIGATION ===
    /// A* gives up after expanding this many nodes
    pub max_path_nodes: usize,

    /// Ticks without getting closer to the current waypoint before the
    /// cached path is thrown away
    pub stall_ticks: u32,

    // === WORLD ===
    /// Per-plant chance each tick to grow one stage
    pub plant_growth_chance: f32,

    // === BEHAVIOUR PRESETS ===
    /// Fields left out of the table keep the built-in forager preset
    #[serde(deserialize_with = "forager_table")]
    pub forager: BehaviorConfig,
    /// Fields left out of the table keep the built-in harvester preset
    #[serde(deserialize_with = "harvester_table")]
    pub harvester: BehaviorConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            seek_timeout_secs: 40.0,
            return_timeout_secs: 60.0,

            critical_health_ratio: 0.30,

            hive_slots: 3,
            hive_scan_radius: 8,
            rescan_cooldown_ticks: 200,
            rest_ticks: 400,
            forage_cooldown_ticks: 100,
            rest_heal_per_tick: 0.05,
            max_honey_level: 5,

            max_path_nodes: 2048,
            stall_ticks: 40,

            plant_growth_chance: 0.02,

            forager: BehaviorConfig::forager(),
            harvester: BehaviorConfig::harvester(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(HiveError::InvalidConfig)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn secs_to_ticks(&self, secs: f32) -> Tick {
        (secs * self.ticks_per_second as f32).round().max(1.0) as Tick
    }

    pub fn seek_timeout_ticks(&self) -> Tick {
        self.secs_to_ticks(self.seek_timeout_secs)
    }

    pub fn return_timeout_ticks(&self) -> Tick {
        self.secs_to_ticks(self.return_timeout_secs)
    }

    /// Preset behaviour for a kind of agent
    pub fn behavior(&self, kind: BehaviorKind) -> BehaviorConfig {
        match kind {
            BehaviorKind::Forager => self.forager.clone(),
            BehaviorKind::Harvester => self.harvester.clone(),
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.ticks_per_second == 0 {
            return Err("ticks_per_second must be at least 1".into());
        }

        if self.seek_timeout_secs <= 0.0 || self.return_timeout_secs <= 0.0 {
            return Err("Timeouts must be positive".into());
        }

        if !(self.critical_health_ratio > 0.0 && self.critical_health_ratio < 1.0) {
            return Err(format!(
                "critical_health_ratio ({}) must be between 0 and 1",
                self.critical_health_ratio
            ));
        }

        if self.hive_slots == 0 {
            return Err("hive_slots must be at least 1".into());
        }

        if self.max_path_nodes == 0 {
            return Err("max_path_nodes must be at least 1".into());
        }

        if self.forager.kind != BehaviorKind::Forager {
            return Err("forager preset must have kind = \"forager\"".into());
        }
        if self.harvester.kind != BehaviorKind::Harvester {
            return Err("harvester preset must have kind = \"harvester\"".into());
        }
        self.forager.validate()?;
        self.harvester.validate()?;

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<SimulationConfig> = OnceLock::new();

/// Get the global simulation config (initializes with defaults if not set)
pub fn config() -> &'static SimulationConfig {
    CONFIG.get_or_init(SimulationConfig::default)
}

/// Set the global simulation config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: SimulationConfig) -> std::result::Result<(), SimulationConfig> {
    CONFIG.set(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::block::ResourceTag;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_seek_timeout_is_forty_seconds() {
        let config = SimulationConfig::default();
        assert_eq!(config.seek_timeout_ticks(), 800);
        assert_eq!(config.return_timeout_ticks(), 1200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            hive_slots = 5
            seek_timeout_secs = 10.0

            [harvester]
            inventory_slots = 2
            return_threshold = 8

            [forager]
            work_ticks = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.hive_slots, 5);
        assert_eq!(config.seek_timeout_ticks(), 200);
        assert_eq!(config.harvester.return_threshold, Some(8));
        assert_eq!(config.harvester.inventory_slots, 2);
        // Unspecified fields keep the table's own preset
        assert_eq!(config.harvester.kind, BehaviorKind::Harvester);
        assert_eq!(config.harvester.resource_tag, ResourceTag::Crops);
        assert_eq!(config.harvester.work_ticks, BehaviorConfig::harvester().work_ticks);
        assert_eq!(config.forager.work_ticks, 100);
        assert_eq!(config.forager.resource_tag, ResourceTag::Flowers);
        assert_eq!(config.rest_ticks, SimulationConfig::default().rest_ticks);
    }

    #[test]
    fn test_invalid_toml_values_are_rejected() {
        let err = SimulationConfig::from_toml_str("critical_health_ratio = 1.5").unwrap_err();
        assert!(matches!(err, HiveError::InvalidConfig(_)));

        let err = SimulationConfig::from_toml_str("hive_slots = \"many\"").unwrap_err();
        assert!(matches!(err, HiveError::ConfigParse(_)));
    }

    #[test]
    fn test_behavior_lookup() {
        let config = SimulationConfig::default();
        assert_eq!(config.behavior(BehaviorKind::Harvester).kind, BehaviorKind::Harvester);
        assert_eq!(config.behavior(BehaviorKind::Forager).kind, BehaviorKind::Forager);
    }
}
