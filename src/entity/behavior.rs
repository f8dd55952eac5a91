//! Per-agent behaviour configuration

use serde::{Deserialize, Deserializer, Serialize};

use crate::world::block::ResourceTag;

/// Which resource goal an agent runs; the two are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Works a node for a while and brings back nectar
    Forager,
    /// Harvests nodes into its inventory until full
    Harvester,
}

/// How an agent responds to being attacked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggressionConfig {
    /// Fight back against the last attacker
    pub retaliates: bool,
    /// How long an attack keeps the agent enraged
    pub enrage_ticks: u32,
    pub attack_damage: f32,
    /// Distance at which an attack lands
    pub attack_reach: f32,
    pub attack_cooldown_ticks: u32,
    /// Forget the attacker after landing one hit
    pub single_strike: bool,
}

impl Default for AggressionConfig {
    fn default() -> Self {
        Self {
            retaliates: true,
            enrage_ticks: 400,
            attack_damage: 2.0,
            attack_reach: 1.5,
            attack_cooldown_ticks: 20,
            single_strike: true,
        }
    }
}

/// Missing fields fall back to the preset of the given `kind` (forager if absent)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BehaviorOverrides")]
pub struct BehaviorConfig {
    pub kind: BehaviorKind,
    /// Blocks per tick while foraging or following a directive
    pub flight_speed: f32,
    /// Blocks per tick while fleeing home
    pub flee_speed: f32,
    /// Blocks per tick while chasing an attacker
    pub attack_speed: f32,
    /// Distance at which a target or home counts as reached
    pub reach_distance: f32,
    /// Ticks spent working a node
    pub work_ticks: u32,
    /// Radius of the agent's own fallback area search
    pub search_radius: i32,
    pub resource_tag: ResourceTag,
    pub max_health: f32,
    pub inventory_slots: usize,
    /// Return home once this many items are carried
    pub return_threshold: Option<u32>,
    /// Same-hive agents within this distance join a fight
    pub alert_radius: f32,
    pub aggression: AggressionConfig,
}

impl BehaviorConfig {
    pub fn forager() -> Self {
        Self {
            kind: BehaviorKind::Forager,
            flight_speed: 0.3,
            flee_speed: 0.45,
            attack_speed: 0.4,
            reach_distance: 1.0,
            work_ticks: 400,
            search_radius: 5,
            resource_tag: ResourceTag::Flowers,
            max_health: 10.0,
            inventory_slots: 0,
            return_threshold: None,
            alert_radius: 12.0,
            aggression: AggressionConfig::default(),
        }
    }

    pub fn harvester() -> Self {
        Self {
            kind: BehaviorKind::Harvester,
            work_ticks: 60,
            resource_tag: ResourceTag::Crops,
            inventory_slots: 4,
            return_threshold: Some(32),
            ..Self::forager()
        }
    }

    pub fn preset(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::Forager => Self::forager(),
            BehaviorKind::Harvester => Self::harvester(),
        }
    }

    pub fn with_tag(mut self, tag: ResourceTag) -> Self {
        self.resource_tag = tag;
        self
    }

    pub fn with_work_ticks(mut self, ticks: u32) -> Self {
        self.work_ticks = ticks;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.flight_speed <= 0.0 || self.flee_speed <= 0.0 || self.attack_speed <= 0.0 {
            return Err("Speeds must be positive".into());
        }
        if self.reach_distance <= 0.0 {
            return Err("reach_distance must be positive".into());
        }
        if self.work_ticks == 0 {
            return Err("work_ticks must be at least 1".into());
        }
        if self.kind == BehaviorKind::Harvester && self.inventory_slots == 0 {
            return Err("Harvesters need at least one inventory slot".into());
        }
        if self.max_health <= 0.0 {
            return Err("max_health must be positive".into());
        }
        Ok(())
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self::forager()
    }
}

/// Fields a config file may set on top of a preset
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BehaviorOverrides {
    pub kind: Option<BehaviorKind>,
    pub flight_speed: Option<f32>,
    pub flee_speed: Option<f32>,
    pub attack_speed: Option<f32>,
    pub reach_distance: Option<f32>,
    pub work_ticks: Option<u32>,
    pub search_radius: Option<i32>,
    pub resource_tag: Option<ResourceTag>,
    pub max_health: Option<f32>,
    pub inventory_slots: Option<usize>,
    pub return_threshold: Option<u32>,
    pub alert_radius: Option<f32>,
    pub aggression: Option<AggressionConfig>,
}

impl BehaviorOverrides {
    /// Overlay the fields that were set onto `base`
    pub fn apply(self, mut base: BehaviorConfig) -> BehaviorConfig {
        if let Some(kind) = self.kind {
            base.kind = kind;
        }
        if let Some(v) = self.flight_speed {
            base.flight_speed = v;
        }
        if let Some(v) = self.flee_speed {
            base.flee_speed = v;
        }
        if let Some(v) = self.attack_speed {
            base.attack_speed = v;
        }
        if let Some(v) = self.reach_distance {
            base.reach_distance = v;
        }
        if let Some(v) = self.work_ticks {
            base.work_ticks = v;
        }
        if let Some(v) = self.search_radius {
            base.search_radius = v;
        }
        if let Some(v) = self.resource_tag {
            base.resource_tag = v;
        }
        if let Some(v) = self.max_health {
            base.max_health = v;
        }
        if let Some(v) = self.inventory_slots {
            base.inventory_slots = v;
        }
        if self.return_threshold.is_some() {
            base.return_threshold = self.return_threshold;
        }
        if let Some(v) = self.alert_radius {
            base.alert_radius = v;
        }
        if let Some(v) = self.aggression {
            base.aggression = v;
        }
        base
    }

    fn over_preset(self, fallback: BehaviorKind) -> BehaviorConfig {
        let base = BehaviorConfig::preset(self.kind.unwrap_or(fallback));
        self.apply(base)
    }
}

impl From<BehaviorOverrides> for BehaviorConfig {
    fn from(overrides: BehaviorOverrides) -> Self {
        overrides.over_preset(BehaviorKind::Forager)
    }
}

/// `deserialize_with` for a `[forager]` table
pub fn forager_table<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BehaviorConfig, D::Error> {
    Ok(BehaviorOverrides::deserialize(deserializer)?.over_preset(BehaviorKind::Forager))
}

/// `deserialize_with` for a `[harvester]` table
pub fn harvester_table<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BehaviorConfig, D::Error> {
    Ok(BehaviorOverrides::deserialize(deserializer)?.over_preset(BehaviorKind::Harvester))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(BehaviorConfig::forager().validate().is_ok());
        assert!(BehaviorConfig::harvester().validate().is_ok());
    }

    #[test]
    fn test_harvester_without_inventory_is_invalid() {
        let mut config = BehaviorConfig::harvester();
        config.inventory_slots = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_from_its_kind() {
        let config: BehaviorConfig =
            serde_json::from_str(r#"{"kind": "harvester", "work_ticks": 5}"#).unwrap();
        assert_eq!(config.work_ticks, 5);
        assert_eq!(config.resource_tag, ResourceTag::Crops);
        assert_eq!(config.inventory_slots, BehaviorConfig::harvester().inventory_slots);

        let config: BehaviorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.kind, BehaviorKind::Forager);
        assert_eq!(config.resource_tag, ResourceTag::Flowers);
    }

    #[test]
    fn test_builders() {
        let config = BehaviorConfig::forager()
            .with_tag(ResourceTag::Mushrooms)
            .with_work_ticks(5);
        assert_eq!(config.resource_tag, ResourceTag::Mushrooms);
        assert_eq!(config.work_ticks, 5);
    }
}
