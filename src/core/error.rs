use crate::core::types::{EntityId, HiveId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HiveError {
    #[error("Agent not found: {0:?}")]
    AgentNotFound(EntityId),

    #[error("Hive not found: {0:?}")]
    HiveNotFound(HiveId),

    #[error("No free slot in hive {0:?}")]
    NoFreeSlot(HiveId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HiveError>;
