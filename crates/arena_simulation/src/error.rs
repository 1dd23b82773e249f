//! Ошибки симуляции
//!
//! Gameplay-отказы (не authority, cooldown, неактивная сфера) — это
//! ожидаемые no-op ветки: системы логируют их и идут дальше, состояние
//! не меняется.

use thiserror::Error;

/// Отказ gameplay-операции. Состояние при этом не изменено.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameplayError {
    #[error("mutation rejected: process is not the authority")]
    NotAuthority,

    #[error("sphere attack is on cooldown ({remaining:.2}s remaining)")]
    OnCooldown { remaining: f32 },

    #[error("sphere attack is not active")]
    NotActive,
}

/// Ошибки wire-формата репликации
#[derive(Error, Debug)]
pub enum WireError {
    #[error("failed to encode replication frame: {0}")]
    Encode(#[from] ron::Error),

    #[error("failed to decode replication frame: {0}")]
    Decode(#[from] ron::error::SpannedError),

    #[error("replication frame is not valid utf-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Ошибки загрузки/валидации конфига
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
