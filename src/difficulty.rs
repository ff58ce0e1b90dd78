use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How hard the generated text should be.
///
/// The numeric level is what gets sent to the word source, so the
/// discriminants are part of the wire contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy = 0,
    Medium = 1,
    Hard = 2,
    Death = 3,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DifficultyError {
    #[error("invalid difficulty level {0}, expected 0 to 3")]
    OutOfRange(i64),
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Death,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Next level up, saturating at `Death`.
    pub fn harder(self) -> Self {
        Self::try_from(i64::from(self.level()) + 1).unwrap_or(self)
    }

    /// Next level down, saturating at `Easy`.
    pub fn easier(self) -> Self {
        Self::try_from(i64::from(self.level()) - 1).unwrap_or(self)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = DifficultyError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Difficulty::Easy),
            1 => Ok(Difficulty::Medium),
            2 => Ok(Difficulty::Hard),
            3 => Ok(Difficulty::Death),
            other => Err(DifficultyError::OutOfRange(other)),
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = DifficultyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}
