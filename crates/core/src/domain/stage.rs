// Boot stages, traversed in order from Init

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Boot stage (ordered: Init < Read < Exec < Flush)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Init = 1,
    Read = 2,
    Exec = 3,
    #[default]
    Flush = 4,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Init, Stage::Read, Stage::Exec, Stage::Flush];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Init => write!(f, "INIT"),
            Stage::Read => write!(f, "READ"),
            Stage::Exec => write!(f, "EXEC"),
            Stage::Flush => write!(f, "FLUSH"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INIT" | "1" => Ok(Stage::Init),
            "READ" | "2" => Ok(Stage::Read),
            "EXEC" | "3" => Ok(Stage::Exec),
            "FLUSH" | "4" => Ok(Stage::Flush),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}
