use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anatomical side of the captured foot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootSide {
    #[serde(alias = "izquierdo")]
    Left,
    #[serde(alias = "derecho")]
    Right,
}

impl fmt::Display for FootSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FootSide::Left => f.write_str("left"),
            FootSide::Right => f.write_str("right"),
        }
    }
}

impl FromStr for FootSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "izquierdo" => Ok(FootSide::Left),
            "right" | "derecho" => Ok(FootSide::Right),
            other => Err(format!("unknown foot side: {other}")),
        }
    }
}
