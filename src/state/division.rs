//! Competition divisions and the apparatus scored in each of them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One of the two independently scored competition tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    /// Women's artistic gymnastics (four apparatus).
    Women,
    /// Men's artistic gymnastics (six apparatus).
    Men,
}

const WOMEN_APPARATUS: [Apparatus; 4] = [
    Apparatus::Floor,
    Apparatus::Vault,
    Apparatus::Bars,
    Apparatus::Beam,
];

const MEN_APPARATUS: [Apparatus; 6] = [
    Apparatus::Floor,
    Apparatus::Pommel,
    Apparatus::Rings,
    Apparatus::Vault,
    Apparatus::Pbars,
    Apparatus::Hbar,
];

impl Division {
    /// Every division, in the order they are loaded at startup.
    pub const ALL: [Division; 2] = [Division::Women, Division::Men];

    /// Wire name of the division (`women` / `men`).
    pub fn as_str(self) -> &'static str {
        match self {
            Division::Women => "women",
            Division::Men => "men",
        }
    }

    /// Apparatus scored in this division, in sheet column order.
    pub fn apparatus(self) -> &'static [Apparatus] {
        match self {
            Division::Women => &WOMEN_APPARATUS,
            Division::Men => &MEN_APPARATUS,
        }
    }

    /// Whether `apparatus` is scored in this division.
    pub fn scores(self, apparatus: Apparatus) -> bool {
        self.apparatus().contains(&apparatus)
    }

    /// Stable competitor identifier for the row at `index` (`w-0`, `m-3`, ...).
    pub fn competitor_id(self, index: usize) -> String {
        let prefix = match self {
            Division::Women => 'w',
            Division::Men => 'm',
        };
        format!("{prefix}-{index}")
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a known division or apparatus.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

impl FromStr for Division {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "women" => Ok(Division::Women),
            "men" => Ok(Division::Men),
            other => Err(UnknownName {
                kind: "division",
                value: other.to_string(),
            }),
        }
    }
}

/// A scored discipline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Apparatus {
    /// Floor exercise (both divisions).
    Floor,
    /// Vault (both divisions).
    Vault,
    /// Uneven bars.
    Bars,
    /// Balance beam.
    Beam,
    /// Pommel horse.
    Pommel,
    /// Still rings.
    Rings,
    /// Parallel bars.
    Pbars,
    /// Horizontal bar.
    Hbar,
}

impl Apparatus {
    /// Wire name of the apparatus, also used as the score map key.
    pub fn as_str(self) -> &'static str {
        match self {
            Apparatus::Floor => "floor",
            Apparatus::Vault => "vault",
            Apparatus::Bars => "bars",
            Apparatus::Beam => "beam",
            Apparatus::Pommel => "pommel",
            Apparatus::Rings => "rings",
            Apparatus::Pbars => "pbars",
            Apparatus::Hbar => "hbar",
        }
    }
}

impl fmt::Display for Apparatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Apparatus {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let apparatus = match value {
            "floor" => Apparatus::Floor,
            "vault" => Apparatus::Vault,
            "bars" => Apparatus::Bars,
            "beam" => Apparatus::Beam,
            "pommel" => Apparatus::Pommel,
            "rings" => Apparatus::Rings,
            "pbars" => Apparatus::Pbars,
            "hbar" => Apparatus::Hbar,
            other => {
                return Err(UnknownName {
                    kind: "apparatus",
                    value: other.to_string(),
                });
            }
        };
        Ok(apparatus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apparatus_order_matches_sheet_columns() {
        assert_eq!(
            Division::Women.apparatus(),
            &[
                Apparatus::Floor,
                Apparatus::Vault,
                Apparatus::Bars,
                Apparatus::Beam
            ]
        );
        assert_eq!(Division::Men.apparatus().len(), 6);
        assert_eq!(Division::Men.apparatus()[3], Apparatus::Vault);
    }

    #[test]
    fn divisions_only_score_their_own_apparatus() {
        assert!(Division::Women.scores(Apparatus::Beam));
        assert!(!Division::Women.scores(Apparatus::Rings));
        assert!(Division::Men.scores(Apparatus::Hbar));
        assert!(!Division::Men.scores(Apparatus::Bars));
    }

    #[test]
    fn competitor_ids_use_division_prefix() {
        assert_eq!(Division::Women.competitor_id(0), "w-0");
        assert_eq!(Division::Men.competitor_id(12), "m-12");
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for division in Division::ALL {
            assert_eq!(division.as_str().parse::<Division>(), Ok(division));
        }
        for apparatus in Division::Men.apparatus() {
            assert_eq!(apparatus.as_str().parse::<Apparatus>(), Ok(*apparatus));
        }
        assert!("mixed".parse::<Division>().is_err());
        assert!("trampoline".parse::<Apparatus>().is_err());
    }
}
