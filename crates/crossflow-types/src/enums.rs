//! Enumeration types for the Crossflow signal simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Signal phase
// ---------------------------------------------------------------------------

/// Which approach currently has right-of-way at the intersection.
///
/// Exactly one phase is active at any time. The controller starts in
/// [`Phase::A`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// North-South green, East-West red.
    #[default]
    A,
    /// East-West green, North-South red.
    B,
}

impl Phase {
    /// Return the opposite phase.
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Return the direction that drains while this phase is active.
    pub const fn green_direction(self) -> Direction {
        match self {
            Self::A => Direction::NorthSouth,
            Self::B => Direction::EastWest,
        }
    }

    /// Whether `direction` has right-of-way under this phase.
    pub fn is_green(self, direction: Direction) -> bool {
        self.green_direction() == direction
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::A => write!(f, "A (north-south green)"),
            Self::B => write!(f, "B (east-west green)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Approach direction
// ---------------------------------------------------------------------------

/// One of the two approaches feeding the intersection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// The north-south approach.
    NorthSouth,
    /// The east-west approach.
    EastWest,
}

impl Direction {
    /// Both directions, in the order the queue model draws arrivals for them.
    pub const ALL: [Self; 2] = [Self::NorthSouth, Self::EastWest];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_flips_both_ways() {
        assert_eq!(Phase::A.other(), Phase::B);
        assert_eq!(Phase::B.other(), Phase::A);
        assert_eq!(Phase::A.other().other(), Phase::A);
    }

    #[test]
    fn default_phase_is_north_south_green() {
        assert_eq!(Phase::default(), Phase::A);
        assert!(Phase::A.is_green(Direction::NorthSouth));
        assert!(!Phase::A.is_green(Direction::EastWest));
    }

    #[test]
    fn phase_b_drains_east_west() {
        assert_eq!(Phase::B.green_direction(), Direction::EastWest);
        assert!(Phase::B.is_green(Direction::EastWest));
        assert!(!Phase::B.is_green(Direction::NorthSouth));
    }

    #[test]
    fn phase_serializes_as_variant_name() {
        let json = serde_json::to_string(&Phase::B).unwrap_or_default();
        assert_eq!(json, "\"B\"");
    }
}
