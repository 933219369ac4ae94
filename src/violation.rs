//! Violation input types
//!
//! Detectors hand the engine a kind and a severity score; nothing else
//! about the evidence is inspected here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of detected rule infraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Movement faster than physically possible
    SpeedHack,
    /// Sustained flight without an allowed mode
    Fly,
    /// Position jumps with no valid path
    Teleport,
    /// Hitting targets beyond reach distance
    Reach,
    /// Inhuman aim snapping / tracking
    Aimbot,
    /// Interacting with entities through walls
    Wallhack,
    /// Click rate beyond human limits
    AutoClicker,
    /// Malformed or forged packets
    PacketManipulation,
    /// Impossible inventory transactions
    InventoryManipulation,
    /// Mining patterns implying ore visibility
    Xray,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::SpeedHack => "speed_hack",
            ViolationKind::Fly => "fly",
            ViolationKind::Teleport => "teleport",
            ViolationKind::Reach => "reach",
            ViolationKind::Aimbot => "aimbot",
            ViolationKind::Wallhack => "wallhack",
            ViolationKind::AutoClicker => "auto_clicker",
            ViolationKind::PacketManipulation => "packet_manipulation",
            ViolationKind::InventoryManipulation => "inventory_manipulation",
            ViolationKind::Xray => "xray",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected infraction with a severity in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: f64,
}

impl Violation {
    /// Severity is clamped into [0, 1]; NaN becomes 0.
    pub fn new(kind: ViolationKind, severity: f64) -> Self {
        let severity = if severity.is_nan() {
            0.0
        } else {
            severity.clamp(0.0, 1.0)
        };
        Self { kind, severity }
    }
}

/// A violation stamped with the time the ledger absorbed it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViolationEntry {
    pub violation: Violation,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_clamped() {
        assert_eq!(Violation::new(ViolationKind::Fly, 1.7).severity, 1.0);
        assert_eq!(Violation::new(ViolationKind::Fly, -0.2).severity, 0.0);
        assert_eq!(Violation::new(ViolationKind::Fly, f64::NAN).severity, 0.0);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ViolationKind::AutoClicker).unwrap();
        assert_eq!(json, "\"auto_clicker\"");
        assert_eq!(ViolationKind::AutoClicker.to_string(), "auto_clicker");
    }
}
