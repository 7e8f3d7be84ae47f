//! Power management abstraction
//!
//! Provides the two vocabularies the engine speaks: power ordinals delivered
//! by the host's power-management protocol, and power observations sampled
//! from the peer audio device.

use core::fmt;

/// Power state reported by the peer audio device.
///
/// `Idle` is accepted but the engine treats it exactly like `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerObservation {
    /// Codec has no power.
    Sleep,
    /// Powered, no stream running.
    Idle,
    /// Powered and in use.
    Active,
}

impl PowerObservation {
    /// Returns `true` for `Idle` and `Active`.
    #[must_use]
    pub fn is_powered(self) -> bool {
        !matches!(self, Self::Sleep)
    }

    /// Name used in transition logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sleep => "Sleep",
            Self::Idle => "Idle",
            Self::Active => "Active",
        }
    }
}

impl fmt::Display for PowerObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power-state ordinal delivered by the host's power-management protocol.
///
/// The driver registers three states; `Doze` is registered but never delivered
/// in practice and is handled like `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerOrdinal {
    /// Ordinal 0: system sleep.
    Sleep = 0,
    /// Ordinal 1: doze.
    Doze = 1,
    /// Ordinal 2: fully on.
    Normal = 2,
}

impl PowerOrdinal {
    /// Map a raw ordinal. Returns `None` for ordinals outside the registered table.
    #[must_use]
    pub fn from_raw(ordinal: u64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Sleep),
            1 => Some(Self::Doze),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    /// Returns `true` for `Doze` and `Normal`.
    #[must_use]
    pub fn is_awake(self) -> bool {
        !matches!(self, Self::Sleep)
    }
}

/// The peer audio device whose power state the polling fallback samples.
pub trait AudioDevicePower: Send + Sync {
    /// Current power state of the device.
    fn power_state(&self) -> PowerObservation;
}

/// A driver role that receives power ordinals from its own power-tree parent.
pub trait PowerRole: Send + Sync {
    /// Handle a power ordinal. Completes synchronously; the host treats the
    /// transition as acknowledged on return.
    fn set_power_state(&self, ordinal: PowerOrdinal);
}

/// An engine that accepts power ordinals forwarded from a sibling object.
///
/// Some wake sources bypass the engine's own power-tree parent; the peer power
/// observer role forwards what it sees through this entry point.
pub trait ExternalPowerTarget: Send + Sync {
    /// Handle a forwarded power ordinal.
    fn set_power_state_external(&self, ordinal: PowerOrdinal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_from_raw() {
        assert_eq!(PowerOrdinal::from_raw(0), Some(PowerOrdinal::Sleep));
        assert_eq!(PowerOrdinal::from_raw(1), Some(PowerOrdinal::Doze));
        assert_eq!(PowerOrdinal::from_raw(2), Some(PowerOrdinal::Normal));
        assert_eq!(PowerOrdinal::from_raw(3), None);
    }

    #[test]
    fn test_doze_counts_as_awake() {
        assert!(PowerOrdinal::Doze.is_awake());
        assert!(!PowerOrdinal::Sleep.is_awake());
    }

    #[test]
    fn test_idle_counts_as_powered() {
        assert!(PowerObservation::Idle.is_powered());
        assert!(PowerObservation::Active.is_powered());
        assert!(!PowerObservation::Sleep.is_powered());
    }

    #[test]
    fn test_observation_names() {
        assert_eq!(PowerObservation::Sleep.to_string(), "Sleep");
        assert_eq!(PowerObservation::Idle.to_string(), "Idle");
        assert_eq!(PowerObservation::Active.to_string(), "Active");
    }
}
