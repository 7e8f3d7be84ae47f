//! The three driver roles that share one profile.

use serde::Serialize;

/// A driver role. Each role may carry its own override sub-tree in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// The power transition engine attached to the codec.
    Engine,
    /// The peer power observer forwarding wake events from a sibling object.
    PowerHook,
    /// The one-shot probe-time initializer.
    ProbeInit,
}

impl Role {
    /// All roles, in attach order.
    pub const ALL: [Role; 3] = [Role::ProbeInit, Role::Engine, Role::PowerHook];

    /// Profile key of this role's override sub-tree.
    pub fn key(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::PowerHook => "PowerHook",
            Self::ProbeInit => "ProbeInit",
        }
    }

    /// Look a role up by its override key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
