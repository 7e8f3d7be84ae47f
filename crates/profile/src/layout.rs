//! Layout-id filters on command and pin-config groups.

use serde::Serialize;

/// Raw profile value meaning "any layout".
pub const WILDCARD_LAYOUT: i64 = -1;

/// Which platform layouts a group applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LayoutFilter {
    /// Every layout, including an unavailable one.
    #[default]
    Any,
    /// Exactly this layout id.
    Only(u32),
}

impl LayoutFilter {
    /// Interpret a raw `LayoutID` value.
    ///
    /// `-1` and its 32-bit two's-complement form `0xFFFFFFFF` are the wildcard.
    /// Returns `None` for values that are neither the wildcard nor a 32-bit id.
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw == WILDCARD_LAYOUT || raw == i64::from(u32::MAX) {
            return Some(Self::Any);
        }
        u32::try_from(raw).ok().map(Self::Only)
    }

    /// Returns `true` if a codec whose live layout id is `layout` is selected.
    ///
    /// `layout` is `None` when the platform supplies no layout id; only the
    /// wildcard selects such a codec.
    pub fn matches(self, layout: Option<u32>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(id) => layout == Some(id),
        }
    }

    /// The raw profile value this filter was decoded from.
    pub fn raw(self) -> i64 {
        match self {
            Self::Any => WILDCARD_LAYOUT,
            Self::Only(id) => i64::from(id),
        }
    }
}
