//! Profile loading and resolution errors.

use thiserror_no_std::Error;

/// Why no configuration could be produced.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Neither the codec's vendor key nor the wildcard key is present.
    #[error("no profile for codec {vendor_id:#010x} and no \"Default\" profile")]
    NoProfile {
        /// The codec's vendor id.
        vendor_id: u32,
    },
    /// The profile document's root is not an object.
    #[error("profile root must be an object")]
    RootNotObject,
    /// The profile document is not valid JSON.
    #[error("invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The profile file could not be read.
    #[error("cannot read profile file: {0}")]
    Io(#[from] std::io::Error),
}
