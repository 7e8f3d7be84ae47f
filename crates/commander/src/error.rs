//! Why a driver role refused to attach.
//!
//! Every variant is instance-fatal only: the role stays detached for this
//! codec and nothing else is affected.

use platform::TimerError;
use profile::ProfileError;
use thiserror_no_std::Error;

/// A driver role did not attach.
#[derive(Debug, Error)]
pub enum AttachError {
    /// A boot argument switches this role off.
    #[error("disabled by boot argument {0}")]
    BootDisabled(&'static str),
    /// No codec answered on the port.
    #[error("codec port failed to initialize")]
    InitializeFailed,
    /// No profile matches the codec.
    #[error("{0}")]
    Profile(#[from] ProfileError),
    /// The codec's profile sets `Disable`.
    #[error("disabled by codec profile")]
    Disabled,
    /// The codec's address bit is clear in `Codec Address Mask`.
    #[error("codec address {address} is excluded by address mask {mask:#06x}")]
    AddressMasked {
        /// Codec address on the link.
        address: u8,
        /// The profile's address mask.
        mask: u16,
    },
    /// The platform supplies no layout id.
    #[error("layout id unavailable")]
    NoLayout,
    /// The peer power observer found no engine to forward to.
    #[error("no sibling engine instance found")]
    NoSiblingEngine,
    /// The polling timer could not be created.
    #[error("{0}")]
    Timer(#[from] TimerError),
}
