//! Peer lookup, injected by the platform-integration layer.
//!
//! The engine never walks a device tree itself. Whatever knows where the
//! codec sits hands it a locator that either finds the peer or says so.

use std::sync::Arc;

use crate::power::{AudioDevicePower, ExternalPowerTarget};

/// Finds the objects a driver role cooperates with.
pub trait PeerLocator: Send + Sync {
    /// The peer audio device whose power state the polling fallback samples.
    fn audio_device(&self) -> Option<Arc<dyn AudioDevicePower>>;

    /// The sibling engine instance that the peer power observer forwards to.
    fn engine(&self) -> Option<Arc<dyn ExternalPowerTarget>>;
}

/// A locator that finds nothing.
///
/// For codecs without a peer audio device (polling disabled) and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPeers;

impl PeerLocator for NoPeers {
    fn audio_device(&self) -> Option<Arc<dyn AudioDevicePower>> {
        None
    }

    fn engine(&self) -> Option<Arc<dyn ExternalPowerTarget>> {
        None
    }
}
