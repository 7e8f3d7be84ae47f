//! Hardware Command Port abstraction
//!
//! One codec on an HD Audio link, reached through whatever transport the
//! platform provides (immediate command registers, CORB/RIRB, a hypervisor
//! mailbox). The port is not safe for concurrent register-level access:
//! callers serialise through [`crate::CodecLock`].

use thiserror_no_std::Error;

use crate::hda;

/// A codec command that produced no usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The codec did not answer (the transport's all-ones sentinel).
    #[error("codec did not respond to command {command:#010x}")]
    NoResponse {
        /// The full command word, codec address included.
        command: u32,
    },
    /// The port was used before [`CommandPort::initialize`] succeeded.
    #[error("codec port is not initialized")]
    NotInitialized,
}

/// Identity of the codec behind a port, as published in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecIdentity {
    /// Vendor id (high 16 bits) and device id (low 16 bits).
    pub vendor_id: u32,
    /// HDA subsystem id.
    pub subsystem_id: u32,
    /// Codec address on the link (0–14).
    pub address: u8,
    /// Function group type of the audio function group.
    pub function_group_type: u8,
}

/// Single-verb access to one codec.
///
/// All methods take `&self`: a port is shared by the roles attached to the
/// same codec and serialised externally.
pub trait CommandPort: Send + Sync {
    /// Bring the transport up and locate the codec.
    ///
    /// Returns `false` when no codec answers; no other method is meaningful then.
    fn initialize(&self) -> bool;

    /// Send one command word and return the 32-bit response.
    ///
    /// The codec address field of `command` is ignored; the port injects its
    /// own address (see [`hda::with_codec_address`]).
    fn send_command(&self, command: u32) -> Result<u32, TransportError>;

    /// Vendor id (high 16 bits) and device id (low 16 bits).
    fn vendor_id(&self) -> u32;

    /// HDA subsystem id used to pick a board-specific profile.
    fn subsystem_id(&self) -> u32;

    /// Codec address on the link.
    fn codec_address(&self) -> u8;

    /// Function group type of the codec's audio function group.
    fn function_group_type(&self) -> u8;

    /// Platform layout id, read live. `None` when the platform supplies none.
    fn layout_id(&self) -> Option<u32>;

    /// First node id of the audio function group's widget range.
    fn starting_node(&self) -> u8;

    /// Number of widgets in the audio function group.
    fn total_nodes(&self) -> u8;

    /// Vendor timing-compensation fixup (Intel TCSEL). Not gated by profiles.
    fn apply_timing_compensation(&self);

    /// Reset the codec's function group.
    fn reset_codec(&self);

    /// Send a 12-bit verb with an 8-bit payload to `node`.
    fn send_verb(&self, node: u8, verb: u16, payload: u8) -> Result<u32, TransportError> {
        self.send_command(hda::encode_verb12(node, verb, payload))
    }

    /// Send a 4-bit verb with a 16-bit payload to `node`.
    fn send_verb4(&self, node: u8, verb: u8, payload: u16) -> Result<u32, TransportError> {
        self.send_command(hda::encode_verb4(node, verb, payload))
    }

    /// Snapshot of the codec's identity.
    fn identity(&self) -> CodecIdentity {
        CodecIdentity {
            vendor_id: self.vendor_id(),
            subsystem_id: self.subsystem_id(),
            address: self.codec_address(),
            function_group_type: self.function_group_type(),
        }
    }
}

impl<P: CommandPort + ?Sized> CommandPort for std::sync::Arc<P> {
    fn initialize(&self) -> bool {
        (**self).initialize()
    }

    fn send_command(&self, command: u32) -> Result<u32, TransportError> {
        (**self).send_command(command)
    }

    fn vendor_id(&self) -> u32 {
        (**self).vendor_id()
    }

    fn subsystem_id(&self) -> u32 {
        (**self).subsystem_id()
    }

    fn codec_address(&self) -> u8 {
        (**self).codec_address()
    }

    fn function_group_type(&self) -> u8 {
        (**self).function_group_type()
    }

    fn layout_id(&self) -> Option<u32> {
        (**self).layout_id()
    }

    fn starting_node(&self) -> u8 {
        (**self).starting_node()
    }

    fn total_nodes(&self) -> u8 {
        (**self).total_nodes()
    }

    fn apply_timing_compensation(&self) {
        (**self).apply_timing_compensation();
    }

    fn reset_codec(&self) {
        (**self).reset_codec();
    }
}
