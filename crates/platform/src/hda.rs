//! HD Audio verb encoding and the constants the power engine needs.
//!
//! Reference: Intel High Definition Audio Specification Rev 1.0a, Section 7.3
//! (Codec Verb and Response Structures).
//!
//! A command word sent to a codec has this layout:
//!
//! ```text
//!  31    28 27        20 19                       0
//! +--------+------------+--------------------------+
//! | CAd    | NID        | verb + payload           |
//! +--------+------------+--------------------------+
//!
//! 12-bit verb:  [19:8] verb   [7:0]  payload
//!  4-bit verb:  [19:16] verb  [15:0] payload
//! ```
//!
//! Profiles store commands without the CAd field; the port fills it in at
//! send time via [`with_codec_address`].

/// 12-bit verb: Get Parameter.
pub const VERB_GET_PARAM: u16 = 0xF00;
/// 12-bit verb: Set EAPD/BTL Enable.
pub const VERB_SET_EAPD_BTL: u16 = 0x70C;
/// 12-bit verb: Get EAPD/BTL Enable.
pub const VERB_GET_EAPD_BTL: u16 = 0xF0C;
/// 12-bit verbs: Set Configuration Default, bytes 0 through 3.
pub const VERB_SET_CONFIG_DEFAULT_BYTES: [u16; 4] = [0x71C, 0x71D, 0x71E, 0x71F];

/// Parameter id: Pin Capabilities.
pub const PARAM_PIN_CAPABILITIES: u8 = 0x0C;

/// Pin Capabilities bit 16: the pin complex has an EAPD control.
pub const PINCAP_EAPD: u32 = 1 << 16;

/// EAPD/BTL payload with the EAPD bit (bit 1) cleared: amplifier powered down.
pub const EAPD_LOW: u8 = 0x00;
/// EAPD/BTL payload with the EAPD bit (bit 1) set: amplifier enabled.
pub const EAPD_HIGH: u8 = 0x02;

/// Mask of the bits a profile verb may carry (everything below the CAd field).
pub const COMMAND_BODY_MASK: u32 = 0x0FFF_FFFF;

/// Encode a 12-bit verb with an 8-bit payload, without the codec address.
#[must_use]
pub fn encode_verb12(node: u8, verb: u16, payload: u8) -> u32 {
    (u32::from(node) << 20) | ((u32::from(verb) & 0xFFF) << 8) | u32::from(payload)
}

/// Encode a 4-bit verb with a 16-bit payload, without the codec address.
#[must_use]
pub fn encode_verb4(node: u8, verb: u8, payload: u16) -> u32 {
    (u32::from(node) << 20) | ((u32::from(verb) & 0xF) << 16) | u32::from(payload)
}

/// Place `address` in the CAd field of `command`, discarding whatever the
/// command carried there.
#[must_use]
pub fn with_codec_address(address: u8, command: u32) -> u32 {
    ((u32::from(address) & 0xF) << 28) | (command & COMMAND_BODY_MASK)
}

/// Returns `true` if a Pin Capabilities response advertises EAPD.
#[must_use]
pub fn pincap_is_eapd_capable(pincap: u32) -> bool {
    pincap & PINCAP_EAPD != 0
}

/// A command word split back into its 12-bit-verb fields.
///
/// Used by logging and by the mock port to recognise verbs; 4-bit verbs
/// decode with their payload high byte folded into `verb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedVerb {
    /// Codec address (CAd).
    pub address: u8,
    /// Node id (NID).
    pub node: u8,
    /// 12-bit verb id.
    pub verb: u16,
    /// 8-bit payload.
    pub payload: u8,
}

impl DecodedVerb {
    /// Split a command word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // every field is masked first
    pub fn decode(command: u32) -> Self {
        Self {
            address: ((command >> 28) & 0xF) as u8,
            node: ((command >> 20) & 0xFF) as u8,
            verb: ((command >> 8) & 0xFFF) as u16,
            payload: (command & 0xFF) as u8,
        }
    }
}

/// The four Set Configuration Default commands that program `config` into
/// pin complex `node`, least significant byte first.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // byte extraction
pub fn config_default_commands(node: u8, config: u32) -> [u32; 4] {
    let mut commands = [0u32; 4];
    for (shift, (slot, verb)) in commands
        .iter_mut()
        .zip(VERB_SET_CONFIG_DEFAULT_BYTES)
        .enumerate()
    {
        *slot = encode_verb12(node, verb, (config >> (shift * 8)) as u8);
    }
    commands
}
