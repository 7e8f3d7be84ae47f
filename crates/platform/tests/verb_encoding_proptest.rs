//! Property-based tests for HD Audio verb encoding.
//! Verifies invariants hold for ALL node/verb/payload combinations.

use platform::hda::{self, DecodedVerb};

proptest::proptest! {
    /// Injecting a codec address never disturbs the node, verb or payload.
    #[test]
    fn codec_address_preserves_command_body(node in 0u8..=255u8, verb in 0u16..=0xFFF, payload in 0u8..=255u8, address in 0u8..=15u8) {
        let command = hda::with_codec_address(address, hda::encode_verb12(node, verb, payload));
        let decoded = DecodedVerb::decode(command);
        assert_eq!(decoded, DecodedVerb { address, node, verb, payload });
    }

    /// A second address injection overrides the first.
    #[test]
    fn codec_address_injection_is_idempotent(command in 0u32..=u32::MAX, a in 0u8..=15u8, b in 0u8..=15u8) {
        let once = hda::with_codec_address(b, command);
        let twice = hda::with_codec_address(b, hda::with_codec_address(a, command));
        assert_eq!(once, twice);
    }

    /// Only the EAPD bit decides EAPD capability.
    #[test]
    fn eapd_capability_is_bit_16(pincap in 0u32..=u32::MAX) {
        assert_eq!(hda::pincap_is_eapd_capable(pincap), pincap & (1 << 16) != 0);
    }
}
