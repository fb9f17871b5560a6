//! Display-name codec for sample filenames
//!
//! Sample files may contain `#` in their names (sharp notes: `snare#1.wav`),
//! which is reserved in URLs as the fragment delimiter. The wire contract
//! therefore exposes a *display name* in which every `#` is replaced by the
//! literal token `sharp`; the server decodes it back before touching disk.
//!
//! The transform is reversible for every filename that does not already
//! contain the literal token. Names that do (e.g. `sharp.wav`) decode to
//! something else and are rejected upstream by the library indexer.

/// Reserved character in storage names that cannot appear in a URL path.
pub const RESERVED: char = '#';

/// Literal token substituted for the reserved character on the wire.
pub const ESCAPE_TOKEN: &str = "sharp";

/// Encode a storage name into its transport-safe display name.
pub fn encode(storage_name: &str) -> String {
    storage_name.replace(RESERVED, ESCAPE_TOKEN)
}

/// Decode a display name back into the storage name.
pub fn decode(display_name: &str) -> String {
    display_name.replace(ESCAPE_TOKEN, &RESERVED.to_string())
}

/// True when a storage name survives an encode/decode round trip.
///
/// Names containing the literal escape token are outside the codec's domain;
/// the indexer skips them rather than serving a name it cannot resolve back.
pub fn is_roundtrip_safe(storage_name: &str) -> bool {
    decode(&encode(storage_name)) == storage_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_single_reserved_char() {
        assert_eq!(encode("snare#1.wav"), "snaresharp1.wav");
    }

    #[test]
    fn test_encode_no_reserved_char() {
        assert_eq!(encode("kick.wav"), "kick.wav");
    }

    #[test]
    fn test_encode_multiple_reserved_chars() {
        assert_eq!(encode("c#d#e.wav"), "csharpdsharpe.wav");
    }

    #[test]
    fn test_decode_inverts_encode() {
        for name in ["kick.wav", "snare#1.wav", "c#d#e.wav", "#.wav", "##.wav"] {
            assert_eq!(decode(&encode(name)), name, "round trip failed for {name}");
        }
    }

    #[test]
    fn test_decode_plain_token() {
        assert_eq!(decode("snaresharp1.wav"), "snare#1.wav");
    }

    #[test]
    fn test_literal_token_outside_domain() {
        // "sharp.wav" encodes to itself but decodes to "#.wav"
        assert!(!is_roundtrip_safe("sharp.wav"));
        assert!(is_roundtrip_safe("snare#1.wav"));
        assert!(is_roundtrip_safe("kick.wav"));
    }
}
