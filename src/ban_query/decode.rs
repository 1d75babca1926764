/// Reply decoding for the ban protocol
///
/// Reason text comes back in whatever encoding the server felt like using,
/// so the tail of the reply is run through an ordered list of decoders. The
/// first one that accepts the bytes wins; if none do, the bytes are reported
/// as lowercase hex.
use super::BanStatus;

/// Length of the random header echoed back by the server
pub const HEADER_LEN: usize = 4;

/// A single decode attempt; `None` means the bytes were rejected
pub type Decoder = fn(&[u8]) -> Option<String>;

/// Decoders tried in order by [`decode_reason`]
pub const DEFAULT_CASCADE: &[(&str, Decoder)] = &[
    ("ascii", decode_ascii as Decoder),
    ("utf-8", decode_utf8 as Decoder),
    ("latin-1", decode_latin1 as Decoder),
];

/// Strict 7-bit ASCII
pub fn decode_ascii(bytes: &[u8]) -> Option<String> {
    if bytes.is_ascii() {
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}

pub fn decode_utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

/// Latin-1 maps every byte to the code point of the same value and never fails
pub fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Decode a reason payload with the default cascade
pub fn decode_reason(tail: &[u8]) -> String {
    decode_with(tail, DEFAULT_CASCADE)
}

/// Decode a reason payload with an explicit cascade, falling back to hex
pub fn decode_with(tail: &[u8], cascade: &[(&str, Decoder)]) -> String {
    for (name, decoder) in cascade {
        if let Some(text) = decoder(tail) {
            tracing::trace!("Ban reason decoded as {}", name);
            return text.trim_matches(is_strip_char).to_string();
        }
    }

    hex::encode(tail)
}

/// Whitespace plus the ASCII file, group, record and unit separators
fn is_strip_char(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Interpret a full reply datagram
///
/// Replies of `HEADER_LEN` bytes or fewer carry no reason and mean not banned.
pub fn parse_reply(payload: &[u8]) -> BanStatus {
    if payload.len() <= HEADER_LEN {
        return BanStatus::NotBanned;
    }

    BanStatus::from_reason(decode_reason(&payload[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_tail() {
        assert_eq!(decode_reason(b"Cheating detected"), "Cheating detected");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(decode_reason(b"  Global ban \r\n"), "Global ban");
        assert_eq!(decode_reason(b" \t\n"), "");
        assert_eq!(decode_reason(b"\x1cGlobal ban\x1f "), "Global ban");
        assert_eq!(decode_reason(b"\x1d\x1e\x0b\x0c"), "");
    }

    #[test]
    fn test_utf8_tail() {
        let reason = "封禁 - cheating";
        assert_eq!(decode_reason(reason.as_bytes()), reason);
    }

    #[test]
    fn test_latin1_tail() {
        // 0xE9 alone is not valid UTF-8
        let bytes = [0x62, 0x61, 0x6E, 0x6E, 0x69, 0xE9];
        assert_eq!(decode_reason(&bytes), "banni\u{e9}");
    }

    #[test]
    fn test_hex_fallback_is_reachable() {
        let cascade: &[(&str, Decoder)] = &[("ascii", decode_ascii), ("utf-8", decode_utf8)];
        assert_eq!(decode_with(&[0xFF, 0x00, 0xAB], cascade), "ff00ab");
        assert_eq!(decode_with(&[0xDE, 0xAD], &[]), "dead");
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply(&[]), BanStatus::NotBanned);
        assert_eq!(parse_reply(&[1, 2, 3, 4]), BanStatus::NotBanned);
        assert_eq!(parse_reply(&[1, 2, 3, 4, b' ', b'\n']), BanStatus::NotBanned);

        let mut payload = vec![9, 9, 9, 9];
        payload.extend_from_slice(b"cheating");
        assert_eq!(
            parse_reply(&payload),
            BanStatus::Banned {
                reason: "cheating".to_string()
            }
        );
    }
}
