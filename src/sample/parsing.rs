use super::DecodeError;

/// Parse a hex dump such as `"00 00 34 43 00 00 34 42"` or `"0x0000344300003442"`
/// into raw payload bytes.
pub fn parse_hex_payload(text: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    hex::decode(digits).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_payload() {
        assert_eq!(
            parse_hex_payload("00 00 34 43\n00 00 34 42").unwrap(),
            vec![0x00, 0x00, 0x34, 0x43, 0x00, 0x00, 0x34, 0x42]
        );
        assert_eq!(parse_hex_payload("0xDEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parse_hex_payload("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_hex_payload_rejects_garbage() {
        assert!(matches!(parse_hex_payload("abc"), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(parse_hex_payload("zz"), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(
            parse_hex_payload("0x 00 34 4g"),
            Err(DecodeError::InvalidHex(_))
        ));
    }
}
