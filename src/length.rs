//! Definite-length encoding and decoding (X.690 Section 8.1.3).

use crate::error::{Error, Result};

/// A parsed length: the declared value-length, plus how many octets the
/// length field itself occupied.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ParsedLength {
    pub(crate) value_length: usize,
    pub(crate) octets: usize,
    /// Whether this was encoded in long form (relevant to DER's
    /// shortest-possible-form rule).
    pub(crate) long_form: bool,
}

/// Parse a definite-length field from the front of `input`.
///
/// `root` selects whether truncation is reported as [`Error::PartialPdu`]
/// (root decode, so the caller may read more and retry) or
/// [`Error::Encoder`] (nested inside an already-bounded TLV, so there is
/// no "more bytes incoming" to wait for).
pub(crate) fn parse_length(input: &[u8], root: bool) -> Result<ParsedLength> {
    let first = *input.first().ok_or_else(|| {
        if root {
            Error::partial_pdu("Not enough data to decode the length")
        } else {
            Error::encoder("Not enough data to decode the length")
        }
    })?;

    if first & 0x80 == 0 {
        return Ok(ParsedLength {
            value_length: usize::from(first),
            octets: 1,
            long_form: false,
        });
    }

    let count = usize::from(first & 0x7F);

    if count == 0 {
        return Err(Error::encoder("Indefinite length encoding is not supported"));
    }

    if count == 0x7F {
        return Err(Error::encoder("Reserved length form (0x7F) is not supported"));
    }

    let bytes = input.get(1..1 + count).ok_or_else(|| {
        if root {
            Error::partial_pdu("Not enough data to decode the length")
        } else {
            Error::encoder("Not enough data to decode the length")
        }
    })?;

    let mut value_length: usize = 0;
    for byte in bytes {
        value_length = value_length
            .checked_shl(8)
            .and_then(|v| v.checked_add(u32::from(*byte) as usize))
            .ok_or_else(|| Error::encoder("Length value overflows this platform's usize"))?;
    }

    Ok(ParsedLength {
        value_length,
        octets: 1 + count,
        long_form: true,
    })
}

/// Encode a definite length using the shortest form X.690 allows for it
/// (short form below 128, otherwise the minimal long form).
pub(crate) fn encode_length(value_length: usize) -> Result<Vec<u8>> {
    if value_length < 0x80 {
        return Ok(vec![value_length as u8]);
    }

    let mut be_bytes = Vec::new();
    let mut remaining = value_length;
    while remaining > 0 {
        be_bytes.push((remaining & 0xFF) as u8);
        remaining >>= 8;
    }
    be_bytes.reverse();

    if be_bytes.len() >= 0x7F {
        return Err(Error::encoder(
            "Length value is too large to encode in long form",
        ));
    }

    let mut out = Vec::with_capacity(1 + be_bytes.len());
    out.push(0x80 | be_bytes.len() as u8);
    out.extend(be_bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form() {
        let parsed = parse_length(&[0x09], true).unwrap();
        assert_eq!(parsed.value_length, 9);
        assert_eq!(parsed.octets, 1);
        assert!(!parsed.long_form);
        assert_eq!(encode_length(9).unwrap(), vec![0x09]);
    }

    #[test]
    fn long_form() {
        let parsed = parse_length(&[0x82, 0x01, 0x00], true).unwrap();
        assert_eq!(parsed.value_length, 256);
        assert_eq!(parsed.octets, 3);
        assert!(parsed.long_form);
        assert_eq!(encode_length(256).unwrap(), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn indefinite_length_rejected() {
        let err = parse_length(&[0x80], true).unwrap_err();
        assert_eq!(
            err,
            Error::Encoder("Indefinite length encoding is not supported".into())
        );
    }

    #[test]
    fn reserved_length_rejected() {
        let err = parse_length(&[0xFF], true).unwrap_err();
        assert!(matches!(err, Error::Encoder(_)));
    }

    #[test]
    fn truncated_length_is_partial_at_root() {
        let err = parse_length(&[0x83, 0x01], true).unwrap_err();
        assert_eq!(
            err,
            Error::PartialPdu("Not enough data to decode the length".into())
        );
    }

    #[test]
    fn missing_length_octet_is_partial_at_root() {
        let err = parse_length(&[], true).unwrap_err();
        assert_eq!(
            err,
            Error::PartialPdu("Not enough data to decode the length".into())
        );
    }

    #[test]
    fn truncated_length_is_encoder_error_when_nested() {
        let err = parse_length(&[0x83, 0x01], false).unwrap_err();
        assert_eq!(
            err,
            Error::Encoder("Not enough data to decode the length".into())
        );
    }
}
