//! `OBJECT IDENTIFIER` and `RELATIVE-OID` base-128 arc encoding
//! (X.690 Section 8.19), rendered to and parsed from dotted-decimal text.

use crate::error::{Error, Result};

/// Decode a run of base-128 arcs, each terminated by a clear high bit.
fn decode_arcs(payload: &[u8]) -> Result<Vec<u64>> {
    if payload.is_empty() {
        return Err(Error::encoder("Object identifier payload is empty"));
    }

    let mut arcs = Vec::new();
    let mut value: u64 = 0;
    let mut in_progress = false;

    for (index, byte) in payload.iter().enumerate() {
        if index == 0 || !in_progress {
            if *byte == 0x80 {
                return Err(Error::encoder(
                    "Object identifier arc has a non-minimal encoding",
                ));
            }
        }

        value = value
            .checked_shl(7)
            .and_then(|v| v.checked_add(u64::from(byte & 0x7F)))
            .ok_or_else(|| Error::encoder("Object identifier arc overflows a u64"))?;
        in_progress = true;

        if byte & 0x80 == 0 {
            arcs.push(value);
            value = 0;
            in_progress = false;
        }
    }

    if in_progress {
        return Err(Error::encoder(
            "Object identifier payload ends mid-arc",
        ));
    }

    Ok(arcs)
}

fn encode_arc(out: &mut Vec<u8>, value: u64) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut remaining = value >> 7;
    while remaining > 0 {
        groups.push((remaining & 0x7F) as u8);
        remaining >>= 7;
    }
    groups.reverse();
    let last = groups.len() - 1;
    for (index, group) in groups.into_iter().enumerate() {
        out.push(if index == last { group } else { group | 0x80 });
    }
}

/// Parse an `OBJECT IDENTIFIER` payload into dotted-decimal text. The first
/// two arcs are recovered from the merged leading arc per X.690 8.19.4.
pub(crate) fn parse_oid(payload: &[u8]) -> Result<String> {
    let arcs = decode_arcs(payload)?;
    let first_merged = arcs[0];

    let (first, second) = if first_merged < 40 {
        (0, first_merged)
    } else if first_merged < 80 {
        (1, first_merged - 40)
    } else {
        (2, first_merged - 80)
    };

    let mut components = vec![first.to_string(), second.to_string()];
    components.extend(arcs[1..].iter().map(u64::to_string));
    Ok(components.join("."))
}

/// Encode dotted-decimal `OBJECT IDENTIFIER` text to its BER payload.
pub(crate) fn encode_oid(text: &str) -> Result<Vec<u8>> {
    let arcs = parse_dotted(text)?;
    if arcs.len() < 2 {
        return Err(Error::invalid_argument(
            "Object identifier must have at least two arcs",
        ));
    }

    let first = arcs[0];
    let second = arcs[1];
    if first > 2 {
        return Err(Error::invalid_argument(
            "Object identifier's first arc must be 0, 1, or 2",
        ));
    }
    if first < 2 && second > 39 {
        return Err(Error::invalid_argument(
            "Object identifier's second arc must be 0..=39 when the first arc is 0 or 1",
        ));
    }

    let mut out = Vec::new();
    encode_arc(&mut out, first * 40 + second);
    for arc in &arcs[2..] {
        encode_arc(&mut out, *arc);
    }
    Ok(out)
}

/// Parse a `RELATIVE-OID` payload into dotted-decimal text. Unlike
/// `OBJECT IDENTIFIER`, no arcs are merged.
pub(crate) fn parse_relative_oid(payload: &[u8]) -> Result<String> {
    let arcs = decode_arcs(payload)?;
    Ok(arcs
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("."))
}

/// Encode dotted-decimal `RELATIVE-OID` text to its BER payload.
pub(crate) fn encode_relative_oid(text: &str) -> Result<Vec<u8>> {
    let arcs = parse_dotted(text)?;
    if arcs.is_empty() {
        return Err(Error::invalid_argument(
            "Relative object identifier must have at least one arc",
        ));
    }

    let mut out = Vec::new();
    for arc in &arcs {
        encode_arc(&mut out, *arc);
    }
    Ok(out)
}

fn parse_dotted(text: &str) -> Result<Vec<u64>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('.')
        .map(|component| {
            component
                .parse::<u64>()
                .map_err(|_| Error::invalid_argument("Object identifier arc is not a valid integer"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_oid() {
        // 1.2.840.113549 (rsadsi)
        let bytes = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D];
        assert_eq!(parse_oid(&bytes).unwrap(), "1.2.840.113549");
    }

    #[test]
    fn round_trips_oid() {
        let text = "1.3.6.1.4.1.311.21.20";
        let encoded = encode_oid(text).unwrap();
        assert_eq!(parse_oid(&encoded).unwrap(), text);
    }

    #[test]
    fn rejects_second_arc_overflow() {
        let err = encode_oid("1.40").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn round_trips_relative_oid() {
        let text = "8571.1";
        let encoded = encode_relative_oid(text).unwrap();
        assert_eq!(parse_relative_oid(&encoded).unwrap(), text);
    }

    #[test]
    fn rejects_non_minimal_arc() {
        let err = decode_arcs(&[0x80, 0x01]).unwrap_err();
        assert!(matches!(err, Error::Encoder(_)));
    }
}
