//! The shared BER/DER encode and decode engine.
//!
//! [`crate::BerCodec`] and [`crate::DerCodec`] are thin wrappers around the
//! functions here: DER is BER plus a fixed [`EncodingOptions::der`] and a
//! handful of extra validation branches gated on [`Rules::Der`], so one
//! code path serves both rather than duplicating the TLV walk twice.

use crate::error::{Error, Result};
use crate::length::{encode_length, parse_length};
use crate::oid;
use crate::options::EncodingOptions;
use crate::tag::{self, TagClass, UniversalType};
use crate::tagmap::TagMap;
use crate::time::{self, DatetimeFormat, Timezone};
use crate::value::{BitString, Kind, StringKind, Value};

/// Which rule set governs encoding and the extra decode-time checks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Rules {
    Ber,
    Der,
}

/// Decode a single TLV from the front of `input`.
///
/// `root` is `true` only for the outermost call made by a public `decode`
/// entry point; it governs whether truncation is reported as
/// [`Error::PartialPdu`] (caller may read more and retry) or
/// [`Error::Encoder`] (truncation nested inside an already-bounded TLV,
/// which is always a hard error). Returns the decoded value and the
/// number of bytes of `input` it consumed.
pub(crate) fn decode_value(
    input: &[u8],
    rules: Rules,
    options: &EncodingOptions,
    tag_map: &TagMap,
    root: bool,
) -> Result<(Value, usize)> {
    let identifier = tag::parse_identifier(input, root)?;
    let length_input = &input[identifier.octets..];
    let parsed_length = parse_length(length_input, root)?;

    if rules == Rules::Der && parsed_length.long_form && parsed_length.value_length < 0x80 {
        return Err(Error::encoder(
            "DER must be encoded using the shortest possible length form",
        ));
    }

    let header_len = identifier.octets + parsed_length.octets;
    let payload = input.get(header_len..header_len + parsed_length.value_length).ok_or_else(|| {
        if root {
            Error::partial_pdu("Not enough data to decode the value")
        } else {
            Error::encoder("Not enough data to decode the value")
        }
    })?;
    let total_len = header_len + parsed_length.value_length;

    let universal_type = match identifier.class {
        TagClass::Universal => UniversalType::from_tag_number(identifier.number),
        other => tag_map.lookup(other, identifier.number),
    };

    let kind = match universal_type {
        None => Kind::Incomplete(payload.to_vec()),
        Some(universal_type) => {
            if universal_type.is_always_primitive_only() && identifier.constructed {
                return Err(Error::encoder(format!(
                    "{:?} must be encoded in primitive form",
                    universal_type
                )));
            }
            if universal_type.must_be_constructed() && !identifier.constructed {
                return Err(Error::encoder(format!(
                    "{:?} must be encoded in constructed form",
                    universal_type
                )));
            }
            if options.primitive_only.contains(&universal_type) && identifier.constructed {
                return Err(Error::encoder(format!(
                    "{:?} must be encoded in primitive form",
                    universal_type
                )));
            }

            decode_payload(universal_type, payload, identifier.constructed, rules, options, tag_map)?
        }
    };

    let value = Value {
        kind,
        tag_class: identifier.class,
        tag_number: identifier.number,
        constructed: identifier.constructed,
        trailing_data: None,
    };

    Ok((value, total_len))
}

pub(crate) fn decode_payload(
    universal_type: UniversalType,
    payload: &[u8],
    constructed: bool,
    rules: Rules,
    options: &EncodingOptions,
    tag_map: &TagMap,
) -> Result<Kind> {
    match universal_type {
        UniversalType::Boolean => {
            let byte = *payload
                .first()
                .ok_or_else(|| Error::encoder("BOOLEAN payload must be exactly one octet"))?;
            if payload.len() != 1 {
                return Err(Error::encoder("BOOLEAN payload must be exactly one octet"));
            }
            if rules == Rules::Der && byte != 0x00 && byte != 0xFF {
                return Err(Error::encoder(
                    "DER requires BOOLEAN TRUE to be encoded as 0xFF",
                ));
            }
            Ok(Kind::Boolean(byte != 0))
        }
        UniversalType::Integer => Ok(Kind::Integer(decode_integer(payload)?)),
        UniversalType::Enumerated => Ok(Kind::Enumerated(decode_integer(payload)?)),
        UniversalType::Null => {
            if !payload.is_empty() {
                return Err(Error::encoder("NULL payload must be empty"));
            }
            Ok(Kind::Null)
        }
        UniversalType::ObjectIdentifier => Ok(Kind::Oid(oid::parse_oid(payload)?)),
        UniversalType::RelativeOid => Ok(Kind::RelativeOid(oid::parse_relative_oid(payload)?)),
        UniversalType::OctetString => {
            if constructed {
                Ok(Kind::OctetString(decode_segmented(
                    payload,
                    UniversalType::OctetString,
                    rules,
                    options,
                    tag_map,
                )?))
            } else {
                Ok(Kind::OctetString(payload.to_vec()))
            }
        }
        UniversalType::BitString => Ok(Kind::BitString(decode_bit_string(
            payload, constructed, rules, options, tag_map,
        )?)),
        UniversalType::Sequence | UniversalType::Set => {
            let mut children = Vec::new();
            let mut offset = 0;
            while offset < payload.len() {
                let (child, consumed) =
                    decode_value(&payload[offset..], rules, options, tag_map, false)?;
                children.push(child);
                offset += consumed;
            }

            if universal_type == UniversalType::Set && rules == Rules::Der {
                verify_der_set_order(&children, rules, options)?;
            }

            Ok(if universal_type == UniversalType::Sequence {
                Kind::Sequence(children)
            } else {
                Kind::Set(children)
            })
        }
        UniversalType::UtcTime => {
            let value = time::parse_time(payload, false)?;
            if rules == Rules::Der {
                if let Some(reason) = der_time_format_violation(&value) {
                    return Err(Error::encoder(format!("DER requires UTCTime to {reason}")));
                }
            }
            Ok(Kind::UtcTime(value))
        }
        UniversalType::GeneralizedTime => {
            let value = time::parse_time(payload, true)?;
            if rules == Rules::Der {
                if let Some(reason) = der_time_format_violation(&value) {
                    return Err(Error::encoder(format!(
                        "DER requires GeneralizedTime to {reason}"
                    )));
                }
            }
            Ok(Kind::GeneralizedTime(value))
        }
        other => {
            let kind = StringKind::from_universal_type(other)
                .ok_or_else(|| Error::encoder("Unsupported universal type"))?;
            let text = decode_text(kind, payload)?;
            Ok(Kind::CharacterString { kind, text })
        }
    }
}

fn decode_segmented(
    payload: &[u8],
    expect: UniversalType,
    rules: Rules,
    options: &EncodingOptions,
    tag_map: &TagMap,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < payload.len() {
        let (child, consumed) = decode_value(&payload[offset..], rules, options, tag_map, false)?;
        match child.kind {
            Kind::OctetString(bytes) if expect == UniversalType::OctetString => out.extend(bytes),
            _ => return Err(Error::encoder("Constructed string segment has the wrong type")),
        }
        offset += consumed;
    }
    Ok(out)
}

fn decode_bit_string(
    payload: &[u8],
    constructed: bool,
    rules: Rules,
    options: &EncodingOptions,
    tag_map: &TagMap,
) -> Result<BitString> {
    if constructed {
        let mut bytes = Vec::new();
        let mut unused_bits = 0u8;
        let mut offset = 0;
        while offset < payload.len() {
            let (child, consumed) = decode_value(&payload[offset..], rules, options, tag_map, false)?;
            match child.kind {
                Kind::BitString(segment) => {
                    bytes.extend(segment.bytes);
                    unused_bits = segment.unused_bits;
                }
                _ => return Err(Error::encoder("Constructed BIT STRING segment has the wrong type")),
            }
            offset += consumed;
        }
        return Ok(BitString { bytes, unused_bits });
    }

    let unused_bits = *payload
        .first()
        .ok_or_else(|| Error::encoder("BIT STRING payload must carry an unused-bits octet"))?;
    if unused_bits > 7 {
        return Err(Error::encoder(
            "BIT STRING unused-bits count must be in 0..=7",
        ));
    }
    let bytes = payload[1..].to_vec();
    if bytes.is_empty() && unused_bits != 0 {
        return Err(Error::encoder(
            "An empty BIT STRING must declare zero unused bits",
        ));
    }

    if rules == Rules::Der {
        check_bitstring_trailing_zeros(&bytes, unused_bits)?;
    }

    Ok(BitString { bytes, unused_bits })
}

/// DER requires UTC timezone and a seconds-or-finer datetime format,
/// enforced symmetrically for both `UTCTime` and `GeneralizedTime`.
/// Returns the violated rule's description, if any.
fn der_time_format_violation(value: &time::TimeValue) -> Option<&'static str> {
    if value.timezone != Timezone::Utc {
        return Some("be expressed in UTC");
    }
    if !matches!(value.format, DatetimeFormat::Seconds | DatetimeFormat::Fractions) {
        return Some("specify seconds");
    }
    None
}

fn check_bitstring_trailing_zeros(bytes: &[u8], unused_bits: u8) -> Result<()> {
    if unused_bits == 0 {
        return Ok(());
    }
    if let Some(last_byte) = bytes.last() {
        let mask = (1u8 << unused_bits) - 1;
        if last_byte & mask != 0 {
            return Err(Error::encoder(
                "The last N unused bits of the bit string must be 0",
            ));
        }
    }
    Ok(())
}

/// Set the unused trailing bits of a `BIT STRING`'s last octet to match
/// `padding` (`'0'` or `'1'`). DER's canonical `'0'` leaves BER-encoded
/// bit strings untouched; anything else only has an effect under BER,
/// since DER also requires those bits to already be zero.
fn pad_bitstring_tail(bytes: &[u8], unused_bits: u8, padding: char) -> Vec<u8> {
    let mut out = bytes.to_vec();
    if unused_bits == 0 {
        return out;
    }
    if let Some(last) = out.last_mut() {
        let mask = (1u8 << unused_bits) - 1;
        if padding == '1' {
            *last |= mask;
        } else {
            *last &= !mask;
        }
    }
    out
}

fn decode_integer(payload: &[u8]) -> Result<i64> {
    if payload.is_empty() {
        return Err(Error::encoder("INTEGER payload must not be empty"));
    }
    if payload.len() > 1 {
        let redundant_zero = payload[0] == 0x00 && payload[1] & 0x80 == 0;
        let redundant_ones = payload[0] == 0xFF && payload[1] & 0x80 != 0;
        if redundant_zero || redundant_ones {
            return Err(Error::encoder(
                "INTEGER encoding is not minimal",
            ));
        }
    }
    if payload.len() > 8 {
        return Err(Error::encoder("INTEGER value overflows i64"));
    }

    let negative = payload[0] & 0x80 != 0;
    let mut value: i64 = if negative { -1 } else { 0 };
    for byte in payload {
        value = (value << 8) | i64::from(*byte);
    }
    Ok(value)
}

fn encode_integer(value: i64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 {
        let keep_leading_zero = bytes[0] == 0x00 && bytes[1] & 0x80 == 0;
        let keep_leading_ones = bytes[0] == 0xFF && bytes[1] & 0x80 != 0;
        if keep_leading_zero || keep_leading_ones {
            bytes.remove(0);
        } else {
            break;
        }
    }
    bytes
}

fn decode_text(kind: StringKind, payload: &[u8]) -> Result<String> {
    match kind {
        StringKind::Bmp => decode_utf16_be(payload),
        StringKind::Universal => decode_utf32_be(payload),
        _ => std::str::from_utf8(payload)
            .map(str::to_string)
            .map_err(|_| Error::encoder("String payload is not valid UTF-8")),
    }
}

fn encode_text(kind: StringKind, text: &str) -> Result<Vec<u8>> {
    match kind {
        StringKind::Bmp => Ok(encode_utf16_be(text)),
        StringKind::Universal => Ok(encode_utf32_be(text)),
        _ => Ok(text.as_bytes().to_vec()),
    }
}

fn decode_utf16_be(payload: &[u8]) -> Result<String> {
    if payload.len() % 2 != 0 {
        return Err(Error::encoder("BMPString payload length must be even"));
    }
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| Error::encoder("BMPString payload is not valid UTF-16"))
}

fn encode_utf16_be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

fn decode_utf32_be(payload: &[u8]) -> Result<String> {
    if payload.len() % 4 != 0 {
        return Err(Error::encoder("UniversalString payload length must be a multiple of 4"));
    }
    payload
        .chunks_exact(4)
        .map(|quad| {
            let code_point = u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]);
            char::from_u32(code_point)
                .ok_or_else(|| Error::encoder("UniversalString payload contains an invalid code point"))
        })
        .collect()
}

fn encode_utf32_be(text: &str) -> Vec<u8> {
    text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect()
}

fn verify_der_set_order(children: &[Value], rules: Rules, options: &EncodingOptions) -> Result<()> {
    let mut previous: Option<Vec<u8>> = None;
    for child in children {
        let encoded = encode_value(child, rules, options)?;
        if let Some(previous) = &previous {
            if encoded < *previous {
                return Err(Error::encoder(
                    "DER requires SET elements to be sorted by their encoded octets",
                ));
            }
        }
        previous = Some(encoded);
    }
    Ok(())
}

/// Encode a [`Value`] to its BER/DER octets.
pub(crate) fn encode_value(value: &Value, rules: Rules, options: &EncodingOptions) -> Result<Vec<u8>> {
    let universal_type = value.kind.universal_type();

    if let Some(universal_type) = universal_type {
        if universal_type.is_always_primitive_only() && value.constructed {
            return Err(Error::invalid_argument(format!(
                "{:?} cannot be encoded in constructed form",
                universal_type
            )));
        }
        if universal_type.must_be_constructed() && !value.constructed {
            return Err(Error::invalid_argument(format!(
                "{:?} cannot be encoded in primitive form",
                universal_type
            )));
        }
    }

    let forced_primitive = universal_type
        .map(|t| options.primitive_only.contains(&t))
        .unwrap_or(false);
    let constructed = value.constructed && !forced_primitive;

    let payload = encode_payload(value, constructed, rules, options)?;
    let mut out = tag::encode_identifier(value.tag_class, constructed, value.tag_number);
    out.extend(encode_length(payload.len())?);
    out.extend(payload);
    Ok(out)
}

fn encode_payload(value: &Value, constructed: bool, rules: Rules, options: &EncodingOptions) -> Result<Vec<u8>> {
    match &value.kind {
        Kind::Boolean(b) => Ok(vec![if *b { 0xFF } else { 0x00 }]),
        Kind::Integer(n) => Ok(encode_integer(*n)),
        Kind::Enumerated(n) => Ok(encode_integer(*n)),
        Kind::Null => Ok(Vec::new()),
        Kind::Oid(text) => oid::encode_oid(text),
        Kind::RelativeOid(text) => oid::encode_relative_oid(text),
        Kind::OctetString(bytes) => {
            if constructed {
                return Err(Error::invalid_argument(
                    "Constructed OCTET STRING encoding is not supported by this codec",
                ));
            }
            Ok(bytes.clone())
        }
        Kind::BitString(bit_string) => {
            if constructed {
                return Err(Error::invalid_argument(
                    "Constructed BIT STRING encoding is not supported by this codec",
                ));
            }
            if rules == Rules::Der {
                check_bitstring_trailing_zeros(&bit_string.bytes, bit_string.unused_bits)?;
            }
            let padded = pad_bitstring_tail(
                &bit_string.bytes,
                bit_string.unused_bits,
                options.bitstring_padding,
            );
            let mut out = vec![bit_string.unused_bits];
            out.extend(padded);
            Ok(out)
        }
        Kind::Sequence(children) => encode_children(children, rules, options),
        Kind::Set(children) => {
            let mut encoded: Vec<Vec<u8>> = children
                .iter()
                .map(|child| encode_value(child, rules, options))
                .collect::<Result<_>>()?;
            if rules == Rules::Der {
                encoded.sort();
            }
            Ok(encoded.concat())
        }
        Kind::CharacterString { kind, text } => encode_text(*kind, text),
        Kind::UtcTime(time_value) => {
            if rules == Rules::Der {
                if let Some(reason) = der_time_format_violation(time_value) {
                    return Err(Error::invalid_argument(format!(
                        "DER requires UTCTime to {reason}"
                    )));
                }
            }
            time::encode_time(time_value, UniversalType::UtcTime)
        }
        Kind::GeneralizedTime(time_value) => {
            if rules == Rules::Der {
                if let Some(reason) = der_time_format_violation(time_value) {
                    return Err(Error::invalid_argument(format!(
                        "DER requires GeneralizedTime to {reason}"
                    )));
                }
            }
            time::encode_time(time_value, UniversalType::GeneralizedTime)
        }
        Kind::Incomplete(bytes) => Ok(bytes.clone()),
    }
}

fn encode_children(children: &[Value], rules: Rules, options: &EncodingOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for child in children {
        out.extend(encode_value(child, rules, options)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn round_trips_a_sequence_of_integers() {
        let tag_map = TagMap::with_defaults();
        let options = EncodingOptions::ber();
        let value = Value::new(Kind::Sequence(vec![
            Value::new(Kind::Integer(1)),
            Value::new(Kind::Integer(-128)),
        ]));

        let encoded = encode_value(&value, Rules::Ber, &options).unwrap();
        let (decoded, consumed) = decode_value(&encoded, Rules::Ber, &options, &tag_map, true).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.kind, value.kind);
    }

    #[test]
    fn der_rejects_non_minimal_length() {
        let tag_map = TagMap::with_defaults();
        let options = EncodingOptions::der();
        // NULL, long-form length 0 when short form would do.
        let bytes = [0x05, 0x81, 0x00];
        let err = decode_value(&bytes, Rules::Der, &options, &tag_map, true).unwrap_err();
        assert!(matches!(err, Error::Encoder(_)));
    }

    #[test]
    fn der_sorts_set_elements() {
        let options = EncodingOptions::der();
        let value = Value::new(Kind::Set(vec![
            Value::new(Kind::Integer(2)),
            Value::new(Kind::Integer(1)),
        ]));
        let encoded = encode_value(&value, Rules::Der, &options).unwrap();

        let tag_map = TagMap::with_defaults();
        let (decoded, _) = decode_value(&encoded, Rules::Der, &options, &tag_map, true).unwrap();
        match decoded.kind {
            Kind::Set(children) => assert_eq!(children[0].kind, Kind::Integer(1)),
            _ => panic!("expected a SET"),
        }
    }

    #[test]
    fn integer_minimization_drops_redundant_leading_byte() {
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-128), vec![0x80]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn bitstring_padding_option_fills_unused_bits() {
        use crate::value::BitString;

        let bit_string = BitString {
            bytes: vec![0x6E, 0x5D, 0xC0],
            unused_bits: 6,
        };
        let value = Value::new(Kind::BitString(bit_string));

        let mut options = EncodingOptions::ber();
        options.bitstring_padding = '1';
        let encoded = encode_value(&value, Rules::Ber, &options).unwrap();
        // Last payload byte: top two bits preserved, bottom six set to 1.
        assert_eq!(*encoded.last().unwrap(), 0xC0 | 0x3F);

        options.bitstring_padding = '0';
        let encoded = encode_value(&value, Rules::Ber, &options).unwrap();
        assert_eq!(*encoded.last().unwrap(), 0xC0);
    }

    #[test]
    fn der_enforces_utc_and_seconds_for_both_time_types() {
        use crate::time::{DatetimeFormat, TimeValue, Timezone};

        let non_utc = TimeValue {
            year: 2018,
            month: 3,
            day: 18,
            hour: 10,
            minute: Some(2),
            second: Some(1),
            fraction: None,
            format: DatetimeFormat::Seconds,
            timezone: Timezone::Diff {
                positive: true,
                hours: 1,
                minutes: 0,
            },
        };
        let options = EncodingOptions::der();

        let utc_time_value = Value::new(Kind::UtcTime(non_utc.clone()));
        assert!(matches!(
            encode_value(&utc_time_value, Rules::Der, &options).unwrap_err(),
            Error::InvalidArgument(_)
        ));

        let generalized_time_value = Value::new(Kind::GeneralizedTime(non_utc));
        assert!(matches!(
            encode_value(&generalized_time_value, Rules::Der, &options).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }
}
