//! The public DER codec.

use crate::codec::{self, Rules};
use crate::error::{Error, Result};
use crate::options::EncodingOptions;
use crate::tag::{TagClass, UniversalType};
use crate::tagmap::TagMap;
use crate::value::{Kind, Value};
use std::collections::HashMap;

/// Encodes and decodes values under the Distinguished Encoding Rules.
///
/// DER is BER with no choices left: shortest length form, primitive-only
/// encodings for strings, canonically ordered `SET` elements, and a few
/// other tightenings enumerated in this crate's codec module. Unlike
/// [`crate::BerCodec`], [`EncodingOptions`] cannot be relaxed here: DER's
/// strict defaults are the only ones this type will encode or accept.
#[derive(Clone, Debug)]
pub struct DerCodec {
    options: EncodingOptions,
    tag_map: TagMap,
}

impl DerCodec {
    /// A codec with DER's strict defaults and the built-in APPLICATION
    /// tag map (see [`TagMap::with_defaults`]).
    pub fn new() -> Self {
        DerCodec {
            options: EncodingOptions::der(),
            tag_map: TagMap::with_defaults(),
        }
    }

    /// Replace this codec's tag map for one tag class.
    pub fn set_type_map(&mut self, class: TagClass, map: HashMap<u32, crate::tag::UniversalType>) {
        self.tag_map.set_type_map(class, map);
    }

    /// Encode a [`Value`] to DER octets.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        codec::encode_value(value, Rules::Der, &self.options)
    }

    /// Decode a single DER value from `input`. Trailing bytes past the
    /// first complete TLV are returned in [`Value::trailing_data`].
    pub fn decode(&self, input: &[u8]) -> Result<Value> {
        if input.is_empty() {
            log::debug!("DER decode failed at offset 0: empty buffer");
            return Err(Error::invalid_argument("cannot decode an empty buffer"));
        }
        let (mut value, consumed) =
            match codec::decode_value(input, Rules::Der, &self.options, &self.tag_map, true) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::debug!("DER decode failed: {err}");
                    return Err(err);
                }
            };
        if consumed < input.len() {
            value.trailing_data = Some(input[consumed..].to_vec());
        }
        Ok(value)
    }

    /// Resolve a [`Kind::Incomplete`] value by forcing `universal_type` as
    /// its interpretation, the same way [`crate::BerCodec::complete`] does
    /// for BER. `tag_map_overlay` replaces this codec's own tag map when
    /// decoding a constructed forced type's children.
    ///
    /// Values other than [`Kind::Incomplete`] are returned unchanged.
    pub fn complete(
        &self,
        value: Value,
        universal_type: UniversalType,
        tag_map_overlay: Option<&TagMap>,
    ) -> Result<Value> {
        let map = tag_map_overlay.unwrap_or(&self.tag_map);
        let kind = match value.kind {
            Kind::Incomplete(payload) => codec::decode_payload(
                universal_type,
                &payload,
                value.constructed,
                Rules::Der,
                &self.options,
                map,
            )?,
            other => other,
        };

        Ok(Value { kind, ..value })
    }
}

impl Default for DerCodec {
    fn default() -> Self {
        DerCodec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_constructed_octet_string() {
        let codec = DerCodec::new();
        // Constructed OCTET STRING tag (0x24) with a nested BOOLEAN inside.
        let bytes = [0x24, 0x03, 0x01, 0x01, 0xFF];
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::Encoder(_)));
    }

    #[test]
    fn round_trips_a_der_set_with_canonical_order() {
        let codec = DerCodec::new();
        let value = Value::new(Kind::Set(vec![
            Value::new(Kind::OctetString(vec![0x02])),
            Value::new(Kind::OctetString(vec![0x01])),
        ]));
        let encoded = codec.encode(&value).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        match decoded.kind {
            Kind::Set(children) => {
                assert_eq!(children[0].kind, Kind::OctetString(vec![0x01]));
                assert_eq!(children[1].kind, Kind::OctetString(vec![0x02]));
            }
            _ => panic!("expected a SET"),
        }
    }

    #[test]
    fn completes_an_application_tagged_value_once_mapped() {
        let plain = DerCodec::new();
        let inner = plain.encode(&Value::new(Kind::Integer(7))).unwrap();
        let payload = &inner[2..];

        let mut wire = vec![0x40 | 5, payload.len() as u8];
        wire.extend(payload);

        let mut codec = DerCodec::new();
        codec.set_type_map(TagClass::Application, HashMap::new());
        let decoded = codec.decode(&wire).unwrap();
        assert!(matches!(decoded.kind, Kind::Incomplete(_)));

        let completed = codec
            .complete(decoded, UniversalType::Integer, None)
            .unwrap();
        assert_eq!(completed.kind, Kind::Integer(7));
    }
}
