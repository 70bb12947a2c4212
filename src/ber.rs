//! The public BER codec.

use crate::codec::{self, Rules};
use crate::error::{Error, Result};
use crate::options::EncodingOptions;
use crate::tag::{TagClass, UniversalType};
use crate::tagmap::TagMap;
use crate::value::{Kind, Value};
use std::collections::HashMap;

/// Encodes and decodes values under the Basic Encoding Rules.
///
/// Carries an [`EncodingOptions`] and a [`TagMap`] so callers can register
/// how APPLICATION/CONTEXT-SPECIFIC/PRIVATE tags map to payload shapes
/// before decoding protocol messages that rely on implicit tagging.
#[derive(Clone, Debug)]
pub struct BerCodec {
    options: EncodingOptions,
    tag_map: TagMap,
}

impl BerCodec {
    /// A codec with permissive BER defaults and the built-in APPLICATION
    /// tag map (see [`TagMap::with_defaults`]).
    pub fn new() -> Self {
        BerCodec {
            options: EncodingOptions::ber(),
            tag_map: TagMap::with_defaults(),
        }
    }

    /// Build a codec with caller-supplied [`EncodingOptions`].
    pub fn with_options(options: EncodingOptions) -> Self {
        BerCodec {
            options,
            tag_map: TagMap::with_defaults(),
        }
    }

    /// Replace this codec's tag map for one tag class.
    pub fn set_type_map(&mut self, class: TagClass, map: HashMap<u32, crate::tag::UniversalType>) {
        self.tag_map.set_type_map(class, map);
    }

    /// Encode a [`Value`] to BER octets.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        codec::encode_value(value, Rules::Ber, &self.options)
    }

    /// Decode a single BER value from `input`.
    ///
    /// Any bytes past the first complete TLV are returned in
    /// [`Value::trailing_data`] rather than rejected, since BER messages
    /// are frequently concatenated on the wire. An incomplete TLV (not
    /// enough bytes for even the identifier or length, or a truncated
    /// value) returns [`Error::PartialPdu`] so a caller reading from a
    /// stream knows to buffer more and retry.
    pub fn decode(&self, input: &[u8]) -> Result<Value> {
        if input.is_empty() {
            log::debug!("BER decode failed at offset 0: empty buffer");
            return Err(Error::invalid_argument("cannot decode an empty buffer"));
        }
        let (mut value, consumed) =
            match codec::decode_value(input, Rules::Ber, &self.options, &self.tag_map, true) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::debug!("BER decode failed: {err}");
                    return Err(err);
                }
            };
        if consumed < input.len() {
            value.trailing_data = Some(input[consumed..].to_vec());
        }
        Ok(value)
    }

    /// Decode a single BER value from `input` using `map` instead of this
    /// codec's own tag map, without mutating `self`.
    pub fn decode_with_map(&self, input: &[u8], map: &TagMap) -> Result<Value> {
        if input.is_empty() {
            log::debug!("BER decode failed at offset 0: empty buffer");
            return Err(Error::invalid_argument("cannot decode an empty buffer"));
        }
        let (mut value, consumed) = match codec::decode_value(input, Rules::Ber, &self.options, map, true)
        {
            Ok(decoded) => decoded,
            Err(err) => {
                log::debug!("BER decode failed: {err}");
                return Err(err);
            }
        };
        if consumed < input.len() {
            value.trailing_data = Some(input[consumed..].to_vec());
        }
        Ok(value)
    }

    /// Resolve a [`Kind::Incomplete`] value by forcing `universal_type` as
    /// its interpretation, without first registering that mapping in the
    /// codec's tag map. `tag_map_overlay` is used in place of this codec's
    /// own tag map when the forced type is constructed (its children may
    /// themselves carry tags this codec doesn't otherwise know).
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
                Rules::Ber,
                &self.options,
                map,
            )?,
            other => other,
        };

        Ok(Value { kind, ..value })
    }
}

impl Default for BerCodec {
    fn default() -> Self {
        BerCodec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_reports_trailing_data() {
        let codec = BerCodec::new();
        let first = codec.encode(&Value::new(Kind::Boolean(true))).unwrap();
        let second = codec.encode(&Value::new(Kind::Null)).unwrap();
        let mut combined = first.clone();
        combined.extend(&second);

        let decoded = codec.decode(&combined).unwrap();
        assert_eq!(decoded.kind, Kind::Boolean(true));
        assert_eq!(decoded.trailing_data.as_deref(), Some(second.as_slice()));
    }

    #[test]
    fn completes_an_application_tagged_value_once_mapped() {
        let plain = BerCodec::new();
        let inner = plain.encode(&Value::new(Kind::Integer(7))).unwrap();
        let payload = &inner[2..];

        // An APPLICATION [5] IMPLICIT INTEGER: same payload bytes, a tag
        // the codec doesn't yet know how to interpret.
        let mut wire = vec![0x40 | 5, payload.len() as u8];
        wire.extend(payload);

        let mut codec = BerCodec::new();
        codec.set_type_map(TagClass::Application, HashMap::new());
        let decoded = codec.decode(&wire).unwrap();
        assert!(matches!(decoded.kind, Kind::Incomplete(_)));

        let completed = codec
            .complete(decoded, UniversalType::Integer, None)
            .unwrap();
        assert_eq!(completed.kind, Kind::Integer(7));
    }
}
