//! Tunable knobs for the shared BER/DER codec engine.

use crate::tag::UniversalType;
use std::collections::HashSet;

/// Options controlling how values are encoded and decode-time leniency is
/// applied.
///
/// [`crate::DerCodec`] builds this with [`EncodingOptions::der`] and does
/// not let callers relax it; [`crate::BerCodec`] defaults to
/// [`EncodingOptions::ber`] but callers may supply their own.
#[derive(Clone, Debug)]
pub struct EncodingOptions {
    /// The bit value used to pad the unused trailing bits of the last
    /// octet of an encoded `BIT STRING`. DER requires `'0'`.
    pub bitstring_padding: char,
    /// Universal types this codec always encodes in primitive form, even
    /// when a caller constructs a [`crate::Value`] with `constructed: true`.
    pub primitive_only: HashSet<UniversalType>,
}

impl EncodingOptions {
    /// Permissive BER defaults: no forced primitive-only types beyond
    /// those X.690 always forbids constructing (booleans, integers, ...),
    /// and `'0'` bitstring padding.
    pub fn ber() -> Self {
        EncodingOptions {
            bitstring_padding: '0',
            primitive_only: HashSet::new(),
        }
    }

    /// Strict DER defaults: every character-restricted string type plus
    /// `BIT STRING` and `OCTET STRING` are forced primitive, per X.690
    /// Section 11.3's restriction on constructed string encodings.
    pub fn der() -> Self {
        let mut primitive_only = HashSet::from([
            UniversalType::BitString,
            UniversalType::OctetString,
            UniversalType::NumericString,
            UniversalType::PrintableString,
            UniversalType::TeletexString,
            UniversalType::VideotexString,
            UniversalType::Ia5String,
            UniversalType::GraphicString,
            UniversalType::VisibleString,
            UniversalType::GeneralString,
            UniversalType::UniversalString,
            UniversalType::CharacterString,
            UniversalType::BmpString,
            UniversalType::Utf8String,
        ]);
        primitive_only.shrink_to_fit();

        EncodingOptions {
            bitstring_padding: '0',
            primitive_only,
        }
    }
}

impl Default for EncodingOptions {
    fn default() -> Self {
        EncodingOptions::ber()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn der_forces_bitstring_and_octetstring_primitive() {
        let options = EncodingOptions::der();
        assert!(options.primitive_only.contains(&UniversalType::BitString));
        assert!(options.primitive_only.contains(&UniversalType::OctetString));
        assert!(options.primitive_only.contains(&UniversalType::Utf8String));
    }

    #[test]
    fn ber_defaults_allow_constructed_strings() {
        let options = EncodingOptions::ber();
        assert!(options.primitive_only.is_empty());
        assert_eq!(options.bitstring_padding, '0');
    }
}
