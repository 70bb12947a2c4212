//! The ASN.1 value model: a closed tagged sum of every supported
//! universal type, plus the envelope fields (tag class, tag number,
//! constructed flag, trailing data) every value carries regardless of
//! its payload.

use crate::tag::{TagClass, UniversalType};
use crate::time::TimeValue;

/// A decoded or to-be-encoded ASN.1 value.
///
/// The envelope fields (`tag_class`, `tag_number`, `constructed`) default
/// to the value's natural universal tag when constructed via the `From`
/// impls below; callers that need an implicitly-tagged or application-
/// class value override them afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    /// The payload, dispatched on by the codec.
    pub kind: Kind,
    /// Tag class: UNIVERSAL, APPLICATION, CONTEXT-SPECIFIC, or PRIVATE.
    pub tag_class: TagClass,
    /// Tag number within `tag_class`.
    pub tag_number: u32,
    /// Whether this value's encoding is constructed (vs. primitive).
    pub constructed: bool,
    /// Bytes left over past the first complete TLV. Only ever set on the
    /// root value returned by a top-level `decode` call.
    pub trailing_data: Option<Vec<u8>>,
}

impl Value {
    /// Construct a [`Value`] from a [`Kind`], defaulting the envelope to
    /// the kind's natural universal tag and constructed-ness.
    pub fn new(kind: Kind) -> Self {
        let tag_number = kind
            .universal_type()
            .map(UniversalType::tag_number)
            .unwrap_or(0);
        let constructed = kind.is_naturally_constructed();

        Value {
            kind,
            tag_class: TagClass::Universal,
            tag_number,
            constructed,
            trailing_data: None,
        }
    }

    /// Override the tag class and number, e.g. to produce an implicitly
    /// tagged or APPLICATION-class value. Returns `self` for chaining.
    pub fn with_tag(mut self, class: TagClass, number: u32) -> Self {
        self.tag_class = class;
        self.tag_number = number;
        self
    }

    /// Override the constructed flag. Returns `self` for chaining.
    pub fn with_constructed(mut self, constructed: bool) -> Self {
        self.constructed = constructed;
        self
    }

    /// The child values of a `SEQUENCE`/`SET`, if this is one.
    pub fn children(&self) -> Option<&[Value]> {
        match &self.kind {
            Kind::Sequence(children) | Kind::Set(children) => Some(children),
            _ => None,
        }
    }
}

/// The payload carried by a [`Value`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Kind {
    Boolean(bool),
    Integer(i64),
    Enumerated(i64),
    BitString(BitString),
    OctetString(Vec<u8>),
    Null,
    /// Dotted-decimal arc string, e.g. `"1.3.6.1.4.1.311.21.20"`.
    Oid(String),
    /// Dotted-decimal arc string for a RELATIVE OID (no merged first pair).
    RelativeOid(String),
    Sequence(Vec<Value>),
    Set(Vec<Value>),
    /// Any of the character-restricted string types, keyed by `kind`.
    CharacterString { kind: StringKind, text: String },
    UtcTime(TimeValue),
    GeneralizedTime(TimeValue),
    /// Raw payload bytes for a non-universal tag the decoder's tag map
    /// could not resolve. Resolved later via [`crate::ber::BerCodec::complete`].
    Incomplete(Vec<u8>),
}

impl Kind {
    /// The universal type this payload corresponds to, if any (an
    /// `Incomplete` value has none until it is completed).
    pub fn universal_type(&self) -> Option<UniversalType> {
        Some(match self {
            Kind::Boolean(_) => UniversalType::Boolean,
            Kind::Integer(_) => UniversalType::Integer,
            Kind::Enumerated(_) => UniversalType::Enumerated,
            Kind::BitString(_) => UniversalType::BitString,
            Kind::OctetString(_) => UniversalType::OctetString,
            Kind::Null => UniversalType::Null,
            Kind::Oid(_) => UniversalType::ObjectIdentifier,
            Kind::RelativeOid(_) => UniversalType::RelativeOid,
            Kind::Sequence(_) => UniversalType::Sequence,
            Kind::Set(_) => UniversalType::Set,
            Kind::CharacterString { kind, .. } => kind.universal_type(),
            Kind::UtcTime(_) => UniversalType::UtcTime,
            Kind::GeneralizedTime(_) => UniversalType::GeneralizedTime,
            Kind::Incomplete(_) => return None,
        })
    }

    /// Whether this payload's natural (unoverridden) encoding is
    /// constructed. Only `SEQUENCE`/`SET` are naturally constructed; BER
    /// additionally permits callers to mark strings constructed by
    /// overriding [`Value::constructed`] directly.
    pub fn is_naturally_constructed(&self) -> bool {
        matches!(self, Kind::Sequence(_) | Kind::Set(_))
    }

    /// Whether this payload is one of the character-restricted string
    /// types (every string variant except `OCTET STRING`).
    pub fn is_character_restricted(&self) -> bool {
        matches!(self, Kind::CharacterString { .. })
    }
}

/// Table-driven descriptor for the twelve character-restricted string
/// types, all of which share the same payload shape (a text value) and
/// differ only in their universal tag number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StringKind {
    Numeric,
    Printable,
    Ia5,
    Teletex,
    Videotex,
    Graphic,
    Visible,
    General,
    Bmp,
    Universal,
    Utf8,
    Character,
}

impl StringKind {
    /// The universal type carrying this string kind's tag number.
    pub fn universal_type(self) -> UniversalType {
        match self {
            StringKind::Numeric => UniversalType::NumericString,
            StringKind::Printable => UniversalType::PrintableString,
            StringKind::Ia5 => UniversalType::Ia5String,
            StringKind::Teletex => UniversalType::TeletexString,
            StringKind::Videotex => UniversalType::VideotexString,
            StringKind::Graphic => UniversalType::GraphicString,
            StringKind::Visible => UniversalType::VisibleString,
            StringKind::General => UniversalType::GeneralString,
            StringKind::Bmp => UniversalType::BmpString,
            StringKind::Universal => UniversalType::UniversalString,
            StringKind::Utf8 => UniversalType::Utf8String,
            StringKind::Character => UniversalType::CharacterString,
        }
    }

    /// Recover a [`StringKind`] from a [`UniversalType`], if it is one of
    /// the character-restricted string types.
    pub fn from_universal_type(universal_type: UniversalType) -> Option<Self> {
        Some(match universal_type {
            UniversalType::NumericString => StringKind::Numeric,
            UniversalType::PrintableString => StringKind::Printable,
            UniversalType::Ia5String => StringKind::Ia5,
            UniversalType::TeletexString => StringKind::Teletex,
            UniversalType::VideotexString => StringKind::Videotex,
            UniversalType::GraphicString => StringKind::Graphic,
            UniversalType::VisibleString => StringKind::Visible,
            UniversalType::GeneralString => StringKind::General,
            UniversalType::BmpString => StringKind::Bmp,
            UniversalType::UniversalString => StringKind::Universal,
            UniversalType::Utf8String => StringKind::Utf8,
            UniversalType::CharacterString => StringKind::Character,
            _ => return None,
        })
    }
}

/// An ASN.1 `BIT STRING`: packed octets plus the count of unused trailing
/// bits (0..=7) in the last octet, per X.690 Section 8.6.
///
/// Stored as packed bytes rather than a `'0'`/`'1'` string for efficiency
/// (per this crate's design notes); [`BitString::to_bit_text`] and
/// [`BitString::from_bit_text`] provide the textual form the value model
/// also describes, for callers and tests that prefer it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BitString {
    pub bytes: Vec<u8>,
    pub unused_bits: u8,
}

impl BitString {
    /// An empty `BIT STRING` (zero bits).
    pub fn empty() -> Self {
        BitString {
            bytes: Vec::new(),
            unused_bits: 0,
        }
    }

    /// The exact number of bits this value represents.
    pub fn bit_len(&self) -> usize {
        self.bytes
            .len()
            .saturating_mul(8)
            .saturating_sub(usize::from(self.unused_bits))
    }

    /// Build a [`BitString`] from a string of `'0'`/`'1'` characters,
    /// preserving leading zeros and the exact bit count. `padding` fills
    /// the unused trailing bits of the last byte (DER requires `'0'`).
    pub fn from_bit_text(text: &str, padding: char) -> Option<Self> {
        if !text.chars().all(|c| c == '0' || c == '1') {
            return None;
        }

        let bit_len = text.len();
        if bit_len == 0 {
            return Some(BitString::empty());
        }

        let byte_len = bit_len.div_ceil(8);
        let unused_bits = (byte_len * 8 - bit_len) as u8;
        let mut bytes = vec![0u8; byte_len];

        for (index, bit) in text
            .chars()
            .chain(std::iter::repeat(padding).take(usize::from(unused_bits)))
            .enumerate()
        {
            if bit == '1' {
                bytes[index / 8] |= 0x80 >> (index % 8);
            }
        }

        Some(BitString { bytes, unused_bits })
    }

    /// Render this value as a string of `'0'`/`'1'` characters, one per
    /// bit, excluding the unused trailing bits.
    pub fn to_bit_text(&self) -> String {
        let mut out = String::with_capacity(self.bit_len());
        for index in 0..self.bit_len() {
            let byte = self.bytes[index / 8];
            let bit = (byte >> (7 - index % 8)) & 1;
            out.push(if bit == 1 { '1' } else { '0' });
        }
        out
    }
}
