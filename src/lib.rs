//! A value-oriented ASN.1 BER/DER codec.
//!
//! This crate does not derive per-type encodings from Rust structs the
//! way a `serde`-style ASN.1 library would. Instead it decodes any BER or
//! DER message into a dynamic [`Value`] tree, a tagged sum of every
//! universal type X.690 defines, and encodes the same tree back to
//! octets. That suits protocols where the message shape is only known
//! by walking tags at runtime (implicit tagging resolved via a
//! [`TagMap`], APPLICATION-class envelopes, and the like) rather than
//! fixed at compile time.
//!
//! [`BerCodec`] implements the permissive Basic Encoding Rules; [`DerCodec`]
//! wraps the same engine with the Distinguished Encoding Rules' fixed,
//! canonical subset.

mod ber;
mod codec;
mod der;
mod error;
mod length;
mod oid;
mod options;
mod tag;
mod tagmap;
mod time;
mod value;

pub use ber::BerCodec;
pub use der::DerCodec;
pub use error::{Error, Result};
pub use options::EncodingOptions;
pub use tag::{TagClass, UniversalType};
pub use tagmap::TagMap;
pub use time::{DatetimeFormat, TimeValue, Timezone};
pub use value::{BitString, Kind, StringKind, Value};
