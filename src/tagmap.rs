//! Per-class tag-to-universal-type registries used to interpret
//! non-UNIVERSAL tags (APPLICATION, CONTEXT-SPECIFIC, PRIVATE) whose
//! payload shape BER/DER cannot infer from the identifier octet alone.

use crate::tag::{TagClass, UniversalType};
use std::collections::HashMap;

/// A registry mapping tag numbers, within a single non-UNIVERSAL tag
/// class, to the [`UniversalType`] that describes how to decode their
/// payload.
///
/// A value tagged outside any registered mapping decodes to
/// [`crate::Kind::Incomplete`] and carries its raw payload bytes until a
/// caller resolves it, e.g. via [`crate::ber::BerCodec::complete`].
#[derive(Clone, Debug, Default)]
pub struct TagMap {
    application: HashMap<u32, UniversalType>,
    context_specific: HashMap<u32, UniversalType>,
    private: HashMap<u32, UniversalType>,
}

impl TagMap {
    /// An empty registry: every non-UNIVERSAL tag decodes as
    /// [`crate::Kind::Incomplete`].
    pub fn empty() -> Self {
        TagMap::default()
    }

    /// The default registry this crate ships: a preloaded APPLICATION
    /// map covering the common protocol convention of APPLICATION tags
    /// shadowing UNIVERSAL payload shapes, with CONTEXT-SPECIFIC and
    /// PRIVATE left empty for callers to populate themselves.
    pub fn with_defaults() -> Self {
        let mut map = TagMap::empty();
        for number in [0, 1, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 19, 23, 24, 25] {
            map.application.insert(number, UniversalType::Sequence);
        }
        map.application.insert(2, UniversalType::Null);
        map.application.insert(10, UniversalType::OctetString);
        map.application.insert(16, UniversalType::Integer);
        map
    }

    /// Replace the entire map for one tag class.
    pub fn set_type_map(&mut self, class: TagClass, map: HashMap<u32, UniversalType>) {
        match class {
            TagClass::Universal => (),
            TagClass::Application => self.application = map,
            TagClass::ContextSpecific => self.context_specific = map,
            TagClass::Private => self.private = map,
        }
    }

    /// Look up the [`UniversalType`] registered for `(class, number)`, if
    /// any. UNIVERSAL tags are never looked up here; their type follows
    /// directly from the tag number via [`UniversalType::from_tag_number`].
    pub(crate) fn lookup(&self, class: TagClass, number: u32) -> Option<UniversalType> {
        match class {
            TagClass::Universal => UniversalType::from_tag_number(number),
            TagClass::Application => self.application.get(&number).copied(),
            TagClass::ContextSpecific => self.context_specific.get(&number).copied(),
            TagClass::Private => self.private.get(&number).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_documented_table() {
        let map = TagMap::with_defaults();
        assert_eq!(
            map.lookup(TagClass::Application, 0),
            Some(UniversalType::Sequence)
        );
        assert_eq!(
            map.lookup(TagClass::Application, 2),
            Some(UniversalType::Null)
        );
        assert_eq!(
            map.lookup(TagClass::Application, 10),
            Some(UniversalType::OctetString)
        );
        assert_eq!(
            map.lookup(TagClass::Application, 16),
            Some(UniversalType::Integer)
        );
        assert_eq!(map.lookup(TagClass::ContextSpecific, 0), None);
    }

    #[test]
    fn overriding_replaces_the_whole_map() {
        let mut map = TagMap::with_defaults();
        let mut overlay = HashMap::new();
        overlay.insert(0, UniversalType::OctetString);
        map.set_type_map(TagClass::Application, overlay);
        assert_eq!(
            map.lookup(TagClass::Application, 0),
            Some(UniversalType::OctetString)
        );
        assert_eq!(map.lookup(TagClass::Application, 2), None);
    }
}
