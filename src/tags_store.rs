use crate::import_stdlib;
import_stdlib!();

use crate::tag::Tag;

/// A trait for types that can map between CBOR tags and their human-readable
/// names.
///
/// Implementers maintain a bidirectional mapping between tag values and
/// names, used by diagnostic notation (`src/diag.rs`) and by error messages.
/// The primary implementation is [`TagsStore`].
pub trait TagsStoreTrait {
    fn assigned_name_for_tag(&self, tag: &Tag) -> Option<String>;
    fn name_for_tag(&self, tag: &Tag) -> String;
    fn tag_for_value(&self, value: u64) -> Option<Tag>;
    fn tag_for_name(&self, name: &str) -> Option<Tag>;
    fn name_for_value(&self, value: u64) -> String;

    fn name_for_tag_opt<T>(tag: &Tag, tags: Option<&T>) -> String
    where
        T: TagsStoreTrait,
        Self: Sized,
    {
        match tags {
            None => tag.value().to_string(),
            Some(tags) => tags.name_for_tag(tag),
        }
    }
}

/// A registry that maintains mappings between CBOR tags and their
/// human-readable names.
///
/// `TagsStore` is consulted only by diagnostic/reporting code (§F of
/// `SPEC_FULL.md`); the decoder's traversal and tag-content dispatch (§4.8)
/// work entirely on the numeric tag value and never need a `TagsStore` to
/// function correctly.
///
/// ```
/// use cbor_core::prelude::*;
///
/// let mut tags = TagsStore::new([
///     Tag::new_with_name(1, "date"),
///     Tag::new_with_name(2, "pos-bignum"),
/// ]);
/// tags.insert(Tag::new_with_name(3, "neg-bignum"));
///
/// assert_eq!(tags.name_for_value(1), "date");
/// assert_eq!(tags.tag_for_name("neg-bignum").unwrap().value(), 3);
/// ```
#[derive(Clone)]
pub struct TagsStore {
    tags_by_value: HashMap<u64, Tag>,
    tags_by_name: HashMap<String, Tag>,
}

impl TagsStore {
    pub fn new<T>(tags: T) -> Self
    where
        T: IntoIterator<Item = Tag>,
    {
        let mut store = Self {
            tags_by_value: HashMap::new(),
            tags_by_name: HashMap::new(),
        };
        for tag in tags {
            store.insert(tag);
        }
        store
    }

    /// Registers a tag. Panics if the same value was already registered
    /// under a different name, matching the teacher crate's policy of
    /// treating a conflicting re-registration as a programmer error.
    pub fn insert(&mut self, tag: Tag) {
        let name = tag.name().unwrap_or_else(|| tag.value().to_string());
        if let Some(old) = self.tags_by_value.insert(tag.value(), tag.clone()) {
            let old_name = old.name().unwrap_or_else(|| old.value().to_string());
            if old_name != name {
                panic!(
                    "attempt to register tag {} as '{}', already registered as '{}'",
                    tag.value(),
                    name,
                    old_name
                );
            }
        }
        self.tags_by_name.insert(name, tag);
    }

    pub fn insert_all(&mut self, tags: Vec<Tag>) {
        for tag in tags {
            self.insert(tag);
        }
    }
}

impl TagsStoreTrait for TagsStore {
    fn assigned_name_for_tag(&self, tag: &Tag) -> Option<String> {
        self.tag_for_value(tag.value()).and_then(|t| t.name())
    }

    fn name_for_tag(&self, tag: &Tag) -> String {
        self.assigned_name_for_tag(tag)
            .unwrap_or_else(|| tag.value().to_string())
    }

    fn tag_for_name(&self, name: &str) -> Option<Tag> {
        self.tags_by_name.get(name).cloned()
    }

    fn tag_for_value(&self, value: u64) -> Option<Tag> {
        self.tags_by_value.get(&value).cloned()
    }

    fn name_for_value(&self, value: u64) -> String {
        self.tag_for_value(value)
            .and_then(|tag| tag.name())
            .unwrap_or_else(|| value.to_string())
    }
}

impl Default for TagsStore {
    fn default() -> Self {
        Self::new([])
    }
}
