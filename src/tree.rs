use std::{collections::BTreeMap, fmt};

use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::{debug, trace};

use crate::{FieldPath, Segment};

/// Key of a [`FieldTree`] level.
///
/// Integer keys sort before string keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Non-negative integer key
    Index(u64),
    /// String key
    Name(String),
}

impl Key {
    /// Builds a key from a path segment, coercing canonical decimal literals.
    ///
    /// `0` and `42` become [`Key::Index`], `007`, `-1` and `+1` stay names.
    #[must_use]
    pub fn from_segment(s: &str) -> Self {
        let bytes = s.as_bytes();
        let canonical = match bytes {
            [] => false,
            [b'0'] => true,
            [b'0', ..] => false,
            _ => bytes.iter().all(u8::is_ascii_digit),
        };

        if canonical {
            if let Ok(n) = s.parse() {
                return Self::Index(n);
            }
        }

        Self::Name(s.to_string())
    }

    /// Gets the integer key.
    #[must_use]
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(n) => Some(*n),
            Self::Name(_) => None,
        }
    }

    /// Gets the string key.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(s) => Some(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "{n}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Key {
    fn from(n: u64) -> Self {
        Self::Index(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::from_segment(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::from_segment(&s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Nested fields built from bracket-notation names.
///
/// The root of a tree is always a map; leaves hold `T`, e.g. a decoded text
/// value or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTree<T> {
    /// Leaf value
    Value(T),
    /// Nested level
    Map(BTreeMap<Key, FieldTree<T>>),
}

impl<T> Default for FieldTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FieldTree<T> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Inserts `value` at the bracket-notation `name`.
    ///
    /// ```
    /// use form_body::FieldTree;
    ///
    /// let mut tree = FieldTree::new();
    /// tree.insert("tags[]", "a");
    /// tree.insert("tags[]", "b");
    ///
    /// assert_eq!(tree.get_path("tags[1]").and_then(FieldTree::as_value), Some(&"b"));
    /// ```
    pub fn insert(&mut self, name: &str, value: T) {
        let path = FieldPath::parse(name);
        if path.is_empty() {
            trace!("empty field name, value dropped");
            return;
        }
        self.insert_at(path.segments(), value);
    }

    /// Inserts `value` at `path`, creating missing levels.
    ///
    /// A leaf met on the way is replaced by an empty level. The last segment
    /// always takes `value`, whatever it held before.
    pub fn insert_at(&mut self, path: &[Segment], value: T) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };

        let mut node = self;
        for segment in parents {
            let map = node.level_mut();
            let key = next_key(map, segment);
            node = map.entry(key).or_default();
        }

        let map = node.level_mut();
        let key = next_key(map, last);
        map.insert(key, Self::Value(value));
    }

    fn level_mut(&mut self) -> &mut BTreeMap<Key, Self> {
        if let Self::Value(_) = self {
            debug!("field collision, value replaced by a nested level");
            *self = Self::new();
        }

        match self {
            Self::Map(map) => map,
            Self::Value(_) => unreachable!("value was replaced by a map"),
        }
    }

    /// Gets the child at `key`.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Self> {
        self.as_map()?.get(&key.into())
    }

    /// Gets the node at the bracket-notation `name`, `[]` never matches.
    #[must_use]
    pub fn get_path(&self, name: &str) -> Option<&Self> {
        FieldPath::parse(name)
            .segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                Segment::Key(key) => node.as_map()?.get(key),
                Segment::Auto => None,
            })
    }

    /// Gets the leaf value.
    #[must_use]
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Map(_) => None,
        }
    }

    /// Gets the nested level.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<Key, Self>> {
        match self {
            Self::Value(_) => None,
            Self::Map(map) => Some(map),
        }
    }

    /// Counts the children of a level, a leaf counts as zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_map().map_or(0, BTreeMap::len)
    }

    /// Checks if the node is a level without children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the children of a level.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Self)> {
        self.as_map().into_iter().flat_map(BTreeMap::iter)
    }

    /// Builds a tree of the same shape with every leaf mapped by `f`.
    pub fn map<U, F>(&self, mut f: F) -> FieldTree<U>
    where
        F: FnMut(&T) -> U,
    {
        self.map_with(&mut f)
    }

    fn map_with<U, F>(&self, f: &mut F) -> FieldTree<U>
    where
        F: FnMut(&T) -> U,
    {
        match self {
            Self::Value(v) => FieldTree::Value(f(v)),
            Self::Map(map) => FieldTree::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.map_with(f)))
                    .collect(),
            ),
        }
    }
}

impl<T: Serialize> Serialize for FieldTree<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Map(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

/// Resolves the key a segment targets at one level.
///
/// `[]` takes one past the largest integer key, or `0` on a level without one.
fn next_key<T>(map: &BTreeMap<Key, FieldTree<T>>, segment: &Segment) -> Key {
    match segment {
        Segment::Key(key) => key.clone(),
        Segment::Auto => Key::Index(
            map.keys()
                .rev()
                .find_map(Key::as_index)
                .map_or(0, |n| n.saturating_add(1)),
        ),
    }
}
