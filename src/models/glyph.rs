use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Name of one glyph inside a font's glyph table (e.g. `uniE10E`).
///
/// This is the glyph's table name, not the code point it is drawn for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GlyphKey(String);

impl GlyphKey {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlyphKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for GlyphKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for GlyphKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Optical recognition result for one glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecognizedWord {
    /// Exactly one character was recovered
    Char(char),
    /// Recognition failed or was ambiguous
    #[default]
    Unknown,
}

impl RecognizedWord {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Char(_))
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Unknown => None,
        }
    }
}

impl From<Option<char>> for RecognizedWord {
    fn from(value: Option<char>) -> Self {
        value.map_or(Self::Unknown, Self::Char)
    }
}

impl fmt::Display for RecognizedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for RecognizedWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Char(c) => serializer.serialize_some(&c.to_string()),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

/// Recognized words for the glyphs of one font.
///
/// Maps built through single-glyph lookups fill in lazily and stay
/// incomplete; a full-font pass marks the map complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GlyphResultMap {
    words: BTreeMap<GlyphKey, RecognizedWord>,
    #[serde(skip)]
    complete: bool,
}

impl GlyphResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map that holds results for every nameable glyph of a font
    pub fn complete(words: BTreeMap<GlyphKey, RecognizedWord>) -> Self {
        Self {
            words,
            complete: true,
        }
    }

    /// Whether a full-font pass produced (or filled in) this map
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn get(&self, key: &GlyphKey) -> Option<RecognizedWord> {
        self.words.get(key).copied()
    }

    /// Returns the word only when it was actually recognized
    pub fn get_known(&self, key: &GlyphKey) -> Option<char> {
        self.get(key).and_then(|word| word.as_char())
    }

    pub fn insert(&mut self, key: GlyphKey, word: RecognizedWord) -> Option<RecognizedWord> {
        self.words.insert(key, word)
    }

    /// Fold another map into this one.
    ///
    /// Known words are never replaced by unknown ones.
    pub fn merge(&mut self, other: GlyphResultMap) {
        for (key, word) in other.words {
            match self.words.entry(key) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(word);
                }
                btree_map::Entry::Occupied(mut slot) => {
                    if word.is_known() {
                        slot.insert(word);
                    }
                }
            }
        }
        self.complete |= other.complete;
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GlyphKey, &RecognizedWord)> {
        self.words.iter()
    }

    /// Number of glyphs that resolved to a character
    pub fn known_count(&self) -> usize {
        self.words.values().filter(|word| word.is_known()).count()
    }
}

impl<'a> IntoIterator for &'a GlyphResultMap {
    type Item = (&'a GlyphKey, &'a RecognizedWord);
    type IntoIter = btree_map::Iter<'a, GlyphKey, RecognizedWord>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}
