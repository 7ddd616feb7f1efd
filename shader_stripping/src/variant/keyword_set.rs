/// Order-insensitive set of shader keyword names.
///
/// Backed by a `BTreeSet` so equality, hashing and iteration order do not
/// depend on the order keywords were supplied in. Empty names are dropped.

use std::collections::BTreeSet;
use std::fmt;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeywordSet {
    keywords: BTreeSet<String>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated keyword string (`"FOO  BAR "` -> {BAR, FOO})
    pub fn parse(raw: &str) -> Self {
        raw.split_whitespace().collect()
    }

    pub fn insert(&mut self, keyword: impl Into<String>) -> bool {
        let keyword = keyword.into();
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.len() == keyword.len() {
            self.keywords.insert(keyword)
        } else {
            self.keywords.insert(trimmed.to_string())
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    /// Copy of this set without any keyword present in `excluded`
    pub fn without(&self, excluded: &FxHashSet<String>) -> KeywordSet {
        KeywordSet {
            keywords: self
                .keywords
                .iter()
                .filter(|keyword| !excluded.contains(keyword.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Space-joined form used by the persisted collection layout
    pub fn to_joined(&self) -> String {
        self.keywords.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for keyword in iter {
            set.insert(keyword);
        }
        set
    }
}

impl fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_joined())
    }
}
