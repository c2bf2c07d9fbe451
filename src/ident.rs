//! Identifier normalization
//!
//! Item ids and names arrive as arbitrary user text ("Pompe n°2",
//! "CNC  Mill", "ＣＮＣ"). [`normalize`] turns any string into a stable ASCII
//! key; every lookup goes through an [`ItemId`] built once at ingestion.

use std::collections::HashMap;
use std::fmt;

use unicode_normalization::UnicodeNormalization;

/// Number of hex characters of the content hash appended to every key
const HASH_LEN: usize = 10;

/// Opaque, normalized item key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Normalize raw text into a key
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compatibility-composed text without control characters, whitespace collapsed
fn canonical(name: &str) -> String {
    let composed: String = name.nfkc().filter(|c| !c.is_control()).collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert any name into a deterministic ASCII key
///
/// The readable part is a lowercase transliteration with every run of
/// separators replaced by `_`. A short BLAKE3 digest of the canonical text is
/// appended so names that transliterate alike ("Café" / "Cafe") stay apart.
pub fn normalize(name: &str) -> String {
    let canonical = canonical(name);

    let ascii = deunicode::deunicode(&canonical).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for word in ascii.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(word);
    }
    if slug.is_empty() {
        slug.push_str("item");
    }

    let digest = blake3::hash(canonical.as_bytes()).to_hex();
    format!("{}_{}", slug, &digest.as_str()[..HASH_LEN])
}

/// Lookup table from normalized ids and display names to item positions
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    by_id: HashMap<ItemId, usize>,
    by_name: HashMap<ItemId, usize>,
    /// Raw ids in item order
    ids: Vec<String>,
}

impl ItemRegistry {
    /// Build from `(id, name)` pairs in item order
    ///
    /// Returns the offending raw id when two ids normalize to the same key.
    pub fn new<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, String> {
        let mut registry = Self::default();
        let mut names = Vec::new();
        for (index, (id, name)) in items.into_iter().enumerate() {
            if registry.by_id.insert(ItemId::new(id), index).is_some() {
                return Err(id.to_string());
            }
            registry.ids.push(id.to_string());
            names.push((ItemId::new(name), index));
        }
        // Names are a fallback: ambiguous names resolve to the first item
        for (key, index) in names {
            registry.by_name.entry(key).or_insert(index);
        }
        Ok(registry)
    }

    /// Resolve a reference by id, then by display name
    pub fn resolve(&self, reference: &str) -> Option<usize> {
        let key = ItemId::new(reference);
        self.by_id
            .get(&key)
            .or_else(|| self.by_name.get(&key))
            .copied()
    }

    /// Up to three ids within edit distance 2 of an unresolved reference
    pub fn suggest(&self, reference: &str) -> Vec<String> {
        let target = reference.trim().to_lowercase();
        let mut candidates: Vec<(&String, usize)> = self
            .ids
            .iter()
            .filter_map(|id| {
                let dist = levenshtein_distance(&id.to_lowercase(), &target);
                (dist > 0 && dist <= 2).then_some((id, dist))
            })
            .collect();
        candidates.sort_by_key(|(_, d)| *d);
        candidates.into_iter().take(3).map(|(id, _)| id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        row[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            row[j] = (prev[j] + 1).min(row[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}
