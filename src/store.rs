//! Persisted citation record store
//!
//! A title-keyed, order-preserving mapping of paper records, persisted as
//! human-diffable JSON. The store is the single source of truth for
//! citation counts; the document only ever receives badge patches derived
//! from it.
//!
//! Persisted shape:
//!
//! ```json
//! {
//!   "papers": {
//!     "Paper Title": {
//!       "title": "Paper Title",
//!       "citations": 42,
//!       "last_updated": "2024-05-01-12:00:00"
//!     }
//!   }
//! }
//! ```
//!
//! Entry order in the file follows in-memory record order, so after a
//! scheduling pass the file reads as the lookup priority queue.

use crate::time::EPOCH_SENTINEL;
use crate::Result;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// One paper's citation state.
///
/// The map key it is stored under is the reconciliation key (the title as
/// written in the document); the `title` field is the search key sent to
/// the lookup service. They start identical, but an operator may edit the
/// `title` field in the store file to repair a search mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Search key for the lookup service
    pub title: String,
    /// Last known citation count
    pub citations: u64,
    /// Store-format timestamp of the last successful lookup
    pub last_updated: String,
}

impl PaperRecord {
    /// Fresh record for a newly discovered title: zero citations and the
    /// epoch sentinel, so it sorts first on the next scheduling pass.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            citations: 0,
            last_updated: EPOCH_SENTINEL.to_string(),
        }
    }
}

/// Order-preserving record store bound to its file path.
///
/// `save` writes through a temp file and rename, so a crashed writer
/// never leaves a torn file behind.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    entries: Vec<(String, PaperRecord)>,
}

impl Store {
    /// Empty store bound to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Load the store file; a missing file yields an empty store, a
    /// structurally invalid one is fatal.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Store file absent, starting empty");
            return Ok(Self::new(path));
        }
        let raw = std::fs::read_to_string(&path)?;
        let file: StoreFile = serde_json::from_str(&raw)?;
        Ok(Self {
            path,
            entries: file.papers,
        })
    }

    /// Write the full store to disk in current entry order
    pub fn save(&self) -> Result<()> {
        let file = StoreFileRef {
            papers: &self.entries,
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&PaperRecord> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PaperRecord> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
    }

    /// Insert a record at the end of the order, replacing any existing
    /// record under the same key in place.
    pub fn insert(&mut self, key: String, record: PaperRecord) {
        match self.get_mut(&key) {
            Some(existing) => *existing = record,
            None => self.entries.push((key, record)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PaperRecord)> {
        self.entries.iter().map(|(k, record)| (k.as_str(), record))
    }

    /// Stable-sort records by last update, oldest first. The timestamp
    /// format sorts lexicographically, so string comparison suffices.
    pub fn sort_by_last_updated(&mut self) {
        self.entries
            .sort_by(|(_, a), (_, b)| a.last_updated.cmp(&b.last_updated));
    }
}

/// Owned persisted form, deserialized with a map visitor so file order
/// survives the round trip (serde_json's default map type would reorder
/// keys).
#[derive(Deserialize)]
struct StoreFile {
    #[serde(deserialize_with = "deserialize_papers")]
    papers: Vec<(String, PaperRecord)>,
}

/// Borrowed persisted form for serialization
#[derive(Serialize)]
struct StoreFileRef<'a> {
    #[serde(serialize_with = "serialize_papers")]
    papers: &'a [(String, PaperRecord)],
}

fn serialize_papers<S>(
    papers: &&[(String, PaperRecord)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(papers.len()))?;
    for (key, record) in papers.iter() {
        map.serialize_entry(key, record)?;
    }
    map.end()
}

fn deserialize_papers<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, PaperRecord)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PapersVisitor;

    impl<'de> Visitor<'de> for PapersVisitor {
        type Value = Vec<(String, PaperRecord)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a map of paper records keyed by title")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, record)) = access.next_entry::<String, PaperRecord>()? {
                entries.push((key, record));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(PapersVisitor)
}
