//! Locally curated override database.
//!
//! A JSON file mapping a lowercase topic to a list of hand-picked
//! [`MediaResult`] records. The whole file is read at startup and rewritten
//! after every [`OverrideDb::add`]; there is no locking, so concurrent
//! writers lose updates (last writer wins).
//!
//! Records are validated one by one on load. A malformed record is appended
//! to a `*.quarantine.json` sidecar instead of failing the whole load, and a
//! file that is not a JSON object at all is renamed to `*.corrupt` (numbered
//! when an earlier copy exists) and replaced by an empty database.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{MemeError, Result};
use crate::types::{ContentType, MediaResult};

/// Override database shared between the curated provider and the code that
/// adds entries.
pub type SharedOverrides = Arc<RwLock<OverrideDb>>;

/// A record rejected during load, kept so it is not silently lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantinedRecord {
    /// Topic the record was filed under.
    pub topic: String,
    /// The raw JSON of the rejected record.
    pub record: serde_json::Value,
    /// Why the record was rejected.
    pub reason: String,
}

/// Topic → curated results mapping, persisted as JSON.
#[derive(Debug, Clone, Default)]
pub struct OverrideDb {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Vec<MediaResult>>,
    quarantined: Vec<QuarantinedRecord>,
}

impl OverrideDb {
    /// An empty database that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the database at `path`.
    ///
    /// A missing file is not an error: an empty mapping is created and
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read, or if
    /// a fresh or repaired database cannot be written.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, false)
    }

    /// Like [`load`](Self::load), but a missing file is seeded with the
    /// built-in entries when `seed_defaults` is `true`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with(path: &Path, seed_defaults: bool) -> Result<Self> {
        let mut db = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };

        if !path.exists() {
            if seed_defaults {
                db.entries = default_entries();
            }
            tracing::info!(path = %path.display(), seeded = seed_defaults, "creating override database");
            db.save()?;
            return Ok(db);
        }

        let content = std::fs::read_to_string(path)?;
        let root: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(root) => root,
            Err(e) => {
                let corrupt = move_aside(path, "corrupt")?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %corrupt.display(),
                    error = %e,
                    "override database is not a JSON object, starting empty"
                );
                db.save()?;
                return Ok(db);
            }
        };

        for (topic, value) in root {
            let topic_key = topic.trim().to_lowercase();
            let serde_json::Value::Array(records) = value else {
                db.quarantine(topic, value, "topic value is not a list".to_owned());
                continue;
            };
            for record in records {
                match serde_json::from_value::<MediaResult>(record.clone()) {
                    Ok(result) => match validate_record(&result) {
                        Ok(()) => db.entries.entry(topic_key.clone()).or_default().push(result),
                        Err(reason) => db.quarantine(topic.clone(), record, reason),
                    },
                    Err(e) => db.quarantine(topic.clone(), record, e.to_string()),
                }
            }
        }

        if !db.quarantined.is_empty() {
            let sidecar = sidecar_path(path, "quarantine.json");
            tracing::warn!(
                count = db.quarantined.len(),
                sidecar = %sidecar.display(),
                "quarantined malformed override records"
            );
            append_quarantine(&sidecar, &db.quarantined)?;
        }

        tracing::debug!(topics = db.entries.len(), "override database loaded");
        Ok(db)
    }

    /// Wrap this database for sharing with a [`CuratedProvider`](crate::providers::CuratedProvider).
    #[must_use]
    pub fn into_shared(self) -> SharedOverrides {
        Arc::new(RwLock::new(self))
    }

    /// Append a curated record under `topic` and rewrite the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::Database`] for an empty topic or an invalid
    /// record, and an I/O or database error if the file cannot be written.
    pub fn add(&mut self, topic: &str, result: MediaResult) -> Result<()> {
        let topic = topic.trim().to_lowercase();
        if topic.is_empty() {
            return Err(MemeError::Database("topic must not be empty".into()));
        }
        validate_record(&result).map_err(MemeError::Database)?;
        self.entries.entry(topic).or_default().push(result);
        self.save()
    }

    /// Serialise the whole mapping back to disk. No-op for in-memory databases.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| MemeError::Database(format!("failed to serialise overrides: {e}")))?;
        std::fs::write(path, body)?;
        Ok(())
    }

    /// Find curated results for a query.
    ///
    /// A topic matches when it equals the query, contains it, or appears as
    /// a whole phrase inside it (`"nezuko meme"` matches topic `nezuko`).
    /// Records under other topics match when one of their tags contains the
    /// query or equals one of its words.
    pub fn lookup(&self, query: &str) -> Vec<MediaResult> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let padded = format!(" {query} ");
        let words: Vec<&str> = query.split_whitespace().filter(|w| w.len() > 2).collect();

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut results = Vec::new();
        let mut push = |result: &MediaResult, results: &mut Vec<MediaResult>| {
            let key = (result.title.clone(), result.locator.clone());
            if seen.insert(key) {
                results.push(result.clone());
            }
        };

        for (topic, records) in &self.entries {
            let topic_matches = *topic == query
                || topic.contains(&query)
                || padded.contains(&format!(" {topic} "));
            for record in records {
                let tag_matches = record
                    .tags
                    .iter()
                    .any(|tag| tag.contains(&query) || words.contains(&tag.as_str()));
                if topic_matches || tag_matches {
                    push(record, &mut results);
                }
            }
        }
        results
    }

    /// Curated results filed under exactly `topic`.
    pub fn get(&self, topic: &str) -> &[MediaResult] {
        self.entries
            .get(&topic.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All topics, sorted.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Records rejected during the last load.
    pub fn quarantined(&self) -> &[QuarantinedRecord] {
        &self.quarantined
    }

    /// Total number of curated records.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if there are no curated records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn quarantine(&mut self, topic: String, record: serde_json::Value, reason: String) {
        tracing::debug!(%topic, %reason, "rejecting override record");
        self.quarantined.push(QuarantinedRecord {
            topic,
            record,
            reason,
        });
    }
}

fn validate_record(result: &MediaResult) -> std::result::Result<(), String> {
    if result.title.trim().is_empty() {
        return Err("record title is empty".to_owned());
    }
    if result.locator.trim().is_empty() {
        return Err("record url is empty".to_owned());
    }
    if result.is_media()
        && !(result.locator.starts_with("http://") || result.locator.starts_with("https://"))
    {
        return Err(format!(
            "{} record needs an http(s) url, got {:?}",
            result.content_type, result.locator
        ));
    }
    Ok(())
}

/// Merge `rejected` into the sidecar at `sidecar`, keeping every record
/// quarantined by earlier loads. Records already present are not repeated.
fn append_quarantine(sidecar: &Path, rejected: &[QuarantinedRecord]) -> Result<()> {
    let mut kept: Vec<QuarantinedRecord> = Vec::new();
    if sidecar.exists() {
        let content = std::fs::read_to_string(sidecar)?;
        match serde_json::from_str(&content) {
            Ok(existing) => kept = existing,
            Err(e) => {
                let moved = move_aside(sidecar, "corrupt")?;
                tracing::warn!(
                    sidecar = %sidecar.display(),
                    moved_to = %moved.display(),
                    error = %e,
                    "unreadable quarantine sidecar moved aside"
                );
            }
        }
    }

    for record in rejected {
        let known = kept
            .iter()
            .any(|k| k.topic == record.topic && k.record == record.record);
        if !known {
            kept.push(record.clone());
        }
    }

    let body = serde_json::to_string_pretty(&kept)
        .map_err(|e| MemeError::Database(format!("failed to serialise quarantine: {e}")))?;
    std::fs::write(sidecar, body)?;
    Ok(())
}

/// Rename `path` to `<stem>.<suffix>`, or `<stem>.<suffix>.<n>` when earlier
/// copies exist. Returns the new location.
fn move_aside(path: &Path, suffix: &str) -> Result<PathBuf> {
    let mut target = sidecar_path(path, suffix);
    let mut n = 1;
    while target.exists() {
        target = sidecar_path(path, &format!("{suffix}.{n}"));
        n += 1;
    }
    std::fs::rename(path, &target)?;
    Ok(target)
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overrides".to_owned());
    path.with_file_name(format!("{stem}.{suffix}"))
}

/// Built-in starter entries used when seeding a new database.
pub fn default_entries() -> BTreeMap<String, Vec<MediaResult>> {
    const FRANCHISE: &str = "Demon Slayer anime";
    let mut entries = BTreeMap::new();
    entries.insert(
        "tanjiro".to_owned(),
        vec![
            MediaResult::new(
                "Confused Tanjiro",
                FRANCHISE,
                ContentType::Image,
                "https://i.imgur.com/8jcAyUd.jpg",
                ["tanjiro", "confused", "reaction"],
            ),
            MediaResult::new(
                "Kind Tanjiro",
                FRANCHISE,
                ContentType::Text,
                "When Tanjiro says something really wholesome and the villain starts questioning their life choices",
                ["tanjiro", "kindness", "quote"],
            ),
        ],
    );
    entries.insert(
        "nezuko".to_owned(),
        vec![
            MediaResult::new(
                "Nezuko Running",
                FRANCHISE,
                ContentType::Gif,
                "https://c.tenor.com/aNGz6XLt5hEAAAAd/demon-slayer-nezuko.gif",
                ["nezuko", "running", "cute"],
            ),
            MediaResult::new(
                "Smol Nezuko",
                FRANCHISE,
                ContentType::Image,
                "https://i.pinimg.com/originals/6f/da/33/6fda33eccac383df0e9e49bad6a10e6b.jpg",
                ["nezuko", "cute", "small"],
            ),
        ],
    );
    entries.insert(
        "demon slayer".to_owned(),
        vec![
            MediaResult::new(
                "Breathing Techniques",
                FRANCHISE,
                ContentType::Text,
                "Me after learning water breathing techniques watching Demon Slayer: *Drinks water aggressively*",
                ["breathing", "water", "funny"],
            ),
            MediaResult::new(
                "Zenitsu Sleeping vs Awake",
                FRANCHISE,
                ContentType::Image,
                "https://pbs.twimg.com/media/EAA4WfPUcAAeN7r.jpg",
                ["zenitsu", "sleeping", "thunder breathing"],
            ),
        ],
    );
    entries.insert(
        "anime".to_owned(),
        vec![
            MediaResult::new(
                "Anime Logic",
                "Various anime",
                ContentType::Text,
                "Anime logic: The more tragic your backstory, the more powerful you become",
                ["anime", "logic", "backstory"],
            ),
            MediaResult::new(
                "Anime Protagonist Hair",
                "Various anime",
                ContentType::Image,
                "https://i.pinimg.com/originals/b3/b3/0b/b3b30bce0ecd3f3cbfb2ad43a7ecb55f.jpg",
                ["anime", "hair", "protagonist"],
            ),
        ],
    );
    entries
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn seeded() -> OverrideDb {
        OverrideDb {
            entries: default_entries(),
            ..OverrideDb::default()
        }
    }

    #[test]
    fn missing_file_creates_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meme_database.json");
        let db = OverrideDb::load(&path).unwrap();
        assert!(db.is_empty());
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn missing_file_seeded_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let db = OverrideDb::load_with(&path, true).unwrap();
        assert_eq!(db.len(), 8);
        let reloaded = OverrideDb::load(&path).unwrap();
        assert_eq!(reloaded.len(), 8);
    }

    #[test]
    fn add_appends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut db = OverrideDb::load(&path).unwrap();
        db.add(
            "Zenitsu",
            MediaResult::new("Sleepy", "me", ContentType::Image, "https://x/z.png", ["zenitsu"]),
        )
        .unwrap();
        db.add(
            "zenitsu",
            MediaResult::new("Scream", "me", ContentType::Text, "AAAAAA", ["zenitsu"]),
        )
        .unwrap();

        let reloaded = OverrideDb::load(&path).unwrap();
        assert_eq!(reloaded.get("zenitsu").len(), 2);
        assert_eq!(reloaded.get("ZENITSU")[0].title, "Sleepy");
    }

    #[test]
    fn add_rejects_invalid_records() {
        let mut db = OverrideDb::in_memory();
        let no_title = MediaResult::new(" ", "me", ContentType::Text, "x", ["a"]);
        assert!(db.add("topic", no_title).is_err());
        let bad_url = MediaResult::new("t", "me", ContentType::Image, "not-a-url", ["a"]);
        assert!(db.add("topic", bad_url).is_err());
        let ok = MediaResult::new("t", "me", ContentType::Text, "hi", ["a"]);
        assert!(db.add("  ", ok).is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn malformed_records_are_quarantined_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(
            &path,
            r#"{
                "Nezuko": [
                    {"title": "Good", "source": "s", "content_type": "gif", "url": "https://x/a.gif", "tags": ["nezuko"]},
                    {"title": "Bad type", "source": "s", "content_type": "video", "url": "https://x/a.mp4"},
                    {"title": "", "source": "s", "content_type": "text", "url": "words"}
                ],
                "broken": "not a list"
            }"#,
        )
        .unwrap();

        let db = OverrideDb::load(&path).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("nezuko")[0].title, "Good");
        assert_eq!(db.quarantined().len(), 3);
        assert!(dir.path().join("db.quarantine.json").exists());
    }

    #[test]
    fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "[1, 2, 3").unwrap();

        let db = OverrideDb::load(&path).unwrap();
        assert!(db.is_empty());
        assert!(dir.path().join("db.corrupt").exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn quarantine_sidecar_keeps_earlier_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let sidecar = dir.path().join("db.quarantine.json");
        std::fs::write(
            &path,
            r#"{"nezuko": [{"title": "first bad", "source": "s", "content_type": "video", "url": "https://x/1.mp4"}]}"#,
        )
        .unwrap();

        let mut db = OverrideDb::load(&path).unwrap();
        db.add(
            "nezuko",
            MediaResult::new("Good", "s", ContentType::Text, "hmm!", ["nezuko"]),
        )
        .unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("first bad"));

        let mut root: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        root["nezuko"].as_array_mut().unwrap().push(serde_json::json!({
            "title": "second bad", "source": "s", "content_type": "video", "url": "https://x/2.mp4"
        }));
        std::fs::write(&path, root.to_string()).unwrap();

        let db = OverrideDb::load(&path).unwrap();
        assert_eq!(db.len(), 1);
        let side = std::fs::read_to_string(&sidecar).unwrap();
        assert!(side.contains("first bad"), "{side}");
        assert!(side.contains("second bad"), "{side}");

        // Loading the same file again does not repeat records.
        OverrideDb::load(&path).unwrap();
        let stored: Vec<QuarantinedRecord> =
            serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn second_corrupt_file_does_not_replace_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "first garbage").unwrap();
        OverrideDb::load(&path).unwrap();
        std::fs::write(&path, "second garbage").unwrap();
        OverrideDb::load(&path).unwrap();

        let first = std::fs::read_to_string(dir.path().join("db.corrupt")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("db.corrupt.1")).unwrap();
        assert_eq!(first, "first garbage");
        assert_eq!(second, "second garbage");
    }

    #[test]
    fn lookup_direct_and_partial_topic() {
        let db = seeded();
        assert_eq!(db.lookup("nezuko").len(), 2);
        // "slayer" is contained in topic "demon slayer".
        assert!(db.lookup("slayer").iter().any(|r| r.title == "Breathing Techniques"));
    }

    #[test]
    fn lookup_topic_inside_query() {
        let db = seeded();
        let results = db.lookup("nezuko meme");
        assert!(results.iter().any(|r| r.title == "Nezuko Running"));
    }

    #[test]
    fn lookup_by_tag() {
        let db = seeded();
        let results = db.lookup("zenitsu");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Zenitsu Sleeping vs Awake");
    }

    #[test]
    fn lookup_has_no_duplicates() {
        let db = seeded();
        let results = db.lookup("anime");
        let mut ids: Vec<_> = results.iter().map(|r| r.identity()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn lookup_empty_query_returns_nothing() {
        assert!(seeded().lookup("   ").is_empty());
    }

    #[test]
    fn in_memory_save_is_noop() {
        assert!(OverrideDb::in_memory().save().is_ok());
    }
}
