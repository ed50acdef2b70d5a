//! Per-form override data (hand-curated coordinates and schema)
//!
//! An [`OverrideStore`] is loaded once by the caller from a directory of JSON
//! entries and passed by reference to whoever needs it. Entries are indexed by
//! the MD5 of the source image, by the image file name, and by the entry's
//! own file stem, so a form can be recognized even after it was renamed.

use crate::coordinates::CoordinateMap;
use crate::error::Result;
use crate::schema::Field;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Identification of the form an entry belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideMetadata {
    /// Source image file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Hex MD5 of the source image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    /// Form title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
    /// Creation timestamp (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One override file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Which form this entry is for
    #[serde(default)]
    pub metadata: OverrideMetadata,
    /// Replacement schema, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
    /// Hand-tuned field coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinateMap>,
    /// Default answers keyed by field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hardcoded_values: BTreeMap<String, String>,
}

impl OverrideEntry {
    /// The entry's coordinate map, if it has a non-empty one
    #[inline]
    #[must_use = "coordinates are returned but not used"]
    pub fn usable_coordinates(&self) -> Option<&CoordinateMap> {
        self.coordinates.as_ref().filter(|c| !c.is_empty())
    }

    /// Preset answer for a field, looked up by machine name then label
    #[must_use = "preset value is returned but not used"]
    pub fn hardcoded_value(&self, field: &Field) -> Option<&str> {
        field
            .name
            .as_deref()
            .and_then(|n| self.hardcoded_values.get(n))
            .or_else(|| self.hardcoded_values.get(&field.label))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// How an entry was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// By MD5 of the image contents
    ContentHash,
    /// By image file name
    FileName,
    /// By image file name without extension
    FileStem,
}

impl std::fmt::Display for LookupKey {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ContentHash => "content hash",
            Self::FileName => "file name",
            Self::FileStem => "file stem",
        };
        write!(f, "{s}")
    }
}

/// Hex MD5 of a file's contents.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Replace everything but ASCII alphanumerics, `_` and `-` with `_`
fn safe_file_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory-backed cache of override entries
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    dir: PathBuf,
    entries: Vec<OverrideEntry>,
    index: HashMap<String, usize>,
}

impl OverrideStore {
    /// Store with no entries, writing new ones to `dir`
    #[inline]
    #[must_use = "override store is created but not used"]
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load every `*.json` entry in `dir`.
    ///
    /// A missing directory yields an empty store. Entries that cannot be read
    /// or parsed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if `dir` exists but cannot be listed.
    pub fn load_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::empty(dir);
        if !store.dir.is_dir() {
            log::debug!("Override directory {} not found", store.dir.display());
            return Ok(store);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&store.dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match read_entry(&path) {
                Ok(entry) => {
                    log::info!("Loaded override data: {}", path.display());
                    store.insert(&path, entry);
                }
                Err(e) => log::warn!("Skipping override file {}: {e}", path.display()),
            }
        }
        Ok(store)
    }

    fn insert(&mut self, path: &Path, entry: OverrideEntry) {
        let idx = self.entries.len();
        let mut keys: Vec<String> = Vec::with_capacity(3);
        keys.extend(entry.metadata.file_hash.clone());
        keys.extend(entry.metadata.filename.clone());
        keys.extend(path.file_stem().map(|s| s.to_string_lossy().into_owned()));
        for key in keys {
            self.index.insert(key, idx);
        }
        self.entries.push(entry);
    }

    /// Directory new entries are written to
    #[inline]
    #[must_use = "directory is returned but not used"]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of loaded entries
    #[inline]
    #[must_use = "entry count is returned but not used"]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are loaded
    #[inline]
    #[must_use = "emptiness check is returned but not used"]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All loaded entries
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.entries.iter()
    }

    /// Find the entry for an image: by content hash, then file name, then
    /// file stem.
    #[must_use = "lookup result is returned but not used"]
    pub fn find(&self, image_path: &Path) -> Option<(&OverrideEntry, LookupKey)> {
        if self.index.is_empty() {
            return None;
        }

        let by_hash = match file_hash(image_path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("Cannot hash {}: {e}", image_path.display());
                None
            }
        };
        let file_name = image_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned());
        let file_stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());

        [
            (by_hash, LookupKey::ContentHash),
            (file_name, LookupKey::FileName),
            (file_stem, LookupKey::FileStem),
        ]
        .into_iter()
        .find_map(|(key, how)| {
            let idx = *self.index.get(key.as_deref()?)?;
            log::info!("Found override data by {how} for {}", image_path.display());
            Some((&self.entries[idx], how))
        })
    }

    /// Persist a coordinate map for an image as a new entry and index it.
    ///
    /// The entry is written to `<title>_<hash8>.json` in the store directory,
    /// which is created if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be hashed or the entry cannot be
    /// written.
    pub fn create_entry(
        &mut self,
        image_path: &Path,
        coordinates: CoordinateMap,
        form_title: Option<&str>,
    ) -> Result<PathBuf> {
        let hash = file_hash(image_path)?;
        let title = form_title.unwrap_or("custom");
        let entry = OverrideEntry {
            metadata: OverrideMetadata {
                filename: image_path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned()),
                file_hash: Some(hash.clone()),
                form_title: Some(form_title.unwrap_or("Custom Form").to_string()),
                created_at: Some(chrono::Utc::now().to_rfc3339()),
            },
            coordinates: Some(coordinates),
            ..OverrideEntry::default()
        };

        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{}_{}.json", safe_file_title(title), &hash[..8]));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        log::info!("Created override entry {}", path.display());
        self.insert(&path, entry);
        Ok(path)
    }
}

fn read_entry(path: &Path) -> Result<OverrideEntry> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
