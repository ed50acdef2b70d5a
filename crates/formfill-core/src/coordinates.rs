//! Label → normalized coordinate map
//!
//! A [`CoordinateMap`] is built once per form analysis (or loaded from a
//! previous session) and only ever holds page-fraction coordinates.
//! Iteration is sorted by label so matching is deterministic across runs.

use crate::error::{FormFillError, Result};
use crate::geometry::NormalizedPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Mapping from field label to a normalized page position.
///
/// Persisted as a JSON object of `label → [x, y]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateMap {
    entries: BTreeMap<String, NormalizedPoint>,
}

impl CoordinateMap {
    /// Create an empty map
    #[inline]
    #[must_use = "coordinate map is created but not used"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the coordinate for a label
    #[inline]
    pub fn insert(&mut self, label: impl Into<String>, point: NormalizedPoint) {
        self.entries.insert(label.into(), point);
    }

    /// Exact-key lookup
    #[inline]
    #[must_use = "looked up coordinate is returned but not used"]
    pub fn get(&self, label: &str) -> Option<NormalizedPoint> {
        self.entries.get(label).copied()
    }

    /// Case-insensitive lookup; the first label in sorted order wins
    #[must_use = "looked up coordinate is returned but not used"]
    pub fn get_ignore_case(&self, label: &str) -> Option<NormalizedPoint> {
        let wanted = label.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == wanted)
            .map(|(_, v)| *v)
    }

    /// Number of labels
    #[inline]
    #[must_use = "entry count is returned but not used"]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no labels
    #[inline]
    #[must_use = "emptiness check is returned but not used"]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(label, point)` pairs in label order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, NormalizedPoint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Load a persisted map.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened, a JSON error if it is
    /// not a `label → [x, y]` object, and
    /// [`FormFillError::InvalidCoordinateMap`] if it holds no labels.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let map: Self = serde_json::from_reader(BufReader::new(file))?;

        if map.is_empty() {
            return Err(FormFillError::InvalidCoordinateMap {
                path: path.to_path_buf(),
                reason: "no field coordinates".to_string(),
            });
        }

        // Hand-edited maps sometimes push a label slightly off the page;
        // keep them, the renderer clamps at draw time.
        for (label, point) in map.iter().filter(|(_, p)| !p.is_on_page()) {
            log::warn!(
                "Coordinate for '{label}' is outside the page: {point} ({})",
                path.display()
            );
        }

        log::info!("Loaded {} field coordinates from {}", map.len(), path.display());
        Ok(map)
    }

    /// Write the map as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        log::info!("Saved {} field coordinates to {}", self.len(), path.display());
        Ok(())
    }
}

impl FromIterator<(String, NormalizedPoint)> for CoordinateMap {
    fn from_iter<I: IntoIterator<Item = (String, NormalizedPoint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CoordinateMap {
    type Item = (&'a String, &'a NormalizedPoint);
    type IntoIter = std::collections::btree_map::Iter<'a, String, NormalizedPoint>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
