// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted per-document flattening configuration.
//
// Document-level flattening (flatten_document_to_layer and the AI/EPS save
// variants) does not take a caller-supplied options value; it reads one of
// the presets stored here.  The general preset corresponds to the document
// setup settings, the save presets to the format-specific save options.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::options::FlatteningOptions;

/// Persisted flattening presets for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFlattenSettings {
    /// Preset used by document-level flattening.
    pub general: FlatteningOptions,
    /// Preset used when saving to native format.
    pub ai_save: FlatteningOptions,
    /// Preset used when saving to EPS.
    pub eps_save: FlatteningOptions,
}

impl DocumentFlattenSettings {
    /// Preset for a format-aware save, chosen by `is_eps`.
    pub fn save_preset(&self, is_eps: bool) -> &FlatteningOptions {
        if is_eps { &self.eps_save } else { &self.ai_save }
    }
}

/// JSON-backed store for document flattening settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load settings from disk.  A missing file yields the defaults.
    pub fn load(&self) -> Result<DocumentFlattenSettings> {
        if !self.path.exists() {
            return Ok(DocumentFlattenSettings::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write settings to disk as pretty-printed JSON.
    pub fn store(&self, settings: &DocumentFlattenSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("flatten.json"));
        let settings = store.load().expect("load");
        assert_eq!(settings, DocumentFlattenSettings::default());
    }

    #[test]
    fn round_trip_preserves_presets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("flatten.json"));

        let mut settings = DocumentFlattenSettings::default();
        settings.general.balance = 100;
        settings.eps_save.flags.outline_text = true;
        settings.eps_save.raster_resolution = 1200.0;
        store.store(&settings).expect("store");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, settings);
        assert_eq!(loaded.save_preset(true).raster_resolution, 1200.0);
        assert!(!loaded.save_preset(false).flags.outline_text);
    }

    #[test]
    fn save_preset_selects_by_format() {
        let mut settings = DocumentFlattenSettings::default();
        settings.ai_save.balance = 50;
        settings.eps_save.balance = 0;
        assert_eq!(settings.save_preset(false).balance, 50);
        assert_eq!(settings.save_preset(true).balance, 0);
    }
}
