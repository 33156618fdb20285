use crate::errors::{DescriptorError, Result};
use crate::resolve::{ClassSource, Resolution};
use crate::scanner::ScanResult;
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version of the manifest format
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Metadata for the generated manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Version of the manifest format
    pub version: String,

    /// Timestamp when the manifest was generated
    pub generated_at: DateTime<Utc>,

    /// Descriptor the manifest was resolved from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<PathBuf>,

    /// Number of files scanned
    pub files_scanned: usize,

    /// Number of classes the build will emit
    pub classes_retained: usize,

    /// Whether a safelist pattern disables scan-based elimination
    pub safelist_matches_everything: bool,

    /// Tool version
    pub tool_version: String,
}

/// Per-class entry in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestClassInfo {
    pub source: ClassSource,

    /// `file:line` locations where scanning found the class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// Complete manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub metadata: ManifestMetadata,

    /// Retained classes, sorted
    pub classes: IndexMap<String, ManifestClassInfo>,

    /// Theme after `theme.extend` was merged
    pub theme: Theme,
}

impl Manifest {
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest atomically, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = self.to_pretty_json()?;
        write_atomic(path, &content).map_err(|e| DescriptorError::OutputError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::info!(path = %path.display(), classes = self.classes.len(), "wrote manifest");
        Ok(())
    }
}

/// Builder pattern for creating manifests
pub struct ManifestBuilder<'a> {
    resolution: &'a Resolution,
    scan: Option<&'a ScanResult>,
    descriptor: Option<PathBuf>,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(resolution: &'a Resolution) -> Self {
        Self {
            resolution,
            scan: None,
            descriptor: None,
        }
    }

    /// Attach scan locations to classes found by scanning
    pub fn with_scan(mut self, scan: &'a ScanResult) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn with_descriptor(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor = Some(path.into());
        self
    }

    pub fn build(self) -> Manifest {
        let mut classes = IndexMap::new();

        for class in &self.resolution.retained {
            let Some(source) = self.resolution.source_of(class) else {
                continue;
            };
            let files = self
                .scan
                .and_then(|scan| scan.candidates.get(class))
                .cloned()
                .unwrap_or_default();
            classes.insert(class.clone(), ManifestClassInfo { source, files });
        }

        Manifest {
            metadata: ManifestMetadata {
                version: MANIFEST_VERSION.to_string(),
                generated_at: Utc::now(),
                descriptor: self.descriptor,
                files_scanned: self.scan.map(|s| s.files.len()).unwrap_or(0),
                classes_retained: classes.len(),
                safelist_matches_everything: self.resolution.matches_everything,
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            classes,
            theme: self.resolution.theme.clone(),
        }
    }
}

/// Write file atomically by writing to temp file then renaming
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let temp_path = path.with_extension("tmp");

    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    std::fs::rename(&temp_path, path)?;

    Ok(())
}
