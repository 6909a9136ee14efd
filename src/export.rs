//! Writing import documents to disk.
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::disqus::ExportDocument;
use crate::util::{require_non_blank, ArgumentError};

/// `<folder>/<file_name>.xml`
pub fn format_output_file_path(folder: &str, file_name: &str) -> Result<PathBuf, ArgumentError> {
    let folder = require_non_blank("folderPath", folder)?;
    let file_name = require_non_blank("fileName", file_name)?;
    Ok(Path::new(folder).join(format!("{file_name}.xml")))
}

/// Serializes `document` and writes it to `path` atomically, replacing any
/// previous export.
///
/// `path` is never left holding a partial document: the XML is staged next
/// to it, synced, then renamed into place.
pub fn save_as_xml(document: &ExportDocument, path: &Path) -> Result<()> {
    let content = document.to_xml()?;
    StagedFile::create(path)?.commit(content.as_bytes())?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "Saved export document");
    Ok(())
}

/// Hidden sibling of the target that is removed again unless committed.
struct StagedFile<'a> {
    target: &'a Path,
    staging_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl<'a> StagedFile<'a> {
    fn create(target: &'a Path) -> Result<Self> {
        let staging_path = staging_path_for(target);
        // create_new: never write through a file that is already there
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging_path)
            .with_context(|| format!("Failed to stage export at '{}'", staging_path.display()))?;

        Ok(Self {
            target,
            staging_path,
            file: Some(file),
            committed: false,
        })
    }

    fn commit(mut self, bytes: &[u8]) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.write_all(bytes)
                .with_context(|| format!("Failed to write '{}'", self.staging_path.display()))?;
            file.sync_all()
                .with_context(|| format!("Failed to sync '{}'", self.staging_path.display()))?;
        }

        // Windows refuses to rename over an existing file
        #[cfg(windows)]
        if self.target.exists() {
            std::fs::remove_file(self.target).with_context(|| {
                format!("Failed to replace existing '{}'", self.target.display())
            })?;
        }

        std::fs::rename(&self.staging_path, self.target).with_context(|| {
            format!(
                "Failed to move '{}' into place at '{}'",
                self.staging_path.display(),
                self.target.display()
            )
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}

/// `<dir>/.<file name>.<pid>-<nanos>.partial`
fn staging_path_for(target: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}-{nanos:09}.partial", std::process::id()))
}
