//! Annotation document JSON serializer.

use crate::error::{Error, Result};
use crate::output::AnnotationDocument;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write the finished document to `path` in one atomic step.
///
/// The JSON is written to a temporary file next to `path` and renamed into
/// place, so `path` either does not exist or holds a complete document.
pub fn write_document(document: &AnnotationDocument, path: &Path, pretty: bool) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoded = if pretty {
            serde_json::to_writer_pretty(&mut writer, document)
        } else {
            serde_json::to_writer(&mut writer, document)
        };
        encoded.map_err(|e| Error::JsonWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| Error::JsonPersist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!(
        "Wrote {} frame records to {}",
        document.frames.len(),
        path.display()
    );
    Ok(())
}

/// Read an annotation document back from disk.
pub fn read_document(path: &Path) -> Result<AnnotationDocument> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::JsonRead {
        path: path.to_path_buf(),
        source: e,
    })
}
