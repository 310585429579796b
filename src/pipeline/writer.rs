//! XMLTV rendering and crash-safe persistence

use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::PersistError;
use crate::models::EpgDocument;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Render the document as XMLTV in insertion order.
///
/// Every `start`/`stop` attribute uses `time_format`.
pub fn render_xmltv(document: &EpgDocument, time_format: &str) -> Result<String, PersistError> {
    let mut out = String::with_capacity(256 + document.programmes.len() * 256);
    render_into(&mut out, document, time_format).map_err(|_| PersistError::Serialize {
        message: format!("could not format timestamps with '{time_format}'"),
    })?;
    Ok(out)
}

fn render_into(out: &mut String, document: &EpgDocument, time_format: &str) -> std::fmt::Result {
    use quick_xml::escape::escape;

    writeln!(out, "{XML_DECLARATION}")?;
    writeln!(out, "<tv>")?;

    for channel in &document.channels {
        writeln!(out, "  <channel id=\"{}\">", escape(channel.id.as_str()))?;
        writeln!(
            out,
            "    <display-name>{}</display-name>",
            escape(channel.display_name.as_str())
        )?;
        writeln!(out, "  </channel>")?;
    }

    for programme in &document.programmes {
        writeln!(
            out,
            "  <programme channel=\"{}\" start=\"{}\" stop=\"{}\">",
            escape(programme.channel_id.as_str()),
            programme.start.format(time_format),
            programme.end.format(time_format)
        )?;
        writeln!(out, "    <title>{}</title>", escape(programme.title.as_str()))?;
        writeln!(out, "    <desc>{}</desc>", escape(programme.description.as_str()))?;
        writeln!(out, "  </programme>")?;
    }

    writeln!(out, "</tv>")
}

/// Sibling temp path: `guide.xml` -> `guide.xml.tmp`
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    destination.with_file_name(name)
}

/// Write `contents` next to `destination`, fsync, then rename over it.
///
/// On any failure the destination keeps its previous content and the temp
/// file is removed.
pub async fn atomic_write(destination: &Path, contents: &[u8]) -> Result<(), PersistError> {
    let temp_path = temp_path_for(destination);

    if let Err(e) = write_synced(&temp_path, contents).await {
        remove_temp(&temp_path).await;
        return Err(PersistError::Write {
            path: temp_path,
            source: e,
        });
    }

    if let Err(e) = tokio::fs::rename(&temp_path, destination).await {
        remove_temp(&temp_path).await;
        return Err(PersistError::Rename {
            from: temp_path,
            to: destination.to_path_buf(),
            source: e,
        });
    }

    debug!("Replaced {:?} via {:?}", destination, temp_path);
    Ok(())
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await
}

async fn remove_temp(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed leftover temp file {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp file {:?}: {}", path, e),
    }
}

/// Persists finished guides to a fixed destination
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    destination: PathBuf,
    time_format: String,
}

impl DocumentWriter {
    pub fn new(destination: impl Into<PathBuf>, time_format: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            time_format: time_format.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Render and atomically replace the destination; returns bytes written
    pub async fn write(&self, document: &EpgDocument) -> Result<u64, PersistError> {
        let xml = render_xmltv(document, &self.time_format)?;
        atomic_write(&self.destination, xml.as_bytes()).await?;

        info!(
            "Wrote EPG to {:?}: channels={} programmes={} bytes={}",
            self.destination,
            document.channels.len(),
            document.programmes.len(),
            xml.len()
        );
        Ok(xml.len() as u64)
    }
}
