// Turning files and upload parts into `ImageSource`s. Every requested input
// becomes exactly one source, in request order; inputs that cannot be read or
// carry an extension no enabled decoder handles become already-failed sources
// so they still show up in the batch.

use crate::error::SieveError;
use crate::pipeline::ImageSource;
use futures::future::join_all;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// Checks that `name` carries an extension one of the enabled decoders reads.
pub fn supported_format(name: &str) -> Result<ImageFormat, SieveError> {
    let unsupported = |detail: String| SieveError::UnsupportedFormat {
        name: name.to_string(),
        detail,
    };

    let extension = Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .ok_or_else(|| unsupported("no file extension".to_string()))?;

    match ImageFormat::from_extension(extension) {
        Some(format) if format.reading_enabled() => Ok(format),
        Some(format) => Err(unsupported(format!("{format:?} decoding is not enabled"))),
        None => Err(unsupported(format!("unknown extension .{extension}"))),
    }
}

/// Reads one file of the gallery. The extension is checked before any byte is read.
pub async fn read_source(gallery: &Path, name: &str) -> ImageSource {
    if let Err(error) = supported_format(name) {
        return ImageSource::failed(error);
    }

    let path = gallery.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!(name, path = %path.display(), bytes = bytes.len(), "source read");
            ImageSource::from_bytes(name, bytes)
        }
        Err(source) => ImageSource::failed(SieveError::SourceUnavailable {
            name: name.to_string(),
            source,
        }),
    }
}

/// Reads the named files of `gallery`, concurrently, keeping the request order.
pub async fn sources_from_gallery<S: AsRef<str>>(gallery: &Path, names: &[S]) -> Vec<ImageSource> {
    join_all(names.iter().map(|name| read_source(gallery, name.as_ref()))).await
}

/// Lists the files of `gallery` whose extension an enabled decoder reads, sorted by name.
pub async fn list_gallery(gallery: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(gallery).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if supported_format(name).is_ok() {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// One part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub file_name: Option<String>,
    pub field_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadPart {
    /// The file name, else the field name, else a positional placeholder.
    pub fn display_name(&self, index: usize) -> String {
        [&self.file_name, &self.field_name]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("part-{index}"))
    }
}

/// Uploaded parts are decoded by content; their names are labels only.
pub fn sources_from_parts(parts: Vec<UploadPart>) -> Vec<ImageSource> {
    parts
        .into_iter()
        .enumerate()
        .map(|(index, part)| {
            let name = part.display_name(index);
            ImageSource::from_bytes(name, part.bytes)
        })
        .collect()
}
