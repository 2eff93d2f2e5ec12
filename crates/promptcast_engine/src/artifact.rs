use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::engine_debug;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use promptcast_core::{Disambiguator, ImageHandle};

use crate::filename::{artifact_filename, DEFAULT_PREFIX_LEN};
use crate::persist::{AtomicFileWriter, PersistError};

pub trait ArtifactStore: Send + Sync {
    /// Writes exactly one normalized image file and returns its path.
    fn persist(
        &self,
        handle: &ImageHandle,
        prompt: &str,
        disambiguator: Disambiguator,
    ) -> Result<PathBuf, PersistError>;
}

/// Local timestamp used for single-job filenames, e.g. `20250101_190000`.
pub type TimestampFn = Arc<dyn Fn() -> String + Send + Sync>;

pub fn local_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Decodes whatever the backend produced and stores it as PNG.
#[derive(Clone)]
pub struct PngArtifactStore {
    writer: AtomicFileWriter,
    prefix_len: usize,
    timestamp: TimestampFn,
}

impl PngArtifactStore {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(output_dir),
            prefix_len: DEFAULT_PREFIX_LEN,
            timestamp: Arc::new(local_timestamp),
        }
    }

    pub fn with_prefix_len(mut self, prefix_len: usize) -> Self {
        self.prefix_len = prefix_len;
        self
    }

    pub fn with_timestamp(mut self, timestamp: TimestampFn) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn disambiguator_label(&self, disambiguator: Disambiguator) -> String {
        match disambiguator {
            Disambiguator::Timestamp => (self.timestamp)(),
            Disambiguator::Ordinal(ordinal) => ordinal.to_string(),
        }
    }
}

impl std::fmt::Debug for PngArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PngArtifactStore")
            .field("output_dir", &self.writer.dir())
            .field("prefix_len", &self.prefix_len)
            .finish()
    }
}

impl ArtifactStore for PngArtifactStore {
    fn persist(
        &self,
        handle: &ImageHandle,
        prompt: &str,
        disambiguator: Disambiguator,
    ) -> Result<PathBuf, PersistError> {
        let png = normalize_to_png(handle)?;
        let filename = artifact_filename(
            &self.disambiguator_label(disambiguator),
            prompt,
            self.prefix_len,
        );
        let path = self.writer.write(&filename, &png)?;
        engine_debug!("Wrote {} bytes to {:?}", png.len(), path);
        Ok(path)
    }
}

/// Decodes any supported raster format and re-encodes it as PNG with best
/// compression. Same input bytes always produce the same output bytes.
pub fn normalize_to_png(handle: &ImageHandle) -> Result<Vec<u8>, PersistError> {
    let raw: Cow<'_, [u8]> = match handle {
        ImageHandle::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
        ImageHandle::File(path) => Cow::Owned(fs::read(path)?),
    };
    let decoded = image::load_from_memory(&raw).map_err(PersistError::Decode)?;

    let mut png = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut png, CompressionType::Best, FilterType::Adaptive);
    decoded
        .write_with_encoder(encoder)
        .map_err(PersistError::Encode)?;
    Ok(png)
}
