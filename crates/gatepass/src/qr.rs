//! QR artifact generation.
//!
//! [`generate`] is a pure encoding of a URL into PNG bytes. [`QrStore`] owns
//! the directory the artifacts live in and the `person_<id>.png` naming.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::person::qr_filename;

/// Default size in pixels of one QR module.
pub const DEFAULT_MODULE_SIZE: u32 = 10;

/// Encode `url` as a QR symbol and render it to PNG bytes.
///
/// # Errors
///
/// Returns an error if the data does not fit in a QR symbol or PNG encoding fails.
pub fn generate(url: &str) -> Result<Vec<u8>> {
    generate_with_module_size(url, DEFAULT_MODULE_SIZE)
}

/// Like [`generate`] with an explicit module size in pixels.
///
/// # Errors
///
/// Returns an error if the data does not fit in a QR symbol or PNG encoding fails.
pub fn generate_with_module_size(url: &str, module_size: u32) -> Result<Vec<u8>> {
    let code = QrCode::new(url.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(module_size, module_size)
        .build();

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Directory of persisted QR artifacts.
#[derive(Debug, Clone)]
pub struct QrStore {
    dir: PathBuf,
    module_size: u32,
}

impl QrStore {
    /// Create a store rooted at `dir`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            module_size: DEFAULT_MODULE_SIZE,
        }
    }

    /// Set the rendered size of one QR module in pixels.
    #[must_use]
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size;
        self
    }

    /// The directory artifacts are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for the given identifier.
    #[must_use]
    pub fn path_for(&self, id: i64) -> PathBuf {
        self.dir.join(qr_filename(id))
    }

    /// Whether an artifact exists for the given identifier.
    #[must_use]
    pub fn exists(&self, id: i64) -> bool {
        self.path_for(id).is_file()
    }

    /// Create the artifact directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            std::fs::create_dir_all(&self.dir).map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })?;
            debug!("Created QR directory {}", self.dir.display());
        }
        Ok(())
    }

    /// Write `image` as the artifact for `id`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn persist(&self, image: &[u8], id: i64) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_for(id);
        std::fs::write(&path, image).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;
        info!("Wrote QR artifact {}", path.display());
        Ok(path)
    }

    /// Encode `url` and persist it as the artifact for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn generate_and_persist(&self, url: &str, id: i64) -> Result<PathBuf> {
        let image = generate_with_module_size(url, self.module_size)?;
        self.persist(&image, id)
    }
}
