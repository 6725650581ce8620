//! File-backed stand-in for the controller's EEPROM.
//!
//! The whole 256-byte image is held in memory; `flush` replaces the file
//! atomically (write to `*.new`, fsync, rename) so readers never see a
//! half-written image.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use blastgate_traits::{BYTE_STORE_LEN, ByteStore};
use tracing::{debug, warn};

use crate::error::{HwError, Result};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    image: [u8; BYTE_STORE_LEN],
    dirty: bool,
}

impl FileStore {
    /// Open an existing image, or start from blank (0xFF) memory when the
    /// file does not exist yet. Nothing is written until `flush`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let image = match fs::read(&path) {
            Ok(bytes) => {
                let found = bytes.len();
                <[u8; BYTE_STORE_LEN]>::try_from(bytes).map_err(|_| HwError::Image {
                    path: path.display().to_string(),
                    expected: BYTE_STORE_LEN,
                    found,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store image yet; starting blank");
                [0xFF; BYTE_STORE_LEN]
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            image,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        write_atomic(&self.path, &self.image)?;
        self.dirty = false;
        debug!(path = %self.path.display(), "store image flushed");
        Ok(())
    }
}

impl ByteStore for FileStore {
    fn read_byte(
        &mut self,
        addr: u8,
    ) -> std::result::Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.image[usize::from(addr)])
    }

    fn write_byte(
        &mut self,
        addr: u8,
        value: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let slot = &mut self.image[usize::from(addr)];
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.persist()?;
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if self.dirty
            && let Err(e) = self.persist()
        {
            warn!(error = %e, path = %self.path.display(), "dropping unflushed store image");
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
