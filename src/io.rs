//! Load/save entry points and atomic file output.
//!
//! Loads check their cancellation token twice: after the file read and
//! again after the in-memory parse. Cancellation is a distinct outcome
//! from failure and discards partial state. Saves go through a temp file
//! with rename-on-commit, so a target is never partially overwritten;
//! cancellation during a save is not supported.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::codec::{Decoder, Encoder};
use crate::emit::EmitOptions;
use crate::model::Song;

/// Cooperative cancellation flag, cheaply clonable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Result of a load. A failed load carries no song.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Song),
    Failed,
    Cancelled,
}

impl LoadOutcome {
    /// The song, when one was loaded.
    #[must_use]
    pub fn song(self) -> Option<Song> {
        match self {
            Self::Loaded(song) => Some(song),
            Self::Failed | Self::Cancelled => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Read and decode a song file.
pub fn load_song<D: Decoder>(path: impl AsRef<Path>, token: &CancellationToken) -> LoadOutcome {
    let path = path.as_ref();
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Failed to read {}: {}", path.display(), error);
            return LoadOutcome::Failed;
        }
    };
    if token.is_cancelled() {
        return LoadOutcome::Cancelled;
    }
    let song = match D::decode(&data) {
        Ok(song) => song,
        Err(error) => {
            tracing::error!("Failed to parse {}: {}", path.display(), error);
            return LoadOutcome::Failed;
        }
    };
    if token.is_cancelled() {
        return LoadOutcome::Cancelled;
    }
    LoadOutcome::Loaded(song)
}

/// Encode and write a song file. Returns false on failure without
/// touching the target.
pub fn save_song<E: Encoder>(song: &Song, path: impl AsRef<Path>, options: &EmitOptions) -> bool {
    let path = path.as_ref();
    let data = match E::encode_with(song, options) {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Failed to encode {}: {}", path.display(), error);
            return false;
        }
    };
    match write_atomic(path, &data) {
        Ok(()) => true,
        Err(error) => {
            tracing::error!("Failed to write {}: {}", path.display(), error);
            false
        }
    }
}

/// Scoped acquisition of `<target>.tmp` with atomic rename on commit.
///
/// Dropping the writer without committing abandons the temp file; the
/// temp file may remain but the target is never partially overwritten.
#[derive(Debug)]
pub struct AtomicFile {
    file: fs::File,
    temp: PathBuf,
    target: PathBuf,
}

impl AtomicFile {
    /// Open the temp file next to the target.
    ///
    /// # Errors
    ///
    /// Returns an error when the temp file cannot be created.
    pub fn create(target: impl AsRef<Path>) -> std::io::Result<Self> {
        let target = target.as_ref().to_path_buf();
        let temp = temp_path(&target);
        let file = fs::File::create(&temp)?;
        Ok(Self { file, temp, target })
    }

    /// Append content to the temp file.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.file.write_all(data)
    }

    /// Flush and move the temp file over the target.
    ///
    /// # Errors
    ///
    /// Returns an error when the flush or rename fails; the target is
    /// untouched in that case.
    pub fn commit(mut self) -> std::io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        fs::rename(&self.temp, &self.target)
    }
}

/// Write `data` to `path` through a temp file with atomic rename.
///
/// # Errors
///
/// Returns an error when the temp file cannot be written or renamed.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = AtomicFile::create(path)?;
    file.write_all(data)?;
    file.commit()
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
