//! The editor boundary: primitives the extraction pipeline calls but never implements.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

/// User facing message emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Info(message)
            | Notification::Warning(message)
            | Notification::Error(message) => message,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Info(message) => write!(f, "{message}"),
            Notification::Warning(message) => write!(f, "warning: {message}"),
            Notification::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Side effects supplied by the environment hosting an extraction.
pub trait Host {
    /// Create a new file. Must fail rather than overwrite an existing one.
    fn write_file(&mut self, path: &Path, content: &str) -> io::Result<()>;

    /// Replace `range` (byte offsets) of the active buffer with `text`.
    fn replace_range(&mut self, range: (usize, usize), text: &str) -> Result<()>;

    /// Replace the whole active buffer with `text`.
    fn replace_all(&mut self, text: &str) -> Result<()>;

    fn notify(&mut self, notification: Notification);

    /// Show a freshly created file to the user.
    fn open_document(&mut self, _path: &Path) {}
}

fn splice(buffer: &mut String, range: (usize, usize), text: &str) -> Result<()> {
    let (start, end) = range;
    if start > end || buffer.get(start..end).is_none() {
        return Err(anyhow!(
            "range {start}..{end} is not valid for a buffer of {} bytes",
            buffer.len()
        ));
    }
    buffer.replace_range(start..end, text);
    Ok(())
}

/// Create `path`, which must not exist yet, and fill it. A file left half written by a failed
/// `fill` is removed again.
fn create_exclusive(
    path: &Path,
    fill: impl FnOnce(&mut File) -> io::Result<()>,
) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(err) = fill(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), %cleanup, "failed to remove partial file");
        }
        return Err(err);
    }
    Ok(())
}

/// Host backed by the filesystem. The active buffer is the contents of one file, edited in
/// memory and written back by [`FsHost::finish`].
#[derive(Debug)]
pub struct FsHost {
    path: PathBuf,
    buffer: String,
    dirty: bool,
}

impl FsHost {
    /// Load `path` as the active buffer.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let buffer = fs::read_to_string(&path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        Ok(Self {
            path,
            buffer,
            dirty: false,
        })
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Persist buffer edits, if any.
    pub fn finish(self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        fs::write(&self.path, &self.buffer)
            .with_context(|| format!("failed to write source file {}", self.path.display()))
    }
}

impl Host for FsHost {
    fn write_file(&mut self, path: &Path, content: &str) -> io::Result<()> {
        create_exclusive(path, |file| file.write_all(content.as_bytes()))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "created file");
        Ok(())
    }

    fn replace_range(&mut self, range: (usize, usize), text: &str) -> Result<()> {
        splice(&mut self.buffer, range, text)?;
        self.dirty = true;
        Ok(())
    }

    fn replace_all(&mut self, text: &str) -> Result<()> {
        self.buffer = text.to_owned();
        self.dirty = true;
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        tracing::debug!(%notification, "notify");
        match notification {
            Notification::Info(_) => println!("{notification}"),
            Notification::Warning(_) | Notification::Error(_) => eprintln!("{notification}"),
        }
    }

    fn open_document(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "component ready");
    }
}

/// Host that keeps everything in memory, for editors that own their buffers and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    pub buffer: String,
    pub files: BTreeMap<PathBuf, String>,
    pub notifications: Vec<Notification>,
    pub opened: Vec<PathBuf>,
    /// When set, every `write_file` call fails with this error kind.
    pub fail_writes: Option<io::ErrorKind>,
}

impl MemoryHost {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            buffer: buffer.into(),
            ..Self::default()
        }
    }
}

impl Host for MemoryHost {
    fn write_file(&mut self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(kind) = self.fail_writes {
            return Err(io::Error::new(kind, "write rejected"));
        }
        if self.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        self.files.insert(path.to_path_buf(), content.to_owned());
        Ok(())
    }

    fn replace_range(&mut self, range: (usize, usize), text: &str) -> Result<()> {
        splice(&mut self.buffer, range, text)
    }

    fn replace_all(&mut self, text: &str) -> Result<()> {
        self.buffer = text.to_owned();
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn open_document(&mut self, path: &Path) {
        self.opened.push(path.to_path_buf());
    }
}
