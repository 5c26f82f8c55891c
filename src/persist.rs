//! Writing envelopes to their output artifacts.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CsrKitError, Result};

/// The two artifacts a generation run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    Request,
    PrivateKey,
}

/// Destination for generated artifacts.
pub trait ArtifactSink {
    /// Stores `envelope` as the artifact of the given kind.
    fn write_artifact(&mut self, kind: ArtifactKind, envelope: &str) -> Result<()>;

    /// Where the artifact ends up, for log and console messages.
    fn describe(&self, kind: ArtifactKind) -> String;
}

/// Writes `envelope` to `destination`, creating or truncating it.
///
/// The file is closed on every exit path. A destination that cannot be
/// created leaves nothing behind; a failed write leaves whatever was written.
pub fn persist(envelope: &str, destination: impl AsRef<Path>) -> Result<()> {
    let destination = destination.as_ref();
    let file = File::create(destination).map_err(|e| CsrKitError::io(destination, e))?;
    write_all(file, envelope, destination)
}

/// Like [`persist`], but on Unix the file is readable by its owner only, including
/// an existing file that is overwritten.
pub fn persist_private(envelope: &str, destination: impl AsRef<Path>) -> Result<()> {
    let destination = destination.as_ref();
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options
        .open(destination)
        .map_err(|e| CsrKitError::io(destination, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| CsrKitError::io(destination, e))?;
    }
    write_all(file, envelope, destination)
}

fn write_all(mut file: File, envelope: &str, destination: &Path) -> Result<()> {
    file.write_all(envelope.as_bytes())
        .map_err(|e| CsrKitError::io(destination, e))?;
    file.sync_all().map_err(|e| CsrKitError::io(destination, e))
}

/// Writes the request and the private key to two files.
#[derive(Clone, Debug)]
pub struct FileSink {
    pub request_path: PathBuf,
    pub private_key_path: PathBuf,
}

impl FileSink {
    pub fn new(request_path: impl Into<PathBuf>, private_key_path: impl Into<PathBuf>) -> Self {
        Self {
            request_path: request_path.into(),
            private_key_path: private_key_path.into(),
        }
    }

    fn path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Request => &self.request_path,
            ArtifactKind::PrivateKey => &self.private_key_path,
        }
    }
}

impl ArtifactSink for FileSink {
    fn write_artifact(&mut self, kind: ArtifactKind, envelope: &str) -> Result<()> {
        let path = self.path(kind);
        match kind {
            ArtifactKind::Request => persist(envelope, path),
            ArtifactKind::PrivateKey => persist_private(envelope, path),
        }
    }

    fn describe(&self, kind: ArtifactKind) -> String {
        self.path(kind).display().to_string()
    }
}

/// Keeps artifacts in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub artifacts: BTreeMap<ArtifactKind, String>,
}

impl MemorySink {
    pub fn get(&self, kind: ArtifactKind) -> Option<&str> {
        self.artifacts.get(&kind).map(String::as_str)
    }
}

impl ArtifactSink for MemorySink {
    fn write_artifact(&mut self, kind: ArtifactKind, envelope: &str) -> Result<()> {
        self.artifacts.insert(kind, envelope.to_string());
        Ok(())
    }

    fn describe(&self, kind: ArtifactKind) -> String {
        format!("memory ({kind:?})")
    }
}
