use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tempfile::NamedTempFile;

/// JSON object on disk, re-read on every access so separate processes see
/// each other's logins.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read credentials at `{}`", self.path.display())
                });
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&raw).with_context(|| {
            format!("failed to parse credentials at `{}`", self.path.display())
        })
    }

    /// Replace the file atomically. The token is only ever readable by the
    /// owning user.
    fn write_all(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create `{}`", parent.display()))?;
                parent
            }
            None => Path::new("."),
        };

        let payload =
            serde_json::to_vec_pretty(values).context("failed to serialize credentials")?;
        let failed = || format!("failed to write credentials at `{}`", self.path.display());

        let mut file = NamedTempFile::new_in(parent).with_context(failed)?;
        restrict_to_owner(file.as_file()).with_context(failed)?;
        file.write_all(&payload).with_context(failed)?;
        file.as_file().sync_all().with_context(failed)?;
        file.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(failed)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
