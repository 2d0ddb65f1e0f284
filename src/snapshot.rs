use crate::error::FetchError;
use serde::Serialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

pub const FOLDERS_FILE: &str = "folders.json";
pub const COLLECTION_FILE: &str = "collection.json";

/// Reads and writes the JSON files under the data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pub data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    /// Overwrites `<data_dir>/<file_name>` with pretty-printed JSON.
    pub fn write_json<T: Serialize>(&self, file_name: &str, data: &T) -> Result<PathBuf, FetchError> {
        fs::create_dir_all(&self.data_dir)?;

        let json_file = self.path_of(file_name);
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&json_file, content)?;

        Ok(json_file)
    }

    /// Raw file contents, or `None` when missing.
    ///
    /// `relative` must stay inside the data directory; anything else is a
    /// `PermissionDenied` I/O error.
    pub fn read_raw(&self, relative: &str) -> Result<Option<String>, FetchError> {
        let Some(file) = self.resolve(relative) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("path escapes data directory: {}", relative),
            )
            .into());
        };

        if !file.is_file() {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(&file)?))
    }

    /// Joins `relative` onto the data directory, or `None` if it would leave it.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let mut resolved = self.data_dir.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }
}
