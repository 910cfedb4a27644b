use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;

use crate::error::KeplerError;

const INSTALL_DIR: &str = "WXtoImg";
const SETTINGS_FILE: &str = "kepler-updater.cfg";
const DATASET_FILE: &str = "weather.txt";

#[derive(Debug, Clone)]
pub struct Paths {
    root: Utf8PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self, KeplerError> {
        let root = BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().join(INSTALL_DIR)).ok())
            .ok_or_else(|| {
                KeplerError::Filesystem("unable to resolve WXtoImg directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn settings_path(&self) -> Utf8PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn dataset_path(&self) -> Utf8PathBuf {
        self.root.join(DATASET_FILE)
    }

    pub fn ensure_root(&self) -> Result<(), KeplerError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| KeplerError::Filesystem(format!("{}: {err}", self.root)))
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KeplerError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KeplerError::persistence(path.as_std_path(), err))?;
    let mut temp = Builder::new()
        .prefix(".kepler-updater")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KeplerError::persistence(path.as_std_path(), err))?;
    temp.write_all(content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|err| KeplerError::persistence(path.as_std_path(), err))?;
    temp.persist(path.as_std_path())
        .map_err(|err| KeplerError::persistence(path.as_std_path(), err.error))?;
    Ok(())
}
