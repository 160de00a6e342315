//! On-disk cache of raw device reports
//!
//! Every successful network fetch is saved as the exact CSV bytes the device
//! returned, one file per measurement key. There is no expiry: a file that
//! exists is trusted. Files are written to a temporary name and renamed into
//! place, so an interrupted run never leaves a truncated report under a final
//! key.

use crate::error::{AppError, Result};
use crate::models::{BenchKind, Device};
use std::fs;
use std::path::{Path, PathBuf};

/// Identifies one cached report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    kind: BenchKind,
    receiver_mac: String,
    targets: Vec<String>,
    params: Vec<String>,
}

impl CacheKey {
    /// Report of `receiver` pulling data from `sender`
    pub fn throughput(receiver: &Device, sender: &Device, iterations: Option<u32>) -> Self {
        Self {
            kind: BenchKind::Throughput,
            receiver_mac: receiver.mac.clone(),
            targets: vec![sender.mac.clone()],
            params: iterations.map(|n| format!("i{}", n)).into_iter().collect(),
        }
    }

    /// Report of `master` messaging every device in `targets`, in order
    pub fn messages(master: &Device, targets: &[Device], message_count: u32, message_size: Option<u32>) -> Self {
        let mut params = vec![format!("n{}", message_count)];
        if let Some(size) = message_size {
            params.push(format!("s{}", size));
        }

        Self {
            kind: BenchKind::Messages,
            receiver_mac: master.mac.clone(),
            targets: targets.iter().map(|d| d.mac.clone()).collect(),
            params,
        }
    }

    /// Report of a token run around `ring`, whose first device is the master
    pub fn token(ring: &[Device], payload_length: u32, rounds: u32) -> Self {
        let (master, rest) = match ring.split_first() {
            Some((master, rest)) => (master.mac.clone(), rest),
            None => (String::new(), ring),
        };

        Self {
            kind: BenchKind::Token,
            receiver_mac: master,
            targets: rest.iter().map(|d| d.mac.clone()).collect(),
            params: vec![format!("p{}", payload_length), format!("r{}", rounds)],
        }
    }

    /// File name: `{kind}-{receiver}-{targets}[-{params}].csv`, sanitized
    pub fn file_name(&self) -> String {
        let mut name = format!(
            "{}-{}-{}",
            self.kind.as_str(),
            self.receiver_mac,
            self.targets.join(".")
        );
        if !self.params.is_empty() {
            name.push('-');
            name.push_str(&self.params.join("-"));
        }
        format!("{}.csv", sanitize_component(&name))
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Flat directory of raw report files
#[derive(Debug, Clone)]
pub struct ReportCache {
    dir: PathBuf,
}

impl ReportCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read the raw report for `key`, `None` if it was never stored
    pub fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::cache(format!(
                "Failed to read cached report '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Persist the exact bytes of a report, replacing any previous file
    pub fn store(&self, key: &CacheKey, raw: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::cache(format!(
                "Failed to create cache directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(".{}.tmp", key.file_name()));

        fs::write(&temp_path, raw).map_err(|e| {
            AppError::cache(format!("Failed to write '{}': {}", temp_path.display(), e))
        })?;

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(AppError::cache(format!(
                "Failed to move report into place at '{}': {}",
                path.display(),
                e
            )));
        }

        Ok(path)
    }
}
