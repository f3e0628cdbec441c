use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::PathBuf,
    process,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::infrastructure::directories::ResolvedPaths;

const LOCK_FILENAME: &str = ".scout.lock";

/// Exclusive claim on a browser profile directory. The SPA login session
/// lives in the profile; two drivers sharing it would trample each other's
/// cookies and navigation state, so a second process refuses to start.
#[derive(Debug)]
pub struct ProfileLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    started_at: i64,
}

impl ProfileLock {
    pub fn acquire(paths: &ResolvedPaths) -> Result<Self> {
        let lock_path = paths.profile_dir.join(LOCK_FILENAME);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                write_lock_info(&mut file, process::id())?;
                tracing::info!(
                    target: "lifecycle",
                    pid = process::id(),
                    path = %lock_path.display(),
                    "acquired browser profile lock"
                );
                Ok(Self {
                    file,
                    path: lock_path,
                })
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                let holder = read_lock_holder(&lock_path);
                Err(anyhow!(
                    "browser profile {} is already driven by another process{}",
                    paths.profile_dir.display(),
                    holder
                        .map(|pid| format!(" (pid {pid})"))
                        .unwrap_or_default()
                ))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    target: "lifecycle",
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove profile lock on shutdown"
                );
            }
        }
    }
}

fn write_lock_info(file: &mut File, pid: u32) -> Result<()> {
    let info = LockInfo {
        pid,
        started_at: Utc::now().timestamp_millis(),
    };
    let payload = serde_json::to_vec(&info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    Ok(())
}

fn read_lock_holder(lock_path: &PathBuf) -> Option<u32> {
    let contents = fs::read_to_string(lock_path).ok()?;
    let info: LockInfo = serde_json::from_str(&contents).ok()?;
    Some(info.pid)
}
