//! Cross-process worker lock.
//!
//! The in-process lease keeps one capture in flight per scheduler; this pid
//! stamped file keeps one processing `stash` per store. A lock left behind by a
//! dead process is removed and taken over.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "worker.lock";

/// Held for as long as this process may process captures.
#[derive(Debug)]
pub struct WorkerLockGuard {
    path: PathBuf,
}

impl Drop for WorkerLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn acquire_worker_lock(stash_dir: &Path) -> anyhow::Result<WorkerLockGuard> {
    let lock_path = stash_dir.join(LOCK_FILE);

    // One retry: a stale lock is removed on the first pass.
    for _ in 0..2 {
        match try_acquire(&lock_path) {
            Ok(guard) => {
                tracing::debug!(path = %lock_path.display(), "worker lock acquired");
                return Ok(guard);
            }
            Err(LockState::HeldBy(pid)) => {
                anyhow::bail!(
                    "another stash worker is running (pid {pid}); stop it or wait for it to finish"
                );
            }
            Err(LockState::Stale(pid)) => {
                tracing::warn!(pid, path = %lock_path.display(), "removing stale worker lock");
                let _ = std::fs::remove_file(&lock_path);
            }
            Err(LockState::Unknown) => break,
        }
    }

    anyhow::bail!(
        "could not acquire worker lock at {}; remove it if no stash process is running",
        lock_path.display()
    )
}

#[derive(Debug)]
enum LockState {
    HeldBy(u32),
    Stale(u32),
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<WorkerLockGuard, LockState> {
    if let Some(parent) = lock_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(WorkerLockGuard {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
                .is_err()
            {
                return Err(LockState::Unknown);
            }

            match pid_buf.trim().parse::<u32>().ok() {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(pid) => Err(LockState::Stale(pid)),
                None => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn is_process_running(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
