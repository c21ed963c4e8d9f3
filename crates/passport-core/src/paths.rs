//! File system paths for the client shell.
//!
//! The session file prefers the platform's local data directory and falls
//! back to a dot-directory under the user's home when that is not
//! writable; a machine-wide install may own the preferred location while
//! the client runs as an unprivileged user.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AuthError, AuthResult};

/// Directory name under the platform data dir / home dir.
const APP_DIR_NAME: &str = "passport";
/// Encrypted local session record.
const SESSION_FILE_NAME: &str = "session.dat";
/// Client configuration.
const CONFIG_FILE_NAME: &str = "config.json";

/// Resolved base directory for client files.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Resolve the base directory: platform-local data dir when writable,
    /// otherwise `~/.passport`.
    pub fn new() -> AuthResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| AuthError::Internal("could not determine home directory".into()))?;
        let fallback = home.join(format!(".{APP_DIR_NAME}"));

        let preferred = dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME));
        let base_dir = match preferred {
            Some(dir) if dir_writable(&dir) => dir,
            _ => fallback,
        };

        Ok(Self { base_dir })
    }

    /// Base directory override (tests, portable installs).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE_NAME)
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    pub fn ensure_dirs(&self) -> AuthResult<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuthError::Internal(format!("create {:?}: {e}", self.base_dir)))?;
        Ok(())
    }
}

/// Probe: can we create the directory and write a scratch file in it?
fn dir_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".passport_write_test.tmp");
    let ok = std::fs::File::create(&probe)
        .and_then(|mut f| f.write_all(b"ok"))
        .is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}
