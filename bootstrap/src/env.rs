//! Cold-start environment preparation (spec §4.3 Bootstrap Shim).
//!
//! The container filesystem is read-only outside `/tmp`; the interpreter
//! assumes it can write caches, temp files, and config there. This module
//! does the POSIX-shell-script steps the original bootstrap shim would
//! have run, before the interpreter child process is spawned.
use std::path::{Path, PathBuf};

pub const INTERPRETER_NAME: &str = "bun";

/// The interpreter's own session-token env var, which would otherwise
/// shadow credentials the user's code supplies for object-storage clients
/// (spec §4.3 step 3 / §6). Its exact name is unconfirmed upstream; see
/// DESIGN.md for the Open Question resolution.
const GUEST_SESSION_TOKEN_VAR: &str = "BUN_AWS_SESSION_TOKEN";

/// Verifies the interpreter binary is present and executable at
/// `<task_root>/bin/bun`. Returns a diagnostic message on failure; the
/// caller should print it to stderr and exit non-zero, since a missing
/// interpreter is an unrecoverable startup condition (spec §7: "a fatal
/// startup error where the environment is unusable").
pub fn verify_interpreter(task_root: &Path) -> Result<PathBuf, String> {
    let path = task_root.join("bin").join(INTERPRETER_NAME);
    if !path.is_file() {
        return Err(format!("interpreter binary not found at {}", path.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).map(|m| m.permissions().mode()).unwrap_or(0);
        if mode & 0o111 == 0 {
            return Err(format!("interpreter binary at {} is not executable", path.display()));
        }
    }

    Ok(path)
}

/// Points cache, tmp, and config paths at `/tmp`, disables the
/// interpreter's telemetry, and clears inherited credentials that would
/// otherwise collide with user-supplied ones (spec §4.3 steps 2-3).
///
/// Mutates the calling process's environment; callers must run this
/// before spawning the interpreter child, which inherits it.
pub fn prepare() {
    std::env::set_var("HOME", "/tmp");
    std::env::set_var("XDG_CACHE_HOME", "/tmp/.cache");
    std::env::set_var("DO_NOT_TRACK", "1");
    std::env::remove_var("AWS_SESSION_TOKEN");
    std::env::remove_var(GUEST_SESSION_TOKEN_VAR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_interpreter_fails_when_missing() {
        let dir = std::env::temp_dir().join(format!("bun-lambda-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let err = verify_interpreter(&dir).unwrap_err();
        assert!(err.contains("not found"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn verify_interpreter_succeeds_for_an_executable_file() {
        let dir = std::env::temp_dir().join(format!("bun-lambda-test-{}-ok", std::process::id()));
        let bin_dir = dir.join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let bin_path = bin_dir.join(INTERPRETER_NAME);
        std::fs::write(&bin_path, b"#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&bin_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        assert_eq!(verify_interpreter(&dir).unwrap(), bin_path);
        std::fs::remove_dir_all(&dir).ok();
    }
}
