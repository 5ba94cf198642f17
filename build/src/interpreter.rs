//! Interpreter Acquisition (spec §4.1): obtains the guest-language
//! interpreter binary matching the build machine's CPU architecture and
//! caches it on disk for reuse across builds.
use std::{
    fs,
    io::Cursor,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use crate::{architecture::Architecture, error::BuildError};

const INTERPRETER_NAME: &str = "bun";
const USER_AGENT: &str = concat!("bun-lambda-build/", env!("CARGO_PKG_VERSION"));

/// The interpreter release archive's download URL for a version and
/// architecture.
pub fn download_url(version: &str, arch: Architecture) -> String {
    format!(
        "https://github.com/oven-sh/bun/releases/download/bun-v{version}/bun-{slug}.zip",
        slug = arch.release_slug()
    )
}

/// Produce the interpreter binary at `<work_path>/bin/bun`, downloading and
/// extracting it only if a previous build has not already left one there
/// (the caching policy of §4.1: content-addressed by version and
/// architecture via the platform's cache-glob mechanism, which this
/// function does not itself implement — it only needs to be idempotent
/// when the destination is already populated).
pub fn acquire(work_path: &Path, version: &str, arch: Architecture) -> Result<PathBuf, BuildError> {
    let bin_dir = work_path.join("bin");
    let dest = bin_dir.join(INTERPRETER_NAME);

    if dest.is_file() {
        tracing::trace!(path = %dest.display(), "reusing cached interpreter");
        return Ok(dest);
    }

    fs::create_dir_all(&bin_dir)?;

    let url = download_url(version, arch);
    tracing::trace!(%url, "downloading interpreter");
    let archive_bytes = fetch(&url)?;
    let executable_bytes = extract_executable(&archive_bytes, INTERPRETER_NAME)?;

    fs::write(&dest, &executable_bytes)?;
    fs::set_permissions(&dest, fs::Permissions::from_mode(0o755))?;
    tracing::trace!(path = %dest.display(), "extracted interpreter");
    Ok(dest)
}

fn fetch(url: &str) -> Result<Vec<u8>, BuildError> {
    let send = || -> Result<reqwest::blocking::Response, reqwest::Error> {
        reqwest::blocking::Client::builder().user_agent(USER_AGENT).build()?.get(url).send()
    };
    let response = send().map_err(|err| BuildError::DownloadFailure {
        url: url.to_string(),
        source: Some(err),
    })?;

    if !response.status().is_success() {
        return Err(BuildError::DownloadFailure { url: url.to_string(), source: None });
    }

    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|err| BuildError::DownloadFailure { url: url.to_string(), source: Some(err) })
}

/// Locate and extract the single archive entry whose leaf name matches
/// `executable_name` and is not a directory. If more than one candidate
/// exists, pick the one whose path has the most components — the archive
/// convention is a single top-level release folder, so the real binary
/// sits one level deeper than any decoy of the same name.
fn extract_executable(archive_bytes: &[u8], executable_name: &str) -> Result<Vec<u8>, BuildError> {
    let cursor = Cursor::new(archive_bytes);
    let mut archive = zip::ZipArchive::new(cursor).map_err(|err| BuildError::ExtractFailure(err.to_string()))?;

    let mut best: Option<(usize, usize)> = None; // (entry index, path depth)
    for i in 0..archive.len() {
        let file = archive.by_index(i).map_err(|err| BuildError::ExtractFailure(err.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let Some(path) = file.enclosed_name() else { continue };
        if path.file_name().and_then(|n| n.to_str()) != Some(executable_name) {
            continue;
        }
        let depth = path.components().count();
        let replace = match best {
            None => true,
            Some((_, best_depth)) => depth > best_depth,
        };
        if replace {
            best = Some((i, depth));
        }
    }

    let (index, _) = best.ok_or_else(|| {
        BuildError::ExtractFailure(format!("no `{executable_name}` entry found in archive"))
    })?;
    let mut file = archive.by_index(index).map_err(|err| BuildError::ExtractFailure(err.to_string()))?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    std::io::copy(&mut file, &mut bytes).map_err(|err| BuildError::ExtractFailure(err.to_string()))?;
    Ok(bytes)
}
