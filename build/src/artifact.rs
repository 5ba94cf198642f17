//! Artifact Builder (spec §4.2): assembles the file set the platform
//! uploads as the function's deployable package.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{architecture::Architecture, error::BuildError, interpreter};

/// The dispatcher source injected at `runtime/index.js` in every artifact.
const RUNTIME_INDEX_JS: &str = include_str!("../resources/runtime-index.js");

/// The platform's "provided" OS-only runtime identifier. In production
/// this is read from the platform SDK; pinned here because no such SDK is
/// part of this workspace.
const PROVIDED_RUNTIME_ID: &str = "provided.al2023";

/// A single file in the assembled artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file's raw contents.
    pub contents: Vec<u8>,
    /// The Unix permission bits the file should be written with.
    pub mode: u32,
}

impl FileEntry {
    fn new(contents: Vec<u8>, mode: u32) -> Self {
        Self { contents, mode }
    }
}

/// The deployable package the platform will upload (spec §4.2 outputs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    /// In-package path to file contents, for every file in the artifact.
    pub files: HashMap<String, FileEntry>,
    /// In-package path to the user's handler source.
    pub handler: String,
    /// The platform's OS-only runtime identifier.
    pub runtime: String,
    /// Environment variables the platform sets for every invocation.
    pub environment: HashMap<String, String>,
    /// Opts into the platform's large-environment-variable wrapper.
    pub supports_wrapper: bool,
}

/// `config.projectSettings` (spec §4.2).
#[derive(Debug, Clone, Default)]
pub struct ProjectSettings {
    /// Optional prefix applied to the handler path when the function
    /// lives in a sub-directory.
    pub root_directory: Option<String>,
}

/// `meta` (spec §4.2).
#[derive(Debug, Clone, Default)]
pub struct BuildMeta {
    /// If true, the builder fails with [`BuildError::DevModeUnsupported`].
    pub is_dev: bool,
}

/// The `build(files, config, entrypoint, workPath, meta)` operation's
/// input (spec §4.2 Public operation).
pub struct BuildInput {
    /// In-package path to a file reference on the build machine, for
    /// every one of the user's source files.
    pub files: HashMap<String, PathBuf>,
    /// Project settings, namely an optional root directory.
    pub config: ProjectSettings,
    /// In-package path to the user's handler source, relative to the
    /// project root.
    pub entrypoint: String,
    /// The build work area on disk.
    pub work_path: PathBuf,
    /// Build metadata.
    pub meta: BuildMeta,
    /// The pinned interpreter version.
    pub interpreter_version: String,
}

/// Assembles a [`Lambda`] descriptor from a [`BuildInput`] (spec §4.2).
pub fn build(input: BuildInput) -> Result<Lambda, BuildError> {
    if input.meta.is_dev {
        return Err(BuildError::DevModeUnsupported);
    }

    let arch = Architecture::host();
    let interpreter_path = interpreter::acquire(&input.work_path, &input.interpreter_version, arch)?;
    let interpreter_bytes = fs::read(&interpreter_path)?;
    let interpreter_name = interpreter_path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("interpreter path always has a file name")
        .to_string();

    let bootstrap_bytes = bootstrap_binary(&input.work_path, arch)?;

    // User files first: reserved runtime paths are inserted afterward and
    // must win any collision, never the other way around.
    let mut files = HashMap::with_capacity(input.files.len() + 3);
    for (in_package_path, source_path) in &input.files {
        let contents = fs::read(source_path)?;
        files.insert(in_package_path.clone(), FileEntry::new(contents, 0o644));
    }

    files.insert("bootstrap".to_string(), FileEntry::new(bootstrap_bytes, 0o755));
    files.insert("runtime/index.js".to_string(), FileEntry::new(RUNTIME_INDEX_JS.as_bytes().to_vec(), 0o644));
    files.insert(format!("bin/{interpreter_name}"), FileEntry::new(interpreter_bytes, 0o755));

    let handler = match &input.config.root_directory {
        Some(root) => format!("{}/{}", root.trim_end_matches('/'), input.entrypoint),
        None => input.entrypoint.clone(),
    };

    let mut environment = HashMap::new();
    environment.insert("BUN_VERSION".to_string(), input.interpreter_version.clone());

    Ok(Lambda {
        files,
        handler,
        runtime: PROVIDED_RUNTIME_ID.to_string(),
        environment,
        supports_wrapper: true,
    })
}

/// Cross-compiles the `bootstrap` crate for `arch` and returns the
/// resulting binary's bytes. Grounded on how `cargo-lambda` drives a
/// release build of the function crate for the target's triple.
fn bootstrap_binary(work_path: &Path, arch: Architecture) -> Result<Vec<u8>, BuildError> {
    let triple = arch.rust_target_triple();
    let target_dir = work_path.join("target");

    let status = Command::new("cargo")
        .args(["build", "--release", "--package", "bootstrap", "--target", triple])
        .env("CARGO_TARGET_DIR", &target_dir)
        .status()
        .map_err(|err| BuildError::BootstrapBuildFailure(err.to_string()))?;

    if !status.success() {
        return Err(BuildError::BootstrapBuildFailure(format!("cargo build exited with {status}")));
    }

    let binary_path = target_dir.join(triple).join("release").join("bootstrap");
    fs::read(&binary_path).map_err(BuildError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_fails_before_touching_the_filesystem() {
        let input = BuildInput {
            files: HashMap::new(),
            config: ProjectSettings::default(),
            entrypoint: "index.ts".to_string(),
            work_path: PathBuf::from("/nonexistent"),
            meta: BuildMeta { is_dev: true },
            interpreter_version: "1.1.0".to_string(),
        };
        assert!(matches!(build(input), Err(BuildError::DevModeUnsupported)));
    }

    #[test]
    fn handler_path_is_prefixed_by_root_directory_when_set() {
        let config = ProjectSettings { root_directory: Some("api".to_string()) };
        let handler = match &config.root_directory {
            Some(root) => format!("{}/{}", root.trim_end_matches('/'), "index.ts"),
            None => "index.ts".to_string(),
        };
        assert_eq!(handler, "api/index.ts");
    }
}
