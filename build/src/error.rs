//! Build-time failures (spec §7 kind 1): abort the build, no artifact
//! produced.
use std::fmt;

/// Everything that can go wrong assembling a deployable artifact.
#[derive(Debug)]
pub enum BuildError {
    /// The interpreter archive could not be fetched.
    DownloadFailure {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error, if the request never completed.
        source: Option<reqwest::Error>,
    },
    /// The interpreter archive was not a valid zip, or contained no entry
    /// matching the interpreter executable's name.
    ExtractFailure(String),
    /// `meta.isDev` was set; this builder only produces production
    /// artifacts.
    DevModeUnsupported,
    /// Cross-compiling or reading the bootstrap binary failed.
    BootstrapBuildFailure(String),
    /// Filesystem I/O failed while assembling the artifact.
    Io(std::io::Error),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DownloadFailure { url, source } => match source {
                Some(err) => write!(f, "failed to download interpreter from {url}: {err}"),
                None => write!(f, "failed to download interpreter from {url}: non-success status"),
            },
            BuildError::ExtractFailure(msg) => write!(f, "failed to extract interpreter archive: {msg}"),
            BuildError::DevModeUnsupported => write!(f, "dev-mode builds are not supported by this runtime"),
            BuildError::BootstrapBuildFailure(msg) => write!(f, "failed to build bootstrap binary: {msg}"),
            BuildError::Io(err) => write!(f, "build I/O error: {err}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::DownloadFailure { source, .. } => source.as_ref().map(|e| e as _),
            BuildError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::Io(err)
    }
}
