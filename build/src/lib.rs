#![warn(missing_docs)]
//! The build-time half of the runtime: Interpreter Acquisition (spec
//! §4.1) and the Artifact Builder (spec §4.2).
//!
//! This crate has no teacher counterpart in `lambda-runtime` — AWS's
//! runtime assumes the platform supplies the interpreter and packaging
//! already. It follows the same error/config idiom as the rest of the
//! workspace: a boxed-error-free set of named failure variants, and
//! `tracing` spans at each build step.
pub mod architecture;
pub mod artifact;
pub mod error;
pub mod interpreter;

pub use architecture::Architecture;
pub use artifact::{build, BuildInput, BuildMeta, FileEntry, Lambda, ProjectSettings};
pub use error::BuildError;
