//! Resolution of human-friendly D toolchain version specifiers into concrete,
//! platform-specific download artifacts.
//!
//! Supported tools: the DMD and LDC compilers, the DUB build tool, and the
//! apt-packaged GDC compiler. A specifier such as `dmd-2.108`, `ldc^2` or
//! `latest` is resolved into an [`ArtifactDescriptor`] holding the download
//! URL, optional detached signature URL, and the archive sub-paths an
//! installer needs, consulting the dlang.org latest pointers and the GitHub
//! tag/release APIs where needed.
//!
//! [`ArtifactDescriptor`]: resolve::artifact::ArtifactDescriptor

pub mod config;
pub mod platform;
pub mod resolve;
