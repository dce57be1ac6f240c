//! Version resolution core: specifier grammars, semver ordering, remote
//! listings, and artifact derivation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Resolvers   │────▶│  Registries  │────▶│  Transport   │
//! │ (per tool)   │     │ (tag crawl,  │     │ (GET + retry)│
//! └──────────────┘     │  releases)   │     └──────────────┘
//!        │             └──────────────┘
//!        ▼                     │
//! ┌──────────────┐     ┌──────────────┐
//! │   Artifact   │     │   TagCache   │
//! │ (descriptor) │     │ (per tool)   │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`semver`]: simplified semantic version parsing and total ordering
//! - [`resolvers`]: the dmd/ldc/dub/gdc specifier grammars
//! - [`registries`]: GitHub tag crawling and release lookups
//! - [`tags`]: in-process cache of crawled tag listings
//! - [`transport`]: HTTP GET capability with the retry policy
//! - [`artifact`]: the descriptor handed to download/install collaborators
//! - [`error`]: error types for parsing and resolution

pub mod artifact;
pub mod error;
pub mod registries;
pub mod resolvers;
pub mod semver;
pub mod tags;
pub mod transport;
