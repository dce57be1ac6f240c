//! Clients for the remote listings resolution depends on.

pub mod github;
