//! Tool-specific version resolvers.

mod dmd;
mod dub;
mod gdc;
mod ldc;

pub use dmd::DmdResolver;
pub use dub::DubResolver;
pub use gdc::GdcResolver;
pub use ldc::LdcResolver;
