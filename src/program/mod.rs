//! Program compilation and caching.
//!
//! [`backend`] abstracts over how assembled source becomes an executable
//! program; [`cache`] guarantees each distinct descriptor is built at most
//! once per context lifetime.

pub mod backend;
pub mod cache;

pub use backend::{NagaBackend, NagaProgram, ProgramBackend, WgpuBackend, WgpuProgram};
pub use cache::{ProgramCache, ProgramId};
