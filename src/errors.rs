//! Error Types
//!
//! Recoverable failures are confined to the program backend: a generated
//! shader can be rejected by the WGSL front end or validator (driver quirks,
//! unsupported capabilities). Those surface as [`CombinerError`] through
//! [`ProgramCache::get_or_build`] and are never cached, so a later call with
//! the same descriptor retries the build.
//!
//! Contract violations (a descriptor outside the documented enumeration
//! rules, or a missing embedded template) indicate an upstream bug and
//! panic instead of degrading fidelity silently.
//!
//! [`ProgramCache::get_or_build`]: crate::program::cache::ProgramCache::get_or_build

use std::fmt;

use thiserror::Error;

/// The shader pipeline stage a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// The main error type for the combiner shader synthesis engine.
#[derive(Error, Debug)]
pub enum CombinerError {
    /// The backend rejected one stage's generated source.
    #[error("{stage} shader compilation failed: {log}")]
    Compile {
        /// Stage whose source was rejected.
        stage: ShaderStage,
        /// Backend diagnostic log.
        log: String,
    },

    /// The two stages compiled but cannot be linked into a program
    /// (missing entry point, stage interface mismatch).
    #[error("program link failed: {log}")]
    Link {
        /// Backend diagnostic log.
        log: String,
    },
}

/// Alias for `Result<T, CombinerError>`.
pub type Result<T> = std::result::Result<T, CombinerError>;
