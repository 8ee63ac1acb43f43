//! # combiner-forge
//!
//! Lazy shader-source synthesis for a renderer that emulates a retro
//! console's fixed-function texture/color-combiner pipeline on wgpu.
//!
//! The fixed-function configuration space (per-unit clamp/wrap/mirror
//! addressing, normal/multisampled/copy-mode texture reads, mipmap filters,
//! combiner cycle arithmetic, two accuracy tiers) is far too large to
//! materialize ahead of time. Instead, each program is assembled on first
//! use from composable WGSL fragments:
//!
//! - [`CombinerDescriptor`] captures the resolved render state for a draw.
//! - [`CombinerProgramBuilder`] selects the WGSL region fragments the state
//!   needs, memoizing each sub-feature in a [`PartCache`].
//! - The assembler concatenates them into an [`AssembledSource`] pair.
//! - A [`ProgramBackend`] compiles/links the text; [`ProgramCache`]
//!   guarantees at most one build per distinct descriptor.
//! - [`CombinerContext`] owns all of the above with an explicit lifecycle
//!   tied to the graphics context.
//!
//! All caches are mutated only from the thread owning the GPU context; the
//! `&mut self` APIs encode that exclusivity.

pub mod builder;
pub mod context;
pub mod descriptor;
pub mod errors;
pub mod program;

pub use builder::CombinerProgramBuilder;
pub use builder::assembler::AssembledSource;
pub use builder::part::{PartCache, ShaderPart, SubFeature};
pub use context::CombinerContext;
pub use descriptor::{
    AccuracyTier, CombinerCycle, CombinerDescriptor, CombinerInput, CycleMode, MipmapMode,
    ReadEngine, TextureUnitState, WrapMode,
};
pub use errors::{CombinerError, Result, ShaderStage};
pub use program::backend::{NagaBackend, NagaProgram, ProgramBackend, WgpuBackend, WgpuProgram};
pub use program::cache::{ProgramCache, ProgramId};
