//! Rendering-context ownership of the shader synthesis state.
//!
//! Every cache in this crate is plain owned data with an explicit lifetime:
//! a [`CombinerContext`] holds the builder, the part cache, the program
//! cache, and the backend, and is created and destroyed alongside the
//! graphics context it serves. Nothing here is global or implicitly
//! initialized, so two contexts never share or clobber each other's caches.
//!
//! All methods take `&mut self`; the owning (GPU) thread drives everything.

use crate::builder::CombinerProgramBuilder;
use crate::builder::part::PartCache;
use crate::descriptor::CombinerDescriptor;
use crate::errors::Result;
use crate::program::backend::ProgramBackend;
use crate::program::cache::{ProgramCache, ProgramId};

/// Owns all shader-synthesis state for one graphics context.
pub struct CombinerContext<B: ProgramBackend> {
    backend: B,
    builder: CombinerProgramBuilder,
    parts: PartCache,
    programs: ProgramCache<B::Program>,
}

impl<B: ProgramBackend> CombinerContext<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            builder: CombinerProgramBuilder::new(),
            parts: PartCache::new(),
            programs: ProgramCache::new(),
        }
    }

    /// The program for `desc`, synthesizing and compiling it on first use.
    ///
    /// Typically called once per combiner state change; repeat calls with an
    /// already-seen descriptor are a single hash lookup.
    ///
    /// # Panics
    ///
    /// Panics if `desc` violates the resolver contract (see
    /// [`CombinerDescriptor::validate`]).
    pub fn get_or_build(&mut self, desc: &CombinerDescriptor) -> Result<ProgramId> {
        self.programs
            .get_or_build(desc, &self.builder, &mut self.parts, &mut self.backend)
    }

    /// The compiled program behind `id`.
    #[must_use]
    pub fn program(&self, id: ProgramId) -> &B::Program {
        self.programs.program(id)
    }

    /// Distinct shader parts rendered so far.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Distinct programs compiled so far.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Drop all cached parts and programs, invalidating outstanding
    /// [`ProgramId`]s. The backend stays usable.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.programs.clear();
    }

    /// Borrow the backend, for renderer integration that needs the
    /// underlying device objects.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
