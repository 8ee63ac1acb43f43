//! Combiner program builder.
//!
//! Translates one [`CombinerDescriptor`] into a complete, compilable pair of
//! WGSL shader sources. The builder owns the fixed region skeleton (banner,
//! global declarations, per-unit addressing engines, mipmap helper, per-unit
//! texel reads or the mutually exclusive copy-mode read, combiner
//! arithmetic) and delegates each region's text to the active tier's hook
//! table. Hooks memoize their output in the [`PartCache`], so a build after
//! the first for a given sub-feature is pure lookup.

pub mod assembler;
pub mod part;

mod combiner;
mod hooks;
mod shader_env;

use smallvec::SmallVec;

use crate::descriptor::CombinerDescriptor;
use crate::errors::ShaderStage;

use assembler::AssembledSource;
use part::{PartCache, ShaderPart};

/// Assembles shader sources for combiner descriptors.
///
/// Stateless apart from the part cache passed into each call; the accuracy
/// tier is read from the descriptor, so one builder serves both variants.
#[derive(Debug, Default)]
pub struct CombinerProgramBuilder;

impl CombinerProgramBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the vertex/fragment source pair for `desc`.
    ///
    /// Pure with respect to its inputs other than part-cache memoization:
    /// equal descriptors yield byte-identical text on every call.
    ///
    /// # Panics
    ///
    /// Panics if `desc` violates the upstream resolver contract (see
    /// [`CombinerDescriptor::validate`]).
    pub fn build_source(
        &self,
        desc: &CombinerDescriptor,
        parts: &mut PartCache,
    ) -> AssembledSource {
        desc.validate();
        let hooks = hooks::hooks_for(desc.tier);

        let vertex_part = hooks::vertex(desc, parts);
        let vertex = assembler::assemble(ShaderStage::Vertex, &[vertex_part.text()]);

        let mut regions: SmallVec<[ShaderPart; 6]> = SmallVec::new();
        regions.push((hooks.globals)(desc, parts));
        if desc.is_copy_mode() {
            regions.push((hooks.copy_read)(parts));
        } else {
            for (index, unit) in desc.units.iter().enumerate() {
                if unit.enabled
                    && let Some(part) = (hooks.addressing)(index as u8, unit, parts)
                {
                    regions.push(part);
                }
            }
            if let Some(part) = (hooks.mipmap)(desc, parts) {
                regions.push(part);
            }
            for (index, unit) in desc.units.iter().enumerate() {
                if unit.enabled {
                    regions.push((hooks.read_texel)(index as u8, unit, desc.mipmap, parts));
                }
            }
        }

        let main = combiner::fragment_main(desc);
        let mut texts: SmallVec<[&str; 8]> = regions.iter().map(ShaderPart::text).collect();
        texts.push(&main);
        let fragment = assembler::assemble(ShaderStage::Fragment, &texts);

        AssembledSource { vertex, fragment }
    }
}
