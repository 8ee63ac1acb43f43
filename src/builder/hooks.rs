//! Per-region generator hooks for the two accuracy tiers.
//!
//! The builder owns the region skeleton (what regions exist and in what
//! order); each tier owns how a region's text is rendered. A tier is a
//! [`RegionHooks`] table of function pointers: the Accurate table renders
//! the bit-exact templates (manual clamp/wrap/mirror, in-shader three-point
//! filtering, multisample resolve loops), the Fast table leans on sampler
//! hardware and emits no addressing engine at all.
//!
//! Every hook consults the part cache first. A hit returns the cached text
//! object unchanged; a miss renders the template chunk and inserts it.

use serde::Serialize;

use crate::descriptor::{
    AccuracyTier, CombinerDescriptor, MipmapMode, ReadEngine, TextureUnitState,
};

use super::part::{PartCache, ShaderPart, SubFeature};
use super::shader_env::render_chunk;

/// Table of region generators for one accuracy tier.
pub(crate) struct RegionHooks {
    /// Uniform/binding declarations and the fragment input struct.
    pub globals: fn(&CombinerDescriptor, &mut PartCache) -> ShaderPart,
    /// Clamp/wrap/mirror engine for one enabled unit; `None` when the tier
    /// delegates addressing to the sampler.
    pub addressing: fn(u8, &TextureUnitState, &mut PartCache) -> Option<ShaderPart>,
    /// Level-of-detail helper; `None` when no read function needs it.
    pub mipmap: fn(&CombinerDescriptor, &mut PartCache) -> Option<ShaderPart>,
    /// Texel read logic for one enabled unit.
    pub read_texel: fn(u8, &TextureUnitState, MipmapMode, &mut PartCache) -> ShaderPart,
    /// Copy-mode fast-path read.
    pub copy_read: fn(&mut PartCache) -> ShaderPart,
}

pub(crate) static ACCURATE_HOOKS: RegionHooks = RegionHooks {
    globals: |desc, parts| globals(AccuracyTier::Accurate, desc, parts),
    addressing: accurate_addressing,
    mipmap: accurate_mipmap,
    read_texel: accurate_read_texel,
    copy_read: |parts| copy_read(AccuracyTier::Accurate, "copy_accurate", parts),
};

pub(crate) static FAST_HOOKS: RegionHooks = RegionHooks {
    globals: |desc, parts| globals(AccuracyTier::Fast, desc, parts),
    addressing: |_, _, _| None,
    mipmap: fast_mipmap,
    read_texel: fast_read_texel,
    copy_read: |parts| copy_read(AccuracyTier::Fast, "copy_fast", parts),
};

pub(crate) fn hooks_for(tier: AccuracyTier) -> &'static RegionHooks {
    match tier {
        AccuracyTier::Accurate => &ACCURATE_HOOKS,
        AccuracyTier::Fast => &FAST_HOOKS,
    }
}

// ─── Template contexts ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct GlobalsCtx {
    textured: bool,
    units: Vec<UnitCtx>,
}

#[derive(Serialize)]
struct UnitCtx {
    index: u8,
    engine: &'static str,
    sampler: bool,
    texture_binding: u8,
    sampler_binding: u8,
}

#[derive(Serialize)]
struct AddressingCtx {
    unit: u8,
    wrap_s: &'static str,
    wrap_t: &'static str,
}

#[derive(Serialize)]
struct ReadCtx {
    unit: u8,
    mipmap: &'static str,
}

#[derive(Serialize)]
struct EmptyCtx {}

fn engine_token(engine: ReadEngine) -> &'static str {
    match engine {
        ReadEngine::Normal => "normal",
        ReadEngine::Multisampled => "multisampled",
        ReadEngine::CopyMode => "copy",
    }
}

// ─── Shared regions ──────────────────────────────────────────────────────────

/// Vertex stage is tier-invariant: only texturing changes the interface.
pub(crate) fn vertex(desc: &CombinerDescriptor, parts: &mut PartCache) -> ShaderPart {
    let textured = desc.textured();
    parts.get_or_insert_with(SubFeature::VertexShader { textured }, || {
        #[derive(Serialize)]
        struct VertexCtx {
            textured: bool,
        }
        render_chunk("vertex", &VertexCtx { textured })
    })
}

fn globals(tier: AccuracyTier, desc: &CombinerDescriptor, parts: &mut PartCache) -> ShaderPart {
    let key = SubFeature::FragmentGlobals {
        tier,
        unit0: desc.units[0].enabled.then_some(desc.units[0].engine),
        unit1: desc.units[1].enabled.then_some(desc.units[1].engine),
    };
    parts.get_or_insert_with(key, || {
        let units = desc
            .units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.enabled)
            .map(|(index, unit)| {
                let index = index as u8;
                // The accurate tier addresses texels itself and never binds
                // a sampler; multisampled storage cannot be sampled at all.
                let sampler =
                    tier == AccuracyTier::Fast && unit.engine != ReadEngine::Multisampled;
                UnitCtx {
                    index,
                    engine: engine_token(unit.engine),
                    sampler,
                    texture_binding: index * 2,
                    sampler_binding: index * 2 + 1,
                }
            })
            .collect();
        render_chunk(
            "globals",
            &GlobalsCtx {
                textured: desc.textured(),
                units,
            },
        )
    })
}

fn copy_read(tier: AccuracyTier, chunk: &'static str, parts: &mut PartCache) -> ShaderPart {
    parts.get_or_insert_with(SubFeature::CopyModeRead { tier }, || {
        render_chunk(chunk, &EmptyCtx {})
    })
}

// ─── Accurate tier ───────────────────────────────────────────────────────────

fn accurate_addressing(
    unit: u8,
    state: &TextureUnitState,
    parts: &mut PartCache,
) -> Option<ShaderPart> {
    let key = SubFeature::Addressing {
        tier: AccuracyTier::Accurate,
        unit,
        wrap_s: state.wrap_s,
        wrap_t: state.wrap_t,
    };
    let part = parts.get_or_insert_with(key, || {
        render_chunk(
            "addressing",
            &AddressingCtx {
                unit,
                wrap_s: state.wrap_s.token(),
                wrap_t: state.wrap_t.token(),
            },
        )
    });
    Some(part)
}

fn accurate_mipmap(desc: &CombinerDescriptor, parts: &mut PartCache) -> Option<ShaderPart> {
    if !mipmap_helper_needed(desc) {
        return None;
    }
    let part = parts.get_or_insert_with(
        SubFeature::Mipmap {
            tier: AccuracyTier::Accurate,
        },
        || render_chunk("mipmap_accurate", &EmptyCtx {}),
    );
    Some(part)
}

fn accurate_read_texel(
    unit: u8,
    state: &TextureUnitState,
    mipmap: MipmapMode,
    parts: &mut PartCache,
) -> ShaderPart {
    match state.engine {
        ReadEngine::Normal => {
            let key = SubFeature::ReadTexel {
                tier: AccuracyTier::Accurate,
                unit,
                engine: ReadEngine::Normal,
                mipmap,
            };
            parts.get_or_insert_with(key, || {
                render_chunk(
                    "read_normal_accurate",
                    &ReadCtx {
                        unit,
                        mipmap: mipmap.token(),
                    },
                )
            })
        }
        // Multisampled storage carries no mip chain.
        ReadEngine::Multisampled => {
            let key = SubFeature::ReadTexel {
                tier: AccuracyTier::Accurate,
                unit,
                engine: ReadEngine::Multisampled,
                mipmap: MipmapMode::Disabled,
            };
            parts.get_or_insert_with(key, || {
                render_chunk(
                    "read_ms_accurate",
                    &ReadCtx {
                        unit,
                        mipmap: MipmapMode::Disabled.token(),
                    },
                )
            })
        }
        ReadEngine::CopyMode => {
            unreachable!("copy-mode units never reach the standard read hook")
        }
    }
}

// ─── Fast tier ───────────────────────────────────────────────────────────────

fn fast_mipmap(desc: &CombinerDescriptor, parts: &mut PartCache) -> Option<ShaderPart> {
    // Interpolate rides the sampler's own trilinear path; only the nearest
    // filter computes a level in the shader.
    if desc.mipmap != MipmapMode::Nearest || !mipmap_helper_needed(desc) {
        return None;
    }
    let part = parts.get_or_insert_with(
        SubFeature::Mipmap {
            tier: AccuracyTier::Fast,
        },
        || render_chunk("mipmap_fast", &EmptyCtx {}),
    );
    Some(part)
}

fn fast_read_texel(
    unit: u8,
    state: &TextureUnitState,
    mipmap: MipmapMode,
    parts: &mut PartCache,
) -> ShaderPart {
    match state.engine {
        ReadEngine::Normal => {
            let key = SubFeature::ReadTexel {
                tier: AccuracyTier::Fast,
                unit,
                engine: ReadEngine::Normal,
                mipmap,
            };
            parts.get_or_insert_with(key, || {
                render_chunk(
                    "read_normal_fast",
                    &ReadCtx {
                        unit,
                        mipmap: mipmap.token(),
                    },
                )
            })
        }
        ReadEngine::Multisampled => {
            let key = SubFeature::ReadTexel {
                tier: AccuracyTier::Fast,
                unit,
                engine: ReadEngine::Multisampled,
                mipmap: MipmapMode::Disabled,
            };
            parts.get_or_insert_with(key, || {
                render_chunk(
                    "read_ms_fast",
                    &ReadCtx {
                        unit,
                        mipmap: MipmapMode::Disabled.token(),
                    },
                )
            })
        }
        ReadEngine::CopyMode => {
            unreachable!("copy-mode units never reach the standard read hook")
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Whether any read function in this program will call `mip_level`.
fn mipmap_helper_needed(desc: &CombinerDescriptor) -> bool {
    desc.mipmap != MipmapMode::Disabled
        && desc
            .units
            .iter()
            .any(|u| u.enabled && u.engine == ReadEngine::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CombinerCycle, CombinerInput, WrapMode};

    fn textured_desc(tier: AccuracyTier) -> CombinerDescriptor {
        let mut desc = CombinerDescriptor::new(
            tier,
            CombinerCycle::passthrough(CombinerInput::Texel0),
            CombinerCycle::passthrough(CombinerInput::Texel0),
        );
        desc.units[0] = TextureUnitState::normal(WrapMode::Mirror, WrapMode::Wrap);
        desc
    }

    #[test]
    fn fast_tier_emits_no_addressing_engine() {
        let desc = textured_desc(AccuracyTier::Fast);
        let mut parts = PartCache::new();
        let hooks = hooks_for(AccuracyTier::Fast);
        assert!((hooks.addressing)(0, &desc.units[0], &mut parts).is_none());
        assert_eq!(parts.len(), 0);
    }

    #[test]
    fn accurate_addressing_branches_per_axis() {
        let desc = textured_desc(AccuracyTier::Accurate);
        let mut parts = PartCache::new();
        let hooks = hooks_for(AccuracyTier::Accurate);
        let part = (hooks.addressing)(0, &desc.units[0], &mut parts).unwrap();
        let text = part.text();
        assert!(text.contains("fn cwm0("));
        // Mirror on S folds the period; wrap on T only floors.
        assert!(text.contains("period_s"));
        assert!(!text.contains("period_t"));
    }

    #[test]
    fn multisampled_read_ignores_mipmap_mode() {
        let mut desc = textured_desc(AccuracyTier::Accurate);
        desc.units[0].engine = ReadEngine::Multisampled;
        desc.mipmap = MipmapMode::Interpolate;
        let mut parts = PartCache::new();
        let hooks = hooks_for(AccuracyTier::Accurate);
        let part = (hooks.read_texel)(0, &desc.units[0], desc.mipmap, &mut parts);
        assert_eq!(
            part.key(),
            SubFeature::ReadTexel {
                tier: AccuracyTier::Accurate,
                unit: 0,
                engine: ReadEngine::Multisampled,
                mipmap: MipmapMode::Disabled,
            }
        );
        assert!(part.text().contains("textureNumSamples"));
    }

    #[test]
    fn fast_interpolate_mipmap_needs_no_helper() {
        let mut desc = textured_desc(AccuracyTier::Fast);
        desc.mipmap = MipmapMode::Interpolate;
        let mut parts = PartCache::new();
        assert!(fast_mipmap(&desc, &mut parts).is_none());

        desc.mipmap = MipmapMode::Nearest;
        let part = fast_mipmap(&desc, &mut parts).unwrap();
        assert!(part.text().contains("fn mip_level("));
    }

    #[test]
    fn globals_bind_sampler_only_for_fast_samplable_units() {
        let mut parts = PartCache::new();
        let accurate = (hooks_for(AccuracyTier::Accurate).globals)(
            &textured_desc(AccuracyTier::Accurate),
            &mut parts,
        );
        assert!(!accurate.text().contains("sampler"));

        let fast =
            (hooks_for(AccuracyTier::Fast).globals)(&textured_desc(AccuracyTier::Fast), &mut parts);
        assert!(fast.text().contains("var samp0: sampler;"));
    }
}
