//! Shader part model and sub-feature memoization.
//!
//! A [`ShaderPart`] is one semantic unit of WGSL text ("read texel from unit
//! 0 with mirror wrap", "clamp/wrap/mirror engine for unit 1", …) rendered
//! once and shared by every program that references it. Parts are identified
//! by their [`SubFeature`] value key, never by pointer identity, so the
//! memoization property is observable regardless of allocator behavior; the
//! text itself is an `Arc<str>` shared by refcount.
//!
//! The sub-feature space is bounded by the descriptor enumerations, so the
//! [`PartCache`] grows monotonically and is never evicted. Full programs are
//! a different story; see the program cache.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{AccuracyTier, MipmapMode, ReadEngine, WrapMode};

/// Identity of one cacheable unit of shader behavior.
///
/// Everything that changes a part's text must appear in its key; anything
/// that does not must stay out, or identical texts would be cached twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubFeature {
    /// Whole vertex stage (structs + entry point).
    VertexShader { textured: bool },
    /// Fragment uniform/binding declarations and the stage input struct.
    FragmentGlobals {
        tier: AccuracyTier,
        unit0: Option<ReadEngine>,
        unit1: Option<ReadEngine>,
    },
    /// Clamp/wrap/mirror engine for one unit.
    Addressing {
        tier: AccuracyTier,
        unit: u8,
        wrap_s: WrapMode,
        wrap_t: WrapMode,
    },
    /// Level-of-detail helper shared by the read functions.
    Mipmap { tier: AccuracyTier },
    /// Texel read logic for one unit.
    ReadTexel {
        tier: AccuracyTier,
        unit: u8,
        engine: ReadEngine,
        mipmap: MipmapMode,
    },
    /// Copy-mode fast-path read.
    CopyModeRead { tier: AccuracyTier },
}

/// An immutable, named piece of shader source text.
#[derive(Debug, Clone)]
pub struct ShaderPart {
    key: SubFeature,
    text: Arc<str>,
}

impl ShaderPart {
    /// The sub-feature this text encodes.
    #[must_use]
    pub fn key(&self) -> SubFeature {
        self.key
    }

    /// The WGSL text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether two parts share the same underlying text buffer.
    ///
    /// Used by tests to prove memoization returns the cached object rather
    /// than an equal re-derivation.
    #[must_use]
    pub fn shares_text(&self, other: &ShaderPart) -> bool {
        Arc::ptr_eq(&self.text, &other.text)
    }
}

/// Memoizes [`ShaderPart`]s by sub-feature identity.
///
/// Lazily populated, monotonically growing, never evicted. Owned by the
/// rendering context and mutated only from the context-owning thread.
#[derive(Debug, Default)]
pub struct PartCache {
    parts: FxHashMap<SubFeature, ShaderPart>,
}

impl PartCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parts: FxHashMap::default(),
        }
    }

    /// Look up the part for `key`, rendering and inserting it on first use.
    ///
    /// A hit returns the existing part unchanged: no re-derivation, no new
    /// text allocation.
    pub fn get_or_insert_with(
        &mut self,
        key: SubFeature,
        render: impl FnOnce() -> String,
    ) -> ShaderPart {
        if let Some(part) = self.parts.get(&key) {
            log::trace!("part cache hit: {key:?}");
            return part.clone();
        }
        log::debug!("rendering shader part: {key:?}");
        let part = ShaderPart {
            key,
            text: Arc::from(render()),
        };
        self.parts.insert(key, part.clone());
        part
    }

    /// The part for `key`, if it has been rendered.
    #[must_use]
    pub fn get(&self, key: SubFeature) -> Option<&ShaderPart> {
        self.parts.get(&key)
    }

    /// Number of distinct sub-features rendered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Drop every cached part (context teardown).
    pub fn clear(&mut self) {
        self.parts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: SubFeature = SubFeature::Mipmap {
        tier: AccuracyTier::Accurate,
    };

    #[test]
    fn miss_renders_once_then_hits() {
        let mut cache = PartCache::new();
        let mut renders = 0;
        let first = cache.get_or_insert_with(KEY, || {
            renders += 1;
            "fn mip_level() {}".to_string()
        });
        let second = cache.get_or_insert_with(KEY, || {
            renders += 1;
            String::from("never rendered")
        });
        assert_eq!(renders, 1);
        assert_eq!(cache.len(), 1);
        assert!(first.shares_text(&second));
        assert_eq!(second.text(), "fn mip_level() {}");
    }

    #[test]
    fn distinct_keys_are_distinct_entries() {
        let mut cache = PartCache::new();
        cache.get_or_insert_with(KEY, || "a".to_string());
        cache.get_or_insert_with(
            SubFeature::Mipmap {
                tier: AccuracyTier::Fast,
            },
            || "b".to_string(),
        );
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = PartCache::new();
        cache.get_or_insert_with(KEY, || "a".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }
}
