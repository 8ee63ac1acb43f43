//! Descriptor-keyed program cache with source-level deduplication.
//!
//! The cache guarantees at most one backend build per distinct descriptor.
//! Two maps front a dense program store: a descriptor map for the hot
//! per-draw lookup, and a source-hash map that catches distinct descriptors
//! whose generated text collapses to the same program (a multisampled unit
//! ignores the mipmap mode, for example) so the duplicate is never compiled.
//!
//! Failed builds insert nothing. The failing descriptor stays absent from
//! both maps and a later request retries from scratch, so a transient
//! compile failure cannot poison the cache.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::builder::CombinerProgramBuilder;
use crate::builder::part::PartCache;
use crate::descriptor::CombinerDescriptor;
use crate::errors::Result;

use super::backend::ProgramBackend;

/// Stable handle to one cached program.
///
/// Valid until [`ProgramCache::clear`]; copy it freely instead of holding a
/// borrow of the program across cache mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

impl ProgramId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lazily populated cache of compiled combiner programs.
pub struct ProgramCache<P> {
    programs: Vec<P>,
    by_descriptor: FxHashMap<CombinerDescriptor, ProgramId>,
    by_source: FxHashMap<u128, ProgramId>,
}

impl<P> Default for ProgramCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ProgramCache<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            by_descriptor: FxHashMap::default(),
            by_source: FxHashMap::default(),
        }
    }

    /// The program for `desc`, building it on first use.
    ///
    /// Fast path is a single descriptor-map lookup. On a miss the builder
    /// assembles the source; if an existing program has byte-identical text
    /// the descriptor is aliased to it, otherwise the backend compiles and
    /// the result is stored. On `Err` the cache is left exactly as it was.
    pub fn get_or_build<B>(
        &mut self,
        desc: &CombinerDescriptor,
        builder: &CombinerProgramBuilder,
        parts: &mut PartCache,
        backend: &mut B,
    ) -> Result<ProgramId>
    where
        B: ProgramBackend<Program = P>,
    {
        if let Some(&id) = self.by_descriptor.get(desc) {
            log::trace!("program cache hit: {desc:?}");
            return Ok(id);
        }

        let source = builder.build_source(desc, parts);
        let hash = source_hash(&source.vertex, &source.fragment);
        if let Some(&id) = self.by_source.get(&hash) {
            log::debug!("program source dedup: {desc:?} aliases {id:?}");
            self.by_descriptor.insert(desc.clone(), id);
            return Ok(id);
        }

        log::debug!("compiling combiner program: {desc:?}");
        let program = backend.compile_and_link(&source)?;
        let id = ProgramId(u32::try_from(self.programs.len()).unwrap_or(u32::MAX));
        self.programs.push(program);
        self.by_descriptor.insert(desc.clone(), id);
        self.by_source.insert(hash, id);
        Ok(id)
    }

    /// The cached program behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different cache or outlived a
    /// [`clear`](Self::clear).
    #[must_use]
    pub fn program(&self, id: ProgramId) -> &P {
        &self.programs[id.index()]
    }

    /// Number of compiled programs (descriptor aliases excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Number of descriptors mapped so far, aliases included.
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.by_descriptor.len()
    }

    /// Drop every program and invalidate all outstanding ids.
    pub fn clear(&mut self) {
        self.programs.clear();
        self.by_descriptor.clear();
        self.by_source.clear();
    }
}

fn source_hash(vertex: &str, fragment: &str) -> u128 {
    let mut hasher = Xxh3::new();
    hasher.update(vertex.as_bytes());
    hasher.update(&[0]);
    hasher.update(fragment.as_bytes());
    hasher.digest128()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::assembler::AssembledSource;
    use crate::descriptor::{
        AccuracyTier, CombinerCycle, CombinerInput, MipmapMode, ReadEngine, TextureUnitState,
        WrapMode,
    };
    use crate::errors::CombinerError;

    /// Backend that counts builds and can be told to fail.
    struct CountingBackend {
        compiles: usize,
        fail_next: bool,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                compiles: 0,
                fail_next: false,
            }
        }
    }

    impl ProgramBackend for CountingBackend {
        type Program = usize;

        fn compile_and_link(&mut self, _source: &AssembledSource) -> Result<usize> {
            if self.fail_next {
                self.fail_next = false;
                return Err(CombinerError::Link {
                    log: "synthetic failure".to_string(),
                });
            }
            self.compiles += 1;
            Ok(self.compiles)
        }
    }

    fn textured_desc(tier: AccuracyTier) -> CombinerDescriptor {
        let mut desc = CombinerDescriptor::new(
            tier,
            CombinerCycle::passthrough(CombinerInput::Texel0),
            CombinerCycle::passthrough(CombinerInput::Texel0),
        );
        desc.units[0] = TextureUnitState::normal(WrapMode::Wrap, WrapMode::Clamp);
        desc
    }

    #[test]
    fn repeated_descriptor_builds_once() {
        let mut cache = ProgramCache::new();
        let builder = CombinerProgramBuilder::new();
        let mut parts = PartCache::new();
        let mut backend = CountingBackend::new();
        let desc = textured_desc(AccuracyTier::Accurate);

        let first = cache
            .get_or_build(&desc, &builder, &mut parts, &mut backend)
            .unwrap();
        let second = cache
            .get_or_build(&desc, &builder, &mut parts, &mut backend)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.compiles, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_descriptors_get_distinct_programs() {
        let mut cache = ProgramCache::new();
        let builder = CombinerProgramBuilder::new();
        let mut parts = PartCache::new();
        let mut backend = CountingBackend::new();

        let accurate = cache
            .get_or_build(
                &textured_desc(AccuracyTier::Accurate),
                &builder,
                &mut parts,
                &mut backend,
            )
            .unwrap();
        let fast = cache
            .get_or_build(
                &textured_desc(AccuracyTier::Fast),
                &builder,
                &mut parts,
                &mut backend,
            )
            .unwrap();
        assert_ne!(accurate, fast);
        assert_eq!(backend.compiles, 2);
    }

    #[test]
    fn identical_source_is_deduplicated() {
        // A multisampled unit carries no mip chain, so these two
        // descriptors assemble byte-identical text.
        let mut base = textured_desc(AccuracyTier::Accurate);
        base.units[0].engine = ReadEngine::Multisampled;
        let mut nearest = base.clone();
        nearest.mipmap = MipmapMode::Nearest;

        let mut cache = ProgramCache::new();
        let builder = CombinerProgramBuilder::new();
        let mut parts = PartCache::new();
        let mut backend = CountingBackend::new();

        let a = cache
            .get_or_build(&base, &builder, &mut parts, &mut backend)
            .unwrap();
        let b = cache
            .get_or_build(&nearest, &builder, &mut parts, &mut backend)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.compiles, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.descriptor_count(), 2);
    }

    #[test]
    fn failed_build_inserts_nothing_and_retries() {
        let mut cache = ProgramCache::new();
        let builder = CombinerProgramBuilder::new();
        let mut parts = PartCache::new();
        let mut backend = CountingBackend::new();
        let desc = textured_desc(AccuracyTier::Fast);

        backend.fail_next = true;
        let err = cache.get_or_build(&desc, &builder, &mut parts, &mut backend);
        assert!(err.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.descriptor_count(), 0);

        let id = cache
            .get_or_build(&desc, &builder, &mut parts, &mut backend)
            .unwrap();
        assert_eq!(backend.compiles, 1);
        assert_eq!(*cache.program(id), 1);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut cache = ProgramCache::new();
        let builder = CombinerProgramBuilder::new();
        let mut parts = PartCache::new();
        let mut backend = CountingBackend::new();
        cache
            .get_or_build(
                &textured_desc(AccuracyTier::Accurate),
                &builder,
                &mut parts,
                &mut backend,
            )
            .unwrap();

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.descriptor_count(), 0);
    }
}
