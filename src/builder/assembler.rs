//! Deterministic source assembly.
//!
//! Concatenates the ordered region texts of one stage into the final source
//! string, inserting the once-per-stage banner. Ordering is derived solely
//! from the builder's fixed skeleton, never from cache insertion order, so
//! the same descriptor always assembles byte-identical text.

use crate::errors::ShaderStage;

/// A freshly assembled vertex/fragment source pair.
///
/// Transient: built per program build, handed to the backend, then
/// discardable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSource {
    pub vertex: String,
    pub fragment: String,
}

impl AssembledSource {
    /// Source text for `stage`.
    #[must_use]
    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// Join `regions` into one stage's source.
pub(crate) fn assemble(stage: ShaderStage, regions: &[&str]) -> String {
    let capacity =
        regions.iter().map(|r| r.len() + 1).sum::<usize>() + 64;
    let mut out = String::with_capacity(capacity);
    out.push_str("// === combiner-forge generated ");
    out.push_str(match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
    });
    out.push_str(" shader ===\n");
    for region in regions {
        out.push('\n');
        out.push_str(region);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_appears_exactly_once() {
        let out = assemble(ShaderStage::Fragment, &["fn a() {}\n", "fn b() {}\n"]);
        assert_eq!(out.matches("// ===").count(), 1);
        assert!(out.starts_with("// === combiner-forge generated fragment shader ===\n"));
    }

    #[test]
    fn concatenation_preserves_region_order() {
        let out = assemble(ShaderStage::Vertex, &["first\n", "second\n"]);
        let first = out.find("first").unwrap();
        let second = out.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn same_input_assembles_identically() {
        let regions = ["fn a() {}\n", "fn b() {}\n"];
        assert_eq!(
            assemble(ShaderStage::Fragment, &regions),
            assemble(ShaderStage::Fragment, &regions)
        );
    }
}
