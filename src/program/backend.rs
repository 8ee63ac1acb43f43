//! Program backends.
//!
//! A [`ProgramBackend`] turns an [`AssembledSource`] pair into an executable
//! program object and reports compile/link diagnostics. The builder and the
//! caches never inspect GPU-API compile semantics; they only see this trait.
//!
//! Two implementations ship with the crate: [`NagaBackend`] validates the
//! WGSL synchronously and returns binding metadata without touching a GPU
//! (also the test workhorse), and [`WgpuBackend`] additionally creates
//! `wgpu::ShaderModule`s on its device. wgpu alone reports shader errors
//! through async error scopes, so both paths run naga first to get
//! synchronous, stage-attributed diagnostics.

use std::sync::Arc;

use crate::builder::assembler::AssembledSource;
use crate::errors::{CombinerError, Result, ShaderStage};

/// Entry point name of every generated vertex stage.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point name of every generated fragment stage.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Compiles and links assembled shader sources.
pub trait ProgramBackend {
    /// The executable program object this backend produces.
    type Program;

    /// Compile both stages and link them into a program.
    ///
    /// Failures must be returned, not cached: the program cache treats them
    /// as transient and will retry on the next request for the same
    /// descriptor.
    fn compile_and_link(&mut self, source: &AssembledSource) -> Result<Self::Program>;
}

/// One resource binding referenced by a compiled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub group: u32,
    pub binding: u32,
    pub name: Option<String>,
}

// ─── Naga backend ────────────────────────────────────────────────────────────

/// Validation-only backend: parses and validates the generated WGSL and
/// extracts the binding metadata the renderer needs, without a GPU device.
#[derive(Debug, Default)]
pub struct NagaBackend;

impl NagaBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// A naga-validated program: entry points plus the fragment stage's
/// resource bindings.
#[derive(Debug, Clone)]
pub struct NagaProgram {
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub bindings: Vec<BindingInfo>,
}

impl ProgramBackend for NagaBackend {
    type Program = NagaProgram;

    fn compile_and_link(&mut self, source: &AssembledSource) -> Result<NagaProgram> {
        let vertex = parse_and_validate(ShaderStage::Vertex, &source.vertex)?;
        let fragment = parse_and_validate(ShaderStage::Fragment, &source.fragment)?;
        link_check(&vertex, &fragment)?;
        Ok(NagaProgram {
            vertex_entry: VERTEX_ENTRY,
            fragment_entry: FRAGMENT_ENTRY,
            bindings: collect_bindings(&fragment),
        })
    }
}

fn parse_and_validate(stage: ShaderStage, source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| CombinerError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| CombinerError::Compile {
            stage,
            log: format!("{e:?}"),
        })?;

    Ok(module)
}

fn link_check(vertex: &naga::Module, fragment: &naga::Module) -> Result<()> {
    let has_entry = |module: &naga::Module, stage: naga::ShaderStage, name: &str| {
        module
            .entry_points
            .iter()
            .any(|ep| ep.stage == stage && ep.name == name)
    };
    if !has_entry(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY) {
        return Err(CombinerError::Link {
            log: format!("vertex stage is missing entry point `{VERTEX_ENTRY}`"),
        });
    }
    if !has_entry(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY) {
        return Err(CombinerError::Link {
            log: format!("fragment stage is missing entry point `{FRAGMENT_ENTRY}`"),
        });
    }
    Ok(())
}

fn collect_bindings(module: &naga::Module) -> Vec<BindingInfo> {
    let mut bindings: Vec<BindingInfo> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            var.binding.as_ref().map(|rb| BindingInfo {
                group: rb.group,
                binding: rb.binding,
                name: var.name.clone(),
            })
        })
        .collect();
    bindings.sort_by_key(|b| (b.group, b.binding));
    bindings
}

// ─── wgpu backend ────────────────────────────────────────────────────────────

/// Device-backed backend: naga-validates, then creates shader modules.
///
/// Must only be used from the thread owning the GPU context.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
}

impl WgpuBackend {
    #[must_use]
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

/// A compiled program: one shader module per stage plus the binding
/// metadata needed to build pipeline layouts.
pub struct WgpuProgram {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub bindings: Vec<BindingInfo>,
}

impl ProgramBackend for WgpuBackend {
    type Program = WgpuProgram;

    fn compile_and_link(&mut self, source: &AssembledSource) -> Result<WgpuProgram> {
        let vertex_module = parse_and_validate(ShaderStage::Vertex, &source.vertex)?;
        let fragment_module = parse_and_validate(ShaderStage::Fragment, &source.fragment)?;
        link_check(&vertex_module, &fragment_module)?;

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("combiner vertex"),
                source: wgpu::ShaderSource::Wgsl(source.vertex.as_str().into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("combiner fragment"),
                source: wgpu::ShaderSource::Wgsl(source.fragment.as_str().into()),
            });

        Ok(WgpuProgram {
            vertex,
            fragment,
            vertex_entry: VERTEX_ENTRY,
            fragment_entry: FRAGMENT_ENTRY,
            bindings: collect_bindings(&fragment_module),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_VERTEX: &str = "@vertex\nfn vs_main() -> @builtin(position) vec4<f32> {\n    return vec4<f32>(0.0, 0.0, 0.0, 1.0);\n}\n";
    const VALID_FRAGMENT: &str = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0, 1.0, 1.0, 1.0);\n}\n";

    fn source(vertex: &str, fragment: &str) -> AssembledSource {
        AssembledSource {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        }
    }

    #[test]
    fn valid_pair_links() {
        let program = NagaBackend::new()
            .compile_and_link(&source(VALID_VERTEX, VALID_FRAGMENT))
            .unwrap();
        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.fragment_entry, "fs_main");
    }

    #[test]
    fn parse_error_names_the_stage() {
        let err = NagaBackend::new()
            .compile_and_link(&source(VALID_VERTEX, "fn fs_main( {"))
            .unwrap_err();
        match err {
            CombinerError::Compile { stage, .. } => assert_eq!(stage, ShaderStage::Fragment),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_link_error() {
        let fragment = "@fragment\nfn other_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(0.0, 0.0, 0.0, 0.0);\n}\n";
        let err = NagaBackend::new()
            .compile_and_link(&source(VALID_VERTEX, fragment))
            .unwrap_err();
        assert!(matches!(err, CombinerError::Link { .. }));
    }

    #[test]
    fn bindings_are_collected_sorted() {
        let fragment = "\
@group(1) @binding(2) var tex1: texture_2d<f32>;
@group(0) @binding(0) var<uniform> uc: vec4<f32>;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let dims = textureDimensions(tex1);
    return uc * f32(dims.x);
}
";
        let program = NagaBackend::new()
            .compile_and_link(&source(VALID_VERTEX, fragment))
            .unwrap();
        let pairs: Vec<(u32, u32)> = program
            .bindings
            .iter()
            .map(|b| (b.group, b.binding))
            .collect();
        assert_eq!(pairs, vec![(0, 0), (1, 2)]);
    }
}
