//! Combiner-cycle arithmetic synthesis.
//!
//! The emulated hardware combines color and alpha per pixel as
//! `(a - b) * c + d`, once or twice per pixel depending on the cycle mode,
//! with each operand selected from a closed input set. Unlike the fixed
//! helper regions, the cycle-input product space is large, so this body is
//! synthesized fresh per program instead of going through the part cache.

use std::fmt::Write;

use crate::descriptor::{CombinerCycle, CombinerDescriptor, CombinerInput};

/// Render the `fs_main` entry point for `desc`.
///
/// Copy mode bypasses the combiner entirely and blits the unit-0 read to
/// the output; every other descriptor fetches its texels once, runs the
/// cycle equations, and clamps the result.
pub(crate) fn fragment_main(desc: &CombinerDescriptor) -> String {
    let mut out = String::new();
    out.push_str("@fragment\n");
    out.push_str("fn fs_main(vout: VsOut) -> @location(0) vec4<f32> {\n");

    if desc.is_copy_mode() {
        out.push_str("    return read_copy(vout.uv);\n");
        out.push_str("}\n");
        return out;
    }

    for (index, unit) in desc.units.iter().enumerate() {
        if unit.enabled {
            let _ = writeln!(out, "    let texel{index} = read_tex{index}(vout.uv);");
        }
    }

    out.push_str("    var combined = vec4<f32>(0.0, 0.0, 0.0, 0.0);\n");
    write_cycle(&mut out, 0, desc.color0, desc.alpha0);
    if let (Some(color1), Some(alpha1)) = (desc.color1, desc.alpha1) {
        write_cycle(&mut out, 1, color1, alpha1);
    }

    out.push_str(
        "    return clamp(combined, vec4<f32>(0.0, 0.0, 0.0, 0.0), vec4<f32>(1.0, 1.0, 1.0, 1.0));\n",
    );
    out.push_str("}\n");
    out
}

fn write_cycle(out: &mut String, index: u32, color: CombinerCycle, alpha: CombinerCycle) {
    let _ = writeln!(
        out,
        "    let cyc{index}_rgb = ({} - {}) * {} + {};",
        rgb_expr(color.a),
        rgb_expr(color.b),
        rgb_expr(color.c),
        rgb_expr(color.d),
    );
    let _ = writeln!(
        out,
        "    let cyc{index}_a = ({} - {}) * {} + {};",
        alpha_expr(alpha.a),
        alpha_expr(alpha.b),
        alpha_expr(alpha.c),
        alpha_expr(alpha.d),
    );
    let _ = writeln!(out, "    combined = vec4<f32>(cyc{index}_rgb, cyc{index}_a);");
}

/// Operand as a `vec3<f32>` color expression.
fn rgb_expr(input: CombinerInput) -> &'static str {
    match input {
        CombinerInput::Combined => "combined.rgb",
        CombinerInput::Texel0 => "texel0.rgb",
        CombinerInput::Texel1 => "texel1.rgb",
        CombinerInput::Primitive => "uc.prim_color.rgb",
        CombinerInput::Shade => "vout.shade.rgb",
        CombinerInput::Environment => "uc.env_color.rgb",
        CombinerInput::PrimitiveAlpha => "vec3<f32>(uc.prim_color.a)",
        CombinerInput::ShadeAlpha => "vec3<f32>(vout.shade.a)",
        CombinerInput::EnvironmentAlpha => "vec3<f32>(uc.env_color.a)",
        CombinerInput::LodFraction => "vec3<f32>(uc.lod_frac)",
        CombinerInput::One => "vec3<f32>(1.0)",
        CombinerInput::Zero => "vec3<f32>(0.0)",
    }
}

/// Operand as an `f32` alpha expression. The alpha channel has no separate
/// broadcast inputs; the `*Alpha` selectors collapse onto their sources.
fn alpha_expr(input: CombinerInput) -> &'static str {
    match input {
        CombinerInput::Combined => "combined.a",
        CombinerInput::Texel0 => "texel0.a",
        CombinerInput::Texel1 => "texel1.a",
        CombinerInput::Primitive | CombinerInput::PrimitiveAlpha => "uc.prim_color.a",
        CombinerInput::Shade | CombinerInput::ShadeAlpha => "vout.shade.a",
        CombinerInput::Environment | CombinerInput::EnvironmentAlpha => "uc.env_color.a",
        CombinerInput::LodFraction => "uc.lod_frac",
        CombinerInput::One => "1.0",
        CombinerInput::Zero => "0.0",
    }
}
