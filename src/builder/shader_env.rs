//! WGSL template environment.
//!
//! Region generators render their text through minijinja templates embedded
//! from `src/builder/shaders/`. The syntax is reconfigured so template
//! markup cannot collide with WGSL braces: `{$ $}` for blocks, `$$` for
//! line statements, `{{ }}` for variables.
//!
//! A missing or malformed template is a programming error, since the chunk
//! set is fixed at compile time, so rendering panics instead of returning an
//! error.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, ErrorKind, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use serde::Serialize;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/builder/shaders"]
struct ShaderChunks;

pub(crate) fn get_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure template syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);

        env.set_loader(chunk_loader);

        env
    })
}

fn chunk_loader(name: &str) -> Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    if let Some(file) = ShaderChunks::get(&filename) {
        return match std::str::from_utf8(file.data.as_ref()) {
            Ok(source) => Ok(Some(source.to_string())),
            Err(e) => Err(Error::new(
                ErrorKind::TemplateNotFound,
                format!("chunk {filename} is not UTF-8: {e}"),
            )),
        };
    }

    Ok(None)
}

/// Render one embedded chunk with the given context.
///
/// # Panics
///
/// Panics if the chunk does not exist or fails to render; both indicate a
/// bug in the generator tables, not a runtime condition.
pub(crate) fn render_chunk<C: Serialize>(name: &str, ctx: &C) -> String {
    let env = get_env();
    let template = env
        .get_template(name)
        .expect("Shader chunk template not found");
    template.render(ctx).expect("Shader chunk render failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Empty {}

    #[test]
    #[should_panic(expected = "Shader chunk template not found")]
    fn unknown_chunk_panics() {
        render_chunk("no_such_chunk", &Empty {});
    }

    #[test]
    fn known_chunks_are_embedded() {
        for name in [
            "vertex.wgsl",
            "globals.wgsl",
            "addressing.wgsl",
            "mipmap_accurate.wgsl",
            "mipmap_fast.wgsl",
            "read_normal_accurate.wgsl",
            "read_normal_fast.wgsl",
            "read_ms_accurate.wgsl",
            "read_ms_fast.wgsl",
            "copy_accurate.wgsl",
            "copy_fast.wgsl",
        ] {
            assert!(ShaderChunks::get(name).is_some(), "missing chunk {name}");
        }
    }
}
