#![doc = include_str!("../README.md")]
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    clippy::branches_sharing_code,
    clippy::map_unwrap_or,
    clippy::match_wildcard_for_single_variants,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::needless_for_each,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::unreadable_literal,
    clippy::unwrap_used,
    clippy::expect_used,
    deprecated_in_future,
    ellipsis_inclusive_range_patterns,
    future_incompatible,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2018_idioms,
    rust_2021_compatibility,
    rustdoc::bare_urls,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::private_intra_doc_links,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused,
    variant_size_differences
)]

use anyhow::{Context, Result};
use trigon_engine::prelude::*;

mod trace;

/// Load the shader pair from `SHADER_DIR` if set, otherwise use the embedded defaults.
async fn load_shaders(config: &Config) -> Result<(Shader, Shader)> {
    let Some(dir) = config.shader_directory() else {
        return Ok((Shader::default_vertex(), Shader::default_fragment()));
    };
    tracing::info!("loading shaders from {dir:?}");
    let vertex = Shader::vertex(
        "triangle.vert",
        &ShaderLocation::in_directory(dir, "triangle.vert"),
    )
    .await
    .context("failed to load vertex shader")?;
    let fragment = Shader::fragment(
        "triangle.frag",
        &ShaderLocation::in_directory(dir, "triangle.frag"),
    )
    .await
    .context("failed to load fragment shader")?;
    Ok((vertex, fragment))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = trace::initialize();

    let config = Config::default();
    tracing::debug!("{config:?}");
    let (vertex_shader, fragment_shader) = load_shaders(&config).await?;

    let engine = Engine::builder()
        .title("Trigon")
        .config(config)
        .vertex_shader(vertex_shader)
        .fragment_shader(fragment_shader)
        .build()?;

    if let Err(err) = engine.run() {
        tracing::error!("failed to start: {err}");
        return Err(err.into());
    }
    Ok(())
}
