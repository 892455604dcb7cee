#![doc = include_str!("../README.md")]
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    clippy::branches_sharing_code,
    clippy::map_unwrap_or,
    clippy::match_wildcard_for_single_variants,
    // clippy::missing_errors_doc,
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
    // missing_docs,
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

use std::{io, path::PathBuf};

#[macro_use]
pub mod profiling;
pub mod config;
pub mod context;
pub mod core;
pub mod gl;
pub mod mesh;
pub mod render;
pub mod shader;
pub mod window;

pub use shader::ShaderStage;

/// Results that can be returned from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be returned from this crate.
#[allow(variant_size_differences)]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("failed to link shader program: {log}")]
    ShaderLink { log: String },
    #[error("failed to allocate {resource}: {reason}")]
    ResourceAllocation {
        resource: &'static str,
        reason: String,
    },
    #[error("expected a {expected} shader, found `{name}` with stage {found}")]
    ShaderStageMismatch {
        name: String,
        expected: ShaderStage,
        found: ShaderStage,
    },
    #[error("invalid vertex data: expected {expected} floats for {vertex_count} vertices, found {found}")]
    InvalidVertexData {
        vertex_count: usize,
        expected: usize,
        found: usize,
    },
    #[error("shader file not found: {0:?}")]
    ShaderNotFound(PathBuf),
    #[error("shader path is not absolute: {0:?}")]
    InvalidShaderPath(PathBuf),
    #[error("missing required field: `{0}`")]
    UninitializedField(&'static str),
    #[error("renderer error: {0}")]
    Renderer(anyhow::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::UninitializedField(err.field_name())
    }
}

#[macro_export]
macro_rules! render_bail {
    ($msg:literal $(,)?) => {
        return ::std::result::Result::Err(
            $crate::Error::Renderer(::anyhow::anyhow!($msg))
        )
    };
    ($err:expr $(,)?) => {
        return ::std::result::Result::Err(
            $crate::Error::Renderer(::anyhow::anyhow!($err))
        )
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::std::result::Result::Err(
            $crate::Error::Renderer(::anyhow::anyhow!($fmt, $($arg)*))
        )
    };
}

pub mod prelude {
    //! Most commonly used exports for setting up an application.

    pub use crate::{
        config::Config,
        core::{Engine, EngineBuilder},
        gl::{GlContext, GraphicsContext},
        mesh::{Drawable, Mesh, StaticMeshUploader, Vertex, VertexLayout},
        render::{RenderSettings, Renderer, Viewport},
        shader::{Shader, ShaderLocation, ShaderProgram, ShaderProgramBuilder, ShaderStage},
        window::{LogicalPosition, PhysicalSize},
        Error, Result,
    };
}
