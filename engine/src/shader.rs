//! Shader sources and program compilation.

use crate::{gl::GraphicsContext, Error, Result};
use anyhow::Context;
use derive_more::Display;
use std::{
    borrow::Cow,
    env, fmt, io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, BufReader},
};

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../assets/shaders/triangle.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../assets/shaders/triangle.frag");

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum ShaderStage {
    #[display(fmt = "vertex")]
    Vertex,
    #[display(fmt = "fragment")]
    Fragment,
}

/// Where the text of a shader comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ShaderLocation {
    /// Source text compiled into the binary.
    Embedded(Cow<'static, str>),
    /// A file at an absolute path.
    Absolute(PathBuf),
    /// A file relative to the directory of the running executable.
    Relative(PathBuf),
}

impl ShaderLocation {
    /// Locate `filename` inside `directory`, which may be absolute or relative.
    pub fn in_directory(directory: impl AsRef<Path>, filename: impl AsRef<Path>) -> Self {
        let path = directory.as_ref().join(filename);
        if path.is_absolute() {
            Self::Absolute(path)
        } else {
            Self::Relative(path)
        }
    }

    /// The file this location points to, with relative paths joined onto `base`.
    #[must_use]
    pub fn resolve(&self, base: &Path) -> Option<PathBuf> {
        match self {
            Self::Embedded(_) => None,
            Self::Absolute(path) => Some(path.clone()),
            Self::Relative(path) => Some(base.join(path)),
        }
    }

    /// Read the shader text, resolving relative paths against the executable's directory.
    pub async fn read(&self) -> Result<String> {
        match self {
            Self::Relative(_) => self.read_from(&executable_dir()?).await,
            _ => self.read_from(Path::new("")).await,
        }
    }

    /// Read the shader text, resolving relative paths against `base`.
    pub async fn read_from(&self, base: &Path) -> Result<String> {
        match self {
            Self::Embedded(source) => Ok(source.to_string()),
            Self::Absolute(path) if !path.is_absolute() => {
                Err(Error::InvalidShaderPath(path.clone()))
            }
            location => {
                let path = location
                    .resolve(base)
                    .context("shader location has no backing file")?;
                read_source(&path).await
            }
        }
    }
}

impl From<&'static str> for ShaderLocation {
    fn from(source: &'static str) -> Self {
        Self::Embedded(source.into())
    }
}

fn executable_dir() -> Result<PathBuf> {
    let executable = env::current_exe().context("failed to locate current executable")?;
    Ok(executable
        .parent()
        .context("executable has no parent directory")?
        .to_path_buf())
}

async fn read_source(path: &Path) -> Result<String> {
    tracing::debug!("loading shader: {path:?}");
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::ShaderNotFound(path.to_path_buf()));
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to open shader file: {path:?}"))
                .into());
        }
    };
    let mut file = BufReader::new(file);
    let mut source = String::with_capacity(1024);
    file.read_to_string(&mut source)
        .await
        .with_context(|| format!("failed to read shader: {path:?}"))?;
    tracing::debug!("loaded shader successfully: {path:?}");
    Ok(source)
}

#[derive(Clone)]
#[must_use]
pub struct Shader {
    pub(crate) name: Cow<'static, str>,
    pub(crate) stage: ShaderStage,
    pub(crate) source: String,
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("size", &self.source.len())
            .finish_non_exhaustive()
    }
}

impl Shader {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        stage: ShaderStage,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            stage,
            source: source.into(),
        }
    }

    /// The vertex stage shipped with the engine.
    pub fn default_vertex() -> Self {
        Self::new("triangle.vert", ShaderStage::Vertex, DEFAULT_VERTEX_SHADER)
    }

    /// The fragment stage shipped with the engine.
    pub fn default_fragment() -> Self {
        Self::new(
            "triangle.frag",
            ShaderStage::Fragment,
            DEFAULT_FRAGMENT_SHADER,
        )
    }

    pub async fn load(
        name: impl Into<Cow<'static, str>>,
        stage: ShaderStage,
        location: &ShaderLocation,
    ) -> Result<Self> {
        let name = name.into();
        tracing::debug!("loading {stage} shader `{name}`");
        let source = location.read().await?;
        Ok(Self::new(name, stage, source))
    }

    pub async fn vertex(
        name: impl Into<Cow<'static, str>>,
        location: &ShaderLocation,
    ) -> Result<Self> {
        Self::load(name, ShaderStage::Vertex, location).await
    }

    pub async fn fragment(
        name: impl Into<Cow<'static, str>>,
        location: &ShaderLocation,
    ) -> Result<Self> {
        Self::load(name, ShaderStage::Fragment, location).await
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A fully linked program. Only [`ShaderProgramBuilder`] creates one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct ShaderProgram<P> {
    pub(crate) handle: P,
}

impl<P: Copy> ShaderProgram<P> {
    #[inline]
    pub fn handle(&self) -> P {
        self.handle
    }
}

/// Compiles a vertex and fragment stage and links them into a [`ShaderProgram`].
///
/// Intermediate stage objects never outlive a build: they are released whether linking succeeds
/// or fails, and a failed build releases the program object too.
#[derive(Debug)]
#[must_use]
pub struct ShaderProgramBuilder<'a, C> {
    gl: &'a C,
}

impl<'a, C: GraphicsContext> ShaderProgramBuilder<'a, C> {
    pub fn new(gl: &'a C) -> Self {
        Self { gl }
    }

    /// Build from two [`Shader`]s, checking each carries the expected stage.
    pub fn build_from(
        &self,
        vertex: &Shader,
        fragment: &Shader,
    ) -> Result<ShaderProgram<C::Program>> {
        for (shader, expected) in [
            (vertex, ShaderStage::Vertex),
            (fragment, ShaderStage::Fragment),
        ] {
            if shader.stage != expected {
                return Err(Error::ShaderStageMismatch {
                    name: shader.name.to_string(),
                    expected,
                    found: shader.stage,
                });
            }
        }
        tracing::debug!(
            "building shader program from `{}` and `{}`",
            vertex.name,
            fragment.name
        );
        self.build(&vertex.source, &fragment.source)
    }

    pub fn build(
        &self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderProgram<C::Program>> {
        let gl = self.gl;

        let vertex = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile_stage(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(Error::ResourceAllocation {
                    resource: "shader program",
                    reason,
                });
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        let linked = gl.program_link_status(program);

        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        if !linked {
            let log = gl.program_info_log(program);
            gl.delete_program(program);
            tracing::error!("failed to link shader program: {log}");
            return Err(Error::ShaderLink { log });
        }

        tracing::debug!("linked shader program successfully");
        Ok(ShaderProgram { handle: program })
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<C::Shader> {
        let gl = self.gl;
        let shader = gl
            .create_shader(stage)
            .map_err(|reason| Error::ResourceAllocation {
                resource: match stage {
                    ShaderStage::Vertex => "vertex shader",
                    ShaderStage::Fragment => "fragment shader",
                },
                reason,
            })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.shader_compile_status(shader) {
            let log = gl.shader_info_log(shader);
            gl.delete_shader(shader);
            tracing::error!("failed to compile {stage} shader: {log}");
            return Err(Error::ShaderCompile { stage, log });
        }
        Ok(shader)
    }
}
