//! Window types and the OpenGL window surface.

pub(crate) mod surface;

pub type Window = ::winit::window::Window;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct PhysicalSize<T> {
    pub width: T,
    pub height: T,
}

impl PhysicalSize<u32> {
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero, e.g. when a window is minimized.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for PhysicalSize<u32> {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl From<PhysicalSize<u32>> for winit::dpi::PhysicalSize<u32> {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq)]
#[must_use]
pub struct LogicalPosition<T> {
    pub x: T,
    pub y: T,
}

impl LogicalPosition<f64> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl<T> From<LogicalPosition<T>> for winit::dpi::LogicalPosition<T> {
    fn from(position: LogicalPosition<T>) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}
