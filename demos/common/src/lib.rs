//! Diffraction demos.
//!
//! This crate provides two interactive demos that can be run on any platform exposing an OpenGL 3.3 context through
//! luminance:
//!
//! - `cubemap-viewer`: an environment cube map rendered as a sky around a rotating, reflective cube.
//! - `diffraction-disc`: a CD-like ring showing iridescent diffraction highlights, shaded either per-vertex or
//!   per-fragment, with optional normal / tangent visualizers and a help overlay.
//!
//! # Demo architecture
//!
//! Demos are simple modules exposed from this crate. They do not depend on any platform-specific concepts, such as
//! system events or system window capacities. Whenever a demo requires user interaction, it reads the abstract
//! [`InputAction`] events and the [`HeldKeys`] snapshot handed over by the platform code running it.
//!
//! Demos allocate their luminance resources in [`Example::bootstrap`] and implement their frame logic in
//! [`Example::render_frame`]. Everything that does not touch the GPU (camera, parameters, latches, the diffraction
//! shading model itself) lives in plain modules so that it can be tested without a graphics context.
//!
//! # Error handling
//!
//! Resource creation failures (textures, shader programs, tessellations) are fatal: [`Example::bootstrap`] returns a
//! [`DemoError`] and the platform code is expected to report it and stop. At runtime, the only defensive behavior is
//! parameter clamping.

use luminance_front::{context::GraphicsContext, framebuffer::Framebuffer, texture::Dim2, Backend};
use std::{error::Error, fmt};

pub mod camera;
pub mod cubemap_viewer;
pub mod diffraction_disc;
pub mod geometry;
pub mod input;
pub mod scene;
pub mod shading;
mod shared;

pub use input::{HeldKeys, Key, Toggle};
pub use scene::SceneConfig;

/// Demo interface.
pub trait Example: Sized {
  /// Bootstrap the demo.
  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, DemoError>;

  /// Render a frame of the demo.
  ///
  /// `keys` is the set of keys held down when the frame started.
  fn render_frame(
    self,
    time: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    keys: &HeldKeys,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self>;
}

/// A type used to pass “inputs” to demos.
#[derive(Clone, Debug, PartialEq)]
pub enum InputAction {
  /// Quit the application.
  Quit,

  /// Framebuffer size changed.
  Resized { width: u32, height: u32 },
}

/// What to do after a frame has been rendered.
#[derive(Debug)]
pub enum LoopFeedback<T> {
  Continue(T),
  Exit,
}

/// Services a platform must provide to run the demos.
pub trait PlatformServices {
  type FetchError: 'static + Error;

  /// Fetch an image by name, relative to the platform asset root.
  fn fetch_texture(&mut self, name: impl AsRef<str>) -> Result<&image::RgbImage, Self::FetchError>;

  /// Initial scene values.
  fn scene_config(&self) -> SceneConfig {
    SceneConfig::default()
  }
}

/// What can go wrong while bootstrapping a demo.
#[derive(Debug)]
pub enum DemoError {
  CannotFetchTexture(String, Box<dyn Error>),
  InvalidCubemapFace {
    face: &'static str,
    width: u32,
    height: u32,
    expected: u32,
  },
  CannotCreateTexture(Box<dyn Error>),
  CannotUploadTexture(Box<dyn Error>),
  CannotCreateProgram(&'static str, Box<dyn Error>),
  CannotCreateTess(&'static str, Box<dyn Error>),
}

impl fmt::Display for DemoError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      DemoError::CannotFetchTexture(ref name, ref e) => {
        write!(f, "cannot fetch texture {}: {}", name, e)
      }

      DemoError::InvalidCubemapFace {
        face,
        width,
        height,
        expected,
      } => write!(
        f,
        "invalid cubemap face {}: {}×{} (expected {}×{})",
        face, width, height, expected, expected
      ),

      DemoError::CannotCreateTexture(ref e) => write!(f, "cannot create texture: {}", e),

      DemoError::CannotUploadTexture(ref e) => write!(f, "cannot upload texels: {}", e),

      DemoError::CannotCreateProgram(name, ref e) => {
        write!(f, "cannot create the {} program: {}", name, e)
      }

      DemoError::CannotCreateTess(name, ref e) => {
        write!(f, "cannot create the {} tessellation: {}", name, e)
      }
    }
  }
}

impl Error for DemoError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      DemoError::CannotFetchTexture(_, e)
      | DemoError::CannotCreateTexture(e)
      | DemoError::CannotUploadTexture(e)
      | DemoError::CannotCreateProgram(_, e)
      | DemoError::CannotCreateTess(_, e) => Some(e.as_ref()),
      DemoError::InvalidCubemapFace { .. } => None,
    }
  }
}
