//! Platform services implementation.

use crate::CLIOpts;
use diffraction_demos::{PlatformServices, SceneConfig};
use image::ImageError;
use std::{
  collections::{hash_map::Entry, HashMap},
  error::Error,
  fmt,
};

/// Desktop implementation of the [`PlatformServices`] API.
///
/// Images are read from the texture root the first time they are asked for, then cached.
#[derive(Debug)]
pub struct DesktopPlatformServices {
  cli_opts: CLIOpts,
  textures: HashMap<String, image::RgbImage>,
}

impl DesktopPlatformServices {
  pub fn new(cli_opts: CLIOpts) -> Self {
    Self {
      cli_opts,
      textures: HashMap::new(),
    }
  }
}

#[derive(Debug)]
pub enum DesktopFetchError {
  UnknownTexture(String),
  ImageError(ImageError),
}

impl fmt::Display for DesktopFetchError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DesktopFetchError::UnknownTexture(ref name) => write!(f, "unknown texture to load: {}", name),
      DesktopFetchError::ImageError(ref e) => write!(f, "cannot fetch texture: {}", e),
    }
  }
}

impl Error for DesktopFetchError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      DesktopFetchError::UnknownTexture(_) => None,
      DesktopFetchError::ImageError(e) => Some(e),
    }
  }
}

impl From<ImageError> for DesktopFetchError {
  fn from(source: ImageError) -> Self {
    Self::ImageError(source)
  }
}

impl PlatformServices for DesktopPlatformServices {
  type FetchError = DesktopFetchError;

  fn fetch_texture(&mut self, name: impl AsRef<str>) -> Result<&image::RgbImage, Self::FetchError> {
    let name = name.as_ref();

    match self.textures.entry(name.to_owned()) {
      Entry::Occupied(entry) => Ok(entry.into_mut()),

      Entry::Vacant(entry) => {
        let path = self.cli_opts.textures.join(name);

        if !path.is_file() {
          return Err(DesktopFetchError::UnknownTexture(path.display().to_string()));
        }

        log::info!("loading {}", path.display());
        let texture = image::open(&path)?.to_rgb8();

        Ok(entry.insert(texture))
      }
    }
  }

  fn scene_config(&self) -> SceneConfig {
    let defaults = SceneConfig::default();

    SceneConfig {
      roughness: self.cli_opts.roughness.unwrap_or(defaults.roughness),
      spacing: self.cli_opts.spacing.unwrap_or(defaults.spacing),
      rotation_step: self.cli_opts.rotation_step.unwrap_or(defaults.rotation_step),
      cubemap: self.cli_opts.cubemap.clone(),
      help_image: self.cli_opts.help_image.clone(),
      ..defaults
    }
  }
}
