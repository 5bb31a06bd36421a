use luminance::UniformInterface;
use luminance_front::{
  context::GraphicsContext,
  pipeline::TextureBinding,
  pixel::{NormRGB8UI, NormUnsigned},
  shader::{
    types::{Mat33, Mat44},
    Program, Uniform,
  },
  texture::{CubeFace, Cubemap, Dim2, MagFilter, MinFilter, Sampler, TexelUpload, Texture, Wrap},
  Backend,
};

use crate::{geometry::Semantics, DemoError, PlatformServices};

const SKY_VS: &str = include_str!("sky-vs.glsl");
const SKY_FS: &str = include_str!("sky-fs.glsl");
const REFLECTION_VS: &str = include_str!("reflection-vs.glsl");
const REFLECTION_FS: &str = include_str!("reflection-fs.glsl");

/// Shader interface of the sky.
#[derive(UniformInterface)]
pub struct SkyInterface {
  /// Projection × rotation-only view.
  #[uniform(unbound)]
  pub model_to_projection: Uniform<Mat44<f32>>,
  #[uniform(unbound)]
  pub sky: Uniform<TextureBinding<Cubemap, NormUnsigned>>,
}

/// Shader interface of the cube-map textured cube.
#[derive(UniformInterface)]
pub struct ReflectionInterface {
  #[uniform(unbound)]
  pub model_to_projection: Uniform<Mat44<f32>>,
  #[uniform(unbound)]
  pub model_to_world_it: Uniform<Mat33<f32>>,
  #[uniform(unbound)]
  pub environment: Uniform<TextureBinding<Cubemap, NormUnsigned>>,
}

pub fn new_sky_program(
  context: &mut impl GraphicsContext<Backend = Backend>,
) -> Result<Program<Semantics, (), SkyInterface>, DemoError> {
  Ok(
    context
      .new_shader_program::<Semantics, (), SkyInterface>()
      .from_strings(SKY_VS, None, None, SKY_FS)
      .map_err(|e| DemoError::CannotCreateProgram("sky", Box::new(e)))?
      .ignore_warnings(),
  )
}

pub fn new_reflection_program(
  context: &mut impl GraphicsContext<Backend = Backend>,
) -> Result<Program<Semantics, (), ReflectionInterface>, DemoError> {
  Ok(
    context
      .new_shader_program::<Semantics, (), ReflectionInterface>()
      .from_strings(REFLECTION_VS, None, None, REFLECTION_FS)
      .map_err(|e| DemoError::CannotCreateProgram("reflection", Box::new(e)))?
      .ignore_warnings(),
  )
}

/// RGB texture.
pub type RGBTexture = Texture<Dim2, NormRGB8UI>;

/// RGB cube map.
pub type RGBCubemap = Texture<Cubemap, NormRGB8UI>;

// mipmaps generated for cube maps
const CUBEMAP_MIPMAPS: usize = 2;

/// Face files of a cube-map folder, in upload order.
pub const CUBEMAP_FACES: [(&str, CubeFace); 6] = [
  ("posx", CubeFace::PositiveX),
  ("negx", CubeFace::NegativeX),
  ("posy", CubeFace::PositiveY),
  ("negy", CubeFace::NegativeY),
  ("posz", CubeFace::PositiveZ),
  ("negz", CubeFace::NegativeZ),
];

/// Name of a cube-map face image, relative to the asset root.
pub fn cubemap_face_path(cubemap: &str, face: &str) -> String {
  format!("cubemaps/{}/{}.jpg", cubemap, face)
}

/// Faces must be square and all of the same size.
pub fn check_cubemap_face(face: &'static str, [width, height]: [u32; 2], expected: u32) -> Result<(), DemoError> {
  if width == expected && height == expected {
    Ok(())
  } else {
    Err(DemoError::InvalidCubemapFace {
      face,
      width,
      height,
      expected,
    })
  }
}

/// Load the six faces of a cube map and upload them.
///
/// The size of the first face sets the size of the cube map.
pub fn load_cubemap(
  context: &mut impl GraphicsContext<Backend = Backend>,
  platform: &mut impl PlatformServices,
  name: &str,
) -> Result<RGBCubemap, DemoError> {
  let (first_face, _) = CUBEMAP_FACES[0];
  let size = fetch(platform, &cubemap_face_path(name, first_face))?.width();

  let sampler = Sampler {
    wrap_r: Wrap::ClampToEdge,
    wrap_s: Wrap::ClampToEdge,
    wrap_t: Wrap::ClampToEdge,
    ..Sampler::default()
  };

  let mut texture = context
    .new_texture(
      size,
      sampler,
      TexelUpload::reserve(CUBEMAP_MIPMAPS),
    )
    .map_err(|e| DemoError::CannotCreateTexture(Box::new(e)))?;

  for &(face_name, face) in &CUBEMAP_FACES {
    let img = fetch(platform, &cubemap_face_path(name, face_name))?;
    check_cubemap_face(face_name, [img.width(), img.height()], size)?;

    log::info!("uploading the {} face of {}", face_name, name);
    texture
      .upload_part_raw(
        ([0, 0], face),
        size,
        TexelUpload::base_level(img.as_raw().as_slice(), CUBEMAP_MIPMAPS),
      )
      .map_err(|e| DemoError::CannotUploadTexture(Box::new(e)))?;
  }

  Ok(texture)
}

/// Load a 2D texture, flipped so that the first image row ends up at the top of the screen.
pub fn load_texture(
  context: &mut impl GraphicsContext<Backend = Backend>,
  platform: &mut impl PlatformServices,
  name: &str,
) -> Result<(RGBTexture, [u32; 2]), DemoError> {
  let img = image::imageops::flip_vertical(fetch(platform, name)?);
  let (width, height) = img.dimensions();

  let sampler = Sampler {
    wrap_s: Wrap::ClampToEdge,
    wrap_t: Wrap::ClampToEdge,
    min_filter: MinFilter::Linear,
    mag_filter: MagFilter::Linear,
    ..Sampler::default()
  };

  let texture = context
    .new_texture_raw(
      [width, height],
      sampler,
      TexelUpload::base_level(img.as_raw().as_slice(), 0),
    )
    .map_err(|e| DemoError::CannotCreateTexture(Box::new(e)))?;

  Ok((texture, [width, height]))
}

fn fetch<'a, P>(platform: &'a mut P, name: &str) -> Result<&'a image::RgbImage, DemoError>
where
  P: PlatformServices,
{
  platform
    .fetch_texture(name)
    .map_err(|e| DemoError::CannotFetchTexture(name.to_owned(), Box::new(e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn face_paths() {
    let paths: Vec<_> = CUBEMAP_FACES
      .iter()
      .map(|(face, _)| cubemap_face_path("Tenerife4", face))
      .collect();

    assert_eq!(paths[0], "cubemaps/Tenerife4/posx.jpg");
    assert_eq!(paths[5], "cubemaps/Tenerife4/negz.jpg");
  }

  #[test]
  fn square_faces_of_the_expected_size_pass() {
    assert!(check_cubemap_face("posx", [512, 512], 512).is_ok());
  }

  #[test]
  fn mismatched_faces_are_rejected() {
    for &dims in &[[512, 256], [256, 256], [512, 513]] {
      match check_cubemap_face("negy", dims, 512) {
        Err(DemoError::InvalidCubemapFace {
          face,
          width,
          height,
          expected,
        }) => {
          assert_eq!(face, "negy");
          assert_eq!([width, height], dims);
          assert_eq!(expected, 512);
        }

        other => panic!("unexpected result: {:?}", other),
      }
    }
  }
}
