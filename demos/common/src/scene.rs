//! Scene state owned by the frame loop.
//!
//! All the mutable state a demo needs between two frames (camera, model rotation, shading parameters and mode flags)
//! is grouped in [`SceneState`], which is updated once per frame from the held keys and then turned into the
//! matrices the shaders want ([`Transforms`]).

use cgmath::{perspective, Deg, Matrix as _, Matrix3, Matrix4, Point3, SquareMatrix as _, Vector3, Vector4};

use crate::{
  camera::Camera,
  input::{HeldKeys, Key, Toggle},
  shading::{DiffractionUniforms, ShadingPlacement},
};

pub const MIN_ROUGHNESS: f32 = 1.;
pub const MAX_ROUGHNESS: f32 = 500.;
pub const MIN_SPACING: f32 = 1.;
pub const MAX_SPACING: f32 = 500.;

// roughness and spacing move by this much every frame their key is held
const PARAM_STEP: f32 = 1.;

const CAMERA_FOVY: Deg<f32> = Deg(60.);
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.;

/// Initial scene values, usually coming from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
  pub roughness: f32,
  pub spacing: f32,
  pub highlight_color: [f32; 4],
  pub light_position: [f32; 3],
  pub camera_distance: f32,
  /// Model rotation per frame, in degrees.
  pub rotation_step: f32,
  /// Cube-map folder name, looked up under `cubemaps/`.
  pub cubemap: String,
  /// Help overlay image name.
  pub help_image: String,
}

impl Default for SceneConfig {
  fn default() -> Self {
    SceneConfig {
      roughness: 50.,
      spacing: 10.,
      highlight_color: [1., 1., 1., 1.],
      light_position: [4., 4., 6.],
      camera_distance: 3.,
      rotation_step: 1.,
      cubemap: "Tenerife4".to_owned(),
      help_image: "help.png".to_owned(),
    }
  }
}

/// Parameters of the diffraction shading model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingParams {
  roughness: f32,
  spacing: f32,
  pub highlight_color: Vector4<f32>,
  pub light_position: Vector3<f32>,
}

impl ShadingParams {
  pub fn new(config: &SceneConfig) -> Self {
    let mut params = ShadingParams {
      roughness: config.roughness,
      spacing: config.spacing,
      highlight_color: config.highlight_color.into(),
      light_position: config.light_position.into(),
    };

    params.constrain();
    params
  }

  pub fn roughness(&self) -> f32 {
    self.roughness
  }

  pub fn spacing(&self) -> f32 {
    self.spacing
  }

  /// Apply one frame of held keys. Returns whether a parameter changed.
  pub fn update(&mut self, keys: &HeldKeys) -> bool {
    let before = *self;

    if keys.is_held(Key::R) {
      self.roughness += PARAM_STEP;
    }
    if keys.is_held(Key::F) {
      self.roughness -= PARAM_STEP;
    }
    if keys.is_held(Key::T) {
      self.spacing += PARAM_STEP;
    }
    if keys.is_held(Key::G) {
      self.spacing -= PARAM_STEP;
    }

    self.constrain();

    let changed = *self != before;
    if changed {
      log::debug!("roughness = {}, spacing = {}", self.roughness, self.spacing);
    }

    changed
  }

  fn constrain(&mut self) {
    self.roughness = self.roughness.max(MIN_ROUGHNESS).min(MAX_ROUGHNESS);
    self.spacing = self.spacing.max(MIN_SPACING).min(MAX_SPACING);
  }
}

/// Rotation of the displayed model around the world Y axis.
///
/// The angle advances by a fixed step per frame, not per second: animation speed follows the display refresh rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelState {
  angle: f32,
  step: f32,
}

impl ModelState {
  pub fn new(step: f32) -> Self {
    ModelState { angle: 0., step }
  }

  /// Rotation angle, in degrees. Unbounded; only ever fed to periodic functions.
  pub fn angle(&self) -> f32 {
    self.angle
  }

  pub fn advance(&mut self) {
    self.angle += self.step;
  }

  pub fn model_to_world(&self) -> Matrix4<f32> {
    Matrix4::from_angle_y(Deg(self.angle))
  }
}

/// Which geometry the diffraction demo draws.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Geometry {
  /// CD-like ring, diffraction shaded.
  Ring,
  /// Inline cube, cube-map textured.
  Cube,
}

/// Switches of the diffraction demo, each bound to a key through a [`Toggle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeFlags {
  rotating: Toggle,
  fragment_shading: Toggle,
  cube_geometry: Toggle,
  show_normals: Toggle,
  show_tangents: Toggle,
  show_help: Toggle,
}

impl Default for ModeFlags {
  fn default() -> Self {
    ModeFlags {
      rotating: Toggle::new(true),
      fragment_shading: Toggle::new(false),
      cube_geometry: Toggle::new(false),
      show_normals: Toggle::new(false),
      show_tangents: Toggle::new(false),
      show_help: Toggle::new(true),
    }
  }
}

impl ModeFlags {
  pub const ROTATION_KEY: Key = Key::Space;
  pub const PLACEMENT_KEY: Key = Key::V;
  pub const GEOMETRY_KEY: Key = Key::C;
  pub const NORMALS_KEY: Key = Key::N;
  pub const TANGENTS_KEY: Key = Key::B;
  pub const HELP_KEY: Key = Key::H;

  /// Feed the held keys to every latch.
  pub fn update(&mut self, keys: &HeldKeys) {
    if self.rotating.update(keys.is_held(Self::ROTATION_KEY)) {
      log::info!("rotation {}", on_off(self.rotating()));
    }

    if self.fragment_shading.update(keys.is_held(Self::PLACEMENT_KEY)) {
      log::info!("shading placement: {:?}", self.placement());
    }

    if self.cube_geometry.update(keys.is_held(Self::GEOMETRY_KEY)) {
      log::info!("geometry: {:?}", self.geometry());
    }

    if self.show_normals.update(keys.is_held(Self::NORMALS_KEY)) {
      log::info!("normal visualizer {}", on_off(self.show_normals()));
    }

    if self.show_tangents.update(keys.is_held(Self::TANGENTS_KEY)) {
      log::info!("tangent visualizer {}", on_off(self.show_tangents()));
    }

    if self.show_help.update(keys.is_held(Self::HELP_KEY)) {
      log::info!("help overlay {}", on_off(self.show_help()));
    }
  }

  pub fn rotating(&self) -> bool {
    self.rotating.value()
  }

  pub fn placement(&self) -> ShadingPlacement {
    if self.fragment_shading.value() {
      ShadingPlacement::PerFragment
    } else {
      ShadingPlacement::PerVertex
    }
  }

  pub fn geometry(&self) -> Geometry {
    if self.cube_geometry.value() {
      Geometry::Cube
    } else {
      Geometry::Ring
    }
  }

  pub fn show_normals(&self) -> bool {
    self.show_normals.value()
  }

  pub fn show_tangents(&self) -> bool {
    self.show_tangents.value()
  }

  pub fn show_help(&self) -> bool {
    self.show_help.value()
  }
}

fn on_off(b: bool) -> &'static str {
  if b {
    "on"
  } else {
    "off"
  }
}

/// Everything that changes between two frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneState {
  pub camera: Camera,
  pub model: ModelState,
  pub params: ShadingParams,
  pub flags: ModeFlags,
}

impl SceneState {
  pub fn new(config: &SceneConfig) -> Self {
    SceneState {
      camera: Camera::new(config.camera_distance),
      model: ModelState::new(config.rotation_step),
      params: ShadingParams::new(config),
      flags: ModeFlags::default(),
    }
  }

  /// Run one frame of input handling: camera, parameters, latches, then the model rotation.
  pub fn update(&mut self, keys: &HeldKeys) {
    self.camera.update(keys);
    self.params.update(keys);
    self.flags.update(keys);

    if self.flags.rotating() {
      self.model.advance();
    }
  }

  /// Matrices for the current frame.
  pub fn transforms(&self, projection: &Matrix4<f32>) -> Transforms {
    Transforms::new(
      self.model.model_to_world(),
      self.camera.world_to_camera(),
      *projection,
      self.camera.world_position(),
    )
  }

  /// Uniform values for the diffraction shaders.
  pub fn diffraction_uniforms(&self) -> DiffractionUniforms {
    DiffractionUniforms {
      roughness: self.params.roughness(),
      spacing: self.params.spacing(),
      highlight_color: self.params.highlight_color,
      light_position: self.params.light_position,
      camera_position: self.camera.world_position(),
    }
  }
}

/// Per-frame matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transforms {
  pub model_to_world: Matrix4<f32>,
  pub model_to_projection: Matrix4<f32>,
  /// Upper 3×3 block of the inverse-transpose of `model_to_world`, for normals and tangents.
  pub model_to_world_it: Matrix3<f32>,
  pub camera_position: Point3<f32>,
}

impl Transforms {
  pub fn new(
    model_to_world: Matrix4<f32>,
    world_to_camera: Matrix4<f32>,
    projection: Matrix4<f32>,
    camera_position: Point3<f32>,
  ) -> Self {
    Transforms {
      model_to_world,
      model_to_projection: projection * world_to_camera * model_to_world,
      model_to_world_it: normal_matrix(&model_to_world),
      camera_position,
    }
  }
}

/// Inverse-transpose of the upper 3×3 block of a model matrix.
///
/// Singular matrices yield the identity.
pub fn normal_matrix(model_to_world: &Matrix4<f32>) -> Matrix3<f32> {
  let it = model_to_world
    .invert()
    .map(|inv| inv.transpose())
    .unwrap_or_else(Matrix4::identity);

  Matrix3::from_cols(it.x.truncate(), it.y.truncate(), it.z.truncate())
}

/// Perspective projection for a given aspect ratio.
pub fn projection(aspect_ratio: f32) -> Matrix4<f32> {
  perspective(CAMERA_FOVY, aspect_ratio, Z_NEAR, Z_FAR)
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;
  use cgmath::InnerSpace as _;

  fn held(keys: &[Key]) -> HeldKeys {
    keys.iter().copied().collect()
  }

  #[test]
  fn parameters_stay_in_range() {
    for &value in &[-50., 0., 1., 1.5, 250., 499.5, 500., 501., 1e7] {
      for keys in &[held(&[]), held(&[Key::R, Key::T]), held(&[Key::F, Key::G])] {
        let config = SceneConfig {
          roughness: value,
          spacing: value,
          ..SceneConfig::default()
        };
        let mut params = ShadingParams::new(&config);
        params.roughness = value;
        params.spacing = value;
        params.update(keys);

        assert!(params.roughness() >= MIN_ROUGHNESS && params.roughness() <= MAX_ROUGHNESS);
        assert!(params.spacing() >= MIN_SPACING && params.spacing() <= MAX_SPACING);
      }
    }
  }

  #[test]
  fn parameters_step_by_one_per_frame() {
    let mut params = ShadingParams::new(&SceneConfig::default());

    for _ in 0..3 {
      params.update(&held(&[Key::R, Key::G]));
    }

    assert_eq!(params.roughness(), 53.);
    assert_eq!(params.spacing(), 7.);
  }

  #[test]
  fn rotation_advances_only_while_enabled() {
    let mut scene = SceneState::new(&SceneConfig::default());

    scene.update(&HeldKeys::none());
    scene.update(&HeldKeys::none());
    assert_eq!(scene.model.angle(), 2.);

    // press and hold space: rotation stops on the first frame and stays stopped
    for _ in 0..10 {
      scene.update(&held(&[Key::Space]));
    }
    assert!(!scene.flags.rotating());
    assert_eq!(scene.model.angle(), 2.);

    scene.update(&HeldKeys::none());
    scene.update(&held(&[Key::Space]));
    assert!(scene.flags.rotating());
    assert_eq!(scene.model.angle(), 3.);
  }

  #[test]
  fn held_toggle_keys_flip_each_flag_once() {
    let mut flags = ModeFlags::default();
    let keys = held(&[
      ModeFlags::PLACEMENT_KEY,
      ModeFlags::GEOMETRY_KEY,
      ModeFlags::NORMALS_KEY,
      ModeFlags::TANGENTS_KEY,
      ModeFlags::HELP_KEY,
    ]);

    for _ in 0..7 {
      flags.update(&keys);
    }

    assert_eq!(flags.placement(), ShadingPlacement::PerFragment);
    assert_eq!(flags.geometry(), Geometry::Cube);
    assert!(flags.show_normals());
    assert!(flags.show_tangents());
    assert!(!flags.show_help());
  }

  #[test]
  fn geometry_toggle_preserves_camera_and_parameters() {
    let mut scene = SceneState::new(&SceneConfig::default());

    for _ in 0..5 {
      scene.update(&held(&[Key::W, Key::R, Key::X]));
    }
    scene.update(&HeldKeys::none());

    let before = scene;
    scene.update(&held(&[ModeFlags::GEOMETRY_KEY]));

    assert_eq!(scene.flags.geometry(), Geometry::Cube);
    assert_eq!(scene.camera, before.camera);
    assert_eq!(scene.params, before.params);
    assert_eq!(scene.flags.placement(), before.flags.placement());
  }

  #[test]
  fn normal_matrix_of_rotation_is_the_rotation() {
    let model = Matrix4::from_angle_y(Deg(33.));
    let nm = normal_matrix(&model);

    for c in 0..3 {
      for r in 0..3 {
        assert_abs_diff_eq!(nm[c][r], model[c][r], epsilon = 1e-6);
      }
    }
  }

  #[test]
  fn normal_matrix_keeps_normals_perpendicular_under_non_uniform_scale() {
    let model = Matrix4::from_nonuniform_scale(4., 1., 1.);
    let nm = normal_matrix(&model);

    // a surface sloping along x, and its normal
    let tangent = Vector3::new(1., 1., 0.);
    let normal = Vector3::new(1., -1., 0.);

    let t = (model * tangent.extend(0.)).truncate();
    let n = nm * normal;

    assert_abs_diff_eq!(t.dot(n), 0., epsilon = 1e-6);
  }

  #[test]
  fn singular_model_falls_back_to_identity() {
    let nm = normal_matrix(&Matrix4::from_scale(0.));
    assert_eq!(nm, Matrix3::identity());
  }

  #[test]
  fn transforms_compose_projection_view_model() {
    let scene = SceneState::new(&SceneConfig::default());
    let proj = projection(16. / 9.);
    let t = scene.transforms(&proj);
    let expected = proj * scene.camera.world_to_camera() * scene.model.model_to_world();

    assert_eq!(t.model_to_projection, expected);
    assert_abs_diff_eq!(t.camera_position.z, 3.);
  }
}
