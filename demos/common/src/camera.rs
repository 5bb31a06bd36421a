//! Orbit camera driven by held keys.
//!
//! The camera is described in an orbit frame: `position` is a pan offset on x / y plus the distance to the origin on
//! z, and the frame itself is rotated by yaw (around world Y) then pitch (around the rotated X axis).
//!
//! Camera-to-world is thus `Ry(yaw) · Rx(pitch) · T(position)`.

use cgmath::{Deg, Matrix4, Point3, Transform as _, Vector3};

use crate::input::{HeldKeys, Key};

/// Closest the camera can get to the origin.
pub const MIN_DISTANCE: f32 = 2.;
/// Farthest the camera can get from the origin.
pub const MAX_DISTANCE: f32 = 200.;
/// Pitch is clamped to ±this value, in degrees.
pub const MAX_PITCH_DEG: f32 = 60.;

// angular step applied every frame a rotation key is held
const ROTATION_STEP_DEG: f32 = 1.;
// pan and zoom steps are a fraction of the current distance so that moving around feels the same close and far
const PAN_RATE: f32 = 0.01;
const ZOOM_RATE: f32 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
  position: Vector3<f32>,
  pitch: f32,
  yaw: f32,
}

impl Camera {
  /// Camera looking at the origin from `distance` on the Z axis.
  pub fn new(distance: f32) -> Self {
    let mut camera = Camera {
      position: Vector3::new(0., 0., distance),
      pitch: 0.,
      yaw: 0.,
    };

    camera.constrain();
    camera
  }

  pub fn position(&self) -> Vector3<f32> {
    self.position
  }

  pub fn distance(&self) -> f32 {
    self.position.z
  }

  /// Pitch, in degrees.
  pub fn pitch(&self) -> f32 {
    self.pitch
  }

  /// Yaw, in degrees, always in `[0, 360)`.
  pub fn yaw(&self) -> f32 {
    self.yaw
  }

  /// Apply one frame of held keys, then re-establish the invariants. Returns whether anything moved.
  pub fn update(&mut self, keys: &HeldKeys) -> bool {
    let before = *self;
    let pan = PAN_RATE * self.position.z;
    let zoom = ZOOM_RATE * self.position.z;

    if keys.is_held(Key::J) {
      self.position.x -= pan;
    }
    if keys.is_held(Key::L) {
      self.position.x += pan;
    }
    if keys.is_held(Key::I) {
      self.position.y += pan;
    }
    if keys.is_held(Key::K) {
      self.position.y -= pan;
    }
    if keys.is_held(Key::Z) {
      self.position.z -= zoom;
    }
    if keys.is_held(Key::X) {
      self.position.z += zoom;
    }

    if keys.is_held(Key::W) {
      self.pitch += ROTATION_STEP_DEG;
    }
    if keys.is_held(Key::S) {
      self.pitch -= ROTATION_STEP_DEG;
    }
    if keys.is_held(Key::A) {
      self.yaw -= ROTATION_STEP_DEG;
    }
    if keys.is_held(Key::D) {
      self.yaw += ROTATION_STEP_DEG;
    }

    self.constrain();
    *self != before
  }

  fn constrain(&mut self) {
    self.position.z = self.position.z.max(MIN_DISTANCE).min(MAX_DISTANCE);
    self.pitch = self.pitch.max(-MAX_PITCH_DEG).min(MAX_PITCH_DEG);
    self.yaw = wrap_degrees(self.yaw);
  }

  fn rotation(&self) -> Matrix4<f32> {
    Matrix4::from_angle_y(Deg(self.yaw)) * Matrix4::from_angle_x(Deg(self.pitch))
  }

  pub fn camera_to_world(&self) -> Matrix4<f32> {
    self.rotation() * Matrix4::from_translation(self.position)
  }

  pub fn world_to_camera(&self) -> Matrix4<f32> {
    Matrix4::from_translation(-self.position)
      * Matrix4::from_angle_x(Deg(-self.pitch))
      * Matrix4::from_angle_y(Deg(-self.yaw))
  }

  /// View matrix for the sky: camera orientation only, no translation, so the background never parallaxes.
  pub fn sky_view(&self) -> Matrix4<f32> {
    Matrix4::from_angle_x(Deg(-self.pitch)) * Matrix4::from_angle_y(Deg(-self.yaw))
  }

  /// Camera position in world space.
  pub fn world_position(&self) -> Point3<f32> {
    self.camera_to_world().transform_point(Point3::new(0., 0., 0.))
  }
}

impl Default for Camera {
  fn default() -> Self {
    Camera::new(3.)
  }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(deg: f32) -> f32 {
  let wrapped = deg.rem_euclid(360.);

  // rem_euclid rounds tiny negative inputs up to exactly 360
  if wrapped >= 360. {
    0.
  } else {
    wrapped
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;
  use cgmath::SquareMatrix as _;

  fn all_keys() -> HeldKeys {
    Key::ALL.iter().copied().collect()
  }

  #[test]
  fn distance_stays_in_range() {
    for &z in &[-1000., 0., 1.9, 2., 3., 150., 200., 201., 1e9] {
      for keys in &[HeldKeys::none(), HeldKeys::none().with(Key::Z), HeldKeys::none().with(Key::X)] {
        let mut camera = Camera::default();
        camera.position.z = z;
        camera.update(keys);

        assert!(camera.distance() >= MIN_DISTANCE && camera.distance() <= MAX_DISTANCE, "z = {}", z);
      }
    }
  }

  #[test]
  fn pitch_stays_in_range_and_yaw_wraps() {
    for &angle in &[-1e6, -721., -360., -60.5, -1e-7, 0., 59.5, 60., 359.99, 360., 725., 1e6] {
      for keys in &[
        HeldKeys::none(),
        HeldKeys::none().with(Key::W).with(Key::D),
        HeldKeys::none().with(Key::S).with(Key::A),
      ] {
        let mut camera = Camera::default();
        camera.pitch = angle;
        camera.yaw = angle;
        camera.update(keys);

        assert!(camera.pitch() >= -MAX_PITCH_DEG && camera.pitch() <= MAX_PITCH_DEG);
        assert!(camera.yaw() >= 0. && camera.yaw() < 360., "yaw = {}", camera.yaw());
      }
    }
  }

  #[test]
  fn wrap_degrees_handles_rounding() {
    assert_eq!(wrap_degrees(-1e-7), 0.);
    assert_eq!(wrap_degrees(360.), 0.);
    assert_abs_diff_eq!(wrap_degrees(-90.), 270.);
    assert_abs_diff_eq!(wrap_degrees(450.), 90.);
  }

  #[test]
  fn pan_is_proportional_to_distance() {
    let mut near = Camera::new(2.);
    let mut far = Camera::new(100.);
    let keys = HeldKeys::none().with(Key::L);

    near.update(&keys);
    far.update(&keys);

    assert_abs_diff_eq!(near.position().x, 0.02, epsilon = 1e-6);
    assert_abs_diff_eq!(far.position().x, 1., epsilon = 1e-5);
  }

  #[test]
  fn update_reports_motion() {
    let mut camera = Camera::default();

    assert!(!camera.update(&HeldKeys::none()));
    assert!(camera.update(&HeldKeys::none().with(Key::W)));
    assert!(!camera.update(&HeldKeys::none().with(Key::R)));
  }

  #[test]
  fn opposite_keys_cancel_out() {
    let mut camera = Camera::default();
    let before = camera;

    camera.update(&all_keys());

    assert_abs_diff_eq!(camera.pitch(), before.pitch());
    assert_abs_diff_eq!(camera.yaw(), before.yaw());
    assert_abs_diff_eq!(camera.position().x, before.position().x, epsilon = 1e-6);
  }

  #[test]
  fn world_to_camera_inverts_camera_to_world() {
    let mut camera = Camera::new(5.);
    camera.pitch = 25.;
    camera.yaw = 140.;
    camera.position.x = 0.3;

    let product = camera.camera_to_world() * camera.world_to_camera();
    let identity = Matrix4::<f32>::identity();

    for c in 0..4 {
      for r in 0..4 {
        assert_abs_diff_eq!(product[c][r], identity[c][r], epsilon = 1e-5);
      }
    }
  }

  #[test]
  fn default_camera_sits_on_the_z_axis() {
    let p = Camera::default().world_position();

    assert_abs_diff_eq!(p.x, 0.);
    assert_abs_diff_eq!(p.y, 0.);
    assert_abs_diff_eq!(p.z, 3.);
  }

  #[test]
  fn sky_view_has_no_translation() {
    for &(x, y, z) in &[(0., 0., 2.), (10., -4., 50.), (-3., 7., 200.)] {
      let mut camera = Camera::new(z);
      camera.position.x = x;
      camera.position.y = y;
      camera.pitch = -35.;
      camera.yaw = 210.;

      let view = camera.sky_view();

      assert_eq!(view.w.x, 0.);
      assert_eq!(view.w.y, 0.);
      assert_eq!(view.w.z, 0.);
      assert_eq!(view.w.w, 1.);
    }
  }
}
