//! Diffraction shading model.
//!
//! A surface with regularly spaced micro-grooves (a CD, a vinyl, brushed metal…) shows two effects:
//!
//! - an anisotropic highlight, driven by how the groove tangent lines up with the half-vector;
//! - diffraction bands: colors produced by light interfering on the regular groove spacing, approximated by a
//!   harmonic sum of triangular color-blend functions.
//!
//! The GPU evaluates this model in one of two placements: once per vertex (the color is then interpolated by the
//! rasterizer) or once per fragment (position, normal and tangent are interpolated, then shaded). Both placements
//! implement [`ShadingStrategy`], which exposes their GLSL sources and a CPU evaluation of what a sample inside a
//! triangle ends up looking like. The CPU code mirrors `diffraction.glsl` operation for operation, in `f32`.
//!
//! Nothing guards the `w = N·H` division: when the half-vector is tangent to the surface, the highlight exponent is
//! infinite (or NaN) and so is the output. That saturates on the GPU instead of crashing and is kept as is.

use cgmath::{EuclideanSpace as _, InnerSpace as _, Point3, Vector3, Vector4, Zero as _};

/// Number of diffraction orders summed (`n = 1..=7`).
pub const DIFFRACTION_ORDERS: u32 = 7;

// Sources of the two programs. The shading model itself is shared and prepended to the stage evaluating it.
const PER_VERTEX_VS: &str = concat!(
  include_str!("diffraction.glsl"),
  include_str!("diffraction-per-vertex-vs.glsl")
);
const PER_VERTEX_FS: &str = include_str!("diffraction-per-vertex-fs.glsl");
const PER_FRAGMENT_VS: &str = include_str!("diffraction-per-fragment-vs.glsl");
const PER_FRAGMENT_FS: &str = concat!(
  include_str!("diffraction.glsl"),
  include_str!("diffraction-per-fragment-fs.glsl")
);

/// Uniform values shared by every sample of a draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffractionUniforms {
  pub roughness: f32,
  pub spacing: f32,
  pub highlight_color: Vector4<f32>,
  pub light_position: Vector3<f32>,
  pub camera_position: Point3<f32>,
}

/// World-space surface attributes at a vertex or fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
  pub position: Vector3<f32>,
  pub normal: Vector3<f32>,
  pub tangent: Vector3<f32>,
}

impl SurfaceSample {
  /// Linear interpolation across a triangle, as the rasterizer does it. Vectors are not renormalized.
  pub fn interpolate(corners: &[SurfaceSample; 3], barycentric: [f32; 3]) -> Self {
    let [a, b, c] = barycentric;

    SurfaceSample {
      position: corners[0].position * a + corners[1].position * b + corners[2].position * c,
      normal: corners[0].normal * a + corners[1].normal * b + corners[2].normal * c,
      tangent: corners[0].tangent * a + corners[1].tangent * b + corners[2].tangent * c,
    }
  }
}

/// `max(1 − x², 0)` per component.
pub fn blend3(x: Vector3<f32>) -> Vector3<f32> {
  Vector3::new(
    (1. - x.x * x.x).max(0.),
    (1. - x.y * x.y).max(0.),
    (1. - x.z * x.z).max(0.),
  )
}

/// Shading model once the half-vector is known.
///
/// `h` is the unnormalized half-vector `L + V`. The result has alpha 1.
pub fn highlight_color(
  tangent: Vector3<f32>,
  normal: Vector3<f32>,
  h: Vector3<f32>,
  roughness: f32,
  spacing: f32,
  tint: Vector4<f32>,
) -> Vector4<f32> {
  let u = tangent.dot(h) * spacing;
  let w = normal.dot(h);
  let e = roughness * u / w;
  let anis = tint.truncate() * (-e * e).exp();

  let u = u.abs();
  let bands = (1..=DIFFRACTION_ORDERS).fold(Vector3::zero(), |acc, n| {
    let y = 2. * u / n as f32 - 1.;
    acc + blend3(Vector3::new(4. * (y - 0.75), 4. * (y - 0.5), 4. * (y - 0.25)))
  });

  (bands + anis).extend(1.)
}

/// Full shading model for one sample: derive L, V and H, then evaluate [`highlight_color`].
pub fn diffraction_color(sample: &SurfaceSample, uniforms: &DiffractionUniforms) -> Vector4<f32> {
  let p = sample.position;
  let l = (uniforms.light_position - p).normalize();
  let v = (uniforms.camera_position.to_vec() - p).normalize();

  highlight_color(
    sample.tangent,
    sample.normal,
    l + v,
    uniforms.roughness,
    uniforms.spacing,
    uniforms.highlight_color,
  )
}

/// GLSL sources of a program.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShaderSources {
  pub vertex: &'static str,
  pub fragment: &'static str,
}

/// Where the diffraction model is evaluated.
///
/// Both strategies consume the same attributes (position, normal, tangent) and the same uniforms, so they are
/// interchangeable at runtime without touching the geometry.
pub trait ShadingStrategy {
  fn name(&self) -> &'static str;

  fn sources(&self) -> ShaderSources;

  /// Color of the sample at `barycentric` coordinates inside the triangle formed by `corners`.
  fn shade(
    &self,
    corners: &[SurfaceSample; 3],
    barycentric: [f32; 3],
    uniforms: &DiffractionUniforms,
  ) -> Vector4<f32>;
}

/// Shade the corners, let the rasterizer interpolate colors. Cheap; facets on coarse meshes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerVertex;

impl ShadingStrategy for PerVertex {
  fn name(&self) -> &'static str {
    "per-vertex"
  }

  fn sources(&self) -> ShaderSources {
    ShaderSources {
      vertex: PER_VERTEX_VS,
      fragment: PER_VERTEX_FS,
    }
  }

  fn shade(
    &self,
    corners: &[SurfaceSample; 3],
    barycentric: [f32; 3],
    uniforms: &DiffractionUniforms,
  ) -> Vector4<f32> {
    corners
      .iter()
      .zip(barycentric.iter())
      .fold(Vector4::zero(), |acc, (corner, &weight)| {
        acc + diffraction_color(corner, uniforms) * weight
      })
  }
}

/// Interpolate the surface, shade every covered pixel. Independent of the tessellation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerFragment;

impl ShadingStrategy for PerFragment {
  fn name(&self) -> &'static str {
    "per-fragment"
  }

  fn sources(&self) -> ShaderSources {
    ShaderSources {
      vertex: PER_FRAGMENT_VS,
      fragment: PER_FRAGMENT_FS,
    }
  }

  fn shade(
    &self,
    corners: &[SurfaceSample; 3],
    barycentric: [f32; 3],
    uniforms: &DiffractionUniforms,
  ) -> Vector4<f32> {
    diffraction_color(&SurfaceSample::interpolate(corners, barycentric), uniforms)
  }
}

/// Runtime selector between the two strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShadingPlacement {
  PerVertex,
  PerFragment,
}

impl ShadingPlacement {
  pub const ALL: [ShadingPlacement; 2] = [ShadingPlacement::PerVertex, ShadingPlacement::PerFragment];

  pub fn strategy(self) -> &'static dyn ShadingStrategy {
    match self {
      ShadingPlacement::PerVertex => &PerVertex,
      ShadingPlacement::PerFragment => &PerFragment,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  const DIFFRACTION_GLSL: &str = include_str!("diffraction.glsl");

  fn assert_rgba(c: Vector4<f32>, expected: [f32; 4]) {
    assert_abs_diff_eq!(c.x, expected[0], epsilon = 1e-4);
    assert_abs_diff_eq!(c.y, expected[1], epsilon = 1e-4);
    assert_abs_diff_eq!(c.z, expected[2], epsilon = 1e-4);
    assert_abs_diff_eq!(c.w, expected[3], epsilon = 1e-4);
  }

  fn uniforms() -> DiffractionUniforms {
    DiffractionUniforms {
      roughness: 50.,
      spacing: 10.,
      highlight_color: Vector4::new(1., 1., 1., 1.),
      light_position: Vector3::new(4., 4., 6.),
      camera_position: Point3::new(0., 0., 3.),
    }
  }

  fn triangle() -> [SurfaceSample; 3] {
    let normal = Vector3::unit_z();

    [
      SurfaceSample {
        position: Vector3::new(-1., 0., 0.),
        normal,
        tangent: Vector3::unit_x(),
      },
      SurfaceSample {
        position: Vector3::new(1., 0., 0.),
        normal,
        tangent: Vector3::unit_y(),
      },
      SurfaceSample {
        position: Vector3::new(0., 1., 0.),
        normal,
        tangent: -Vector3::unit_x(),
      },
    ]
  }

  #[test]
  fn blend3_is_a_clamped_parabola() {
    let b = blend3(Vector3::new(0., 0.5, -3.));

    assert_eq!(b, Vector3::new(1., 0.75, 0.));
  }

  #[test]
  fn steep_highlight_underflows_and_high_orders_vanish() {
    // u = 1 · 10, w = 2, e = 50 · 10 / 2 = 250
    let c = highlight_color(
      Vector3::unit_x(),
      Vector3::unit_z(),
      Vector3::new(1., 0., 2.),
      50.,
      10.,
      Vector4::new(1., 1., 1., 1.),
    );

    // exp(-62500) is exactly 0 in f32 and u = 10 is past every band
    assert_eq!(c, Vector4::new(0., 0., 0., 1.));
  }

  #[test]
  fn first_order_band() {
    // u = 0.8: only n = 1 contributes, y = 0.6
    let c = highlight_color(
      Vector3::unit_x(),
      Vector3::unit_z(),
      Vector3::new(0.08, 0., 2.),
      50.,
      10.,
      Vector4::new(1., 1., 1., 1.),
    );

    assert_rgba(c, [0.64, 0.84, 0., 1.]);
  }

  #[test]
  fn several_orders_accumulate() {
    // u = 3: n = 4 lands on green, n = 5 on blue
    let c = highlight_color(
      Vector3::unit_x(),
      Vector3::unit_z(),
      Vector3::new(0.3, 0., 2.),
      50.,
      10.,
      Vector4::new(1., 1., 1., 1.),
    );

    assert_rgba(c, [0., 1., 0.96, 1.]);
  }

  #[test]
  fn tangent_across_half_vector_gives_the_tint() {
    // u = 0 so e = 0: full highlight, no band
    let c = highlight_color(
      Vector3::unit_x(),
      Vector3::unit_z(),
      Vector3::new(0., 0., 2.),
      50.,
      10.,
      Vector4::new(0.2, 0.4, 0.6, 0.5),
    );

    assert_rgba(c, [0.2, 0.4, 0.6, 1.]);
  }

  #[test]
  fn band_sign_is_folded() {
    let tint = Vector4::new(1., 1., 1., 1.);
    let pos = highlight_color(Vector3::unit_x(), Vector3::unit_z(), Vector3::new(0.3, 0., 2.), 50., 10., tint);
    let neg = highlight_color(Vector3::unit_x(), Vector3::unit_z(), Vector3::new(-0.3, 0., 2.), 50., 10., tint);

    assert_eq!(pos, neg);
  }

  #[test]
  fn grazing_half_vector_does_not_panic() {
    let tint = Vector4::new(1., 1., 1., 1.);

    // w = 0, u ≠ 0: e is infinite, the highlight vanishes
    let c = highlight_color(Vector3::unit_x(), Vector3::unit_z(), Vector3::new(0.3, 0., 0.), 50., 10., tint);
    assert_rgba(c, [0., 1., 0.96, 1.]);

    // w = 0, u = 0: 0 / 0
    let c = highlight_color(Vector3::unit_x(), Vector3::unit_z(), Vector3::new(0., 1., 0.), 50., 10., tint);
    assert!(c.x.is_nan());
    assert_eq!(c.w, 1.);
  }

  #[test]
  fn shading_is_pure() {
    let u = uniforms();

    for corner in &triangle() {
      let a = diffraction_color(corner, &u);
      let b = diffraction_color(corner, &u);

      for i in 0..4 {
        assert_eq!(a[i].to_bits(), b[i].to_bits());
      }
    }
  }

  #[test]
  fn diffraction_color_uses_light_and_camera() {
    let sample = SurfaceSample {
      position: Vector3::zero(),
      normal: Vector3::unit_z(),
      tangent: Vector3::unit_x(),
    };
    let u = DiffractionUniforms {
      light_position: Vector3::new(0., 0., 5.),
      camera_position: Point3::new(0., 0., 3.),
      ..uniforms()
    };

    // L = V = +Z, H = (0, 0, 2): tangent is across H
    assert_rgba(diffraction_color(&sample, &u), [1., 1., 1., 1.]);
  }

  #[test]
  fn placements_agree_on_vertices() {
    let corners = triangle();
    let u = uniforms();

    for (i, corner) in corners.iter().enumerate() {
      let mut bary = [0.; 3];
      bary[i] = 1.;

      let expected = diffraction_color(corner, &u);
      for placement in &ShadingPlacement::ALL {
        assert_eq!(placement.strategy().shade(&corners, bary, &u), expected);
      }
    }
  }

  #[test]
  fn placements_differ_inside_triangles() {
    let corners = triangle();
    let u = uniforms();
    let centroid = [1. / 3.; 3];

    let per_vertex = PerVertex.shade(&corners, centroid, &u);
    let per_fragment = PerFragment.shade(&corners, centroid, &u);
    let diff = (0..3)
      .map(|i| (per_vertex[i] - per_fragment[i]).abs())
      .fold(0., f32::max);

    assert!(diff > 0.1, "diff = {}", diff);
  }

  #[test]
  fn interpolation_is_linear() {
    let s = SurfaceSample::interpolate(&triangle(), [0.5, 0.5, 0.]);

    assert_eq!(s.position, Vector3::new(0., 0., 0.));
    assert_eq!(s.tangent, Vector3::new(0.5, 0.5, 0.));
  }

  #[test]
  fn strategies_share_the_uniform_interface() {
    for placement in &ShadingPlacement::ALL {
      let strategy = placement.strategy();
      let ShaderSources { vertex, fragment } = strategy.sources();
      let both = format!("{}\n{}", vertex, fragment);

      for name in &[
        "model_to_projection",
        "model_to_world",
        "model_to_world_it",
        "roughness",
        "spacing",
        "highlight_color",
        "light_position",
        "camera_position",
      ] {
        assert!(both.contains(name), "{} misses {}", strategy.name(), name);
      }

      assert!(both.contains("diffraction_color("));
    }
  }

  #[test]
  fn glsl_model_matches_the_cpu_reference() {
    let orders = format!("for (int i = 1; i < {}; ++i)", DIFFRACTION_ORDERS + 1);
    assert!(DIFFRACTION_GLSL.contains(&orders), "order loop out of sync with DIFFRACTION_ORDERS");

    for line in &[
      "return max(vec3(1.) - x * x, vec3(0.));",
      "vec3 h = l + v;",
      "float u = dot(t, h) * spacing;",
      "float w = dot(n, h);",
      "float e = roughness * u / w;",
      "vec3 anis = highlight_color.rgb * exp(-e * e);",
      "u = abs(u);",
      "float y = 2. * u / float(i) - 1.;",
      "bands += blend3(vec3(4. * (y - 0.75), 4. * (y - 0.5), 4. * (y - 0.25)));",
      "return vec4(bands + anis, 1.);",
    ] {
      assert!(DIFFRACTION_GLSL.contains(line), "diffraction.glsl lost `{}`", line);
    }
  }
}
