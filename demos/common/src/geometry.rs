//! Geometry used by the demos.
//!
//! Everything here is plain CPU data, uploaded later as luminance tessellations.

use luminance::{Semantics, Vertex};
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Semantics)]
pub enum Semantics {
  // reference vertex positions with the position variable in vertex shaders
  #[sem(name = "position", repr = "[f32; 3]", wrapper = "VertexPosition")]
  Position,
  // reference vertex normals with the normal variable in vertex shaders
  #[sem(name = "normal", repr = "[f32; 3]", wrapper = "VertexNormal")]
  Normal,
  // reference vertex tangents with the tangent variable in vertex shaders
  #[sem(name = "tangent", repr = "[f32; 3]", wrapper = "VertexTangent")]
  Tangent,
}

/// Position, normal and tangent, interleaved (9 floats).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct SurfaceVertex {
  pub pos: VertexPosition,
  pub nor: VertexNormal,
  pub tan: VertexTangent,
}

/// Position only (3 floats).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Vertex)]
#[vertex(sem = "Semantics")]
pub struct PositionVertex {
  pub pos: VertexPosition,
}

pub type VertexIndex = u32;

/// Index restarting a strip / fan.
pub const PRIMITIVE_RESTART: VertexIndex = VertexIndex::MAX;

/// Indexed mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh<V> {
  pub vertices: Vec<V>,
  pub indices: Vec<VertexIndex>,
}

/// Flat ring in the XY plane, facing +Z, like a CD.
///
/// `segments` vertices around each of the `rings + 1` circles, between `inner_radius` and `outer_radius`. Tangents
/// follow the circles, which is the direction of the grooves. The result is an indexed triangle list.
pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32, rings: u32) -> Mesh<SurfaceVertex> {
  let segments = segments.max(3);
  let rings = rings.max(1);

  let mut vertices = Vec::with_capacity(((rings + 1) * segments) as usize);
  for r in 0..=rings {
    let radius = inner_radius + (outer_radius - inner_radius) * r as f32 / rings as f32;

    for s in 0..segments {
      let theta = 2. * PI * s as f32 / segments as f32;
      let (sin, cos) = theta.sin_cos();

      vertices.push(SurfaceVertex::new(
        VertexPosition::new([radius * cos, radius * sin, 0.]),
        VertexNormal::new([0., 0., 1.]),
        VertexTangent::new([-sin, cos, 0.]),
      ));
    }
  }

  let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
  for r in 0..rings {
    for s in 0..segments {
      let next = (s + 1) % segments;
      let a = r * segments + s;
      let b = r * segments + next;
      let c = (r + 1) * segments + s;
      let d = (r + 1) * segments + next;

      indices.extend_from_slice(&[a, d, b, a, c, d]);
    }
  }

  Mesh { vertices, indices }
}

// normal and tangent of every cube face; the bitangent is normal × tangent so that corners listed as
// (-1, -1), (1, -1), (1, 1), (-1, 1) in (tangent, bitangent) coordinates wind counter-clockwise seen from outside
const CUBE_FACES: [([f32; 3], [f32; 3]); 6] = [
  ([1., 0., 0.], [0., 0., -1.]),
  ([-1., 0., 0.], [0., 0., 1.]),
  ([0., 1., 0.], [1., 0., 0.]),
  ([0., -1., 0.], [1., 0., 0.]),
  ([0., 0., 1.], [1., 0., 0.]),
  ([0., 0., -1.], [-1., 0., 0.]),
];

const FACE_CORNERS: [[f32; 2]; 4] = [[-1., -1.], [1., -1.], [1., 1.], [-1., 1.]];

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
  [
    a[1] * b[2] - a[2] * b[1],
    a[2] * b[0] - a[0] * b[2],
    a[0] * b[1] - a[1] * b[0],
  ]
}

fn face_corner(size: f32, n: [f32; 3], t: [f32; 3], corner: [f32; 2]) -> [f32; 3] {
  let b = cross(n, t);
  let s = size * 0.5;
  let [x, y] = corner;

  [
    s * (n[0] + x * t[0] + y * b[0]),
    s * (n[1] + x * t[1] + y * b[1]),
    s * (n[2] + x * t[2] + y * b[2]),
  ]
}

// one fan per face, separated by primitive restarts
fn cube_fan_indices() -> Vec<VertexIndex> {
  (0..6)
    .flat_map(|face| {
      let first = face * 4;
      vec![first, first + 1, first + 2, first + 3, PRIMITIVE_RESTART]
    })
    .collect()
}

/// Cube of given edge size: 24 vertices, 4 per face, each face drawn as a triangle fan.
pub fn cube(size: f32) -> Mesh<SurfaceVertex> {
  let vertices = CUBE_FACES
    .iter()
    .flat_map(|&(n, t)| {
      FACE_CORNERS.iter().map(move |&corner| {
        SurfaceVertex::new(
          VertexPosition::new(face_corner(size, n, t, corner)),
          VertexNormal::new(n),
          VertexTangent::new(t),
        )
      })
    })
    .collect();

  Mesh {
    vertices,
    indices: cube_fan_indices(),
  }
}

/// Unit sky cube (corners at ±1): 24 positions, same fan layout as [`cube`].
pub fn sky_cube() -> Mesh<PositionVertex> {
  let vertices = CUBE_FACES
    .iter()
    .flat_map(|&(n, t)| {
      FACE_CORNERS
        .iter()
        .map(move |&corner| PositionVertex::new(VertexPosition::new(face_corner(2., n, t, corner))))
    })
    .collect();

  Mesh {
    vertices,
    indices: cube_fan_indices(),
  }
}

/// Which per-vertex vector to visualize.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LineAttribute {
  Normal,
  Tangent,
}

/// Line list with one segment per vertex, from the vertex along its normal or tangent.
pub fn attribute_lines(vertices: &[SurfaceVertex], attribute: LineAttribute, length: f32) -> Vec<PositionVertex> {
  vertices
    .iter()
    .flat_map(|v| {
      let p = *v.pos;
      let d = match attribute {
        LineAttribute::Normal => *v.nor,
        LineAttribute::Tangent => *v.tan,
      };
      let q = [p[0] + length * d[0], p[1] + length * d[1], p[2] + length * d[2]];

      vec![
        PositionVertex::new(VertexPosition::new(p)),
        PositionVertex::new(VertexPosition::new(q)),
      ]
    })
    .collect()
}

/// Rectangle, in normalized device coordinates, showing an image at its pixel size in the top-left corner of the
/// framebuffer, `margin` pixels away from the edges.
///
/// Returned as `[x_min, y_min, x_max, y_max]`.
pub fn overlay_rect(framebuffer: [u32; 2], image: [u32; 2], margin: u32) -> [f32; 4] {
  let [fw, fh] = [framebuffer[0].max(1) as f32, framebuffer[1].max(1) as f32];
  let [iw, ih] = [image[0] as f32, image[1] as f32];
  let margin = margin as f32;

  let x_min = -1. + 2. * margin / fw;
  let y_max = 1. - 2. * margin / fh;

  [x_min, y_max - 2. * ih / fh, x_min + 2. * iw / fw, y_max]
}
