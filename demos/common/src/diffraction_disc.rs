//! A CD-like ring showing diffraction highlights over a cube-map sky.
//!
//! The ring is shaded with the diffraction model of [`crate::shading`], evaluated either per-vertex or per-fragment.
//! The geometry can be swapped for a cube textured with the sky, and the normals / tangents of the displayed geometry
//! can be drawn as line segments. A help image is overlaid in the top-left corner.
//!
//! Held keys:
//!
//! - <W>, <S>: pitch; <A>, <D>: yaw.
//! - <J>, <L>, <I>, <K>: pan; <Z>, <X>: move closer / farther.
//! - <R>, <F>: roughness up / down; <T>, <G>: spacing up / down.
//!
//! Toggles: <space> rotation, <V> per-vertex / per-fragment, <C> ring / cube, <N> normals, <B> tangents, <H> help.
//!
//! Press <escape> to quit or close the window.

use cgmath::Matrix4;
use luminance::UniformInterface;
use luminance_front::{
  context::GraphicsContext,
  depth_stencil::Write,
  framebuffer::Framebuffer,
  pipeline::{PipelineError, PipelineState, TextureBinding},
  pixel::NormUnsigned,
  render_state::RenderState,
  shader::{
    types::{Mat33, Mat44, Vec3, Vec4},
    Program, Uniform,
  },
  tess::{Mode, Tess},
  texture::Dim2,
  Backend,
};

use crate::{
  cubemap_viewer::CLEAR_COLOR,
  geometry::{
    self, LineAttribute, PositionVertex, Semantics, SurfaceVertex, VertexIndex, PRIMITIVE_RESTART,
  },
  input::HeldKeys,
  scene::{projection, Geometry, SceneState},
  shading::ShadingPlacement,
  shared::{self, RGBCubemap, RGBTexture, ReflectionInterface, SkyInterface},
  DemoError, Example, InputAction, LoopFeedback, PlatformServices,
};

const RING_INNER_RADIUS: f32 = 0.15;
const RING_OUTER_RADIUS: f32 = 1.;
const RING_SEGMENTS: u32 = 128;
const RING_RINGS: u32 = 8;
const CUBE_SIZE: f32 = 1.;

const LINE_LENGTH: f32 = 0.1;
const NORMAL_COLOR: [f32; 3] = [1., 1., 0.];
const TANGENT_COLOR: [f32; 3] = [1., 0., 1.];

// distance, in pixels, between the help image and the window borders
const OVERLAY_MARGIN: u32 = 10;

const LINES_VS: &str = include_str!("lines-vs.glsl");
const LINES_FS: &str = include_str!("lines-fs.glsl");
const OVERLAY_VS: &str = include_str!("overlay-vs.glsl");
const OVERLAY_FS: &str = include_str!("overlay-fs.glsl");

/// Shader interface shared by the per-vertex and per-fragment programs.
#[derive(UniformInterface)]
struct DiffractionInterface {
  #[uniform(unbound)]
  model_to_projection: Uniform<Mat44<f32>>,
  #[uniform(unbound)]
  model_to_world: Uniform<Mat44<f32>>,
  #[uniform(unbound)]
  model_to_world_it: Uniform<Mat33<f32>>,
  #[uniform(unbound)]
  roughness: Uniform<f32>,
  #[uniform(unbound)]
  spacing: Uniform<f32>,
  #[uniform(unbound)]
  highlight_color: Uniform<Vec4<f32>>,
  #[uniform(unbound)]
  light_position: Uniform<Vec3<f32>>,
  #[uniform(unbound)]
  camera_position: Uniform<Vec3<f32>>,
}

#[derive(UniformInterface)]
struct LinesInterface {
  #[uniform(unbound)]
  model_to_projection: Uniform<Mat44<f32>>,
  #[uniform(unbound)]
  color: Uniform<Vec3<f32>>,
}

#[derive(UniformInterface)]
struct OverlayInterface {
  #[uniform(unbound)]
  rect: Uniform<Vec4<f32>>,
  #[uniform(unbound)]
  overlay: Uniform<TextureBinding<Dim2, NormUnsigned>>,
}

type DiffractionProgram = Program<Semantics, (), DiffractionInterface>;

// normal and tangent segments of one geometry
struct AttributeLines {
  normals: Tess<PositionVertex>,
  tangents: Tess<PositionVertex>,
}

impl AttributeLines {
  fn new(
    context: &mut impl GraphicsContext<Backend = Backend>,
    vertices: &[SurfaceVertex],
  ) -> Result<Self, DemoError> {
    let normals = context
      .new_tess()
      .set_vertices(geometry::attribute_lines(vertices, LineAttribute::Normal, LINE_LENGTH))
      .set_mode(Mode::Line)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("normal lines", Box::new(e)))?;

    let tangents = context
      .new_tess()
      .set_vertices(geometry::attribute_lines(vertices, LineAttribute::Tangent, LINE_LENGTH))
      .set_mode(Mode::Line)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("tangent lines", Box::new(e)))?;

    Ok(AttributeLines { normals, tangents })
  }
}

fn new_diffraction_program(
  context: &mut impl GraphicsContext<Backend = Backend>,
  placement: ShadingPlacement,
) -> Result<DiffractionProgram, DemoError> {
  let strategy = placement.strategy();
  let sources = strategy.sources();

  log::info!("compiling the {} diffraction program", strategy.name());

  Ok(
    context
      .new_shader_program::<Semantics, (), DiffractionInterface>()
      .from_strings(sources.vertex, None, None, sources.fragment)
      .map_err(|e| DemoError::CannotCreateProgram(strategy.name(), Box::new(e)))?
      .ignore_warnings(),
  )
}

pub struct LocalExample {
  scene: SceneState,
  projection: Matrix4<f32>,
  framebuffer_size: [u32; 2],
  sky: RGBCubemap,
  help: RGBTexture,
  help_size: [u32; 2],
  sky_program: Program<Semantics, (), SkyInterface>,
  reflection_program: Program<Semantics, (), ReflectionInterface>,
  per_vertex_program: DiffractionProgram,
  per_fragment_program: DiffractionProgram,
  lines_program: Program<Semantics, (), LinesInterface>,
  overlay_program: Program<(), (), OverlayInterface>,
  sky_cube: Tess<PositionVertex, VertexIndex>,
  ring: Tess<SurfaceVertex, VertexIndex>,
  cube: Tess<SurfaceVertex, VertexIndex>,
  ring_lines: AttributeLines,
  cube_lines: AttributeLines,
  overlay_quad: Tess<()>,
}

impl Example for LocalExample {
  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, DemoError> {
    let config = platform.scene_config();
    let scene = SceneState::new(&config);

    let sky = shared::load_cubemap(context, platform, &config.cubemap)?;
    let (help, help_size) = shared::load_texture(context, platform, &config.help_image)?;

    let sky_program = shared::new_sky_program(context)?;
    let reflection_program = shared::new_reflection_program(context)?;
    let per_vertex_program = new_diffraction_program(context, ShadingPlacement::PerVertex)?;
    let per_fragment_program = new_diffraction_program(context, ShadingPlacement::PerFragment)?;

    let lines_program = context
      .new_shader_program::<Semantics, (), LinesInterface>()
      .from_strings(LINES_VS, None, None, LINES_FS)
      .map_err(|e| DemoError::CannotCreateProgram("lines", Box::new(e)))?
      .ignore_warnings();

    // the overlay quad is spawned by the vertex shader
    let overlay_program = context
      .new_shader_program::<(), (), OverlayInterface>()
      .from_strings(OVERLAY_VS, None, None, OVERLAY_FS)
      .map_err(|e| DemoError::CannotCreateProgram("overlay", Box::new(e)))?
      .ignore_warnings();

    let sky_mesh = geometry::sky_cube();
    let sky_cube = context
      .new_tess()
      .set_vertices(sky_mesh.vertices)
      .set_indices(sky_mesh.indices)
      .set_mode(Mode::TriangleFan)
      .set_primitive_restart_index(PRIMITIVE_RESTART)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("sky cube", Box::new(e)))?;

    let ring_mesh = geometry::ring(RING_INNER_RADIUS, RING_OUTER_RADIUS, RING_SEGMENTS, RING_RINGS);
    let ring_lines = AttributeLines::new(context, &ring_mesh.vertices)?;
    log::info!(
      "ring: {} vertices, {} triangles",
      ring_mesh.vertices.len(),
      ring_mesh.indices.len() / 3
    );

    let ring = context
      .new_tess()
      .set_vertices(ring_mesh.vertices)
      .set_indices(ring_mesh.indices)
      .set_mode(Mode::Triangle)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("ring", Box::new(e)))?;

    let cube_mesh = geometry::cube(CUBE_SIZE);
    let cube_lines = AttributeLines::new(context, &cube_mesh.vertices)?;
    let cube = context
      .new_tess()
      .set_vertices(cube_mesh.vertices)
      .set_indices(cube_mesh.indices)
      .set_mode(Mode::TriangleFan)
      .set_primitive_restart_index(PRIMITIVE_RESTART)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("cube", Box::new(e)))?;

    let overlay_quad = context
      .new_tess()
      .set_render_vertex_nb(4)
      .set_mode(Mode::TriangleFan)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("overlay", Box::new(e)))?;

    Ok(LocalExample {
      scene,
      projection: projection(1.),
      framebuffer_size: [1, 1],
      sky,
      help,
      help_size,
      sky_program,
      reflection_program,
      per_vertex_program,
      per_fragment_program,
      lines_program,
      overlay_program,
      sky_cube,
      ring,
      cube,
      ring_lines,
      cube_lines,
      overlay_quad,
    })
  }

  fn render_frame(
    mut self,
    _: f32,
    back_buffer: Framebuffer<Dim2, (), ()>,
    actions: impl Iterator<Item = InputAction>,
    keys: &HeldKeys,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> LoopFeedback<Self> {
    for action in actions {
      match action {
        InputAction::Quit => return LoopFeedback::Exit,

        InputAction::Resized { width, height } => {
          log::debug!("resized: {}×{}", width, height);
          self.framebuffer_size = [width, height];
          self.projection = projection(width as f32 / height.max(1) as f32);
        }
      }
    }

    self.scene.update(keys);

    let flags = self.scene.flags;
    let transforms = self.scene.transforms(&self.projection);
    let uniforms = self.scene.diffraction_uniforms();
    let sky_projection = Mat44::new(self.projection * self.scene.camera.sky_view());
    let [x_min, y_min, x_max, y_max] = geometry::overlay_rect(self.framebuffer_size, self.help_size, OVERLAY_MARGIN);

    let sky = &mut self.sky;
    let help = &mut self.help;
    let sky_program = &mut self.sky_program;
    let reflection_program = &mut self.reflection_program;
    let diffraction_program = match flags.placement() {
      ShadingPlacement::PerVertex => &mut self.per_vertex_program,
      ShadingPlacement::PerFragment => &mut self.per_fragment_program,
    };
    let lines_program = &mut self.lines_program;
    let overlay_program = &mut self.overlay_program;
    let sky_cube = &self.sky_cube;
    let ring = &self.ring;
    let cube = &self.cube;
    let lines = match flags.geometry() {
      Geometry::Ring => &self.ring_lines,
      Geometry::Cube => &self.cube_lines,
    };
    let overlay_quad = &self.overlay_quad;

    // sky, then opaque geometry, then the overlay on top of everything
    let background_st = RenderState::default()
      .set_depth_test(None)
      .set_depth_write(Write::Off);
    let opaque_st = RenderState::default();

    let render = context
      .new_pipeline_gate()
      .pipeline(
        &back_buffer,
        &PipelineState::default().set_clear_color(CLEAR_COLOR),
        |pipeline, mut shd_gate| -> Result<(), PipelineError> {
          let environment = pipeline.bind_texture(sky)?;

          shd_gate.shade(sky_program, |mut iface, unis, mut rdr_gate| -> Result<(), PipelineError> {
            iface.set(&unis.model_to_projection, sky_projection);
            iface.set(&unis.sky, environment.binding());

            rdr_gate.render(&background_st, |mut tess_gate| tess_gate.render(sky_cube))
          })?;

          match flags.geometry() {
            Geometry::Ring => {
              shd_gate.shade(diffraction_program, |mut iface, unis, mut rdr_gate| -> Result<(), PipelineError> {
                iface.set(&unis.model_to_projection, Mat44::new(transforms.model_to_projection));
                iface.set(&unis.model_to_world, Mat44::new(transforms.model_to_world));
                iface.set(&unis.model_to_world_it, Mat33::new(transforms.model_to_world_it));
                iface.set(&unis.roughness, uniforms.roughness);
                iface.set(&unis.spacing, uniforms.spacing);

                let c = uniforms.highlight_color;
                iface.set(&unis.highlight_color, Vec4::new(c.x, c.y, c.z, c.w));
                let l = uniforms.light_position;
                iface.set(&unis.light_position, Vec3::new(l.x, l.y, l.z));
                let p = uniforms.camera_position;
                iface.set(&unis.camera_position, Vec3::new(p.x, p.y, p.z));

                rdr_gate.render(&opaque_st, |mut tess_gate| tess_gate.render(ring))
              })?;
            }

            Geometry::Cube => {
              shd_gate.shade(reflection_program, |mut iface, unis, mut rdr_gate| -> Result<(), PipelineError> {
                iface.set(&unis.model_to_projection, Mat44::new(transforms.model_to_projection));
                iface.set(&unis.model_to_world_it, Mat33::new(transforms.model_to_world_it));
                iface.set(&unis.environment, environment.binding());

                rdr_gate.render(&opaque_st, |mut tess_gate| tess_gate.render(cube))
              })?;
            }
          }

          if flags.show_normals() || flags.show_tangents() {
            shd_gate.shade(lines_program, |mut iface, unis, mut rdr_gate| -> Result<(), PipelineError> {
              iface.set(&unis.model_to_projection, Mat44::new(transforms.model_to_projection));

              if flags.show_normals() {
                iface.set(&unis.color, Vec3::new(NORMAL_COLOR[0], NORMAL_COLOR[1], NORMAL_COLOR[2]));
                rdr_gate.render(&opaque_st, |mut tess_gate| -> Result<(), PipelineError> {
                  tess_gate.render(&lines.normals)
                })?;
              }

              if flags.show_tangents() {
                iface.set(&unis.color, Vec3::new(TANGENT_COLOR[0], TANGENT_COLOR[1], TANGENT_COLOR[2]));
                rdr_gate.render(&opaque_st, |mut tess_gate| -> Result<(), PipelineError> {
                  tess_gate.render(&lines.tangents)
                })?;
              }

              Ok(())
            })?;
          }

          if flags.show_help() {
            let help = pipeline.bind_texture(help)?;

            shd_gate.shade(overlay_program, |mut iface, unis, mut rdr_gate| -> Result<(), PipelineError> {
              iface.set(&unis.rect, Vec4::new(x_min, y_min, x_max, y_max));
              iface.set(&unis.overlay, help.binding());

              rdr_gate.render(&background_st, |mut tess_gate| tess_gate.render(overlay_quad))
            })?;
          }

          Ok(())
        },
      )
      .assume();

    if render.is_ok() {
      LoopFeedback::Continue(self)
    } else {
      LoopFeedback::Exit
    }
  }
}
