//! A cube map rendered as a sky all around a rotating cube that shows the same cube map on its faces.
//!
//! The six faces are read from `cubemaps/<name>/{posx,negx,posy,negy,posz,negz}.jpg`.
//!
//! Press <W>, <S> to pitch, <A>, <D> to yaw, <J>, <L>, <I>, <K> to pan, <Z>, <X> to move closer / farther and <space>
//! to start / stop the rotation of the cube. Press <escape> to quit or close the window.

use cgmath::Matrix4;
use luminance_front::{
  context::GraphicsContext,
  depth_stencil::Write,
  framebuffer::Framebuffer,
  pipeline::{PipelineError, PipelineState},
  render_state::RenderState,
  shader::{
    types::{Mat33, Mat44},
    Program,
  },
  tess::{Mode, Tess},
  texture::Dim2,
  Backend,
};

use crate::{
  geometry::{self, PositionVertex, Semantics, SurfaceVertex, VertexIndex, PRIMITIVE_RESTART},
  input::HeldKeys,
  scene::{projection, SceneState},
  shared::{self, RGBCubemap, ReflectionInterface, SkyInterface},
  DemoError, Example, InputAction, LoopFeedback, PlatformServices,
};

/// Background of the frame, visible only where nothing is drawn.
pub const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.];

const CUBE_SIZE: f32 = 1.;

pub struct LocalExample {
  sky: RGBCubemap,
  sky_program: Program<Semantics, (), SkyInterface>,
  reflection_program: Program<Semantics, (), ReflectionInterface>,
  sky_cube: Tess<PositionVertex, VertexIndex>,
  cube: Tess<SurfaceVertex, VertexIndex>,
  // only the camera, the rotation and its latch are used here
  scene: SceneState,
  projection: Matrix4<f32>,
}

impl Example for LocalExample {
  fn bootstrap(
    platform: &mut impl PlatformServices,
    context: &mut impl GraphicsContext<Backend = Backend>,
  ) -> Result<Self, DemoError> {
    let config = platform.scene_config();
    let scene = SceneState::new(&config);
    let sky = shared::load_cubemap(context, platform, &config.cubemap)?;

    let sky_program = shared::new_sky_program(context)?;
    let reflection_program = shared::new_reflection_program(context)?;

    let sky_mesh = geometry::sky_cube();
    let sky_cube = context
      .new_tess()
      .set_vertices(sky_mesh.vertices)
      .set_indices(sky_mesh.indices)
      .set_mode(Mode::TriangleFan)
      .set_primitive_restart_index(PRIMITIVE_RESTART)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("sky cube", Box::new(e)))?;

    let cube_mesh = geometry::cube(CUBE_SIZE);
    let cube = context
      .new_tess()
      .set_vertices(cube_mesh.vertices)
      .set_indices(cube_mesh.indices)
      .set_mode(Mode::TriangleFan)
      .set_primitive_restart_index(PRIMITIVE_RESTART)
      .build()
      .map_err(|e| DemoError::CannotCreateTess("cube", Box::new(e)))?;

    Ok(LocalExample {
      sky,
      sky_program,
      reflection_program,
      sky_cube,
      cube,
      scene,
      projection: projection(1.),
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
          self.projection = projection(width as f32 / height.max(1) as f32);
        }
      }
    }

    self.scene.update(keys);

    let sky_projection = Mat44::new(self.projection * self.scene.camera.sky_view());
    let transforms = self.scene.transforms(&self.projection);

    let sky = &mut self.sky;
    let sky_program = &mut self.sky_program;
    let reflection_program = &mut self.reflection_program;
    let sky_cube = &self.sky_cube;
    let cube = &self.cube;

    // the sky lies on the far plane and is drawn first, without touching the depth buffer
    let sky_st = RenderState::default()
      .set_depth_test(None)
      .set_depth_write(Write::Off);

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

            rdr_gate.render(&sky_st, |mut tess_gate| tess_gate.render(sky_cube))
          })?;

          shd_gate.shade(reflection_program, |mut iface, unis, mut rdr_gate| {
            iface.set(&unis.model_to_projection, Mat44::new(transforms.model_to_projection));
            iface.set(&unis.model_to_world_it, Mat33::new(transforms.model_to_world_it));
            iface.set(&unis.environment, environment.binding());

            rdr_gate.render(&RenderState::default(), |mut tess_gate| tess_gate.render(cube))
          })
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
