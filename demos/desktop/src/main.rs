mod platform;

use diffraction_demos::{Example, HeldKeys, InputAction, Key as DemoKey, LoopFeedback};
use glfw::{Action, Context as _, Key, SwapInterval, Window, WindowEvent, WindowMode};
use luminance_glfw::{GlfwSurface, GlfwSurfaceError};
use platform::DesktopPlatformServices;
use std::{iter, path::PathBuf, time::Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct CLIOpts {
  #[structopt(short, long, default_value = "assets", parse(from_os_str))]
  /// Directory where to pick textures from.
  textures: PathBuf,

  #[structopt(long, default_value = "Tenerife4")]
  /// Cube map to use, as a folder under <textures>/cubemaps holding posx.jpg, negx.jpg, posy.jpg, negy.jpg, posz.jpg
  /// and negz.jpg.
  cubemap: String,

  #[structopt(long, default_value = "help.png")]
  /// Image shown as help overlay, relative to <textures>.
  help_image: String,

  #[structopt(long)]
  /// Initial roughness, in [1, 500].
  roughness: Option<f32>,

  #[structopt(long)]
  /// Initial groove spacing, in [1, 500].
  spacing: Option<f32>,

  #[structopt(long)]
  /// Model rotation per frame, in degrees.
  rotation_step: Option<f32>,

  #[structopt(long, default_value = "960")]
  /// Initial window width.
  width: u32,

  #[structopt(long, default_value = "540")]
  /// Initial window height.
  height: u32,

  #[structopt(short, long)]
  /// List available examples.
  list_examples: bool,

  /// Example to run.
  example: Option<String>,
}

/// Macro to declaratively add examples.
macro_rules! examples {
  ($($ex_name:literal, $ex_ident:ident),* $(,)?) => {
    fn show_available_examples() {
      println!("available examples:");
      $( println!("  - {}", $ex_name); )*
    }

    // create a function that will run an example based on its name
    fn pick_and_run_example(cli_opts: CLIOpts) {
      let example_name = cli_opts.example.as_ref().map(|n| n.as_str());
      match example_name {
        $(
          Some($ex_name) => {
            run_example::<diffraction_demos::$ex_ident::LocalExample>(cli_opts, $ex_name)
          }
        ),*

        _ => {
          log::error!("no example found");
          show_available_examples();
        }
      }
    }
  }
}

// Run an example.
fn run_example<E>(cli_opts: CLIOpts, name: &str)
where
  E: Example,
{
  let [width, height] = [cli_opts.width, cli_opts.height];
  let mut services = DesktopPlatformServices::new(cli_opts);

  // First thing first: we create a new surface to render to and get events from.
  let surface = GlfwSurface::new(|glfw| {
    let (mut window, events) = glfw
      .create_window(width, height, name, WindowMode::Windowed)
      .ok_or_else(|| GlfwSurfaceError::UserError(format!("cannot open a {}×{} window", width, height)))?;

    window.make_current();
    window.set_all_polling(true);
    glfw.set_swap_interval(SwapInterval::Sync(1));

    Ok((window, events))
  });

  let surface = match surface {
    Ok(surface) => surface,
    Err(e) => {
      log::error!("cannot create the graphics surface: {}", e);
      return;
    }
  };

  let mut context = surface.context;
  let events = surface.events_rx;

  let example = match E::bootstrap(&mut services, &mut context) {
    Ok(example) => example,
    Err(e) => {
      log::error!("cannot bootstrap {}: {}", name, e);
      return;
    }
  };

  let start_t = Instant::now();

  // render a dummy frame to pass a single action containing the initial framebuffer size; demos start with a default
  // projection that is not correct, and this will allow them to bootstrap correctly
  let back_buffer = match context.back_buffer() {
    Ok(back_buffer) => back_buffer,
    Err(e) => {
      log::error!("cannot get the back buffer: {}", e);
      return;
    }
  };

  let (fb_w, fb_h) = context.window.get_framebuffer_size();
  let keys = held_keys(&context.window);
  let feedback = example.render_frame(
    0.,
    back_buffer,
    iter::once(InputAction::Resized {
      width: fb_w as _,
      height: fb_h as _,
    }),
    &keys,
    &mut context,
  );
  let mut example = match feedback {
    LoopFeedback::Exit => return,
    LoopFeedback::Continue(example) => example,
  };

  'app: loop {
    // handle events
    context.window.glfw.poll_events();
    let actions = glfw::flush_messages(&events).flat_map(|(_, event)| adapt_events(event));
    let keys = held_keys(&context.window);

    let back_buffer = match context.back_buffer() {
      Ok(back_buffer) => back_buffer,
      Err(e) => {
        log::error!("cannot get the back buffer: {}", e);
        break 'app;
      }
    };

    let elapsed = start_t.elapsed();
    let t = elapsed.as_secs() as f64 + (elapsed.subsec_millis() as f64 * 1e-3);
    let feedback = example.render_frame(t as _, back_buffer, actions, &keys, &mut context);

    if let LoopFeedback::Continue(stepped) = feedback {
      example = stepped;
      context.window.swap_buffers();
    } else {
      break 'app;
    }
  }
}

fn adapt_events(event: WindowEvent) -> Option<InputAction> {
  match event {
    WindowEvent::Close | WindowEvent::Key(Key::Escape, _, Action::Release, _) => {
      Some(InputAction::Quit)
    }

    WindowEvent::FramebufferSize(width, height) => Some(InputAction::Resized {
      width: width as _,
      height: height as _,
    }),

    _ => None,
  }
}

// Sample the keyboard for this frame.
fn held_keys(window: &Window) -> HeldKeys {
  DemoKey::ALL
    .iter()
    .copied()
    .filter(|&key| window.get_key(glfw_key(key)) == Action::Press)
    .collect()
}

fn glfw_key(key: DemoKey) -> Key {
  match key {
    DemoKey::A => Key::A,
    DemoKey::B => Key::B,
    DemoKey::C => Key::C,
    DemoKey::D => Key::D,
    DemoKey::E => Key::E,
    DemoKey::F => Key::F,
    DemoKey::G => Key::G,
    DemoKey::H => Key::H,
    DemoKey::I => Key::I,
    DemoKey::J => Key::J,
    DemoKey::K => Key::K,
    DemoKey::L => Key::L,
    DemoKey::M => Key::M,
    DemoKey::N => Key::N,
    DemoKey::O => Key::O,
    DemoKey::P => Key::P,
    DemoKey::Q => Key::Q,
    DemoKey::R => Key::R,
    DemoKey::S => Key::S,
    DemoKey::T => Key::T,
    DemoKey::U => Key::U,
    DemoKey::V => Key::V,
    DemoKey::W => Key::W,
    DemoKey::X => Key::X,
    DemoKey::Y => Key::Y,
    DemoKey::Z => Key::Z,
    DemoKey::Space => Key::Space,
  }
}

examples! {
  "cubemap-viewer", cubemap_viewer,
  "diffraction-disc", diffraction_disc,
}

fn main() {
  env_logger::builder()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .init();
  let cli_opts = CLIOpts::from_args();

  if cli_opts.list_examples {
    show_available_examples();
  } else {
    pick_and_run_example(cli_opts);
  }
}
