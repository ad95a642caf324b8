use std::time::Instant;

use anyhow::Result;
use log::{info, warn};
use rusted_input::input::{config, CallbackContext};
use rusted_input::{InputManager, InputSettings};
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

fn log_transition(ctx: &CallbackContext<'_>) {
    info!(
        "{} {} ({:.3}s, {:?})",
        ctx.action_name.unwrap_or("<unnamed>"),
        ctx.phase(),
        ctx.duration(),
        ctx.control().map(|c| c.path())
    );
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Input demo...");

    let mut input = InputManager::new(InputSettings::default());
    let gameplay = input.add_set(config::default_gameplay_set()?);
    if let Some(set) = input.set_mut(gameplay) {
        for index in 0..set.len() {
            if let Some(action) = set.action_mut(index) {
                action.on_started(log_transition);
                action.on_performed(log_transition);
                action.on_cancelled(log_transition);
            }
        }
    }
    input.enable_all()?;

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Rusted Input")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .build(&event_loop)?;

    info!("Window created; try space, A/D, E (hold) and left click (tap/slow tap)");

    let clock = Instant::now();

    // Main event loop
    event_loop
        .run(move |event, elwt| {
            let now = clock.elapsed().as_secs_f64();
            let result = match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    info!("Close requested, shutting down...");
                    elwt.exit();
                    input.disable_all()
                }
                Event::WindowEvent {
                    event: WindowEvent::KeyboardInput { event, .. },
                    ..
                } => input.process_keyboard_event(&event, now),
                Event::WindowEvent {
                    event: WindowEvent::MouseInput { state, button, .. },
                    ..
                } => input.process_mouse_button(button, state, now),
                Event::AboutToWait => {
                    // Hold/tap timeouts fire from here
                    window.request_redraw();
                    input.update(now)
                }
                _ => Ok(()),
            };
            if let Err(err) = result {
                warn!("Input error: {}", err);
            }
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
