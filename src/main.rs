/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use rand::Rng;

use config::GameConfig;
use domain::entity::FrameInput;
use error::SimResult;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// Longest frame the simulation will integrate in one step.
const MAX_DT: f32 = 0.1;

fn main() {
    env_logger::init();

    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Bad configuration: {e}");
            std::process::exit(1);
        }
    };

    let mut rng = rand::thread_rng();
    let mut world = match new_world(&config, &mut rng) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("World generation failed: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new(config.display.view_radius);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    kb.honor_release = renderer.enable_key_release();
    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, &mut kb, sound.as_ref(), &config, &mut rng);

    if let Some(sfx) = sound.as_ref() {
        sfx.stop_all();
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Final score: {}  (depth {}m, seed {})", world.player.score, world.depth_meters(), world.seed);
}

fn new_world<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> SimResult<WorldState> {
    let seed = WorldState::pick_seed(config, rng);
    log::info!("generating world with seed {seed}");
    WorldState::generate(config, seed)
}

fn game_loop<R: Rng + ?Sized>(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    rng: &mut R,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        kb.drain_events();
        if kb.quit_requested() {
            break;
        }

        let dt = frame_start.duration_since(last).as_secs_f32().min(MAX_DT);
        last = frame_start;

        match world.phase {
            Phase::Playing => {
                let events = step::step(world, kb.frame_input(), dt);
                if let Some(sfx) = sound {
                    sfx.play_events(&events);
                }
            }
            Phase::GameOver => {
                step::step(world, FrameInput::default(), dt);
                if world.accepts_restart() && kb.any_key_pressed() {
                    *world = new_world(config, rng)?;
                    renderer.invalidate();
                }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(frame.saturating_sub(frame_start.elapsed()));
    }
    Ok(())
}
