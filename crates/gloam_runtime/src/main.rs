//! Gloam Runtime
//!
//! Headless binary: loads settings, builds the demo dungeon and runs the
//! fixed-step simulation, extracting draw commands every frame.
//!
//! Usage: `gloam [settings.json] [frames]`

mod demo;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use gloam_core::ecs::Physics;
use gloam_core::time::TICK_DURATION_SECS;
use gloam_core::GameEvent;
use gloam_metrics::{as_millis_f64, Counter, FrameTimer};
use gloam_render::{render_world, DrawBatch, RenderAssets};
use gloam_services::{init_services, Settings};
use tracing::{debug, info, Level};

const DEFAULT_FRAMES: u64 = 600;
const PLAYER_SPEED: f32 = 60.0;
const REPORT_EVERY: u64 = 120;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from);
    let frames = match args.next() {
        Some(text) => text
            .parse::<u64>()
            .with_context(|| format!("invalid frame count {text:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let settings = Settings::load_or_default(settings_path.as_deref())?;
    let level = settings
        .logging
        .filter
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Gloam v{}", gloam_core::VERSION);
    let mut services = init_services(settings);
    let (mut world, player) = demo::build_world(services.settings.world.clone())?;

    let assets = RenderAssets::default();
    let mut batch = DrawBatch::with_capacity(4096);
    let mut timer = FrameTimer::new(REPORT_EVERY as usize)
        .with_budget(Duration::from_secs_f32(TICK_DURATION_SECS));
    let mut counters = Counter::new();
    services.recorder.start();

    for frame in 0..frames {
        timer.begin();

        // Scripted input: walk east through the corridor, pausing now and then.
        services.input.move_x = if (frame / 90) % 3 == 2 { 0.0 } else { 1.0 };
        services.input.toggle_debug = frame == frames / 2;
        let direction = services.input.move_direction();
        if let Some(physics) = world.get_mut::<Physics>(player) {
            physics.velocity = direction * PLAYER_SPEED;
        }

        let input = services.frame_input(TICK_DURATION_SECS);
        let report = world.update(&input);
        for event in world.drain_events() {
            match event {
                GameEvent::Damaged { target, amount, .. } => {
                    counters.increment("damage", amount.max(0) as usize);
                    debug!(%target, amount, "damaged");
                }
                GameEvent::Died { entity } => {
                    counters.increment("deaths", 1);
                    info!(%entity, "died");
                }
                GameEvent::HostileCollision { .. } => counters.increment("contacts", 1),
                other => debug!(?other, "event"),
            }
        }
        counters.increment("removed", report.removed.len());

        render_world(&world, &assets, &mut batch);
        counters.set("draw_commands", batch.len());
        timer.end();

        if (frame + 1) % REPORT_EVERY == 0 {
            let (min_ms, max_ms) = timer.frame_time_range_ms();
            info!(
                tick = report.tick,
                alive = report.alive,
                pairs = report.collision_pairs,
                particles = world.particles().len(),
                draw_commands = batch.len(),
                fps = timer.fps(),
                frame_ms = timer.frame_time_ms(),
                min_ms,
                max_ms,
                over_budget = timer.over_budget_frames(),
                "frame report"
            );
            for (phase, average) in world.profiler().phases() {
                debug!(phase, ms = as_millis_f64(average), "phase timing");
            }
        }

        if !world.store().contains(player) {
            info!(frame, "player died, stopping");
            break;
        }
    }
    services.recorder.stop();

    info!(
        ticks = world.time().tick_count(),
        recorded_frames = services.recorder.len(),
        damage = counters.get("damage"),
        deaths = counters.get("deaths"),
        contacts = counters.get("contacts"),
        removed = counters.get("removed"),
        over_budget = timer.over_budget_frames(),
        "run complete"
    );
    for (name, value) in counters.iter() {
        debug!(name, value, "counter");
    }
    Ok(())
}
