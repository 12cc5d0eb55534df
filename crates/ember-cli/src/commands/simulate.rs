//! Simulate command - drive the demo game with synthetic frame timestamps

use crate::commands::config;
use crate::demo::{self, Stats, BULLET, STATS_SYSTEM};
use anyhow::{Context, Result};
use ember_runtime::{Camera, Game, CAMERA_SYSTEM};
use serde::Serialize;

pub struct SimulateArgs {
    pub config: Option<String>,
    pub frames: u64,
    pub frame_ms: f64,
    pub stall_every: Option<u64>,
    pub stall_ms: f64,
    /// Frames on which the host taps the pause key
    pub pause_at: Vec<u64>,
    pub format: String,
}

/// What a simulation run did
#[derive(Debug, Serialize)]
pub struct Report {
    pub frames: u64,
    pub simulated_ms: f64,
    pub fixed_ticks: u64,
    pub variable_ticks: u64,
    pub spiral_resets: u64,
    pub pauses: u64,
    pub ended_paused: bool,
    pub live_entities: usize,
    pub visible_entities: usize,
    pub pooled_bullets: usize,
    pub total_spawns: u64,
    pub bullets_spawned: u64,
    pub peak_live_bullets: usize,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let report = simulate(&args)?;
    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }
    Ok(())
}

pub fn simulate(args: &SimulateArgs) -> Result<Report> {
    if !(args.frame_ms.is_finite() && args.frame_ms >= 0.0) {
        anyhow::bail!("--frame-ms must be a non-negative number");
    }
    let config = config::load(args.config.as_deref())?;
    let mut game = Game::with_config(config).context("Failed to create game")?;
    demo::populate(&mut game).context("Failed to populate demo game")?;
    game.awake();

    log::info!(
        "simulating {} frames at {:.3}ms ({} fps fixed, speed {})",
        args.frames,
        args.frame_ms,
        game.config().desired_fps,
        game.config().speed
    );

    let mut timestamp = 0.0;
    for frame in 0..args.frames {
        if frame > 0 {
            timestamp += match args.stall_every {
                Some(every) if every > 0 && frame % every == 0 => args.stall_ms,
                _ => args.frame_ms,
            };
        }
        let tapped = if args.pause_at.contains(&frame) {
            let key = game.input().key_for("pause");
            if let Some(key) = key {
                game.input_mut().process_key_down(key);
            }
            key
        } else {
            None
        };
        let report = game.run_frame(timestamp);
        if let Some(key) = tapped {
            game.input_mut().process_key_up(key);
        }
        if report.spiral_reset {
            log::debug!("frame {frame}: spiral guard reset the accumulator");
        }
    }

    let stats = game.stats();
    let demo_stats = game
        .system::<Stats>(STATS_SYSTEM)
        .context("stats system missing")?;
    let visible = game
        .system::<Camera>(CAMERA_SYSTEM)
        .map(|camera| camera.visible_entities(&game).len())
        .unwrap_or(0);

    Ok(Report {
        frames: args.frames,
        simulated_ms: game.clock().total_time_ms(),
        fixed_ticks: stats.fixed_ticks,
        variable_ticks: stats.variable_ticks,
        spiral_resets: game.clock().spiral_resets(),
        pauses: demo_stats.pauses,
        ended_paused: game.is_paused(),
        live_entities: game.entity_count(),
        visible_entities: visible,
        pooled_bullets: game.pool_size(BULLET),
        total_spawns: stats.spawned,
        bullets_spawned: demo_stats.bullets_spawned,
        peak_live_bullets: demo_stats.peak_live_bullets,
    })
}

fn print_text(report: &Report) {
    println!("Simulation report");
    println!("  frames:            {}", report.frames);
    println!("  simulated time:    {:.1}ms", report.simulated_ms);
    println!("  fixed ticks:       {}", report.fixed_ticks);
    println!("  variable ticks:    {}", report.variable_ticks);
    println!("  spiral resets:     {}", report.spiral_resets);
    println!("  pauses:            {}", report.pauses);
    println!("  ended paused:      {}", report.ended_paused);
    println!("  live entities:     {}", report.live_entities);
    println!("  visible entities:  {}", report.visible_entities);
    println!("  pooled bullets:    {}", report.pooled_bullets);
    println!("  total spawns:      {}", report.total_spawns);
    println!("  bullets spawned:   {}", report.bullets_spawned);
    println!("  peak live bullets: {}", report.peak_live_bullets);
}
