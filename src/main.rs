//! Hill Rover headless driver
//!
//! Stands in for the external scheduler: builds a run, feeds it a scripted
//! throttle at the reference cadence (or as fast as possible) and logs
//! progress. Set `RUST_LOG=info` (or `debug` for terrain streaming) to see it.

use std::process::ExitCode;
use std::time::Duration;

use hill_rover::consts::REFERENCE_TICK_MS;
use hill_rover::sim::{Run, RunEvent, TickInput, tilt_angle};
use hill_rover::{LevelPreset, RunConfig, SimConfig, SimError};

/// Command line options
struct Options {
    seed: u64,
    level: LevelPreset,
    ticks: u64,
    config_path: Option<String>,
    realtime: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 12345,
            level: LevelPreset::Classic,
            ticks: 6000,
            config_path: None,
            realtime: false,
        }
    }
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--seed" => {
                let v = value.ok_or("--seed needs a value")?;
                options.seed = v.parse().map_err(|_| format!("invalid seed: {v}"))?;
                i += 1;
            }
            "--level" => {
                let v = value.ok_or("--level needs a value")?;
                options.level = LevelPreset::from_str(v).ok_or_else(|| format!("unknown level: {v}"))?;
                i += 1;
            }
            "--ticks" => {
                let v = value.ok_or("--ticks needs a value")?;
                options.ticks = v.parse().map_err(|_| format!("invalid tick count: {v}"))?;
                i += 1;
            }
            "--config" => {
                options.config_path = Some(value.ok_or("--config needs a path")?.clone());
                i += 1;
            }
            "--realtime" => options.realtime = true,
            "--help" | "-h" => {
                return Err(
                    "usage: hill-rover [--seed N] [--level NAME] [--ticks N] [--config FILE.json] [--realtime]"
                        .to_string(),
                );
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }
    Ok(options)
}

fn load_config(options: &Options) -> Result<SimConfig, SimError> {
    let Some(path) = &options.config_path else {
        return Ok(SimConfig::from_preset(options.level));
    };
    let mut config = SimConfig::load(path)?;
    if options.level != LevelPreset::Classic {
        config.apply_preset(options.level);
    }
    Ok(config)
}

/// Throttle script: drive, ease off when the nose climbs, nitro now and then
fn scripted_input(run: &Run, tick: u64) -> TickInput {
    let bodies = run.world().bodies();
    let nose_up = match bodies {
        [rear, front, ..] => tilt_angle(rear, front) < -0.6,
        _ => false,
    };
    if nose_up {
        return TickInput::new(false, true);
    }
    // Both keys for a burst every 15 s
    let burst = tick % 3000 < 200 && tick >= 3000;
    TickInput::new(true, burst)
}

fn main() -> ExitCode {
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let sim = match load_config(&options) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration rejected: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Hill Rover (headless) starting: level {}, seed {}, {} ticks",
        sim.level.as_str(),
        options.seed,
        options.ticks
    );

    let mut run = match Run::seeded(sim, RunConfig::default(), options.seed) {
        Ok(run) => run,
        Err(e) => {
            log::error!("Could not build run: {e}");
            return ExitCode::FAILURE;
        }
    };

    let tick_duration = Duration::from_millis(REFERENCE_TICK_MS);
    let summary_every = run.config().ticks(1.0);

    for tick in 0..options.ticks {
        let input = scripted_input(&run, tick);
        for event in run.advance(&input) {
            if event == RunEvent::Toppled {
                log::warn!("Rover toppled at tick {tick}");
            }
        }

        if tick % summary_every == 0 {
            let pos = run.world().mean_position().unwrap_or_default();
            log::info!(
                "t={:>5.1}s x={:>7.0} y={:>6.0} fuel={:>3.0}% coins={} flips={} score={}",
                tick as f64 / run.config().ticks_per_second,
                pos.x,
                pos.y,
                run.fuel_fraction() * 100.0,
                run.coins(),
                run.flips().total(),
                run.score()
            );
        }

        if run.is_over() {
            break;
        }
        if options.realtime {
            std::thread::sleep(tick_duration);
        }
    }

    println!(
        "distance {:.0}  coins {}  flips {}  score {}  ({})",
        run.distance(),
        run.coins(),
        run.flips().total(),
        run.score(),
        if run.is_over() { "toppled" } else { "finished" }
    );
    ExitCode::SUCCESS
}
