use std::{fs, process};

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use geo_animator::{
    animation::Animation,
    demos,
    player::{Player, PlayerConfig, ReplayPlayer, TerminalPlayer},
    types::{PlayablePresentation, TerminalContract},
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GEO_ANIMATOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const LIST_USAGE: &str = "geo-animator list";
const PLAY_USAGE: &str = "geo-animator play <demo>";
const RECORD_USAGE: &str = "geo-animator record <demo> <seconds> <output.json>";
const REPLAY_USAGE: &str = "geo-animator replay <recording.json>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("list") => {
            list();
            Ok(())
        }
        Some("play") => {
            let demo = args.next().context(PLAY_USAGE)?;
            let config = PlayerConfig::load();
            match demo.as_str() {
                "radial" => play(demos::radial()?, config),
                "cubes" => play(demos::cubes()?, config),
                other => unknown_demo(other),
            }
        }
        Some("record") => {
            let demo = args.next().context(RECORD_USAGE)?;
            let seconds: f64 = args
                .next()
                .context(RECORD_USAGE)?
                .parse()
                .context("Seconds must be a number")?;
            let output_path = args.next().context(RECORD_USAGE)?;
            let config = PlayerConfig::load();
            let presentation = match demo.as_str() {
                "radial" => record(demos::radial()?, &config, seconds),
                "cubes" => record(demos::cubes()?, &config, seconds),
                other => return unknown_demo(other),
            };
            save(&presentation, &output_path)
        }
        Some("replay") => {
            let path = args.next().context(REPLAY_USAGE)?;
            replay(&path)
        }
        _ => bail!(
            "Geo Animator — reactive geometry animations in the terminal\n\nUsage:\n  {LIST_USAGE}\n  {PLAY_USAGE}\n  {RECORD_USAGE}\n  {REPLAY_USAGE}"
        ),
    }
}

fn list() {
    for (name, description) in demos::DEMOS {
        println!("{name:<10} {description}");
    }
}

fn unknown_demo(name: &str) -> Result<()> {
    let names: Vec<&str> = demos::DEMOS.iter().map(|(n, _)| *n).collect();
    bail!("Unknown demo {name:?}, expected one of: {}", names.join(", "))
}

fn play<S: Default>(animation: Animation<S>, config: PlayerConfig) -> Result<()> {
    let player = Player::new(animation, &config);
    TerminalPlayer::new(player, config).run()
}

fn record<S: Default>(animation: Animation<S>, config: &PlayerConfig, seconds: f64) -> PlayablePresentation {
    let contract = TerminalContract {
        width: config.canvas.width,
        height: config.canvas.height,
    };
    let mut player = Player::new(animation, config);
    player.record(seconds, config.fps, contract)
}

fn save(presentation: &PlayablePresentation, output_path: &str) -> Result<()> {
    let output_json = serde_json::to_string_pretty(presentation)?;
    fs::write(output_path, &output_json)
        .with_context(|| format!("Failed to write {output_path}"))?;

    eprintln!(
        "Recorded {} frames ({} shots) -> {}",
        presentation.frames.len(),
        presentation.markers.len(),
        output_path,
    );

    Ok(())
}

fn replay(path: &str) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let presentation: PlayablePresentation =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {path}"))?;

    let mut player = ReplayPlayer::new(presentation);
    player.play()
}
