//! PortDive - find the key port before the pwner finds you out.
//!
//! Line mode reads commands from stdin (`p <column>`, `d <row>`) while the
//! pwner ticks in the background. With `--tui` the game runs in a keystroke
//! dashboard instead.

use anyhow::{Context, Result};
use clap::Parser;
use portdive_core::{Frontend, GameConfig, GameSession, GameStatus};
use portdive_env::{GameContext, StdinSource, TokioContext};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

use render::{JsonFrontend, TextFrontend};

/// PortDive terminal hacking minigame
#[derive(Parser, Debug)]
#[command(name = "portdive", version)]
#[command(about = "Identify the key port before you guess wrong", long_about = None)]
struct Args {
    /// Seed for a reproducible game (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between pwner ticks
    #[arg(short, long)]
    tick_ms: Option<u64>,

    /// JSON file with the port matrix (`{ "rows": [[..]], "tick_ms": .., "seed": .. }`)
    #[arg(short, long)]
    matrix: Option<PathBuf>,

    /// Play in the keystroke dashboard
    #[arg(long)]
    tui: bool,

    /// Emit one JSON frame per transition instead of the text view
    #[arg(long, conflicts_with = "tui")]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with the game frame
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.matrix {
        Some(path) => GameConfig::from_json_file(path)
            .with_context(|| format!("failed to load matrix from {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(ms) = args.tick_ms {
        config = config.with_tick_interval(Duration::from_millis(ms));
    }

    let context = TokioContext::shared(config.seed);
    info!(seed = context.seed(), "replay this game with --seed {}", context.seed());

    let status = if args.tui {
        run_dashboard(&context, &config)?
    } else {
        run_line_mode(context, &config, args.json)?
    };

    if !args.json {
        match status {
            GameStatus::Won => println!("You found the key port."),
            GameStatus::Lost => println!("Connection terminated."),
            GameStatus::InProgress => println!("Input closed; game abandoned."),
        }
    }
    Ok(())
}

fn run_line_mode(
    context: Arc<TokioContext>,
    config: &GameConfig,
    json: bool,
) -> Result<GameStatus> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let source = Arc::new(StdinSource::spawn().context("failed to read stdin")?);
    let mut session = GameSession::new(context, source, config)?;

    let result = runtime.block_on(async {
        if json {
            play(&mut session, &mut JsonFrontend::new(std::io::stdout())).await
        } else {
            let clear = std::io::stdout().is_terminal();
            play(&mut session, &mut TextFrontend::new(std::io::stdout(), clear)).await
        }
    });

    // The stdin reader may still be blocked in read(); don't wait for it
    runtime.shutdown_background();
    result
}

async fn play<F: Frontend>(
    session: &mut GameSession<TokioContext, StdinSource>,
    frontend: &mut F,
) -> Result<GameStatus> {
    Ok(session.run(frontend).await?)
}

#[cfg(feature = "tui")]
fn run_dashboard(context: &TokioContext, config: &GameConfig) -> Result<GameStatus> {
    use portdive_core::dashboard::GameDashboard;
    use portdive_core::{Game, GAME_STREAM};

    let game = Game::new(config.rows.clone(), context.derive_seed(GAME_STREAM))?;
    let status = GameDashboard::new(game, config.tick_interval).run()?;
    Ok(status)
}

#[cfg(not(feature = "tui"))]
fn run_dashboard(_context: &TokioContext, _config: &GameConfig) -> Result<GameStatus> {
    anyhow::bail!("--tui requires the 'tui' feature; rebuild with --features tui")
}
