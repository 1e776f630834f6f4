//! gemtui: match-three gem puzzle with chain-reacting bombs, in the terminal.

mod app;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(args, theme)?;
    app.run()?;
    Ok(())
}

/// The terminal belongs to the UI, so logs only go to a file, and only when asked.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Match-three gem puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "gemtui",
    version,
    about = "Match-three gem puzzle in the terminal. Swap neighbouring gems to line up three or more.",
    long_about = "gemtui is a terminal match-three puzzle.\n\n\
        Swap two neighbouring gems to make a line of three or more of a kind. Longer lines \
        score more; T and L shapes score like a five and leave a bomb behind. Swap a bomb to \
        blow up its 3x3 neighbourhood, setting off any bombs caught in the blast.\n\n\
        Reach the target score before time runs out. Clear three levels to win.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Select / swap\n  \
        Esc            Cancel select  P              Pause\n  \
        R              Restart (after game over)     Q  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board width in gems.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: usize,

    /// Board height in gems.
    #[arg(long, default_value = "10", value_name = "ROWS")]
    pub height: usize,

    /// Number of gem kinds (3-9). Fewer kinds means more matches.
    #[arg(short, long, default_value = "7", value_name = "K")]
    pub kinds: u8,

    /// Points per gem before the length multiplier.
    #[arg(long, default_value = "10", value_name = "POINTS")]
    pub reward: u32,

    /// Seed for the board and refills. Random if not set.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Starting level.
    #[arg(short, long, default_value = "1", value_name = "N")]
    pub level: u32,

    /// Time limit per level in seconds, instead of the level's own.
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Disable the fade-in of new gems.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip the title screen and start playing immediately.
    #[arg(long)]
    pub no_title: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
