//! amiibox desktop entry point.
//!
//! Drives the overlay core from stdin: one command per line, with the
//! frame printed as text after each. Storage is either a host directory
//! holding `emuiibo/amiibo/...` or, with `--demo`, generated sample data.
//!
//! Usage: `amiibox [STORAGE_DIR] [--config FILE] [--demo]`

mod demo;
mod input;
mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use amiibox_core::config::OverlayConfig;
use amiibox_core::overlay::{InputResult, Overlay};
use amiibox_core::platform::{DesktopEmulation, EmulationService};
use amiibox_core::vfs::{MemoryVfs, RealVfs, Vfs};

use input::LineCommand;

const DEFAULT_CONFIG: &str = "amiibox.toml";

#[derive(Debug, Default)]
struct Args {
    storage_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    demo: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => parsed.demo = true,
            "--config" => {
                let path = args.next().context("--config needs a file argument")?;
                parsed.config = Some(PathBuf::from(path));
            },
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            dir => {
                if parsed.storage_dir.is_some() {
                    bail!("more than one storage directory given");
                }
                parsed.storage_dir = Some(PathBuf::from(dir));
            },
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = OverlayConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match (&args.storage_dir, args.demo) {
        (Some(dir), false) => {
            log::info!("Serving virtual amiibos from {}", dir.display());
            let vfs = RealVfs::new(dir);
            let service = DesktopEmulation::new(RealVfs::new(dir), demo::AMIIBO_ROOT);
            run(config, Box::new(service), &vfs)
        },
        _ => {
            let mut vfs = MemoryVfs::new();
            demo::populate_demo_vfs(&mut vfs)?;
            let service = DesktopEmulation::new(vfs.clone(), demo::AMIIBO_ROOT);
            run(config, Box::new(service), &vfs)
        },
    }
}

fn run(config: OverlayConfig, service: Box<dyn EmulationService>, vfs: &dyn Vfs) -> Result<()> {
    let mut overlay = Overlay::new(config, service);
    if !overlay.start(vfs) {
        log::warn!("Emulation service unavailable, only quit is accepted");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", input::HELP)?;
    write!(out, "{}", render::render_frame(&overlay.frame()))?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        match input::parse_line(&line) {
            LineCommand::Input(event) => {
                if overlay.handle_input(&event, vfs) == InputResult::Quit {
                    break;
                }
            },
            LineCommand::Refresh => {},
            LineCommand::Help => writeln!(out, "{}", input::HELP)?,
            LineCommand::Unknown(cmd) => {
                log::warn!("Unknown command {cmd:?}");
                continue;
            },
        }
        let changes = overlay.update(vfs);
        if changes.any() {
            log::debug!("Session changed: {changes:?}");
        }
        write!(out, "{}", render::render_frame(&overlay.frame()))?;
        out.flush()?;
    }

    log::info!("Overlay closed");
    Ok(())
}
