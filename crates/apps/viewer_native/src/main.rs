use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use runtime::{Frame, RenderState, Session, ViewerConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Command, HELP, execute};

#[derive(Debug, Parser)]
#[command(name = "kmlview", about = "Headless placemark globe viewer")]
struct Cli {
    /// KML document to open.
    #[arg(long)]
    file: Option<PathBuf>,
    /// JSON viewer config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sphere tessellation multiplier.
    #[arg(long)]
    modelres: Option<u32>,
    /// Render this many frames and exit instead of reading commands.
    #[arg(long)]
    frames: Option<u64>,
    /// Select a node by display path before the first frame. Repeatable.
    #[arg(long = "select", value_name = "PATH")]
    select: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(res) = cli.modelres {
        config.model_resolution = res;
    }
    if let Some(file) = &cli.file {
        config.document = Some(file.clone());
    }
    let Some(path) = config.document.clone() else {
        bail!("no document given; pass --file or set \"document\" in the config");
    };

    let mut session = Session::open(&path);
    info!(path = %path.display(), leaves = session.document().root().leaf_count(), "opened document");
    for selection in &cli.select {
        match session.find(selection) {
            Some(address) => {
                session.set_selected(&address, true);
            }
            None => warn!("--select {selection:?} matches no node"),
        }
    }
    print!("{}", session.outline());

    let render = RenderState::from_config(&session, &config)?;
    let first = Frame::at_rate(config.frame_rate);
    let stop = Arc::new(AtomicBool::new(false));
    let handle = {
        let stop = Arc::clone(&stop);
        let limit = cli.frames;
        thread::Builder::new()
            .name("render".to_string())
            .spawn(move || render_loop(render, first, limit, &stop))
            .context("spawning render thread")?
    };

    if cli.frames.is_none() {
        ui_loop(&mut session)?;
        stop.store(true, Ordering::Release);
    }

    let render = handle
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;
    info!(rebuilds = render.rebuilds(), "render loop stopped");
    Ok(())
}

fn ui_loop(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => match execute(session, &command) {
                Ok(out) => println!("{}", out.trim_end()),
                Err(e) => eprintln!("{e}"),
            },
            Err(e) => {
                eprintln!("{e}");
                eprintln!("{HELP}");
            }
        }
    }
    Ok(())
}

fn render_loop(
    mut render: RenderState,
    mut frame: Frame,
    limit: Option<u64>,
    stop: &AtomicBool,
) -> RenderState {
    let mut last_toggles = None;
    while !stop.load(Ordering::Acquire) && limit.is_none_or(|n| frame.index < n) {
        let started = Instant::now();
        let rebuilt = render.tick(frame);
        if rebuilt {
            let ranges = render.buffer().vertex_ranges();
            info!(
                frame = frame.index,
                lines = ranges.lines.len(),
                points = ranges.points.len(),
                orbits = ranges.orbits.len(),
                "vertex buffer rebuilt"
            );
        }
        let toggles = render.toggles();
        if rebuilt || last_toggles != Some(toggles) {
            let plan = render.draw_plan();
            info!(frame = frame.index, layers = %toggles, calls = plan.calls.len(), "draw plan");
            for call in &plan.calls {
                debug!(?call, "draw");
            }
            last_toggles = Some(toggles);
        }
        if let Some(rest) = frame.interval().checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
        frame = frame.next();
    }
    render
}
