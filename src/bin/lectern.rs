use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lectern", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full lecture as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single timestamp as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input lecture script JSON (array of scenes).
    #[arg(long)]
    script: PathBuf,

    /// Narration audio file (any format ffmpeg can decode).
    #[arg(long)]
    audio: PathBuf,

    /// Output frame rate.
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Font file for on-screen text (defaults to a system font scan).
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Render frames on parallel workers.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (implies --parallel).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Timestamp to render, in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_script_json(path: &Path) -> anyhow::Result<lectern::Script> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let r = BufReader::new(f);
    let script: lectern::Script =
        serde_json::from_reader(r).with_context(|| "parse script JSON")?;
    Ok(script)
}

fn build_session(common: &CommonArgs, extra: impl FnOnce(&mut lectern::RenderOpts)) -> anyhow::Result<lectern::RenderSession> {
    let script = read_script_json(&common.script)?;
    let mut opts = lectern::RenderOpts {
        fps: lectern::Fps::new(common.fps, 1)?,
        canvas: lectern::Canvas::new(common.width, common.height)?,
        font_path: common.font.clone(),
        ..lectern::RenderOpts::default()
    };
    extra(&mut opts);
    Ok(lectern::RenderSession::new(script, &common.audio, opts)?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let session = build_session(&args.common, |opts| {
        opts.parallel = args.parallel || args.threads.is_some();
        opts.threads = args.threads;
    })?;

    let frames = session.render_to_mp4(&args.out, None)?;
    eprintln!(
        "wrote {} ({} frames, {:.2}s)",
        args.out.display(),
        frames,
        session.total_duration()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = build_session(&args.common, |_| {})?;
    let frame = session.render_frame_at(args.at)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
