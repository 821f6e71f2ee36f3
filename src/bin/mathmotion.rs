use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use mathmotion::{
    Canvas, CpuBackend, FfmpegSink, Fps, Generator, RenderOptions, RenderSession, render_with,
};

#[derive(Parser, Debug)]
#[command(name = "mathmotion", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a prompt to a video artifact.
    Render(RenderArgs),
    /// Print the generated instruction sequence as JSON without rendering.
    Instructions(InstructionsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Mathematical concept to animate.
    #[arg(long)]
    prompt: String,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the remote model and use the deterministic generator.
    #[arg(long)]
    offline: bool,

    /// Output container.
    #[arg(long, value_enum, default_value_t = FormatChoice::Stills)]
    format: FormatChoice,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 360)]
    height: u32,
}

#[derive(Parser, Debug)]
struct InstructionsArgs {
    /// Mathematical concept to animate.
    #[arg(long)]
    prompt: String,

    /// Skip the remote model and use the deterministic generator.
    #[arg(long)]
    offline: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    /// Concatenated PNG stills tagged `video/webm` (the default artifact).
    Stills,
    /// H.264 MP4 (requires `ffmpeg` on PATH).
    Mp4,
}

fn make_generator(offline: bool) -> Generator {
    if offline {
        Generator::offline()
    } else {
        Generator::from_env()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Instructions(args) => cmd_instructions(args).await,
    }
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let generator = make_generator(args.offline);
    let opts = RenderOptions {
        canvas: Canvas::new(args.width, args.height)?,
        fps: Fps::DEFAULT,
    };

    match args.format {
        FormatChoice::Stills => {
            let artifact = render_with(&generator, &args.prompt, &opts).await?;
            if let Some(parent) = args.out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&args.out, &artifact.data)
                .with_context(|| format!("write artifact '{}'", args.out.display()))?;
            eprintln!(
                "wrote {} ({} bytes, {})",
                args.out.display(),
                artifact.len(),
                artifact.media_type
            );
        }
        FormatChoice::Mp4 => {
            let instructions = generator.generate(&args.prompt).await;
            let session = RenderSession::new(instructions, opts.fps);
            let mut backend = CpuBackend::new(opts.canvas)?;
            let mut sink = FfmpegSink::new(&args.out);
            let frames = session.run(&mut backend, &mut sink)?;
            eprintln!("wrote {} ({frames} frames)", args.out.display());
        }
    }

    Ok(())
}

async fn cmd_instructions(args: InstructionsArgs) -> anyhow::Result<()> {
    let generator = make_generator(args.offline);
    let instructions = generator.generate(&args.prompt).await;
    println!("{}", serde_json::to_string_pretty(&instructions)?);
    Ok(())
}
