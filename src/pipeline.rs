use crate::core::{Canvas, Fps};
use crate::encode::{ConcatSink, VideoArtifact};
use crate::error::MathmotionResult;
use crate::generate::{Generator, fallback_instructions};
use crate::instruction::AnimationInstruction;
use crate::render::CpuBackend;
use crate::simulate::RenderSession;

/// Options for one render session.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub canvas: Canvas,
    pub fps: Fps,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            fps: Fps::DEFAULT,
        }
    }
}

/// Render a prompt end to end: generate, compile, simulate, encode.
///
/// Uses the remote generator when `GEMINI_API_KEY` is configured, the
/// deterministic keyword generator otherwise. Callers see exactly two
/// outcomes: a finished artifact or an error with a human-readable reason.
pub async fn render(prompt: &str, opts: &RenderOptions) -> MathmotionResult<VideoArtifact> {
    render_with(&Generator::from_env(), prompt, opts).await
}

/// Render a prompt with an explicit generator.
pub async fn render_with(
    generator: &Generator,
    prompt: &str,
    opts: &RenderOptions,
) -> MathmotionResult<VideoArtifact> {
    let instructions = generator.generate(prompt).await;
    render_instructions(instructions, opts)
}

/// Render without any network involvement: deterministic generator only.
pub fn render_offline(prompt: &str, opts: &RenderOptions) -> MathmotionResult<VideoArtifact> {
    render_instructions(fallback_instructions(prompt), opts)
}

/// Drive an already-generated instruction sequence through compile,
/// simulate, and the default encoder.
pub fn render_instructions(
    instructions: Vec<AnimationInstruction>,
    opts: &RenderOptions,
) -> MathmotionResult<VideoArtifact> {
    let session = RenderSession::new(instructions, opts.fps);
    let mut backend = CpuBackend::new(opts.canvas)?;
    let mut sink = ConcatSink::new();
    let frames = session.run(&mut backend, &mut sink)?;
    tracing::info!(frames, "render session complete");
    sink.into_artifact()
}
