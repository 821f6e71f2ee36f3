#![forbid(unsafe_code)]

pub mod core;
pub mod encode;
pub mod encode_ffmpeg;
pub mod error;
pub mod gemini;
pub mod generate;
pub mod instruction;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod simulate;

pub use crate::core::{Canvas, FrameIndex, Fps, Rgba8};
pub use encode::{
    ARTIFACT_MEDIA_TYPE, ConcatSink, FrameSink, InMemorySink, SinkConfig, VideoArtifact,
    count_stills,
};
pub use encode_ffmpeg::FfmpegSink;
pub use error::{MathmotionError, MathmotionResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use generate::{
    Generator, InstructionSource, fallback_instructions, INSTRUCTION_DIRECTIVE,
};
pub use instruction::{AnimationInstruction, InstructionKind, DEFAULT_DURATION_SECS};
pub use pipeline::{RenderOptions, render, render_instructions, render_offline, render_with};
pub use render::{CpuBackend, FrameRgba, RenderBackend};
pub use scene::{Pose, SceneObject, Shape, compile};
pub use simulate::RenderSession;
