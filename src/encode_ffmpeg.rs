use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::core::FrameIndex;
use crate::encode::{FrameSink, SinkConfig};
use crate::error::{MathmotionError, MathmotionResult};
use crate::render::FrameRgba;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> MathmotionResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn validate_config(cfg: &SinkConfig) -> MathmotionResult<()> {
    // With the default settings we target yuv420p output for maximum compatibility.
    if !cfg.canvas.width.is_multiple_of(2) || !cfg.canvas.height.is_multiple_of(2) {
        return Err(MathmotionError::validation(
            "encode width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    Ok(())
}

/// Real MP4 encoding behind the [`FrameSink`] seam: raw RGBA frames are
/// streamed to a spawned `ffmpeg` process writing H.264 to `out_path`.
///
/// The simulator never knows whether it feeds this sink or the placeholder
/// concatenator.
pub struct FfmpegSink {
    out_path: PathBuf,
    overwrite: bool,
    cfg: Option<SinkConfig>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            cfg: None,
            child: None,
            stdin: None,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> MathmotionResult<()> {
        validate_config(&cfg)?;
        ensure_parent_dir(&self.out_path)?;

        if !self.overwrite && self.out_path.exists() {
            return Err(MathmotionError::validation(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(MathmotionError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        // We intentionally use the system `ffmpeg` binary rather than `ffmpeg-next` to avoid
        // native FFmpeg dev header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &cfg.fps.0.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            MathmotionError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MathmotionError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        self.cfg = Some(cfg);
        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRgba) -> MathmotionResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(MathmotionError::encode("ffmpeg encoder was not started"));
        };
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(MathmotionError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MathmotionError::encode("ffmpeg encoder is already finalized"));
        };

        stdin.write_all(&frame.data).map_err(|e| {
            MathmotionError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> MathmotionResult<()> {
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Err(MathmotionError::encode("ffmpeg encoder was not started"));
        };

        let output = child.wait_with_output().map_err(|e| {
            MathmotionError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MathmotionError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
