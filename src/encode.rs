use std::io::Cursor;

use image::ImageEncoder as _;

use crate::core::{Canvas, FrameIndex, Fps};
use crate::error::{MathmotionError, MathmotionResult};
use crate::render::FrameRgba;

/// Media type tag carried by the concatenated artifact. Inherited from the
/// source pipeline; the payload is a PNG stream, not a compliant webm.
pub const ARTIFACT_MEDIA_TYPE: &str = "video/webm";

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug)]
pub struct SinkConfig {
    pub canvas: Canvas,
    pub fps: Fps,
}

/// Sink contract for consuming captured stills in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing
/// `FrameIndex` order, exactly once per frame of the session. `begin` and
/// `end` are called exactly once each, even for zero-frame sessions.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> MathmotionResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> MathmotionResult<()>;
    fn end(&mut self) -> MathmotionResult<()>;
}

/// The finished video artifact: one binary blob plus its media type tag.
#[derive(Clone, Debug)]
pub struct VideoArtifact {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl VideoArtifact {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Placeholder encoder preserved from the source pipeline: each still is
/// PNG-encoded and the streams are concatenated into one artifact.
///
/// Deliberately not a standards-compliant playable video. Real encoding
/// lives behind the same [`FrameSink`] seam (see `encode_ffmpeg`), so the
/// simulator never knows the container format.
#[derive(Debug, Default)]
pub struct ConcatSink {
    cfg: Option<SinkConfig>,
    data: Vec<u8>,
    frames: u64,
    finished: bool,
}

impl ConcatSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink after `end` and hand back the artifact.
    pub fn into_artifact(self) -> MathmotionResult<VideoArtifact> {
        if !self.finished {
            return Err(MathmotionError::encode(
                "encoder was not finalized before artifact extraction",
            ));
        }
        tracing::debug!(
            frames = self.frames,
            bytes = self.data.len(),
            "artifact assembled"
        );
        Ok(VideoArtifact {
            media_type: ARTIFACT_MEDIA_TYPE.to_string(),
            data: self.data,
        })
    }
}

impl FrameSink for ConcatSink {
    fn begin(&mut self, cfg: SinkConfig) -> MathmotionResult<()> {
        self.cfg = Some(cfg);
        self.data.clear();
        self.frames = 0;
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRgba) -> MathmotionResult<()> {
        let mut cursor = Cursor::new(Vec::new());
        image::codecs::png::PngEncoder::new(&mut cursor)
            .write_image(
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| MathmotionError::encode(format!("png encode failed: {e}")))?;
        self.data.extend_from_slice(&cursor.into_inner());
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> MathmotionResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// In-memory sink for tests and debugging. Keeps frames in push order.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub cfg: Option<SinkConfig>,
    pub frames: Vec<(FrameIndex, FrameRgba)>,
    pub ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> MathmotionResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> MathmotionResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> MathmotionResult<()> {
        self.ended = true;
        Ok(())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Count the stills inside a concatenated artifact by walking the PNG chunk
/// structure of each image in order.
///
/// A truncated or non-PNG payload is an encode error; an empty artifact
/// reports zero stills.
pub fn count_stills(artifact: &VideoArtifact) -> MathmotionResult<u64> {
    let mut rest = artifact.data.as_slice();
    let mut count = 0u64;

    while !rest.is_empty() {
        rest = skip_png(rest)?;
        count += 1;
    }
    Ok(count)
}

fn skip_png(data: &[u8]) -> MathmotionResult<&[u8]> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(MathmotionError::encode(
            "artifact does not start with a png signature",
        ));
    }
    let mut rest = &data[PNG_SIGNATURE.len()..];

    loop {
        if rest.len() < 8 {
            return Err(MathmotionError::encode("truncated png chunk header"));
        }
        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let chunk_type = &rest[4..8];
        let total = 8usize
            .checked_add(length)
            .and_then(|n| n.checked_add(4))
            .filter(|&n| n <= rest.len())
            .ok_or_else(|| MathmotionError::encode("truncated png chunk payload"))?;
        let is_end = chunk_type == b"IEND";
        rest = &rest[total..];
        if is_end {
            return Ok(rest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_frame(seed: u8) -> FrameRgba {
        FrameRgba {
            width: 4,
            height: 3,
            data: vec![seed; 4 * 3 * 4],
        }
    }

    fn cfg() -> SinkConfig {
        SinkConfig {
            canvas: Canvas {
                width: 4,
                height: 3,
            },
            fps: Fps::DEFAULT,
        }
    }

    #[test]
    fn concat_roundtrip_counts_stills() {
        let mut sink = ConcatSink::new();
        sink.begin(cfg()).unwrap();
        for i in 0..5u64 {
            sink.push_frame(FrameIndex(i), &tiny_frame(i as u8)).unwrap();
        }
        sink.end().unwrap();

        let artifact = sink.into_artifact().unwrap();
        assert_eq!(artifact.media_type, ARTIFACT_MEDIA_TYPE);
        assert!(!artifact.is_empty());
        assert_eq!(count_stills(&artifact).unwrap(), 5);
    }

    #[test]
    fn zero_frames_yield_empty_artifact() {
        let mut sink = ConcatSink::new();
        sink.begin(cfg()).unwrap();
        sink.end().unwrap();
        let artifact = sink.into_artifact().unwrap();
        assert!(artifact.is_empty());
        assert_eq!(count_stills(&artifact).unwrap(), 0);
    }

    #[test]
    fn unfinalized_sink_refuses_artifact_extraction() {
        let mut sink = ConcatSink::new();
        sink.begin(cfg()).unwrap();
        assert!(sink.into_artifact().is_err());
    }

    #[test]
    fn count_stills_rejects_garbage() {
        let artifact = VideoArtifact {
            media_type: ARTIFACT_MEDIA_TYPE.to_string(),
            data: vec![1, 2, 3, 4],
        };
        assert!(count_stills(&artifact).is_err());
    }

    #[test]
    fn count_stills_rejects_truncated_stream() {
        let mut sink = ConcatSink::new();
        sink.begin(cfg()).unwrap();
        sink.push_frame(FrameIndex(0), &tiny_frame(7)).unwrap();
        sink.end().unwrap();
        let mut artifact = sink.into_artifact().unwrap();
        artifact.data.truncate(artifact.data.len() - 3);
        assert!(count_stills(&artifact).is_err());
    }

    #[test]
    fn inmemory_sink_preserves_push_order() {
        let mut sink = InMemorySink::new();
        sink.begin(cfg()).unwrap();
        for i in 0..4u64 {
            sink.push_frame(FrameIndex(i), &tiny_frame(i as u8)).unwrap();
        }
        sink.end().unwrap();
        assert!(sink.ended);
        for (i, (idx, _)) in sink.frames.iter().enumerate() {
            assert_eq!(idx.0, i as u64);
        }
    }
}
