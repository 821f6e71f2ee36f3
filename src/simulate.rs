use crate::core::{FrameIndex, Fps};
use crate::encode::{FrameSink, SinkConfig};
use crate::error::MathmotionResult;
use crate::instruction::{AnimationInstruction, InstructionKind, sanitize};
use crate::render::RenderBackend;
use crate::scene::{Pose, SceneObject, compile};

/// One end-to-end frame simulation over a virtual clock.
///
/// The session owns its scene objects exclusively for its lifetime. The total
/// timeline spans the longest instruction duration; every object's phase is
/// computed against its own duration, so shorter-duration objects complete
/// more full cycles before the session ends. That looping is inherited
/// behavior and is pinned by tests below.
pub struct RenderSession {
    objects: Vec<SceneObject>,
    fps: Fps,
    total_duration_secs: f64,
    total_frames: u64,
}

impl RenderSession {
    /// Build a session from a generated instruction sequence.
    ///
    /// Instructions pass through the lenient validator first; an empty
    /// sequence is a valid zero-frame session, not an error.
    pub fn new(instructions: Vec<AnimationInstruction>, fps: Fps) -> Self {
        let instructions = sanitize(instructions);
        let total_duration_secs = instructions
            .iter()
            .map(|i| i.duration_secs)
            .fold(0.0, f64::max);
        let total_frames = fps.secs_to_frames(total_duration_secs);
        let objects = compile(instructions);
        tracing::debug!(
            objects = objects.len(),
            total_duration_secs,
            total_frames,
            "render session prepared"
        );
        Self {
            objects,
            fps,
            total_duration_secs,
            total_frames,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Advance every object to `elapsed` seconds since session start.
    pub(crate) fn step(&mut self, elapsed: f64) {
        for object in &mut self.objects {
            let kind = object.instruction().kind;
            // Phase uses the instruction's own duration, not the session's.
            let phase = (elapsed / object.instruction().duration_secs) * std::f64::consts::TAU;
            match kind {
                InstructionKind::Circle => object.set_pose(Pose::Spin { angle: phase }),
                InstructionKind::Vector => {
                    // The sweep overwrites whatever direction seeded the
                    // object at compile time.
                    object.set_pose(Pose::Sweep {
                        direction: [phase.cos(), phase.sin(), 0.0],
                    });
                }
                InstructionKind::Matrix => object.set_pose(Pose::Spin { angle: phase }),
                InstructionKind::Graph
                | InstructionKind::Transform
                | InstructionKind::Unknown => {}
            }
        }
    }

    /// Run the per-frame loop to completion, consuming the session.
    ///
    /// All objects are updated before each capture; stills reach the sink in
    /// strict frame order. Any capture or sink failure aborts the whole
    /// render with no partial artifact. Returns the number of frames pushed.
    pub fn run(
        mut self,
        backend: &mut dyn RenderBackend,
        sink: &mut dyn FrameSink,
    ) -> MathmotionResult<u64> {
        sink.begin(SinkConfig {
            canvas: backend.canvas(),
            fps: self.fps,
        })?;

        for frame in 0..self.total_frames {
            let elapsed = self.fps.frame_to_secs(frame);
            self.step(elapsed);
            let still = backend.capture(&self.objects)?;
            sink.push_frame(FrameIndex(frame), &still)?;
        }

        sink.end()?;
        Ok(self.total_frames)
    }
}
