use crate::core::Rgba8;
use crate::instruction::{AnimationInstruction, InstructionKind};

pub const DEFAULT_CIRCLE_COLOR: Rgba8 = Rgba8::rgb(0x3b, 0x82, 0xf6);
pub const DEFAULT_VECTOR_COLOR: Rgba8 = Rgba8::rgb(0x8b, 0x5c, 0xf6);
pub const DEFAULT_GRID_CENTER_COLOR: Rgba8 = Rgba8::rgb(0x88, 0x88, 0x88);
pub const DEFAULT_GRID_LINE_COLOR: Rgba8 = Rgba8::rgb(0x44, 0x44, 0x44);

/// Compiled geometry for one instruction. Fixed for the session lifetime.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Outline-only disc drawn as a wireframe fan.
    Disc { radius: f64, color: Rgba8 },
    /// Directed arrow from the origin.
    Arrow { length: f64, color: Rgba8 },
    /// Planar reference grid with highlighted center lines.
    Grid {
        size: f64,
        divisions: u32,
        center_color: Rgba8,
        line_color: Rgba8,
    },
    /// No visible geometry. Occupies its slot so indices stay aligned.
    Empty,
}

/// Mutable per-frame transient state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pose {
    /// Rotation angle in radians (discs spin in-plane, grids about the
    /// vertical axis).
    Spin { angle: f64 },
    /// Current facing direction of an arrow. Seeded from the instruction at
    /// compile time and overwritten every frame by the XY sweep.
    Sweep { direction: [f64; 3] },
    Still,
}

/// Runtime entity derived from exactly one instruction.
///
/// The instruction, its shape, and its pose travel as one record so the
/// instruction/object index alignment cannot drift.
#[derive(Clone, Debug)]
pub struct SceneObject {
    instruction: AnimationInstruction,
    shape: Shape,
    pose: Pose,
}

impl SceneObject {
    pub fn instruction(&self) -> &AnimationInstruction {
        &self.instruction
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub(crate) fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }
}

fn normalized(direction: [f64; 3]) -> [f64; 3] {
    let [x, y, z] = direction;
    let norm = (x * x + y * y + z * z).sqrt();
    if norm > 0.0 {
        [x / norm, y / norm, z / norm]
    } else {
        direction
    }
}

fn compile_one(instruction: AnimationInstruction) -> SceneObject {
    let (shape, pose) = match instruction.kind {
        InstructionKind::Circle => (
            Shape::Disc {
                radius: instruction.param_f64("radius").unwrap_or(1.0),
                color: instruction
                    .param_color("color")
                    .unwrap_or(DEFAULT_CIRCLE_COLOR),
            },
            Pose::Spin { angle: 0.0 },
        ),
        InstructionKind::Vector => {
            let direction = normalized([
                instruction.param_f64("x").unwrap_or(0.0),
                instruction.param_f64("y").unwrap_or(1.0),
                instruction.param_f64("z").unwrap_or(0.0),
            ]);
            (
                Shape::Arrow {
                    length: instruction.param_f64("length").unwrap_or(1.0),
                    color: instruction
                        .param_color("color")
                        .unwrap_or(DEFAULT_VECTOR_COLOR),
                },
                Pose::Sweep { direction },
            )
        }
        InstructionKind::Matrix => (
            Shape::Grid {
                size: instruction.param_f64("size").unwrap_or(2.0),
                divisions: instruction
                    .param_f64("divisions")
                    .map(|d| d.max(1.0) as u32)
                    .unwrap_or(10),
                center_color: instruction
                    .param_color("color1")
                    .unwrap_or(DEFAULT_GRID_CENTER_COLOR),
                line_color: instruction
                    .param_color("color2")
                    .unwrap_or(DEFAULT_GRID_LINE_COLOR),
            },
            Pose::Spin { angle: 0.0 },
        ),
        // Transform and graph instructions carry no renderable geometry yet;
        // unknown kinds degrade the same way rather than failing the render.
        InstructionKind::Transform | InstructionKind::Graph | InstructionKind::Unknown => {
            (Shape::Empty, Pose::Still)
        }
    };

    SceneObject {
        instruction,
        shape,
        pose,
    }
}

/// Map instructions to index-aligned scene objects.
///
/// Pure construction, no I/O. `compile(xs).len() == xs.len()` always holds.
pub fn compile(instructions: Vec<AnimationInstruction>) -> Vec<SceneObject> {
    instructions.into_iter().map(compile_one).collect()
}
