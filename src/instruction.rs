use std::collections::BTreeMap;

use crate::core::Rgba8;

/// Duration substituted for instructions whose own duration is unusable.
pub const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Closed set of animation kinds the pipeline understands.
///
/// Instruction sequences cross an untrusted boundary (a language model wrote
/// them), so any unrecognized kind deserializes to [`InstructionKind::Unknown`]
/// instead of failing. Unknown instructions keep their slot in the sequence
/// and compile to a non-contributing scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Circle,
    Vector,
    Matrix,
    Graph,
    Transform,
    Unknown,
}

impl InstructionKind {
    fn from_name(name: &str) -> Self {
        match name {
            "circle" => Self::Circle,
            "vector" => Self::Vector,
            "matrix" => Self::Matrix,
            "graph" => Self::Graph,
            "transform" => Self::Transform,
            _ => Self::Unknown,
        }
    }
}

impl<'de> serde::Deserialize<'de> for InstructionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// One typed, parameterized description of an animated element.
///
/// Immutable once produced by the generator; the compiler and simulator only
/// read it. Every parameter is optional and carries a kind-specific default
/// applied at compile time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationInstruction {
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "duration", default = "default_duration")]
    pub duration_secs: f64,
}

fn default_duration() -> f64 {
    DEFAULT_DURATION_SECS
}

impl AnimationInstruction {
    pub fn new(kind: InstructionKind) -> Self {
        Self {
            kind,
            parameters: BTreeMap::new(),
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Numeric parameter, if present and actually numeric.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Color parameter, accepted as a packed `0xRRGGBB` number or a
    /// `"#rrggbb"` / `"0xrrggbb"` string.
    pub fn param_color(&self, key: &str) -> Option<Rgba8> {
        match self.parameters.get(key)? {
            serde_json::Value::Number(n) => {
                let packed = n.as_u64()?;
                u32::try_from(packed).ok().map(Rgba8::from_packed_rgb)
            }
            serde_json::Value::String(s) => Rgba8::parse(s),
            _ => None,
        }
    }
}

/// Correct malformed per-instruction fields instead of failing the render.
///
/// A non-finite or non-positive duration becomes [`DEFAULT_DURATION_SECS`].
/// Unknown kinds pass through untouched; they resolve to neutral objects at
/// compile time.
pub fn sanitize(mut instructions: Vec<AnimationInstruction>) -> Vec<AnimationInstruction> {
    for instruction in &mut instructions {
        if !(instruction.duration_secs.is_finite() && instruction.duration_secs > 0.0) {
            tracing::warn!(
                kind = ?instruction.kind,
                duration = instruction.duration_secs,
                "instruction duration is unusable, substituting default"
            );
            instruction.duration_secs = DEFAULT_DURATION_SECS;
        }
    }
    instructions
}
