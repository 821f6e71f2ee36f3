//! Instruction generation: remote model first, deterministic keywords on any
//! failure.
//!
//! The generator is total. Whatever the remote source does — transport
//! errors, malformed envelopes, unparseable payloads, empty sequences — the
//! caller always receives a usable instruction sequence.

use async_trait::async_trait;

use crate::gemini::{GeminiClient, GeminiConfig};
use crate::instruction::{AnimationInstruction, InstructionKind, sanitize};

/// Fixed format directive sent alongside every prompt.
pub const INSTRUCTION_DIRECTIVE: &str = "Convert this mathematical concept into a sequence of \
animation instructions. Format the response as a JSON array of animation objects with 'type', \
'parameters', and 'duration' fields. Only use these animation types: 'circle', 'vector', \
'matrix', 'graph', 'transform'.";

/// Errors internal to the generator. They select the fallback path and never
/// reach the pipeline caller.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// A strategy producing instruction sequences from a prompt.
#[async_trait]
pub trait InstructionSource: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<AnimationInstruction>, GenerateError>;
}

/// Remote source backed by the Gemini `generateContent` API.
pub struct GeminiSource {
    client: GeminiClient,
}

impl GeminiSource {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerateError> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }
}

#[async_trait]
impl InstructionSource for GeminiSource {
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<Vec<AnimationInstruction>, GenerateError> {
        let text = self
            .client
            .complete(&format!("{INSTRUCTION_DIRECTIVE} Prompt: {prompt}"))
            .await?;
        parse_instructions(&text)
    }
}

/// Fixed response source for tests and examples.
pub struct MockSource {
    pub response: Result<String, String>,
}

#[async_trait]
impl InstructionSource for MockSource {
    async fn generate(
        &self,
        _prompt: &str,
    ) -> Result<Vec<AnimationInstruction>, GenerateError> {
        match &self.response {
            Ok(text) => parse_instructions(text),
            Err(msg) => Err(GenerateError::Http(msg.clone())),
        }
    }
}

/// Parse a model reply into an instruction sequence.
///
/// The reply is free text that should contain a JSON array; models routinely
/// wrap it in markdown fences, so bracket extraction runs first. An empty
/// array counts as malformed — the generator contract says never empty.
pub fn parse_instructions(text: &str) -> Result<Vec<AnimationInstruction>, GenerateError> {
    let json = extract_json_array(text)
        .ok_or_else(|| GenerateError::Parse("reply did not contain a JSON array".to_string()))?;
    let instructions: Vec<AnimationInstruction> =
        serde_json::from_str(&json).map_err(|e| GenerateError::Parse(e.to_string()))?;
    if instructions.is_empty() {
        return Err(GenerateError::Response(
            "reply contained an empty instruction array".to_string(),
        ));
    }
    Ok(instructions)
}

fn extract_json_array(text: &str) -> Option<String> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].to_string())
}

/// Deterministic keyword fallback: a pure function of the lower-cased prompt.
///
/// Predicates are ordered and first-match-wins; a prompt mentioning both
/// "matrix" and "eigen" takes the eigen branch.
pub fn fallback_instructions(prompt: &str) -> Vec<AnimationInstruction> {
    let prompt = prompt.to_lowercase();

    if prompt.contains("eigen") {
        vec![
            AnimationInstruction::new(InstructionKind::Vector)
                .with_param("x", 1.0)
                .with_param("y", 0.0)
                .with_param("z", 0.0)
                .with_param("length", 2.0)
                .with_param("color", 0xff0000),
            AnimationInstruction::new(InstructionKind::Vector)
                .with_param("x", 0.0)
                .with_param("y", 1.0)
                .with_param("z", 0.0)
                .with_param("length", 1.0)
                .with_param("color", 0x00ff00),
            AnimationInstruction::new(InstructionKind::Matrix)
                .with_param("size", 3.0)
                .with_param("divisions", 10.0),
        ]
    } else if prompt.contains("fourier") || prompt.contains("series") {
        vec![
            AnimationInstruction::new(InstructionKind::Circle)
                .with_param("radius", 1.0)
                .with_param("color", 0x3b82f6),
            AnimationInstruction::new(InstructionKind::Circle)
                .with_param("radius", 0.5)
                .with_param("color", 0x8b5cf6),
        ]
    } else if prompt.contains("matrix") || prompt.contains("transformation") {
        vec![
            AnimationInstruction::new(InstructionKind::Matrix)
                .with_param("size", 3.0)
                .with_param("divisions", 10.0)
                .with_param("color1", 0x888888)
                .with_param("color2", 0x444444),
            AnimationInstruction::new(InstructionKind::Transform)
                .with_param("scale", 2.0)
                .with_param("rotate", std::f64::consts::FRAC_PI_4),
        ]
    } else if prompt.contains("vector") || prompt.contains("projection") {
        vec![
            AnimationInstruction::new(InstructionKind::Vector)
                .with_param("x", 1.0)
                .with_param("y", 1.0)
                .with_param("z", 0.0)
                .with_param("length", 2.0)
                .with_param("color", 0x3b82f6),
            AnimationInstruction::new(InstructionKind::Vector)
                .with_param("x", 1.0)
                .with_param("y", 0.0)
                .with_param("z", 0.0)
                .with_param("length", 1.0)
                .with_param("color", 0xff0000),
        ]
    } else {
        vec![
            AnimationInstruction::new(InstructionKind::Circle)
                .with_param("radius", 1.5)
                .with_param("color", 0x3b82f6),
            AnimationInstruction::new(InstructionKind::Vector)
                .with_param("x", 1.0)
                .with_param("y", 1.0)
                .with_param("z", 0.0)
                .with_param("length", 2.0)
                .with_param("color", 0x8b5cf6),
        ]
    }
}

/// Failure-driven dispatch between the remote source and the keyword
/// fallback.
pub struct Generator {
    source: Option<Box<dyn InstructionSource>>,
}

impl Generator {
    /// Generator without a remote source: always the deterministic path.
    pub fn offline() -> Self {
        Self { source: None }
    }

    pub fn with_source(source: Box<dyn InstructionSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Remote generator when `GEMINI_API_KEY` is configured, offline
    /// otherwise.
    pub fn from_env() -> Self {
        match GeminiConfig::from_env().map(GeminiSource::new) {
            Some(Ok(source)) => Self::with_source(Box::new(source)),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "remote source unavailable, running offline");
                Self::offline()
            }
            None => Self::offline(),
        }
    }

    /// Produce a non-empty instruction sequence for `prompt`. Never fails.
    pub async fn generate(&self, prompt: &str) -> Vec<AnimationInstruction> {
        if let Some(source) = &self.source {
            match source.generate(prompt).await {
                Ok(instructions) if !instructions.is_empty() => {
                    tracing::info!(
                        count = instructions.len(),
                        "instructions generated by remote source"
                    );
                    return sanitize(instructions);
                }
                Ok(_) => {
                    tracing::warn!("remote source returned no instructions, using fallback");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote generation failed, using fallback");
                }
            }
        }
        sanitize(fallback_instructions(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_pure_and_case_insensitive() {
        let a = fallback_instructions("Visualize EIGENVALUES");
        let b = fallback_instructions("visualize eigenvalues");
        assert_eq!(a, b);
    }

    #[test]
    fn eigen_branch_yields_two_vectors_and_a_grid() {
        let instructions = fallback_instructions("show me an eigenvector");
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].kind, InstructionKind::Vector);
        assert_eq!(instructions[0].param_f64("length"), Some(2.0));
        assert_eq!(instructions[1].kind, InstructionKind::Vector);
        assert_eq!(instructions[1].param_f64("length"), Some(1.0));
        assert_eq!(instructions[2].kind, InstructionKind::Matrix);
        assert_eq!(instructions[2].param_f64("size"), Some(3.0));
        assert_eq!(instructions[2].param_f64("divisions"), Some(10.0));
        assert!(instructions.iter().all(|i| i.duration_secs == 5.0));
    }

    #[test]
    fn eigen_takes_precedence_over_matrix() {
        // Predicate order is load-bearing: both keywords present, the eigen
        // branch wins because it is evaluated first.
        let instructions = fallback_instructions("eigen decomposition of a matrix");
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].kind, InstructionKind::Vector);
    }

    #[test]
    fn fourier_and_series_share_the_circle_branch() {
        for prompt in ["fourier analysis", "taylor series expansion"] {
            let instructions = fallback_instructions(prompt);
            assert_eq!(instructions.len(), 2);
            assert_eq!(instructions[0].kind, InstructionKind::Circle);
            assert_eq!(instructions[0].param_f64("radius"), Some(1.0));
            assert_eq!(instructions[1].param_f64("radius"), Some(0.5));
        }
    }

    #[test]
    fn matrix_branch_pairs_grid_with_transform() {
        let instructions = fallback_instructions("Show matrix multiplication geometrically");
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].kind, InstructionKind::Matrix);
        assert_eq!(instructions[0].param_f64("size"), Some(3.0));
        assert_eq!(instructions[0].param_f64("divisions"), Some(10.0));
        assert_eq!(instructions[1].kind, InstructionKind::Transform);
        assert_eq!(instructions[1].param_f64("scale"), Some(2.0));
        assert_eq!(
            instructions[1].param_f64("rotate"),
            Some(std::f64::consts::FRAC_PI_4)
        );
    }

    #[test]
    fn vector_branch_yields_two_vectors() {
        let instructions = fallback_instructions("projection of a vector");
        assert_eq!(instructions.len(), 2);
        assert!(
            instructions
                .iter()
                .all(|i| i.kind == InstructionKind::Vector)
        );
    }

    #[test]
    fn empty_prompt_takes_the_default_branch() {
        let instructions = fallback_instructions("");
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].kind, InstructionKind::Circle);
        assert_eq!(instructions[0].param_f64("radius"), Some(1.5));
        assert_eq!(instructions[1].kind, InstructionKind::Vector);
        assert_eq!(instructions[1].param_f64("length"), Some(2.0));
    }

    #[test]
    fn parse_instructions_handles_fenced_output() {
        let reply = "Here you go:\n```json\n[{\"type\":\"circle\",\"parameters\":{\"radius\":2},\"duration\":4}]\n```";
        let instructions = parse_instructions(reply).unwrap();
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].kind, InstructionKind::Circle);
        assert_eq!(instructions[0].param_f64("radius"), Some(2.0));
        assert_eq!(instructions[0].duration_secs, 4.0);
    }

    #[test]
    fn parse_instructions_rejects_missing_or_empty_arrays() {
        assert!(parse_instructions("no json here").is_err());
        assert!(parse_instructions("[]").is_err());
        assert!(parse_instructions("[{\"duration\":]").is_err());
    }

    #[tokio::test]
    async fn remote_failure_falls_back_silently() {
        let generator = Generator::with_source(Box::new(MockSource {
            response: Err("connection refused".to_string()),
        }));
        let instructions = generator.generate("fourier series").await;
        // The keyword path answered instead.
        assert_eq!(instructions, fallback_instructions("fourier series"));
    }

    #[tokio::test]
    async fn malformed_remote_payload_falls_back() {
        let generator = Generator::with_source(Box::new(MockSource {
            response: Ok("the model apologizes instead of answering".to_string()),
        }));
        let instructions = generator.generate("").await;
        assert_eq!(instructions, fallback_instructions(""));
    }

    #[tokio::test]
    async fn remote_instructions_are_sanitized() {
        let generator = Generator::with_source(Box::new(MockSource {
            response: Ok(
                r#"[{"type":"circle","parameters":{},"duration":-2},{"type":"warp","duration":3}]"#
                    .to_string(),
            ),
        }));
        let instructions = generator.generate("anything").await;
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].duration_secs, 5.0);
        assert_eq!(instructions[1].kind, InstructionKind::Unknown);
        assert_eq!(instructions[1].duration_secs, 3.0);
    }

    #[tokio::test]
    async fn offline_generator_uses_keywords_directly() {
        let generator = Generator::offline();
        let instructions = generator.generate("eigen basis").await;
        assert_eq!(instructions.len(), 3);
    }
}
