use mathmotion::{
    AnimationInstruction, Canvas, CpuBackend, Fps, InMemorySink, InstructionKind, RenderOptions,
    RenderSession, count_stills, fallback_instructions, render_instructions, render_offline,
};

fn small_canvas() -> Canvas {
    Canvas {
        width: 64,
        height: 36,
    }
}

fn opts() -> RenderOptions {
    RenderOptions {
        canvas: small_canvas(),
        fps: Fps::DEFAULT,
    }
}

#[test]
fn matrix_prompt_with_service_unavailable_renders_150_stills() {
    // "Show matrix multiplication geometrically" falls back to a grid plus a
    // transform, both 5s, at 30fps.
    let prompt = "Show matrix multiplication geometrically";
    let instructions = fallback_instructions(prompt);
    assert_eq!(instructions.len(), 2);
    assert_eq!(instructions[0].kind, InstructionKind::Matrix);
    assert_eq!(instructions[1].kind, InstructionKind::Transform);

    let session = RenderSession::new(instructions, Fps::DEFAULT);
    assert_eq!(session.total_frames(), 150);

    let artifact = render_offline(prompt, &opts()).unwrap();
    assert_eq!(count_stills(&artifact).unwrap(), 150);
}

#[test]
fn empty_prompt_takes_the_default_branch_and_renders_150_frames() {
    let instructions = fallback_instructions("");
    assert_eq!(instructions.len(), 2);

    let session = RenderSession::new(instructions, Fps::DEFAULT);
    assert_eq!(session.total_frames(), 150);
}

#[test]
fn unknown_instruction_kinds_do_not_shift_indices_or_crash() {
    let instructions: Vec<AnimationInstruction> = serde_json::from_str(
        r#"[
            {"type":"circle","parameters":{"radius":1},"duration":1},
            {"type":"hyperbola","parameters":{},"duration":1},
            {"type":"vector","parameters":{"length":2},"duration":1}
        ]"#,
    )
    .unwrap();
    assert_eq!(instructions[1].kind, InstructionKind::Unknown);

    let session = RenderSession::new(instructions.clone(), Fps::DEFAULT);
    assert_eq!(session.objects().len(), 3);
    assert_eq!(
        session.objects()[2].instruction().kind,
        InstructionKind::Vector
    );

    let artifact = render_instructions(instructions, &opts()).unwrap();
    assert_eq!(count_stills(&artifact).unwrap(), 30);
}

#[test]
fn stills_reach_the_sink_in_capture_order() {
    let session = RenderSession::new(fallback_instructions("fourier"), Fps(4));
    assert_eq!(session.total_frames(), 20);

    let mut backend = CpuBackend::new(Canvas {
        width: 128,
        height: 72,
    })
    .unwrap();
    let mut sink = InMemorySink::new();
    session.run(&mut backend, &mut sink).unwrap();

    assert_eq!(sink.frames.len(), 20);
    for (i, (idx, _)) in sink.frames.iter().enumerate() {
        assert_eq!(idx.0, i as u64);
    }
    // The animation actually moves between adjacent frames. (Comparing
    // frames half a period apart would not do: the disc fan is symmetric
    // under rotation by whole segments.)
    assert_ne!(sink.frames[0].1.data, sink.frames[1].1.data);
}

#[test]
fn artifact_roundtrip_reports_exactly_total_frames() {
    for prompt in ["eigen", "vector projection", "something else entirely"] {
        let instructions = fallback_instructions(prompt);
        let session = RenderSession::new(instructions.clone(), Fps::DEFAULT);
        let expected = session.total_frames();

        let artifact = render_offline(prompt, &opts()).unwrap();
        assert_eq!(count_stills(&artifact).unwrap(), expected);
    }
}

#[test]
fn empty_instruction_list_renders_an_empty_artifact() {
    let artifact = render_instructions(Vec::new(), &opts()).unwrap();
    assert!(artifact.is_empty());
    assert_eq!(count_stills(&artifact).unwrap(), 0);
}
