mod common;

use common::*;
use sm2glsl::{ErrorPosition, ParseOptions, ShaderType};

#[test]
fn truncated_instruction() {
    // vs_2_0 `mov` claiming two operands with only the destination present.
    let data = translate("glsl", vec![vs(2, 0), op(1, 2), dst(TEMP, 0, FULL)]);
    assert!(
        messages(&data).contains(&"Corrupted or truncated shader"),
        "{:?}",
        messages(&data)
    );
    assert!(data.output.is_empty());
}

#[test]
fn not_a_shader() {
    let data = translate("glsl", vec![0x1234_0101, END]);
    insta::assert_snapshot!(
        data.errors[0].to_string(),
        @"Unsupported shader type or not a shader at all in <unknown> at -2 (0xFFFFFFFE)"
    );
    assert_eq!(data.errors.len(), 1);
    assert_eq!(data.instruction_count, 0);
    assert_eq!(data.shader_type, ShaderType::empty());
}

#[test]
fn unsupported_shader_model() {
    let data = translate("glsl", vec![vs(4, 0), END]);
    assert_eq!(
        messages(&data).first().copied(),
        Some("Shader Model 4.0 is currently unsupported.")
    );
}

#[test]
fn else_without_if_reports_the_instruction_offset() {
    // vs_2_0
    //   else
    let data = translate("glsl", vec![vs(2, 0), op(42, 0), END]);
    insta::assert_snapshot!(
        data.errors[0].to_string(),
        @"ELSE without IF in <unknown> at 4 (0x00000004)"
    );
    assert_eq!(data.errors.len(), 1);
}

#[test]
fn unbalanced_flow_control_keeps_collecting_errors() {
    // vs_2_0
    //   endif
    //   endloop
    //   endrep
    let tokens = vec![vs(2, 0), op(43, 0), op(29, 0), op(39, 0), END];
    let data = translate("glsl", tokens);
    assert_eq!(
        messages(&data),
        vec!["ENDIF without IF", "ENDLOOP without LOOP", "ENDREP without REP"]
    );
    let offsets: Vec<ErrorPosition> = data.errors.iter().map(|e| e.position).collect();
    assert_eq!(
        offsets,
        vec![
            ErrorPosition::Offset(4),
            ErrorPosition::Offset(8),
            ErrorPosition::Offset(12)
        ]
    );
}

#[test]
fn temp_read_before_write() {
    // vs_2_0
    //   mov oPos, r3
    let tokens = vec![vs(2, 0), op(1, 2), dst(RASTOUT, 0, FULL), src(TEMP, 3), END];
    let data = translate("glsl", tokens);
    assert_eq!(
        messages(&data),
        vec!["Temp register r3 used uninitialized"]
    );
}

#[test]
fn coissue_is_pixel_shader_1_x_only() {
    // vs_1_1
    //   +mov oPos, v0
    let tokens = vec![
        vs(1, 1),
        op(1, 0) | (1 << 30),
        dst(RASTOUT, 0, FULL),
        src(INPUT, 0),
        END,
    ];
    let data = translate("glsl", tokens);
    assert!(
        messages(&data).contains(&"coissue instruction on non-pixel shader"),
        "{:?}",
        messages(&data)
    );
}

#[test]
fn filename_is_attached_to_errors() {
    let options = ParseOptions::default().with_filename("broken.pso");
    let data = translate_with("glsl", vec![ps(2, 0), op(42, 0), END], &options);
    insta::assert_snapshot!(
        data.errors[0].to_string(),
        @"ELSE without IF in broken.pso at 4 (0x00000004)"
    );
}

#[test]
fn trailing_tokens_after_end() {
    let data = translate("glsl", vec![vs(2, 0), END, op(0, 0)]);
    assert!(!data.is_ok());
}

#[test]
fn stream_without_end_token_fails() {
    // ps_1_1
    //   mov r0, v0
    let data = translate("glsl", vec![ps(1, 1), op(1, 0), dst(TEMP, 0, FULL), src(INPUT, 0)]);
    assert_eq!(messages(&data), vec!["shader has no end token"]);
    assert_eq!(data.errors[0].position, ErrorPosition::After);
    assert!(data.output.is_empty());
}
