//! Hand-assembled token streams for the integration tests.
#![allow(dead_code)]

use sm2glsl::{ParseData, ParseOptions};

pub const TEMP: u32 = 0;
pub const INPUT: u32 = 1;
pub const CONST: u32 = 2;
pub const ADDR: u32 = 3;
pub const TEXTURE: u32 = 3;
pub const RASTOUT: u32 = 4;
pub const ATTROUT: u32 = 5;
pub const OUTPUT: u32 = 6;
pub const CONSTINT: u32 = 7;
pub const COLOROUT: u32 = 8;
pub const SAMPLER: u32 = 10;
pub const CONSTBOOL: u32 = 14;
pub const LOOP: u32 = 15;
pub const LABEL: u32 = 18;
pub const PREDICATE: u32 = 19;

pub const END: u32 = 0x0000_FFFF;
pub const NO_SWIZZLE: u32 = 0xE4;
pub const FULL: u32 = 0xF;

pub fn ps(major: u32, minor: u32) -> u32 {
    0xFFFF_0000 | (major << 8) | minor
}

pub fn vs(major: u32, minor: u32) -> u32 {
    0xFFFE_0000 | (major << 8) | minor
}

/// Instruction token; `extra` counts the tokens after it (zero below shader model 2).
pub fn op(opcode: u32, extra: u32) -> u32 {
    opcode | (extra << 24)
}

fn reg(reg_type: u32, num: u32) -> u32 {
    0x8000_0000 | ((reg_type & 0x7) << 28) | ((reg_type & 0x18) << 8) | num
}

pub fn dst(reg_type: u32, num: u32, mask: u32) -> u32 {
    reg(reg_type, num) | (mask << 16)
}

pub fn src(reg_type: u32, num: u32) -> u32 {
    src_swizzled(reg_type, num, NO_SWIZZLE)
}

pub fn src_swizzled(reg_type: u32, num: u32, swizzle: u32) -> u32 {
    reg(reg_type, num) | (swizzle << 16)
}

/// Source read through an address register; follow with [`relative`].
pub fn src_relative(reg_type: u32, num: u32) -> u32 {
    src(reg_type, num) | (1 << 13)
}

/// Relative-address token selecting `component` of the address register.
pub fn relative(reg_type: u32, num: u32, component: u32) -> u32 {
    let replicate = component | (component << 2) | (component << 4) | (component << 6);
    src_swizzled(reg_type, num, replicate)
}

/// Usage/index token of a `dcl`.
pub fn dcl(usage: u32, index: u32) -> u32 {
    0x8000_0000 | usage | (index << 16)
}

/// Texture-type token of a `dcl_2d`/`dcl_cube`/`dcl_volume`.
pub fn dcl_sampler(texture_type: u32) -> u32 {
    0x8000_0000 | (texture_type << 27)
}

pub fn f(value: f32) -> u32 {
    value.to_bits()
}

/// Comment token followed by `body`.
pub fn comment(body: &[u32]) -> Vec<u32> {
    let mut block = vec![((body.len() as u32) << 16) | 0xFFFE];
    block.extend_from_slice(body);
    block
}

/// Little-endian four-character block id.
pub fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

/// Wraps `table` in a `CTAB` comment block.
pub fn ctab_comment(table: &[u8]) -> Vec<u32> {
    let mut padded = table.to_vec();
    while padded.len() % 4 != 0 {
        padded.push(0);
    }
    let mut body = vec![fourcc(b"CTAB")];
    body.extend(
        padded
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
    );
    comment(&body)
}

pub fn translate(profile: &str, tokens: Vec<u32>) -> ParseData {
    translate_with(profile, tokens, &ParseOptions::default())
}

pub fn translate_with(profile: &str, tokens: Vec<u32>, options: &ParseOptions) -> ParseData {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    sm2glsl::parse_tokens(profile, tokens, options).expect("known profile")
}

pub fn messages(data: &ParseData) -> Vec<&str> {
    data.errors.iter().map(|e| e.message.as_str()).collect()
}

/// Asserts a clean parse and returns the generated source.
pub fn glsl(data: &ParseData) -> &str {
    assert!(data.errors.is_empty(), "unexpected errors: {:?}", messages(data));
    &data.output
}
