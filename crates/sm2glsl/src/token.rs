//! Bit-field decoders for the 32-bit token stream.
//!
//! These are pure: they split a token into fields and leave every legality
//! decision to the parser.

use crate::swizzle::{Swizzle, WriteMask};

pub(crate) const END_TOKEN: u32 = 0x0000_FFFF;
pub(crate) const PHASE_TOKEN: u32 = 0x0000_FFFD;
pub(crate) const COMMENT_OPCODE: u32 = 0xFFFE;

pub(crate) const PIXEL_SHADER_TYPE: u32 = 0xFFFF;
pub(crate) const VERTEX_SHADER_TYPE: u32 = 0xFFFE;

/// Reads little-endian 32-bit tokens. Trailing bytes that don't fill a token are ignored.
pub fn tokens_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Register type is split across bits 28..30 (low three bits) and 11..12 (high two bits).
pub(crate) fn register_type_bits(token: u32) -> u32 {
    ((token >> 28) & 0x7) | ((token >> 8) & 0x18)
}

/// Packs `(major, minor)` so that ordinary integer comparison orders shader models.
/// A minor version of 0xFF (the `_sw` variants) packs as minor 1.
pub fn packed_version(major: u8, minor: u8) -> u32 {
    let minor = if minor == 0xFF { 1 } else { minor as u32 };
    ((major as u32) << 16) | minor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VersionToken {
    pub shader_type: u32,
    pub major: u8,
    pub minor: u8,
}

impl VersionToken {
    pub fn decode(token: u32) -> Self {
        Self {
            shader_type: token >> 16,
            major: ((token >> 8) & 0xFF) as u8,
            minor: (token & 0xFF) as u8,
        }
    }
}

/// Returns `(length_in_tokens, high_bit_set)` when `token` opens a comment block.
pub(crate) fn comment_token(token: u32) -> Option<(u32, bool)> {
    if token & 0xFFFF == COMMENT_OPCODE {
        Some(((token >> 16) & 0xFFFF, token & 0x8000_0000 != 0))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InstructionToken {
    pub opcode: u32,
    pub controls: u32,
    pub extra_tokens: u32,
    pub predicated: bool,
    pub coissue: bool,
    pub reserved: bool,
}

impl InstructionToken {
    pub fn decode(token: u32) -> Self {
        Self {
            opcode: token & 0xFFFF,
            controls: (token >> 16) & 0xFF,
            extra_tokens: (token >> 24) & 0xF,
            predicated: (token >> 28) & 0x1 != 0,
            coissue: (token >> 30) & 0x1 != 0,
            reserved: (token >> 31) & 0x1 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DestToken {
    pub reg_num: u32,
    pub reg_type: u32,
    pub relative: bool,
    pub write_mask: WriteMask,
    pub result_mod: u8,
    pub result_shift: u8,
    pub reserved1: u32,
    pub reserved2: u32,
}

impl DestToken {
    pub fn decode(token: u32) -> Self {
        Self {
            reg_num: token & 0x7FF,
            reg_type: register_type_bits(token),
            relative: (token >> 13) & 0x1 != 0,
            write_mask: WriteMask(((token >> 16) & 0xF) as u8),
            result_mod: ((token >> 20) & 0xF) as u8,
            result_shift: ((token >> 24) & 0xF) as u8,
            reserved1: (token >> 14) & 0x3,
            reserved2: (token >> 31) & 0x1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceToken {
    pub reg_num: u32,
    pub reg_type: u32,
    pub relative: bool,
    pub swizzle: Swizzle,
    pub source_mod: u32,
    pub reserved1: u32,
    pub reserved2: u32,
}

impl SourceToken {
    pub fn decode(token: u32) -> Self {
        Self {
            reg_num: token & 0x7FF,
            reg_type: register_type_bits(token),
            relative: (token >> 13) & 0x1 != 0,
            swizzle: Swizzle(((token >> 16) & 0xFF) as u8),
            source_mod: (token >> 24) & 0xF,
            reserved1: (token >> 14) & 0x3,
            reserved2: (token >> 31) & 0x1,
        }
    }
}

/// Second token of a relative source operand (shader model 2 and later).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RelativeToken {
    pub reg_num: u32,
    pub reg_type: u32,
    pub swizzle: Swizzle,
    pub high_bit: bool,
    pub reserved: u32,
}

impl RelativeToken {
    pub fn decode(token: u32) -> Self {
        Self {
            reg_num: token & 0x7FF,
            reg_type: register_type_bits(token),
            swizzle: Swizzle(((token >> 16) & 0xFF) as u8),
            high_bit: (token >> 31) & 0x1 != 0,
            reserved: token & 0x0F00_E000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_version_orders_shader_models() {
        let mut prev = None;
        for major in 0..=3u8 {
            for minor in 0..=254u8 {
                let v = packed_version(major, minor);
                if let Some(p) = prev {
                    assert!(v > p, "{major}.{minor}");
                }
                prev = Some(v);
            }
        }
        // vs_3_sw sorts between 3.0 and 3.2.
        assert_eq!(packed_version(3, 0xFF), packed_version(3, 1));
        assert!(packed_version(3, 0xFF) < packed_version(3, 2));
        assert!(packed_version(3, 0xFF) > packed_version(3, 0));
        assert!(packed_version(2, 0xFF) < packed_version(3, 0));
    }

    #[test]
    fn decodes_destination_fields() {
        // dcl_texcoord0_centroid_sat o3.xz (reg type 6)
        let token = 0x8000_0000 | (6 << 28) | (0b0101 << 16) | (0b0101 << 20) | 3;
        let dst = DestToken::decode(token);
        assert_eq!(dst.reg_type, 6);
        assert_eq!(dst.reg_num, 3);
        assert_eq!(dst.write_mask, WriteMask(0b0101));
        assert_eq!(dst.result_mod, 0b0101);
        assert!(!dst.relative);
        assert_eq!(dst.reserved2, 1);
    }

    #[test]
    fn decodes_split_register_type() {
        // Predicate (19 = 0b10011) needs both halves of the split field.
        let token = 0x8000_0000 | ((19 & 0x7) << 28) | ((19 & 0x18) << 8);
        assert_eq!(SourceToken::decode(token).reg_type, 19);
    }

    #[test]
    fn recognizes_comment_tokens() {
        assert_eq!(comment_token(0x0003_FFFE), Some((3, false)));
        assert_eq!(comment_token(0x8001_FFFE), Some((0x8001, true)));
        assert_eq!(comment_token(END_TOKEN), None);
    }

    #[test]
    fn reads_little_endian_tokens() {
        let bytes = [0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0xAA];
        assert_eq!(tokens_from_bytes(&bytes), vec![0xFFFF_0200, 0x0000_FFFF]);
    }
}
