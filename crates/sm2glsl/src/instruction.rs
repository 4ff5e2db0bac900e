//! Decoded operands of the instruction currently being processed.
//!
//! These are rebuilt for every instruction token and never outlive it.

use crate::opcode::Opcode;
use crate::swizzle::{Swizzle, WriteMask};
use crate::types::{RegisterType, ResultMod, SourceMod};

/// Source slots: up to four encoded operands, plus one synthesized matrix row.
pub(crate) const MAX_SOURCE_ARGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DestArg {
    pub token: u32,
    pub reg_type: RegisterType,
    pub reg_num: u32,
    pub relative: bool,
    /// Effective mask; narrowed to `.x` for scalar registers.
    pub write_mask: WriteMask,
    pub orig_mask: WriteMask,
    pub result_mod: ResultMod,
    pub result_shift: u8,
}

impl Default for DestArg {
    fn default() -> Self {
        Self {
            token: 0,
            reg_type: RegisterType::Temp,
            reg_num: 0,
            relative: false,
            write_mask: WriteMask(0),
            orig_mask: WriteMask(0),
            result_mod: ResultMod::empty(),
            result_shift: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceArg {
    pub token: u32,
    pub reg_type: RegisterType,
    pub reg_num: u32,
    pub swizzle: Swizzle,
    pub src_mod: SourceMod,
    pub relative: bool,
    pub relative_reg_type: RegisterType,
    pub relative_reg_num: u32,
    pub relative_component: u8,
    /// Constant array (index into the context's variables) a relative read resolved into.
    pub relative_array: Option<usize>,
}

impl Default for SourceArg {
    fn default() -> Self {
        Self {
            token: 0,
            reg_type: RegisterType::Temp,
            reg_num: 0,
            swizzle: Swizzle::NONE,
            src_mod: SourceMod::None,
            relative: false,
            relative_reg_type: RegisterType::Temp,
            relative_reg_num: 0,
            relative_component: 0,
            relative_array: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Instruction {
    pub opcode: Opcode,
    pub controls: u32,
    pub coissue: bool,
    pub predicated: bool,
    pub dst: DestArg,
    pub src: [SourceArg; MAX_SOURCE_ARGS],
    pub predicate: Option<SourceArg>,
    /// Literal payload of `def`/`defi`/`defb`, or usage and index of a `dcl`.
    pub dwords: [u32; 4],
}

impl Instruction {
    pub fn new(opcode: Opcode, controls: u32, coissue: bool, predicated: bool) -> Self {
        Self {
            opcode,
            controls,
            coissue,
            predicated,
            dst: DestArg::default(),
            src: [SourceArg::default(); MAX_SOURCE_ARGS],
            predicate: None,
            dwords: [0; 4],
        }
    }
}
