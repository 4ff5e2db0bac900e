//! Static per-opcode metadata.

use crate::types::ShaderType;

/// Operand layout following an instruction token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgShape {
    Null,
    D,
    S,
    Ss,
    Ds,
    Dss,
    Dsss,
    Dssss,
    Dcl,
    SinCos,
    DefB,
    DefI,
    TexCrd,
    Def,
    TexLd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OpcodeInfo {
    /// Upper-case mnemonic used in diagnostics; empty for reserved slots.
    pub name: &'static str,
    /// Instruction slots charged against the shader's budget.
    pub slots: u32,
    pub args: ArgShape,
    pub shader_types: ShaderType,
    /// Components written when the destination doesn't say otherwise.
    pub write_mask: u8,
}

const fn info(name: &'static str, slots: u32, args: ArgShape) -> OpcodeInfo {
    OpcodeInfo {
        name,
        slots,
        args,
        shader_types: ShaderType::ANY,
        write_mask: 0xF,
    }
}

const fn pixel(name: &'static str, slots: u32, args: ArgShape) -> OpcodeInfo {
    OpcodeInfo {
        shader_types: ShaderType::PIXEL,
        ..info(name, slots, args)
    }
}

const fn vertex(name: &'static str, slots: u32, args: ArgShape) -> OpcodeInfo {
    OpcodeInfo {
        shader_types: ShaderType::VERTEX,
        ..info(name, slots, args)
    }
}

const fn masked(name: &'static str, slots: u32, args: ArgShape, write_mask: u8) -> OpcodeInfo {
    OpcodeInfo {
        write_mask,
        ..info(name, slots, args)
    }
}

const RESERVED: OpcodeInfo = OpcodeInfo {
    name: "",
    slots: 0,
    args: ArgShape::Null,
    shader_types: ShaderType::empty(),
    write_mask: 0xF,
};

/// Number of entries in the instruction table; opcodes at or above this aren't instructions.
pub(crate) const OPCODE_TABLE_LEN: u32 = 97;

/// `D3DSHADER_INSTRUCTION_OPCODE_TYPE` values the translator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Mov,
    Add,
    Sub,
    Mad,
    Mul,
    Rcp,
    Rsq,
    Dp3,
    Dp4,
    Min,
    Max,
    Slt,
    Sge,
    Exp,
    Log,
    Lit,
    Dst,
    Lrp,
    Frc,
    M4x4,
    M4x3,
    M3x4,
    M3x3,
    M3x2,
    Call,
    CallNz,
    Loop,
    Ret,
    EndLoop,
    Label,
    Dcl,
    Pow,
    Crs,
    Sgn,
    Abs,
    Nrm,
    SinCos,
    Rep,
    EndRep,
    If,
    Ifc,
    Else,
    EndIf,
    Break,
    BreakC,
    MovA,
    DefB,
    DefI,
    TexCrd,
    TexKill,
    TexLd,
    TexBem,
    TexBemL,
    TexReg2Ar,
    TexReg2Gb,
    TexM3x2Pad,
    TexM3x2Tex,
    TexM3x3Pad,
    TexM3x3Tex,
    TexM3x3Spec,
    TexM3x3VSpec,
    ExpP,
    LogP,
    Cnd,
    Def,
    TexReg2Rgb,
    TexDp3Tex,
    TexM3x2Depth,
    TexDp3,
    TexM3x3,
    TexDepth,
    Cmp,
    Bem,
    Dp2Add,
    Dsx,
    Dsy,
    TexLdd,
    SetP,
    TexLdl,
    BreakP,
    /// A hole in the opcode space (49..=63 and 75).
    Reserved(u16),
}

impl Opcode {
    /// Returns `None` for values past the end of the instruction table.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Nop,
            1 => Self::Mov,
            2 => Self::Add,
            3 => Self::Sub,
            4 => Self::Mad,
            5 => Self::Mul,
            6 => Self::Rcp,
            7 => Self::Rsq,
            8 => Self::Dp3,
            9 => Self::Dp4,
            10 => Self::Min,
            11 => Self::Max,
            12 => Self::Slt,
            13 => Self::Sge,
            14 => Self::Exp,
            15 => Self::Log,
            16 => Self::Lit,
            17 => Self::Dst,
            18 => Self::Lrp,
            19 => Self::Frc,
            20 => Self::M4x4,
            21 => Self::M4x3,
            22 => Self::M3x4,
            23 => Self::M3x3,
            24 => Self::M3x2,
            25 => Self::Call,
            26 => Self::CallNz,
            27 => Self::Loop,
            28 => Self::Ret,
            29 => Self::EndLoop,
            30 => Self::Label,
            31 => Self::Dcl,
            32 => Self::Pow,
            33 => Self::Crs,
            34 => Self::Sgn,
            35 => Self::Abs,
            36 => Self::Nrm,
            37 => Self::SinCos,
            38 => Self::Rep,
            39 => Self::EndRep,
            40 => Self::If,
            41 => Self::Ifc,
            42 => Self::Else,
            43 => Self::EndIf,
            44 => Self::Break,
            45 => Self::BreakC,
            46 => Self::MovA,
            47 => Self::DefB,
            48 => Self::DefI,
            64 => Self::TexCrd,
            65 => Self::TexKill,
            66 => Self::TexLd,
            67 => Self::TexBem,
            68 => Self::TexBemL,
            69 => Self::TexReg2Ar,
            70 => Self::TexReg2Gb,
            71 => Self::TexM3x2Pad,
            72 => Self::TexM3x2Tex,
            73 => Self::TexM3x3Pad,
            74 => Self::TexM3x3Tex,
            76 => Self::TexM3x3Spec,
            77 => Self::TexM3x3VSpec,
            78 => Self::ExpP,
            79 => Self::LogP,
            80 => Self::Cnd,
            81 => Self::Def,
            82 => Self::TexReg2Rgb,
            83 => Self::TexDp3Tex,
            84 => Self::TexM3x2Depth,
            85 => Self::TexDp3,
            86 => Self::TexM3x3,
            87 => Self::TexDepth,
            88 => Self::Cmp,
            89 => Self::Bem,
            90 => Self::Dp2Add,
            91 => Self::Dsx,
            92 => Self::Dsy,
            93 => Self::TexLdd,
            94 => Self::SetP,
            95 => Self::TexLdl,
            96 => Self::BreakP,
            49..=63 | 75 => Self::Reserved(raw as u16),
            _ => return None,
        })
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, Self::Reserved(_))
    }

    pub(crate) fn info(self) -> OpcodeInfo {
        use ArgShape::*;
        match self {
            Self::Nop => info("NOP", 1, Null),
            Self::Mov => info("MOV", 1, Ds),
            Self::Add => info("ADD", 1, Dss),
            Self::Sub => info("SUB", 1, Dss),
            Self::Mad => info("MAD", 1, Dsss),
            Self::Mul => info("MUL", 1, Dss),
            Self::Rcp => info("RCP", 1, Ds),
            Self::Rsq => info("RSQ", 1, Ds),
            Self::Dp3 => info("DP3", 1, Dss),
            Self::Dp4 => info("DP4", 1, Dss),
            Self::Min => info("MIN", 1, Dss),
            Self::Max => info("MAX", 1, Dss),
            Self::Slt => info("SLT", 1, Dss),
            Self::Sge => info("SGE", 1, Dss),
            Self::Exp => info("EXP", 1, Ds),
            Self::Log => info("LOG", 1, Ds),
            Self::Lit => info("LIT", 3, Ds),
            Self::Dst => vertex("DST", 1, Dss),
            Self::Lrp => info("LRP", 2, Dsss),
            Self::Frc => info("FRC", 1, Ds),
            Self::M4x4 => info("M4X4", 4, Dss),
            Self::M4x3 => masked("M4X3", 3, Dss, 0x7),
            Self::M3x4 => info("M3X4", 4, Dss),
            Self::M3x3 => masked("M3X3", 3, Dss, 0x7),
            Self::M3x2 => masked("M3X2", 2, Dss, 0x3),
            Self::Call => info("CALL", 2, S),
            Self::CallNz => info("CALLNZ", 3, Ss),
            Self::Loop => info("LOOP", 3, Ss),
            Self::Ret => info("RET", 1, Null),
            Self::EndLoop => info("ENDLOOP", 2, Null),
            Self::Label => info("LABEL", 0, S),
            Self::Dcl => info("DCL", 0, Dcl),
            Self::Pow => info("POW", 3, Dss),
            Self::Crs => info("CRS", 2, Dss),
            Self::Sgn => info("SGN", 3, Dsss),
            Self::Abs => info("ABS", 1, Ds),
            Self::Nrm => info("NRM", 3, Ds),
            Self::SinCos => info("SINCOS", 8, SinCos),
            Self::Rep => info("REP", 3, S),
            Self::EndRep => info("ENDREP", 2, Null),
            Self::If => info("IF", 3, S),
            Self::Ifc => info("IF", 3, Ss),
            Self::Else => info("ELSE", 1, Null),
            Self::EndIf => info("ENDIF", 1, Null),
            Self::Break => info("BREAK", 1, Null),
            Self::BreakC => info("BREAK", 3, Ss),
            Self::MovA => vertex("MOVA", 1, Ds),
            Self::DefB => info("DEFB", 0, DefB),
            Self::DefI => info("DEFI", 0, DefI),
            Self::TexCrd => pixel("TEXCRD", 1, TexCrd),
            Self::TexKill => pixel("TEXKILL", 2, D),
            Self::TexLd => pixel("TEXLD", 1, TexLd),
            Self::TexBem => pixel("TEXBEM", 1, Ds),
            Self::TexBemL => pixel("TEXBEML", 2, Ds),
            Self::TexReg2Ar => pixel("TEXREG2AR", 1, Ds),
            Self::TexReg2Gb => pixel("TEXREG2GB", 1, Ds),
            Self::TexM3x2Pad => pixel("TEXM3X2PAD", 1, Ds),
            Self::TexM3x2Tex => pixel("TEXM3X2TEX", 1, Ds),
            Self::TexM3x3Pad => pixel("TEXM3X3PAD", 1, Ds),
            Self::TexM3x3Tex => pixel("TEXM3X3TEX", 1, Ds),
            Self::TexM3x3Spec => pixel("TEXM3X3SPEC", 1, Dss),
            Self::TexM3x3VSpec => pixel("TEXM3X3VSPEC", 1, Ds),
            Self::ExpP => info("EXPP", 1, Ds),
            Self::LogP => info("LOGP", 1, Ds),
            Self::Cnd => pixel("CND", 1, Dsss),
            Self::Def => info("DEF", 0, Def),
            Self::TexReg2Rgb => pixel("TEXREG2RGB", 1, Ds),
            Self::TexDp3Tex => pixel("TEXDP3TEX", 1, Ds),
            Self::TexM3x2Depth => pixel("TEXM3X2DEPTH", 1, Ds),
            Self::TexDp3 => pixel("TEXDP3", 1, Ds),
            Self::TexM3x3 => pixel("TEXM3X3", 1, Ds),
            Self::TexDepth => pixel("TEXDEPTH", 1, D),
            Self::Cmp => pixel("CMP", 1, Dsss),
            Self::Bem => pixel("BEM", 2, Dss),
            Self::Dp2Add => pixel("DP2ADD", 2, Dsss),
            Self::Dsx => pixel("DSX", 2, Ds),
            Self::Dsy => pixel("DSY", 2, Ds),
            Self::TexLdd => pixel("TEXLDD", 3, Dssss),
            Self::SetP => info("SETP", 1, Dss),
            Self::TexLdl => info("TEXLDL", 2, Dss),
            Self::BreakP => info("BREAKP", 3, S),
            Self::Reserved(_) => RESERVED,
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}
