//! Preshader (`PRES` comment block) decoding.
//!
//! A preshader is a small expression program the effect compiler hoists out of the shader so the
//! host can evaluate it once per draw. Its payload is a version token followed by nested comment
//! blocks tagged `CTAB`, `PRSI`, `CLIT` and `FXLC`, in any order.

use tracing::trace;

use crate::context::Diagnostics;
use crate::ctab::{parse_constant_table, CtabData, Symbol};
use crate::shader_limits::{
    CLIT_ID, CTAB_ID, FXLC_ID, MAX_PRESHADER_VERSION, MIN_PRESHADER_VERSION, PRSI_ID,
};
use crate::token::{comment_token, END_TOKEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreshaderOpcode {
    Mov,
    Neg,
    Rcp,
    Frc,
    Exp,
    Log,
    Rsq,
    Sin,
    Cos,
    Asin,
    Acos,
    Atan,
    Min,
    Max,
    Lt,
    Ge,
    Add,
    Mul,
    Atan2,
    Div,
    Cmp,
    MovC,
    Dot,
    Noise,
    MinScalar,
    MaxScalar,
    LtScalar,
    GeScalar,
    AddScalar,
    MulScalar,
    Atan2Scalar,
    DivScalar,
    DotScalar,
    NoiseScalar,
}

impl PreshaderOpcode {
    fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0x1000 => Self::Mov,
            0x1010 => Self::Neg,
            0x1030 => Self::Rcp,
            0x1040 => Self::Frc,
            0x1050 => Self::Exp,
            0x1060 => Self::Log,
            0x1070 => Self::Rsq,
            0x1080 => Self::Sin,
            0x1090 => Self::Cos,
            0x10A0 => Self::Asin,
            0x10B0 => Self::Acos,
            0x10C0 => Self::Atan,
            0x2000 => Self::Min,
            0x2010 => Self::Max,
            0x2020 => Self::Lt,
            0x2030 => Self::Ge,
            0x2040 => Self::Add,
            0x2050 => Self::Mul,
            0x2060 => Self::Atan2,
            0x2080 => Self::Div,
            0x3000 => Self::Cmp,
            0x3010 => Self::MovC,
            0x5000 => Self::Dot,
            0x5020 => Self::Noise,
            0xA000 => Self::MinScalar,
            0xA010 => Self::MaxScalar,
            0xA020 => Self::LtScalar,
            0xA030 => Self::GeScalar,
            0xA040 => Self::AddScalar,
            0xA050 => Self::MulScalar,
            0xA060 => Self::Atan2Scalar,
            0xA080 => Self::DivScalar,
            0xD000 => Self::DotScalar,
            0xD020 => Self::NoiseScalar,
            _ => return None,
        })
    }
}

/// Where a preshader operand reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreshaderOperandType {
    /// Index into [`Preshader::literals`].
    Literal,
    /// Shader constant described by one of [`Preshader::symbols`].
    Input,
    /// Shader constant register written by the preshader.
    Output,
    /// Preshader scratch register.
    Temp,
    /// Storage class the decoder doesn't recognize.
    Unknown(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreshaderOperand {
    pub operand_type: PreshaderOperandType,
    /// Scalar component index (register * 4 + component).
    pub index: u32,
    /// Register bases for indexed input arrays.
    pub array_registers: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreshaderInstruction {
    pub opcode: Option<PreshaderOpcode>,
    pub element_count: u32,
    /// Destination first, then sources.
    pub operands: Vec<PreshaderOperand>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preshader {
    pub literals: Vec<f64>,
    /// Scratch components used, rounded up to whole vec4 registers.
    pub temp_count: u32,
    pub symbols: Vec<Symbol>,
    pub instructions: Vec<PreshaderInstruction>,
}

/// Location of a sub-block: index of its comment token and the number of tokens it spans
/// (starting with the block id).
#[derive(Debug, Clone, Copy)]
struct Block {
    at: usize,
    len: usize,
}

impl Block {
    fn body(self, tokens: &[u32]) -> &[u32] {
        &tokens[self.at + 1..self.at + 1 + self.len]
    }

    fn with_comment(self, tokens: &[u32]) -> &[u32] {
        &tokens[self.at..self.at + 1 + self.len]
    }
}

#[derive(Default)]
struct Blocks {
    ctab: Option<Block>,
    prsi: Option<Block>,
    clit: Option<Block>,
    fxlc: Option<Block>,
}

/// Decodes a preshader; `tokens` starts at the preshader version token.
pub(crate) fn parse_preshader(diag: &mut Diagnostics, tokens: &[u32]) -> Option<Preshader> {
    let version = tokens.first().copied().unwrap_or(0);
    if !(MIN_PRESHADER_VERSION..=MAX_PRESHADER_VERSION).contains(&version) {
        diag.fail("Unsupported preshader version.");
        return None;
    }

    let blocks = find_blocks(diag, tokens)?;
    let Some(ctab) = blocks.ctab else {
        diag.fail("No CTAB block in preshader.");
        return None;
    };
    let Some(fxlc) = blocks.fxlc else {
        diag.fail("No FXLC block in preshader.");
        return None;
    };
    let Some(clit) = blocks.clit else {
        diag.fail("No CLIT block in preshader.");
        return None;
    };

    let mut preshader = Preshader {
        literals: parse_literals(diag, clit.body(tokens))?,
        ..Preshader::default()
    };

    let output_map = match blocks.prsi {
        Some(prsi) => Some(parse_output_map(diag, prsi.body(tokens))?),
        None => None,
    };

    let mut ctab_data = CtabData::default();
    parse_constant_table(diag, ctab.with_comment(tokens), version, &mut ctab_data);
    preshader.symbols = ctab_data.symbols;
    if !ctab_data.have_ctab {
        diag.fail("Bogus preshader CTAB data");
        return None;
    }

    parse_instructions(diag, fxlc.body(tokens), output_map.as_deref(), &mut preshader)?;
    preshader.temp_count = (preshader.temp_count + 3) & !3;
    trace!(
        instructions = preshader.instructions.len(),
        literals = preshader.literals.len(),
        temps = preshader.temp_count,
        "parsed preshader"
    );
    Some(preshader)
}

fn find_blocks(diag: &mut Diagnostics, tokens: &[u32]) -> Option<Blocks> {
    let mut blocks = Blocks::default();
    let mut pos = 1;
    while pos < tokens.len() {
        let token = tokens[pos];
        let len = match comment_token(token) {
            Some((len, _)) if pos + 1 + len as usize <= tokens.len() => len as usize,
            _ => {
                // Standalone preshaders end with an end-of-stream token, sometimes
                // followed by unrelated data.
                if token == END_TOKEN {
                    break;
                }
                diag.fail("Bogus preshader data.");
                return None;
            }
        };
        if len > 0 {
            let id = tokens[pos + 1];
            let slot = match id {
                CTAB_ID => &mut blocks.ctab,
                PRSI_ID => &mut blocks.prsi,
                CLIT_ID => &mut blocks.clit,
                FXLC_ID => &mut blocks.fxlc,
                _ => {
                    diag.fail("Bogus preshader section.");
                    return None;
                }
            };
            if slot.is_some() {
                diag.fail(format!("Multiple {id:X} preshader blocks."));
                return None;
            }
            *slot = Some(Block { at: pos, len });
        }
        pos += 1 + len;
    }
    Some(blocks)
}

/// `CLIT`: id, literal count, then little-endian doubles.
fn parse_literals(diag: &mut Diagnostics, clit: &[u32]) -> Option<Vec<f64>> {
    let count = clit.get(1).copied().unwrap_or(u32::MAX) as usize;
    if clit.len() < 2 || count > (clit.len() - 2) / 2 {
        diag.fail("Bogus CLIT block in preshader.");
        return None;
    }
    Some(
        clit[2..2 + count * 2]
            .chunks_exact(2)
            .map(|pair| {
                let bits = (pair[0] as u64) | ((pair[1] as u64) << 32);
                f64::from_bits(bits)
            })
            .collect(),
    )
}

/// `PRSI`: seven header tokens after the id, the last being the number of
/// `(first_register, register_count)` pairs that follow.
fn parse_output_map(diag: &mut Diagnostics, prsi: &[u32]) -> Option<Vec<(u32, u32)>> {
    if prsi.len() < 8 {
        diag.fail("Bogus preshader PRSI data");
        return None;
    }
    let count = prsi[7] as usize;
    let pairs = &prsi[8..];
    if count
        .checked_add(1)
        .and_then(|c| c.checked_mul(2))
        .map_or(true, |needed| pairs.len() < needed)
    {
        diag.fail("Bogus preshader PRSI data");
        return None;
    }
    Some(
        pairs
            .chunks_exact(2)
            .take(count)
            .map(|pair| (pair[0], pair[1]))
            .collect(),
    )
}

/// Bounds-checked cursor over the `FXLC` token stream.
struct Cursor<'a> {
    tokens: &'a [u32],
    pos: usize,
}

impl Cursor<'_> {
    fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    fn peek(&self, offset: usize) -> Option<u32> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

fn parse_instructions(
    diag: &mut Diagnostics,
    fxlc: &[u32],
    output_map: Option<&[(u32, u32)]>,
    preshader: &mut Preshader,
) -> Option<()> {
    let bogus = |diag: &mut Diagnostics| diag.fail("Bogus preshader FXLC block.");

    let Some(&opcode_count) = fxlc.get(1) else {
        bogus(diag);
        return None;
    };
    let mut cur = Cursor { tokens: fxlc, pos: 2 };
    if opcode_count as usize > cur.remaining() / 2 {
        bogus(diag);
        return None;
    }

    for _ in 0..opcode_count {
        let (Some(opcode_token), Some(operands)) = (cur.peek(0), cur.peek(1)) else {
            bogus(diag);
            return None;
        };
        let opcode = PreshaderOpcode::from_raw((opcode_token >> 16) & 0xFFFF);
        if opcode.is_none() {
            diag.fail("Unknown preshader opcode.");
        }
        let operand_count = operands as usize + 1;
        cur.skip(2);
        if operand_count.saturating_mul(3) > cur.remaining() {
            bogus(diag);
            return None;
        }

        let mut inst = PreshaderInstruction {
            opcode,
            element_count: opcode_token & 0xFF,
            operands: Vec::with_capacity(operand_count),
        };
        for _ in 0..operand_count {
            let operand = parse_operand(diag, &mut cur, output_map, preshader)?;
            inst.operands.push(operand);
        }
        preshader.instructions.push(inst);
    }
    Some(())
}

fn parse_operand(
    diag: &mut Diagnostics,
    cur: &mut Cursor<'_>,
    output_map: Option<&[(u32, u32)]>,
    preshader: &mut Preshader,
) -> Option<PreshaderOperand> {
    let (Some(num_arrays), Some(kind), Some(item)) = (cur.peek(0), cur.peek(1), cur.peek(2)) else {
        diag.fail("Bogus preshader FXLC block.");
        return None;
    };
    let mut operand = PreshaderOperand {
        operand_type: PreshaderOperandType::Unknown(kind),
        index: item,
        array_registers: Vec::new(),
    };

    match kind {
        1 => {
            operand.operand_type = PreshaderOperandType::Literal;
            if item as usize > preshader.literals.len() {
                diag.fail("Bogus preshader literal index.");
            }
        }
        2 => {
            operand.operand_type = PreshaderOperandType::Input;
            let found = preshader.symbols.iter().any(|sym| {
                let base = sym.register_index * 4;
                let count = sym.register_count * 4;
                base <= item && item < base + count
            });
            if !found {
                diag.fail("Bogus preshader input index.");
            } else {
                for _ in 0..num_arrays {
                    let Some(jump) = cur.peek(4) else {
                        diag.fail("Bogus preshader FXLC block.");
                        return None;
                    };
                    operand
                        .array_registers
                        .push((jump >> 4) * 4 + ((jump >> 2) & 3));
                    cur.skip(2);
                }
            }
        }
        4 => {
            operand.operand_type = PreshaderOperandType::Output;
            if let Some(map) = output_map {
                let mapped = map.iter().any(|&(first, count)| {
                    let base = first.wrapping_mul(4);
                    base <= item && item < base.wrapping_add(count.wrapping_mul(4))
                });
                if !mapped {
                    diag.fail("Bogus preshader output index.");
                }
            }
        }
        7 => {
            operand.operand_type = PreshaderOperandType::Temp;
            preshader.temp_count = preshader.temp_count.max(item.saturating_add(1));
        }
        other => {
            trace!(kind = other, "unhandled preshader operand type");
        }
    }

    cur.skip(3);
    Some(operand)
}
