//! Embedded constant table (`CTAB` comment block) decoding.
//!
//! The table is a D3DX `D3DXSHADER_CONSTANTTABLE` blob: a fixed 28-byte header followed by
//! 20-byte constant records and type descriptions, all addressed by byte offsets relative to the
//! start of the header. Every offset is checked against the blob length before it is followed.

use tracing::trace;

use crate::context::Diagnostics;
use crate::shader_limits::{
    CTAB_CONSTANT_INFO_SIZE, CTAB_HEADER_SIZE, CTAB_ID, MAX_CTAB_CONSTANTS,
    MAX_CTAB_TYPEINFO_DEPTH,
};
use crate::types::UniformType;

/// Register file a CTAB symbol lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRegisterSet {
    Bool,
    Int4,
    Float4,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    Scalar,
    Vector,
    MatrixRows,
    MatrixColumns,
    Object,
    Struct,
}

impl SymbolClass {
    fn from_raw(raw: u16) -> Option<Self> {
        Some(match raw {
            0 => Self::Scalar,
            1 => Self::Vector,
            2 => Self::MatrixRows,
            3 => Self::MatrixColumns,
            4 => Self::Object,
            5 => Self::Struct,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
    Void,
    Bool,
    Int,
    Float,
    String,
    Texture,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Sampler,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    PixelShader,
    VertexShader,
    PixelFragment,
    VertexFragment,
    Unsupported,
}

impl SymbolType {
    fn from_raw(raw: u16) -> Option<Self> {
        Some(match raw {
            0 => Self::Void,
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Texture,
            6 => Self::Texture1D,
            7 => Self::Texture2D,
            8 => Self::Texture3D,
            9 => Self::TextureCube,
            10 => Self::Sampler,
            11 => Self::Sampler1D,
            12 => Self::Sampler2D,
            13 => Self::Sampler3D,
            14 => Self::SamplerCube,
            15 => Self::PixelShader,
            16 => Self::VertexShader,
            17 => Self::PixelFragment,
            18 => Self::VertexFragment,
            19 => Self::Unsupported,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTypeInfo {
    pub parameter_class: SymbolClass,
    pub parameter_type: SymbolType,
    pub rows: u32,
    pub columns: u32,
    pub elements: u32,
    pub members: Vec<SymbolStructMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolStructMember {
    pub name: String,
    pub info: SymbolTypeInfo,
}

/// A named constant declared by the high-level compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub register_set: SymbolRegisterSet,
    pub register_index: u32,
    pub register_count: u32,
    pub info: SymbolTypeInfo,
}

/// Per-table state: whether a table was seen and the symbols it declared.
#[derive(Debug, Clone, Default)]
pub(crate) struct CtabData {
    pub have_ctab: bool,
    pub symbols: Vec<Symbol>,
}

/// A register range the table declares, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeclaredRange {
    pub uniform_type: UniformType,
    pub index: u32,
    pub count: u32,
}

/// Bounds-checked little-endian reads over the table bytes.
struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn u16_at(&self, offset: u32) -> Option<u16> {
        let start = offset as usize;
        let b = self.bytes.get(start..start.checked_add(2)?)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32_at(&self, offset: u32) -> Option<u32> {
        let start = offset as usize;
        let b = self.bytes.get(start..start.checked_add(4)?)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// NUL-terminated string at `offset`; an unterminated string runs to the end of the table.
    fn str_at(&self, offset: u32) -> Option<String> {
        let tail = self.bytes.get(offset as usize..)?;
        if tail.is_empty() {
            return None;
        }
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Some(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}

/// Decodes a constant table from a comment block.
///
/// `block[0]` is the comment token and `block[1]` the block id; anything other than a `CTAB` id
/// is ignored. Returns the register ranges the table declares (empty on failure).
pub(crate) fn parse_constant_table(
    diag: &mut Diagnostics,
    block: &[u32],
    okay_version: u32,
    ctab: &mut CtabData,
) -> Vec<DeclaredRange> {
    if block.get(1) != Some(&CTAB_ID) {
        return Vec::new();
    }
    if ctab.have_ctab {
        diag.fail("Shader has multiple CTAB sections");
        return Vec::new();
    }
    ctab.have_ctab = true;

    let bytes: Vec<u8> = block[2..].iter().flat_map(|t| t.to_le_bytes()).collect();
    if bytes.len() < CTAB_HEADER_SIZE as usize {
        diag.fail("Truncated CTAB data");
        return Vec::new();
    }
    trace!(bytes = bytes.len(), "parsing CTAB");

    let view = ByteView { bytes: &bytes };
    match parse_table(diag, &view, okay_version) {
        Some((symbols, ranges)) => {
            ctab.symbols = symbols;
            ranges
        }
        None => {
            diag.fail("Shader has corrupt CTAB data");
            Vec::new()
        }
    }
}

type ParsedTable = (Vec<Symbol>, Vec<DeclaredRange>);

fn parse_table(diag: &mut Diagnostics, view: &ByteView<'_>, okay_version: u32) -> Option<ParsedTable> {
    let bytes = view.len();
    let size = view.u32_at(0)?;
    let creator = view.u32_at(4)?;
    let version = view.u32_at(8)?;
    let constants = view.u32_at(12)?;
    let constant_info = view.u32_at(16)?;
    let target = view.u32_at(24)?;

    if size != CTAB_HEADER_SIZE
        || constants > MAX_CTAB_CONSTANTS
        || version != okay_version
        || creator >= bytes
        || constant_info >= bytes
        || bytes - constant_info < constants * CTAB_CONSTANT_INFO_SIZE
        || target >= bytes
    {
        return None;
    }
    view.str_at(target)?;

    let mut symbols = Vec::with_capacity(constants as usize);
    let mut ranges = Vec::new();
    for i in 0..constants {
        let base = constant_info + i * CTAB_CONSTANT_INFO_SIZE;
        let name_offset = view.u32_at(base)?;
        let register_set = view.u16_at(base + 4)?;
        let register_index = view.u16_at(base + 6)? as u32;
        let register_count = view.u16_at(base + 8)? as u32;
        let typeinfo = view.u32_at(base + 12)?;
        let default_value = view.u32_at(base + 16)?;

        let name = view.str_at(name_offset)?;
        if default_value >= bytes {
            return None;
        }
        let (register_set, uniform_type) = match register_set {
            0 => (SymbolRegisterSet::Bool, Some(UniformType::Bool)),
            1 => (SymbolRegisterSet::Int4, Some(UniformType::Int)),
            2 => (SymbolRegisterSet::Float4, Some(UniformType::Float)),
            3 => (SymbolRegisterSet::Sampler, None),
            _ => return None,
        };
        if let Some(uniform_type) = uniform_type {
            ranges.push(DeclaredRange {
                uniform_type,
                index: register_index,
                count: register_count,
            });
        }
        let info = parse_typeinfo(diag, view, typeinfo, 0)?;
        trace!(%name, register_index, register_count, "CTAB symbol");
        symbols.push(Symbol {
            name,
            register_set,
            register_index,
            register_count,
            info,
        });
    }
    Some((symbols, ranges))
}

fn parse_typeinfo(
    diag: &mut Diagnostics,
    view: &ByteView<'_>,
    pos: u32,
    depth: u32,
) -> Option<SymbolTypeInfo> {
    let bytes = view.len();
    if bytes <= pos || bytes - pos < 16 {
        return None;
    }
    let raw_class = view.u16_at(pos)?;
    let raw_type = view.u16_at(pos + 2)?;
    let rows = view.u16_at(pos + 4)? as u32;
    let columns = view.u16_at(pos + 6)? as u32;
    let elements = view.u16_at(pos + 8)? as u32;
    let member_count = view.u16_at(pos + 10)? as u32;
    let member_offset = view.u32_at(pos + 12)?;

    let parameter_class = SymbolClass::from_raw(raw_class).unwrap_or_else(|| {
        diag.fail(format!("Unknown parameter class (0x{raw_class:X})"));
        SymbolClass::Scalar
    });
    let parameter_type = SymbolType::from_raw(raw_type).unwrap_or_else(|| {
        diag.fail(format!("Unknown parameter type (0x{raw_type:X})"));
        SymbolType::Int
    });

    if pos as u64 + 16 + member_count as u64 * 8 >= bytes as u64 {
        return None;
    }
    if member_count > 0 && depth > MAX_CTAB_TYPEINFO_DEPTH {
        diag.fail("Possible infinite loop in CTAB structure.");
        return None;
    }

    let mut members = Vec::with_capacity(member_count as usize);
    for i in 0..member_count {
        let entry = member_offset.checked_add(i * 8)?;
        let name_offset = view.u32_at(entry)?;
        let info_offset = view.u32_at(entry.checked_add(4)?)?;
        let name = view.str_at(name_offset).unwrap_or_default();
        let info = parse_typeinfo(diag, view, info_offset, depth + 1)?;
        members.push(SymbolStructMember { name, info });
    }

    Some(SymbolTypeInfo {
        parameter_class,
        parameter_type,
        rows,
        columns,
        elements,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a comment block: comment token, `CTAB` id, then the table bytes padded to tokens.
    fn ctab_block(table: &[u8]) -> Vec<u32> {
        let mut padded = table.to_vec();
        while padded.len() % 4 != 0 {
            padded.push(0);
        }
        let mut block = vec![((padded.len() as u32 / 4 + 1) << 16) | 0xFFFE, CTAB_ID];
        block.extend(
            padded
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
        block
    }

    fn header(version: u32, constants: u32, constant_info: u32, target: u32) -> Vec<u8> {
        let mut h = Vec::new();
        for v in [28, 0, version, constants, constant_info, 0, target] {
            h.extend_from_slice(&u32::to_le_bytes(v));
        }
        h
    }

    const PS_2_0: u32 = 0xFFFF_0200;

    /// One float4 constant `mvp` at c4..c7 with a 4x4 matrix type.
    fn single_symbol_table() -> Vec<u8> {
        // header (28) | constant info (20) @28 | typeinfo (16) @48 | "mvp\0" @64 | "ps_2_0\0" @68
        let mut t = header(PS_2_0, 1, 28, 68);
        for v in [64u32] {
            t.extend_from_slice(&v.to_le_bytes());
        }
        for v in [2u16, 4, 4, 0] {
            t.extend_from_slice(&v.to_le_bytes());
        }
        t.extend_from_slice(&48u32.to_le_bytes());
        t.extend_from_slice(&0u32.to_le_bytes());
        for v in [3u16, 3, 4, 4, 1, 0] {
            t.extend_from_slice(&v.to_le_bytes());
        }
        t.extend_from_slice(&0u32.to_le_bytes());
        t.extend_from_slice(b"mvp\0ps_2_0\0");
        t
    }

    #[test]
    fn decodes_symbols_and_ranges() {
        let mut diag = Diagnostics::default();
        let mut ctab = CtabData::default();
        let ranges = parse_constant_table(
            &mut diag,
            &ctab_block(&single_symbol_table()),
            PS_2_0,
            &mut ctab,
        );

        assert!(diag.errors.is_empty(), "{:?}", diag.errors);
        assert!(ctab.have_ctab);
        assert_eq!(
            ranges,
            vec![DeclaredRange {
                uniform_type: UniformType::Float,
                index: 4,
                count: 4
            }]
        );
        let sym = &ctab.symbols[0];
        assert_eq!(sym.name, "mvp");
        assert_eq!(sym.register_set, SymbolRegisterSet::Float4);
        assert_eq!(sym.info.parameter_class, SymbolClass::MatrixColumns);
        assert_eq!(sym.info.parameter_type, SymbolType::Float);
        assert_eq!((sym.info.rows, sym.info.columns), (4, 4));
    }

    #[test]
    fn rejects_second_table() {
        let mut diag = Diagnostics::default();
        let mut ctab = CtabData::default();
        let block = ctab_block(&single_symbol_table());
        parse_constant_table(&mut diag, &block, PS_2_0, &mut ctab);
        parse_constant_table(&mut diag, &block, PS_2_0, &mut ctab);
        assert_eq!(diag.messages(), vec!["Shader has multiple CTAB sections"]);
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let mut table = single_symbol_table();
        // Point the target string past the end of the table.
        table[24..28].copy_from_slice(&1000u32.to_le_bytes());
        let mut diag = Diagnostics::default();
        parse_constant_table(&mut diag, &ctab_block(&table), PS_2_0, &mut CtabData::default());
        assert_eq!(diag.messages(), vec!["Shader has corrupt CTAB data"]);

        let mut table = single_symbol_table();
        // Type info offset right at the end of the table.
        let len = table.len() as u32;
        table[40..44].copy_from_slice(&len.to_le_bytes());
        let mut diag = Diagnostics::default();
        parse_constant_table(&mut diag, &ctab_block(&table), PS_2_0, &mut CtabData::default());
        assert_eq!(diag.messages(), vec!["Shader has corrupt CTAB data"]);
    }

    #[test]
    fn rejects_version_mismatch_and_truncation() {
        let mut diag = Diagnostics::default();
        parse_constant_table(
            &mut diag,
            &ctab_block(&single_symbol_table()),
            0xFFFE_0200,
            &mut CtabData::default(),
        );
        assert_eq!(diag.messages(), vec!["Shader has corrupt CTAB data"]);

        let mut diag = Diagnostics::default();
        parse_constant_table(&mut diag, &ctab_block(&[0; 12]), PS_2_0, &mut CtabData::default());
        assert_eq!(diag.messages(), vec!["Truncated CTAB data"]);
    }

    #[test]
    fn unknown_class_is_reported_but_not_fatal() {
        let mut table = single_symbol_table();
        table[48..50].copy_from_slice(&9u16.to_le_bytes());
        let mut diag = Diagnostics::default();
        let mut ctab = CtabData::default();
        parse_constant_table(&mut diag, &ctab_block(&table), PS_2_0, &mut ctab);
        assert_eq!(diag.messages(), vec!["Unknown parameter class (0x9)"]);
        assert_eq!(ctab.symbols[0].info.parameter_class, SymbolClass::Scalar);
    }

    #[test]
    fn ignores_other_comment_blocks() {
        let mut diag = Diagnostics::default();
        let mut ctab = CtabData::default();
        let ranges = parse_constant_table(&mut diag, &[0x0001_FFFE, 0x1234_5678], PS_2_0, &mut ctab);
        assert!(ranges.is_empty());
        assert!(!ctab.have_ctab);
        assert!(diag.errors.is_empty());
    }
}
