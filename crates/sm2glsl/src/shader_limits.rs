//! Centralized limits and magic numbers for bytecode decoding.
//!
//! Comment payloads (CTAB, preshader) are untrusted input. These bounds keep hostile blobs from
//! driving huge allocations or unbounded recursion.

/// Highest shader model accepted, as `(major, minor)`.
pub(crate) const MAX_SHADER_MAJOR: u8 = 3;
pub(crate) const MAX_SHADER_MINOR: u8 = 255;

/// `'CTAB'`
pub(crate) const CTAB_ID: u32 = 0x4241_5443;
/// Size in bytes of the fixed CTAB header.
pub(crate) const CTAB_HEADER_SIZE: u32 = 28;
/// Size in bytes of one constant-info record.
pub(crate) const CTAB_CONSTANT_INFO_SIZE: u32 = 20;
/// Sanity bound on the CTAB constant count.
pub(crate) const MAX_CTAB_CONSTANTS: u32 = 1_000_000;
/// Nesting limit for structure members in CTAB type info.
pub(crate) const MAX_CTAB_TYPEINFO_DEPTH: u32 = 300;

/// `'PRES'`
pub(crate) const PRES_ID: u32 = 0x5345_5250;
/// `'PRSI'`
pub(crate) const PRSI_ID: u32 = 0x4953_5250;
/// `'CLIT'`
pub(crate) const CLIT_ID: u32 = 0x5449_4C43;
/// `'FXLC'`
pub(crate) const FXLC_ID: u32 = 0x434C_5846;

/// Preshader version tokens carry this magic in the high half.
pub(crate) const PRESHADER_VERSION_MAGIC: u32 = 0x4658_0000;
pub(crate) const MIN_PRESHADER_VERSION: u32 = PRESHADER_VERSION_MAGIC | 0x0200;
pub(crate) const MAX_PRESHADER_VERSION: u32 = PRESHADER_VERSION_MAGIC | 0x0201;

/// Label registers allowed by shader model 2.x.
pub(crate) const MAX_LABEL_REGISTER: u32 = 15;
/// Label registers allowed by shader model 3.x.
pub(crate) const MAX_SM3_LABEL_REGISTER: u32 = 2047;
