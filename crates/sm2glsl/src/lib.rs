//! Translator from Direct3D 9 shader bytecode (vertex and pixel shader models 1.1 to 3.0)
//! to GLSL.
//!
//! The input is the raw little-endian token stream a D3D9 compiler emits. Parsing never
//! stops at the first problem: every recoverable error is collected into
//! [`ParseData::errors`], and generated source is returned only for a clean parse.
//!
//! Besides source text the result describes everything the host must bind: uniforms and
//! the packed arrays backing them, samplers, vertex attributes, outputs, `def` constants,
//! the embedded constant table (CTAB) and any preshader.
//!
//! ```no_run
//! let bytecode = std::fs::read("shader.vso").unwrap();
//! let data = sm2glsl::parse("glsl120", &bytecode, &sm2glsl::ParseOptions::default()).unwrap();
//! if data.is_ok() {
//!     println!("{}", data.output);
//! }
//! ```

#![forbid(unsafe_code)]

mod build;
mod context;
mod ctab;
mod error;
mod instruction;
mod opcode;
mod output;
mod parse;
mod preshader;
mod profile;
mod register;
mod result;
mod shader_limits;
mod swizzle;
mod token;
mod types;

pub use crate::ctab::{
    Symbol, SymbolClass, SymbolRegisterSet, SymbolStructMember, SymbolType, SymbolTypeInfo,
};
pub use crate::error::{Error, ErrorPosition, ShaderError};
pub use crate::opcode::Opcode;
pub use crate::preshader::{
    Preshader, PreshaderInstruction, PreshaderOpcode, PreshaderOperand, PreshaderOperandType,
};
pub use crate::profile::PROFILES;
pub use crate::result::{
    Attribute, Constant, ParseData, ParseOptions, Sampler, SamplerMapping, SwizzleOverride,
    Uniform,
};
pub use crate::swizzle::{Swizzle, WriteMask};
pub use crate::token::{packed_version, tokens_from_bytes};
pub use crate::types::{
    Comparison, RegisterType, SamplerType, ShaderType, SourceMod, TextureType, UniformType,
    Usage,
};

/// Translates `bytecode` with the profile named `profile` (case-insensitive).
///
/// Only an unknown profile is an `Err`; problems with the shader itself are reported in
/// [`ParseData::errors`].
pub fn parse(profile: &str, bytecode: &[u8], options: &ParseOptions) -> Result<ParseData, Error> {
    parse_tokens(profile, tokens_from_bytes(bytecode), options)
}

/// Like [`parse`], for a stream already split into tokens.
pub fn parse_tokens(profile: &str, tokens: Vec<u32>, options: &ParseOptions) -> Result<ParseData, Error> {
    let mut backend =
        profile::create(profile).ok_or_else(|| Error::UnknownProfile(profile.to_string()))?;
    tracing::debug!(profile = backend.name(), tokens = tokens.len(), "parse");
    Ok(parse::run(backend.as_mut(), tokens, options))
}

/// Names accepted by [`parse`].
pub fn profiles() -> &'static [&'static str] {
    PROFILES
}
