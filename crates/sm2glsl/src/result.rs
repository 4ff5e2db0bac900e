//! Caller-facing options and the structured result of a parse.

use crate::ctab::Symbol;
use crate::error::ShaderError;
use crate::preshader::Preshader;
use crate::types::{SamplerType, ShaderType, UniformType, Usage};

/// A uniform the host must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    pub uniform_type: UniformType,
    /// First register covered by this uniform.
    pub index: u32,
    /// Register count for arrays, zero for a single register.
    pub array_count: u32,
    /// The array is initialized from `def` literals rather than uploaded by the host.
    pub constant: bool,
    pub name: String,
}

/// A literal from a `def`/`defi`/`defb` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant {
    pub constant_type: UniformType,
    pub index: u32,
    /// Raw bits; float constants hold IEEE-754 single precision values.
    pub value: [u32; 4],
}

impl Constant {
    pub fn as_float(&self) -> [f32; 4] {
        self.value.map(f32::from_bits)
    }

    pub fn as_int(&self) -> [i32; 4] {
        self.value.map(|v| v as i32)
    }

    pub fn as_bool(&self) -> bool {
        self.value[0] != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sampler {
    pub sampler_type: SamplerType,
    /// Sampler stage.
    pub index: u32,
    pub name: String,
    /// Used by a ps_1_x `texbem`/`texbeml`, so the host must also fill the bump-env constants.
    pub texbem: bool,
}

/// A shader input or output together with its declared semantic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub usage: Usage,
    pub index: u32,
    pub name: String,
}

/// Remaps the components of an input register with the given semantic.
///
/// `swizzle[i]` names the component (0..=3) that reads of component `i` are redirected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwizzleOverride {
    pub usage: Usage,
    pub index: u32,
    pub swizzle: [u8; 4],
}

/// Forces the texture type of a sampler stage the shader doesn't declare itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerMapping {
    pub index: u32,
    pub sampler_type: SamplerType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub main_fn: String,
    pub swizzles: Vec<SwizzleOverride>,
    pub sampler_map: Vec<SamplerMapping>,
    pub flip_render_target: bool,
    pub depth_clipping: bool,
    /// The input length is the shader length, so the end token must be the final token.
    pub known_size: bool,
    pub filename: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            main_fn: "main".to_string(),
            swizzles: Vec::new(),
            sampler_map: Vec::new(),
            flip_render_target: false,
            depth_clipping: false,
            known_size: true,
            filename: None,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_main_fn(mut self, name: impl Into<String>) -> Self {
        self.main_fn = name.into();
        self
    }

    pub fn with_swizzle(mut self, swizzle: SwizzleOverride) -> Self {
        self.swizzles.push(swizzle);
        self
    }

    pub fn with_sampler_mapping(mut self, mapping: SamplerMapping) -> Self {
        self.sampler_map.push(mapping);
        self
    }

    pub fn with_flip_render_target(mut self, enabled: bool) -> Self {
        self.flip_render_target = enabled;
        self
    }

    pub fn with_depth_clipping(mut self, enabled: bool) -> Self {
        self.depth_clipping = enabled;
        self
    }

    pub fn with_known_size(mut self, known: bool) -> Self {
        self.known_size = known;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub(crate) fn effective_main_fn(&self) -> &str {
        if self.main_fn.is_empty() {
            "main"
        } else {
            &self.main_fn
        }
    }
}

/// Everything a parse produced.
///
/// When [`ParseData::errors`] is non-empty only `profile` and `errors` are populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseData {
    pub profile: String,
    /// Generated source.
    pub output: String,
    /// Rough instruction slot count.
    pub instruction_count: u32,
    pub shader_type: ShaderType,
    pub major: u8,
    pub minor: u8,
    pub main_fn: String,
    pub uniforms: Vec<Uniform>,
    pub constants: Vec<Constant>,
    pub samplers: Vec<Sampler>,
    pub attributes: Vec<Attribute>,
    pub outputs: Vec<Attribute>,
    pub swizzles: Vec<SwizzleOverride>,
    pub symbols: Vec<Symbol>,
    pub preshader: Option<Preshader>,
    pub errors: Vec<ShaderError>,
}

impl ParseData {
    pub(crate) fn failed(profile: &str, errors: Vec<ShaderError>) -> Self {
        Self {
            profile: profile.to_string(),
            output: String::new(),
            instruction_count: 0,
            shader_type: ShaderType::empty(),
            major: 0,
            minor: 0,
            main_fn: String::new(),
            uniforms: Vec::new(),
            constants: Vec::new(),
            samplers: Vec::new(),
            attributes: Vec::new(),
            outputs: Vec::new(),
            swizzles: Vec::new(),
            symbols: Vec::new(),
            preshader: None,
            errors,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_accessors_reinterpret_bits() {
        let c = Constant {
            constant_type: UniformType::Float,
            index: 3,
            value: [1.0f32.to_bits(), 0.5f32.to_bits(), (-2.0f32).to_bits(), 0],
        };
        assert_eq!(c.as_float(), [1.0, 0.5, -2.0, 0.0]);

        let i = Constant {
            constant_type: UniformType::Int,
            index: 0,
            value: [u32::MAX, 4, 1, 0],
        };
        assert_eq!(i.as_int(), [-1, 4, 1, 0]);
        assert!(i.as_bool());
    }

    #[test]
    fn empty_main_fn_falls_back() {
        let opts = ParseOptions::new().with_main_fn("");
        assert_eq!(opts.effective_main_fn(), "main");
        let opts = ParseOptions::new().with_main_fn("vs_main");
        assert_eq!(opts.effective_main_fn(), "vs_main");
    }
}
