//! Shared enumerations for the D3D9 shader bytecode model.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Shader stage(s). Opcode metadata uses combinations of these.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ShaderType: u8 {
        const PIXEL = 1 << 0;
        const VERTEX = 1 << 1;
        const GEOMETRY = 1 << 2;
        const ANY = Self::PIXEL.bits() | Self::VERTEX.bits() | Self::GEOMETRY.bits();
    }
}

impl ShaderType {
    /// Prefix used in generated variable names (`vs`/`ps`).
    pub fn short_name(self) -> &'static str {
        if self == ShaderType::PIXEL {
            "ps"
        } else if self == ShaderType::VERTEX {
            "vs"
        } else if self == ShaderType::GEOMETRY {
            "gs"
        } else {
            "??"
        }
    }
}

/// `D3DSHADER_PARAM_REGISTER_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RegisterType {
    Temp = 0,
    Input = 1,
    Const = 2,
    /// `a#` in vertex shaders, `t#` in pixel shaders.
    Address = 3,
    RastOut = 4,
    AttrOut = 5,
    /// `oT#` before vs_3_0, `o#` from vs_3_0 on.
    TexCrdOut = 6,
    ConstInt = 7,
    ColorOut = 8,
    DepthOut = 9,
    Sampler = 10,
    Const2 = 11,
    Const3 = 12,
    Const4 = 13,
    ConstBool = 14,
    Loop = 15,
    TempFloat16 = 16,
    MiscType = 17,
    Label = 18,
    Predicate = 19,
}

impl RegisterType {
    pub const TEXTURE: RegisterType = RegisterType::Address;
    pub const OUTPUT: RegisterType = RegisterType::TexCrdOut;

    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Temp,
            1 => Self::Input,
            2 => Self::Const,
            3 => Self::Address,
            4 => Self::RastOut,
            5 => Self::AttrOut,
            6 => Self::TexCrdOut,
            7 => Self::ConstInt,
            8 => Self::ColorOut,
            9 => Self::DepthOut,
            10 => Self::Sampler,
            11 => Self::Const2,
            12 => Self::Const3,
            13 => Self::Const4,
            14 => Self::ConstBool,
            15 => Self::Loop,
            16 => Self::TempFloat16,
            17 => Self::MiscType,
            18 => Self::Label,
            19 => Self::Predicate,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Register types that carry shader outputs.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::RastOut | Self::AttrOut | Self::TexCrdOut | Self::ColorOut | Self::DepthOut
        )
    }
}

/// `RastOut` register numbers.
pub(crate) mod rastout {
    pub const POSITION: u32 = 0;
    pub const FOG: u32 = 1;
    pub const POINT_SIZE: u32 = 2;
}

/// `MiscType` register numbers.
pub(crate) mod misctype {
    pub const POSITION: u32 = 0;
    pub const FACE: u32 = 1;
}

/// Declared semantic of an input/output register (`D3DDECLUSAGE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Usage {
    Unknown,
    Position,
    BlendWeight,
    BlendIndices,
    Normal,
    PointSize,
    TexCoord,
    Tangent,
    Binormal,
    TessFactor,
    PositionT,
    Color,
    Fog,
    Depth,
    Sample,
}

impl Usage {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Position,
            1 => Self::BlendWeight,
            2 => Self::BlendIndices,
            3 => Self::Normal,
            4 => Self::PointSize,
            5 => Self::TexCoord,
            6 => Self::Tangent,
            7 => Self::Binormal,
            8 => Self::TessFactor,
            9 => Self::PositionT,
            10 => Self::Color,
            11 => Self::Fog,
            12 => Self::Depth,
            13 => Self::Sample,
            _ => return None,
        })
    }

    /// Wire value; `Unknown` maps to -1.
    pub fn raw(self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::Position => 0,
            Self::BlendWeight => 1,
            Self::BlendIndices => 2,
            Self::Normal => 3,
            Self::PointSize => 4,
            Self::TexCoord => 5,
            Self::Tangent => 6,
            Self::Binormal => 7,
            Self::TessFactor => 8,
            Self::PositionT => 9,
            Self::Color => 10,
            Self::Fog => 11,
            Self::Depth => 12,
            Self::Sample => 13,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Position => "position",
            Self::BlendWeight => "blendweight",
            Self::BlendIndices => "blendindices",
            Self::Normal => "normal",
            Self::PointSize => "psize",
            Self::TexCoord => "texcoord",
            Self::Tangent => "tangent",
            Self::Binormal => "binormal",
            Self::TessFactor => "tessfactor",
            Self::PositionT => "positiont",
            Self::Color => "color",
            Self::Fog => "fog",
            Self::Depth => "depth",
            Self::Sample => "sample",
        };
        f.write_str(name)
    }
}

/// Source operand modifier (`D3DSHADER_PARAM_SRCMOD_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceMod {
    #[default]
    None,
    Negate,
    Bias,
    BiasNegate,
    Sign,
    SignNegate,
    Complement,
    X2,
    X2Negate,
    Dz,
    Dw,
    Abs,
    AbsNegate,
    Not,
}

impl SourceMod {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::None,
            1 => Self::Negate,
            2 => Self::Bias,
            3 => Self::BiasNegate,
            4 => Self::Sign,
            5 => Self::SignNegate,
            6 => Self::Complement,
            7 => Self::X2,
            8 => Self::X2Negate,
            9 => Self::Dz,
            10 => Self::Dw,
            11 => Self::Abs,
            12 => Self::AbsNegate,
            13 => Self::Not,
            _ => return None,
        })
    }
}

bitflags! {
    /// Destination result modifiers.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ResultMod: u8 {
        const SATURATE = 1 << 0;
        const PARTIAL_PRECISION = 1 << 1;
        const CENTROID = 1 << 2;
    }
}

/// Texture type stored in a sampler `dcl` token (`D3DSAMPLER_TEXTURE_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    TwoD,
    Cube,
    Volume,
}

impl TextureType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            2 => Some(Self::TwoD),
            3 => Some(Self::Cube),
            4 => Some(Self::Volume),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::TwoD => 2,
            Self::Cube => 3,
            Self::Volume => 4,
        }
    }
}

/// Sampler dimensionality as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    Unknown,
    TwoD,
    Cube,
    Volume,
}

impl From<TextureType> for SamplerType {
    fn from(value: TextureType) -> Self {
        match value {
            TextureType::TwoD => Self::TwoD,
            TextureType::Cube => Self::Cube,
            TextureType::Volume => Self::Volume,
        }
    }
}

impl SamplerType {
    pub(crate) fn texture_type(self) -> Option<TextureType> {
        match self {
            Self::Unknown => None,
            Self::TwoD => Some(TextureType::TwoD),
            Self::Cube => Some(TextureType::Cube),
            Self::Volume => Some(TextureType::Volume),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    Bool,
}

/// `texld` control bits.
pub(crate) mod texld_control {
    pub const TEXLD: u32 = 0;
    pub const TEXLDP: u32 = 1;
    pub const TEXLDB: u32 = 2;
}

/// Comparison selected by the control bits of `ifc`, `breakc` and `setp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Greater,
    Equal,
    GreaterEqual,
    Less,
    NotEqual,
    LessEqual,
}

impl Comparison {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::Greater,
            2 => Self::Equal,
            3 => Self::GreaterEqual,
            4 => Self::Less,
            5 => Self::NotEqual,
            6 => Self::LessEqual,
            _ => return None,
        })
    }

    /// Scalar operator spelling.
    pub fn operator(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::Equal => "==",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
        }
    }

    /// GLSL component-wise builtin.
    pub fn vector_function(self) -> &'static str {
        match self {
            Self::Greater => "greaterThan",
            Self::Equal => "equal",
            Self::GreaterEqual => "greaterThanEqual",
            Self::Less => "lessThan",
            Self::NotEqual => "notEqual",
            Self::LessEqual => "lessThanEqual",
        }
    }
}
