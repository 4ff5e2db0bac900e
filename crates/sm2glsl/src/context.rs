//! Mutable state threaded through one parse.

use tracing::{debug, trace};

use crate::ctab::{CtabData, DeclaredRange};
use crate::error::{ErrorPosition, ShaderError};
use crate::opcode::Opcode;
use crate::output::{OutputBuffer, Section};
use crate::preshader::Preshader;
use crate::register::{Register, RegisterList};
use crate::result::{Constant, ParseOptions, SamplerMapping, SwizzleOverride};
use crate::shader_limits::{MAX_SHADER_MAJOR, MAX_SHADER_MINOR};
use crate::swizzle::{Swizzle, WriteMask};
use crate::token::packed_version;
use crate::types::{
    misctype, rastout, RegisterType, SamplerType, ShaderType, TextureType, UniformType, Usage,
};

/// Error list plus the "current token failed" flag.
///
/// Kept apart from [`Context`] so the table decoders can report problems without
/// borrowing the whole parse state.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostics {
    pub errors: Vec<ShaderError>,
    pub is_fail: bool,
    pub position: ErrorPosition,
    pub filename: Option<String>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            is_fail: false,
            position: ErrorPosition::Before,
            filename: None,
        }
    }
}

impl Diagnostics {
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(position = self.position.as_i64(), %message, "shader error");
        self.is_fail = true;
        self.errors.push(ShaderError {
            message,
            filename: self.filename.clone(),
            position: self.position,
        });
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// A run of constant registers addressed as one array.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Variable {
    pub uniform_type: UniformType,
    pub index: u32,
    pub count: u32,
    /// `def` literals backing the array; empty when the host uploads it.
    pub constants: Vec<Constant>,
    /// Some relative read resolved into this array.
    pub used: bool,
    /// Offset inside the packed uniform array, assigned when the array is emitted.
    pub emit_position: Option<u32>,
}

impl Variable {
    pub fn contains(&self, reg_num: u32) -> bool {
        reg_num >= self.index && reg_num < self.index + self.count
    }
}

/// Usage and index implied by a vertex input register number before shader model 2.
pub(crate) fn sm1_input_usage(reg_num: u32) -> Option<(Usage, u32)> {
    Some(match reg_num {
        0 => (Usage::Position, 0),
        1 => (Usage::BlendWeight, 0),
        2 => (Usage::BlendIndices, 0),
        3 => (Usage::Normal, 0),
        4 => (Usage::PointSize, 0),
        5 => (Usage::Color, 0),
        6 => (Usage::Color, 1),
        7..=14 => (Usage::TexCoord, reg_num - 7),
        15 => (Usage::Position, 1),
        16 => (Usage::Normal, 1),
        _ => return None,
    })
}

/// Registers that only ever hold one component.
pub(crate) fn scalar_register(shader_type: ShaderType, reg_type: RegisterType, reg_num: u32) -> bool {
    match reg_type {
        RegisterType::RastOut => matches!(reg_num, rastout::FOG | rastout::POINT_SIZE),
        RegisterType::DepthOut | RegisterType::ConstBool | RegisterType::Loop => true,
        RegisterType::MiscType => reg_num == misctype::FACE,
        RegisterType::Predicate => shader_type == ShaderType::PIXEL,
        _ => false,
    }
}

#[derive(Debug)]
pub(crate) struct Context {
    pub diag: Diagnostics,
    tokens: Vec<u32>,
    pos: usize,
    shader_size: usize,
    known_size: bool,

    pub shader_type: ShaderType,
    pub major: u8,
    pub minor: u8,
    pub version_token: u32,
    pub saw_end_token: bool,

    pub main_fn: String,
    pub swizzles: Vec<SwizzleOverride>,
    pub sampler_map: Vec<SamplerMapping>,
    pub flip_render_target: bool,
    pub depth_clipping: bool,

    pub used_registers: RegisterList,
    pub defined_registers: RegisterList,
    pub attributes: RegisterList,
    pub samplers: RegisterList,
    pub uniforms: RegisterList,
    pub constants: Vec<Constant>,
    /// Constant arrays. Lookups walk this newest-first.
    pub variables: Vec<Variable>,
    determined_constants_arrays: bool,
    pub ctab: CtabData,
    pub preshader: Option<Preshader>,

    pub instruction_count: u32,
    pub previous_opcode: Option<Opcode>,
    pub loops: u32,
    pub reps: u32,
    pub max_reps: u32,
    pub cmps: u32,
    pub if_depth: u32,
    pub centroid_allowed: bool,

    pub texm3x2pad_src0: Option<u32>,
    pub texm3x2pad_dst0: Option<u32>,
    pub texm3x3pad_src0: Option<u32>,
    pub texm3x3pad_dst0: Option<u32>,
    pub texm3x3pad_src1: Option<u32>,
    pub texm3x3pad_dst1: Option<u32>,
    pub reset_texmpad: bool,

    pub uses_pointsize: bool,
    pub uses_fog: bool,
    pub have_multi_color_outputs: bool,
    pub have_relative_input_registers: bool,

    pub uniform_float4_count: u32,
    pub uniform_int4_count: u32,
    pub uniform_bool_count: u32,

    pub out: OutputBuffer,
}

impl Context {
    pub fn new(tokens: Vec<u32>, options: &ParseOptions) -> Self {
        let shader_size = tokens.len();
        Self {
            diag: Diagnostics {
                filename: options.filename.clone(),
                ..Diagnostics::default()
            },
            tokens,
            pos: 0,
            shader_size,
            known_size: options.known_size,
            shader_type: ShaderType::empty(),
            major: 0,
            minor: 0,
            version_token: 0,
            saw_end_token: false,
            main_fn: options.effective_main_fn().to_string(),
            swizzles: options.swizzles.clone(),
            sampler_map: options.sampler_map.clone(),
            flip_render_target: options.flip_render_target,
            depth_clipping: options.depth_clipping,
            used_registers: RegisterList::default(),
            defined_registers: RegisterList::default(),
            attributes: RegisterList::default(),
            samplers: RegisterList::default(),
            uniforms: RegisterList::default(),
            constants: Vec::new(),
            variables: Vec::new(),
            determined_constants_arrays: false,
            ctab: CtabData::default(),
            preshader: None,
            instruction_count: 0,
            previous_opcode: None,
            loops: 0,
            reps: 0,
            max_reps: 0,
            cmps: 0,
            if_depth: 0,
            centroid_allowed: false,
            texm3x2pad_src0: None,
            texm3x2pad_dst0: None,
            texm3x3pad_src0: None,
            texm3x3pad_dst0: None,
            texm3x3pad_src1: None,
            texm3x3pad_dst1: None,
            reset_texmpad: false,
            uses_pointsize: false,
            uses_fog: false,
            have_multi_color_outputs: false,
            have_relative_input_registers: false,
            uniform_float4_count: 0,
            uniform_int4_count: 0,
            uniform_bool_count: 0,
            out: OutputBuffer::default(),
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.diag.fail(message);
    }

    pub fn is_fail(&self) -> bool {
        self.diag.is_fail
    }

    // Token cursor.

    /// Token `offset` places past the cursor; zero past the end of the buffer.
    pub fn token(&self, offset: usize) -> u32 {
        self.tokens.get(self.pos + offset).copied().unwrap_or(0)
    }

    /// Tokens from the cursor to the end of the buffer.
    pub fn remaining_tokens(&self) -> &[u32] {
        self.tokens.get(self.pos..).unwrap_or(&[])
    }

    pub fn tokens_remaining(&self) -> usize {
        self.shader_size.saturating_sub(self.pos)
    }

    pub fn knows_size(&self) -> bool {
        self.known_size
    }

    /// Marks the end of the stream at the token after the cursor.
    pub fn end_stream_here(&mut self) {
        self.shader_size = self.pos + 1;
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
        self.diag.position = ErrorPosition::Offset((pos * 4) as u32);
    }

    pub fn adjust_token_position(&mut self, incr: usize) {
        self.set_position(self.pos + incr);
    }

    // Shader version.

    pub fn shader_is_pixel(&self) -> bool {
        self.shader_type == ShaderType::PIXEL
    }

    pub fn shader_is_vertex(&self) -> bool {
        self.shader_type == ShaderType::VERTEX
    }

    pub fn shader_type_str(&self) -> &'static str {
        self.shader_type.short_name()
    }

    pub fn version_at_least(&self, major: u8, minor: u8) -> bool {
        packed_version(self.major, self.minor) >= packed_version(major, minor)
    }

    pub fn version_exactly(&self, major: u8, minor: u8) -> bool {
        self.major == major && self.minor == minor
    }

    pub fn version_supported(major: u8, minor: u8) -> bool {
        packed_version(major, minor) <= packed_version(MAX_SHADER_MAJOR, MAX_SHADER_MINOR)
    }

    // Register model.

    pub fn set_used_register(
        &mut self,
        reg_type: RegisterType,
        reg_num: u32,
        written: bool,
    ) -> &mut Register {
        if reg_type == RegisterType::ColorOut && reg_num > 0 {
            self.have_multi_color_outputs = true;
        }
        let reg = self.used_registers.insert(reg_type, reg_num);
        if written {
            reg.written = true;
        }
        reg
    }

    pub fn set_defined_register(&mut self, reg_type: RegisterType, reg_num: u32) {
        self.defined_registers.insert(reg_type, reg_num);
    }

    pub fn register_was_written(&self, reg_type: RegisterType, reg_num: u32) -> bool {
        self.used_registers
            .find(reg_type, reg_num)
            .is_some_and(|r| r.written)
    }

    pub fn is_defined(&self, reg_type: RegisterType, reg_num: u32) -> bool {
        self.defined_registers.contains(reg_type, reg_num)
    }

    /// Whether a register holds a single component in this shader.
    ///
    /// Generic outputs declared as point size or fog count as scalar too.
    pub fn is_scalar(&self, reg_type: RegisterType, reg_num: u32) -> bool {
        if reg_type == RegisterType::OUTPUT && (self.uses_pointsize || self.uses_fog) {
            if let Some(reg) = self.attributes.find(reg_type, reg_num) {
                return (self.uses_pointsize && reg.usage == Usage::PointSize)
                    || (self.uses_fog && reg.usage == Usage::Fog);
            }
        }
        scalar_register(self.shader_type, reg_type, reg_num)
    }

    /// Records a sampler; a caller-supplied mapping for the stage overrides `texture_type`.
    pub fn add_sampler(&mut self, reg_num: u32, texture_type: u32, texbem: i32) {
        let mapped = self
            .sampler_map
            .iter()
            .find(|m| m.index == reg_num)
            .map(|m| m.sampler_type.texture_type().map_or(0, TextureType::raw));
        let item = self.samplers.insert(RegisterType::Sampler, reg_num);
        item.index = mapped.unwrap_or(texture_type);
        item.misc |= texbem;
    }

    pub fn sampler_texture_type(&self, reg_num: u32) -> Option<TextureType> {
        self.samplers
            .find(RegisterType::Sampler, reg_num)
            .and_then(|r| TextureType::from_raw(r.index))
    }

    pub fn sampler_type(&self, reg_num: u32) -> SamplerType {
        self.sampler_texture_type(reg_num)
            .map_or(SamplerType::Unknown, SamplerType::from)
    }

    pub fn add_attribute_register(
        &mut self,
        reg_type: RegisterType,
        reg_num: u32,
        usage: Usage,
        index: u32,
        write_mask: WriteMask,
        flags: i32,
    ) {
        let item = self.attributes.insert(reg_type, reg_num);
        item.usage = usage;
        item.index = index;
        item.write_mask = write_mask;
        item.misc = flags;

        if reg_type == RegisterType::OUTPUT {
            match usage {
                Usage::PointSize => self.uses_pointsize = true,
                Usage::Fog => self.uses_fog = true,
                _ => {}
            }
        }
    }

    // Constant arrays.

    /// Register ranges a constant table declared become arrays up front.
    pub fn declare_ranges(&mut self, ranges: Vec<DeclaredRange>) {
        for range in ranges {
            self.variables.push(Variable {
                uniform_type: range.uniform_type,
                index: range.index,
                count: range.count,
                constants: Vec::new(),
                used: false,
                emit_position: None,
            });
        }
    }

    /// Groups runs of contiguous `def` float constants into arrays. Runs once.
    pub fn determine_constants_arrays(&mut self) {
        if self.determined_constants_arrays {
            return;
        }
        self.determined_constants_arrays = true;

        let mut floats: Vec<Constant> = self
            .constants
            .iter()
            .filter(|c| c.constant_type == UniformType::Float)
            .copied()
            .collect();
        floats.sort_by_key(|c| c.index);

        let mut i = 0;
        while i < floats.len() {
            let start = floats[i].index;
            let mut count = 1u32;
            while i + (count as usize) < floats.len()
                && floats[i + count as usize].index == start + count
            {
                count += 1;
            }
            trace!(start, count, "constant array");
            self.variables.push(Variable {
                uniform_type: UniformType::Float,
                index: start,
                count,
                constants: floats[i..i + count as usize].to_vec(),
                used: false,
                emit_position: None,
            });
            i += count as usize;
        }
    }

    /// Newest float array containing constant register `reg_num`.
    pub fn find_float_variable(&self, reg_num: u32) -> Option<usize> {
        self.variables
            .iter()
            .enumerate()
            .rev()
            .find(|(_, v)| v.uniform_type == UniformType::Float && v.contains(reg_num))
            .map(|(i, _)| i)
    }

    /// Newest used array containing constant register `reg_num`.
    pub fn find_used_variable(&self, reg_num: u32) -> Option<usize> {
        self.variables
            .iter()
            .enumerate()
            .rev()
            .find(|(_, v)| v.used && v.contains(reg_num))
            .map(|(i, _)| i)
    }

    /// Applies a caller-supplied swizzle override to an input register read.
    pub fn adjust_swizzle(&self, reg_type: RegisterType, reg_num: u32, swizzle: Swizzle) -> Swizzle {
        if reg_type != RegisterType::Input || self.swizzles.is_empty() {
            return swizzle;
        }

        let (usage, index) = if !self.version_at_least(2, 0) {
            match sm1_input_usage(reg_num) {
                Some(found) => found,
                None => return swizzle,
            }
        } else {
            match self.attributes.find(reg_type, reg_num) {
                Some(reg) => (reg.usage, reg.index),
                None => return swizzle,
            }
        };
        if usage == Usage::Unknown {
            return swizzle;
        }

        match self
            .swizzles
            .iter()
            .find(|s| s.usage == usage && s.index == index)
        {
            Some(remap) => {
                let pick = |i: usize| remap.swizzle[swizzle.component(i) as usize] & 0x3;
                Swizzle::new(pick(0), pick(1), pick(2), pick(3))
            }
            None => swizzle,
        }
    }

    // Output.

    /// Appends a line to the current section unless this token already failed.
    pub fn output_line(&mut self, line: &str) {
        if self.diag.is_fail {
            return;
        }
        self.out.line(line);
    }

    pub fn output_blank_line(&mut self) {
        self.out.blank_line();
    }

    pub fn push_output(&mut self, section: Section) {
        self.out.push(section);
    }

    pub fn pop_output(&mut self) {
        self.out.pop();
    }

    pub fn set_output(&mut self, section: Section) {
        self.out.set(section);
    }

    pub fn indent(&mut self) {
        self.out.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.out.indent -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn float_def(index: u32, x: f32) -> Constant {
        Constant {
            constant_type: UniformType::Float,
            index,
            value: [x.to_bits(), 0, 0, 0],
        }
    }

    fn vertex_context(major: u8, minor: u8, options: &ParseOptions) -> Context {
        let mut ctx = Context::new(Vec::new(), options);
        ctx.shader_type = ShaderType::VERTEX;
        ctx.major = major;
        ctx.minor = minor;
        ctx
    }

    #[test]
    fn constant_arrays_group_contiguous_runs_once() {
        let mut ctx = vertex_context(2, 0, &ParseOptions::default());
        ctx.constants = vec![
            float_def(4, 1.0),
            float_def(2, 0.0),
            float_def(3, 0.5),
            float_def(9, 2.0),
            Constant {
                constant_type: UniformType::Int,
                index: 5,
                value: [1, 1, 1, 1],
            },
        ];

        ctx.determine_constants_arrays();
        ctx.determine_constants_arrays();

        assert_eq!(ctx.variables.len(), 2);
        let var = &ctx.variables[0];
        assert_eq!((var.index, var.count), (2, 3));
        assert_eq!(
            var.constants.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!((ctx.variables[1].index, ctx.variables[1].count), (9, 1));
        assert_eq!(ctx.find_float_variable(4), Some(0));
        assert_eq!(ctx.find_float_variable(9), Some(1));
        assert_eq!(ctx.find_float_variable(5), None);
    }

    #[test]
    fn lone_constants_form_one_element_arrays() {
        let mut ctx = vertex_context(2, 0, &ParseOptions::default());
        ctx.constants = vec![float_def(5, 2.0), float_def(0, 1.0)];
        ctx.determine_constants_arrays();

        let runs: Vec<(u32, u32)> = ctx.variables.iter().map(|v| (v.index, v.count)).collect();
        assert_eq!(runs, vec![(0, 1), (5, 1)]);
        assert_eq!(ctx.find_float_variable(0), Some(0));
        assert_eq!(ctx.find_float_variable(5), Some(1));
        assert_eq!(ctx.find_float_variable(1), None);

        let mut ctx = vertex_context(2, 0, &ParseOptions::default());
        ctx.constants = vec![float_def(3, 1.0)];
        ctx.determine_constants_arrays();
        assert_eq!(ctx.variables.len(), 1);
        assert_eq!(ctx.variables[0].constants, vec![float_def(3, 1.0)]);
    }

    #[test]
    fn scalar_classification() {
        let mut ctx = vertex_context(3, 0, &ParseOptions::default());
        assert!(ctx.is_scalar(RegisterType::RastOut, rastout::FOG));
        assert!(!ctx.is_scalar(RegisterType::RastOut, rastout::POSITION));
        assert!(ctx.is_scalar(RegisterType::ConstBool, 3));
        assert!(!ctx.is_scalar(RegisterType::Predicate, 0));
        assert!(!ctx.is_scalar(RegisterType::OUTPUT, 2));

        ctx.add_attribute_register(
            RegisterType::OUTPUT,
            2,
            Usage::PointSize,
            0,
            WriteMask::XYZW,
            0,
        );
        assert!(ctx.uses_pointsize);
        assert!(ctx.is_scalar(RegisterType::OUTPUT, 2));
        assert!(!ctx.is_scalar(RegisterType::OUTPUT, 1));

        ctx.shader_type = ShaderType::PIXEL;
        assert!(ctx.is_scalar(RegisterType::Predicate, 0));
    }

    #[test]
    fn swizzle_override_applies_to_matching_inputs() {
        let options = ParseOptions::default().with_swizzle(SwizzleOverride {
            usage: Usage::Color,
            index: 0,
            swizzle: [2, 1, 0, 3],
        });
        let ctx = vertex_context(1, 1, &options);

        // v5 is COLOR0 in shader model 1.
        let adjusted = ctx.adjust_swizzle(RegisterType::Input, 5, Swizzle::NONE);
        assert_eq!(adjusted, Swizzle::new(2, 1, 0, 3));
        assert_eq!(
            ctx.adjust_swizzle(RegisterType::Input, 0, Swizzle::NONE),
            Swizzle::NONE
        );
        assert_eq!(
            ctx.adjust_swizzle(RegisterType::Temp, 5, Swizzle::NONE),
            Swizzle::NONE
        );
    }

    #[test]
    fn sampler_mapping_overrides_declared_type() {
        let options = ParseOptions::default().with_sampler_mapping(SamplerMapping {
            index: 1,
            sampler_type: SamplerType::Cube,
        });
        let mut ctx = vertex_context(2, 0, &options);
        ctx.add_sampler(0, TextureType::Volume.raw(), 0);
        ctx.add_sampler(1, TextureType::TwoD.raw(), 1);
        assert_eq!(ctx.sampler_type(0), SamplerType::Volume);
        assert_eq!(ctx.sampler_type(1), SamplerType::Cube);
        assert_eq!(ctx.samplers.find(RegisterType::Sampler, 1).map(|r| r.misc), Some(1));
    }

    #[test]
    fn failures_carry_position_and_filename() {
        let options = ParseOptions::default().with_filename("a.pso");
        let mut ctx = Context::new(vec![0; 4], &options);
        ctx.adjust_token_position(2);
        ctx.fail("boom");
        assert!(ctx.is_fail());
        assert_eq!(ctx.diag.errors[0].position, ErrorPosition::Offset(8));
        assert_eq!(ctx.diag.errors[0].filename.as_deref(), Some("a.pso"));
        assert_eq!(ctx.diag.messages(), vec!["boom"]);
    }
}
