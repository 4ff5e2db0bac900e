//! Operand decoding for one instruction.
//!
//! Every decoder advances the cursor past what it consumed and returns the token count, even
//! when it reports a problem, so the driver can keep its place in the stream.

use crate::context::Context;
use crate::instruction::{DestArg, Instruction, SourceArg};
use crate::opcode::ArgShape;
use crate::swizzle::WriteMask;
use crate::token::{DestToken, RelativeToken, SourceToken};
use crate::types::{misctype, RegisterType, ResultMod, SourceMod, TextureType, Usage};

/// Folds the split `Const2..Const4` encodings back into one `Const` register file.
pub(crate) fn normalize_const(reg_type: RegisterType, reg_num: u32) -> (RegisterType, u32) {
    match reg_type {
        RegisterType::Const2 => (RegisterType::Const, reg_num + 2048),
        RegisterType::Const3 => (RegisterType::Const, reg_num + 4096),
        RegisterType::Const4 => (RegisterType::Const, reg_num + 6144),
        other => (other, reg_num),
    }
}

fn valid_texture_type(raw: u32) -> bool {
    TextureType::from_raw(raw).is_some()
}

impl Context {
    /// Decodes the operands `shape` describes into `inst`; returns the instruction's token count
    /// so far (including the opcode token).
    pub(super) fn parse_args(&mut self, shape: ArgShape, inst: &mut Instruction) -> usize {
        match shape {
            ArgShape::Null => 1,
            ArgShape::D => self.parse_operands(inst, 1, 0),
            ArgShape::Ds => self.parse_operands(inst, 1, 1),
            ArgShape::Dss => self.parse_operands(inst, 1, 2),
            ArgShape::Dsss => self.parse_operands(inst, 1, 3),
            ArgShape::Dssss => self.parse_operands(inst, 1, 4),
            ArgShape::S => self.parse_operands(inst, 0, 1),
            ArgShape::Ss => self.parse_operands(inst, 0, 2),
            // sm1/sm2 pass two constant registers of helper values.
            ArgShape::SinCos if !self.version_at_least(3, 0) => self.parse_operands(inst, 1, 3),
            ArgShape::SinCos => self.parse_operands(inst, 1, 1),
            ArgShape::TexCrd if self.version_at_least(1, 4) => self.parse_operands(inst, 1, 1),
            ArgShape::TexCrd => self.parse_operands(inst, 1, 0),
            ArgShape::TexLd if self.version_at_least(2, 0) => self.parse_operands(inst, 1, 2),
            ArgShape::TexLd if self.version_at_least(1, 4) => self.parse_operands(inst, 1, 1),
            ArgShape::TexLd => self.parse_operands(inst, 1, 0),
            ArgShape::Def => self.parse_args_def(inst, RegisterType::Const, "DEF", "CONST"),
            ArgShape::DefI => self.parse_args_def(inst, RegisterType::ConstInt, "DEFI", "CONSTINT"),
            ArgShape::DefB => self.parse_args_defb(inst),
            ArgShape::Dcl => self.parse_args_dcl(inst),
        }
    }

    fn parse_operands(&mut self, inst: &mut Instruction, dst_count: usize, src_count: usize) -> usize {
        let mut total = 1;
        for _ in 0..dst_count {
            let (dst, size) = self.parse_destination_token();
            inst.dst = dst;
            total += size;
        }
        for i in 0..src_count {
            let (src, size) = self.parse_source_token();
            inst.src[i] = src;
            total += size;
        }
        total
    }

    fn parse_args_def(
        &mut self,
        inst: &mut Instruction,
        expected: RegisterType,
        opcode: &str,
        file: &str,
    ) -> usize {
        let (dst, _) = self.parse_destination_token();
        if dst.reg_type != expected {
            self.fail(format!("{opcode} using non-{file} register"));
        }
        if dst.relative {
            self.fail(format!("relative addressing in {opcode}"));
        }
        inst.dst = dst;
        for (i, dword) in inst.dwords.iter_mut().enumerate() {
            *dword = self.token(i);
        }
        6
    }

    fn parse_args_defb(&mut self, inst: &mut Instruction) -> usize {
        let (dst, _) = self.parse_destination_token();
        if dst.reg_type != RegisterType::ConstBool {
            self.fail("DEFB using non-CONSTBOOL register");
        }
        if dst.relative {
            self.fail("relative addressing in DEFB");
        }
        inst.dst = dst;
        inst.dwords[0] = if self.token(0) != 0 { u32::MAX } else { 0 };
        3
    }

    /// `dcl` carries a usage token ahead of its destination; which fields are legal depends on
    /// the shader type, the version and the register being declared.
    fn parse_args_dcl(&mut self, inst: &mut Instruction) -> usize {
        let token = self.token(0);
        let mut unsupported = false;
        let mut reserved_mask = 0u32;

        if token >> 31 != 1 {
            self.fail("Bit #31 in DCL token must be one");
        }

        self.centroid_allowed = true;
        self.adjust_token_position(1);
        let (dst, _) = self.parse_destination_token();
        self.centroid_allowed = false;

        if dst.result_shift != 0 {
            self.fail("shift scale in DCL");
        }
        if dst.relative {
            self.fail("relative addressing in DCL");
        }

        let usage_field = token & 0xF;
        let index_field = (token >> 16) & 0xF;
        let reg_type = dst.reg_type;
        let reg_num = dst.reg_num;

        if self.shader_is_pixel() && self.version_at_least(3, 0) {
            match reg_type {
                RegisterType::Input => {
                    reserved_mask = 0x7FF0_FFE0;
                    inst.dwords[0] = usage_field;
                    inst.dwords[1] = index_field;
                }
                RegisterType::MiscType => {
                    match reg_num {
                        misctype::POSITION => reserved_mask = 0x7FFF_FFFF,
                        misctype::FACE => {
                            reserved_mask = 0x7FFF_FFFF;
                            if !dst.orig_mask.is_xyzw() {
                                self.fail("DCL face writemask must be full");
                            }
                            if !dst.result_mod.is_empty() {
                                self.fail("DCL face result modifier must be zero");
                            }
                            if dst.result_shift != 0 {
                                self.fail("DCL face shift scale must be zero");
                            }
                        }
                        _ => unsupported = true,
                    }
                    inst.dwords[0] = Usage::Unknown.raw() as u32;
                    inst.dwords[1] = 0;
                }
                RegisterType::TEXTURE => {
                    self.check_dcl_texture_usage(usage_field, index_field, "DCL color usage must have 0 index");
                    reserved_mask = 0x7FF0_FFE0;
                    inst.dwords[0] = usage_field;
                    inst.dwords[1] = index_field;
                }
                RegisterType::Sampler => {
                    let texture_type = (token >> 27) & 0xF;
                    if !valid_texture_type(texture_type) {
                        self.fail("unknown sampler texture type");
                    }
                    reserved_mask = 0x07FF_FFFF;
                    inst.dwords[0] = texture_type;
                }
                _ => unsupported = true,
            }
        } else if self.shader_is_pixel() && self.version_at_least(2, 0) {
            match reg_type {
                RegisterType::Input => {
                    inst.dwords[0] = Usage::Color.raw() as u32;
                    inst.dwords[1] = reg_num;
                    reserved_mask = 0x7FFF_FFFF;
                }
                RegisterType::TEXTURE => {
                    inst.dwords[0] = Usage::TexCoord.raw() as u32;
                    inst.dwords[1] = reg_num;
                    reserved_mask = 0x7FFF_FFFF;
                }
                RegisterType::Sampler => {
                    let texture_type = (token >> 27) & 0xF;
                    if !valid_texture_type(texture_type) {
                        self.fail("unknown sampler texture type");
                    }
                    reserved_mask = 0x07FF_FFFF;
                    inst.dwords[0] = texture_type;
                }
                _ => unsupported = true,
            }
        } else if self.shader_is_vertex() && self.version_at_least(3, 0) {
            match reg_type {
                RegisterType::Input | RegisterType::OUTPUT => {
                    reserved_mask = 0x7FF0_FFE0;
                    inst.dwords[0] = usage_field;
                    inst.dwords[1] = index_field;
                }
                RegisterType::TEXTURE => {
                    self.check_dcl_texture_usage(
                        usage_field,
                        index_field,
                        "DCL texcoord usage must have 0 index",
                    );
                    reserved_mask = 0x7FF0_FFE0;
                    inst.dwords[0] = usage_field;
                    inst.dwords[1] = index_field;
                }
                RegisterType::Sampler => {
                    let texture_type = (token >> 27) & 0xF;
                    if !valid_texture_type(texture_type) {
                        self.fail("Unknown sampler texture type");
                    }
                    reserved_mask = 0x0FFF_FFFF;
                    inst.dwords[0] = texture_type;
                }
                _ => unsupported = true,
            }
        } else if self.shader_is_vertex() && self.version_at_least(1, 1) {
            if reg_type == RegisterType::Input {
                reserved_mask = 0x7FF0_FFE0;
                inst.dwords[0] = usage_field;
                inst.dwords[1] = index_field;
            } else {
                unsupported = true;
            }
        } else {
            unsupported = true;
        }

        if unsupported {
            self.fail("invalid DCL register type for this shader model");
        }
        if token & reserved_mask != 0 {
            self.fail("reserved bits in DCL dword aren't zero");
        }

        inst.dst = dst;
        3
    }

    fn check_dcl_texture_usage(&mut self, usage: u32, index: u32, color_message: &str) {
        match Usage::from_raw(usage) {
            Some(Usage::TexCoord) => {
                if index > 7 {
                    self.fail("DCL texcoord usage must have 0-7 index");
                }
            }
            Some(Usage::Color) => {
                if index != 0 {
                    self.fail(color_message);
                }
            }
            _ => self.fail("Invalid DCL texture usage"),
        }
    }

    pub(super) fn parse_destination_token(&mut self) -> (DestArg, usize) {
        let mut info = DestArg::default();
        if self.tokens_remaining() < 1 {
            self.fail("Out of tokens in destination parameter");
            return (info, 0);
        }

        let token = self.token(0);
        let raw = DestToken::decode(token);
        let reg_type = RegisterType::from_raw(raw.reg_type);

        info.token = token;
        info.reg_num = raw.reg_num;
        info.relative = raw.relative;
        info.orig_mask = raw.write_mask;
        info.result_mod = ResultMod::from_bits_truncate(raw.result_mod);
        info.result_shift = raw.result_shift;

        // Scalar registers only ever write `.x`, whatever the token says.
        let scalar = reg_type.is_some_and(|t| self.is_scalar(t, raw.reg_num));
        info.write_mask = if scalar { WriteMask::X } else { raw.write_mask };

        if let Some(reg_type) = reg_type {
            (info.reg_type, info.reg_num) = normalize_const(reg_type, info.reg_num);
        }

        self.adjust_token_position(1);

        if raw.reserved1 != 0 {
            self.fail("Reserved bit #1 in destination token must be zero");
        }
        if raw.reserved2 != 1 {
            self.fail("Reserved bit #2 in destination token must be one");
        }

        if info.relative {
            if !self.shader_is_vertex() {
                self.fail("Relative addressing in non-vertex shader");
            }
            if !self.version_at_least(3, 0) {
                self.fail("Relative addressing in vertex shader version < 3.0");
            }
            if !self.ctab.have_ctab {
                self.fail("relative addressing unsupported without a CTAB");
            }
            self.fail("Relative addressing of dest tokens is unsupported");
            return (info, 1);
        }

        let shift = info.result_shift;
        if shift != 0 {
            if !self.shader_is_pixel() {
                self.fail("Result shift scale in non-pixel shader");
            }
            if self.version_at_least(2, 0) {
                self.fail("Result shift scale in pixel shader version >= 2.0");
            }
            if !matches!(shift, 1..=3 | 13..=15) {
                self.fail("Result shift scale isn't 1 to 3, or 13 to 15.");
            }
        }

        if info.result_mod.contains(ResultMod::PARTIAL_PRECISION) && !self.shader_is_pixel() {
            self.fail("Partial precision result mod in non-pixel shader");
        }

        if info.result_mod.contains(ResultMod::CENTROID) {
            if !self.shader_is_pixel() {
                self.fail("Centroid result mod in non-pixel shader");
            } else if !self.centroid_allowed {
                self.fail("Centroid modifier not allowed here");
            }
        }

        if reg_type.is_none() {
            self.fail("Register type is out of range");
        }

        if !self.is_fail() {
            self.set_used_register(info.reg_type, info.reg_num, true);
        }

        (info, 1)
    }

    pub(super) fn parse_source_token(&mut self) -> (SourceArg, usize) {
        let mut info = SourceArg::default();
        if self.tokens_remaining() < 1 {
            self.fail("Out of tokens in source parameter");
            return (info, 0);
        }

        let mut size = 1;
        let token = self.token(0);
        let raw = SourceToken::decode(token);
        let reg_type = RegisterType::from_raw(raw.reg_type);

        info.token = token;
        info.reg_num = raw.reg_num;
        info.relative = raw.relative;
        if let Some(reg_type) = reg_type {
            (info.reg_type, info.reg_num) = normalize_const(reg_type, info.reg_num);
        }
        let src_mod = SourceMod::from_raw(raw.source_mod);
        info.src_mod = src_mod.unwrap_or_default();
        info.swizzle = self.adjust_swizzle(info.reg_type, info.reg_num, raw.swizzle);

        self.adjust_token_position(1);

        if raw.reserved1 != 0 {
            self.fail("Reserved bits #1 in source token must be zero");
        }
        if raw.reserved2 != 1 {
            self.fail("Reserved bit #2 in source token must be one");
        }
        if reg_type.is_none() {
            self.fail("Register type is out of range");
        }

        if info.relative && self.tokens_remaining() < 1 {
            self.fail("Out of tokens in relative source parameter");
            info.relative = false;
        }

        if info.relative {
            size += self.parse_relative_address(&mut info);
        }

        match src_mod {
            Some(SourceMod::None | SourceMod::AbsNegate | SourceMod::Abs | SourceMod::Negate) => {}
            Some(
                SourceMod::BiasNegate
                | SourceMod::Bias
                | SourceMod::SignNegate
                | SourceMod::Sign
                | SourceMod::Complement
                | SourceMod::X2Negate
                | SourceMod::X2
                | SourceMod::Dz
                | SourceMod::Dw,
            ) => {
                // Only shader model 1 has these.
                if self.version_at_least(2, 0) {
                    self.fail("illegal source mod for this Shader Model.");
                }
            }
            Some(SourceMod::Not) => {
                if self.version_at_least(2, 0)
                    && !matches!(info.reg_type, RegisterType::Predicate | RegisterType::ConstBool)
                {
                    self.fail("NOT only allowed on bool registers.");
                }
            }
            None => self.fail("Unknown source modifier"),
        }

        if !self.is_fail() {
            let reg = self.set_used_register(info.reg_type, info.reg_num, false);
            if info.reg_type == RegisterType::Temp && !reg.written {
                let reg_num = info.reg_num;
                self.fail(format!("Temp register r{reg_num} used uninitialized"));
            }
        }

        (info, size)
    }

    /// Resolves the index register of a relative source operand and the constant array it
    /// reads from. Returns the number of extra tokens consumed.
    fn parse_relative_address(&mut self, info: &mut SourceArg) -> usize {
        let mut extra = 0;

        if self.shader_is_pixel() && !self.version_at_least(3, 0) {
            self.fail("Relative addressing in pixel shader version < 3.0");
        }

        if !self.version_at_least(2, 0) {
            // Shader model 1 always indexes with a0.x.
            info.relative_reg_type = RegisterType::Address;
            info.relative_reg_num = 0;
            info.relative_component = 0;
        } else {
            let rel = RelativeToken::decode(self.token(0));
            self.adjust_token_position(1);
            extra += 1;

            if !rel.high_bit {
                self.fail("bit #31 in relative address must be set");
            }
            if rel.reserved != 0 {
                self.fail("relative address reserved bit must be zero");
            }

            let rel_type = RegisterType::from_raw(rel.reg_type);
            match rel_type {
                Some(RegisterType::Loop | RegisterType::Address) => {}
                _ => self.fail("invalid register for relative address"),
            }
            if rel.reg_num != 0 {
                self.fail("invalid register for relative address");
            }
            if rel_type != Some(RegisterType::Loop) && !rel.swizzle.is_replicate() {
                self.fail("relative address needs replicate swizzle");
            }

            info.relative_reg_type = rel_type.unwrap_or(RegisterType::Address);
            info.relative_reg_num = rel.reg_num;
            info.relative_component = rel.swizzle.x();
        }

        match info.reg_type {
            RegisterType::Input => {
                if self.shader_is_pixel() || !self.version_at_least(3, 0) {
                    self.fail("relative addressing of input registers not supported in this shader model");
                }
                self.have_relative_input_registers = true;
            }
            RegisterType::Const => {
                if !self.ctab.have_ctab {
                    self.fail("relative addressing unsupported without a CTAB");
                } else {
                    self.determine_constants_arrays();
                    match self.find_float_variable(info.reg_num) {
                        Some(var) => {
                            self.variables[var].used = true;
                            info.relative_array = Some(var);
                            self.set_used_register(info.relative_reg_type, info.relative_reg_num, false);
                        }
                        None => self.fail("relative addressing of indeterminate array"),
                    }
                }
            }
            _ => {}
        }

        extra
    }

    /// The trailing predicate operand of a predicated instruction.
    pub(super) fn parse_predicated_token(&mut self, inst: &mut Instruction) -> usize {
        let (arg, size) = self.parse_source_token();
        if size > 0 {
            if arg.reg_type != RegisterType::Predicate {
                self.fail("Predicated instruction but not predicate register!");
            }
            if !matches!(arg.src_mod, SourceMod::None | SourceMod::Not) {
                self.fail("Predicated instruction register is not NONE or NOT");
            }
            if !arg.swizzle.is_none() && !arg.swizzle.is_replicate() {
                self.fail("Predicated instruction register has wrong swizzle");
            }
            if arg.relative {
                self.fail("relative addressing in predicated token");
            }
            inst.predicate = Some(arg);
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ParseOptions;
    use crate::types::ShaderType;

    fn context(shader_type: ShaderType, major: u8, minor: u8, tokens: Vec<u32>) -> Context {
        let mut ctx = Context::new(tokens, &ParseOptions::default());
        ctx.shader_type = shader_type;
        ctx.major = major;
        ctx.minor = minor;
        ctx
    }

    fn reg_bits(reg_type: u32, reg_num: u32) -> u32 {
        ((reg_type & 0x7) << 28) | ((reg_type & 0x18) << 8) | reg_num
    }

    #[test]
    fn split_constant_files_normalize() {
        for (raw, base) in [(11u32, 2048u32), (12, 4096), (13, 6144)] {
            let reg_type = RegisterType::from_raw(raw).unwrap();
            for num in [0u32, 2047] {
                assert_eq!(normalize_const(reg_type, num), (RegisterType::Const, base + num));
            }
        }
        assert_eq!(normalize_const(RegisterType::Const, 2048), (RegisterType::Const, 2048));
        assert_eq!(normalize_const(RegisterType::Temp, 5), (RegisterType::Temp, 5));
    }

    #[test]
    fn destination_marks_register_written() {
        // r3.xy
        let token = 0x8000_0000 | reg_bits(0, 3) | (0b0011 << 16);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![token]);
        let (dst, size) = ctx.parse_destination_token();
        assert_eq!(size, 1);
        assert_eq!((dst.reg_type, dst.reg_num), (RegisterType::Temp, 3));
        assert_eq!(dst.write_mask, WriteMask::XY);
        assert!(ctx.register_was_written(RegisterType::Temp, 3));
        assert_eq!(ctx.position(), 1);
    }

    #[test]
    fn scalar_destination_writes_x_only() {
        // oFog.xyzw on vs_1_1
        let token = 0x8000_0000 | reg_bits(4, 1) | (0xF << 16);
        let mut ctx = context(ShaderType::VERTEX, 1, 1, vec![token]);
        let (dst, _) = ctx.parse_destination_token();
        assert_eq!(dst.write_mask, WriteMask::X);
        assert_eq!(dst.orig_mask, WriteMask::XYZW);
    }

    #[test]
    fn reading_unwritten_temp_fails() {
        let token = 0x8000_0000 | reg_bits(0, 2) | (0xE4 << 16);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![token]);
        let (src, size) = ctx.parse_source_token();
        assert_eq!(size, 1);
        assert_eq!(src.reg_num, 2);
        assert_eq!(ctx.diag.messages(), vec!["Temp register r2 used uninitialized"]);
    }

    #[test]
    fn sm2_source_modifier_restrictions() {
        // c0_bx2 in vs_2_0
        let token = 0x8000_0000 | reg_bits(2, 0) | (0xE4 << 16) | (4 << 24);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![token]);
        ctx.parse_source_token();
        assert_eq!(ctx.diag.messages(), vec!["illegal source mod for this Shader Model."]);

        // !b0 is fine
        let token = 0x8000_0000 | reg_bits(14, 0) | (0xE4 << 16) | (13 << 24);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![token]);
        ctx.parse_source_token();
        assert!(ctx.diag.errors.is_empty());
    }

    #[test]
    fn relative_constant_read_needs_ctab() {
        // c[a0.x + 2] in vs_2_0
        let src = 0x8000_0000 | reg_bits(2, 2) | (1 << 13) | (0xE4 << 16);
        let rel = 0x8000_0000 | reg_bits(3, 0);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![src, rel]);
        let (arg, size) = ctx.parse_source_token();
        assert_eq!(size, 2);
        assert!(arg.relative);
        assert_eq!(arg.relative_reg_type, RegisterType::Address);
        assert_eq!(ctx.diag.messages(), vec!["relative addressing unsupported without a CTAB"]);
    }

    #[test]
    fn relative_constant_read_resolves_declared_array() {
        let src = 0x8000_0000 | reg_bits(2, 5) | (1 << 13) | (0xE4 << 16);
        let rel = 0x8000_0000 | reg_bits(3, 0) | (0x55 << 16);
        let mut ctx = context(ShaderType::VERTEX, 2, 0, vec![src, rel]);
        ctx.ctab.have_ctab = true;
        ctx.declare_ranges(vec![crate::ctab::DeclaredRange {
            uniform_type: crate::types::UniformType::Float,
            index: 4,
            count: 8,
        }]);

        let (arg, size) = ctx.parse_source_token();
        assert_eq!(size, 2);
        assert!(ctx.diag.errors.is_empty(), "{:?}", ctx.diag.errors);
        assert_eq!(arg.relative_array, Some(0));
        assert_eq!(arg.relative_component, 1);
        assert!(ctx.variables[0].used);
        assert!(ctx.used_registers.contains(RegisterType::Address, 0));
    }

    #[test]
    fn def_reads_four_literal_dwords() {
        let dst = 0x8000_0000 | reg_bits(2, 7) | (0xF << 16);
        let tokens = vec![dst, 1.0f32.to_bits(), 2.0f32.to_bits(), 0, 0x7F];
        let mut ctx = context(ShaderType::PIXEL, 2, 0, tokens);
        let mut inst = Instruction::new(crate::opcode::Opcode::Def, 0, false, false);
        assert_eq!(ctx.parse_args(ArgShape::Def, &mut inst), 6);
        assert_eq!(inst.dwords, [1.0f32.to_bits(), 2.0f32.to_bits(), 0, 0x7F]);
        assert_eq!(inst.dst.reg_num, 7);
        assert!(ctx.diag.errors.is_empty());
    }

    #[test]
    fn dcl_rejects_reserved_bits() {
        // dcl_2d s0 with a stray low bit.
        let usage = 0x8000_0000 | (2 << 27) | 1;
        let dst = 0x8000_0000 | reg_bits(10, 0) | (0xF << 16);
        let mut ctx = context(ShaderType::PIXEL, 2, 0, vec![usage, dst]);
        let mut inst = Instruction::new(crate::opcode::Opcode::Dcl, 0, false, false);
        assert_eq!(ctx.parse_args(ArgShape::Dcl, &mut inst), 3);
        assert_eq!(inst.dwords[0], 2);
        assert_eq!(ctx.diag.messages(), vec!["reserved bits in DCL dword aren't zero"]);
    }

    #[test]
    fn predicate_operand_must_be_predicate_register() {
        let token = 0x8000_0000 | reg_bits(14, 0) | (0xE4 << 16);
        let mut ctx = context(ShaderType::VERTEX, 2, 1, vec![token]);
        let mut inst = Instruction::new(crate::opcode::Opcode::Add, 0, false, true);
        assert_eq!(ctx.parse_predicated_token(&mut inst), 1);
        assert_eq!(
            ctx.diag.messages(),
            vec!["Predicated instruction but not predicate register!"]
        );
    }
}
