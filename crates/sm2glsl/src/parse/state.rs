//! Per-opcode legality checks and the register bookkeeping they imply.
//!
//! These run after operand decoding and before code generation; a failure here keeps the
//! instruction away from the profile but never stops the scan.

use crate::context::Context;
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::result::Constant;
use crate::shader_limits::{MAX_LABEL_REGISTER, MAX_SM3_LABEL_REGISTER};
use crate::swizzle::{Swizzle, WriteMask};
use crate::types::{texld_control, RegisterType, ResultMod, SourceMod, TextureType, UniformType, Usage};

impl Context {
    pub(super) fn check_instruction(&mut self, inst: &mut Instruction) {
        match inst.opcode {
            Opcode::Def => self.state_def(inst, UniformType::Float),
            Opcode::DefI => self.state_def(inst, UniformType::Int),
            Opcode::DefB => self.state_def(inst, UniformType::Bool),
            Opcode::Dcl => self.state_dcl(inst),
            Opcode::TexCrd => {
                if self.version_at_least(2, 0) {
                    self.fail("TEXCRD in Shader Model >= 2.0");
                }
            }
            Opcode::Frc => self.state_frc(inst),
            Opcode::M4x4 => self.state_matrix(inst, "M4X4", WriteMask::XYZW, "must be full", 4),
            Opcode::M4x3 => self.state_matrix(inst, "M4X3", WriteMask::XYZ, "must be .xyz", 3),
            Opcode::M3x4 => self.state_matrix(inst, "M3X4", WriteMask::XYZW, "must be .xyzw", 4),
            Opcode::M3x3 => self.state_matrix(inst, "M3X3", WriteMask::XYZ, "must be .xyz", 3),
            Opcode::M3x2 => self.state_matrix(inst, "M3X2", WriteMask::XY, "must be .xy", 2),
            Opcode::Ret => {
                if self.loops > 0 {
                    self.fail("LOOP without ENDLOOP");
                }
                if self.reps > 0 {
                    self.fail("REP without ENDREP");
                }
            }
            Opcode::Label => {
                if self.previous_opcode != Some(Opcode::Ret) {
                    self.fail("LABEL not followed by a RET");
                }
                self.check_label_register(inst, "LABEL");
                self.set_defined_register(RegisterType::Label, inst.src[0].reg_num);
            }
            Opcode::Call => {
                self.check_label_register(inst, "CALL");
                self.check_call_loop_wrappage(inst.src[0].reg_num);
            }
            Opcode::CallNz => {
                if !matches!(inst.src[1].reg_type, RegisterType::ConstBool | RegisterType::Predicate) {
                    self.fail("CALLNZ argument isn't constbool or predicate register");
                }
                self.check_label_register(inst, "CALLNZ");
                self.check_call_loop_wrappage(inst.src[0].reg_num);
            }
            Opcode::MovA => {
                if inst.dst.reg_type != RegisterType::Address {
                    self.fail("MOVA argument isn't address register");
                }
            }
            Opcode::Rcp => self.require_replicate(inst, 0, "RCP without replicate swizzle"),
            Opcode::Rsq => self.require_replicate(inst, 0, "RSQ without replicate swizzle"),
            Opcode::Loop => {
                if inst.src[0].reg_type != RegisterType::Loop {
                    self.fail("LOOP argument isn't loop register");
                } else if inst.src[1].reg_type != RegisterType::ConstInt {
                    self.fail("LOOP argument isn't constint register");
                } else {
                    self.loops += 1;
                }
            }
            Opcode::EndLoop => {
                if self.loops == 0 {
                    self.fail("ENDLOOP without LOOP");
                } else {
                    self.loops -= 1;
                }
            }
            Opcode::BreakP => {
                if inst.src[0].reg_type != RegisterType::Predicate {
                    self.fail("BREAKP argument isn't predicate register");
                } else if !inst.src[0].swizzle.is_replicate() {
                    self.fail("BREAKP without replicate swizzle");
                } else if !self.inside_loop() {
                    self.fail("BREAKP outside LOOP/ENDLOOP or REP/ENDREP");
                }
            }
            Opcode::Break => {
                if !self.inside_loop() {
                    self.fail("BREAK outside LOOP/ENDLOOP or REP/ENDREP");
                }
            }
            Opcode::SetP => {
                if inst.dst.reg_type != RegisterType::Predicate {
                    self.fail("SETP argument isn't predicate register");
                }
            }
            Opcode::Rep => {
                if inst.src[0].reg_type != RegisterType::ConstInt {
                    self.fail("REP argument isn't constint register");
                }
                self.reps += 1;
                self.max_reps = self.max_reps.max(self.reps);
            }
            Opcode::EndRep => {
                if self.reps == 0 {
                    self.fail("ENDREP without REP");
                } else {
                    self.reps -= 1;
                }
            }
            Opcode::Cmp => self.state_cmp(inst),
            Opcode::Dp4 => {
                // ps_1_2 and ps_1_3 charge an extra slot.
                if !self.version_at_least(1, 4) {
                    self.instruction_count += 1;
                }
            }
            Opcode::Cnd => self.state_cnd(inst),
            Opcode::Pow => {
                if !inst.src[0].swizzle.is_replicate() {
                    self.fail("POW src0 must have replicate swizzle");
                } else if !inst.src[1].swizzle.is_replicate() {
                    self.fail("POW src1 must have replicate swizzle");
                }
            }
            Opcode::Log => self.require_replicate(inst, 0, "LOG src0 must have replicate swizzle"),
            Opcode::LogP => self.require_replicate(inst, 0, "LOGP src0 must have replicate swizzle"),
            Opcode::SinCos => self.state_sincos(inst),
            Opcode::If => {
                if !matches!(inst.src[0].reg_type, RegisterType::Predicate | RegisterType::ConstBool) {
                    self.fail("IF src0 must be CONSTBOOL or PREDICATE");
                }
                self.if_depth += 1;
            }
            Opcode::Ifc => {
                if !inst.src[0].swizzle.is_replicate() {
                    self.fail("IFC src0 must have replicate swizzle");
                } else if !inst.src[1].swizzle.is_replicate() {
                    self.fail("IFC src1 must have replicate swizzle");
                }
                self.if_depth += 1;
            }
            Opcode::Else => {
                if self.if_depth == 0 {
                    self.fail("ELSE without IF");
                }
            }
            Opcode::EndIf => {
                if self.if_depth == 0 {
                    self.fail("ENDIF without IF");
                } else {
                    self.if_depth -= 1;
                }
            }
            Opcode::BreakC => {
                if !inst.src[0].swizzle.is_replicate() {
                    self.fail("BREAKC src1 must have replicate swizzle");
                } else if !inst.src[1].swizzle.is_replicate() {
                    self.fail("BREAKC src2 must have replicate swizzle");
                } else if !self.inside_loop() {
                    self.fail("BREAKC outside LOOP/ENDLOOP or REP/ENDREP");
                }
            }
            Opcode::TexKill => {
                // Documented as a source operand, encoded as a destination.
                if !inst.dst.write_mask.is_xyzw() {
                    self.fail("TEXKILL writemask must be .xyzw");
                } else if !matches!(inst.dst.reg_type, RegisterType::Temp | RegisterType::TEXTURE) {
                    self.fail("TEXKILL must use a temp or texture register");
                }
            }
            Opcode::TexBem => self.state_texbem(inst, "TEXBEM"),
            Opcode::TexBemL => self.state_texbem(inst, "TEXBEML"),
            Opcode::TexM3x2Pad => {
                if self.version_at_least(1, 4) {
                    self.fail("TEXM3X2PAD opcode not available after Shader Model 1.3");
                }
                self.state_texops(inst, "TEXM3X2PAD", None, 0);
                self.texm3x2pad_src0 = Some(inst.src[0].reg_num);
                self.texm3x2pad_dst0 = Some(inst.dst.reg_num);
            }
            Opcode::TexM3x2Tex => self.state_texm3x2tex(inst),
            Opcode::TexM3x3Pad => self.state_texm3x3pad(inst),
            Opcode::TexM3x3 => {
                if !self.version_at_least(1, 2) {
                    self.fail("TEXM3X3 opcode not available in Shader Model 1.1");
                }
                self.state_texm3x3_family(inst, "TEXM3X3", None);
            }
            Opcode::TexM3x3Tex => {
                self.state_texm3x3_family(inst, "TEXM3X3TEX", Some(TextureType::Cube));
            }
            Opcode::TexM3x3Spec => {
                self.state_texm3x3_family(inst, "TEXM3X3SPEC", Some(TextureType::Cube));
                if inst.src[1].reg_type != RegisterType::Const {
                    self.fail("TEXM3X3SPEC final arg must be a constant register");
                }
            }
            Opcode::TexM3x3VSpec => {
                self.state_texm3x3_family(inst, "TEXM3X3VSPEC", Some(TextureType::Cube));
            }
            Opcode::TexLd => self.state_texld(inst),
            Opcode::TexLdl => {
                if !self.version_at_least(3, 0) {
                    self.fail("TEXLDL in version < Shader Model 3.0");
                } else if inst.src[1].reg_type != RegisterType::Sampler {
                    self.fail("TEXLDL src1 must be sampler register");
                } else {
                    self.charge_cube_lookup(inst.src[1].reg_num);
                }
            }
            Opcode::Dp2Add => self.require_replicate(inst, 2, "DP2ADD src2 must have replicate swizzle"),
            _ => {}
        }
    }

    fn inside_loop(&self) -> bool {
        self.loops > 0 || self.reps > 0
    }

    fn require_replicate(&mut self, inst: &Instruction, idx: usize, message: &str) {
        if !inst.src[idx].swizzle.is_replicate() {
            self.fail(message);
        }
    }

    fn state_def(&mut self, inst: &Instruction, constant_type: UniformType) {
        let (opcode, expected) = match constant_type {
            UniformType::Float => ("DEF", RegisterType::Const),
            UniformType::Int => ("DEFI", RegisterType::ConstInt),
            UniformType::Bool => ("DEFB", RegisterType::ConstBool),
        };
        let reg_type = inst.dst.reg_type;
        let reg_num = inst.dst.reg_num;

        if self.instruction_count > 0 {
            self.fail(format!("{opcode} token must come before any instructions"));
        } else if reg_type != expected {
            self.fail(format!("{opcode} token using invalid register"));
        } else {
            let value = match constant_type {
                UniformType::Bool => [inst.dwords[0], 0, 0, 0],
                _ => inst.dwords,
            };
            self.constants.push(Constant {
                constant_type,
                index: reg_num,
                value,
            });
            self.set_defined_register(reg_type, reg_num);
        }
    }

    fn state_dcl(&mut self, inst: &Instruction) {
        let dst = &inst.dst;
        let (reg_type, reg_num) = (dst.reg_type, dst.reg_num);

        if self.instruction_count > 0 {
            self.fail("DCL token must come before any instructions");
        } else if self.shader_is_vertex() || self.shader_is_pixel() {
            if reg_type == RegisterType::Sampler {
                self.add_sampler(reg_num, inst.dwords[0], 0);
            } else {
                let usage = if inst.dwords[0] == u32::MAX {
                    Some(Usage::Unknown)
                } else {
                    Usage::from_raw(inst.dwords[0])
                };
                let Some(usage) = usage else {
                    self.fail("unknown DCL usage");
                    return;
                };
                self.add_attribute_register(
                    reg_type,
                    reg_num,
                    usage,
                    inst.dwords[1],
                    dst.write_mask,
                    dst.result_mod.bits() as i32,
                );
            }
        } else {
            self.fail("unsupported shader type.");
            return;
        }

        self.set_defined_register(reg_type, reg_num);
    }

    fn state_frc(&mut self, inst: &Instruction) {
        if inst.dst.result_mod.contains(ResultMod::SATURATE) {
            self.fail("FRC destination can't use saturate modifier");
        } else if !self.version_at_least(2, 0) {
            let mask = inst.dst.write_mask;
            if !mask.is_y() && !mask.is_xy() {
                self.fail("FRC writemask must be .y or .xy for shader model 1.x");
            }
        }
    }

    fn state_matrix(
        &mut self,
        inst: &mut Instruction,
        opcode: &str,
        mask: WriteMask,
        mask_rule: &str,
        rows: usize,
    ) {
        if inst.dst.write_mask.raw() & 0xF != mask.raw() {
            self.fail(format!("{opcode} writemask {mask_rule}"));
        }
        self.matrix_replicate(inst, rows);
    }

    /// The matrix operand names only its first row; the rest are the following registers.
    fn matrix_replicate(&mut self, inst: &mut Instruction, rows: usize) {
        let first = inst.src[1];
        for i in 1..rows {
            let mut row = first;
            row.reg_num += i as u32;
            self.set_used_register(row.reg_type, row.reg_num, false);
            inst.src[1 + i] = row;
        }
    }

    fn check_label_register(&mut self, inst: &Instruction, opcode: &str) {
        let src = &inst.src[0];
        if src.reg_type != RegisterType::Label {
            self.fail(format!("{opcode} with a non-label register specified"));
        }
        if !self.version_at_least(2, 0) {
            self.fail(format!("{opcode} not supported in Shader Model 1"));
        }
        if self.version_at_least(2, 255) {
            if src.reg_num > MAX_SM3_LABEL_REGISTER {
                self.fail(format!("label register number must be <= {MAX_SM3_LABEL_REGISTER}"));
            }
        } else if src.reg_num > MAX_LABEL_REGISTER {
            self.fail(format!("label register number must be <= {MAX_LABEL_REGISTER}"));
        }
    }

    /// A label called from inside a loop receives `aL`, so every call to it must agree.
    fn check_call_loop_wrappage(&mut self, reg_num: u32) {
        let current = if self.loops > 0 { 1 } else { -1 };
        let Some(reg) = self.used_registers.find_mut(RegisterType::Label, reg_num) else {
            self.fail("Invalid label for CALL");
            return;
        };
        if reg.misc == 0 {
            reg.misc = current;
        } else if reg.misc != current {
            self.fail(if current == 1 {
                "CALL to this label must be wrapped in LOOP/ENDLOOP"
            } else {
                "CALL to this label must not be wrapped in LOOP/ENDLOOP"
            });
        }
    }

    fn state_cmp(&mut self, inst: &Instruction) {
        self.cmps += 1;

        if self.version_at_least(1, 4) {
            return;
        }

        if self.cmps > 3 {
            self.fail("only 3 CMP instructions allowed in this shader model");
        }
        let dst = &inst.dst;
        for src in &inst.src[..3] {
            if src.reg_type == dst.reg_type && src.reg_num == dst.reg_num {
                self.fail("CMP dest can't match sources in this shader model");
            }
        }
        // ps_1_2 and ps_1_3 charge an extra slot.
        self.instruction_count += 1;
    }

    fn state_cnd(&mut self, inst: &Instruction) {
        if self.version_at_least(2, 0) {
            self.fail("CND not allowed in this shader model");
        } else if !self.version_at_least(1, 4) {
            let src = &inst.src[0];
            if src.reg_type != RegisterType::Temp || src.reg_num != 0 || src.swizzle != Swizzle::replicate(3) {
                self.fail("CND src must be r0.a in this shader model");
            }
        }
    }

    fn state_sincos(&mut self, inst: &Instruction) {
        let mask = inst.dst.write_mask;
        if !mask.is_x() && !mask.is_y() && !mask.is_xy() {
            self.fail("SINCOS write mask must be .x or .y or .xy");
        } else if !inst.src[0].swizzle.is_replicate() {
            self.fail("SINCOS src0 must have replicate swizzle");
        } else if inst.dst.result_mod.contains(ResultMod::SATURATE) {
            self.fail("SINCOS destination can't use saturate modifier");
        } else if !self.version_at_least(3, 0) {
            for i in 1..3 {
                if inst.src[i].reg_type != RegisterType::Const {
                    self.fail(format!("SINCOS src{i} must be constfloat"));
                    return;
                }
            }
            if inst.src[1].reg_num == inst.src[2].reg_num {
                self.fail("SINCOS src1 and src2 must be different registers");
            }
        }
    }

    /// Shared checks of the ps_1_x texture-address ops: `t#` operands, source below
    /// destination, and the coordinates and sampler they implicitly declare.
    fn state_texops(&mut self, inst: &Instruction, opcode: &str, sampler: Option<TextureType>, texbem: i32) {
        let dst = inst.dst;
        let src = inst.src[0];
        if dst.reg_type != RegisterType::TEXTURE {
            self.fail(format!("{opcode} destination must be a texture register"));
        }
        if src.reg_type != RegisterType::TEXTURE {
            self.fail(format!("{opcode} source must be a texture register"));
        }
        if src.reg_num >= dst.reg_num {
            self.fail(format!("{opcode} dest must be a higher register than source"));
        }

        if let Some(texture_type) = sampler {
            self.add_sampler(dst.reg_num, texture_type.raw(), texbem);
        }

        self.add_attribute_register(
            RegisterType::TEXTURE,
            dst.reg_num,
            Usage::TexCoord,
            dst.reg_num,
            WriteMask::XYZW,
            0,
        );
        // The coordinates read may never have been loaded by a `tex`, declare them anyway.
        self.add_attribute_register(
            RegisterType::TEXTURE,
            src.reg_num,
            Usage::TexCoord,
            src.reg_num,
            WriteMask::XYZW,
            0,
        );
    }

    fn state_texbem(&mut self, inst: &Instruction, opcode: &str) {
        if self.version_at_least(1, 4) {
            self.fail(format!("{opcode} opcode not available after Shader Model 1.3"));
        }
        if !self.version_at_least(1, 2) && inst.src[0].src_mod == SourceMod::Sign {
            self.fail(format!("{opcode} forbids _bx2 on source reg before ps_1_2"));
        }
        self.state_texops(inst, opcode, Some(TextureType::TwoD), 1);
    }

    fn state_texm3x2tex(&mut self, inst: &Instruction) {
        if self.version_at_least(1, 4) {
            self.fail("TEXM3X2TEX opcode not available after Shader Model 1.3");
        }
        if self.texm3x2pad_dst0.is_none() {
            self.fail("TEXM3X2TEX opcode without matching TEXM3X2PAD");
        }
        self.state_texops(inst, "TEXM3X2TEX", Some(TextureType::TwoD), 0);
        self.reset_texmpad = true;

        // A sampler mapping may have forced something else.
        if self.sampler_texture_type(inst.dst.reg_num) != Some(TextureType::TwoD) {
            self.fail("TEXM3X2TEX needs a 2D sampler");
        }
    }

    fn state_texm3x3pad(&mut self, inst: &Instruction) {
        if self.version_at_least(1, 4) {
            self.fail("TEXM3X3PAD opcode not available after Shader Model 1.3");
        }
        self.state_texops(inst, "TEXM3X3PAD", None, 0);

        if self.texm3x3pad_dst0.is_none() {
            self.texm3x3pad_src0 = Some(inst.src[0].reg_num);
            self.texm3x3pad_dst0 = Some(inst.dst.reg_num);
        } else if self.texm3x3pad_dst1.is_none() {
            self.texm3x3pad_src1 = Some(inst.src[0].reg_num);
            self.texm3x3pad_dst1 = Some(inst.dst.reg_num);
        }
    }

    fn state_texm3x3_family(&mut self, inst: &Instruction, opcode: &str, sampler: Option<TextureType>) {
        if self.version_at_least(1, 4) {
            self.fail(format!("{opcode} opcode not available after Shader Model 1.3"));
        }
        if self.texm3x3pad_dst1.is_none() {
            self.fail(format!("{opcode} opcode without matching TEXM3X3PADs"));
        }
        self.state_texops(inst, opcode, sampler, 0);
        self.reset_texmpad = true;

        // Plain TEXM3X3 samples nothing.
        if sampler.is_some()
            && !matches!(
                self.sampler_texture_type(inst.dst.reg_num),
                Some(TextureType::Volume | TextureType::Cube)
            )
        {
            self.fail(format!("{opcode} needs a 3D or Cubemap sampler"));
        }
    }

    fn state_texld(&mut self, inst: &Instruction) {
        if self.version_at_least(2, 0) {
            let src0 = inst.src[0];
            let src1 = inst.src[1];

            if src0.src_mod != SourceMod::None {
                self.fail("TEXLD src0 must have no modifiers");
            } else if src1.reg_type != RegisterType::Sampler {
                self.fail("TEXLD src1 must be sampler register");
            } else if src1.src_mod != SourceMod::None {
                self.fail("TEXLD src1 must have no modifiers");
            } else if !matches!(
                inst.controls,
                texld_control::TEXLD | texld_control::TEXLDP | texld_control::TEXLDB
            ) {
                self.fail("TEXLD has unknown control bits");
            }

            // Shader model 3 allows swizzles here.
            if !self.version_at_least(3, 0) {
                if !src0.swizzle.is_none() {
                    self.fail("TEXLD src0 must not swizzle");
                } else if !src1.swizzle.is_none() {
                    self.fail("TEXLD src1 must not swizzle");
                }
            }

            self.charge_cube_lookup(src1.reg_num);
        } else if self.version_at_least(1, 4) {
            // ps_1_4 `texld` needs no extra checks.
        } else {
            let dst = inst.dst;
            if dst.reg_type != RegisterType::TEXTURE {
                self.fail("TEX param must be a texture register");
            }
            self.add_sampler(dst.reg_num, TextureType::TwoD.raw(), 0);
        }
    }

    /// Cube-map lookups cost three extra slots.
    fn charge_cube_lookup(&mut self, sampler: u32) {
        if self.sampler_texture_type(sampler) == Some(TextureType::Cube) {
            self.instruction_count += 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::SourceArg;
    use crate::result::ParseOptions;
    use crate::types::ShaderType;

    fn context(shader_type: ShaderType, major: u8, minor: u8) -> Context {
        let mut ctx = Context::new(Vec::new(), &ParseOptions::default());
        ctx.shader_type = shader_type;
        ctx.major = major;
        ctx.minor = minor;
        ctx
    }

    fn src(reg_type: RegisterType, reg_num: u32) -> SourceArg {
        SourceArg {
            reg_type,
            reg_num,
            ..SourceArg::default()
        }
    }

    #[test]
    fn unbalanced_closers_fail_without_underflow() {
        let mut ctx = context(ShaderType::VERTEX, 3, 0);
        for (opcode, message) in [
            (Opcode::EndLoop, "ENDLOOP without LOOP"),
            (Opcode::EndRep, "ENDREP without REP"),
            (Opcode::Else, "ELSE without IF"),
            (Opcode::EndIf, "ENDIF without IF"),
        ] {
            ctx.diag = Default::default();
            let mut inst = Instruction::new(opcode, 0, false, false);
            ctx.check_instruction(&mut inst);
            assert_eq!(ctx.diag.messages(), vec![message]);
        }
        assert_eq!((ctx.loops, ctx.reps, ctx.if_depth), (0, 0, 0));
    }

    #[test]
    fn ret_rejects_open_loops() {
        let mut ctx = context(ShaderType::VERTEX, 3, 0);
        let mut rep = Instruction::new(Opcode::Rep, 0, false, false);
        rep.src[0] = src(RegisterType::ConstInt, 0);
        ctx.check_instruction(&mut rep);
        assert_eq!((ctx.reps, ctx.max_reps), (1, 1));

        let mut ret = Instruction::new(Opcode::Ret, 0, false, false);
        ctx.check_instruction(&mut ret);
        assert_eq!(ctx.diag.messages(), vec!["REP without ENDREP"]);
    }

    #[test]
    fn matrix_rows_follow_first_register() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        let mut inst = Instruction::new(Opcode::M4x4, 0, false, false);
        inst.dst.write_mask = WriteMask::XYZW;
        inst.src[1] = src(RegisterType::Const, 8);
        ctx.check_instruction(&mut inst);

        assert!(ctx.diag.errors.is_empty());
        let rows: Vec<_> = inst.src[1..5].iter().map(|s| s.reg_num).collect();
        assert_eq!(rows, vec![8, 9, 10, 11]);
        for num in 9..12 {
            assert!(ctx.used_registers.contains(RegisterType::Const, num));
        }
    }

    #[test]
    fn m3x2_covers_two_rows() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        let mut inst = Instruction::new(Opcode::M3x2, 0, false, false);
        inst.dst.write_mask = WriteMask::XY;
        inst.src[1] = src(RegisterType::Const, 0);
        ctx.check_instruction(&mut inst);
        assert!(ctx.used_registers.contains(RegisterType::Const, 1));
        assert!(!ctx.used_registers.contains(RegisterType::Const, 2));
    }

    #[test]
    fn matrix_write_mask_is_checked() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        let mut inst = Instruction::new(Opcode::M4x3, 0, false, false);
        inst.dst.write_mask = WriteMask::XYZW;
        ctx.check_instruction(&mut inst);
        assert_eq!(ctx.diag.messages(), vec!["M4X3 writemask must be .xyz"]);
    }

    #[test]
    fn def_after_instructions_fails() {
        let mut ctx = context(ShaderType::PIXEL, 2, 0);
        ctx.instruction_count = 1;
        let mut inst = Instruction::new(Opcode::Def, 0, false, false);
        inst.dst.reg_type = RegisterType::Const;
        ctx.check_instruction(&mut inst);
        assert_eq!(ctx.diag.messages(), vec!["DEF token must come before any instructions"]);
        assert!(ctx.constants.is_empty());
    }

    #[test]
    fn defb_records_normalized_bool() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        let mut inst = Instruction::new(Opcode::DefB, 0, false, false);
        inst.dst.reg_type = RegisterType::ConstBool;
        inst.dst.reg_num = 3;
        inst.dwords = [u32::MAX, 7, 7, 7];
        ctx.check_instruction(&mut inst);
        assert_eq!(ctx.constants.len(), 1);
        assert!(ctx.constants[0].as_bool());
        assert_eq!(ctx.constants[0].value, [u32::MAX, 0, 0, 0]);
        assert!(ctx.is_defined(RegisterType::ConstBool, 3));
    }

    #[test]
    fn call_inside_and_outside_loop_conflict() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        ctx.set_used_register(RegisterType::Label, 1, false);
        let mut call = Instruction::new(Opcode::Call, 0, false, false);
        call.src[0] = src(RegisterType::Label, 1);
        ctx.check_instruction(&mut call);
        assert!(ctx.diag.errors.is_empty());

        ctx.loops = 1;
        ctx.check_instruction(&mut call);
        assert_eq!(
            ctx.diag.messages(),
            vec!["CALL to this label must be wrapped in LOOP/ENDLOOP"]
        );
    }

    #[test]
    fn texm3x2tex_requires_pad() {
        let mut ctx = context(ShaderType::PIXEL, 1, 1);
        let mut inst = Instruction::new(Opcode::TexM3x2Tex, 0, false, false);
        inst.dst.reg_type = RegisterType::TEXTURE;
        inst.dst.reg_num = 2;
        inst.src[0] = src(RegisterType::TEXTURE, 1);
        ctx.check_instruction(&mut inst);
        assert_eq!(
            ctx.diag.messages(),
            vec!["TEXM3X2TEX opcode without matching TEXM3X2PAD"]
        );
        assert!(ctx.reset_texmpad);
        assert_eq!(ctx.sampler_type(2), crate::types::SamplerType::TwoD);
    }

    #[test]
    fn cube_texld_costs_extra_slots() {
        let mut ctx = context(ShaderType::PIXEL, 2, 0);
        ctx.add_sampler(0, TextureType::Cube.raw(), 0);
        let mut inst = Instruction::new(Opcode::TexLd, 0, false, false);
        inst.src[0] = src(RegisterType::TEXTURE, 0);
        inst.src[1] = src(RegisterType::Sampler, 0);
        ctx.check_instruction(&mut inst);
        assert!(ctx.diag.errors.is_empty());
        assert_eq!(ctx.instruction_count, 3);
    }

    #[test]
    fn sincos_sm2_needs_constant_helpers() {
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        let mut inst = Instruction::new(Opcode::SinCos, 0, false, false);
        inst.dst.write_mask = WriteMask::XY;
        inst.src[0].swizzle = Swizzle::replicate(0);
        inst.src[1] = src(RegisterType::Const, 0);
        inst.src[2] = src(RegisterType::Temp, 1);
        ctx.check_instruction(&mut inst);
        assert_eq!(ctx.diag.messages(), vec!["SINCOS src2 must be constfloat"]);
    }
}
