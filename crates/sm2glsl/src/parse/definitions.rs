//! Declarations for everything the instruction stream touched, emitted once the whole
//! stream has been seen.

use tracing::trace;

use crate::context::{sm1_input_usage, Context};
use crate::profile::Profile;
use crate::register::Register;
use crate::swizzle::WriteMask;
use crate::types::{rastout, RegisterType, TextureType, UniformType, Usage};

impl Context {
    pub(super) fn process_definitions(&mut self, profile: &mut dyn Profile) {
        self.determine_constants_arrays();

        let used: Vec<Register> = self.used_registers.iter().cloned().collect();
        for item in used {
            let (reg_type, reg_num) = (item.reg_type, item.reg_num);
            if self.is_defined(reg_type, reg_num) {
                continue;
            }

            match reg_type {
                RegisterType::RastOut
                | RegisterType::AttrOut
                | RegisterType::TexCrdOut
                | RegisterType::ColorOut
                | RegisterType::DepthOut => {
                    if self.shader_is_vertex() && self.version_at_least(3, 0) {
                        self.fail("vs_3 can't use output registers without declaring them first.");
                        return;
                    }

                    // An output written without a DCL; its semantic follows from the register.
                    let usage = match reg_type {
                        RegisterType::RastOut => match reg_num {
                            rastout::POSITION => Usage::Position,
                            rastout::FOG => Usage::Fog,
                            rastout::POINT_SIZE => Usage::PointSize,
                            _ => Usage::Unknown,
                        },
                        RegisterType::AttrOut | RegisterType::ColorOut => Usage::Color,
                        RegisterType::TexCrdOut => Usage::TexCoord,
                        _ => Usage::Depth,
                    };
                    self.add_attribute_register(reg_type, reg_num, usage, reg_num, WriteMask::XYZW, 0);
                }

                RegisterType::Address
                | RegisterType::Predicate
                | RegisterType::Temp
                | RegisterType::Loop
                | RegisterType::Label => profile.emit_global(self, reg_type, reg_num),

                RegisterType::Const | RegisterType::ConstInt | RegisterType::ConstBool => {
                    self.uniforms.insert(reg_type, reg_num);
                }

                // Shader model 1 inputs need no DCL.
                RegisterType::Input if !self.version_at_least(2, 0) && self.shader_is_pixel() => {
                    self.add_attribute_register(
                        reg_type,
                        reg_num,
                        Usage::Color,
                        reg_num,
                        WriteMask::XYZW,
                        0,
                    );
                }
                RegisterType::Input if !self.version_at_least(2, 0) && self.shader_is_vertex() => {
                    match sm1_input_usage(reg_num) {
                        Some((usage, index)) => self.add_attribute_register(
                            reg_type,
                            reg_num,
                            usage,
                            index,
                            WriteMask::XYZW,
                            0,
                        ),
                        None => self.fail("BUG: we used a register we don't know how to define."),
                    }
                }

                _ => self.fail("BUG: we used a register we don't know how to define."),
            }
        }

        // Constant arrays read through relative addressing.
        for var in (0..self.variables.len()).rev() {
            if !self.variables[var].used {
                continue;
            }
            if self.variables[var].constants.is_empty() {
                profile.emit_array(self, var);
                self.uniform_float4_count += self.variables[var].count;
            } else {
                profile.emit_const_array(self, var);
            }
        }

        let uniforms: Vec<(RegisterType, u32)> =
            self.uniforms.iter().map(|r| (r.reg_type, r.reg_num)).collect();
        for (reg_type, reg_num) in uniforms {
            let array = match reg_type {
                RegisterType::Const => self.find_used_variable(reg_num),
                _ => None,
            };
            if let (Some(var), Some(item)) = (array, self.uniforms.find_mut(reg_type, reg_num)) {
                item.array = Some(var);
            }

            profile.emit_uniform(self, reg_type, reg_num, array);

            if array.is_none() {
                match reg_type {
                    RegisterType::Const => self.uniform_float4_count += 1,
                    RegisterType::ConstInt => self.uniform_int4_count += 1,
                    RegisterType::ConstBool => self.uniform_bool_count += 1,
                    _ => {}
                }
            }
        }

        let samplers: Vec<(u32, u32, bool)> = self
            .samplers
            .iter()
            .map(|r| (r.reg_num, r.index, r.misc != 0))
            .collect();
        for (stage, texture_type, texbem) in samplers {
            profile.emit_sampler(self, stage, TextureType::from_raw(texture_type), texbem);
        }

        let attributes: Vec<Register> = self.attributes.iter().cloned().collect();
        for item in attributes {
            profile.emit_attribute(
                self,
                item.reg_type,
                item.reg_num,
                item.usage,
                item.index,
                item.write_mask,
                item.misc,
            );
        }

        trace!(
            float4 = self.uniform_float4_count,
            int4 = self.uniform_int4_count,
            bool = self.uniform_bool_count,
            "uniform packing"
        );
    }

    /// Packed uniform slots consumed so far for registers of `uniform_type`.
    pub(crate) fn uniform_count(&self, uniform_type: UniformType) -> u32 {
        match uniform_type {
            UniformType::Float => self.uniform_float4_count,
            UniformType::Int => self.uniform_int4_count,
            UniformType::Bool => self.uniform_bool_count,
        }
    }
}
