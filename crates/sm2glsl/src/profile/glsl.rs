//! GLSL output shared by the `glsl`, `glsl120`, `glsles` and `glsl400` profiles.
//!
//! Every D3D register becomes a GLSL name of the form `{vs|ps}_{asm name}`. Uniform
//! registers are `#define`d onto slots of one packed array per type, which is sized and
//! declared last, in [`Profile::emit_finalize`], once every slot has been handed out.

use tracing::trace;

use super::Profile;
use crate::context::Context;
use crate::instruction::{DestArg, Instruction, SourceArg};
use crate::opcode::Opcode;
use crate::output::Section;
use crate::swizzle::{Swizzle, WriteMask, COMPONENT_CHARS};
use crate::types::{
    misctype, rastout, texld_control, Comparison, RegisterType, ResultMod, SourceMod,
    TextureType, UniformType, Usage,
};

const MASK_Z: WriteMask = WriteMask(0b0100);
const MASK_W: WriteMask = WriteMask(0b1000);

/// Language features a GLSL profile may rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlslFlavor {
    /// Array constructors, so `def` arrays can be `const`.
    pub supports_120: bool,
    /// OpenGL ES 2.0: precision qualifiers, no fixed-function builtins.
    pub supports_es: bool,
    /// `in`/`out` storage qualifiers, no fixed-function builtins.
    pub supports_400: bool,
}

impl GlslFlavor {
    pub const GLSL: Self = Self {
        supports_120: false,
        supports_es: false,
        supports_400: false,
    };
    pub const GLSL120: Self = Self {
        supports_120: true,
        supports_es: false,
        supports_400: false,
    };
    pub const GLSLES: Self = Self {
        supports_120: false,
        supports_es: true,
        supports_400: false,
    };
    pub const GLSL400: Self = Self {
        supports_120: true,
        supports_es: false,
        supports_400: true,
    };

    /// Whether `gl_TexCoord[]`, `gl_FrontColor` and friends exist.
    fn fixed_function_builtins(self) -> bool {
        !self.supports_es && !self.supports_400
    }
}

#[derive(Debug)]
pub(crate) struct GlslProfile {
    name: &'static str,
    flavor: GlslFlavor,
    generated_lit_helper: bool,
    generated_texlod_setup: bool,
    generated_texm3x3spec_helper: bool,
    needs_max_float: bool,
}

impl GlslProfile {
    pub fn new(name: &'static str, flavor: GlslFlavor) -> Self {
        Self {
            name,
            flavor,
            generated_lit_helper: false,
            generated_texlod_setup: false,
            generated_texm3x3spec_helper: false,
            needs_max_float: false,
        }
    }
}

/// Assembly spelling of a register, e.g. `r0`, `oPos` or `vFace`.
fn register_name(ctx: &Context, reg_type: RegisterType, reg_num: u32) -> Option<String> {
    let (prefix, numbered) = match reg_type {
        RegisterType::Temp => ("r", true),
        RegisterType::Input => ("v", true),
        RegisterType::Const => ("c", true),
        RegisterType::Address if ctx.shader_is_vertex() => ("a", true),
        RegisterType::Address => ("t", true),
        RegisterType::RastOut => match reg_num {
            rastout::POSITION => ("oPos", false),
            rastout::FOG => ("oFog", false),
            rastout::POINT_SIZE => ("oPts", false),
            _ => return None,
        },
        RegisterType::AttrOut => ("oD", true),
        RegisterType::TexCrdOut if ctx.shader_is_vertex() && ctx.version_at_least(3, 0) => {
            ("o", true)
        }
        RegisterType::TexCrdOut => ("oT", true),
        RegisterType::ConstInt => ("i", true),
        RegisterType::ColorOut => ("oC", true),
        RegisterType::DepthOut => ("oDepth", false),
        RegisterType::Sampler => ("s", true),
        RegisterType::ConstBool => ("b", true),
        RegisterType::Loop => ("aL", false),
        RegisterType::MiscType => match reg_num {
            misctype::POSITION => ("vPos", false),
            misctype::FACE => ("vFace", false),
            _ => return None,
        },
        RegisterType::Label => ("l", true),
        RegisterType::Predicate => ("p", true),
        _ => return None,
    };

    Some(if numbered {
        format!("{prefix}{reg_num}")
    } else {
        prefix.to_string()
    })
}

fn uniform_type_of(reg_type: RegisterType) -> UniformType {
    match reg_type {
        RegisterType::Const => UniformType::Float,
        RegisterType::ConstInt => UniformType::Int,
        _ => UniformType::Bool,
    }
}

fn glsl_uniform_type(uniform_type: UniformType) -> &'static str {
    match uniform_type {
        UniformType::Float => "vec4",
        UniformType::Int => "ivec4",
        UniformType::Bool => "bool",
    }
}

fn uniform_array_var_name(ctx: &Context, uniform_type: UniformType) -> String {
    format!(
        "{}_uniforms_{}",
        ctx.shader_type_str(),
        glsl_uniform_type(uniform_type)
    )
}

/// Name shared by the two ends of a non-builtin varying.
fn varying_name(usage: Usage, index: u32) -> String {
    match usage.raw() {
        raw if raw >= 0 => format!("io_{raw}_{index}"),
        _ => format!("io_unknown_{index}"),
    }
}

/// `float` for one component, `vecN` otherwise.
fn float_cast(size: usize) -> String {
    if size <= 1 {
        "float".to_string()
    } else {
        format!("vec{size}")
    }
}

/// Source swizzle restricted to the components `mask` writes.
fn swizzle_suffix(swizzle: Swizzle, mask: WriteMask) -> String {
    if swizzle.is_none() && mask.is_xyzw() {
        return String::new();
    }
    let mut out = String::from(".");
    for i in 0..4 {
        if mask.component(i) {
            out.push(swizzle.component_char(i));
        }
    }
    out
}

fn mask_suffix(mask: WriteMask) -> String {
    let mut out = String::from(".");
    for (i, c) in COMPONENT_CHARS.iter().enumerate() {
        if mask.component(i) {
            out.push(*c);
        }
    }
    out
}

/// A float literal GLSL accepts, which needs a decimal point.
fn float_str(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn comparison(ctx: &mut Context, controls: u32) -> Option<Comparison> {
    let found = Comparison::from_raw(controls);
    if found.is_none() {
        ctx.fail("unknown comparison control");
    }
    found
}

impl GlslProfile {
    fn st(ctx: &Context) -> &'static str {
        ctx.shader_type_str()
    }

    /// Storage qualifier and type of a varying this shader writes or reads.
    fn varying_declaration(&self, ctx: &Context, scalar: bool) -> String {
        let ty = if scalar { "float" } else { "vec4" };
        let qualifier = match (ctx.shader_is_vertex(), self.flavor) {
            (true, f) if f.supports_400 => "out",
            (false, f) if f.supports_400 => "in",
            (true, f) if f.supports_es => "varying highp",
            _ => "varying",
        };
        format!("{qualifier} {ty}")
    }

    fn declare_varying(&self, ctx: &mut Context, var: &str, usage: Usage, index: u32, scalar: bool) {
        let varying = varying_name(usage, index);
        let declaration = self.varying_declaration(ctx, scalar);
        ctx.push_output(Section::Globals);
        ctx.output_line(&format!("{declaration} {varying};"));
        ctx.output_line(&format!("#define {var} {varying}"));
        ctx.pop_output();
    }

    fn define_builtin(ctx: &mut Context, var: &str, builtin: &str) {
        ctx.push_output(Section::Globals);
        ctx.output_line(&format!("#define {var} {builtin}"));
        ctx.pop_output();
    }

    fn vertex_output_builtin(&self, usage: Usage, index: u32) -> Option<String> {
        let fixed = self.flavor.fixed_function_builtins();
        match usage {
            Usage::Position if index == 0 => Some("gl_Position".to_string()),
            Usage::PointSize if index == 0 => Some("gl_PointSize".to_string()),
            Usage::Color if fixed && index == 0 => Some("gl_FrontColor".to_string()),
            Usage::Color if fixed && index == 1 => Some("gl_FrontSecondaryColor".to_string()),
            Usage::Fog if fixed && index == 0 => Some("gl_FogFragCoord".to_string()),
            Usage::TexCoord if fixed && index < 4 => Some(format!("gl_TexCoord[{index}]")),
            _ => None,
        }
    }

    fn pixel_input_builtin(&self, usage: Usage, index: u32) -> Option<String> {
        if !self.flavor.fixed_function_builtins() {
            return None;
        }
        match usage {
            Usage::TexCoord if index < 4 => Some(format!("gl_TexCoord[{index}]")),
            Usage::Color if index == 0 => Some("gl_Color".to_string()),
            Usage::Color if index == 1 => Some("gl_SecondaryColor".to_string()),
            _ => None,
        }
    }

    /// A source operand with its modifier, relative index and swizzle, narrowed to `mask`.
    fn src_string(&self, ctx: &mut Context, arg: &SourceArg, mask: WriteMask) -> String {
        let (prefix, postfix) = match arg.src_mod {
            SourceMod::None => ("", ""),
            SourceMod::Negate => ("-", ""),
            SourceMod::BiasNegate => ("-(", " - 0.5)"),
            SourceMod::Bias => ("(", " - 0.5)"),
            SourceMod::SignNegate => ("-((", " - 0.5) * 2.0)"),
            SourceMod::Sign => ("((", " - 0.5) * 2.0)"),
            SourceMod::Complement => ("(1.0 - ", ")"),
            SourceMod::X2Negate => ("-(", " * 2.0)"),
            SourceMod::X2 => ("(", " * 2.0)"),
            SourceMod::Abs => ("abs(", ")"),
            SourceMod::AbsNegate => ("-abs(", ")"),
            SourceMod::Not => ("!", ""),
            SourceMod::Dz => {
                ctx.fail("SRCMOD_DZ unsupported");
                return String::new();
            }
            SourceMod::Dw => {
                ctx.fail("SRCMOD_DW unsupported");
                return String::new();
            }
        };

        let Some(reg_name) = register_name(ctx, arg.reg_type, arg.reg_num) else {
            ctx.fail("Unknown source register type.");
            return String::new();
        };
        let mut var = format!("{}_{reg_name}", Self::st(ctx));

        if arg.relative {
            let offset = match arg.reg_type {
                RegisterType::Input => {
                    var = "vertex_input_array".to_string();
                    String::new()
                }
                RegisterType::Const => {
                    let Some(array) = arg.relative_array.and_then(|i| ctx.variables.get(i)) else {
                        ctx.fail("relative address outside of any constant array");
                        return String::new();
                    };
                    let delta = arg.reg_num - array.index;
                    if !array.constants.is_empty() {
                        var = self.const_array_var_name(ctx, array.index, array.count);
                        if delta == 0 {
                            String::new()
                        } else {
                            format!("{delta} + ")
                        }
                    } else {
                        let base = array.index;
                        var = uniform_array_var_name(ctx, UniformType::Float);
                        if delta == 0 {
                            format!("ARRAYBASE_{base} + ")
                        } else {
                            format!("(ARRAYBASE_{base} + {delta}) + ")
                        }
                    }
                }
                _ => {
                    ctx.fail("Relative addressing of this register type is unsupported.");
                    return String::new();
                }
            };

            let index = if arg.relative_reg_type == RegisterType::Loop {
                "aL".to_string()
            } else {
                let component = COMPONENT_CHARS[usize::from(arg.relative_component & 0x3)];
                format!(
                    "{}.{component}",
                    self.var_name(ctx, arg.relative_reg_type, arg.relative_reg_num)
                )
            };
            var = format!("{var}[{offset}{index}]");
        }

        let swizzle = if ctx.is_scalar(arg.reg_type, arg.reg_num) {
            String::new()
        } else {
            swizzle_suffix(arg.swizzle, mask)
        };

        format!("{prefix}{var}{swizzle}{postfix}")
    }

    /// Source `idx` narrowed to the destination's write mask.
    fn src(&self, ctx: &mut Context, inst: &Instruction, idx: usize) -> String {
        self.src_string(ctx, &inst.src[idx], inst.dst.write_mask)
    }

    fn src_masked(&self, ctx: &mut Context, inst: &Instruction, idx: usize, mask: WriteMask) -> String {
        self.src_string(ctx, &inst.src[idx], mask)
    }

    fn src_scalar(&self, ctx: &mut Context, inst: &Instruction, idx: usize) -> String {
        self.src_string(ctx, &inst.src[idx], WriteMask::X)
    }

    /// Writes `dst = operation;` with saturate and shift applied.
    fn assign(&self, ctx: &mut Context, inst: &Instruction, dst: &DestArg, operation: &str) {
        let mask = dst.write_mask;
        if mask.is_empty() {
            return;
        }
        if inst.predicated {
            ctx.fail("predicated destinations unsupported");
            return;
        }
        if dst.relative {
            ctx.fail("Relative addressing of output registers not supported.");
            return;
        }
        let Some(reg_name) = register_name(ctx, dst.reg_type, dst.reg_num) else {
            ctx.fail("unknown register type");
            return;
        };

        let size = mask.vec_size();
        let (clamp_left, clamp_right) = if !dst.result_mod.contains(ResultMod::SATURATE) {
            ("", String::new())
        } else if size == 1 {
            ("clamp(", ", 0.0, 1.0)".to_string())
        } else {
            ("clamp(", format!(", vec{size}(0.0), vec{size}(1.0))"))
        };

        let shift = match dst.result_shift {
            0x1 => " * 2.0",
            0x2 => " * 4.0",
            0x3 => " * 8.0",
            0xD => " / 8.0",
            0xE => " / 4.0",
            0xF => " / 2.0",
            _ => "",
        };
        let (left_paren, right_paren) = if shift.is_empty() { ("", "") } else { ("(", ")") };

        let suffix = if ctx.is_scalar(dst.reg_type, dst.reg_num) || mask.is_xyzw() {
            String::new()
        } else {
            mask_suffix(mask)
        };

        ctx.output_line(&format!(
            "{}_{reg_name}{suffix} = {clamp_left}{left_paren}{operation}{right_paren}{shift}{clamp_right};",
            Self::st(ctx)
        ));
    }

    fn assign_dst(&self, ctx: &mut Context, inst: &Instruction, operation: &str) {
        self.assign(ctx, inst, &inst.dst, operation);
    }

    fn dst_var(&self, ctx: &Context, inst: &Instruction) -> String {
        self.var_name(ctx, inst.dst.reg_type, inst.dst.reg_num)
    }

    fn texture_var(&self, ctx: &Context, reg_num: u32) -> String {
        self.var_name(ctx, RegisterType::TEXTURE, reg_num)
    }

    /// Closes the current function; main's epilogue goes first when main is the one closing.
    fn emit_ret(&mut self, ctx: &mut Context) {
        if ctx.out.current() == Section::MainLine {
            self.emit_main_epilogue(ctx);
        }
        ctx.outdent();
        ctx.output_line("}");
        ctx.output_blank_line();
        ctx.set_output(Section::Subroutines);
    }

    fn emit_main_epilogue(&mut self, ctx: &mut Context) {
        let st = Self::st(ctx);
        if ctx.shader_is_pixel() && !ctx.version_at_least(2, 0) {
            // ps_1_x has no color output register; r0 is the result.
            ctx.set_used_register(RegisterType::ColorOut, 0, true);
            ctx.output_line(&format!("{st}_oC0 = {st}_r0;"));
        } else if ctx.shader_is_vertex() {
            if ctx.flip_render_target {
                ctx.output_line("gl_Position.y = gl_Position.y * vpFlip;");
            }
            if ctx.depth_clipping {
                ctx.output_line("gl_Position.z = gl_Position.z * 2.0 - gl_Position.w;");
            }
        }
    }

    fn emit_lit_helper(&mut self, ctx: &mut Context) {
        if self.generated_lit_helper {
            return;
        }
        self.generated_lit_helper = true;

        ctx.push_output(Section::Helpers);
        ctx.output_line("vec4 LIT(const vec4 src)");
        ctx.output_line("{");
        ctx.indent();
        ctx.output_line("float power = clamp(src.w, -127.9961, 127.9961);");
        ctx.output_line("vec4 retval = vec4(1.0, 0.0, 0.0, 1.0);");
        ctx.output_line("if (src.x > 0.0) {");
        ctx.indent();
        ctx.output_line("retval.y = src.x;");
        ctx.output_line("if (src.y > 0.0) {");
        ctx.indent();
        ctx.output_line("retval.z = pow(src.y, power);");
        ctx.outdent();
        ctx.output_line("}");
        ctx.outdent();
        ctx.output_line("}");
        ctx.output_line("return retval;");
        ctx.outdent();
        ctx.output_line("}");
        ctx.output_blank_line();
        ctx.pop_output();
    }

    fn emit_texm3x3spec_helper(&mut self, ctx: &mut Context) {
        if self.generated_texm3x3spec_helper {
            return;
        }
        self.generated_texm3x3spec_helper = true;

        ctx.push_output(Section::Helpers);
        ctx.output_line("vec3 TEXM3X3SPEC_reflection(const vec3 normal, const vec3 eyeray)");
        ctx.output_line("{");
        ctx.indent();
        ctx.output_line("return (2.0 * ((normal * eyeray) / (normal * normal)) * normal) - eyeray;");
        ctx.outdent();
        ctx.output_line("}");
        ctx.output_blank_line();
        ctx.pop_output();
    }

    /// Explicit-LOD and gradient lookups need an extension before GLSL 1.30.
    fn prepend_texlod_extensions(&mut self, ctx: &mut Context) {
        if self.generated_texlod_setup {
            return;
        }
        self.generated_texlod_setup = true;

        ctx.push_output(Section::Preflight);
        if self.flavor.supports_400 {
            ctx.output_line("#define texture2DGrad textureGrad");
            ctx.output_line("#define texture2DProjGrad textureProjGrad");
            ctx.output_line("#define textureCubeGrad textureGrad");
            ctx.output_line("#define texture3DGrad textureGrad");
            ctx.output_line("#define texture2DLod textureLod");
            ctx.output_line("#define textureCubeLod textureLod");
            ctx.output_line("#define texture3DLod textureLod");
        } else {
            let pixel = ctx.shader_is_pixel();
            ctx.output_line("#if GL_ARB_shader_texture_lod");
            ctx.output_line("#extension GL_ARB_shader_texture_lod : enable");
            ctx.output_line("#define texture2DGrad texture2DGradARB");
            ctx.output_line("#define texture2DProjGrad texture2DProjGradARB");
            if pixel {
                ctx.output_line("#define texture2DLod texture2DLodARB");
            }
            ctx.output_line("#elif GL_EXT_gpu_shader4");
            ctx.output_line("#define texture2DGrad texture2DGradEXT");
            ctx.output_line("#define texture2DProjGrad texture2DProjGradEXT");
            if pixel {
                ctx.output_line("#define texture2DLod texture2DLodEXT");
            }
            ctx.output_line("#else");
            ctx.output_line("#define texture2DGrad(a,b,c,d) texture2D(a,b)");
            ctx.output_line("#define texture2DProjGrad(a,b,c,d) texture2DProj(a,b)");
            if pixel {
                ctx.output_line("#define texture2DLod(a,b,c) texture2D(a,b)");
            }
            ctx.output_line("#endif");
        }
        ctx.output_blank_line();
        ctx.pop_output();
    }

    fn emit_dot(&self, ctx: &mut Context, inst: &Instruction, mask: WriteMask) {
        let src0 = self.src_masked(ctx, inst, 0, mask);
        let src1 = self.src_masked(ctx, inst, 1, mask);
        let cast = float_cast(inst.dst.write_mask.vec_size());
        self.assign_dst(ctx, inst, &format!("{cast}(dot({src0}, {src1}))"));
    }

    /// `m4x4` and friends: one dot product per matrix row.
    fn emit_matrix(&self, ctx: &mut Context, inst: &Instruction, src_mask: WriteMask, rows: usize) {
        let src0 = self.src_masked(ctx, inst, 0, src_mask);
        let dots: Vec<String> = (0..rows)
            .map(|row| {
                let row = self.src_masked(ctx, inst, 1 + row, src_mask);
                format!("dot({src0}, {row})")
            })
            .collect();
        self.assign_dst(ctx, inst, &format!("vec{rows}({})", dots.join(", ")));
    }

    fn emit_compare_set(&self, ctx: &mut Context, inst: &Instruction, op: &str, vector_fn: &str) {
        let src0 = self.src(ctx, inst, 0);
        let src1 = self.src(ctx, inst, 1);
        let size = inst.dst.write_mask.vec_size();
        let operation = if size == 1 {
            format!("float({src0} {op} {src1})")
        } else {
            format!("vec{size}({vector_fn}({src0}, {src1}))")
        };
        self.assign_dst(ctx, inst, &operation);
    }

    /// `cmp`/`cnd`: one conditional assignment per group of components sharing a src0 lane.
    fn emit_comparison_operations(&self, ctx: &mut Context, inst: &Instruction, cmp: &str) {
        let dst = inst.dst;
        let swizzle = inst.src[0].swizzle;
        let mut used = [false; 4];

        for i in 0..4 {
            if !dst.write_mask.component(i) || used[i] {
                continue;
            }
            used[i] = true;

            let mut bits = 1u8 << i;
            for j in (i + 1)..4 {
                if dst.write_mask.component(j) && swizzle.component(i) == swizzle.component(j) {
                    bits |= 1 << j;
                    used[j] = true;
                }
            }
            let mask = WriteMask(bits);

            let src0 = self.src_masked(ctx, inst, 0, WriteMask(1 << i));
            let src1 = self.src_masked(ctx, inst, 1, mask);
            let src2 = self.src_masked(ctx, inst, 2, mask);
            let part = DestArg {
                write_mask: mask,
                ..dst
            };
            self.assign(ctx, inst, &part, &format!("(({src0} {cmp}) ? {src1} : {src2})"));
        }
    }

    fn emit_def(&self, ctx: &mut Context, inst: &Instruction) {
        let var = self.dst_var(ctx, inst);
        let line = match inst.opcode {
            Opcode::DefB => format!(
                "const bool {var} = {};",
                if inst.dwords[0] != 0 { "true" } else { "false" }
            ),
            Opcode::DefI => {
                let v = inst.dwords.map(|d| d as i32);
                format!(
                    "const ivec4 {var} = ivec4({}, {}, {}, {});",
                    v[0], v[1], v[2], v[3]
                )
            }
            _ => {
                let v = inst.dwords.map(|d| float_str(f32::from_bits(d)));
                format!(
                    "const vec4 {var} = vec4({}, {}, {}, {});",
                    v[0], v[1], v[2], v[3]
                )
            }
        };
        ctx.push_output(Section::Globals);
        ctx.output_line(&line);
        ctx.pop_output();
    }

    fn call_args(ctx: &Context) -> &'static str {
        if ctx.loops > 0 {
            "aL"
        } else {
            ""
        }
    }

    fn emit_texld(&mut self, ctx: &mut Context, inst: &Instruction) {
        if !ctx.version_at_least(1, 4) {
            // `tex t#`: the texture register holds the coordinates and receives the sample.
            let reg_num = inst.dst.reg_num;
            let sampler = self.var_name(ctx, RegisterType::Sampler, reg_num);
            let (func, coords) = match ctx.sampler_texture_type(reg_num) {
                Some(TextureType::TwoD) => ("texture2D", "xy"),
                Some(TextureType::Cube) => ("textureCube", "xyz"),
                Some(TextureType::Volume) => ("texture3D", "xyz"),
                None => {
                    ctx.fail("unexpected texture type");
                    return;
                }
            };
            let coords = format!("{}.{coords}", self.dst_var(ctx, inst));
            self.assign_dst(ctx, inst, &format!("{func}({sampler}, {coords})"));
            return;
        }

        if !ctx.version_at_least(2, 0) {
            ctx.fail("TEXLD == Shader Model 1.4 unimplemented.");
            return;
        }

        let samp = inst.src[1];
        let Some(texture_type) = ctx.sampler_texture_type(samp.reg_num) else {
            ctx.fail("TEXLD using undeclared sampler");
            return;
        };

        let projected = inst.controls == texld_control::TEXLDP;
        let (func, mask) = match texture_type {
            TextureType::TwoD if projected => ("texture2DProj", WriteMask::XYZW),
            TextureType::TwoD => ("texture2D", WriteMask::XY),
            TextureType::Cube if projected => {
                ctx.fail("TEXLDP on a cubemap");
                return;
            }
            TextureType::Cube => ("textureCube", WriteMask::XYZ),
            TextureType::Volume if projected => ("texture3DProj", WriteMask::XYZW),
            TextureType::Volume => ("texture3D", WriteMask::XYZ),
        };

        let src0 = self.src_masked(ctx, inst, 0, mask);
        let bias = if inst.controls == texld_control::TEXLDB {
            format!(", {}", self.src_masked(ctx, inst, 0, MASK_W))
        } else {
            String::new()
        };
        let sampler = self.var_name(ctx, RegisterType::Sampler, samp.reg_num);
        let swizzle = swizzle_suffix(samp.swizzle, inst.dst.write_mask);
        self.assign_dst(ctx, inst, &format!("{func}({sampler}, {src0}{bias}){swizzle}"));
    }

    fn emit_texldd(&mut self, ctx: &mut Context, inst: &Instruction) {
        let samp = inst.src[1];
        let Some(texture_type) = ctx.sampler_texture_type(samp.reg_num) else {
            ctx.fail("TEXLDD using undeclared sampler");
            return;
        };
        let (func, mask) = match texture_type {
            TextureType::TwoD => ("texture2DGrad", WriteMask::XY),
            TextureType::Cube => ("textureCubeGrad", WriteMask::XYZ),
            TextureType::Volume => ("texture3DGrad", WriteMask::XYZ),
        };
        self.prepend_texlod_extensions(ctx);

        let src0 = self.src_masked(ctx, inst, 0, mask);
        let ddx = self.src_masked(ctx, inst, 2, mask);
        let ddy = self.src_masked(ctx, inst, 3, mask);
        let sampler = self.var_name(ctx, RegisterType::Sampler, samp.reg_num);
        let swizzle = swizzle_suffix(samp.swizzle, inst.dst.write_mask);
        self.assign_dst(
            ctx,
            inst,
            &format!("{func}({sampler}, {src0}, {ddx}, {ddy}){swizzle}"),
        );
    }

    fn emit_texldl(&mut self, ctx: &mut Context, inst: &Instruction) {
        let samp = inst.src[1];
        let Some(texture_type) = ctx.sampler_texture_type(samp.reg_num) else {
            ctx.fail("TEXLDL using undeclared sampler");
            return;
        };
        let (func, mask) = match texture_type {
            TextureType::TwoD => ("texture2DLod", WriteMask::XY),
            TextureType::Cube => ("textureCubeLod", WriteMask::XYZ),
            TextureType::Volume => ("texture3DLod", WriteMask::XYZ),
        };
        self.prepend_texlod_extensions(ctx);

        let coords = self.src_masked(ctx, inst, 0, mask);
        let lod = self.src_masked(ctx, inst, 0, MASK_W);
        let sampler = self.var_name(ctx, RegisterType::Sampler, samp.reg_num);
        let swizzle = swizzle_suffix(samp.swizzle, inst.dst.write_mask);
        self.assign_dst(
            ctx,
            inst,
            &format!("{func}({sampler}, {coords}, {lod}){swizzle}"),
        );
    }

    fn emit_texbem(&self, ctx: &mut Context, inst: &Instruction, luminance: bool) {
        let dst = self.dst_var(ctx, inst);
        let src = self.texture_var(ctx, inst.src[0].reg_num);
        let s = self.var_name(ctx, RegisterType::Sampler, inst.dst.reg_num);

        self.assign_dst(
            ctx,
            inst,
            &format!(
                "texture2D({s}, vec2({dst}.x + ({s}_texbem.x * {src}.x) + ({s}_texbem.z * {src}.y), \
                 {dst}.y + ({s}_texbem.y * {src}.x) + ({s}_texbem.w * {src}.y)))"
            ),
        );
        if luminance {
            self.assign_dst(
                ctx,
                inst,
                &format!("{dst} * (({src}.z * {s}_texbeml.x) + {s}_texbeml.y)"),
            );
        }
    }

    fn emit_texm3x2tex(&self, ctx: &mut Context, inst: &Instruction) {
        let (Some(pad_src0), Some(pad_dst0)) = (ctx.texm3x2pad_src0, ctx.texm3x2pad_dst0) else {
            return;
        };
        let sampler = self.var_name(ctx, RegisterType::Sampler, inst.dst.reg_num);
        let src0 = self.texture_var(ctx, pad_src0);
        let src1 = self.texture_var(ctx, pad_dst0);
        let src2 = self.texture_var(ctx, inst.src[0].reg_num);
        let dst = self.dst_var(ctx, inst);
        self.assign_dst(
            ctx,
            inst,
            &format!(
                "texture2D({sampler}, vec2(dot({src0}.xyz, {src1}.xyz), dot({src2}.xyz, {dst}.xyz)))"
            ),
        );
    }

    /// The three dot products of a `texm3x3*` sequence, as a `vec3` expression.
    fn texm3x3_coords(&self, ctx: &Context, inst: &Instruction) -> Option<String> {
        let pads = (
            ctx.texm3x3pad_src0?,
            ctx.texm3x3pad_dst0?,
            ctx.texm3x3pad_src1?,
            ctx.texm3x3pad_dst1?,
        );
        let src0 = self.texture_var(ctx, pads.0);
        let src1 = self.texture_var(ctx, pads.1);
        let src2 = self.texture_var(ctx, pads.2);
        let src3 = self.texture_var(ctx, pads.3);
        let src4 = self.texture_var(ctx, inst.src[0].reg_num);
        let dst = self.dst_var(ctx, inst);
        Some(format!(
            "dot({src0}.xyz, {src1}.xyz), dot({src2}.xyz, {src3}.xyz), dot({dst}.xyz, {src4}.xyz)"
        ))
    }

    fn volume_or_cube_fn(ctx: &mut Context, reg_num: u32) -> Option<&'static str> {
        match ctx.sampler_texture_type(reg_num) {
            Some(TextureType::Cube) => Some("textureCube"),
            Some(TextureType::Volume) => Some("texture3D"),
            _ => {
                ctx.fail("unexpected texture type");
                None
            }
        }
    }

    fn emit_texm3x3tex(&self, ctx: &mut Context, inst: &Instruction) {
        let Some(coords) = self.texm3x3_coords(ctx, inst) else {
            return;
        };
        let Some(func) = Self::volume_or_cube_fn(ctx, inst.dst.reg_num) else {
            return;
        };
        let sampler = self.var_name(ctx, RegisterType::Sampler, inst.dst.reg_num);
        self.assign_dst(ctx, inst, &format!("{func}({sampler}, vec3({coords}))"));
    }

    fn emit_texm3x3(&self, ctx: &mut Context, inst: &Instruction) {
        let Some(coords) = self.texm3x3_coords(ctx, inst) else {
            return;
        };
        self.assign_dst(ctx, inst, &format!("vec4({coords}, 1.0)"));
    }

    /// `texm3x3spec` reflects off a constant eye ray, `texm3x3vspec` off the `.w` lanes.
    fn emit_texm3x3_reflection(&mut self, ctx: &mut Context, inst: &Instruction, variable_eye: bool) {
        let Some(coords) = self.texm3x3_coords(ctx, inst) else {
            return;
        };
        let Some(func) = Self::volume_or_cube_fn(ctx, inst.dst.reg_num) else {
            return;
        };
        self.emit_texm3x3spec_helper(ctx);

        let dst = self.dst_var(ctx, inst);
        let sampler = self.var_name(ctx, RegisterType::Sampler, inst.dst.reg_num);
        let eyeray = if variable_eye {
            let (Some(dst0), Some(dst1)) = (ctx.texm3x3pad_dst0, ctx.texm3x3pad_dst1) else {
                return;
            };
            let pad0 = self.texture_var(ctx, dst0);
            let pad1 = self.texture_var(ctx, dst1);
            ctx.output_line(&format!(
                "vec3 {dst}_eyeray = vec3({pad0}.w, {pad1}.w, {dst}.w);"
            ));
            format!("{dst}_eyeray")
        } else {
            format!(
                "{}.xyz",
                self.var_name(ctx, RegisterType::Const, inst.src[1].reg_num)
            )
        };

        ctx.output_line(&format!("vec3 {dst}_normal = normalize(vec3({coords}));"));
        self.assign_dst(
            ctx,
            inst,
            &format!("{func}({sampler}, TEXM3X3SPEC_reflection({dst}_normal, {eyeray}))"),
        );
    }
}

impl Profile for GlslProfile {
    fn name(&self) -> &'static str {
        self.name
    }

    fn emit_start(&mut self, ctx: &mut Context) {
        if !ctx.shader_is_vertex() && !ctx.shader_is_pixel() {
            ctx.fail(format!(
                "Shader type {} unsupported in this profile.",
                ctx.shader_type_str()
            ));
            return;
        }

        ctx.push_output(Section::Preflight);
        if self.flavor.supports_400 {
            ctx.output_line("#version 400");
        } else if self.flavor.supports_es {
            ctx.output_line("#version 100");
            if ctx.shader_is_vertex() {
                ctx.output_line("precision highp float;");
            } else {
                ctx.output_line("precision mediump float;");
            }
            ctx.output_line("precision mediump int;");
        } else if self.flavor.supports_120 {
            ctx.output_line("#version 120");
        } else {
            ctx.output_line("#version 110");
        }
        ctx.pop_output();

        let main = format!("void {}()", ctx.main_fn);
        ctx.push_output(Section::MainLineIntro);
        ctx.output_line(&main);
        ctx.output_line("{");
        ctx.pop_output();

        ctx.set_output(Section::MainLine);
        ctx.indent();
    }

    fn emit_end(&mut self, ctx: &mut Context) {
        if ctx.previous_opcode != Some(Opcode::Ret) {
            self.emit_ret(ctx);
        }
    }

    fn emit_phase(&mut self, _ctx: &mut Context) {}

    fn emit_finalize(&mut self, ctx: &mut Context) {
        ctx.push_output(Section::Globals);
        ctx.output_blank_line();
        ctx.pop_output();

        if ctx.have_relative_input_registers {
            ctx.fail("Relative addressing of input registers not supported.");
            return;
        }

        ctx.push_output(Section::Preflight);
        for uniform_type in [UniformType::Float, UniformType::Int, UniformType::Bool] {
            let count = ctx.uniform_count(uniform_type);
            if count > 0 {
                let line = format!(
                    "uniform {} {}[{count}];",
                    glsl_uniform_type(uniform_type),
                    uniform_array_var_name(ctx, uniform_type)
                );
                ctx.output_line(&line);
            }
        }
        if ctx.flip_render_target && ctx.shader_is_vertex() {
            ctx.output_line("uniform float vpFlip;");
        }
        if self.needs_max_float {
            ctx.output_line("const float FLT_MAX = 1e38;");
        }
        ctx.pop_output();
    }

    fn emit_global(&mut self, ctx: &mut Context, reg_type: RegisterType, reg_num: u32) {
        let var = self.var_name(ctx, reg_type, reg_num);
        ctx.push_output(Section::Globals);
        match reg_type {
            RegisterType::Address if ctx.shader_is_vertex() => {
                ctx.output_line(&format!("ivec4 {var};"));
            }
            RegisterType::Address if !ctx.version_at_least(1, 4) => {
                // ps_1_x texture registers start out holding their coordinates.
                if self.flavor.fixed_function_builtins() && reg_num < 4 {
                    ctx.output_line(&format!("vec4 {var} = gl_TexCoord[{reg_num}];"));
                } else {
                    let varying = varying_name(Usage::TexCoord, reg_num);
                    let declaration = self.varying_declaration(ctx, false);
                    ctx.output_line(&format!("{declaration} {varying};"));
                    ctx.output_line(&format!("vec4 {var} = {varying};"));
                }
            }
            // ps_1_4 and later texture registers are declared as attributes.
            RegisterType::Address => {}
            RegisterType::Predicate if ctx.is_scalar(reg_type, reg_num) => {
                ctx.output_line(&format!("bool {var};"));
            }
            RegisterType::Predicate => ctx.output_line(&format!("bvec4 {var};")),
            RegisterType::Temp => ctx.output_line(&format!("vec4 {var};")),
            // Locals of the generated loop and function names.
            RegisterType::Loop | RegisterType::Label => {}
            _ => ctx.fail("BUG: we used a register we don't know how to define."),
        }
        ctx.pop_output();
    }

    fn emit_array(&mut self, ctx: &mut Context, var: usize) {
        let base = ctx.uniform_float4_count;
        let Some(array) = ctx.variables.get_mut(var) else {
            return;
        };
        array.emit_position = Some(base);
        let line = format!("#define ARRAYBASE_{} {base}", array.index);

        ctx.push_output(Section::Globals);
        ctx.output_line(&line);
        ctx.pop_output();
    }

    fn emit_const_array(&mut self, ctx: &mut Context, var: usize) {
        let Some(array) = ctx.variables.get(var) else {
            return;
        };
        let name = self.const_array_var_name(ctx, array.index, array.count);
        let count = array.count;

        let line = if self.flavor.supports_120 {
            let values: Vec<String> = array
                .constants
                .iter()
                .map(|c| {
                    let v = c.value.map(|d| float_str(f32::from_bits(d)));
                    format!("vec4({}, {}, {}, {})", v[0], v[1], v[2], v[3])
                })
                .collect();
            format!(
                "const vec4 {name}[{count}] = vec4[{count}]({});",
                values.join(", ")
            )
        } else {
            format!("uniform vec4 {name}[{count}];")
        };

        ctx.push_output(Section::Globals);
        ctx.output_line(&line);
        ctx.pop_output();
    }

    fn emit_uniform(&mut self, ctx: &mut Context, reg_type: RegisterType, reg_num: u32, var: Option<usize>) {
        let name = self.var_name(ctx, reg_type, reg_num);
        let slot = match var.and_then(|i| ctx.variables.get(i)) {
            None => {
                let uniform_type = uniform_type_of(reg_type);
                format!(
                    "{}[{}]",
                    uniform_array_var_name(ctx, uniform_type),
                    ctx.uniform_count(uniform_type)
                )
            }
            Some(array) if !array.constants.is_empty() => format!(
                "{}[{}]",
                self.const_array_var_name(ctx, array.index, array.count),
                reg_num - array.index
            ),
            Some(array) => format!(
                "{}[{}]",
                uniform_array_var_name(ctx, UniformType::Float),
                reg_num - array.index + array.emit_position.unwrap_or(0)
            ),
        };

        ctx.push_output(Section::Globals);
        ctx.output_line(&format!("#define {name} {slot}"));
        ctx.pop_output();
    }

    fn emit_sampler(&mut self, ctx: &mut Context, stage: u32, texture_type: Option<TextureType>, texbem: bool) {
        let ty = match texture_type {
            Some(TextureType::TwoD) => "sampler2D",
            Some(TextureType::Cube) => "samplerCube",
            Some(TextureType::Volume) => "sampler3D",
            None => {
                ctx.fail("BUG: used a sampler we don't know how to define.");
                return;
            }
        };
        let name = self.var_name(ctx, RegisterType::Sampler, stage);

        ctx.push_output(Section::Globals);
        ctx.output_line(&format!("uniform {ty} {name};"));
        if texbem {
            // Bump matrix and luminance terms take two packed vec4 slots.
            let array = uniform_array_var_name(ctx, UniformType::Float);
            let index = ctx.uniform_float4_count;
            ctx.uniform_float4_count += 2;
            ctx.output_line(&format!("#define {name}_texbem {array}[{index}]"));
            ctx.output_line(&format!("#define {name}_texbeml {array}[{}]", index + 1));
        }
        ctx.pop_output();
    }

    fn emit_attribute(
        &mut self,
        ctx: &mut Context,
        reg_type: RegisterType,
        reg_num: u32,
        usage: Usage,
        index: u32,
        _write_mask: WriteMask,
        flags: i32,
    ) {
        let var = self.var_name(ctx, reg_type, reg_num);
        trace!(%var, %usage, index, "attribute");

        if ctx.shader_is_vertex() {
            // Before vs_3_0 the output register itself implies the semantic.
            let (reg_type, usage, index) = if ctx.version_at_least(3, 0) {
                (reg_type, usage, index)
            } else {
                match reg_type {
                    RegisterType::RastOut => {
                        let usage = match reg_num {
                            rastout::POSITION => Usage::Position,
                            rastout::FOG => Usage::Fog,
                            rastout::POINT_SIZE => Usage::PointSize,
                            _ => usage,
                        };
                        (RegisterType::OUTPUT, usage, 0)
                    }
                    RegisterType::AttrOut => (RegisterType::OUTPUT, Usage::Color, reg_num),
                    RegisterType::TexCrdOut => (RegisterType::OUTPUT, Usage::TexCoord, reg_num),
                    _ => (reg_type, usage, index),
                }
            };

            match reg_type {
                RegisterType::Input => {
                    let qualifier = if self.flavor.supports_400 { "in" } else { "attribute" };
                    ctx.push_output(Section::Globals);
                    ctx.output_line(&format!("{qualifier} vec4 {var};"));
                    ctx.pop_output();
                }
                t if t == RegisterType::OUTPUT => match self.vertex_output_builtin(usage, index) {
                    Some(builtin) => Self::define_builtin(ctx, &var, &builtin),
                    None => {
                        let scalar = matches!(usage, Usage::Fog | Usage::PointSize);
                        self.declare_varying(ctx, &var, usage, index, scalar);
                    }
                },
                _ => ctx.fail("unknown vertex shader attribute register"),
            }
        } else if ctx.shader_is_pixel() {
            if flags & i32::from(ResultMod::CENTROID.bits()) != 0 {
                ctx.fail(format!("centroid unsupported in {} profile", self.name));
                return;
            }

            match reg_type {
                RegisterType::ColorOut => {
                    let builtin = if ctx.have_multi_color_outputs {
                        format!("gl_FragData[{reg_num}]")
                    } else {
                        "gl_FragColor".to_string()
                    };
                    Self::define_builtin(ctx, &var, &builtin);
                }
                RegisterType::DepthOut => Self::define_builtin(ctx, &var, "gl_FragDepth"),
                RegisterType::Address | RegisterType::Input => {
                    // ps_1_x texture coordinates were declared with the register itself.
                    if reg_type == RegisterType::TEXTURE
                        && usage == Usage::TexCoord
                        && !ctx.version_at_least(1, 4)
                    {
                        return;
                    }
                    match self.pixel_input_builtin(usage, index) {
                        Some(builtin) => Self::define_builtin(ctx, &var, &builtin),
                        None => self.declare_varying(ctx, &var, usage, index, false),
                    }
                }
                RegisterType::MiscType if reg_num == misctype::FACE => {
                    ctx.push_output(Section::MainLineIntro);
                    ctx.indent();
                    ctx.output_line(&format!("float {var} = gl_FrontFacing ? 1.0 : -1.0;"));
                    ctx.pop_output();
                }
                RegisterType::MiscType if reg_num == misctype::POSITION => {
                    ctx.push_output(Section::Globals);
                    ctx.output_line("uniform vec2 vposFlip;");
                    ctx.pop_output();

                    ctx.push_output(Section::MainLineIntro);
                    ctx.indent();
                    ctx.output_line(&format!(
                        "vec4 {var} = vec4(gl_FragCoord.x, (gl_FragCoord.y * vposFlip.x) + vposFlip.y, gl_FragCoord.z, gl_FragCoord.w);"
                    ));
                    ctx.pop_output();
                }
                _ => ctx.fail("unknown pixel shader attribute register"),
            }
        }
    }

    fn emit_function(&mut self, ctx: &mut Context, inst: &Instruction) {
        let dst_mask = inst.dst.write_mask;
        let size = dst_mask.vec_size();

        match inst.opcode {
            Opcode::Nop
            | Opcode::Dcl
            | Opcode::TexM3x2Pad
            | Opcode::TexM3x3Pad
            | Opcode::Reserved(_) => {}

            Opcode::Mov => {
                let src0 = self.src(ctx, inst, 0);
                self.assign_dst(ctx, inst, &src0);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul => {
                let op = match inst.opcode {
                    Opcode::Add => "+",
                    Opcode::Sub => "-",
                    _ => "*",
                };
                let src0 = self.src(ctx, inst, 0);
                let src1 = self.src(ctx, inst, 1);
                self.assign_dst(ctx, inst, &format!("{src0} {op} {src1}"));
            }
            Opcode::Mad => {
                let src0 = self.src(ctx, inst, 0);
                let src1 = self.src(ctx, inst, 1);
                let src2 = self.src(ctx, inst, 2);
                self.assign_dst(ctx, inst, &format!("({src0} * {src1}) + {src2}"));
            }
            Opcode::Rcp | Opcode::Rsq => {
                self.needs_max_float = true;
                let src0 = self.src_scalar(ctx, inst, 0);
                let value = if inst.opcode == Opcode::Rcp {
                    format!("1.0 / {src0}")
                } else {
                    format!("inversesqrt(abs({src0}))")
                };
                let cast = float_cast(size);
                self.assign_dst(
                    ctx,
                    inst,
                    &format!("{cast}(({src0} == 0.0) ? FLT_MAX : {value})"),
                );
            }
            Opcode::Dp3 => self.emit_dot(ctx, inst, WriteMask::XYZ),
            Opcode::Dp4 => self.emit_dot(ctx, inst, WriteMask::XYZW),
            Opcode::Dp2Add => {
                let src0 = self.src_masked(ctx, inst, 0, WriteMask::XY);
                let src1 = self.src_masked(ctx, inst, 1, WriteMask::XY);
                let src2 = self.src_scalar(ctx, inst, 2);
                let cast = float_cast(size);
                self.assign_dst(ctx, inst, &format!("{cast}(dot({src0}, {src1}) + {src2})"));
            }
            Opcode::Min | Opcode::Max | Opcode::Pow => {
                let src0 = self.src(ctx, inst, 0);
                let src1 = self.src(ctx, inst, 1);
                let operation = match inst.opcode {
                    Opcode::Min => format!("min({src0}, {src1})"),
                    Opcode::Max => format!("max({src0}, {src1})"),
                    _ => format!("pow(abs({src0}), {src1})"),
                };
                self.assign_dst(ctx, inst, &operation);
            }
            Opcode::Slt => self.emit_compare_set(ctx, inst, "<", "lessThan"),
            Opcode::Sge => self.emit_compare_set(ctx, inst, ">=", "greaterThanEqual"),
            Opcode::Exp
            | Opcode::ExpP
            | Opcode::Log
            | Opcode::LogP
            | Opcode::Frc
            | Opcode::Sgn
            | Opcode::Abs
            | Opcode::Nrm
            | Opcode::Dsx
            | Opcode::Dsy => {
                let func = match inst.opcode {
                    Opcode::Exp | Opcode::ExpP => "exp2",
                    Opcode::Log | Opcode::LogP => "log2",
                    Opcode::Frc => "fract",
                    Opcode::Sgn => "sign",
                    Opcode::Abs => "abs",
                    Opcode::Nrm => "normalize",
                    Opcode::Dsx => "dFdx",
                    _ => "dFdy",
                };
                let src0 = self.src(ctx, inst, 0);
                self.assign_dst(ctx, inst, &format!("{func}({src0})"));
            }
            Opcode::Lit => {
                self.emit_lit_helper(ctx);
                let src0 = self.src_masked(ctx, inst, 0, WriteMask::XYZW);
                let swizzle = swizzle_suffix(Swizzle::NONE, dst_mask);
                self.assign_dst(ctx, inst, &format!("LIT({src0}){swizzle}"));
            }
            Opcode::Dst => {
                let src0_y = self.src_masked(ctx, inst, 0, WriteMask::Y);
                let src1_y = self.src_masked(ctx, inst, 1, WriteMask::Y);
                let src0_z = self.src_masked(ctx, inst, 0, MASK_Z);
                let src1_w = self.src_masked(ctx, inst, 1, MASK_W);
                let swizzle = swizzle_suffix(Swizzle::NONE, dst_mask);
                self.assign_dst(
                    ctx,
                    inst,
                    &format!("vec4(1.0, {src0_y} * {src1_y}, {src0_z}, {src1_w}){swizzle}"),
                );
            }
            Opcode::Lrp => {
                let src0 = self.src(ctx, inst, 0);
                let src1 = self.src(ctx, inst, 1);
                let src2 = self.src(ctx, inst, 2);
                self.assign_dst(ctx, inst, &format!("mix({src2}, {src1}, {src0})"));
            }
            Opcode::M4x4 => self.emit_matrix(ctx, inst, WriteMask::XYZW, 4),
            Opcode::M4x3 => self.emit_matrix(ctx, inst, WriteMask::XYZW, 3),
            Opcode::M3x4 => self.emit_matrix(ctx, inst, WriteMask::XYZ, 4),
            Opcode::M3x3 => self.emit_matrix(ctx, inst, WriteMask::XYZ, 3),
            Opcode::M3x2 => self.emit_matrix(ctx, inst, WriteMask::XYZ, 2),
            Opcode::Crs => {
                let src0 = self.src_masked(ctx, inst, 0, WriteMask::XYZ);
                let src1 = self.src_masked(ctx, inst, 1, WriteMask::XYZ);
                let swizzle = if dst_mask.is_xyz() {
                    String::new()
                } else {
                    mask_suffix(dst_mask)
                };
                self.assign_dst(ctx, inst, &format!("cross({src0}, {src1}){swizzle}"));
            }
            Opcode::SinCos => {
                let src0 = self.src_scalar(ctx, inst, 0);
                let operation = if dst_mask.is_x() {
                    format!("cos({src0})")
                } else if dst_mask.is_y() {
                    format!("sin({src0})")
                } else if dst_mask.is_xy() {
                    format!("vec2(cos({src0}), sin({src0}))")
                } else {
                    ctx.fail("SINCOS write mask must be .x or .y or .xy");
                    return;
                };
                self.assign_dst(ctx, inst, &operation);
            }
            Opcode::MovA => {
                let src0 = self.src(ctx, inst, 0);
                let operation = if size == 1 {
                    format!("int(floor(abs({src0}) + 0.5) * sign({src0}))")
                } else {
                    format!("ivec{size}(floor(abs({src0}) + vec{size}(0.5)) * sign({src0}))")
                };
                self.assign_dst(ctx, inst, &operation);
            }

            Opcode::Call => {
                let label = self.var_name(ctx, RegisterType::Label, inst.src[0].reg_num);
                ctx.output_line(&format!("{label}({});", Self::call_args(ctx)));
            }
            Opcode::CallNz => {
                let label = self.var_name(ctx, RegisterType::Label, inst.src[0].reg_num);
                let cond = self.src_scalar(ctx, inst, 1);
                ctx.output_line(&format!(
                    "if ({cond}) {{ {label}({}); }}",
                    Self::call_args(ctx)
                ));
            }
            Opcode::Loop => {
                let var = self.var_name(ctx, inst.src[1].reg_type, inst.src[1].reg_num);
                ctx.output_line("{");
                ctx.indent();
                ctx.output_line(&format!("const int aLend = {var}.x + {var}.y;"));
                ctx.output_line(&format!(
                    "for (int aL = {var}.y; aL < aLend; aL += {var}.z) {{"
                ));
                ctx.indent();
            }
            Opcode::EndLoop => {
                ctx.outdent();
                ctx.output_line("}");
                ctx.outdent();
                ctx.output_line("}");
            }
            Opcode::Rep => {
                let count = self.src_scalar(ctx, inst, 0);
                let n = ctx.reps;
                ctx.output_line(&format!(
                    "for (int rep{n} = 0; rep{n} < {count}; rep{n}++) {{"
                ));
                ctx.indent();
            }
            Opcode::EndRep | Opcode::EndIf => {
                ctx.outdent();
                ctx.output_line("}");
            }
            Opcode::Ret => self.emit_ret(ctx),
            Opcode::Label => {
                let reg_num = inst.src[0].reg_num;
                let Some(misc) = ctx
                    .used_registers
                    .find(RegisterType::Label, reg_num)
                    .map(|r| r.misc)
                else {
                    ctx.set_output(Section::Ignore);
                    return;
                };
                let label = self.var_name(ctx, RegisterType::Label, reg_num);
                let params = if misc == 1 { "int aL" } else { "" };
                ctx.output_line(&format!("void {label}({params})"));
                ctx.output_line("{");
                ctx.indent();
            }
            Opcode::If => {
                let cond = self.src_scalar(ctx, inst, 0);
                ctx.output_line(&format!("if ({cond}) {{"));
                ctx.indent();
            }
            Opcode::Ifc | Opcode::BreakC => {
                let Some(cmp) = comparison(ctx, inst.controls) else {
                    return;
                };
                let src0 = self.src_scalar(ctx, inst, 0);
                let src1 = self.src_scalar(ctx, inst, 1);
                let op = cmp.operator();
                if inst.opcode == Opcode::Ifc {
                    ctx.output_line(&format!("if ({src0} {op} {src1}) {{"));
                    ctx.indent();
                } else {
                    ctx.output_line(&format!("if ({src0} {op} {src1}) {{ break; }}"));
                }
            }
            Opcode::Else => {
                ctx.outdent();
                ctx.output_line("} else {");
                ctx.indent();
            }
            Opcode::Break => ctx.output_line("break;"),
            Opcode::BreakP => {
                let cond = self.src_scalar(ctx, inst, 0);
                ctx.output_line(&format!("if ({cond}) {{ break; }}"));
            }
            Opcode::SetP => {
                let Some(cmp) = comparison(ctx, inst.controls) else {
                    return;
                };
                let src0 = self.src(ctx, inst, 0);
                let src1 = self.src(ctx, inst, 1);
                let operation = if size == 1 {
                    format!("({src0} {} {src1})", cmp.operator())
                } else {
                    format!("{}({src0}, {src1})", cmp.vector_function())
                };
                self.assign_dst(ctx, inst, &operation);
            }

            Opcode::Def | Opcode::DefI | Opcode::DefB => self.emit_def(ctx, inst),

            Opcode::Cnd => self.emit_comparison_operations(ctx, inst, "> 0.5"),
            Opcode::Cmp => self.emit_comparison_operations(ctx, inst, ">= 0.0"),

            Opcode::TexKill => {
                let dst = self.dst_var(ctx, inst);
                ctx.output_line(&format!(
                    "if (any(lessThan({dst}.xyz, vec3(0.0)))) discard;"
                ));
            }
            Opcode::TexLd => self.emit_texld(ctx, inst),
            Opcode::TexLdd => self.emit_texldd(ctx, inst),
            Opcode::TexLdl => self.emit_texldl(ctx, inst),
            Opcode::TexBem => self.emit_texbem(ctx, inst, false),
            Opcode::TexBemL => self.emit_texbem(ctx, inst, true),
            Opcode::TexM3x2Tex => self.emit_texm3x2tex(ctx, inst),
            Opcode::TexM3x3Tex => self.emit_texm3x3tex(ctx, inst),
            Opcode::TexM3x3 => self.emit_texm3x3(ctx, inst),
            Opcode::TexM3x3Spec => self.emit_texm3x3_reflection(ctx, inst, false),
            Opcode::TexM3x3VSpec => self.emit_texm3x3_reflection(ctx, inst, true),

            Opcode::TexCrd
            | Opcode::TexReg2Ar
            | Opcode::TexReg2Gb
            | Opcode::TexReg2Rgb
            | Opcode::TexDp3Tex
            | Opcode::TexM3x2Depth
            | Opcode::TexDp3
            | Opcode::TexDepth
            | Opcode::Bem => {
                ctx.fail(format!(
                    "{} unimplemented in {} profile",
                    inst.opcode.name(),
                    self.name
                ));
            }
        }
    }

    fn var_name(&self, ctx: &Context, reg_type: RegisterType, reg_num: u32) -> String {
        let reg = register_name(ctx, reg_type, reg_num).unwrap_or_else(|| "???".to_string());
        format!("{}_{reg}", ctx.shader_type_str())
    }

    fn const_array_var_name(&self, ctx: &Context, base: u32, size: u32) -> String {
        format!("{}_const_array_{base}_{size}", ctx.shader_type_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ParseOptions;
    use crate::types::ShaderType;
    use pretty_assertions::assert_eq;

    fn context(shader_type: ShaderType, major: u8, minor: u8) -> Context {
        let mut ctx = Context::new(Vec::new(), &ParseOptions::default());
        ctx.shader_type = shader_type;
        ctx.major = major;
        ctx.minor = minor;
        ctx
    }

    fn glsl() -> GlslProfile {
        GlslProfile::new("glsl", GlslFlavor::GLSL)
    }

    fn src(reg_type: RegisterType, reg_num: u32) -> SourceArg {
        SourceArg {
            reg_type,
            reg_num,
            ..SourceArg::default()
        }
    }

    fn dst(reg_type: RegisterType, reg_num: u32, mask: WriteMask) -> DestArg {
        DestArg {
            reg_type,
            reg_num,
            write_mask: mask,
            orig_mask: mask,
            ..DestArg::default()
        }
    }

    fn main_line(ctx: &Context) -> &str {
        ctx.out.section(Section::MainLine)
    }

    #[test]
    fn register_names_follow_assembly_spelling() {
        let profile = glsl();
        let vs3 = context(ShaderType::VERTEX, 3, 0);
        let vs1 = context(ShaderType::VERTEX, 1, 1);
        let ps2 = context(ShaderType::PIXEL, 2, 0);

        assert_eq!(profile.var_name(&vs3, RegisterType::TexCrdOut, 2), "vs_o2");
        assert_eq!(profile.var_name(&vs1, RegisterType::TexCrdOut, 2), "vs_oT2");
        assert_eq!(profile.var_name(&vs1, RegisterType::Address, 0), "vs_a0");
        assert_eq!(profile.var_name(&ps2, RegisterType::Address, 0), "ps_t0");
        assert_eq!(profile.var_name(&vs1, RegisterType::RastOut, rastout::FOG), "vs_oFog");
        assert_eq!(profile.var_name(&ps2, RegisterType::MiscType, misctype::FACE), "ps_vFace");
        assert_eq!(profile.var_name(&ps2, RegisterType::DepthOut, 0), "ps_oDepth");
        assert_eq!(profile.var_name(&ps2, RegisterType::Loop, 0), "ps_aL");
        assert_eq!(profile.var_name(&ps2, RegisterType::Const2, 0), "ps_???");
        assert_eq!(profile.const_array_var_name(&vs1, 4, 3), "vs_const_array_4_3");
    }

    #[test]
    fn source_modifiers_and_swizzles() {
        let profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 2, 0);

        let mut arg = src(RegisterType::Temp, 1);
        arg.swizzle = Swizzle::new(3, 2, 1, 0);
        arg.src_mod = SourceMod::Complement;
        assert_eq!(
            profile.src_string(&mut ctx, &arg, WriteMask::XY),
            "(1.0 - ps_r1.wz)"
        );

        arg.swizzle = Swizzle::NONE;
        arg.src_mod = SourceMod::SignNegate;
        assert_eq!(
            profile.src_string(&mut ctx, &arg, WriteMask::XYZW),
            "-((ps_r1 - 0.5) * 2.0)"
        );

        let bool_reg = src(RegisterType::ConstBool, 2);
        assert_eq!(profile.src_string(&mut ctx, &bool_reg, WriteMask::XYZW), "ps_b2");

        arg.src_mod = SourceMod::Dz;
        assert_eq!(profile.src_string(&mut ctx, &arg, WriteMask::XYZW), "");
        assert_eq!(ctx.diag.messages(), vec!["SRCMOD_DZ unsupported"]);
    }

    #[test]
    fn relative_constant_reads_index_packed_arrays() {
        let profile = glsl();
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        ctx.variables.push(crate::context::Variable {
            uniform_type: UniformType::Float,
            index: 10,
            count: 8,
            constants: Vec::new(),
            used: true,
            emit_position: Some(0),
        });

        let mut arg = src(RegisterType::Const, 12);
        arg.relative = true;
        arg.relative_reg_type = RegisterType::Address;
        arg.relative_reg_num = 0;
        arg.relative_component = 1;
        arg.relative_array = Some(0);
        assert_eq!(
            profile.src_string(&mut ctx, &arg, WriteMask::XYZW),
            "vs_uniforms_vec4[(ARRAYBASE_10 + 2) + vs_a0.y]"
        );

        arg.reg_num = 10;
        arg.relative_reg_type = RegisterType::Loop;
        assert_eq!(
            profile.src_string(&mut ctx, &arg, WriteMask::X),
            "vs_uniforms_vec4[ARRAYBASE_10 + aL].x"
        );
    }

    #[test]
    fn destination_modifiers_wrap_the_operation() {
        let profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 1, 1);
        ctx.set_output(Section::MainLine);
        let inst = Instruction::new(Opcode::Mov, 0, false, false);

        let mut d = dst(RegisterType::Temp, 0, WriteMask::XYZ);
        d.result_mod = ResultMod::SATURATE;
        d.result_shift = 0x1;
        profile.assign(&mut ctx, &inst, &d, "ps_t0");

        let empty = dst(RegisterType::Temp, 1, WriteMask(0));
        profile.assign(&mut ctx, &inst, &empty, "ps_t0");

        assert_eq!(
            main_line(&ctx),
            "ps_r0.xyz = clamp((ps_t0) * 2.0, vec3(0.0), vec3(1.0));\n"
        );
    }

    #[test]
    fn cmp_groups_components_by_src0_lane() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 2, 0);
        ctx.set_output(Section::MainLine);

        let mut inst = Instruction::new(Opcode::Cmp, 0, false, false);
        inst.dst = dst(RegisterType::Temp, 0, WriteMask::XYZW);
        inst.src[0] = src(RegisterType::Temp, 1);
        inst.src[0].swizzle = Swizzle::new(0, 0, 1, 1);
        inst.src[1] = src(RegisterType::Temp, 2);
        inst.src[2] = src(RegisterType::Temp, 3);
        profile.emit_function(&mut ctx, &inst);

        assert_eq!(
            main_line(&ctx),
            "ps_r0.xy = ((ps_r1.x >= 0.0) ? ps_r2.xy : ps_r3.xy);\n\
             ps_r0.zw = ((ps_r1.y >= 0.0) ? ps_r2.zw : ps_r3.zw);\n"
        );
    }

    #[test]
    fn sincos_assigns_its_result() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::VERTEX, 3, 0);
        ctx.set_output(Section::MainLine);

        let mut inst = Instruction::new(Opcode::SinCos, 0, false, false);
        inst.dst = dst(RegisterType::Temp, 0, WriteMask::XY);
        inst.src[0] = src(RegisterType::Temp, 1);
        inst.src[0].swizzle = Swizzle::replicate(3);
        profile.emit_function(&mut ctx, &inst);

        assert_eq!(
            main_line(&ctx),
            "vs_r0.xy = vec2(cos(vs_r1.w), sin(vs_r1.w));\n"
        );
    }

    #[test]
    fn rcp_guards_division_by_zero() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::VERTEX, 2, 0);
        ctx.set_output(Section::MainLine);

        let mut inst = Instruction::new(Opcode::Rcp, 0, false, false);
        inst.dst = dst(RegisterType::Temp, 0, WriteMask::X);
        inst.src[0] = src(RegisterType::Temp, 1);
        inst.src[0].swizzle = Swizzle::replicate(2);
        profile.emit_function(&mut ctx, &inst);
        profile.emit_finalize(&mut ctx);

        assert_eq!(
            main_line(&ctx),
            "vs_r0.x = float((vs_r1.z == 0.0) ? FLT_MAX : 1.0 / vs_r1.z);\n"
        );
        assert!(ctx
            .out
            .section(Section::Preflight)
            .contains("const float FLT_MAX = 1e38;"));
    }

    #[test]
    fn def_literals_are_valid_glsl_floats() {
        assert_eq!(float_str(1.0), "1.0");
        assert_eq!(float_str(-2.0), "-2.0");
        assert_eq!(float_str(0.25), "0.25");

        let mut profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 2, 0);
        let mut inst = Instruction::new(Opcode::DefI, 0, false, false);
        inst.dst = dst(RegisterType::ConstInt, 0, WriteMask::XYZW);
        inst.dwords = [3, 0, (-1i32) as u32, 0];
        profile.emit_function(&mut ctx, &inst);
        assert_eq!(
            ctx.out.section(Section::Globals),
            "const ivec4 ps_i0 = ivec4(3, 0, -1, 0);\n"
        );
    }

    #[test]
    fn es_preflight_sets_precision() {
        let mut profile = GlslProfile::new("glsles", GlslFlavor::GLSLES);
        let mut ctx = context(ShaderType::PIXEL, 2, 0);
        profile.emit_start(&mut ctx);
        assert_eq!(
            ctx.out.section(Section::Preflight),
            "#version 100\nprecision mediump float;\nprecision mediump int;\n"
        );
        assert_eq!(ctx.out.section(Section::MainLineIntro), "void main()\n{\n");
    }

    #[test]
    fn outputs_prefer_builtins_unless_es() {
        let mut desktop = glsl();
        let mut ctx = context(ShaderType::VERTEX, 1, 1);
        desktop.emit_attribute(
            &mut ctx,
            RegisterType::TexCrdOut,
            1,
            Usage::TexCoord,
            1,
            WriteMask::XYZW,
            0,
        );
        assert_eq!(
            ctx.out.section(Section::Globals),
            "#define vs_oT1 gl_TexCoord[1]\n"
        );

        let mut es = GlslProfile::new("glsles", GlslFlavor::GLSLES);
        let mut ctx = context(ShaderType::VERTEX, 1, 1);
        es.emit_attribute(
            &mut ctx,
            RegisterType::TexCrdOut,
            1,
            Usage::TexCoord,
            1,
            WriteMask::XYZW,
            0,
        );
        assert_eq!(
            ctx.out.section(Section::Globals),
            "varying highp vec4 io_5_1;\n#define vs_oT1 io_5_1\n"
        );
    }

    #[test]
    fn centroid_inputs_fail_in_pixel_shaders() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 3, 0);
        profile.emit_attribute(
            &mut ctx,
            RegisterType::Input,
            0,
            Usage::TexCoord,
            0,
            WriteMask::XYZW,
            i32::from(ResultMod::CENTROID.bits()),
        );
        assert_eq!(ctx.diag.messages(), vec!["centroid unsupported in glsl profile"]);
    }

    #[test]
    fn pixel_texture_globals_depend_on_the_shader_model() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 1, 1);
        profile.emit_global(&mut ctx, RegisterType::TEXTURE, 0);
        assert_eq!(
            ctx.out.section(Section::Globals),
            "vec4 ps_t0 = gl_TexCoord[0];\n"
        );

        for (major, minor) in [(1, 4), (2, 0), (3, 0)] {
            let mut ctx = context(ShaderType::PIXEL, major, minor);
            profile.emit_global(&mut ctx, RegisterType::TEXTURE, 0);
            assert!(ctx.diag.errors.is_empty(), "{:?}", ctx.diag.errors);
            assert_eq!(ctx.out.section(Section::Globals), "");
        }
    }

    #[test]
    fn texbem_samplers_reserve_two_uniform_slots() {
        let mut profile = glsl();
        let mut ctx = context(ShaderType::PIXEL, 1, 1);
        ctx.uniform_float4_count = 3;
        profile.emit_sampler(&mut ctx, 1, Some(TextureType::TwoD), true);
        assert_eq!(ctx.uniform_float4_count, 5);
        assert_eq!(
            ctx.out.section(Section::Globals),
            "uniform sampler2D ps_s1;\n\
             #define ps_s1_texbem ps_uniforms_vec4[3]\n\
             #define ps_s1_texbeml ps_uniforms_vec4[4]\n"
        );
    }
}
