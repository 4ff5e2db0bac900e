//! Turns the final parse state into the caller-facing [`ParseData`].

use crate::context::Context;
use crate::profile::Profile;
use crate::result::{Attribute, ParseData, Sampler, Uniform};
use crate::types::{RegisterType, UniformType};

pub(crate) fn build_parse_data(mut ctx: Context, profile: &mut dyn Profile) -> ParseData {
    if ctx.is_fail() {
        return ParseData::failed(profile.name(), ctx.diag.errors);
    }

    let output = ctx.out.finish();

    let mut uniforms = Vec::new();
    for var in ctx.variables.iter().rev().filter(|v| v.used) {
        uniforms.push(Uniform {
            uniform_type: UniformType::Float,
            index: var.index,
            array_count: var.count,
            constant: !var.constants.is_empty(),
            name: profile.const_array_var_name(&ctx, var.index, var.count),
        });
    }
    for item in ctx.uniforms.iter() {
        let uniform_type = match item.reg_type {
            // Covered by the array entry above.
            RegisterType::Const if item.array.is_some() => continue,
            RegisterType::Const => UniformType::Float,
            RegisterType::ConstInt => UniformType::Int,
            _ => UniformType::Bool,
        };
        uniforms.push(Uniform {
            uniform_type,
            index: item.reg_num,
            array_count: 0,
            constant: false,
            name: profile.var_name(&ctx, item.reg_type, item.reg_num),
        });
    }

    let samplers = ctx
        .samplers
        .iter()
        .map(|item| Sampler {
            sampler_type: ctx.sampler_type(item.reg_num),
            index: item.reg_num,
            name: profile.var_name(&ctx, RegisterType::Sampler, item.reg_num),
            texbem: item.misc != 0,
        })
        .collect();

    let mut attributes = Vec::new();
    let mut outputs = Vec::new();
    for item in ctx.attributes.iter() {
        let attribute = Attribute {
            usage: item.usage,
            index: item.index,
            name: profile.var_name(&ctx, item.reg_type, item.reg_num),
        };
        if item.reg_type.is_output() {
            outputs.push(attribute);
        } else {
            attributes.push(attribute);
        }
    }

    ParseData {
        profile: profile.name().to_string(),
        output,
        instruction_count: ctx.instruction_count,
        shader_type: ctx.shader_type,
        major: ctx.major,
        minor: ctx.minor,
        main_fn: std::mem::take(&mut ctx.main_fn),
        uniforms,
        constants: std::mem::take(&mut ctx.constants),
        samplers,
        attributes,
        outputs,
        swizzles: std::mem::take(&mut ctx.swizzles),
        symbols: std::mem::take(&mut ctx.ctab.symbols),
        preshader: ctx.preshader.take(),
        errors: std::mem::take(&mut ctx.diag.errors),
    }
}
