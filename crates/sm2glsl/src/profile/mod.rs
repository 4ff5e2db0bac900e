//! Code generation backends.
//!
//! The parser drives a [`Profile`] at fixed points: once at the start and end of the token
//! stream, once per accepted instruction, and once per register during the deferred
//! declaration pass.

mod glsl;

use crate::context::Context;
use crate::instruction::Instruction;
use crate::swizzle::WriteMask;
use crate::types::{RegisterType, TextureType, Usage};

pub(crate) use glsl::{GlslFlavor, GlslProfile};

/// Registered profile names, in the casing reported back in [`crate::ParseData::profile`].
pub const PROFILES: &[&str] = &["glsl", "glsl120", "glsles", "glsl400"];

pub(crate) trait Profile {
    fn name(&self) -> &'static str;

    /// Version pragma, then opens the entry point.
    fn emit_start(&mut self, ctx: &mut Context);
    fn emit_end(&mut self, ctx: &mut Context);
    fn emit_phase(&mut self, ctx: &mut Context);
    /// Packed uniform arrays, sized by the final counts.
    fn emit_finalize(&mut self, ctx: &mut Context);

    fn emit_global(&mut self, ctx: &mut Context, reg_type: RegisterType, reg_num: u32);
    /// A host-uploaded constant array; `var` indexes `ctx.variables`.
    fn emit_array(&mut self, ctx: &mut Context, var: usize);
    /// A constant array backed by `def` literals.
    fn emit_const_array(&mut self, ctx: &mut Context, var: usize);
    fn emit_uniform(&mut self, ctx: &mut Context, reg_type: RegisterType, reg_num: u32, var: Option<usize>);
    fn emit_sampler(&mut self, ctx: &mut Context, stage: u32, texture_type: Option<TextureType>, texbem: bool);
    #[allow(clippy::too_many_arguments)]
    fn emit_attribute(
        &mut self,
        ctx: &mut Context,
        reg_type: RegisterType,
        reg_num: u32,
        usage: Usage,
        index: u32,
        write_mask: WriteMask,
        flags: i32,
    );

    fn emit_function(&mut self, ctx: &mut Context, inst: &Instruction);

    fn var_name(&self, ctx: &Context, reg_type: RegisterType, reg_num: u32) -> String;
    fn const_array_var_name(&self, ctx: &Context, base: u32, size: u32) -> String;
}

/// Looks a profile up by name, ignoring ASCII case.
pub(crate) fn create(name: &str) -> Option<Box<dyn Profile>> {
    let name = PROFILES.iter().copied().find(|p| p.eq_ignore_ascii_case(name))?;
    let flavor = match name {
        "glsl120" => GlslFlavor::GLSL120,
        "glsles" => GlslFlavor::GLSLES,
        "glsl400" => GlslFlavor::GLSL400,
        _ => GlslFlavor::GLSL,
    };
    Some(Box::new(GlslProfile::new(name, flavor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(create("GLSL120").map(|p| p.name()), Some("glsl120"));
        assert_eq!(create("GlslEs").map(|p| p.name()), Some("glsles"));
        assert!(create("arb1").is_none());
        assert!(create("").is_none());
    }
}
