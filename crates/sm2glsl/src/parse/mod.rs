//! Token-stream driver.
//!
//! The version token comes first; after that every token is tried as a comment block, the end
//! token, a ps_1_4 phase marker and finally an instruction, in that order. A failing token is
//! recorded and skipped so one pass reports as many problems as possible.

mod args;
mod definitions;
mod state;

use tracing::{debug, trace};

use crate::build::build_parse_data;
use crate::context::Context;
use crate::ctab::parse_constant_table;
use crate::error::ErrorPosition;
use crate::instruction::Instruction;
use crate::opcode::{Opcode, OPCODE_TABLE_LEN};
use crate::preshader::parse_preshader;
use crate::profile::Profile;
use crate::result::{ParseData, ParseOptions};
use crate::shader_limits::{CTAB_ID, PRES_ID};
use crate::token::{
    comment_token, InstructionToken, VersionToken, END_TOKEN, PHASE_TOKEN, PIXEL_SHADER_TYPE,
    VERTEX_SHADER_TYPE,
};
use crate::types::{RegisterType, ShaderType};

/// Runs one complete parse of `tokens` through `profile`.
pub(crate) fn run(profile: &mut dyn Profile, tokens: Vec<u32>, options: &ParseOptions) -> ParseData {
    let mut ctx = Context::new(tokens, options);
    let mut failed = false;
    let mut truncated = false;

    // Not bytecode at all; anything further would only add noise.
    let Some(rc) = ctx.parse_version_token(profile) else {
        return ParseData::failed(profile.name(), ctx.diag.errors);
    };
    if rc > ctx.tokens_remaining() {
        ctx.fail("Corrupted or truncated shader");
    }
    ctx.adjust_token_position(rc);

    while ctx.tokens_remaining() > 0 {
        if ctx.is_fail() {
            failed = true;
            ctx.diag.is_fail = false;
        }

        let rc = ctx.parse_token(profile);
        if rc > ctx.tokens_remaining() {
            ctx.fail("Corrupted or truncated shader");
            truncated = true;
            break;
        }
        ctx.adjust_token_position(rc);
    }

    ctx.diag.position = ErrorPosition::After;

    if !ctx.saw_end_token && !truncated && !ctx.shader_type.is_empty() {
        ctx.fail("shader has no end token");
    }

    // ps_1_x writes its color to r0.
    if ctx.shader_is_pixel()
        && !ctx.version_at_least(2, 0)
        && !ctx.register_was_written(RegisterType::Temp, 0)
    {
        ctx.fail("r0 (pixel shader 1.x color output) never written to");
    }

    failed |= ctx.is_fail();
    if !failed {
        ctx.process_definitions(profile);
        failed = ctx.is_fail();
    }
    if !failed {
        profile.emit_finalize(&mut ctx);
        failed = ctx.is_fail();
    }

    ctx.diag.is_fail = failed;
    build_parse_data(ctx, profile)
}

impl Context {
    /// Returns the tokens consumed, or `None` when the stream isn't a vertex or pixel shader.
    fn parse_version_token(&mut self, profile: &mut dyn Profile) -> Option<usize> {
        if self.tokens_remaining() < 1 {
            self.fail("Expected version token, got none at all.");
            return Some(0);
        }

        let token = self.token(0);
        let version = VersionToken::decode(token);
        self.version_token = token;

        self.shader_type = match version.shader_type {
            PIXEL_SHADER_TYPE => ShaderType::PIXEL,
            VERTEX_SHADER_TYPE => ShaderType::VERTEX,
            _ => {
                self.fail("Unsupported shader type or not a shader at all");
                return None;
            }
        };
        self.major = version.major;
        self.minor = version.minor;
        debug!(
            shader_type = self.shader_type_str(),
            major = version.major,
            minor = version.minor,
            "version token"
        );

        if !Context::version_supported(version.major, version.minor) {
            self.fail(format!(
                "Shader Model {}.{} is currently unsupported.",
                version.major, version.minor
            ));
        }

        if !self.is_fail() {
            profile.emit_start(self);
        }

        Some(1)
    }

    fn parse_token(&mut self, profile: &mut dyn Profile) -> usize {
        if self.tokens_remaining() < 1 {
            self.fail("unexpected end of shader.");
            return 0;
        }

        let token = self.token(0);
        if let Some(rc) = self.parse_comment_token(token) {
            return rc;
        }
        if let Some(rc) = self.parse_end_token(profile, token) {
            return rc;
        }
        if let Some(rc) = self.parse_phase_token(profile, token) {
            return rc;
        }
        if let Some(rc) = self.parse_instruction_token(profile, token) {
            return rc;
        }

        self.fail(format!("unknown token (0x{token:X})"));
        1
    }

    fn parse_comment_token(&mut self, token: u32) -> Option<usize> {
        let (len, high_bit) = comment_token(token)?;
        let len = len as usize;

        if high_bit {
            self.fail("comment token high bit must be zero.");
        }

        if len >= 2 && len < self.tokens_remaining() {
            let block = self.remaining_tokens()[..=len].to_vec();
            match block[1] {
                PRES_ID => {
                    trace!(tokens = len, "preshader comment");
                    if self.preshader.is_some() {
                        self.fail("Shader has multiple preshaders");
                    } else {
                        self.preshader = parse_preshader(&mut self.diag, &block[2..]);
                    }
                }
                CTAB_ID => {
                    trace!(tokens = len, "constant table comment");
                    let ranges = parse_constant_table(
                        &mut self.diag,
                        &block,
                        self.version_token,
                        &mut self.ctab,
                    );
                    self.declare_ranges(ranges);
                }
                id => trace!(tokens = len, id = format_args!("0x{id:08X}"), "comment"),
            }
        }

        Some(len + 1)
    }

    fn parse_end_token(&mut self, profile: &mut dyn Profile, token: u32) -> Option<usize> {
        if token != END_TOKEN {
            return None;
        }
        self.saw_end_token = true;

        if !self.knows_size() {
            self.end_stream_here();
        } else if self.tokens_remaining() != 1 {
            self.fail("end token before end of stream");
        }

        if !self.is_fail() {
            profile.emit_end(self);
        }
        Some(1)
    }

    fn parse_phase_token(&mut self, profile: &mut dyn Profile, token: u32) -> Option<usize> {
        if token != PHASE_TOKEN {
            return None;
        }

        if !self.shader_is_pixel() || !self.version_exactly(1, 4) {
            self.fail("phase token only available in 1.4 pixel shaders");
        }

        if !self.is_fail() {
            profile.emit_phase(self);
        }
        Some(1)
    }

    fn parse_instruction_token(&mut self, profile: &mut dyn Profile, token: u32) -> Option<usize> {
        let raw = InstructionToken::decode(token);
        if raw.opcode >= OPCODE_TABLE_LEN {
            return None;
        }
        let opcode = Opcode::from_raw(raw.opcode)?;
        let info = opcode.info();
        let extra_tokens = raw.extra_tokens as usize;
        let start = self.position();

        debug!(
            token = format_args!("0x{token:08X}"),
            position = start,
            opcode = opcode.name(),
            "instruction token"
        );

        if raw.reserved {
            self.fail("instruction token high bit must be zero.");
        }

        if opcode.is_reserved() {
            self.fail("Unknown opcode.");
            return Some(extra_tokens + 1);
        }

        if raw.coissue {
            if !self.shader_is_pixel() {
                self.fail("coissue instruction on non-pixel shader");
            }
            if self.version_at_least(2, 0) {
                self.fail("coissue instruction in Shader Model >= 2.0");
            }
        }

        if (self.shader_type & info.shader_types).is_empty() {
            self.fail(format!(
                "opcode '{}' not available in this shader type.",
                info.name
            ));
        }

        let mut inst = Instruction::new(opcode, raw.controls, raw.coissue, raw.predicated);

        self.adjust_token_position(1);
        let mut result = self.parse_args(info.args, &mut inst);
        if raw.predicated {
            result += self.parse_predicated_token(&mut inst);
        }
        self.set_position(start);

        self.check_instruction(&mut inst);
        self.instruction_count += info.slots;

        if !self.is_fail() {
            profile.emit_function(self, &inst);
        }

        if self.reset_texmpad {
            self.texm3x2pad_dst0 = None;
            self.texm3x2pad_src0 = None;
            self.texm3x3pad_dst0 = None;
            self.texm3x3pad_src0 = None;
            self.texm3x3pad_dst1 = None;
            self.texm3x3pad_src1 = None;
            self.reset_texmpad = false;
        }

        self.previous_opcode = Some(opcode);

        if !self.version_at_least(2, 0) {
            // Reserved before shader model 2.
            if extra_tokens != 0 {
                self.fail("instruction token count must be zero");
            }
        } else if result != extra_tokens + 1 {
            self.fail(format!(
                "wrong token count ({result}, not {}) for opcode '{}'.",
                extra_tokens + 1,
                info.name
            ));
            result = extra_tokens + 1;
        }

        Some(result)
    }
}
