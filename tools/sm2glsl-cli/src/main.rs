#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use sm2glsl::{ParseData, ParseOptions, ShaderType, UniformType};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sm2glsl",
    about = "Translate Direct3D 9 shader bytecode (SM1-SM3) to GLSL."
)]
struct Args {
    /// Compiled shader bytecode (raw token stream, e.g. a .vso/.pso file)
    input: PathBuf,

    /// Target profile: glsl, glsl120, glsles or glsl400
    #[arg(long, default_value = "glsl")]
    profile: String,

    /// Name of the generated entry point
    #[arg(long, value_name = "NAME", default_value = "main")]
    main_fn: String,

    /// Flip vertex output Y through a `vpFlip` uniform
    #[arg(long, action = clap::ArgAction::SetTrue)]
    flip_render_target: bool,

    /// Remap clip-space depth from [0, 1] to [-1, 1]
    #[arg(long, action = clap::ArgAction::SetTrue)]
    depth_clipping: bool,

    /// Print a JSON report (bindings, symbols, errors and source) instead of bare GLSL
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json: bool,

    /// Write the result to this path instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log every parsed token (same as RUST_LOG=debug)
    #[arg(long, short, action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    profile: &'a str,
    shader_type: &'static str,
    version: String,
    instruction_count: u32,
    main_fn: &'a str,
    uniforms: Vec<UniformEntry<'a>>,
    constants: Vec<ConstantEntry>,
    samplers: Vec<SamplerEntry<'a>>,
    attributes: Vec<AttributeEntry<'a>>,
    outputs: Vec<AttributeEntry<'a>>,
    symbols: Vec<SymbolEntry<'a>>,
    preshader_instructions: Option<usize>,
    errors: Vec<String>,
    glsl: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UniformEntry<'a> {
    name: &'a str,
    kind: &'static str,
    index: u32,
    array_count: u32,
    constant: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConstantEntry {
    kind: &'static str,
    index: u32,
    raw: [u32; 4],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplerEntry<'a> {
    name: &'a str,
    index: u32,
    kind: String,
    texbem: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttributeEntry<'a> {
    name: &'a str,
    usage: String,
    index: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SymbolEntry<'a> {
    name: &'a str,
    register_set: String,
    register_index: u32,
    register_count: u32,
}

fn uniform_kind(uniform_type: UniformType) -> &'static str {
    match uniform_type {
        UniformType::Float => "float4",
        UniformType::Int => "int4",
        UniformType::Bool => "bool",
    }
}

fn shader_kind(shader_type: ShaderType) -> &'static str {
    if shader_type == ShaderType::VERTEX {
        "vertex"
    } else if shader_type == ShaderType::PIXEL {
        "pixel"
    } else {
        "unknown"
    }
}

impl<'a> Report<'a> {
    fn new(data: &'a ParseData) -> Self {
        let attribute = |a: &'a sm2glsl::Attribute| AttributeEntry {
            name: &a.name,
            usage: a.usage.to_string(),
            index: a.index,
        };
        Self {
            profile: &data.profile,
            shader_type: shader_kind(data.shader_type),
            version: format!("{}.{}", data.major, data.minor),
            instruction_count: data.instruction_count,
            main_fn: &data.main_fn,
            uniforms: data
                .uniforms
                .iter()
                .map(|u| UniformEntry {
                    name: &u.name,
                    kind: uniform_kind(u.uniform_type),
                    index: u.index,
                    array_count: u.array_count,
                    constant: u.constant,
                })
                .collect(),
            constants: data
                .constants
                .iter()
                .map(|c| ConstantEntry {
                    kind: uniform_kind(c.constant_type),
                    index: c.index,
                    raw: c.value,
                })
                .collect(),
            samplers: data
                .samplers
                .iter()
                .map(|s| SamplerEntry {
                    name: &s.name,
                    index: s.index,
                    kind: format!("{:?}", s.sampler_type),
                    texbem: s.texbem,
                })
                .collect(),
            attributes: data.attributes.iter().map(attribute).collect(),
            outputs: data.outputs.iter().map(attribute).collect(),
            symbols: data
                .symbols
                .iter()
                .map(|s| SymbolEntry {
                    name: &s.name,
                    register_set: format!("{:?}", s.register_set),
                    register_index: s.register_index,
                    register_count: s.register_count,
                })
                .collect(),
            preshader_instructions: data.preshader.as_ref().map(|p| p.instructions.len()),
            errors: data.errors.iter().map(ToString::to_string).collect(),
            glsl: data.is_ok().then_some(data.output.as_str()),
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let bytecode =
        fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;

    let options = ParseOptions::default()
        .with_main_fn(args.main_fn.clone())
        .with_flip_render_target(args.flip_render_target)
        .with_depth_clipping(args.depth_clipping)
        .with_filename(args.input.display().to_string());

    let data = sm2glsl::parse(&args.profile, &bytecode, &options)
        .with_context(|| format!("translate {}", args.input.display()))?;
    tracing::debug!(
        instructions = data.instruction_count,
        errors = data.errors.len(),
        "translated"
    );

    let rendered = if args.json {
        let mut json =
            serde_json::to_string_pretty(&Report::new(&data)).context("serialize report")?;
        json.push('\n');
        Some(json)
    } else if data.is_ok() {
        Some(data.output.clone())
    } else {
        None
    };

    if let Some(text) = rendered {
        match &args.output {
            Some(path) => {
                fs::write(path, text).with_context(|| format!("write {}", path.display()))?
            }
            None => io::stdout()
                .lock()
                .write_all(text.as_bytes())
                .context("write stdout")?,
        }
    }

    for err in &data.errors {
        eprintln!("{err}");
    }
    if !data.is_ok() {
        bail!(
            "{} error(s) translating {}",
            data.errors.len(),
            args.input.display()
        );
    }
    Ok(())
}
