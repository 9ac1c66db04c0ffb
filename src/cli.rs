/// Command line parsing
///
/// Flags follow the LLVM tool conventions: long options may be written with
/// a single dash (`-march=x86-64`, `-mattr +avx`). Those are rewritten to
/// the double-dash form before clap sees them.
use crate::codegen::{resolve_cpu_and_features, version_text, TargetConfig};
use crate::config::{CodeModel, OutputKind, RelocModel, Resolvable, ResolvedConfig};
use crate::error::{EmbedError, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;

/// Long options that are also accepted with a single leading dash.
const SINGLE_DASH_LONG_FLAGS: &[&str] = &[
    "march",
    "mcpu",
    "mattr",
    "mtriple",
    "code-model",
    "relocation-model",
    "filetype",
    "data-sections",
];

/// Embed a binary file as a named data symbol.
#[derive(Parser, Debug)]
#[command(name = "binasset", version, about, long_about = None)]
pub struct Cli {
    /// Input file, '-' for standard input
    #[arg(short = 'c', value_name = "FILE", default_value = "-")]
    pub input: String,

    /// Output file, '-' for standard output
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Name of the data symbol
    #[arg(short = 'n', value_name = "NAME")]
    pub name: Option<String>,

    /// Append a NUL byte to the data
    #[arg(short = 'z')]
    pub null_terminate: bool,

    /// Attach debug information
    #[arg(short = 'g')]
    pub debug_info: bool,

    /// Architecture to generate code for
    #[arg(long = "march", value_name = "NAME")]
    pub march: Option<String>,

    /// Target CPU, 'native' to detect the host
    #[arg(long = "mcpu", value_name = "CPU")]
    pub cpu: Option<String>,

    /// Target specific attributes
    #[arg(
        long = "mattr",
        value_name = "A1,+A2,-A3,...",
        value_delimiter = ',',
        action = ArgAction::Append,
        allow_hyphen_values = true
    )]
    pub attrs: Vec<String>,

    /// Target triple, defaults to the host
    #[arg(long = "mtriple", value_name = "TRIPLE")]
    pub triple: Option<String>,

    /// Code model
    #[arg(long = "code-model", value_enum)]
    pub code_model: Option<CodeModel>,

    /// Relocation model
    #[arg(long = "relocation-model", value_enum)]
    pub relocation_model: Option<RelocModel>,

    /// Kind of output file to emit
    #[arg(long = "filetype", value_enum)]
    pub filetype: Option<OutputKind>,

    /// Place the data in its own section
    #[arg(long = "data-sections")]
    pub data_sections: bool,

    /// Increase log verbosity
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Rewrite `-name` / `-name=value` to `--name...` for the known long flags.
/// Everything after `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

/// Parse a full argument vector, program name first.
pub fn parse_from<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let matches = Cli::command()
        .long_version(version_text())
        .try_get_matches_from(normalize_args(args))?;
    Cli::from_arg_matches(&matches)
}

impl Cli {
    /// Turn parsed flags into the configuration the pipeline runs on.
    pub fn into_config(self) -> Result<ResolvedConfig> {
        if self.input.is_empty() {
            return Err(EmbedError::Config(
                "no input file given (use '-' for standard input)".to_string(),
            ));
        }

        let target = TargetConfig::resolve(
            self.triple.as_deref().unwrap_or_default(),
            self.relocation_model,
            self.code_model,
            self.filetype,
        );
        let (cpu, features) = resolve_cpu_and_features(self.cpu.as_deref().unwrap_or_default(), &self.attrs);

        Ok(ResolvedConfig {
            input_path: self.input,
            output: Resolvable::new(self.output),
            symbol: Resolvable::new(self.name),
            null_terminate: self.null_terminate,
            emit_debug_info: self.debug_info,
            triple: target.triple,
            march: self.march.unwrap_or_default(),
            cpu,
            features,
            attribute_overrides: self.attrs,
            reloc_model: target.reloc_model,
            code_model: target.code_model,
            output_kind: target.output_kind,
            data_sections: self.data_sections,
        })
    }
}
