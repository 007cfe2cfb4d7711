use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the primc binary.
#[derive(Parser, Debug)]
#[command(
    name = "primc",
    version,
    about = "Binds primary constructors and reports captured parameters"
)]
pub struct CliArgs {
    /// JSON file holding the type declarations of one compilation.
    pub input: PathBuf,

    /// Path to a primc.json options file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// An explicitly declared member always wins over a primary parameter,
    /// constructor scope included.
    #[arg(long)]
    pub member_biased: bool,

    /// Disable the type-name-equals-parameter-name receiver rule.
    #[arg(long = "no-color-color")]
    pub no_color_color: bool,

    /// Analyse every type on the current thread.
    #[arg(long)]
    pub sequential: bool,

    /// Suppress the advisory warnings.
    #[arg(long)]
    pub no_advisory_warnings: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print synthesized constructors and captured fields.
    #[arg(long)]
    pub emit_artifacts: bool,

    /// Construct an instance of this type with the evaluator after a clean
    /// analysis.
    #[arg(long, value_name = "TYPE")]
    pub construct: Option<String>,

    /// Integer constructor argument for `--construct` (repeatable).
    #[arg(long = "arg", value_name = "INT", allow_negative_numbers = true)]
    pub construct_args: Vec<i64>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
