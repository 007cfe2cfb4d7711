use anyhow::{Context, Result};
use primc_binder::{AnalysisResults, BinderOptions, CancellationToken, Compilation};
use primc_eval::{Interpreter, RecordingHost, Value};
use primc_syntax::TypeDeclSyntax;
use std::path::Path;
use tracing::{info, warn};

use crate::args::CliArgs;
use crate::config::resolve_options;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;

/// The instance built by `--construct`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionReport {
    pub type_name: String,
    /// Stored fields and their values, in layout order.
    pub fields: Vec<(String, String)>,
    /// Lines printed through the host while constructing.
    pub output: Vec<String>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub options: BinderOptions,
    pub results: AnalysisResults,
    pub construction: Option<ConstructionReport>,
}

impl RunOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.results.has_errors() {
            EXIT_DIAGNOSTICS
        } else {
            EXIT_SUCCESS
        }
    }
}

pub fn load_declarations(path: &Path) -> Result<Vec<TypeDeclSyntax>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input: {}", path.display()))?;
    parse_declarations(&source).with_context(|| format!("failed to parse input: {}", path.display()))
}

pub fn parse_declarations(source: &str) -> Result<Vec<TypeDeclSyntax>> {
    let declarations = serde_json::from_str(source)?;
    Ok(declarations)
}

pub fn analyze(declarations: Vec<TypeDeclSyntax>, options: &BinderOptions) -> Result<AnalysisResults> {
    let compilation = Compilation::new(declarations);
    let results = compilation
        .analyze(options, &CancellationToken::new())
        .context("analysis failed")?;
    Ok(results)
}

pub fn run(args: &CliArgs, cwd: &Path) -> Result<RunOutcome> {
    let options = resolve_options(args, cwd)?;
    let input = if args.input.is_absolute() {
        args.input.clone()
    } else {
        cwd.join(&args.input)
    };
    let declarations = load_declarations(&input)?;
    info!(types = declarations.len(), input = %input.display(), "loaded declarations");
    let results = analyze(declarations, &options)?;

    let construction = match &args.construct {
        Some(type_name) if results.has_errors() => {
            warn!(type_name = %type_name, "analysis reported errors; skipping construction");
            None
        }
        Some(type_name) => Some(construct(&results, type_name, &args.construct_args)?),
        None => None,
    };

    Ok(RunOutcome {
        options,
        results,
        construction,
    })
}

/// Build one instance with the evaluator, printing through a recording host.
pub fn construct(
    results: &AnalysisResults,
    type_name: &str,
    args: &[i64],
) -> Result<ConstructionReport> {
    let mut interpreter = Interpreter::new(results, RecordingHost::new());
    let arguments = args.iter().copied().map(Value::Int).collect();
    let object = interpreter
        .construct(type_name, arguments)
        .with_context(|| format!("failed to construct {type_name}"))?;
    let fields = object
        .field_names()
        .into_iter()
        .map(|name| {
            let value = object.field(&name).unwrap_or(Value::Unit).to_string();
            (name, value)
        })
        .collect();
    Ok(ConstructionReport {
        type_name: type_name.to_string(),
        fields,
        output: interpreter.into_host().into_output(),
    })
}
