use colored::Colorize;
use primc_binder::{Accessibility, InitStep, SynthesizedPrimaryConstructor, TypeAnalysis};
use primc_common::{Diagnostic, DiagnosticCategory, DiagnosticLocation, DiagnosticRelatedInformation};
use serde_json::json;

use crate::driver::{ConstructionReport, RunOutcome};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    /// `Type(start,end) - error DuplicateParameterName: message`
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = self.format_location(&diagnostic.location);
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code.as_str()));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        format!(
            "    {}: {}",
            self.format_location(&related.location),
            related.message_text
        )
    }

    fn format_location(&self, location: &DiagnosticLocation) -> String {
        let type_name = if location.type_name.is_empty() {
            "<unknown>"
        } else {
            location.type_name.as_str()
        };
        let text = if location.span.is_empty() {
            format!("{type_name}#{}", location.node)
        } else {
            format!(
                "{type_name}({},{})",
                location.span.start, location.span.end
            )
        };
        if self.color {
            text.cyan().to_string()
        } else {
            text
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.as_str();
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: &str) -> String {
        if self.color {
            code.bright_blue().to_string()
        } else {
            code.to_string()
        }
    }

    /// The synthesized constructors and captured fields of every type with a
    /// primary constructor.
    pub fn render_artifacts<'a>(&self, analyses: impl Iterator<Item = &'a TypeAnalysis>) -> String {
        let mut blocks = Vec::new();
        for analysis in analyses {
            let Some(ctor) = &analysis.primary_constructor else {
                continue;
            };
            let mut lines = vec![self.format_signature(ctor)];
            for field in &analysis.captured_fields {
                let readonly = if field.is_readonly { "readonly " } else { "" };
                lines.push(format!(
                    "  captured {} -> {readonly}{} {}",
                    field.parameter_name, field.field_type, field.backing_field_name
                ));
            }
            let steps: Vec<String> = ctor.plan.steps.iter().map(|s| format_step(ctor, s)).collect();
            lines.push(format!("  plan: {}", steps.join("; ")));
            if analysis.default_constructor.is_some() {
                lines.push("  default constructor: zero-init".to_string());
            }
            blocks.push(lines.join("\n"));
        }
        blocks.join("\n")
    }

    fn format_signature(&self, ctor: &SynthesizedPrimaryConstructor) -> String {
        let params: Vec<String> = ctor
            .parameters
            .iter()
            .map(|p| {
                let mode = p.passing_mode.keyword();
                if mode.is_empty() {
                    format!("{} {}", p.declared_type, p.name)
                } else {
                    format!("{mode} {} {}", p.declared_type, p.name)
                }
            })
            .collect();
        let accessibility = match ctor.accessibility {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
        };
        let mut line = format!(
            "{}: {accessibility} {}({})",
            ctor.owner_name,
            ctor.owner_name,
            params.join(", ")
        );
        if ctor.has_errors {
            let note = " [has errors]";
            if self.color {
                line.push_str(&note.red().to_string());
            } else {
                line.push_str(note);
            }
        }
        line
    }

    pub fn render_construction(&self, report: &ConstructionReport) -> String {
        let mut lines: Vec<String> = report.output.iter().map(|l| format!("> {l}")).collect();
        let fields: Vec<String> = report
            .fields
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();
        lines.push(format!("new {} {{ {} }}", report.type_name, fields.join(", ")));
        lines.join("\n")
    }

    /// The whole text report for one run.
    pub fn render_outcome(&self, outcome: &RunOutcome, emit_artifacts: bool) -> String {
        let mut sections = Vec::new();
        let diagnostics = outcome.results.diagnostics();
        if !diagnostics.is_empty() {
            sections.push(self.render(diagnostics));
        }
        if emit_artifacts {
            let artifacts = self.render_artifacts(outcome.results.type_analyses());
            if !artifacts.is_empty() {
                sections.push(artifacts);
            }
        }
        if let Some(report) = &outcome.construction {
            sections.push(self.render_construction(report));
        }
        sections.join("\n\n")
    }
}

fn format_step(ctor: &SynthesizedPrimaryConstructor, step: &InitStep) -> String {
    match step {
        InitStep::StoreBackingField { field, .. } => format!("store {field}"),
        InitStep::RunInitializer { name, .. } => format!("init {name}"),
        InitStep::CallBase => match &ctor.base_or_this_call {
            Some(call) => format!("base {}({})", call.base_type, call.arguments.len()),
            None => "base".to_string(),
        },
        InitStep::ZeroInit => "zero".to_string(),
    }
}

/// `--format json`: diagnostics, plus per-type analyses with
/// `--emit-artifacts`, plus the constructed instance if any.
pub fn render_json(outcome: &RunOutcome, emit_artifacts: bool) -> serde_json::Result<String> {
    let mut root = json!({
        "hasErrors": outcome.results.has_errors(),
        "diagnostics": outcome.results.diagnostics(),
    });
    if emit_artifacts {
        let types: Vec<&TypeAnalysis> = outcome.results.type_analyses().collect();
        root["types"] = serde_json::to_value(types)?;
    }
    if let Some(report) = &outcome.construction {
        let fields: serde_json::Map<String, serde_json::Value> = report
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();
        root["construction"] = json!({
            "type": report.type_name,
            "fields": fields,
            "output": report.output,
        });
    }
    serde_json::to_string_pretty(&root)
}
