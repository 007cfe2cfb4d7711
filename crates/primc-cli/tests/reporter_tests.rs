use primc_binder::{BinderOptions, CancellationToken, Compilation};
use primc_cli::driver::{ConstructionReport, RunOutcome};
use primc_cli::reporter::{Reporter, render_json};
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation, Span};
use primc_syntax::TypeDeclSyntax;
use primc_syntax::factory::*;

fn outcome(decls: Vec<TypeDeclSyntax>) -> RunOutcome {
    let options = BinderOptions::default();
    let results = Compilation::new(decls)
        .analyze(&options, &CancellationToken::new())
        .expect("analysis succeeds");
    RunOutcome {
        options,
        results,
        construction: None,
    }
}

fn point() -> TypeDeclSyntax {
    class_decl("Point")
        .with_params(vec![param("X", "int"), param("Y", "int")])
        .with_member(expr_property("Sum", "int", add(name("X"), name("Y"))))
}

#[test]
fn test_formats_diagnostic_without_color() {
    let diagnostic = Diagnostic::new(
        DiagnosticCode::DuplicateParameterName,
        DiagnosticLocation::new("D", 4, Span::new(10, 11)),
        &["x"],
    );

    let text = Reporter::new(false).format_diagnostic(&diagnostic);

    assert!(text.starts_with("D(10,11) - error DuplicateParameterName: "));
    assert!(text.contains("'x'"));
}

#[test]
fn test_empty_span_falls_back_to_node_id() {
    let diagnostic = Diagnostic::new(
        DiagnosticCode::UnreadPrimaryConstructorParameter,
        DiagnosticLocation::new("C", 7, Span::default()),
        &["p"],
    );

    let text = Reporter::new(false).format_diagnostic(&diagnostic);

    assert!(text.starts_with("C#7 - warning UnreadPrimaryConstructorParameter: "));
}

#[test]
fn test_render_joins_diagnostics_by_line() {
    let location = DiagnosticLocation::new("C", 1, Span::default());
    let diagnostics = vec![
        Diagnostic::new(DiagnosticCode::UnreadPrimaryConstructorParameter, location.clone(), &["a"]),
        Diagnostic::new(DiagnosticCode::UnreadPrimaryConstructorParameter, location, &["b"]),
    ];

    let text = Reporter::new(false).render(&diagnostics);

    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_artifacts_list_captures_and_plan() {
    let outcome = outcome(vec![point()]);

    let text = Reporter::new(false).render_artifacts(outcome.results.type_analyses());

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Point: public Point(int X, int Y)",
            "  captured X -> int <X>P",
            "  captured Y -> int <Y>P",
            "  plan: store <X>P; store <Y>P",
        ]
    );
}

#[test]
fn test_artifacts_mark_constructors_with_errors() {
    let outcome = outcome(vec![
        class_decl("D").with_params(vec![param("x", "int"), param("x", "int")]),
        point(),
    ]);

    let text = Reporter::new(false).render_artifacts(outcome.results.type_analyses());

    assert!(!text.contains("D: public"));
    assert!(text.contains("Point: public Point(int X, int Y)"));
}

#[test]
fn test_outcome_includes_construction() {
    let mut outcome = outcome(vec![point()]);
    outcome.construction = Some(ConstructionReport {
        type_name: "Point".to_string(),
        fields: vec![("<X>P".to_string(), "3".to_string())],
        output: vec!["hello".to_string()],
    });

    let text = Reporter::new(false).render_outcome(&outcome, false);

    assert_eq!(text, "> hello\nnew Point { <X>P = 3 }");
}

#[test]
fn test_json_report_shape() {
    let outcome = outcome(vec![point()]);

    let text = render_json(&outcome, true).expect("serializes");
    let json: serde_json::Value = serde_json::from_str(&text).expect("valid json");

    assert_eq!(json["hasErrors"], false);
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["types"][0]["name"], "Point");
    assert_eq!(json["types"][0]["capturedFields"][1]["backing_field_name"], "<Y>P");
    assert!(json.get("construction").is_none());
}

#[test]
fn test_json_report_omits_types_without_artifacts_flag() {
    let outcome = outcome(vec![point()]);

    let text = render_json(&outcome, false).expect("serializes");
    let json: serde_json::Value = serde_json::from_str(&text).expect("valid json");

    assert!(json.get("types").is_none());
}
