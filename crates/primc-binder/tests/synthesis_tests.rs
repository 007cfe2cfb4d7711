use primc_binder::{
    Accessibility, AnalysisResults, BinderOptions, CancellationToken, Compilation,
    ConstructorTarget, InitStep, ParamId,
};
use primc_common::DiagnosticCode;
use primc_syntax::factory::*;
use primc_syntax::{PassingMode, TypeDeclSyntax};

fn analyze(decls: Vec<TypeDeclSyntax>) -> AnalysisResults {
    Compilation::new(decls)
        .analyze(&BinderOptions::default(), &CancellationToken::new())
        .expect("analysis succeeds")
}

fn codes(results: &AnalysisResults) -> Vec<DiagnosticCode> {
    results.diagnostics().iter().map(|d| d.code).collect()
}

fn base_class() -> TypeDeclSyntax {
    class_decl("B")
        .with_params(vec![param("v", "int")])
        .with_member(method("V", "int", vec![], expr_body(name("v"))))
}

#[test]
fn test_plan_stores_fields_then_runs_initializers_then_calls_base() {
    let results = analyze(vec![
        base_class(),
        class_decl("C")
            .with_params(vec![param("x", "int"), param("y", "int")])
            .with_base(base_with_args("B", vec![arg(name("x"))]))
            .with_member(field("f", "int").with_init(name("x")))
            .with_member(field("s", "int").static_().with_init(int(1)))
            .with_member(method("M", "int", vec![], expr_body(name("y")))),
    ]);
    assert!(codes(&results).is_empty());
    let c = results.type_id("C").expect("type");
    let b = results.type_id("B").expect("type");
    let ctor = results.primary_constructor(c).expect("synthesized");
    assert_eq!(ctor.accessibility, Accessibility::Public);
    assert!(!ctor.has_errors);

    let steps: Vec<&str> = ctor
        .plan
        .steps
        .iter()
        .map(|s| match s {
            InitStep::StoreBackingField { field, .. } => field.as_str(),
            InitStep::RunInitializer { name, .. } => name.as_str(),
            InitStep::CallBase => "base",
            InitStep::ZeroInit => "zero",
        })
        .collect();
    assert_eq!(steps, vec!["<y>P", "f", "base"]);

    let call = ctor.base_or_this_call.as_ref().expect("base call");
    assert_eq!(call.target, Some(ConstructorTarget::Primary(b)));
    assert_eq!(call.arguments.len(), 1);
    assert_eq!(call.arguments[0].0, PassingMode::Value);
    assert_eq!(
        ctor.captured_parameters.iter().copied().collect::<Vec<_>>(),
        vec![ParamId { owner: c, ordinal: 1 }]
    );
}

#[test]
fn test_abstract_type_gets_protected_constructor() {
    let results = analyze(vec![
        class_decl("A")
            .abstract_()
            .with_params(vec![param("x", "int")])
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
    ]);
    let a = results.type_id("A").expect("type");
    let ctor = results.primary_constructor(a).expect("synthesized");
    assert_eq!(ctor.accessibility, Accessibility::Protected);
    assert!(ctor.base_or_this_call.is_none());
}

#[test]
fn test_missing_base_constructor_is_reported_once() {
    let results = analyze(vec![
        base_class(),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base("B"))
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
    ]);
    assert_eq!(codes(&results), vec![DiagnosticCode::NoMatchingBaseConstructor]);
    let diag = &results.diagnostics()[0];
    assert_eq!(diag.arguments, vec!["B", "0"]);
    let c = results.type_id("C").expect("type");
    let ctor = results.primary_constructor(c).expect("synthesized");
    assert!(ctor.has_errors);
    assert_eq!(ctor.base_or_this_call.as_ref().expect("call").target, None);
}

#[test]
fn test_failed_base_suppresses_cascading_base_errors() {
    let results = analyze(vec![
        class_decl("B")
            .partial()
            .with_params(vec![param("v", "int")]),
        class_decl("B")
            .partial()
            .with_params(vec![param("w", "int")]),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base_with_args("B", vec![arg(name("x")), arg(name("x"))])),
    ]);
    assert!(!codes(&results).contains(&DiagnosticCode::NoMatchingBaseConstructor));
}

#[test]
fn test_external_base_gets_an_unresolved_call() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("msg", "string")])
            .with_base(base_with_args("Exception", vec![arg(name("msg"))])),
    ]);
    assert!(codes(&results).is_empty());
    let c = results.type_id("C").expect("type");
    let call = results
        .primary_constructor(c)
        .and_then(|ctor| ctor.base_or_this_call.as_ref())
        .expect("base call");
    assert_eq!(call.target, None);
    assert_eq!(call.base_type.to_string(), "Exception");
}

#[test]
fn test_interface_only_base_list_has_no_base_call() {
    let results = analyze(vec![
        interface_decl("I"),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base("I"))
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
    ]);
    let c = results.type_id("C").expect("type");
    let ctor = results.primary_constructor(c).expect("synthesized");
    assert!(ctor.base_or_this_call.is_none());
    assert_eq!(ctor.plan.steps.len(), 1);
}

#[test]
fn test_struct_gets_default_constructor_unless_declared() {
    let results = analyze(vec![
        struct_decl("S")
            .with_params(vec![param("x", "int")])
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
        struct_decl("T")
            .with_params(vec![param("x", "int")])
            .with_member(ctor(vec![], this_init(vec![arg(int(0))]), block(vec![])))
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
        struct_decl("U").with_params(vec![]),
    ]);
    let s = results.type_id("S").expect("type");
    let default = results.default_constructor(s).expect("default");
    assert_eq!(default.plan.steps, vec![InitStep::ZeroInit]);
    assert!(results.default_constructor(results.type_id("T").expect("type")).is_none());
    let u = results.type_id("U").expect("type");
    assert!(results.default_constructor(u).is_none());
    assert!(results.primary_constructor(u).is_some());
}

#[test]
fn test_blocked_type_is_resolved_but_not_synthesized() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("x", "int"), param("x", "int")])
            .with_member(method("M", "int", vec![], expr_body(name("x")))),
    ]);
    let c = results.type_id("C").expect("type");
    assert!(results.primary_constructor(c).is_none());
    assert!(results.captured_fields(c).is_empty());
    let analysis = results.type_analysis(c).expect("analysed");
    assert_eq!(analysis.occurrences.len(), 1);
    assert_eq!(codes(&results), vec![DiagnosticCode::DuplicateParameterName]);
}
