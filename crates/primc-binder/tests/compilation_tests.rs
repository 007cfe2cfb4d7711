use primc_binder::{
    AnalysisResults, BinderOptions, Binding, CancellationToken, CaptureDecision, Compilation,
    ConstructorTarget, MemberRef, ParamId, ResolutionContext, ResolutionPhase, ScopeKind,
};
use primc_common::DiagnosticCode;
use primc_syntax::factory::*;
use primc_syntax::TypeDeclSyntax;

fn analyze_with(decls: Vec<TypeDeclSyntax>, options: &BinderOptions) -> AnalysisResults {
    Compilation::new(decls)
        .analyze(options, &CancellationToken::new())
        .expect("analysis succeeds")
}

fn analyze(decls: Vec<TypeDeclSyntax>) -> AnalysisResults {
    analyze_with(decls, &BinderOptions::default())
}

fn point() -> TypeDeclSyntax {
    class_decl("Point")
        .with_params(vec![param("X", "int"), param("Y", "int")])
        .with_member(expr_property("Sum", "int", add(name("X"), name("Y"))))
}

#[test]
fn test_derived_type_declared_before_its_base() {
    let results = analyze(vec![
        class_decl("D")
            .with_params(vec![param("y", "int")])
            .with_base(base_with_args("B", vec![arg(name("y"))])),
        class_decl("B")
            .with_params(vec![param("v", "int")])
            .with_member(method("V", "int", vec![], expr_body(name("v")))),
    ]);
    assert!(results.diagnostics().is_empty());
    let b = results.type_id("B").expect("type");
    let d = results.type_id("D").expect("type");
    let call = results
        .primary_constructor(d)
        .and_then(|c| c.base_or_this_call.as_ref())
        .expect("base call");
    assert_eq!(call.target, Some(ConstructorTarget::Primary(b)));
    assert_eq!(results.captured_parameter_names(b), vec!["v"]);
    assert!(results.captured_fields(d).is_empty());
}

#[test]
fn test_diagnostics_are_sorted_by_type_name() {
    let results = analyze(vec![
        class_decl("Zed").with_params(vec![param("z", "int")]),
        class_decl("Alpha").with_params(vec![param("a", "int")]),
    ]);
    let owners: Vec<&str> = results
        .diagnostics()
        .iter()
        .map(|d| d.location.type_name.as_str())
        .collect();
    assert_eq!(owners, vec!["Alpha", "Zed"]);
    assert!(!results.has_errors());
}

#[test]
fn test_results_resolver_answers_final_queries() {
    let options = BinderOptions::default();
    let results = analyze_with(vec![point()], &options);
    let id = results.type_id("Point").expect("type");
    let resolver = results.resolver(&options);

    let member = ResolutionContext::new(id, ScopeKind::InstanceMember, ResolutionPhase::Final);
    assert_eq!(
        resolver.resolve("Y", &member).binding,
        Binding::Member(MemberRef::BackingField(ParamId { owner: id, ordinal: 1 }))
    );
    assert_eq!(resolver.resolve("Missing", &member).binding, Binding::NotInScope);

    let statics = ResolutionContext::new(id, ScopeKind::StaticMember, ResolutionPhase::Final);
    assert!(matches!(
        resolver.resolve("X", &statics).binding,
        Binding::InvalidContext(_)
    ));
}

#[test]
fn test_bindings_cover_every_recorded_occurrence() {
    let results = analyze(vec![point()]);
    let id = results.type_id("Point").expect("type");
    let analysis = results.type_analysis(id).expect("analysed");
    assert_eq!(analysis.occurrences.len(), 2);
    for bound in &analysis.occurrences {
        assert_eq!(results.binding(bound.occurrence.node), Some(&bound.resolution));
    }
    assert_eq!(results.bindings().len(), 2);
}

#[test]
fn test_nested_types_are_analysed_with_their_own_parameters() {
    let results = analyze(vec![
        class_decl("Outer")
            .with_params(vec![param("a", "int")])
            .with_member(method("A", "int", vec![], expr_body(name("a"))))
            .with_member(nested(
                class_decl("Inner")
                    .with_params(vec![param("b", "int")])
                    .with_member(method("B", "int", vec![], expr_body(name("b")))),
            )),
    ]);
    assert!(results.diagnostics().is_empty());
    let outer = results.type_id("Outer").expect("type");
    let inner = results
        .symbols()
        .lookup_type("Inner", Some(outer))
        .expect("nested type");
    assert_eq!(results.captured_parameter_names(outer), vec!["a"]);
    assert_eq!(results.captured_parameter_names(inner), vec!["b"]);
    assert_eq!(results.type_analyses().count(), 2);
}

#[test]
fn test_type_analysis_serializes_to_camel_case_json() {
    let results = analyze(vec![point()]);
    let id = results.type_id("Point").expect("type");
    let analysis = results.type_analysis(id).expect("analysed");
    let json = serde_json::to_value(analysis).expect("serializes");
    assert_eq!(json["name"], "Point");
    assert_eq!(json["capturedFields"][0]["backing_field_name"], "<X>P");
    assert_eq!(json["captureDecisions"][1][1], "captured");
    assert_eq!(json["primaryConstructor"]["accessibility"], "public");
    assert!(json.get("occurrences").is_none());
}

#[test]
fn test_sequential_and_parallel_runs_agree() {
    let decls = || {
        vec![
            point(),
            class_decl("B")
                .with_params(vec![param("v", "int")])
                .with_member(method("V", "int", vec![], expr_body(name("v")))),
            class_decl("C")
                .with_params(vec![param("x", "int")])
                .with_base(base_with_args("B", vec![arg(name("x"))]))
                .with_member(method("M", "int", vec![], expr_body(name("x")))),
            struct_decl("S").with_params(vec![param("s", "S")]).with_member(method(
                "M",
                "S",
                vec![],
                expr_body(name("s")),
            )),
        ]
    };
    let parallel = analyze(decls());
    let sequential = analyze_with(
        decls(),
        &BinderOptions {
            parallel: false,
            ..BinderOptions::default()
        },
    );
    assert_eq!(parallel.diagnostics(), sequential.diagnostics());
    let codes: Vec<DiagnosticCode> = parallel.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            DiagnosticCode::CapturedParameterPassedToBase,
            DiagnosticCode::StructLayoutCyclePrimaryConstructorParameter,
        ]
    );
    for name in ["Point", "B", "C", "S"] {
        let a = parallel.type_id(name).expect("type");
        let b = sequential.type_id(name).expect("type");
        assert_eq!(
            parallel.type_analysis(a).map(|t| t.capture_decisions.clone()),
            sequential.type_analysis(b).map(|t| t.capture_decisions.clone())
        );
    }
    let c = parallel.type_id("C").expect("type");
    assert_eq!(
        parallel
            .type_analysis(c)
            .and_then(|t| t.decision(ParamId { owner: c, ordinal: 0 })),
        Some(CaptureDecision::Captured)
    );
}
