use primc_binder::{
    AnalysisError, AnalysisResults, BinderOptions, Binding, CancellationToken, CaptureDecision,
    Compilation, MemberRef, ParamId,
};
use primc_common::DiagnosticCode;
use primc_syntax::factory::*;
use primc_syntax::{Body, TypeDeclSyntax};

fn analyze(decls: Vec<TypeDeclSyntax>) -> AnalysisResults {
    Compilation::new(decls)
        .analyze(&BinderOptions::default(), &CancellationToken::new())
        .expect("analysis succeeds")
}

fn codes(results: &AnalysisResults) -> Vec<DiagnosticCode> {
    results.diagnostics().iter().map(|d| d.code).collect()
}

fn codes_for(results: &AnalysisResults, ty: &str) -> Vec<DiagnosticCode> {
    results
        .diagnostics()
        .iter()
        .filter(|d| d.location.type_name == ty)
        .map(|d| d.code)
        .collect()
}

fn bindings_named(results: &AnalysisResults, ty: &str, ident: &str) -> Vec<Binding> {
    let id = results.type_id(ty).expect("type");
    results
        .type_analysis(id)
        .expect("analysed")
        .occurrences
        .iter()
        .filter(|b| b.occurrence.name == ident)
        .map(|b| b.resolution.binding.clone())
        .collect()
}

fn class_with(params: Vec<primc_syntax::ParameterSyntax>, members: Vec<primc_syntax::MemberSyntax>) -> TypeDeclSyntax {
    class_decl("C").with_params(params).with_members(members)
}

fn returns(expr: primc_syntax::Expr) -> Body {
    expr_body(expr)
}

#[test]
fn test_member_reference_captures_and_binds_backing_field() {
    let results = analyze(vec![
        class_decl("Point")
            .with_params(vec![param("X", "int"), param("Y", "int")])
            .with_member(expr_property("Sum", "int", add(name("X"), name("Y")))),
    ]);
    let point = results.type_id("Point").expect("type");
    assert_eq!(results.captured_parameter_names(point), vec!["X", "Y"]);
    let fields = results.captured_fields(point);
    assert_eq!(fields[0].backing_field_name, "<X>P");
    assert!(!fields[0].is_readonly);
    assert_eq!(
        bindings_named(&results, "Point", "X"),
        vec![Binding::Member(MemberRef::BackingField(ParamId {
            owner: point,
            ordinal: 0
        }))]
    );
    assert!(results.diagnostics().is_empty());
}

#[test]
fn test_constructor_scope_use_does_not_capture() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![
            field("f", "int").with_init(add(name("x"), int(1))).into(),
            auto_property("P", "int", &[primc_syntax::AccessorKind::Get])
                .with_init(name("x"))
                .into(),
        ],
    )]);
    let c = results.type_id("C").expect("type");
    assert!(results.captured_fields(c).is_empty());
    let analysis = results.type_analysis(c).expect("analysed");
    assert_eq!(
        analysis.decision(ParamId { owner: c, ordinal: 0 }),
        Some(CaptureDecision::NotCaptured)
    );
    assert!(
        bindings_named(&results, "C", "x")
            .iter()
            .all(|b| matches!(b, Binding::Parameter(_)))
    );
}

#[test]
fn test_nameof_is_a_read_but_never_a_capture() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![method("Name", "string", vec![], returns(nameof(name("x")))).into()],
    )]);
    let c = results.type_id("C").expect("type");
    assert!(results.captured_fields(c).is_empty());
    assert!(codes(&results).is_empty());
    assert_eq!(
        bindings_named(&results, "C", "x"),
        vec![Binding::ParameterName(ParamId { owner: c, ordinal: 0 })]
    );
}

#[test]
fn test_nameof_accepts_ref_and_ref_like_parameters() {
    let results = analyze(vec![
        struct_decl("S")
            .ref_struct()
            .with_params(vec![ref_param("r", "int"), param("span", "Span")])
            .with_member(method("RefName", "string", vec![], returns(nameof(name("r")))))
            .with_member(method("SpanName", "string", vec![], returns(nameof(name("span"))))),
    ]);
    let s = results.type_id("S").expect("type");
    assert!(results.captured_fields(s).is_empty());
    assert!(codes(&results).is_empty());
    assert_eq!(
        bindings_named(&results, "S", "r"),
        vec![Binding::ParameterName(ParamId { owner: s, ordinal: 0 })]
    );
}

#[test]
fn test_nameof_in_lambda_and_local_function_does_not_capture() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![
            method(
                "M",
                "string",
                vec![],
                block(vec![
                    local_function("Inner", vec![], returns(nameof(name("x")))),
                    local("f", lambda(vec![], returns(nameof(name("x"))))),
                    ret(invoke("Inner", vec![])),
                ]),
            )
            .into(),
        ],
    )]);
    let c = results.type_id("C").expect("type");
    assert!(results.captured_fields(c).is_empty());
    assert!(codes(&results).is_empty());
    let p = ParamId { owner: c, ordinal: 0 };
    assert_eq!(
        bindings_named(&results, "C", "x"),
        vec![Binding::ParameterName(p), Binding::ParameterName(p)]
    );
}

#[test]
fn test_unread_parameter_is_reported() {
    let results = analyze(vec![class_with(vec![param("unused", "int")], vec![])]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::UnreadPrimaryConstructorParameter]
    );
    let quiet = Compilation::new(vec![class_with(vec![param("unused", "int")], vec![])])
        .analyze(
            &BinderOptions {
                report_unread_parameters: false,
                ..BinderOptions::default()
            },
            &CancellationToken::new(),
        )
        .expect("analysis");
    assert!(quiet.diagnostics().is_empty());
}

#[test]
fn test_only_the_unread_parameter_is_reported() {
    let results = analyze(vec![class_with(
        vec![param("a", "int"), param("b", "int"), param("c", "int")],
        vec![
            expr_property("A", "int", name("a")).into(),
            field("f", "int").with_init(name("c")).into(),
        ],
    )]);
    let unread: Vec<_> = results
        .diagnostics()
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnreadPrimaryConstructorParameter)
        .collect();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].arguments, vec!["b".to_string()]);
}

#[test]
fn test_lambda_in_base_arguments_captures() {
    let results = analyze(vec![
        class_decl("B")
            .with_params(vec![param("f", "Func")])
            .with_member(method("Run", "int", vec![], returns(call(name("f"), vec![])))),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base_with_args("B", vec![arg(lambda(vec![], returns(name("x"))))])),
    ]);
    let c = results.type_id("C").expect("type");
    assert_eq!(results.captured_parameter_names(c), vec!["x"]);
    assert_eq!(
        bindings_named(&results, "C", "x"),
        vec![Binding::Member(MemberRef::BackingField(ParamId { owner: c, ordinal: 0 }))]
    );
}

#[test]
fn test_base_and_initializer_lambdas_share_one_backing_field() {
    let results = analyze(vec![
        class_decl("B")
            .with_params(vec![param("f", "Func")])
            .with_member(method("Run", "int", vec![], returns(call(name("f"), vec![])))),
        class_decl("C")
            .with_params(vec![param("X", "int")])
            .with_base(base_with_args(
                "B",
                vec![arg(lambda(vec![], returns(add(int(100), increment(name("X"))))))],
            ))
            .with_member(
                field("Y", "Func").with_init(lambda(vec![], returns(add(int(200), increment(name("X")))))),
            )
            .with_member(
                field("Z", "Func").with_init(lambda(vec![], returns(add(int(300), increment(name("X")))))),
            ),
    ]);
    let c = results.type_id("C").expect("type");
    assert_eq!(results.captured_parameter_names(c), vec!["X"]);
    let field = Binding::Member(MemberRef::BackingField(ParamId { owner: c, ordinal: 0 }));
    assert_eq!(
        bindings_named(&results, "C", "X"),
        vec![field.clone(), field.clone(), field]
    );
    assert!(codes_for(&results, "C").is_empty());
}

#[test]
fn test_initializer_lambda_keeps_uncaptured_parameter() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![field("f", "Func").with_init(lambda(vec![], returns(name("x")))).into()],
    )]);
    let c = results.type_id("C").expect("type");
    assert!(results.captured_fields(c).is_empty());
    assert_eq!(
        bindings_named(&results, "C", "x"),
        vec![Binding::Parameter(ParamId { owner: c, ordinal: 0 })]
    );
}

#[test]
fn test_deeply_nested_reference_still_captures() {
    let mut body = name("x");
    for _ in 0..600 {
        body = add(body, int(0));
    }
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![expr_property("Deep", "int", body).into()],
    )]);
    let c = results.type_id("C").expect("type");
    assert_eq!(results.captured_parameter_names(c), vec!["x"]);
    assert!(results.diagnostics().is_empty());
}

#[test]
fn test_lambdas_and_local_functions_in_members_capture() {
    let results = analyze(vec![class_with(
        vec![param("a", "int"), param("b", "int")],
        vec![
            method(
                "M",
                "int",
                vec![],
                block(vec![
                    local_function("Inner", vec![], returns(name("a"))),
                    local("f", lambda(vec![param("b", "int")], returns(name("b")))),
                    ret(invoke("Inner", vec![])),
                ]),
            )
            .into(),
        ],
    )]);
    let c = results.type_id("C").expect("type");
    // `b` inside the lambda is the lambda's own parameter.
    assert_eq!(results.captured_parameter_names(c), vec!["a"]);
    assert_eq!(codes(&results), vec![DiagnosticCode::UnreadPrimaryConstructorParameter]);
}

#[test]
fn test_static_lambda_cannot_see_parameters() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![
            method(
                "M",
                "int",
                vec![],
                block(vec![
                    local("f", static_lambda(vec![], returns(name("x")))),
                    ret(int(0)),
                ]),
            )
            .into(),
        ],
    )]);
    let c = results.type_id("C").expect("type");
    assert!(results.captured_fields(c).is_empty());
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::InvalidPrimaryConstructorParameterReference]
    );
}

#[test]
fn test_static_member_reference_is_invalid() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![method("S", "int", vec![], returns(name("x"))).static_().into()],
    )]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::InvalidPrimaryConstructorParameterReference]
    );
}

#[test]
fn test_by_ref_and_ref_like_parameters_are_rejected_in_members() {
    let results = analyze(vec![
        struct_decl("S")
            .ref_struct()
            .with_params(vec![ref_param("r", "int"), param("span", "Span")])
            .with_member(method("M", "int", vec![], returns(add(name("r"), name("span"))))),
    ]);
    let s = results.type_id("S").expect("type");
    assert!(results.captured_fields(s).is_empty());
    let analysis = results.type_analysis(s).expect("analysed");
    assert_eq!(
        analysis.decision(ParamId { owner: s, ordinal: 0 }),
        Some(CaptureDecision::Rejected)
    );
    assert_eq!(
        codes(&results),
        vec![
            DiagnosticCode::UnsupportedCapturingRef,
            DiagnosticCode::UnsupportedCapturingRefLike
        ]
    );
}

#[test]
fn test_ref_parameter_in_initializer_is_fine() {
    let results = analyze(vec![class_with(
        vec![in_param("v", "int")],
        vec![field("f", "int").with_init(name("v")).into()],
    )]);
    assert!(results.diagnostics().is_empty());
}

#[test]
fn test_captured_parameter_in_initializer_warns_and_reads_parameter() {
    let results = analyze(vec![class_with(
        vec![param("x", "int")],
        vec![
            field("f", "int").with_init(name("x")).into(),
            method("M", "int", vec![], returns(name("x"))).into(),
        ],
    )]);
    let c = results.type_id("C").expect("type");
    let p = ParamId { owner: c, ordinal: 0 };
    assert_eq!(
        bindings_named(&results, "C", "x"),
        vec![
            Binding::Parameter(p),
            Binding::Member(MemberRef::BackingField(p))
        ]
    );
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::CapturedParameterInFieldInitializer]
    );
}

#[test]
fn test_analysis_is_idempotent_and_schedule_independent() {
    let decls = || {
        vec![
            class_decl("Base")
                .with_params(vec![param("v", "int")])
                .with_member(method("Get", "int", vec![], returns(name("v")))),
            class_decl("Left")
                .with_params(vec![param("a", "int"), param("b", "int")])
                .with_base(base_with_args("Base", vec![arg(name("a"))]))
                .with_member(method("M", "int", vec![], returns(name("b")))),
            class_decl("Right")
                .with_params(vec![param("c", "int")])
                .with_base(base_with_args("Base", vec![arg(name("c"))]))
                .with_member(method("N", "int", vec![], returns(name("c")))),
        ]
    };
    let compilation = Compilation::new(decls());
    let sequential = BinderOptions {
        parallel: false,
        ..BinderOptions::default()
    };
    let first = compilation
        .analyze(&BinderOptions::default(), &CancellationToken::new())
        .expect("parallel");
    let second = compilation
        .analyze(&sequential, &CancellationToken::new())
        .expect("sequential");
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(first.bindings(), second.bindings());
    for ty in first.type_analyses() {
        assert_eq!(
            ty.capture_decisions,
            second.type_analysis(ty.type_id).expect("same types").capture_decisions
        );
    }
    assert_eq!(
        codes(&first),
        vec![DiagnosticCode::CapturedParameterPassedToBase]
    );
}

#[test]
fn test_cancelled_run_publishes_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let result = Compilation::new(vec![class_with(vec![param("x", "int")], vec![])])
        .analyze(&BinderOptions::default(), &token);
    assert_eq!(result.err(), Some(AnalysisError::Cancelled));
}
