use primc_binder::{AnalysisResults, BinderOptions, CancellationToken, Compilation};
use primc_common::{DiagnosticCategory, DiagnosticCode};
use primc_syntax::factory::*;
use primc_syntax::{AccessorKind, Modifiers, TypeDeclSyntax};

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

fn unit_method(method_name: &str, statements: Vec<primc_syntax::Stmt>) -> primc_syntax::MethodSyntax {
    method(method_name, "void", vec![], block(statements))
}

// =============================================================================
// Readonly
// =============================================================================

#[test]
fn test_readonly_struct_rejects_writes_to_captured_parameter() {
    let results = analyze(vec![
        struct_decl("S")
            .readonly()
            .with_params(vec![param("x", "int")])
            .with_member(unit_method("Set", vec![expr_stmt(assign(name("x"), int(1)))]))
            .with_member(unit_method("Bump", vec![expr_stmt(increment(name("x")))])),
    ]);
    assert_eq!(
        codes(&results),
        vec![
            DiagnosticCode::AssignReadonlyPrimaryConstructorParameter,
            DiagnosticCode::AssignReadonlyPrimaryConstructorParameter
        ]
    );
    let s = results.type_id("S").expect("type");
    assert!(results.captured_fields(s)[0].is_readonly);
}

#[test]
fn test_readonly_struct_rejects_writes_through_value_type_parameter() {
    let results = analyze(vec![
        struct_decl("P").with_member(field("F", "int").with_modifiers(Modifiers::PUBLIC)),
        struct_decl("S")
            .readonly()
            .with_params(vec![param("p", "P"), param("o", "object")])
            .with_member(unit_method(
                "Set",
                vec![
                    expr_stmt(assign(member(name("p"), "F"), int(1))),
                    expr_stmt(assign(member(name("o"), "F"), int(1))),
                ],
            )),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AssignReadonlyPrimaryConstructorParameter2]
    );
}

#[test]
fn test_readonly_struct_write_through_reference_field_is_allowed() {
    let results = analyze(vec![
        class_decl("R").with_member(field("F", "int").with_modifiers(Modifiers::PUBLIC)),
        struct_decl("P")
            .with_member(field("r", "R").with_modifiers(Modifiers::PUBLIC))
            .with_member(field("n", "int").with_modifiers(Modifiers::PUBLIC)),
        struct_decl("S")
            .readonly()
            .with_params(vec![param("p", "P")])
            .with_member(unit_method(
                "Set",
                vec![
                    expr_stmt(assign(member(member(name("p"), "r"), "F"), int(1))),
                    expr_stmt(assign(member(name("p"), "n"), int(1))),
                ],
            )),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AssignReadonlyPrimaryConstructorParameter2]
    );
    let written = &results.diagnostics()[0];
    assert_eq!(written.location.type_name, "S");
}

#[test]
fn test_readonly_struct_initializer_may_write_parameter() {
    let results = analyze(vec![
        struct_decl("S")
            .readonly()
            .with_params(vec![param("x", "int")])
            .with_member(
                field("f", "int")
                    .with_modifiers(Modifiers::READONLY)
                    .with_init(increment(name("x"))),
            )
            .with_member(method("Get", "int", vec![], expr_body(name("x")))),
    ]);
    assert!(codes(&results).is_empty());
}

#[test]
fn test_readonly_struct_ref_argument_is_a_write() {
    let results = analyze(vec![
        struct_decl("S")
            .readonly()
            .with_params(vec![param("x", "int")])
            .with_member(method("Take", "void", vec![ref_param("v", "int")], block(vec![])))
            .with_member(unit_method(
                "Pass",
                vec![expr_stmt(call(name("Take"), vec![ref_arg(name("x"))]))],
            )),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AssignReadonlyPrimaryConstructorParameter]
    );
}

#[test]
fn test_readonly_member_of_mutable_struct_and_init_accessor() {
    let init_body = block(vec![expr_stmt(assign(name("x"), name("value")))]);
    let results = analyze(vec![
        struct_decl("S")
            .with_params(vec![param("x", "int")])
            .with_member(
                unit_method("Frozen", vec![expr_stmt(assign(name("x"), int(2)))]).readonly(),
            )
            .with_member(unit_method("Thawed", vec![expr_stmt(assign(name("x"), int(3)))]))
            .with_member(property(
                "X",
                "int",
                vec![accessor(AccessorKind::Init, Some(init_body)).readonly()],
            )),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AssignReadonlyPrimaryConstructorParameter]
    );
}

#[test]
fn test_class_parameters_are_mutable() {
    let results = analyze(vec![
        class_decl("C")
            .readonly()
            .with_params(vec![param("x", "int")])
            .with_member(unit_method("Set", vec![expr_stmt(assign(name("x"), int(1)))])),
    ]);
    assert!(codes(&results).is_empty());
}

// =============================================================================
// Lambdas and by-reference parameters
// =============================================================================

#[test]
fn test_ref_parameter_in_initializer_lambda() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![ref_param("r", "int")])
            .with_member(field("f", "Func").with_init(lambda(vec![], expr_body(name("r"))))),
    ]);
    assert_eq!(codes(&results), vec![DiagnosticCode::AnonDelegateCantUseRefParameter]);
}

#[test]
fn test_struct_parameter_in_member_lambda() {
    let results = analyze(vec![
        struct_decl("S").with_params(vec![param("x", "int")]).with_member(method(
            "F",
            "Func",
            vec![],
            expr_body(lambda(vec![], expr_body(name("x")))),
        )),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterInMember]
    );
}

#[test]
fn test_struct_captured_parameter_in_initializer_lambda() {
    let results = analyze(vec![
        struct_decl("S")
            .with_params(vec![param("y", "int")])
            .with_member(field("f", "Func").with_init(lambda(vec![], expr_body(name("y")))))
            .with_member(method("Get", "int", vec![], expr_body(name("y")))),
    ]);
    assert_eq!(
        codes(&results),
        vec![DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterCaptured]
    );
}

// =============================================================================
// Address-of
// =============================================================================

#[test]
fn test_address_of_captured_parameter_needs_fixed() {
    let results = analyze(vec![
        struct_decl("S")
            .with_params(vec![param("x", "int")])
            .with_member(unit_method(
                "Loose",
                vec![local("p", address_of(name("x")))],
            ))
            .with_member(unit_method(
                "Pinned",
                vec![fixed(
                    "q",
                    pointer(ty("int")),
                    address_of(name("x")),
                    block_stmt(vec![]),
                )],
            )),
    ]);
    assert_eq!(codes(&results), vec![DiagnosticCode::FixedNeeded]);
}

#[test]
fn test_fixed_on_uncaptured_parameter_is_not_needed() {
    let body = block(vec![fixed(
        "q",
        pointer(ty("int")),
        address_of(name("y")),
        block_stmt(vec![]),
    )]);
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("y", "int")])
            .with_member(field("f", "Action").with_init(lambda(vec![], body))),
    ]);
    assert_eq!(codes(&results), vec![DiagnosticCode::FixedNotNeeded]);
}

// =============================================================================
// Lock / using
// =============================================================================

#[test]
fn test_assignment_to_lock_subject_warns() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("gate", "object"), param("res", "object")])
            .with_member(unit_method(
                "M",
                vec![
                    lock(name("gate"), block_stmt(vec![expr_stmt(assign(name("gate"), null()))])),
                    using(name("res"), block_stmt(vec![expr_stmt(assign(name("gate"), null()))])),
                ],
            )),
    ]);
    let warnings: Vec<_> = results
        .diagnostics()
        .iter()
        .filter(|d| d.code == DiagnosticCode::AssignmentToLockOrDispose)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, DiagnosticCategory::Warning);
    assert_eq!(warnings[0].arguments, vec!["gate"]);
}

// =============================================================================
// Definite assignment of out parameters
// =============================================================================

#[test]
fn test_out_parameter_read_before_assignment() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![out_param("o", "int")])
            .with_member(field("a", "int").with_init(name("o"))),
    ]);
    assert_eq!(
        codes(&results),
        vec![
            DiagnosticCode::OutParameterUnassigned,
            DiagnosticCode::UseOfUnassignedOutParameter
        ]
    );
    let c = results.type_id("C").expect("type");
    assert!(results.primary_constructor(c).expect("synthesized").has_errors);
}

#[test]
fn test_out_parameter_assigned_then_read() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![out_param("o", "int")])
            .with_member(field("a", "int").with_init(assign(name("o"), int(1))))
            .with_member(field("b", "int").with_init(name("o"))),
    ]);
    assert!(codes(&results).is_empty());
    let c = results.type_id("C").expect("type");
    assert!(!results.primary_constructor(c).expect("synthesized").has_errors);
}

#[test]
fn test_conditional_assignment_does_not_count() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![out_param("o", "int"), param("flag", "bool")])
            .with_member(field("a", "int").with_init(conditional(
                name("flag"),
                assign(name("o"), int(1)),
                int(2),
            ))),
    ]);
    assert_eq!(codes(&results), vec![DiagnosticCode::OutParameterUnassigned]);
}

// =============================================================================
// Advisory warnings
// =============================================================================

fn base_with_value() -> TypeDeclSyntax {
    class_decl("B")
        .with_params(vec![param("v", "int")])
        .with_member(
            field("value", "int")
                .with_modifiers(Modifiers::PROTECTED)
                .with_init(name("v")),
        )
}

#[test]
fn test_parameter_hidden_by_inherited_member_warns() {
    let results = analyze(vec![
        base_with_value(),
        class_decl("C")
            .with_params(vec![param("value", "int")])
            .with_base(base_with_args("B", vec![arg(int(0))]))
            .with_member(method("M", "int", vec![], expr_body(name("value")))),
    ]);
    assert_eq!(
        codes_for(&results, "C"),
        vec![
            DiagnosticCode::UnreadPrimaryConstructorParameter,
            DiagnosticCode::CapturedParameterIsShadowedAndNotPassedToBase
        ]
    );
    let shadowed = results
        .diagnostics()
        .iter()
        .find(|d| d.code == DiagnosticCode::CapturedParameterIsShadowedAndNotPassedToBase)
        .expect("warning");
    assert_eq!(shadowed.arguments, vec!["value", "B"]);
}

#[test]
fn test_parameter_passed_to_base_is_not_reported_as_hidden() {
    let results = analyze(vec![
        base_with_value(),
        class_decl("C")
            .with_params(vec![param("value", "int")])
            .with_base(base_with_args("B", vec![arg(name("value"))]))
            .with_member(method("M", "int", vec![], expr_body(name("value")))),
    ]);
    assert!(codes_for(&results, "C").is_empty());
}

#[test]
fn test_static_base_member_does_not_hide_parameter() {
    let results = analyze(vec![
        class_decl("B").with_member(
            field("value", "int")
                .with_modifiers(Modifiers::PROTECTED)
                .static_(),
        ),
        class_decl("C")
            .with_params(vec![param("value", "int")])
            .with_base(base("B"))
            .with_member(method("M", "int", vec![], expr_body(name("value")))),
    ]);
    assert!(
        !codes_for(&results, "C")
            .contains(&DiagnosticCode::CapturedParameterIsShadowedAndNotPassedToBase)
    );
}

#[test]
fn test_advisory_warnings_can_be_disabled() {
    let decls = vec![
        class_decl("B").with_params(vec![param("v", "int")]).with_member(method(
            "Get",
            "int",
            vec![],
            expr_body(name("v")),
        )),
        class_decl("C")
            .with_params(vec![param("c", "int")])
            .with_base(base_with_args("B", vec![arg(name("c"))]))
            .with_member(method("N", "int", vec![], expr_body(name("c")))),
    ];
    let results = analyze(decls.clone());
    assert_eq!(codes(&results), vec![DiagnosticCode::CapturedParameterPassedToBase]);

    let quiet = Compilation::new(decls)
        .analyze(
            &BinderOptions {
                report_advisory_warnings: false,
                ..BinderOptions::default()
            },
            &CancellationToken::new(),
        )
        .expect("analysis");
    assert!(quiet.diagnostics().is_empty());
}

#[test]
fn test_name_not_in_context_in_default_values() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_member(method(
                "M",
                "int",
                vec![param("y", "int").with_default(name("x"))],
                expr_body(name("y")),
            )),
    ]);
    assert_eq!(
        codes(&results),
        vec![
            DiagnosticCode::UnreadPrimaryConstructorParameter,
            DiagnosticCode::NameNotInContext
        ]
    );
}
