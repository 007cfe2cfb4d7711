use primc_binder::{Compilation, ConstructorTarget, MemberKind, SymbolTable, TypeId};
use primc_common::DiagnosticCode;
use primc_syntax::factory::*;
use primc_syntax::{PassingMode, TypeDeclSyntax, number_nodes};

fn build(mut decls: Vec<TypeDeclSyntax>) -> SymbolTable {
    number_nodes(&mut decls);
    SymbolTable::build(&decls)
}

fn codes(table: &SymbolTable) -> Vec<DiagnosticCode> {
    table.diagnostics().iter().map(|d| d.code).collect()
}

fn id(table: &SymbolTable, name: &str) -> TypeId {
    table.lookup_type(name, None).expect("type declared")
}

#[test]
fn test_partial_parts_merge_and_share_one_parameter_list() {
    let table = build(vec![
        class_decl("C").partial().with_member(field("a", "int")),
        class_decl("C")
            .partial()
            .with_params(vec![param("x", "int")])
            .with_member(field("b", "int")),
    ]);
    assert!(table.diagnostics().is_empty());
    let c = table.get(id(&table, "C")).expect("symbol");
    assert_eq!(c.parts.len(), 2);
    assert_eq!(c.primary_part, Some(1));
    assert_eq!(c.parameters().len(), 1);
    let names: Vec<&str> = c.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_second_non_empty_parameter_list_blocks_synthesis() {
    let table = build(vec![
        class_decl("C").partial().with_params(vec![param("x", "int")]),
        class_decl("C").partial().with_params(vec![param("y", "int")]),
    ]);
    assert_eq!(codes(&table), vec![DiagnosticCode::MultipleRecordParameterLists]);
    let c = table.get(id(&table, "C")).expect("symbol");
    assert!(c.synthesis_blocked);
    assert_eq!(c.parameters()[0].name, "x");
}

#[test]
fn test_empty_second_parameter_list_is_tolerated() {
    let table = build(vec![
        class_decl("C").partial().with_params(vec![]),
        class_decl("C").partial().with_params(vec![param("y", "int")]),
    ]);
    assert!(table.diagnostics().is_empty());
    let c = table.get(id(&table, "C")).expect("symbol");
    assert_eq!(c.primary_part, Some(1));
}

#[test]
fn test_parameter_list_on_interface_and_static_class() {
    let table = build(vec![
        interface_decl("I").with_params(vec![param("x", "int")]),
        class_decl("S").static_().with_params(vec![param("x", "int")]),
    ]);
    assert_eq!(
        codes(&table),
        vec![
            DiagnosticCode::UnexpectedParameterList,
            DiagnosticCode::ConstructorInStaticClass
        ]
    );
    assert!(table.types().iter().all(|t| t.synthesis_blocked));
}

#[test]
fn test_duplicate_parameter_and_non_constant_default() {
    let table = build(vec![class_decl("C").with_params(vec![
        param("x", "int"),
        param("x", "int"),
        param("y", "int").with_default(invoke("F", vec![])),
    ])]);
    assert_eq!(
        codes(&table),
        vec![
            DiagnosticCode::DuplicateParameterName,
            DiagnosticCode::DefaultValueMustBeConstant
        ]
    );
}

#[test]
fn test_explicit_constructors_must_chain_to_this() {
    let table = build(vec![
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_member(ctor(vec![], this_init(vec![arg(int(0))]), block(vec![])))
            .with_member(ctor(vec![param("s", "string")], None, block(vec![]))),
    ]);
    assert_eq!(
        codes(&table),
        vec![DiagnosticCode::InstanceConstructorMustHaveThisInitializer]
    );
}

#[test]
fn test_constructor_with_primary_signature_already_exists() {
    let table = build(vec![
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_member(ctor(vec![param("y", "int")], this_init(vec![]), block(vec![]))),
    ]);
    assert_eq!(codes(&table), vec![DiagnosticCode::MemberAlreadyExists]);
    assert!(table.get(id(&table, "C")).expect("symbol").synthesis_blocked);
}

#[test]
fn test_argument_list_rules() {
    let table = build(vec![
        interface_decl("I"),
        class_decl("B").with_params(vec![param("v", "int")]),
        class_decl("C").with_base(base_with_args("I", vec![])),
        struct_decl("S")
            .with_params(vec![param("v", "int")])
            .with_base(base_with_args("B", vec![arg(name("v"))])),
        class_decl("D")
            .with_params(vec![param("v", "int")])
            .with_base(base_with_args("B", vec![arg(name("v"))])),
    ]);
    assert_eq!(
        codes(&table),
        vec![
            DiagnosticCode::UnexpectedArgumentList,
            DiagnosticCode::UnexpectedArgumentList
        ]
    );
    let d = table.get(id(&table, "D")).expect("symbol");
    assert_eq!(d.base_type, Some(id(&table, "B")));
}

#[test]
fn test_ref_like_instance_field_outside_ref_struct() {
    let table = build(vec![
        struct_decl("S").with_member(field("span", "Span")),
        struct_decl("R").ref_struct().with_member(field("span", "Span")),
        class_decl("C").with_member(field("s", "Span").static_()),
    ]);
    assert_eq!(codes(&table), vec![DiagnosticCode::FieldCantBeRefLike]);
}

#[test]
fn test_circular_bases_are_reported_and_cleared() {
    let table = build(vec![
        class_decl("A").with_base(base("B")),
        class_decl("B").with_base(base("A")),
        class_decl("C").with_base(base("A")),
    ]);
    assert_eq!(
        codes(&table),
        vec![DiagnosticCode::CircularBase, DiagnosticCode::CircularBase]
    );
    let a = table.get(id(&table, "A")).expect("symbol");
    assert_eq!(a.base_type, None);
    assert!(table.topological_levels().is_ok());
}

#[test]
fn test_topological_levels_place_bases_first() {
    let table = build(vec![
        class_decl("Derived").with_base(base("Mid")),
        class_decl("Mid").with_base(base("Root")),
        class_decl("Root"),
        class_decl("Other"),
    ]);
    let levels = table.topological_levels().expect("acyclic");
    let names: Vec<Vec<&str>> = levels
        .iter()
        .map(|level| {
            level
                .iter()
                .map(|t| table.get(*t).expect("symbol").name.as_str())
                .collect()
        })
        .collect();
    assert_eq!(names, vec![vec!["Root", "Other"], vec!["Mid"], vec!["Derived"]]);
}

#[test]
fn test_inherited_lookup_skips_private_base_members() {
    let table = build(vec![
        class_decl("B")
            .with_member(field("hidden", "int"))
            .with_member(field("shown", "int").with_modifiers(primc_syntax::Modifiers::PROTECTED)),
        class_decl("C").with_base(base("B")),
    ]);
    let c = id(&table, "C");
    assert!(table.lookup_member(c, "hidden").is_none());
    let shown = table.lookup_member(c, "shown").expect("inherited");
    assert_eq!(shown.kind, MemberKind::Field);
}

#[test]
fn test_member_lookup_outlives_the_queried_name() {
    let table = build(vec![
        class_decl("B").with_member(field("count", "int").with_modifiers(primc_syntax::Modifiers::PROTECTED)),
        class_decl("C").with_base(base("B")).with_member(field("own", "int")),
    ]);
    let c = id(&table, "C");
    let found = {
        let own = String::from("own");
        let inherited = String::from("count");
        let found = (table.lookup_member(c, &own), table.all_members_named(c, &inherited));
        drop(own);
        found
    };
    assert_eq!(found.0.expect("own member").kind, MemberKind::Field);
    assert_eq!(found.1.len(), 1);
    assert_eq!(found.1[0].name, "count");
}

#[test]
fn test_select_constructor_prefers_primary_then_explicit() {
    let table = build(vec![
        class_decl("P").with_params(vec![param("x", "int")]).with_member(ctor(
            vec![],
            this_init(vec![arg(int(1))]),
            block(vec![]),
        )),
        class_decl("E"),
        class_decl("R").with_params(vec![ref_param("r", "int")]),
    ]);
    let p = id(&table, "P");
    assert_eq!(
        table.select_constructor(p, &[PassingMode::Value]),
        Some(ConstructorTarget::Primary(p))
    );
    assert!(matches!(
        table.select_constructor(p, &[]),
        Some(ConstructorTarget::Explicit(_))
    ));
    let e = id(&table, "E");
    assert_eq!(table.select_constructor(e, &[]), Some(ConstructorTarget::Implicit(e)));
    assert_eq!(table.select_constructor(e, &[PassingMode::Value]), None);
    let r = id(&table, "R");
    assert_eq!(table.select_constructor(r, &[PassingMode::Value]), None);
    assert!(table.select_constructor(r, &[PassingMode::Ref]).is_some());
}

#[test]
fn test_nested_types_resolve_from_inside_their_container() {
    let compilation = Compilation::new(vec![
        class_decl("Outer").with_member(nested(class_decl("Inner"))),
        class_decl("Inner"),
    ]);
    let table = compilation.symbols();
    let outer = id(table, "Outer");
    let nested_inner = table.lookup_type("Inner", Some(outer)).expect("nested");
    assert_ne!(Some(nested_inner), table.lookup_type("Inner", None));
    assert_eq!(table.get(nested_inner).expect("symbol").containing, Some(outer));
}
