use primc_binder::{AnalysisResults, BinderOptions, CancellationToken, Compilation};
use primc_eval::{Interpreter, RecordingHost, RuntimeError, Value};
use primc_syntax::factory::*;
use primc_syntax::{BinaryOp, Modifiers, TypeDeclSyntax};

fn analyze(decls: Vec<TypeDeclSyntax>) -> AnalysisResults {
    Compilation::new(decls)
        .analyze(&BinderOptions::default(), &CancellationToken::new())
        .expect("analysis succeeds")
}

fn ordering_program() -> Vec<TypeDeclSyntax> {
    let f_body = block(vec![
        expr_stmt(invoke("Print", vec![name("s")])),
        ret(name("v")),
    ]);
    vec![
        class_decl("Base")
            .with_params(vec![param("v", "int")])
            .with_member(expr_property("V", "int", name("v")).with_modifiers(Modifiers::PUBLIC)),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base_with_args(
                "Base",
                vec![arg(invoke("F", vec![name("x"), string("b")]))],
            ))
            .with_member(field("f", "int").with_init(invoke("F", vec![name("x"), string("a")])))
            .with_member(
                method(
                    "F",
                    "int",
                    vec![param("v", "int"), param("s", "string")],
                    f_body,
                )
                .static_(),
            )
            .with_member(extern_method("Print", "void", vec![param("s", "string")])),
    ]
}

#[test]
fn test_point_sum_reads_captured_parameters() {
    let results = analyze(vec![
        class_decl("Point")
            .with_params(vec![param("X", "int"), param("Y", "int")])
            .with_member(expr_property("Sum", "int", add(name("X"), name("Y")))),
    ]);
    assert!(results.diagnostics().is_empty());
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let point = interp
        .construct("Point", vec![Value::Int(3), Value::Int(4)])
        .expect("constructed");
    assert_eq!(interp.get(&point, "Sum").expect("sum"), Value::Int(7));
    assert_eq!(point.field_names(), vec!["<X>P", "<Y>P"]);
}

#[test]
fn test_initializers_run_before_the_base_call() {
    let results = analyze(ordering_program());
    assert!(!results.has_errors());
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let object = interp.construct("C", vec![Value::Int(5)]).expect("constructed");
    assert_eq!(interp.get(&object, "f").expect("field"), Value::Int(5));
    assert_eq!(interp.get(&object, "V").expect("inherited"), Value::Int(5));
    assert_eq!(interp.into_host().into_output(), vec!["a", "b"]);
}

#[test]
fn test_print_order_is_stable_across_compilations() {
    let outputs: Vec<Vec<String>> = (0..3)
        .map(|_| {
            let results = analyze(ordering_program());
            let mut interp = Interpreter::new(&results, RecordingHost::new());
            interp.construct("C", vec![Value::Int(1)]).expect("constructed");
            interp.into_host().into_output()
        })
        .collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_captured_parameter_state_persists_between_calls() {
    let next = method(
        "Next",
        "int",
        vec![],
        block(vec![
            expr_stmt(assign(name("start"), add(name("start"), int(1)))),
            ret(name("start")),
        ]),
    )
    .with_modifiers(Modifiers::PUBLIC);
    let results = analyze(vec![
        class_decl("Counter")
            .with_params(vec![param("start", "int")])
            .with_member(next),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let counter = interp
        .construct("Counter", vec![Value::Int(10)])
        .expect("constructed");
    assert_eq!(interp.call(&counter, "Next", vec![]).expect("call"), Value::Int(11));
    assert_eq!(interp.call(&counter, "Next", vec![]).expect("call"), Value::Int(12));
    assert_eq!(counter.field("<start>P"), Some(Value::Int(12)));
}

#[test]
fn test_uncaptured_parameter_is_not_stored() {
    let results = analyze(vec![
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_member(
                field("Doubled", "int").with_init(binary(BinaryOp::Mul, name("x"), int(2))),
            ),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let object = interp.construct("C", vec![Value::Int(21)]).expect("constructed");
    assert_eq!(object.field_names(), vec!["Doubled"]);
    assert_eq!(interp.get(&object, "Doubled").expect("field"), Value::Int(42));
}

#[test]
fn test_explicit_constructor_chains_to_primary() {
    let results = analyze(vec![
        class_decl("P")
            .with_params(vec![param("x", "int"), param("y", "int")])
            .with_member(ctor(vec![], this_init(vec![arg(int(1)), arg(int(2))]), block(vec![])))
            .with_member(expr_property("Sum", "int", add(name("x"), name("y")))),
    ]);
    assert!(!results.has_errors());
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let object = interp.construct("P", vec![]).expect("constructed");
    assert_eq!(interp.get(&object, "Sum").expect("sum"), Value::Int(3));
}

#[test]
fn test_struct_default_constructor_zero_initializes() {
    let results = analyze(vec![
        struct_decl("S")
            .with_params(vec![param("x", "int"), param("flag", "bool")])
            .with_member(expr_property("X", "int", name("x")))
            .with_member(expr_property("Flag", "bool", name("flag"))),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let zero = interp.construct_default("S").expect("default");
    assert_eq!(interp.get(&zero, "X").expect("x"), Value::Int(0));
    assert_eq!(interp.get(&zero, "Flag").expect("flag"), Value::Bool(false));
    let set = interp
        .construct("S", vec![Value::Int(9), Value::Bool(true)])
        .expect("constructed");
    assert_eq!(interp.get(&set, "X").expect("x"), Value::Int(9));
}

#[test]
fn test_constructor_with_errors_is_not_run() {
    let results = analyze(vec![
        class_decl("B").with_params(vec![param("v", "int")]),
        class_decl("C")
            .with_params(vec![param("x", "int")])
            .with_base(base("B")),
    ]);
    assert!(results.has_errors());
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let err = interp
        .construct("C", vec![Value::Int(1)])
        .expect_err("constructor has errors");
    assert_eq!(
        err,
        RuntimeError::ConstructorUnavailable {
            type_name: "C".to_string()
        }
    );
}

#[test]
fn test_extern_methods_route_to_registered_host_functions() {
    let results = analyze(vec![
        class_decl("Dice")
            .with_member(extern_method("Random", "int", vec![]))
            .with_member(
                method("Roll", "int", vec![], expr_body(invoke("Random", vec![]))).static_(),
            ),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    assert_eq!(
        interp.call_static("Dice", "Roll", vec![]),
        Err(RuntimeError::MissingHostFunction {
            name: "Random".to_string()
        })
    );
    interp
        .host_mut()
        .register("Random", |_args: &[Value]| Ok(Value::Int(4)));
    assert_eq!(interp.call_static("Dice", "Roll", vec![]), Ok(Value::Int(4)));
}

#[test]
fn test_static_field_initializer_runs_once() {
    let results = analyze(vec![
        class_decl("Config")
            .with_member(field("Limit", "int").static_().with_init(int(3)))
            .with_member(
                method(
                    "Bump",
                    "int",
                    vec![],
                    block(vec![
                        expr_stmt(increment(name("Limit"))),
                        ret(name("Limit")),
                    ]),
                )
                .static_(),
            ),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    assert_eq!(interp.call_static("Config", "Bump", vec![]), Ok(Value::Int(4)));
    assert_eq!(interp.call_static("Config", "Bump", vec![]), Ok(Value::Int(5)));
}

#[test]
fn test_loops_and_locals() {
    let body = block(vec![
        local("total", int(0)),
        local("i", int(0)),
        while_(
            binary(BinaryOp::Lt, name("i"), name("n")),
            block_stmt(vec![
                expr_stmt(compound(
                    primc_syntax::AssignOp::Add,
                    name("total"),
                    name("i"),
                )),
                expr_stmt(increment(name("i"))),
            ]),
        ),
        ret(name("total")),
    ]);
    let results = analyze(vec![
        class_decl("M").with_member(method("Sum", "int", vec![param("n", "int")], body).static_()),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    assert_eq!(
        interp.call_static("M", "Sum", vec![Value::Int(5)]),
        Ok(Value::Int(10))
    );
}

#[test]
fn test_division_by_zero_is_a_runtime_error() {
    let results = analyze(vec![
        class_decl("D")
            .with_params(vec![param("d", "int")])
            .with_member(expr_property(
                "Ratio",
                "int",
                binary(BinaryOp::Div, int(10), name("d")),
            )),
    ]);
    let mut interp = Interpreter::new(&results, RecordingHost::new());
    let object = interp.construct("D", vec![Value::Int(0)]).expect("constructed");
    assert_eq!(interp.get(&object, "Ratio"), Err(RuntimeError::DivisionByZero));
}
