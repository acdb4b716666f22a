use super::*;
use crate::lexer::scan;
use crate::parser::Parser;
use crate::{t_any, t_bool, t_float, t_int, t_nil, t_string};
use pretty_assertions::assert_eq;

fn parse(input: &str) -> Vec<Expr> {
    let (tokens, lex_errors) = scan(input);
    assert!(lex_errors.is_empty(), "lexer errors: {:?}", lex_errors);
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_program();
    assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
    ast
}

fn type_errors(input: &str) -> Vec<Diagnostic> {
    match check(&parse(input)) {
        Ok(_) => vec![],
        Err(errors) => errors,
    }
}

fn messages(input: &str) -> Vec<String> {
    type_errors(input).into_iter().map(|d| d.message).collect()
}

#[test]
fn test_literal_types() {
    let types = check(&parse("1 2.5 \"s\" true nil")).unwrap();
    assert_eq!(types, vec![t_int!(), t_float!(), t_string!(), t_bool!(), t_nil!()]);
}

#[test]
fn test_expression_types() {
    let types = check(&parse("1 + 2 * 3; 1.5 < 2.0; \"a\" + \"b\"; !(1 == 2); true and false")).unwrap();
    assert_eq!(types, vec![t_int!(), t_bool!(), t_string!(), t_bool!(), t_bool!()]);
}

#[test]
fn test_mixed_operands_are_rejected_once() {
    for source in ["1 + \"a\"", "true - 1", "x: int = \"a\"", "1 + 2.0"] {
        let errors = type_errors(source);
        assert_eq!(errors.len(), 1, "{}: {:?}", source, errors);
        assert_eq!(errors[0].kind, DiagnosticKind::Type);
    }
    assert_eq!(
        messages("1 + \"a\""),
        vec!["operands of '+' must have the same type, found int and string"]
    );
}

#[test]
fn test_operator_domains() {
    assert_eq!(messages("\"a\" - \"b\""), vec!["strings only support '+', found '-'"]);
    assert_eq!(messages("true < false"), vec!["operator '<' cannot be applied to bool"]);
    assert_eq!(messages("-true"), vec!["unary '-' expects int or float, found bool"]);
    assert_eq!(messages("!1"), vec!["unary '!' expects bool, found int"]);
    assert_eq!(messages("1 and true").len(), 1);
    // equality works on any matching pair
    assert!(messages("nil == nil; \"a\" != \"b\"").is_empty());
}

#[test]
fn test_errors_do_not_cascade() {
    // the undefined name is the only fault; the enclosing additions stay quiet
    assert_eq!(messages("x: int = (y + 1) * 2"), vec!["undefined variable 'y'"]);
}

#[test]
fn test_all_faults_are_collected() {
    let errors = type_errors("a: int = true\nb: string = 1\nc = 3\nd: bool = 1 < 2");
    let lines: Vec<usize> = errors.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
    assert_eq!(
        errors[1].to_string(),
        "[Line 2] Type Error: cannot initialize 'b' of type string with a value of type int"
    );
}

#[test]
fn test_declaration_needs_initializer() {
    assert_eq!(messages("x: int"), vec!["variable 'x' must be initialized"]);
    // the name is still bound, so later uses are not reported
    assert_eq!(messages("x: int\nx = 2").len(), 1);
}

#[test]
fn test_assignment_must_keep_the_type() {
    assert!(messages("x: int = 1; x = 2").is_empty());
    assert_eq!(
        messages("x: int = 1; x = 2.0"),
        vec!["cannot assign a value of type float to 'x' of type int"]
    );
}

#[test]
fn test_shadowing_in_blocks() {
    assert!(messages("x: int = 1; { x: string = \"s\"; y: string = x + \"!\" }; z: int = x + 1").is_empty());
    assert_eq!(messages("{ inner: int = 1 }; inner"), vec!["undefined variable 'inner'"]);
}

#[test]
fn test_conditions_must_be_bool() {
    assert_eq!(messages("if 1 { }"), vec!["'if' condition must be bool, found int"]);
    assert_eq!(messages("while \"s\" { }").len(), 1);
    assert_eq!(messages("for i: int = 0, i, i = i + 1 { }").len(), 1);
    assert!(messages("for i: int = 0, i < 3, i = i + 1 { }").is_empty());
}

#[test]
fn test_for_initializer_is_scoped_to_loop() {
    assert_eq!(
        messages("for i: int = 0, i < 3, i = i + 1 { }; i"),
        vec!["undefined variable 'i'"]
    );
}

#[test]
fn test_recursive_function() {
    let source = "fact :: (n: int) -> int {
        if n <= 1 { return 1 }
        return n * fact(n - 1)
    }
    r: int = fact(5)";
    assert!(messages(source).is_empty());
}

#[test]
fn test_call_arity_and_arguments() {
    let source = "add :: (a: int, b: int) -> int { return a + b }";
    assert_eq!(
        messages(&format!("{}\nadd(1)", source)),
        vec!["'add' expects 2 arguments, found 1"]
    );
    assert_eq!(
        messages(&format!("{}\nadd(1, \"two\")", source)),
        vec!["argument 2 of 'add' must be int, found string"]
    );
    assert_eq!(messages("missing(1)"), vec!["undefined function 'missing'"]);
    // arguments of an unknown callee are still checked
    assert_eq!(messages("missing(nope)").len(), 2);
}

#[test]
fn test_call_has_declared_return_type() {
    let errors = messages("half :: (n: float) -> float { return n / 2.0 }\nx: int = half(3.0)");
    assert_eq!(
        errors,
        vec!["cannot initialize 'x' of type int with a value of type float"]
    );
}

#[test]
fn test_return_rules() {
    assert_eq!(messages("return 1"), vec!["cannot return from top-level code"]);
    assert_eq!(
        messages("f :: () -> int { return \"s\" }"),
        vec!["function must return a value of type int, found string"]
    );
    assert_eq!(
        messages("p :: () { return 1 }"),
        vec!["function must return a value of type nil, found int"]
    );
    assert!(messages("p :: () { return }").is_empty());
}

#[test]
fn test_parameters_are_local() {
    assert!(messages("f :: (a: int) -> int { return a }").is_empty());
    assert_eq!(
        messages("f :: (a: int) -> int { return a }\na"),
        vec!["undefined variable 'a'"]
    );
    assert_eq!(
        messages("f :: (a: int, a: int) -> int { return a }"),
        vec!["duplicate parameter 'a' in function 'f'"]
    );
}

#[test]
fn test_class_members() {
    let source = "class Point {
        x: int = 0
        y: int = 0
        sum :: () -> int { return x + y }
        scaled :: (k: int) -> int { return sum() * k }
    }
    p: Point = new Point()
    p.x = 3
    a: int = p.sum()
    b: int = p.scaled(2)
    c: int = p.y";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn test_class_member_errors() {
    let class = "class Point { x: int = 0; get :: () -> int { return x } }\np: Point = new Point()\n";
    assert_eq!(
        messages(&format!("{}p.z", class)),
        vec!["class 'Point' has no field 'z'"]
    );
    assert_eq!(
        messages(&format!("{}p.nope()", class)),
        vec!["class 'Point' has no method 'nope'"]
    );
    assert_eq!(
        messages(&format!("{}p.x = \"s\"", class)),
        vec!["cannot assign a value of type string to field 'x' of type int"]
    );
    assert_eq!(
        messages(&format!("{}p.get(1)", class)),
        vec!["'p.get' expects 0 arguments, found 1"]
    );
    assert_eq!(
        messages("n: int = 1\nn.x"),
        vec!["'n' is not a class instance, found int"]
    );
    assert_eq!(messages("new Ghost()"), vec!["undefined class 'Ghost'"]);
    assert_eq!(messages("g: Ghost = 1"), vec!["unknown type 'Ghost'"]);
}

#[test]
fn test_duplicate_members() {
    assert_eq!(
        messages("class A { x: int = 0; x: int = 1 }"),
        vec!["duplicate field 'x' in class 'A'"]
    );
    assert_eq!(
        messages("class A { m :: () { }; m :: () { } }"),
        vec!["duplicate method 'm' in class 'A'"]
    );
}

#[test]
fn test_one_binding_per_name_in_a_scope() {
    assert_eq!(
        messages("import io\nprint: string = \"x\""),
        vec!["'print' is already declared as a function in this scope"]
    );
    assert_eq!(
        messages("x :: () -> int { return 1 }\nx: int = 5\ny: int = x()"),
        vec![
            "'x' is already declared as a function in this scope",
            "'x' is a variable, not a function",
        ]
    );
    assert_eq!(
        messages("class K { }\nK :: () { }"),
        vec!["'K' is already declared as a class in this scope"]
    );
    // the same kind may be declared again
    assert!(messages("x: int = 1\nx: int = 2").is_empty());
}

#[test]
fn test_nearest_binding_decides_the_kind() {
    assert_eq!(
        messages("f :: () -> int { return 1 }\n{ f: int = 2; n: int = f() }"),
        vec!["'f' is a variable, not a function"]
    );
    assert_eq!(
        messages("v: int = 1\n{ v :: () { }; w: int = v }"),
        vec!["'v' is a function, not a variable"]
    );
    assert_eq!(
        messages("class K { }\n{ K: int = 1; k: K = new K() }"),
        vec!["'K' is a variable, not a class"]
    );
    assert_eq!(
        messages("class A { }\n{ A: int = 0; class B : A { } }"),
        vec!["'A' is a variable, not a class"]
    );
}

#[test]
fn test_field_and_method_cannot_share_a_name() {
    assert_eq!(
        messages("class C { f: int = 1; f :: () -> int { return 2 } }"),
        vec!["'f' is already declared as a variable in this scope"]
    );
    assert_eq!(
        messages("class A { f: int = 1 }\nclass B : A { f :: () { } }"),
        vec!["'f' is already declared as a variable in this scope"]
    );
}

#[test]
fn test_inheritance_copies_members() {
    let source = "class Animal { legs: int = 4; speak :: () -> string { return \"...\" } }
    class Dog : Animal { speak :: () -> string { return \"woof\" }; walk :: () -> int { return legs } }
    d: Dog = new Dog()
    s: string = d.speak()
    n: int = d.legs + d.walk()";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn test_no_subtyping_between_classes() {
    let source = "class A { }
    class B : A { }
    a: A = new B()";
    assert_eq!(
        messages(source),
        vec!["cannot initialize 'a' of type A with a value of type B"]
    );
    assert_eq!(messages("class B : Missing { }"), vec!["undefined base class 'Missing'"]);
}

#[test]
fn test_class_can_mention_itself() {
    let source = "class Node { value: int = 0; copy :: () -> Node { return new Node() } }";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn test_import_registers_native_signatures() {
    assert_eq!(messages("print(1)"), vec!["undefined function 'print'"]);

    let mut env = TypeEnv::new();
    env.check_program(&parse("import io\nimport time"));
    assert!(env.errors().is_empty());
    assert_eq!(
        env.get_function("print"),
        Some(FunctionSig {
            params: vec![t_any!()],
            return_type: t_nil!(),
        })
    );
    assert_eq!(env.get_function("input").map(|s| s.return_type), Some(t_string!()));
    assert_eq!(env.get_function("clock").map(|s| s.return_type), Some(t_float!()));
}

#[test]
fn test_native_any_parameter() {
    assert!(messages("import io\nprint(1); print(\"s\"); print(2.5 > 1.0); print(nil)").is_empty());
    assert_eq!(
        messages("import io\nprint(1, 2)"),
        vec!["'print' expects 1 arguments, found 2"]
    );
    assert_eq!(messages("import io\nx: int = print(1)").len(), 1);
}

#[test]
fn test_unknown_library() {
    assert_eq!(messages("import net"), vec!["unknown library 'net'"]);
}
