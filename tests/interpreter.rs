//! End-to-end evaluation: programs run through the full pipeline with
//! their printed output and runtime failures asserted.

mod common;

use common::{run, run_with_includes};

// ─────────────────────────────────────────────────────────────────────────
// Closures and scoping
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn closure_captures_the_declaration_scope() {
    // The inner `var a` must not rebind the closure's captured `a`.
    let outcome = run(
        r#"
var a = "global";
{
    fun show() { print a; }
    show();
    var a = "block";
    show();
}
"#,
    );

    outcome.assert_prints("global\nglobal\n");
}

#[test]
fn closures_share_mutable_state() {
    let outcome = run(
        r#"
fun make_counter() {
    var count = 0;
    fun increment() {
        count = count + 1;
        return count;
    }
    return increment;
}
var counter = make_counter();
print counter();
print counter();
print counter();
"#,
    );

    outcome.assert_prints("1\n2\n3\n");
}

#[test]
fn anonymous_functions_are_values() {
    let outcome = run("var double = fun(x) { return x * 2; }; print double(3);");

    outcome.assert_prints("6\n");
}

#[test]
fn recursion_resolves_through_the_declaring_scope() {
    let outcome = run(
        r#"
fun fib(n) {
    if (n < 2) return n;
    return fib(n - 1) + fib(n - 2);
}
print fib(10);
"#,
    );

    outcome.assert_prints("55\n");
}

#[test]
fn assignment_is_an_expression_yielding_the_value() {
    let outcome = run("var a = 1; print a = 2; print a;");

    outcome.assert_prints("2\n2\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn initializer_binds_this_and_stores_fields() {
    let outcome = run(
        r#"
class C {
    init(x) { this.x = x; }
    get() { return this.x; }
}
print C(7).get();
"#,
    );

    outcome.assert_prints("7\n");
}

#[test]
fn super_dispatches_to_the_parent_method() {
    let outcome = run(
        r#"
class A {
    hi() { print "A"; }
}
class B < A {
    hi() {
        super.hi();
        print "B";
    }
}
B().hi();
"#,
    );

    outcome.assert_prints("A\nB\n");
}

#[test]
fn subclass_methods_shadow_superclass_methods() {
    let outcome = run(
        r#"
class A { name() { return "A"; } }
class B < A { name() { return "B"; } }
class C < B {}
print C().name();
"#,
    );

    outcome.assert_prints("B\n");
}

#[test]
fn inherited_methods_see_the_subclass_instance() {
    let outcome = run(
        r#"
class A {
    describe() { print this.kind; }
}
class B < A {
    init() { this.kind = "subclass"; }
}
B().describe();
"#,
    );

    outcome.assert_prints("subclass\n");
}

#[test]
fn fields_shadow_methods() {
    let outcome = run(
        r#"
class C {
    label() { return "method"; }
}
var c = C();
c.label = "field";
print c.label;
"#,
    );

    outcome.assert_prints("field\n");
}

#[test]
fn fields_are_per_instance() {
    let outcome = run(
        r#"
class Box {}
var a = Box();
var b = Box();
a.value = 1;
b.value = 2;
print a.value;
print b.value;
"#,
    );

    outcome.assert_prints("1\n2\n");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let outcome = run(
        r#"
class Greeter {
    init(name) { this.name = name; }
    greet() { print this.name; }
}
var method = Greeter("world").greet;
method();
"#,
    );

    outcome.assert_prints("world\n");
}

#[test]
fn constructing_without_an_initializer_takes_no_arguments() {
    let outcome = run("class Empty {} print Empty();");

    outcome.assert_prints("Empty instance\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn for_loop_with_continue_and_break() {
    let outcome = run(
        r#"
for (var i = 0; i < 5; i = i + 1) {
    if (i == 2) continue;
    if (i == 4) break;
    print i;
}
"#,
    );

    outcome.assert_prints("0\n1\n3\n");
}

#[test]
fn while_loop_with_continue_and_break() {
    let outcome = run(
        r#"
var i = 0;
while (i < 10) {
    i = i + 1;
    if (i == 2) continue;
    if (i == 4) break;
    print i;
}
"#,
    );

    outcome.assert_prints("1\n3\n");
}

#[test]
fn break_only_exits_the_innermost_loop() {
    let outcome = run(
        r#"
for (var i = 0; i < 2; i = i + 1) {
    for (var j = 0; j < 5; j = j + 1) {
        if (j == 1) break;
        print i;
    }
}
"#,
    );

    outcome.assert_prints("0\n1\n");
}

#[test]
fn return_without_a_value_yields_nil() {
    let outcome = run("fun f() { return; } print f();");

    outcome.assert_prints("nil\n");
}

#[test]
fn falling_off_a_function_yields_nil() {
    let outcome = run("fun f() {} print f();");

    outcome.assert_prints("nil\n");
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    let outcome = run(
        r#"
print "hi" or 2;
print nil or "yes";
print nil and "never";
print 1 and 2;
"#,
    );

    outcome.assert_prints("hi\nyes\nnil\n2\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Operators and stringification
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic_and_comparisons() {
    let outcome = run(
        r#"
print 1 + 2 * 3;
print (1 + 2) * 3;
print 7 / 2;
print 1 < 2;
print 2 <= 1;
print "a" + "b";
"#,
    );

    outcome.assert_prints("7\n9\n3.5\ntrue\nfalse\nab\n");
}

#[test]
fn integral_numbers_print_without_a_trailing_fraction() {
    let outcome = run("print 3.0; print 3.5; print 6 / 2;");

    outcome.assert_prints("3\n3.5\n3\n");
}

#[test]
fn equality_follows_value_semantics_for_primitives() {
    let outcome = run(
        r#"
print nil == nil;
print nil == false;
print 1 == 1;
print "a" == "a";
print 1 == "1";
"#,
    );

    outcome.assert_prints("true\nfalse\ntrue\ntrue\nfalse\n");
}

#[test]
fn instances_compare_by_identity() {
    let outcome = run(
        r#"
class Box {}
var a = Box();
var b = Box();
var c = a;
print a == b;
print a == c;
"#,
    );

    outcome.assert_prints("false\ntrue\n");
}

#[test]
fn callables_and_classes_stringify() {
    let outcome = run(
        r#"
fun f() {}
class C {}
print f;
print C;
print clock() >= 0;
"#,
    );

    outcome.assert_prints("<fn f>\nC\ntrue\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Runtime errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn adding_a_number_and_a_string_fails_with_the_operator_line() {
    let outcome = run(r#"print 1 + "x";"#);

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Operands must be two numbers or two strings.");

    let rendered = error.to_string();
    assert!(rendered.contains("Operands must be two numbers or two strings."));
    assert!(rendered.contains("[line 1]"));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let outcome = run("print 1 / 0;");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Division by zero.");
}

#[test]
fn negating_a_string_is_a_runtime_error() {
    let outcome = run(r#"print -"x";"#);

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Operand must be a number.");
}

#[test]
fn comparing_mixed_operands_is_a_runtime_error() {
    let outcome = run(r#"print 1 < "2";"#);

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Operands must be numbers.");
}

#[test]
fn undefined_variable_reports_its_name() {
    let outcome = run("print missing;");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Undefined variable 'missing'.");
}

#[test]
fn assigning_to_an_undefined_variable_fails() {
    let outcome = run("missing = 1;");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Undefined variable 'missing'.");
}

#[test]
fn calling_a_non_callable_fails() {
    let outcome = run(r#""text"();"#);

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Can only call functions and classes.");
}

#[test]
fn arity_mismatch_reports_expected_and_actual() {
    let outcome = run("fun f(a) {} f(1, 2);");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Expected 1 arguments but got 2.");
}

#[test]
fn property_access_on_a_non_instance_fails() {
    let outcome = run("print (1).x;");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Only instances have properties.");
}

#[test]
fn unknown_property_reports_its_name() {
    let outcome = run("class C {} print C().missing;");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Undefined property 'missing'.");
}

#[test]
fn inheriting_from_a_non_class_fails() {
    let outcome = run(r#"var NotAClass = "x"; class C < NotAClass {}"#);

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Superclass must be a class.");
}

#[test]
fn execution_stops_at_the_first_runtime_error() {
    let outcome = run(r#"print "before"; print missing; print "after";"#);

    assert_eq!(outcome.output, "before\n");
    assert!(outcome.runtime_error.is_some());
}

#[test]
fn globals_survive_a_block_scoped_runtime_error() {
    // The block's frame is popped even though the error unwound out of
    // it; the global remains reachable afterwards.
    let outcome = run("var a = 1; { var b = 2; print missing; }");

    let error = outcome.runtime_error.expect("expected runtime error");
    assert_eq!(error.message, "Undefined variable 'missing'.");
}

// ─────────────────────────────────────────────────────────────────────────
// Includes
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn included_definitions_share_the_global_scope() {
    let outcome = run_with_includes(
        r#"
include "lib.lox";
print shared;
print helper(20);
"#,
        &[(
            "lib.lox",
            "var shared = 22; fun helper(n) { return n * 2; }",
        )],
    );

    outcome.assert_prints("22\n40\n");
}

#[test]
fn included_statements_execute_in_order() {
    let outcome = run_with_includes(
        r#"
print "before";
include "lib.lox";
print "after";
"#,
        &[("lib.lox", r#"print "included";"#)],
    );

    outcome.assert_prints("before\nincluded\nafter\n");
}

#[test]
fn includes_nest_through_included_files() {
    let outcome = run_with_includes(
        r#"include "outer.lox"; print value;"#,
        &[
            ("outer.lox", r#"include "inner.lox";"#),
            ("inner.lox", "var value = 42;"),
        ],
    );

    outcome.assert_prints("42\n");
}
