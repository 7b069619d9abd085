// ABOUTME: End-to-end tests driving full scripts through run()

use ava_lang::run;

#[test]
fn test_list_mutation_builtins_round_trip() {
    let trace = run("<test>", "var xs = [1, 2, 3]\nadd(xs, 4)\nlen(xs)");
    assert_eq!(trace.final_value, serde_json::json!(4));
    assert_eq!(trace.symbols_end["xs"], serde_json::json!([1, 2, 3, 4]));
    assert!(trace.error.is_none());
}

#[test]
fn test_if_elif_else_single_line_picks_matching_branch() {
    let trace = run("<test>", "if 0 then show(\"a\") elif 1 then show(\"b\") else show(\"c\") end");
    assert_eq!(trace.stdout, "b\n");
    assert!(trace.error.is_none());
}

#[test]
fn test_for_loop_expression_form_collects_values() {
    let trace = run("<test>", "var xs = for i = 1 to 4 then i * i\nxs");
    assert_eq!(trace.final_value, serde_json::json!([1, 4, 9]));
}

#[test]
fn test_function_definition_and_call() {
    let trace = run(
        "<test>",
        "fun square(x) -> x * x\nsquare(5)",
    );
    assert_eq!(trace.final_value, serde_json::json!(25));
}

#[test]
fn test_closure_captures_defining_scope() {
    let source = "\
var counter = 0
fun make_adder(n)
  return fun(x)
    return x + n
  end
end
var add5 = make_adder(5)
add5(10)";
    let trace = run("<test>", source);
    assert_eq!(trace.final_value, serde_json::json!(15));
    assert_eq!(trace.symbols_end["counter"], serde_json::json!(0));
}

#[test]
fn test_var_shadows_current_scope_not_parent() {
    let source = "\
var x = 1
fun shadow()
  var x = 2
  return x
end
shadow()
x";
    let trace = run("<test>", source);
    assert_eq!(trace.final_value, serde_json::json!(1));
}

#[test]
fn test_division_by_zero_reports_runtime_error() {
    let trace = run("<test>", "var x = 1 / 0");
    let error = trace.error.expect("expected a runtime error");
    assert_eq!(error.name, "Runtime Error");
    assert!(error.details.contains("zero"));
}

#[test]
fn test_break_and_continue_inside_while_loop() {
    let source = "\
var seen = []
var i = 0
while i < 10 then
  var i = i + 1
  if i == 3 then continue end
  if i == 6 then break end
  add(seen, i)
end
seen";
    let trace = run("<test>", source);
    assert_eq!(trace.final_value, serde_json::json!([1, 2, 4, 5]));
}

#[test]
fn test_symbols_end_reflects_final_global_bindings() {
    let trace = run("<test>", "var a = 1\nvar b = a + 1\nvar c = [a, b]");
    assert_eq!(trace.symbols_end["a"], serde_json::json!(1));
    assert_eq!(trace.symbols_end["b"], serde_json::json!(2));
    assert_eq!(trace.symbols_end["c"], serde_json::json!([1, 2]));
}

#[test]
fn test_trace_serializes_to_the_documented_json_shape() {
    let trace = run("<test>", "show(1)");
    let json = serde_json::to_value(&trace).expect("trace must serialize");
    assert!(json["trace"]["lexer"]["tokens"].is_array());
    assert!(json["trace"]["parser"]["root_repr"].is_string());
    assert!(json["trace"]["execution"]["events"].is_array());
    assert_eq!(json["stdout"], "1\n");
    assert!(json["error"].is_null());
}

#[test]
fn test_undefined_name_error_includes_caret_underline() {
    let trace = run("<test>", "show(missing_name)");
    let error = trace.error.expect("expected undefined name error");
    assert!(error.traceback_str.contains("^"));
}
