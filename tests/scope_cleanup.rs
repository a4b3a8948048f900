//! Integration tests for temporary declaration cleanup

use unminify_rs::Unminifier;

fn unminify(source: &str) -> String {
    Unminifier::default()
        .unminify(source)
        .expect("Failed to unminify")
        .code
}

fn compact(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_consumed_temporary_loses_declaration() {
    let output = unminify(
        "function f(a) {\n  var t;\n  return (t = a.b) === null || t === void 0 ? void 0 : t.c;\n}",
    );
    assert_eq!(compact(&output), "function f(a) { return a.b?.c; }");
}

#[test]
fn test_temporary_read_after_rewrite_is_kept() {
    let output = unminify("function g() {\n  var t;\n  return null == (t = f()) ? void 0 : t.a(t.b);\n}");
    assert_eq!(
        compact(&output),
        "function g() { var t; return (t = f())?.a(t.b); }"
    );
}

#[test]
fn test_temporary_read_elsewhere_blocks_rewrite() {
    let source = "function f(a) { var t; x = (t = a.b) == null ? void 0 : t.c; return t; }";
    assert_eq!(compact(&unminify(source)), source);
}

#[test]
fn test_only_consumed_declarators_are_removed() {
    let output = unminify("var t, keep = 1;\nx = null == (t = a.b) ? void 0 : t.c;");
    assert_eq!(output, "var keep = 1;\nx = a.b?.c;\n");
}

#[test]
fn test_outer_scope_temporary_is_cleaned() {
    let output = unminify(
        "function outer(a) {\n  var t;\n  return function () {\n    return null == (t = a.b) ? void 0 : t.c;\n  };\n}",
    );
    assert!(output.contains("return a.b?.c;"));
    assert!(!output.contains("var t"));
}
