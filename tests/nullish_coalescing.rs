//! End-to-end tests for nullish coalescing reconstruction

use unminify_rs::{Unminifier, UnminifyOptions};

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
fn test_optional_chain_with_fallback() {
    let result = Unminifier::default()
        .unminify(
            r#"function name(r) {
  var t, n, o;
  return null !== (t = null == r || null === (n = r.app_info) || void 0 === n || null === (o = n.base_info) || void 0 === o ? void 0 : o.app_name) && void 0 !== t ? t : "game";
}"#,
        )
        .unwrap();
    assert_eq!(
        compact(&result.code),
        "function name(r) { return r?.app_info?.base_info?.app_name ?? \"game\"; }"
    );
    assert_eq!(result.stats.nullish_coalescing, 1);
    assert_eq!(result.stats.declarations_removed, 3);
}

#[test]
fn test_plain_value_with_fallback() {
    assert_eq!(
        unminify("var t;\nx = null !== (t = a.b) && void 0 !== t ? t : 1;"),
        "x = a.b ?? 1;\n"
    );
    assert_eq!(unminify("x = null != y ? y : 0;"), "x = y ?? 0;\n");
}

#[test]
fn test_coalescing_can_be_disabled() {
    let unminifier = Unminifier::new(UnminifyOptions::from_cli(None, false, false, true));
    let source = "var t;\nx = null !== (t = a.b) && void 0 !== t ? t : 1;\n";
    assert_eq!(unminifier.unminify(source).unwrap().code, source);
}

#[test]
fn test_mixed_operators_get_parentheses() {
    let output = unminify("var t;\nx = (null !== (t = a.b) && void 0 !== t ? t : 1) || c;");
    assert_eq!(output, "x = (a.b ?? 1) || c;\n");
}

#[test]
fn test_fallback_reading_temporary_is_unchanged() {
    let source = "function f(a) { var t = 5; return null !== (t = a) && void 0 !== t ? t : t; }";
    let result = Unminifier::default().unminify(source).unwrap();
    assert_eq!(result.stats.rewrites(), 0);
    assert!(!result.code.contains("??"));
    assert_eq!(
        compact(&result.code),
        "function f(a) { var t = 5; return null !== (t = a) && void 0 !== t ? t : t; }"
    );
}
