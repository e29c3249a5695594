#[test]
fn herald_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/herald_error_pass.rs");
    t.pass("tests/ui/herald_error_context.rs");
    t.compile_fail("tests/ui/herald_error_no_context.rs");
    t.compile_fail("tests/ui/herald_error_bad_context_type.rs");
    t.compile_fail("tests/ui/herald_error_tuple_variant.rs");
    t.compile_fail("tests/ui/herald_error_not_enum.rs");
}
