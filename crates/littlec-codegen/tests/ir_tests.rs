//! End-to-end tests for the compilation pipeline.
//!
//! Each test feeds a source snippet through `compile_to_ir` and checks
//! properties of the produced textual IR: function signatures, stack slots,
//! block structure, call sites, and load counts. The native-toolchain tests
//! at the bottom run the full `compile` pipeline and execute the binary;
//! they skip themselves when no `clang` is on the PATH.

use std::process::Command;

use littlec_codegen::{compile, compile_to_ir, CompileOptions};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn ir(source: &str) -> String {
    compile_to_ir(source).expect("compilation should succeed")
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ---------------------------------------------------------------------------
// IR structure
// ---------------------------------------------------------------------------

#[test]
fn empty_source_produces_empty_module() {
    let text = ir("");
    assert!(!text.contains("define"));
    assert!(!text.contains("declare"));
}

#[test]
fn main_returning_zero() {
    let text = ir("int main() { return 0; }");
    assert!(text.contains("define i32 @main()"));
    assert!(text.contains("ret i32 0"));
    assert_eq!(count(&text, "define"), 1);
}

#[test]
fn locals_become_stack_slots() {
    let text = ir("int main() { int x = 3; int y = x + 4; return y; }");
    assert!(text.contains("%x = alloca i32"));
    assert!(text.contains("%y = alloca i32"));
    assert!(text.contains("store i32 3, ptr %x"));
    // y is the sum of the load of x and the constant 4.
    assert!(text.contains("load i32, ptr %x"));
    assert!(text.contains("%add = add i32"));
    // The final return loads y.
    assert!(text.contains("load i32, ptr %y"));
}

#[test]
fn for_loop_block_structure() {
    let text = ir("int main() { int i = 0; for (i = 0; i < 3; i = i + 1) { } return i; }");
    assert!(text.contains("condition:"));
    assert!(text.contains("finally:"));
    assert!(text.contains("%cmp = icmp slt i32"));
    // The false branch of the condition is the only way into `finally`.
    assert!(text.contains("label %finally"));
    // One branch into the condition block plus the back-edge from the body.
    assert_eq!(count(&text, "br label %condition"), 2);
}

#[test]
fn for_without_clauses_loops_unconditionally() {
    let text = ir("int main() { for (;;) { return 0; } return 1; }");
    assert!(text.contains("br i1 true"));
    assert!(text.contains("condition:"));
}

#[test]
fn loop_body_ending_in_return_has_no_back_edge() {
    let text = ir("int main() { for (;;) { return 0; } return 1; }");
    // Only the initial jump into the condition block remains.
    assert_eq!(count(&text, "br label %condition"), 1);
}

#[test]
fn if_else_branches_meet_in_merge_block() {
    let text = ir("int main() { int x = 0; if (x < 1) { x = 2; } else { x = 3; } return x; }");
    assert!(text.contains("then:"));
    assert!(text.contains("else:"));
    assert!(text.contains("finally:"));
    assert_eq!(count(&text, "br label %finally"), 2);
}

#[test]
fn terminated_then_branch_is_not_rebranched() {
    let text = ir("int main() { if (1) { return 1; } return 0; }");
    // The then arm ends in `ret`; only the else arm branches to the merge.
    assert_eq!(count(&text, "br label %finally"), 1);
    assert!(text.contains("ret i32 1"));
}

// ---------------------------------------------------------------------------
// Pointers and arrays
// ---------------------------------------------------------------------------

#[test]
fn pointer_slot_and_single_deref() {
    let text = ir("int main() { int *p; int a[4]; p = &a; return *p; }");
    // The pointer slot stores the opaque pointer; the array keeps its extent.
    assert!(text.contains("%p = alloca ptr"));
    assert!(text.contains("%a = alloca i32, i32 4"));
    // `&a` stores the slot address without loading.
    assert!(text.contains("store ptr %a, ptr %p"));
    // The dereference itself emits exactly one i32 load.
    assert_eq!(count(&text, "load i32"), 1);
    assert!(text.contains("load ptr, ptr %p"));
}

#[test]
fn declared_depth_controls_load_count() {
    let text = ir("int main() { int **q; int *r; r = **q; return 0; }");
    // One load for the identifier, two for the declared depth; with a
    // declared depth above one every load reads the pointer type.
    assert_eq!(count(&text, "load ptr"), 3);
}

#[test]
fn single_star_on_double_pointer_still_walks_declared_depth() {
    let text = ir("int main() { int **q; int *r; r = *q; return 0; }");
    // The pointer metadata recorded at the declaration, not the star count
    // written at the use site, drives the load chain: one read of the slot
    // plus two chained loads.
    assert_eq!(count(&text, "load ptr"), 3);
}

#[test]
fn array_indexing_uses_gep() {
    let text = ir("int main() { int a[4]; a[2] = 9; return a[2]; }");
    assert!(text.contains("getelementptr inbounds i32, ptr %a"));
    assert!(text.contains("store i32 9"));
    assert_eq!(count(&text, "getelementptr"), 2);
}

#[test]
fn unindexed_array_decays_to_element_address() {
    let text = ir("int take(int *p) { return 0; } int main() { int a[4]; return take(a); }");
    // Passing `a` passes the element-0 address, not a load.
    assert!(text.contains("call i32 @take(ptr"));
}

// ---------------------------------------------------------------------------
// Functions, typedefs, structs, strings
// ---------------------------------------------------------------------------

#[test]
fn typedef_alias_resolves_in_signatures_and_calls() {
    let text =
        ir("typedef int Int32; Int32 f(Int32 x) { return x; } int main() { return f(7); }");
    assert!(text.contains("define i32 @f(i32 %x)"));
    assert!(text.contains("call i32 @f(i32 7)"));
}

#[test]
fn struct_definition_and_aggregate_slot() {
    let text = ir("struct P { int x; int y; }; int main() { struct P q; return 0; }");
    assert!(text.contains("%P = type { i32, i32 }"));
    assert!(text.contains("%q = alloca %P"));
}

#[test]
fn struct_with_pointer_field_uses_opaque_ptr() {
    let text = ir("struct Node { int value; int *next; }; int main() { return 0; }");
    assert!(text.contains("%Node = type { i32, ptr }"));
}

#[test]
fn forward_declaration_is_a_declare() {
    let text = ir("int getchar(); int main() { return getchar(); }");
    assert!(text.contains("declare i32 @getchar()"));
    assert!(text.contains("call i32 @getchar()"));
}

#[test]
fn variadic_prototype_and_string_literal() {
    let text = ir("int printf(char *fmt, ...); int main() { printf(\"hi\"); return 0; }");
    assert!(text.contains("declare i32 @printf(ptr, ...)"));
    // The literal becomes a private null-terminated global byte array.
    assert!(text.contains("private constant"));
    assert!(text.contains("c\"hi\\00\""));
    assert!(text.contains("@printf(ptr"));
}

#[test]
fn parameters_are_stored_into_slots() {
    let text = ir("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    assert!(text.contains("define i32 @add(i32 %a, i32 %b)"));
    assert!(text.contains("%a1 = alloca i32"));
    assert!(text.contains("store i32 %a, ptr %a1"));
    assert!(text.contains("call i32 @add(i32 1, i32 2)"));
}

#[test]
fn void_function_gets_implicit_return() {
    let text = ir("void nop() { } int main() { nop(); return 0; }");
    assert!(text.contains("define void @nop()"));
    assert!(text.contains("ret void"));
    assert!(text.contains("call void @nop()"));
}

#[test]
fn pointer_return_type_is_opaque_ptr() {
    let text = ir("int *head(int *p) { return p; } int main() { return 0; }");
    assert!(text.contains("define ptr @head(ptr %p)"));
}

#[test]
fn char_literal_is_an_i8_constant() {
    let text = ir("int main() { char c = 'a'; return 0; }");
    assert!(text.contains("%c = alloca i8"));
    assert!(text.contains("store i8 97, ptr %c"));
}

// ---------------------------------------------------------------------------
// Determinism and reuse
// ---------------------------------------------------------------------------

#[test]
fn emission_is_deterministic() {
    let source = "struct P { int x; }; int f(int a) { return a; } \
                  int main() { int i; for (i = 0; i < 2; i = i + 1) { } return f(i); }";
    assert_eq!(ir(source), ir(source));
}

#[test]
fn multiple_compilations_per_process() {
    // The type table is generator-scoped, so typedefs do not leak between runs.
    let source = "typedef int T; int main() { T x = 1; return x; }";
    assert!(compile_to_ir(source).is_ok());
    assert!(compile_to_ir(source).is_ok());
}

// ---------------------------------------------------------------------------
// Native toolchain
// ---------------------------------------------------------------------------

fn clang_available() -> bool {
    Command::new("clang")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn compile_produces_runnable_binary() {
    if !clang_available() {
        eprintln!("skipping: clang not found on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let options = CompileOptions {
        output_dir: dir.path().to_path_buf(),
        binary_name: Some("ret7".to_string()),
        keep_ir: true,
    };
    let result = compile("int main() { return 7; }", &options).unwrap();
    assert!(result.binary_path.exists());
    assert!(result.ir_path.as_ref().unwrap().exists());
    assert!(result.binary_size > 0);

    let status = Command::new(&result.binary_path).status().unwrap();
    assert_eq!(status.code(), Some(7));
}

#[test]
fn compile_discards_ir_unless_kept() {
    if !clang_available() {
        eprintln!("skipping: clang not found on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let options = CompileOptions {
        output_dir: dir.path().to_path_buf(),
        binary_name: Some("quiet".to_string()),
        keep_ir: false,
    };
    let result = compile("int main() { return 0; }", &options).unwrap();
    assert!(result.ir_path.is_none());
    assert!(!dir.path().join("quiet.ll").exists());
    assert!(result.binary_path.exists());
}
