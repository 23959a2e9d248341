use pretty_assertions::assert_eq;

use rox::error::{LoxError, Result};
use rox::parser::Parser;
use rox::resolver::{Resolutions, Resolver};
use rox::scanner::scan;

fn resolve_with(globals: &[&str], source: &str) -> Result<Resolutions> {
    let tokens = scan(source)?;
    let statements = Parser::new(&tokens).parse()?;

    Resolver::new(globals.iter().map(|g| g.to_string())).resolve(&statements)
}

fn resolve(source: &str) -> Result<Resolutions> {
    resolve_with(&[], source)
}

/// Recorded distances in ascending order; reference sites are not otherwise observable.
fn distances(source: &str) -> Vec<usize> {
    let mut depths: Vec<usize> = resolve(source).unwrap().into_values().collect();
    depths.sort_unstable();
    depths
}

fn resolve_error(source: &str) -> String {
    let err = resolve(source).unwrap_err();
    assert!(matches!(err, LoxError::Resolve { .. }), "got {:?}", err);
    err.to_string()
}

#[test]
fn test_globals_are_left_unresolved() {
    assert_eq!(distances("let a = 1; print a; a = 2;"), Vec::<usize>::new());
}

#[test]
fn test_block_distances() {
    assert_eq!(distances("{ let a = 1; print a; }"), vec![0]);
    assert_eq!(distances("{ let a = 1; { print a; } }"), vec![1]);
    assert_eq!(distances("{ let a = 1; { { a = 3; } } }"), vec![2]);
    // Redeclaring in the same scope is allowed.
    assert_eq!(distances("{ let a = 1; let a = 2; print a; }"), vec![0]);
}

#[test]
fn test_function_distances() {
    assert_eq!(distances("fn f(x) { return x; }"), vec![0]);
    assert_eq!(distances("{ fn f() { return f; } }"), vec![1]);
    assert_eq!(
        distances("fn outer(a) { fn inner() { return a; } return inner; }"),
        vec![0, 1]
    );
}

#[test]
fn test_for_loop_distances() {
    // condition `i`, increment value `i` and target `i`, then `i` in the body block
    assert_eq!(
        distances("for (let i = 0; i < 2; i = i + 1) { print i; }"),
        vec![0, 0, 0, 1]
    );
}

#[test]
fn test_initializer_reads_enclosing_binding() {
    assert_eq!(distances("let x = 1; { let x = x + 1; print x; }"), vec![0]);
    assert_eq!(distances("{ let a = 1; { let a = a; } }"), vec![1]);
}

#[test]
fn test_initializer_closures_see_the_new_binding() {
    assert_eq!(distances("{ let f = fn() { return f; }; }"), vec![1]);
}

#[test]
fn test_self_reference_in_initializer() {
    assert_eq!(
        resolve_error("{ let a = a; }"),
        "[line 1] Error at 'a': Can't read local variable in its own initializer"
    );
    assert_eq!(
        resolve_error("let y = y;"),
        "[line 1] Error at 'y': Can't read local variable in its own initializer"
    );
    assert!(resolve_with(&["y"], "let y = y;").is_ok());
    assert!(resolve("let y = 1; let y = y + 1;").is_ok());
}

#[test]
fn test_misplaced_control_flow() {
    assert_eq!(
        resolve_error("return 1;"),
        "[line 1] Error at 'return': 'return' used outside of function"
    );
    assert_eq!(
        resolve_error("break;"),
        "[line 1] Error at 'break': 'break' used outside of a loop"
    );
    assert_eq!(
        resolve_error("if (true) {\n continue;\n}"),
        "[line 2] Error at 'continue': 'continue' used outside of a loop"
    );
    // A function body does not inherit the surrounding loop.
    assert_eq!(
        resolve_error("while (true) { fn f() { break; } }"),
        "[line 1] Error at 'break': 'break' used outside of a loop"
    );

    assert!(resolve("while (true) { if (true) break; else continue; }").is_ok());
    assert!(resolve("fn f() { for (let i = 0;;) { return i; } }").is_ok());
}

#[test]
fn test_this_binding() {
    assert_eq!(
        resolve_error("print this;"),
        "[line 1] Error at 'this': Can't use 'this' outside of a struct method"
    );
    assert_eq!(
        resolve_error("fn f() { return this; }"),
        "[line 1] Error at 'this': Can't use 'this' outside of a struct method"
    );

    assert_eq!(distances("struct P { get() { return this; } }"), vec![1]);
    assert_eq!(
        distances("struct P { fn m() { return fn() { return this; }; } }"),
        vec![2]
    );
}
