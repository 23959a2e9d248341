use pretty_assertions::assert_eq;

use rox::ast_printer::AstPrinter;
use rox::error::Result;
use rox::expr::Expr;
use rox::parser::Parser;
use rox::scanner::scan;
use rox::stmt::Stmt;

fn parse(source: &str) -> Result<Vec<Stmt>> {
    let tokens = scan(source)?;
    let statements = Parser::new(&tokens).parse()?;

    Ok(statements)
}

fn printed(source: &str) -> Vec<String> {
    parse(source)
        .unwrap()
        .iter()
        .map(AstPrinter::print_stmt)
        .collect()
}

fn parse_error(source: &str) -> String {
    parse(source).unwrap_err().to_string()
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(
        printed("print 1 + 2 * 3; 1 - 2 - 3; 8 / 4 * 2;"),
        vec![
            "(print (+ 1.0 (* 2.0 3.0)))",
            "(expr (- (- 1.0 2.0) 3.0))",
            "(expr (* (/ 8.0 4.0) 2.0))",
        ]
    );
    assert_eq!(
        printed("1 < 2 == 3 >= 4;"),
        vec!["(expr (== (< 1.0 2.0) (>= 3.0 4.0)))"]
    );
}

#[test]
fn test_unary_and_grouping() {
    assert_eq!(
        printed("print -(1 + 2); !!true; +x; -2.5;"),
        vec![
            "(print (- (group (+ 1.0 2.0))))",
            "(expr (! (! true)))",
            "(expr (+ x))",
            "(expr (- 2.5))",
        ]
    );
}

#[test]
fn test_logical_and_ternary() {
    assert_eq!(
        printed("a || b && c; a ? b : c ? d : e; x = a ? 1 : 2;"),
        vec![
            "(expr (|| a (&& b c)))",
            "(expr (? a b (? c d e)))",
            "(expr (= x (? a 1.0 2.0)))",
        ]
    );
}

#[test]
fn test_assignment_targets() {
    assert_eq!(
        printed("a = b = 1; p.x = 2; f(1)(2).g; null;"),
        vec![
            "(expr (= a (= b 1.0)))",
            "(expr (= (. p x) 2.0))",
            "(expr (. (call (call f 1.0) 2.0) g))",
            "(expr null)",
        ]
    );

    assert_eq!(
        parse_error("1 = 2;"),
        "[line 1] Error at '=': Invalid assignment target"
    );
    assert_eq!(
        parse_error("a + b = 2;"),
        "[line 1] Error at '=': Invalid assignment target"
    );
}

#[test]
fn test_control_flow_statements() {
    assert_eq!(
        printed(
            "if (a) print 1; else { print 2; }
             while (x) { break; continue; }
             for (let i = 0; i < 3; i = i + 1) print i;
             for (let j = 0;;) break;"
        ),
        vec![
            "(if a (print 1.0) (block (print 2.0)))",
            "(while x (block (break) (continue)))",
            "(for (let i 0.0) (< i 3.0) (= i (+ i 1.0)) (print i))",
            "(for (let j 0.0) _ _ (break))",
        ]
    );
}

#[test]
fn test_for_requires_let_initializer() {
    assert_eq!(
        parse_error("for (i = 0; i < 1;) {}"),
        "[line 1] Error at 'i': Expected 'let' initializer in for loop"
    );
}

#[test]
fn test_functions() {
    assert_eq!(
        printed(
            "fn add(a, b) { return a + b; }
             let f = fn(x) { return; };
             fn g() {};
             print add(1, 2);"
        ),
        vec![
            "(expr (fn add (a b) (return (+ a b))))",
            "(let f (fn anonymous (x) (return)))",
            "(expr (fn g ()))",
            "(print (call add 1.0 2.0))",
        ]
    );

    // Anonymous function statements still need their semicolon.
    assert_eq!(
        parse_error("fn (x) { print x; }"),
        "[line 1] Error at end: Expected ';' after expression"
    );
}

#[test]
fn test_struct_declaration() {
    assert_eq!(
        printed(
            "struct Point {
                fn norm() { return this.x * this.x; }
                scale(k) { this.x = this.x * k; }
            }"
        ),
        vec![
            "(struct Point (fn norm () (return (* (. this x) (. this x)))) \
             (fn scale (k) (expr (= (. this x) (* (. this x) k)))))"
        ]
    );

    assert_eq!(
        parse_error("struct { }"),
        "[line 1] Error at '{': Expected struct name"
    );
}

#[test]
fn test_syntax_errors_locate_the_token() {
    assert_eq!(
        parse_error("print ;"),
        "[line 1] Error at ';': Expected expression"
    );
    assert_eq!(
        parse_error("print 1"),
        "[line 1] Error at end: Expected ';' after value"
    );
    assert_eq!(
        parse_error("let x = 1;\nsuper.x;"),
        "[line 2] Error at 'super': Expected expression"
    );
    assert_eq!(
        parse_error("{ print 1;"),
        "[line 1] Error at end: Expected '}' after block"
    );
}

#[test]
fn test_argument_limit() {
    let arguments: Vec<String> = (0..256).map(|n| n.to_string()).collect();
    let source = format!("f({});", arguments.join(", "));

    assert_eq!(
        parse_error(&source),
        "[line 1] Error at '255': Can't have more than 255 arguments"
    );

    let arguments: Vec<String> = (0..255).map(|n| n.to_string()).collect();
    assert!(parse(&format!("f({});", arguments.join(", "))).is_ok());
}

#[test]
fn test_parameter_limit() {
    let params: Vec<String> = (0..256).map(|n| format!("p{}", n)).collect();
    let source = format!("fn f({}) {{}}", params.join(", "));

    assert_eq!(
        parse_error(&source),
        "[line 1] Error at 'p255': Can't have more than 255 parameters"
    );

    let params: Vec<String> = (0..255).map(|n| format!("p{}", n)).collect();
    assert!(parse(&format!("fn f({}) {{}}", params.join(", "))).is_ok());
}

#[test]
fn test_ternary_requires_colon() {
    assert_eq!(
        parse_error("print a ? b;"),
        "[line 1] Error at ';': Expected ':' in ternary expression"
    );
}

#[test]
fn test_partial_parse_keeps_statements_before_error() {
    let tokens = scan("let x = 1; print x;\nprint ; print 2;").unwrap();
    let (statements, error) = Parser::new(&tokens).parse_partial();

    let rendered: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
    assert_eq!(rendered, vec!["(let x 1.0)", "(print x)"]);
    assert_eq!(
        error.map(|e| e.to_string()),
        Some("[line 2] Error at ';': Expected expression".to_string())
    );

    let tokens = scan("print 1;").unwrap();
    let (statements, error) = Parser::new(&tokens).parse_partial();
    assert_eq!(statements.len(), 1);
    assert!(error.is_none());
}

#[test]
fn test_recovering_parse_collects_every_error() {
    let tokens = scan("print ; let x = 1; 1 = 2; print x;").unwrap();
    let (statements, errors) = Parser::new(&tokens).parse_recovering();

    let rendered: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
    assert_eq!(rendered, vec!["(let x 1.0)", "(print x)"]);

    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "[line 1] Error at ';': Expected expression",
            "[line 1] Error at '=': Invalid assignment target",
        ]
    );
}

#[test]
fn test_reference_sites_get_distinct_ids() {
    let statements = parse("x; x;").unwrap();

    let ids: Vec<_> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            other => panic!("unexpected statement {:?}", other),
        })
        .collect();

    assert_ne!(ids[0], ids[1]);
}
