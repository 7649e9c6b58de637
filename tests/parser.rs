use mlscript::ast::{BinaryOp, Expr, Literal, Stmt};
use mlscript::ast_printer::AstPrinter;
use mlscript::parser::parse_source;

fn printed(source: &str) -> Vec<String> {
    parse_source(source)
        .unwrap_or_else(|e| panic!("parse failed: {}", e))
        .iter()
        .map(AstPrinter::print_stmt)
        .collect()
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    assert_eq!(printed("1 + 2 * 3 - 4 / 2"), ["(- (+ 1 (* 2 3)) (/ 4 2))"]);
}

#[test]
fn comparison_is_the_loosest_binary_level() {
    assert_eq!(printed("a + 1 < b * 2"), ["(< (+ a 1) (* b 2))"]);
    assert_eq!(printed("x not in xs"), ["(not in x xs)"]);
}

#[test]
fn postfix_chains_left_to_right() {
    assert_eq!(printed("a.b(1)[2]"), ["(index (call (. a b) 1) 2)"]);
}

#[test]
fn multi_index_and_slices() {
    assert_eq!(printed("m[1, 2]"), ["(index m 1 2)"]);
    assert_eq!(printed("xs[1:]"), ["(index xs (slice 1 _ _))"]);
    assert_eq!(printed("xs[::-1]"), ["(index xs (slice _ _ (- 1)))"]);
}

#[test]
fn tuples_and_grouping_are_distinguished() {
    assert_eq!(printed("(1)"), ["1"]);
    assert_eq!(printed("(1,)"), ["(tuple 1)"]);
    assert_eq!(printed("()"), ["(tuple)"]);
}

#[test]
fn dict_and_list_literals() {
    assert_eq!(
        printed("{\"a\": 1, 2: [3]}"),
        ["(dict (\"a\" 1) (2 (list 3)))"]
    );
}

#[test]
fn assignment_targets() {
    assert_eq!(printed("x = 1"), ["(= x 1)"]);
    assert_eq!(printed("p.x = 1"), ["(= (. p x) 1)"]);
    assert_eq!(printed("xs[0] = 1"), ["(= (index xs 0) 1)"]);
}

#[test]
fn invalid_assignment_target_is_a_parse_error() {
    let err = parse_source("1 + 2 = 3").unwrap_err();

    assert!(err.is_static());
    assert!(err.to_string().starts_with("SyntaxError: Invalid assignment target"));
}

#[test]
fn elif_chains_nest_in_else() {
    let program = parse_source("if (a) { x = 1 } elif (b) { x = 2 } else { x = 3 }").unwrap();

    let Stmt::If { else_branch, .. } = &program[0] else {
        panic!("expected if");
    };
    let Some(inner) = else_branch else {
        panic!("missing elif")
    };

    assert!(matches!(**inner, Stmt::If { else_branch: Some(_), .. }));
}

#[test]
fn return_without_value_at_end_of_line() {
    assert_eq!(
        printed("fun f() {\n  return\n}"),
        ["(fun f () (block (return)))"]
    );
}

#[test]
fn try_catch_finally_statement() {
    assert_eq!(
        printed("try { throw 1 } catch (e) { print(e) } finally { print(2) }"),
        ["(try (block (throw 1)) (catch e (block (print e))) (finally (block (print 2))))"]
    );
}

#[test]
fn import_and_with_statements() {
    assert_eq!(printed("import \"math\" as m"), ["(import \"math\" m)"]);
    assert_eq!(printed("with no_grad { x = 1 }"), ["(with no_grad (block (= x 1)))"]);
}

#[test]
fn keyword_arguments_after_positionals() {
    let program = parse_source("f(1, b=2)").unwrap();

    let Stmt::Expression(Expr::Call { args, kwargs, .. }) = &program[0] else {
        panic!("expected call");
    };

    assert_eq!(args.len(), 1);
    assert_eq!(kwargs[0].0, "b");
    assert!(matches!(
        kwargs[0].1,
        Expr::Literal {
            value: Literal::Integer(2),
            ..
        }
    ));
}

#[test]
fn network_block_requires_every_attribute() {
    let err = parse_source("net = network { input: 4, layers: [] }").unwrap_err();

    assert!(err.to_string().contains("missing the 'optimizer' attribute"));
}

#[test]
fn binary_nodes_record_their_line() {
    let program = parse_source("\n\nx = 1 +\n 2").unwrap();

    let Stmt::Assign { value, .. } = &program[0] else {
        panic!("expected assignment");
    };

    assert!(matches!(
        value,
        Expr::Binary {
            op: BinaryOp::Add,
            line: 3,
            ..
        }
    ));
}

#[test]
fn missing_token_names_both_kinds_and_quotes_the_line() {
    let err = parse_source("x = 1\nprint((1 + 2)").unwrap_err();

    assert!(err.is_static());
    assert_eq!(
        err.to_string(),
        "SyntaxError: Expected RIGHT_PAREN, but got EOF at line 2: print((1 + 2)"
    );
}
