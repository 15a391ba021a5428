//! How the parser settles token prefixes that VBA gives more than one meaning.

use formula_vba_syntax::{
    parse_module, Argument, BinaryOp, CallForm, Diagnostic, ExprKind, IfForm, LabelKind,
    ParsedModule, StmtKind,
};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn in_sub(body: &str) -> ParsedModule {
    parse_module(&format!("Sub T()\n{body}\nEnd Sub\n"))
}

fn body_of(body: &str) -> (Vec<StmtKind>, Vec<Diagnostic>) {
    let parsed = in_sub(body);
    let stmts = parsed.module.procedures[0]
        .body
        .iter()
        .map(|s| s.kind.clone())
        .collect();
    (stmts, parsed.diagnostics)
}

fn without_spans(mut value: Value) -> Value {
    fn strip(value: &mut Value) {
        match value {
            Value::Object(map) => {
                map.remove("span");
                map.values_mut().for_each(strip);
            }
            Value::Array(items) => items.iter_mut().for_each(strip),
            _ => {}
        }
    }
    strip(&mut value);
    value
}

#[test]
fn then_followed_by_a_line_break_opens_a_block() {
    let (stmts, diags) = body_of(
        "If a Then b = 1\nIf a Then\n    b = 2\nEnd If\nIf a Then ' trailing note\n    b = 3\nEnd If",
    );
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(stmts.len(), 3);
    assert!(matches!(&stmts[0], StmtKind::If(s) if s.form == IfForm::Inline && s.then_branch.len() == 1));
    assert!(matches!(&stmts[1], StmtKind::If(s) if s.form == IfForm::Block));
    assert!(matches!(&stmts[2], StmtKind::If(s) if s.form == IfForm::Block));
}

#[test]
fn single_line_if_takes_statement_lists_and_else() {
    let (stmts, diags) = body_of("If ok Then a = 1: b = 2 Else c = 3: d = 4\nIf ok Then 100");
    assert!(diags.is_empty(), "{diags:?}");
    let StmtKind::If(s) = &stmts[0] else {
        panic!("expected If, got {:?}", stmts[0]);
    };
    assert_eq!(s.then_branch.len(), 2);
    assert_eq!(s.else_branch.as_ref().map(Vec::len), Some(2));
    let StmtKind::If(jump) = &stmts[1] else {
        panic!("expected If, got {:?}", stmts[1]);
    };
    assert!(matches!(&jump.then_branch[0].kind, StmtKind::GoTo(target) if target.name == "100"));
}

#[test]
fn else_if_on_one_line_is_elseif() {
    let spaced = in_sub("If a Then\n    x = 1\nElse If b Then\n    x = 2\nElse\n    x = 3\nEnd If");
    let joined = in_sub("If a Then\n    x = 1\nElseIf b Then\n    x = 2\nElse\n    x = 3\nEnd If");
    assert!(spaced.diagnostics.is_empty(), "{:?}", spaced.diagnostics);
    assert!(joined.diagnostics.is_empty(), "{:?}", joined.diagnostics);

    let StmtKind::If(s) = &spaced.module.procedures[0].body[0].kind else {
        panic!("expected If");
    };
    assert_eq!(s.else_ifs.len(), 1);
    assert!(s.else_branch.is_some());

    let spaced = serde_json::to_value(&spaced.module.procedures).unwrap();
    let joined = serde_json::to_value(&joined.module.procedures).unwrap();
    assert_eq!(without_spans(spaced), without_spans(joined));
}

#[test]
fn call_forms() {
    let (stmts, diags) = body_of(
        "MsgBox \"x\", vbOKOnly\nFoo(1, 2)\nFoo (1)\nFoo (1), 2\nCall Foo(1, 2)\nCall Foo\nDoWork\nws.Range(\"A1\").Select",
    );
    assert!(diags.is_empty(), "{diags:?}");

    let call = |i: usize| match &stmts[i] {
        StmtKind::Call(c) => c.clone(),
        other => panic!("statement {i}: expected a call, got {other:?}"),
    };
    assert_eq!(call(0).form, CallForm::Bare);
    assert_eq!(call(0).args.len(), 2);
    assert_eq!(call(1).form, CallForm::Parenthesized);
    assert_eq!(call(1).args.len(), 2);

    // A space before `(` makes the parentheses part of the first argument.
    let spaced = call(2);
    assert_eq!(spaced.form, CallForm::Bare);
    assert!(matches!(&spaced.args[0], Argument::Positional(e) if matches!(e.kind, ExprKind::Paren(_))));
    assert_eq!(call(3).form, CallForm::Bare);
    assert_eq!(call(3).args.len(), 2);

    assert_eq!(call(4).form, CallForm::Explicit);
    assert_eq!(call(4).args.len(), 2);
    assert_eq!(call(5).form, CallForm::Explicit);
    assert!(call(5).args.is_empty());

    assert!(matches!(&stmts[6], StmtKind::Expr(e) if e.as_identifier() == Some("DoWork")));
    assert!(matches!(&stmts[7], StmtKind::Expr(e) if matches!(e.kind, ExprKind::Member(_))));
}

#[test]
fn assignment_versus_comparison() {
    let (stmts, diags) = body_of("x = y = 3\nFoo a = b\narr(1, 2) = 5");
    assert!(diags.is_empty(), "{diags:?}");

    let StmtKind::Assign(assign) = &stmts[0] else {
        panic!("expected assignment, got {:?}", stmts[0]);
    };
    assert!(matches!(&assign.value.kind, ExprKind::Binary(b) if b.op == BinaryOp::Eq));

    let StmtKind::Call(call) = &stmts[1] else {
        panic!("expected call, got {:?}", stmts[1]);
    };
    assert!(matches!(&call.args[0], Argument::Positional(e) if matches!(&e.kind, ExprKind::Binary(b) if b.op == BinaryOp::Eq)));

    // The target side of an assignment indexes rather than calls.
    let StmtKind::Assign(store) = &stmts[2] else {
        panic!("expected assignment, got {:?}", stmts[2]);
    };
    assert!(matches!(store.target.kind, ExprKind::Index(_)));
}

#[test]
fn labels_versus_statements() {
    let (stmts, diags) = body_of("Cleanup:\nFoo: Bar\n10 x = 1\n20:");
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(stmts.len(), 6);
    assert!(matches!(&stmts[0], StmtKind::Label(l) if l.name == "Cleanup" && l.kind == LabelKind::Name));
    assert!(matches!(&stmts[1], StmtKind::Expr(e) if e.as_identifier() == Some("Foo")));
    assert!(matches!(&stmts[2], StmtKind::Expr(e) if e.as_identifier() == Some("Bar")));
    assert!(matches!(&stmts[3], StmtKind::Label(l) if l.name == "10" && l.kind == LabelKind::LineNumber));
    assert!(matches!(&stmts[4], StmtKind::Assign(_)));
    assert!(matches!(&stmts[5], StmtKind::Label(l) if l.name == "20"));
}

#[test]
fn line_continuations_join_physical_lines() {
    let parsed = parse_module(
        "Function Add(ByVal a As Long, _\n             ByVal b As Long) As Long\n    Add = a + _\n          b\nEnd Function\n",
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let add = &parsed.module.procedures[0];
    assert_eq!(add.params.len(), 2);
    assert_eq!(add.body.len(), 1);
    let StmtKind::Assign(assign) = &add.body[0].kind else {
        panic!("expected assignment, got {:?}", add.body[0].kind);
    };
    assert!(matches!(&assign.value.kind, ExprKind::Binary(b) if b.op == BinaryOp::Add));
    assert_eq!(assign.value.span.end.line, 4);
}

#[test]
fn bare_end_is_a_statement_and_end_if_is_a_terminator() {
    let (stmts, diags) = body_of("If done Then End\nIf done Then\n    End\nEnd If\nEnd");
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(stmts.len(), 3);
    assert!(matches!(&stmts[0], StmtKind::If(s) if matches!(s.then_branch[0].kind, StmtKind::End)));
    assert!(matches!(&stmts[1], StmtKind::If(s) if s.form == IfForm::Block && s.then_branch.len() == 1));
    assert!(matches!(stmts[2], StmtKind::End));
}

#[test]
fn keywords_after_a_dot_are_member_names() {
    let (stmts, diags) = body_of("ws.Cells(1, 1).End(xlUp).Select\nx = rs!Name & rs.Type");
    assert!(diags.is_empty(), "{diags:?}");
    assert!(matches!(&stmts[0], StmtKind::Expr(e) if matches!(e.kind, ExprKind::Member(_))));
    assert!(matches!(&stmts[1], StmtKind::Assign(_)));
}
