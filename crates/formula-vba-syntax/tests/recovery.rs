use formula_vba_syntax::{
    parse_module, parse_module_with_options, Diagnostic, ErrorKind, ParseOptions, RecoveryKind,
    StmtKind,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn errors(src: &str) -> Vec<Diagnostic> {
    parse_module(src).errors().cloned().collect()
}

#[test]
fn each_unterminated_block_is_reported_once() {
    let openers = [
        "If ready Then",
        "For i = 1 To 10",
        "For Each cell In cells",
        "Do While busy",
        "While busy",
        "With ws.Range(\"A1\")",
        "Select Case mode\n        Case 1",
    ];
    for opener in openers {
        let src = format!("Sub T()\n    {opener}\n        x = 1\nEnd Sub\n");
        let errs = errors(&src);
        assert_eq!(errs.len(), 1, "{opener}: {errs:?}");
        assert!(errs[0].message.contains("opened at line 2"), "{opener}: {}", errs[0].message);
        assert_eq!(errs[0].recovery, RecoveryKind::ClosedByOuterTerminator, "{opener}");
        assert_eq!(errs[0].span.start.line, 2);
    }
}

#[test]
fn procedure_at_end_of_input() {
    let errs = errors("Sub Main()\n    x = 1\n");
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::ClosedAtEndOfInput);
    assert!(errs[0].message.contains("line 1"), "{}", errs[0].message);
    assert!(errs[0].message.contains("end of input"), "{}", errs[0].message);
}

#[test]
fn next_procedure_header_closes_an_open_one() {
    let parsed = parse_module("Function F()\n    F = 1\nSub G()\n    x = 2\nEnd Sub\n");
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::ClosedByOuterTerminator);
    assert_eq!(parsed.module.procedures.len(), 2);
    assert_eq!(parsed.module.procedures[0].body.len(), 1);
    assert_eq!(parsed.module.procedures[1].body.len(), 1);
}

#[test]
fn type_and_enum_blocks() {
    let errs = errors("Type Point\n    X As Long\n");
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::ClosedAtEndOfInput);

    let parsed = parse_module("Private Enum Mode\n    Fast\nPublic Sub Run()\nEnd Sub\n");
    assert_eq!(parsed.errors().count(), 1, "{:?}", parsed.diagnostics);
    assert_eq!(parsed.module.procedures.len(), 1);
}

#[test]
fn outer_terminator_closes_nested_blocks() {
    let src = "Sub T()\n    For i = 1 To 3\n        If a Then\n            x = 1\n    Next\n    y = 2\nEnd Sub\n";
    let parsed = parse_module(src);
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert!(errs[0].message.contains("`If`"), "{}", errs[0].message);
    assert!(errs[0].message.contains("opened at line 3"), "{}", errs[0].message);

    let body = &parsed.module.procedures[0].body;
    assert_eq!(body.len(), 2);
    let StmtKind::For(for_stmt) = &body[0].kind else {
        panic!("expected For, got {:?}", body[0].kind);
    };
    assert_eq!(for_stmt.body.len(), 1);
    assert!(matches!(body[1].kind, StmtKind::Assign(_)));
}

#[test]
fn bad_statement_becomes_an_error_node() {
    let parsed = parse_module("Sub T()\n    x = = 1\n    y = 2\nEnd Sub\n");
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::SkippedToLineEnd);
    assert_eq!(errs[0].kind, ErrorKind::Syntax);

    let body = &parsed.module.procedures[0].body;
    assert_eq!(body.len(), 2);
    let StmtKind::Error(node) = &body[0].kind else {
        panic!("expected an error node, got {:?}", body[0].kind);
    };
    assert_eq!(node.text, "x = = 1");
    assert!(matches!(body[1].kind, StmtKind::Assign(_)));
}

#[test]
fn recovery_stops_at_a_statement_separator() {
    let parsed = parse_module("Sub T()\n    x = )): y = 2\nEnd Sub\n");
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::SkippedToSeparator);
    let body = &parsed.module.procedures[0].body;
    assert_eq!(body.len(), 2);
    assert!(matches!(body[0].kind, StmtKind::Error(_)));
    assert!(matches!(body[1].kind, StmtKind::Assign(_)));
}

#[test]
fn unterminated_string_is_lexical() {
    let parsed = parse_module("Sub T()\n    x = \"abc\n    y = 2\nEnd Sub\n");
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].kind, ErrorKind::Lexical);
    assert_eq!(errs[0].message, "unterminated string literal");
    assert_eq!(parsed.module.procedures[0].body.len(), 2);
}

#[test]
fn stray_terminator_is_reported_and_skipped() {
    let parsed = parse_module("Sub T()\n    End If\n    x = 1\nEnd Sub\n");
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert!(errs[0].message.contains("`End If`"), "{}", errs[0].message);
    assert_eq!(parsed.module.procedures.len(), 1);
    assert_eq!(parsed.module.procedures[0].body.len(), 2);
}

#[test]
fn stray_else_inside_a_loop_opened_on_an_if_line() {
    let parsed = parse_module("Sub T()\n    If a Then For i = 1 To 2\n    Else\n    Next\nEnd Sub\n");
    assert!(parsed.has_errors());
    assert_eq!(parsed.module.procedures.len(), 1);
}

#[test]
fn broken_module_keeps_every_procedure() {
    let src = "\
Sub A()
    x = = 1
End Sub

Sub B()
    If x Then
        y = 1
End Sub

Sub C()
    z = 3
End Sub
";
    let parsed = parse_module(src);
    let lines: Vec<u32> = parsed.errors().map(|d| d.span.start.line).collect();
    assert_eq!(lines, vec![2, 6]);
    let names: Vec<&str> = parsed.module.procedures.iter().map(|p| p.name.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(parsed.module.procedures[2].body.len(), 1);
}

fn nested_ifs(levels: usize) -> String {
    format!(
        "Sub A()\n{}    x = 1\n{}End Sub\n",
        "If x Then\n".repeat(levels),
        "End If\n".repeat(levels)
    )
}

#[test]
fn moderately_nested_blocks_parse_cleanly() {
    let parsed = parse_module(&nested_ifs(40));
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
}

#[test]
fn block_past_the_nesting_limit_is_one_diagnostic() {
    for levels in [100, 250] {
        let parsed = parse_module(&nested_ifs(levels));
        let errs: Vec<_> = parsed.errors().collect();
        assert_eq!(errs.len(), 1, "{levels}: {errs:?}");
        assert_eq!(errs[0].recovery, RecoveryKind::SkippedBlock);
        assert!(errs[0].message.contains("nesting"), "{}", errs[0].message);
        // `Sub A()` is line 1, so the 64th `If` sits on line 65.
        assert_eq!(errs[0].span.start.line, 65);
        assert_eq!(parsed.module.procedures.len(), 1);
        assert_eq!(parsed.module.procedures[0].body.len(), 1);
    }
}

#[test]
fn skipped_loop_hands_extra_next_counters_outward() {
    let options = ParseOptions {
        max_nesting_depth: 4,
        ..ParseOptions::default()
    };
    let src = "\
Sub A()
    For a = 1 To 2
        For b = 1 To 2
            For c = 1 To 2
                For d = 1 To 2
                    x = 1
                Next d, c
        Next b
    Next a
End Sub
";
    let parsed = parse_module_with_options(src, &options);
    let errs: Vec<_> = parsed.errors().collect();
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert_eq!(errs[0].recovery, RecoveryKind::SkippedBlock);
    assert_eq!(errs[0].span.start.line, 5);
    let StmtKind::Error(node) = &body_at_depth(&parsed.module.procedures[0].body, 3)[0].kind else {
        panic!("expected the innermost loop to be skipped");
    };
    assert!(node.text.starts_with("For d = 1 To 2"), "{}", node.text);
    assert!(node.text.ends_with("Next d, c"), "{}", node.text);
}

fn body_at_depth(body: &[formula_vba_syntax::Stmt], depth: usize) -> &[formula_vba_syntax::Stmt] {
    if depth == 0 {
        return body;
    }
    let StmtKind::For(for_stmt) = &body[0].kind else {
        panic!("expected For, got {:?}", body[0].kind);
    };
    body_at_depth(&for_stmt.body, depth - 1)
}

const VOCABULARY: &[&str] = &[
    "Sub", "Function", "Property", "Get", "End", "If", "Then", "Else", "ElseIf", "For", "Each",
    "In", "To", "Step", "Next", "Do", "Loop", "While", "Until", "Wend", "With", "Select", "Case",
    "Is", "Dim", "As", "New", "Set", "Call", "Exit", "On", "Error", "GoTo", "Resume", "Type",
    "Enum", "Private", "Public", "Declare", "Lib", "Open", "Print", "#1", "x", "Foo", "ws",
    ".Name", "!Field", "1", "2.5", "&HFF", "\"s\"", "\"open", "#1/2/2003#", "(", ")", ",", ":",
    "=", "+", "-", "*", "^", "&", "<>", "And", "Not", "TypeOf", "_", "'note", "\n", "\n", "\n",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn arbitrary_token_soup_never_panics(words in prop::collection::vec(prop::sample::select(VOCABULARY), 0..80)) {
        let src = words.join(" ");
        let parsed = parse_module(&src);
        for diagnostic in &parsed.diagnostics {
            prop_assert!(diagnostic.span.start.offset <= diagnostic.span.end.offset);
            prop_assert!(diagnostic.span.end.offset <= src.len());
        }
    }
}
