use formula_vba_syntax::{
    parse_module, parse_module_with_options, CallForm, Declaration, DirectiveKind, ExprKind,
    IfForm, LabelKind, ModuleKind, ModuleOption, ParseOptions, ProcedureKind, StmtKind,
    TestPosition, Visibility,
};
use pretty_assertions::assert_eq;

const INVENTORY: &str = include_str!("fixtures/inventory.bas");
const ACCOUNT: &str = include_str!("fixtures/account.cls");

#[test]
fn standard_module_fixture_parses_cleanly() {
    let parsed = parse_module(INVENTORY);
    assert!(parsed.diagnostics.is_empty(), "{:#?}", parsed.diagnostics);
    let module = &parsed.module;

    assert_eq!(module.kind, ModuleKind::Standard);
    assert!(module.header.is_none());
    assert_eq!(module.attribute("vb_name"), Some("\"Inventory\""));
    let options: Vec<ModuleOption> = module.options.iter().map(|o| o.option).collect();
    assert_eq!(options, vec![ModuleOption::Explicit, ModuleOption::Base(1)]);
    assert!(module.comments.iter().any(|c| c.text.contains("Stock keeping")));

    // Const, Enum, Type, two variables, and the `#If` block with its two `Declare`s.
    assert_eq!(module.declarations.len(), 10);
    assert!(matches!(&module.declarations[0], Declaration::Const(c) if c.visibility == Some(Visibility::Private)));
    let Declaration::Enum(level) = &module.declarations[1] else {
        panic!("expected enum, got {:?}", module.declarations[1]);
    };
    assert_eq!(level.members.len(), 3);
    assert!(level.members[1].value.is_none());
    let Declaration::Type(item) = &module.declarations[2] else {
        panic!("expected type, got {:?}", module.declarations[2]);
    };
    assert_eq!(item.fields.len(), 3);
    assert!(item.fields[0].ty.fixed_length.is_some());
    assert_eq!(item.fields[2].bounds.as_ref().map(Vec::len), Some(1));
    assert!(matches!(&module.declarations[5], Declaration::Directive(d) if matches!(d.kind, DirectiveKind::If(_))));
    assert!(matches!(&module.declarations[6], Declaration::Declare(d) if d.ptr_safe));
    assert!(matches!(&module.declarations[8], Declaration::Declare(d) if !d.ptr_safe && d.lib == "kernel32"));
    assert!(matches!(&module.declarations[9], Declaration::Directive(d) if d.kind == DirectiveKind::EndIf));

    let names: Vec<&str> = module.procedures.iter().map(|p| p.name.name.as_str()).collect();
    assert_eq!(names, vec!["AddItem", "Total", "Describe", "Report"]);
}

#[test]
fn procedure_bodies_have_the_expected_shape() {
    let parsed = parse_module(INVENTORY);
    let module = &parsed.module;

    let add = module.procedure("additem").expect("AddItem");
    assert_eq!(add.params.len(), 2);
    assert!(add.params[1].optional);
    assert!(add.params[1].default.is_some());
    assert_eq!(add.body.len(), 4);
    assert!(matches!(&add.body[0].kind, StmtKind::Dim(d) if d.vars.len() == 2));
    let StmtKind::If(guard) = &add.body[1].kind else {
        panic!("expected If, got {:?}", add.body[1].kind);
    };
    assert_eq!(guard.form, IfForm::Inline);
    assert!(matches!(&guard.then_branch[0].kind, StmtKind::Call(c) if c.form == CallForm::Bare && c.args.len() == 3));
    let StmtKind::For(scan) = &add.body[2].kind else {
        panic!("expected For, got {:?}", add.body[2].kind);
    };
    assert_eq!(scan.next_counter.as_ref().map(|c| c.name.as_str()), Some("i"));
    let StmtKind::If(insert) = &add.body[3].kind else {
        panic!("expected If, got {:?}", add.body[3].kind);
    };
    assert_eq!(insert.form, IfForm::Block);
    let StmtKind::With(with) = &insert.then_branch[1].kind else {
        panic!("expected With, got {:?}", insert.then_branch[1].kind);
    };
    assert_eq!(with.body.len(), 2);
    assert!(matches!(&with.body[0].kind, StmtKind::Assign(a) if matches!(&a.target.kind, ExprKind::Member(m) if m.object.is_none())));

    // The comment line inside `Total` leaves a blank line behind.
    let total = module.procedure("Total").expect("Total");
    assert!(total.body.iter().any(|s| s.is_blank()));
    assert_eq!(total.return_type.as_ref().map(|t| t.name.as_str()), Some("Currency"));

    let describe = module.procedure("Describe").expect("Describe");
    let StmtKind::Select(select) = &describe.body[0].kind else {
        panic!("expected Select, got {:?}", describe.body[0].kind);
    };
    assert_eq!(select.cases.len(), 3);
    assert_eq!(select.cases[1].conditions.len(), 2);
    assert!(select.else_branch.is_some());

    let report = module.procedure("Report").expect("Report");
    assert_eq!(report.body.len(), 8);
    assert!(matches!(&report.body[2].kind, StmtKind::DebugPrint(items) if items.len() == 2));
    assert!(matches!(&report.body[3].kind, StmtKind::Do(d) if d.test.as_ref().map(|t| t.position) == Some(TestPosition::Top)));
    assert!(matches!(&report.body[5].kind, StmtKind::Label(l) if l.name == "Failed" && l.kind == LabelKind::Name));
}

#[test]
fn class_module_fixture_parses_cleanly() {
    let parsed = parse_module(ACCOUNT);
    assert!(parsed.diagnostics.is_empty(), "{:#?}", parsed.diagnostics);
    let module = &parsed.module;

    assert_eq!(module.kind, ModuleKind::Class);
    let header = module.header.as_ref().expect("class header");
    assert!(header.is_class);
    assert_eq!(header.version, "1.0");
    assert_eq!(header.properties, vec!["BEGIN", "MultiUse = -1", "END"]);
    assert_eq!(module.attributes.len(), 5);
    assert_eq!(module.attribute("VB_Exposed"), Some("False"));

    assert!(matches!(&module.declarations[0], Declaration::Event(e) if e.name.name == "BalanceChanged" && e.params.len() == 1));
    let kinds: Vec<ProcedureKind> = module.procedures.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ProcedureKind::PropertyGet,
            ProcedureKind::PropertyLet,
            ProcedureKind::PropertyGet,
            ProcedureKind::Sub,
            ProcedureKind::Function,
            ProcedureKind::Sub,
        ]
    );
    assert_eq!(module.procedures[5].visibility, Visibility::Private);

    let withdraw = module.procedure("WITHDRAW").expect("Withdraw");
    let StmtKind::If(check) = &withdraw.body[0].kind else {
        panic!("expected If, got {:?}", withdraw.body[0].kind);
    };
    assert_eq!(check.else_ifs.len(), 1);
    assert_eq!(check.else_branch.as_ref().map(Vec::len), Some(3));
    assert!(matches!(&check.else_branch.as_ref().unwrap()[1].kind, StmtKind::RaiseEvent(r) if r.args.len() == 1));

    let init = module.procedure("Class_Initialize").expect("Class_Initialize");
    assert!(matches!(&init.body[0].kind, StmtKind::Set(s) if matches!(&s.value.kind, ExprKind::New(n) if n == "Collection")));
}

#[test]
fn module_kind_can_be_supplied_by_the_caller() {
    let options = ParseOptions {
        module_kind: Some(ModuleKind::Class),
        ..ParseOptions::default()
    };
    let parsed = parse_module_with_options("Private m As Long\n", &options);
    assert_eq!(parsed.module.kind, ModuleKind::Class);
    assert_eq!(parse_module("Private m As Long\n").module.kind, ModuleKind::Standard);
}

#[test]
fn form_header_is_kept_verbatim() {
    let src = "VERSION 5.00\n\
Begin {C62A69F0-16DC-11CE-9E98-00AA00574A4F} UserForm1\n\
   Caption         =   \"Pick\"\n\
   ClientHeight    =   3000\n\
End\n\
Attribute VB_Name = \"UserForm1\"\n\
Private Sub UserForm_Click()\n\
End Sub\n";
    let parsed = parse_module(src);
    assert!(parsed.diagnostics.is_empty(), "{:#?}", parsed.diagnostics);
    assert_eq!(parsed.module.kind, ModuleKind::Form);
    let header = parsed.module.header.as_ref().expect("form header");
    assert_eq!(header.guid.as_deref(), Some("{C62A69F0-16DC-11CE-9E98-00AA00574A4F}"));
    assert_eq!(header.properties.len(), 4);
    assert_eq!(parsed.module.procedures.len(), 1);
}

#[test]
fn clause_level_nodes_carry_their_own_spans() {
    let src = "\
Sub T()
    Do While n < 10
        n = n + 1
    Loop
    Select Case n
        Case Is >= 10, 1 To 3
    End Select
    Debug.Print a; b
    MsgBox \"hi\", Title:=\"Note\"
End Sub
";
    let parsed = parse_module(src);
    assert!(parsed.diagnostics.is_empty(), "{:#?}", parsed.diagnostics);
    let body = &parsed.module.procedures[0].body;

    let StmtKind::Do(do_stmt) = &body[0].kind else {
        panic!("expected Do, got {:?}", body[0].kind);
    };
    let test = do_stmt.test.as_ref().expect("loop test");
    assert_eq!(test.span.slice(src), "While n < 10");

    let StmtKind::Select(select) = &body[1].kind else {
        panic!("expected Select, got {:?}", body[1].kind);
    };
    let conditions: Vec<&str> = select.cases[0]
        .conditions
        .iter()
        .map(|c| c.span().slice(src))
        .collect();
    assert_eq!(conditions, vec!["Is >= 10", "1 To 3"]);

    let StmtKind::DebugPrint(items) = &body[2].kind else {
        panic!("expected Debug.Print, got {:?}", body[2].kind);
    };
    let items: Vec<&str> = items.iter().map(|i| i.span.slice(src)).collect();
    assert_eq!(items, vec!["a;", "b"]);

    let StmtKind::Call(call) = &body[3].kind else {
        panic!("expected call, got {:?}", body[3].kind);
    };
    let args: Vec<&str> = call.args.iter().map(|a| a.span().slice(src)).collect();
    assert_eq!(args, vec!["\"hi\"", "Title:=\"Note\""]);
}
