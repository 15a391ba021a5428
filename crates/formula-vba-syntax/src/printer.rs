//! Source printer.
//!
//! Output reparses to the same tree (spans aside). Comments are not re-emitted, statements
//! joined by `:` come out on separate lines, and blocks are re-indented by four spaces.
//! Parenthesized sub-expressions from the source are [`ExprKind::Paren`] nodes and print as
//! written; trees built by hand get the fewest parentheses their precedence tiers need.

use std::fmt::Write as _;

use crate::ast::{
    Argument, ArrayBound, CallForm, CaseCondition, CompareMode, ConstStmt, Declaration,
    DeclareDecl, DeclareKind, Directive, DirectiveKind, EnumDecl, Expr, ExprKind, FileIoStmt,
    IfForm, IfStmt, LabelKind, Literal, LoopConditionKind, Module, ModuleOption, OnErrorAction,
    OutputItem, OutputSeparator, Param, Passing, Precedence, Procedure, ResumeTarget, Stmt,
    StmtKind, TestPosition, TypeDecl, TypeRef, VarDeclStmt, Visibility,
};

const INDENT: &str = "    ";

pub fn print_module(module: &Module) -> String {
    let mut p = Printer::default();
    p.module(module);
    p.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(lit) => write_literal(out, lit),
        ExprKind::Identifier(name) => out.push_str(name),
        ExprKind::Me => out.push_str("Me"),
        ExprKind::Unary(u) => {
            out.push_str(u.op.as_str());
            let needs = !is_closed_form(&u.operand) && u.operand.precedence() < Precedence::Unary;
            write_operand(out, &u.operand, needs);
        }
        ExprKind::Binary(b) => {
            let prec = b.precedence;
            let left_needs = !is_closed_form(&b.left) && b.left.precedence() < prec;
            write_operand(out, &b.left, left_needs);
            let _ = write!(out, " {} ", b.op.as_str());
            // A prefix operator on the right extends as far as it can, so it never needs help.
            let right_needs = !matches!(b.right.kind, ExprKind::Unary(_))
                && !is_closed_form(&b.right)
                && b.right.precedence() <= prec;
            write_operand(out, &b.right, right_needs);
        }
        ExprKind::Member(m) => {
            if let Some(object) = &m.object {
                write_operand(out, object, object.precedence() < Precedence::Member);
            }
            out.push('.');
            out.push_str(&m.name);
        }
        ExprKind::Bang(b) => {
            if let Some(object) = &b.object {
                write_operand(out, object, object.precedence() < Precedence::Member);
            }
            out.push('!');
            out.push_str(&b.key);
        }
        ExprKind::Call(c) => {
            write_operand(out, &c.callee, c.callee.precedence() < Precedence::Member);
            write_args_paren(out, &c.args);
        }
        ExprKind::Index(i) => {
            write_operand(out, &i.target, i.target.precedence() < Precedence::Member);
            write_args_paren(out, &i.args);
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        ExprKind::New(name) => {
            out.push_str("New ");
            out.push_str(name);
        }
        ExprKind::TypeOf(t) => {
            out.push_str("TypeOf ");
            write_operand(out, &t.operand, t.operand.precedence() <= Precedence::Relational);
            out.push_str(" Is ");
            out.push_str(&t.type_name);
        }
        ExprKind::AddressOf(name) => {
            out.push_str("AddressOf ");
            out.push_str(name);
        }
        ExprKind::Error => {}
    }
}

/// `TypeOf x Is T`, `New T` and `AddressOf f` end at a name, so no operator can reach into them.
fn is_closed_form(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::TypeOf(_) | ExprKind::New(_) | ExprKind::AddressOf(_)
    )
}

fn write_operand(out: &mut String, expr: &Expr, parens: bool) {
    if parens {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

fn write_literal(out: &mut String, lit: &Literal) {
    match lit {
        Literal::Number(n) => out.push_str(&n.text),
        Literal::String(s) => out.push_str(&quote(s)),
        Literal::Date(d) => {
            let _ = write!(out, "#{d}#");
        }
        Literal::Boolean(true) => out.push_str("True"),
        Literal::Boolean(false) => out.push_str("False"),
        Literal::Nothing => out.push_str("Nothing"),
        Literal::Empty => out.push_str("Empty"),
        Literal::Null => out.push_str("Null"),
        Literal::BuiltinConstant(name) => out.push_str(name),
    }
}

fn write_args(out: &mut String, args: &[Argument]) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match arg {
            Argument::Positional(e) => write_expr(out, e),
            Argument::Named { name, value, .. } => {
                let _ = write!(out, "{}:=", name.name);
                write_expr(out, value);
            }
            Argument::Missing(_) => {}
        }
    }
}

fn write_args_paren(out: &mut String, args: &[Argument]) {
    out.push('(');
    write_args(out, args);
    out.push(')');
}

fn type_ref(ty: &TypeRef) -> String {
    let mut s = String::from(" As ");
    if ty.is_new {
        s.push_str("New ");
    }
    s.push_str(&ty.name);
    if let Some(len) = &ty.fixed_length {
        s.push_str(" * ");
        write_expr(&mut s, len);
    }
    s
}

fn bounds(bounds: &[ArrayBound]) -> String {
    let parts: Vec<String> = bounds
        .iter()
        .map(|b| match &b.lower {
            Some(lower) => format!("{} To {}", print_expr(lower), print_expr(&b.upper)),
            None => print_expr(&b.upper),
        })
        .collect();
    format!("({})", parts.join(", "))
}

fn params(params: &[Param]) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = String::new();
            if p.optional {
                s.push_str("Optional ");
            }
            match p.passing {
                Some(Passing::ByVal) => s.push_str("ByVal "),
                Some(Passing::ByRef) => s.push_str("ByRef "),
                None => {}
            }
            if p.param_array {
                s.push_str("ParamArray ");
            }
            s.push_str(&p.name.name);
            if p.is_array {
                s.push_str("()");
            }
            if let Some(ty) = &p.ty {
                s.push_str(&type_ref(ty));
            }
            if let Some(default) = &p.default {
                s.push_str(" = ");
                write_expr(&mut s, default);
            }
            s
        })
        .collect();
    format!("({})", parts.join(", "))
}

fn visibility_prefix(vis: Option<Visibility>) -> String {
    vis.map(|v| format!("{} ", v.as_str())).unwrap_or_default()
}

fn output_items(items: &[OutputItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if let Some(expr) = &item.expr {
            write_expr(&mut out, expr);
        }
        match item.separator {
            Some(OutputSeparator::Semicolon) => out.push(';'),
            Some(OutputSeparator::Comma) => out.push(','),
            None => {}
        }
        if i + 1 < items.len() {
            out.push(' ');
        }
    }
    out
}

fn file_number(expr: &Expr) -> String {
    format!("#{}", print_expr(expr))
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Column-zero line (labels, directives).
    fn flush_left(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block(&mut self, body: &[Stmt]) {
        self.depth += 1;
        for stmt in body {
            self.stmt(stmt);
        }
        self.depth -= 1;
    }

    fn module(&mut self, module: &Module) {
        if let Some(header) = &module.header {
            let class = if header.is_class { " CLASS" } else { "" };
            self.line(&format!("VERSION {}{class}", header.version));
            for property in &header.properties {
                self.line(property);
            }
        }
        for attr in &module.attributes {
            self.line(&format!("Attribute {} = {}", attr.name, attr.value));
        }
        for option in &module.options {
            let text = match option.option {
                ModuleOption::Explicit => "Option Explicit".to_string(),
                ModuleOption::Base(n) => format!("Option Base {n}"),
                ModuleOption::Compare(CompareMode::Binary) => "Option Compare Binary".to_string(),
                ModuleOption::Compare(CompareMode::Text) => "Option Compare Text".to_string(),
                ModuleOption::Compare(CompareMode::Database) => {
                    "Option Compare Database".to_string()
                }
                ModuleOption::PrivateModule => "Option Private Module".to_string(),
            };
            self.line(&text);
        }
        for decl in &module.declarations {
            self.declaration(decl);
        }
        for procedure in &module.procedures {
            if !self.out.is_empty() {
                self.line("");
            }
            self.procedure(procedure);
        }
    }

    fn declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Variables(v) => self.line(&var_decls(v)),
            Declaration::Const(c) => self.line(&const_stmt(c)),
            Declaration::Enum(e) => self.enum_decl(e),
            Declaration::Type(t) => self.type_decl(t),
            Declaration::Declare(d) => self.line(&declare(d)),
            Declaration::Event(e) => self.line(&format!(
                "{}Event {}{}",
                visibility_prefix(e.visibility),
                e.name.name,
                params(&e.params)
            )),
            Declaration::Implements(i) => self.line(&format!("Implements {}", i.interface)),
            Declaration::Directive(d) => self.flush_left(&directive(d)),
            Declaration::Error(e) => self.line(&e.text),
        }
    }

    fn enum_decl(&mut self, e: &EnumDecl) {
        self.line(&format!("{}Enum {}", visibility_prefix(e.visibility), e.name.name));
        self.depth += 1;
        for member in &e.members {
            match &member.value {
                Some(value) => self.line(&format!("{} = {}", member.name.name, print_expr(value))),
                None => self.line(&member.name.name),
            }
        }
        self.depth -= 1;
        self.line("End Enum");
    }

    fn type_decl(&mut self, t: &TypeDecl) {
        self.line(&format!("{}Type {}", visibility_prefix(t.visibility), t.name.name));
        self.depth += 1;
        for field in &t.fields {
            let dims = field.bounds.as_deref().map(bounds).unwrap_or_default();
            self.line(&format!("{}{dims}{}", field.name.name, type_ref(&field.ty)));
        }
        self.depth -= 1;
        self.line("End Type");
    }

    fn procedure(&mut self, p: &Procedure) {
        let mut header = String::new();
        if p.visibility != Visibility::Public {
            header.push_str(p.visibility.as_str());
            header.push(' ');
        }
        if p.is_static {
            header.push_str("Static ");
        }
        let _ = write!(header, "{} {}{}", p.kind.keyword(), p.name.name, params(&p.params));
        if let Some(ty) = &p.return_type {
            header.push_str(&type_ref(ty));
        }
        self.line(&header);
        self.block(&p.body);
        self.line(p.kind.terminator());
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::If(s) if s.form == IfForm::Block => self.block_if(s),
            StmtKind::Select(s) => {
                self.line(&format!("Select Case {}", print_expr(&s.subject)));
                self.depth += 1;
                for case in &s.cases {
                    let conditions: Vec<String> =
                        case.conditions.iter().map(case_condition).collect();
                    self.line(&format!("Case {}", conditions.join(", ")));
                    self.block(&case.body);
                }
                if let Some(body) = &s.else_branch {
                    self.line("Case Else");
                    self.block(body);
                }
                self.depth -= 1;
                self.line("End Select");
            }
            StmtKind::For(f) => {
                let mut header = format!(
                    "For {} = {} To {}",
                    print_expr(&f.counter),
                    print_expr(&f.start),
                    print_expr(&f.end)
                );
                if let Some(step) = &f.step {
                    let _ = write!(header, " Step {}", print_expr(step));
                }
                self.line(&header);
                self.block(&f.body);
                self.line(&next_line(f.next_counter.as_ref().map(|c| c.name.as_str())));
            }
            StmtKind::ForEach(f) => {
                self.line(&format!(
                    "For Each {} In {}",
                    print_expr(&f.element),
                    print_expr(&f.collection)
                ));
                self.block(&f.body);
                self.line(&next_line(f.next_counter.as_ref().map(|c| c.name.as_str())));
            }
            StmtKind::Do(d) => {
                let test = d.test.as_ref().map(|t| {
                    let word = match t.kind {
                        LoopConditionKind::While => "While",
                        LoopConditionKind::Until => "Until",
                    };
                    (t.position, format!(" {word} {}", print_expr(&t.condition)))
                });
                match &test {
                    Some((TestPosition::Top, text)) => self.line(&format!("Do{text}")),
                    _ => self.line("Do"),
                }
                self.block(&d.body);
                match &test {
                    Some((TestPosition::Bottom, text)) => self.line(&format!("Loop{text}")),
                    _ => self.line("Loop"),
                }
            }
            StmtKind::While(w) => {
                self.line(&format!("While {}", print_expr(&w.condition)));
                self.block(&w.body);
                self.line("Wend");
            }
            StmtKind::With(w) => {
                self.line(&format!("With {}", print_expr(&w.object)));
                self.block(&w.body);
                self.line("End With");
            }
            StmtKind::Enum(e) => self.enum_decl(e),
            StmtKind::Type(t) => self.type_decl(t),
            StmtKind::Label(label) => match label.kind {
                LabelKind::Name => self.flush_left(&format!("{}:", label.name)),
                LabelKind::LineNumber => self.flush_left(&label.name),
            },
            StmtKind::Directive(d) => self.flush_left(&directive(d)),
            StmtKind::BlankLine => self.line(""),
            _ => self.line(&simple_stmt(&stmt.kind)),
        }
    }

    fn block_if(&mut self, s: &IfStmt) {
        self.line(&format!("If {} Then", print_expr(&s.condition)));
        self.block(&s.then_branch);
        for clause in &s.else_ifs {
            self.line(&format!("ElseIf {} Then", print_expr(&clause.condition)));
            self.block(&clause.body);
        }
        if let Some(body) = &s.else_branch {
            self.line("Else");
            self.block(body);
        }
        self.line("End If");
    }
}

fn next_line(counter: Option<&str>) -> String {
    match counter {
        Some(name) => format!("Next {name}"),
        None => "Next".to_string(),
    }
}

fn case_condition(c: &CaseCondition) -> String {
    match c {
        CaseCondition::Value(v) => print_expr(v),
        CaseCondition::Range { from, to, .. } => format!("{} To {}", print_expr(from), print_expr(to)),
        CaseCondition::Is { op, value, .. } => format!("Is {} {}", op.as_str(), print_expr(value)),
    }
}

fn directive(d: &Directive) -> String {
    match &d.kind {
        DirectiveKind::If(c) => format!("#If {} Then", print_expr(c)),
        DirectiveKind::ElseIf(c) => format!("#ElseIf {} Then", print_expr(c)),
        DirectiveKind::Else => "#Else".to_string(),
        DirectiveKind::EndIf => "#End If".to_string(),
        DirectiveKind::Const { name, value } => format!("#Const {} = {}", name.name, print_expr(value)),
    }
}

fn var_decls(v: &VarDeclStmt) -> String {
    let vars: Vec<String> = v
        .vars
        .iter()
        .map(|var| {
            let mut s = String::new();
            if var.with_events {
                s.push_str("WithEvents ");
            }
            s.push_str(&var.name.name);
            if let Some(b) = &var.bounds {
                s.push_str(&bounds(b));
            }
            if let Some(ty) = &var.ty {
                s.push_str(&type_ref(ty));
            }
            s
        })
        .collect();
    format!("{} {}", v.keyword.as_str(), vars.join(", "))
}

fn const_stmt(c: &ConstStmt) -> String {
    let consts: Vec<String> = c
        .consts
        .iter()
        .map(|k| {
            let ty = k.ty.as_ref().map(type_ref).unwrap_or_default();
            format!("{}{ty} = {}", k.name.name, print_expr(&k.value))
        })
        .collect();
    format!("{}Const {}", visibility_prefix(c.visibility), consts.join(", "))
}

fn declare(d: &DeclareDecl) -> String {
    let mut s = visibility_prefix(d.visibility);
    s.push_str("Declare ");
    if d.ptr_safe {
        s.push_str("PtrSafe ");
    }
    s.push_str(match d.kind {
        DeclareKind::Sub => "Sub ",
        DeclareKind::Function => "Function ",
    });
    let _ = write!(s, "{} Lib {}", d.name.name, quote(&d.lib));
    if let Some(alias) = &d.alias {
        let _ = write!(s, " Alias {}", quote(alias));
    }
    s.push(' ');
    s.push_str(&params(&d.params));
    if let Some(ty) = &d.return_type {
        s.push_str(&type_ref(ty));
    }
    s
}

/// Single-line statements, including a whole single-line `If`.
fn simple_stmt(kind: &StmtKind) -> String {
    match kind {
        StmtKind::Assign(a) => {
            let kw = if a.explicit_let { "Let " } else { "" };
            format!("{kw}{} = {}", print_expr(&a.target), print_expr(&a.value))
        }
        StmtKind::Set(s) => format!("Set {} = {}", print_expr(&s.target), print_expr(&s.value)),
        StmtKind::Call(c) => {
            let mut s = String::new();
            match c.form {
                CallForm::Explicit => {
                    s.push_str("Call ");
                    write_expr(&mut s, &c.callee);
                    if !c.args.is_empty() {
                        write_args_paren(&mut s, &c.args);
                    }
                }
                CallForm::Parenthesized => {
                    write_expr(&mut s, &c.callee);
                    write_args_paren(&mut s, &c.args);
                }
                CallForm::Bare => {
                    write_expr(&mut s, &c.callee);
                    s.push(' ');
                    write_args(&mut s, &c.args);
                }
            }
            s
        }
        StmtKind::Expr(e) => print_expr(e),
        StmtKind::Dim(v) => var_decls(v),
        StmtKind::Const(c) => const_stmt(c),
        StmtKind::ReDim(r) => {
            let vars: Vec<String> = r
                .vars
                .iter()
                .map(|v| {
                    let ty = v.ty.as_ref().map(type_ref).unwrap_or_default();
                    format!("{}{}{ty}", print_expr(&v.target), bounds(&v.bounds))
                })
                .collect();
            let preserve = if r.preserve { "Preserve " } else { "" };
            format!("ReDim {preserve}{}", vars.join(", "))
        }
        StmtKind::Erase(targets) => {
            let names: Vec<String> = targets.iter().map(print_expr).collect();
            format!("Erase {}", names.join(", "))
        }
        StmtKind::If(s) => inline_if(s),
        StmtKind::GoTo(target) => format!("GoTo {}", target.name),
        StmtKind::GoSub(target) => format!("GoSub {}", target.name),
        StmtKind::Return => "Return".to_string(),
        StmtKind::Exit(kind) => format!("Exit {}", kind.as_str()),
        StmtKind::OnError(action) => match action {
            OnErrorAction::ResumeNext => "On Error Resume Next".to_string(),
            OnErrorAction::GoToZero => "On Error GoTo 0".to_string(),
            OnErrorAction::GoToMinusOne => "On Error GoTo -1".to_string(),
            OnErrorAction::GoTo(label) => format!("On Error GoTo {label}"),
        },
        StmtKind::Resume(target) => match target {
            ResumeTarget::Current => "Resume".to_string(),
            ResumeTarget::Next => "Resume Next".to_string(),
            ResumeTarget::Label(label) => format!("Resume {label}"),
        },
        StmtKind::FileIo(io) => file_io(io),
        StmtKind::DebugPrint(items) if items.is_empty() => "Debug.Print".to_string(),
        StmtKind::DebugPrint(items) => format!("Debug.Print {}", output_items(items)),
        StmtKind::RaiseEvent(r) => {
            let mut s = format!("RaiseEvent {}", r.name.name);
            if !r.args.is_empty() {
                write_args_paren(&mut s, &r.args);
            }
            s
        }
        StmtKind::Attribute(a) => format!("Attribute {} = {}", a.name, a.value),
        StmtKind::Stop => "Stop".to_string(),
        StmtKind::End => "End".to_string(),
        StmtKind::Error(e) => e.text.clone(),
        // Multi-line forms are handled by the printer itself.
        StmtKind::Select(_)
        | StmtKind::For(_)
        | StmtKind::ForEach(_)
        | StmtKind::Do(_)
        | StmtKind::While(_)
        | StmtKind::With(_)
        | StmtKind::Enum(_)
        | StmtKind::Type(_)
        | StmtKind::Label(_)
        | StmtKind::Directive(_)
        | StmtKind::BlankLine => String::new(),
    }
}

fn inline_list(body: &[Stmt]) -> String {
    let parts: Vec<String> = body.iter().map(|s| simple_stmt(&s.kind)).collect();
    parts.join(": ")
}

fn inline_if(s: &IfStmt) -> String {
    let mut out = format!("If {} Then", print_expr(&s.condition));
    if s.then_branch.is_empty() && s.else_branch.is_none() {
        // A bare `Then` at the line end would open a block.
        out.push(':');
        return out;
    }
    if !s.then_branch.is_empty() {
        out.push(' ');
        out.push_str(&inline_list(&s.then_branch));
    }
    if let Some(body) = &s.else_branch {
        out.push_str(" Else");
        if !body.is_empty() {
            out.push(' ');
            out.push_str(&inline_list(body));
        }
    }
    out
}

fn file_io(io: &FileIoStmt) -> String {
    match io {
        FileIoStmt::Open {
            path,
            mode,
            file_number: n,
            record_length,
        } => {
            let mut s = format!(
                "Open {} For {} As {}",
                print_expr(path),
                mode.as_str(),
                file_number(n)
            );
            if let Some(len) = record_length {
                let _ = write!(s, " Len = {}", print_expr(len));
            }
            s
        }
        FileIoStmt::Close { file_numbers } if file_numbers.is_empty() => "Close".to_string(),
        FileIoStmt::Close { file_numbers } => {
            let numbers: Vec<String> = file_numbers.iter().map(file_number).collect();
            format!("Close {}", numbers.join(", "))
        }
        FileIoStmt::Print { file_number: n, items } => {
            with_items(format!("Print {}", file_number(n)), items)
        }
        FileIoStmt::Write { file_number: n, items } => {
            with_items(format!("Write {}", file_number(n)), items)
        }
        FileIoStmt::Input {
            file_number: n,
            targets,
        } => {
            let targets: Vec<String> = targets.iter().map(print_expr).collect();
            format!("Input {}, {}", file_number(n), targets.join(", "))
        }
        FileIoStmt::LineInput {
            file_number: n,
            target,
        } => format!("Line Input {}, {}", file_number(n), print_expr(target)),
        FileIoStmt::Get {
            file_number: n,
            record,
            target,
        } => format!(
            "Get {}, {}, {}",
            file_number(n),
            record.as_ref().map(print_expr).unwrap_or_default(),
            print_expr(target)
        ),
        FileIoStmt::Put {
            file_number: n,
            record,
            source,
        } => format!(
            "Put {}, {}, {}",
            file_number(n),
            record.as_ref().map(print_expr).unwrap_or_default(),
            print_expr(source)
        ),
    }
}

fn with_items(head: String, items: &[OutputItem]) -> String {
    if items.is_empty() {
        head
    } else {
        format!("{head}, {}", output_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryExpr, BinaryOp, NumberLiteral, UnaryExpr, UnaryOp};
    use crate::span::Span;
    use pretty_assertions::assert_eq;

    fn num(text: &str) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Number(NumberLiteral::new(text))), Span::default())
    }

    fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary(BinaryExpr {
                op,
                precedence: op.precedence(),
                left: Box::new(left),
                right: Box::new(right),
            }),
            Span::default(),
        )
    }

    #[test]
    fn constructed_trees_get_minimal_parentheses() {
        let sum = bin(BinaryOp::Add, num("1"), num("2"));
        assert_eq!(print_expr(&bin(BinaryOp::Mul, sum.clone(), num("3"))), "(1 + 2) * 3");
        assert_eq!(print_expr(&bin(BinaryOp::Add, num("3"), sum.clone())), "3 + (1 + 2)");
        assert_eq!(print_expr(&bin(BinaryOp::Add, sum.clone(), num("3"))), "1 + 2 + 3");
        let neg = Expr::new(
            ExprKind::Unary(UnaryExpr {
                op: UnaryOp::Neg,
                precedence: Precedence::Unary,
                operand: Box::new(sum),
            }),
            Span::default(),
        );
        assert_eq!(print_expr(&neg), "-(1 + 2)");
    }

    #[test]
    fn strings_are_requoted() {
        let e = Expr::new(ExprKind::Literal(Literal::String("say \"hi\"".into())), Span::default());
        assert_eq!(print_expr(&e), "\"say \"\"hi\"\"\"");
    }
}
