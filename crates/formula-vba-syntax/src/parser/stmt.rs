use crate::ast::{
    AssignStmt, CallForm, CallStmt, CaseClause, CaseCondition, DoStmt, ElseIfClause, ExitKind,
    Expr, ExprKind, ForEachStmt, ForStmt, Ident, IfForm, IfStmt, Label, LabelKind,
    LoopConditionKind, LoopTest, OnErrorAction, RaiseEventStmt, ResumeTarget, SelectStmt,
    SetStmt, Stmt, StmtKind, TestPosition, WhileStmt, WithStmt,
};
use crate::diagnostics::{ParseError, RecoveryKind};
use crate::resolver::{self, Closer};
use crate::span::Span;
use crate::token::{Keyword, Punct, TokenKind};

use super::expr::comparison_op;
use super::{BlockKind, BodyEnd, ExprContext, Parser};

/// Statements that own a body and their own terminator.
pub(crate) fn is_block(kind: &StmtKind) -> bool {
    match kind {
        StmtKind::If(s) => s.form == IfForm::Block,
        StmtKind::Select(_)
        | StmtKind::For(_)
        | StmtKind::ForEach(_)
        | StmtKind::Do(_)
        | StmtKind::While(_)
        | StmtKind::With(_)
        | StmtKind::Enum(_)
        | StmtKind::Type(_) => true,
        _ => false,
    }
}

/// States of the `If` recognizer. `Then` followed by a line break selects `BlockBody`; anything
/// else commits to `InlineBody`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfState {
    AwaitingThen,
    InlineBody,
    BlockBody,
    ElseIf,
    Else,
    AwaitingEndIf,
    Done,
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.pos;
        let kind = self.parse_statement_kind()?;
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_statement_kind(&mut self) -> Result<StmtKind, ParseError> {
        if resolver::is_label(&self.tokens, self.pos) {
            return Ok(self.parse_label());
        }

        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Keyword(kw) => match kw {
                Keyword::If => return self.nested(|p| p.parse_if()),
                Keyword::Select => return self.nested(|p| p.parse_select()),
                Keyword::For => return self.nested(|p| p.parse_for()),
                Keyword::Do => return self.nested(|p| p.parse_do()),
                Keyword::While => return self.nested(|p| p.parse_while()),
                Keyword::With => return self.nested(|p| p.parse_with()),
                Keyword::Dim
                | Keyword::Static
                | Keyword::Const
                | Keyword::Enum
                | Keyword::Type
                | Keyword::Public
                | Keyword::Private
                | Keyword::Global
                | Keyword::Friend
                | Keyword::Declare
                | Keyword::Event
                | Keyword::Implements => return self.parse_local_declaration(),
                Keyword::ReDim => return self.parse_redim(),
                Keyword::Set => {
                    self.pos += 1;
                    let (target, value) = self.parse_assignment_parts()?;
                    return Ok(StmtKind::Set(SetStmt { target, value }));
                }
                Keyword::Let => {
                    self.pos += 1;
                    let (target, value) = self.parse_assignment_parts()?;
                    return Ok(StmtKind::Assign(AssignStmt {
                        target,
                        value,
                        explicit_let: true,
                    }));
                }
                Keyword::Call => return self.parse_explicit_call(),
                Keyword::GoTo => {
                    self.pos += 1;
                    return Ok(StmtKind::GoTo(self.parse_label_ref()?));
                }
                Keyword::GoSub => {
                    self.pos += 1;
                    return Ok(StmtKind::GoSub(self.parse_label_ref()?));
                }
                Keyword::Return => {
                    self.pos += 1;
                    return Ok(StmtKind::Return);
                }
                Keyword::Exit => return self.parse_exit(),
                Keyword::On => return self.parse_on(),
                Keyword::Resume => return self.parse_resume(),
                Keyword::Stop => {
                    self.pos += 1;
                    return Ok(StmtKind::Stop);
                }
                Keyword::End => {
                    // `End If` and friends never reach here; the body loop claims them first.
                    self.pos += 1;
                    return Ok(StmtKind::End);
                }
                Keyword::Erase => {
                    self.pos += 1;
                    let mut targets = vec![self.parse_expr(ExprContext::Value)?];
                    while self.eat_punct(Punct::Comma) {
                        targets.push(self.parse_expr(ExprContext::Value)?);
                    }
                    return Ok(StmtKind::Erase(targets));
                }
                Keyword::RaiseEvent => return self.parse_raise_event(),
                Keyword::Error => {
                    // `Error 5` raises run-time error 5.
                    self.pos += 1;
                    let args = self.parse_bare_args()?;
                    return Ok(StmtKind::Call(CallStmt {
                        callee: Expr::new(ExprKind::Identifier(tok.text), tok.span),
                        args,
                        form: CallForm::Bare,
                    }));
                }
                Keyword::Get => {
                    if let Some(kind) = self.try_parse_file_io()? {
                        return Ok(kind);
                    }
                }
                Keyword::Me => {}
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected `{}` at start of statement", tok.text),
                        tok.span,
                    ))
                }
            },
            TokenKind::Punct(Punct::Hash) => {
                return Ok(StmtKind::Directive(self.parse_directive()?));
            }
            TokenKind::Identifier => {
                if tok.is_word("Attribute")
                    && self.peek_at(1).is_name_like()
                    && !self.peek_at(1).is_punct(Punct::Eq)
                {
                    return Ok(StmtKind::Attribute(self.parse_attribute()?));
                }
                if resolver::is_debug_print(&self.tokens, self.pos) {
                    self.pos += 3;
                    return Ok(StmtKind::DebugPrint(self.parse_output_list()?));
                }
                if let Some(kind) = self.try_parse_file_io()? {
                    return Ok(kind);
                }
            }
            _ => {}
        }
        self.parse_assignment_or_call()
    }

    /// Resolution order for a name-headed statement: assignment (lvalue chain then `=`), then
    /// a call with a glued argument list, then a bare-argument call, then a plain reference.
    fn parse_assignment_or_call(&mut self) -> Result<StmtKind, ParseError> {
        if resolver::has_outer_assignment(&self.tokens, self.pos) {
            let (target, value) = self.parse_assignment_parts()?;
            return Ok(StmtKind::Assign(AssignStmt {
                target,
                value,
                explicit_let: false,
            }));
        }

        let head = self.parse_postfix(ExprContext::Value, true)?;
        if self.at_statement_end() {
            return Ok(match head.kind {
                ExprKind::Call(call) => StmtKind::Call(CallStmt {
                    callee: *call.callee,
                    args: call.args,
                    form: CallForm::Parenthesized,
                }),
                _ => StmtKind::Expr(head),
            });
        }
        let args = self.parse_bare_args()?;
        Ok(StmtKind::Call(CallStmt {
            callee: head,
            args,
            form: CallForm::Bare,
        }))
    }

    fn parse_assignment_parts(&mut self) -> Result<(Expr, Expr), ParseError> {
        let target = self.parse_expr(ExprContext::LvalueTarget)?;
        self.expect_punct(Punct::Eq)?;
        let value = self.parse_expr(ExprContext::Value)?;
        Ok((target, value))
    }

    fn parse_explicit_call(&mut self) -> Result<StmtKind, ParseError> {
        self.expect_keyword(Keyword::Call)?;
        let head = self.parse_postfix(ExprContext::Value, false)?;
        let (callee, args) = match head.kind {
            ExprKind::Call(call) => (*call.callee, call.args),
            ExprKind::Identifier(_) | ExprKind::Member(_) | ExprKind::Bang(_) => (head, Vec::new()),
            _ => {
                return Err(ParseError::syntax(
                    "expected a procedure name after `Call`",
                    head.span,
                ))
            }
        };
        Ok(StmtKind::Call(CallStmt {
            callee,
            args,
            form: CallForm::Explicit,
        }))
    }

    fn parse_label(&mut self) -> StmtKind {
        let tok = self.bump();
        let kind = if tok.kind == TokenKind::NumberLiteral {
            LabelKind::LineNumber
        } else {
            LabelKind::Name
        };
        self.eat_punct(Punct::Colon);
        StmtKind::Label(Label {
            name: tok.text,
            kind,
        })
    }

    /// Target of `GoTo`/`GoSub`/`On Error GoTo`: a label name or a line number.
    fn parse_label_ref(&mut self) -> Result<Ident, ParseError> {
        let tok = self.peek();
        if tok.kind == TokenKind::NumberLiteral || tok.kind == TokenKind::Identifier {
            let tok = self.bump();
            Ok(Ident::new(tok.text, tok.span))
        } else {
            Err(self.unexpected("a label"))
        }
    }

    fn parse_exit(&mut self) -> Result<StmtKind, ParseError> {
        self.expect_keyword(Keyword::Exit)?;
        let kind = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Sub) => ExitKind::Sub,
            TokenKind::Keyword(Keyword::Function) => ExitKind::Function,
            TokenKind::Keyword(Keyword::Property) => ExitKind::Property,
            TokenKind::Keyword(Keyword::For) => ExitKind::For,
            TokenKind::Keyword(Keyword::Do) => ExitKind::Do,
            _ => return Err(self.unexpected("`Sub`, `Function`, `Property`, `For` or `Do`")),
        };
        self.pos += 1;
        Ok(StmtKind::Exit(kind))
    }

    fn parse_on(&mut self) -> Result<StmtKind, ParseError> {
        let on = self.expect_keyword(Keyword::On)?;
        if !self.eat_keyword(Keyword::Error) {
            // `On n GoTo a, b` / `On n GoSub a, b`.
            return Err(ParseError::unsupported(
                "computed `On ... GoTo`/`On ... GoSub` is not supported",
                on,
            ));
        }
        if self.eat_keyword(Keyword::Resume) {
            self.expect_keyword(Keyword::Next)?;
            return Ok(StmtKind::OnError(OnErrorAction::ResumeNext));
        }
        self.expect_keyword(Keyword::GoTo)?;
        if self.at_punct(Punct::Minus) && self.peek_at(1).text == "1" {
            self.pos += 2;
            return Ok(StmtKind::OnError(OnErrorAction::GoToMinusOne));
        }
        let target = self.parse_label_ref()?;
        if target.name == "0" {
            return Ok(StmtKind::OnError(OnErrorAction::GoToZero));
        }
        Ok(StmtKind::OnError(OnErrorAction::GoTo(target.name)))
    }

    fn parse_resume(&mut self) -> Result<StmtKind, ParseError> {
        self.expect_keyword(Keyword::Resume)?;
        if self.eat_keyword(Keyword::Next) {
            return Ok(StmtKind::Resume(ResumeTarget::Next));
        }
        if self.at_statement_end() {
            return Ok(StmtKind::Resume(ResumeTarget::Current));
        }
        let target = self.parse_label_ref()?;
        if target.name == "0" {
            return Ok(StmtKind::Resume(ResumeTarget::Current));
        }
        Ok(StmtKind::Resume(ResumeTarget::Label(target.name)))
    }

    fn parse_raise_event(&mut self) -> Result<StmtKind, ParseError> {
        self.expect_keyword(Keyword::RaiseEvent)?;
        let name = self.expect_ident("an event name")?;
        let args = if self.eat_punct(Punct::LParen) {
            self.parse_paren_args()?
        } else {
            Vec::new()
        };
        Ok(StmtKind::RaiseEvent(RaiseEventStmt { name, args }))
    }

    // -----------------------------------------------------------------------------------------
    // Block statements
    // -----------------------------------------------------------------------------------------

    /// Header expression of a block statement; failures are recovered in place.
    fn parse_header_expr(&mut self) -> Expr {
        match self.parse_expr(ExprContext::Value) {
            Ok(expr) => expr,
            Err(err) => self.recover_header(err),
        }
    }

    /// After a block header: anything but a statement boundary is reported and skipped.
    pub(super) fn finish_header(&mut self) {
        if !self.at_statement_end() {
            let err = self.unexpected("end of statement");
            self.skip_to_line_end();
            self.report(err, RecoveryKind::SkippedToLineEnd);
        }
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::If)?;
        let mut state = IfState::AwaitingThen;
        let mut condition = None;
        let mut form = IfForm::Block;
        let mut then_branch = Vec::new();
        let mut else_ifs: Vec<ElseIfClause> = Vec::new();
        let mut else_branch: Option<Vec<Stmt>> = None;

        while state != IfState::Done {
            state = match state {
                IfState::AwaitingThen => {
                    let cond = self.parse_header_expr();
                    let recovered = matches!(cond.kind, ExprKind::Error);
                    condition = Some(cond);
                    if self.at_line_end() {
                        // Header already recovered, or `Then` missing: assume the block form.
                        if !recovered {
                            let err = self.unexpected("`Then`");
                            self.report(err, RecoveryKind::SkippedToLineEnd);
                        }
                        IfState::BlockBody
                    } else if self.at_keyword(Keyword::Then) {
                        let then_pos = self.pos;
                        self.pos += 1;
                        if resolver::then_opens_block(&self.tokens, then_pos) {
                            IfState::BlockBody
                        } else {
                            IfState::InlineBody
                        }
                    } else {
                        let err = self.unexpected("`Then`");
                        self.skip_to_line_end();
                        self.report(err, RecoveryKind::SkippedToLineEnd);
                        IfState::BlockBody
                    }
                }
                IfState::InlineBody => {
                    form = IfForm::Inline;
                    then_branch = self.parse_inline_body();
                    if self.eat_keyword(Keyword::Else) {
                        else_branch = Some(self.parse_inline_body());
                    }
                    IfState::Done
                }
                IfState::BlockBody => {
                    let (body, end) = self.parse_body(BlockKind::If);
                    then_branch = body;
                    self.next_if_state(end, opened_at)
                }
                IfState::ElseIf => {
                    let clause_start = self.current_span();
                    self.consume_closer(Closer::ElseIf);
                    let cond = self.parse_header_expr();
                    if !self.at_line_end() {
                        if let Err(err) = self.expect_keyword(Keyword::Then) {
                            self.skip_to_line_end();
                            self.report(err, RecoveryKind::SkippedToLineEnd);
                        }
                    }
                    if !self.at_line_end() {
                        let err = ParseError::syntax(
                            "`ElseIf ... Then` must be followed by a line break",
                            self.current_span(),
                        );
                        self.skip_to_line_end();
                        self.report(err, RecoveryKind::SkippedToLineEnd);
                    }
                    let (body, end) = self.parse_body(BlockKind::If);
                    else_ifs.push(ElseIfClause {
                        condition: cond,
                        body,
                        span: clause_start.to(self.prev_span()),
                    });
                    self.next_if_state(end, opened_at)
                }
                IfState::Else => {
                    self.consume_closer(Closer::Else);
                    let mut body = Vec::new();
                    let next = loop {
                        let (part, end) = self.parse_body(BlockKind::If);
                        body.extend(part);
                        match end {
                            BodyEnd::Closer(Closer::EndIf) => break IfState::AwaitingEndIf,
                            BodyEnd::Closer(closer) => {
                                // `Else`/`ElseIf` after `Else`: report it and keep going.
                                let start = self.pos;
                                let err = ParseError::syntax(
                                    format!("`{}` after `Else`", closer.as_str()),
                                    self.current_span(),
                                );
                                self.consume_closer(closer);
                                let node = self.recover(start, err);
                                body.push(Stmt::new(
                                    StmtKind::Error(node.clone()),
                                    node.span,
                                ));
                            }
                            other => {
                                self.report_unterminated(BlockKind::If, opened_at, other);
                                break IfState::Done;
                            }
                        }
                    };
                    else_branch = Some(body);
                    next
                }
                IfState::AwaitingEndIf => {
                    self.consume_closer(Closer::EndIf);
                    IfState::Done
                }
                IfState::Done => IfState::Done,
            };
        }

        Ok(StmtKind::If(IfStmt {
            form,
            condition: condition.unwrap_or_else(|| Expr::new(ExprKind::Error, opened_at)),
            then_branch,
            else_ifs,
            else_branch,
        }))
    }

    fn next_if_state(&mut self, end: BodyEnd, opened_at: Span) -> IfState {
        match end {
            BodyEnd::Closer(Closer::EndIf) => IfState::AwaitingEndIf,
            BodyEnd::Closer(Closer::ElseIf) => IfState::ElseIf,
            BodyEnd::Closer(Closer::Else) => IfState::Else,
            other => {
                self.report_unterminated(BlockKind::If, opened_at, other);
                IfState::Done
            }
        }
    }

    /// `:`-separated statements up to the line end or an `Else` belonging to this `If`.
    fn parse_inline_body(&mut self) -> Vec<Stmt> {
        self.inline_if_depth += 1;
        let mut body = Vec::new();
        loop {
            while self.eat_punct(Punct::Colon) {}
            if self.at_line_end() || self.at_keyword(Keyword::Else) {
                break;
            }
            // `If x Then 100` jumps to line 100.
            if self.at_kind(TokenKind::NumberLiteral) && body.is_empty() {
                let next = self.peek_at(1);
                if next.is_line_end() || next.is_keyword(Keyword::Else) {
                    let tok = self.bump();
                    body.push(Stmt::new(
                        StmtKind::GoTo(Ident::new(tok.text, tok.span)),
                        tok.span,
                    ));
                    continue;
                }
            }
            body.extend(self.parse_statement_recovering());
            if !self.eat_punct(Punct::Colon) {
                break;
            }
        }
        self.inline_if_depth -= 1;
        body
    }

    fn parse_select(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::Select)?;
        let subject = match self.expect_keyword(Keyword::Case) {
            Ok(_) => self.parse_header_expr(),
            Err(err) => self.recover_header(err),
        };
        self.finish_header();

        let mut cases = Vec::new();
        let mut else_branch = None;
        let (stray, mut end) = self.parse_body(BlockKind::Select);
        for stmt in stray {
            if !stmt.is_blank() {
                self.report(
                    ParseError::syntax("statement before the first `Case`", stmt.span),
                    RecoveryKind::Skipped,
                );
            }
        }

        loop {
            match end {
                BodyEnd::Closer(Closer::Case) => {
                    let clause_start = self.current_span();
                    self.pos += 1;
                    let is_else = self.eat_keyword(Keyword::Else);
                    let conditions = if is_else {
                        Vec::new()
                    } else {
                        match self.parse_case_conditions() {
                            Ok(conditions) => conditions,
                            Err(err) => {
                                self.skip_to_line_end();
                                self.report(err, RecoveryKind::SkippedToLineEnd);
                                Vec::new()
                            }
                        }
                    };
                    self.finish_header();
                    let (body, next) = self.parse_body(BlockKind::Select);
                    if is_else {
                        if else_branch.is_some() {
                            self.report(
                                ParseError::syntax("duplicate `Case Else`", clause_start),
                                RecoveryKind::Skipped,
                            );
                        }
                        else_branch = Some(body);
                    } else {
                        if else_branch.is_some() {
                            self.report(
                                ParseError::syntax("`Case` after `Case Else`", clause_start),
                                RecoveryKind::Skipped,
                            );
                        }
                        cases.push(CaseClause {
                            conditions,
                            body,
                            span: clause_start.to(self.prev_span()),
                        });
                    }
                    end = next;
                }
                BodyEnd::Closer(Closer::EndSelect) => {
                    self.consume_closer(Closer::EndSelect);
                    break;
                }
                other => {
                    self.report_unterminated(BlockKind::Select, opened_at, other);
                    break;
                }
            }
        }

        Ok(StmtKind::Select(SelectStmt {
            subject,
            cases,
            else_branch,
        }))
    }

    fn parse_case_conditions(&mut self) -> Result<Vec<CaseCondition>, ParseError> {
        let mut conditions = Vec::new();
        loop {
            let start = self.pos;
            if self.eat_keyword(Keyword::Is) {
                let Some(op) = comparison_op(self.peek()) else {
                    return Err(self.unexpected("a comparison operator after `Is`"));
                };
                self.pos += 1;
                let value = self.parse_expr(ExprContext::Value)?;
                conditions.push(CaseCondition::Is {
                    op,
                    value,
                    span: self.span_from(start),
                });
            } else {
                let from = self.parse_expr(ExprContext::Value)?;
                if self.eat_keyword(Keyword::To) {
                    let to = self.parse_expr(ExprContext::Value)?;
                    conditions.push(CaseCondition::Range {
                        from,
                        to,
                        span: self.span_from(start),
                    });
                } else {
                    conditions.push(CaseCondition::Value(from));
                }
            }
            if !self.eat_punct(Punct::Comma) {
                return Ok(conditions);
            }
        }
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::For)?;
        if self.eat_keyword(Keyword::Each) {
            return Ok(self.parse_for_each(opened_at));
        }

        let header = (|| -> Result<_, ParseError> {
            let counter = self.parse_expr(ExprContext::LvalueTarget)?;
            self.expect_punct(Punct::Eq)?;
            let start = self.parse_expr(ExprContext::Value)?;
            self.expect_keyword(Keyword::To)?;
            let end = self.parse_expr(ExprContext::Value)?;
            let step = if self.eat_keyword(Keyword::Step) {
                Some(self.parse_expr(ExprContext::Value)?)
            } else {
                None
            };
            Ok((counter, start, end, step))
        })();
        let (counter, start, end, step) = match header {
            Ok(parts) => parts,
            Err(err) => {
                let placeholder = self.recover_header(err);
                (placeholder.clone(), placeholder.clone(), placeholder, None)
            }
        };
        self.finish_header();

        let (body, body_end) = self.parse_body(BlockKind::For);
        let next_counter = self.finish_loop(BlockKind::For, opened_at, body_end);
        Ok(StmtKind::For(ForStmt {
            counter,
            start,
            end,
            step,
            body,
            next_counter,
        }))
    }

    fn parse_for_each(&mut self, opened_at: Span) -> StmtKind {
        let header = (|| -> Result<_, ParseError> {
            let element = self.parse_expr(ExprContext::LvalueTarget)?;
            self.expect_keyword(Keyword::In)?;
            let collection = self.parse_expr(ExprContext::Value)?;
            Ok((element, collection))
        })();
        let (element, collection) = match header {
            Ok(parts) => parts,
            Err(err) => {
                let placeholder = self.recover_header(err);
                (placeholder.clone(), placeholder)
            }
        };
        self.finish_header();

        let (body, body_end) = self.parse_body(BlockKind::ForEach);
        let next_counter = self.finish_loop(BlockKind::ForEach, opened_at, body_end);
        StmtKind::ForEach(ForEachStmt {
            element,
            collection,
            body,
            next_counter,
        })
    }

    /// Consume the `Next` that closes a `For` loop. `Next i, j` closes this loop with `i` and
    /// leaves `j` for the enclosing loop.
    fn finish_loop(&mut self, kind: BlockKind, opened_at: Span, end: BodyEnd) -> Option<Ident> {
        if end != BodyEnd::Closer(Closer::Next) {
            self.report_unterminated(kind, opened_at, end);
            return None;
        }
        if !self.pending_next.is_empty() {
            return Some(self.pending_next.remove(0));
        }
        self.pos += 1;
        if self.at_statement_end() {
            return None;
        }
        let mut counters = Vec::new();
        loop {
            match self.expect_ident("a loop counter after `Next`") {
                Ok(counter) => counters.push(counter),
                Err(err) => {
                    let recovery = self.skip_to_statement_end();
                    self.report(err, recovery);
                    break;
                }
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        if counters.is_empty() {
            return None;
        }
        let own = counters.remove(0);
        self.pending_next = counters;
        Some(own)
    }

    fn parse_loop_test(&mut self, position: TestPosition) -> Option<LoopTest> {
        let start = self.pos;
        let kind = if self.eat_keyword(Keyword::While) {
            LoopConditionKind::While
        } else if self.eat_keyword(Keyword::Until) {
            LoopConditionKind::Until
        } else {
            return None;
        };
        let condition = self.parse_header_expr();
        Some(LoopTest {
            kind,
            position,
            condition,
            span: self.span_from(start),
        })
    }

    fn parse_do(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::Do)?;
        let mut test = self.parse_loop_test(TestPosition::Top);
        self.finish_header();

        let (body, end) = self.parse_body(BlockKind::Do);
        if end == BodyEnd::Closer(Closer::Loop) {
            let loop_span = self.bump().span;
            if let Some(bottom) = self.parse_loop_test(TestPosition::Bottom) {
                if test.is_some() {
                    self.report(
                        ParseError::syntax(
                            "`Do` loop has a condition at both the top and the bottom",
                            loop_span,
                        ),
                        RecoveryKind::Skipped,
                    );
                } else {
                    test = Some(bottom);
                }
            }
        } else {
            self.report_unterminated(BlockKind::Do, opened_at, end);
        }
        Ok(StmtKind::Do(DoStmt { test, body }))
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::While)?;
        let condition = self.parse_header_expr();
        self.finish_header();
        let (body, end) = self.parse_body(BlockKind::While);
        if end == BodyEnd::Closer(Closer::Wend) {
            self.pos += 1;
        } else {
            self.report_unterminated(BlockKind::While, opened_at, end);
        }
        Ok(StmtKind::While(WhileStmt { condition, body }))
    }

    fn parse_with(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.expect_keyword(Keyword::With)?;
        let object = self.parse_header_expr();
        self.finish_header();
        let (body, end) = self.parse_body(BlockKind::With);
        if end == BodyEnd::Closer(Closer::EndWith) {
            self.consume_closer(Closer::EndWith);
        } else {
            self.report_unterminated(BlockKind::With, opened_at, end);
        }
        Ok(StmtKind::With(WithStmt { object, body }))
    }
}
