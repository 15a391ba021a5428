//! Recursive-descent parser for VBA modules.
//!
//! The statement parser (`stmt`, `decl`, `io`) drives the Pratt expression parser (`expr`) and
//! consults [`crate::resolver`] at every point where two productions share a token prefix.
//! Parsing never aborts: a statement that fails becomes an [`ErrorNode`] and the parser resumes
//! at the next line or `:` boundary.

mod decl;
mod expr;
mod io;
mod stmt;

use serde::{Deserialize, Serialize};

use crate::ast::{ErrorNode, Expr, Ident, Module, ProcedureKind, Stmt, StmtKind};
use crate::diagnostics::{Diagnostic, ParseError, RecoveryKind, SourceError};
use crate::lexer::{significant_tokens, tokenize};
use crate::options::ParseOptions;
use crate::resolver::{self, Closer};
use crate::span::{Position, Span};
use crate::token::{Keyword, Punct, Token, TokenKind};

pub(crate) use expr::ExprContext;

/// Result of [`parse_module`]: always a tree, plus whatever went wrong building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedModule {
    pub module: Module,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedModule {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

pub fn parse_module(source: &str) -> ParsedModule {
    parse_module_with_options(source, &ParseOptions::default())
}

pub fn parse_module_with_options(source: &str, options: &ParseOptions) -> ParsedModule {
    let all_tokens = tokenize(source);
    let comments = all_tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| crate::ast::Comment {
            text: t.text.clone(),
            span: t.span,
        })
        .collect();
    let mut parser = Parser::new(source, significant_tokens(&all_tokens), options);
    let mut module = parser.parse_module();
    module.comments = comments;
    if !parser.diagnostics.is_empty() {
        log::debug!(
            "parsed module with {} diagnostic(s)",
            parser.diagnostics.len()
        );
    }
    ParsedModule {
        module,
        diagnostics: parser.diagnostics,
    }
}

/// Entry point for callers holding raw bytes (exported module streams, files on disk).
///
/// This is the only hard failure: text that is not UTF-8, or that contains NUL bytes, is not
/// VBA source.
pub fn parse_module_bytes(bytes: &[u8], options: &ParseOptions) -> Result<ParsedModule, SourceError> {
    let source = std::str::from_utf8(bytes).map_err(|e| SourceError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    if let Some(offset) = source.bytes().position(|b| b == 0) {
        return Err(SourceError::Binary { offset });
    }
    Ok(parse_module_with_options(source, options))
}

/// Parse a standalone expression. Anything left over after the expression is an error.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = significant_tokens(&tokenize(source));
    let options = ParseOptions::default();
    let mut parser = Parser::new(source, tokens, &options);
    let expr = parser.parse_expr(ExprContext::Value)?;
    while parser.at_kind(TokenKind::Newline) {
        parser.pos += 1;
    }
    if !parser.at_kind(TokenKind::Eof) {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

/// Parse one expression starting at `position` in an already-filtered token stream.
///
/// Returns the expression and the position of the first token after it.
pub fn parse_expression_at(tokens: &[Token], position: usize) -> Result<(Expr, usize), ParseError> {
    let options = ParseOptions::default();
    let mut parser = Parser::new("", tokens.to_vec(), &options);
    parser.pos = position.min(parser.tokens.len() - 1);
    let expr = parser.parse_expr(ExprContext::Value)?;
    Ok((expr, parser.pos))
}

/// Blocks that need a terminator. All but `Type`/`Enum` hold statement lists parsed by
/// [`Parser::parse_body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    If,
    Select,
    For,
    ForEach,
    Do,
    While,
    With,
    Type,
    Enum,
    Procedure(ProcedureKind),
}

impl BlockKind {
    fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "If",
            BlockKind::Select => "Select Case",
            BlockKind::For => "For",
            BlockKind::ForEach => "For Each",
            BlockKind::Do => "Do",
            BlockKind::While => "While",
            BlockKind::With => "With",
            BlockKind::Type => "Type",
            BlockKind::Enum => "Enum",
            BlockKind::Procedure(kind) => kind.keyword(),
        }
    }

    fn accepts(self, closer: Closer) -> bool {
        match self {
            BlockKind::If => matches!(closer, Closer::EndIf | Closer::ElseIf | Closer::Else),
            BlockKind::Select => matches!(closer, Closer::EndSelect | Closer::Case),
            BlockKind::For | BlockKind::ForEach => closer == Closer::Next,
            BlockKind::Do => closer == Closer::Loop,
            BlockKind::While => closer == Closer::Wend,
            BlockKind::With => closer == Closer::EndWith,
            BlockKind::Type => closer == Closer::EndType,
            BlockKind::Enum => closer == Closer::EndEnum,
            // Any procedure terminator ends a procedure; a mismatch is reported by the caller.
            BlockKind::Procedure(_) => closer.is_procedure_terminator(),
        }
    }
}

/// Why a statement list stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyEnd {
    /// In front of a closer the current block accepts (not consumed).
    Closer(Closer),
    /// In front of a closer or procedure header that belongs to an enclosing block.
    Outer,
    Eof,
}

pub(crate) struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    options: &'a ParseOptions,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Blocks whose statement lists are currently being parsed, innermost last.
    blocks: Vec<BlockKind>,
    /// Counters still to be matched after `Next i, j` closed the innermost loop.
    pending_next: Vec<Ident>,
    /// >0 while parsing the body of a single-line `If`, where `Else` ends a statement.
    inline_if_depth: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str, mut tokens: Vec<Token>, options: &'a ParseOptions) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or_else(
                || Position::new(src.len(), 1, 1),
                |t| t.span.end,
            );
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::new(end, end),
                had_preceding_continuation: false,
                leading_space: false,
            });
        }
        Self {
            src,
            tokens,
            pos: 0,
            options,
            diagnostics: Vec::new(),
            blocks: Vec::new(),
            pending_next: Vec::new(),
            inline_if_depth: 0,
            depth: 0,
        }
    }

    // -----------------------------------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    fn at_punct(&self, p: Punct) -> bool {
        self.peek().is_punct(p)
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_word(word)
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Span, ParseError> {
        if self.at_keyword(kw) {
            Ok(self.bump().span)
        } else {
            Err(self.unexpected(&format!("`{kw}`")))
        }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<Span, ParseError> {
        if self.at_punct(p) {
            Ok(self.bump().span)
        } else {
            Err(self.unexpected(&format!("`{}`", p.as_str())))
        }
    }

    /// A declared name: identifiers only, so keywords cannot be redeclared.
    fn expect_ident(&mut self, what: &str) -> Result<Ident, ParseError> {
        if self.at_kind(TokenKind::Identifier) {
            let tok = self.bump();
            Ok(Ident::new(tok.text, tok.span))
        } else {
            Err(self.unexpected(what))
        }
    }

    /// A name after `.`, `!` or in other positions where keywords are ordinary names.
    fn expect_name(&mut self, what: &str) -> Result<Ident, ParseError> {
        if self.peek().is_name_like() {
            let tok = self.bump();
            Ok(Ident::new(tok.text, tok.span))
        } else {
            Err(self.unexpected(what))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(idx) => self.tokens[idx].span,
            None => self.current_span(),
        }
    }

    /// From the start of the token at `start` to the end of the last consumed token.
    fn span_from(&self, start: usize) -> Span {
        let first = self.tokens[start.min(self.tokens.len() - 1)].span;
        if self.pos > start {
            first.to(self.prev_span())
        } else {
            first
        }
    }

    /// Error for the current token. Lexical error tokens report their own problem.
    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Error(kind) => ParseError::lexical(kind.message(), tok.span),
            TokenKind::Newline => {
                ParseError::syntax(format!("expected {expected}, found end of line"), tok.span)
            }
            TokenKind::Eof => {
                ParseError::syntax(format!("expected {expected}, found end of input"), tok.span)
            }
            _ => ParseError::syntax(
                format!("expected {expected}, found `{}`", tok.text),
                tok.span,
            ),
        }
    }

    // -----------------------------------------------------------------------------------------
    // Statement boundaries and recovery
    // -----------------------------------------------------------------------------------------

    fn at_line_end(&self) -> bool {
        self.peek().is_line_end()
    }

    /// Newline, end of input, `:`, or `Else` inside a single-line `If`.
    fn at_statement_end(&self) -> bool {
        let tok = self.peek();
        tok.is_line_end()
            || tok.is_punct(Punct::Colon)
            || (self.inline_if_depth > 0 && tok.is_keyword(Keyword::Else))
    }

    fn expect_statement_end(&self) -> Result<(), ParseError> {
        if self.at_statement_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    fn skip_to_statement_end(&mut self) -> RecoveryKind {
        while !self.at_statement_end() {
            self.pos += 1;
        }
        if self.at_punct(Punct::Colon) {
            RecoveryKind::SkippedToSeparator
        } else {
            RecoveryKind::SkippedToLineEnd
        }
    }

    /// Up to the next `:` or line end, ignoring single-line `If` context.
    fn skip_statement(&mut self) {
        while !self.at_line_end() && !self.at_punct(Punct::Colon) {
            self.pos += 1;
        }
    }

    /// Skip the block opened at the cursor through its matching terminator without recursing.
    ///
    /// Stops early, in front of the line, at a procedure header or terminator so the enclosing
    /// procedure still closes normally.
    fn skip_block(&mut self) {
        let mut open = 0usize;
        loop {
            while self.at_kind(TokenKind::Newline) || self.at_punct(Punct::Colon) {
                self.pos += 1;
            }
            if self.at_kind(TokenKind::Eof)
                || resolver::starts_procedure(&self.tokens, self.pos).is_some()
            {
                return;
            }
            match resolver::closer_at(&self.tokens, self.pos) {
                Some(closer) if closer.is_procedure_terminator() => return,
                Some(closer) => {
                    let closed = resolver::blocks_closed(&self.tokens, self.pos, closer);
                    if closed > open {
                        // `Next d, c` where only `d` was skipped: `c` goes to the enclosing loop.
                        self.pos += 1;
                        let mut counters = Vec::new();
                        while !self.at_line_end() && !self.at_punct(Punct::Colon) {
                            let tok = self.bump();
                            if tok.kind == TokenKind::Identifier {
                                counters.push(Ident::new(tok.text, tok.span));
                            }
                        }
                        self.pending_next = counters.split_off(open.min(counters.len()));
                        return;
                    }
                    open -= closed;
                }
                None if resolver::opens_block(&self.tokens, self.pos) => open += 1,
                None => {}
            }
            self.skip_statement();
            if open == 0 {
                return;
            }
        }
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn report(&mut self, err: ParseError, recovery: RecoveryKind) {
        log::debug!("{} ({:?})", err, recovery);
        self.diagnostics.push(Diagnostic::from_error(err, recovery));
    }

    /// Skip the rest of the failed statement and build the node that stands in for it.
    fn recover(&mut self, start: usize, err: ParseError) -> ErrorNode {
        if self.pos == start && !self.at_line_end() && !self.at_punct(Punct::Colon) {
            // Always make progress, even when the offending token itself ends the statement.
            self.pos += 1;
        }
        let recovery = self.skip_to_statement_end();
        let span = self.span_from(start);
        let node = ErrorNode {
            message: err.message.clone(),
            text: span.slice(self.src).to_string(),
            span,
        };
        self.report(err, recovery);
        node
    }

    /// Block headers recover in place: report, skip the rest of the line, and keep parsing the
    /// body so its terminator is still matched.
    fn recover_header(&mut self, err: ParseError) -> Expr {
        let span = err.span;
        self.skip_to_line_end();
        self.report(err, RecoveryKind::SkippedToLineEnd);
        Expr::new(crate::ast::ExprKind::Error, span)
    }

    fn nesting_error(&self) -> ParseError {
        ParseError::syntax(
            format!(
                "nesting exceeds the limit of {} levels",
                self.options.max_nesting_depth
            ),
            self.current_span(),
        )
    }

    /// Run `f` one nesting level deeper, failing cleanly past `max_nesting_depth`.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(self.nesting_error());
        }
        self.depth += 1;
        let result = f(self);
        self.depth = self.depth.saturating_sub(1);
        result
    }

    // -----------------------------------------------------------------------------------------
    // Statement lists
    // -----------------------------------------------------------------------------------------

    /// Blank line: a newline directly following another newline (comment-only lines count).
    fn blank_line_here(&self) -> bool {
        self.at_kind(TokenKind::Newline)
            && self.pos > 0
            && self.tokens[self.pos - 1].kind == TokenKind::Newline
    }

    /// Parse statements until a closer, end of input, or the start of another procedure.
    ///
    /// `kind` is pushed on the block stack for the duration so that nested lists can tell a
    /// terminator that belongs to this block from a stray one.
    pub(crate) fn parse_body(&mut self, kind: BlockKind) -> (Vec<Stmt>, BodyEnd) {
        self.blocks.push(kind);
        // A block opened inside a single-line `If` runs on past that line.
        let inline_if_depth = std::mem::take(&mut self.inline_if_depth);
        let result = self.parse_body_inner(kind);
        self.inline_if_depth = inline_if_depth;
        self.blocks.pop();
        result
    }

    fn parse_body_inner(&mut self, kind: BlockKind) -> (Vec<Stmt>, BodyEnd) {
        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return (body, BodyEnd::Eof),
                TokenKind::Newline => {
                    if self.blank_line_here() {
                        body.push(Stmt::new(StmtKind::BlankLine, self.current_span()));
                    }
                    self.pos += 1;
                    continue;
                }
                TokenKind::Punct(Punct::Colon) => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            if !self.pending_next.is_empty() {
                if kind.accepts(Closer::Next) {
                    return (body, BodyEnd::Closer(Closer::Next));
                }
                if self.outer_accepts(Closer::Next) {
                    return (body, BodyEnd::Outer);
                }
                let extra = std::mem::take(&mut self.pending_next);
                for counter in extra {
                    self.report(
                        ParseError::syntax(
                            format!("`Next {}` has no matching `For`", counter.name),
                            counter.span,
                        ),
                        RecoveryKind::Skipped,
                    );
                }
            }

            if let Some(closer) = resolver::closer_at(&self.tokens, self.pos) {
                if kind.accepts(closer) {
                    return (body, BodyEnd::Closer(closer));
                }
                if self.outer_accepts(closer) {
                    return (body, BodyEnd::Outer);
                }
                let start = self.pos;
                let err = ParseError::syntax(
                    format!("`{}` without a matching block", closer.as_str()),
                    self.current_span(),
                );
                let node = self.recover(start, err);
                body.push(Stmt::new(StmtKind::Error(node.clone()), node.span));
                continue;
            }

            if resolver::starts_procedure(&self.tokens, self.pos).is_some() {
                return (body, BodyEnd::Outer);
            }

            body.extend(self.parse_statement_recovering());
        }
    }

    fn outer_accepts(&self, closer: Closer) -> bool {
        let outer = self.blocks.len().saturating_sub(1);
        self.blocks[..outer].iter().any(|b| b.accepts(closer))
    }

    /// Report a block that stopped without its own terminator. Exactly one diagnostic per
    /// unterminated block, naming the line it was opened on.
    pub(crate) fn report_unterminated(&mut self, kind: BlockKind, opened_at: Span, end: BodyEnd) {
        let recovery = match end {
            BodyEnd::Eof => RecoveryKind::ClosedAtEndOfInput,
            _ => RecoveryKind::ClosedByOuterTerminator,
        };
        let terminator = match kind {
            BlockKind::If => "End If",
            BlockKind::Select => "End Select",
            BlockKind::For | BlockKind::ForEach => "Next",
            BlockKind::Do => "Loop",
            BlockKind::While => "Wend",
            BlockKind::With => "End With",
            BlockKind::Type => "End Type",
            BlockKind::Enum => "End Enum",
            BlockKind::Procedure(p) => p.terminator(),
        };
        let found = if end == BodyEnd::Eof {
            "end of input".to_string()
        } else {
            format!("`{}`", self.peek().text)
        };
        self.report(
            ParseError::syntax(
                format!(
                    "unterminated `{}` block opened at line {}: expected `{terminator}` before {found}",
                    kind.keyword(),
                    opened_at.start.line
                ),
                opened_at,
            ),
            recovery,
        );
    }

    /// Consume a closer the current block accepted.
    fn consume_closer(&mut self, closer: Closer) -> Span {
        let width = closer.width(&self.tokens, self.pos);
        let start = self.current_span();
        self.pos += width;
        start.to(self.prev_span())
    }

    /// One statement with per-statement recovery. Usually yields one node; a line-number label
    /// followed by a statement yields two.
    fn parse_statement_recovering(&mut self) -> Vec<Stmt> {
        let start = self.pos;
        // The opener's own header expressions need one level beyond the block itself.
        if self.depth + 1 >= self.options.max_nesting_depth
            && resolver::opens_block(&self.tokens, start)
        {
            // One diagnostic for the whole block instead of one per orphaned terminator.
            let err = self.nesting_error();
            self.skip_block();
            let span = self.span_from(start);
            let node = ErrorNode {
                message: err.message.clone(),
                text: span.slice(self.src).to_string(),
                span,
            };
            self.report(err, RecoveryKind::SkippedBlock);
            return vec![Stmt::new(StmtKind::Error(node.clone()), node.span)];
        }
        match self.parse_statement() {
            Ok(stmt) => {
                let is_label = matches!(stmt.kind, StmtKind::Label(_));
                // A block closed by an outer terminator stops in front of that line.
                let closed_early = stmt::is_block(&stmt.kind)
                    && resolver::at_line_start(&self.tokens, self.pos);
                if is_label || closed_early || self.at_statement_end() {
                    return vec![stmt];
                }
                if stmt::is_block(&stmt.kind) {
                    // Junk after a block terminator: keep the block, drop the junk.
                    let err = self.unexpected("end of statement");
                    let recovery = self.skip_to_statement_end();
                    self.report(err, recovery);
                    return vec![stmt];
                }
                let err = self.unexpected("end of statement");
                let node = self.recover(start, err);
                vec![Stmt::new(StmtKind::Error(node.clone()), node.span)]
            }
            Err(err) => {
                let node = self.recover(start, err);
                vec![Stmt::new(StmtKind::Error(node.clone()), node.span)]
            }
        }
    }
}
