//! Module structure: header preamble, `Option`/`Attribute` lines, declarations and procedures.
//!
//! Declarations go through the same sub-rules at module level and inside procedure bodies;
//! only the wrapper differs ([`crate::Declaration`] vs [`crate::StmtKind`]).

use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{
    ArrayBound, Attribute, CompareMode, ConstDecl, ConstStmt, DeclKeyword, Declaration,
    DeclareDecl, DeclareKind, Directive, DirectiveKind, EnumDecl, EnumMember, EventDecl, Expr,
    ExprKind, Ident, ImplementsDecl, MemberExpr, Module, ModuleHeader, ModuleKind, ModuleOption,
    OptionStmt, Param, Passing, Procedure, ProcedureKind, ReDimStmt, ReDimVar, StmtKind, TypeDecl,
    TypeField, TypeRef, VarDecl, VarDeclStmt, Visibility,
};
use crate::diagnostics::{ParseError, RecoveryKind};
use crate::resolver::{self, Closer};
use crate::span::Span;
use crate::token::{Keyword, Punct, TokenKind};

use super::{BlockKind, BodyEnd, ExprContext, Parser};

fn guid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[0-9A-Fa-f-]+\}").expect("valid regex"))
}

fn visibility_keyword(vis: Visibility) -> DeclKeyword {
    match vis {
        Visibility::Public => DeclKeyword::Public,
        Visibility::Private => DeclKeyword::Private,
        Visibility::Friend => DeclKeyword::Friend,
        Visibility::Global => DeclKeyword::Global,
    }
}

/// Module-level declaration or procedure-body statement built by the shared sub-rules.
enum Member {
    Vars(VarDeclStmt),
    Const(ConstStmt),
    Enum(EnumDecl),
    Type(TypeDecl),
    Declare(DeclareDecl),
    Event(EventDecl),
    Implements(ImplementsDecl),
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_module(&mut self) -> Module {
        let start = self.pos;
        let header = self.parse_module_header();
        let kind = match (&self.options.module_kind, &header) {
            (Some(kind), _) => *kind,
            (None, Some(h)) if h.is_class => ModuleKind::Class,
            (None, Some(_)) => ModuleKind::Form,
            (None, None) => ModuleKind::Standard,
        };

        let mut module = Module {
            kind,
            header,
            attributes: Vec::new(),
            options: Vec::new(),
            declarations: Vec::new(),
            procedures: Vec::new(),
            comments: Vec::new(),
            span: Span::default(),
        };

        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Punct(Punct::Colon) => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let line_start = self.pos;
            if self.at_word("Attribute") && self.peek_at(1).is_name_like() {
                match self.parse_attribute() {
                    Ok(attr) => module.attributes.push(attr),
                    Err(err) => {
                        let node = self.recover(line_start, err);
                        module.declarations.push(Declaration::Error(node));
                    }
                }
                continue;
            }
            if self.at_keyword(Keyword::Option) {
                match self.parse_option() {
                    Ok(option) => module.options.push(option),
                    Err(err) => {
                        let node = self.recover(line_start, err);
                        module.declarations.push(Declaration::Error(node));
                    }
                }
                self.finish_header();
                continue;
            }
            if let Some(kind) = resolver::starts_procedure(&self.tokens, self.pos) {
                let procedure = self.parse_procedure(kind);
                module.procedures.push(procedure);
                continue;
            }
            if let Some(closer) = resolver::closer_at(&self.tokens, self.pos) {
                let err = ParseError::syntax(
                    format!("`{}` without a matching block", closer.as_str()),
                    self.current_span(),
                );
                let node = self.recover(line_start, err);
                module.declarations.push(Declaration::Error(node));
                continue;
            }

            match self.parse_module_declaration() {
                Ok(decl) => {
                    module.declarations.push(decl);
                    // An `Enum`/`Type` closed by the next line already stands at a line start.
                    if !resolver::at_line_start(&self.tokens, self.pos) {
                        self.finish_header();
                    }
                }
                Err(err) => {
                    let node = self.recover(line_start, err);
                    module.declarations.push(Declaration::Error(node));
                }
            }
        }

        module.span = self.span_from(start);
        log::trace!(
            "module: {} declaration(s), {} procedure(s)",
            module.declarations.len(),
            module.procedures.len()
        );
        module
    }

    // -----------------------------------------------------------------------------------------
    // Preamble
    // -----------------------------------------------------------------------------------------

    /// Position of the line end at or after `from`.
    fn line_end_from(&self, from: usize) -> usize {
        let mut i = from;
        while !self.tokens[i].is_line_end() {
            i += 1;
        }
        i
    }

    /// Source text of tokens `[from, to)`, trimmed. Comments between them are included.
    fn verbatim(&self, from: usize, to: usize) -> String {
        if to <= from {
            return String::new();
        }
        let span = self.tokens[from].span.to(self.tokens[to - 1].span);
        span.slice(self.src).trim().to_string()
    }

    /// First lexical error token in `[from, to)`. Text kept verbatim would otherwise hide it.
    fn lexical_error_in(&self, from: usize, to: usize) -> Option<ParseError> {
        self.tokens[from..to].iter().find_map(|tok| match tok.kind {
            TokenKind::Error(kind) => Some(ParseError::lexical(kind.message(), tok.span)),
            _ => None,
        })
    }

    /// `VERSION 1.0 CLASS` and the exported property block. Kept verbatim; a line with a
    /// lexical error is still kept and gets one diagnostic.
    fn parse_module_header(&mut self) -> Option<ModuleHeader> {
        while self.at_kind(TokenKind::Newline) {
            self.pos += 1;
        }
        if !self.at_word("VERSION") {
            return None;
        }
        let start = self.pos;
        if let Some(err) = self.lexical_error_in(start, self.line_end_from(start)) {
            self.report(err, RecoveryKind::Skipped);
        }
        self.pos += 1;
        let version = if self.at_line_end() {
            String::new()
        } else {
            self.bump().text
        };
        let is_class = self.eat_word("CLASS");
        self.skip_to_line_end();

        let mut guid = None;
        let mut properties = Vec::new();
        let mut depth = 0usize;
        loop {
            while self.at_kind(TokenKind::Newline) {
                self.pos += 1;
            }
            let opens = self.at_word("Begin") || self.at_word("BeginProperty");
            let continues = depth > 0
                || opens
                || (self.at_word("Object") && self.peek_at(1).is_punct(Punct::Eq));
            if !continues || self.at_kind(TokenKind::Eof) {
                break;
            }
            let closes = self.at_keyword(Keyword::End) || self.at_word("EndProperty");
            let end = self.line_end_from(self.pos);
            if let Some(err) = self.lexical_error_in(self.pos, end) {
                self.report(err, RecoveryKind::Skipped);
            }
            let line = self.verbatim(self.pos, end);
            if opens {
                depth += 1;
                if guid.is_none() {
                    guid = guid_re().find(&line).map(|m| m.as_str().to_string());
                }
            } else if closes {
                depth = depth.saturating_sub(1);
            }
            properties.push(line);
            self.pos = end;
        }

        Some(ModuleHeader {
            version,
            is_class,
            guid,
            properties,
            span: self.span_from(start),
        })
    }

    /// `Attribute Name = value`. The value is kept as written.
    pub(crate) fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.parse_dotted_name("an attribute name")?;
        self.expect_punct(Punct::Eq)?;
        let end = self.line_end_from(self.pos);
        if let Some(err) = self.lexical_error_in(self.pos, end) {
            self.pos = end;
            return Err(err);
        }
        let value = self.verbatim(self.pos, end);
        if value.is_empty() {
            return Err(self.unexpected("an attribute value"));
        }
        self.pos = end;
        Ok(Attribute {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_option(&mut self) -> Result<OptionStmt, ParseError> {
        let start = self.pos;
        self.expect_keyword(Keyword::Option)?;
        let option = if self.eat_keyword(Keyword::Explicit) {
            ModuleOption::Explicit
        } else if self.eat_word("Base") {
            let tok = self.peek().clone();
            match tok.text.parse::<u32>() {
                Ok(base) if tok.kind == TokenKind::NumberLiteral => {
                    self.pos += 1;
                    ModuleOption::Base(base)
                }
                _ => return Err(self.unexpected("`0` or `1`")),
            }
        } else if self.eat_word("Compare") {
            let mode = if self.eat_word("Binary") {
                CompareMode::Binary
            } else if self.eat_word("Text") {
                CompareMode::Text
            } else if self.eat_word("Database") {
                CompareMode::Database
            } else {
                return Err(self.unexpected("`Binary`, `Text` or `Database`"));
            };
            ModuleOption::Compare(mode)
        } else if self.eat_keyword(Keyword::Private) {
            if !self.eat_word("Module") {
                return Err(self.unexpected("`Module`"));
            }
            ModuleOption::PrivateModule
        } else {
            return Err(self.unexpected("`Explicit`, `Base`, `Compare` or `Private Module`"));
        };
        Ok(OptionStmt {
            option,
            span: self.span_from(start),
        })
    }

    // -----------------------------------------------------------------------------------------
    // Procedures
    // -----------------------------------------------------------------------------------------

    fn parse_procedure(&mut self, kind: ProcedureKind) -> Procedure {
        let start = self.pos;
        let opened_at = self.current_span();
        let mut visibility = Visibility::Public;
        let mut is_static = false;
        loop {
            match self.peek_kind() {
                TokenKind::Keyword(Keyword::Public) => visibility = Visibility::Public,
                TokenKind::Keyword(Keyword::Private) => visibility = Visibility::Private,
                TokenKind::Keyword(Keyword::Friend) => visibility = Visibility::Friend,
                TokenKind::Keyword(Keyword::Global) => visibility = Visibility::Global,
                TokenKind::Keyword(Keyword::Static) => is_static = true,
                _ => break,
            }
            self.pos += 1;
        }
        // `Sub`, `Function`, or `Property Get|Let|Set`; already checked by the resolver.
        self.pos += match kind {
            ProcedureKind::Sub | ProcedureKind::Function => 1,
            _ => 2,
        };

        let header = (|| -> Result<_, ParseError> {
            let name = self.expect_ident("a procedure name")?;
            let params = if self.at_punct(Punct::LParen) {
                self.parse_params()?
            } else {
                Vec::new()
            };
            let return_type = if self.eat_keyword(Keyword::As) {
                Some(self.parse_type_ref()?)
            } else {
                None
            };
            Ok((name, params, return_type))
        })();
        let (name, params, return_type) = match header {
            Ok(parts) => {
                self.finish_header();
                parts
            }
            Err(err) => {
                let span = err.span;
                self.skip_to_line_end();
                self.report(err, RecoveryKind::SkippedToLineEnd);
                (Ident::new(String::new(), span), Vec::new(), None)
            }
        };

        let (body, end) = self.parse_body(BlockKind::Procedure(kind));
        match end {
            BodyEnd::Closer(closer) if closer == Closer::for_procedure(kind) => {
                self.consume_closer(closer);
                self.finish_header();
            }
            BodyEnd::Closer(closer) => {
                let span = self.consume_closer(closer);
                self.report(
                    ParseError::syntax(
                        format!(
                            "`{}` does not match `{}` opened at line {}",
                            closer.as_str(),
                            kind.keyword(),
                            opened_at.start.line
                        ),
                        span,
                    ),
                    RecoveryKind::ClosedByMismatchedTerminator,
                );
                self.finish_header();
            }
            other => self.report_unterminated(BlockKind::Procedure(kind), opened_at, other),
        }

        Procedure {
            kind,
            visibility,
            is_static,
            name,
            params,
            return_type,
            body,
            span: self.span_from(start),
        }
    }

    /// `(` param, ... `)`.
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        if self.eat_punct(Punct::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if self.eat_punct(Punct::Comma) {
                continue;
            }
            self.expect_punct(Punct::RParen)?;
            return Ok(params);
        }
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let start = self.pos;
        let optional = self.eat_keyword(Keyword::Optional);
        let passing = if self.eat_keyword(Keyword::ByVal) {
            Some(Passing::ByVal)
        } else if self.eat_keyword(Keyword::ByRef) {
            Some(Passing::ByRef)
        } else {
            None
        };
        let param_array = self.eat_keyword(Keyword::ParamArray);
        let name = self.expect_ident("a parameter name")?;
        let is_array = if self.at_punct(Punct::LParen) {
            self.pos += 1;
            self.expect_punct(Punct::RParen)?;
            true
        } else {
            false
        };
        let ty = if self.eat_keyword(Keyword::As) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        let default = if self.eat_punct(Punct::Eq) {
            Some(self.parse_expr(ExprContext::Value)?)
        } else {
            None
        };
        Ok(Param {
            name,
            passing,
            optional,
            param_array,
            is_array,
            ty,
            default,
            span: self.span_from(start),
        })
    }

    /// Type after `As`: `[New] Name[.Name]` or `String * n`.
    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let start = self.pos;
        let is_new = self.eat_keyword(Keyword::New);
        let name = self.parse_dotted_name("a type name")?;
        let fixed_length = if self.eat_punct(Punct::Star) {
            Some(Box::new(self.parse_postfix(ExprContext::Value, false)?))
        } else {
            None
        };
        Ok(TypeRef {
            name,
            is_new,
            fixed_length,
            span: self.span_from(start),
        })
    }

    /// `(1 To 5, 3)`; `()` yields no bounds.
    fn parse_bounds(&mut self) -> Result<Vec<ArrayBound>, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let mut bounds = Vec::new();
        if self.eat_punct(Punct::RParen) {
            return Ok(bounds);
        }
        loop {
            let first = self.parse_expr(ExprContext::Value)?;
            let bound = if self.eat_keyword(Keyword::To) {
                ArrayBound {
                    lower: Some(first),
                    upper: self.parse_expr(ExprContext::Value)?,
                }
            } else {
                ArrayBound {
                    lower: None,
                    upper: first,
                }
            };
            bounds.push(bound);
            if self.eat_punct(Punct::Comma) {
                continue;
            }
            self.expect_punct(Punct::RParen)?;
            return Ok(bounds);
        }
    }

    // -----------------------------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------------------------

    fn eat_visibility(&mut self) -> Option<Visibility> {
        let vis = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Public) => Visibility::Public,
            TokenKind::Keyword(Keyword::Private) => Visibility::Private,
            TokenKind::Keyword(Keyword::Friend) => Visibility::Friend,
            TokenKind::Keyword(Keyword::Global) => Visibility::Global,
            _ => return None,
        };
        self.pos += 1;
        Some(vis)
    }

    fn parse_module_declaration(&mut self) -> Result<Declaration, ParseError> {
        if self.at_punct(Punct::Hash) {
            return Ok(Declaration::Directive(self.parse_directive()?));
        }
        let member = self.parse_member()?;
        Ok(match member {
            Member::Vars(d) => Declaration::Variables(d),
            Member::Const(d) => Declaration::Const(d),
            Member::Enum(d) => Declaration::Enum(d),
            Member::Type(d) => Declaration::Type(d),
            Member::Declare(d) => Declaration::Declare(d),
            Member::Event(d) => Declaration::Event(d),
            Member::Implements(d) => Declaration::Implements(d),
        })
    }

    /// `Dim`, `Static`, `Const`, `Enum` and `Type` inside a procedure body.
    pub(crate) fn parse_local_declaration(&mut self) -> Result<StmtKind, ParseError> {
        let tok = self.peek().clone();
        if !matches!(
            tok.kind,
            TokenKind::Keyword(
                Keyword::Dim | Keyword::Static | Keyword::Const | Keyword::Enum | Keyword::Type
            )
        ) {
            return Err(ParseError::syntax(
                format!("`{}` is only allowed at module level", tok.text),
                tok.span,
            ));
        }
        Ok(match self.parse_member()? {
            Member::Vars(d) => StmtKind::Dim(d),
            Member::Const(d) => StmtKind::Const(d),
            Member::Enum(d) => StmtKind::Enum(d),
            Member::Type(d) => StmtKind::Type(d),
            Member::Declare(_) | Member::Event(_) | Member::Implements(_) => {
                return Err(ParseError::syntax(
                    format!("`{}` is only allowed at module level", tok.text),
                    tok.span,
                ))
            }
        })
    }

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let start = self.pos;
        let visibility = self.eat_visibility();
        let member = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Const) => {
                self.pos += 1;
                Member::Const(self.parse_const(start, visibility)?)
            }
            TokenKind::Keyword(Keyword::Enum) => {
                self.pos += 1;
                Member::Enum(self.parse_enum(start, visibility)?)
            }
            TokenKind::Keyword(Keyword::Type) => {
                self.pos += 1;
                Member::Type(self.parse_type_decl(start, visibility)?)
            }
            TokenKind::Keyword(Keyword::Declare) => {
                self.pos += 1;
                Member::Declare(self.parse_declare(start, visibility)?)
            }
            TokenKind::Keyword(Keyword::Event) => {
                self.pos += 1;
                let name = self.expect_ident("an event name")?;
                let params = if self.at_punct(Punct::LParen) {
                    self.parse_params()?
                } else {
                    Vec::new()
                };
                Member::Event(EventDecl {
                    visibility,
                    name,
                    params,
                    span: self.span_from(start),
                })
            }
            TokenKind::Keyword(Keyword::Implements) if visibility.is_none() => {
                self.pos += 1;
                let interface = self.parse_dotted_name("an interface name")?;
                Member::Implements(ImplementsDecl {
                    interface,
                    span: self.span_from(start),
                })
            }
            TokenKind::Keyword(Keyword::Dim) if visibility.is_none() => {
                self.pos += 1;
                Member::Vars(self.parse_var_decls(start, DeclKeyword::Dim)?)
            }
            TokenKind::Keyword(Keyword::Static) if visibility.is_none() => {
                self.pos += 1;
                Member::Vars(self.parse_var_decls(start, DeclKeyword::Static)?)
            }
            TokenKind::Identifier | TokenKind::Keyword(Keyword::WithEvents) => match visibility {
                Some(vis) => Member::Vars(self.parse_var_decls(start, visibility_keyword(vis))?),
                None => return Err(self.unexpected("a declaration or procedure")),
            },
            _ => return Err(self.unexpected("a declaration or procedure")),
        };
        Ok(member)
    }

    fn parse_var_decls(&mut self, start: usize, keyword: DeclKeyword) -> Result<VarDeclStmt, ParseError> {
        let mut vars = Vec::new();
        loop {
            let var_start = self.pos;
            let with_events = self.eat_keyword(Keyword::WithEvents);
            let name = self.expect_ident("a variable name")?;
            let bounds = if self.at_punct(Punct::LParen) {
                Some(self.parse_bounds()?)
            } else {
                None
            };
            let ty = if self.eat_keyword(Keyword::As) {
                Some(self.parse_type_ref()?)
            } else {
                None
            };
            vars.push(VarDecl {
                name,
                with_events,
                bounds,
                ty,
                span: self.span_from(var_start),
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(VarDeclStmt {
            keyword,
            vars,
            span: self.span_from(start),
        })
    }

    fn parse_const(&mut self, start: usize, visibility: Option<Visibility>) -> Result<ConstStmt, ParseError> {
        let mut consts = Vec::new();
        loop {
            let const_start = self.pos;
            let name = self.expect_ident("a constant name")?;
            let ty = if self.eat_keyword(Keyword::As) {
                Some(self.parse_type_ref()?)
            } else {
                None
            };
            self.expect_punct(Punct::Eq)?;
            let value = self.parse_expr(ExprContext::Value)?;
            consts.push(ConstDecl {
                name,
                ty,
                value,
                span: self.span_from(const_start),
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(ConstStmt {
            visibility,
            consts,
            span: self.span_from(start),
        })
    }

    /// Lines of an `Enum`/`Type` body until its `End` line.
    ///
    /// A line that can only start something else (a keyword, a procedure header, another
    /// block's terminator) ends the body, reported once as an unterminated block.
    fn parse_member_lines<T>(
        &mut self,
        kind: BlockKind,
        opened_at: Span,
        mut member: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Vec<T> {
        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Punct(Punct::Colon) => {
                    self.pos += 1;
                    continue;
                }
                TokenKind::Eof => {
                    self.report_unterminated(kind, opened_at, BodyEnd::Eof);
                    return items;
                }
                _ => {}
            }
            if let Some(closer) = resolver::closer_at(&self.tokens, self.pos) {
                if kind.accepts(closer) {
                    self.consume_closer(closer);
                    return items;
                }
                self.report_unterminated(kind, opened_at, BodyEnd::Outer);
                return items;
            }
            if matches!(self.peek_kind(), TokenKind::Keyword(_))
                || resolver::starts_procedure(&self.tokens, self.pos).is_some()
            {
                self.report_unterminated(kind, opened_at, BodyEnd::Outer);
                return items;
            }

            let start = self.pos;
            match member(self) {
                Ok(item) => {
                    items.push(item);
                    if !self.at_statement_end() {
                        let err = self.unexpected("end of line");
                        let recovery = self.skip_to_statement_end();
                        self.report(err, recovery);
                    }
                }
                Err(err) => {
                    self.recover(start, err);
                }
            }
        }
    }

    fn parse_enum(&mut self, start: usize, visibility: Option<Visibility>) -> Result<EnumDecl, ParseError> {
        let opened_at = self.tokens[start].span;
        let name = self.expect_ident("an enum name")?;
        self.expect_statement_end()?;
        let members = self.parse_member_lines(BlockKind::Enum, opened_at, |p| {
            let member_start = p.pos;
            let name = p.expect_ident("an enum member")?;
            let value = if p.eat_punct(Punct::Eq) {
                Some(p.parse_expr(ExprContext::Value)?)
            } else {
                None
            };
            Ok(EnumMember {
                name,
                value,
                span: p.span_from(member_start),
            })
        });
        Ok(EnumDecl {
            visibility,
            name,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_type_decl(&mut self, start: usize, visibility: Option<Visibility>) -> Result<TypeDecl, ParseError> {
        let opened_at = self.tokens[start].span;
        let name = self.expect_ident("a type name")?;
        self.expect_statement_end()?;
        let fields = self.parse_member_lines(BlockKind::Type, opened_at, |p| {
            let field_start = p.pos;
            let name = p.expect_ident("a field name")?;
            let bounds = if p.at_punct(Punct::LParen) {
                Some(p.parse_bounds()?)
            } else {
                None
            };
            p.expect_keyword(Keyword::As)?;
            let ty = p.parse_type_ref()?;
            Ok(TypeField {
                name,
                bounds,
                ty,
                span: p.span_from(field_start),
            })
        });
        Ok(TypeDecl {
            visibility,
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// `Declare [PtrSafe] Sub|Function Name Lib "x" [Alias "y"] [(params)] [As T]`.
    fn parse_declare(&mut self, start: usize, visibility: Option<Visibility>) -> Result<DeclareDecl, ParseError> {
        let ptr_safe = self.eat_word("PtrSafe");
        let kind = if self.eat_keyword(Keyword::Sub) {
            DeclareKind::Sub
        } else if self.eat_keyword(Keyword::Function) {
            DeclareKind::Function
        } else {
            return Err(self.unexpected("`Sub` or `Function`"));
        };
        let name = self.expect_ident("a procedure name")?;
        if !self.eat_word("Lib") {
            return Err(self.unexpected("`Lib`"));
        }
        if !self.at_kind(TokenKind::StringLiteral) {
            return Err(self.unexpected("a library name string"));
        }
        let lib = self.bump().string_value();
        let alias = if self.eat_word("Alias") {
            if !self.at_kind(TokenKind::StringLiteral) {
                return Err(self.unexpected("an alias string"));
            }
            Some(self.bump().string_value())
        } else {
            None
        };
        let params = if self.at_punct(Punct::LParen) {
            self.parse_params()?
        } else {
            Vec::new()
        };
        let return_type = if self.eat_keyword(Keyword::As) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        Ok(DeclareDecl {
            visibility,
            ptr_safe,
            kind,
            name,
            lib,
            alias,
            params,
            return_type,
            span: self.span_from(start),
        })
    }

    /// `ReDim [Preserve] a(1 To n) [As T], obj.b(m)`.
    pub(crate) fn parse_redim(&mut self) -> Result<StmtKind, ParseError> {
        self.expect_keyword(Keyword::ReDim)?;
        let preserve = self.eat_keyword(Keyword::Preserve);
        let mut vars = Vec::new();
        loop {
            let var_start = self.pos;
            let mut target = if self.at_keyword(Keyword::Me) {
                let span = self.bump().span;
                Expr::new(ExprKind::Me, span)
            } else {
                let name = self.expect_ident("an array name")?;
                Expr::new(ExprKind::Identifier(name.name), name.span)
            };
            while self.at_punct(Punct::Dot) && !self.peek().leading_space {
                self.pos += 1;
                let member = self.expect_name("a member name after `.`")?;
                target = Expr::new(
                    ExprKind::Member(MemberExpr {
                        object: Some(Box::new(target)),
                        name: member.name,
                    }),
                    self.span_from(var_start),
                );
            }
            let bounds = self.parse_bounds()?;
            let ty = if self.eat_keyword(Keyword::As) {
                Some(self.parse_type_ref()?)
            } else {
                None
            };
            vars.push(ReDimVar {
                target,
                bounds,
                ty,
                span: self.span_from(var_start),
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(StmtKind::ReDim(ReDimStmt { preserve, vars }))
    }

    /// `#If`, `#ElseIf`, `#Else`, `#End If`, `#Const`. Conditions are parsed, never evaluated.
    pub(crate) fn parse_directive(&mut self) -> Result<Directive, ParseError> {
        let start = self.pos;
        self.expect_punct(Punct::Hash)?;
        let kind = match self.peek_kind() {
            TokenKind::Keyword(Keyword::If) => {
                self.pos += 1;
                let condition = self.parse_expr(ExprContext::Value)?;
                self.expect_keyword(Keyword::Then)?;
                DirectiveKind::If(condition)
            }
            TokenKind::Keyword(Keyword::ElseIf) => {
                self.pos += 1;
                let condition = self.parse_expr(ExprContext::Value)?;
                self.expect_keyword(Keyword::Then)?;
                DirectiveKind::ElseIf(condition)
            }
            TokenKind::Keyword(Keyword::Else) => {
                self.pos += 1;
                DirectiveKind::Else
            }
            TokenKind::Keyword(Keyword::End) => {
                self.pos += 1;
                self.expect_keyword(Keyword::If)?;
                DirectiveKind::EndIf
            }
            TokenKind::Identifier if self.at_word("EndIf") => {
                self.pos += 1;
                DirectiveKind::EndIf
            }
            TokenKind::Keyword(Keyword::Const) => {
                self.pos += 1;
                let name = self.expect_ident("a constant name")?;
                self.expect_punct(Punct::Eq)?;
                let value = self.parse_expr(ExprContext::Value)?;
                DirectiveKind::Const { name, value }
            }
            _ => return Err(self.unexpected("`If`, `ElseIf`, `Else`, `End If` or `Const`")),
        };
        Ok(Directive {
            kind,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Declaration, DeclKeyword, ModuleKind, ModuleOption, ProcedureKind, StmtKind};
    use crate::diagnostics::{ErrorKind, RecoveryKind};
    use crate::parser::parse_module;
    use pretty_assertions::assert_eq;

    #[test]
    fn class_header_and_attributes_are_kept_verbatim() {
        let src = "VERSION 1.0 CLASS\nBEGIN\n  MultiUse = -1  'True\nEND\nAttribute VB_Name = \"Account\"\nAttribute VB_Exposed = False\nOption Explicit\n";
        let parsed = parse_module(src);
        assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
        let module = parsed.module;
        assert_eq!(module.kind, ModuleKind::Class);
        let header = module.header.as_ref().unwrap();
        assert_eq!(header.version, "1.0");
        assert_eq!(header.properties, vec!["BEGIN", "MultiUse = -1", "END"]);
        assert_eq!(module.attribute("vb_name"), Some("\"Account\""));
        assert_eq!(module.attribute("VB_Exposed"), Some("False"));
        assert_eq!(module.options[0].option, ModuleOption::Explicit);
    }

    #[test]
    fn lexical_errors_in_verbatim_lines_are_reported() {
        let parsed = parse_module("Attribute VB_Name = \"Foo\nSub A()\nEnd Sub\n");
        let errs: Vec<_> = parsed.errors().collect();
        assert_eq!(errs.len(), 1, "{errs:?}");
        assert_eq!(errs[0].kind, ErrorKind::Lexical);
        assert_eq!(errs[0].message, "unterminated string literal");
        assert_eq!(errs[0].span.start.line, 1);
        assert!(parsed.module.attributes.is_empty());
        assert!(matches!(parsed.module.declarations[0], Declaration::Error(_)));
        assert_eq!(parsed.module.procedures.len(), 1);

        let parsed = parse_module("VERSION 1.0 CLASS\nBEGIN\n  MultiUse = \"abc\nEND\nAttribute VB_Name = \"C\" _ x\n");
        let errs: Vec<_> = parsed.errors().collect();
        assert_eq!(errs.len(), 2, "{errs:?}");
        assert!(errs.iter().all(|d| d.kind == ErrorKind::Lexical));
        assert_eq!(errs[0].span.start.line, 3);
        assert_eq!(errs[0].recovery, RecoveryKind::Skipped);
        assert_eq!(errs[1].span.start.line, 5);
        assert!(errs[1].message.contains("line continuation"), "{}", errs[1].message);
        // The header line itself is still kept.
        let header = parsed.module.header.as_ref().unwrap();
        assert_eq!(header.properties, vec!["BEGIN", "MultiUse = \"abc", "END"]);
    }

    #[test]
    fn form_header_captures_the_designer_guid() {
        let src = "VERSION 5.00\nBegin {C62A69F0-16DC-11CE-9E98-00AA00704CBE} UserForm1\n   Caption = \"Hello\"\n   Begin VB.Label Label1\n   End\nEnd\nAttribute VB_Name = \"UserForm1\"\n";
        let parsed = parse_module(src);
        assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
        let header = parsed.module.header.as_ref().unwrap();
        assert_eq!(parsed.module.kind, ModuleKind::Form);
        assert_eq!(
            header.guid.as_deref(),
            Some("{C62A69F0-16DC-11CE-9E98-00AA00704CBE}")
        );
        assert_eq!(header.properties.len(), 5);
    }

    #[test]
    fn module_level_declarations() {
        let src = "Option Base 1\nOption Compare Text\nPrivate Const MAX As Long = 10, MIN = 1\nPublic WithEvents app As Application\nDim grid(1 To 3, 5) As Double, names() As String\nPrivate Declare PtrSafe Function GetTickCount Lib \"kernel32\" Alias \"GetTickCount\" () As Long\nPublic Event Changed(ByVal value As Long)\nImplements IComparable\n";
        let parsed = parse_module(src);
        assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
        let decls = &parsed.module.declarations;
        assert_eq!(decls.len(), 6);
        let Declaration::Const(c) = &decls[0] else {
            panic!("expected const");
        };
        assert_eq!(c.consts.len(), 2);
        let Declaration::Variables(v) = &decls[1] else {
            panic!("expected variables");
        };
        assert_eq!(v.keyword, DeclKeyword::Public);
        assert!(v.vars[0].with_events);
        let Declaration::Variables(v) = &decls[2] else {
            panic!("expected variables");
        };
        assert_eq!(v.vars[0].bounds.as_ref().map(Vec::len), Some(2));
        assert_eq!(v.vars[1].bounds.as_ref().map(Vec::len), Some(0));
        let Declaration::Declare(d) = &decls[3] else {
            panic!("expected declare");
        };
        assert!(d.ptr_safe);
        assert_eq!(d.lib, "kernel32");
        assert_eq!(d.alias.as_deref(), Some("GetTickCount"));
        assert!(matches!(decls[4], Declaration::Event(_)));
        assert!(matches!(decls[5], Declaration::Implements(ref i) if i.interface == "IComparable"));
    }

    #[test]
    fn procedure_headers() {
        let src = "Private Static Function Sum(ByVal a As Long, Optional b As Long = 2, ParamArray rest() As Variant) As Long\nEnd Function\nProperty Let Value(ByVal v As Variant)\nEnd Property\n";
        let parsed = parse_module(src);
        assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
        let sum = parsed.module.procedure("sum").unwrap();
        assert!(sum.is_static);
        assert_eq!(sum.params.len(), 3);
        assert!(sum.params[1].optional && sum.params[1].default.is_some());
        assert!(sum.params[2].param_array && sum.params[2].is_array);
        assert_eq!(sum.return_type.as_ref().unwrap().name, "Long");
        assert_eq!(parsed.module.procedures[1].kind, ProcedureKind::PropertyLet);
    }

    #[test]
    fn mismatched_procedure_terminator_is_one_error() {
        let src = "Sub A()\n    x = 1\nEnd Function\nSub B()\nEnd Sub\n";
        let parsed = parse_module(src);
        let errors: Vec<_> = parsed.errors().collect();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].recovery, RecoveryKind::ClosedByMismatchedTerminator);
        assert_eq!(parsed.module.procedures.len(), 2);
    }

    #[test]
    fn enum_and_type_inside_a_procedure() {
        let src = "Sub A()\n    Type Point\n        X As Long\n        Y As Long\n    End Type\n    ReDim Preserve pts(1 To n) As Point\nEnd Sub\n";
        let parsed = parse_module(src);
        assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
        let body = &parsed.module.procedures[0].body;
        assert!(matches!(body[0].kind, StmtKind::Type(ref t) if t.fields.len() == 2));
        assert!(matches!(body[1].kind, StmtKind::ReDim(ref r) if r.preserve));
    }

    #[test]
    fn missing_end_enum_is_reported_once() {
        let src = "Enum Color\n    Red = 1\n    Green\nSub A()\nEnd Sub\n";
        let parsed = parse_module(src);
        let errors: Vec<_> = parsed.errors().collect();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.contains("`Enum` block opened at line 1"));
        let Declaration::Enum(e) = &parsed.module.declarations[0] else {
            panic!("expected enum");
        };
        assert_eq!(e.members.len(), 2);
        assert_eq!(parsed.module.procedures.len(), 1);
    }
}
