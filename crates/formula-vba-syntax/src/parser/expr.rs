use crate::ast::{
    Argument, BangExpr, BinaryExpr, BinaryOp, CallExpr, Expr, ExprKind, Ident, IndexExpr, Literal,
    MemberExpr, NumberLiteral, Precedence, TypeOfExpr, UnaryExpr, UnaryOp,
};
use crate::diagnostics::ParseError;
use crate::options::Associativity;
use crate::token::{Keyword, Punct, Token, TokenKind};

use super::Parser;

/// Which way a parenthesized suffix after a name is read.
///
/// Threaded through the postfix parser: `arr(1)` left of an assignment's `=` is an index,
/// anywhere else it is a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprContext {
    Value,
    LvalueTarget,
}

/// Prefix `+`, `-` and `Not` bind tighter than `*` but looser than `^` (`-2 ^ 2` is `-(2 ^ 2)`).
const UNARY_BP: u8 = 20;
/// Operand of `TypeOf` stops before any relational operator, so `Is` stays available.
const TYPEOF_OPERAND_BP: u8 = 12;

fn infix_binding_power(op: BinaryOp, exponent: Associativity) -> (u8, u8) {
    match op {
        BinaryOp::Imp => (2, 3),
        BinaryOp::Eqv => (4, 5),
        BinaryOp::Or | BinaryOp::Xor => (6, 7),
        BinaryOp::And => (8, 9),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Is
        | BinaryOp::Like => (10, 11),
        BinaryOp::Concat => (12, 13),
        BinaryOp::Add | BinaryOp::Sub => (14, 15),
        BinaryOp::IntDiv | BinaryOp::Mod => (16, 17),
        BinaryOp::Mul | BinaryOp::Div => (18, 19),
        BinaryOp::Pow => match exponent {
            Associativity::Left => (22, 23),
            Associativity::Right => (22, 22),
        },
    }
}

fn binary_op(tok: &Token) -> Option<BinaryOp> {
    let op = match tok.kind {
        TokenKind::Punct(p) => match p {
            Punct::Eq => BinaryOp::Eq,
            Punct::Ne => BinaryOp::Ne,
            Punct::Lt => BinaryOp::Lt,
            Punct::Le => BinaryOp::Le,
            Punct::Gt => BinaryOp::Gt,
            Punct::Ge => BinaryOp::Ge,
            Punct::Plus => BinaryOp::Add,
            Punct::Minus => BinaryOp::Sub,
            Punct::Star => BinaryOp::Mul,
            Punct::Slash => BinaryOp::Div,
            Punct::Backslash => BinaryOp::IntDiv,
            Punct::Caret => BinaryOp::Pow,
            Punct::Amp => BinaryOp::Concat,
            _ => return None,
        },
        TokenKind::Keyword(kw) => match kw {
            Keyword::Imp => BinaryOp::Imp,
            Keyword::Eqv => BinaryOp::Eqv,
            Keyword::Or => BinaryOp::Or,
            Keyword::Xor => BinaryOp::Xor,
            Keyword::And => BinaryOp::And,
            Keyword::Is => BinaryOp::Is,
            Keyword::Like => BinaryOp::Like,
            Keyword::Mod => BinaryOp::Mod,
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

/// Comparison operator token (for `Case Is <op> x`).
pub(crate) fn comparison_op(tok: &Token) -> Option<BinaryOp> {
    binary_op(tok).filter(|op| op.is_comparison() && !matches!(op, BinaryOp::Is | BinaryOp::Like))
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self, ctx: ExprContext) -> Result<Expr, ParseError> {
        match ctx {
            ExprContext::Value => self.parse_bp(0),
            ExprContext::LvalueTarget => self.parse_postfix(ctx, false),
        }
    }

    fn parse_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        self.nested(|p| p.parse_bp_inner(min_bp))
    }

    fn parse_bp_inner(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some(op) = binary_op(self.peek()) else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(op, self.options.exponent_associativity);
            if l_bp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_bp(r_bp)?;
            lhs = Expr::new(
                ExprKind::Binary(BinaryExpr {
                    op,
                    precedence: op.precedence(),
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                }),
                self.span_from(start),
            );
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let kind = self.peek_kind();
        let unary = match kind {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = unary {
            self.pos += 1;
            let operand = self.parse_bp(UNARY_BP)?;
            return Ok(Expr::new(
                ExprKind::Unary(UnaryExpr {
                    op,
                    precedence: Precedence::Unary,
                    operand: Box::new(operand),
                }),
                self.span_from(start),
            ));
        }

        match kind {
            TokenKind::Keyword(Keyword::New) => {
                self.pos += 1;
                let name = self.parse_dotted_name("a class name after `New`")?;
                Ok(Expr::new(ExprKind::New(name), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::AddressOf) => {
                self.pos += 1;
                let name = self.parse_dotted_name("a procedure name after `AddressOf`")?;
                Ok(Expr::new(ExprKind::AddressOf(name), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::TypeOf) => {
                self.pos += 1;
                let operand = self.parse_bp(TYPEOF_OPERAND_BP)?;
                self.expect_keyword(Keyword::Is)?;
                let type_name = self.parse_dotted_name("a type name after `Is`")?;
                Ok(Expr::new(
                    ExprKind::TypeOf(TypeOfExpr {
                        operand: Box::new(operand),
                        type_name,
                    }),
                    self.span_from(start),
                ))
            }
            _ => self.parse_postfix(ExprContext::Value, false),
        }
    }

    /// `Name[.Name...]`, joined back with dots.
    pub(crate) fn parse_dotted_name(&mut self, what: &str) -> Result<String, ParseError> {
        let mut name = self.expect_name(what)?.name;
        while self.at_punct(Punct::Dot)
            && !self.peek().leading_space
            && self.peek_at(1).is_name_like()
        {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.bump().text);
        }
        Ok(name)
    }

    /// A primary followed by greedy `.name`, `!name` and `(args)` suffixes.
    ///
    /// With `statement_head` set, a `(` separated from the name by whitespace ends the chain:
    /// `MsgBox ("x")` is a bare call whose argument is parenthesized, not a call with a glued
    /// argument list.
    pub(crate) fn parse_postfix(
        &mut self,
        ctx: ExprContext,
        statement_head: bool,
    ) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut expr = self.parse_primary()?;
        let mut callable = !matches!(expr.kind, ExprKind::Literal(_) | ExprKind::Paren(_));

        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Punct(Punct::Dot) if !tok.leading_space => {
                    self.pos += 1;
                    let name = self.expect_name("a member name after `.`")?;
                    expr = Expr::new(
                        ExprKind::Member(MemberExpr {
                            object: Some(Box::new(expr)),
                            name: name.name,
                        }),
                        self.span_from(start),
                    );
                    callable = true;
                }
                TokenKind::Punct(Punct::Bang) if !tok.leading_space => {
                    self.pos += 1;
                    let key = self.expect_name("a field name after `!`")?;
                    expr = Expr::new(
                        ExprKind::Bang(BangExpr {
                            object: Some(Box::new(expr)),
                            key: key.name,
                        }),
                        self.span_from(start),
                    );
                    callable = true;
                }
                TokenKind::Punct(Punct::LParen) if callable => {
                    if statement_head && tok.leading_space {
                        break;
                    }
                    self.pos += 1;
                    let args = self.parse_paren_args()?;
                    let span = self.span_from(start);
                    expr = match ctx {
                        ExprContext::LvalueTarget => Expr::new(
                            ExprKind::Index(IndexExpr {
                                target: Box::new(expr),
                                args,
                            }),
                            span,
                        ),
                        ExprContext::Value => Expr::new(
                            ExprKind::Call(CallExpr {
                                callee: Box::new(expr),
                                args,
                            }),
                            span,
                        ),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::NumberLiteral => {
                self.pos += 1;
                ExprKind::Literal(Literal::Number(NumberLiteral::new(tok.text)))
            }
            TokenKind::StringLiteral => {
                self.pos += 1;
                ExprKind::Literal(Literal::String(tok.string_value()))
            }
            TokenKind::DateLiteral => {
                self.pos += 1;
                ExprKind::Literal(Literal::Date(tok.text.trim_matches('#').to_string()))
            }
            TokenKind::BooleanLiteral(b) => {
                self.pos += 1;
                ExprKind::Literal(Literal::Boolean(b))
            }
            TokenKind::Keyword(Keyword::Nothing) => {
                self.pos += 1;
                ExprKind::Literal(Literal::Nothing)
            }
            TokenKind::Keyword(Keyword::Empty) => {
                self.pos += 1;
                ExprKind::Literal(Literal::Empty)
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.pos += 1;
                ExprKind::Literal(Literal::Null)
            }
            TokenKind::Keyword(Keyword::Me) => {
                self.pos += 1;
                ExprKind::Me
            }
            // `Error(n)` is a function as well as a statement keyword.
            TokenKind::Keyword(Keyword::Error) => {
                self.pos += 1;
                ExprKind::Identifier(tok.text)
            }
            TokenKind::Identifier => {
                self.pos += 1;
                if self.options.recognize_builtin_constants && is_builtin_constant(&tok.text) {
                    ExprKind::Literal(Literal::BuiltinConstant(tok.text))
                } else {
                    ExprKind::Identifier(tok.text)
                }
            }
            TokenKind::Punct(Punct::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr(ExprContext::Value)?;
                self.expect_punct(Punct::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            // Leading `.`/`!` inside a `With` block refers to the `With` object.
            TokenKind::Punct(Punct::Dot) => {
                self.pos += 1;
                let name = self.expect_name("a member name after `.`")?;
                ExprKind::Member(MemberExpr {
                    object: None,
                    name: name.name,
                })
            }
            TokenKind::Punct(Punct::Bang) => {
                self.pos += 1;
                let key = self.expect_name("a field name after `!`")?;
                ExprKind::Bang(BangExpr {
                    object: None,
                    key: key.name,
                })
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Arguments after a consumed `(`, through the closing `)`.
    pub(crate) fn parse_paren_args(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        if self.eat_punct(Punct::RParen) {
            return Ok(args);
        }
        loop {
            if self.at_punct(Punct::Comma) || self.at_punct(Punct::RParen) {
                args.push(Argument::Missing(self.current_span()));
            } else {
                args.push(self.parse_argument()?);
            }
            if self.eat_punct(Punct::Comma) {
                continue;
            }
            self.expect_punct(Punct::RParen)?;
            return Ok(args);
        }
    }

    /// Comma-separated arguments of a bare call, up to the end of the statement.
    pub(crate) fn parse_bare_args(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        loop {
            if self.at_punct(Punct::Comma) {
                args.push(Argument::Missing(self.current_span()));
            } else {
                args.push(self.parse_argument()?);
            }
            if !self.eat_punct(Punct::Comma) {
                return Ok(args);
            }
            if self.at_statement_end() {
                args.push(Argument::Missing(self.prev_span()));
                return Ok(args);
            }
        }
    }

    fn parse_argument(&mut self) -> Result<Argument, ParseError> {
        if self.peek().is_name_like() && self.peek_at(1).is_punct(Punct::ColonEq) {
            let start = self.pos;
            let tok = self.bump();
            self.pos += 1;
            let value = self.parse_expr(ExprContext::Value)?;
            return Ok(Argument::Named {
                name: Ident::new(tok.text, tok.span),
                value,
                span: self.span_from(start),
            });
        }
        Ok(Argument::Positional(self.parse_expr(ExprContext::Value)?))
    }
}

/// Names VBA predefines as constants. Matched case-insensitively.
const BUILTIN_CONSTANTS: &[&str] = &[
    "vbAbort", "vbAbortRetryIgnore", "vbApplicationModal", "vbArray", "vbBack", "vbBinaryCompare",
    "vbBlack", "vbBlue", "vbBoolean", "vbByte", "vbCalGreg", "vbCalHijri", "vbCancel", "vbCr",
    "vbCrLf", "vbCritical", "vbCurrency", "vbCyan", "vbDataObject", "vbDatabaseCompare", "vbDate",
    "vbDecimal", "vbDefaultButton1", "vbDefaultButton2", "vbDefaultButton3", "vbDouble",
    "vbEmpty", "vbError", "vbExclamation", "vbFalse", "vbFirstFourDays", "vbFirstFullWeek",
    "vbFirstJan1", "vbFormFeed", "vbFriday", "vbFromUnicode", "vbGeneralDate", "vbGet",
    "vbGreen", "vbHiragana", "vbIgnore", "vbInformation", "vbInteger", "vbKatakana", "vbLet",
    "vbLf", "vbLong", "vbLongDate", "vbLongTime", "vbLowerCase", "vbMagenta", "vbMethod",
    "vbMonday", "vbMsgBoxHelpButton", "vbMsgBoxRight", "vbMsgBoxRtlReading",
    "vbMsgBoxSetForeground", "vbNarrow", "vbNewLine", "vbNo", "vbNull", "vbNullChar",
    "vbNullString", "vbOK", "vbOKCancel", "vbOKOnly", "vbObject", "vbObjectError",
    "vbProperCase", "vbQuestion", "vbRed", "vbRetry", "vbRetryCancel", "vbSaturday", "vbSet",
    "vbShortDate", "vbShortTime", "vbSingle", "vbString", "vbSunday", "vbSystemModal", "vbTab",
    "vbTextCompare", "vbThursday", "vbTrue", "vbTuesday", "vbUnicode", "vbUpperCase",
    "vbUseCompareOption", "vbUseDefault", "vbUseSystem", "vbUseSystemDayOfWeek",
    "vbUserDefinedType", "vbVariant", "vbVerticalTab", "vbWednesday", "vbWhite", "vbWide",
    "vbYellow", "vbYes", "vbYesNo", "vbYesNoCancel",
];

/// `vbCrLf`, `vbYesNo`, ... plus the whole `vbKey*` family.
pub(crate) fn is_builtin_constant(name: &str) -> bool {
    if let Some(key) = name
        .get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("vbKey"))
        .and_then(|_| name.get(5..))
    {
        return !key.is_empty() && key.chars().all(char::is_alphanumeric);
    }
    BUILTIN_CONSTANTS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use crate::lexer::{significant_tokens, tokenize};
    use crate::options::ParseOptions;
    use crate::printer::print_expr;
    use pretty_assertions::assert_eq;

    fn parse_with(src: &str, options: &ParseOptions, ctx: ExprContext) -> Result<Expr, ParseError> {
        let tokens = significant_tokens(&tokenize(src));
        let mut parser = Parser::new(src, tokens, options);
        parser.parse_expr(ctx)
    }

    fn parse(src: &str) -> Expr {
        parse_with(src, &ParseOptions::default(), ExprContext::Value).unwrap()
    }

    /// Fully parenthesized rendering, to make grouping visible.
    fn shape(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Binary(b) => {
                format!("({} {} {})", shape(&b.left), b.op.as_str(), shape(&b.right))
            }
            ExprKind::Unary(u) => format!("({}{})", u.op.as_str(), shape(&u.operand)),
            ExprKind::Paren(inner) => format!("[{}]", shape(inner)),
            _ => print_expr(e),
        }
    }

    #[test]
    fn precedence_table() {
        assert_eq!(shape(&parse("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(shape(&parse("a & b + c")), "(a & (b + c))");
        assert_eq!(shape(&parse("a = b & c")), "(a = (b & c))");
        assert_eq!(shape(&parse("a Or b And c")), "(a Or (b And c))");
        assert_eq!(shape(&parse("a Imp b Eqv c")), "(a Imp (b Eqv c))");
        assert_eq!(shape(&parse("7 \\ 2 * 3")), "(7 \\ (2 * 3))");
        assert_eq!(shape(&parse("7 Mod 2 + 1")), "((7 Mod 2) + 1)");
        assert_eq!(shape(&parse("a - b - c")), "((a - b) - c)");
        assert_eq!(shape(&parse("-2 ^ 2")), "(-(2 ^ 2))");
        assert_eq!(shape(&parse("Not a And b")), "((Not a) And b)");
        assert_eq!(shape(&parse("x Like \"a*\" Or y Is Nothing")), "((x Like \"a*\") Or (y Is Nothing))");
    }

    #[test]
    fn nodes_carry_their_precedence_tier() {
        let e = parse("a + b * c");
        let ExprKind::Binary(add) = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(add.precedence, Precedence::Additive);
        assert_eq!(add.right.precedence(), Precedence::Multiplicative);
        let e = parse("-a");
        assert_eq!(e.precedence(), Precedence::Unary);
    }

    #[test]
    fn exponent_associativity_is_configurable() {
        assert_eq!(shape(&parse("2 ^ 3 ^ 2")), "((2 ^ 3) ^ 2)");
        let options = ParseOptions {
            exponent_associativity: Associativity::Right,
            ..ParseOptions::default()
        };
        let e = parse_with("2 ^ 3 ^ 2", &options, ExprContext::Value).unwrap();
        assert_eq!(shape(&e), "(2 ^ (3 ^ 2))");
    }

    #[test]
    fn parenthesized_suffix_depends_on_context() {
        let value = parse("arr(1)");
        assert!(matches!(value.kind, ExprKind::Call(_)));
        let target = parse_with("arr(1)", &ParseOptions::default(), ExprContext::LvalueTarget).unwrap();
        assert!(matches!(target.kind, ExprKind::Index(_)));
    }

    #[test]
    fn suffixes_are_consumed_left_to_right() {
        let e = parse("ws.Range(\"A1\").Value");
        let ExprKind::Member(m) = &e.kind else {
            panic!("expected member access, got {e:?}");
        };
        assert_eq!(m.name, "Value");
        let Some(object) = &m.object else {
            panic!("expected object");
        };
        let ExprKind::Call(call) = &object.kind else {
            panic!("expected call");
        };
        assert!(matches!(call.callee.kind, ExprKind::Member(_)));
        assert_eq!(print_expr(&e), "ws.Range(\"A1\").Value");
    }

    #[test]
    fn keywords_are_ordinary_member_names() {
        let e = parse("ws.Cells(1, 1).End(xlUp).Row");
        assert_eq!(print_expr(&e), "ws.Cells(1, 1).End(xlUp).Row");
    }

    #[test]
    fn named_and_missing_arguments() {
        let e = parse("Foo(1, , Key:=\"k\")");
        let ExprKind::Call(call) = &e.kind else {
            panic!("expected call");
        };
        assert!(matches!(call.args[0], Argument::Positional(_)));
        assert!(matches!(call.args[1], Argument::Missing(_)));
        let Argument::Named { name, .. } = &call.args[2] else {
            panic!("expected named argument");
        };
        assert_eq!(name.name, "Key");
    }

    #[test]
    fn object_expressions() {
        assert!(matches!(parse("New Scripting.Dictionary").kind, ExprKind::New(ref n) if n == "Scripting.Dictionary"));
        assert!(matches!(parse("AddressOf Callback").kind, ExprKind::AddressOf(_)));
        let e = parse("TypeOf obj Is Range And ok");
        let ExprKind::Binary(and) = &e.kind else {
            panic!("expected And");
        };
        assert!(matches!(and.left.kind, ExprKind::TypeOf(ref t) if t.type_name == "Range"));
    }

    #[test]
    fn with_block_members_have_no_object() {
        let e = parse(".Cells(1, 2).Value + !Total");
        let ExprKind::Binary(b) = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(print_expr(&b.left), ".Cells(1, 2).Value");
        assert!(matches!(b.right.kind, ExprKind::Bang(BangExpr { object: None, .. })));
    }

    #[test]
    fn literals() {
        assert!(matches!(parse("vbCrLf").kind, ExprKind::Literal(Literal::BuiltinConstant(_))));
        assert!(matches!(parse("VBKEYRETURN").kind, ExprKind::Literal(Literal::BuiltinConstant(_))));
        assert!(matches!(parse("#1/2/2003#").kind, ExprKind::Literal(Literal::Date(ref d)) if d == "1/2/2003"));
        assert!(matches!(parse("Nothing").kind, ExprKind::Literal(Literal::Nothing)));
        assert!(matches!(parse("\"a\"\"b\"").kind, ExprKind::Literal(Literal::String(ref s)) if s == "a\"b"));

        let options = ParseOptions {
            recognize_builtin_constants: false,
            ..ParseOptions::default()
        };
        let e = parse_with("vbCrLf", &options, ExprContext::Value).unwrap();
        assert!(matches!(e.kind, ExprKind::Identifier(_)));
    }

    #[test]
    fn failures_surface_to_the_caller() {
        let err = parse_with("1 + ", &ParseOptions::default(), ExprContext::Value).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        let err = parse_with("\"abc", &ParseOptions::default(), ExprContext::Value).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn spans_cover_the_whole_expression() {
        let e = parse("  a + b");
        assert_eq!(e.span.start.column, 3);
        assert_eq!(e.span.end.column, 8);
    }
}
