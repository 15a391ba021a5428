//! Bounded-lookahead tie-breaks consulted by the statement parser.
//!
//! VBA reuses the same token prefix for several productions (`Foo(1)` is a call or an index,
//! `Foo:` is a label or a call followed by a separator, `Else If` is one clause or two). Every
//! function here looks at the significant token stream (comments already removed) from a given
//! position and answers one such question without consuming anything. None of them look past
//! the end of the current logical line.

use crate::ast::ProcedureKind;
use crate::token::{Keyword, Punct, Token, TokenKind};

/// A token (or token pair) that ends a statement list belonging to some open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    EndIf,
    EndSelect,
    EndWith,
    EndSub,
    EndFunction,
    EndProperty,
    EndType,
    EndEnum,
    ElseIf,
    Else,
    Case,
    Next,
    Loop,
    Wend,
}

impl Closer {
    /// Number of tokens the closer itself spans (`End If` is two, `EndIf` and `Next` are one,
    /// `Else If` is two).
    #[must_use]
    pub fn width(self, tokens: &[Token], pos: usize) -> usize {
        match self {
            Closer::EndIf if tok(tokens, pos).is_word("EndIf") => 1,
            Closer::EndIf
            | Closer::EndSelect
            | Closer::EndWith
            | Closer::EndSub
            | Closer::EndFunction
            | Closer::EndProperty
            | Closer::EndType
            | Closer::EndEnum => 2,
            Closer::ElseIf if tok(tokens, pos).is_keyword(Keyword::Else) => 2,
            _ => 1,
        }
    }

    /// Source spelling used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Closer::EndIf => "End If",
            Closer::EndSelect => "End Select",
            Closer::EndWith => "End With",
            Closer::EndSub => "End Sub",
            Closer::EndFunction => "End Function",
            Closer::EndProperty => "End Property",
            Closer::EndType => "End Type",
            Closer::EndEnum => "End Enum",
            Closer::ElseIf => "ElseIf",
            Closer::Else => "Else",
            Closer::Case => "Case",
            Closer::Next => "Next",
            Closer::Loop => "Loop",
            Closer::Wend => "Wend",
        }
    }

    #[must_use]
    pub fn is_procedure_terminator(self) -> bool {
        matches!(
            self,
            Closer::EndSub | Closer::EndFunction | Closer::EndProperty
        )
    }

    /// The terminator that matches a procedure kind.
    #[must_use]
    pub fn for_procedure(kind: ProcedureKind) -> Closer {
        match kind {
            ProcedureKind::Sub => Closer::EndSub,
            ProcedureKind::Function => Closer::EndFunction,
            ProcedureKind::PropertyGet | ProcedureKind::PropertyLet | ProcedureKind::PropertySet => {
                Closer::EndProperty
            }
        }
    }
}

fn tok(tokens: &[Token], pos: usize) -> &Token {
    // Streams handed to the resolver always end in `Eof`; clamp so lookahead past it is safe.
    &tokens[pos.min(tokens.len() - 1)]
}

fn kind_at(tokens: &[Token], pos: usize) -> TokenKind {
    tokens.get(pos).map_or(TokenKind::Eof, |t| t.kind)
}

fn is_line_end_at(tokens: &[Token], pos: usize) -> bool {
    matches!(kind_at(tokens, pos), TokenKind::Newline | TokenKind::Eof)
}

/// `true` when `pos` is the first token of a physical logical line.
#[must_use]
pub fn at_line_start(tokens: &[Token], pos: usize) -> bool {
    pos == 0 || matches!(kind_at(tokens, pos - 1), TokenKind::Newline)
}

/// `End` dispatches on the token after it. `EndIf` written as one word (which the VBA editor
/// silently rewrites) is accepted too. A bare `End` is a statement, not a closer.
#[must_use]
pub fn end_block_kind(tokens: &[Token], pos: usize) -> Option<Closer> {
    let first = tok(tokens, pos);
    if first.is_word("EndIf") {
        return Some(Closer::EndIf);
    }
    if !first.is_keyword(Keyword::End) {
        return None;
    }
    match kind_at(tokens, pos + 1) {
        TokenKind::Keyword(Keyword::If) => Some(Closer::EndIf),
        TokenKind::Keyword(Keyword::Select) => Some(Closer::EndSelect),
        TokenKind::Keyword(Keyword::With) => Some(Closer::EndWith),
        TokenKind::Keyword(Keyword::Sub) => Some(Closer::EndSub),
        TokenKind::Keyword(Keyword::Function) => Some(Closer::EndFunction),
        TokenKind::Keyword(Keyword::Property) => Some(Closer::EndProperty),
        TokenKind::Keyword(Keyword::Type) => Some(Closer::EndType),
        TokenKind::Keyword(Keyword::Enum) => Some(Closer::EndEnum),
        _ => None,
    }
}

/// `Else` immediately followed by `If` on the same line is read as a single `ElseIf`.
#[must_use]
pub fn is_else_if_pair(tokens: &[Token], pos: usize) -> bool {
    tok(tokens, pos).is_keyword(Keyword::Else)
        && kind_at(tokens, pos + 1) == TokenKind::Keyword(Keyword::If)
}

/// Classify the token at `pos` as a block closer, if it is one.
#[must_use]
pub fn closer_at(tokens: &[Token], pos: usize) -> Option<Closer> {
    if let Some(closer) = end_block_kind(tokens, pos) {
        return Some(closer);
    }
    match kind_at(tokens, pos) {
        TokenKind::Keyword(Keyword::ElseIf) => Some(Closer::ElseIf),
        TokenKind::Keyword(Keyword::Else) if is_else_if_pair(tokens, pos) => Some(Closer::ElseIf),
        TokenKind::Keyword(Keyword::Else) => Some(Closer::Else),
        TokenKind::Keyword(Keyword::Case) => Some(Closer::Case),
        TokenKind::Keyword(Keyword::Next) => Some(Closer::Next),
        TokenKind::Keyword(Keyword::Loop) => Some(Closer::Loop),
        TokenKind::Keyword(Keyword::Wend) => Some(Closer::Wend),
        _ => None,
    }
}

/// Block `If` iff a line break (not merely whitespace) immediately follows `Then`.
///
/// `then_pos` is the position of the `Then` token.
#[must_use]
pub fn then_opens_block(tokens: &[Token], then_pos: usize) -> bool {
    is_line_end_at(tokens, then_pos + 1)
}

/// `Name:` alone on its line is a label. A line-number label is an integer literal at the
/// start of a line, with or without the colon.
#[must_use]
pub fn is_label(tokens: &[Token], pos: usize) -> bool {
    let first = tok(tokens, pos);
    match first.kind {
        TokenKind::Identifier => {
            kind_at(tokens, pos + 1) == TokenKind::Punct(Punct::Colon)
                && is_line_end_at(tokens, pos + 2)
        }
        TokenKind::NumberLiteral => is_line_number_label(tokens, pos),
        _ => false,
    }
}

/// A plain integer at the very start of a line (`10 x = 1`, `20:`).
#[must_use]
pub fn is_line_number_label(tokens: &[Token], pos: usize) -> bool {
    let first = tok(tokens, pos);
    first.kind == TokenKind::NumberLiteral
        && at_line_start(tokens, pos)
        && first.text.bytes().all(|b| b.is_ascii_digit())
}

/// Matches a balanced `( ... )` group starting at `pos`; returns the position after `)`.
/// Stops (returning `None`) at a line end.
fn skip_paren_group(tokens: &[Token], pos: usize) -> Option<usize> {
    if kind_at(tokens, pos) != TokenKind::Punct(Punct::LParen) {
        return None;
    }
    let mut depth = 0usize;
    let mut i = pos;
    loop {
        match kind_at(tokens, i) {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            TokenKind::Newline | TokenKind::Eof => return None,
            _ => {}
        }
        i += 1;
    }
}

/// Lvalue-shaped prefix (`x`, `a.b(1)!c`, `.Value`, `Me.x`) followed directly by `=`.
///
/// This is the "left of an unconsumed `=` at the statement's outermost level" test. It only
/// accepts a name chain so that `Foo a = b` stays a bare call whose argument is a comparison.
#[must_use]
pub fn has_outer_assignment(tokens: &[Token], pos: usize) -> bool {
    let mut i = pos;
    match kind_at(tokens, i) {
        TokenKind::Identifier | TokenKind::Keyword(Keyword::Me) => i += 1,
        TokenKind::Punct(Punct::Dot | Punct::Bang) => {
            if !tok(tokens, i + 1).is_name_like() {
                return false;
            }
            i += 2;
        }
        _ => return false,
    }
    loop {
        match kind_at(tokens, i) {
            TokenKind::Punct(Punct::Dot | Punct::Bang) => {
                if !tok(tokens, i + 1).is_name_like() {
                    return false;
                }
                i += 2;
            }
            TokenKind::Punct(Punct::LParen) => match skip_paren_group(tokens, i) {
                Some(next) => i = next,
                None => return false,
            },
            TokenKind::Punct(Punct::Eq) => return true,
            _ => return false,
        }
    }
}

/// Optional modifiers then `Sub`, `Function` or `Property Get|Let|Set`.
#[must_use]
pub fn starts_procedure(tokens: &[Token], pos: usize) -> Option<ProcedureKind> {
    let mut i = pos;
    while matches!(
        kind_at(tokens, i),
        TokenKind::Keyword(
            Keyword::Public | Keyword::Private | Keyword::Friend | Keyword::Global | Keyword::Static
        )
    ) {
        i += 1;
    }
    match kind_at(tokens, i) {
        TokenKind::Keyword(Keyword::Sub) => Some(ProcedureKind::Sub),
        TokenKind::Keyword(Keyword::Function) => Some(ProcedureKind::Function),
        TokenKind::Keyword(Keyword::Property) => match kind_at(tokens, i + 1) {
            TokenKind::Keyword(Keyword::Get) => Some(ProcedureKind::PropertyGet),
            TokenKind::Keyword(Keyword::Let) => Some(ProcedureKind::PropertyLet),
            TokenKind::Keyword(Keyword::Set) => Some(ProcedureKind::PropertySet),
            _ => None,
        },
        _ => None,
    }
}

/// A statement at `pos` whose body runs on to a terminator line: block `If`, `Select Case`,
/// `For`, `Do`, `While` or `With`. `Type` and `Enum` are declarations and do not count.
#[must_use]
pub fn opens_block(tokens: &[Token], pos: usize) -> bool {
    match kind_at(tokens, pos) {
        TokenKind::Keyword(
            Keyword::Select | Keyword::For | Keyword::Do | Keyword::While | Keyword::With,
        ) => true,
        TokenKind::Keyword(Keyword::If) => {
            let mut i = pos + 1;
            loop {
                match kind_at(tokens, i) {
                    TokenKind::Keyword(Keyword::Then) => return then_opens_block(tokens, i),
                    TokenKind::Newline | TokenKind::Eof => return false,
                    _ => i += 1,
                }
            }
        }
        _ => false,
    }
}

/// Number of blocks the closer at `pos` ends: `Next i, j` ends two loops, `Else` and `Case`
/// end none.
#[must_use]
pub fn blocks_closed(tokens: &[Token], pos: usize, closer: Closer) -> usize {
    match closer {
        Closer::Next => {
            let mut closed = 1;
            let mut i = pos + 1;
            loop {
                match kind_at(tokens, i) {
                    TokenKind::Punct(Punct::Comma) => closed += 1,
                    TokenKind::Newline | TokenKind::Eof | TokenKind::Punct(Punct::Colon) => {
                        return closed
                    }
                    _ => {}
                }
                i += 1;
            }
        }
        Closer::EndIf | Closer::EndSelect | Closer::EndWith | Closer::Loop | Closer::Wend => 1,
        _ => 0,
    }
}

/// `Debug.Print` at statement start.
#[must_use]
pub fn is_debug_print(tokens: &[Token], pos: usize) -> bool {
    tok(tokens, pos).is_word("Debug")
        && kind_at(tokens, pos + 1) == TokenKind::Punct(Punct::Dot)
        && tok(tokens, pos + 2).is_word("Print")
}

/// A contextual statement word (`Open`, `Close`, `Print`, ...) that is being used as that
/// statement rather than as an ordinary name.
///
/// The word must not be followed by something that only a name can be followed by: `=`,
/// a glued `.`/`!`, or a glued `(`.
#[must_use]
pub fn is_statement_word(tokens: &[Token], pos: usize, word: &str) -> bool {
    let head = tok(tokens, pos);
    if !(head.is_name_like() && head.text.eq_ignore_ascii_case(word)) {
        return false;
    }
    let next = tok(tokens, pos + 1);
    match next.kind {
        TokenKind::Punct(Punct::Eq) => false,
        TokenKind::Punct(Punct::Dot | Punct::Bang | Punct::LParen) => next.leading_space,
        _ => true,
    }
}

/// `#` opening a file-number argument (`Print #1`, `Get #f, , v`).
#[must_use]
pub fn file_number_follows(tokens: &[Token], pos: usize) -> bool {
    kind_at(tokens, pos) == TokenKind::Punct(Punct::Hash)
}

/// `Open <path> For <mode>`: the statement is only an `Open` statement when a `For` appears on
/// the same logical line.
#[must_use]
pub fn is_open_statement(tokens: &[Token], pos: usize) -> bool {
    if !is_statement_word(tokens, pos, "Open") {
        return false;
    }
    let mut i = pos + 1;
    loop {
        match kind_at(tokens, i) {
            TokenKind::Keyword(Keyword::For) => return true,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Punct(Punct::Colon) => return false,
            _ => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{significant_tokens, tokenize};

    fn toks(src: &str) -> Vec<Token> {
        significant_tokens(&tokenize(src))
    }

    #[test]
    fn label_needs_colon_then_line_end() {
        assert!(is_label(&toks("MyLabel:\n"), 0));
        assert!(is_label(&toks("Cleanup:"), 0));
        assert!(!is_label(&toks("MyLabel = 5\n"), 0));
        assert!(!is_label(&toks("Foo: Bar\n"), 0));
        assert!(!is_label(&toks("Foo\n"), 0));
    }

    #[test]
    fn line_numbers_only_label_at_line_start() {
        let t = toks("10 x = 1\n");
        assert!(is_label(&t, 0));
        let t = toks("x = 10\n");
        assert!(!is_line_number_label(&t, 2));
        let t = toks("1.5\n");
        assert!(!is_line_number_label(&t, 0));
    }

    #[test]
    fn assignment_detection_follows_the_lvalue_chain() {
        assert!(has_outer_assignment(&toks("x = 1"), 0));
        assert!(has_outer_assignment(&toks("arr(1, 2) = 5"), 0));
        assert!(has_outer_assignment(&toks("ws.Cells(1, 1).Value = \"a\""), 0));
        assert!(has_outer_assignment(&toks(".Value = 3"), 0));
        assert!(has_outer_assignment(&toks("rs!Name = 3"), 0));
        assert!(has_outer_assignment(&toks("Me.Caption = 3"), 0));
        assert!(!has_outer_assignment(&toks("Foo a = b"), 0));
        assert!(!has_outer_assignment(&toks("Foo(1, 2)"), 0));
        assert!(!has_outer_assignment(&toks("Debug.Print x = 1"), 0));
    }

    #[test]
    fn then_followed_by_line_break_opens_a_block() {
        let t = toks("If x > 0 Then\n  y = 1\nEnd If\n");
        let then = t.iter().position(|t| t.is_keyword(Keyword::Then)).unwrap();
        assert!(then_opens_block(&t, then));

        let t = toks("If x > 0 Then y = 1\n");
        let then = t.iter().position(|t| t.is_keyword(Keyword::Then)).unwrap();
        assert!(!then_opens_block(&t, then));

        // A trailing comment does not count as a statement.
        let t = toks("If x Then ' note\n");
        let then = t.iter().position(|t| t.is_keyword(Keyword::Then)).unwrap();
        assert!(then_opens_block(&t, then));
    }

    #[test]
    fn end_dispatches_on_the_second_token() {
        assert_eq!(end_block_kind(&toks("End If"), 0), Some(Closer::EndIf));
        assert_eq!(end_block_kind(&toks("end  select"), 0), Some(Closer::EndSelect));
        assert_eq!(end_block_kind(&toks("End Property"), 0), Some(Closer::EndProperty));
        assert_eq!(end_block_kind(&toks("EndIf"), 0), Some(Closer::EndIf));
        assert_eq!(end_block_kind(&toks("End\n"), 0), None);
    }

    #[test]
    fn else_if_pair_is_one_closer() {
        let t = toks("Else If b Then\n");
        assert!(is_else_if_pair(&t, 0));
        assert_eq!(closer_at(&t, 0), Some(Closer::ElseIf));
        assert_eq!(Closer::ElseIf.width(&t, 0), 2);

        let t = toks("ElseIf b Then\n");
        assert_eq!(closer_at(&t, 0), Some(Closer::ElseIf));
        assert_eq!(Closer::ElseIf.width(&t, 0), 1);

        assert_eq!(closer_at(&toks("Else\n"), 0), Some(Closer::Else));
    }

    #[test]
    fn block_openers_and_what_closers_end() {
        assert!(opens_block(&toks("If a Then\n"), 0));
        assert!(!opens_block(&toks("If a Then b = 1\n"), 0));
        assert!(opens_block(&toks("For Each c In cells\n"), 0));
        assert!(opens_block(&toks("Select Case x\n"), 0));
        assert!(!opens_block(&toks("Type Point\n"), 0));
        assert!(!opens_block(&toks("x = 1\n"), 0));

        let t = toks("Next i, j\n");
        assert_eq!(blocks_closed(&t, 0, Closer::Next), 2);
        assert_eq!(blocks_closed(&toks("Next: x = 1\n"), 0, Closer::Next), 1);
        assert_eq!(blocks_closed(&toks("Else\n"), 0, Closer::Else), 0);
        assert_eq!(blocks_closed(&toks("End If\n"), 0, Closer::EndIf), 1);
    }

    #[test]
    fn procedure_starts() {
        assert_eq!(starts_procedure(&toks("Sub A()"), 0), Some(ProcedureKind::Sub));
        assert_eq!(
            starts_procedure(&toks("Private Static Function F()"), 0),
            Some(ProcedureKind::Function)
        );
        assert_eq!(
            starts_procedure(&toks("Public Property Let X(v)"), 0),
            Some(ProcedureKind::PropertyLet)
        );
        assert_eq!(starts_procedure(&toks("Private x As Long"), 0), None);
        assert_eq!(
            starts_procedure(&toks("Private Declare Function F Lib \"k\" ()"), 0),
            None
        );
    }

    #[test]
    fn statement_words_yield_to_names() {
        assert!(is_statement_word(&toks("Close #1"), 0, "Close"));
        assert!(is_statement_word(&toks("Close\n"), 0, "Close"));
        assert!(!is_statement_word(&toks("Close = 1"), 0, "Close"));
        assert!(!is_statement_word(&toks("Close.Value"), 0, "Close"));
        assert!(is_open_statement(&toks("Open p For Input As #1"), 0));
        assert!(!is_open_statement(&toks("Open p"), 0));
        assert!(is_debug_print(&toks("Debug.Print 1"), 0));
    }
}
