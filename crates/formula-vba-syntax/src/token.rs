use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Reserved words. Lookup is case-insensitive and happens before identifier classification, so
/// a word in this table never lexes as [`TokenKind::Identifier`].
///
/// Words that only carry meaning in one statement (`Lib`, `Alias`, `Open`, `Print`, `Base`, ...)
/// are deliberately *not* listed here; the parser matches them by text so they stay usable as
/// ordinary names everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    AddressOf,
    And,
    As,
    ByRef,
    ByVal,
    Call,
    Case,
    Const,
    Declare,
    Dim,
    Do,
    Each,
    Else,
    ElseIf,
    Empty,
    End,
    Enum,
    Eqv,
    Erase,
    Error,
    Event,
    Exit,
    Explicit,
    For,
    Friend,
    Function,
    Get,
    Global,
    GoSub,
    GoTo,
    If,
    Imp,
    Implements,
    In,
    Is,
    Let,
    Like,
    Loop,
    Me,
    Mod,
    New,
    Next,
    Not,
    Nothing,
    Null,
    On,
    Option,
    Optional,
    Or,
    ParamArray,
    Preserve,
    Private,
    Property,
    Public,
    RaiseEvent,
    ReDim,
    Rem,
    Resume,
    Return,
    Select,
    Set,
    Static,
    Step,
    Stop,
    Sub,
    Then,
    To,
    Type,
    TypeOf,
    Until,
    Wend,
    While,
    With,
    WithEvents,
    Xor,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("AddressOf", Keyword::AddressOf),
    ("And", Keyword::And),
    ("As", Keyword::As),
    ("ByRef", Keyword::ByRef),
    ("ByVal", Keyword::ByVal),
    ("Call", Keyword::Call),
    ("Case", Keyword::Case),
    ("Const", Keyword::Const),
    ("Declare", Keyword::Declare),
    ("Dim", Keyword::Dim),
    ("Do", Keyword::Do),
    ("Each", Keyword::Each),
    ("Else", Keyword::Else),
    ("ElseIf", Keyword::ElseIf),
    ("Empty", Keyword::Empty),
    ("End", Keyword::End),
    ("Enum", Keyword::Enum),
    ("Eqv", Keyword::Eqv),
    ("Erase", Keyword::Erase),
    ("Error", Keyword::Error),
    ("Event", Keyword::Event),
    ("Exit", Keyword::Exit),
    ("Explicit", Keyword::Explicit),
    ("For", Keyword::For),
    ("Friend", Keyword::Friend),
    ("Function", Keyword::Function),
    ("Get", Keyword::Get),
    ("Global", Keyword::Global),
    ("GoSub", Keyword::GoSub),
    ("GoTo", Keyword::GoTo),
    ("If", Keyword::If),
    ("Imp", Keyword::Imp),
    ("Implements", Keyword::Implements),
    ("In", Keyword::In),
    ("Is", Keyword::Is),
    ("Let", Keyword::Let),
    ("Like", Keyword::Like),
    ("Loop", Keyword::Loop),
    ("Me", Keyword::Me),
    ("Mod", Keyword::Mod),
    ("New", Keyword::New),
    ("Next", Keyword::Next),
    ("Not", Keyword::Not),
    ("Nothing", Keyword::Nothing),
    ("Null", Keyword::Null),
    ("On", Keyword::On),
    ("Option", Keyword::Option),
    ("Optional", Keyword::Optional),
    ("Or", Keyword::Or),
    ("ParamArray", Keyword::ParamArray),
    ("Preserve", Keyword::Preserve),
    ("Private", Keyword::Private),
    ("Property", Keyword::Property),
    ("Public", Keyword::Public),
    ("RaiseEvent", Keyword::RaiseEvent),
    ("ReDim", Keyword::ReDim),
    ("Rem", Keyword::Rem),
    ("Resume", Keyword::Resume),
    ("Return", Keyword::Return),
    ("Select", Keyword::Select),
    ("Set", Keyword::Set),
    ("Static", Keyword::Static),
    ("Step", Keyword::Step),
    ("Stop", Keyword::Stop),
    ("Sub", Keyword::Sub),
    ("Then", Keyword::Then),
    ("To", Keyword::To),
    ("Type", Keyword::Type),
    ("TypeOf", Keyword::TypeOf),
    ("Until", Keyword::Until),
    ("Wend", Keyword::Wend),
    ("While", Keyword::While),
    ("With", Keyword::With),
    ("WithEvents", Keyword::WithEvents),
    ("Xor", Keyword::Xor),
];

impl Keyword {
    /// Case-insensitive exact match against the keyword table.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }

    /// Canonical spelling, as the VBA editor would display it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == self)
            .map(|(text, _)| *text)
            .unwrap_or("")
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operators and punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punct {
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Bang,
    Colon,
    /// `:=` in named arguments.
    ColonEq,
    Hash,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    Caret,
    Amp,
}

impl Punct {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Dot => ".",
            Punct::Bang => "!",
            Punct::Colon => ":",
            Punct::ColonEq => ":=",
            Punct::Hash => "#",
            Punct::Eq => "=",
            Punct::Ne => "<>",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Backslash => "\\",
            Punct::Caret => "^",
            Punct::Amp => "&",
        }
    }
}

/// Lexical problems. The lexer never fails; it emits an error token and keeps going so the
/// statement parser can report the problem against the statement that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexErrorKind {
    UnknownCharacter,
    UnterminatedString,
    InvalidLineContinuation,
    UnterminatedBracketName,
}

impl LexErrorKind {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            LexErrorKind::UnknownCharacter => "unrecognized character",
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::InvalidLineContinuation => {
                "line continuation `_` must be followed by a line break"
            }
            LexErrorKind::UnterminatedBracketName => "unterminated `[` bracketed name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword(Keyword),
    Punct(Punct),
    StringLiteral,
    /// Integer, float, currency, byte, hex and octal literals share one kind; see
    /// [`crate::NumberLiteral::classify`].
    NumberLiteral,
    DateLiteral,
    BooleanLiteral(bool),
    Comment,
    Newline,
    Eof,
    Error(LexErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Verbatim source text (string and date literals keep their delimiters).
    pub text: String,
    pub span: Span,
    /// A `_` line continuation was folded away immediately before this token.
    pub had_preceding_continuation: bool,
    /// Horizontal whitespace (or a folded continuation) separates this token from the previous one.
    pub leading_space: bool,
}

impl Token {
    #[must_use]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    #[must_use]
    pub fn is_punct(&self, p: Punct) -> bool {
        self.kind == TokenKind::Punct(p)
    }

    /// Identifier whose text matches `word` case-insensitively (contextual keywords).
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(word)
    }

    /// End of a logical line.
    #[must_use]
    pub fn is_line_end(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::Eof)
    }

    /// Identifiers and keywords both carry a name-shaped text.
    #[must_use]
    pub fn is_name_like(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Keyword(_) | TokenKind::BooleanLiteral(_)
        )
    }

    /// Decoded value of a string literal token (`""` unescaped, delimiters removed).
    #[must_use]
    pub fn string_value(&self) -> String {
        let inner = self
            .text
            .strip_prefix('"')
            .map(|s| s.strip_suffix('"').unwrap_or(s))
            .unwrap_or(&self.text);
        inner.replace("\"\"", "\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        assert_eq!(Keyword::lookup("END"), Some(Keyword::End));
        assert_eq!(Keyword::lookup("elseif"), Some(Keyword::ElseIf));
        assert_eq!(Keyword::lookup("Typeof"), Some(Keyword::TypeOf));
        assert_eq!(Keyword::lookup("Range"), None);
        assert_eq!(Keyword::lookup("Print"), None);
    }

    #[test]
    fn canonical_spelling_round_trips_through_lookup() {
        for (text, kw) in KEYWORDS {
            assert_eq!(kw.as_str(), *text);
            assert_eq!(Keyword::lookup(&text.to_ascii_uppercase()), Some(*kw));
        }
    }
}
