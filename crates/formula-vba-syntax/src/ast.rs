use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A name as written in the source (type suffix included, e.g. `Left$`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

// ---------------------------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModuleKind {
    #[default]
    Standard,
    Class,
    Form,
}

/// One parsed VBA module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub kind: ModuleKind,
    pub header: Option<ModuleHeader>,
    pub attributes: Vec<Attribute>,
    pub options: Vec<OptionStmt>,
    pub declarations: Vec<Declaration>,
    pub procedures: Vec<Procedure>,
    /// Comment extras, in source order. They are never part of the tree proper.
    pub comments: Vec<Comment>,
    pub span: Span,
}

impl Module {
    /// Case-insensitive procedure lookup.
    #[must_use]
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name.eq_ignore_case(name))
    }

    /// Value of a module-level `Attribute` line (verbatim, quotes included).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

/// `VERSION x [CLASS]` plus the `BEGIN ... END` property block exported by the VBA editor.
///
/// Retained verbatim; the parser does not interpret any of it beyond the module kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHeader {
    pub version: String,
    pub is_class: bool,
    /// `{...}` designer GUID from a `Begin {GUID} Name` line (forms).
    pub guid: Option<String>,
    /// Every line of the `BEGIN` block, trimmed, including the `BEGIN`/`END` lines themselves.
    pub properties: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Possibly dotted (`Foo.VB_UserMemId`).
    pub name: String,
    /// Verbatim source text after `=`.
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareMode {
    Binary,
    Text,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleOption {
    Explicit,
    Base(u32),
    Compare(CompareMode),
    PrivateModule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionStmt {
    pub option: ModuleOption,
    pub span: Span,
}

// ---------------------------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Friend,
    Global,
}

impl Visibility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
            Visibility::Friend => "Friend",
            Visibility::Global => "Global",
        }
    }
}

/// Module-level members other than procedures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    Variables(VarDeclStmt),
    Const(ConstStmt),
    Enum(EnumDecl),
    Type(TypeDecl),
    Declare(DeclareDecl),
    Event(EventDecl),
    Implements(ImplementsDecl),
    Directive(Directive),
    /// A module-level line that failed to parse.
    Error(ErrorNode),
}

impl Declaration {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Declaration::Variables(d) => d.span,
            Declaration::Const(d) => d.span,
            Declaration::Enum(d) => d.span,
            Declaration::Type(d) => d.span,
            Declaration::Declare(d) => d.span,
            Declaration::Event(d) => d.span,
            Declaration::Implements(d) => d.span,
            Declaration::Directive(d) => d.span,
            Declaration::Error(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKeyword {
    Dim,
    Static,
    Public,
    Private,
    Friend,
    Global,
}

impl DeclKeyword {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKeyword::Dim => "Dim",
            DeclKeyword::Static => "Static",
            DeclKeyword::Public => "Public",
            DeclKeyword::Private => "Private",
            DeclKeyword::Friend => "Friend",
            DeclKeyword::Global => "Global",
        }
    }
}

/// `As` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Possibly dotted (`Excel.Range`).
    pub name: String,
    /// `As New T`.
    pub is_new: bool,
    /// `String * 30`.
    pub fixed_length: Option<Box<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayBound {
    pub lower: Option<Expr>,
    pub upper: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclStmt {
    pub keyword: DeclKeyword,
    pub vars: Vec<VarDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Ident,
    pub with_events: bool,
    /// `None` for scalars, `Some(vec![])` for a dynamic array `a()`.
    pub bounds: Option<Vec<ArrayBound>>,
    pub ty: Option<TypeRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstStmt {
    pub visibility: Option<Visibility>,
    pub consts: Vec<ConstDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: Ident,
    pub ty: Option<TypeRef>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub visibility: Option<Visibility>,
    pub name: Ident,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: Ident,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub visibility: Option<Visibility>,
    pub name: Ident,
    pub fields: Vec<TypeField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeField {
    pub name: Ident,
    pub bounds: Option<Vec<ArrayBound>>,
    pub ty: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclareKind {
    Sub,
    Function,
}

/// `Declare [PtrSafe] Sub|Function Name Lib "x" [Alias "y"] (params) [As T]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclareDecl {
    pub visibility: Option<Visibility>,
    pub ptr_safe: bool,
    pub kind: DeclareKind,
    pub name: Ident,
    pub lib: String,
    pub alias: Option<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecl {
    pub visibility: Option<Visibility>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementsDecl {
    pub interface: String,
    pub span: Span,
}

// ---------------------------------------------------------------------------------------------
// Procedures
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureKind {
    Sub,
    Function,
    PropertyGet,
    PropertyLet,
    PropertySet,
}

impl ProcedureKind {
    /// Opening keyword(s), e.g. `Property Get`.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            ProcedureKind::Sub => "Sub",
            ProcedureKind::Function => "Function",
            ProcedureKind::PropertyGet => "Property Get",
            ProcedureKind::PropertyLet => "Property Let",
            ProcedureKind::PropertySet => "Property Set",
        }
    }

    /// The `End ...` line that must close the body.
    #[must_use]
    pub fn terminator(self) -> &'static str {
        match self {
            ProcedureKind::Sub => "End Sub",
            ProcedureKind::Function => "End Function",
            ProcedureKind::PropertyGet | ProcedureKind::PropertyLet | ProcedureKind::PropertySet => {
                "End Property"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub kind: ProcedureKind,
    pub visibility: Visibility,
    pub is_static: bool,
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Passing {
    ByVal,
    ByRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    /// Explicit `ByVal`/`ByRef`; `None` means the VBA default (by reference).
    pub passing: Option<Passing>,
    pub optional: bool,
    pub param_array: bool,
    /// `values()`.
    pub is_array: bool,
    pub ty: Option<TypeRef>,
    pub default: Option<Expr>,
    pub span: Span,
}

// ---------------------------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self.kind, StmtKind::BlankLine)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Assign(AssignStmt),
    Set(SetStmt),
    Call(CallStmt),
    /// A standalone reference (`DoWork`, `ws.Range("A1").Select`).
    Expr(Expr),
    Dim(VarDeclStmt),
    Const(ConstStmt),
    ReDim(ReDimStmt),
    Erase(Vec<Expr>),
    Enum(EnumDecl),
    Type(TypeDecl),
    If(IfStmt),
    Select(SelectStmt),
    For(ForStmt),
    ForEach(ForEachStmt),
    Do(DoStmt),
    While(WhileStmt),
    With(WithStmt),
    GoTo(Ident),
    GoSub(Ident),
    Return,
    Label(Label),
    Exit(ExitKind),
    OnError(OnErrorAction),
    Resume(ResumeTarget),
    FileIo(FileIoStmt),
    DebugPrint(Vec<OutputItem>),
    RaiseEvent(RaiseEventStmt),
    Directive(Directive),
    Attribute(Attribute),
    Stop,
    /// Bare `End`: terminates the program.
    End,
    BlankLine,
    Error(ErrorNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    /// Written with the optional `Let` keyword.
    pub explicit_let: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStmt {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallForm {
    /// `Call Foo(1)` / `Call Foo`.
    Explicit,
    /// `Foo(1, 2)` with the parenthesis glued to the name.
    Parenthesized,
    /// `Foo "bar"`, `MsgBox "x", vbOKOnly`.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStmt {
    pub callee: Expr,
    pub args: Vec<Argument>,
    pub form: CallForm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReDimStmt {
    pub preserve: bool,
    pub vars: Vec<ReDimVar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReDimVar {
    pub target: Expr,
    pub bounds: Vec<ArrayBound>,
    pub ty: Option<TypeRef>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IfForm {
    Inline,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub form: IfForm,
    pub condition: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_ifs: Vec<ElseIfClause>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIfClause {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStmt {
    pub subject: Expr,
    pub cases: Vec<CaseClause>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub conditions: Vec<CaseCondition>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseCondition {
    Value(Expr),
    Range { from: Expr, to: Expr, span: Span },
    /// `Is > 5`; `op` is always a comparison operator.
    Is { op: BinaryOp, value: Expr, span: Span },
}

impl CaseCondition {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            CaseCondition::Value(value) => value.span,
            CaseCondition::Range { span, .. } | CaseCondition::Is { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub counter: Expr,
    pub start: Expr,
    pub end: Expr,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
    /// Counter named after `Next`, if any.
    pub next_counter: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachStmt {
    pub element: Expr,
    pub collection: Expr,
    pub body: Vec<Stmt>,
    pub next_counter: Option<Ident>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopConditionKind {
    While,
    Until,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPosition {
    /// `Do While x` / `Do Until x`.
    Top,
    /// `Loop While x` / `Loop Until x`.
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopTest {
    pub kind: LoopConditionKind,
    pub position: TestPosition,
    pub condition: Expr,
    /// From `While`/`Until` through the condition.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStmt {
    /// `None` for a bare `Do ... Loop`.
    pub test: Option<LoopTest>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithStmt {
    pub object: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    Name,
    LineNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub kind: LabelKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    Sub,
    Function,
    Property,
    For,
    Do,
}

impl ExitKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExitKind::Sub => "Sub",
            ExitKind::Function => "Function",
            ExitKind::Property => "Property",
            ExitKind::For => "For",
            ExitKind::Do => "Do",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnErrorAction {
    ResumeNext,
    /// `On Error GoTo 0`.
    GoToZero,
    /// `On Error GoTo -1`.
    GoToMinusOne,
    GoTo(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumeTarget {
    /// `Resume` / `Resume 0`.
    Current,
    Next,
    Label(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputSeparator {
    Comma,
    Semicolon,
}

/// One item of a `Print`/`Write`/`Debug.Print` list, with the separator that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub expr: Option<Expr>,
    pub separator: Option<OutputSeparator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    Input,
    Output,
    Append,
    Binary,
    Random,
}

impl OpenMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OpenMode::Input => "Input",
            OpenMode::Output => "Output",
            OpenMode::Append => "Append",
            OpenMode::Binary => "Binary",
            OpenMode::Random => "Random",
        }
    }
}

/// File I/O statements. The `#` before a file number is optional in source and not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileIoStmt {
    Open {
        path: Expr,
        mode: OpenMode,
        file_number: Expr,
        record_length: Option<Expr>,
    },
    Close {
        file_numbers: Vec<Expr>,
    },
    Print {
        file_number: Expr,
        items: Vec<OutputItem>,
    },
    Write {
        file_number: Expr,
        items: Vec<OutputItem>,
    },
    Input {
        file_number: Expr,
        targets: Vec<Expr>,
    },
    LineInput {
        file_number: Expr,
        target: Expr,
    },
    Get {
        file_number: Expr,
        record: Option<Expr>,
        target: Expr,
    },
    Put {
        file_number: Expr,
        record: Option<Expr>,
        source: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaiseEventStmt {
    pub name: Ident,
    pub args: Vec<Argument>,
}

/// Conditional-compilation line. Kept flat and never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DirectiveKind {
    If(Expr),
    ElseIf(Expr),
    Else,
    EndIf,
    Const { name: Ident, value: Expr },
}

/// Stand-in for a statement that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNode {
    pub message: String,
    /// Verbatim source text that was skipped.
    pub text: String,
    pub span: Span,
}

// ---------------------------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Tier that was used to build this node, or [`Precedence::Atom`] for leaves.
    #[must_use]
    pub fn precedence(&self) -> Precedence {
        match &self.kind {
            ExprKind::Binary(b) => b.precedence,
            ExprKind::Unary(u) => u.precedence,
            ExprKind::Member(_) | ExprKind::Bang(_) => Precedence::Member,
            ExprKind::Call(_) | ExprKind::Index(_) => Precedence::Postfix,
            ExprKind::TypeOf(_) => Precedence::Relational,
            ExprKind::New(_) | ExprKind::AddressOf(_) => Precedence::Unary,
            _ => Precedence::Atom,
        }
    }

    /// Plain identifier name, if this is one.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Me,
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Member(MemberExpr),
    Bang(BangExpr),
    /// Parenthesized suffix in a value position.
    Call(CallExpr),
    /// Parenthesized suffix in an assignment-target position.
    Index(IndexExpr),
    Paren(Box<Expr>),
    /// `New Collection`.
    New(String),
    TypeOf(TypeOfExpr),
    AddressOf(String),
    /// Placeholder for an expression that failed to parse inside a recovered block header.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(NumberLiteral),
    /// Decoded string value (`""` already unescaped).
    String(String),
    /// Text between the `#` delimiters.
    Date(String),
    Boolean(bool),
    Nothing,
    Empty,
    Null,
    /// `vbCrLf`, `vbNullString`, ...
    BuiltinConstant(String),
}

/// Numeric literal as written. The lexer does not decide the subtype; see
/// [`NumberLiteral::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericKind {
    Byte,
    Integer,
    Long,
    LongLong,
    Single,
    Double,
    Currency,
}

impl NumberLiteral {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Best-effort subtype: explicit suffixes win, then radix, then magnitude.
    ///
    /// Hex and octal literals take the narrowest width their digits fit in, so `&HFFFF` is an
    /// `Integer` and `&H10000` a `Long`.
    #[must_use]
    pub fn classify(&self) -> NumericKind {
        let text = self.text.as_str();
        if text.starts_with('$') {
            return NumericKind::Currency;
        }
        match text.chars().last() {
            Some('%') => return NumericKind::Integer,
            Some('&') => return NumericKind::Long,
            Some('^') => return NumericKind::LongLong,
            Some('!') => return NumericKind::Single,
            Some('#') => return NumericKind::Double,
            Some('@') => return NumericKind::Currency,
            _ => {}
        }
        if let Some((digits, radix)) = self.radix_digits() {
            return match u64::from_str_radix(digits, radix) {
                Ok(v) if v <= 0xFFFF => NumericKind::Integer,
                Ok(v) if v <= 0xFFFF_FFFF => NumericKind::Long,
                Ok(_) => NumericKind::LongLong,
                Err(_) => NumericKind::Long,
            };
        }
        if text.contains(['.', 'e', 'E', 'd', 'D']) {
            return NumericKind::Double;
        }
        match text.parse::<u64>() {
            Ok(v) if v <= 255 => NumericKind::Byte,
            Ok(v) if v <= 32_767 => NumericKind::Integer,
            Ok(v) if v <= 2_147_483_647 => NumericKind::Long,
            _ => NumericKind::Double,
        }
    }

    /// Digits and radix of a `&H` or `&O` literal, type suffix removed.
    fn radix_digits(&self) -> Option<(&str, u32)> {
        let body = self.text.trim_end_matches(['%', '&', '^']);
        if let Some(hex) = body.strip_prefix("&H").or_else(|| body.strip_prefix("&h")) {
            return Some((hex, 16));
        }
        body.strip_prefix("&O")
            .or_else(|| body.strip_prefix("&o"))
            .map(|oct| (oct, 8))
    }

    /// Integer value for decimal, hex (`&H`) and octal (`&O`) literals.
    ///
    /// Hex and octal bits are read as a signed number of the literal's width: `&HFFFF` is -1,
    /// `&HFFFF&` is 65535.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        if let Some((digits, radix)) = self.radix_digits() {
            let bits = u64::from_str_radix(digits, radix).ok()?;
            return Some(match self.classify() {
                NumericKind::Integer => i64::from(bits as u16 as i16),
                NumericKind::Long => i64::from(bits as u32 as i32),
                _ => bits as i64,
            });
        }
        self.text.trim_end_matches(['%', '&', '^']).parse::<i64>().ok()
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if let Some(v) = self.as_i64() {
            return Some(v as f64);
        }
        let body = self
            .text
            .trim_start_matches('$')
            .trim_end_matches(['%', '&', '^', '!', '#', '@'])
            .replace(['d', 'D'], "e");
        body.parse::<f64>().ok()
    }
}

/// Binding tiers, lowest to highest. Every binary/unary node records the tier it was built at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Precedence {
    Imp,
    Eqv,
    OrXor,
    And,
    Relational,
    Concat,
    Additive,
    IntDivMod,
    Multiplicative,
    Unary,
    Exponent,
    Member,
    Postfix,
    Atom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl UnaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "Not ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub precedence: Precedence,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Imp,
    Eqv,
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    Like,
    Concat,
    Add,
    Sub,
    IntDiv,
    Mod,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    #[must_use]
    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOp::Imp => Precedence::Imp,
            BinaryOp::Eqv => Precedence::Eqv,
            BinaryOp::Or | BinaryOp::Xor => Precedence::OrXor,
            BinaryOp::And => Precedence::And,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Is
            | BinaryOp::Like => Precedence::Relational,
            BinaryOp::Concat => Precedence::Concat,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
            BinaryOp::IntDiv | BinaryOp::Mod => Precedence::IntDivMod,
            BinaryOp::Mul | BinaryOp::Div => Precedence::Multiplicative,
            BinaryOp::Pow => Precedence::Exponent,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Imp => "Imp",
            BinaryOp::Eqv => "Eqv",
            BinaryOp::Or => "Or",
            BinaryOp::Xor => "Xor",
            BinaryOp::And => "And",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Is => "Is",
            BinaryOp::Like => "Like",
            BinaryOp::Concat => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::IntDiv => "\\",
            BinaryOp::Mod => "Mod",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    #[must_use]
    pub fn is_comparison(self) -> bool {
        self.precedence() == Precedence::Relational
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub precedence: Precedence,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpr {
    /// `None` for `.Name` inside a `With` block.
    pub object: Option<Box<Expr>>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BangExpr {
    /// `None` for `!Name` inside a `With` block.
    pub object: Option<Box<Expr>>,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOfExpr {
    pub operand: Box<Expr>,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    /// The expression's span is the argument's span.
    Positional(Expr),
    /// `name:=value`.
    Named { name: Ident, value: Expr, span: Span },
    /// Skipped optional argument (`Foo(1, , 3)`).
    Missing(Span),
}

impl Argument {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Argument::Positional(e) => e.span,
            Argument::Named { span, .. } | Argument::Missing(span) => *span,
        }
    }

    #[must_use]
    pub fn expr(&self) -> Option<&Expr> {
        match self {
            Argument::Positional(e) | Argument::Named { value: e, .. } => Some(e),
            Argument::Missing(_) => None,
        }
    }
}
