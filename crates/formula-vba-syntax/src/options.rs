use serde::{Deserialize, Serialize};

use crate::ast::ModuleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Associativity {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Overrides the kind derived from the `VERSION` header.
    pub module_kind: Option<ModuleKind>,
    /// How `a ^ b ^ c` groups. VBA evaluates it left to right.
    pub exponent_associativity: Associativity,
    /// Deeper expression or block nesting is reported instead of recursing further. Both kinds
    /// of nesting count against the same limit.
    pub max_nesting_depth: usize,
    /// Turn `vbCrLf` and friends into [`crate::Literal::BuiltinConstant`].
    pub recognize_builtin_constants: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            module_kind: None,
            exponent_associativity: Associativity::Left,
            max_nesting_depth: 64,
            recognize_builtin_constants: true,
        }
    }
}
