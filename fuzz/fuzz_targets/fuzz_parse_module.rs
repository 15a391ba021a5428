#![no_main]

use libfuzzer_sys::fuzz_target;

use formula_vba_syntax::{Associativity, ModuleKind, ParseOptions};

/// Exported modules rarely exceed a few hundred KB; keep the harness well under that.
const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let data = &data[..data.len().min(MAX_INPUT_BYTES)];

    // The first byte picks options; the whole input is still the source.
    let selector = data[0];
    let options = ParseOptions {
        module_kind: match selector & 0b11 {
            1 => Some(ModuleKind::Standard),
            2 => Some(ModuleKind::Class),
            3 => Some(ModuleKind::Form),
            _ => None,
        },
        exponent_associativity: if selector & 0b100 == 0 {
            Associativity::Left
        } else {
            Associativity::Right
        },
        max_nesting_depth: if selector & 0b1000 == 0 { 64 } else { 8 },
        recognize_builtin_constants: selector & 0b1_0000 == 0,
    };

    // Non-UTF-8 and NUL-bearing input must be rejected, never panic.
    let Ok(parsed) = formula_vba_syntax::parse_module_bytes(data, &options) else {
        let source = String::from_utf8_lossy(data);
        let _ = formula_vba_syntax::parse_module_with_options(&source, &options);
        return;
    };

    // Clean modules must survive a print / reparse cycle without new errors.
    if !parsed.has_errors() {
        let printed = formula_vba_syntax::print_module(&parsed.module);
        // Right-associative `^` chains come back with added parentheses, which cost depth.
        let relaxed = ParseOptions {
            max_nesting_depth: options.max_nesting_depth * 2,
            ..options
        };
        let reparsed = formula_vba_syntax::parse_module_with_options(&printed, &relaxed);
        assert!(
            !reparsed.has_errors(),
            "printed module has errors: {:?}\n{printed}",
            reparsed.diagnostics
        );
    }
});
