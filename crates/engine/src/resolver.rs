//! Cross-reference resolver.
//!
//! References stay identifiers into the flat symbol tables; resolving means
//! proving, before any generation starts, that every recorded reference names
//! a symbol of the matching kind. Value and variable references resolve
//! against their own tables; element references resolve against the variable
//! table, since only a variable block can give an element a default.

use crate::grammar::{Grammar, SymbolHeader};

/// Validate every reference in every symbol. Dangling references are fatal.
pub fn resolve(grammar: &Grammar) -> Result<(), String> {
    for value in grammar.values.values() {
        check_header(&value.header, grammar)?;
    }
    for variable in grammar.variables.values() {
        check_header(&variable.header, grammar)?;
    }
    for variance in grammar.variances.values() {
        check_header(&variance.header, grammar)?;
    }
    Ok(())
}

fn check_header(header: &SymbolHeader, grammar: &Grammar) -> Result<(), String> {
    for target in &header.value_refs {
        if !grammar.values.contains_key(target) {
            return Err(format!(
                "undefined value reference from {} to {}",
                header.ident, target
            ));
        }
    }
    for target in &header.variable_refs {
        if !grammar.variables.contains_key(target) {
            return Err(format!(
                "undefined variable reference from {} to {}",
                header.ident, target
            ));
        }
    }
    for target in &header.element_refs {
        if !grammar.variables.contains_key(target) {
            return Err(format!(
                "element reference without a default variable from {} to {}",
                header.ident, target
            ));
        }
    }
    Ok(())
}
