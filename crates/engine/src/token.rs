//! Reference-token and meta-form patterns shared by the parser, the
//! leaf-path analyzer, and the expansion engine.
//!
//! Template strings carry three reference shapes and two meta-forms:
//!
//! ```text
//! +ident+              value reference
//! !ident!              variable reference
//! @ident@              element reference / variable placeholder
//! %repeat%(body,"sep") repetition meta-form
//! %range%(a-b)         random scalar meta-form
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// `+ident+` value reference. Group 1 is the identifier.
pub static VALUE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+([a-zA-Z0-9_]+)\+").expect("value ref pattern"));

/// `!ident!` variable reference. Group 1 is the identifier.
pub static VARIABLE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!([a-zA-Z0-9_]+)!").expect("variable ref pattern"));

/// `@ident@` element reference. Group 1 is the identifier.
pub static ELEMENT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-zA-Z0-9_]+)@").expect("element ref pattern"));

/// `%repeat%(...)` meta-form. Group 1 is everything up to the first `)`.
pub static REPEAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%repeat%\((.*?)\)").expect("repeat pattern"));

/// `%range%(...)` meta-form. Group 1 is everything up to the first `)`.
pub static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%range%\((.*?)\)").expect("range pattern"));

/// A leaf template expands without touching any other value symbol: no value
/// reference and no `%repeat%` (whose body could smuggle one in arbitrarily
/// many times).
pub fn is_leaf_template(template: &str) -> bool {
    !VALUE_REF.is_match(template) && !REPEAT.is_match(template)
}

/// Number of value references in a template.
pub fn count_value_refs(template: &str) -> usize {
    VALUE_REF.find_iter(template).count()
}

/// Identifiers of all value references in a template, in order.
pub fn value_ref_idents(template: &str) -> impl Iterator<Item = &str> {
    VALUE_REF
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Identifiers of all variable references in a template, in order.
pub fn variable_ref_idents(template: &str) -> impl Iterator<Item = &str> {
    VARIABLE_REF
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Identifiers of all element references in a template, in order.
pub fn element_ref_idents(template: &str) -> impl Iterator<Item = &str> {
    ELEMENT_REF
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_template() {
        assert!(is_leaf_template("plain text"));
        assert!(is_leaf_template("!var! and @elem@ only"));
        assert!(is_leaf_template("%range%(0-9)"));
        assert!(!is_leaf_template("uses +other+"));
        assert!(!is_leaf_template("%repeat%(x)"));
    }

    #[test]
    fn test_count_value_refs() {
        assert_eq!(count_value_refs("no refs"), 0);
        assert_eq!(count_value_refs("+a+"), 1);
        assert_eq!(count_value_refs("+a++b+ then +c+"), 3);
    }

    #[test]
    fn test_ref_ident_scans() {
        let idents: Vec<&str> = value_ref_idents("<p>+attr+ +body+</p>").collect();
        assert_eq!(idents, ["attr", "body"]);

        let idents: Vec<&str> = variable_ref_idents("use !node!;").collect();
        assert_eq!(idents, ["node"]);

        let idents: Vec<&str> = element_ref_idents("var @node@ = @other@;").collect();
        assert_eq!(idents, ["node", "other"]);
    }

    #[test]
    fn test_element_ref_full_alphabet() {
        // Identifiers mix cases, digits, and underscores.
        let idents: Vec<&str> = element_ref_idents("@xZ9_q@").collect();
        assert_eq!(idents, ["xZ9_q"]);
    }

    #[test]
    fn test_repeat_capture_stops_at_first_paren() {
        let caps = REPEAT.captures("%repeat%(a,b)(c)").unwrap();
        assert_eq!(&caps[1], "a,b");
    }
}
