//! Symbol store: the three symbol kinds and the tables that hold them.
//!
//! Values, variables, and variances share an identifier and three reference
//! sets but diverge in what their alternatives look like and how they
//! generate. Each kind is its own struct embedding [`SymbolHeader`]; the
//! tables are insertion-ordered so that index-based random sampling and
//! table walks are deterministic for a given grammar and seed.

use crate::config::GenConfig;
use crate::token;
use indexmap::{IndexMap, IndexSet};

/// Fields common to all three symbol kinds: the identifier and the
/// references its templates make, one set per reference shape.
#[derive(Debug, Clone, Default)]
pub struct SymbolHeader {
    pub ident: String,
    pub value_refs: IndexSet<String>,
    pub variable_refs: IndexSet<String>,
    pub element_refs: IndexSet<String>,
}

impl SymbolHeader {
    pub fn new(ident: impl Into<String>) -> Self {
        SymbolHeader {
            ident: ident.into(),
            ..SymbolHeader::default()
        }
    }

    /// Record every reference token occurring in `template`.
    pub fn record_refs(&mut self, template: &str) {
        for ident in token::value_ref_idents(template) {
            self.value_refs.insert(ident.to_string());
        }
        for ident in token::variable_ref_idents(template) {
            self.variable_refs.insert(ident.to_string());
        }
        for ident in token::element_ref_idents(template) {
            self.element_refs.insert(ident.to_string());
        }
    }
}

/// One step of a path from a value symbol toward a leaf: following the
/// direct reference `hop` makes progress toward the leaf alternative held by
/// `leaf`, `depth` hops away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPath {
    pub leaf: String,
    pub hop: String,
    pub depth: usize,
}

/// A named choice point. Alternatives are template strings; the leaf list
/// repeats those alternatives that expand without recursing into another
/// value. `leaf_paths` is filled in by the analyzer after parsing.
#[derive(Debug, Clone)]
pub struct ValueSymbol {
    pub header: SymbolHeader,
    pub alternatives: Vec<String>,
    pub leaves: Vec<String>,
    pub leaf_paths: Vec<LeafPath>,
}

impl ValueSymbol {
    pub fn new(ident: impl Into<String>) -> Self {
        ValueSymbol {
            header: SymbolHeader::new(ident),
            alternatives: Vec::new(),
            leaves: Vec::new(),
            leaf_paths: Vec::new(),
        }
    }

    pub fn add_alternative(&mut self, template: String) {
        if token::is_leaf_template(&template) {
            self.leaves.push(template.clone());
        }
        self.alternatives.push(template);
    }

    pub fn add_leaf_path(&mut self, leaf: &str, hop: &str, depth: usize) {
        self.leaf_paths.push(LeafPath {
            leaf: leaf.to_string(),
            hop: hop.to_string(),
            depth,
        });
    }
}

/// A named source of fresh element names `<ident><N>`. Its default templates
/// are the `(prefix, suffix)` halves of a `variable` block line split around
/// the `@ident@` placeholder. Counters and rendered defaults are per-artifact
/// expansion state, not stored here.
#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub header: SymbolHeader,
    pub defaults: Vec<(String, String)>,
}

impl VariableSymbol {
    pub fn new(ident: impl Into<String>) -> Self {
        VariableSymbol {
            header: SymbolHeader::new(ident),
            defaults: Vec::new(),
        }
    }

    pub fn add_default(&mut self, prefix: String, suffix: String) {
        self.defaults.push((prefix, suffix));
    }
}

/// A top-level production. Artifact bodies are built exclusively by sampling
/// variances.
#[derive(Debug, Clone)]
pub struct VarianceSymbol {
    pub header: SymbolHeader,
    pub alternatives: Vec<String>,
}

impl VarianceSymbol {
    pub fn new(ident: impl Into<String>) -> Self {
        VarianceSymbol {
            header: SymbolHeader::new(ident),
            alternatives: Vec::new(),
        }
    }

    pub fn add_alternative(&mut self, template: String) {
        self.alternatives.push(template);
    }
}

/// A parsed grammar: the three symbol tables plus the constants the grammar
/// configured for itself.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub values: IndexMap<String, ValueSymbol>,
    pub variables: IndexMap<String, VariableSymbol>,
    pub variances: IndexMap<String, VarianceSymbol>,
    pub config: GenConfig,
}
