//! Leaf-path analyzer.
//!
//! The expansion engine can only force termination if every value it may
//! visit knows which of its direct references makes progress toward a leaf.
//! This pass inverts the value-reference graph and, from every value holding
//! a leaf alternative, walks the inverted edges depth-first, stamping each
//! predecessor with a `(leaf, hop, depth)` annotation. A per-traversal seen
//! set breaks reference cycles; annotation happens before the seen check, so
//! a node reachable along several edges collects one annotation per edge.

use crate::grammar::Grammar;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Annotate every value symbol with the leaf paths discoverable from it.
pub fn annotate(grammar: &mut Grammar) {
    let reverse = reverse_refs(grammar);

    let seeds: Vec<String> = grammar
        .values
        .values()
        .filter(|v| !v.leaves.is_empty())
        .map(|v| v.header.ident.clone())
        .collect();

    for leaf in &seeds {
        let Some(predecessors) = reverse.get(leaf) else {
            continue;
        };
        for pred in predecessors {
            if let Some(value) = grammar.values.get_mut(pred) {
                value.add_leaf_path(leaf, leaf, 0);
            }
            let mut seen = HashSet::from([pred.clone()]);
            propagate(grammar, &reverse, leaf, pred, &mut seen, 1);
        }
    }
}

/// `reverse[x]` lists the values whose alternatives reference `x`, in table
/// order.
fn reverse_refs(grammar: &Grammar) -> IndexMap<String, Vec<String>> {
    let mut reverse: IndexMap<String, Vec<String>> = IndexMap::new();
    for value in grammar.values.values() {
        for target in &value.header.value_refs {
            reverse
                .entry(target.clone())
                .or_default()
                .push(value.header.ident.clone());
        }
    }
    reverse
}

fn propagate(
    grammar: &mut Grammar,
    reverse: &IndexMap<String, Vec<String>>,
    leaf: &str,
    node: &str,
    seen: &mut HashSet<String>,
    depth: usize,
) {
    let Some(predecessors) = reverse.get(node) else {
        return;
    };
    for pred in predecessors {
        if let Some(value) = grammar.values.get_mut(pred) {
            value.add_leaf_path(leaf, node, depth);
        }
        if seen.contains(pred) {
            continue;
        }
        seen.insert(pred.clone());
        propagate(grammar, reverse, leaf, pred, seen, depth + 1);
    }
}
