//! Expansion engine: turns one sampled template into finished text.
//!
//! An [`Expander`] is created per artifact and carries all mutable expansion
//! state: leaf mode, the expansion budget that arms it, and the per-variable
//! counters and rendered defaults. The grammar itself stays immutable and is
//! shared across artifacts.
//!
//! Substitution order inside every template is fixed: meta-forms, then
//! element refs, then value refs, then variable refs. Value substitution can
//! introduce new text of every shape, but only into its own recursive
//! expansion; the cursor loops below never rescan text a substitution
//! produced.

use crate::grammar::{Grammar, SymbolHeader, ValueSymbol};
use crate::meta;
use crate::token;
use indexmap::IndexMap;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashSet;

/// Per-artifact state of one variable: how many elements it has issued and
/// the default declaration rendered if `!x!` ran before any `@x@`.
#[derive(Debug, Clone, Default)]
pub struct VarState {
    pub count: u32,
    pub default: String,
}

/// One artifact's worth of expansion state over a borrowed grammar and PRNG.
pub struct Expander<'a> {
    grammar: &'a Grammar,
    rng: &'a mut StdRng,
    leaf_mode: bool,
    leaf_trigger: u32,
    vars: IndexMap<String, VarState>,
}

impl<'a> Expander<'a> {
    pub fn new(grammar: &'a Grammar, rng: &'a mut StdRng) -> Self {
        let vars = grammar
            .variables
            .keys()
            .map(|ident| (ident.clone(), VarState::default()))
            .collect();
        Expander {
            grammar,
            rng,
            leaf_mode: false,
            leaf_trigger: 0,
            vars,
        }
    }

    /// Sample how many variances this artifact gets.
    pub fn variance_count(&mut self) -> Result<u32, String> {
        let config = &self.grammar.config;
        if config.variance_min > config.variance_max {
            return Err(format!(
                "VARIANCE_MIN {} exceeds VARIANCE_MAX {}",
                config.variance_min, config.variance_max
            ));
        }
        Ok(self.rng.gen_range(config.variance_min..=config.variance_max))
    }

    /// Pick a variance uniformly from the table.
    pub fn random_variance_ident(&mut self) -> Result<&'a str, String> {
        let grammar = self.grammar;
        if grammar.variances.is_empty() {
            return Err("no variances found in grammar".to_string());
        }
        let idx = self.rng.gen_range(0..grammar.variances.len());
        grammar
            .variances
            .get_index(idx)
            .map(|(ident, _)| ident.as_str())
            .ok_or_else(|| "variance table index out of range".to_string())
    }

    /// Generate one variance body.
    pub fn variance(&mut self, ident: &str) -> Result<String, String> {
        let grammar = self.grammar;
        let symbol = grammar
            .variances
            .get(ident)
            .ok_or_else(|| format!("undefined variance {ident}"))?;
        if symbol.alternatives.is_empty() {
            return Err(format!("variance {ident} has no alternatives"));
        }
        let idx = self.rng.gen_range(0..symbol.alternatives.len());
        self.expand_template(&symbol.header, symbol.alternatives[idx].clone(), false)
    }

    /// Rendered default declarations, in variable table order.
    pub fn variable_defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|(_, state)| !state.default.is_empty())
            .map(|(ident, state)| (ident.as_str(), state.default.as_str()))
    }

    /// Generate value symbol `ident`. Every entry here spends one unit of the
    /// leaf budget; once the budget is gone, alternative choice switches to
    /// the leaf-seeking rules.
    fn value(&mut self, ident: &str) -> Result<String, String> {
        let grammar = self.grammar;
        let symbol = grammar
            .values
            .get(ident)
            .ok_or_else(|| format!("undefined value reference to {ident}"))?;

        if !self.leaf_mode {
            self.leaf_trigger += 1;
            if self.leaf_trigger > grammar.config.leaf_trigger {
                self.leaf_mode = true;
            }
        }

        if symbol.alternatives.is_empty() {
            return Ok(String::new());
        }

        let chosen = if !self.leaf_mode {
            let idx = self.rng.gen_range(0..symbol.alternatives.len());
            symbol.alternatives[idx].clone()
        } else if !symbol.leaves.is_empty() {
            let idx = self.rng.gen_range(0..symbol.leaves.len());
            symbol.leaves[idx].clone()
        } else {
            self.forced_choice(symbol)?
        };

        self.expand_template(&symbol.header, chosen, false)
    }

    /// Leaf-mode choice for a value with no leaf alternative: prefer
    /// repeat-free alternatives, narrow to the fewest value references, then
    /// scan from a random start for one whose references are all known hops
    /// toward a leaf.
    fn forced_choice(&mut self, symbol: &ValueSymbol) -> Result<String, String> {
        let favoured: Vec<&String> = symbol
            .alternatives
            .iter()
            .filter(|alt| !token::REPEAT.is_match(alt))
            .collect();
        let favoured = if favoured.is_empty() {
            symbol.alternatives.iter().collect()
        } else {
            favoured
        };

        let mut minimized: Vec<&String> = Vec::new();
        for budget in 1..8 {
            minimized = favoured
                .iter()
                .copied()
                .filter(|alt| token::count_value_refs(alt) <= budget)
                .collect();
            if !minimized.is_empty() {
                break;
            }
        }
        if minimized.is_empty() {
            minimized = favoured;
        }

        let hops: HashSet<&str> = symbol
            .leaf_paths
            .iter()
            .map(|path| path.hop.as_str())
            .collect();

        let len = minimized.len();
        let mut idx = self.rng.gen_range(0..len);
        for _ in 0..len {
            let candidate = minimized[idx];
            if token::value_ref_idents(candidate).all(|ident| hops.contains(ident)) {
                return Ok(candidate.clone());
            }
            idx = (idx + 1) % len;
        }
        Err(format!(
            "no path to leaf in force-leaf mode in value {}",
            symbol.header.ident
        ))
    }

    /// Produce an existing element name of `ident`, bootstrapping a default
    /// declaration if the variable has issued nothing yet.
    fn variable(&mut self, ident: &str) -> Result<String, String> {
        let grammar = self.grammar;
        let count = self
            .vars
            .get(ident)
            .map(|state| state.count)
            .ok_or_else(|| format!("undefined variable reference to {ident}"))?;
        if count > 0 {
            let n = self.rng.gen_range(1..=count);
            return Ok(format!("{ident}{n}"));
        }

        // First demand before any fresh element: synthesize element 1 from a
        // random default template. The counter moves before rendering so a
        // nested reference to the same variable resolves to element 1.
        let symbol = grammar
            .variables
            .get(ident)
            .ok_or_else(|| format!("undefined variable reference to {ident}"))?;
        if symbol.defaults.is_empty() {
            return Err(format!("variable {ident} has no default templates"));
        }
        let pick = self.rng.gen_range(0..symbol.defaults.len());
        if let Some(state) = self.vars.get_mut(ident) {
            state.count = 1;
        }

        let (prefix, suffix) = &symbol.defaults[pick];
        let rendered = format!("{prefix}{ident}1{suffix}");
        // Element refs stay untouched while the variable bootstraps.
        let rendered = self.expand_template(&symbol.header, rendered, true)?;
        if let Some(state) = self.vars.get_mut(ident) {
            state.default = rendered;
        }
        Ok(format!("{ident}1"))
    }

    /// Issue a fresh element name of `ident`.
    fn fresh_element(&mut self, ident: &str) -> Result<String, String> {
        let state = self
            .vars
            .get_mut(ident)
            .ok_or_else(|| format!("undefined element reference to {ident}"))?;
        state.count += 1;
        Ok(format!("{ident}{}", state.count))
    }

    fn expand_template(
        &mut self,
        header: &SymbolHeader,
        template: String,
        skip_elements: bool,
    ) -> Result<String, String> {
        let grammar = self.grammar;
        let evaluated = meta::eval(&template, &header.ident, &grammar.config, self.rng)?;
        let evaluated = if skip_elements {
            evaluated
        } else {
            self.subst_element_refs(header, evaluated)?
        };
        let evaluated = self.subst_value_refs(header, evaluated)?;
        self.subst_variable_refs(header, evaluated)
    }

    fn subst_element_refs(
        &mut self,
        header: &SymbolHeader,
        input: String,
    ) -> Result<String, String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_str();
        while let Some(m) = token::ELEMENT_REF.find(rest) {
            let ident = &rest[m.start() + 1..m.end() - 1];
            if !header.element_refs.contains(ident) {
                return Err(format!(
                    "element xref inconsistency in {} for {}",
                    header.ident, ident
                ));
            }
            out.push_str(&rest[..m.start()]);
            let element = self.fresh_element(ident)?;
            out.push_str(&element);
            rest = &rest[m.end()..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn subst_value_refs(&mut self, header: &SymbolHeader, input: String) -> Result<String, String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_str();
        while let Some(m) = token::VALUE_REF.find(rest) {
            let ident = &rest[m.start() + 1..m.end() - 1];
            if !header.value_refs.contains(ident) {
                return Err(format!(
                    "value xref inconsistency in {} looking for {}",
                    header.ident, ident
                ));
            }
            out.push_str(&rest[..m.start()]);
            let generated = self.value(ident)?;
            out.push_str(&generated);
            rest = &rest[m.end()..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn subst_variable_refs(
        &mut self,
        header: &SymbolHeader,
        input: String,
    ) -> Result<String, String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_str();
        while let Some(m) = token::VARIABLE_REF.find(rest) {
            let ident = &rest[m.start() + 1..m.end() - 1];
            if !header.variable_refs.contains(ident) {
                return Err(format!(
                    "variable xref inconsistency in {} looking for {}",
                    header.ident, ident
                ));
            }
            out.push_str(&rest[..m.start()]);
            let name = self.variable(ident)?;
            out.push_str(&name);
            rest = &rest[m.end()..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
