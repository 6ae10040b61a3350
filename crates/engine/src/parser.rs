//! Line-oriented grammar parser.
//!
//! A grammar file is a sequence of sections (`%section% := value | variable |
//! variance`), each holding blank-line-separated blocks:
//!
//! ```text
//! ident :=
//! <TAB>alternative template
//! <TAB>alternative template
//! ```
//!
//! Blocks start untyped at their header and specialize to the current
//! section's kind on the first assignment line. A blank line (or the end of
//! input) commits the block into its section table. `%%%` comments and
//! `%const%` directives can appear anywhere.

use crate::config::{ConstValue, GenConfig};
use crate::grammar::{Grammar, SymbolHeader, ValueSymbol, VarianceSymbol, VariableSymbol};
use crate::token;
use regex::Regex;
use std::sync::LazyLock;

static CONST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%const% *([A-Z_]+) *:= *(.*)$").expect("const pattern"));

static SECTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^%section% *:= *(value|variable|variance)$").expect("section pattern")
});

static BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_]+) *:= *$").expect("header pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Void,
    Value,
    Variable,
    Variance,
}

impl Section {
    fn from_keyword(keyword: &str) -> Option<Section> {
        match keyword.to_ascii_lowercase().as_str() {
            "value" => Some(Section::Value),
            "variable" => Some(Section::Variable),
            "variance" => Some(Section::Variance),
            _ => None,
        }
    }
}

/// A block under construction: untyped until its first assignment line.
enum Block {
    Untyped(SymbolHeader),
    Value(ValueSymbol),
    Variable(VariableSymbol),
    Variance(VarianceSymbol),
}

impl Block {
    fn ident(&self) -> &str {
        match self {
            Block::Untyped(header) => &header.ident,
            Block::Value(v) => &v.header.ident,
            Block::Variable(v) => &v.header.ident,
            Block::Variance(v) => &v.header.ident,
        }
    }

    fn header_mut(&mut self) -> &mut SymbolHeader {
        match self {
            Block::Untyped(header) => header,
            Block::Value(v) => &mut v.header,
            Block::Variable(v) => &mut v.header,
            Block::Variance(v) => &mut v.header,
        }
    }
}

/// Streaming parser; feed lines, then [`GrammarParser::finish`].
pub struct GrammarParser {
    grammar: Grammar,
    section: Section,
    block: Option<Block>,
    line_number: usize,
}

impl GrammarParser {
    pub fn new(tabs: usize) -> Self {
        GrammarParser {
            grammar: Grammar {
                config: GenConfig {
                    tabs,
                    ..GenConfig::default()
                },
                ..Grammar::default()
            },
            section: Section::Void,
            block: None,
            line_number: 0,
        }
    }

    /// Parse a whole grammar text in one call.
    pub fn parse(text: &str, tabs: usize) -> Result<Grammar, String> {
        let mut parser = GrammarParser::new(tabs);
        for line in text.lines() {
            parser.parse_line(line)?;
        }
        parser.finish()
    }

    /// Consume one line. Line classes are tried in order; first match wins.
    pub fn parse_line(&mut self, line: &str) -> Result<(), String> {
        self.line_number += 1;
        let n = self.line_number;

        if line.starts_with("%%%") {
            return Ok(());
        }

        if let Some(caps) = CONST_LINE.captures(line) {
            let value = ConstValue::parse(caps[2].trim())
                .map_err(|e| format!("{e} (line {n})"))?;
            self.grammar
                .config
                .set_const(&caps[1], value)
                .map_err(|e| format!("{e} (line {n})"))?;
            return Ok(());
        }

        if let Some(caps) = SECTION_LINE.captures(line) {
            self.section = Section::from_keyword(&caps[1])
                .ok_or_else(|| format!("unknown section keyword (line {n})"))?;
            return Ok(());
        }

        if line.trim().is_empty() {
            return self.commit_block();
        }

        if self.section == Section::Void {
            return Err(format!("non-empty line in void section (line {n})"));
        }

        if self.block.is_none() {
            self.parse_block_header(line)
        } else {
            self.parse_assignment(line)
        }
    }

    /// Commit any pending block and hand back the grammar. End of input
    /// terminates a block exactly like a blank line.
    pub fn finish(mut self) -> Result<Grammar, String> {
        self.commit_block()?;
        Ok(self.grammar)
    }

    fn parse_block_header(&mut self, line: &str) -> Result<(), String> {
        let caps = BLOCK_HEADER
            .captures(line)
            .ok_or_else(|| format!("top level syntax error (line {})", self.line_number))?;
        self.block = Some(Block::Untyped(SymbolHeader::new(&caps[1])));
        Ok(())
    }

    fn parse_assignment(&mut self, line: &str) -> Result<(), String> {
        let n = self.line_number;
        let Some(body) = line.strip_prefix('\t') else {
            return Err(format!("assign level syntax error (line {n})"));
        };

        // Literal \n escapes become a newline plus the configured indent.
        let template = body.replace("\\n", &self.newline_indent());

        match self.section {
            Section::Value => self.assign_value(template, n),
            Section::Variable => self.assign_variable(template, n),
            Section::Variance => self.assign_variance(template, n),
            Section::Void => Err(format!("invalid state for assignment (line {n})")),
        }
    }

    fn assign_value(&mut self, template: String, n: usize) -> Result<(), String> {
        let refs = template.clone();
        match self.block.take() {
            Some(Block::Untyped(header)) => {
                let mut value = ValueSymbol {
                    header,
                    alternatives: Vec::new(),
                    leaves: Vec::new(),
                    leaf_paths: Vec::new(),
                };
                value.add_alternative(template);
                self.block = Some(Block::Value(value));
            }
            Some(Block::Value(mut value)) => {
                value.add_alternative(template);
                self.block = Some(Block::Value(value));
            }
            Some(other) => {
                self.block = Some(other);
                return Err(format!("inconsistent object for value assignment (line {n})"));
            }
            None => return Err(format!("invalid state for assignment (line {n})")),
        }
        self.record_refs(&refs);
        Ok(())
    }

    fn assign_variable(&mut self, template: String, n: usize) -> Result<(), String> {
        let Some(m) = token::ELEMENT_REF.find(&template) else {
            return Err(format!("variable assignment syntax error (line {n})"));
        };
        let placeholder = &template[m.start() + 1..m.end() - 1];
        let block_ident = match &self.block {
            Some(block) => block.ident(),
            None => return Err(format!("invalid state for assignment (line {n})")),
        };
        if placeholder != block_ident {
            return Err(format!("variable name mismatch (line {n})"));
        }

        let prefix = template[..m.start()].to_string();
        let suffix = template[m.end()..].to_string();
        // Exactly one placeholder per default template.
        if token::ELEMENT_REF.is_match(&suffix) {
            return Err(format!("variable assignment syntax error (line {n})"));
        }

        match self.block.take() {
            Some(Block::Untyped(header)) => {
                let mut variable = VariableSymbol {
                    header,
                    defaults: Vec::new(),
                };
                variable.add_default(prefix, suffix);
                self.block = Some(Block::Variable(variable));
            }
            Some(Block::Variable(mut variable)) => {
                variable.add_default(prefix, suffix);
                self.block = Some(Block::Variable(variable));
            }
            Some(other) => {
                self.block = Some(other);
                return Err(format!(
                    "inconsistent object for variable assignment (line {n})"
                ));
            }
            None => return Err(format!("invalid state for assignment (line {n})")),
        }
        self.record_refs(&template);
        Ok(())
    }

    fn assign_variance(&mut self, template: String, n: usize) -> Result<(), String> {
        let refs = template.clone();
        match self.block.take() {
            Some(Block::Untyped(header)) => {
                let mut variance = VarianceSymbol {
                    header,
                    alternatives: Vec::new(),
                };
                variance.add_alternative(template);
                self.block = Some(Block::Variance(variance));
            }
            Some(Block::Variance(mut variance)) => {
                variance.add_alternative(template);
                self.block = Some(Block::Variance(variance));
            }
            Some(other) => {
                self.block = Some(other);
                return Err(format!(
                    "inconsistent object for variance assignment (line {n})"
                ));
            }
            None => return Err(format!("invalid state for assignment (line {n})")),
        }
        self.record_refs(&refs);
        Ok(())
    }

    fn record_refs(&mut self, template: &str) {
        if let Some(block) = &mut self.block {
            block.header_mut().record_refs(template);
        }
    }

    fn commit_block(&mut self) -> Result<(), String> {
        let n = self.line_number;
        match self.block.take() {
            None => Ok(()),
            Some(Block::Untyped(_)) => Err(format!("empty assignment (line {n})")),
            Some(Block::Value(value)) => {
                let ident = value.header.ident.clone();
                if self.grammar.values.contains_key(&ident) {
                    return Err(format!("redefining value {ident} (line {n})"));
                }
                self.grammar.values.insert(ident, value);
                Ok(())
            }
            Some(Block::Variable(variable)) => {
                let ident = variable.header.ident.clone();
                if self.grammar.variables.contains_key(&ident) {
                    return Err(format!("redefining variable {ident} (line {n})"));
                }
                self.grammar.variables.insert(ident, variable);
                Ok(())
            }
            Some(Block::Variance(variance)) => {
                let ident = variance.header.ident.clone();
                if self.grammar.variances.contains_key(&ident) {
                    return Err(format!("redefining variance {ident} (line {n})"));
                }
                self.grammar.variances.insert(ident, variance);
                Ok(())
            }
        }
    }

    fn newline_indent(&self) -> String {
        let mut indent = String::with_capacity(1 + self.grammar.config.tabs);
        indent.push('\n');
        for _ in 0..self.grammar.config.tabs {
            indent.push('\t');
        }
        indent
    }
}
