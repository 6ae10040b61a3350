//! Output assembler: one artifact per call.
//!
//! Variance bodies are generated first; rendering them is what populates the
//! variable defaults through `!x!` bootstrapping, and the preamble reads
//! those defaults afterwards. The document nevertheless places the preamble
//! ahead of the bodies, so every name used in a body is declared above it.

use crate::expand::Expander;
use crate::grammar::Grammar;
use rand::rngs::StdRng;

/// Compose one artifact: prefix, variable preamble, variance bodies, suffix.
pub fn compose(
    grammar: &Grammar,
    rng: &mut StdRng,
    prefix: &str,
    suffix: &str,
) -> Result<String, String> {
    if grammar.variances.is_empty() {
        return Err("no variances found in grammar".to_string());
    }

    let config = &grammar.config;
    let indent = "\t".repeat(config.tabs);
    let mut expander = Expander::new(grammar, rng);
    let count = expander.variance_count()?;

    let mut body = String::new();
    for _ in 0..count {
        let ident = expander.random_variance_ident()?;
        let text = expander.variance(ident)?;
        body.push_str(&indent);
        body.push_str(&config.variance_prefix);
        body.push_str(&text);
        body.push_str(&config.variance_suffix);
        body.push('\n');
    }

    let mut preamble = String::new();
    for (_, default) in expander.variable_defaults() {
        preamble.push_str(&indent);
        preamble.push_str(&config.variance_prefix);
        preamble.push_str(default);
        preamble.push_str(&config.variance_suffix);
        preamble.push('\n');
    }

    let mut document =
        String::with_capacity(prefix.len() + preamble.len() + body.len() + suffix.len());
    document.push_str(prefix);
    document.push_str(&preamble);
    document.push_str(&body);
    document.push_str(suffix);
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leafpath;
    use crate::parser::GrammarParser;
    use crate::resolver;
    use rand::SeedableRng;

    fn grammar(source: &str) -> Grammar {
        let mut grammar = GrammarParser::parse(source, 0).unwrap();
        resolver::resolve(&grammar).unwrap();
        leafpath::annotate(&mut grammar);
        grammar
    }

    #[test]
    fn test_single_variance_document() {
        let g = grammar(
            "%section% := value\n\
             x :=\n\
             \thi\n\
             \n\
             %section% := variance\n\
             v :=\n\
             \t+x+\n",
        );
        let mut rng = StdRng::seed_from_u64(1);
        let document = compose(&g, &mut rng, "", "").unwrap();
        assert_eq!(document, "hi\n");
    }

    #[test]
    fn test_prefix_and_suffix_wrap_document() {
        let g = grammar(
            "%section% := variance\n\
             v :=\n\
             \tbody\n",
        );
        let mut rng = StdRng::seed_from_u64(1);
        let document = compose(&g, &mut rng, "<html>\n", "</html>\n").unwrap();
        assert_eq!(document, "<html>\nbody\n</html>\n");
    }

    #[test]
    fn test_preamble_precedes_body() {
        let g = grammar(
            "%section% := variable\n\
             n :=\n\
             \tvar @n@ = 0;\n\
             \n\
             %section% := variance\n\
             v :=\n\
             \tuse !n!;\n",
        );
        let mut rng = StdRng::seed_from_u64(1);
        let document = compose(&g, &mut rng, "", "").unwrap();
        assert_eq!(document, "var n1 = 0;\nuse n1;\n");
    }

    #[test]
    fn test_tabs_and_wrap_apply_to_all_lines() {
        let source = "%const% VARIANCE_PREFIX := \"try { \"\n\
                      %const% VARIANCE_SUFFIX := \" }\"\n\
                      %section% := variable\n\
                      n :=\n\
                      \tvar @n@;\n\
                      \n\
                      %section% := variance\n\
                      v :=\n\
                      \tuse !n!;\n";
        let mut g = GrammarParser::parse(source, 1).unwrap();
        resolver::resolve(&g).unwrap();
        leafpath::annotate(&mut g);
        let mut rng = StdRng::seed_from_u64(1);
        let document = compose(&g, &mut rng, "", "").unwrap();
        assert_eq!(document, "\ttry { var n1; }\n\ttry { use n1; }\n");
    }

    #[test]
    fn test_variance_count_range() {
        let g = grammar(
            "%const% VARIANCE_MIN := 3\n\
             %const% VARIANCE_MAX := 3\n\
             %section% := variance\n\
             v :=\n\
             \tline\n",
        );
        let mut rng = StdRng::seed_from_u64(9);
        let document = compose(&g, &mut rng, "", "").unwrap();
        assert_eq!(document, "line\nline\nline\n");
    }

    #[test]
    fn test_no_variances_is_fatal() {
        let g = grammar(
            "%section% := value\n\
             x :=\n\
             \thi\n",
        );
        let mut rng = StdRng::seed_from_u64(0);
        let err = compose(&g, &mut rng, "", "").unwrap_err();
        assert_eq!(err, "no variances found in grammar");
    }
}
