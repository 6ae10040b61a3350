//! Engine constants, tunable from inside a grammar via `%const%` directives.

/// A parsed `%const%` value literal.
///
/// The literal shape decides the type: surrounding double quotes make a
/// string, a `.` makes a float, anything else must parse as an integer.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ConstValue {
    /// Parse the text after `:=` in a `%const%` directive.
    pub fn parse(raw: &str) -> Result<ConstValue, String> {
        if let Some(rest) = raw.strip_prefix('"') {
            let inner = rest
                .strip_suffix('"')
                .ok_or_else(|| format!("unterminated string literal {raw}"))?;
            return Ok(ConstValue::Str(inner.to_string()));
        }
        if raw.contains('.') {
            let f = raw
                .parse::<f64>()
                .map_err(|_| format!("malformed float literal {raw}"))?;
            return Ok(ConstValue::Float(f));
        }
        let i = raw
            .parse::<i64>()
            .map_err(|_| format!("malformed integer literal {raw}"))?;
        Ok(ConstValue::Int(i))
    }
}

/// Generation constants for one engine instance.
///
/// Defaults match the stock grammar dialect; any field can be overridden by a
/// `%const%` line before generation starts. `tabs` is the only member that
/// comes from the driver instead of the grammar.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Inclusive bounds on the number of variances sampled per artifact.
    pub variance_min: u32,
    pub variance_max: u32,
    /// Text wrapped around every variance line and every preamble line.
    pub variance_prefix: String,
    pub variance_suffix: String,
    /// `%repeat%` draws its count from `[1, 2^uniform(1, max_repeat_power)]`.
    pub max_repeat_power: u32,
    /// Number of value expansions after which leaf mode arms.
    pub leaf_trigger: u32,
    pub generate_repeat_max: u32,
    pub generate_variable_max: u32,
    pub generate_new_variable_ratio: f64,
    /// Tab indentation applied to emitted lines and `\n` template escapes.
    pub tabs: usize,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            variance_min: 1,
            variance_max: 1,
            variance_prefix: String::new(),
            variance_suffix: String::new(),
            max_repeat_power: 12,
            leaf_trigger: 256,
            generate_repeat_max: 8,
            generate_variable_max: 5,
            generate_new_variable_ratio: 0.1,
            tabs: 0,
        }
    }
}

impl GenConfig {
    /// Apply one `%const%` assignment. Unknown names and literals of the
    /// wrong shape for the named constant are errors.
    pub fn set_const(&mut self, name: &str, value: ConstValue) -> Result<(), String> {
        match name {
            "VARIANCE_MIN" => self.variance_min = expect_uint(name, value)?,
            "VARIANCE_MAX" => self.variance_max = expect_uint(name, value)?,
            "VARIANCE_PREFIX" => self.variance_prefix = expect_str(name, value)?,
            "VARIANCE_SUFFIX" => self.variance_suffix = expect_str(name, value)?,
            "MAX_REPEAT_POWER" => self.max_repeat_power = expect_uint(name, value)?,
            "LEAF_TRIGGER" => self.leaf_trigger = expect_uint(name, value)?,
            "GENERATE_REPEAT_MAX" => self.generate_repeat_max = expect_uint(name, value)?,
            "GENERATE_VARIABLE_MAX" => self.generate_variable_max = expect_uint(name, value)?,
            "GENERATE_NEW_VARIABLE_RATIO" => {
                self.generate_new_variable_ratio = expect_float(name, value)?;
            }
            _ => return Err(format!("trying to set non-existent constant {name}")),
        }
        Ok(())
    }
}

fn expect_uint(name: &str, value: ConstValue) -> Result<u32, String> {
    match value {
        ConstValue::Int(i) if i >= 0 => {
            u32::try_from(i).map_err(|_| format!("constant {name} out of range"))
        }
        ConstValue::Int(_) => Err(format!("constant {name} must not be negative")),
        _ => Err(format!("constant {name} expects an integer value")),
    }
}

fn expect_float(name: &str, value: ConstValue) -> Result<f64, String> {
    match value {
        ConstValue::Float(f) => Ok(f),
        ConstValue::Int(i) => Ok(i as f64),
        ConstValue::Str(_) => Err(format!("constant {name} expects a numeric value")),
    }
}

fn expect_str(name: &str, value: ConstValue) -> Result<String, String> {
    match value {
        ConstValue::Str(s) => Ok(s),
        _ => Err(format!("constant {name} expects a string value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_literal() {
        assert_eq!(
            ConstValue::parse("\"<go>\"").unwrap(),
            ConstValue::Str("<go>".to_string())
        );
        assert_eq!(
            ConstValue::parse("\"\"").unwrap(),
            ConstValue::Str(String::new())
        );
    }

    #[test]
    fn test_parse_unterminated_string() {
        let err = ConstValue::parse("\"oops").unwrap_err();
        assert!(err.contains("unterminated"));
    }

    #[test]
    fn test_parse_numeric_literals() {
        assert_eq!(ConstValue::parse("42").unwrap(), ConstValue::Int(42));
        assert_eq!(ConstValue::parse("-3").unwrap(), ConstValue::Int(-3));
        assert_eq!(ConstValue::parse("0.5").unwrap(), ConstValue::Float(0.5));
    }

    #[test]
    fn test_set_known_constants() {
        let mut config = GenConfig::default();
        config
            .set_const("VARIANCE_MAX", ConstValue::Int(7))
            .unwrap();
        config
            .set_const("VARIANCE_PREFIX", ConstValue::Str("try { ".into()))
            .unwrap();
        config
            .set_const("GENERATE_NEW_VARIABLE_RATIO", ConstValue::Float(0.25))
            .unwrap();
        assert_eq!(config.variance_max, 7);
        assert_eq!(config.variance_prefix, "try { ");
        assert_eq!(config.generate_new_variable_ratio, 0.25);
    }

    #[test]
    fn test_set_unknown_constant() {
        let mut config = GenConfig::default();
        let err = config
            .set_const("NO_SUCH_THING", ConstValue::Int(1))
            .unwrap_err();
        assert!(err.contains("non-existent constant NO_SUCH_THING"));
    }

    #[test]
    fn test_set_wrong_shape() {
        let mut config = GenConfig::default();
        let err = config
            .set_const("LEAF_TRIGGER", ConstValue::Str("lots".into()))
            .unwrap_err();
        assert!(err.contains("expects an integer"));

        let err = config
            .set_const("VARIANCE_SUFFIX", ConstValue::Int(3))
            .unwrap_err();
        assert!(err.contains("expects a string"));
    }

    #[test]
    fn test_set_negative_count() {
        let mut config = GenConfig::default();
        let err = config
            .set_const("VARIANCE_MIN", ConstValue::Int(-1))
            .unwrap_err();
        assert!(err.contains("must not be negative"));
    }
}
