//! Meta-form evaluator: rewrites `%repeat%` and `%range%` forms until none
//! remain, drawing every choice from the caller's PRNG.
//!
//! `%repeat%` runs to fixpoint before `%range%` starts, and both rewrite as
//! cursor loops over the working string rather than recursing, since a single
//! pass can multiply the template by thousands of copies.

use crate::config::GenConfig;
use crate::token;
use rand::Rng;
use rand::rngs::StdRng;
use regex::Regex;
use std::sync::LazyLock;

/// Splits `body, "sep"` inside a `%repeat%`. Group 1 is the body (greedy, so
/// only the last quoted tail is taken as a separator), group 2 the separator.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^(.*), *"(.*?)" *$"#).expect("separator pattern"));

/// Splits `a-b` inside a `%range%` at the last hyphen.
static BOUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.*)-(.*?)$").expect("bounds pattern"));

/// Evaluate all meta-forms in `template`. `ident` is the symbol being
/// expanded, used only in diagnostics.
pub fn eval(
    template: &str,
    ident: &str,
    config: &GenConfig,
    rng: &mut StdRng,
) -> Result<String, String> {
    let expanded = eval_repeat(template, ident, config, rng)?;
    eval_range(&expanded, ident, rng)
}

/// Rewrite `%repeat%(body[, "sep"])` forms left to right until none remain.
/// Each rewrite restarts the scan, which is what resolves nested repeats
/// introduced by a duplicated body.
fn eval_repeat(
    template: &str,
    ident: &str,
    config: &GenConfig,
    rng: &mut StdRng,
) -> Result<String, String> {
    let mut line = template.to_string();
    loop {
        let Some(m) = token::REPEAT.find(&line) else {
            return Ok(line);
        };
        let inner = &line[m.start() + "%repeat%(".len()..m.end() - 1];
        let (body, sep) = match SEPARATOR.captures(inner) {
            Some(caps) => (caps[1].to_string(), caps[2].to_string()),
            None => (inner.to_string(), String::new()),
        };

        if config.max_repeat_power == 0 {
            return Err(format!("MAX_REPEAT_POWER must be positive in {ident}"));
        }
        let power = rng.gen_range(1..=config.max_repeat_power);
        let cap = 2u64
            .checked_pow(power)
            .ok_or_else(|| format!("repeat meta power overflow in {ident}"))?;
        let count = rng.gen_range(1..=cap);

        let mut out = String::with_capacity(line.len() + body.len());
        out.push_str(&line[..m.start()]);
        for i in 0..count {
            out.push_str(&body);
            if i != count - 1 {
                out.push_str(&sep);
            }
        }
        out.push_str(&line[m.end()..]);
        line = out;
    }
}

/// Rewrite `%range%(a-b)` forms left to right until none remain.
fn eval_range(template: &str, ident: &str, rng: &mut StdRng) -> Result<String, String> {
    let mut line = template.to_string();
    loop {
        let Some(m) = token::RANGE.find(&line) else {
            return Ok(line);
        };
        let inner = &line[m.start() + "%range%(".len()..m.end() - 1];
        let caps = BOUNDS
            .captures(inner)
            .ok_or_else(|| format!("malformed range meta in {ident}"))?;
        let rendered = sample_bound(&caps[1], &caps[2], ident, rng)?;

        let mut out = String::with_capacity(line.len());
        out.push_str(&line[..m.start()]);
        out.push_str(&rendered);
        out.push_str(&line[m.end()..]);
        line = out;
    }
}

/// Draw one scalar from a `%range%` bound pair. Two single characters form a
/// character range; otherwise the presence of `.` selects float over integer,
/// and the two sides must agree.
fn sample_bound(start: &str, end: &str, ident: &str, rng: &mut StdRng) -> Result<String, String> {
    let mut start_chars = start.chars();
    let mut end_chars = end.chars();
    if let (Some(s), None, Some(e), None) = (
        start_chars.next(),
        start_chars.next(),
        end_chars.next(),
        end_chars.next(),
    ) {
        let (lo, hi) = (u32::from(s), u32::from(e));
        if lo > hi {
            return Err(format!("malformed range meta in {ident}"));
        }
        let code = rng.gen_range(lo..=hi);
        return char::from_u32(code)
            .map(|c| c.to_string())
            .ok_or_else(|| format!("range meta produced an invalid character in {ident}"));
    }

    if !start.contains('.') {
        if end.contains('.') {
            return Err(format!("range meta int/float mismatch in {ident}"));
        }
        let lo: i64 = start
            .parse()
            .map_err(|_| format!("range meta integer conversion error in {ident}"))?;
        let hi: i64 = end
            .parse()
            .map_err(|_| format!("range meta integer conversion error in {ident}"))?;
        if lo > hi {
            return Err(format!("malformed range meta in {ident}"));
        }
        return Ok(rng.gen_range(lo..=hi).to_string());
    }

    if !end.contains('.') {
        return Err(format!("range meta int/float mismatch in {ident}"));
    }
    let a: f64 = start
        .parse()
        .map_err(|_| format!("range meta float conversion error in {ident}"))?;
    let b: f64 = end
        .parse()
        .map_err(|_| format!("range meta float conversion error in {ident}"))?;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Ok(rng.gen_range(lo..=hi).to_string())
}
