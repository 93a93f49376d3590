//! Patch bundling: the `.diff` payload wire form.
//!
//! One line per bundled op, `"\t" spec "\t" value "\n"`. Specs inside a
//! bundle are key suffixes relative to the carrying op's object, or full
//! specifiers; values must be line-safe.

use super::error::ParseError;

pub fn bundle<'a>(lines: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (spec, value) in lines {
        out.push('\t');
        out.push_str(spec);
        out.push('\t');
        out.push_str(value);
        out.push('\n');
    }
    out
}

pub fn unbundle(payload: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut out = Vec::new();
    for line in payload.split('\n') {
        if line.is_empty() {
            continue;
        }
        let rest = line.strip_prefix('\t').ok_or(ParseError::Diff {
            reason: "line missing leading tab".into(),
        })?;
        let (spec, value) = rest.split_once('\t').ok_or(ParseError::Diff {
            reason: "line missing spec/value separator".into(),
        })?;
        out.push((spec.to_string(), value.to_string()));
    }
    Ok(out)
}
