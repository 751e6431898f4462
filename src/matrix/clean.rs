use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

static NUMERAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Characters MrBayes rejects inside taxon names.
const DISALLOWED_NAME_CHARS: &[char] = &['(', ')', '?', '=', '+', '&', ';', ','];

/// Sanitize a taxon name for the matrix and calibration blocks: whitespace
/// becomes `_`, everything in [`DISALLOWED_NAME_CHARS`] is dropped outright.
/// Whitespace substitution runs first, so `?` and friends are never turned
/// into underscores. Idempotent.
pub fn clean_taxon_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| !DISALLOWED_NAME_CHARS.contains(c))
        .collect()
}

/// Clean one character-state cell into a matrix token.
///
/// A bare missing (`?`) or gap (`-`) marker and a bare numeral pass through
/// unchanged. Anything containing a comma is a polymorphic observation:
/// placeholder `?` entries are dropped, a single surviving state is
/// unwrapped, several are grouped, e.g. `0,1` → `(01)`. A list left with no
/// states is an error, never an empty `()` group.
pub fn clean_state_cell(raw: &str) -> Result<String> {
    let value = raw.trim();
    if value == "?" || value == "-" {
        return Ok(value.to_string());
    }

    if !value.contains(',') {
        if NUMERAL_RE.is_match(value) {
            return Ok(value.to_string());
        }
        bail!("unrecognized state cell {raw:?}");
    }

    let states: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|token| *token != "?")
        .collect();

    if let Some(bad) = states.iter().find(|token| !NUMERAL_RE.is_match(token)) {
        bail!("unrecognized state {bad:?} in multi-state cell {raw:?}");
    }

    match states.as_slice() {
        [] => bail!("multi-state cell {raw:?} contains only placeholders"),
        [single] => Ok((*single).to_string()),
        _ => Ok(format!("({})", states.concat())),
    }
}

// ── Tests ──
