//! HOMFLY invariant normalization.
//!
//! The fast classifier's topology layer emits HOMFLY polynomials in its
//! own notation: `^` for exponentiation, braces for grouping, and implied
//! multiplication between a closing group or a digit and a variable
//! letter. The symbolic engine wants an explicit expression over the
//! formal variables `a` and `z`, and the identity database stores the
//! invariant under a different sign convention — reached by substituting
//! each variable with itself times the imaginary unit.

use crate::external::SymbolicEngine;
use crate::models::Result;
use regex::Regex;

/// A HOMFLY invariant normalized for database lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Homfly {
    /// The unit polynomial, the invariant's value on the unknot
    Trivial,
    /// Convention-adjusted canonical polynomial text
    Poly(String),
}

impl Homfly {
    /// The string placed in the lookup feature vector.
    pub fn query_string(&self) -> &str {
        match self {
            Self::Trivial => "1",
            Self::Poly(text) => text,
        }
    }
}

/// Rewrite the classifier's polynomial notation into an explicit
/// expression: `^` becomes `**`, braces become parentheses, and the
/// implied products `)a`, `)z`, `<digit>a`, `<digit>z` gain a `*`.
pub fn rewrite_plcurve_expr(raw: &str) -> String {
    let braced = raw.replace('^', "**").replace('{', "(").replace('}', ")");
    // A variable letter cannot open an implied product, so one pass is
    // enough: matches never overlap.
    let implied = Regex::new(r"([0-9)])([az])").unwrap();
    implied.replace_all(&braced, "$1*$2").into_owned()
}

/// Normalize the classifier's textual HOMFLY into a lookup invariant.
///
/// Empty text and the literal `1` denote the unit polynomial and skip the
/// engine entirely; everything else is rewritten, parsed, and
/// convention-adjusted by the symbolic engine.
pub fn normalize(raw: &str, engine: &dyn SymbolicEngine) -> Result<Homfly> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "1" {
        return Ok(Homfly::Trivial);
    }

    let converted = engine.homfly_convention(&rewrite_plcurve_expr(trimmed))?;
    if converted.trim() == "1" {
        Ok(Homfly::Trivial)
    } else {
        Ok(Homfly::Poly(converted))
    }
}
