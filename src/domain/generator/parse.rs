//! Parsing of generator lists such as `sma_crossover(8,20), ema_crossover(5,13)`.

use std::fmt;

use crate::domain::error::SigtraderError;

use super::{MaCrossover, MaKind, SignalGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorSpec {
    pub kind: MaKind,
    pub fast: usize,
    pub slow: usize,
}

impl GeneratorSpec {
    pub fn build(&self) -> Result<Box<dyn SignalGenerator>, SigtraderError> {
        Ok(Box::new(MaCrossover::new(self.fast, self.slow, self.kind)?))
    }
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        GeneratorSpec {
            kind: MaKind::Sma,
            fast: 8,
            slow: 20,
        }
    }
}

impl fmt::Display for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MaKind::Sma => "sma_crossover",
            MaKind::Ema => "ema_crossover",
        };
        write!(f, "{}({},{})", kind, self.fast, self.slow)
    }
}

/// Parse a comma-separated generator list. Commas inside parentheses belong
/// to the argument list. Windows are checked here, not only at build time.
pub fn parse_generators(input: &str) -> Result<Vec<GeneratorSpec>, SigtraderError> {
    let mut specs = Vec::new();
    for token in split_top_level(input)? {
        let token = token.trim();
        if token.is_empty() {
            return Err(SigtraderError::configuration(format!(
                "empty generator entry in '{input}'"
            )));
        }
        let spec = parse_one(token)?;
        MaCrossover::new(spec.fast, spec.slow, spec.kind)?;
        specs.push(spec);
    }
    Ok(specs)
}

fn split_top_level(input: &str) -> Result<Vec<&str>, SigtraderError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    SigtraderError::configuration(format!("unbalanced ')' in '{input}'"))
                })?;
            }
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SigtraderError::configuration(format!(
            "unbalanced '(' in '{input}'"
        )));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_one(token: &str) -> Result<GeneratorSpec, SigtraderError> {
    let invalid = |reason: &str| SigtraderError::configuration(format!("'{token}': {reason}"));

    let (name, args) = match token.split_once('(') {
        Some((name, rest)) => {
            let args = rest
                .strip_suffix(')')
                .ok_or_else(|| invalid("expected closing ')'"))?;
            (name.trim(), Some(args))
        }
        None => (token, None),
    };

    let kind = match name.to_lowercase().as_str() {
        "sma_crossover" | "sma" => MaKind::Sma,
        "ema_crossover" | "ema" => MaKind::Ema,
        _ => return Err(invalid("unknown generator")),
    };

    let Some(args) = args else {
        return Ok(GeneratorSpec {
            kind,
            ..GeneratorSpec::default()
        });
    };

    let windows = args
        .split(',')
        .map(|a| a.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid("windows must be positive integers"))?;

    match windows.as_slice() {
        [fast, slow] => Ok(GeneratorSpec {
            kind,
            fast: *fast,
            slow: *slow,
        }),
        _ => Err(invalid("expected two windows (fast,slow)")),
    }
}
