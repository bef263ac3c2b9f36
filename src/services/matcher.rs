use crate::domain::schema::KeywordKind;
use regex::Regex;

#[derive(thiserror::Error, Debug, Clone)]
pub enum MatcherError {
    #[error("expected valid range a,b with no spaces, got: \"{0}\"")]
    InvalidRangeExpression(String),
    #[error("operator \"{op}\" expects a number, got: \"{operand}\" (quote the expression, the shell may eat it)")]
    InvalidNumericOperand { op: &'static str, operand: String },
    #[error("unknown operator in \"{0}\"")]
    UnknownOperator(String),
    #[error("invalid regex \"{pattern}\": {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    // Longest first so "<=" is not read as "<".
    const PREFIXES: [(&'static str, CmpOp); 6] = [
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        ("<=", CmpOp::Le),
        (">=", CmpOp::Ge),
        ("<", CmpOp::Lt),
        (">", CmpOp::Gt),
    ];

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    fn eval(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberMatcher {
    Cmp(CmpOp, i64),
    /// Half-open `[lo, hi)`.
    Range(i64, i64),
}

impl NumberMatcher {
    pub fn parse(expr: &str) -> Result<Self, MatcherError> {
        if expr.contains(',') {
            let parts: Vec<&str> = expr.split(',').collect();
            let bounds: Option<Vec<i64>> = parts.iter().map(|p| parse_int(p)).collect();
            let (lo, hi) = match (parts.len(), bounds.as_deref()) {
                (2, Some(&[a, b])) => (a.min(b), a.max(b)),
                _ => return Err(MatcherError::InvalidRangeExpression(expr.to_string())),
            };
            if lo == hi {
                return Ok(NumberMatcher::Cmp(CmpOp::Eq, lo));
            }
            return Ok(NumberMatcher::Range(lo, hi));
        }

        if let Some(n) = parse_int(expr) {
            return Ok(NumberMatcher::Cmp(CmpOp::Eq, n));
        }

        let (op, rest) = CmpOp::PREFIXES
            .iter()
            .find_map(|(sym, op)| expr.strip_prefix(sym).map(|rest| (*op, rest)))
            .ok_or_else(|| MatcherError::UnknownOperator(expr.to_string()))?;
        let operand = parse_int(rest).ok_or_else(|| MatcherError::InvalidNumericOperand {
            op: op.symbol(),
            operand: rest.to_string(),
        })?;
        Ok(NumberMatcher::Cmp(op, operand))
    }

    pub fn matches_number(&self, n: i64) -> bool {
        match *self {
            NumberMatcher::Cmp(op, rhs) => op.eval(n, rhs),
            NumberMatcher::Range(lo, hi) => lo <= n && n < hi,
        }
    }

    /// Candidates that are not integers never match.
    pub fn is_match(&self, candidate: &str) -> bool {
        parse_int(candidate).is_some_and(|n| self.matches_number(n))
    }
}

#[derive(Clone, Debug)]
pub struct RegexMatcher {
    re: Regex,
}

impl RegexMatcher {
    /// Greedy patterns match anywhere in the candidate; lazy ones must match
    /// it whole.
    pub fn new(pattern: &str, lazy: bool) -> Result<Self, MatcherError> {
        let body = if lazy {
            pattern.to_string()
        } else {
            format!(".*{}.*", pattern)
        };
        let anchored = format!("^{}$", body);
        let re = Regex::new(&anchored).map_err(|source| MatcherError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { re })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.re.is_match(candidate)
    }
}

#[derive(Clone, Debug)]
pub enum Matcher {
    Regex(RegexMatcher),
    Number(NumberMatcher),
}

impl Matcher {
    /// Picks the matcher a keyword of this kind is queried with.
    pub fn for_keyword(kind: KeywordKind, pattern: &str, lazy: bool) -> Result<Self, MatcherError> {
        match kind {
            KeywordKind::Numeric => NumberMatcher::parse(pattern).map(Matcher::Number),
            KeywordKind::Flag | KeywordKind::Text | KeywordKind::Repeatable => {
                RegexMatcher::new(pattern, lazy).map(Matcher::Regex)
            }
        }
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            Matcher::Regex(m) => m.is_match(candidate),
            Matcher::Number(m) => m.is_match(candidate),
        }
    }
}

/// Integer literal with optional sign and base prefix (`0x`, `0o`, `0b`, or
/// a bare leading `0` for octal).
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
