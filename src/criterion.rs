use tracing::warn;

/// Comparisons a criterion can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }
}

/// One parsed criterion, the operator plus the literal text it compares to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCriterion {
    pub op: CompareOp,
    pub value: String,
}

/// Split a raw criterion like ">=50" into an operator and a value.
///
/// Input that does not start with an operator character compares the whole
/// input for equality, so "abc" means == "abc" and the value keeps the full
/// string. An empty value tells the caller there is nothing usable in this
/// criterion; this function itself never fails.
pub fn parse_criterion(input: &str) -> ParsedCriterion {
    let Some(first) = input.chars().next() else {
        return ParsedCriterion {
            op: CompareOp::Eq,
            value: String::new(),
        };
    };

    if !matches!(first, '=' | '>' | '<') {
        return ParsedCriterion {
            op: CompareOp::Eq,
            value: input.to_string(),
        };
    }

    match input.rfind('=') {
        None => {
            // A bare ">" or "<" prefix.
            let op = if first == '>' {
                CompareOp::Gt
            } else {
                CompareOp::Lt
            };
            ParsedCriterion {
                op,
                value: input[1..].to_string(),
            }
        }
        Some(0) => ParsedCriterion {
            op: CompareOp::Eq,
            value: input[1..].to_string(),
        },
        Some(op_end) => ParsedCriterion {
            op: leading_operator(input, op_end),
            value: input[op_end + 1..].to_string(),
        },
    }
}

// The operator is read from the first two characters even when the last '='
// sits further in, like ">>=5". Such input is accepted with a diagnostic
// instead of being rejected.
fn leading_operator(input: &str, op_end: usize) -> CompareOp {
    let two: String = input.chars().take(2).collect();
    let op = match two.as_str() {
        "==" => CompareOp::Eq,
        ">=" => CompareOp::Ge,
        "<=" => CompareOp::Le,
        _ => match input.chars().next() {
            Some('>') => CompareOp::Gt,
            Some('<') => CompareOp::Lt,
            _ => CompareOp::Eq,
        },
    };
    if op_end > 1 {
        warn!(
            "Accepting nonstandard operator {:?} as {:?}",
            &input[..=op_end],
            op.as_str()
        );
    }
    op
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_with_leading_equals() {
        let parsed = parse_criterion("=55");
        assert_eq!(parsed.op, CompareOp::Eq);
        assert_eq!(parsed.value, "55");
    }

    #[test]
    fn double_equals() {
        let parsed = parse_criterion("==55");
        assert_eq!(parsed.op, CompareOp::Eq);
        assert_eq!(parsed.value, "55");
    }

    #[test]
    fn two_character_operators() {
        assert_eq!(
            parse_criterion(">=100"),
            ParsedCriterion {
                op: CompareOp::Ge,
                value: "100".to_string()
            }
        );
        assert_eq!(
            parse_criterion("<=12"),
            ParsedCriterion {
                op: CompareOp::Le,
                value: "12".to_string()
            }
        );
    }

    #[test]
    fn single_character_operators() {
        assert_eq!(
            parse_criterion(">50"),
            ParsedCriterion {
                op: CompareOp::Gt,
                value: "50".to_string()
            }
        );
        assert_eq!(
            parse_criterion("<50"),
            ParsedCriterion {
                op: CompareOp::Lt,
                value: "50".to_string()
            }
        );
    }

    #[test]
    fn text_compares_the_full_input() {
        let parsed = parse_criterion("abc");
        assert_eq!(parsed.op, CompareOp::Eq);
        assert_eq!(parsed.value, "abc");
    }

    #[test]
    fn text_with_embedded_equals_stays_whole() {
        let parsed = parse_criterion("a=b");
        assert_eq!(parsed.op, CompareOp::Eq);
        assert_eq!(parsed.value, "a=b");
    }

    #[test]
    fn nonstandard_operator_keeps_the_comparator() {
        let parsed = parse_criterion(">>=5");
        assert_eq!(parsed.op, CompareOp::Gt);
        assert_eq!(parsed.value, "5");

        let parsed = parse_criterion(">=>=5");
        assert_eq!(parsed.op, CompareOp::Ge);
        assert_eq!(parsed.value, "5");
    }

    #[test]
    fn operator_without_value_is_unusable() {
        assert_eq!(parse_criterion(">").value, "");
        assert_eq!(parse_criterion("=").value, "");
        assert_eq!(parse_criterion("").value, "");
    }
}
