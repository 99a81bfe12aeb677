use serde_json::Value;

/// Lenient float parse for values written by the game client.
///
/// Numbers are taken as-is; strings are trimmed and, if they do not parse
/// whole, the longest numeric prefix is used (`"12.5pts"` -> 12.5).
/// Returns `None` for anything else, including non-finite results.
pub fn parse_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>().ok().or_else(|| float_prefix(s))
        }
        _ => None,
    }?;

    parsed.is_finite().then_some(parsed)
}

/// Lenient integer parse: floats are truncated, strings use their leading digits
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => int_prefix(s.trim()),
        _ => None,
    }
}

/// Non-negative score, 0 when missing or unusable
pub fn score_or_zero(value: Option<&Value>) -> f64 {
    value
        .and_then(parse_float)
        .filter(|v| *v > 0.0)
        .unwrap_or(0.0)
}

/// Non-negative count, 0 when missing or unusable
pub fn amount_or_zero(value: Option<&Value>) -> u64 {
    value
        .and_then(parse_int)
        .filter(|v| *v > 0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

fn float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

fn int_prefix(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}
