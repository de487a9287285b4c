//! Value and label formatting for nutrition rows.

use serde_json::Value;

/// Marker shown for missing values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a number with exactly two decimals.
///
/// Rounds on the exact binary value, breaking exact ties away from zero,
/// so `0.125` gives `"0.13"` while `3.005` (stored just below the tie)
/// gives `"3.00"`. Magnitudes of 1e21 and above use exponent notation.
pub fn to_fixed_2(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // Negative zero prints as zero
    let x = if x == 0.0 { 0.0 } else { x };
    if x.abs() >= 1e21 {
        return exponent_string(x);
    }

    if is_hundredths_tie(x) {
        let sign = if x < 0.0 { "-" } else { "" };
        // An exact tie has exactly three decimals ending in 5
        let exact = format!("{:.3}", x.abs());
        let truncated = &exact[..exact.len() - 1];
        return format!("{}{}", sign, increment_last_digit(truncated));
    }

    format!("{:.2}", x)
}

/// Two-decimal rendering with a trailing ".00" dropped.
///
/// Only the exact ".00" suffix goes: `3.0` -> `"3"`, `3.1` -> `"3.10"`.
pub fn format_number(x: f64) -> String {
    let fixed = to_fixed_2(x);
    match fixed.strip_suffix(".00") {
        Some(stripped) => stripped.to_string(),
        None => fixed,
    }
}

/// Render a nutrient value with its unit appended.
///
/// Missing values, `null` and the string `"N/A"` render as `"N/A"` with no
/// unit. Zero is a value, not a missing one.
pub fn display_value(value: Option<&Value>, unit: &str) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) if s == NOT_AVAILABLE => NOT_AVAILABLE.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) => format!("{}{}", format_number(x), unit),
            None => format!("{}{}", n, unit),
        },
        Some(other) => format!("{}{}", text_of(other), unit),
    }
}

/// Turn a nutrient key into a label: underscores become spaces and the
/// first letter of every word is upper-cased.
pub fn derive_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_is_word = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

/// Plain-text form of a JSON value, as it would appear interpolated into text.
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => text_of(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whether a JSON value counts as "set" (non-empty string, non-zero
/// number, true, any array or object).
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0 && !x.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// True when `x * 100` sits exactly halfway between two integers.
///
/// That holds iff `x * 200` is an odd integer. With `x = m * 2^e` that
/// means `m` has exactly `-(e + 3)` trailing zero bits.
fn is_hundredths_tie(x: f64) -> bool {
    let bits = x.abs().to_bits();
    let exp_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exp_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exp_bits - 1075)
    };
    if mantissa == 0 {
        return false;
    }
    let shift = -(exponent + 3);
    shift >= 0 && i64::from(mantissa.trailing_zeros()) == shift
}

/// Add one unit in the last place to a non-negative decimal string.
fn increment_last_digit(s: &str) -> String {
    let mut digits: Vec<u8> = s.bytes().collect();
    let mut i = digits.len();
    loop {
        if i == 0 {
            digits.insert(0, b'1');
            break;
        }
        i -= 1;
        match digits[i] {
            b'.' => continue,
            b'9' => digits[i] = b'0',
            d => {
                digits[i] = d + 1;
                break;
            }
        }
    }
    String::from_utf8(digits).unwrap_or_default()
}

fn exponent_string(x: f64) -> String {
    let s = format!("{:e}", x);
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_numbers_drop_decimals() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(101.004), "101");
        assert_eq!(format_number(250.0), "250");
    }

    #[test]
    fn test_single_trailing_zero_is_kept() {
        assert_eq!(format_number(3.1), "3.10");
        assert_eq!(format_number(0.5), "0.50");
        assert_eq!(format_number(12.34), "12.34");
    }

    #[test]
    fn test_rounding_follows_exact_binary_value() {
        // 3.005 is stored as 3.00499999...
        assert_eq!(format_number(3.005), "3");
        // 1.005 likewise
        assert_eq!(to_fixed_2(1.005), "1.00");
        // 0.125 is exact, so it is a true tie and rounds up
        assert_eq!(to_fixed_2(0.125), "0.13");
        assert_eq!(to_fixed_2(-0.125), "-0.13");
        assert_eq!(to_fixed_2(2.675), "2.67");
        assert_eq!(to_fixed_2(9.995), "9.99");
        assert_eq!(to_fixed_2(99.375), "99.38");
        assert_eq!(to_fixed_2(0.875), "0.88");
    }

    #[test]
    fn test_tie_carries_into_integer_part() {
        assert_eq!(increment_last_digit("9.99"), "10.00");
        assert_eq!(increment_last_digit("0.12"), "0.13");
        assert_eq!(to_fixed_2(1.625), "1.63");
    }

    #[test]
    fn test_small_negatives() {
        assert_eq!(format_number(-0.001), "-0");
        assert_eq!(format_number(-2.5), "-2.50");
    }

    #[test]
    fn test_huge_and_special_values() {
        assert_eq!(to_fixed_2(1e21), "1e+21");
        assert_eq!(to_fixed_2(f64::NAN), "NaN");
        assert_eq!(to_fixed_2(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_display_value_missing_markers() {
        assert_eq!(display_value(None, "g"), "N/A");
        assert_eq!(display_value(Some(&Value::Null), "g"), "N/A");
        assert_eq!(display_value(Some(&json!("N/A")), "g"), "N/A");
    }

    #[test]
    fn test_display_value_appends_unit_without_space() {
        assert_eq!(display_value(Some(&json!(0)), "g"), "0g");
        assert_eq!(display_value(Some(&json!(101.004)), "kcal"), "101kcal");
        assert_eq!(display_value(Some(&json!(3.1)), "mg"), "3.10mg");
        assert_eq!(display_value(Some(&json!("<0.5")), "g"), "<0.5g");
        assert_eq!(display_value(Some(&json!(true)), "g"), "trueg");
    }

    #[test]
    fn test_derive_label() {
        assert_eq!(derive_label("omega_3_fat"), "Omega 3 Fat");
        assert_eq!(derive_label("energy"), "Energy");
        assert_eq!(derive_label("trans-fat"), "Trans-Fat");
        assert_eq!(derive_label("vitamin_b12"), "Vitamin B12");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
    }

    #[test]
    fn test_text_of_arrays_and_objects() {
        assert_eq!(text_of(&json!([1, null, "a"])), "1,,a");
        assert_eq!(text_of(&json!({"a": 1})), "[object Object]");
    }
}
