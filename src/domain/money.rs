use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For EUR/USD, 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Convert cents to major units for JSON rendering.
pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// Inputs with more than two decimal places are rejected rather than
/// truncated: a sub-cent amount cannot be applied to a balance exactly.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.strip_prefix('-').unwrap_or(input);

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::OutOfRange)?
    };

    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        // Single digit like "5" means 50 cents
        1 => decimal_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        2 => decimal_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
        _ => {
            // Trailing zeros beyond the cent ("1.500") carry no value
            let (head, tail) = decimal_str.split_at(2);
            if tail.chars().any(|c| c != '0') {
                return Err(ParseCentsError::TooPrecise);
            }
            head.parse().map_err(|_| ParseCentsError::InvalidFormat)?
        }
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::OutOfRange)?;
    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    TooPrecise,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooPrecise => write!(f, "amount has more than two decimal places"),
            ParseCentsError::OutOfRange => write!(f, "amount is out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.34"), Ok(1234));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("0.01"), Ok(1));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("1.500"), Ok(150));
    }

    #[test]
    fn test_parse_cents_rejects_sub_cent_amounts() {
        assert_eq!(parse_cents("100.999"), Err(ParseCentsError::TooPrecise));
        assert_eq!(parse_cents("0.001"), Err(ParseCentsError::TooPrecise));
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert_eq!(parse_cents("abc"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("12.34.56"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1e5"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents(""), Err(ParseCentsError::InvalidFormat));
    }

    #[test]
    fn test_parse_cents_out_of_range() {
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::OutOfRange)
        );
    }

    #[test]
    fn test_cents_to_units() {
        assert_eq!(cents_to_units(7000), 70.0);
        assert_eq!(cents_to_units(1234), 12.34);
    }
}
