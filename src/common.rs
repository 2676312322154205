//! Shared presentation helpers used by both the web UI and the CLI.

/// Formats an amount as a currency string with thousands separators and two
/// decimal places: `12345.678` becomes `"12,345.68"`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_amount() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(7.5), "7.50");
        assert_eq!(format_currency(999.99), "999.99");
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(format_currency(1000.0), "1,000.00");
        assert_eq!(format_currency(12345.678), "12,345.68");
        assert_eq!(format_currency(1234567.891), "1,234,567.89");
    }

    #[test]
    fn test_rounding_carries_into_whole_part() {
        assert_eq!(format_currency(999.999), "1,000.00");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_currency(-12345.6), "-12,345.60");
        // Rounds to zero cents; no stray minus sign.
        assert_eq!(format_currency(-0.001), "0.00");
    }
}
