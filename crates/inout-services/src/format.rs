//! pt-BR number, duration and hour formatting for summaries and reports

/// Round half away from zero to `decimals` places
fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Fixed-decimal number with a `.` decimal point, halves rounded up
pub fn fixed(value: f64, decimals: usize) -> String {
    let rounded = round_to(value, decimals);
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", decimals, rounded)
}

/// Fixed-decimal number with `.` thousands and `,` decimal separators
pub fn number_br(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, round_to(value.abs(), decimals));
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Integer count in pt-BR grouping
pub fn count_br(value: usize) -> String {
    number_br(value as f64, 0)
}

/// Compact duration: `Xd Yh`, `Xh Ymin`, `Xmin` or `Xs`
pub fn duration(ms: f64) -> String {
    let total_secs = (ms / 1000.0).floor().max(0.0) as u64;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}min", hours, minutes)
    } else if minutes > 0 {
        format!("{}min", minutes)
    } else {
        format!("{}s", total_secs)
    }
}

/// Two-digit hour with an `h` suffix, e.g. `09h`
pub fn hour(h: u32) -> String {
    format!("{:02}h", h % 24)
}

/// Two-hour activity window starting at `h`, e.g. `09h e 11h`
pub fn hour_range(h: u32) -> String {
    format!("{} e {}", hour(h), hour((h + 2) % 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_br() {
        assert_eq!(number_br(1234567.891, 2), "1.234.567,89");
        assert_eq!(number_br(999.0, 0), "999");
        assert_eq!(number_br(1000.0, 0), "1.000");
        assert_eq!(number_br(12.345, 1), "12,3");
        assert_eq!(number_br(-1500.5, 1), "-1.500,5");
        assert_eq!(number_br(-0.01, 1), "0,0");
        assert_eq!(count_br(42_000), "42.000");
    }

    #[test]
    fn test_fixed_rounds_halves_up() {
        assert_eq!(fixed(2.5, 0), "3");
        assert_eq!(fixed(33.333, 0), "33");
        assert_eq!(fixed(1.25, 1), "1.3");
        assert_eq!(fixed(-0.2, 0), "0");
    }

    #[test]
    fn test_duration() {
        assert_eq!(duration(45_999.0), "45s");
        assert_eq!(duration(120_000.0), "2min");
        assert_eq!(duration(3_900_000.0), "1h 5min");
        assert_eq!(duration(93_600_000.0), "1d 2h");
    }

    #[test]
    fn test_hour_range_wraps() {
        assert_eq!(hour(9), "09h");
        assert_eq!(hour_range(9), "09h e 11h");
        assert_eq!(hour_range(23), "23h e 01h");
    }
}
