//! Display formatting for point totals and rates.

/// Compact "+N" label for the hourly income badge.
///
/// Values of a thousand or more are scaled to `K`, `M` or `B` with two
/// decimals; smaller values are shown as-is.
pub fn format_profit_per_hour(profit: u64) -> String {
    const SCALES: [(u64, &str); 3] = [
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    for (scale, suffix) in SCALES {
        if profit >= scale {
            return format!("+{:.2}{}", profit as f64 / scale as f64, suffix);
        }
    }
    format!("+{}", profit)
}

/// Point total with thousands separators (`22749365` -> `22,749,365`).
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One-based "current / total" tier badge.
pub fn tier_badge(tier_index: usize, tier_count: usize) -> String {
    format!("{} / {}", tier_index + 1, tier_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_label_scales() {
        assert_eq!(format_profit_per_hour(593_043), "+593.04K");
        assert_eq!(format_profit_per_hour(2_500_000), "+2.50M");
        assert_eq!(format_profit_per_hour(1_000_000_000), "+1.00B");
        assert_eq!(format_profit_per_hour(999), "+999");
        assert_eq!(format_profit_per_hour(0), "+0");
    }

    #[test]
    fn test_points_grouping() {
        assert_eq!(format_points(0), "0");
        assert_eq!(format_points(999), "999");
        assert_eq!(format_points(1000), "1,000");
        assert_eq!(format_points(22_749_365), "22,749,365");
    }

    #[test]
    fn test_tier_badge() {
        assert_eq!(tier_badge(6, 10), "7 / 10");
    }
}
