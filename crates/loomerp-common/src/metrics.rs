//! Computed business values.
//!
//! The database stores these as generated columns; the same formulas are used
//! here to validate input and to fill values for rows built in memory.

use chrono::NaiveDateTime;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Line efficiency as a percentage of target. Zero when no target is set.
pub fn efficiency(produced: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    round2(produced / target * 100.0)
}

pub fn stock_value(quantity: f64, unit_cost: f64) -> f64 {
    round2(quantity * unit_cost)
}

/// Hours between check-in and check-out, if both are present and ordered.
pub fn hours_between(check_in: Option<NaiveDateTime>, check_out: Option<NaiveDateTime>) -> Option<f64> {
    let (start, end) = (check_in?, check_out?);
    if end < start {
        return None;
    }
    let minutes = (end - start).num_minutes() as f64;
    Some(round2(minutes / 60.0))
}

pub fn is_low_stock(quantity: f64, reorder_level: f64) -> bool {
    quantity <= reorder_level
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_efficiency() {
        assert_eq!(efficiency(450.0, 500.0), 90.0);
        assert_eq!(efficiency(1.0, 3.0), 33.33);
        assert_eq!(efficiency(600.0, 500.0), 120.0);
        assert_eq!(efficiency(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(stock_value(12.5, 4.0), 50.0);
        assert_eq!(stock_value(0.0, 99.0), 0.0);
    }

    #[test]
    fn test_hours_between() {
        assert_eq!(hours_between(Some(at(8, 0)), Some(at(16, 30))), Some(8.5));
        assert_eq!(hours_between(Some(at(8, 0)), None), None);
        assert_eq!(hours_between(Some(at(16, 0)), Some(at(8, 0))), None);
    }

    #[test]
    fn test_low_stock_includes_reorder_level() {
        assert!(is_low_stock(5.0, 5.0));
        assert!(is_low_stock(0.0, 1.0));
        assert!(!is_low_stock(6.0, 5.0));
    }
}
