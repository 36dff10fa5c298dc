use rust_decimal_macros::dec;

use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

struct Share {
    pct: Option<f64>,
    cost: Option<f64>,
}

impl CostShare for Share {
    fn cost_percentage(&self) -> Option<f64> {
        self.pct
    }

    fn allocated_cost(&self) -> Option<f64> {
        self.cost
    }
}

// ── percentage_to_amount ──────────────────────────────────────

#[test]
fn test_percentage_to_amount_basic() {
    assert_eq!(percentage_to_amount(1_000_000.0, 25.0), 250_000.0);
    assert_eq!(percentage_to_amount(5_000_000.0, 50.0), 2_500_000.0);
}

#[test]
fn test_percentage_to_amount_bad_total_is_zero() {
    assert_eq!(percentage_to_amount(-100.0, 50.0), 0.0);
    assert_eq!(percentage_to_amount(f64::NAN, 50.0), 0.0);
    assert_eq!(percentage_to_amount(f64::INFINITY, 50.0), 0.0);
}

#[test]
fn test_percentage_to_amount_does_not_clamp() {
    assert_eq!(percentage_to_amount(1000.0, 150.0), 1500.0);
    assert_eq!(percentage_to_amount(1000.0, -10.0), -100.0);
}

#[test]
fn test_percentage_to_amount_non_finite_percentage() {
    assert_eq!(percentage_to_amount(1000.0, f64::NAN), 0.0);
}

// ── amount_to_percentage ──────────────────────────────────────

#[test]
fn test_amount_to_percentage_basic() {
    assert_eq!(amount_to_percentage(1_000_000.0, 250_000.0), 25.0);
}

#[test]
fn test_amount_to_percentage_zero_total() {
    assert_eq!(amount_to_percentage(0.0, 500.0), 0.0);
    assert_eq!(amount_to_percentage(-10.0, 500.0), 0.0);
}

#[test]
fn test_amount_to_percentage_non_finite() {
    assert_eq!(amount_to_percentage(f64::NAN, 500.0), 0.0);
    assert_eq!(amount_to_percentage(1000.0, f64::INFINITY), 0.0);
}

#[test]
fn test_round_trip_within_tolerance() {
    for total in [0.0, 1.0, 999.99, 1_000_000.0, 5_000_000.0, 123_456_789.0] {
        for pct in [0.0, 0.5, 12.5, 33.33, 50.0, 99.99, 100.0] {
            let back = amount_to_percentage(total, percentage_to_amount(total, pct));
            if total == 0.0 {
                assert_eq!(back, 0.0);
            } else {
                assert!(approx(back, pct), "total={total} pct={pct} back={back}");
            }
        }
    }
}

// ── clamp_percentage ──────────────────────────────────────────

#[test]
fn test_clamp_percentage() {
    assert_eq!(clamp_percentage(-5.0), 0.0);
    assert_eq!(clamp_percentage(150.0), 100.0);
    assert_eq!(clamp_percentage(42.5), 42.5);
    assert_eq!(clamp_percentage(f64::NAN), 0.0);
    assert_eq!(clamp_percentage(f64::NEG_INFINITY), 0.0);
}

// ── sum / remaining / can_allocate ────────────────────────────

#[test]
fn test_sum_skips_missing() {
    let shares = [Some(50.0), None, Some(30.0)];
    assert_eq!(sum_allocated_percentage(shares), 80.0);
}

#[test]
fn test_sum_skips_non_finite() {
    let shares = vec![10.0, f64::NAN, 20.0];
    assert_eq!(sum_allocated_percentage(&shares), 30.0);
}

#[test]
fn test_sum_empty() {
    let shares: Vec<f64> = Vec::new();
    assert_eq!(sum_allocated_percentage(&shares), 0.0);
    assert_eq!(remaining_percentage(&shares), 100.0);
}

#[test]
fn test_remaining_never_negative() {
    assert_eq!(remaining_percentage([70.0, 40.0]), 0.0);
    assert_eq!(remaining_percentage([70.0, 10.0]), 20.0);
}

#[test]
fn test_can_allocate_up_to_full() {
    assert!(can_allocate([60.0], 40.0));
    assert!(!can_allocate([60.0], 40.01));
    assert!(can_allocate([33.33, 33.33], 33.34));
    assert!(!can_allocate([10.0], f64::NAN));
}

#[test]
fn test_three_customer_scenario() {
    let total_cost = 5_000_000.0;
    let shares = vec![50.0, 30.0];

    let sum = sum_allocated_percentage(&shares);
    assert_eq!(sum, 80.0);
    assert!(sum < FULL_ALLOCATION);
    assert_eq!(percentage_to_amount(total_cost, shares[0]), 2_500_000.0);
    assert_eq!(percentage_to_amount(total_cost, shares[1]), 1_500_000.0);

    // a third customer at 25% would take the project to 105%
    assert!(!can_allocate(&shares, 25.0));
    assert!(can_allocate(&shares, 20.0));
}

// ── resolve ───────────────────────────────────────────────────

#[test]
fn test_resolve_from_percentage() {
    let share = Some(10.0);
    assert_eq!(resolve_allocated_cost(&share, 1_000_000.0, None), 100_000.0);
}

#[test]
fn test_resolve_prefers_overview() {
    let share = Some(10.0);
    assert_eq!(resolve_allocated_cost(&share, 1_000_000.0, Some(999.0)), 999.0);
}

#[test]
fn test_resolve_ignores_non_finite_overview() {
    let share = Some(10.0);
    assert_eq!(
        resolve_allocated_cost(&share, 1_000_000.0, Some(f64::NAN)),
        100_000.0
    );
}

#[test]
fn test_resolve_uses_own_allocated_cost() {
    let share = Share {
        pct: Some(10.0),
        cost: Some(42.0),
    };
    assert_eq!(resolve_allocated_cost(&share, 1_000_000.0, None), 42.0);
    assert_eq!(resolve_allocated_cost(&share, 1_000_000.0, Some(7.0)), 7.0);
}

#[test]
fn test_resolve_nothing_known() {
    let share: Option<f64> = None;
    assert_eq!(resolve_allocated_cost(&share, 1_000_000.0, None), 0.0);
}

#[test]
fn test_resolve_percentage_from_amount() {
    let share = Share {
        pct: None,
        cost: Some(250_000.0),
    };
    assert_eq!(resolve_percentage(&share, 1_000_000.0), 25.0);
    assert_eq!(resolve_percentage(&share, 0.0), 0.0);

    let both = Share {
        pct: Some(40.0),
        cost: Some(250_000.0),
    };
    assert_eq!(resolve_percentage(&both, 1_000_000.0), 40.0);
}

// ── format_millions ───────────────────────────────────────────

#[test]
fn test_format_millions() {
    assert_eq!(format_millions(2_500_000.0, SUMMARY_DECIMALS), "2.5");
    assert_eq!(format_millions(1_234_567.0, DETAIL_DECIMALS), "1.23");
    assert_eq!(format_millions(0.0, SUMMARY_DECIMALS), "0.0");
    assert_eq!(format_millions(f64::NAN, DETAIL_DECIMALS), "0.00");
    assert_eq!(format_millions(-0.0, SUMMARY_DECIMALS), "0.0");
    assert_eq!(format_millions(-1.0, SUMMARY_DECIMALS), "0.0");
    assert_eq!(format_millions(-4_000.0, DETAIL_DECIMALS), "0.00");
    assert_eq!(format_millions(-300_000.0, SUMMARY_DECIMALS), "-0.3");
}

// ── Decimal boundary ──────────────────────────────────────────

#[test]
fn test_decimal_boundary() {
    assert_eq!(to_f64(dec!(1250.50)), 1250.5);
    assert_eq!(from_f64(25.0), dec!(25));
    assert_eq!(from_f64(f64::NAN), Decimal::ZERO);
    assert_eq!(from_f64(f64::INFINITY), Decimal::ZERO);
}
