use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::leave_type::LeaveType;
use crate::model::tenant_settings::TenantSettings;

/// Week-day count of the inclusive range. Zero when the range is inverted or
/// covers only Saturdays/Sundays.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> f64 {
    if start > end {
        return 0.0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as f64
}

/// Annual entitlement reduced for partial-year employment.
///
/// Hired before the allocation year: full amount. Hired after it: nothing.
/// Hired during it: `round(annual / 12 × months_remaining)` where
/// months_remaining counts the hire month itself.
pub fn prorated_annual(annual_days: f64, hire_date: NaiveDate, year: i32) -> f64 {
    if hire_date.year() < year {
        return annual_days;
    }
    if hire_date.year() > year {
        return 0.0;
    }
    let months_remaining = 12 - hire_date.month0() as i64;
    (annual_days / 12.0 * months_remaining as f64).round()
}

/// Carry-forward never exceeds the tenant cap, and a non-positive prior
/// balance carries nothing.
pub fn capped_carry_forward(prior_year_balance: f64, max_carry_forward_days: i64) -> f64 {
    prior_year_balance.max(0.0).min(max_carry_forward_days as f64)
}

/// Inclusive interval overlap: new start inside existing, new end inside
/// existing, or new range fully containing the existing one.
pub fn ranges_overlap(
    new_start: NaiveDate,
    new_end: NaiveDate,
    existing_start: NaiveDate,
    existing_end: NaiveDate,
) -> bool {
    let start_inside = new_start >= existing_start && new_start <= existing_end;
    let end_inside = new_end >= existing_start && new_end <= existing_end;
    let contains = new_start <= existing_start && new_end >= existing_end;
    start_inside || end_inside || contains
}

/// A request turned down before it reaches the database. `needs_reset` is set
/// only when the stored balance is already negative, steering the employee to
/// the reset operation instead of papering over bad data here.
#[derive(Debug, PartialEq)]
pub struct RejectedRequest {
    pub message: String,
    pub needs_reset: bool,
}

impl RejectedRequest {
    fn new(message: impl Into<String>) -> Self {
        RejectedRequest {
            message: message.into(),
            needs_reset: false,
        }
    }
}

/// Policy gate for a new leave request. Returns the day count to charge, or
/// the first failing check in the documented order: day count, date order,
/// advance notice, consecutive-day cap, balance sufficiency.
///
/// `available` is the stored row balance when one exists, else the org
/// default for the type.
pub fn evaluate_request(
    settings: &TenantSettings,
    today: NaiveDate,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_override: Option<f64>,
    available: f64,
) -> Result<f64, RejectedRequest> {
    let days = match days_override {
        Some(d) => {
            if d <= 0.0 {
                return Err(RejectedRequest::new("days must be a positive number"));
            }
            if (d * 2.0).fract() != 0.0 {
                return Err(RejectedRequest::new(
                    "days must be in half-day increments",
                ));
            }
            if d.fract() != 0.0 && !settings.allow_half_day_leave {
                return Err(RejectedRequest::new(
                    "Half-day leave is not enabled for your organization",
                ));
            }
            d
        }
        None => {
            let d = business_days(start_date, end_date);
            if d <= 0.0 {
                return Err(RejectedRequest::new(
                    "The selected range contains no working days (weekends only)",
                ));
            }
            d
        }
    };

    if start_date > end_date {
        return Err(RejectedRequest::new("start_date cannot be after end_date"));
    }

    let notice_days = (start_date - today).num_days();
    if notice_days < settings.minimum_leave_notice_days {
        return Err(RejectedRequest::new(format!(
            "Leave must be requested at least {} day(s) in advance",
            settings.minimum_leave_notice_days
        )));
    }

    if let Some(cap) = settings.maximum_consecutive_leave_days {
        if days > cap as f64 {
            return Err(RejectedRequest::new(format!(
                "Requested {} day(s) exceeds the maximum of {} consecutive leave days",
                days, cap
            )));
        }
    }

    if available < 0.0 {
        return Err(RejectedRequest {
            message: format!(
                "Your leave balance is negative ({}). Request a balance reset before applying for leave.",
                available
            ),
            needs_reset: true,
        });
    }

    if days > available {
        return Err(RejectedRequest::new(format!(
            "Insufficient leave balance: requested {} day(s), available {}",
            days, available
        )));
    }

    Ok(days)
}

/// Day count to write for one (employee, type) during the allocation batch:
/// policy base, prorated for annual when asked, plus capped carry-forward of
/// a positive prior-year annual balance. The caller overwrites the balance
/// row with this value; it never increments.
pub fn allocation_for(
    settings: &TenantSettings,
    leave_type: LeaveType,
    hire_date: NaiveDate,
    year: i32,
    prorated: bool,
    prior_year_balance: Option<f64>,
) -> f64 {
    let base = settings.policy_days(leave_type);

    let mut total = if prorated && leave_type == LeaveType::Annual {
        prorated_annual(base, hire_date, year)
    } else {
        base
    };

    if leave_type == LeaveType::Annual && settings.carry_forward_leave {
        if let Some(prior) = prior_year_balance {
            if prior > 0.0 {
                total += capped_carry_forward(prior, settings.max_carry_forward_days);
            }
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> TenantSettings {
        TenantSettings::org_defaults(1)
    }

    #[test]
    fn business_days_skip_weekends() {
        // Mon 2024-06-03 .. Fri 2024-06-07
        assert_eq!(business_days(date(2024, 6, 3), date(2024, 6, 7)), 5.0);
        // Fri .. Mon spans a weekend
        assert_eq!(business_days(date(2024, 6, 7), date(2024, 6, 10)), 2.0);
        // Sat .. Sun only
        assert_eq!(business_days(date(2024, 6, 1), date(2024, 6, 2)), 0.0);
        // inverted range
        assert_eq!(business_days(date(2024, 6, 7), date(2024, 6, 3)), 0.0);
    }

    #[test]
    fn proration_examples_from_policy() {
        // Hired Oct 1 of the allocation year: 12 - 9 = 3 months remaining.
        assert_eq!(prorated_annual(20.0, date(2026, 10, 1), 2026), 5.0);
        // Hired Jul 1: 6 months remaining.
        assert_eq!(prorated_annual(20.0, date(2026, 7, 1), 2026), 10.0);
        // Hired before the year: full entitlement.
        assert_eq!(prorated_annual(20.0, date(2024, 3, 15), 2026), 20.0);
        // Hired after the year: nothing.
        assert_eq!(prorated_annual(20.0, date(2027, 1, 4), 2026), 0.0);
    }

    #[test]
    fn carry_forward_is_capped() {
        assert_eq!(capped_carry_forward(3.0, 10), 3.0);
        assert_eq!(capped_carry_forward(25.0, 10), 10.0);
        assert_eq!(capped_carry_forward(-4.0, 10), 0.0);
    }

    #[test]
    fn overlap_covers_all_three_cases() {
        let (es, ee) = (date(2026, 3, 10), date(2026, 3, 14));
        // new start inside existing
        assert!(ranges_overlap(date(2026, 3, 12), date(2026, 3, 20), es, ee));
        // new end inside existing
        assert!(ranges_overlap(date(2026, 3, 5), date(2026, 3, 10), es, ee));
        // new fully contains existing
        assert!(ranges_overlap(date(2026, 3, 1), date(2026, 3, 31), es, ee));
        // disjoint before / after
        assert!(!ranges_overlap(date(2026, 3, 1), date(2026, 3, 9), es, ee));
        assert!(!ranges_overlap(date(2026, 3, 15), date(2026, 3, 20), es, ee));
    }

    #[test]
    fn weekend_only_request_is_rejected() {
        let err = evaluate_request(
            &settings(),
            date(2024, 5, 27),
            date(2024, 6, 1),
            date(2024, 6, 2),
            None,
            20.0,
        )
        .unwrap_err();
        assert!(err.message.contains("weekends only"));
        assert!(!err.needs_reset);
    }

    #[test]
    fn negative_balance_asks_for_reset() {
        let err = evaluate_request(
            &settings(),
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 10),
            None,
            -3.0,
        )
        .unwrap_err();
        assert!(err.needs_reset);
        assert!(err.message.contains("reset"));
    }

    #[test]
    fn insufficient_balance_is_rejected_without_reset_flag() {
        let err = evaluate_request(
            &settings(),
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 13),
            None,
            2.0,
        )
        .unwrap_err();
        assert!(err.message.contains("Insufficient"));
        assert!(!err.needs_reset);
    }

    #[test]
    fn advance_notice_is_enforced() {
        let mut s = settings();
        s.minimum_leave_notice_days = 3;
        let err = evaluate_request(
            &s,
            date(2026, 3, 9),
            date(2026, 3, 10),
            date(2026, 3, 11),
            None,
            20.0,
        )
        .unwrap_err();
        assert!(err.message.contains("in advance"));
    }

    #[test]
    fn consecutive_day_cap_is_enforced() {
        let mut s = settings();
        s.maximum_consecutive_leave_days = Some(3);
        let err = evaluate_request(
            &s,
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 13),
            None,
            20.0,
        )
        .unwrap_err();
        assert!(err.message.contains("consecutive"));
    }

    #[test]
    fn half_day_override_needs_the_tenant_flag() {
        let err = evaluate_request(
            &settings(),
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 9),
            Some(0.5),
            20.0,
        )
        .unwrap_err();
        assert!(err.message.contains("Half-day"));

        let mut s = settings();
        s.allow_half_day_leave = true;
        let days = evaluate_request(
            &s,
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 9),
            Some(0.5),
            20.0,
        )
        .unwrap();
        assert_eq!(days, 0.5);
    }

    #[test]
    fn happy_path_charges_business_days() {
        // Mon .. Fri with default settings and a healthy balance.
        let days = evaluate_request(
            &settings(),
            date(2026, 3, 2),
            date(2026, 3, 9),
            date(2026, 3, 13),
            None,
            20.0,
        )
        .unwrap();
        assert_eq!(days, 5.0);
    }

    #[test]
    fn allocation_prorates_and_carries_forward() {
        let mut s = settings();
        s.carry_forward_leave = true;
        s.max_carry_forward_days = 5;

        // Tenured employee, prior-year leftover of 8 capped at 5.
        let total = allocation_for(
            &s,
            LeaveType::Annual,
            date(2020, 2, 1),
            2026,
            true,
            Some(8.0),
        );
        assert_eq!(total, 25.0);

        // Oct 1 starter of the allocation year: round(20/12*3) = 5, no prior.
        let total = allocation_for(
            &s,
            LeaveType::Annual,
            date(2026, 10, 1),
            2026,
            true,
            None,
        );
        assert_eq!(total, 5.0);

        // Non-annual types are never prorated or carried forward.
        let total = allocation_for(
            &s,
            LeaveType::Sick,
            date(2026, 10, 1),
            2026,
            true,
            Some(9.0),
        );
        assert_eq!(total, 10.0);
    }

    #[test]
    fn allocation_without_proration_uses_full_policy() {
        let total = allocation_for(
            &settings(),
            LeaveType::Annual,
            date(2026, 10, 1),
            2026,
            false,
            None,
        );
        assert_eq!(total, 20.0);
    }
}
