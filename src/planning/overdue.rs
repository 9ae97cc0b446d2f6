//! Overdue-site detection
//!
//! A site is overdue when the current half-year holds no completed PM for it.
//! Halves are cut by ISO week number: weeks 1-26 and weeks 27 onward. Week 53,
//! when it occurs, extends week 52's period and therefore belongs to the
//! second half. Only PMs whose week falls in the reference date's own ISO year
//! count; the half-year window is never stitched across a year boundary.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::domain::sites::Site;
use crate::domain::weekly_pm::{PmStatus, WeeklyPm};

/// Week numbers making up the half-year that contains `week`.
fn half_year_weeks(week: u32) -> RangeInclusive<u32> {
    if week <= 26 {
        1..=26
    } else {
        27..=53
    }
}

/// Sites with no completed PM in the half-year containing `reference`.
///
/// Pure and deterministic; the result preserves the order of `sites`. With no
/// PMs at all every site is overdue, and with no sites the result is empty.
pub fn compute_overdue_sites(
    sites: &[Site],
    weekly_pms: &[WeeklyPm],
    reference: NaiveDate,
) -> Vec<Site> {
    let iso = reference.iso_week();
    let window = half_year_weeks(iso.week());

    let covered: HashSet<Uuid> = weekly_pms
        .iter()
        .filter(|pm| pm.status == PmStatus::Completed)
        .filter(|pm| pm.week.year == iso.year() && window.contains(&pm.week.week))
        .map(|pm| pm.site_id)
        .collect();

    sites
        .iter()
        .filter(|site| !covered.contains(&site.id))
        .cloned()
        .collect()
}
