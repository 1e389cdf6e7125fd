//! AHI severity qualifier for CPAP/BiPAP orders.
//!
//! Adults (18+) and children use different bands. Lower bounds are inclusive:
//! an adult AHI of exactly 15 is "moderate". A missing date of birth is
//! treated as an adult.

use chrono::{Datelike, Local, NaiveDate};

const ADULT_AGE: i32 = 18;

/// (inclusive lower bound, label) from most to least severe.
const ADULT_BANDS: &[(u32, &str)] = &[
    (30, "AHI > 30 (severe, adult)"),
    (15, "AHI > 15 (moderate, adult)"),
    (5, "AHI > 5 (mild, adult)"),
];
const ADULT_NORMAL: &str = "AHI < 5 (normal, adult)";

const PEDIATRIC_BANDS: &[(u32, &str)] = &[
    (10, "AHI > 10 (severe, pediatric)"),
    (5, "AHI > 5 (moderate, pediatric)"),
    (1, "AHI > 1 (mild, pediatric)"),
];
const PEDIATRIC_NORMAL: &str = "AHI < 1 (normal, pediatric)";

/// Qualifier string as of today's local date.
pub fn ahi_qualifier(ahi: Option<u32>, dob: Option<NaiveDate>) -> Option<String> {
    ahi_qualifier_as_of(ahi, dob, Local::now().date_naive())
}

/// Qualifier string with an explicit "today". `None` when AHI is absent.
pub fn ahi_qualifier_as_of(
    ahi: Option<u32>,
    dob: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<String> {
    let ahi = ahi?;
    let adult = dob.map_or(true, |dob| age_in_years(dob, today) >= ADULT_AGE);

    let (bands, normal) = if adult {
        (ADULT_BANDS, ADULT_NORMAL)
    } else {
        (PEDIATRIC_BANDS, PEDIATRIC_NORMAL)
    };

    let label = bands
        .iter()
        .find(|(floor, _)| ahi >= *floor)
        .map_or(normal, |(_, label)| *label);

    Some(label.to_string())
}

/// Whole years between `dob` and `today`; a birthday not yet reached this
/// year does not count.
pub fn age_in_years(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TODAY: (i32, u32, u32) = (2024, 6, 15);

    fn today() -> NaiveDate {
        ymd(TODAY.0, TODAY.1, TODAY.2)
    }

    fn adult(ahi: u32) -> String {
        ahi_qualifier_as_of(Some(ahi), Some(ymd(1970, 1, 1)), today()).unwrap()
    }

    fn child(ahi: u32) -> String {
        ahi_qualifier_as_of(Some(ahi), Some(ymd(2015, 1, 1)), today()).unwrap()
    }

    #[test]
    fn absent_ahi_has_no_qualifier() {
        assert_eq!(ahi_qualifier_as_of(None, None, today()), None);
        assert_eq!(ahi_qualifier(None, Some(ymd(1970, 1, 1))), None);
    }

    #[test]
    fn adult_bands_inclusive() {
        assert_eq!(adult(30), "AHI > 30 (severe, adult)");
        assert_eq!(adult(29), "AHI > 15 (moderate, adult)");
        assert_eq!(adult(15), "AHI > 15 (moderate, adult)");
        assert_eq!(adult(14), "AHI > 5 (mild, adult)");
        assert_eq!(adult(5), "AHI > 5 (mild, adult)");
        assert_eq!(adult(4), "AHI < 5 (normal, adult)");
        assert_eq!(adult(0), "AHI < 5 (normal, adult)");
    }

    #[test]
    fn pediatric_bands_inclusive() {
        assert_eq!(child(10), "AHI > 10 (severe, pediatric)");
        assert_eq!(child(9), "AHI > 5 (moderate, pediatric)");
        assert_eq!(child(5), "AHI > 5 (moderate, pediatric)");
        assert_eq!(child(4), "AHI > 1 (mild, pediatric)");
        assert_eq!(child(1), "AHI > 1 (mild, pediatric)");
        assert_eq!(child(0), "AHI < 1 (normal, pediatric)");
    }

    #[test]
    fn missing_dob_is_adult() {
        assert_eq!(
            ahi_qualifier_as_of(Some(28), None, today()).as_deref(),
            Some("AHI > 15 (moderate, adult)")
        );
        assert_eq!(
            ahi_qualifier_as_of(Some(3), None, today()).as_deref(),
            Some("AHI < 5 (normal, adult)")
        );
    }

    #[test]
    fn eighteenth_birthday_switches_to_adult() {
        let dob = ymd(2006, 6, 15);
        assert_eq!(age_in_years(dob, today()), 18);
        assert_eq!(
            ahi_qualifier_as_of(Some(12), Some(dob), today()).as_deref(),
            Some("AHI > 5 (mild, adult)")
        );

        let turns_18_tomorrow = ymd(2006, 6, 16);
        assert_eq!(age_in_years(turns_18_tomorrow, today()), 17);
        assert_eq!(
            ahi_qualifier_as_of(Some(12), Some(turns_18_tomorrow), today()).as_deref(),
            Some("AHI > 10 (severe, pediatric)")
        );
    }

    #[test]
    fn severity_is_monotonic() {
        let mut last_rank = 0;
        for ahi in 0..=40 {
            let label = adult(ahi);
            let rank = ["normal", "mild", "moderate", "severe"]
                .iter()
                .position(|s| label.contains(s))
                .unwrap();
            assert!(rank >= last_rank, "AHI {ahi} dropped severity");
            last_rank = rank;
        }
    }
}
