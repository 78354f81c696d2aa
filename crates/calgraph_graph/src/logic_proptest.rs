#[cfg(test)]
mod tests {
    use crate::logic::{conflicts, is_free, overlaps, Interval};
    use calgraph_config::BoundaryPolicy;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // Minutes from the base instant to an interval.
    fn interval(start_min: i64, len_min: i64) -> Interval {
        let start = base() + Duration::minutes(start_min);
        Interval::new(start, start + Duration::minutes(len_min))
    }

    fn policy() -> impl Strategy<Value = BoundaryPolicy> {
        prop_oneof![Just(BoundaryPolicy::Inclusive), Just(BoundaryPolicy::HalfOpen)]
    }

    proptest! {
        // Any candidate is free against an empty calendar
        #[test]
        fn test_empty_busy_set_always_free(
            start in 0..10_000i64,
            len in 1..600i64,
            policy in policy(),
        ) {
            prop_assert!(is_free(&interval(start, len), &[], policy).unwrap());
        }

        // Busy entries strictly before or after the candidate never conflict
        #[test]
        fn test_disjoint_busy_entries_never_conflict(
            start in 1_000..5_000i64,
            len in 1..600i64,
            gaps in prop::collection::vec((1..500i64, 0..120i64, any::<bool>()), 0..20),
            policy in policy(),
        ) {
            let candidate = interval(start, len);
            let busy: Vec<Interval> = gaps
                .iter()
                .map(|&(gap, busy_len, before)| {
                    if before {
                        interval(start - gap - busy_len, busy_len)
                    } else {
                        interval(start + len + gap, busy_len)
                    }
                })
                .collect();
            prop_assert!(is_free(&candidate, &busy, policy).unwrap());
        }

        // A busy entry that covers or sits inside the candidate always conflicts
        #[test]
        fn test_nested_entries_always_conflict(
            start in 0..5_000i64,
            len in 2..600i64,
            margin in 0..120i64,
            inner_offset in 0..600i64,
            policy in policy(),
        ) {
            let candidate = interval(start, len);

            let covering = interval(start - margin, len + 2 * margin);
            prop_assert!(!is_free(&candidate, &[covering], policy).unwrap());

            let inner_start = inner_offset % (len - 1);
            let inner = interval(start + inner_start, 1);
            prop_assert!(!is_free(&candidate, &[inner], policy).unwrap());
        }

        // Whatever conflicts under half-open rules also conflicts inclusively
        #[test]
        fn test_half_open_is_never_stricter(
            c_start in 0..2_000i64,
            c_len in 1..300i64,
            b_start in 0..2_000i64,
            b_len in 0..300i64,
        ) {
            let candidate = interval(c_start, c_len);
            let entry = interval(b_start, b_len);
            if overlaps(&candidate, &entry, BoundaryPolicy::HalfOpen) {
                prop_assert!(overlaps(&candidate, &entry, BoundaryPolicy::Inclusive));
            }
        }

        // The conflict list is a subsequence of the busy set
        #[test]
        fn test_conflicts_preserve_input_order(
            c_start in 0..2_000i64,
            c_len in 1..300i64,
            entries in prop::collection::vec((0..2_000i64, 0..300i64), 0..30),
        ) {
            let candidate = interval(c_start, c_len);
            let busy: Vec<Interval> = entries.iter().map(|&(s, l)| interval(s, l)).collect();
            let hits = conflicts(&candidate, &busy, BoundaryPolicy::Inclusive).unwrap();
            let mut remaining = busy.iter();
            for hit in &hits {
                prop_assert!(remaining.any(|entry| entry == hit));
            }
        }
    }
}
