use booking_engine::availability::{compute_availability, days_in_month};
use booking_engine::event::{end_of_day, EventRecord};
use booking_engine::memory::InMemoryEventStore;
use booking_engine::normalize::{normalize, AUTO_ADVANCE_MINUTES};
use booking_engine::repository::EventRepository;
use booking_engine::schedule::{ScheduleProfile, CANONICAL_WEEK};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use proptest::prelude::*;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (date_strategy(), 0u32..24, 0u32..60)
        .prop_map(|(date, h, m)| date.and_hms_opt(h, m, 0).unwrap())
}

fn days_strategy() -> impl Strategy<Value = Vec<Weekday>> {
    proptest::sample::subsequence(CANONICAL_WEEK.to_vec(), 0..=7).prop_shuffle()
}

proptest! {
    #[test]
    fn empty_working_days_marks_whole_month(reference in date_strategy()) {
        let profile = ScheduleProfile::new([], "09:00", "18:00");
        let availability = compute_availability(&profile, reference);
        prop_assert_eq!(availability.non_working_days.len(), days_in_month(reference).len());
    }

    #[test]
    fn markers_are_exactly_the_off_days(reference in date_strategy(), days in days_strategy()) {
        let profile = ScheduleProfile::new(days.clone(), "09:00", "18:00");
        let availability = compute_availability(&profile, reference);
        for date in days_in_month(reference) {
            prop_assert_eq!(availability.is_non_working(date), !days.contains(&date.weekday()));
        }
    }

    #[test]
    fn sorted_working_days_follow_canonical_order(days in days_strategy()) {
        let profile = ScheduleProfile::new(days, "09:00", "18:00");
        let sorted = profile.sorted_working_days();
        prop_assert!(sorted
            .windows(2)
            .all(|w| w[0].num_days_from_monday() < w[1].num_days_from_monday()));
    }

    #[test]
    fn all_day_forces_full_day_bounds(
        start in datetime_strategy(),
        extra_days in 0i64..5,
        end_hour in 0u32..24,
    ) {
        let end_date = start.date() + Duration::days(extra_days);
        let end = end_date.and_hms_opt(end_hour, 0, 0).unwrap();
        let record = EventRecord { all_day: true, ..EventRecord::new("Off", start, end) };

        let normalized = normalize(record);
        prop_assert_eq!(normalized.start.time(), NaiveTime::MIN);
        prop_assert_eq!(normalized.start.date(), start.date());
        prop_assert_eq!(normalized.end, end_of_day(end_date));
    }

    #[test]
    fn collided_end_advances_one_hour(start in datetime_strategy(), back_minutes in 0i64..600) {
        let end = start - Duration::minutes(back_minutes);
        let normalized = normalize(EventRecord::new("Cut", start, end));
        prop_assert_eq!(normalized.start, start);
        prop_assert_eq!(normalized.end, start + Duration::minutes(AUTO_ADVANCE_MINUTES));
    }

    #[test]
    fn normalize_is_idempotent(
        start in datetime_strategy(),
        end in datetime_strategy(),
        all_day in any::<bool>(),
    ) {
        let once = normalize(EventRecord { all_day, ..EventRecord::new("E", start, end) });
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn created_event_comes_back_from_query(
        start in datetime_strategy(),
        length in 1i64..480,
        all_day in any::<bool>(),
    ) {
        let record = normalize(EventRecord {
            all_day,
            ..EventRecord::new("Booking", start, start + Duration::minutes(length))
        });
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let fetched = rt.block_on(async {
            let store = InMemoryEventStore::new();
            let id = store.create(&record, "owner-1").await.unwrap();
            let all = store.query_by_owner("owner-1").await.unwrap();
            all.into_iter().find(|r| r.id == id)
        });

        let fetched = fetched.expect("created record missing from query");
        prop_assert_eq!(&fetched.title, &record.title);
        prop_assert_eq!(fetched.start, record.start);
        prop_assert_eq!(fetched.end, record.end);
        prop_assert_eq!(fetched.all_day, record.all_day);
    }
}
