use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booking_engine::{
    BookingError, EngineConfig, EventDraft, EventRecord, EventRepository, InMemoryEventStore,
    ReconciliationController, Result, ScheduleProfile, SessionState,
};
use chrono::{NaiveDate, NaiveDateTime, Weekday::*};

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn april() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

fn weekday_profile() -> ScheduleProfile {
    ScheduleProfile::new([Mon, Tue, Wed, Thu, Fri], "09:00", "18:00")
}

fn session<R: EventRepository>(repo: R, config: EngineConfig) -> ReconciliationController<R> {
    ReconciliationController::new(
        repo,
        weekday_profile(),
        Some("master-1".to_string()),
        april(),
        config,
    )
}

fn draft(title: &str, start: &str, end: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        ..EventDraft::for_slot(dt(start), dt(end))
    }
}

/// Counts calls and fails the ones it is told to.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryEventStore,
    fail_writes: bool,
    fail_queries: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl EventRepository for FlakyStore {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<EventRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(BookingError::Repository("query unavailable".to_string()));
        }
        self.inner.query_by_owner(owner_id).await
    }

    async fn create(&self, record: &EventRecord, owner_id: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(BookingError::Repository("write rejected".to_string()));
        }
        self.inner.create(record, owner_id).await
    }

    async fn update(&self, id: &str, record: &EventRecord, owner_id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(BookingError::Repository("write rejected".to_string()));
        }
        self.inner.update(id, record, owner_id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }
}

/// Never answers.
struct HungStore;

#[async_trait]
impl EventRepository for HungStore {
    async fn query_by_owner(&self, _owner_id: &str) -> Result<Vec<EventRecord>> {
        std::future::pending().await
    }

    async fn create(&self, _record: &EventRecord, _owner_id: &str) -> Result<String> {
        std::future::pending().await
    }

    async fn update(&self, _id: &str, _record: &EventRecord, _owner_id: &str) -> Result<()> {
        std::future::pending().await
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_create_then_query_round_trip() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    ctl.begin_new(draft("Manicure", "2024-04-16 14:00", "2024-04-16 15:30"))
        .unwrap();
    let id = ctl.save().await.unwrap();

    let stored = store.query_by_owner("master-1").await.unwrap();
    let found = stored.iter().find(|r| r.id == id).unwrap();
    assert_eq!(found.title, "Manicure");
    assert_eq!(found.start, dt("2024-04-16 14:00"));
    assert_eq!(found.end, dt("2024-04-16 15:30"));
    assert!(!found.all_day);
}

#[tokio::test]
async fn test_empty_title_makes_no_repository_call() {
    let store = Arc::new(FlakyStore::default());
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    ctl.begin_new(draft("", "2024-04-16 14:00", "2024-04-16 15:00"))
        .unwrap();
    let result = ctl.save().await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert_eq!(ctl.state(), SessionState::Editing);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_then_query_excludes_id() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    ctl.begin_new(draft("Keep", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let keep = ctl.save().await.unwrap();
    ctl.begin_new(draft("Drop", "2024-04-16 12:00", "2024-04-16 13:00"))
        .unwrap();
    let drop = ctl.save().await.unwrap();

    ctl.delete(&drop).await.unwrap();

    let ids: Vec<String> = store
        .query_by_owner("master-1")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![keep]);
    assert!(ctl.events().iter().all(|e| e.id != drop));
}

#[tokio::test]
async fn test_all_day_toggle_is_saved_as_full_day() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    ctl.begin_new(draft("Day off", "2024-04-17 10:00", "2024-04-17 12:00"))
        .unwrap();
    ctl.draft_mut().unwrap().set_all_day(true);
    ctl.save().await.unwrap();

    let event = &ctl.events()[0];
    assert!(event.all_day);
    assert_eq!(event.start.to_string(), "2024-04-17 00:00:00");
    assert_eq!(event.end.to_string(), "2024-04-17 23:59:59.999");
}

#[tokio::test]
async fn test_repository_failure_returns_to_editing() {
    let store = FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    };
    let mut ctl = session(store, EngineConfig::default());

    ctl.begin_new(draft("Haircut", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let err = ctl.save().await.unwrap_err();

    assert!(matches!(err, BookingError::Repository(_)));
    assert_eq!(ctl.state(), SessionState::Editing);
    assert_eq!(ctl.draft().unwrap().title, "Haircut");
    assert!(ctl.events().is_empty());
}

#[tokio::test]
async fn test_refresh_failure_after_write_leaves_list_stale() {
    let store = Arc::new(FlakyStore {
        fail_queries: true,
        ..FlakyStore::default()
    });
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    ctl.begin_new(draft("Haircut", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let err = ctl.save().await.unwrap_err();

    assert!(matches!(err, BookingError::Repository(_)));
    assert_eq!(ctl.state(), SessionState::Idle);
    assert!(ctl.events().is_empty());
    assert_eq!(store.inner.len().await, 1);
    // one create + one failed query
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hung_repository_times_out() {
    let config = EngineConfig {
        repository_timeout_ms: Some(50),
        ..EngineConfig::default()
    };
    let mut ctl = session(HungStore, config);

    ctl.begin_new(draft("Haircut", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let err = ctl.save().await.unwrap_err();

    assert_eq!(err, BookingError::Timeout(50));
    assert_eq!(ctl.state(), SessionState::Editing);
}

#[tokio::test]
async fn test_abandoned_save_reopens_form() {
    let mut ctl = session(HungStore, EngineConfig::default());

    ctl.begin_new(draft("Haircut", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(20), ctl.save()).await;
    assert!(outcome.is_err(), "save against a hung store should not finish");

    assert_eq!(ctl.state(), SessionState::Editing);
    assert_eq!(ctl.draft().map(|d| d.title.as_str()), Some("Haircut"));

    ctl.cancel();
    assert_eq!(ctl.state(), SessionState::Idle);
    ctl.begin_new(draft("Beard trim", "2024-04-16 12:00", "2024-04-16 12:30"))
        .unwrap();
    assert_eq!(ctl.state(), SessionState::Editing);
}

#[tokio::test]
async fn test_sessions_see_each_other_only_after_refresh() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut alice = session(Arc::clone(&store), EngineConfig::default());
    let mut bob = session(Arc::clone(&store), EngineConfig::default());
    alice.refresh().await.unwrap();
    bob.refresh().await.unwrap();

    alice
        .begin_new(draft("Alice booking", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    alice.save().await.unwrap();

    assert_eq!(alice.events().len(), 1);
    assert!(bob.events().is_empty());

    bob.refresh().await.unwrap();
    assert_eq!(bob.events().len(), 1);
}

#[tokio::test]
async fn test_last_writer_wins_between_sessions() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut alice = session(Arc::clone(&store), EngineConfig::default());
    let mut bob = session(Arc::clone(&store), EngineConfig::default());

    alice
        .begin_new(draft("Original", "2024-04-16 10:00", "2024-04-16 11:00"))
        .unwrap();
    let id = alice.save().await.unwrap();
    bob.refresh().await.unwrap();

    alice.begin_edit(&id).unwrap();
    alice.draft_mut().unwrap().set_title("Alice's edit");
    bob.begin_edit(&id).unwrap();
    bob.draft_mut().unwrap().set_title("Bob's edit");

    alice.save().await.unwrap();
    bob.save().await.unwrap();

    alice.refresh().await.unwrap();
    assert_eq!(alice.events()[0].title, "Bob's edit");
}

#[tokio::test]
async fn test_double_booking_is_not_prevented() {
    let store = Arc::new(InMemoryEventStore::new());
    let mut ctl = session(Arc::clone(&store), EngineConfig::default());

    for title in ["First", "Second"] {
        ctl.begin_new(draft(title, "2024-04-16 10:00", "2024-04-16 11:00"))
            .unwrap();
        ctl.save().await.unwrap();
    }
    assert_eq!(ctl.events().len(), 2);
}
