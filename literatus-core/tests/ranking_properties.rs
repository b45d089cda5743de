//! Engine-level tests for the ranking interview
//!
//! Drives full interviews against an in-memory store with a scripted judge
//! and checks:
//! - placement correctness (always-wins, always-loses, every middle slot)
//! - agreement with a linear reference insertion index
//! - the ceil(log2(N+1)) round bound
//! - position density under mixed insert/rerank/delete sequences

use literatus_core::db::init::initialize_database;
use literatus_core::ranking::{
    begin_classification, resolver, submit_judgment, ClassificationStep, JudgmentStep, Resolution,
};
use literatus_core::{Book, ShelfStore, Tier};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

async fn setup_store() -> (ShelfStore, Uuid) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    initialize_database(&pool).await.unwrap();

    let owner = Uuid::new_v4();
    sqlx::query("INSERT INTO users (guid, username, password_hash) VALUES (?, 'reader', 'x')")
        .bind(owner.to_string())
        .execute(&pool)
        .await
        .unwrap();

    (ShelfStore::new(pool), owner)
}

/// Build a ranked tier of `n` books titled "book-1".."book-n"
async fn seed_tier(store: &ShelfStore, owner: Uuid, tier: Tier, n: i64) -> Vec<Book> {
    let mut books = Vec::new();
    for i in 1..=n {
        let b = store
            .add_book(owner, &format!("book-{}", i), "author", tier)
            .await
            .unwrap();
        store.commit_insert(&b, i).await.unwrap();
        books.push(store.book(b.id).await.unwrap());
    }
    books
}

/// Run an interview to completion. `judge` sees the competitor's current
/// position and returns true when the subject is preferred. Returns the
/// resolution and the number of rounds consumed.
async fn run_interview<F>(
    store: &ShelfStore,
    owner: Uuid,
    subject_id: Uuid,
    judge: F,
) -> (Resolution, u32)
where
    F: Fn(i64) -> bool,
{
    let step = begin_classification(store, owner, subject_id).await.unwrap();

    let (mut session, mut comparison) = match step {
        ClassificationStep::Resolved(res) => return (res, 0),
        ClassificationStep::Pending {
            session,
            comparison,
        } => (session, comparison),
    };

    loop {
        let competitor = store.book(comparison.competitor_id).await.unwrap();
        let prefer_subject = judge(competitor.position);
        match submit_judgment(store, &mut session, comparison.competitor_id, prefer_subject)
            .await
            .unwrap()
        {
            JudgmentStep::Pending(next) => comparison = next,
            JudgmentStep::Resolved(res) => return (res, session.rounds()),
        }
    }
}

async fn assert_dense(store: &ShelfStore, owner: Uuid, tier: Tier, expected_len: usize) {
    let books = store.books_in_tier(owner, tier).await.unwrap();
    assert_eq!(books.len(), expected_len);
    for (i, b) in books.iter().enumerate() {
        assert_eq!(b.position, i as i64 + 1, "gap or duplicate at {}", b.title);
    }
}

fn max_rounds_bound(n: i64) -> u32 {
    // ceil(log2(n + 1)) without floats
    let mut rounds = 0u32;
    let mut remaining = n;
    while remaining > 0 {
        remaining /= 2;
        rounds += 1;
    }
    rounds
}

#[tokio::test]
async fn test_empty_tier_resolves_immediately() {
    let (store, owner) = setup_store().await;
    let subject = store
        .add_book(owner, "first", "author", Tier::Beloved)
        .await
        .unwrap();

    let (res, rounds) = run_interview(&store, owner, subject.id, |_| true).await;
    assert_eq!(res, Resolution::Insert { position: 1 });
    assert_eq!(rounds, 0);

    resolver::apply(&store, owner, subject.id, res).await.unwrap();
    assert_dense(&store, owner, Tier::Beloved, 1).await;
}

#[tokio::test]
async fn test_always_wins_lands_first() {
    let (store, owner) = setup_store().await;
    seed_tier(&store, owner, Tier::Tolerated, 6).await;

    let subject = store
        .add_book(owner, "champion", "author", Tier::Tolerated)
        .await
        .unwrap();
    let (res, _) = run_interview(&store, owner, subject.id, |_| true).await;
    assert_eq!(res, Resolution::Insert { position: 1 });

    resolver::apply(&store, owner, subject.id, res).await.unwrap();
    let books = store.books_in_tier(owner, Tier::Tolerated).await.unwrap();
    assert_eq!(books[0].title, "champion");
    assert_dense(&store, owner, Tier::Tolerated, 7).await;
}

#[tokio::test]
async fn test_always_loses_lands_last() {
    let (store, owner) = setup_store().await;
    seed_tier(&store, owner, Tier::Tolerated, 6).await;

    let subject = store
        .add_book(owner, "straggler", "author", Tier::Tolerated)
        .await
        .unwrap();
    let (res, _) = run_interview(&store, owner, subject.id, |_| false).await;
    assert_eq!(res, Resolution::Insert { position: 7 });

    resolver::apply(&store, owner, subject.id, res).await.unwrap();
    let books = store.books_in_tier(owner, Tier::Tolerated).await.unwrap();
    assert_eq!(books[6].title, "straggler");
    assert_dense(&store, owner, Tier::Tolerated, 7).await;
}

#[tokio::test]
async fn test_single_competitor_takes_one_round() {
    let (store, owner) = setup_store().await;
    seed_tier(&store, owner, Tier::Disliked, 1).await;

    let subject = store
        .add_book(owner, "second", "author", Tier::Disliked)
        .await
        .unwrap();
    let (res, rounds) = run_interview(&store, owner, subject.id, |_| false).await;
    assert_eq!(rounds, 1);
    assert_eq!(res, Resolution::Insert { position: 2 });
}

#[tokio::test]
async fn test_insertion_matches_linear_reference() {
    // A judge consistent with "the subject belongs at slot r" must produce
    // insertion point r, for every tier size and every slot. This is the
    // cross-check that the last-probe shortcut equals a reference full-order
    // insertion index.
    for n in 1i64..=17 {
        let (store, owner) = setup_store().await;
        seed_tier(&store, owner, Tier::Beloved, n).await;

        for target in 1..=(n + 1) {
            let subject = store
                .add_book(owner, "probe", "author", Tier::Beloved)
                .await
                .unwrap();

            // Subject beats everything ranked at or below the target slot.
            let (res, rounds) =
                run_interview(&store, owner, subject.id, |competitor_pos| {
                    competitor_pos >= target
                })
                .await;

            assert_eq!(
                res,
                Resolution::Insert { position: target },
                "n={} target={}",
                n,
                target
            );
            assert!(
                rounds <= max_rounds_bound(n),
                "n={} target={}: {} rounds exceeds bound {}",
                n,
                target,
                rounds,
                max_rounds_bound(n)
            );

            // Leave the tier as seeded for the next target.
            resolver::discard_staged(&store, owner, subject.id).await.unwrap();
        }
    }
}

#[tokio::test]
async fn test_worked_tolerated_example() {
    // Four ranked books; a new one beats positions 2 and 3 but loses to
    // position 1, so it must land at position 2 and push the rest down.
    let (store, owner) = setup_store().await;
    let seeded = seed_tier(&store, owner, Tier::Tolerated, 4).await;

    let subject = store
        .add_book(owner, "newcomer", "author", Tier::Tolerated)
        .await
        .unwrap();
    let (res, _) = run_interview(&store, owner, subject.id, |pos| pos >= 2).await;
    assert_eq!(res, Resolution::Insert { position: 2 });

    resolver::apply(&store, owner, subject.id, res).await.unwrap();
    let books = store.books_in_tier(owner, Tier::Tolerated).await.unwrap();
    assert_eq!(books[1].title, "newcomer");
    for (i, old) in seeded.iter().enumerate() {
        let now = store.book(old.id).await.unwrap();
        let expected = if i == 0 { 1 } else { old.position + 1 };
        assert_eq!(now.position, expected, "{}", old.title);
    }
}

#[tokio::test]
async fn test_rerank_to_front() {
    // book-3 of five moves to position 1: books 1-2 shift to 2-3,
    // books 4-5 stay put.
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Beloved, 5).await;

    let (res, _) = run_interview(&store, owner, books[2].id, |_| true).await;
    assert_eq!(res, Resolution::Move { position: 1 });

    resolver::apply(&store, owner, books[2].id, res).await.unwrap();
    let titles: Vec<String> = store
        .books_in_tier(owner, Tier::Beloved)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["book-3", "book-1", "book-2", "book-4", "book-5"]);
}

#[tokio::test]
async fn test_rerank_to_back() {
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Beloved, 4).await;

    let (res, _) = run_interview(&store, owner, books[0].id, |_| false).await;
    assert_eq!(res, Resolution::Move { position: 4 });

    resolver::apply(&store, owner, books[0].id, res).await.unwrap();
    let titles: Vec<String> = store
        .books_in_tier(owner, Tier::Beloved)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["book-2", "book-3", "book-4", "book-1"]);
}

#[tokio::test]
async fn test_rerank_landing_on_own_slot_is_noop() {
    // book-3 of five, judged to sit exactly where it already is (beats
    // everything below position 3, loses to everything above).
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Beloved, 5).await;
    let before = store.books_in_tier(owner, Tier::Beloved).await.unwrap();

    let (res, _) = run_interview(&store, owner, books[2].id, |pos| pos > 3).await;
    assert_eq!(res, Resolution::AlreadyPlaced);

    resolver::apply(&store, owner, books[2].id, res).await.unwrap();
    let after = store.books_in_tier(owner, Tier::Beloved).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_rerank_sole_book_resolves_immediately() {
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Disliked, 1).await;

    let (res, rounds) = run_interview(&store, owner, books[0].id, |_| true).await;
    assert_eq!(res, Resolution::AlreadyPlaced);
    assert_eq!(rounds, 0);
}

#[tokio::test]
async fn test_density_survives_mixed_operations() {
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Tolerated, 8).await;

    // Interleave deletes, inserts, and reranks, auditing density throughout.
    resolver::delete(&store, owner, books[4].id).await.unwrap();
    assert_dense(&store, owner, Tier::Tolerated, 7).await;

    let newcomer = store
        .add_book(owner, "newcomer", "author", Tier::Tolerated)
        .await
        .unwrap();
    let (res, _) = run_interview(&store, owner, newcomer.id, |pos| pos >= 4).await;
    resolver::apply(&store, owner, newcomer.id, res).await.unwrap();
    assert_dense(&store, owner, Tier::Tolerated, 8).await;

    let (res, _) = run_interview(&store, owner, books[7].id, |_| true).await;
    resolver::apply(&store, owner, books[7].id, res).await.unwrap();
    assert_dense(&store, owner, Tier::Tolerated, 8).await;

    resolver::delete(&store, owner, books[0].id).await.unwrap();
    assert_dense(&store, owner, Tier::Tolerated, 7).await;
}

#[tokio::test]
async fn test_wrong_competitor_rejected_session_survives() {
    let (store, owner) = setup_store().await;
    seed_tier(&store, owner, Tier::Beloved, 3).await;

    let subject = store
        .add_book(owner, "probe", "author", Tier::Beloved)
        .await
        .unwrap();
    let step = begin_classification(&store, owner, subject.id).await.unwrap();
    let (mut session, comparison) = match step {
        ClassificationStep::Pending {
            session,
            comparison,
        } => (session, comparison),
        ClassificationStep::Resolved(_) => panic!("expected a pending comparison"),
    };

    let err = submit_judgment(&store, &mut session, Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, literatus_core::Error::InvalidState(_)));

    // The pending question is unchanged and can still be answered.
    let step = submit_judgment(&store, &mut session, comparison.competitor_id, true)
        .await
        .unwrap();
    assert!(matches!(step, JudgmentStep::Pending(_) | JudgmentStep::Resolved(_)));
}

#[tokio::test]
async fn test_deleted_competitor_detected_mid_interview() {
    let (store, owner) = setup_store().await;
    seed_tier(&store, owner, Tier::Beloved, 5).await;

    let subject = store
        .add_book(owner, "probe", "author", Tier::Beloved)
        .await
        .unwrap();
    let step = begin_classification(&store, owner, subject.id).await.unwrap();
    let (mut session, comparison) = match step {
        ClassificationStep::Pending {
            session,
            comparison,
        } => (session, comparison),
        ClassificationStep::Resolved(_) => panic!("expected a pending comparison"),
    };

    resolver::delete(&store, owner, comparison.competitor_id).await.unwrap();

    let err = submit_judgment(&store, &mut session, comparison.competitor_id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, literatus_core::Error::NotFound(_)));
    // The store stayed dense despite the aborted interview.
    assert_dense(&store, owner, Tier::Beloved, 4).await;
}

#[tokio::test]
async fn test_foreign_owner_rejected() {
    let (store, owner) = setup_store().await;
    let books = seed_tier(&store, owner, Tier::Beloved, 2).await;

    let stranger = Uuid::new_v4();
    let err = begin_classification(&store, stranger, books[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, literatus_core::Error::PermissionDenied(_)));

    let err = resolver::delete(&store, stranger, books[0].id).await.unwrap_err();
    assert!(matches!(err, literatus_core::Error::PermissionDenied(_)));
}
