use raire_core::coordinator::{generate, persist};
use raire_core::errors::ErrorCode;
use raire_core::model::{AssertionShape, ContestSummary, GenerationRequest, NewAssertion};
use raire_core::solver::{
    RawAssertion, RawAssertionWithDifficulty, SolverError, SolverResult, SolverSolution,
};
use raire_core::storage::Store;
use raire_core::translate::translate;
use tempfile::tempdir;

fn request(contest: &str) -> GenerationRequest {
    GenerationRequest {
        contest_name: contest.into(),
        total_auditable_ballots: 1000,
        candidates: vec!["Alice".into(), "Bob".into(), "Chuan".into()],
    }
}

fn neb(winner: usize, loser: usize, margin: i64) -> RawAssertionWithDifficulty {
    RawAssertionWithDifficulty {
        assertion: RawAssertion::NotEliminatedBefore { winner, loser },
        difficulty: 1000.0 / margin as f64,
        margin,
    }
}

fn solved(winner: usize, assertions: Vec<RawAssertionWithDifficulty>) -> SolverResult {
    let margin = assertions.iter().map(|a| a.margin).min().unwrap_or(0);
    Ok(SolverSolution {
        difficulty: assertions
            .iter()
            .map(|a| a.difficulty)
            .fold(0.0, f64::max),
        margin,
        assertions,
        winner,
        num_candidates: 3,
        warning_trim_timed_out: false,
        time_to_determine_winners: None,
        time_to_find_assertions: None,
        time_to_trim_assertions: None,
    })
}

fn memory_store() -> anyhow::Result<Store> {
    let store = Store::memory()?;
    store.init_schema()?;
    Ok(store)
}

#[test]
fn second_persist_fully_replaces_the_first() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");

    let r1 = translate(&req, &solved(0, vec![neb(0, 1, 320), neb(0, 2, 220)]))?;
    let r2 = translate(&req, &solved(1, vec![neb(1, 2, 50)]))?;

    persist(&store, "Mayor", &r1)?;
    persist(&store, "Mayor", &r2)?;

    let snap = store.load_contest("Mayor")?;
    let summary = snap.summary.expect("summary");
    assert_eq!(summary.winner, "Bob");
    assert_eq!(snap.assertions.len(), 1);
    assert_eq!(
        snap.assertions[0].shape,
        AssertionShape::NotEliminatedBefore {
            winner: "Bob".into(),
            loser: "Chuan".into()
        }
    );
    assert_eq!(store.count_rows("contest_summaries")?, 1);
    Ok(())
}

#[test]
fn failure_after_success_leaves_only_the_failure() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");

    generate(&store, &req, &solved(0, vec![neb(0, 1, 320)]))?;
    let err = generate(&store, &req, &Err(SolverError::TiedWinners(vec![0, 1]))).unwrap_err();
    assert_eq!(err.code, ErrorCode::TiedWinners);
    assert_eq!(err.message, "Tied winners: Alice, Bob.");

    let snap = store.load_contest("Mayor")?;
    assert!(snap.assertions.is_empty());
    let summary = snap.summary.expect("summary");
    assert_eq!(summary.error_code, Some(ErrorCode::TiedWinners));
    assert_eq!(summary.winner, "unknown");

    // and a later success replaces the failure
    generate(&store, &req, &solved(0, vec![neb(0, 2, 400)]))?;
    let snap = store.load_contest("Mayor")?;
    assert!(snap.summary.expect("summary").is_success());
    assert_eq!(snap.assertions.len(), 1);
    Ok(())
}

#[test]
fn rejected_translation_writes_nothing() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");

    // second assertion has winner == loser
    let err = generate(&store, &req, &solved(0, vec![neb(0, 1, 320), neb(2, 2, 10)])).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);
    assert_eq!(store.count_rows("assertions")?, 0);
    assert_eq!(store.count_rows("contest_summaries")?, 0);
    Ok(())
}

#[test]
fn rejected_translation_keeps_prior_result() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");
    generate(&store, &req, &solved(0, vec![neb(0, 1, 320)]))?;
    let before = store.load_contest("Mayor")?;

    let err = generate(&store, &req, &solved(0, vec![neb(0, 1, 1000)])).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);
    assert_eq!(store.load_contest("Mayor")?, before);
    Ok(())
}

#[test]
fn contested_success_without_assertions_writes_nothing() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");
    generate(&store, &req, &solved(0, vec![neb(0, 1, 320)]))?;
    let before = store.load_contest("Mayor")?;

    let err = generate(&store, &req, &solved(0, vec![])).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);
    assert_eq!(store.load_contest("Mayor")?, before);

    let fresh = request("Council");
    generate(&store, &fresh, &solved(1, vec![])).unwrap_err();
    assert!(store.fetch_summary("Council")?.is_none());
    assert!(store.fetch_assertions("Council")?.is_empty());
    Ok(())
}

#[test]
fn failed_write_rolls_back_to_prior_state() -> anyhow::Result<()> {
    let store = memory_store()?;
    generate(&store, &request("Mayor"), &solved(0, vec![neb(0, 1, 320)]))?;
    let before = store.load_contest("Mayor")?;

    let rows = [
        NewAssertion {
            contest_name: "Mayor".into(),
            shape: AssertionShape::NotEliminatedBefore {
                winner: "Bob".into(),
                loser: "Chuan".into(),
            },
            margin: 50,
            diluted_margin: 0.05,
            difficulty: 20.0,
        },
        // violates the margin CHECK constraint mid-transaction
        NewAssertion {
            contest_name: "Mayor".into(),
            shape: AssertionShape::NotEliminatedBefore {
                winner: "Bob".into(),
                loser: "Alice".into(),
            },
            margin: -1,
            diluted_margin: -0.001,
            difficulty: 1.0,
        },
    ];
    let replaced = store.replace_contest(&ContestSummary::success("Mayor", "Bob", None), &rows);
    assert!(replaced.is_err());

    let after = store.load_contest("Mayor")?;
    assert_eq!(after, before);
    assert_eq!(after.summary.map(|s| s.winner), Some("Alice".to_string()));
    assert_eq!(after.assertions.len(), 1);
    Ok(())
}

#[test]
fn contests_are_replaced_independently() -> anyhow::Result<()> {
    let store = memory_store()?;
    generate(&store, &request("Mayor"), &solved(0, vec![neb(0, 1, 320)]))?;
    generate(&store, &request("Council"), &solved(2, vec![neb(2, 0, 100), neb(2, 1, 90)]))?;
    generate(&store, &request("Mayor"), &solved(0, vec![neb(0, 2, 10)]))?;

    assert_eq!(store.fetch_assertions("Council")?.len(), 2);
    assert_eq!(store.fetch_assertions("Mayor")?.len(), 1);
    let names: Vec<String> = store
        .list_summaries()?
        .into_iter()
        .map(|s| s.contest_name)
        .collect();
    assert_eq!(names, vec!["Council".to_string(), "Mayor".to_string()]);
    Ok(())
}

#[test]
fn replacement_is_visible_to_another_connection() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("raire.db");

    let writer = Store::open(&db_path)?;
    writer.init_schema()?;
    let reader = Store::open(&db_path)?;

    generate(&writer, &request("Mayor"), &solved(0, vec![neb(0, 1, 320)]))?;
    let first = reader.load_contest("Mayor")?;
    assert_eq!(first.assertions.len(), 1);

    let _ = generate(&writer, &request("Mayor"), &Err(SolverError::TimeoutCheckingWinner));
    let second = reader.load_contest("Mayor")?;
    assert!(second.assertions.is_empty());
    assert_eq!(
        second.summary.and_then(|s| s.error_code),
        Some(ErrorCode::TimeoutCheckingWinner)
    );

    // Verify via raw SQL as well
    let conn = rusqlite::Connection::open(&db_path)?;
    let count: i64 = conn.query_row("SELECT count(*) FROM assertions", [], |r| r.get(0))?;
    assert_eq!(count, 0);
    Ok(())
}

#[test]
fn ids_keep_growing_across_replacements() -> anyhow::Result<()> {
    let store = memory_store()?;
    let req = request("Mayor");
    generate(&store, &req, &solved(0, vec![neb(0, 1, 320), neb(0, 2, 300)]))?;
    let first_max = store.fetch_assertions("Mayor")?.last().map(|a| a.id).unwrap_or(0);

    generate(&store, &req, &solved(0, vec![neb(0, 1, 320)]))?;
    let rows = store.fetch_assertions("Mayor")?;
    assert!(rows[0].id > first_max);
    Ok(())
}
