use crate::errors::ErrorCode;
use crate::model::{AssertionShape, AuditProgress, ContestSummary, NewAssertion, StoredAssertion};
use anyhow::Context;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const SCHEMA_VERSION: i64 = 1;

const ASSERTION_COLUMNS: &str = "id, contest_name, assertion_type, winner, loser, continuing_json,
    margin, diluted_margin, difficulty, current_risk, estimated_samples_to_audit,
    optimistic_samples_to_audit, two_vote_over_count, one_vote_over_count, other_count,
    one_vote_under_count, two_vote_under_count, version";

const SUMMARY_COLUMNS: &str = "contest_name, winner, error_code, warning, message, generated_at";

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

/// A contest's summary and assertions as read in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ContestSnapshot {
    pub summary: Option<ContestSummary>,
    /// Ascending by storage id.
    pub assertions: Vec<StoredAssertion>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(crate::storage::schema::DDL)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))
    }

    /// Drop every assertion and the summary stored for the summary's contest,
    /// then write the new set, all in one immediate transaction. Returns the
    /// summary as stored.
    pub fn replace_contest(
        &self,
        summary: &ContestSummary,
        assertions: &[NewAssertion],
    ) -> anyhow::Result<ContestSummary> {
        let contest = summary.contest_name.as_str();
        if let Some(stray) = assertions.iter().find(|a| a.contest_name != contest) {
            anyhow::bail!(
                "assertion for contest '{}' in replace set for '{}'",
                stray.contest_name,
                contest
            );
        }

        let mut stored = summary.clone();
        stored.generated_at = Some(chrono::Utc::now().to_rfc3339());

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx
            .execute(
                "DELETE FROM assertions WHERE contest_name = ?1",
                params![contest],
            )
            .context("delete previous assertions")?;
        tx.execute(
            "DELETE FROM contest_summaries WHERE contest_name = ?1",
            params![contest],
        )
        .context("delete previous summary")?;

        tx.execute(
            "INSERT INTO contest_summaries (contest_name, winner, error_code, warning, message, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                contest,
                stored.winner,
                stored.error_code.map(|c| c.as_str()).unwrap_or(""),
                stored.warning,
                stored.message,
                stored.generated_at,
            ],
        )
        .context("insert summary")?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO assertions (contest_name, assertion_type, winner, loser, continuing_json,
                    margin, diluted_margin, difficulty)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for a in assertions {
                stmt.execute(params![
                    contest,
                    a.shape.type_tag(),
                    a.shape.winner(),
                    a.shape.loser(),
                    serde_json::to_string(a.shape.continuing())?,
                    a.margin,
                    a.diluted_margin,
                    a.difficulty,
                ])
                .context("insert assertion")?;
            }
        }

        tx.commit().context("commit contest replacement")?;

        tracing::debug!(
            event = "raire.store.replaced",
            contest = %contest,
            removed,
            inserted = assertions.len(),
        );
        Ok(stored)
    }

    pub fn load_contest(&self, contest: &str) -> anyhow::Result<ContestSnapshot> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let summary = query_summary(&tx, contest)?;
        let assertions = query_assertions(&tx, contest)?;
        tx.commit()?;
        Ok(ContestSnapshot {
            summary,
            assertions,
        })
    }

    pub fn fetch_summary(&self, contest: &str) -> anyhow::Result<Option<ContestSummary>> {
        let conn = self.lock()?;
        query_summary(&conn, contest)
    }

    pub fn fetch_assertions(&self, contest: &str) -> anyhow::Result<Vec<StoredAssertion>> {
        let conn = self.lock()?;
        query_assertions(&conn, contest)
    }

    pub fn list_summaries(&self) -> anyhow::Result<Vec<ContestSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contest_summaries ORDER BY contest_name ASC",
            SUMMARY_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Overwrite the audit progress of one assertion. With `expected_version`
    /// the write only applies if the row is still at that version. Returns the
    /// new version, or `None` if no row matched.
    pub fn update_audit_progress(
        &self,
        contest: &str,
        assertion_id: i64,
        progress: &AuditProgress,
        expected_version: Option<i64>,
    ) -> anyhow::Result<Option<i64>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = tx
            .execute(
                "UPDATE assertions SET
                    current_risk = ?1,
                    estimated_samples_to_audit = ?2,
                    optimistic_samples_to_audit = ?3,
                    two_vote_over_count = ?4,
                    one_vote_over_count = ?5,
                    other_count = ?6,
                    one_vote_under_count = ?7,
                    two_vote_under_count = ?8,
                    version = version + 1
                 WHERE contest_name = ?9 AND id = ?10 AND (?11 IS NULL OR version = ?11)",
                params![
                    progress.current_risk,
                    progress.estimated_samples_to_audit,
                    progress.optimistic_samples_to_audit,
                    progress.two_vote_over_count,
                    progress.one_vote_over_count,
                    progress.other_count,
                    progress.one_vote_under_count,
                    progress.two_vote_under_count,
                    contest,
                    assertion_id,
                    expected_version,
                ],
            )
            .context("update audit progress")?;
        if updated == 0 {
            return Ok(None);
        }
        let version: i64 = tx.query_row(
            "SELECT version FROM assertions WHERE id = ?1",
            params![assertion_id],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(Some(version))
    }

    pub fn count_rows(&self, table: &str) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        // table names cannot be bound as parameters
        if !["assertions", "contest_summaries"].contains(&table) {
            anyhow::bail!("Invalid table name for count_rows: {}", table);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n)
    }
}

fn query_summary(conn: &Connection, contest: &str) -> anyhow::Result<Option<ContestSummary>> {
    let summary = conn
        .query_row(
            &format!(
                "SELECT {} FROM contest_summaries WHERE contest_name = ?1",
                SUMMARY_COLUMNS
            ),
            params![contest],
            summary_from_row,
        )
        .optional()
        .context("load contest summary")?;
    Ok(summary)
}

fn query_assertions(conn: &Connection, contest: &str) -> anyhow::Result<Vec<StoredAssertion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM assertions WHERE contest_name = ?1 ORDER BY id ASC",
        ASSERTION_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![contest], assertion_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("load assertions")?;
    Ok(rows)
}

fn summary_from_row(row: &Row) -> rusqlite::Result<ContestSummary> {
    let code: String = row.get(2)?;
    let error_code = if code.is_empty() {
        None
    } else {
        Some(ErrorCode::parse(&code).ok_or_else(|| {
            conversion_error(2, format!("unknown error code '{}'", code))
        })?)
    };
    Ok(ContestSummary {
        contest_name: row.get(0)?,
        winner: row.get(1)?,
        error_code,
        warning: row.get(3)?,
        message: row.get(4)?,
        generated_at: row.get(5)?,
    })
}

fn assertion_from_row(row: &Row) -> rusqlite::Result<StoredAssertion> {
    let tag: String = row.get(2)?;
    let winner: String = row.get(3)?;
    let loser: String = row.get(4)?;
    let continuing_json: String = row.get(5)?;

    let shape = match tag.as_str() {
        "NEB" => AssertionShape::NotEliminatedBefore { winner, loser },
        "NEN" => {
            let continuing: Vec<String> = serde_json::from_str(&continuing_json)
                .map_err(|e| conversion_error(5, e.to_string()))?;
            AssertionShape::NotEliminatedNext {
                winner,
                loser,
                continuing,
            }
        }
        other => return Err(conversion_error(2, format!("unknown assertion type '{}'", other))),
    };

    Ok(StoredAssertion {
        id: row.get(0)?,
        contest_name: row.get(1)?,
        shape,
        margin: row.get(6)?,
        diluted_margin: row.get(7)?,
        difficulty: row.get(8)?,
        progress: AuditProgress {
            current_risk: row.get(9)?,
            estimated_samples_to_audit: row.get(10)?,
            optimistic_samples_to_audit: row.get(11)?,
            two_vote_over_count: row.get(12)?,
            one_vote_over_count: row.get(13)?,
            other_count: row.get(14)?,
            one_vote_under_count: row.get(15)?,
            two_vote_under_count: row.get(16)?,
        },
        version: row.get(17)?,
    })
}

fn conversion_error(col: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, msg.into())
}
