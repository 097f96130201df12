pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS assertions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  contest_name TEXT NOT NULL,
  assertion_type TEXT NOT NULL CHECK (assertion_type IN ('NEB', 'NEN')),
  winner TEXT NOT NULL,
  loser TEXT NOT NULL,
  continuing_json TEXT NOT NULL DEFAULT '[]',
  margin INTEGER NOT NULL CHECK (margin >= 0),
  diluted_margin REAL NOT NULL,
  difficulty REAL NOT NULL,
  current_risk REAL NOT NULL DEFAULT 1.0,
  estimated_samples_to_audit INTEGER NOT NULL DEFAULT 0,
  optimistic_samples_to_audit INTEGER NOT NULL DEFAULT 0,
  two_vote_over_count INTEGER NOT NULL DEFAULT 0,
  one_vote_over_count INTEGER NOT NULL DEFAULT 0,
  other_count INTEGER NOT NULL DEFAULT 0,
  one_vote_under_count INTEGER NOT NULL DEFAULT 0,
  two_vote_under_count INTEGER NOT NULL DEFAULT 0,
  version INTEGER NOT NULL DEFAULT 0,
  CHECK (winner <> loser)
);

CREATE INDEX IF NOT EXISTS idx_assertions_contest ON assertions(contest_name);

CREATE TABLE IF NOT EXISTS contest_summaries (
  contest_name TEXT PRIMARY KEY,
  winner TEXT NOT NULL,
  error_code TEXT NOT NULL DEFAULT '',
  warning TEXT NOT NULL DEFAULT '',
  message TEXT NOT NULL DEFAULT '',
  generated_at TEXT NOT NULL
);
"#;
