use anyhow::Result;
use rusqlite::Connection;

use crate::roster::RosterRow;

const DB_PATH: &str = "data/placement.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS roster (
            id           INTEGER PRIMARY KEY,
            unique_id    TEXT UNIQUE NOT NULL,
            student_name TEXT NOT NULL,
            batch_start  TEXT NOT NULL,
            batch_end    TEXT NOT NULL,
            cells        TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS report_rows (
            id             INTEGER PRIMARY KEY,
            roster_id      INTEGER NOT NULL REFERENCES roster(id),
            unique_id      TEXT NOT NULL,
            student_name   TEXT NOT NULL,
            batch_start    TEXT NOT NULL,
            batch_end      TEXT NOT NULL,
            link           TEXT NOT NULL,
            username       TEXT NOT NULL,
            fetched        BOOLEAN NOT NULL DEFAULT 0,
            experience     TEXT,
            error          TEXT,
            episodes       TEXT,
            classification TEXT,
            fetched_at     TEXT,
            classified_at  TEXT,
            UNIQUE(roster_id, link)
        );
        CREATE INDEX IF NOT EXISTS idx_report_fetched ON report_rows(fetched);
        CREATE INDEX IF NOT EXISTS idx_report_classification ON report_rows(classification);

        CREATE TABLE IF NOT EXISTS job_posts (
            id          INTEGER PRIMARY KEY,
            job_id      TEXT UNIQUE NOT NULL,
            title       TEXT,
            company     TEXT,
            location    TEXT,
            posted      TEXT,
            description TEXT,
            apply_link  TEXT NOT NULL,
            error       TEXT,
            scraped_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

// ── Roster ──

pub struct RosterRecord {
    pub id: i64,
    pub unique_id: String,
    pub student_name: String,
    pub batch_start: String,
    pub batch_end: String,
    pub cells: Vec<String>,
}

pub fn upsert_roster(conn: &Connection, rows: &[RosterRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO roster (unique_id, student_name, batch_start, batch_end, cells)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(unique_id) DO UPDATE SET
                 student_name = excluded.student_name,
                 batch_start  = excluded.batch_start,
                 batch_end    = excluded.batch_end,
                 cells        = excluded.cells",
        )?;
        for r in rows {
            let cells = serde_json::to_string(&r.cells).unwrap_or_default();
            count += stmt.execute(rusqlite::params![
                r.unique_id,
                r.student_name,
                r.batch_start,
                r.batch_end,
                cells,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_roster(conn: &Connection) -> Result<Vec<RosterRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, unique_id, student_name, batch_start, batch_end, cells
         FROM roster ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RosterRecord {
                id: row.get(0)?,
                unique_id: row.get(1)?,
                student_name: row.get(2)?,
                batch_start: row.get(3)?,
                batch_end: row.get(4)?,
                cells: serde_json::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn roster_count(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM roster", [], |r| r.get(0))?)
}

// ── Report rows ──

/// A report row at creation time, before any fetch has happened.
pub struct NewReportRow {
    pub roster_id: i64,
    pub unique_id: String,
    pub student_name: String,
    pub batch_start: String,
    pub batch_end: String,
    pub link: String,
    pub username: String,
}

pub fn insert_report_rows(conn: &Connection, rows: &[NewReportRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO report_rows
             (roster_id, unique_id, student_name, batch_start, batch_end, link, username)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![
                r.roster_id,
                r.unique_id,
                r.student_name,
                r.batch_start,
                r.batch_end,
                r.link,
                r.username,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct PendingFetch {
    pub id: i64,
    pub username: String,
}

pub fn fetch_unfetched(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingFetch>> {
    let sql = format!(
        "SELECT id, username FROM report_rows WHERE fetched = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingFetch {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ClassifyInput {
    pub id: i64,
    pub batch_start: String,
    pub batch_end: String,
    pub experience: Option<String>,
}

pub fn fetch_unclassified(conn: &Connection, limit: Option<usize>) -> Result<Vec<ClassifyInput>> {
    let sql = format!(
        "SELECT id, batch_start, batch_end, experience
         FROM report_rows
         WHERE fetched = 1 AND classification IS NULL
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClassifyInput {
                id: row.get(0)?,
                batch_start: row.get(1)?,
                batch_end: row.get(2)?,
                experience: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_classified(conn: &Connection, rows: &[(i64, String, String)]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "UPDATE report_rows
             SET episodes = ?2, classification = ?3, classified_at = datetime('now')
             WHERE id = ?1",
        )?;
        for (id, episodes, classification) in rows {
            stmt.execute(rusqlite::params![id, episodes, classification])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// One fully materialized report row, table order.
pub struct ReportRow {
    pub unique_id: String,
    pub student_name: String,
    pub batch_start: String,
    pub batch_end: String,
    pub link: String,
    pub username: String,
    pub experience: Option<String>,
    pub episodes: Vec<String>,
    pub classification: Option<String>,
}

pub fn fetch_report(conn: &Connection) -> Result<Vec<ReportRow>> {
    let mut stmt = conn.prepare(
        "SELECT unique_id, student_name, batch_start, batch_end, link, username,
                experience, episodes, classification
         FROM report_rows ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ReportRow {
                unique_id: row.get(0)?,
                student_name: row.get(1)?,
                batch_start: row.get(2)?,
                batch_end: row.get(3)?,
                link: row.get(4)?,
                username: row.get(5)?,
                experience: row.get(6)?,
                episodes: row
                    .get::<_, Option<String>>(7)?
                    .map(|s| serde_json::from_str(&s).unwrap_or_default())
                    .unwrap_or_default(),
                classification: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Job posts ──

pub struct JobPost {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub posted: Option<String>,
    pub description: Option<String>,
    pub apply_link: String,
    pub error: Option<String>,
}

pub fn fetch_job_posts(conn: &Connection) -> Result<Vec<JobPost>> {
    let mut stmt = conn.prepare(
        "SELECT job_id, title, company, location, posted, description, apply_link, error
         FROM job_posts ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(JobPost {
                job_id: row.get(0)?,
                title: row.get(1)?,
                company: row.get(2)?,
                location: row.get(3)?,
                posted: row.get(4)?,
                description: row.get(5)?,
                apply_link: row.get(6)?,
                error: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub roster: usize,
    pub rows: usize,
    pub fetched: usize,
    pub classified: usize,
    pub errors: usize,
    pub jobs: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let roster = roster_count(conn)?;
    let rows: usize = conn.query_row("SELECT COUNT(*) FROM report_rows", [], |r| r.get(0))?;
    let fetched: usize = conn.query_row(
        "SELECT COUNT(*) FROM report_rows WHERE fetched = 1",
        [],
        |r| r.get(0),
    )?;
    let classified: usize = conn.query_row(
        "SELECT COUNT(*) FROM report_rows WHERE classification IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM report_rows WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let jobs: usize = conn.query_row("SELECT COUNT(*) FROM job_posts", [], |r| r.get(0))?;
    Ok(Stats {
        roster,
        rows,
        fetched,
        classified,
        errors,
        jobs,
    })
}

// ── Tests ──
