use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::classify::episodes::{format_experience, ExperienceEntry};
use crate::db::PendingFetch;
use crate::extract::username::INVALID_URL;

/// Canonical sentinel for a profile whose provider record holds no
/// experience entries. Downstream stages detect it by exact equality.
pub const NO_EXPERIENCE_DATA: &str = "No experience data found.";
/// Sentinel recorded when the provider fetch itself fails.
pub const API_ERROR: &str = "API Error";

const CONCURRENCY: usize = 10;

/// Profile provider client. Endpoint and credentials are resolved once,
/// before any batch work starts; a missing variable is the only failure
/// allowed to stop a run.
pub struct ProfileClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Profile {
    #[serde(default)]
    experience: Vec<ExperienceEntry>,
}

impl ProfileClient {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PROFILE_API_KEY")
            .map_err(|_| anyhow::anyhow!("PROFILE_API_KEY environment variable must be set"))?;
        let base = std::env::var("PROFILE_API_BASE")
            .map_err(|_| anyhow::anyhow!("PROFILE_API_BASE environment variable must be set"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            api_key,
        })
    }

    /// Fetch and format one identity's experience. Never raises past this
    /// boundary: every failure degrades to the error sentinel so the
    /// pipeline always produces a row. A failed fetch is terminal for that
    /// identity; there are no retries.
    pub async fn fetch_experience(&self, username: &str) -> (String, Option<String>) {
        match self.try_fetch(username).await {
            Ok(entries) => (format_experience(&entries), None),
            Err(e) => {
                warn!("Profile fetch failed for {}: {:#}", username, e);
                (API_ERROR.to_string(), Some(e.to_string()))
            }
        }
    }

    async fn try_fetch(&self, username: &str) -> Result<Vec<ExperienceEntry>> {
        let url = format!("{}/profiles/{}", self.base.trim_end_matches('/'), username);
        let resp = self.http.get(&url).bearer_auth(&self.api_key).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("provider returned {}", resp.status());
        }
        let body = resp.text().await?;
        let profile: Profile =
            serde_json::from_str(&body).context("Malformed provider response")?;
        Ok(profile.experience)
    }
}

/// Per-run fetch stats.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub invalid: usize,
}

struct RowResult {
    row_id: i64,
    experience: String,
    error: Option<String>,
}

/// Fetch experience for every pending row concurrently, saving each result
/// to the DB as it arrives. Rows whose identity is the invalid marker skip
/// the provider and record the marker as their experience text.
pub async fn fetch_profiles_streaming(
    conn: &Connection,
    rows: Vec<PendingFetch>,
) -> Result<FetchStats> {
    let client = Arc::new(ProfileClient::from_env()?);
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = rows.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<RowResult>(CONCURRENCY * 2);

    for row in rows {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            if row.username == INVALID_URL {
                let _ = tx
                    .send(RowResult {
                        row_id: row.id,
                        experience: INVALID_URL.to_string(),
                        error: None,
                    })
                    .await;
                return;
            }
            let _permit = sem.acquire().await.unwrap();
            let (experience, error) = client.fetch_experience(&row.username).await;
            let _ = tx
                .send(RowResult {
                    row_id: row.id,
                    experience,
                    error,
                })
                .await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;
    let mut invalid = 0usize;

    let mut update_stmt = conn.prepare(
        "UPDATE report_rows
         SET fetched = 1, experience = ?2, error = ?3, fetched_at = datetime('now')
         WHERE id = ?1",
    )?;

    while let Some(res) = rx.recv().await {
        if res.error.is_some() {
            errors += 1;
        } else if res.experience == INVALID_URL {
            invalid += 1;
        } else {
            ok += 1;
        }
        update_stmt.execute(rusqlite::params![res.row_id, res.experience, res.error])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Fetched {} profiles ({} ok, {} errors, {} invalid links)",
        total, ok, errors, invalid
    );

    Ok(FetchStats {
        total,
        ok,
        errors,
        invalid,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_json_tolerates_missing_fields() {
        let body = r#"{"experience":[
            {"companyName":"Acme","title":"Engineer",
             "timePeriod":{"startDate":{"month":3,"year":2022}}},
            {"title":null}
        ]}"#;
        let profile: Profile = serde_json::from_str(body).unwrap();
        assert_eq!(profile.experience.len(), 2);

        let text = format_experience(&profile.experience);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Company: Acme, Title: Engineer, Start Date: 3 2022, End Date: Present N/A"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Company: N/A, Title: N/A, Start Date: N/A N/A, End Date: Present N/A"
        );
    }

    #[test]
    fn absent_experience_field_degrades_to_sentinel() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(format_experience(&profile.experience), NO_EXPERIENCE_DATA);
    }
}
