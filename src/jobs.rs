use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::JobPost;

const LIST_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const POSTING_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting";
const PAGE_SIZE: usize = 25;
const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) placement_scraper/0.1";

/// Job scrape stats returned after completion.
pub struct JobScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Scrape up to `wanted` postings for a role: paginate the public listing
/// endpoint for job ids, then fetch each posting concurrently, saving each
/// result to DB as it arrives.
pub async fn scrape_jobs_streaming(
    conn: &Connection,
    role: &str,
    location: &str,
    wanted: usize,
) -> Result<JobScrapeStats> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let cards = collect_job_cards(&client, role, location, wanted).await?;
    let total = cards.len();
    if total == 0 {
        return Ok(JobScrapeStats { total: 0, ok: 0, errors: 0 });
    }
    info!("Found {} postings for '{}'", total, role);

    let client = Arc::new(client);
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<JobPost>(CONCURRENCY * 2);

    for (job_id, href) in cards {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let url = format!("{}/{}", POSTING_URL, job_id);
            let post = match fetch_with_retry(&client, &url).await {
                Ok(html) => parse_posting(&job_id, &href, &html),
                Err(e) => JobPost {
                    job_id,
                    title: None,
                    company: None,
                    location: None,
                    posted: None,
                    description: None,
                    apply_link: href,
                    error: Some(e.to_string()),
                },
            };
            let _ = tx.send(post).await;
        });
    }

    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT OR REPLACE INTO job_posts
         (job_id, title, company, location, posted, description, apply_link, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    while let Some(post) = rx.recv().await {
        if post.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        insert_stmt.execute(rusqlite::params![
            post.job_id,
            post.title,
            post.company,
            post.location,
            post.posted,
            post.description,
            post.apply_link,
            post.error,
        ])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} postings ({} ok, {} errors)", total, ok, errors);

    Ok(JobScrapeStats { total, ok, errors })
}

/// Walk listing pages until enough distinct job cards are collected or a
/// page comes back empty.
async fn collect_job_cards(
    client: &reqwest::Client,
    role: &str,
    location: &str,
    wanted: usize,
) -> Result<Vec<(String, String)>> {
    let mut cards = Vec::new();
    let mut seen = HashSet::new();
    let mut page = 0usize;

    while cards.len() < wanted {
        let url = format!(
            "{}?keywords={}&location={}&start={}",
            LIST_URL,
            encode_query(role),
            encode_query(location),
            page * PAGE_SIZE
        );
        let html = match fetch_with_retry(client, &url).await {
            Ok(h) => h,
            Err(e) => {
                warn!("Listing page {} failed: {}", page, e);
                break;
            }
        };
        let page_cards = parse_listing(&html);
        if page_cards.is_empty() {
            break;
        }
        for (id, href) in page_cards {
            if cards.len() >= wanted {
                break;
            }
            if seen.insert(id.clone()) {
                cards.push((id, href));
            }
        }
        page += 1;
    }

    Ok(cards)
}

fn encode_query(s: &str) -> String {
    s.trim().replace(' ', "%20")
}

/// (job id, card href) pairs from one listing page.
fn parse_listing(html: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let card = Selector::parse("a.base-card__full-link").unwrap();
    doc.select(&card)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| job_id_from_href(href).map(|id| (id, href.to_string())))
        .collect()
}

/// Job id: the trailing digit run of the posting path, query stripped.
fn job_id_from_href(href: &str) -> Option<String> {
    let path = href.split('?').next().unwrap_or(href).trim_end_matches('/');
    let digits: String = path.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.chars().rev().collect())
}

fn parse_posting(job_id: &str, apply_link: &str, html: &str) -> JobPost {
    let doc = Html::parse_document(html);
    let first_text = |pattern: &str| -> Option<String> {
        let sel = Selector::parse(pattern).unwrap();
        doc.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    };

    JobPost {
        job_id: job_id.to_string(),
        title: first_text("h2.top-card-layout__title"),
        company: first_text("a.topcard__org-name-link"),
        location: first_text("span.topcard__flavor--bullet"),
        posted: first_text("span.posted-time-ago__text"),
        description: first_text("div.description__text--rich"),
        apply_link: apply_link.to_string(),
        error: None,
    }
}

async fn fetch_with_retry(client: &reqwest::Client, url: &str) -> Result<String> {
    let mut attempt = 0;
    loop {
        match fetch_once(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                let msg = e.to_string();
                let transient = ["429", "500", "502", "503"].iter().any(|c| msg.contains(c));
                if !transient || attempt == MAX_RETRIES {
                    return Err(e);
                }
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Transient error on {} (attempt {}/{}), backing off {:.1}s",
                    url,
                    attempt + 1,
                    MAX_RETRIES,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}

// ── Tests ──
