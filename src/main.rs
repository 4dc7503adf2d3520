mod classify;
mod csv;
mod db;
mod extract;
mod jobs;
mod profile;
mod report;
mod roster;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "placement_scraper",
    about = "Cohort placement monitoring: profile scraping + classification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a roster CSV into the database
    Init {
        /// Roster file with Unique ID, Student Name, Batch Start Date,
        /// Batch End Date plus any extra columns to scan for links
        #[arg(short, long)]
        roster: PathBuf,
    },
    /// Discover profile links for every roster row
    Discover,
    /// Fetch experience for discovered identities
    Fetch {
        /// Max rows to fetch (default: all unfetched)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Split fetched experience into episodes and classify
    Classify {
        /// Max rows to classify (default: all unclassified)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Discover + fetch + classify in one pipeline
    Run {
        /// Max rows to fetch+classify
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Grouped classification summary
    Report,
    /// Case-insensitive search across all report columns
    Search { query: String },
    /// Write the report, summary, or scraped jobs as CSV
    Export {
        #[arg(short, long)]
        out: PathBuf,
        /// Export the grouped summary instead of the full report
        #[arg(long)]
        summary: bool,
        /// Export scraped job postings instead of the report
        #[arg(long)]
        jobs: bool,
    },
    /// Show pipeline statistics
    Stats,
    /// Scrape public job postings for a role
    Jobs {
        #[arg(short, long)]
        role: String,
        #[arg(short, long, default_value = "India")]
        location: String,
        /// Number of postings to scrape
        #[arg(short = 'n', long, default_value = "10")]
        num: usize,
        /// Optional CSV output path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { roster } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = roster::load_roster(&roster)?;
            let count = db::upsert_roster(&conn, &rows)?;
            println!("Loaded {} roster rows ({} in file)", count, rows.len());
            Ok(())
        }
        Commands::Discover => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let inserted = run_discover(&conn).await?;
            println!("Discovered {} new report rows.", inserted);
            Ok(())
        }
        Commands::Fetch { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pending = db::fetch_unfetched(&conn, limit)?;
            if pending.is_empty() {
                println!("No unfetched rows. Run 'discover' first or all rows are fetched.");
                return Ok(());
            }
            println!("Fetching {} profiles (streaming to DB)...", pending.len());
            let stats = profile::fetch_profiles_streaming(&conn, pending).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors, {} invalid links).",
                stats.total, stats.ok, stats.errors, stats.invalid
            );
            Ok(())
        }
        Commands::Classify { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_unclassified(&conn, limit)?;
            if rows.is_empty() {
                println!("No unclassified rows. Run 'fetch' first.");
                return Ok(());
            }
            println!("Classifying {} rows...", rows.len());
            let done = classify_rows(&conn, &rows)?;
            println!("Classified {} rows.", done);
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            // Phase 1: Discover links
            let t_discover = Instant::now();
            let inserted = run_discover(&conn).await?;
            println!(
                "Discovered {} new report rows in {:.1}s",
                inserted,
                t_discover.elapsed().as_secs_f64()
            );

            // Phase 2: Fetch profiles (streaming to DB)
            let pending = db::fetch_unfetched(&conn, limit)?;
            if pending.is_empty() {
                println!("Nothing to fetch.");
                return Ok(());
            }
            let t_fetch = Instant::now();
            println!("Fetching {} profiles (streaming to DB)...", pending.len());
            let stats = profile::fetch_profiles_streaming(&conn, pending).await?;
            println!(
                "Fetched {} profiles ({} ok, {} errors, {} invalid links) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                stats.invalid,
                t_fetch.elapsed().as_secs_f64()
            );

            // Phase 3: Classify
            let rows = db::fetch_unclassified(&conn, None)?;
            if rows.is_empty() {
                println!("Nothing to classify.");
                return Ok(());
            }
            let done = classify_rows(&conn, &rows)?;
            println!("Classified {} rows.", done);
            Ok(())
        }
        Commands::Report => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            if stats.rows == 0 {
                // Empty because nothing has run, not because a run found nothing
                if stats.roster == 0 {
                    println!("No data yet. Run 'init' then 'run' first.");
                } else {
                    println!("No report rows yet. Run 'run' first.");
                }
                return Ok(());
            }
            let rows = db::fetch_report(&conn)?;
            let summary = report::summarize(&rows);
            if summary.is_empty() {
                println!(
                    "{} rows discovered, none classified yet. Run 'classify'.",
                    rows.len()
                );
                return Ok(());
            }

            println!(
                "{:<26} | {:>5} | {}",
                "Experience Classification", "Count", "Students"
            );
            println!("{}", "-".repeat(92));
            for s in &summary {
                println!(
                    "{:<26} | {:>5} | {}",
                    s.classification,
                    s.count,
                    truncate(&s.students.join(", "), 54)
                );
            }
            println!(
                "\n{} report rows | {} students on roster",
                rows.len(),
                stats.roster
            );
            Ok(())
        }
        Commands::Search { query } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_report(&conn)?;
            let matches = report::search(&rows, &query);
            if matches.is_empty() {
                println!("No matching records found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<10} | {:<22} | {:<36} | {}",
                "#", "ID", "Student", "Link", "Classification"
            );
            println!("{}", "-".repeat(100));
            for (i, r) in matches.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<22} | {:<36} | {}",
                    i + 1,
                    truncate(&r.unique_id, 10),
                    truncate(&r.student_name, 22),
                    truncate(&r.link, 36),
                    r.classification.as_deref().unwrap_or("-")
                );
            }
            println!("\n{} matching rows", matches.len());
            Ok(())
        }
        Commands::Export { out, summary, jobs } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let text = if jobs {
                let posts = db::fetch_job_posts(&conn)?;
                if posts.is_empty() {
                    println!("No job posts scraped yet. Run 'jobs' first.");
                    return Ok(());
                }
                report::jobs_to_csv(&posts)
            } else {
                let rows = db::fetch_report(&conn)?;
                if rows.is_empty() {
                    println!("Nothing to export. Run 'run' first.");
                    return Ok(());
                }
                if summary {
                    report::summary_to_csv(&report::summarize(&rows))
                } else {
                    report::report_to_csv(&rows)
                }
            };
            std::fs::write(&out, text)?;
            println!("Wrote {}", out.display());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Roster:      {}", s.roster);
            println!("Report rows: {}", s.rows);
            println!("Fetched:     {}", s.fetched);
            println!("Classified:  {}", s.classified);
            println!("Errors:      {}", s.errors);
            println!("Job posts:   {}", s.jobs);
            Ok(())
        }
        Commands::Jobs { role, location, num, out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stats = jobs::scrape_jobs_streaming(&conn, &role, &location, num).await?;
            if stats.total == 0 {
                println!("No jobs found. Try a different role.");
                return Ok(());
            }
            println!(
                "Scraped {} postings ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            if let Some(path) = out {
                let posts = db::fetch_job_posts(&conn)?;
                std::fs::write(&path, report::jobs_to_csv(&posts))?;
                println!("Wrote {}", path.display());
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Expand the roster into report rows: one per (person, distinct link), or
/// one fallback row per person with zero discoveries. Re-runs insert only
/// links not seen before.
async fn run_discover(conn: &rusqlite::Connection) -> anyhow::Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};

    let roster = db::fetch_roster(conn)?;
    if roster.is_empty() {
        println!("No roster loaded. Run 'init' first.");
        return Ok(0);
    }

    let client = reqwest::Client::new();
    let pb = ProgressBar::new(roster.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut new_rows = Vec::new();
    for person in &roster {
        for link in extract::discover_row_links(&client, &person.cells).await {
            let username = extract::username::extract_username(&link);
            new_rows.push(db::NewReportRow {
                roster_id: person.id,
                unique_id: person.unique_id.clone(),
                student_name: person.student_name.clone(),
                batch_start: person.batch_start.clone(),
                batch_end: person.batch_end.clone(),
                link,
                username,
            });
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    db::insert_report_rows(conn, &new_rows)
}

/// Split and classify rows in parallel chunks, saving each chunk as it
/// completes. Pure CPU work; row order is preserved.
fn classify_rows(
    conn: &rusqlite::Connection,
    rows: &[db::ClassifyInput],
) -> anyhow::Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut done = 0;
    for chunk in rows.chunks(500) {
        let results: Vec<(i64, String, String)> = chunk
            .par_iter()
            .map(|row| {
                let slots =
                    classify::episodes::split_episodes(row.experience.as_deref().unwrap_or(""));
                let label = classify::classify(&row.batch_start, &row.batch_end, &slots);
                (
                    row.id,
                    serde_json::to_string(&slots).unwrap_or_default(),
                    label.to_string(),
                )
            })
            .collect();
        db::save_classified(conn, &results)?;
        done += results.len();
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(done)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
