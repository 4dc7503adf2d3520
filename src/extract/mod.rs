pub mod links;
pub mod pdf;
pub mod username;

use std::collections::HashSet;

use anyhow::Result;
use tracing::warn;

/// Fallback link marker for roster rows where no profile URL was found.
pub const NO_URL_FOUND: &str = "No URL found";

const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download";

/// Discover the distinct profile URLs for one roster row: every text cell
/// is scanned first, then Drive-hosted documents are fetched and their link
/// annotations walked. A row with zero discoveries yields the single
/// fallback marker, so no roster row is ever dropped. Document failures
/// log a warning and contribute nothing.
pub async fn discover_row_links(client: &reqwest::Client, cells: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for url in collect_cell_urls(cells) {
        if seen.insert(url.clone()) {
            found.push(url);
        }
    }

    for cell in cells {
        let Some(file_id) = links::drive_file_id(cell) else { continue };
        match fetch_document(client, &file_id).await {
            Ok(bytes) => match pdf::extract_profile_urls_from_pdf(&bytes) {
                Ok(urls) => {
                    for url in urls {
                        if seen.insert(url.clone()) {
                            found.push(url);
                        }
                    }
                }
                Err(e) => warn!("Skipping malformed document {}: {}", file_id, e),
            },
            Err(e) => warn!("Failed to fetch document {}: {}", file_id, e),
        }
    }

    if found.is_empty() {
        vec![NO_URL_FOUND.to_string()]
    } else {
        found
    }
}

/// Profile URLs from the row's text cells alone, cell order, undeduplicated.
fn collect_cell_urls(cells: &[String]) -> Vec<String> {
    cells.iter().flat_map(|c| links::extract_profile_urls(c)).collect()
}

async fn fetch_document(client: &reqwest::Client, file_id: &str) -> Result<Vec<u8>> {
    let url = format!("{}&id={}", DRIVE_DOWNLOAD_URL, file_id);
    let resp = client.get(&url).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("document fetch returned {}", resp.status());
    }
    Ok(resp.bytes().await?.to_vec())
}

// ── Tests ──
