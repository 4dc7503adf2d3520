use std::collections::HashSet;

use anyhow::Result;
use lopdf::{Document, Object};

use super::links;

/// Profile URLs from a PDF's embedded link annotations. Walks every page's
/// /Annots array and collects /A → /URI action targets that match the
/// profile URL pattern. Malformed documents error out here and are
/// swallowed by the caller, never the batch.
pub fn extract_profile_urls_from_pdf(data: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(data)?;
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for page_id in doc.get_pages().into_values() {
        let Ok(page) = doc.get_dictionary(page_id) else { continue };
        let Ok(annots) = page.get(b"Annots") else { continue };
        let Object::Array(annots) = resolve(&doc, annots) else { continue };

        for annot in annots {
            let Object::Dictionary(annot) = resolve(&doc, annot) else { continue };
            let Ok(action) = annot.get(b"A") else { continue };
            let Object::Dictionary(action) = resolve(&doc, action) else { continue };
            let Ok(target) = action.get(b"URI") else { continue };
            let Object::String(bytes, _) = resolve(&doc, target) else { continue };

            let uri = String::from_utf8_lossy(bytes);
            for url in links::extract_profile_urls(&uri) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }
    }

    Ok(urls)
}

/// Follow an indirect reference one level; other objects pass through.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

// ── Tests ──
