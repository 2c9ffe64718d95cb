//! Page layout of a report
//!
//! Photos are packed into grid pages at a fixed density. The rest of the
//! report follows a fixed page plan:
//! - cover page on its own page
//! - client and insurance details share one page
//! - one page per photo grid page
//! - additional notes on a final page

use super::document::{PhotoEntry, PhotoPage, ReportDocument, Section};

/// Photos per grid page (2 columns x 3 rows)
pub const PHOTOS_PER_PAGE: usize = 6;

/// Pack entries into pages of `per_page`, keeping their order
pub fn paginate(entries: Vec<PhotoEntry>, per_page: usize) -> Vec<PhotoPage> {
    let per_page = per_page.max(1);
    let mut pages = Vec::with_capacity(entries.len().div_ceil(per_page));
    let mut entries = entries.into_iter().peekable();

    while entries.peek().is_some() {
        let chunk: Vec<PhotoEntry> = entries.by_ref().take(per_page).collect();
        pages.push(PhotoPage {
            number: pages.len() + 1,
            entries: chunk,
        });
    }

    pages
}

/// Number of printed pages the document will take
pub fn page_count(document: &ReportDocument) -> usize {
    let mut details_page = false;
    let mut count = 0;

    for section in &document.sections {
        match section {
            Section::CoverPage { .. } | Section::Notes { .. } => count += 1,
            Section::ClientInfo { .. } | Section::InsuranceInfo { .. } => details_page = true,
            Section::PhotoGrid { pages, .. } => count += pages.len(),
        }
    }

    if details_page {
        count += 1;
    }
    count
}
