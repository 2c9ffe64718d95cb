//! Printable HTML rendering of a report
//!
//! Every printed page is a `section.page` with a CSS page break after it, so
//! "print to PDF" from any browser gives the paginated report. Photos are
//! referenced by their bundle asset name.

use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::error::ExportError;
use crate::report::assembler::format_date;
use crate::report::layout::page_count;
use crate::report::{Field, PhotoPage, ReportDocument, Section};
use crate::state::data::{join_non_empty, CompanyInfo};

use super::ReportEncoder;

const STYLESHEET: &str = r#"
body { font-family: "Helvetica Neue", Arial, sans-serif; color: #1f2933; margin: 0; }
.page { padding: 48px; page-break-after: always; }
.page:last-of-type { page-break-after: auto; }
.cover { text-align: center; padding-top: 160px; }
.cover h1 { font-size: 36px; margin-bottom: 8px; }
.letterhead { margin-bottom: 96px; color: #52606d; }
h2 { border-bottom: 2px solid #d9e2ec; padding-bottom: 6px; }
table.fields td { padding: 4px 16px 4px 0; vertical-align: top; }
table.fields td.label { font-weight: 600; white-space: nowrap; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.grid figure { margin: 0; border: 1px solid #d9e2ec; padding: 8px; }
.grid img { width: 100%; height: 220px; object-fit: cover; }
.notes { white-space: pre-wrap; font-size: 13px; }
footer { font-size: 11px; color: #7b8794; margin-top: 24px; }
"#;

/// Renders a report as a single HTML page
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEncoder;

impl HtmlEncoder {
    pub fn render(&self, document: &ReportDocument) -> Markup {
        let generated = document.generated_at.format("%B %-d, %Y %H:%M UTC").to_string();

        let mut pages: Vec<Markup> = Vec::new();
        // Client and insurance details share one page
        let mut details: Vec<Markup> = Vec::new();

        for section in &document.sections {
            match section {
                Section::CoverPage {
                    title,
                    client_summary,
                    incident_date,
                    letterhead,
                } => pages.push(render_cover(title, client_summary, *incident_date, letterhead.as_ref())),
                Section::ClientInfo { fields } => {
                    details.push(render_fields("Client Information", fields));
                }
                Section::InsuranceInfo { fields } => {
                    details.push(render_fields("Insurance Details", fields));
                }
                Section::PhotoGrid { pages: grid, .. } => {
                    flush_details(&mut details, &mut pages);
                    for page in grid {
                        pages.push(render_grid_page(page, grid.len()));
                    }
                }
                Section::Notes { text } => {
                    flush_details(&mut details, &mut pages);
                    pages.push(html! {
                        section.page {
                            h2 { "Additional Notes" }
                            p.notes { (text) }
                        }
                    });
                }
            }
        }
        flush_details(&mut details, &mut pages);

        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (document.title) }
                    style { (PreEscaped(STYLESHEET)) }
                }
                body {
                    @for page in &pages {
                        (page)
                    }
                    footer {
                        (document.title) " | Generated " (generated) " | " (page_count(document)) " pages"
                    }
                }
            }
        }
    }
}

impl ReportEncoder for HtmlEncoder {
    fn encode(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError> {
        Ok(self.render(document).into_string().into_bytes())
    }

    fn media_type(&self) -> &'static str {
        "text/html"
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

fn flush_details(details: &mut Vec<Markup>, pages: &mut Vec<Markup>) {
    if details.is_empty() {
        return;
    }
    pages.push(html! {
        section.page {
            @for detail in details.iter() {
                (detail)
            }
        }
    });
    details.clear();
}

fn render_cover(
    title: &str,
    client_summary: &str,
    incident_date: Option<NaiveDate>,
    letterhead: Option<&CompanyInfo>,
) -> Markup {
    html! {
        section.page.cover {
            @if let Some(company) = letterhead {
                (render_letterhead(company))
            }
            h1 { (title) }
            p { (client_summary) }
            @if let Some(date) = incident_date {
                p { "Date of loss: " (format_date(date)) }
            }
        }
    }
}

fn render_letterhead(company: &CompanyInfo) -> Markup {
    let state_zip = join_non_empty(&[company.state.as_str(), company.zip_code.as_str()], " ");
    let address = join_non_empty(
        &[company.address.as_str(), company.city.as_str(), state_zip.as_str()],
        ", ",
    );
    let contact = join_non_empty(
        &[company.phone.as_str(), company.email.as_str(), company.website.as_str()],
        " | ",
    );

    html! {
        div.letterhead {
            strong { (company.name) }
            @if !address.is_empty() {
                br; (address)
            }
            @if !contact.is_empty() {
                br; (contact)
            }
            @if !company.license_number.trim().is_empty() {
                br; "License #" (company.license_number)
            }
        }
    }
}

fn render_fields(heading: &str, fields: &[Field]) -> Markup {
    html! {
        h2 { (heading) }
        table.fields {
            @for field in fields {
                tr {
                    td.label { (field.label) }
                    td { (field.value) }
                }
            }
        }
    }
}

fn render_grid_page(page: &PhotoPage, total: usize) -> Markup {
    html! {
        section.page {
            h2 { "Photo Documentation (" (page.number) " of " (total) ")" }
            div.grid {
                @for entry in &page.entries {
                    figure {
                        img src=(entry.asset_name()) alt=(entry.label());
                        figcaption {
                            strong { (entry.label()) }
                            @if let Some(notes) = &entry.notes {
                                p.notes { (notes) }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_document;

    #[test]
    fn test_renders_every_section() {
        let html = HtmlEncoder.render(&sample_document()).into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>John Doe - Damage Report</title>"));
        assert!(html.contains("Date of loss: March 1, 2024"));
        assert!(html.contains("Client Information"));
        assert!(html.contains("Insurance Details"));
        assert!(html.contains("CLM-42"));
        assert!(html.contains("Photo Documentation (1 of 1)"));
        assert!(html.contains(r#"src="photos/photo-001.jpg""#));
        assert!(html.contains(r#"src="photos/photo-002.jpg""#));
        assert!(html.contains("Tarp installed 3/2"));
    }

    #[test]
    fn test_details_share_one_page() {
        let html = HtmlEncoder.render(&sample_document()).into_string();
        // cover + details + one grid page + notes
        assert_eq!(html.matches(r#"<section class="page"#).count(), 4);
        assert!(html.contains("4 pages"));
    }

    #[test]
    fn test_notes_are_escaped() {
        let html = HtmlEncoder.render(&sample_document()).into_string();
        assert!(html.contains("Granule loss &lt;north slope&gt;"));
        assert!(!html.contains("<north slope>"));
    }
}
