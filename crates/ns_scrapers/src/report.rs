use std::fmt::Write;
use ns_core::{ParsedArticle, ScrapeResult, Source};
use crate::manager::RunReport;

pub const SUMMARY_MAX_LENGTH: usize = 200;

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn format_article(article: &ParsedArticle) -> String {
    let mut out = format!("[{}] {}\n    URL: {}", article.position(), article.headline(), article.url());
    if let Some(summary) = article.summary() {
        let _ = write!(out, "\n    Summary: {}", truncate(summary, SUMMARY_MAX_LENGTH));
    }
    if let Some(image_url) = article.image_url() {
        let _ = write!(out, "\n    Image: {}", image_url);
    }
    out
}

pub fn format_scrape_result(result: &ScrapeResult) -> String {
    let mut out = if result.articles.is_empty() {
        "No articles found".to_string()
    } else {
        format!("Found {} articles", result.articles.len())
    };
    for article in &result.articles {
        let _ = write!(out, "\n\n{}", format_article(article));
    }
    let _ = write!(
        out,
        "\n\nCreated: {}, Updated: {}, Skipped: {}",
        result.created_count, result.updated_count, result.skipped_count
    );
    out
}

pub fn format_run_report(report: &RunReport) -> String {
    let mut sections = Vec::with_capacity(report.reports.len());
    for entry in &report.reports {
        let body = match &entry.outcome {
            Ok(result) => format_scrape_result(result),
            Err(e) => format!("Error: {}", e.message()),
        };
        sections.push(format!("=== {} ===\n{}", entry.source_name, body));
    }
    sections.join("\n\n")
}

pub fn format_source(source: &Source) -> String {
    let status = if source.is_enabled { "enabled" } else { "disabled" };
    format!("{:<20} {:<9} {}", source.name, status, source.url)
}
