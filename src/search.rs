//! Search against an indexer's torznab endpoint, plus result formatting

use std::cmp::Ordering;
use std::fmt;

use reqwest::Method;

use crate::backend::api::{check, read_json, BackendClient};
use crate::backend::error::{ConsoleError, Result};
use crate::backend::types::{Indexer, SearchResponse, SearchResult};

const SIZE_UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// Runs keyword searches through the backend's torznab proxy
#[derive(Debug, Clone)]
pub struct SearchClient {
    backend: BackendClient,
}

impl SearchClient {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub async fn search(&self, indexer: &Indexer, keywords: &str) -> Result<Vec<SearchResult>> {
        let api_key = self
            .backend
            .session()
            .token()
            .ok_or_else(|| ConsoleError::Auth("No session token".to_string()))?;
        let path = format!("/torznab/{}/api", indexer.id);

        let response = self
            .backend
            .request(Method::GET, &path)?
            .query(&[
                ("t", "search"),
                ("format", "json"),
                ("apikey", api_key.as_str()),
                ("q", keywords),
            ])
            .send()
            .await?;

        let reply: SearchResponse = read_json(check(response).await?).await?;
        let items = reply.items.unwrap_or_default();
        tracing::debug!("Search {:?} on {} returned {} results", keywords, indexer.id, items.len());
        Ok(items)
    }
}

/// Human readable size, e.g. 1572864 -> "1.50 MB"
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, SIZE_UNITS[unit])
}

/// Result title linking to its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    pub label: String,
    pub href: String,
}

impl fmt::Display for Hyperlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<a href=\"{}\">{}</a>", escape_html(&self.href), escape_html(&self.label))
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn title_link(result: &SearchResult) -> Hyperlink {
    Hyperlink {
        label: result.title.clone(),
        href: result.link.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Size,
    Category,
    Seeders,
    Peers,
    Site,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::Title,
        SortColumn::Size,
        SortColumn::Category,
        SortColumn::Seeders,
        SortColumn::Peers,
        SortColumn::Site,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::Title => "Title",
            SortColumn::Size => "Size",
            SortColumn::Category => "Category",
            SortColumn::Seeders => "Seeders",
            SortColumn::Peers => "Peers",
            SortColumn::Site => "Site",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Re-sort results for display. Stable, so ties keep backend order.
pub fn sort_results(results: &mut [SearchResult], column: SortColumn, order: SortOrder) {
    let compare = |a: &SearchResult, b: &SearchResult| -> Ordering {
        match column {
            SortColumn::Title => a.title.cmp(&b.title),
            SortColumn::Size => a.size.cmp(&b.size),
            SortColumn::Category => a.category.cmp(&b.category),
            SortColumn::Seeders => a.seeders.cmp(&b.seeders),
            SortColumn::Peers => a.peers.cmp(&b.peers),
            SortColumn::Site => a.site.cmp(&b.site),
        }
    };

    match order {
        SortOrder::Ascending => results.sort_by(compare),
        SortOrder::Descending => results.sort_by(|a, b| compare(b, a)),
    }
}
