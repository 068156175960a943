use crate::config::{ExtractConfig, FilterConfig};
use crate::dom::{
    child_cells, descendants_with_class_prefix, find_first, find_within, has_class_prefix,
    next_sibling_with_class, parse_selector, text_of,
};
use crate::error::{SyncError, SyncResult};
use crate::model::TournamentRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

const COUNTRY_COLUMN: usize = 1;
const DATES_COLUMN: usize = 2;
const NAME_COLUMN: usize = 3;
const CATEGORY_COLUMN: usize = 5;
const CITY_COLUMN: usize = 6;

/// Keeps top-tier tournaments plus a handful of flagship events whose
/// category label does not carry the tier keyword.
#[derive(Debug, Clone)]
pub struct TournamentFilter {
    tier_keyword: String,
    marquee_keywords: Vec<String>,
}

impl TournamentFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            tier_keyword: config.tier_keyword.trim().to_lowercase(),
            marquee_keywords: config
                .marquee_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn retains(&self, name: &str, category: &str) -> bool {
        let category = category.to_lowercase();
        if !self.tier_keyword.is_empty() && category.contains(&self.tier_keyword) {
            return true;
        }

        let name = name.to_lowercase();
        self.marquee_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }
}

struct CalendarSelectors {
    container: Selector,
    month: Selector,
    heading: Selector,
    table: Selector,
    name_link: Selector,
    prize: Selector,
    anchor: Selector,
}

impl CalendarSelectors {
    fn compile(config: &ExtractConfig) -> SyncResult<Self> {
        let parse = |css: &str| parse_selector(css).map_err(SyncError::Extraction);
        Ok(Self {
            container: parse(&config.container_selector)?,
            month: parse(&config.month_selector)?,
            heading: parse(&config.heading_selector)?,
            table: parse(&config.table_selector)?,
            name_link: parse(&config.name_link_selector)?,
            prize: parse(&config.prize_selector)?,
            anchor: parse("a[href]")?,
        })
    }
}

/// Parses the calendar page into retained tournament records, in document
/// order. A page without the calendar container yields no records.
pub fn extract_tournaments(
    html: &str,
    config: &ExtractConfig,
    filter: &TournamentFilter,
) -> SyncResult<Vec<TournamentRecord>> {
    let selectors = CalendarSelectors::compile(config)?;
    let doc = Html::parse_document(html);

    let Some(container) = find_first(&doc, &selectors.container) else {
        warn!(
            selector = %config.container_selector,
            "calendar container not found; page structure may have changed"
        );
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    let mut rows_seen = 0usize;

    for section in container.select(&selectors.month) {
        let Some(heading) = find_within(section, &selectors.heading) else {
            debug!("month section without heading; skipping");
            continue;
        };
        let month = text_of(heading);
        if month.is_empty() {
            debug!("month section with empty heading; skipping");
            continue;
        }

        for table in section.select(&selectors.table) {
            for row in descendants_with_class_prefix(table, "tr", &config.row_class_prefix) {
                rows_seen += 1;
                let Some(record) = extract_row(row, &month, config, &selectors) else {
                    continue;
                };

                if filter.retains(&record.name, &record.category) {
                    records.push(record);
                } else {
                    debug!(
                        tournament = %record.name,
                        category = %record.category,
                        "tournament filtered out"
                    );
                }
            }
        }
    }

    info!(
        rows = rows_seen,
        matched = records.len(),
        "tournament extraction complete"
    );

    Ok(records)
}

fn extract_row(
    row: ElementRef<'_>,
    month: &str,
    config: &ExtractConfig,
    selectors: &CalendarSelectors,
) -> Option<TournamentRecord> {
    let cells = child_cells(row);
    // Every indexed column must exist, whatever the configured minimum.
    let min_columns = config.min_columns.max(CITY_COLUMN + 1);
    if cells.len() < min_columns {
        debug!(columns = cells.len(), month, "skipping short tournament row");
        return None;
    }

    let name_cell = cells[NAME_COLUMN];
    let name = find_within(name_cell, &selectors.name_link)
        .map(text_of)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| text_of(name_cell));
    if name.is_empty() {
        debug!(month, "skipping tournament row without a name");
        return None;
    }

    let detail = next_sibling_with_class(row, &config.detail_row_class, |sibling| {
        has_class_prefix(sibling, &config.row_class_prefix)
    });

    let prize_money = detail
        .and_then(|d| find_within(d, &selectors.prize))
        .map(|badge| strip_label(&text_of(badge), &config.prize_prefix))
        .filter(|prize| !prize.is_empty());

    let source_link = detail.and_then(|d| {
        d.select(&selectors.anchor)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| is_absolute_http(href))
            .map(ToString::to_string)
    });

    Some(TournamentRecord {
        name,
        raw_date_range: text_of(cells[DATES_COLUMN]),
        month: month.to_string(),
        year: config.year,
        country: text_of(cells[COUNTRY_COLUMN]),
        city: text_of(cells[CITY_COLUMN]),
        category: text_of(cells[CATEGORY_COLUMN]),
        prize_money,
        source_link,
    })
}

fn strip_label(text: &str, label: &str) -> String {
    let text = text.trim();
    if label.is_empty() {
        return text.to_string();
    }

    match text.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => text[label.len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim()
            .to_string(),
        _ => text.replace(label, "").trim().to_string(),
    }
}

fn is_absolute_http(href: &str) -> bool {
    Url::parse(href).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
