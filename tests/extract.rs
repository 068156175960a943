use anyhow::Result;
use bwfcal::config::{ExtractConfig, FilterConfig};
use bwfcal::parser::{TournamentFilter, extract_tournaments};
use std::path::Path;

fn fixture_html() -> Result<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/calendar.html");
    Ok(std::fs::read_to_string(path)?)
}

fn extract_config() -> ExtractConfig {
    ExtractConfig {
        year: 2025,
        ..ExtractConfig::default()
    }
}

fn default_filter() -> TournamentFilter {
    TournamentFilter::new(&FilterConfig::default())
}

#[test]
fn extracts_retained_tournaments_in_document_order() -> Result<()> {
    let records = extract_tournaments(&fixture_html()?, &extract_config(), &default_filter())?;

    let names = records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "DAIHATSU Japan Open 2025",
            "VICTOR China Open 2025",
            "Macau Open 2025",
            "TotalEnergies BWF World Championships 2025",
            "Vietnam Open 2025",
            "HSBC BWF World Tour Finals 2025",
        ]
    );

    let japan = &records[0];
    assert_eq!(japan.country, "Japan");
    assert_eq!(japan.city, "Tokyo");
    assert_eq!(japan.raw_date_range, "15 - 20");
    assert_eq!(japan.month, "July");
    assert_eq!(japan.year, 2025);
    assert_eq!(japan.category, "HSBC BWF World Tour Super 750");
    assert_eq!(japan.prize_money.as_deref(), Some("USD 950,000"));
    assert_eq!(
        japan.source_link.as_deref(),
        Some("https://bwfworldtour.bwfbadminton.com/tournament/5227/daihatsu-japan-open-2025/")
    );

    Ok(())
}

#[test]
fn detail_row_is_not_borrowed_from_the_next_tournament() -> Result<()> {
    let records = extract_tournaments(&fixture_html()?, &extract_config(), &default_filter())?;
    let china = records
        .iter()
        .find(|r| r.name.contains("China Open"))
        .expect("china open must be extracted");

    assert_eq!(china.prize_money, None);
    assert_eq!(china.source_link, None);
    Ok(())
}

#[test]
fn name_falls_back_to_cell_text_and_relative_links_are_ignored() -> Result<()> {
    let records = extract_tournaments(&fixture_html()?, &extract_config(), &default_filter())?;
    let macau = records
        .iter()
        .find(|r| r.country == "Macau")
        .expect("macau open must be extracted");

    assert_eq!(macau.name, "Macau Open 2025");
    assert_eq!(macau.raw_date_range, "28 Jul - 3 Aug");
    assert_eq!(macau.prize_money.as_deref(), Some("USD 240,000"));
    assert_eq!(macau.source_link, None);
    Ok(())
}

#[test]
fn sections_without_heading_and_short_rows_are_skipped() -> Result<()> {
    let records = extract_tournaments(&fixture_html()?, &extract_config(), &default_filter())?;

    assert!(records.iter().all(|r| r.name != "Ghost Open"));
    assert!(records.iter().all(|r| !r.name.contains("To be announced")));
    Ok(())
}

#[test]
fn missing_container_yields_no_records() -> Result<()> {
    let pages = [
        "",
        "<html><body><p>Maintenance</p></body></html>",
        r#"<div id="calendar"><div class="item-results"><h2>May</h2></div></div>"#,
    ];

    for page in pages {
        let records = extract_tournaments(page, &extract_config(), &default_filter())?;
        assert!(records.is_empty(), "expected no records for {page:?}");
    }
    Ok(())
}

#[test]
fn filter_matches_tier_or_marquee_keywords() {
    let filter = default_filter();

    assert!(filter.retains("Japan Open", "HSBC BWF WORLD TOUR SUPER 1000"));
    assert!(filter.retains("Japan Open", "super 300"));
    assert!(filter.retains("TotalEnergies BWF SUDIRMAN CUP Finals", "BWF Major Events"));
    assert!(filter.retains("BWF World Championships", "BWF Major Events"));
    assert!(filter.retains("HSBC BWF World Tour Finals", "Finals"));
    assert!(!filter.retains("Malaysia Masters", "BWF TOUR"));
    assert!(!filter.retains("Thomas & Uber Cup", "BWF Major Events"));
}

#[test]
fn filter_uses_configured_keywords() {
    let filter = TournamentFilter::new(&FilterConfig {
        tier_keyword: "International Challenge".to_string(),
        marquee_keywords: vec!["thomas".to_string(), "  ".to_string()],
    });

    assert!(filter.retains("Indonesia IC", "BWF International Challenge"));
    assert!(filter.retains("Thomas & Uber Cup Finals", "BWF Major Events"));
    assert!(!filter.retains("Japan Open", "Super 750"));
    assert!(!filter.retains("Anything", "BWF Major Events"));
}

#[test]
fn empty_tier_keyword_does_not_match_everything() {
    let filter = TournamentFilter::new(&FilterConfig {
        tier_keyword: String::new(),
        marquee_keywords: Vec::new(),
    });

    assert!(!filter.retains("Japan Open", "Super 750"));
}

#[test]
fn custom_row_prefix_and_detail_class_are_honoured() -> Result<()> {
    let html = r#"
        <div id="cal">
          <section class="month"><h3>March</h3>
            <table class="list">
              <tr class="row-odd">
                <td></td><td>England</td><td>11 - 16</td><td>All England Open</td>
                <td></td><td>Super 1000</td><td>Birmingham</td>
              </tr>
              <tr class="extra"><td><span class="prize">Prize money: USD 1,450,000</span></td></tr>
            </table>
          </section>
        </div>"#;

    let config = ExtractConfig {
        year: 2026,
        container_selector: "#cal".to_string(),
        month_selector: "section.month".to_string(),
        heading_selector: "h3".to_string(),
        table_selector: "table.list".to_string(),
        row_class_prefix: "row-".to_string(),
        detail_row_class: "extra".to_string(),
        prize_selector: ".prize".to_string(),
        prize_prefix: "PRIZE MONEY".to_string(),
        ..ExtractConfig::default()
    };

    let records = extract_tournaments(html, &config, &default_filter())?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "All England Open");
    assert_eq!(records[0].month, "March");
    assert_eq!(records[0].year, 2026);
    assert_eq!(records[0].prize_money.as_deref(), Some("USD 1,450,000"));
    Ok(())
}

#[test]
fn low_column_minimum_still_skips_rows_missing_indexed_cells() -> Result<()> {
    let html = r#"
        <div id="ajaxCalender">
          <div class="item-results">
            <h2>May</h2>
            <table class="tblResultLanding">
              <tr class="bg-a">
                <td></td><td>Thailand</td><td>13 - 18</td><td>Thailand Open</td>
              </tr>
              <tr class="bg-b">
                <td></td><td>Malaysia</td><td>20 - 25</td><td>Malaysia Masters</td>
                <td></td><td>HSBC BWF World Tour Super 500</td><td>Kuala Lumpur</td>
              </tr>
            </table>
          </div>
        </div>"#;

    let config = ExtractConfig {
        year: 2025,
        min_columns: 3,
        ..ExtractConfig::default()
    };

    let records = extract_tournaments(html, &config, &default_filter())?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Malaysia Masters");
    assert_eq!(records[0].city, "Kuala Lumpur");
    Ok(())
}
