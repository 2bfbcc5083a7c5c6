use crate::constants::{MIN_CELLS_PER_ROW, NO_DATA_MARKER};
use crate::error::{EtlError, Result};
use crate::types::{GdpDataset, GdpRecord};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.wikitable").expect("table selector should parse"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector should parse"));
static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("cell selector should parse"));
static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("anchor selector should parse"));

const COUNTRY_CELL: usize = 0;
const GDP_CELL: usize = 2;
const YEAR_CELL: usize = 3;

/// Where the year label sits inside its cell.
///
/// A year with a footnote link renders as `<td><a ..>..</a>2022</td>`, so the
/// label moves from the first child node to the second. This is tied to the
/// source markup: any other change in that cell breaks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearLayout {
    /// No link in the cell, the year is the first child node.
    PlainText,
    /// The cell holds a link, the year is the second child node.
    AfterLink,
}

impl YearLayout {
    pub fn detect(cell: ElementRef<'_>) -> Self {
        if cell.select(&ANCHOR).next().is_some() {
            YearLayout::AfterLink
        } else {
            YearLayout::PlainText
        }
    }

    fn child_position(self) -> usize {
        match self {
            YearLayout::PlainText => 0,
            YearLayout::AfterLink => 1,
        }
    }

    /// Reads the year label out of `cell` according to this layout.
    pub fn year_text(self, cell: ElementRef<'_>) -> Result<String> {
        let position = self.child_position();
        let text = direct_text_at(cell, position).ok_or_else(|| {
            EtlError::SchemaMismatch(format!(
                "year cell has no text node at position {} ({:?})",
                position, self
            ))
        })?;
        Ok(text.trim().to_string())
    }
}

/// Pulls every qualifying country row out of the first `wikitable` in `html`.
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn extract_records(html: &str) -> Result<GdpDataset> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next().ok_or_else(|| {
        EtlError::SchemaMismatch("no table with class \"wikitable\" in page".to_string())
    })?;

    let mut records = Vec::new();
    let mut scanned = 0usize;
    let mut short_rows = 0usize;
    let mut excluded = 0usize;

    for row in table.select(&ROW) {
        scanned += 1;
        let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
        if cells.len() < MIN_CELLS_PER_ROW {
            short_rows += 1;
            continue;
        }

        match parse_row(&cells)? {
            Some(record) => records.push(record),
            None => excluded += 1,
        }
    }

    info!(
        scanned,
        short_rows,
        excluded,
        included = records.len(),
        "Extracted GDP rows"
    );
    if records.is_empty() {
        warn!("No rows extracted - the page structure may have changed");
    }

    Ok(GdpDataset { records })
}

/// `Ok(None)` when the row fails an inclusion rule.
fn parse_row(cells: &[ElementRef<'_>]) -> Result<Option<GdpRecord>> {
    let Some(anchor) = cells[COUNTRY_CELL].select(&ANCHOR).next() else {
        debug!("Skipping row without a linked country");
        return Ok(None);
    };

    let gdp_cell = cells[GDP_CELL];
    if is_no_data(gdp_cell) {
        debug!("Skipping row with no GDP figure");
        return Ok(None);
    }

    let country = anchor
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .ok_or_else(|| EtlError::SchemaMismatch("country link has no text".to_string()))?
        .to_string();

    let gdp_millions = direct_text_at(gdp_cell, 0)
        .ok_or_else(|| {
            EtlError::SchemaMismatch(format!("GDP cell for {} does not start with text", country))
        })?
        .trim()
        .to_string();

    let year_cell = cells[YEAR_CELL];
    let year = YearLayout::detect(year_cell).year_text(year_cell)?;

    Ok(Some(GdpRecord {
        country,
        gdp_millions,
        year,
    }))
}

fn is_no_data(cell: ElementRef<'_>) -> bool {
    cell.children()
        .filter_map(|child| child.value().as_text())
        .any(|text| text.trim() == NO_DATA_MARKER)
}

/// Text of the `position`-th direct child, if that child is a text node.
fn direct_text_at(cell: ElementRef<'_>, position: usize) -> Option<&str> {
    cell.children()
        .nth(position)
        .and_then(|child| child.value().as_text())
        .map(|text| &**text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(fragment: &str) -> Html {
        Html::parse_fragment(&format!("<table><tr>{}</tr></table>", fragment))
    }

    fn first_cell(html: &Html) -> ElementRef<'_> {
        html.select(&CELL).next().expect("fixture has a td")
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="infobox"><tr><td>a</td><td>b</td><td>c</td><td>d</td></tr></table>
            <table class="wikitable sortable">
            <tr><th>Country</th><th>Region</th><th>Estimate</th><th>Year</th></tr>
            {}
            </table></body></html>"#,
            rows
        )
    }

    #[test]
    fn test_year_layout_plain_text() {
        let html = cell("<td>2023</td>");
        let td = first_cell(&html);
        assert_eq!(YearLayout::detect(td), YearLayout::PlainText);
        assert_eq!(YearLayout::PlainText.year_text(td).unwrap(), "2023");
    }

    #[test]
    fn test_year_layout_after_link() {
        let html = cell(r##"<td><a href="#cite_note-1">[n 1]</a>2022</td>"##);
        let td = first_cell(&html);
        assert_eq!(YearLayout::detect(td), YearLayout::AfterLink);
        assert_eq!(YearLayout::AfterLink.year_text(td).unwrap(), "2022");
    }

    #[test]
    fn test_year_layout_link_nested_in_wrapper() {
        let html = cell(r##"<td><sup><a href="#n">[1]</a></sup> 2021 </td>"##);
        let td = first_cell(&html);
        assert_eq!(YearLayout::detect(td), YearLayout::AfterLink);
        assert_eq!(YearLayout::detect(td).year_text(td).unwrap(), "2021");
    }

    #[test]
    fn test_year_layout_wrong_position_is_schema_mismatch() {
        let html = cell(r##"<td><a href="#n">[1]</a></td>"##);
        let td = first_cell(&html);
        let err = YearLayout::detect(td).year_text(td).unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatch(_)));

        // Applying the plain rule to a linked cell lands on the link element.
        let html = cell(r##"<td><a href="#n">[1]</a>2020</td>"##);
        let err = YearLayout::PlainText.year_text(first_cell(&html)).unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatch(_)));
    }

    #[test]
    fn test_extract_includes_linked_rows_in_order() {
        let html = page(
            r##"
            <tr><td><a href="/wiki/Alpha">Alpha</a></td><td>Europe</td><td>10,000</td><td>2020</td></tr>
            <tr><td><a href="/wiki/Gamma">Gamma</a></td><td>Asia</td><td>500</td><td><a href="#n">[n 1]</a>2021</td></tr>
            <tr><td><a href="/wiki/Delta">Delta</a></td><td>Africa</td><td>1,234.5</td><td>2019</td></tr>
            "##,
        );

        let dataset = extract_records(&html).unwrap();
        let countries: Vec<&str> = dataset.records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Alpha", "Gamma", "Delta"]);
        assert_eq!(
            dataset.records[1],
            GdpRecord {
                country: "Gamma".to_string(),
                gdp_millions: "500".to_string(),
                year: "2021".to_string(),
            }
        );
        assert_eq!(dataset.records[2].gdp_millions, "1,234.5");
    }

    #[test]
    fn test_extract_excludes_unlinked_and_no_data_rows() {
        let html = page(
            r##"
            <tr><td>World</td><td></td><td>105,000,000</td><td>2023</td></tr>
            <tr><td><a href="/wiki/Beta">Beta</a></td><td>Europe</td><td>—</td><td>2019</td></tr>
            <tr><td><a href="/wiki/Alpha">Alpha</a></td><td>Europe</td><td>10,000</td><td>2020</td></tr>
            <tr><td><a href="/wiki/Short">Short</a></td><td>2020</td></tr>
            "##,
        );

        let dataset = extract_records(&html).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].country, "Alpha");
    }

    #[test]
    fn test_extract_trims_cell_whitespace() {
        let html = page(
            "<tr><td><span>&nbsp;</span><a href=\"/wiki/Alpha\"> Alpha </a></td><td>x</td><td>10,000\n</td><td>\n2020\n</td></tr>",
        );

        let dataset = extract_records(&html).unwrap();
        assert_eq!(dataset.records[0].country, "Alpha");
        assert_eq!(dataset.records[0].gdp_millions, "10,000");
        assert_eq!(dataset.records[0].year, "2020");
    }

    #[test]
    fn test_extract_missing_table_is_schema_mismatch() {
        let html = "<html><body><table class=\"infobox\"><tr><td>x</td></tr></table></body></html>";
        let err = extract_records(html).unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatch(_)));
    }

    #[test]
    fn test_extract_empty_table_gives_empty_dataset() {
        let dataset = extract_records(&page("")).unwrap();
        assert!(dataset.is_empty());
    }
}
