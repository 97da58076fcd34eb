use std::collections::HashMap;

use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};

/// Field-name -> description lookup scraped from one help page per sheet.
pub type FieldDefinitions = HashMap<String, String>;

/// Fetches the field mappings table for a sheet. Every failure mode
/// (no URL, network error, timeout, unparseable markup) degrades to an
/// empty map; annotation is best-effort and must never sink an export.
pub async fn fetch_field_definitions(client: &Client, url: Option<&str>) -> FieldDefinitions {
    let Some(url) = url else {
        return FieldDefinitions::new();
    };

    match fetch_page(client, url).await {
        Ok(html) => parse_field_definitions(&html),
        Err(e) => {
            tracing::warn!("field mapping fetch failed for {url}: {e}");
            FieldDefinitions::new()
        }
    }
}

async fn fetch_page(client: &Client, url: &str) -> reqwest::Result<String> {
    client.get(url).send().await?.error_for_status()?.text().await
}

/// Walks every table row on the page; the first cell is the field name,
/// the second its description. Descriptions keep the line breaks the
/// source expressed as `<br>`, `<p>` or `<li>` boundaries, with each line
/// trimmed and empty lines dropped.
pub fn parse_field_definitions(html: &str) -> FieldDefinitions {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("tr").expect("valid selector");
    let cell_selector = Selector::parse("td, th").expect("valid selector");

    let mut defs = FieldDefinitions::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 2 {
            continue;
        }

        let field = normalize_whitespace(&cells[0].text().collect::<String>());
        if field.is_empty() {
            continue;
        }

        let mut raw = String::new();
        collect_text_with_breaks(cells[1], &mut raw);
        let description = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        defs.insert(field, description);
    }
    defs
}

/// Flattens an element to text, inserting a newline ahead of each
/// block-ish child so the break survives flattening.
fn collect_text_with_breaks(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if matches!(el.value().name(), "br" | "p" | "li") {
                out.push('\n');
            }
            collect_text_with_breaks(el, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parses_rows_into_definitions() {
        let html = r#"
            <table>
              <tr><th>Field</th><th>Description</th></tr>
              <tr><td>Account</td><td>The loan account number</td></tr>
              <tr><td> Borrower </td><td>  Primary borrower  </td></tr>
            </table>
        "#;
        let defs = parse_field_definitions(html);
        assert_eq!(defs["Field"], "Description");
        assert_eq!(defs["Account"], "The loan account number");
        assert_eq!(defs["Borrower"], "Primary borrower");
    }

    #[test]
    fn test_preserves_break_boundaries_as_newlines() {
        let html = r#"
            <table>
              <tr>
                <td>PaymentMethod</td>
                <td><p>How payments arrive.</p><ul><li>ACH</li><li>Check</li></ul></td>
              </tr>
              <tr>
                <td>Notes</td>
                <td>First line<br>second line</td>
              </tr>
            </table>
        "#;
        let defs = parse_field_definitions(html);
        assert_eq!(defs["PaymentMethod"], "How payments arrive.\nACH\nCheck");
        assert_eq!(defs["Notes"], "First line\nsecond line");
    }

    #[test]
    fn test_rows_without_two_cells_are_skipped() {
        let html = "<table><tr><td>OnlyOne</td></tr></table>";
        assert!(parse_field_definitions(html).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_url_yields_empty_map() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let defs =
            fetch_field_definitions(&client, Some("http://127.0.0.1:9/field-mappings")).await;
        assert!(defs.is_empty());
    }
}
