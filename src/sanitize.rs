//! Text normalization into the renderable character set.
//!
//! Everything that reaches the measurer or the page passes through [`sanitize`]
//! first. The output is guaranteed to be printable ASCII (`0x20..=0x7E`).

use unicode_normalization::UnicodeNormalization;

use crate::config::ReportLabels;
use crate::model::{CellValue, ColumnSpec, DocumentMetadata, ReportLayout, ReportRow};

fn map_special(ch: char) -> Option<char> {
    match ch {
        // spaces, zero-width marks, and control whitespace
        '\t' | '\n' | '\r' | '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200D}' | '\u{2028}'
        | '\u{2029}' | '\u{202F}' | '\u{205F}' | '\u{2060}' | '\u{3000}' | '\u{FEFF}' => Some(' '),
        // dashes and minus signs
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => Some('-'),
        // curly / angled quotes and primes
        '\u{2018}'..='\u{201F}' | '\u{2032}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' | '\u{2039}'
        | '\u{203A}' => Some('"'),
        // bullets
        '\u{2022}' | '\u{2023}' | '\u{2043}' | '\u{2219}' | '\u{25E6}' | '\u{00B7}' => Some('*'),
        _ => None,
    }
}

fn is_printable_ascii(ch: char) -> bool {
    (' '..='~').contains(&ch)
}

/// Map arbitrary input onto printable ASCII.
///
/// Pure and total. Known typographic characters get ASCII stand-ins; any other
/// non-ASCII code point is canonically decomposed and whatever is still
/// non-ASCII after decomposition is dropped.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if is_printable_ascii(ch) {
            out.push(ch);
            continue;
        }
        if let Some(mapped) = map_special(ch) {
            out.push(mapped);
            continue;
        }
        if ch.is_ascii() {
            // remaining ASCII controls
            continue;
        }
        let mut buf = [0u8; 4];
        for decomposed in ch.encode_utf8(&mut buf).nfd() {
            if is_printable_ascii(decomposed) {
                out.push(decomposed);
            }
        }
    }
    out
}

/// Sanitize every string-valued field of a row. Numbers pass through.
pub fn sanitize_row(row: &ReportRow) -> ReportRow {
    row.iter()
        .map(|(key, value)| {
            let value = match value {
                CellValue::Text(s) => CellValue::Text(sanitize(s)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Sanitize every string field of the document metadata.
pub fn sanitize_metadata(meta: &DocumentMetadata) -> DocumentMetadata {
    DocumentMetadata {
        title: sanitize(&meta.title),
        subtitle: sanitize(&meta.subtitle),
        customer_name: sanitize(&meta.customer_name),
        kind: meta.kind,
        from: meta.from,
        to: meta.to,
        unit: meta.unit.as_deref().map(sanitize),
        category: meta.category.as_deref().map(sanitize),
    }
}

/// Sanitize the caller-visible strings of a layout: titles and fixed labels.
pub fn sanitize_layout(layout: &ReportLayout) -> ReportLayout {
    let labels = &layout.labels;
    ReportLayout {
        kind: layout.kind,
        title: sanitize(&layout.title),
        columns: layout
            .columns
            .iter()
            .map(|c| ColumnSpec {
                title: sanitize(&c.title),
                ..c.clone()
            })
            .collect(),
        index_key: layout.index_key.clone(),
        quantity_key: layout.quantity_key.clone(),
        aggregate_label: sanitize(&layout.aggregate_label),
        labels: ReportLabels {
            continued_suffix: sanitize(&labels.continued_suffix),
            generated_on: sanitize(&labels.generated_on),
            page_of: sanitize(&labels.page_of),
            from: sanitize(&labels.from),
            to: sanitize(&labels.to),
            unit: sanitize(&labels.unit),
            category: sanitize(&labels.category),
        },
    }
}
