use stock_report::canvas::{DrawOp, RecordingBackend, RecordingPage};
use stock_report::metrics::StandardMetrics;
use stock_report::{
    CellValue, DocumentAssembler, DocumentMetadata, Progress, ReportKind, ReportLayout, ReportRow,
};
use time::{Date, Month};

fn metadata(kind: ReportKind) -> DocumentMetadata {
    DocumentMetadata {
        title: "Sharma Wholesale".into(),
        subtitle: "Godown 2".into(),
        customer_name: "Sharma Wholesale".into(),
        kind,
        from: Date::from_calendar_date(2024, Month::April, 1).unwrap(),
        to: Date::from_calendar_date(2024, Month::April, 30).unwrap(),
        unit: None,
        category: None,
    }
}

fn row(i: usize, description: &str, quantity: f64) -> ReportRow {
    let mut row = ReportRow::new();
    row.insert("date".into(), CellValue::from("2024-04-02"));
    row.insert("item_code".into(), CellValue::from(format!("IC{i:04}")));
    row.insert("order_no".into(), CellValue::from(format!("SO{i:04}")));
    row.insert("description".into(), CellValue::from(description));
    row.insert("unit".into(), CellValue::from("PCS"));
    row.insert("quantity".into(), CellValue::Number(quantity));
    row
}

fn render(rows: &[ReportRow], layout: &ReportLayout, kind: ReportKind) -> Vec<RecordingPage> {
    DocumentAssembler::default()
        .with_generated_at("02-05-2024 09:15")
        .render_with(
            RecordingBackend::default(),
            &StandardMetrics,
            rows,
            layout,
            &metadata(kind),
            &mut Progress::new(|_: u8, _: &str| {}),
        )
        .unwrap()
}

fn text_y(page: &RecordingPage, exact: &str) -> Option<f32> {
    match page.find_text(exact)? {
        DrawOp::Text { y, .. } => Some(*y),
        _ => None,
    }
}

/// Aggregate value drawn on the same baseline as the aggregate label.
fn aggregate_value(page: &RecordingPage, label: &str) -> Option<String> {
    let label_y = text_y(page, label)?;
    page.ops.iter().find_map(|op| match op {
        DrawOp::Text { text, y, .. } if *y == label_y && text != label => Some(text.clone()),
        _ => None,
    })
}

#[test]
fn five_rows_fit_on_one_page_with_total_and_footer() {
    let layout = ReportLayout::resolve(ReportKind::from_variant_a(true)).unwrap();
    assert_eq!(layout.columns.len(), 6);
    let rows: Vec<ReportRow> = (0..5).map(|i| row(i, "Steel bolts", 10.0)).collect();

    let pages = render(&rows, &layout, ReportKind::Inward);
    assert_eq!(pages.len(), 1);
    assert!(pages[0].find_text("Page 1 of 1").is_some());
    assert!(pages[0].find_text("Inward Report").is_some());
    assert_eq!(aggregate_value(&pages[0], "Total Quantity").as_deref(), Some("50"));
}

#[test]
fn large_report_paginates_and_totals_on_last_page_only() {
    let layout = ReportLayout::resolve(ReportKind::Outward).unwrap();
    let rows: Vec<ReportRow> = (0..120)
        .map(|i| row(i, "Cotton yarn 40s", (i % 9) as f64 + 0.5))
        .collect();
    let expected: f64 = rows.iter().map(|r| r["quantity"].as_number().unwrap()).sum();

    let budget = DocumentAssembler::default().plan(rows.len()).unwrap();
    let overflow = rows.len() - budget.rows_on_first_page;
    assert_eq!(
        budget.total_pages,
        1 + overflow.div_ceil(budget.rows_on_continuation_page)
    );

    let pages = render(&rows, &layout, ReportKind::Outward);
    assert_eq!(pages.len(), budget.total_pages);

    for (i, page) in pages.iter().enumerate() {
        let footer = format!("Page {} of {}", i + 1, pages.len());
        assert!(page.find_text(&footer).is_some(), "missing {footer}");
        if i == 0 {
            assert!(page.find_text("Sharma Wholesale").is_some());
        } else {
            assert!(page.find_text("Outward Report (Continued)").is_some());
        }
        if i + 1 < pages.len() {
            assert!(!page.contains_text("Total Quantity"), "page {i} has a total");
        }
    }

    let last = pages.last().unwrap();
    assert_eq!(
        aggregate_value(last, "Total Quantity"),
        Some(format!("{}", expected.round() as i64))
    );
    // the index column keeps counting across pages
    assert!(last.find_text("120").is_some());
}

#[test]
fn aggregate_matches_sum_for_any_page_count() {
    let layout = ReportLayout::resolve(ReportKind::Inward).unwrap();
    for n in [0usize, 1, 12, 13, 41, 77, 250] {
        let rows: Vec<ReportRow> = (0..n)
            .map(|i| row(i, "Item", 1000.0 + (i % 5) as f64 * 0.3))
            .collect();
        let expected: f64 = rows.iter().map(|r| r["quantity"].as_number().unwrap()).sum();

        let pages = render(&rows, &layout, ReportKind::Inward);
        let totals: Vec<_> = pages
            .iter()
            .filter(|p| p.contains_text("Total Quantity"))
            .collect();
        assert_eq!(totals.len(), 1, "n={n}");
        assert_eq!(
            aggregate_value(pages.last().unwrap(), "Total Quantity"),
            Some(format!("{}", expected.round() as i64)),
            "n={n}"
        );
    }
}

#[test]
fn digit_unit_tokens_break_in_a_narrow_column() {
    let mut layout = ReportLayout::resolve(ReportKind::Inward).unwrap();
    let desc = layout
        .columns
        .iter_mut()
        .find(|c| c.key == "description")
        .unwrap();
    desc.width = 30.0;

    let rows = vec![row(0, "10KG BOX", 1.0)];
    let pages = render(&rows, &layout, ReportKind::Inward);
    for token in ["10", "KG", "BOX"] {
        assert!(pages[0].find_text(token).is_some(), "missing {token}");
    }
    assert!(!pages[0].contains_text("10KG"));
}

#[test]
fn unencodable_glyphs_are_dropped_from_cells() {
    let layout = ReportLayout::resolve(ReportKind::Inward).unwrap();
    let rows = vec![row(0, "Rice \u{1F35A} bag \u{2014} 25 kg", 3.0)];
    let pages = render(&rows, &layout, ReportKind::Inward);

    assert!(pages[0].contains_text("Rice bag - 25 kg"));
    assert!(pages[0].texts().all(|t| t.chars().all(|c| (' '..='~').contains(&c))));
}

#[test]
fn missing_cells_render_placeholder() {
    let layout = ReportLayout::resolve(ReportKind::Outward).unwrap();
    let mut r = row(0, "Widget", 2.0);
    r.remove("order_no");
    r.insert("unit".into(), CellValue::Null);
    let pages = render(&[r], &layout, ReportKind::Outward);

    let placeholders = pages[0].texts().filter(|t| *t == "-").count();
    assert_eq!(placeholders, 2);
}
