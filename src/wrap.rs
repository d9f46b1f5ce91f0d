//! Greedy word wrapping against a width budget.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::metrics::{FontWeight, TextMeasurer};

const UNITS: &str = "KGS|KG|GMS|GM|G|MG|LTRS|LTR|L|ML|PCS|PC|NOS|BOXES|BOX|BAGS|BAG|MTRS|MTR|M|CM|MM|DOZ|PKTS|PKT|SETS|SET|TONS|TON|QTL|UNITS";

static WORD_BEFORE_QUANTITY: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static QUANTITY_BEFORE_UNIT: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Break `10KG` into `10 KG ` and `SUGAR10KG` into `SUGAR 10 KG ` so item
/// descriptions don't produce long unbreakable tokens.
pub fn split_units(text: &str) -> String {
    let word_before = WORD_BEFORE_QUANTITY.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b([A-Z]+)(\d+(?:\.\d+)?(?:{UNITS})\b)"))
    });
    let quantity_before = QUANTITY_BEFORE_UNIT
        .get_or_init(|| Regex::new(&format!(r"(?i)(\d+(?:\.\d+)?)({UNITS})\b")));

    let (Ok(word_before), Ok(quantity_before)) = (word_before, quantity_before) else {
        return text.to_string();
    };

    let spaced = word_before.replace_all(text, "${1} ${2}");
    quantity_before.replace_all(&spaced, "${1} ${2} ").into_owned()
}

/// Lines of one wrapped cell, produced on demand.
///
/// Every line fits the budget except a single token that is wider than the
/// budget on its own; that token becomes its own line. Tokens the font cannot
/// encode are dropped with a warning.
pub struct Wrap<'m, M: ?Sized> {
    measurer: &'m M,
    words: std::vec::IntoIter<String>,
    current: String,
    budget: f32,
    font_size: f32,
    weight: FontWeight,
}

/// Wrap `text` into lines no wider than `width_budget` points.
pub fn wrap<'m, M: TextMeasurer + ?Sized>(
    measurer: &'m M,
    text: &str,
    width_budget: f32,
    font_size: f32,
    weight: FontWeight,
) -> Wrap<'m, M> {
    let words: Vec<String> = split_units(text)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Wrap {
        measurer,
        words: words.into_iter(),
        current: String::new(),
        budget: width_budget,
        font_size,
        weight,
    }
}

impl<M: TextMeasurer + ?Sized> Wrap<'_, M> {
    fn measurable(&self, word: &str) -> bool {
        match self.measurer.width_of(word, self.font_size, self.weight) {
            Ok(_) => true,
            Err(e) => {
                warn!(token = word, error = %e, "dropping unmeasurable token");
                false
            }
        }
    }
}

impl<M: TextMeasurer + ?Sized> Iterator for Wrap<'_, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(word) = self.words.next() {
            if self.current.is_empty() {
                if self.measurable(&word) {
                    self.current = word;
                }
                continue;
            }

            let candidate = format!("{} {}", self.current, word);
            match self.measurer.width_of(&candidate, self.font_size, self.weight) {
                Ok(w) if w <= self.budget => self.current = candidate,
                Ok(_) => {
                    let line = std::mem::take(&mut self.current);
                    if self.measurable(&word) {
                        self.current = word;
                    }
                    return Some(line);
                }
                // current line measured fine before, so the new word is the culprit
                Err(e) => warn!(token = %word, error = %e, "dropping unmeasurable token"),
            }
        }

        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}

pub fn line_height(font_size: f32) -> f32 {
    font_size * 1.2
}

/// Baselines for `line_count` lines centered as a block on `anchor_y`
/// (PDF coordinates, y grows upward).
pub fn block_baselines(line_count: usize, anchor_y: f32, font_size: f32) -> Vec<f32> {
    let lh = line_height(font_size);
    let top = anchor_y + line_count as f32 * lh / 2.0;
    (0..line_count)
        .map(|i| top - (i as f32 + 0.5) * lh - font_size * 0.35)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StandardMetrics;

    fn lines(text: &str, budget: f32) -> Vec<String> {
        wrap(&StandardMetrics, text, budget, 9.0, FontWeight::Regular).collect()
    }

    #[test]
    fn unit_prepass_separates_quantities() {
        assert_eq!(split_units("10KG BOX"), "10 KG  BOX");
        assert_eq!(split_units("SUGAR10KG"), "SUGAR 10 KG ");
        assert_eq!(split_units("oil 2.5ltr"), "oil 2.5 ltr ");
        // not a unit
        assert_eq!(split_units("A4 paper"), "A4 paper");
        assert_eq!(split_units("10KGX"), "10KGX");
    }

    #[test]
    fn narrow_column_breaks_on_unit_boundaries() {
        let budget = StandardMetrics
            .width_of("BOX", 9.0, FontWeight::Regular)
            .unwrap()
            + 0.2;
        assert_eq!(lines("10KG BOX", budget), vec!["10", "KG", "BOX"]);
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        assert!(lines("", 100.0).is_empty());
        assert!(lines("   \t ", 100.0).is_empty());
    }

    #[test]
    fn every_multi_word_line_fits() {
        let text = "Premium basmati rice long grain aged two years packed in \
                    jute bags for wholesale distribution SUPERCALIFRAGILISTIC";
        for budget in [20.0, 45.0, 80.0, 150.0] {
            for line in lines(text, budget) {
                let w = StandardMetrics.width_of(&line, 9.0, FontWeight::Regular).unwrap();
                assert!(w <= budget || !line.contains(' '), "{line:?} {w} > {budget}");
            }
        }
    }

    #[test]
    fn oversized_token_gets_its_own_line() {
        let out = lines("a SUPERCALIFRAGILISTIC b", 20.0);
        assert_eq!(out, vec!["a", "SUPERCALIFRAGILISTIC", "b"]);
    }

    #[test]
    fn unencodable_tokens_are_dropped_not_fatal() {
        assert_eq!(lines("Rice 🍚 bag", 500.0), vec!["Rice bag"]);
        assert_eq!(lines("🍚 first", 500.0), vec!["first"]);
        assert_eq!(lines("only 🍚", 500.0), vec!["only"]);
    }

    #[test]
    fn preserves_all_words_in_order() {
        let text = "one two three four five six seven";
        assert_eq!(lines(text, 40.0).join(" "), text);
    }

    #[test]
    fn baselines_are_centered_on_anchor() {
        let single = block_baselines(1, 100.0, 10.0);
        assert_eq!(single.len(), 1);
        assert!((single[0] - 96.5).abs() < 1e-4);

        let three = block_baselines(3, 100.0, 10.0);
        assert!((three[0] - three[1] - 12.0).abs() < 1e-4);
        // middle line sits where a single line would
        assert!((three[1] - single[0]).abs() < 1e-4);
    }
}
