use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{first_match, select_text, TextStrategy};
use crate::parser::{element_text, selector, text_nodes};
use crate::salary::{parse_salary, Salary};
use crate::text::clean;

static COMPENSATION_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-qa="vacancy-serp__vacancy-compensation"]"#));
static COMPENSATION_CLASS: LazyLock<Selector> =
    LazyLock::new(|| selector(".vacancy-serp__vacancy-compensation"));
static COMPENSATION_TEXT: LazyLock<Selector> = LazyLock::new(|| selector(".compensation-text"));

const CURRENCY_MARKERS: &[&str] = &["руб", "₽", "$", "€", "usd", "eur"];
const RUBLE_MARKERS: &[&str] = &["руб", "₽"];
/// Words that mean a number is a duration, not money.
const EXPERIENCE_WORDS: &[&str] = &["опыт", "год", "лет", "месяц", "стаж", "junior", "middle", "senior"];
const SHORT_RUBLE_TEXT: usize = 50;

const NUM: &str = r"[0-9](?:[0-9\s]*[0-9])?";
const CUR: &str = r"(?:руб|₽|\$|€|usd|eur)";

/// Tried in order over the whole fragment text; the first hit is parsed.
static SALARY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\b(?:от|from)\s*{NUM}\s*(?:до|to|-|–|—)\s*{NUM}\s*{CUR}"),
        format!(r"(?i)\b(?:от|from)\s*{NUM}\s*{CUR}"),
        format!(r"(?i)\b(?:до|up to)\s*{NUM}\s*{CUR}"),
        format!(r"(?i){NUM}\s*[-–—]\s*{NUM}\s*{CUR}"),
        format!(r"(?i){NUM}\s*{CUR}"),
        format!(r"(?i)(?:зарплата|доход|оплата|salary)\D{{0,40}}?{NUM}"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const STRATEGIES: &[TextStrategy] = &[
    by_compensation_qa,
    by_compensation_class,
    by_compensation_text,
    by_money_text_node,
    by_short_ruble_text_node,
];

fn by_compensation_qa(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &COMPENSATION_QA)
}

fn by_compensation_class(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &COMPENSATION_CLASS)
}

fn by_compensation_text(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &COMPENSATION_TEXT)
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// A text node with a figure and a currency, and nothing that reads like tenure.
fn by_money_text_node(fragment: ElementRef<'_>) -> Option<String> {
    text_nodes(fragment)
        .map(|(_, text)| text)
        .find(|text| {
            let lower = text.to_lowercase();
            has_digit(&lower)
                && CURRENCY_MARKERS.iter().any(|m| lower.contains(m))
                && !EXPERIENCE_WORDS.iter().any(|w| lower.contains(w))
        })
        .map(clean)
}

fn by_short_ruble_text_node(fragment: ElementRef<'_>) -> Option<String> {
    text_nodes(fragment)
        .map(|(_, text)| clean(text))
        .find(|text| {
            let lower = text.to_lowercase();
            has_digit(&lower)
                && RUBLE_MARKERS.iter().any(|m| lower.contains(m))
                && text.chars().count() < SHORT_RUBLE_TEXT
        })
}

fn by_pattern(text: &str) -> Option<&str> {
    SALARY_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str())
}

pub fn extract(fragment: ElementRef) -> Salary {
    if let Some(text) = first_match(fragment, STRATEGIES) {
        return parse_salary(&text);
    }
    by_pattern(&element_text(fragment))
        .map(parse_salary)
        .unwrap_or_default()
}
