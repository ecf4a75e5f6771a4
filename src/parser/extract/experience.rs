use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{first_match, select_text, TextStrategy};
use crate::parser::{element_text, selector, text_nodes};
use crate::text::clean;

static EXPERIENCE_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-qa="vacancy-serp__vacancy-work-experience"]"#));
static EXPERIENCE_CLASS: LazyLock<Selector> =
    LazyLock::new(|| selector(".vacancy-serp__vacancy-work-experience"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)опыт|лет").unwrap());
static EXPERIENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)без опыта|опыт от|от 1 года|от [2-6] лет|1\s*[-–—]\s*3 года|3\s*[-–—]\s*6 лет|более 6|no experience|\d+\+?\s*years?|junior|middle|senior",
    )
    .unwrap()
});

const STRATEGIES: &[TextStrategy] = &[by_experience_qa, by_tenure_span, by_experience_class, by_pattern];

fn by_experience_qa(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &EXPERIENCE_QA)
}

fn by_tenure_span(fragment: ElementRef<'_>) -> Option<String> {
    fragment
        .select(&SPAN)
        .map(element_text)
        .find(|text| SPAN_RE.is_match(text))
}

fn by_experience_class(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &EXPERIENCE_CLASS)
}

fn by_pattern(fragment: ElementRef<'_>) -> Option<String> {
    text_nodes(fragment)
        .map(|(_, text)| text)
        .find(|text| EXPERIENCE_RE.is_match(text))
        .map(clean)
}

/// Required-experience text as shown on the page, or empty.
pub fn extract(fragment: ElementRef) -> String {
    first_match(fragment, STRATEGIES).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn experience(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        extract(doc.root_element())
    }

    #[test]
    fn marked_element() {
        assert_eq!(
            experience(r#"<span data-qa="vacancy-serp__vacancy-work-experience">Опыт 1–3 года</span>"#),
            "Опыт 1–3 года"
        );
    }

    #[test]
    fn span_mentioning_tenure() {
        assert_eq!(
            experience("<div><span>ООО Ромашка</span><span>Опыт более 6 лет</span></div>"),
            "Опыт более 6 лет"
        );
    }

    #[test]
    fn free_text_patterns() {
        assert_eq!(experience("<div><p>Москва</p><p> Без опыта </p></div>"), "Без опыта");
        assert_eq!(experience("<div><p>At least 5+ years of Rust</p></div>"), "At least 5+ years of Rust");
        assert_eq!(experience("<div><b>Middle</b></div>"), "Middle");
    }

    #[test]
    fn missing() {
        assert_eq!(experience("<div><p>Москва</p></div>"), "");
    }
}
