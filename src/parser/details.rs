use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{element_text, selector};

static SKILL: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-qa="skills-element"]"#));
static SKILL_TAG: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-qa="bloko-tag__text"]"#));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-qa="vacancy-description"]"#));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));

const DESCRIPTION_PARAGRAPHS: usize = 3;

#[derive(Debug, Default, PartialEq)]
pub struct VacancyDetails {
    pub key_skills: Vec<String>,
    pub description: String,
}

/// Key skills and a short description from a single vacancy page.
pub fn parse_details(html: &str) -> VacancyDetails {
    let doc = Html::parse_document(html);

    let mut key_skills = collect_texts(&doc, &SKILL);
    if key_skills.is_empty() {
        key_skills = collect_texts(&doc, &SKILL_TAG);
    }

    let description = doc
        .select(&DESCRIPTION)
        .next()
        .map(|d| {
            d.select(&PARAGRAPH)
                .map(element_text)
                .filter(|p| !p.is_empty())
                .take(DESCRIPTION_PARAGRAPHS)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    VacancyDetails { key_skills, description }
}

fn collect_texts(doc: &Html, sel: &Selector) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for text in doc.select(sel).map(element_text) {
        if !text.is_empty() && !out.contains(&text) {
            out.push(text);
        }
    }
    out
}
