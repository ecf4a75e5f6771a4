use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{first_match, select_text, TextStrategy};
use crate::parser::selector;

static EMPLOYER_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[data-qa="vacancy-serp__vacancy-employer"]"#));
static META_COMPANY: LazyLock<Selector> =
    LazyLock::new(|| selector("div.vacancy-serp-item__meta-info-company"));
static ANY_COMPANY_CLASS: LazyLock<Selector> = LazyLock::new(|| selector(r#"[class*="company"]"#));

/// Map/list toggles that sometimes sit where the employer name should be.
const NOT_A_COMPANY: &[&str] = &["карта", "список", "показать", "подробнее"];

const STRATEGIES: &[TextStrategy] = &[by_employer_link, by_meta_info, by_company_class];

fn by_employer_link(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &EMPLOYER_QA)
}

fn by_meta_info(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &META_COMPANY)
}

fn by_company_class(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &ANY_COMPANY_CLASS)
}

/// Employer name, or an empty string when none is found.
pub fn extract(fragment: ElementRef) -> String {
    let Some(name) = first_match(fragment, STRATEGIES) else {
        return String::new();
    };
    let lower = name.to_lowercase();
    if NOT_A_COMPANY.iter().any(|w| lower.contains(w)) {
        return String::new();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn company(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        extract(doc.root_element())
    }

    #[test]
    fn employer_link_first() {
        assert_eq!(
            company(
                r#"<span class="company-name">Wrong</span><a data-qa="vacancy-serp__vacancy-employer" href="/employer/1"> ООО  Ромашка </a>"#
            ),
            "ООО Ромашка"
        );
    }

    #[test]
    fn meta_info_then_class_substring() {
        assert_eq!(
            company(r#"<div class="vacancy-serp-item__meta-info-company">Globex</div>"#),
            "Globex"
        );
        assert_eq!(company(r#"<span class="card-company-name">Initech</span>"#), "Initech");
    }

    #[test]
    fn empty_match_falls_through() {
        assert_eq!(
            company(
                r#"<a data-qa="vacancy-serp__vacancy-employer"></a><span class="company">Hooli</span>"#
            ),
            "Hooli"
        );
    }

    #[test]
    fn page_controls_are_not_companies() {
        assert_eq!(company(r#"<span class="company-map">Показать на карте</span>"#), "");
        assert_eq!(company("<p>nothing</p>"), "");
    }
}
