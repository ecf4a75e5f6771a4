use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{element_text, selector};

static ITEM_CLASS: LazyLock<Selector> = LazyLock::new(|| selector("div.vacancy-serp-item"));
static ITEM_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[data-qa="vacancy-serp__vacancy"]"#));
static SERP_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.serp-item"));
static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[data-qa="vacancy-serp__vacancy-title"]"#));
static VACANCY_HREF: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/vacancy/"]"#));
static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));

const JOB_KEYWORDS: &[&str] = &["вакансия", "работа", "зарплата", "компания", "vacancy", "salary"];

pub type ContainerStrategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// Most specific first; the first strategy that finds anything wins.
pub const STRATEGIES: &[(&str, ContainerStrategy)] = &[
    ("item class", by_item_class),
    ("item data-qa", by_item_data_qa),
    ("serp-item class", by_serp_item_class),
    ("around title link", around_title_links),
    ("around vacancy link", around_vacancy_links),
    ("job keywords", mentioning_job_keywords),
];

pub fn locate(doc: &Html) -> Vec<ElementRef<'_>> {
    for (name, strategy) in STRATEGIES {
        let found = strategy(doc);
        if !found.is_empty() {
            debug!(strategy = *name, count = found.len(), "Located listing fragments");
            return found;
        }
    }
    debug!("No listing fragments on page");
    Vec::new()
}

fn by_item_class(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&ITEM_CLASS).collect()
}

fn by_item_data_qa(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&ITEM_QA).collect()
}

fn by_serp_item_class(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&SERP_ITEM).collect()
}

fn around_title_links(doc: &Html) -> Vec<ElementRef<'_>> {
    around(doc, &TITLE_LINK)
}

fn around_vacancy_links(doc: &Html) -> Vec<ElementRef<'_>> {
    around(doc, &VACANCY_HREF)
}

/// For every `marker` element, the outermost enclosing div that holds no
/// other `marker`. Each div is returned once, in document order.
fn around<'a>(doc: &'a Html, marker: &Selector) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    doc.select(marker)
        .filter_map(|link| {
            link.ancestors()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "div")
                .take_while(|div| div.select(marker).count() == 1)
                .last()
        })
        .filter(|div| seen.insert(div.id()))
        .collect()
}

/// Innermost divs whose text mentions a job keyword.
fn mentioning_job_keywords(doc: &Html) -> Vec<ElementRef<'_>> {
    let mentions = |div: &ElementRef| {
        let text = element_text(*div).to_lowercase();
        JOB_KEYWORDS.iter().any(|kw| text.contains(kw))
    };
    doc.select(&DIV)
        .filter(|div| mentions(div) && !div.select(&DIV).any(|inner| mentions(&inner)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(found: &[ElementRef]) -> Vec<String> {
        found.iter().map(|e| element_text(*e)).collect()
    }

    #[test]
    fn item_class_wins() {
        let doc = Html::parse_document(
            r#"<div class="vacancy-serp-item">A</div>
               <div data-qa="vacancy-serp__vacancy">B</div>
               <div class="vacancy-serp-item">C</div>"#,
        );
        assert_eq!(titles(&locate(&doc)), vec!["A", "C"]);
    }

    #[test]
    fn data_qa_then_serp_item() {
        let doc = Html::parse_document(
            r#"<div data-qa="vacancy-serp__vacancy">B</div><div class="serp-item">S</div>"#,
        );
        assert_eq!(titles(&locate(&doc)), vec!["B"]);

        let doc = Html::parse_document(r#"<div class="serp-item">S</div>"#);
        assert_eq!(titles(&locate(&doc)), vec!["S"]);
    }

    #[test]
    fn outermost_div_with_single_title_link() {
        let doc = Html::parse_document(
            r#"<div id="list">
                 <div class="card"><div class="head"><a data-qa="vacancy-serp__vacancy-title" href="/vacancy/1">One</a></div><span>Acme</span></div>
                 <div class="card"><div class="head"><a data-qa="vacancy-serp__vacancy-title" href="/vacancy/2">Two</a></div><span>Initech</span></div>
               </div>"#,
        );
        let found = locate(&doc);
        assert_eq!(titles(&found), vec!["One Acme", "Two Initech"]);
        assert!(found.iter().all(|e| e.value().classes().any(|c| c == "card")));
    }

    #[test]
    fn vacancy_href_fallback() {
        let doc = Html::parse_document(
            r#"<div><div class="x"><a href="/vacancy/7">Seven</a> Acme</div><div class="x"><a href="/vacancy/8">Eight</a> Initech</div></div>"#,
        );
        assert_eq!(titles(&locate(&doc)), vec!["Seven Acme", "Eight Initech"]);
    }

    #[test]
    fn keyword_fallback_takes_innermost() {
        let doc = Html::parse_document(
            r#"<div><div>Вакансия: курьер</div><div>Погода</div><div>Зарплата по итогам собеседования</div></div>"#,
        );
        assert_eq!(
            titles(&locate(&doc)),
            vec!["Вакансия: курьер", "Зарплата по итогам собеседования"]
        );
    }

    #[test]
    fn nothing_found() {
        let doc = Html::parse_document("<p>empty</p>");
        assert!(locate(&doc).is_empty());
    }
}
