use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use url::Url;

use crate::parser::{element_text, selector};

static TITLE_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[data-qa="vacancy-serp__vacancy-title"]"#));
static BLOKO_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.bloko-link"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

pub const MIN_TITLE_CHARS: usize = 10;
pub const MAX_TITLE_CHARS: usize = 200;
const MIN_TOKENS_WITHOUT_JOB_WORD: usize = 3;

/// Link texts that belong to the results page itself, not to a listing.
const CHROME_PHRASES: &[&str] = &[
    "на карте", "подробнее", "показать", "скрыть", "карта", "список",
    "результат", "фильтр", "сортировка", "страница", "следующая",
    "предыдущая", "обновить", "очистить", "сохранить", "поделиться",
    "похожие", "сбросить", "применить", "найти", "расширенный поиск",
    "новые", "сначала", "по зарплате", "по дате", "по релевантности",
    "show more", "show on map", "filter", "sort by", "next page", "previous page",
];

const JOB_WORDS: &[&str] = &[
    "вакансия", "работа", "требуется", "ищем", "приглашаем",
    "разработчик", "аналитик", "менеджер", "специалист", "инженер",
    "программист", "дизайнер", "маркетолог", "консультант", "администратор",
    "developer", "engineer", "manager", "analyst", "designer", "programmer",
];

pub type LinkStrategy = for<'a> fn(ElementRef<'a>) -> Option<ElementRef<'a>>;

/// Most specific marker first, any hyperlink last.
pub const STRATEGIES: &[LinkStrategy] = &[by_data_qa, by_bloko_link, by_any_link];

fn first_with_href<'a>(fragment: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    fragment
        .select(sel)
        .find(|a| a.value().attr("href").is_some_and(|h| !h.trim().is_empty()))
}

fn by_data_qa(fragment: ElementRef<'_>) -> Option<ElementRef<'_>> {
    first_with_href(fragment, &TITLE_QA)
}

fn by_bloko_link(fragment: ElementRef<'_>) -> Option<ElementRef<'_>> {
    first_with_href(fragment, &BLOKO_LINK)
}

fn by_any_link(fragment: ElementRef<'_>) -> Option<ElementRef<'_>> {
    first_with_href(fragment, &ANY_LINK)
}

#[derive(Debug, PartialEq)]
pub struct TitleLink {
    pub title: String,
    pub link: String,
}

pub fn extract(fragment: ElementRef, base: &Url) -> Option<TitleLink> {
    let anchor = STRATEGIES.iter().find_map(|strategy| strategy(fragment))?;
    let link = resolve_link(base, anchor.value().attr("href")?)?;
    Some(TitleLink { title: element_text(anchor), link })
}

/// Absolute http(s) URL with query and fragment removed.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

#[derive(Debug, PartialEq)]
pub enum Rejection {
    Length(usize),
    Chrome(&'static str),
    NotJobLike,
}

/// Why `title` cannot be a listing title, if it cannot.
pub fn rejection(title: &str) -> Option<Rejection> {
    let title = title.trim();
    let chars = title.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&chars) {
        return Some(Rejection::Length(chars));
    }

    let lower = title.to_lowercase();
    if let Some(phrase) = CHROME_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(Rejection::Chrome(*phrase));
    }

    let job_like = JOB_WORDS.iter().any(|w| lower.contains(w));
    if !job_like && title.split_whitespace().count() < MIN_TOKENS_WITHOUT_JOB_WORD {
        return Some(Rejection::NotJobLike);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn base() -> Url {
        Url::parse("https://hh.ru").unwrap()
    }

    fn title_of(html: &str) -> Option<TitleLink> {
        let doc = Html::parse_fragment(html);
        extract(doc.root_element(), &base())
    }

    #[test]
    fn data_qa_beats_earlier_links() {
        let t = title_of(
            r#"<a href="/employer/9">Acme</a><a data-qa="vacancy-serp__vacancy-title" href="/vacancy/1?from=serp#top">Rust developer</a>"#,
        )
        .unwrap();
        assert_eq!(t.title, "Rust developer");
        assert_eq!(t.link, "https://hh.ru/vacancy/1");
    }

    #[test]
    fn bloko_then_any_link() {
        let t = title_of(r#"<a href="/x">Other</a><a class="bloko-link" href="/vacancy/2">Go developer</a>"#)
            .unwrap();
        assert_eq!(t.link, "https://hh.ru/vacancy/2");

        let t = title_of(r#"<span>x</span><a href="https://spb.hh.ru/vacancy/3">QA engineer</a>"#).unwrap();
        assert_eq!(t.link, "https://spb.hh.ru/vacancy/3");
    }

    #[test]
    fn anchor_without_href_is_skipped() {
        assert!(title_of(r#"<a data-qa="vacancy-serp__vacancy-title">Rust developer</a>"#).is_none());
        let t = title_of(
            r#"<a data-qa="vacancy-serp__vacancy-title" href="">Empty</a><a href="/vacancy/4">Rust developer</a>"#,
        )
        .unwrap();
        assert_eq!(t.link, "https://hh.ru/vacancy/4");
    }

    #[test]
    fn non_http_links_are_dropped() {
        assert_eq!(resolve_link(&base(), "mailto:hr@acme.ru"), None);
        assert_eq!(resolve_link(&base(), "javascript:void(0)"), None);
    }

    #[test]
    fn length_bounds() {
        assert_eq!(rejection("Повар"), Some(Rejection::Length(5)));
        assert_eq!(rejection(&"я".repeat(201)), Some(Rejection::Length(201)));
        assert_eq!(rejection("Разработчик"), None);
    }

    #[test]
    fn chrome_phrases() {
        assert_eq!(rejection("Показать ещё вакансии"), Some(Rejection::Chrome("показать")));
        assert_eq!(rejection("Вакансии на карте города"), Some(Rejection::Chrome("на карте")));
        assert_eq!(rejection("Show more results here"), Some(Rejection::Chrome("show more")));
    }

    #[test]
    fn short_titles_need_a_job_word() {
        assert_eq!(rejection("Lorem ipsumus"), Some(Rejection::NotJobLike));
        assert_eq!(rejection("Backend-разработчик"), None);
        assert_eq!(rejection("Повар горячего цеха"), None);
    }
}
