use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{first_match, select_text, TextStrategy};
use crate::parser::{element_text, selector, text_nodes};
use crate::text::clean;

static ADDRESS_QA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-qa="vacancy-serp__vacancy-address"]"#));
static ADDRESS_CLASS: LazyLock<Selector> =
    LazyLock::new(|| selector(".vacancy-serp__vacancy-address"));
static BLOKO_TEXT: LazyLock<Selector> = LazyLock::new(|| selector("span.bloko-text"));

static CITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "Москва|Санкт-Петербург|Екатеринбург|Новосибирск|Казань|Нижний|Ростов|Уфа|Краснодар|\
         Воронеж|Пермь|Волгоград|Красноярск|Самара|Омск|Челябинск",
    )
    .unwrap()
});

const STRATEGIES: &[TextStrategy] = &[by_address_qa, by_address_class, by_bloko_text, by_city_name];

fn by_address_qa(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &ADDRESS_QA)
}

fn by_address_class(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &ADDRESS_CLASS)
}

fn by_bloko_text(fragment: ElementRef<'_>) -> Option<String> {
    select_text(fragment, &BLOKO_TEXT)
}

/// Text of the element holding the first text node that names a big city.
fn by_city_name(fragment: ElementRef<'_>) -> Option<String> {
    let (parent, text) = text_nodes(fragment).find(|(_, text)| CITY_RE.is_match(text))?;
    Some(parent.map(element_text).unwrap_or_else(|| clean(text)))
}

pub fn extract(fragment: ElementRef) -> String {
    first_match(fragment, STRATEGIES).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn location(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        extract(doc.root_element())
    }

    #[test]
    fn address_markers_in_order() {
        assert_eq!(
            location(
                r#"<span class="bloko-text">Стажировка</span><div data-qa="vacancy-serp__vacancy-address">Москва, м. Арбатская</div>"#
            ),
            "Москва, м. Арбатская"
        );
        assert_eq!(
            location(r#"<div class="vacancy-serp__vacancy-address">Пермь</div>"#),
            "Пермь"
        );
        assert_eq!(location(r#"<span class="bloko-text">Сочи</span>"#), "Сочи");
    }

    #[test]
    fn city_in_free_text() {
        assert_eq!(
            location("<div><p>Офис: <b>Казань</b>, центр</p></div>"),
            "Казань"
        );
        assert_eq!(
            location("<div><p>Офис: Казань, ул. Баумана</p></div>"),
            "Офис: Казань, ул. Баумана"
        );
    }

    #[test]
    fn unknown_city_is_empty() {
        assert_eq!(location("<div><p>Офис в Тбилиси</p></div>"), "");
    }
}
