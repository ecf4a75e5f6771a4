use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::selector;

static PAGER: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[data-qa="pager-block"]"#));
static PAGER_NEXT: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[data-qa="pager-next"]"#));

/// True only when the pager is present and its "next" control is live.
pub fn has_next_page(doc: &Html) -> bool {
    let Some(pager) = doc.select(&PAGER).next() else {
        return false;
    };
    let Some(next) = pager.select(&PAGER_NEXT).next() else {
        return false;
    };
    let el = next.value();
    !el.classes().any(|c| c.contains("disabled")) && el.attr("aria-disabled") != Some("true")
}
