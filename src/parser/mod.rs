pub mod containers;
pub mod details;
pub mod extract;
pub mod pagination;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::db::VacancyRow;
use crate::text::clean;

/// What one search-results page yielded.
pub struct PageScan {
    pub title: Option<String>,
    pub fragments: usize,
    pub vacancies: Vec<VacancyRow>,
    pub has_next: bool,
}

/// Locate listing fragments, extract a vacancy from each one that passes
/// the filters, and read the pager.
pub fn scan_page(html: &str, base: &Url) -> PageScan {
    let doc = Html::parse_document(html);
    let title = doc.select(&selector("title")).next().map(element_text);

    let fragments = containers::locate(&doc);
    let mut vacancies = Vec::with_capacity(fragments.len());
    for (i, fragment) in fragments.iter().enumerate() {
        match extract::extract(*fragment, base) {
            Some(v) if v.is_valid() => vacancies.push(v),
            Some(v) => debug!("Dropped invalid vacancy #{}: {:?}", i + 1, v.title),
            None => {}
        }
    }
    info!(
        fragments = fragments.len(),
        vacancies = vacancies.len(),
        "Scanned results page"
    );

    PageScan {
        title,
        fragments: fragments.len(),
        vacancies,
        has_next: pagination::has_next_page(&doc),
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// All text under `el`, whitespace-normalised.
pub(crate) fn element_text(el: ElementRef) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text nodes under `el` in document order, each with its parent element.
pub(crate) fn text_nodes<'a>(
    el: ElementRef<'a>,
) -> impl Iterator<Item = (Option<ElementRef<'a>>, &'a str)> + 'a {
    el.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        Some((node.parent().and_then(ElementRef::wrap), &**text))
    })
}
