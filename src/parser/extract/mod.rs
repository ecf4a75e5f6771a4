pub mod company;
pub mod experience;
pub mod location;
pub mod remote;
pub mod salary;
pub mod title;

use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

use super::element_text;
use crate::db::VacancyRow;

/// One way of pulling a field's text out of a listing fragment.
pub type TextStrategy = for<'a> fn(ElementRef<'a>) -> Option<String>;

/// Result of the first strategy that yields non-empty text.
pub fn first_match(fragment: ElementRef, strategies: &[TextStrategy]) -> Option<String> {
    strategies
        .iter()
        .find_map(|strategy| strategy(fragment).filter(|s| !s.is_empty()))
}

/// Text of the first element under `fragment` matching `sel`.
pub(crate) fn select_text(fragment: ElementRef, sel: &Selector) -> Option<String> {
    fragment.select(sel).next().map(element_text)
}

/// Build a vacancy from one listing fragment. Returns `None` when the
/// fragment has no usable title link or the title looks like page chrome.
pub fn extract(fragment: ElementRef, base: &Url) -> Option<VacancyRow> {
    let Some(found) = title::extract(fragment, base) else {
        debug!("Fragment without a title link");
        return None;
    };
    if let Some(reason) = title::rejection(&found.title) {
        debug!(title = %found.title, ?reason, "Filtered out non-vacancy entry");
        return None;
    }

    let company = company::extract(fragment);
    let location = location::extract(fragment);
    let salary = salary::extract(fragment);
    let experience = experience::extract(fragment);
    let remote = remote::detect(&[&found.title, &company, &location, &experience], fragment);

    Some(VacancyRow {
        title: found.title,
        company,
        location,
        experience,
        salary_min: salary.min,
        salary_max: salary.max,
        currency: salary.currency,
        remote,
        link: found.link,
        key_skills: Vec::new(),
    })
}
