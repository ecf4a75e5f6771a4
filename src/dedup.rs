use std::collections::HashSet;

use crate::db::VacancyRow;

/// Drop repeats of the same (title, company, link), keeping the first one
/// seen. Order is preserved.
pub fn dedupe(vacancies: Vec<VacancyRow>) -> Vec<VacancyRow> {
    let mut seen = HashSet::new();
    vacancies
        .into_iter()
        .filter(|v| seen.insert((v.title.clone(), v.company.clone(), v.link.clone())))
        .collect()
}
