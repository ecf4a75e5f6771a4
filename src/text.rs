use std::sync::LazyLock;

use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[a-zA-Z]+;").unwrap());

/// Short forms and stems users type for the big cities, mapped to the
/// canonical name the site uses.
const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("москва", "Москва"),
    ("московская", "Московская область"),
    ("спб", "Санкт-Петербург"),
    ("питер", "Санкт-Петербург"),
    ("екб", "Екатеринбург"),
    ("нижний", "Нижний Новгород"),
    ("ростов", "Ростов-на-Дону"),
];

/// Drop `&word;` entities, collapse whitespace runs (including NBSP and
/// newlines) into single spaces, trim the ends.
pub fn clean(text: &str) -> String {
    let no_entities = ENTITY_RE.replace_all(text, "");
    WS_RE.replace_all(&no_entities, " ").trim().to_string()
}

pub fn normalize_location(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return text.to_string();
    }

    if let Some((_, canonical)) = LOCATION_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return canonical.to_string();
    }

    LOCATION_ALIASES
        .iter()
        .find(|(alias, _)| lower.contains(alias) || alias.contains(lower.as_str()))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| text.to_string())
}
