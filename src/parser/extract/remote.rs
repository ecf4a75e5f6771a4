use scraper::ElementRef;

use crate::parser::element_text;

const REMOTE_WORDS: &[&str] = &[
    "удалённо", "удалённая", "remote", "удалён", "дистанционно", "дистанционная",
    "home office", "work from home", "wfh", "можно удалённо", "удалёнка",
    "удаленная", "удаленный", "удалённый", "дистанционн", "удал",
    "remote work", "telework", "telecommute",
];

fn mentions_remote(text: &str) -> bool {
    let lower = text.to_lowercase();
    REMOTE_WORDS.iter().any(|w| lower.contains(w))
}

/// Remote work is flagged if any extracted field, or failing that any text
/// in the fragment, mentions it.
pub fn detect(fields: &[&String], fragment: ElementRef) -> bool {
    let joined = fields.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
    mentions_remote(&joined) || mentions_remote(&element_text(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn remote(fields: &[&str], html: &str) -> bool {
        let owned: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        let refs: Vec<&String> = owned.iter().collect();
        let doc = Html::parse_fragment(html);
        detect(&refs, doc.root_element())
    }

    #[test]
    fn field_mentions() {
        assert!(remote(&["Data engineer, Remote"], "<div></div>"));
        assert!(remote(&["", "", "Можно удалённо"], "<div></div>"));
        assert!(remote(&["Дистанционная работа оператором"], "<div></div>"));
    }

    #[test]
    fn fragment_text_mentions() {
        assert!(remote(&["Rust разработчик"], "<div><p>Формат: WFH</p></div>"));
        assert!(remote(&["Rust разработчик"], "<div><p>Удаленный формат</p></div>"));
    }

    #[test]
    fn office_only() {
        assert!(!remote(&["Rust разработчик", "ООО Ромашка", "Москва"], "<div><p>Офис</p></div>"));
    }
}
