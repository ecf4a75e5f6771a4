use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::VacancyRow;
use crate::text::clean;

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());
// A qualifier only counts when a figure follows it, optionally behind a
// currency sign: "до 120 000" and "up to €4000", not "до вычета".
static FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:от|from)\s*(?:[$€₽]\s*)?[0-9]").unwrap());
static TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:до|up to)\s*(?:[$€₽]\s*)?[0-9]").unwrap());

const NOT_SPECIFIED: &[&str] = &["не указан", "не указано", "not specified"];
const THOUSANDS_SEPARATORS: &[char] = &[' ', '\u{202f}', '\u{a0}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rub,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "RUB" | "RUR" => Some(Currency::Rub),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }

    /// Scan for currency words/symbols; RUB wins over USD over EUR.
    fn detect(lower: &str) -> Option<Self> {
        if lower.contains("руб") || lower.contains('₽') {
            Some(Currency::Rub)
        } else if lower.contains("usd") || lower.contains('$') {
            Some(Currency::Usd)
        } else if lower.contains("eur") || lower.contains('€') {
            Some(Currency::Eur)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Salary {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: Option<Currency>,
}

impl Salary {
    fn exact(value: i64, currency: Option<Currency>) -> Self {
        Salary { min: Some(value), max: Some(value), currency }
    }

    fn range(a: i64, b: i64, currency: Option<Currency>) -> Self {
        Salary { min: Some(a.min(b)), max: Some(a.max(b)), currency }
    }
}

/// Turn free-text compensation ("от 80 000 до 120 000 ₽ на руки") into
/// min/max/currency. Never fails; the worst case is all fields empty.
pub fn parse_salary(raw: &str) -> Salary {
    let text = clean(raw);
    let lower = text.to_lowercase();
    if lower.is_empty() || NOT_SPECIFIED.iter().any(|m| lower.contains(m)) {
        return Salary::default();
    }

    let currency = Currency::detect(&lower);
    let compact: String = lower.chars().filter(|c| !THOUSANDS_SEPARATORS.contains(c)).collect();
    let parsed: Result<Vec<i64>, _> = DIGITS_RE
        .find_iter(&compact)
        .map(|m| m.as_str().parse::<i64>())
        .collect();
    // A figure too large to hold means the text is not a salary we can trust.
    let Ok(numbers) = parsed else {
        return Salary { min: None, max: None, currency };
    };

    let from = FROM_RE.is_match(&lower);
    let to = TO_RE.is_match(&lower);

    match numbers.as_slice() {
        [] => Salary { min: None, max: None, currency },
        [only] => match (from, to) {
            (true, false) => Salary { min: Some(*only), max: None, currency },
            (false, true) => Salary { min: None, max: Some(*only), currency },
            _ => Salary::exact(*only, currency),
        },
        [first, second] => match (from, to) {
            (true, false) => Salary { min: Some(*first), max: None, currency },
            (false, true) => Salary { min: None, max: Some(*first), currency },
            _ => Salary::range(*first, *second, currency),
        },
        many => {
            let lo = many.iter().copied().min().unwrap_or_default();
            let hi = many.iter().copied().max().unwrap_or_default();
            Salary::range(lo, hi, currency)
        }
    }
}

/// Human-readable salary, e.g. "от 80 000 RUB" or "100 000-150 000 USD".
pub fn format_salary(min: Option<i64>, max: Option<i64>, currency: Option<Currency>) -> String {
    let body = match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => group_thousands(lo),
        (Some(lo), Some(hi)) => format!("{}-{}", group_thousands(lo), group_thousands(hi)),
        (Some(lo), None) => format!("от {}", group_thousands(lo)),
        (None, Some(hi)) => format!("до {}", group_thousands(hi)),
        (None, None) => return String::new(),
    };
    match currency {
        Some(c) => format!("{} {}", body, c.code()),
        None => body,
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct SalaryStats {
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub average: Option<i64>,
    pub median: Option<i64>,
}

/// Stats over RUB salaries only; each vacancy contributes its lower bound,
/// or its upper bound when no lower bound is known.
pub fn salary_statistics(rows: &[VacancyRow]) -> SalaryStats {
    let mut salaries: Vec<i64> = rows
        .iter()
        .filter(|r| r.currency == Some(Currency::Rub))
        .filter_map(|r| r.salary_min.or(r.salary_max))
        .collect();

    if salaries.is_empty() {
        return SalaryStats::default();
    }
    salaries.sort_unstable();

    let sum: i64 = salaries.iter().sum();
    SalaryStats {
        count: salaries.len(),
        min: salaries.first().copied(),
        max: salaries.last().copied(),
        average: Some((sum as f64 / salaries.len() as f64).round() as i64),
        median: Some(salaries[salaries.len() / 2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rub(min: Option<i64>, max: Option<i64>) -> Salary {
        Salary { min, max, currency: Some(Currency::Rub) }
    }

    #[test]
    fn single_figure_sets_both_bounds() {
        assert_eq!(parse_salary("50 000 руб"), rub(Some(50000), Some(50000)));
        assert_eq!(parse_salary("50\u{a0}000 ₽"), rub(Some(50000), Some(50000)));
        assert_eq!(parse_salary("75000 руб."), rub(Some(75000), Some(75000)));
    }

    #[test]
    fn single_figure_with_qualifier_is_one_sided() {
        assert_eq!(parse_salary("от 80000 руб"), rub(Some(80000), None));
        assert_eq!(parse_salary("до 120000 руб"), rub(None, Some(120000)));
        assert_eq!(parse_salary("from 3 000 $"), Salary {
            min: Some(3000),
            max: None,
            currency: Some(Currency::Usd),
        });
        assert_eq!(parse_salary("up to 4000 eur"), Salary {
            min: None,
            max: Some(4000),
            currency: Some(Currency::Eur),
        });
    }

    #[test]
    fn explicit_range() {
        assert_eq!(parse_salary("80000-120000 руб"), rub(Some(80000), Some(120000)));
        assert_eq!(parse_salary("120 000 – 80 000 ₽"), rub(Some(80000), Some(120000)));
    }

    #[test]
    fn two_figures_with_both_qualifiers_is_a_range() {
        assert_eq!(
            parse_salary("от 80 000 до 120 000 руб. на руки"),
            rub(Some(80000), Some(120000))
        );
    }

    #[test]
    fn two_figures_with_one_qualifier_keeps_first() {
        // second figure is noise, e.g. a bonus mentioned after the main amount
        assert_eq!(parse_salary("от 90000 руб, премия 15%"), rub(Some(90000), None));
        assert_eq!(parse_salary("до 200000 руб, 2 раза в год"), rub(None, Some(200000)));
    }

    #[test]
    fn currency_sign_between_qualifier_and_figure() {
        assert_eq!(parse_salary("from $3000, bonus 10%"), Salary {
            min: Some(3000),
            max: None,
            currency: Some(Currency::Usd),
        });
        assert_eq!(parse_salary("up to €4000, 2 shifts"), Salary {
            min: None,
            max: Some(4000),
            currency: Some(Currency::Eur),
        });
        assert_eq!(parse_salary("up to €4000"), Salary {
            min: None,
            max: Some(4000),
            currency: Some(Currency::Eur),
        });
        assert_eq!(parse_salary("от ₽ 90 000"), rub(Some(90000), None));
    }

    #[test]
    fn oversized_figure_yields_no_bounds() {
        assert_eq!(parse_salary("от 1 до 99999999999999999999 руб"), rub(None, None));
    }

    #[test]
    fn trailing_tax_phrase_is_not_a_to_qualifier() {
        assert_eq!(
            parse_salary("от 300 000 ₽ за месяц, до вычета налогов"),
            rub(Some(300000), None)
        );
    }

    #[test]
    fn qualifier_inside_word_is_ignored() {
        // "работа" contains the letters "от"
        assert_eq!(parse_salary("работа 60000 руб"), rub(Some(60000), Some(60000)));
    }

    #[test]
    fn three_or_more_figures_take_extremes() {
        assert_eq!(
            parse_salary("100 000, 150 000 или 90 000 руб"),
            rub(Some(90000), Some(150000))
        );
        assert_eq!(parse_salary("1 2 3 usd"), Salary {
            min: Some(123),
            max: Some(123),
            currency: Some(Currency::Usd),
        });
    }

    #[test]
    fn no_figures_keeps_currency() {
        assert_eq!(parse_salary("по договорённости, руб"), rub(None, None));
        assert_eq!(parse_salary("competitive"), Salary::default());
    }

    #[test]
    fn not_specified_and_empty() {
        assert_eq!(parse_salary("Не указана"), Salary::default());
        assert_eq!(parse_salary("з/п не указана, 100 руб"), Salary::default());
        assert_eq!(parse_salary(""), Salary::default());
        assert_eq!(parse_salary("   "), Salary::default());
    }

    #[test]
    fn currency_priority() {
        assert_eq!(parse_salary("1000 руб / $").currency, Some(Currency::Rub));
        assert_eq!(parse_salary("1000 $ or €").currency, Some(Currency::Usd));
        assert_eq!(parse_salary("1000 €").currency, Some(Currency::Eur));
        assert_eq!(parse_salary("1000").currency, None);
    }

    #[test]
    fn format_variants() {
        assert_eq!(format_salary(None, None, Some(Currency::Rub)), "");
        assert_eq!(format_salary(Some(50000), Some(50000), None), "50 000");
        assert_eq!(
            format_salary(Some(80000), Some(120000), Some(Currency::Rub)),
            "80 000-120 000 RUB"
        );
        assert_eq!(format_salary(Some(1500), None, Some(Currency::Usd)), "от 1 500 USD");
        assert_eq!(format_salary(None, Some(999), None), "до 999");
        assert_eq!(format_salary(Some(1234567), Some(1234567), None), "1 234 567");
    }

    #[test]
    fn currency_codes() {
        assert_eq!(Currency::from_code("rub"), Some(Currency::Rub));
        assert_eq!(Currency::from_code("RUR"), Some(Currency::Rub));
        assert_eq!(Currency::from_code("GBP"), None);
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
    }

    fn row(min: Option<i64>, max: Option<i64>, currency: Option<Currency>) -> VacancyRow {
        VacancyRow {
            title: "Rust developer".into(),
            link: "https://hh.ru/vacancy/1".into(),
            salary_min: min,
            salary_max: max,
            currency,
            ..Default::default()
        }
    }

    #[test]
    fn statistics_over_rub_only() {
        let rows = vec![
            row(Some(100_000), Some(150_000), Some(Currency::Rub)),
            row(None, Some(60_000), Some(Currency::Rub)),
            row(Some(200_000), None, Some(Currency::Rub)),
            row(Some(5_000), None, Some(Currency::Usd)),
            row(None, None, Some(Currency::Rub)),
        ];
        let s = salary_statistics(&rows);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, Some(60_000));
        assert_eq!(s.max, Some(200_000));
        assert_eq!(s.average, Some(120_000));
        assert_eq!(s.median, Some(100_000));
    }

    #[test]
    fn statistics_empty() {
        assert_eq!(salary_statistics(&[]), SalaryStats::default());
    }
}
