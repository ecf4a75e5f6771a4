use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Country-wide area used when a location is not in the table.
pub const DEFAULT_AREA_ID: &str = "113";

const AREA_IDS: &[(&str, &str)] = &[
    ("москва", "1"),
    ("московская область", "2019"),
    ("санкт-петербург", "2"),
    ("екатеринбург", "3"),
    ("новосибирск", "4"),
    ("краснодар", "53"),
    ("нижний новгород", "66"),
    ("казань", "88"),
    ("челябинск", "104"),
    ("омск", "68"),
    ("самара", "78"),
    ("ростов-на-дону", "76"),
    ("уфа", "99"),
    ("красноярск", "54"),
    ("воронеж", "26"),
    ("волгоград", "24"),
    ("пермь", "72"),
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Runtime settings, overridable through `HH_*` environment variables
/// (e.g. `HH_MAX_PAGES=3`, `HH_DB_PATH=/tmp/v.db`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub max_pages: u32,
    pub items_on_page: u32,
    pub request_timeout_secs: u64,
    pub page_delay_ms: u64,
    pub max_retries: u32,
    pub rate_limit_step_secs: u64,
    pub backoff_base_ms: u64,
    pub db_path: String,
    #[serde(skip)]
    pub user_agents: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://hh.ru".to_string(),
            max_pages: 10,
            items_on_page: 50,
            request_timeout_secs: 30,
            page_delay_ms: 1000,
            max_retries: 3,
            rate_limit_step_secs: 5,
            backoff_base_ms: 1000,
            db_path: "vacancies.db".to_string(),
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let loaded = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("HH"))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>());

        let mut settings = match loaded {
            Ok(s) => s,
            Err(e) => {
                warn!("Ignoring invalid HH_* settings: {}", e);
                Settings::default()
            }
        };
        if settings.user_agents.is_empty() {
            settings.user_agents = Settings::default().user_agents;
        }
        settings
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Map a city name to the site's area id: exact match, then containment
/// either way, then the country-wide default.
pub fn area_id(location: &str) -> &'static str {
    let lower = location.trim().to_lowercase();
    if lower.is_empty() {
        return DEFAULT_AREA_ID;
    }
    if let Some((_, id)) = AREA_IDS.iter().find(|(name, _)| *name == lower) {
        return id;
    }
    AREA_IDS
        .iter()
        .find(|(name, _)| lower.contains(name) || name.contains(lower.as_str()))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_AREA_ID)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experience {
    None,
    Between1And3,
    Between3And6,
    MoreThan6,
}

impl Experience {
    pub fn code(self) -> &'static str {
        match self {
            Experience::None => "noExperience",
            Experience::Between1And3 => "between1And3",
            Experience::Between3And6 => "between3And6",
            Experience::MoreThan6 => "moreThan6",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Experience::None => "Нет опыта",
            Experience::Between1And3 => "От 1 до 3 лет",
            Experience::Between3And6 => "От 3 до 6 лет",
            Experience::MoreThan6 => "Более 6 лет",
        }
    }
}

impl FromStr for Experience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noExperience" => Ok(Experience::None),
            "between1And3" => Ok(Experience::Between1And3),
            "between3And6" => Ok(Experience::Between3And6),
            "moreThan6" => Ok(Experience::MoreThan6),
            other => Err(format!(
                "unknown experience '{}' (expected noExperience, between1And3, between3And6, moreThan6)",
                other
            )),
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_exact_and_partial() {
        assert_eq!(area_id("Москва"), "1");
        assert_eq!(area_id("санкт-петербург"), "2");
        assert_eq!(area_id("Нижний"), "66");
        assert_eq!(area_id("г. Казань"), "88");
    }

    #[test]
    fn area_unknown_falls_back_to_country() {
        assert_eq!(area_id("Berlin"), DEFAULT_AREA_ID);
        assert_eq!(area_id(""), DEFAULT_AREA_ID);
    }

    #[test]
    fn experience_codes_round_trip() {
        for e in [
            Experience::None,
            Experience::Between1And3,
            Experience::Between3And6,
            Experience::MoreThan6,
        ] {
            assert_eq!(e.code().parse::<Experience>(), Ok(e));
        }
        assert!("senior".parse::<Experience>().is_err());
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.max_pages, 10);
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.request_timeout(), Duration::from_secs(30));
        assert_eq!(s.page_delay(), Duration::from_millis(1000));
        assert!(!s.user_agents.is_empty());
    }
}
