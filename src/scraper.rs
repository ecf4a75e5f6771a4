use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::db::VacancyRow;
use crate::dedup::dedupe;
use crate::parser::details::{parse_details, VacancyDetails};
use crate::parser::scan_page;
use crate::settings::{area_id, Experience, Settings};
use crate::text::normalize_location;

const SEARCH_PATH: &str = "/search/vacancy";
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("rate limited ({attempts} attempts)")]
    RateLimited { attempts: u32 },
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(String),
}

/// Raw HTTP outcome: any status, body as text.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// One GET request. Non-2xx statuses come back as `Ok`; only transport
/// failures are errors.
pub trait Fetch {
    fn fetch(&self, url: &str, user_agent: &str) -> impl Future<Output = Result<Response, ScrapeError>> + Send;
}

pub trait Sleep {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

pub struct TokioSleep;

impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Response, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| ScrapeError::Network(e.to_string()))?;
        Ok(Response { status, body })
    }
}

/// Pool of browser identities; one is drawn at random for every request.
pub struct UserAgents(Vec<String>);

impl UserAgents {
    pub fn new(agents: Vec<String>) -> Self {
        Self(agents)
    }

    pub fn pick(&self) -> &str {
        self.0
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }
}

/// How long to wait before retrying a failed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub rate_limit_step: Duration,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_retries: settings.max_retries,
            rate_limit_step: Duration::from_secs(settings.rate_limit_step_secs),
            backoff_base: Duration::from_millis(settings.backoff_base_ms),
        }
    }

    /// Delay after attempt `attempt` (0-based) failed with `err`, or `None`
    /// when the request should not be tried again. 429s back off linearly,
    /// everything else doubles.
    pub fn next_delay(&self, attempt: u32, err: &ScrapeError) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        match err {
            ScrapeError::RateLimited { .. } => Some(self.rate_limit_step * (attempt + 1)),
            ScrapeError::Http { .. } | ScrapeError::Network(_) => {
                Some(self.backoff_base * 2u32.saturating_pow(attempt))
            }
            ScrapeError::InvalidInput(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: Option<String>,
    pub experience: Option<Experience>,
    pub max_pages: Option<u32>,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), ..Default::default() }
    }
}

enum Phase {
    FetchingPage,
    Extracting(String),
    CheckingPagination { has_next: bool },
    Done,
    Failed(ScrapeError),
}

/// Sequential search-results crawler: one page in flight, a fixed pause
/// between pages.
pub struct Crawler<F, S> {
    fetcher: F,
    sleeper: S,
    base: Url,
    user_agents: UserAgents,
    policy: RetryPolicy,
    page_delay: Duration,
    items_on_page: u32,
    default_max_pages: u32,
}

impl<F: Fetch, S: Sleep> Crawler<F, S> {
    pub fn new(fetcher: F, sleeper: S, settings: &Settings) -> Result<Self, ScrapeError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|e| ScrapeError::InvalidInput(format!("base url '{}': {}", settings.base_url, e)))?;
        Ok(Self {
            fetcher,
            sleeper,
            base,
            user_agents: UserAgents::new(settings.user_agents.clone()),
            policy: RetryPolicy::from_settings(settings),
            page_delay: settings.page_delay(),
            items_on_page: settings.items_on_page,
            default_max_pages: settings.max_pages,
        })
    }

    pub fn page_url(&self, query: &SearchQuery, page: u32) -> Url {
        let mut url = self.base.clone();
        url.set_path(SEARCH_PATH);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("text", query.keyword.trim());
            pairs.append_pair("search_field", "name");
            pairs.append_pair("items_on_page", &self.items_on_page.to_string());
            if let Some(location) = query.location.as_deref().filter(|l| !l.trim().is_empty()) {
                pairs.append_pair("area", area_id(&normalize_location(location)));
            }
            if let Some(experience) = query.experience {
                pairs.append_pair("experience", experience.code());
            }
            if page > 0 {
                pairs.append_pair("page", &page.to_string());
            }
        }
        url
    }

    /// Crawl result pages until the pager runs out, the page ceiling is hit,
    /// or a page cannot be fetched. Records gathered so far are always
    /// returned; only an empty keyword is an error.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<VacancyRow>, ScrapeError> {
        if query.keyword.trim().is_empty() {
            return Err(ScrapeError::InvalidInput("keyword must not be empty".into()));
        }
        let max_pages = query.max_pages.unwrap_or(self.default_max_pages).max(1);

        let mut records: Vec<VacancyRow> = Vec::new();
        let mut page = 0u32;
        let mut phase = Phase::FetchingPage;
        loop {
            phase = match phase {
                Phase::FetchingPage => {
                    let url = self.page_url(query, page);
                    info!(page = page + 1, %url, "Fetching results page");
                    match self.fetch_page(url.as_str()).await {
                        Ok(body) => Phase::Extracting(body),
                        Err(e) => Phase::Failed(e),
                    }
                }
                Phase::Extracting(body) => {
                    let scan = scan_page(&body, &self.base);
                    if let Some(title) = &scan.title {
                        debug!(page = page + 1, "Page title: {}", title);
                    }
                    if scan.fragments == 0 {
                        info!(page = page + 1, "No vacancy containers on page");
                    }
                    records.extend(scan.vacancies);
                    Phase::CheckingPagination { has_next: scan.has_next }
                }
                Phase::CheckingPagination { has_next } => {
                    page += 1;
                    if !has_next {
                        info!(page, "Reached last page");
                        Phase::Done
                    } else if page >= max_pages {
                        info!(max_pages, "Page limit reached");
                        Phase::Done
                    } else {
                        self.sleeper.sleep(self.page_delay).await;
                        Phase::FetchingPage
                    }
                }
                Phase::Done => break,
                Phase::Failed(err) => {
                    warn!(page = page + 1, error = %err, "Stopping crawl, keeping {} records", records.len());
                    break;
                }
            };
        }

        let total = records.len();
        let unique = dedupe(records);
        info!(
            "Total vacancies found: {} (removed {} duplicates)",
            unique.len(),
            total - unique.len()
        );
        Ok(unique)
    }

    /// Key skills and description from a single vacancy page. `None` if the
    /// page could not be fetched.
    pub async fn fetch_details(&self, link: &str) -> Option<VacancyDetails> {
        match self.fetch_page(link).await {
            Ok(body) => Some(parse_details(&body)),
            Err(e) => {
                warn!("Failed to fetch details for {}: {}", link, e);
                None
            }
        }
    }

    /// Politeness pause between detail-page requests.
    pub async fn pause(&self) {
        self.sleeper.sleep(self.page_delay).await;
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let mut attempt = 0u32;
        loop {
            let err = match self.fetch_once(url, attempt).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };
            let Some(delay) = self.policy.next_delay(attempt, &err) else {
                warn!(attempts = attempt + 1, error = %err, "Giving up on {}", url);
                return Err(err);
            };
            warn!(
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                "{} for {}, backing off {:.1}s",
                err,
                url,
                delay.as_secs_f64()
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, url: &str, attempt: u32) -> Result<String, ScrapeError> {
        let user_agent = self.user_agents.pick().to_string();
        let resp = self.fetcher.fetch(url, &user_agent).await?;
        debug!(status = resp.status, bytes = resp.body.len(), "Fetched {}", url);
        match resp.status {
            200..=299 => Ok(resp.body),
            429 => Err(ScrapeError::RateLimited { attempts: attempt + 1 }),
            status => Err(ScrapeError::Http { status }),
        }
    }
}
