mod db;
mod dedup;
mod parser;
mod salary;
mod scraper;
mod settings;
mod text;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::db::VacancyRow;
use crate::salary::{format_salary, salary_statistics, Currency};
use crate::scraper::{Crawler, Fetch, HttpFetcher, SearchQuery, Sleep, TokioSleep};
use crate::settings::{Experience, Settings};

#[derive(Parser)]
#[command(name = "hh_scraper", about = "hh.ru vacancy search scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search results for a keyword and store the vacancies
    Search {
        keyword: String,
        /// City name, e.g. "Москва" or "спб"
        #[arg(short, long)]
        location: Option<String>,
        /// noExperience, between1And3, between3And6 or moreThan6
        #[arg(short, long)]
        experience: Option<Experience>,
        /// Max result pages to crawl (default: HH_MAX_PAGES or 10)
        #[arg(short = 'n', long)]
        max_pages: Option<u32>,
        /// Visit every vacancy page to collect key skills
        #[arg(long)]
        details: bool,
        /// Print results without touching the database
        #[arg(long)]
        no_save: bool,
    },
    /// Query stored vacancies
    List {
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        company: Option<String>,
        /// Only remote vacancies
        #[arg(short, long)]
        remote: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Store counts and RUB salary statistics
    Stats,
    /// Recent searches
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Write all stored vacancies to a JSON file
    Export { path: PathBuf },
    /// Delete all vacancies and search history
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Search { keyword, location, experience, max_pages, details, no_save } => {
            let crawler = Crawler::new(HttpFetcher::new(&settings)?, TokioSleep, &settings)?;
            if let Some(e) = experience {
                println!("Experience filter: {}", e);
            }
            let query = SearchQuery { location, experience, max_pages, ..SearchQuery::new(keyword) };
            let mut found = crawler.search(&query).await?;

            let conn = if no_save { None } else { Some(open_db(&settings)?) };
            let saved = match &conn {
                Some(conn) => Some(record_search(conn, &query, &found)?),
                None => None,
            };

            if found.is_empty() {
                println!("No vacancies found for '{}'.", query.keyword);
            } else {
                if details {
                    fill_details(&crawler, &mut found, conn.as_ref()).await?;
                }
                print_table(&found);
                if let Some(saved) = saved {
                    println!("\nSaved {} vacancies to {}", saved, settings.db_path);
                }
            }
            Ok(())
        }
        Commands::List { keyword, location, company, remote, limit } => {
            let conn = open_db(&settings)?;
            let filter = db::VacancyFilter {
                keyword,
                location,
                company,
                remote: remote.then_some(true),
            };
            let rows = db::fetch_vacancies(&conn, &filter, Some(limit))?;
            if rows.is_empty() {
                println!("No vacancies found.");
                return Ok(());
            }
            print_table(&rows);
            Ok(())
        }
        Commands::Stats => {
            let conn = open_db(&settings)?;
            let s = db::get_stats(&conn)?;
            println!("Total:       {}", s.total);
            println!("With salary: {}", s.with_salary);
            println!("Remote:      {}", s.remote_count);
            println!("Companies:   {}", s.unique_companies);
            println!("Locations:   {}", s.unique_locations);

            let rows = db::fetch_vacancies(&conn, &db::VacancyFilter::default(), None)?;
            let salaries = salary_statistics(&rows);
            if salaries.count > 0 {
                let rub = |v: Option<i64>| format_salary(v, v, Some(Currency::Rub));
                println!("\n--- RUB salaries ({} vacancies) ---", salaries.count);
                println!("Min:     {}", rub(salaries.min));
                println!("Max:     {}", rub(salaries.max));
                println!("Average: {}", rub(salaries.average));
                println!("Median:  {}", rub(salaries.median));
            }
            Ok(())
        }
        Commands::History { limit } => {
            let conn = open_db(&settings)?;
            let rows = db::fetch_search_history(&conn, limit)?;
            if rows.is_empty() {
                println!("No searches yet.");
                return Ok(());
            }
            println!("{:<19} | {:<24} | {:<16} | {:>5}", "When", "Keyword", "Location", "Found");
            println!("{}", "-".repeat(73));
            for r in &rows {
                println!(
                    "{:<19} | {:<24} | {:<16} | {:>5}",
                    r.searched_at,
                    truncate(&r.keyword, 24),
                    truncate(r.location.as_deref().unwrap_or("-"), 16),
                    r.vacancies_found
                );
            }
            Ok(())
        }
        Commands::Export { path } => {
            let conn = open_db(&settings)?;
            let rows = db::fetch_vacancies(&conn, &db::VacancyFilter::default(), None)?;
            export_json(&path, &rows)?;
            println!("Exported {} vacancies to {}", rows.len(), path.display());
            Ok(())
        }
        Commands::Clear => {
            let conn = open_db(&settings)?;
            db::clear_all(&conn)?;
            println!("Cleared {}", settings.db_path);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_db(settings: &Settings) -> anyhow::Result<Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Store the crawl result and log the search, empty results included.
/// Returns how many vacancies were written.
fn record_search(conn: &Connection, query: &SearchQuery, found: &[VacancyRow]) -> anyhow::Result<usize> {
    let saved = db::save_vacancies(conn, found)?;
    db::save_search_history(conn, &query.keyword, query.location.as_deref(), saved)?;
    Ok(saved)
}

/// Visit each vacancy page in turn, pausing between requests. Rows are
/// re-saved one by one as their skills arrive.
async fn fill_details<F: Fetch, S: Sleep>(
    crawler: &Crawler<F, S>,
    vacancies: &mut [VacancyRow],
    conn: Option<&Connection>,
) -> anyhow::Result<()> {
    let pb = ProgressBar::new(vacancies.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} details")?
            .progress_chars("#>-"),
    );

    for (i, v) in vacancies.iter_mut().enumerate() {
        if i > 0 {
            crawler.pause().await;
        }
        if let Some(d) = crawler.fetch_details(&v.link).await {
            debug!(link = %v.link, description = %truncate(&d.description, 80), "Fetched details");
            v.key_skills = d.key_skills;
            if let Some(conn) = conn {
                db::save_vacancy(conn, v)?;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}

fn print_table(rows: &[VacancyRow]) {
    println!(
        "{:>3} | {:<40} | {:<24} | {:<18} | {:<24} | {:<6}",
        "#", "Title", "Company", "Location", "Salary", "Remote"
    );
    println!("{}", "-".repeat(128));

    for (i, v) in rows.iter().enumerate() {
        let salary = if v.has_salary() {
            format_salary(v.salary_min, v.salary_max, v.currency)
        } else {
            "-".to_string()
        };
        println!(
            "{:>3} | {:<40} | {:<24} | {:<18} | {:<24} | {:<6}",
            i + 1,
            truncate(&v.title, 40),
            truncate(&v.company, 24),
            truncate(&v.location, 18),
            salary,
            if v.remote { "yes" } else { "" }
        );
    }

    let with_skills: Vec<_> = rows.iter().filter(|v| !v.key_skills.is_empty()).collect();
    if !with_skills.is_empty() {
        println!("\n--- Key skills ---");
        for v in &with_skills {
            println!("  {}: {}", truncate(&v.title, 40), v.key_skills.join(", "));
        }
    }

    println!("\n{} vacancies", rows.len());
}

#[derive(Serialize)]
struct ExportFile<'a> {
    exported_at: String,
    count: usize,
    vacancies: &'a [VacancyRow],
}

fn export_json(path: &std::path::Path, rows: &[VacancyRow]) -> anyhow::Result<()> {
    let file = ExportFile {
        exported_at: chrono::Local::now().to_rfc3339(),
        count: rows.len(),
        vacancies: rows,
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
