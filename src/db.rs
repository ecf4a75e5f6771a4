use anyhow::{Context, Result};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::salary::Currency;

pub fn connect(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS vacancies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            salary_min  INTEGER,
            salary_max  INTEGER,
            currency    TEXT CHECK(currency IN ('RUB','USD','EUR')),
            location    TEXT NOT NULL DEFAULT '',
            experience  TEXT NOT NULL DEFAULT '',
            key_skills  TEXT NOT NULL DEFAULT '[]',
            company     TEXT NOT NULL DEFAULT '',
            link        TEXT UNIQUE NOT NULL,
            remote      BOOLEAN NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_vacancies_company ON vacancies(company);
        CREATE INDEX IF NOT EXISTS idx_vacancies_location ON vacancies(location);

        CREATE TABLE IF NOT EXISTS search_history (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            keyword         TEXT NOT NULL,
            location        TEXT,
            searched_at     TEXT NOT NULL DEFAULT (datetime('now')),
            vacancies_found INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;
    Ok(())
}

// ── Vacancies ──

/// One job listing as extracted from a search-results page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacancyRow {
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub currency: Option<Currency>,
    pub remote: bool,
    pub link: String,
    pub key_skills: Vec<String>,
}

impl VacancyRow {
    /// Title and link present, salary bounds ordered.
    pub fn is_valid(&self) -> bool {
        if self.title.trim().is_empty() || self.link.trim().is_empty() {
            return false;
        }
        match (self.salary_min, self.salary_max) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }

    pub fn has_salary(&self) -> bool {
        self.salary_min.is_some() || self.salary_max.is_some()
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let currency: Option<String> = row.get(4)?;
        let skills: String = row.get(7)?;
        Ok(VacancyRow {
            title: row.get(0)?,
            company: row.get(1)?,
            location: row.get(2)?,
            experience: row.get(3)?,
            currency: currency.as_deref().and_then(Currency::from_code),
            salary_min: row.get(5)?,
            salary_max: row.get(6)?,
            key_skills: serde_json::from_str(&skills).unwrap_or_default(),
            remote: row.get(8)?,
            link: row.get(9)?,
        })
    }
}

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO vacancies
     (title, salary_min, salary_max, currency, location, experience, key_skills, company, link, remote)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

fn upsert(stmt: &mut rusqlite::Statement, v: &VacancyRow) -> Result<()> {
    let skills = serde_json::to_string(&v.key_skills)?;
    stmt.execute(rusqlite::params![
        v.title,
        v.salary_min,
        v.salary_max,
        v.currency.map(Currency::code),
        v.location,
        v.experience,
        skills,
        v.company,
        v.link,
        v.remote,
    ])?;
    Ok(())
}

/// Insert or replace one vacancy (identity in the store is the link).
pub fn save_vacancy(conn: &Connection, v: &VacancyRow) -> Result<()> {
    let mut stmt = conn.prepare(UPSERT_SQL)?;
    upsert(&mut stmt, v)
}

pub fn save_vacancies(conn: &Connection, rows: &[VacancyRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(UPSERT_SQL)?;
        for v in rows {
            upsert(&mut stmt, v)?;
            count += 1;
        }
    }
    tx.commit()?;
    Ok(count)
}

#[derive(Debug, Default)]
pub struct VacancyFilter {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub remote: Option<bool>,
}

pub fn fetch_vacancies(
    conn: &Connection,
    filter: &VacancyFilter,
    limit: Option<usize>,
) -> Result<Vec<VacancyRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    let mut like = |column: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            conditions.push(format!("{} LIKE ?{}", column, params.len() + 1));
            params.push(Box::new(format!("%{}%", v.trim())));
        }
    };
    like("title", &filter.keyword);
    like("location", &filter.location);
    like("company", &filter.company);

    if let Some(remote) = filter.remote {
        conditions.push(format!("remote = ?{}", params.len() + 1));
        params.push(Box::new(remote));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let limit_clause = match limit {
        Some(n) => format!(" LIMIT {}", n),
        None => String::new(),
    };

    let sql = format!(
        "SELECT title, company, location, experience, currency, salary_min, salary_max,
                key_skills, remote, link
         FROM vacancies{}
         ORDER BY created_at DESC, id DESC{}",
        where_clause, limit_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), VacancyRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute_batch("DELETE FROM vacancies; DELETE FROM search_history;")?;
    Ok(())
}

// ── Search history ──

pub struct SearchHistoryRow {
    pub keyword: String,
    pub location: Option<String>,
    pub searched_at: String,
    pub vacancies_found: usize,
}

pub fn save_search_history(
    conn: &Connection,
    keyword: &str,
    location: Option<&str>,
    vacancies_found: usize,
) -> Result<()> {
    conn.execute(
        "INSERT INTO search_history (keyword, location, vacancies_found) VALUES (?1, ?2, ?3)",
        rusqlite::params![keyword, location, vacancies_found as i64],
    )?;
    Ok(())
}

pub fn fetch_search_history(conn: &Connection, limit: usize) -> Result<Vec<SearchHistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT keyword, location, searched_at, vacancies_found
         FROM search_history
         ORDER BY id DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            let found: i64 = row.get(3)?;
            Ok(SearchHistoryRow {
                keyword: row.get(0)?,
                location: row.get(1)?,
                searched_at: row.get(2)?,
                vacancies_found: found.max(0) as usize,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub with_salary: usize,
    pub remote_count: usize,
    pub unique_companies: usize,
    pub unique_locations: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n.max(0) as usize)
    };
    Ok(Stats {
        total: count("SELECT COUNT(*) FROM vacancies")?,
        with_salary: count(
            "SELECT COUNT(*) FROM vacancies WHERE salary_min IS NOT NULL OR salary_max IS NOT NULL",
        )?,
        remote_count: count("SELECT COUNT(*) FROM vacancies WHERE remote = 1")?,
        unique_companies: count("SELECT COUNT(DISTINCT company) FROM vacancies WHERE company != ''")?,
        unique_locations: count(
            "SELECT COUNT(DISTINCT location) FROM vacancies WHERE location != ''",
        )?,
    })
}
