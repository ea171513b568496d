//! Summary report over an imported table

use std::fmt;

use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

use crate::error::Result;

const TOTAL: &str = "SELECT COUNT(*) FROM accommodations";

const BY_CATEGORY: &str = r#"
    SELECT COALESCE(category, '') AS label, COUNT(*) AS count
    FROM accommodations
    GROUP BY COALESCE(category, '')
    ORDER BY count DESC
"#;

const TOP_DISTRICTS: &str = r#"
    SELECT district AS label, COUNT(*) AS count
    FROM accommodations
    WHERE district IS NOT NULL AND district <> ''
    GROUP BY district
    ORDER BY count DESC
    LIMIT 10
"#;

const RECENT: &str = r#"
    SELECT name, category, municipality, registered_at
    FROM accommodations
    WHERE registered_at IS NOT NULL
    ORDER BY registered_at DESC
    LIMIT 5
"#;

const TOP_MUNICIPALITIES: &str = r#"
    SELECT municipality, COALESCE(district, '') AS district, COUNT(*) AS count
    FROM accommodations
    WHERE municipality IS NOT NULL AND municipality <> ''
    GROUP BY municipality, district
    ORDER BY count DESC
    LIMIT 10
"#;

const TOP_OWNERS: &str = r#"
    SELECT owner_email AS label, COUNT(*) AS count
    FROM accommodations
    WHERE owner_email IS NOT NULL AND owner_email <> ''
    GROUP BY owner_email
    ORDER BY count DESC
    LIMIT 10
"#;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RecentRegistration {
    pub name: Option<String>,
    pub category: Option<String>,
    pub municipality: Option<String>,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MunicipalityCount {
    pub municipality: String,
    pub district: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub total: i64,
    pub by_category: Vec<LabelCount>,
    pub top_districts: Vec<LabelCount>,
    pub recent: Vec<RecentRegistration>,
    pub top_municipalities: Vec<MunicipalityCount>,
    pub top_owners: Vec<LabelCount>,
}

pub async fn fetch_report(pool: &PgPool) -> Result<Report> {
    let (total, by_category, top_districts, recent, top_municipalities, top_owners) =
        tokio::try_join!(
            sqlx::query_scalar::<_, i64>(TOTAL).fetch_one(pool),
            sqlx::query_as::<_, LabelCount>(BY_CATEGORY).fetch_all(pool),
            sqlx::query_as::<_, LabelCount>(TOP_DISTRICTS).fetch_all(pool),
            sqlx::query_as::<_, RecentRegistration>(RECENT).fetch_all(pool),
            sqlx::query_as::<_, MunicipalityCount>(TOP_MUNICIPALITIES).fetch_all(pool),
            sqlx::query_as::<_, LabelCount>(TOP_OWNERS).fetch_all(pool),
        )?;

    Ok(Report {
        total,
        by_category,
        top_districts,
        recent,
        top_municipalities,
        top_owners,
    })
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(title.chars().count()))
}

fn counts(f: &mut fmt::Formatter<'_>, title: &str, rows: &[LabelCount]) -> fmt::Result {
    heading(f, title)?;
    for row in rows {
        let label = if row.label.is_empty() { "(none)" } else { row.label.as_str() };
        writeln!(f, "  {:<25}: {}", label, row.count)?;
    }
    writeln!(f)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total accommodations: {}", self.total)?;
        writeln!(f)?;

        counts(f, "Count by category:", &self.by_category)?;
        counts(f, "Top 10 districts:", &self.top_districts)?;

        heading(f, "Most recent registrations:")?;
        for row in &self.recent {
            writeln!(
                f,
                "  {} ({}) - {} [{}]",
                row.name.as_deref().unwrap_or("N/A"),
                row.category.as_deref().unwrap_or("N/A"),
                row.municipality.as_deref().unwrap_or("N/A"),
                row.registered_at.format("%Y-%m-%d")
            )?;
        }
        writeln!(f)?;

        heading(f, "Top 10 municipalities:")?;
        for row in &self.top_municipalities {
            writeln!(f, "  {:<25} ({:<15}): {}", row.municipality, row.district, row.count)?;
        }
        writeln!(f)?;

        counts(f, "Top 10 owners (email):", &self.top_owners)
    }
}
