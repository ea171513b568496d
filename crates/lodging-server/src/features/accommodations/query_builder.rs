//! Filtered listing query compiler
//!
//! Turns validated [`SearchParams`] into a count statement and a data statement that share one
//! WHERE clause and one list of filter arguments. Filter values only ever travel as positional
//! `$n` parameters. The only text substituted into the SQL is the sort column and direction,
//! both of which come from closed enums.

use super::params::{AccommodationFilters, SearchParams};
use crate::features::shared::pagination::{PageRequest, MAX_LIMIT};
use crate::models::ACCOMMODATIONS_TABLE;

/// Columns returned for every accommodation row, in [`AccommodationRecord`] order
///
/// [`AccommodationRecord`]: crate::models::AccommodationRecord
pub const PROJECTION: &str = "id, external_id, name, registered_at, opened_at, category, capacity, \
     owner_email, address, postal_code, locality, latitude, longitude, parish, municipality, \
     district, created_at";

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Parameterized SQL text plus its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

/// Both statements needed to serve one page
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub count: Statement,
    pub data: Statement,
    /// Page window actually applied, after clamping
    pub page: PageRequest,
}

/// Accumulates predicates, numbering placeholders in the order they are pushed
#[derive(Debug, Default)]
struct WhereBuilder {
    predicates: Vec<String>,
    args: Vec<SqlArg>,
}

impl WhereBuilder {
    fn push(&mut self, column: &str, op: &str, arg: SqlArg) {
        self.args.push(arg);
        self.predicates
            .push(format!("{} {} ${}", column, op, self.args.len()));
    }

    fn text(&mut self, column: &str, value: &Option<String>) {
        if let Some(value) = value {
            self.push(column, "=", SqlArg::Text(value.clone()));
        }
    }

    fn int(&mut self, column: &str, op: &str, value: Option<i32>) {
        if let Some(value) = value {
            self.push(column, op, SqlArg::Int(i64::from(value)));
        }
    }

    fn float(&mut self, column: &str, op: &str, value: Option<f64>) {
        if let Some(value) = value {
            self.push(column, op, SqlArg::Float(value));
        }
    }

    fn clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }
}

fn where_builder(filters: &AccommodationFilters) -> WhereBuilder {
    let mut builder = WhereBuilder::default();

    builder.text("municipality", &filters.municipality);
    builder.text("district", &filters.district);
    builder.text("category", &filters.category);
    builder.text("owner_email", &filters.owner);
    builder.int("capacity", ">=", filters.min_capacity);
    builder.int("capacity", "<=", filters.max_capacity);
    builder.float("latitude", ">=", filters.min_lat);
    builder.float("latitude", "<=", filters.max_lat);
    builder.float("longitude", ">=", filters.min_lng);
    builder.float("longitude", "<=", filters.max_lng);

    builder
}

/// Compile `params` into its count and data statements
pub fn compile(params: &SearchParams) -> CompiledQuery {
    let page = PageRequest::new(params.page.page(), params.page.limit().min(MAX_LIMIT));
    let builder = where_builder(&params.filters);
    let where_clause = builder.clause();

    let count = Statement {
        sql: format!("SELECT COUNT(*) FROM {}{}", ACCOMMODATIONS_TABLE, where_clause),
        args: builder.args.clone(),
    };

    let limit_idx = builder.args.len() + 1;
    let offset_idx = limit_idx + 1;

    let mut data_args = builder.args;
    data_args.push(SqlArg::Int(page.limit()));
    data_args.push(SqlArg::Int(page.offset()));

    let data = Statement {
        sql: format!(
            "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ${} OFFSET ${}",
            PROJECTION,
            ACCOMMODATIONS_TABLE,
            where_clause,
            params.sort.column(),
            params.order.keyword(),
            limit_idx,
            offset_idx,
        ),
        args: data_args,
    };

    CompiledQuery { count, data, page }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accommodations::params::{SortField, SortOrder};

    fn params(filters: AccommodationFilters) -> SearchParams {
        SearchParams {
            filters,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_filters_means_no_where() {
        let compiled = compile(&SearchParams::default());

        assert_eq!(compiled.count.sql, "SELECT COUNT(*) FROM accommodations");
        assert!(compiled.count.args.is_empty());

        assert!(!compiled.data.sql.contains("WHERE"));
        assert!(compiled
            .data
            .sql
            .ends_with("FROM accommodations ORDER BY id ASC LIMIT $1 OFFSET $2"));
        assert_eq!(compiled.data.args, vec![SqlArg::Int(20), SqlArg::Int(0)]);
    }

    #[test]
    fn test_capacity_bounds() {
        let compiled = compile(&params(AccommodationFilters {
            min_capacity: Some(5),
            max_capacity: Some(20),
            ..Default::default()
        }));

        assert_eq!(
            compiled.count.sql,
            "SELECT COUNT(*) FROM accommodations WHERE capacity >= $1 AND capacity <= $2"
        );
        assert_eq!(compiled.count.args, vec![SqlArg::Int(5), SqlArg::Int(20)]);
    }

    #[test]
    fn test_data_args_extend_count_args() {
        let compiled = compile(&SearchParams {
            page: PageRequest::new(3, 10),
            sort: SortField::Name,
            order: SortOrder::Desc,
            filters: AccommodationFilters {
                district: Some("Faro".into()),
                min_lat: Some(37.0),
                ..Default::default()
            },
        });

        assert_eq!(
            compiled.count.args,
            vec![SqlArg::Text("Faro".into()), SqlArg::Float(37.0)]
        );
        assert_eq!(
            compiled.data.args,
            vec![
                SqlArg::Text("Faro".into()),
                SqlArg::Float(37.0),
                SqlArg::Int(10),
                SqlArg::Int(20),
            ]
        );
        assert!(compiled.data.sql.contains(
            " WHERE district = $1 AND latitude >= $2 ORDER BY name DESC LIMIT $3 OFFSET $4"
        ));
    }

    #[test]
    fn test_predicates_follow_fixed_order() {
        let compiled = compile(&params(AccommodationFilters {
            max_lng: Some(-7.0),
            owner: Some("a@b.pt".into()),
            municipality: Some("Porto".into()),
            max_capacity: Some(8),
            category: Some("Apartamento".into()),
            min_lng: Some(-9.5),
            district: Some("Porto".into()),
            max_lat: Some(42.0),
            min_capacity: Some(2),
            min_lat: Some(40.0),
        }));

        assert_eq!(
            compiled.count.sql,
            "SELECT COUNT(*) FROM accommodations WHERE municipality = $1 AND district = $2 \
             AND category = $3 AND owner_email = $4 AND capacity >= $5 AND capacity <= $6 \
             AND latitude >= $7 AND latitude <= $8 AND longitude >= $9 AND longitude <= $10"
        );
        assert_eq!(compiled.count.args.len(), 10);
        assert_eq!(compiled.count.args[0], SqlArg::Text("Porto".into()));
        assert_eq!(compiled.count.args[9], SqlArg::Float(-7.0));
        assert!(compiled.data.sql.ends_with("LIMIT $11 OFFSET $12"));
    }

    #[test]
    fn test_filter_values_are_never_interpolated() {
        let hostile = "x'; DROP TABLE accommodations; --";
        let compiled = compile(&params(AccommodationFilters {
            municipality: Some(hostile.into()),
            ..Default::default()
        }));

        assert!(!compiled.count.sql.contains(hostile));
        assert!(!compiled.data.sql.contains(hostile));
        assert_eq!(compiled.count.args, vec![SqlArg::Text(hostile.into())]);
    }

    #[test]
    fn test_count_and_data_share_where_clause() {
        let compiled = compile(&params(AccommodationFilters {
            category: Some("Moradia".into()),
            min_lng: Some(-8.0),
            ..Default::default()
        }));

        let clause = " WHERE category = $1 AND longitude >= $2";
        assert!(compiled.count.sql.ends_with(clause));
        assert!(compiled.data.sql.contains(&format!("{} ORDER BY", clause)));
    }

    #[test]
    fn test_page_past_the_end_keeps_offset() {
        let compiled = compile(&SearchParams {
            page: PageRequest::new(1000, 100),
            ..Default::default()
        });
        assert_eq!(compiled.data.args, vec![SqlArg::Int(100), SqlArg::Int(99_900)]);
        assert_eq!(compiled.page.offset(), 99_900);
    }

    #[test]
    fn test_projection_matches_record_columns() {
        let compiled = compile(&SearchParams::default());
        assert!(compiled.data.sql.starts_with(&format!("SELECT {} FROM", PROJECTION)));
        assert_eq!(PROJECTION.split(", ").count(), 17);
    }
}
