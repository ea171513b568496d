//! Shared fixtures for router-level tests
//!
//! [`FakeStore`] stands in for PostgreSQL. It records every statement it is handed and pages
//! its rows using the trailing `LIMIT`/`OFFSET` arguments, so tests can assert both on what the
//! handlers compiled and on what a client receives.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lodging_server::{
    admission::{AdmissionController, BucketSettings},
    api::{self, AppState},
    config::{AuthConfig, CorsConfig},
    db::{AccommodationStore, StoreError, StoreResult},
    features::accommodations::{SqlArg, Statement},
    models::{AccommodationRecord, AccommodationStats},
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "s3cret-pass";

pub fn created_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn record(id: i32) -> AccommodationRecord {
    AccommodationRecord {
        id,
        external_id: Some(100_000 + id),
        name: Some(format!("Alojamento {}", id)),
        category: Some("Apartamento".to_string()),
        capacity: Some(4),
        municipality: Some("Lisboa".to_string()),
        district: Some("Lisboa".to_string()),
        created_at: created_at(),
        ..Default::default()
    }
}

pub fn records(count: i32) -> Vec<AccommodationRecord> {
    (1..=count).map(record).collect()
}

#[derive(Default)]
pub struct FakeStore {
    rows: Vec<AccommodationRecord>,
    stats: AccommodationStats,
    statements: Mutex<Vec<Statement>>,
    failing: bool,
    delay: Option<Duration>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<AccommodationRecord>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn with_stats(mut self, stats: AccommodationStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn slow(rows: Vec<AccommodationRecord>, delay: Duration) -> Self {
        Self {
            rows,
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    async fn enter(&self, statement: Option<&Statement>) -> StoreResult<()> {
        if let Some(statement) = statement {
            self.statements.lock().unwrap().push(statement.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn int_arg(arg: &SqlArg) -> usize {
    match arg {
        SqlArg::Int(value) => usize::try_from(*value).unwrap(),
        other => panic!("expected an integer argument, got {:?}", other),
    }
}

#[async_trait]
impl AccommodationStore for FakeStore {
    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64> {
        self.enter(Some(statement)).await?;
        Ok(self.rows.len() as i64)
    }

    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<AccommodationRecord>> {
        self.enter(Some(statement)).await?;

        let n = statement.args.len();
        let limit = int_arg(&statement.args[n - 2]);
        let offset = int_arg(&statement.args[n - 1]);

        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn fetch_by_id(&self, id: i32) -> StoreResult<Option<AccommodationRecord>> {
        self.enter(None).await?;
        Ok(self.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn fetch_stats(&self) -> StoreResult<AccommodationStats> {
        self.enter(None).await?;
        Ok(self.stats.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.enter(None).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeStore>,
    pub admission: Arc<AdmissionController>,
}

pub struct TestAppBuilder {
    store: FakeStore,
    rps: f64,
    burst: u32,
    query_timeout: Duration,
    cors: CorsConfig,
}

impl TestAppBuilder {
    pub fn new(store: FakeStore) -> Self {
        Self {
            store,
            rps: 1000.0,
            burst: 1000,
            query_timeout: Duration::from_secs(5),
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                allow_credentials: false,
            },
        }
    }

    pub fn rate_limit(mut self, rps: f64, burst: u32) -> Self {
        self.rps = rps;
        self.burst = burst;
        self
    }

    pub fn cors(mut self, origins: &[&str], allow_credentials: bool) -> Self {
        self.cors = CorsConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            allow_credentials,
        };
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(self.store);
        let settings = BucketSettings::new(self.rps, self.burst).unwrap();
        let admission = Arc::new(AdmissionController::new(settings, Duration::from_secs(300)));

        let state = AppState {
            store: store.clone(),
            admission: Arc::clone(&admission),
            credentials: Arc::new(AuthConfig {
                username: ADMIN_USER.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            query_timeout: self.query_timeout,
        };

        TestApp {
            router: api::create_router(state, &self.cors),
            store,
            admission,
        }
    }
}

pub fn app(store: FakeStore) -> TestApp {
    TestAppBuilder::new(store).build()
}

pub fn client(ip: [u8; 4]) -> SocketAddr {
    SocketAddr::from((ip, 40_000))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

impl TestApp {
    /// Send a request as if it arrived from `from`
    pub async fn send(&self, request: Request<Body>, from: SocketAddr) -> TestResponse {
        let mut request = request;
        request.extensions_mut().insert(ConnectInfo(from));

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_from(uri, client([127, 0, 0, 1])).await
    }

    pub async fn get_from(&self, uri: &str, from: SocketAddr) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request, from).await
    }
}
