//! HTTP access to the student API.
//!
//! Two endpoints are consumed:
//! - `GET {base}/students?page=&limit=[&search=][&min_gpa=][&max_gpa=]`
//! - `GET {base}/students/stats`

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::models::{StatsSummary, StudentRecord};
use crate::query::QueryState;

/// Source of records and stats. The synchronizer is generic over this so it
/// can be driven without a network.
pub trait StudentApi {
    fn list_students(
        &self,
        query: &QueryState,
    ) -> impl Future<Output = Result<Vec<StudentRecord>>>;

    fn fetch_stats(&self) -> impl Future<Output = Result<StatsSummary>>;
}

/// Query pairs for the record-list request. Absent filters are left out of
/// the request entirely rather than sent empty.
pub fn record_list_params(query: &QueryState) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("limit", query.page_size.to_string()),
    ];
    if !query.search.is_empty() {
        params.push(("search", query.search.clone()));
    }
    if let Some(min_gpa) = query.min_gpa {
        params.push(("min_gpa", min_gpa.to_string()));
    }
    if let Some(max_gpa) = query.max_gpa {
        params.push(("max_gpa", max_gpa.to_string()));
    }
    params
}

pub struct HttpStudentApi {
    client: Client,
    base_url: String,
}

impl HttpStudentApi {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn students_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn stats_url(&self) -> String {
        format!("{}/students/stats", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl StudentApi for HttpStudentApi {
    async fn list_students(&self, query: &QueryState) -> Result<Vec<StudentRecord>> {
        let params = record_list_params(query);
        debug!(url = %self.students_url(), ?params, "requesting student page");
        self.get_json(self.client.get(self.students_url()).query(&params))
            .await
    }

    async fn fetch_stats(&self) -> Result<StatsSummary> {
        debug!(url = %self.stats_url(), "requesting student stats");
        self.get_json(self.client.get(self.stats_url())).await
    }
}
