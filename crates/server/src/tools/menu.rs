//! menu_day and menu_dates tool implementations.
//!
//! Convenience wrappers that issue the menu viewer's own API requests
//! through the worker, so they are cached and served offline exactly like
//! the page's requests.

use chrono::{Datelike, NaiveDate};
use mealsw_client::{RouteOutcome, Worker};
use mealsw_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const MEALS_PATH: &str = "/api/v1/meals";
pub const AVAILABLE_DATES_PATH: &str = "/api/v1/meals/available-dates";

/// Parameters for the menu_day tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MenuDayParams {
    /// Date in YYYY-MM-DD format.
    pub date: String,

    /// Restrict to these meal types (e.g. "breakfast", "lunch").
    #[serde(default)]
    pub meal_types: Vec<String>,
}

/// Output from the menu tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MenuOutput {
    pub url: String,
    /// How the worker answered: `network`, `cache-hit`, `fallback` or `synthetic`.
    pub outcome: String,
    pub status: Option<u16>,
    /// Parsed JSON body. Absent when nothing could be served.
    pub data: Option<Value>,
}

/// Build the meals URL for one day. Month and day are not zero-padded.
pub fn meals_url(worker: &Worker, date: NaiveDate, meal_types: &[String]) -> Result<Url, Error> {
    let mut url = worker.resolve(MEALS_PATH)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("year", &date.year().to_string())
            .append_pair("month", &date.month().to_string())
            .append_pair("day", &date.day().to_string());

        let types: Vec<&str> = meal_types.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if !types.is_empty() {
            query.append_pair("meal_types", &types.join(","));
        }
    }
    Ok(url)
}

async fn fetch_json(worker: &Worker, url: Url) -> Result<MenuOutput, Error> {
    let request = Request::get(url.clone()).with_header("Accept", "application/json");
    let outcome: RouteOutcome = worker.on_fetch(request).await?;
    let kind = outcome.kind();

    let (status, data) = match outcome.into_response() {
        Some(response) => {
            let data: Option<Value> = serde_json::from_slice(&response.body).ok();
            (Some(response.status), data)
        }
        None => (None, None),
    };

    Ok(MenuOutput { url: url.to_string(), outcome: kind.as_str().to_string(), status, data })
}

/// Implementation of the menu_day tool.
pub async fn menu_day_impl(worker: &Worker, params: MenuDayParams) -> Result<CallToolResult, McpError> {
    let date = NaiveDate::parse_from_str(params.date.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("date must be YYYY-MM-DD: {e}")))?;

    let url = meals_url(worker, date, &params.meal_types)?;
    let output = fetch_json(worker, url).await?;
    super::json_result(&output)
}

/// Implementation of the menu_dates tool.
pub async fn menu_dates_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(AVAILABLE_DATES_PATH)?;
    let output = fetch_json(worker, url).await?;
    super::json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker};
    use mealsw_core::Response;

    #[tokio::test]
    async fn test_meals_url() {
        let (worker, _network) = worker().await;
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let url = meals_url(&worker, date, &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/meals?year=2025&month=1&day=1");

        let url = meals_url(&worker, date, &["breakfast".into(), " ".into(), "lunch".into()]).unwrap();
        assert_eq!(url.query(), Some("year=2025&month=1&day=1&meal_types=breakfast%2Clunch"));
    }

    #[tokio::test]
    async fn test_menu_day() {
        let (worker, network) = worker().await;
        network.respond("GET", "/api/v1/meals?year=2025&month=3&day=14", Response::new(200, r#"{"date":"2025-03-14"}"#));

        let params = MenuDayParams { date: "2025-03-14".into(), meal_types: Vec::new() };
        let output: MenuOutput = parse_output(&menu_day_impl(&worker, params).await.unwrap());
        assert_eq!(output.outcome, "network");
        assert_eq!(output.data, Some(serde_json::json!({ "date": "2025-03-14" })));
    }

    #[tokio::test]
    async fn test_menu_day_bad_date() {
        let (worker, _network) = worker().await;
        let params = MenuDayParams { date: "14/03/2025".into(), meal_types: Vec::new() };
        assert!(menu_day_impl(&worker, params).await.is_err());
    }

    #[tokio::test]
    async fn test_menu_dates_offline_without_cache() {
        let (worker, network) = worker().await;
        network.set_offline(true);

        let output: MenuOutput = parse_output(&menu_dates_impl(&worker).await.unwrap());
        assert_eq!(output.outcome, "fallback");
        assert!(output.status.is_none());
        assert!(output.data.is_none());
    }
}
