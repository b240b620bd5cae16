//! Search and suggestion routes

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::api_error::ApiError;
use super::client_id::ClientId;
use super::state::{GuardedSearchOrchestrator, GuardedSuggestionClient, ServerState};
use crate::search::{RateLimitRefusal, SearchDecision, SearchQuery};

/// Loosely typed so that a wrong type is answered with our own 400 body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    #[serde(default)]
    query: Value,
    #[serde(default)]
    max_results: Value,
}

impl SearchBody {
    fn into_query(self) -> Result<SearchQuery, ApiError> {
        let text = match &self.query {
            Value::String(text) => text,
            _ => return Err(ApiError::bad_request("Search query is required")),
        };
        // Counts arrive as numbers or numeric strings; anything else means
        // the default.
        let max_results = match &self.max_results {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        SearchQuery::new(text, max_results)
            .ok_or_else(|| ApiError::bad_request("Search query is required"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitedBody {
    error: &'static str,
    wait_time: u64,
    remaining_requests: u32,
    rate_limited: bool,
}

impl From<RateLimitRefusal> for RateLimitedBody {
    fn from(refusal: RateLimitRefusal) -> Self {
        Self {
            error: "Too many requests. Please wait before searching again.",
            wait_time: refusal.wait_time_secs,
            remaining_requests: refusal.remaining_requests,
            rate_limited: true,
        }
    }
}

async fn search(
    ClientId(client_id): ClientId,
    State(orchestrator): State<GuardedSearchOrchestrator>,
    payload: Result<Json<SearchBody>, JsonRejection>,
) -> Response {
    let query = match payload {
        Ok(Json(body)) => body.into_query(),
        Err(rejection) => {
            debug!("Rejected search body: {}", rejection);
            Err(ApiError::bad_request("Search query is required"))
        }
    };
    let query = match query {
        Ok(query) => query,
        Err(err) => return err.into_response(),
    };

    match orchestrator.handle(&client_id, &query).await {
        SearchDecision::Served(outcome) => Json(outcome).into_response(),
        SearchDecision::Refused(refusal) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitedBody::from(refusal)),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionsQuery {
    #[serde(default)]
    q: String,
}

async fn suggestions(
    State(client): State<GuardedSuggestionClient>,
    Query(params): Query<SuggestionsQuery>,
) -> impl IntoResponse {
    Json(client.suggest(&params.q).await)
}

pub fn make_search_routes(state: ServerState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/suggestions", get(suggestions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> SearchBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_numeric_string_counts() {
        let query = body(json!({"query": "cats", "maxResults": "5"}))
            .into_query()
            .unwrap();
        assert_eq!(query.max_results(), 5);
    }

    #[test]
    fn rejects_non_string_queries() {
        for value in [json!({}), json!({"query": 42}), json!({"query": "   "})] {
            let err = body(value).into_query().unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn odd_counts_use_defaults_or_clamp() {
        let query = body(json!({"query": "cats", "maxResults": true}))
            .into_query()
            .unwrap();
        assert_eq!(query.max_results(), 20);

        let query = body(json!({"query": "cats", "maxResults": 500}))
            .into_query()
            .unwrap();
        assert_eq!(query.max_results(), 50);
    }

    #[test]
    fn rate_limited_body_shape() {
        let body = RateLimitedBody::from(RateLimitRefusal {
            wait_time_secs: 42,
            remaining_requests: 0,
        });
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["waitTime"], 42);
        assert_eq!(value["remainingRequests"], 0);
        assert_eq!(value["rateLimited"], true);
        assert!(value["error"].is_string());
    }
}
