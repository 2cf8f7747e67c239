//! Web front end: a single search form plus a small JSON API over the same
//! query path the CLI uses.

use crate::core::RankedPaper;
use crate::query::{QueryError, QuerySettings, SearchContext};
use crate::retrieval::RetrievalClient;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use minijinja::{context, Environment};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

const INDEX_TEMPLATE: &str = "index.html";

/// Values the form starts with when the user leaves a field empty.
#[derive(Debug, Clone, Copy)]
pub struct FormDefaults {
    pub k: i64,
    pub min_year: i64,
}

pub struct AppState<C> {
    search: SearchContext<C>,
    templates: Environment<'static>,
    defaults: FormDefaults,
}

impl<C: RetrievalClient + 'static> AppState<C> {
    pub fn new(search: SearchContext<C>, defaults: FormDefaults) -> Result<Self, minijinja::Error> {
        Ok(AppState {
            search,
            templates: build_template_env()?,
            defaults,
        })
    }
}

fn build_template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, include_str!("templates/index.html"))?;
    Ok(env)
}

/// Form fields arrive as strings so that a bad number is reported the same way
/// as any other invalid query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    query: Option<String>,
    k: Option<String>,
    min_year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiParams {
    q: Option<String>,
    k: Option<String>,
    min_year: Option<String>,
}

fn parse_number(raw: Option<&str>, default: i64, field: &str) -> Result<i64, QueryError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| {
            QueryError::InvalidQuery(format!("{} must be an integer, got '{}'", field, value))
        }),
    }
}

fn settings_from(
    query: Option<&str>,
    k: Option<&str>,
    min_year: Option<&str>,
    defaults: FormDefaults,
) -> Result<QuerySettings, QueryError> {
    let k = parse_number(k, defaults.k, "k")?;
    let min_year = parse_number(min_year, defaults.min_year, "min_year")?;
    QuerySettings::new(query.unwrap_or_default(), k, min_year)
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        QueryError::RetrievalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

struct PageView<'a> {
    query: Option<&'a str>,
    k: String,
    min_year: String,
    results: &'a [RankedPaper],
    error: Option<String>,
    searched: bool,
}

fn render_page<C>(state: &AppState<C>, status: StatusCode, view: PageView<'_>) -> Response {
    let rendered = state.templates.get_template(INDEX_TEMPLATE).and_then(|template| {
        template.render(context! {
            query => view.query,
            k => view.k,
            min_year => view.min_year,
            results => view.results,
            error => view.error,
            searched => view.searched,
        })
    });
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

async fn index<C: RetrievalClient + 'static>(State(state): State<Arc<AppState<C>>>) -> Response {
    render_page(
        &state,
        StatusCode::OK,
        PageView {
            query: None,
            k: state.defaults.k.to_string(),
            min_year: state.defaults.min_year.to_string(),
            results: &[],
            error: None,
            searched: false,
        },
    )
}

async fn search_form<C: RetrievalClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Form(form): Form<SearchForm>,
) -> Response {
    let k_field = form.k.clone().unwrap_or_else(|| state.defaults.k.to_string());
    let year_field = form
        .min_year
        .clone()
        .unwrap_or_else(|| state.defaults.min_year.to_string());

    let outcome = match settings_from(
        form.query.as_deref(),
        form.k.as_deref(),
        form.min_year.as_deref(),
        state.defaults,
    ) {
        Ok(settings) => state.search.run(&settings).await,
        Err(e) => Err(e),
    };
    info!(ok = outcome.is_ok(), "form search");

    let (status, results, error) = match outcome {
        Ok(results) => (StatusCode::OK, results, None),
        Err(e) => (status_for(&e), Vec::new(), Some(e.to_string())),
    };
    render_page(
        &state,
        status,
        PageView {
            query: form.query.as_deref(),
            k: k_field,
            min_year: year_field,
            results: &results,
            error,
            searched: true,
        },
    )
}

async fn api_search<C: RetrievalClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Query(params): Query<ApiParams>,
) -> Response {
    let outcome = match settings_from(
        params.q.as_deref(),
        params.k.as_deref(),
        params.min_year.as_deref(),
        state.defaults,
    ) {
        Ok(settings) => state.search.run(&settings).await,
        Err(e) => Err(e),
    };
    info!(ok = outcome.is_ok(), "api search");

    match outcome {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(e) => (status_for(&e), Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router<C: RetrievalClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/", get(index::<C>).post(search_form::<C>))
        .route("/api/search", get(api_search::<C>))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve<C: RetrievalClient + 'static>(
    state: AppState<C>,
    addr: &str,
    open_browser: bool,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let url = format!("http://{}", listener.local_addr()?);
    crate::blog!("Serving", "{}", url);
    if open_browser {
        if let Err(e) = webbrowser::open(&url) {
            crate::blog_warning!("Browser", "failed to open {}: {}", url, e);
        }
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PaperRecord;
    use crate::metadata::MetadataIndex;
    use crate::query::QueryOptions;
    use crate::retrieval::{RetrievalError, SearchHit};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedClient {
        contents: Vec<&'static str>,
        down: bool,
    }

    #[async_trait]
    impl RetrievalClient for FixedClient {
        async fn search(&self, _query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
            if self.down {
                return Err(RetrievalError::Unavailable("engine offline".to_string()));
            }
            Ok(self
                .contents
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, content)| SearchHit {
                    content: content.to_string(),
                    score: 10.0 - i as f32,
                    rank: i + 1,
                    record_id: None,
                })
                .collect())
        }
    }

    fn record(title: &str, year: i64, abstract_text: &str) -> PaperRecord {
        PaperRecord::new(
            None,
            title.to_string(),
            year,
            "Jane Doe".to_string(),
            "ACL".to_string(),
            abstract_text.to_string(),
            Some(format!("https://aclanthology.org/{}", title)),
        )
    }

    async fn spawn(client: FixedClient) -> String {
        let metadata = MetadataIndex::from_records(vec![
            record("Alpha", 2014, "alpha <abstract>"),
            record("Beta", 2021, "beta abstract"),
        ]);
        let options = QueryOptions {
            timeout: Duration::from_secs(1),
            retries: 0,
            retry_delay: Duration::ZERO,
        };
        let state = AppState::new(
            SearchContext::new(client, metadata, options),
            FormDefaults { k: 5, min_year: 0 },
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn engine() -> FixedClient {
        FixedClient {
            contents: vec!["beta abstract", "unknown", "alpha <abstract>"],
            down: false,
        }
    }

    #[test]
    fn numbers_fall_back_to_defaults() {
        let defaults = FormDefaults { k: 5, min_year: 2010 };
        let settings = settings_from(Some("parsing"), Some(" "), None, defaults).unwrap();
        assert_eq!(settings.k, 5);
        assert_eq!(settings.min_year, 2010);

        let err = settings_from(Some("parsing"), Some("five"), None, defaults).unwrap_err();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
        assert!(settings_from(Some("  "), None, None, defaults).is_err());
        assert!(settings_from(Some("parsing"), Some("0"), None, defaults).is_err());
    }

    #[tokio::test]
    async fn form_page_renders() {
        let base = spawn(engine()).await;
        let response = reqwest::get(format!("{}/", base)).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("<form"));
        assert!(!body.contains("No results"));
    }

    #[tokio::test]
    async fn form_search_lists_results_in_order() {
        let base = spawn(engine()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/", base))
            .form(&[("query", "neural"), ("k", "3"), ("min_year", "")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body = response.text().await.unwrap();
        let beta = body.find("Beta").unwrap();
        let alpha = body.find("Alpha").unwrap();
        assert!(beta < alpha);
        assert!(body.contains("alpha &lt;abstract&gt;"));
    }

    #[tokio::test]
    async fn form_search_with_nothing_found_says_so() {
        let base = spawn(engine()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/", base))
            .form(&[("query", "neural"), ("min_year", "2030")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.text().await.unwrap().contains("No results"));
    }

    #[tokio::test]
    async fn blank_form_query_is_a_bad_request() {
        let base = spawn(engine()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/", base))
            .form(&[("query", "   ")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert!(response.text().await.unwrap().contains("class=\"error\""));
    }

    #[tokio::test]
    async fn api_returns_json_and_filters_by_year() {
        let base = spawn(engine()).await;
        let body: serde_json::Value =
            reqwest::get(format!("{}/api/search?q=neural&k=3&min_year=2020", base))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Beta");
        assert_eq!(results[0]["rank"], 1);
    }

    #[tokio::test]
    async fn api_maps_engine_failure_to_503() {
        let base = spawn(FixedClient {
            contents: Vec::new(),
            down: true,
        })
        .await;
        let response = reqwest::get(format!("{}/api/search?q=neural", base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 503);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("engine offline"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let base = spawn(engine()).await;
        let body = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
