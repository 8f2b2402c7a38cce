use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::api::ApiState;
use crate::pipeline::Article;

/// One article as exposed by the web API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub link: String,
    pub summary: String,
}

impl From<Article> for ArticleRecord {
    fn from(article: Article) -> Self {
        Self {
            title: article.title,
            link: article.link,
            summary: article.summary,
        }
    }
}

/// Runs one pipeline cycle and returns the new articles.
///
/// Shares the dedup cache with the chat transport: an article returned here
/// will not be sent to a chat later, and vice versa.
pub async fn list_articles(State(state): State<ApiState>) -> ApiResult<Json<Vec<ArticleRecord>>> {
    let articles = state.pipeline.next_batch().await?;
    Ok(Json(articles.into_iter().map(ArticleRecord::from).collect()))
}

/// Bare OPTIONS requests (no CORS pre-flight headers) get an empty 200.
pub async fn options() -> StatusCode {
    StatusCode::OK
}
