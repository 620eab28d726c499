//! Extractors that reject malformed requests with an [Error] instead of axum's plain text.

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// Like [axum::Json], but a body that cannot be parsed is a [Error::ValidationError].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Like [axum::extract::Query], but a bad query string is a [Error::ValidationError].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::json;

    use crate::extract::{AppJson, AppQuery};

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: u64,
    }

    async fn echo_page(AppJson(paging): AppJson<Paging>) -> AppJson<u64> {
        AppJson(paging.page)
    }

    async fn query_page(AppQuery(paging): AppQuery<Paging>) -> String {
        paging.page.to_string()
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/json", post(echo_page))
            .route("/query", get(query_page));

        TestServer::new(app)
    }

    #[tokio::test]
    async fn valid_json_is_extracted() {
        let response = get_test_server().post("/json").json(&json!({ "page": 2 })).await;

        response.assert_status_ok();
        response.assert_json(&json!(2));
    }

    #[tokio::test]
    async fn invalid_json_is_json_bad_request() {
        let response = get_test_server()
            .post("/json")
            .json(&json!({ "page": -1 }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("page"));
    }

    #[tokio::test]
    async fn invalid_query_is_json_bad_request() {
        let response = get_test_server().get("/query?page=first").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["error"].is_string());
    }
}
