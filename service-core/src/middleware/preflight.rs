//! OPTIONS response middleware.
//!
//! `tower_http::cors::CorsLayer` short-circuits every OPTIONS request with an
//! empty 200. This API answers OPTIONS with 204 and no body, so this layer
//! sits outside the CORS layer and rewrites that reply, keeping whatever
//! CORS headers were set.

use axum::body::Body;
use axum::http::{Method, StatusCode};
use axum::{extract::Request, middleware::Next, response::Response};

pub async fn preflight_middleware(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;

    let response = next.run(req).await;

    if is_options && response.status() == StatusCode::OK {
        let (mut parts, _) = response.into_parts();
        parts.status = StatusCode::NO_CONTENT;
        return Response::from_parts(parts, Body::empty());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use axum::middleware::from_fn;
    use axum::routing::{get, options};
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn options_replies_are_rewritten_to_no_content() {
        // Stands in for the CORS layer: 200, empty-ish body, one header.
        let app = Router::new()
            .route(
                "/",
                options(|| async { ([(header::ALLOW, "GET, POST")], "") }),
            )
            .layer(from_fn(preflight_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, POST");
    }

    #[tokio::test]
    async fn non_options_responses_pass_through() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn(preflight_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
