use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{accounts, auth, images};

pub fn build_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.upload.max_bytes;
    Router::new()
        .merge(auth::router())
        .merge(accounts::router())
        .merge(images::router(max_upload_bytes))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod app_tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::fake(dir.path()).await;
        (dir, build_app(state))
    }

    fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::get(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `name=value` of the session cookie set by the response.
    fn session_cookie(res: &Response) -> String {
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn register_and_login(app: &Router) -> String {
        let res = app
            .clone()
            .oneshot(post_json(
                "/account/register",
                json!({"firstname": "Ann", "lastname": "Lee", "email": "ann@example.com", "password": "Secr3t!"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["ok"], true);
        assert_eq!(
            body["message"],
            "Congratulations, you're registered Ann. Please log in."
        );

        let res = app
            .clone()
            .oneshot(post_json(
                "/account/login",
                json!({"account_email": "ann@example.com", "account_password": "Secr3t!"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        session_cookie(&res)
    }

    #[tokio::test]
    async fn health_ok() {
        let (_dir, app) = app().await;
        let res = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_sets_cookie_and_management_reads_it() {
        let (_dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let res = app
            .clone()
            .oneshot(get("/account/", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["account"]["email"], "ann@example.com");
        assert!(body["account"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_generic_401() {
        let (_dir, app) = app().await;
        register_and_login(&app).await;

        let res = app
            .oneshot(post_json(
                "/account/login",
                json!({"email": "ann@example.com", "password": "wrong"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        let body = json_body(res).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["message"], "Please check your credentials and try again.");
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_session() {
        let (_dir, app) = app().await;
        let res = app
            .clone()
            .oneshot(get("/account/", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(get("/account/", Some("jwt=forged.token.value")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_invalid_input_and_duplicates() {
        let (_dir, app) = app().await;
        let res = app
            .clone()
            .oneshot(post_json(
                "/account/register",
                json!({"firstname": "Ann", "lastname": "Lee", "email": "nope", "password": "Secr3t!"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        register_and_login(&app).await;
        let res = app
            .oneshot(post_json(
                "/account/register",
                json!({"firstname": "Ann", "lastname": "Lee", "email": "ANN@example.com", "password": "Secr3t!"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_reissues_cookie_and_edit_view_is_owner_only() {
        let (_dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let res = app
            .clone()
            .oneshot(post_json(
                "/account/update",
                json!({"firstname": "Annie", "lastname": "Lee", "email": "ann@example.com"}),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let fresh = session_cookie(&res);
        let body = json_body(res).await;
        let id = body["account"]["account_id"].as_i64().unwrap();

        let res = app
            .clone()
            .oneshot(get("/account/", Some(&fresh)))
            .await
            .unwrap();
        assert_eq!(json_body(res).await["account"]["firstname"], "Annie");

        let res = app
            .clone()
            .oneshot(get(&format!("/account/update/{}", id), Some(&fresh)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(get(&format!("/account/update/{}", id + 1), Some(&fresh)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn change_password_then_login_with_new_one() {
        let (_dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let res = app
            .clone()
            .oneshot(post_json(
                "/account/password",
                json!({"password": "weak"}),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(post_json(
                "/account/password",
                json!({"password": "N3wpass!"}),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(post_json(
                "/account/login",
                json!({"email": "ann@example.com", "password": "N3wpass!"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let (_dir, app) = app().await;
        let res = app.oneshot(get("/account/logout", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("jwt="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    fn multipart(field: &str, file_name: &str, content_type: &str, data: &str) -> (String, String) {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n--{b}--\r\n",
            b = boundary,
        );
        (format!("multipart/form-data; boundary={}", boundary), body)
    }

    fn upload(cookie: &str, content_type: String, body: String) -> Request<Body> {
        Request::post("/account/upload")
            .header(header::CONTENT_TYPE, content_type)
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn upload_then_serve_profile_image() {
        let (dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let (ct, body) = multipart("profile", "me.png", "image/png", "PNGDATA");
        let res = app.clone().oneshot(upload(&cookie, ct, body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let filename = body["filename"].as_str().unwrap().to_string();
        assert_eq!(body["account"]["profile_image"], filename.as_str());
        assert!(dir.path().join(&filename).exists());

        let res = app
            .clone()
            .oneshot(get(&format!("/account/profile-image/{}", filename), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"PNGDATA");

        let res = app
            .oneshot(get("/account/profile-image/nothing.png", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_rejections_are_distinct_and_leave_no_file() {
        let (dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let (ct, body) = multipart("profile", "run.sh", "text/x-shellscript", "echo");
        let res = app.clone().oneshot(upload(&cookie, ct, body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let wrong_type = json_body(res).await["message"].clone();

        let (ct, body) = multipart("other", "me.png", "image/png", "PNGDATA");
        let res = app.clone().oneshot(upload(&cookie, ct, body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let unexpected = json_body(res).await["message"].clone();

        let boundary = "XBOUNDARYX";
        let empty = format!("--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--{b}--\r\n", b = boundary);
        let res = app
            .oneshot(upload(
                &cookie,
                format!("multipart/form-data; boundary={}", boundary),
                empty,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let missing = json_body(res).await["message"].clone();

        assert_ne!(wrong_type, unexpected);
        assert_ne!(wrong_type, missing);
        assert_ne!(unexpected, missing);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_413() {
        let (dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let big = "x".repeat(crate::config::DEFAULT_UPLOAD_MAX_BYTES + 1);
        let (ct, body) = multipart("profile", "big.gif", "image/gif", &big);
        let res = app.oneshot(upload(&cookie, ct, body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_past_body_limit_is_413_not_malformed() {
        let (dir, app) = app().await;
        let cookie = register_and_login(&app).await;

        let big = "x".repeat(3 * 1024 * 1024);
        let (ct, body) = multipart("profile", "big.gif", "image/gif", &big);
        let res = app.oneshot(upload(&cookie, ct, body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            json_body(res).await["message"],
            "File too large. Maximum size is 2MB."
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
