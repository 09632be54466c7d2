#![cfg(not(tarpaulin_include))]

//! Local preview server for the static storefront.
//!
//! Serves `static/` (markup, host script and the wasm-pack output under
//! `static/pkg`). It does no processing of its own.

use axum::{Router, response::Html, routing::get};
use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

fn try_load<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {} value {:?}: {}, using default", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port: u16 = try_load("PREVIEW_PORT", 8080);
    let root: String = try_load("PREVIEW_ROOT", "static".to_string());

    let app = Router::new()
        .route("/", get(serve_landing))
        .nest_service("/static", ServeDir::new(&root));

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Serving {} on http://127.0.0.1:{}", root, port);
    axum::serve(listener, app).await?;

    Ok(())
}
