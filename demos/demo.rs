use axum::{
    body::Bytes,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use logline::AccessLogLayer;
use std::time::Duration;
use tokio::{net::TcpListener, time::sleep};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

async fn hello_handler() -> impl IntoResponse {
    sleep(Duration::from_millis(100)).await; // Simulate some work
    "Hello, World!"
}

async fn echo_handler(body: Bytes) -> impl IntoResponse {
    sleep(Duration::from_millis(50)).await;
    format!("Echo: {}", String::from_utf8_lossy(&body))
}

async fn teapot_handler() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, "short and stout")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    info!("Starting access-log demo server");

    let access_log = AccessLogLayer::new();

    // Uncomment to try a custom line format / Apache-style timestamps:
    // access_log.set_format("{{Method}} {{Path}} -> {{Status}} in {{Duration}}\n")?;
    // access_log.set_date_format("%d/%b/%Y:%H:%M:%S %z");

    let app = Router::new()
        .route("/hello", get(hello_handler))
        .route("/echo", post(echo_handler))
        .route("/teapot", get(teapot_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(access_log)
                .into_inner(),
        );

    info!("Demo server endpoints:");
    info!("  GET  /hello   - Simple greeting (100ms of work)");
    info!("  POST /echo    - Echo request body");
    info!("  GET  /teapot  - Non-200 status");
    info!("");
    info!("Try these commands and watch the access log on stdout:");
    info!("  curl http://localhost:3000/hello");
    info!("  curl -X POST -d 'Hello from client' http://localhost:3000/echo");
    info!("  curl http://localhost:3000/teapot");

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!("Demo server listening on http://localhost:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
