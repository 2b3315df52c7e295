mod db;
mod frame;
mod routes;
mod services;
mod state;

use std::net::{Ipv4Addr, SocketAddr};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must point at Postgres");
    let port = std::env::var("PORT")
        .map_or(Ok(3000), |v| v.parse::<u16>())
        .expect("PORT must be a port number");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database unavailable");
    let app = routes::app(state::AppState::new(pool));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("could not bind listen address");

    tracing::info!(%addr, "agora listening");
    axum::serve(listener, app).await.expect("server exited");
}
