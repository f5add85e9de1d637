#![deny(missing_docs)]

//! # Larder Web Binary
//!
//! Entry point for the Actix Web server and its deadline sweep.

use actix_web::{web, App, HttpServer};
use larder_voting::{
    ChannelPublisher, DataChangePublisher, MemoryStore, Sweeper, VotingEngine, VotingStore,
};
use larder_web::{configure, PgStore, WebConfig, WebResult};
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn build_server(
    listener: TcpListener,
    engine: VotingEngine,
) -> std::io::Result<actix_web::dev::Server> {
    let engine = web::Data::new(engine);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .configure(configure)
    })
    .listen(listener)?
    .run())
}

fn build_engine(config: &WebConfig) -> WebResult<VotingEngine> {
    let store: Arc<dyn VotingStore> = match &config.database_url {
        Some(url) => {
            info!(pool_size = config.db_pool_size, "using postgres store");
            Arc::new(PgStore::connect(url, config.db_pool_size)?)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let (publisher, mut changes) = ChannelPublisher::new(1024);
    tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            debug!(
                event_type = %change.event_type,
                meal_plan_id = %change.meal_plan_id,
                household_id = %change.household_id,
                "data change"
            );
        }
    });
    let publisher: Arc<dyn DataChangePublisher> = Arc::new(publisher);
    Ok(VotingEngine::new(store, publisher))
}

async fn run(config: WebConfig) -> WebResult<()> {
    let engine = build_engine(&config)?;
    let listener = TcpListener::bind(&config.bind)?;
    info!(bind = %listener.local_addr()?, "larder-web listening");

    let sweeper = Sweeper::new(engine.clone(), config.sweep_interval()).start();
    let server = build_server(listener, engine)?;

    if config.oneshot {
        server.handle().stop(true).await;
    }

    let served = server.await;
    sweeper.stop().await;
    Ok(served?)
}

#[actix_web::main]
async fn main() -> WebResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    run(WebConfig::load()).await
}
