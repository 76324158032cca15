use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{prelude::*, EnvFilter};
use warp::Filter;

use atelier::api::{self, ConflictError, DatabaseError, InvalidConfigurationError, NotFoundError,
                   ParseError, ValidationError};
use atelier::events::{self, Change};
use atelier::router::Router;
use atelier::session::{InvalidCredentials, InvalidSessionToken, NoSessionToken, SessionStore,
                       SharedPassword};
use atelier::tables::{establish_connection_pool, Collaborator, Contact, Outreach, Project, Task,
                      Venue};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    /// The shared password gating the API.
    #[arg(long, env = "ATELIER_PASSWORD")]
    password: String,
}

async fn handle_rejection(err: warp::reject::Rejection) -> Result<impl warp::Reply, std::convert::Infallible> {
    if let Some(_) = err.find::<ConflictError>() {
        let json = warp::reply::json(&"Conflict: Resource already exists");
        let response = warp::reply::with_status(json, warp::http::StatusCode::CONFLICT);
        return Ok(response);
    }
    if let Some(_) = err.find::<ParseError>() {
        let json = warp::reply::json(&"Invalid parameter, parsing failed");
        let response = warp::reply::with_status(json, warp::http::StatusCode::BAD_REQUEST);
        return Ok(response);
    }
    if let Some(_) = err.find::<ValidationError>() {
        let json = warp::reply::json(&"Invalid field value provided");
        let response = warp::reply::with_status(json, warp::http::StatusCode::BAD_REQUEST);
        return Ok(response);
    }
    if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        let json = warp::reply::json(&"Invalid request body");
        let response = warp::reply::with_status(json, warp::http::StatusCode::BAD_REQUEST);
        return Ok(response);
    }
    if let Some(_) = err.find::<NotFoundError>() {
        let json = warp::reply::json(&"Not Found: Resource does not exist");
        let response = warp::reply::with_status(json, warp::http::StatusCode::NOT_FOUND);
        return Ok(response);
    }
    if let Some(_) = err.find::<InvalidCredentials>() {
        let json = warp::reply::json(&"Unauthorized");
        let response = warp::reply::with_status(json, warp::http::StatusCode::UNAUTHORIZED);
        return Ok(response);
    }
    if let Some(_) = err.find::<InvalidSessionToken>() {
        let json = warp::reply::json(&"Unauthorized");
        let response = warp::reply::with_status(json, warp::http::StatusCode::UNAUTHORIZED);
        return Ok(response);
    }
    if let Some(_) = err.find::<NoSessionToken>() {
        let json = warp::reply::json(&"Unauthorized");
        let response = warp::reply::with_status(json, warp::http::StatusCode::UNAUTHORIZED);
        return Ok(response);
    }
    if let Some(_) = err.find::<InvalidConfigurationError>() {
        let json = warp::reply::json(&"Server configuration is incomplete");
        let response = warp::reply::with_status(json, warp::http::StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(response);
    }
    if let Some(db_err) = err.find::<DatabaseError>() {
        tracing::error!("DB Error: {:?}", db_err);
        let json = warp::reply::json(&"Database Error");
        let response = warp::reply::with_status(json, warp::http::StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(response);
    }
    tracing::error!("Unhandled Error: {:?}", err);
    let json = warp::reply::json(&"Unhandled error");
    Ok(warp::reply::with_status(json, warp::http::StatusCode::INTERNAL_SERVER_ERROR))
}

fn setup_tracing() {
    let tracing_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true);

    #[cfg(debug_assertions)]
    let filter_layer = EnvFilter::new("atelier=debug");
    #[cfg(not(debug_assertions))]
    let filter_layer = EnvFilter::new("atelier=info");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_layer)
        .init();

    tracing::info!("Atelier started");
}

#[tokio::main]
async fn main() {
    setup_tracing();
    let args = Args::parse();

    let pool = establish_connection_pool(&args.database_url);
    let pool = Arc::new(pool);

    let store = Arc::new(SessionStore::new());
    let password = Arc::new(SharedPassword(args.password));

    let mut router = Router::new();
    let venue_tx: broadcast::Sender<Change<Venue>> = router.announce();
    let contact_tx: broadcast::Sender<Change<Contact>> = router.announce();
    let collaborator_tx: broadcast::Sender<Change<Collaborator>> = router.announce();
    let project_tx: broadcast::Sender<Change<Project>> = router.announce();
    let task_tx: broadcast::Sender<Change<Task>> = router.announce();
    let outreach_tx: broadcast::Sender<Change<Outreach>> = router.announce();
    let events_tx = events::emit_events(&mut router);

    let log_requests = warp::log::custom(|info| {
        tracing::info!("{} {} {} {}",
                       info.remote_addr()
                           .map(|addr| addr.to_string())
                           .unwrap_or_else(|| "???".into()),
                       info.method(),
                       info.path(),
                       info.status());
    });

    let routes = api::sessions::routes(password, store.clone())
        .or(api::venues::routes(store.clone(), pool.clone(), venue_tx))
        .or(api::contacts::routes(store.clone(), pool.clone(), contact_tx))
        .or(api::collaborators::routes(store.clone(), pool.clone(), collaborator_tx))
        .or(api::projects::routes(store.clone(), pool.clone(), project_tx))
        .or(api::tasks::routes(store.clone(), pool.clone(), task_tx))
        .or(api::outreach::routes(store.clone(), pool.clone(), outreach_tx))
        .or(api::links::routes(store.clone(), pool.clone()))
        .or(api::dashboard::routes(store.clone(), pool.clone()))
        .or(api::scout::routes(store.clone(), pool.clone()))
        .or(api::events::routes(store.clone(), events_tx))
        .recover(handle_rejection)
        .with(log_requests);

    tracing::info!("Listening on {}:{}", args.host, args.port);
    warp::serve(routes).run((args.host, args.port)).await;
}
