use std::convert::Infallible;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast;
use warp::{Filter, Rejection, Reply};

use crate::events::ChangeEvent;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};

fn event_stream(
    rx: broadcast::Receiver<ChangeEvent>,
) -> impl Stream<Item = Result<warp::sse::Event, Infallible>> {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse_event = warp::sse::Event::default()
                        .event(event.entity_name())
                        .json_data(&event)
                        .unwrap_or_else(|err| {
                            tracing::warn!("Dropping unserializable event: {}", err);
                            warp::sse::Event::default().comment("dropped")
                        });
                    return Some((Ok(sse_event), rx));
                }
                // A slow client misses events rather than killing the stream.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

/// Live mutation feed. Clients resubscribe after a disconnect and refetch
/// whatever they missed; the stream itself carries no history.
pub fn routes(
    store: Arc<SessionStore>,
    events_tx: broadcast::Sender<ChangeEvent>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("events")
        .and(warp::path::end())
        .and(warp::get())
        .and(authenticate(store))
        .and(with_broadcast(events_tx))
        .map(|_auth: AuthenticatedUser, tx: broadcast::Sender<ChangeEvent>| {
            let stream = event_stream(tx.subscribe());
            warp::sse::reply(warp::sse::keep_alive().stream(stream))
        })
}
