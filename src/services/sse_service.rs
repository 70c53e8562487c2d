use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::{common::CompetitionSnapshot, sse::ServerEvent},
    services::division_feed::DivisionFeed,
    state::{SharedState, ViewerRegistration, ViewerTransport, division::Division, store::StateSnapshot},
};

/// Open a viewer stream on `division`: the current state first, then one frame
/// per applied change.
pub async fn subscribe(
    state: &SharedState,
    division: Division,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let registration = state.register_viewer(ViewerTransport::Sse);
    registration.follow(division);
    let (snapshot, feed) = DivisionFeed::open(state, division).await;
    info!(%division, viewer = %registration.id(), "new SSE viewer");
    to_sse_stream(state.config().sse_retry(), snapshot, feed, registration)
}

/// Convert a division feed into an SSE response, forwarding frames and
/// unregistering the viewer once the client disconnects.
fn to_sse_stream(
    retry: Duration,
    initial: StateSnapshot,
    mut feed: DivisionFeed,
    registration: ViewerRegistration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(event) = state_event(&initial, Some(retry)) {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                frame = feed.next() => {
                    let Some(frame) = frame else { break };
                    let Some(event) = state_event(&frame, None) else {
                        continue;
                    };
                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(division = %feed.division(), viewer = %registration.id(), "SSE viewer disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn state_event(snapshot: &StateSnapshot, retry: Option<Duration>) -> Option<Event> {
    let frame = match ServerEvent::state_changed(&CompetitionSnapshot::from(snapshot)) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(division = %snapshot.division, error = %err, "failed to serialize state frame");
            return None;
        }
    };

    let event = Event::default().event(frame.event).data(frame.data);
    Some(match retry {
        Some(retry) => event.retry(retry),
        None => event,
    })
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use futures::StreamExt;
    use serde_json::Value;

    use super::*;
    use crate::{config::AppConfig, services::scoreboard_service, state::AppState};

    /// Value of the `name` field in one SSE frame.
    fn field<'a>(frame: &'a str, name: &str) -> Option<&'a str> {
        frame.lines().find_map(|line| {
            line.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(str::trim_start)
        })
    }

    #[tokio::test]
    async fn first_event_is_the_current_state_then_changes_follow() {
        let state = AppState::new(AppConfig::default());
        scoreboard_service::set_competition_name(&state, Division::Men, "Autumn Open")
            .await
            .unwrap();

        let response = subscribe(&state, Division::Men).await.into_response();
        let mut body = response.into_body().into_data_stream();
        assert_eq!(state.viewer_count(Division::Men), 1);

        let first = body.next().await.unwrap().unwrap();
        let first = String::from_utf8(first.to_vec()).unwrap();
        assert_eq!(field(&first, "event"), Some("state_changed"));
        assert_eq!(field(&first, "retry"), Some("3000"));
        let data: Value = serde_json::from_str(field(&first, "data").unwrap()).unwrap();
        assert_eq!(data["revision"], 1);
        assert_eq!(data["competition_name"], "Autumn Open");
        assert_eq!(data["division"], "men");

        scoreboard_service::set_competition_name(&state, Division::Men, "Autumn Final")
            .await
            .unwrap();
        let second = body.next().await.unwrap().unwrap();
        let second = String::from_utf8(second.to_vec()).unwrap();
        assert_eq!(field(&second, "retry"), None);
        let data: Value = serde_json::from_str(field(&second, "data").unwrap()).unwrap();
        assert_eq!(data["revision"], 2);
        assert_eq!(data["competition_name"], "Autumn Final");
    }
}
