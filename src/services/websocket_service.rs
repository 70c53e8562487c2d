use std::{collections::HashMap, future::Future};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::{
        admin::{ImportCsvRequest, ImportErrorSummary, ImportReport},
        common::CompetitionSnapshot,
        ws::{Ack, ClientMessage, ServerMessage},
    },
    error::ServiceError,
    services::{division_feed::DivisionFeed, persistence_service, scoreboard_service},
    state::{SharedState, ViewerRegistration, ViewerTransport, division::Division},
};

/// The writer side of the socket is gone.
#[derive(Debug, Error)]
#[error("connection closed")]
struct ConnectionClosed;

/// Per-connection bookkeeping: outbound queue and one forwarder per followed division.
struct Session {
    state: SharedState,
    registration: ViewerRegistration,
    outbound: mpsc::UnboundedSender<Message>,
    forwarders: HashMap<Division, JoinHandle<()>>,
}

/// Handle the full lifecycle of an operator or viewer WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session {
        registration: state.register_viewer(ViewerTransport::WebSocket),
        state,
        outbound: outbound_tx,
        forwarders: HashMap::new(),
    };
    let connection = session.registration.id();
    info!(%connection, "websocket client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let outcome = match ClientMessage::from_json_str(&text) {
                    Ok(request) => session.handle(request).await,
                    Err(err) => {
                        warn!(%connection, error = %err, "failed to parse or validate client message");
                        session.send(&ServerMessage::Ack(Ack {
                            request: "unknown".into(),
                            division: None,
                            success: false,
                            message: err.to_string(),
                        }))
                    }
                };
                if outcome.is_err() {
                    info!(%connection, "connection closed while replying, terminating");
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = session.outbound.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = session.outbound.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection, error = %err, "websocket error");
                break;
            }
        }
    }

    info!(%connection, "websocket client disconnected");
    session.close(writer_task).await;
}

impl Session {
    async fn handle(&mut self, request: ClientMessage) -> Result<(), ConnectionClosed> {
        let kind = request.kind();
        let division = request.division();

        match request {
            ClientMessage::RequestInitialState { division } => self.follow(division).await,
            ClientMessage::ImportCsv {
                division,
                csv,
                first_line,
            } => {
                let request = ImportCsvRequest { csv, first_line };
                match scoreboard_service::apply_csv_import(&self.state, division, &request).await {
                    Ok(outcome) => self.send(&ServerMessage::ImportReport(ImportReport {
                        imported: outcome.imported,
                        errors: outcome.errors.iter().map(ImportErrorSummary::from).collect(),
                        snapshot: CompetitionSnapshot::from(&outcome.snapshot),
                    })),
                    Err(err) => self.reply(kind, division, Err(err)),
                }
            }
            ClientMessage::UpdateScore {
                division,
                competitor_id,
                apparatus,
                value,
            } => {
                let value = value.map(|input| input.value()).unwrap_or(0.0);
                let result = scoreboard_service::update_score(
                    &self.state,
                    division,
                    &competitor_id,
                    apparatus,
                    value,
                )
                .await
                .map(|_| format!("{competitor_id} {apparatus} set to {value}"));
                self.reply(kind, division, result)
            }
            ClientMessage::SetCompetitionName { division, name } => {
                let result = scoreboard_service::set_competition_name(&self.state, division, &name)
                    .await
                    .map(|snapshot| format!("competition renamed to `{}`", snapshot.state.competition_name));
                self.reply(kind, division, result)
            }
            ClientMessage::Save { .. } => {
                let state = self.state.clone();
                self.reply_later(kind, division, async move {
                    persistence_service::save(&state, division).await
                });
                Ok(())
            }
            ClientMessage::Finalize { .. } => {
                let state = self.state.clone();
                self.reply_later(kind, division, async move {
                    persistence_service::finalize(&state, division).await
                });
                Ok(())
            }
        }
    }

    /// Send the current state of `division`, then every later change.
    ///
    /// Asking again restarts the subscription, which is how a reconnecting
    /// client resynchronises.
    async fn follow(&mut self, division: Division) -> Result<(), ConnectionClosed> {
        if let Some(previous) = self.forwarders.remove(&division) {
            previous.abort();
        }

        let (snapshot, feed) = DivisionFeed::open(&self.state, division).await;
        self.registration.follow(division);
        self.send(&ServerMessage::StateChanged(CompetitionSnapshot::from(&snapshot)))?;

        let forwarder = tokio::spawn(forward_division(feed, self.outbound.clone()));
        self.forwarders.insert(division, forwarder);
        Ok(())
    }

    fn reply(
        &self,
        request: &str,
        division: Division,
        result: Result<String, ServiceError>,
    ) -> Result<(), ConnectionClosed> {
        self.send(&ServerMessage::Ack(acknowledge(request, division, result)))
    }

    /// Run a spreadsheet call off the read loop and acknowledge it once it ends,
    /// so score entry on this socket is not held behind the persistence lock.
    fn reply_later<F>(&self, request: &'static str, division: Division, work: F)
    where
        F: Future<Output = Result<String, ServiceError>> + Send + 'static,
    {
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            let ack = acknowledge(request, division, work.await);
            if send_message_to_websocket(&outbound, &ServerMessage::Ack(ack)).is_err() {
                info!(%division, request, "client left before its request completed");
            }
        });
    }

    fn send(&self, message: &ServerMessage) -> Result<(), ConnectionClosed> {
        send_message_to_websocket(&self.outbound, message)
    }

    async fn close(self, writer_task: JoinHandle<()>) {
        for forwarder in self.forwarders.into_values() {
            forwarder.abort();
        }
        drop(self.registration);
        drop(self.outbound);
        let _ = writer_task.await;
    }
}

fn acknowledge(request: &str, division: Division, result: Result<String, ServiceError>) -> Ack {
    let (success, message) = match result {
        Ok(message) => (true, message),
        Err(err) => {
            warn!(%division, request, error = %err, "client request failed");
            (false, err.operator_message())
        }
    };
    Ack {
        request: request.to_string(),
        division: Some(division),
        success,
        message,
    }
}

/// Push every frame of a division feed to one socket.
async fn forward_division(mut feed: DivisionFeed, outbound: mpsc::UnboundedSender<Message>) {
    while let Some(frame) = feed.next().await {
        let message = ServerMessage::StateChanged(CompetitionSnapshot::from(frame.as_ref()));
        if send_message_to_websocket(&outbound, &message).is_err() {
            break;
        }
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is an error.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ConnectionClosed>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ConnectionClosed)
}
