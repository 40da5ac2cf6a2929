use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use stranger_core::SessionId;

use crate::{
    context::ServerContext, errors::FrameError, schemas::ClientFrame, serialized::ServerEvent,
    Router,
};

async fn gateway(ws: WebSocketUpgrade, State(context): State<ServerContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

/// Runs a single session for as long as its socket stays open.
///
/// Frames addressed to the session are written by a separate task, so a
/// slow client never holds up the engine. Whichever way the socket ends,
/// the session is disconnected from the engine exactly once.
async fn handle_socket(socket: WebSocket, context: ServerContext) {
    let session_id = SessionId::new();
    info!("User Connected: {}", session_id);

    let mut outgoing = context.connections.register(session_id);
    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(event) = outgoing.recv().await {
            if sink.send(Message::Text(event.to_text())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(err) => {
                debug!("Socket of {} failed: {}", session_id, err);
                break;
            }
        };

        match message {
            Message::Text(text) => handle_frame(&context, session_id, ClientFrame::parse(&text)),
            Message::Binary(_) => handle_frame(&context, session_id, Err(FrameError::Binary)),
            Message::Close(_) => break,
            // Pings are answered by axum
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    context.matchmaker.disconnect(session_id);
    context.connections.unregister(session_id);
    send_task.abort();
}

fn handle_frame(
    context: &ServerContext,
    session_id: SessionId,
    frame: Result<ClientFrame, FrameError>,
) {
    let frame = match frame {
        Ok(frame) => frame,
        Err(err) => {
            warn!("Refused frame from {}: {}", session_id, err);
            context.connections.send(
                session_id,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            );
            return;
        }
    };

    let matchmaker = &context.matchmaker;

    match frame {
        ClientFrame::JoinQueue(schema) => {
            if let Err(err) = matchmaker.join_queue(session_id, schema.into()) {
                error!("Join from {} failed: {}", session_id, err);
            }
        }
        ClientFrame::SendMessage(schema) => {
            let room_id = schema.room_id();
            matchmaker.send_message(session_id, &room_id, schema.message);
        }
        ClientFrame::ReportUser => {
            matchmaker.report_user(session_id);
        }
        ClientFrame::LeaveRoom => {
            matchmaker.leave(session_id);
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/gateway", get(gateway))
}
