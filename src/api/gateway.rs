use crate::api::RequestContext;
use crate::common::context::Context;
use crate::common::error::AppError;
use crate::events;
use crate::models::connections::Connection;
use crate::models::gateway::ServerEvent;
use crate::repositories::streams::{self as stream_registry, EventReceiver};
use crate::usecases::streams;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::Response;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::pin::pin;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A peer that does not accept a frame within this long is disconnected.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn upgrade(ctx: RequestContext, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_connection(ctx, socket))
}

/// Drains the connection's outbound queue in publish order.
async fn write_events<K>(sink: K, mut receiver: EventReceiver)
where
    K: Sink<Message>,
{
    let mut sink = pin!(sink);
    while let Some(event) = receiver.recv().await {
        let frame = match serde_json::to_string(&event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode server event: {e}");
                continue;
            }
        };
        match tokio::time::timeout(WRITE_TIMEOUT, sink.send(Message::Text(frame.into()))).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => break,
            Err(_) => {
                debug!("Peer stopped reading, closing");
                break;
            }
        }
    }
    let _ = tokio::time::timeout(WRITE_TIMEOUT, sink.close()).await;
}

async fn serve_connection(ctx: RequestContext, socket: WebSocket) {
    info!(ip = %ctx.request_ip.ip_addr, "WebSocket upgraded");
    let (sink, stream) = socket.split();
    serve_socket(ctx, sink, stream).await;
}

/// Runs one gateway connection over the two halves of its socket until
/// either side ends, then removes it from every stream and from presence.
pub async fn serve_socket<C, K, S, E>(ctx: C, sink: K, stream: S)
where
    C: Context,
    K: Sink<Message> + Send + 'static,
    S: Stream<Item = Result<Message, E>>,
{
    let (sender, receiver) = stream_registry::event_channel();
    let mut connection = Connection::new();
    let connection_id = connection.connection_id;
    streams::register(&ctx, connection_id, sender);
    info!(connection_id = %connection_id, "Connection opened");

    let mut writer = tokio::spawn(write_events(sink, receiver));
    let mut stream = pin!(stream);
    let reader = async {
        // one frame at a time, so a connection's sends are appended in order
        while let Some(Ok(message)) = stream.next().await {
            let reply = match message {
                Message::Text(frame) => {
                    events::handle_frame(&ctx, &mut connection, frame.as_str()).await
                }
                Message::Binary(_) => Some(ServerEvent::error(&AppError::DecodingRequestFailed)),
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => None,
            };
            if let Some(reply) = reply {
                if !streams::send(&ctx, connection_id, reply) {
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => debug!(connection_id = %connection_id, "Reader finished"),
        _ = &mut writer => debug!(connection_id = %connection_id, "Writer finished"),
    }
    writer.abort();
    events::disconnect::handle(&ctx, &connection);
}
