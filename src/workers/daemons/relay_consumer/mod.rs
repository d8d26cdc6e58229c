use crate::common::redis_json::Json;
use crate::common::state::AppState;
use crate::entities::relay::RelayEnvelope;
use crate::repositories::relay::RELAY_CHANNEL;
use crate::usecases::streams;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Delivers events published by other instances to this instance's
/// connections. Runs for the lifetime of the process, resubscribing after
/// connection loss.
pub async fn serve(state: AppState, redis_url: String) {
    loop {
        match consume(&state, &redis_url).await {
            Ok(()) => warn!("Relay subscription ended, resubscribing"),
            Err(e) => error!("Relay consumer failed: {e:?}"),
        }
        tokio::time::sleep(RESTART_DELAY).await;
    }
}

async fn consume(state: &AppState, redis_url: &str) -> anyhow::Result<()> {
    let client = redis::Client::open(redis_url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(RELAY_CHANNEL).await?;
    info!(channel = RELAY_CHANNEL, "Relay consumer subscribed");

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let envelope = match msg.get_payload::<Json<RelayEnvelope>>() {
            Ok(envelope) => envelope.into_inner(),
            Err(e) => {
                warn!("Dropping malformed relay envelope: {e}");
                continue;
            }
        };
        if let Some(delivered) = streams::deliver_relayed(state, &envelope) {
            debug!(
                origin = %envelope.origin,
                stream = %envelope.stream,
                delivered,
                "Delivered relayed event"
            );
        }
    }
    Ok(())
}
