#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures_util::{Sink, Stream, sink, stream};
use marketchat_service::adapters::static_directory::StaticDirectory;
use marketchat_service::adapters::{IdentityDirectory, ProductCatalog};
use marketchat_service::api::gateway;
use marketchat_service::common::error::ServiceResult;
use marketchat_service::common::init;
use marketchat_service::common::state::AppState;
use marketchat_service::events;
use marketchat_service::models::connections::Connection;
use marketchat_service::models::gateway::ServerEvent;
use marketchat_service::models::identities::IdentityRef;
use marketchat_service::repositories::streams::{EventReceiver, event_channel};
use marketchat_service::usecases::streams;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn alice() -> IdentityRef {
    IdentityRef::customer("c-alice")
}

pub fn bakery() -> IdentityRef {
    IdentityRef::seller("s-bakery")
}

pub fn carol() -> IdentityRef {
    IdentityRef::customer("c-carol")
}

pub const PRODUCT_ID: &str = "p-sourdough";

fn marketplace() -> StaticDirectory {
    StaticDirectory::new()
        .with_identity(alice(), "Alice")
        .with_identity(bakery(), "Corner Bakery")
        .with_identity(carol(), "Carol")
        .with_product(PRODUCT_ID, "Sourdough loaf")
}

pub async fn setup() -> AppState {
    setup_with_directory(marketplace()).await
}

/// Like `setup`, but identity lookups after the first `fast_lookups` take
/// `delay` each.
pub async fn setup_with_slow_directory(fast_lookups: usize, delay: Duration) -> AppState {
    setup_with_directory(SlowDirectory {
        inner: marketplace(),
        fast_lookups,
        delay,
        lookups: AtomicUsize::new(0),
    })
    .await
}

async fn setup_with_directory<D>(directory: D) -> AppState
where
    D: IdentityDirectory + ProductCatalog + 'static,
{
    // a single connection keeps the in-memory database alive and shared
    let db = init::connect_db("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .unwrap();
    init::initialize_schema(&db).await.unwrap();
    let directory = Arc::new(directory);
    AppState::new(db, None, directory.clone(), directory)
}

struct SlowDirectory {
    inner: StaticDirectory,
    fast_lookups: usize,
    delay: Duration,
    lookups: AtomicUsize,
}

#[async_trait]
impl IdentityDirectory for SlowDirectory {
    async fn resolve_identity(&self, identity: &IdentityRef) -> ServiceResult<String> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) >= self.fast_lookups {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.resolve_identity(identity).await
    }
}

#[async_trait]
impl ProductCatalog for SlowDirectory {
    async fn resolve_product(&self, product_id: &str) -> ServiceResult<String> {
        self.inner.resolve_product(product_id).await
    }
}

pub struct TestClient {
    pub connection: Connection,
    pub receiver: EventReceiver,
}

impl TestClient {
    pub fn connect(state: &AppState) -> Self {
        let (sender, receiver) = event_channel();
        let connection = Connection::new();
        streams::register(state, connection.connection_id, sender);
        Self {
            connection,
            receiver,
        }
    }

    pub async fn send(&mut self, state: &AppState, frame: Value) -> Option<ServerEvent> {
        events::handle_frame(state, &mut self.connection, &frame.to_string()).await
    }

    pub async fn join_user_channel(&mut self, state: &AppState, identity: &IdentityRef) {
        let reply = self
            .send(
                state,
                json!({"event": "join-user-channel", "data": {"identity": identity}}),
            )
            .await;
        assert!(
            matches!(reply, Some(ServerEvent::UserChannelJoined { .. })),
            "unexpected reply {reply:?}"
        );
    }

    pub async fn join_conversation(&mut self, state: &AppState, conversation_id: uuid::Uuid) {
        let reply = self
            .send(
                state,
                json!({"event": "join-conversation", "data": {"conversationId": conversation_id}}),
            )
            .await;
        assert_eq!(
            reply,
            Some(ServerEvent::ConversationJoined { conversation_id })
        );
    }

    /// Everything queued for this connection so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = vec![];
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn send_message_frame(
    conversation_id: uuid::Uuid,
    receiver: &IdentityRef,
    body: &str,
    client_temp_id: &str,
) -> Value {
    json!({
        "event": "send-message",
        "data": {
            "conversationId": conversation_id,
            "receiver": receiver,
            "body": body,
            "clientTempId": client_temp_id,
        }
    })
}

/// The client end of a gateway connection served by `serve_socket`.
pub struct TestSocket {
    pub incoming: mpsc::UnboundedSender<Message>,
    pub outgoing: mpsc::UnboundedReceiver<Message>,
    pub server: JoinHandle<()>,
}

impl TestSocket {
    pub fn open(state: &AppState) -> Self {
        let (incoming, from_client) = mpsc::unbounded_channel::<Message>();
        let (to_client, outgoing) = mpsc::unbounded_channel::<Message>();
        let server = tokio::spawn(gateway::serve_socket(
            state.clone(),
            client_sink(to_client),
            client_stream(from_client),
        ));
        Self {
            incoming,
            outgoing,
            server,
        }
    }

    pub fn send(&self, frame: Value) {
        self.incoming
            .send(Message::Text(frame.to_string().into()))
            .unwrap();
    }

    /// The next server event, decoded from its text frame.
    pub async fn next_event(&mut self) -> Value {
        let message = tokio::time::timeout(Duration::from_secs(1), self.outgoing.recv())
            .await
            .expect("no frame within a second")
            .expect("socket closed");
        match message {
            Message::Text(frame) => serde_json::from_str(frame.as_str()).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

fn client_sink(to_client: mpsc::UnboundedSender<Message>) -> impl Sink<Message> + Send + 'static {
    sink::unfold(to_client, |to_client, message: Message| async move {
        match to_client.send(message) {
            Ok(()) => Ok::<_, &'static str>(to_client),
            Err(_) => Err("client went away"),
        }
    })
}

fn client_stream(
    from_client: mpsc::UnboundedReceiver<Message>,
) -> impl Stream<Item = Result<Message, Infallible>> + Send + 'static {
    stream::unfold(from_client, |mut from_client| async move {
        let message = from_client.recv().await;
        message.map(|message| (Ok::<_, Infallible>(message), from_client))
    })
}
