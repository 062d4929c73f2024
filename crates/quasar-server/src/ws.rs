//! Live updates over WebSocket.
//!
//! Domain services publish [`DomainEvent`]s into the [`EventHub`]; every open
//! socket holds a broadcast receiver and forwards the events addressed to it.
//! Browsers cannot set headers on an upgrade request, so sockets authenticate
//! with a `token` query parameter (a bearer header is accepted as well).

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::stream::{SplitSink, StreamExt};
use futures::{Sink, SinkExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use quasar_core::error::AppError;
use quasar_core::events::DomainEvent;
use quasar_core::traits::EventSink;

use crate::auth::{authenticate_token, bearer_token};
use crate::dto::{ChatEventResponse, IncomingChatFrame, NotificationResponse};
use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::state::AppState;

/// Events buffered per subscriber before it starts lagging.
pub const EVENT_BUFFER: usize = 256;

/// Fan-out of domain events to connected sockets.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventHub {
    fn publish(&self, event: DomainEvent) {
        // No connected sockets is the common case.
        if self.sender.send(event).is_err() {
            tracing::trace!("Dropped event with no subscribers");
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SocketAuth {
    pub token: Option<String>,
}

async fn socket_user(
    state: &AppState,
    auth: &SocketAuth,
    headers: &HeaderMap,
) -> Result<Uuid, AppError> {
    let token = auth
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
    Ok(authenticate_token(state, token).await?.id)
}

/// `GET /ws/notifications?token=<jwt>`: the caller's new notifications.
pub async fn notifications_socket(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<SocketAuth>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = socket_user(&state, &auth, &headers).await?;
    tracing::debug!(%user_id, "Notification socket opened");
    Ok(ws.on_upgrade(move |socket| run_session(state, socket, Channel::Notifications { user_id })))
}

/// `GET /ws/chat/{projectId}?token=<jwt>`: a project's chat stream. Text
/// frames `{"content": "..."}` post a message as the caller. The socket is
/// closed once the caller leaves or is removed from the team.
pub async fn chat_socket(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(auth): Query<SocketAuth>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = socket_user(&state, &auth, &headers).await?;
    if !state.chat.can_access(user_id, project_id).await? {
        return Err(AppError::Forbidden("you are not a member of this project".into()).into());
    }
    tracing::debug!(%user_id, %project_id, "Chat socket opened");
    Ok(ws.on_upgrade(move |socket| {
        run_session(state, socket, Channel::Chat { user_id, project_id })
    }))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Notifications { user_id: Uuid },
    Chat { user_id: Uuid, project_id: Uuid },
}

impl Channel {
    /// The frame to forward for `event`, if it belongs on this channel.
    fn frame_for(&self, event: DomainEvent) -> Result<Option<String>, serde_json::Error> {
        match (self, event) {
            (Channel::Notifications { user_id }, DomainEvent::Notification(n))
                if n.user_id == *user_id =>
            {
                serde_json::to_string(&NotificationResponse::from(n)).map(Some)
            }
            (Channel::Chat { project_id, .. }, DomainEvent::Chat { project_id: p, event })
                if p == *project_id =>
            {
                serde_json::to_string(&ChatEventResponse::new(p, event)).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Whether `event` ends this channel's right to the stream.
    fn revoked_by(&self, event: &DomainEvent) -> bool {
        match self {
            Channel::Chat {
                user_id,
                project_id,
            } => event.removes(*project_id, *user_id),
            Channel::Notifications { .. } => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error("client closed the connection")]
    ClientClosed,
    #[error("event hub shut down")]
    HubClosed,
    #[error("no longer a member of the project")]
    Revoked,
    #[error("socket error: {0}")]
    Socket(#[from] axum::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ErrorFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
}

enum Step {
    Event(Result<DomainEvent, RecvError>),
    Incoming(Option<Result<Message, axum::Error>>),
}

type Outbound = SplitSink<WebSocket, Message>;

async fn run_session(state: Arc<AppState>, socket: WebSocket, channel: Channel) {
    let mut events = state.hub.subscribe();
    let (mut outbound, mut inbound) = socket.split();

    // A removal between the upgrade check and `subscribe` would go unseen.
    if let Channel::Chat {
        user_id,
        project_id,
    } = channel
        && !state.chat.can_access(user_id, project_id).await.unwrap_or(false)
    {
        tracing::debug!(?channel, "Membership gone before the session started");
        let _ = outbound.send(revoked_frame()).await;
        let _ = outbound.close().await;
        return;
    }

    let error = loop {
        let step = tokio::select! {
            event = events.recv() => Step::Event(event),
            message = inbound.next() => Step::Incoming(message),
        };
        let result = match step {
            Step::Event(event) => forward_event(&channel, event, &mut outbound).await,
            Step::Incoming(message) => {
                handle_incoming(&state, &channel, message, &mut outbound).await
            }
        };
        if let Err(error) = result {
            break error;
        }
    };

    match error {
        SessionError::ClientClosed => tracing::debug!(?channel, "Socket closed by client"),
        SessionError::Revoked => tracing::info!(?channel, "Chat socket closed after removal"),
        other => tracing::warn!(?channel, error = %other, "Socket session ended"),
    }
    let _ = outbound.close().await;
}

fn revoked_frame() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::POLICY,
        reason: "You are no longer a member of this project".into(),
    }))
}

async fn forward_event<S>(
    channel: &Channel,
    event: Result<DomainEvent, RecvError>,
    outbound: &mut S,
) -> Result<(), SessionError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    match event {
        Ok(event) if channel.revoked_by(&event) => {
            outbound.send(revoked_frame()).await?;
            Err(SessionError::Revoked)
        }
        Ok(event) => {
            if let Some(frame) = channel.frame_for(event)? {
                outbound.send(Message::Text(frame.into())).await?;
            }
            Ok(())
        }
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(?channel, skipped, "Socket fell behind; events dropped");
            Ok(())
        }
        Err(RecvError::Closed) => Err(SessionError::HubClosed),
    }
}

async fn handle_incoming(
    state: &AppState,
    channel: &Channel,
    message: Option<Result<Message, axum::Error>>,
    outbound: &mut Outbound,
) -> Result<(), SessionError> {
    let text = match message {
        None | Some(Ok(Message::Close(_))) => return Err(SessionError::ClientClosed),
        Some(Err(e)) => return Err(SessionError::Socket(e)),
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(_)) => return Ok(()),
    };

    let Channel::Chat {
        user_id,
        project_id,
    } = *channel
    else {
        return Ok(());
    };

    let outcome = match serde_json::from_str::<IncomingChatFrame>(text.as_str()) {
        Ok(frame) => state
            .chat
            .send_message(user_id, project_id, &frame.content)
            .await
            .map(|_| ()),
        Err(e) => Err(AppError::BadRequest(format!("Malformed chat frame: {e}"))),
    };

    // The stored message comes back through the hub like everyone else's.
    if let Err(e) = outcome {
        let frame = ErrorFrame {
            kind: "ERROR",
            message: e.to_string(),
        };
        outbound
            .send(Message::Text(serde_json::to_string(&frame)?.into()))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use quasar_core::chat::{ChatMessage, MessageType};
    use quasar_core::events::ChatEvent;
    use quasar_core::notification::{Notification, NotificationType};

    use super::*;

    fn notification(user_id: Uuid) -> Notification {
        Notification {
            id: 1,
            user_id,
            title: "Project Invitation".into(),
            message: "You have been invited".into(),
            notification_type: NotificationType::ProjectInvitation,
            related_entity_id: None,
            related_entity_type: None,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    fn chat_event(project_id: Uuid) -> DomainEvent {
        DomainEvent::Chat {
            project_id,
            event: ChatEvent::Created(ChatMessage {
                id: 3,
                project_id,
                sender_id: Some(Uuid::new_v4()),
                sender_name: Some("Ada Lovelace".into()),
                content: "standup in 5".into(),
                message_type: MessageType::Text,
                is_edited: false,
                edited_at: None,
                created_at: Utc::now(),
            }),
        }
    }

    #[tokio::test]
    async fn test_hub_fans_out_to_every_subscriber() {
        let hub = EventHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        let user = Uuid::new_v4();
        hub.publish(DomainEvent::Notification(notification(user)));

        assert_eq!(first.recv().await.unwrap().recipient(), Some(user));
        assert_eq!(second.recv().await.unwrap().recipient(), Some(user));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        EventHub::new().publish(DomainEvent::Notification(notification(Uuid::new_v4())));
    }

    #[test]
    fn test_notification_channel_only_forwards_own_events() {
        let me = Uuid::new_v4();
        let channel = Channel::Notifications { user_id: me };

        let mine = channel
            .frame_for(DomainEvent::Notification(notification(me)))
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&mine).unwrap();
        assert_eq!(json["type"], "PROJECT_INVITATION");

        let theirs = DomainEvent::Notification(notification(Uuid::new_v4()));
        assert!(channel.frame_for(theirs).unwrap().is_none());
        assert!(channel.frame_for(chat_event(Uuid::new_v4())).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_removed_member_stops_receiving_chat() {
        let project_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let channel = Channel::Chat {
            user_id,
            project_id,
        };
        let (tx, mut rx) = futures::channel::mpsc::unbounded();
        let mut outbound = tx.sink_map_err(axum::Error::new);

        forward_event(&channel, Ok(chat_event(project_id)), &mut outbound)
            .await
            .unwrap();
        assert!(matches!(rx.next().await, Some(Message::Text(_))));

        // Someone else leaving changes nothing for this socket.
        let other = DomainEvent::MemberRemoved {
            project_id,
            user_id: Uuid::new_v4(),
        };
        forward_event(&channel, Ok(other), &mut outbound).await.unwrap();

        let removed = DomainEvent::MemberRemoved {
            project_id,
            user_id,
        };
        let err = forward_event(&channel, Ok(removed), &mut outbound)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Revoked));
        match rx.next().await {
            Some(Message::Close(Some(frame))) => assert_eq!(frame.code, close_code::POLICY),
            other => panic!("expected a close frame, got {other:?}"),
        }
        drop(outbound);
        assert!(rx.next().await.is_none());
    }

    #[test]
    fn test_removal_only_ends_that_members_chat() {
        let project_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let removed = DomainEvent::MemberRemoved {
            project_id,
            user_id,
        };

        assert!(Channel::Chat { user_id, project_id }.revoked_by(&removed));
        assert!(
            !Channel::Chat {
                user_id,
                project_id: Uuid::new_v4()
            }
            .revoked_by(&removed)
        );
        assert!(!Channel::Notifications { user_id }.revoked_by(&removed));
        assert!(
            Channel::Chat { user_id, project_id }
                .frame_for(removed)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_chat_channel_filters_by_project() {
        let project_id = Uuid::new_v4();
        let channel = Channel::Chat {
            user_id: Uuid::new_v4(),
            project_id,
        };

        let frame = channel.frame_for(chat_event(project_id)).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "CREATED");
        assert_eq!(json["message"]["content"], "standup in 5");

        assert!(channel.frame_for(chat_event(Uuid::new_v4())).unwrap().is_none());
    }
}
