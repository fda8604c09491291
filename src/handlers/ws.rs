use std::collections::HashSet;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::notifier::{Envelope, Event, Topic};
use crate::utils::jwt::verify_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    Event { topic: String, event: &'a Event },
    Error { message: String },
}

/// Real-time event stream. A valid token auto-joins the caller's user topic;
/// anonymous connections can still watch schedule and route topics.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = query
        .token
        .as_deref()
        .and_then(|token| verify_token(token, &state.config.jwt_secret).ok())
        .map(|claims| claims.sub);

    ws.on_upgrade(move |socket| client_session(socket, state, user_id))
}

async fn client_session(socket: WebSocket, state: AppState, user_id: Option<i32>) {
    let connection_id = Uuid::new_v4();
    let mut events = state.notifier.subscribe();
    let (mut sink, mut stream) = socket.split();

    let mut topics: HashSet<Topic> = HashSet::new();
    if let Some(id) = user_id {
        topics.insert(Topic::User(id));
    }

    tracing::info!(%connection_id, ?user_id, "websocket client connected");

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_message(&mut topics, &text);
                        if send_json(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by the protocol layer
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, error = %err, "websocket receive error");
                        break;
                    }
                }
            }
            published = events.recv() => {
                match published {
                    Ok(envelope) => {
                        if wants(&topics, &envelope) {
                            let message = ServerMessage::Event {
                                topic: envelope.topic.to_string(),
                                event: &envelope.event,
                            };
                            if send_json(&mut sink, &message).await.is_err() {
                                break;
                            }
                        }
                    }
                    // No backlog: a slow client just misses the dropped events
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%connection_id, skipped, "websocket client lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!(%connection_id, "websocket client disconnected");
}

fn wants(topics: &HashSet<Topic>, envelope: &Envelope) -> bool {
    envelope.topic == Topic::Broadcast || topics.contains(&envelope.topic)
}

fn handle_client_message(topics: &mut HashSet<Topic>, text: &str) -> ServerMessage<'static> {
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(_) => {
            return ServerMessage::Error {
                message: "Malformed message".to_string(),
            };
        }
    };

    match parsed {
        ClientMessage::Subscribe { topics: requested } => {
            let accepted = apply_topics(requested, |topic| {
                topics.insert(topic);
            });
            ServerMessage::Subscribed { topics: accepted }
        }
        ClientMessage::Unsubscribe { topics: requested } => {
            let accepted = apply_topics(requested, |topic| {
                topics.remove(&topic);
            });
            ServerMessage::Unsubscribed { topics: accepted }
        }
    }
}

/// Apply `op` to every well-formed, subscribable topic; unknown or
/// unauthorized topic strings (including `user:*`) are silently skipped.
fn apply_topics(requested: Vec<String>, mut op: impl FnMut(Topic)) -> Vec<String> {
    requested
        .into_iter()
        .filter(|raw| {
            match Topic::parse_subscribable(raw) {
                Some(topic) => {
                    op(topic);
                    true
                }
                None => false,
            }
        })
        .collect()
}

async fn send_json<S>(sink: &mut S, message: &ServerMessage<'_>) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize websocket message");
            return Ok(());
        }
    };

    sink.send(Message::Text(text.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_adds_valid_topics_only() {
        let mut topics = HashSet::new();
        let reply = handle_client_message(
            &mut topics,
            r#"{"type":"subscribe","topics":["schedule:1","user:9","route:2","junk"]}"#,
        );

        assert!(topics.contains(&Topic::Schedule(1)));
        assert!(topics.contains(&Topic::Route(2)));
        assert!(!topics.contains(&Topic::User(9)));

        match reply {
            ServerMessage::Subscribed { topics } => {
                assert_eq!(topics, vec!["schedule:1".to_string(), "route:2".to_string()]);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn unsubscribe_removes_topics() {
        let mut topics = HashSet::from([Topic::Schedule(1), Topic::Route(2)]);
        handle_client_message(
            &mut topics,
            r#"{"type":"unsubscribe","topics":["schedule:1"]}"#,
        );

        assert!(!topics.contains(&Topic::Schedule(1)));
        assert!(topics.contains(&Topic::Route(2)));
    }

    #[test]
    fn malformed_messages_get_an_error_reply() {
        let mut topics = HashSet::new();
        let reply = handle_client_message(&mut topics, "not json");
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }

    #[test]
    fn broadcast_events_reach_every_session() {
        let topics = HashSet::new();
        let envelope = Envelope {
            topic: Topic::Broadcast,
            event: Event::Announcement {
                message: "maintenance tonight".to_string(),
                priority: crate::notifier::AnnouncementPriority::Low,
            },
        };

        assert!(wants(&topics, &envelope));
    }

    #[test]
    fn unsubscribed_topics_are_filtered_out() {
        let topics = HashSet::from([Topic::Schedule(1)]);
        let envelope = Envelope {
            topic: Topic::Schedule(2),
            event: Event::BookingCancelled {
                booking_code: "BK1".to_string(),
                cancelled_legs: 1,
            },
        };

        assert!(!wants(&topics, &envelope));
    }
}
