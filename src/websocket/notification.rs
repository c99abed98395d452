use crate::config::feed::FeedConfig;
use crate::error::AppError;
use crate::feed::NotificationFeed;
use crate::middleware::auth::authenticate;
use crate::models::NotificationModel;
use crate::services::notification::NotificationService;
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Frames the browser sends.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Refresh,
    MarkRead { id: i32 },
    MarkAllRead,
}

/// Frames the server sends. `unread` always carries the session's current badge.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame<'a> {
    Snapshot {
        items: &'a [NotificationModel],
        unread: u64,
    },
    Notification {
        notification: &'a NotificationModel,
        unread: u64,
    },
    ReadResult {
        id: i32,
        ok: bool,
        unread: u64,
    },
    MarkAllResult {
        marked: usize,
        failed: &'a [i32],
        unread: u64,
    },
    Error {
        message: String,
    },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    Extension(feed_config): Extension<FeedConfig>,
) -> Result<impl IntoResponse, AppError> {
    let auth_user = authenticate(&store, &query.token).await?;
    let service = NotificationService::new(store, hub.clone());
    let feed = NotificationFeed::new(service, auth_user.user_id, feed_config);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, feed, hub)))
}

type WsSink = SplitSink<WebSocket, Message>;

async fn send_frame(sink: &mut WsSink, frame: &ServerFrame<'_>) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("failed to encode websocket frame: {e}");
            return true;
        }
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}

async fn handle_socket(socket: WebSocket, mut feed: NotificationFeed, hub: NotificationHub) {
    let user_id = feed.user_id();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (conn_id, mut pushed) = hub.subscribe(user_id);

    tracing::info!(user_id, conn_id, "websocket connected");

    feed.refresh().await;
    let mut open = send_frame(
        &mut ws_sender,
        &ServerFrame::Snapshot {
            items: feed.items(),
            unread: feed.unread(),
        },
    )
    .await;

    let period = feed.config().poll_interval;
    let mut poll = interval_at(Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while open {
        tokio::select! {
            incoming = ws_receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                open = match serde_json::from_str::<ClientFrame>(text.as_str()) {
                    Ok(frame) => handle_client_frame(&mut ws_sender, &mut feed, frame).await,
                    Err(e) => {
                        send_frame(
                            &mut ws_sender,
                            &ServerFrame::Error { message: format!("invalid frame: {e}") },
                        )
                        .await
                    }
                };
            }
            Some(notification) = pushed.recv() => {
                feed.apply_pushed(notification.clone());
                open = send_frame(
                    &mut ws_sender,
                    &ServerFrame::Notification { notification: &notification, unread: feed.unread() },
                )
                .await;
            }
            _ = poll.tick() => {
                feed.refresh().await;
                open = send_frame(
                    &mut ws_sender,
                    &ServerFrame::Snapshot { items: feed.items(), unread: feed.unread() },
                )
                .await;
            }
        }
    }

    hub.unsubscribe(user_id, conn_id);
    tracing::info!(user_id, conn_id, "websocket disconnected");
}

async fn handle_client_frame(
    sink: &mut WsSink,
    feed: &mut NotificationFeed,
    frame: ClientFrame,
) -> bool {
    match frame {
        ClientFrame::Refresh => {
            feed.refresh().await;
            send_frame(
                sink,
                &ServerFrame::Snapshot {
                    items: feed.items(),
                    unread: feed.unread(),
                },
            )
            .await
        }
        ClientFrame::MarkRead { id } => {
            let ok = feed.mark_read(id).await;
            send_frame(
                sink,
                &ServerFrame::ReadResult {
                    id,
                    ok,
                    unread: feed.unread(),
                },
            )
            .await
        }
        ClientFrame::MarkAllRead => {
            let outcome = feed.mark_all_read().await;
            send_frame(
                sink,
                &ServerFrame::MarkAllResult {
                    marked: outcome.marked_count(),
                    failed: &outcome.failed,
                    unread: feed.unread(),
                },
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_parse() {
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"refresh"}"#).unwrap(),
            ClientFrame::Refresh
        );
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"mark_read","id":7}"#).unwrap(),
            ClientFrame::MarkRead { id: 7 }
        );
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"mark_all_read"}"#).unwrap(),
            ClientFrame::MarkAllRead
        );
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"delete"}"#).is_err());
    }

    #[test]
    fn server_frames_are_tagged() {
        let json = serde_json::to_value(ServerFrame::ReadResult {
            id: 3,
            ok: true,
            unread: 2,
        })
        .unwrap();
        assert_eq!(json["type"], "read_result");
        assert_eq!(json["unread"], 2);

        let failed = [4, 9];
        let json = serde_json::to_value(ServerFrame::MarkAllResult {
            marked: 3,
            failed: &failed,
            unread: 2,
        })
        .unwrap();
        assert_eq!(json["type"], "mark_all_result");
        assert_eq!(json["failed"], serde_json::json!([4, 9]));
    }
}
