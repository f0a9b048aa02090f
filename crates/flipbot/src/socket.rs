// Flipbot
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    response::IntoResponse,
};
use flipbot_common::{
    chat::FollowUp,
    error::{FlipbotError, Result},
    socket::{Response, SocketMessage},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api;
use crate::api::ApiState;

pub async fn handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Every inbound frame is handled in its own task so a slow approval never
/// holds up other interactions. Replies funnel through a single writer.
async fn handle_socket(socket: WebSocket, who: SocketAddr, state: ApiState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(32);

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                error!("Client {who} abruptly disconnected");
                return;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        let Ok(msg) = msg else {
            error!("Client {who} abruptly disconnected");
            break;
        };
        if let Message::Close(c) = &msg {
            match c {
                Some(cf) if cf.code == 1000 => debug!("Websocket closed"),
                Some(cf) => warn!(
                    ">>> {who} sent close with code {} and reason `{}`",
                    cf.code, cf.reason
                ),
                None => debug!(">>> {who} somehow sent close message without CloseFrame"),
            }
            break;
        }

        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match process_message(msg, who, &state).await {
                Ok(Some(reply)) => {
                    if tx.send(reply).await.is_err() {
                        debug!("Reply dropped, {who} is gone");
                    }
                }
                Ok(None) => {}
                Err(err) => error!("Error handling message from {who}: {err}"),
            }
        });
    }

    drop(tx);
    if let Err(err) = writer.await {
        error!("Websocket writer for {who} failed: {err}");
    }
}

fn wrap_error<S: Serialize>(
    response_type: &str,
    request_id: Option<String>,
    res: &S,
) -> Result<Option<Message>> {
    Ok(Some(Message::Text(
        serde_json::to_string(&SocketMessage::Error(Response {
            response_type: response_type.to_owned(),
            request_id,
            response: res,
        }))?
        .into(),
    )))
}

fn wrap_response<S: Serialize>(
    response_type: &str,
    request_id: Option<String>,
    res: &S,
) -> Result<Option<Message>> {
    Ok(Some(Message::Text(
        serde_json::to_string(&SocketMessage::Response(Response {
            response_type: response_type.to_owned(),
            request_id,
            response: res,
        }))?
        .into(),
    )))
}

fn wrap_result(
    response_type: &str,
    request_id: Option<String>,
    res: Result<FollowUp>,
) -> Result<Option<Message>> {
    match res {
        Ok(res) => wrap_response(response_type, request_id, &res),
        Err(err) => wrap_error(
            response_type,
            request_id,
            &api::error_follow_up(response_type, &err),
        ),
    }
}

async fn process_message(
    msg: Message,
    who: SocketAddr,
    state: &ApiState,
) -> Result<Option<Message>> {
    match msg {
        Message::Text(t) => {
            debug!(">>> {who} sent str: {t:?}");
            let contents: SocketMessage<FollowUp> = match serde_json::from_slice(t.as_bytes()) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!("Invalid message from {who}: {err}");
                    return wrap_error("SocketMessage", None, &"Invalid SocketMessage".to_owned());
                }
            };
            let kind = contents.kind();
            let request_id = contents.request_id();
            match contents {
                SocketMessage::CheckSetup(req) => {
                    wrap_response(kind, request_id, &api::check_setup(&req, state).await)
                }
                SocketMessage::SubmitFlip(req) => {
                    wrap_response(kind, request_id, &api::submit_flip(&req, state).await)
                }
                SocketMessage::ApproveFlip(req) => {
                    wrap_response(kind, request_id, &api::approve_flip(&req, state).await)
                }
                SocketMessage::RejectFlip(req) => {
                    wrap_response(kind, request_id, &api::reject_flip(&req, state).await)
                }
                SocketMessage::ListPending(req) => {
                    wrap_result(kind, request_id, api::list_pending(&req, state).await)
                }
                SocketMessage::ShowConfig(req) => {
                    wrap_result(kind, request_id, api::show_config(&req, state).await)
                }
                SocketMessage::ShowLeaderboard(req) => {
                    wrap_result(kind, request_id, api::show_leaderboard(&req, state).await)
                }
                SocketMessage::RefreshLeaderboard(req) => wrap_result(
                    kind,
                    request_id,
                    api::refresh_leaderboard(&req, state).await,
                ),
                SocketMessage::SetChannels {
                    request,
                    member_flips_channel_id,
                    leaderboard_channel_id,
                } => wrap_result(
                    kind,
                    request_id,
                    api::set_channels(
                        &request,
                        member_flips_channel_id,
                        leaderboard_channel_id,
                        state,
                    )
                    .await,
                ),
                SocketMessage::SetLogChannel {
                    request,
                    log_channel_id,
                } => wrap_result(
                    kind,
                    request_id,
                    api::set_log_channel(&request, log_channel_id, state).await,
                ),
                SocketMessage::PingDb(req) => {
                    wrap_result(kind, request_id, api::ping_db(&req, state).await)
                }
                SocketMessage::SyncCommands(req) => {
                    wrap_result(kind, request_id, api::sync_commands(&req, state).await)
                }
                SocketMessage::Response(_) | SocketMessage::Error(_) => {
                    wrap_error(kind, None, &"Server doesn't accept replies".to_owned())
                }
            }
        }
        Message::Binary(d) => {
            debug!(">>> {} sent {} bytes: {:?}", who, d.len(), d);
            wrap_error(
                "BinaryFrame",
                None,
                &"Server doesn't accept binary frames".to_owned(),
            )
        }
        Message::Close(_) => Err(FlipbotError::WebsocketClose),
        Message::Pong(v) => {
            debug!(">>> {who} sent pong with {v:?}");
            Ok(None)
        }
        Message::Ping(v) => {
            debug!(">>> {who} sent ping with {v:?}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::{get_test_server, get_test_socket, get_test_state};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn interaction(id: &str) -> Value {
        json!({ "id": id, "guild_id": 1, "channel_id": 2 })
    }

    #[tokio::test]
    async fn it_should_reject_unauthenticated_clients() {
        let (state, _chat) = get_test_state().await;
        let server = get_test_server(state);
        server
            .get("/ws")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn it_should_report_health() {
        let (state, _chat) = get_test_state().await;
        let server = get_test_server(state);
        let res = server.get("/health").await;
        res.assert_status_ok();
        assert_eq!(res.json::<Value>()["ok"], true);
    }

    #[tokio::test]
    async fn it_should_answer_with_the_request_id() {
        let (state, _chat) = get_test_state().await;
        let (_server, mut socket) = get_test_socket(state).await;

        socket
            .send_json(&json!({
                "message_type": "PingDb",
                "data": {
                    "interaction": interaction("abc"),
                    "actor": { "id": 9, "manage_guild": true }
                }
            }))
            .await;
        let reply: Value = socket.receive_json().await;
        assert_eq!(reply["message_type"], "Response");
        assert_eq!(reply["data"]["response_type"], "PingDb");
        assert_eq!(reply["data"]["request_id"], "abc");
        assert_eq!(reply["data"]["response"]["ephemeral"], true);
    }

    #[tokio::test]
    async fn it_should_submit_and_approve_over_the_socket() {
        let (state, chat) = get_test_state().await;
        let db = state.db.clone();
        let (_server, mut socket) = get_test_socket(state).await;

        socket
            .send_json(&json!({
                "message_type": "SubmitFlip",
                "data": {
                    "interaction": interaction("s1"),
                    "actor": { "id": 7 },
                    "form": {
                        "item": "kayak",
                        "purchase_price": "10",
                        "parts_price": "5",
                        "sales_price": "20"
                    }
                }
            }))
            .await;
        let reply: Value = socket.receive_json().await;
        assert_eq!(reply["data"]["request_id"], "s1");
        assert_eq!(chat.messages_in(2).len(), 1);

        let pending = crate::db::flip::get_pending(1, &db).await.unwrap();
        socket
            .send_json(&json!({
                "message_type": "ApproveFlip",
                "data": {
                    "interaction": interaction("a1"),
                    "actor": { "id": 42, "manage_guild": true },
                    "flip": {
                        "id": pending[0].id,
                        "guild_id": 1,
                        "user_id": 7,
                        "item": "kayak",
                        "profit": "5.00"
                    }
                }
            }))
            .await;
        let reply: Value = socket.receive_json().await;
        assert_eq!(
            reply["data"]["response"]["content"],
            "Flip approved and posted."
        );

        let total = crate::db::user_profit::get(1, 7, &db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(total.total_profit, 5.0);
    }

    #[tokio::test]
    async fn it_should_refuse_admin_commands_from_members() {
        let (state, _chat) = get_test_state().await;
        let (_server, mut socket) = get_test_socket(state).await;

        socket
            .send_json(&json!({
                "message_type": "SetLogChannel",
                "data": {
                    "request": { "interaction": interaction("x"), "actor": { "id": 9 } },
                    "log_channel_id": 3
                }
            }))
            .await;
        let reply: Value = socket.receive_json().await;
        assert_eq!(reply["message_type"], "Error");
        assert_eq!(
            reply["data"]["response"]["content"],
            "You need Manage Server permission to use this."
        );
    }

    #[tokio::test]
    async fn it_should_flag_invalid_messages() {
        let (state, _chat) = get_test_state().await;
        let (_server, mut socket) = get_test_socket(state).await;

        socket.send_text("{\"message_type\": \"Nope\"}").await;
        let reply: Value = socket.receive_json().await;
        assert_eq!(reply["message_type"], "Error");
        assert_eq!(reply["data"]["response"], "Invalid SocketMessage");
    }
}
