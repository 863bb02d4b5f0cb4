use parlor::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const HISTORY: usize = 50;
const MAX_TEXT: usize = 500;

// ---------------------------------------------------------------------------
// Chat types
// ---------------------------------------------------------------------------

/// What a client sends inside a `message` event.
#[derive(Deserialize)]
struct Say {
    text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Line {
    from: ClientId,
    text: String,
}

// ---------------------------------------------------------------------------
// Room behavior
// ---------------------------------------------------------------------------

/// Keeps a member count and the last few lines in the room state.
struct ChatRoom;

impl ChatRoom {
    fn history(room: &Room) -> Vec<Line> {
        room.state()
            .get("history")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    fn refresh_members(room: &mut Room) {
        let count = room.member_count();
        room.merge_state(RoomState::new().with("members", count));
    }
}

impl RoomBehavior for ChatRoom {
    fn on_create(&mut self, room: &mut Room) {
        let topic = room
            .options()
            .get("topic")
            .cloned()
            .unwrap_or_else(|| Value::from("general"));
        room.update_state(|_| {
            RoomState::new()
                .with("topic", topic)
                .with("members", 0)
                .with("history", Vec::<Value>::new())
        });
    }

    fn on_join(&mut self, room: &mut Room, _client: ClientId) {
        Self::refresh_members(room);
    }

    fn on_leave(&mut self, room: &mut Room, _client: ClientId) {
        Self::refresh_members(room);
    }

    fn on_message(
        &mut self,
        room: &mut Room,
        sender: ClientId,
        message: Value,
    ) -> Result<(), RoomError> {
        let Say { text } = serde_json::from_value(message)
            .map_err(|e| RoomError::MessageRejected(e.to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(RoomError::MessageRejected("empty message".into()));
        }
        if text.chars().count() > MAX_TEXT {
            return Err(RoomError::MessageRejected(format!(
                "message longer than {MAX_TEXT} characters"
            )));
        }

        let mut history = Self::history(room);
        history.push(Line {
            from: sender,
            text: text.to_string(),
        });
        let overflow = history.len().saturating_sub(HISTORY);
        history.drain(..overflow);

        let history = serde_json::to_value(history)
            .map_err(|e| RoomError::MessageRejected(e.to_string()))?;
        room.merge_state(RoomState::new().with("history", history));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("PARLOR_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    tracing::info!(%bind, "starting chat-room server");

    let server = ParlorServerBuilder::new()
        .bind(&bind)
        .room_type("chat", factory(|_| ChatRoom))
        .build()
        .await?;

    server.run().await?;
    Ok(())
}
