use crate::{
    entities::{chat_message, ChatMessage},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Chat persistence: append-only message rows grouped by session token.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ChatService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Persists one chat message and returns the stored row.
    #[instrument(skip(self, text))]
    pub async fn record_message(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        username: &str,
        text: &str,
        is_support: bool,
    ) -> Result<chat_message::Model, ServiceError> {
        let message_id = Uuid::new_v4();
        let message = chat_message::ActiveModel {
            id: Set(message_id),
            session_id: Set(session_id.to_string()),
            user_id: Set(user_id),
            username: Set(username.to_string()),
            message: Set(text.to_string()),
            is_support: Set(is_support),
            timestamp: Set(Utc::now()),
        };

        let message = message.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ChatMessageRecorded {
                session_id: session_id.to_string(),
                message_id,
            })
            .await;

        Ok(message)
    }

    /// Loads the full message history of a session, oldest first.
    pub async fn history(
        &self,
        session_id: &str,
    ) -> Result<Vec<chat_message::Model>, ServiceError> {
        Ok(ChatMessage::find()
            .filter(chat_message::Column::SessionId.eq(session_id))
            .order_by_asc(chat_message::Column::Timestamp)
            .all(&*self.db)
            .await?)
    }
}
