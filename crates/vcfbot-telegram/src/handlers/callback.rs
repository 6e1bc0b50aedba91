use std::sync::Arc;

use teloxide::prelude::*;

use vcfbot_core::{
    conversation::SplitChoice,
    domain::{ChatId, MessageId, MessageRef, Origin, UserId},
};

use crate::router::AppState;

use super::finish;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let user_id = q.from.id.0 as i64;
    let data = q.data.clone().unwrap_or_default();

    if data.is_empty() {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    }

    // Buttons only live in private chats with the bot, where chat id == user id.
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id.0)
        .unwrap_or(user_id);
    let origin = Origin {
        user_id: UserId(user_id),
        chat_id: ChatId(chat_id),
    };

    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });

    let choice = SplitChoice {
        callback_id: q.id.clone(),
        data,
        message,
    };

    let result = state
        .conversation
        .handle_split_choice(origin, choice)
        .await;
    finish(&state, origin, "callback", result).await
}
