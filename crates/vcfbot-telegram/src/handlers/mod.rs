//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - pulls the user/chat out of the update
//! - downloads the upload if there is one
//! - calls into the `vcfbot-core` conversation
//!
//! Updates from the same user are processed one at a time.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::error;

use vcfbot_core::domain::{ChatId, Origin, UserId};

use crate::router::AppState;
mod callback;
mod commands;
mod document;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let _guard = state.user_locks.lock_user(q.from.id.0 as i64).await;
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let origin = Origin {
        user_id: UserId(user.id.0 as i64),
        chat_id: ChatId(msg.chat.id.0),
    };

    let _guard = state.user_locks.lock_user(origin.user_id.0).await;

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(&state, origin, text).await;
        }
        return text::handle_text(&state, origin, text).await;
    }

    if let Some(doc) = msg.document() {
        return document::handle_document(&bot, &state, origin, doc).await;
    }

    let _ = bot
        .send_message(
            msg.chat.id,
            "📎 Please send a .txt file containing contacts. Use /help for details.",
        )
        .await;

    Ok(())
}

/// Log a failed handler and tell the user, without stopping the dispatcher.
pub(crate) async fn finish(
    state: &AppState,
    origin: Origin,
    context: &str,
    result: vcfbot_core::Result<()>,
) -> ResponseResult<()> {
    if let Err(e) = result {
        error!(
            user_id = origin.user_id.0,
            chat_id = origin.chat_id.0,
            "{context} failed: {e}"
        );
        let _ = state.conversation.report(origin.chat_id, &e).await;
    }
    Ok(())
}
