use teloxide::prelude::*;

use vcfbot_core::domain::Origin;

use crate::router::AppState;

use super::finish;

pub async fn handle_text(state: &AppState, origin: Origin, text: &str) -> ResponseResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let result = state.conversation.handle_text(origin, text).await;
    finish(state, origin, "text", result).await
}
