use teloxide::prelude::*;

use vcfbot_core::domain::Origin;

use crate::router::AppState;

use super::finish;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(state: &AppState, origin: Origin, text: &str) -> ResponseResult<()> {
    let (cmd, _args) = parse_command(text);
    tracing::info!(user_id = origin.user_id.0, command = %cmd, "command");

    let conv = &state.conversation;
    let result = match cmd.as_str() {
        "start" => conv.start(origin).await,
        "help" => conv.help(origin).await,
        "restart" => conv.restart(origin).await,
        "lord" => conv.lord(origin).await,
        _ => conv
            .messenger
            .send_html(
                origin.chat_id,
                "Unknown command. Use /help to see what I can do.",
            )
            .await
            .map(|_| ()),
    };

    finish(state, origin, "command", result).await
}
