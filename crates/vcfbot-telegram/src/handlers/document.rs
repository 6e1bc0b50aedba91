use teloxide::{net::Download, prelude::*, types::Document};

use vcfbot_core::{conversation::check_upload, domain::Origin, errors::Error};

use crate::router::AppState;

use super::finish;

/// Download a document into memory.
async fn download_document(bot: &Bot, doc: &Document) -> anyhow::Result<Vec<u8>> {
    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut buf: Vec<u8> = Vec::with_capacity(doc.file.size as usize);
    bot.download_file(&file.path, &mut buf).await?;
    Ok(buf)
}

pub async fn handle_document(
    bot: &Bot,
    state: &AppState,
    origin: Origin,
    doc: &Document,
) -> ResponseResult<()> {
    let conv = &state.conversation;
    let file_name = doc.file_name.as_deref();
    let size = doc.file.size as u64;

    if let Err(e) = check_upload(&state.cfg, file_name, size) {
        let _ = conv.report(origin.chat_id, &e).await;
        return Ok(());
    }

    tracing::info!(
        user_id = origin.user_id.0,
        file_name = file_name.unwrap_or_default(),
        size,
        "document received"
    );

    let result = match download_document(bot, doc).await {
        Ok(bytes) => conv.handle_upload(origin, bytes).await,
        Err(e) => Err(Error::External(format!("download failed: {e}"))),
    };

    finish(state, origin, "document", result).await
}
