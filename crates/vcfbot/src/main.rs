use std::sync::Arc;

use vcfbot_core::{config::Config, session::SessionStore};

mod health;

#[tokio::main]
async fn main() -> Result<(), vcfbot_core::Error> {
    vcfbot_core::logging::init("vcfbot")?;

    let cfg = Arc::new(Config::load()?);

    if let Some(addr) = cfg.health_addr {
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr).await {
                tracing::error!("keep-alive server on {addr} stopped: {e}");
            }
        });
    }

    let sessions = Arc::new(SessionStore::new());

    vcfbot_telegram::router::run_polling(cfg, sessions)
        .await
        .map_err(|e| vcfbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
