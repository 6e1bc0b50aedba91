use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use vcfbot_core::{
    config::Config, conversation::Conversation, messaging::port::MessagingPort,
    session::SessionStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub conversation: Conversation,
    pub user_locks: Arc<UserLocks>,
}

/// One async lock per user, so a user's updates touch their session one at a time.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Entries nobody holds or waits on are dropped here, so the map only
    /// tracks users with updates in flight.
    pub async fn lock_user(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

pub async fn run_polling(cfg: Arc<Config>, sessions: Arc<SessionStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("VCF converter bot started: @{}", me.username()),
        Err(e) => warn!("get_me failed: {e}"),
    }
    info!(
        split_sizes = ?cfg.split_sizes.iter().map(|s| s.get()).collect::<Vec<_>>(),
        max_file_size = cfg.max_file_size,
        "configuration loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        conversation: Conversation::new(cfg, sessions, messenger),
        user_locks: Arc::new(UserLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn user_lock_serializes_same_user() {
        let locks = Arc::new(UserLocks::default());
        let guard = locks.lock_user(1).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock_user(1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // A different user is not blocked.
        let other = tokio::time::timeout(Duration::from_millis(100), locks.lock_user(2)).await;
        assert!(other.is_ok());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn released_locks_are_pruned() {
        let locks = UserLocks::default();
        for user in 1..=3 {
            drop(locks.lock_user(user).await);
        }
        let held = locks.lock_user(4).await;
        assert_eq!(locks.tracked().await, 1);

        drop(locks.lock_user(5).await);
        assert_eq!(locks.tracked().await, 2);
        drop(held);
    }
}
