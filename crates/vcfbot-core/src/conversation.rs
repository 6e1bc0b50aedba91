//! The chat flow: upload → (base name) → split choice → filename → files.
//!
//! Every handler takes the session store and messenger explicitly through
//! [`Conversation`]; nothing here is global.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    batch::OutputBlob,
    chunk::ChunkSize,
    config::Config,
    domain::{ChatId, MessageRef, Origin},
    errors::Error,
    formatting,
    messaging::{
        port::MessagingPort,
        types::{
            ChatAction, InlineKeyboard, OutgoingDocument, NO_SPLIT_DATA, SPLIT_DATA_PREFIX,
        },
    },
    session::{Answer, Session, SessionStore, Step},
    Result,
};

/// Handlers for one bot instance.
#[derive(Clone)]
pub struct Conversation {
    pub cfg: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// A button press on the split menu.
#[derive(Clone, Debug)]
pub struct SplitChoice {
    pub callback_id: String,
    pub data: String,
    /// The menu message, edited in place into the filename prompt.
    pub message: Option<MessageRef>,
}

/// Parse split-menu callback data (`split_{n}` or `no_split`).
///
/// Sizes outside the configured menu are rejected even when numeric.
pub fn parse_split_data(cfg: &Config, data: &str) -> Result<Option<ChunkSize>> {
    if data == NO_SPLIT_DATA {
        return Ok(None);
    }
    let raw = data
        .strip_prefix(SPLIT_DATA_PREFIX)
        .ok_or_else(|| Error::InvalidChunkSize(data.to_string()))?;
    let size = raw.parse::<ChunkSize>()?;
    if !cfg.is_allowed_split(size) {
        return Err(Error::InvalidChunkSize(data.to_string()));
    }
    Ok(Some(size))
}

/// Reject uploads by name and size before downloading them.
pub fn check_upload(cfg: &Config, file_name: Option<&str>, size: u64) -> Result<()> {
    let name = file_name.unwrap_or_default();
    if !name.to_lowercase().ends_with(".txt") {
        return Err(Error::UnsupportedFile(name.to_string()));
    }
    if size > cfg.max_file_size {
        return Err(Error::FileTooLarge {
            size,
            limit: cfg.max_file_size,
        });
    }
    Ok(())
}

/// Reply text for a user-caused error.
fn error_reply(err: &Error) -> String {
    match err {
        Error::NoContactsFound => {
            "❌ No valid contacts found in the file. Please check the format.".to_string()
        }
        Error::UnsupportedFile(_) => "❌ Please send a .txt file containing contacts.".to_string(),
        Error::FileTooLarge { limit, .. } => format!(
            "❌ File is too large. Please send a file smaller than {} KB.",
            limit / 1024
        ),
        Error::Decode(_) => "❌ Could not read the file as UTF-8 text.".to_string(),
        Error::SessionMissing => "Please send a contact file first using /start".to_string(),
        Error::InvalidChunkSize(_) => "❌ Unknown split option.".to_string(),
        _ => "❌ Error processing file. Please try again.".to_string(),
    }
}

impl Conversation {
    pub fn new(
        cfg: Arc<Config>,
        sessions: Arc<SessionStore>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            cfg,
            sessions,
            messenger,
        }
    }

    /// Tell the user what went wrong. Infrastructure errors are logged and get
    /// the generic reply.
    pub async fn report(&self, chat_id: ChatId, err: &Error) -> Result<()> {
        if err.is_user_facing() {
            warn!(chat_id = chat_id.0, "rejected: {err}");
        } else {
            error!(chat_id = chat_id.0, "failed: {err}");
        }
        self.messenger
            .send_html(chat_id, &formatting::escape_html(&error_reply(err)))
            .await?;
        Ok(())
    }

    // ============== Commands ==============

    pub async fn start(&self, origin: Origin) -> Result<()> {
        self.messenger
            .send_html(origin.chat_id, &formatting::welcome_message())
            .await?;
        Ok(())
    }

    pub async fn help(&self, origin: Origin) -> Result<()> {
        self.messenger
            .send_html(
                origin.chat_id,
                &formatting::help_message(&self.cfg.split_sizes),
            )
            .await?;
        Ok(())
    }

    /// `/restart`: forget this user's session.
    pub async fn restart(&self, origin: Origin) -> Result<()> {
        let had = self.sessions.clear(origin.user_id).await;
        info!(user_id = origin.user_id.0, had_session = had, "session reset");
        self.messenger
            .send_html(
                origin.chat_id,
                "🔄 Bot restarted successfully! Ready to process your files.",
            )
            .await?;
        Ok(())
    }

    /// `/lord`: forget every session.
    pub async fn lord(&self, origin: Origin) -> Result<()> {
        self.messenger
            .send_html(
                origin.chat_id,
                "👑 LORD COMMAND ACTIVATED!\n🔄 Bot is restarting with full power...",
            )
            .await?;
        let dropped = self.sessions.clear_all().await;
        info!(user_id = origin.user_id.0, dropped, "all sessions cleared");
        self.messenger
            .send_html(
                origin.chat_id,
                "✅ Bot has been completely refreshed and is ready to serve!",
            )
            .await?;
        Ok(())
    }

    // ============== Upload ==============

    /// Extract contacts from an uploaded file and open a session.
    ///
    /// On any rejection the user's previous session (if any) is left as is.
    pub async fn handle_upload(&self, origin: Origin, bytes: Vec<u8>) -> Result<()> {
        let session = match String::from_utf8(bytes)
            .map_err(Error::from)
            .and_then(|text| Session::from_text(&text))
        {
            Ok(s) => s,
            Err(e) if e.is_user_facing() => return self.report(origin.chat_id, &e).await,
            Err(e) => return Err(e),
        };

        let total = session.total();
        let unnamed = session.unnamed();
        info!(
            user_id = origin.user_id.0,
            total, unnamed, "contacts extracted"
        );

        self.sessions.start(origin.user_id, session).await;

        if unnamed > 0 {
            self.messenger
                .send_html(
                    origin.chat_id,
                    &formatting::base_name_prompt(total, unnamed),
                )
                .await?;
            return Ok(());
        }

        self.show_split_menu(origin.chat_id, total).await
    }

    async fn show_split_menu(&self, chat_id: ChatId, total: usize) -> Result<()> {
        self.messenger
            .send_inline_keyboard(
                chat_id,
                &formatting::split_menu_prompt(total),
                InlineKeyboard::split_menu(&self.cfg.split_sizes),
            )
            .await?;
        Ok(())
    }

    // ============== Text answers ==============

    /// A plain text message: either the base name or the output filename.
    pub async fn handle_text(&self, origin: Origin, text: &str) -> Result<()> {
        let step = match self
            .sessions
            .apply(origin.user_id, Answer::Text(text.to_string()))
            .await
        {
            Ok(step) => step,
            Err(e @ Error::SessionMissing) => return self.report(origin.chat_id, &e).await,
            Err(e) => return Err(e),
        };

        match step {
            Step::BaseNameSet { base_name, total } => {
                info!(user_id = origin.user_id.0, "base name set");
                self.messenger
                    .send_html(origin.chat_id, &formatting::base_name_set(&base_name))
                    .await?;
                self.show_split_menu(origin.chat_id, total).await
            }
            Step::Finished {
                prefix,
                chunk_size,
                outputs,
            } => {
                self.messenger
                    .send_html(origin.chat_id, &formatting::filename_set(&prefix))
                    .await?;
                self.deliver(origin.chat_id, &prefix, chunk_size.is_some(), outputs)
                    .await
            }
            Step::FilenameRequested { .. } | Step::Ignored => {
                debug!(user_id = origin.user_id.0, "text ignored in current state");
                Ok(())
            }
        }
    }

    async fn deliver(
        &self,
        chat_id: ChatId,
        prefix: &str,
        batched: bool,
        outputs: Vec<OutputBlob>,
    ) -> Result<()> {
        let files = outputs.len();
        let total: usize = outputs.iter().map(|b| b.contact_count()).sum();

        let _ = self
            .messenger
            .send_chat_action(chat_id, ChatAction::UploadDocument)
            .await;

        for blob in outputs {
            let caption = formatting::output_caption(&blob, batched);
            self.messenger
                .send_document(chat_id, OutgoingDocument::from_blob(blob, caption))
                .await?;
        }

        if batched {
            self.messenger
                .send_html(chat_id, &formatting::batch_summary(files, total, prefix))
                .await?;
        }

        info!(chat_id = chat_id.0, files, total, "vcf files delivered");
        Ok(())
    }

    // ============== Split menu ==============

    pub async fn handle_split_choice(&self, origin: Origin, choice: SplitChoice) -> Result<()> {
        let _ = self
            .messenger
            .answer_callback_query(&choice.callback_id)
            .await;

        let size = match parse_split_data(&self.cfg, &choice.data) {
            Ok(size) => size,
            Err(e) => return self.report(origin.chat_id, &e).await,
        };

        let step = match self
            .sessions
            .apply(origin.user_id, Answer::Split(size))
            .await
        {
            Ok(step) => step,
            Err(Error::SessionMissing) => {
                return self
                    .reply_or_edit(
                        origin.chat_id,
                        choice.message,
                        "❌ Session expired. Please start over with /start",
                    )
                    .await;
            }
            Err(e) => return Err(e),
        };

        match step {
            Step::FilenameRequested { chunk_size, total } => {
                info!(
                    user_id = origin.user_id.0,
                    chunk_size = chunk_size.map(|s| s.get()),
                    "split chosen"
                );
                self.reply_or_edit(
                    origin.chat_id,
                    choice.message,
                    &formatting::filename_prompt(chunk_size, total),
                )
                .await
            }
            _ => {
                self.messenger
                    .send_html(
                        origin.chat_id,
                        "Please send a base name for the unnamed contacts first.",
                    )
                    .await?;
                Ok(())
            }
        }
    }

    async fn reply_or_edit(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        html: &str,
    ) -> Result<()> {
        if let Some(msg) = message {
            if self.messenger.edit_html(msg, html).await.is_ok() {
                return Ok(());
            }
        }
        self.messenger.send_html(chat_id, html).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::default_split_sizes,
        domain::{MessageId, UserId},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Sent {
        Html(String),
        Edit(i32, String),
        Keyboard(String, InlineKeyboard),
        Answer(String),
        Action(ChatAction),
        Document(OutgoingDocument),
    }

    #[derive(Default)]
    struct FakeMessenger {
        sent: Mutex<Vec<Sent>>,
    }

    impl FakeMessenger {
        fn push(&self, s: Sent) -> MessageRef {
            let mut sent = self.sent.lock().unwrap();
            sent.push(s);
            MessageRef {
                chat_id: ChatId(1),
                message_id: MessageId(sent.len() as i32),
            }
        }

        fn take(&self) -> Vec<Sent> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, _chat_id: ChatId, html: &str) -> Result<MessageRef> {
            Ok(self.push(Sent::Html(html.to_string())))
        }

        async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
            self.push(Sent::Edit(msg.message_id.0, html.to_string()));
            Ok(())
        }

        async fn send_chat_action(&self, _chat_id: ChatId, action: ChatAction) -> Result<()> {
            self.push(Sent::Action(action));
            Ok(())
        }

        async fn send_inline_keyboard(
            &self,
            _chat_id: ChatId,
            html: &str,
            keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            Ok(self.push(Sent::Keyboard(html.to_string(), keyboard)))
        }

        async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
            self.push(Sent::Answer(callback_id.to_string()));
            Ok(())
        }

        async fn send_document(
            &self,
            _chat_id: ChatId,
            doc: OutgoingDocument,
        ) -> Result<MessageRef> {
            Ok(self.push(Sent::Document(doc)))
        }
    }

    fn test_config() -> Config {
        Config {
            telegram_bot_token: "test".to_string(),
            split_sizes: default_split_sizes(),
            max_file_size: 1024,
            health_addr: None,
        }
    }

    fn setup() -> (Conversation, Arc<FakeMessenger>) {
        let messenger = Arc::new(FakeMessenger::default());
        let conv = Conversation::new(
            Arc::new(test_config()),
            Arc::new(SessionStore::new()),
            messenger.clone(),
        );
        (conv, messenger)
    }

    const ORIGIN: Origin = Origin {
        user_id: UserId(42),
        chat_id: ChatId(1),
    };

    fn choice(data: &str) -> SplitChoice {
        SplitChoice {
            callback_id: "cb".to_string(),
            data: data.to_string(),
            message: Some(MessageRef {
                chat_id: ChatId(1),
                message_id: MessageId(99),
            }),
        }
    }

    fn documents(sent: &[Sent]) -> Vec<&OutgoingDocument> {
        sent.iter()
            .filter_map(|s| match s {
                Sent::Document(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn split_data_parsing() {
        let cfg = test_config();
        assert_eq!(parse_split_data(&cfg, "no_split").unwrap(), None);
        assert_eq!(
            parse_split_data(&cfg, "split_50").unwrap(),
            ChunkSize::new(50)
        );
        assert!(matches!(
            parse_split_data(&cfg, "split_51"),
            Err(Error::InvalidChunkSize(_))
        ));
        assert!(matches!(
            parse_split_data(&cfg, "split_0"),
            Err(Error::InvalidChunkSize(_))
        ));
        assert!(matches!(
            parse_split_data(&cfg, "askuser:1:2"),
            Err(Error::InvalidChunkSize(_))
        ));
    }

    #[test]
    fn upload_checks() {
        let cfg = test_config();
        assert!(check_upload(&cfg, Some("contacts.TXT"), 10).is_ok());
        assert!(matches!(
            check_upload(&cfg, Some("contacts.csv"), 10),
            Err(Error::UnsupportedFile(_))
        ));
        assert!(matches!(
            check_upload(&cfg, None, 10),
            Err(Error::UnsupportedFile(_))
        ));
        assert!(matches!(
            check_upload(&cfg, Some("big.txt"), 4096),
            Err(Error::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn unnamed_upload_to_batched_files() {
        let (conv, msgr) = setup();
        let text: String = (1..=120).map(|i| format!("+1{:09}\n", i)).collect();

        conv.handle_upload(ORIGIN, text.into_bytes()).await.unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[..], [Sent::Html(s)] if s.contains("Found 120 contacts, but 120")));

        conv.handle_text(ORIGIN, "Shubh").await.unwrap();
        let sent = msgr.take();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Sent::Keyboard(s, _) if s.contains("Found 120 contacts!")));

        conv.handle_split_choice(ORIGIN, choice("split_50"))
            .await
            .unwrap();
        let sent = msgr.take();
        assert_eq!(sent[0], Sent::Answer("cb".to_string()));
        assert!(matches!(&sent[1], Sent::Edit(99, s) if s.contains("zeno_51-100.vcf")));

        conv.handle_text(ORIGIN, "zeno").await.unwrap();
        let sent = msgr.take();
        let docs = documents(&sent);
        let names: Vec<&str> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["zeno_1-50.vcf", "zeno_51-100.vcf", "zeno_101-120.vcf"]
        );
        let last = String::from_utf8(docs[2].bytes.clone()).unwrap();
        assert!(last.starts_with("BEGIN:VCARD\nVERSION:3.0\nFN:Shubh 101\n"));
        assert_eq!(
            docs[2].caption.as_deref(),
            Some("📁 zeno_101-120.vcf - 20 contacts (#101-120)")
        );
        assert!(matches!(sent.last(), Some(Sent::Html(s)) if s.contains("Created 3 VCF files with 120 total contacts")));

        // Session is gone once files are delivered.
        assert!(!conv.sessions.contains(ORIGIN.user_id).await);
    }

    #[tokio::test]
    async fn named_upload_single_file() {
        let (conv, msgr) = setup();
        conv.handle_upload(ORIGIN, b"John Doe +1234567890\nJane 0987654321\n".to_vec())
            .await
            .unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[..], [Sent::Keyboard(s, _)] if s.contains("Found 2 contacts!")));

        conv.handle_split_choice(ORIGIN, choice("no_split"))
            .await
            .unwrap();
        msgr.take();

        conv.handle_text(ORIGIN, "family").await.unwrap();
        let sent = msgr.take();
        let docs = documents(&sent);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "family_1-2.vcf");
        assert_eq!(
            docs[0].caption.as_deref(),
            Some("✅ Your VCF file 'family_1-2.vcf' with 2 contacts!")
        );
        // No batch summary for a single file.
        assert!(matches!(sent.last(), Some(Sent::Document(_))));
    }

    #[tokio::test]
    async fn empty_upload_keeps_previous_session() {
        let (conv, msgr) = setup();
        conv.handle_upload(ORIGIN, b"A 1234567890".to_vec())
            .await
            .unwrap();
        msgr.take();

        conv.handle_upload(ORIGIN, b"nothing here".to_vec())
            .await
            .unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[..], [Sent::Html(s)] if s.contains("No valid contacts")));
        assert!(conv.sessions.contains(ORIGIN.user_id).await);
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected() {
        let (conv, msgr) = setup();
        conv.handle_upload(ORIGIN, vec![0xff, 0xfe, b'1'])
            .await
            .unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[..], [Sent::Html(s)] if s.contains("UTF-8")));
        assert!(conv.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn text_without_session_asks_for_file() {
        let (conv, msgr) = setup();
        conv.handle_text(ORIGIN, "hello").await.unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[..], [Sent::Html(s)] if s.contains("send a contact file first")));
    }

    #[tokio::test]
    async fn button_without_session_reports_expiry() {
        let (conv, msgr) = setup();
        conv.handle_split_choice(ORIGIN, choice("split_35"))
            .await
            .unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[1], Sent::Edit(99, s) if s.contains("Session expired")));
    }

    #[tokio::test]
    async fn unknown_split_size_is_rejected() {
        let (conv, msgr) = setup();
        conv.handle_upload(ORIGIN, b"A 1234567890".to_vec())
            .await
            .unwrap();
        msgr.take();

        conv.handle_split_choice(ORIGIN, choice("split_7"))
            .await
            .unwrap();
        let sent = msgr.take();
        assert!(matches!(&sent[1], Sent::Html(s) if s.contains("Unknown split option")));
        let session = conv.sessions.get(ORIGIN.user_id).await.unwrap();
        assert_eq!(session.chunk_size(), None);
    }

    #[tokio::test]
    async fn restart_and_lord_clear_sessions() {
        let (conv, msgr) = setup();
        let other = Origin {
            user_id: UserId(7),
            chat_id: ChatId(7),
        };
        conv.handle_upload(ORIGIN, b"A 1234567890".to_vec())
            .await
            .unwrap();
        conv.handle_upload(other, b"B 1234567890".to_vec())
            .await
            .unwrap();

        conv.restart(ORIGIN).await.unwrap();
        assert!(!conv.sessions.contains(ORIGIN.user_id).await);
        assert!(conv.sessions.contains(other.user_id).await);

        conv.lord(ORIGIN).await.unwrap();
        assert!(conv.sessions.is_empty().await);
        msgr.take();
    }
}
