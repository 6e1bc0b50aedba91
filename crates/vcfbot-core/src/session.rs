use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    batch::{produce_outputs, OutputBlob},
    chunk::ChunkSize,
    domain::UserId,
    errors::Error,
    extract::{extract, ContactRecord},
    naming::{apply_base_name, count_unnamed},
    Result,
};

/// What the next answer from the user is expected to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingInput {
    /// Names resolved; waiting for a split choice.
    #[default]
    Idle,
    AwaitingBaseName,
    AwaitingFilename,
}

/// An answer received from the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Plain chat text.
    Text(String),
    /// Split menu button. `None` keeps everything in one file.
    Split(Option<ChunkSize>),
}

/// Result of feeding an answer to a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    BaseNameSet { base_name: String, total: usize },
    FilenameRequested { chunk_size: Option<ChunkSize>, total: usize },
    /// Files are ready; the session is done and should be dropped.
    Finished {
        prefix: String,
        chunk_size: Option<ChunkSize>,
        outputs: Vec<OutputBlob>,
    },
    /// The answer does not fit the current state.
    Ignored,
}

/// Per-user conversation state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    contacts: Vec<ContactRecord>,
    pending: PendingInput,
    chunk_size: Option<ChunkSize>,
    base_name: Option<String>,
}

impl Session {
    /// Start a session from uploaded text.
    ///
    /// Returns `NoContactsFound` when nothing could be extracted.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_contacts(extract(text))
    }

    pub fn from_contacts(contacts: Vec<ContactRecord>) -> Result<Self> {
        if contacts.is_empty() {
            return Err(Error::NoContactsFound);
        }
        let pending = if count_unnamed(&contacts) > 0 {
            PendingInput::AwaitingBaseName
        } else {
            PendingInput::Idle
        };
        Ok(Self {
            contacts,
            pending,
            chunk_size: None,
            base_name: None,
        })
    }

    pub fn contacts(&self) -> &[ContactRecord] {
        &self.contacts
    }

    pub fn pending(&self) -> PendingInput {
        self.pending
    }

    pub fn chunk_size(&self) -> Option<ChunkSize> {
        self.chunk_size
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    pub fn total(&self) -> usize {
        self.contacts.len()
    }

    pub fn unnamed(&self) -> usize {
        count_unnamed(&self.contacts)
    }

    /// The single transition function of the conversation.
    pub fn apply(&mut self, answer: Answer) -> Step {
        match (self.pending, answer) {
            (_, Answer::Text(text)) if text.trim().is_empty() => Step::Ignored,

            (PendingInput::AwaitingBaseName, Answer::Text(text)) => {
                let base = text.trim().to_string();
                self.contacts = apply_base_name(std::mem::take(&mut self.contacts), &base);
                self.base_name = Some(base.clone());
                self.pending = PendingInput::Idle;
                Step::BaseNameSet {
                    base_name: base,
                    total: self.total(),
                }
            }

            (PendingInput::Idle | PendingInput::AwaitingFilename, Answer::Split(size)) => {
                self.chunk_size = size;
                self.pending = PendingInput::AwaitingFilename;
                Step::FilenameRequested {
                    chunk_size: size,
                    total: self.total(),
                }
            }

            (PendingInput::AwaitingFilename, Answer::Text(text)) => {
                let prefix = text.trim().to_string();
                let outputs = produce_outputs(&self.contacts, &prefix, self.chunk_size);
                self.pending = PendingInput::Idle;
                Step::Finished {
                    prefix,
                    chunk_size: self.chunk_size,
                    outputs,
                }
            }

            (PendingInput::AwaitingBaseName, Answer::Split(_))
            | (PendingInput::Idle, Answer::Text(_)) => Step::Ignored,
        }
    }
}

/// Sessions keyed by user, owned by the transport layer.
///
/// The lock is only held for a single lookup or transition, never across I/O.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever the user had with a fresh session.
    pub async fn start(&self, user_id: UserId, session: Session) {
        self.inner.lock().await.insert(user_id, session);
    }

    pub async fn get(&self, user_id: UserId) -> Option<Session> {
        self.inner.lock().await.get(&user_id).cloned()
    }

    pub async fn contains(&self, user_id: UserId) -> bool {
        self.inner.lock().await.contains_key(&user_id)
    }

    /// Apply an answer to the user's session. A finished session is removed.
    pub async fn apply(&self, user_id: UserId, answer: Answer) -> Result<Step> {
        let mut map = self.inner.lock().await;
        let session = map.get_mut(&user_id).ok_or(Error::SessionMissing)?;
        let step = session.apply(answer);
        if matches!(step, Step::Finished { .. }) {
            map.remove(&user_id);
        }
        Ok(step)
    }

    /// Drop one user's session. Returns whether there was one.
    pub async fn clear(&self, user_id: UserId) -> bool {
        self.inner.lock().await.remove(&user_id).is_some()
    }

    /// Drop every session. Returns how many were dropped.
    pub async fn clear_all(&self) -> usize {
        let mut map = self.inner.lock().await;
        let n = map.len();
        map.clear();
        n
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> Option<ChunkSize> {
        ChunkSize::new(n)
    }

    #[test]
    fn empty_extraction_is_no_contacts_found() {
        assert!(matches!(
            Session::from_text("hello\nworld"),
            Err(Error::NoContactsFound)
        ));
    }

    #[test]
    fn named_contacts_skip_base_name_prompt() {
        let s = Session::from_text("Alice 1234567890\nBob 0987654321").unwrap();
        assert_eq!(s.pending(), PendingInput::Idle);
        assert_eq!(s.total(), 2);
        assert_eq!(s.unnamed(), 0);
    }

    #[test]
    fn full_flow_with_base_name_and_split() {
        let mut s = Session::from_text("+1111111111\nBob 2222222222\n3333333333").unwrap();
        assert_eq!(s.pending(), PendingInput::AwaitingBaseName);
        assert_eq!(s.unnamed(), 2);

        // Button press before the base name is answered does nothing.
        assert_eq!(s.apply(Answer::Split(size(2))), Step::Ignored);

        let step = s.apply(Answer::Text("  Shubh ".to_string()));
        assert_eq!(
            step,
            Step::BaseNameSet {
                base_name: "Shubh".to_string(),
                total: 3
            }
        );
        assert_eq!(s.base_name(), Some("Shubh"));
        let names: Vec<&str> = s.contacts().iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Shubh 1", "Bob", "Shubh 3"]);

        // Text while waiting for a split choice is ignored.
        assert_eq!(s.apply(Answer::Text("zeno".to_string())), Step::Ignored);

        assert_eq!(
            s.apply(Answer::Split(size(2))),
            Step::FilenameRequested {
                chunk_size: size(2),
                total: 3
            }
        );
        assert_eq!(s.pending(), PendingInput::AwaitingFilename);

        let Step::Finished {
            prefix, outputs, ..
        } = s.apply(Answer::Text("zeno".to_string())) else {
            panic!("expected finished step");
        };
        assert_eq!(prefix, "zeno");
        let files: Vec<&str> = outputs.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(files, vec!["zeno_1-2.vcf", "zeno_3-3.vcf"]);
        assert!(outputs[1].content.contains("FN:Shubh 3\n"));
    }

    #[test]
    fn split_choice_can_be_changed_before_filename() {
        let mut s = Session::from_text("A 1234567890").unwrap();
        s.apply(Answer::Split(size(35)));
        s.apply(Answer::Split(None));
        assert_eq!(s.chunk_size(), None);

        let Step::Finished { outputs, .. } = s.apply(Answer::Text("one".to_string())) else {
            panic!("expected finished step");
        };
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].filename, "one_1-1.vcf");
    }

    #[test]
    fn blank_text_is_ignored_everywhere() {
        let mut s = Session::from_text("1234567890").unwrap();
        assert_eq!(s.apply(Answer::Text("   ".to_string())), Step::Ignored);
        assert_eq!(s.pending(), PendingInput::AwaitingBaseName);
    }

    #[tokio::test]
    async fn store_drops_finished_sessions() {
        let store = SessionStore::new();
        let u = UserId(7);

        assert!(matches!(
            store.apply(u, Answer::Text("x".to_string())).await,
            Err(Error::SessionMissing)
        ));

        store
            .start(u, Session::from_text("A 1234567890").unwrap())
            .await;
        assert!(store.contains(u).await);

        store.apply(u, Answer::Split(None)).await.unwrap();
        let step = store.apply(u, Answer::Text("out".to_string())).await.unwrap();
        assert!(matches!(step, Step::Finished { .. }));
        assert!(!store.contains(u).await);
    }

    #[tokio::test]
    async fn store_isolates_users_and_clears() {
        let store = SessionStore::new();
        store
            .start(UserId(1), Session::from_text("1234567890").unwrap())
            .await;
        store
            .start(UserId(2), Session::from_text("B 1234567890").unwrap())
            .await;

        store
            .apply(UserId(1), Answer::Text("X".to_string()))
            .await
            .unwrap();
        let other = store.get(UserId(2)).await.unwrap();
        assert_eq!(other.contacts()[0].name.as_deref(), Some("B"));

        assert!(store.clear(UserId(1)).await);
        assert!(!store.clear(UserId(1)).await);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.clear_all().await, 1);
        assert!(store.is_empty().await);
    }
}
