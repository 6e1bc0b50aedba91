use crate::{batch::OutputBlob, chunk::ChunkSize};

/// Callback data of the "keep all in one file" button.
pub const NO_SPLIT_DATA: &str = "no_split";
/// Prefix of the per-size split buttons: `split_{n}`.
pub const SPLIT_DATA_PREFIX: &str = "split_";

/// Outgoing "chat action" (upload indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    UploadDocument,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

/// Inline keyboard laid out as rows of buttons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// The split menu: sizes two per row, then a full-width "one file" button.
    pub fn split_menu(sizes: &[ChunkSize]) -> Self {
        let mut rows: Vec<Vec<InlineButton>> = sizes
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .map(|size| InlineButton {
                        label: format!("{size} contacts"),
                        callback_data: format!("{SPLIT_DATA_PREFIX}{size}"),
                    })
                    .collect()
            })
            .collect();

        rows.push(vec![InlineButton {
            label: "📁 Keep all in one file".to_string(),
            callback_data: NO_SPLIT_DATA.to_string(),
        }]);

        Self { rows }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// A file to send, held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

impl OutgoingDocument {
    pub fn from_blob(blob: OutputBlob, caption: String) -> Self {
        Self {
            filename: blob.filename,
            bytes: blob.content.into_bytes(),
            caption: Some(caption),
        }
    }
}
