use crate::{
    chunk::{chunk, ChunkSize},
    extract::ContactRecord,
    vcard::render,
};

/// One rendered VCF file, ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputBlob {
    pub filename: String,
    pub content: String,
    /// 1-based, inclusive position of the first contact in the file.
    pub start: usize,
    /// 1-based, inclusive position of the last contact in the file.
    pub end: usize,
}

impl OutputBlob {
    pub fn contact_count(&self) -> usize {
        self.end + 1 - self.start
    }
}

/// `{prefix}_{start}-{end}.vcf`
pub fn output_filename(prefix: &str, start: usize, end: usize) -> String {
    format!("{prefix}_{start}-{end}.vcf")
}

/// Render contacts into one file, or one file per chunk when `chunk_size` is set.
///
/// Each chunk is rendered on its own, so fallback `Contact {i}` names restart at
/// 1 in every file.
pub fn produce_outputs(
    contacts: &[ContactRecord],
    prefix: &str,
    chunk_size: Option<ChunkSize>,
) -> Vec<OutputBlob> {
    let total = contacts.len();

    let Some(size) = chunk_size else {
        return vec![OutputBlob {
            filename: output_filename(prefix, 1, total),
            content: render(contacts),
            start: 1,
            end: total,
        }];
    };

    let k = size.get();
    chunk(contacts, size)
        .into_iter()
        .enumerate()
        .map(|(idx, group)| {
            let start = idx * k + 1;
            let end = ((idx + 1) * k).min(total);
            OutputBlob {
                filename: output_filename(prefix, start, end),
                content: render(group),
                start,
                end,
            }
        })
        .collect()
}
