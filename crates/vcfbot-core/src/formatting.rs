//! User-facing texts, in Telegram HTML.

use crate::{
    batch::{output_filename, OutputBlob},
    chunk::ChunkSize,
};

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn welcome_message() -> String {
    "🤖 <b>VCF Converter Bot</b>\n\n\
Welcome! I can help you convert text files to VCF format.\n\n\
<b>Available Commands:</b>\n\
/start - Show this message\n\
/restart - Restart the bot if it's slow\n\
/help - Show help information\n\n\
<b>How to use:</b>\n\
1. Send me a text file with contacts\n\
2. If contacts don't have names, I'll ask for a base name\n\
3. Choose split options or keep all in one file\n\n\
Just send me your contact file to get started! 📱"
        .to_string()
}

pub fn help_message(split_sizes: &[ChunkSize]) -> String {
    let sizes = split_sizes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "🆘 <b>Help - VCF Converter Bot</b>\n\n\
<b>Supported file formats:</b>\n\
- Text files (.txt)\n\
- Any text content with phone numbers\n\n\
<b>Features:</b>\n\
- Auto-detect phone numbers\n\
- Split into multiple VCF files ({sizes} contacts)\n\
- Keep all contacts in one file\n\
- Auto-name contacts if no names provided\n\
- Custom VCF file names with contact ranges\n\n\
<b>Commands:</b>\n\
/start - Start the bot\n\
/restart - Fix slow/stuck bot\n\
/lord - Force restart with full refresh\n\
/help - Show this help\n\n\
<b>Usage Example:</b>\n\
1. Send a .txt file with contacts like:\n\
<pre>John Doe +1234567890\nJane Smith +0987654321\n+1122334455</pre>\n\
2. Choose split option or single file\n\
3. Enter custom filename (e.g., 'zeno')\n\
4. Get files named like: zeno_1-50.vcf, zeno_51-100.vcf"
    )
}

pub fn base_name_prompt(total: usize, unnamed: usize) -> String {
    format!(
        "📋 Found {total} contacts, but {unnamed} don't have names.\n\n\
Please send a base name for the unnamed contacts (e.g., 'Shubh'):"
    )
}

pub fn split_menu_prompt(total: usize) -> String {
    format!("📊 Found {total} contacts!\n\nHow would you like to split them?")
}

pub fn base_name_set(base_name: &str) -> String {
    format!("✅ Base name set to '{}'", escape_html(base_name))
}

/// Filename prompt with example names for the chosen split.
pub fn filename_prompt(chunk_size: Option<ChunkSize>, total: usize) -> String {
    match chunk_size {
        Some(size) => {
            let k = size.get();
            format!(
                "📝 Please enter a custom name for your VCF files.\n\n\
Example: If you enter 'zeno', your files will be named:\n\
• {}\n\
• {}\n\n\
Enter your preferred name:",
                output_filename("zeno", 1, k),
                output_filename("zeno", k.saturating_add(1), k.saturating_mul(2)),
            )
        }
        None => format!(
            "📝 Please enter a custom name for your VCF file.\n\n\
Example: If you enter 'zeno', your file will be named:\n\
• {}\n\n\
Enter your preferred name:",
            output_filename("zeno", 1, total),
        ),
    }
}

pub fn filename_set(prefix: &str) -> String {
    format!(
        "✅ Filename set to '{}'\n🔄 Creating your VCF files...",
        escape_html(prefix)
    )
}

/// Caption for a delivered file. Plain text (document captions are sent as-is).
pub fn output_caption(blob: &OutputBlob, batched: bool) -> String {
    if batched {
        format!(
            "📁 {} - {} contacts (#{}-{})",
            blob.filename,
            blob.contact_count(),
            blob.start,
            blob.end
        )
    } else {
        format!(
            "✅ Your VCF file '{}' with {} contacts!",
            blob.filename,
            blob.contact_count()
        )
    }
}

pub fn batch_summary(files: usize, total: usize, prefix: &str) -> String {
    format!(
        "✅ All done! Created {files} VCF files with {total} total contacts using name '{}'",
        escape_html(prefix)
    )
}
