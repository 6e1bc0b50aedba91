//! vCard 3.0 rendering.
//!
//! Field values are written verbatim. `;`, `,` and `\` in a name are not
//! escaped, so structured-field readers may split such names.

use crate::extract::ContactRecord;

/// Render contacts as concatenated vCard records, each followed by a blank line.
///
/// A contact without a name becomes `Contact {i}`, where `i` is its 1-based
/// position in `contacts` (not in any larger sequence it was sliced from).
pub fn render(contacts: &[ContactRecord]) -> String {
    let mut out = String::new();
    for (idx, contact) in contacts.iter().enumerate() {
        let fallback;
        let name = match &contact.name {
            Some(n) => n.as_str(),
            None => {
                fallback = format!("Contact {}", idx + 1);
                fallback.as_str()
            }
        };

        out.push_str(&format!(
            "BEGIN:VCARD\nVERSION:3.0\nFN:{name}\nTEL:{}\nEND:VCARD\n\n",
            contact.phone
        ));
    }
    out
}
