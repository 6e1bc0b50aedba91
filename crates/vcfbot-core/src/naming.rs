use crate::extract::ContactRecord;

/// Name every unnamed contact `"{base} {i}"`, `i` being its 1-based position
/// in the whole sequence (named contacts still count towards `i`).
pub fn apply_base_name(mut contacts: Vec<ContactRecord>, base: &str) -> Vec<ContactRecord> {
    for (idx, contact) in contacts.iter_mut().enumerate() {
        if contact.name.is_none() {
            contact.name = Some(format!("{base} {}", idx + 1));
        }
    }
    contacts
}

pub fn count_unnamed(contacts: &[ContactRecord]) -> usize {
    contacts.iter().filter(|c| !c.has_name()).count()
}
