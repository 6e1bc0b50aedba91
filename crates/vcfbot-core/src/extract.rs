use std::sync::OnceLock;

use regex::Regex;

/// Optional `+`, optional nonzero digit, then 7-15 digits.
///
/// Exotic formats (spaces or dashes inside a number, short codes) are not
/// recognized; such lines only survive through the bare-digit fallback.
const PHONE_PATTERN: &str = r"\+?[1-9]?[0-9]{7,15}";

/// One extracted contact. `name` is `None` until a naming policy fills it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactRecord {
    pub name: Option<String>,
    pub phone: String,
}

impl ContactRecord {
    pub fn new(name: Option<&str>, phone: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            phone: phone.to_string(),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("valid regex"))
}

/// All phone-shaped substrings of `line`, left to right.
pub fn phone_matches(line: &str) -> Vec<&str> {
    phone_regex().find_iter(line).map(|m| m.as_str()).collect()
}

/// Parse free-form text into contacts, one line at a time.
///
/// Never fails: lines without anything phone-like are dropped. An empty result
/// is the caller's "no contacts found" case.
pub fn extract(text: &str) -> Vec<ContactRecord> {
    let mut contacts = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        extract_line(line, &mut contacts);
    }

    contacts
}

fn extract_line(line: &str, out: &mut Vec<ContactRecord>) {
    let mut matches = phone_regex().find_iter(line).peekable();

    let Some(first) = matches.peek() else {
        if is_bare_phone(line) {
            out.push(ContactRecord::new(None, line));
        }
        return;
    };

    let name = line[..first.start()].trim();
    let name = (!name.is_empty()).then_some(name);

    for m in matches {
        out.push(ContactRecord::new(name, m.as_str()));
    }
}

/// A line that is nothing but digits once `+`, `-` and spaces are removed.
fn is_bare_phone(line: &str) -> bool {
    let stripped: String = line
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | ' '))
        .collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}
