//! One-line renderings of alert messages shared by the notifiers.

use crate::core::Message;

/// Renders `[CRITICAL] title: text (source)`, omitting empty parts.
pub fn summary_line(message: &Message) -> String {
    let mut line = format!("[{}]", message.kind.to_uppercase());

    if !message.title.is_empty() {
        line.push(' ');
        line.push_str(&message.title);
    }
    if !message.text.is_empty() {
        if message.title.is_empty() {
            line.push(' ');
        } else {
            line.push_str(": ");
        }
        line.push_str(&message.text);
    }

    line.push_str(&format!(" ({})", message.source));
    line
}

/// Renders `contents` as `key=value` pairs sorted by key.
pub fn contents_line(message: &Message) -> String {
    let Some(contents) = &message.contents else {
        return String::new();
    };
    let mut pairs: Vec<(&String, &String)> = contents.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
