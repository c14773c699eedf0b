//! Confirmation text sent back to the chat.

use crate::config::ReplyFormat;

/// `Note «title» created` plus the tag list, in the configured dialect.
pub fn confirmation(title: &str, tags: &[String], format: ReplyFormat) -> String {
    let tag_list: String = tags
        .iter()
        .map(|t| match format {
            ReplyFormat::Markdown => format!("#{} ", escape_markdown(t)),
            ReplyFormat::Html => format!("#{} ", escape_html(t)),
        })
        .collect();

    match format {
        // Legacy Markdown has no escape inside an entity, so `*` is dropped
        // from the bold title.
        ReplyFormat::Markdown => format!(
            "Note *«{}»* created \nTags: {}",
            title.replace('*', ""),
            tag_list
        ),
        ReplyFormat::Html => format!(
            "Note <b>«{}»</b> created \nTags: {}",
            escape_html(title),
            tag_list
        ),
    }
}

fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
