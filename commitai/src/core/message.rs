//! Commit message assembly and display helpers.

use crate::core::types::MergedGroup;

/// Build the commit message for a group.
///
/// The first message is the subject. Additional messages follow on their
/// own lines as `- <message>` bullets.
pub fn commit_message(group: &MergedGroup) -> String {
    let mut messages = group.messages.iter();
    let mut out = messages.next().cloned().unwrap_or_default();
    for extra in messages {
        out.push_str("\n- ");
        out.push_str(extra);
    }
    out
}

/// Quote an argument for display in a planned command line.
///
/// Display only; the backend never goes through a shell.
pub fn quote_arg(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
