use super::Verdict;

/// Marker preceding the move token in a proposer reply
pub const MOVE_MARKER: &str = "UCI: ";
/// Marker preceding the verdict in a critic reply
pub const VERDICT_MARKER: &str = "STATUS: ";

/// Pulls structured tokens out of free-text oracle replies
pub trait MoveExtractor {
    /// The proposed move token, if the reply contains one
    fn move_token(&self, reply: &str) -> Option<String>;

    /// The critic's decision. Anything unrecognised is a rejection.
    fn verdict(&self, reply: &str) -> Verdict;
}

/// Reads the word following the last fixed marker in the reply
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerExtractor;

impl MoveExtractor for MarkerExtractor {
    fn move_token(&self, reply: &str) -> Option<String> {
        token_after(reply, MOVE_MARKER).map(|t| t.to_ascii_lowercase())
    }

    fn verdict(&self, reply: &str) -> Verdict {
        match token_after(reply, VERDICT_MARKER).map(|t| t.to_ascii_uppercase()).as_deref() {
            Some("SUCCESS") | Some("ACCEPT") => Verdict::Accept,
            _ => Verdict::Reject,
        }
    }
}

fn token_after<'a>(reply: &'a str, marker: &str) -> Option<&'a str> {
    let start = reply.rfind(marker)? + marker.len();
    let word = reply[start..].split_whitespace().next()?;
    let token = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    (!token.is_empty()).then_some(token)
}
