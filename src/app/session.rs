/// One line typed into `job-tracker session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIntent {
    Toggle(String),
    List,
    Quit,
    Blank,
    Unknown,
}

/// Commands take an exact number of tokens; anything extra is unknown.
pub fn parse_intent(line: &str) -> SessionIntent {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => SessionIntent::Blank,
        (Some("toggle"), Some(id), None) => SessionIntent::Toggle(id.to_string()),
        (Some("list"), None, None) => SessionIntent::List,
        (Some("quit") | Some("exit"), None, None) => SessionIntent::Quit,
        _ => SessionIntent::Unknown,
    }
}
