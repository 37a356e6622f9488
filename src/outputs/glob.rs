use regex::Regex;

/// Allow-list matcher for agent file writes.
///
/// `*` matches within one path segment, `**` matches across segments. A
/// pattern ending in a `**`-derived wildcard anchors only at the start, so
/// `docs/**` admits everything under `docs/`. A pattern that fails to
/// compile degrades to exact string equality rather than granting access.
pub fn matches(path: &str, pattern: &str) -> bool {
    match compile(pattern) {
        Some(re) => re.is_match(path),
        None => path == pattern,
    }
}

/// An empty allow-list admits nothing.
pub fn matches_any(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches(path, pattern))
}

fn compile(pattern: &str) -> Option<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                translated.push_str(".*");
            } else {
                translated.push_str("[^/]*");
            }
        } else {
            translated.push_str(&regex::escape(&ch.to_string()));
        }
    }
    if !translated.ends_with(".*") {
        translated.push('$');
    }
    Regex::new(&translated).ok()
}
