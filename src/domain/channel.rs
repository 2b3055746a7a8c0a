/// Reduce user input (`@name`, `https://t.me/s/name?x=1`, ...) to a
/// canonical lowercase channel handle.
///
/// Returns `None` when nothing usable remains.
pub fn normalize_handle(input: &str) -> Option<String> {
    let mut handle = input.trim();

    for prefix in ["https://", "http://"] {
        if let Some(rest) = handle.strip_prefix(prefix) {
            handle = rest;
        }
    }
    for prefix in ["www.t.me/", "t.me/", "telegram.me/"] {
        if let Some(rest) = handle.strip_prefix(prefix) {
            handle = rest;
        }
    }
    handle = handle.strip_prefix("s/").unwrap_or(handle);
    handle = handle.strip_prefix('@').unwrap_or(handle);

    let handle = handle
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_matches('/')
        .trim();

    if handle.is_empty() || handle.contains('/') || handle.contains(char::is_whitespace) {
        return None;
    }

    Some(handle.to_lowercase())
}
