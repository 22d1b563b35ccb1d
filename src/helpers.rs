/// Percent-encode a DSN component so credentials and database names with
/// reserved characters survive inside the connection string.
pub fn url_encode(input: &str) -> String {
    input
        .replace("%", "%25") // Must be first
        .replace("#", "%23")
        .replace("&", "%26")
        .replace("@", "%40")
        .replace("?", "%3F")
        .replace("=", "%3D")
        .replace("+", "%2B")
        .replace(" ", "%20")
        .replace(":", "%3A")
        .replace("/", "%2F")
}

/// Trim the input, rejecting blank strings.
pub fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
