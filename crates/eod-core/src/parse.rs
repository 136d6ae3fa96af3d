//! Element-list parsing for free-form user text

/// Split a user-typed element list
///
/// Newlines take priority, then `+`, then `,`. Each part is trimmed; empty
/// parts are kept so the caller can report them as invalid elements.
///
/// # Example
///
/// ```
/// use eod_core::parse_element_list;
///
/// assert_eq!(parse_element_list("Fire + Water"), vec!["Fire", "Water"]);
/// assert_eq!(parse_element_list("Salt, Pepper"), vec!["Salt", "Pepper"]);
/// assert_eq!(parse_element_list("A + B\nC"), vec!["A + B", "C"]);
/// ```
#[must_use]
pub fn parse_element_list(text: &str) -> Vec<String> {
    let separator = if text.contains('\n') {
        '\n'
    } else if text.contains('+') {
        '+'
    } else {
        ','
    };
    text.split(separator).map(|part| part.trim().to_string()).collect()
}
