/// Parse an integer literal, rejecting values that do not fit in `i64`
pub(crate) fn parse_integer(text: &str) -> Result<i64, String> {
    text.parse::<i64>()
        .map_err(|_| format!("integer literal '{}' is out of range", text))
}

pub(crate) fn parse_float(text: &str) -> Result<f64, String> {
    let value = text
        .parse::<f64>()
        .map_err(|_| format!("malformed numeric literal '{}'", text))?;
    if !value.is_finite() {
        return Err(format!("float literal '{}' is out of range", text));
    }
    Ok(value)
}

/// Decode backslash escapes in the body of a string literal.
///
/// On failure returns the message and the byte offset of the offending
/// backslash within `raw`.
pub(crate) fn unescape_string(raw: &str) -> Result<String, (String, usize)> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '"')) => out.push('"'),
            Some((_, '\\')) => out.push('\\'),
            Some((_, 'n')) => out.push('\n'),
            Some((_, 't')) => out.push('\t'),
            Some((_, 'r')) => out.push('\r'),
            Some((_, other)) => {
                return Err((format!("unknown escape sequence '\\{}'", other), i));
            }
            None => return Err(("unterminated escape sequence".to_string(), i)),
        }
    }
    Ok(out)
}
