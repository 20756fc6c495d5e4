//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input so the input only
/// ever matches literally. Pair with `LIKE ? ESCAPE '\'`.
///
/// # Example
///
/// ```
/// use querykit::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Whether `name` can be spliced into SQL as a bare identifier
///
/// Accepts ASCII letters, digits and underscores, not starting with a digit.
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace each `?` outside of quoted literals with a numbered placeholder
///
/// Fragments are written with `?` and numbered once the statement is
/// complete, so `placeholder` receives 1, 2, 3... in textual order.
/// Single-quoted strings and double-quoted identifiers are copied verbatim.
pub fn number_placeholders(sql: &str, placeholder: impl Fn(usize) -> String) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut index = 0;
    let mut quote: Option<char> = None;

    for c in sql.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    index += 1;
                    out.push_str(&placeholder(index));
                }
                _ => out.push(c),
            },
        }
    }

    out
}
