use std::num::{IntErrorKind, ParseIntError};

/// Get the run of ASCII digits starting at byte `start`, returns the length in bytes and the parsed number.
/// Returns None if there is no digit at the start position.
pub(crate) fn next_count(text: &str, start: usize) -> Option<(usize, Result<u8, ParseIntError>)> {
    let length = text[start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    (length > 0).then(|| (length, text[start..start + length].parse::<u8>()))
}

/// To be used as `The xx number ` + the explanation from here (does not have a dot).
pub(crate) const fn explain_number_error(error: &ParseIntError) -> &'static str {
    match error.kind() {
        IntErrorKind::Empty => "is empty",
        IntErrorKind::InvalidDigit => "contains an invalid character",
        IntErrorKind::NegOverflow => "is too small to fit in the internal representation",
        IntErrorKind::PosOverflow => "is too big to fit in the internal representation",
        IntErrorKind::Zero => "is zero, which is not allowed here",
        _ => "is not a valid number",
    }
}

/// Check if 'a' contains 'b' ignoring ASCII casing
pub(crate) fn contains_ignore_case(a: &str, b: &str) -> bool {
    a.to_ascii_lowercase().contains(&b.to_ascii_lowercase())
}
