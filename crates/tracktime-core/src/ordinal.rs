//! English ordinal suffixes ("1st", "2nd", "11th", ...).

/// Returns the ordinal suffix for `n`.
///
/// Negative numbers take the suffix of their absolute value.
pub const fn ordinal_suffix(n: i64) -> &'static str {
    let n = n.unsigned_abs();
    if (n % 100) / 10 == 1 {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Formats `n` followed by its ordinal suffix.
pub fn ordinal(n: i64) -> String {
    format!("{n}{}", ordinal_suffix(n))
}
