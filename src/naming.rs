use std::cmp::Ordering;

/// Lesson/series id derived from a file or directory name.
pub fn slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in strip_extension(&lowered).chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Display title: extension stripped, each hyphen turned into a space.
///
/// Not the inverse of [`slug`].
pub fn title(name: &str) -> String {
    strip_extension(name).replace('-', " ")
}

/// Removes a trailing `.ext` (a dot followed by at least one non-dot char).
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// First run of ASCII digits in `name`, or 0 when there is none.
pub fn leading_number(name: &str) -> u64 {
    let Some(start) = name.find(|c: char| c.is_ascii_digit()) else {
        return 0;
    };
    let digits = &name[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(u64::MAX)
}

/// Numeric order by [`leading_number`], then lexical by name.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    leading_number(a)
        .cmp(&leading_number(b))
        .then_with(|| a.cmp(b))
}
