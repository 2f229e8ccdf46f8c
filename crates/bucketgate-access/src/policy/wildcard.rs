//! Glob matching for policy actions, resources and `StringLike` conditions.
//!
//! `*` matches any sequence of characters (including none) and `?` matches
//! exactly one character. Everything else matches literally.

/// Match `text` against `pattern`.
#[must_use]
pub fn is_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob(&pattern, &text)
}

/// Match `text` against `pattern`, ignoring ASCII case.
#[must_use]
pub fn is_match_ignore_case(pattern: &str, text: &str) -> bool {
    is_match(&pattern.to_ascii_lowercase(), &text.to_ascii_lowercase())
}

/// Iterative matcher that backtracks only to the most recent `*`.
fn glob(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
