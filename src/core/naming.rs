//! core::naming
//!
//! Turning free-form generator output into branch names.
//!
//! Content generators (a language model or a person at a prompt) return
//! loose text: surrounding quotes, a trailing explanation line, mixed
//! case. [`clean_branch_name`] reduces that to something `git` accepts
//! while leaving already-clean names such as `add-retry-logic` untouched.

/// Generate a branch name slug from a line of text.
///
/// - Lowercase
/// - Spaces and underscores become hyphens
/// - Other characters outside `[a-z0-9-]` are dropped
/// - Runs of hyphens collapse; no leading or trailing hyphen
/// - Truncated to 50 characters
///
/// ```
/// use branchtale::core::naming::slugify;
///
/// assert_eq!(slugify("Add user authentication"), "add-user-authentication");
/// assert_eq!(slugify("Fix bug #123"), "fix-bug-123");
/// ```
pub fn slugify(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");

    let mapped: String = first_line
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            ' ' | '_' | '-' => Some('-'),
            _ => None,
        })
        .collect();

    let joined = mapped
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let truncated: String = joined.chars().take(50).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Clean generated text into a branch name.
///
/// Takes the first non-empty line, strips wrapping quotes or backticks,
/// and slugifies every `/`-separated segment so that namespaced names
/// like `fix/timeout` keep their shape. Returns an empty string when
/// nothing usable is left; callers treat that as "no name generated".
///
/// ```
/// use branchtale::core::naming::clean_branch_name;
///
/// assert_eq!(clean_branch_name("add-retry-logic"), "add-retry-logic");
/// assert_eq!(clean_branch_name("`Add Retry Logic`\n"), "add-retry-logic");
/// assert_eq!(clean_branch_name("fix/Timeout handling"), "fix/timeout-handling");
/// assert_eq!(clean_branch_name("   "), "");
/// ```
pub fn clean_branch_name(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    let unwrapped = line.trim_matches(|c| matches!(c, '"' | '\'' | '`')).trim();

    unwrapped
        .split('/')
        .map(slugify)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
