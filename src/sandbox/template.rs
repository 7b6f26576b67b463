//! `{{name}}` placeholder substitution for request fields and script text.

use std::collections::HashMap;

/// Replace every `{{key}}` in `content` with the matching value.
///
/// Unknown placeholders are left as they are.
pub fn apply_variables(content: &str, variables: &HashMap<String, String>) -> String {
    if content.is_empty() || variables.is_empty() || !content.contains("{{") {
        return content.to_string();
    }

    let mut out = content.to_string();
    for (key, value) in variables {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// Apply run-local variables first, then environment variables.
pub fn apply_all_variables(
    content: &str,
    local: &HashMap<String, String>,
    env: &HashMap<String, String>,
) -> String {
    apply_variables(&apply_variables(content, local), env)
}
