//! Merging of the command-line prompt with piped input.

/// Combine an explicit prompt with piped text.
///
/// Empty strings count as absent. When both are present the prompt comes
/// first, separated from the input by a blank line.
pub fn combine_prompt(prompt: Option<&str>, input: Option<&str>) -> Option<String> {
    let prompt = prompt.filter(|p| !p.is_empty());
    let input = input.filter(|i| !i.is_empty());

    match (prompt, input) {
        (Some(prompt), Some(input)) => Some(format!("{}\n\n{}", prompt, input)),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_and_input_joined_by_blank_line() {
        assert_eq!(
            combine_prompt(Some("summarize"), Some("lorem ipsum")).as_deref(),
            Some("summarize\n\nlorem ipsum")
        );
    }

    #[test]
    fn test_input_only_is_verbatim() {
        assert_eq!(
            combine_prompt(None, Some("lorem ipsum")).as_deref(),
            Some("lorem ipsum")
        );
        assert_eq!(
            combine_prompt(Some(""), Some("lorem ipsum")).as_deref(),
            Some("lorem ipsum")
        );
    }

    #[test]
    fn test_prompt_only_is_verbatim() {
        assert_eq!(
            combine_prompt(Some("hello"), None).as_deref(),
            Some("hello")
        );
        assert_eq!(
            combine_prompt(Some("hello"), Some("")).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_nothing_to_send() {
        assert_eq!(combine_prompt(None, None), None);
        assert_eq!(combine_prompt(Some(""), Some("")), None);
    }
}
