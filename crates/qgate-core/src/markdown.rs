//! Helpers for the labelled bullet lines used by qgate's markdown artifacts.

/// Values of every `- <label>: <value>` line in `markdown`, trimmed.
pub fn labelled_values<'a>(markdown: &'a str, label: &str) -> Vec<&'a str> {
    markdown
        .lines()
        .filter_map(|line| {
            line.trim()
                .strip_prefix("- ")?
                .strip_prefix(label)?
                .strip_prefix(':')
                .map(str::trim)
        })
        .collect()
}

/// Number of lines whose trimmed text equals `needle`.
pub fn count_exact_lines(markdown: &str, needle: &str) -> usize {
    markdown.lines().filter(|line| line.trim() == needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_values_require_colon_after_label() {
        let md = "- Owner: @ci\n  - Owner:  team \n- Owners: x\n* Owner: y";
        assert_eq!(labelled_values(md, "Owner"), vec!["@ci", "team"]);
    }

    #[test]
    fn test_count_exact_lines() {
        assert_eq!(count_exact_lines("a\n a \nab", "a"), 2);
    }
}
