//! Line-oriented script parser.
//!
//! ```text
//! gh auth login
//! ---
//! ? Where do you use GitHub?  [Use arrows to move, type to filter]
//! > GitHub.com
//! ---
//! select Other
//! say my.ghes.com
//! ```
//!
//! Parsing never fails: malformed input degrades to a best-effort script.

use std::path::Path;

use super::{Script, Step};
use crate::error::{HarnessError, Result};

/// Line that opens and closes an expectation block.
pub const EXPECTATION_DELIMITER: &str = "---";
/// Last token of a block line that joins it to the next line.
pub const CONTINUATION_MARKER: &str = "|";
/// First token of a select action.
pub const SELECT_KEYWORD: &str = "select";
/// First token of a say action.
pub const SAY_KEYWORD: &str = "say";

const TOKEN_SEPARATOR: char = ' ';

/// Parse script text into steps.
///
/// Empty lines are skipped everywhere. Carriage returns are kept as part of
/// the line.
pub fn parse(text: &str) -> Script {
    let mut steps = Vec::new();
    // Some(contents) while inside an expectation block.
    let mut block: Option<String> = None;

    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }

        if line == EXPECTATION_DELIMITER {
            match block.take() {
                None => block = Some(String::new()),
                Some(content) => steps.push(Step::Expectation { content }),
            }
            continue;
        }

        let tokens: Vec<&str> = line.split(TOKEN_SEPARATOR).collect();

        if let Some(content) = block.as_mut() {
            if tokens.last() == Some(&CONTINUATION_MARKER) {
                content.push_str(line.trim_end_matches('|'));
            } else {
                content.push_str(line);
                content.push('\n');
            }
            continue;
        }

        let Some((first, rest)) = tokens.split_first() else {
            continue;
        };
        let step = match *first {
            SELECT_KEYWORD => Step::Select {
                option: rest.join(" "),
            },
            SAY_KEYWORD => Step::Say {
                text: rest.join(" "),
            },
            cmd => Step::Invocation {
                cmd: cmd.to_string(),
                args: rest.iter().map(|arg| arg.to_string()).collect(),
            },
        };
        steps.push(step);
    }

    if block.is_some() {
        tracing::debug!("dropping unterminated expectation block");
    }

    Script::new(steps)
}

/// Read a script file and parse it.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Script> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        HarnessError::Setup(format!("failed to read script {}: {e}", path.display()))
    })?;
    Ok(parse(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(text: &str) -> Vec<Step> {
        parse(text).steps().to_vec()
    }

    #[test]
    fn test_single_invocation() {
        assert_eq!(
            steps("gh auth login"),
            vec![Step::invocation("gh", ["auth", "login"])]
        );
    }

    #[test]
    fn test_multiple_invocations() {
        assert_eq!(
            steps("gh auth login\ngh auth logout\n"),
            vec![
                Step::invocation("gh", ["auth", "login"]),
                Step::invocation("gh", ["auth", "logout"]),
            ]
        );
    }

    #[test]
    fn test_expectation_after_invocation() {
        assert_eq!(
            steps("gh auth login\n---\nhello\n---\n"),
            vec![
                Step::invocation("gh", ["auth", "login"]),
                Step::expectation("hello\n"),
            ]
        );
    }

    #[test]
    fn test_multiline_expectation() {
        assert_eq!(
            steps("gh auth login\n---\nsome expected output\nsome more expected output\n---\n"),
            vec![
                Step::invocation("gh", ["auth", "login"]),
                Step::expectation("some expected output\nsome more expected output\n"),
            ]
        );
    }

    #[test]
    fn test_invocations_and_expectations_interleave() {
        let text = "gh auth login\n---\nfirst\n---\n\ngh auth logout\n---\nsecond\n---\n";
        assert_eq!(
            steps(text),
            vec![
                Step::invocation("gh", ["auth", "login"]),
                Step::expectation("first\n"),
                Step::invocation("gh", ["auth", "logout"]),
                Step::expectation("second\n"),
            ]
        );
    }

    #[test]
    fn test_block_lines_joined_with_newlines() {
        let lines = ["alpha", "beta gamma", "  indented", "select inside"];
        let text = format!("---\n{}\n---\n", lines.join("\n"));
        let expected: String = lines.iter().map(|l| format!("{l}\n")).collect();
        assert_eq!(steps(&text), vec![Step::expectation(expected)]);
    }

    #[test]
    fn test_continuation_marker_joins_lines() {
        assert_eq!(
            steps("---\nHostname: |\nmy.ghes.com\n---\n"),
            vec![Step::expectation("Hostname: my.ghes.com\n")]
        );
    }

    #[test]
    fn test_continuation_marker_alone() {
        assert_eq!(
            steps("---\n|\nnext\n---\n"),
            vec![Step::expectation("next\n")]
        );
    }

    #[test]
    fn test_pipe_inside_token_is_not_a_marker() {
        assert_eq!(
            steps("---\na|\nb\n---\n"),
            vec![Step::expectation("a|\nb\n")]
        );
    }

    #[test]
    fn test_adjacent_delimiters_yield_empty_expectation() {
        assert_eq!(steps("---\n---\n"), vec![Step::expectation("")]);
    }

    #[test]
    fn test_select_keeps_spaces() {
        assert_eq!(steps("select A B"), vec![Step::select("A B")]);
    }

    #[test]
    fn test_say_keeps_spaces() {
        assert_eq!(steps("say hello world"), vec![Step::say("hello world")]);
    }

    #[test]
    fn test_keywords_without_arguments() {
        assert_eq!(
            steps("select\nsay\nls\n"),
            vec![
                Step::select(""),
                Step::say(""),
                Step::invocation("ls", Vec::<String>::new()),
            ]
        );
    }

    #[test]
    fn test_keyword_only_recognized_as_first_token() {
        assert_eq!(
            steps("echo select say"),
            vec![Step::invocation("echo", ["select", "say"])]
        );
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        assert_eq!(
            steps("gh auth login\n\n\n\ngh auth logout\n"),
            vec![
                Step::invocation("gh", ["auth", "login"]),
                Step::invocation("gh", ["auth", "logout"]),
            ]
        );
    }

    #[test]
    fn test_blank_lines_inside_block_are_ignored() {
        assert_eq!(
            steps("---\none\n\ntwo\n---\n"),
            vec![Step::expectation("one\ntwo\n")]
        );
    }

    #[test]
    fn test_one_invocation_per_line_without_blocks_or_actions() {
        let text = "a\nb c\n\nd e f\n";
        let parsed = steps(text);
        assert_eq!(parsed.len(), 3);
        assert!(parsed.iter().all(|s| matches!(s, Step::Invocation { .. })));
    }

    #[test]
    fn test_carriage_returns_are_kept() {
        assert_eq!(
            steps("gh auth\r\n"),
            vec![Step::invocation("gh", ["auth\r"])]
        );
    }

    #[test]
    fn test_unterminated_block_is_dropped() {
        assert_eq!(
            steps("gh\n---\npending\n"),
            vec![Step::invocation("gh", Vec::<String>::new())]
        );
    }

    #[test]
    fn test_delimiter_never_in_content() {
        let parsed = steps("---\na\n---\n---\nb\n---\n");
        for step in parsed {
            if let Step::Expectation { content } = step {
                assert!(!content.contains(EXPECTATION_DELIMITER));
            }
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "gh auth login\n---\n? Host |\nname\n---\nselect Other\nsay x\n";
        assert_eq!(parse(text), parse(text));
    }
}
