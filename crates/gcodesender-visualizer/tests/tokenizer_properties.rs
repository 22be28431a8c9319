use gcodesender_visualizer::tokenize;
use proptest::prelude::*;

const CODE: &str = "[GMXYZFIJ0-9 .\t\n-]{0,40}";
const COMMENT: &str = "[A-Za-z0-9 .]{0,20}";

proptest! {
    #[test]
    fn text_without_command_letters_is_empty(text in "[^GM]{0,80}") {
        prop_assert!(tokenize(&text).is_empty());
    }

    #[test]
    fn inline_comments_are_invisible(
        before in CODE,
        comment in COMMENT,
        after in CODE,
    ) {
        let with_comment = format!("{}({}){}", before, comment, after);
        let without = format!("{}{}", before, after);
        prop_assert_eq!(tokenize(&with_comment), tokenize(&without));
    }

    #[test]
    fn line_comments_are_invisible(
        before in CODE,
        comment in COMMENT,
        after in CODE,
    ) {
        let with_comment = format!("{};{}\n{}", before, comment, after);
        let without = format!("{}{}", before, after);
        prop_assert_eq!(tokenize(&with_comment), tokenize(&without));
    }

    #[test]
    fn tokenizing_is_idempotent(text in "[GMXYZF0-9 .\t\n;()-]{0,80}") {
        let first = tokenize(&text);
        let second = tokenize(&first.join(" "));
        prop_assert_eq!(first, second);
    }
}
