//! Property-based tests for command tokenization

use proptest::prelude::*;
use shellgate::commands::{command_name, tokenize};

proptest! {
    #[test]
    fn test_tokenize_doesnt_panic(s in "\\PC*") {
        let _ = tokenize(&s);
    }

    #[test]
    fn test_tokens_never_contain_whitespace(s in "\\PC*") {
        let cmd = tokenize(&s);
        for token in cmd.name.iter().chain(cmd.args.iter()) {
            prop_assert!(!token.is_empty());
            prop_assert!(!token.chars().any(char::is_whitespace));
        }
    }

    #[test]
    fn test_matches_whitespace_split(s in "[ \\ta-z0-9<>=/.-]{0,40}") {
        let cmd = tokenize(&s);
        let words: Vec<&str> = s.split_whitespace().collect();
        prop_assert_eq!(cmd.name.as_deref(), words.first().copied());
        prop_assert_eq!(cmd.args.len(), words.len().saturating_sub(1));
        prop_assert_eq!(command_name(&s), words.first().copied());
    }

    #[test]
    fn test_rejoining_is_stable(
        words in prop::collection::vec("[a-zA-Z0-9_./-]{1,8}", 1..6),
        gaps in prop::collection::vec("[ \\t]{1,3}", 6),
    ) {
        let line: String = words
            .iter()
            .zip(gaps.iter())
            .map(|(w, g)| format!("{}{}", w, g))
            .collect();
        let cmd = tokenize(&line);
        prop_assert_eq!(cmd.name.as_deref(), Some(words[0].as_str()));
        prop_assert_eq!(&cmd.args[..], &words[1..]);
    }
}
