//! Property-based tests for the preprocessor chain

#[path = "../test_utils/mock_host.rs"]
mod mock_host;

use mock_host::{shell_session, MockHost};
use proptest::prelude::*;
use shellgate::models::Session;
use shellgate::pipeline::{from_fn, ChainResult, PreprocessorChain};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn run_chain(chain: &PreprocessorChain, command: &str) -> ChainResult {
    let mut state = shell_session();
    let mut host = MockHost::new();
    let mut session = Session::new(&mut state, &mut host);
    chain.run(command, &mut session)
}

proptest! {
    #[test]
    fn test_chain_is_left_fold(
        command in "[a-z]{1,10}( [a-z0-9-]{1,8}){0,3}",
        suffixes in prop::collection::vec("[a-z]{1,4}", 0..6),
    ) {
        let mut chain = PreprocessorChain::new();
        for (i, suffix) in suffixes.iter().enumerate() {
            let suffix = suffix.clone();
            chain.push(from_fn(format!("step{}", i), move |c| Some(format!("{}{}", c, suffix))));
        }

        let expected = suffixes.iter().fold(command.clone(), |acc, s| acc + s);
        prop_assert_eq!(run_chain(&chain, &command), ChainResult::Completed(expected));
    }

    #[test]
    fn test_nothing_runs_after_abort(
        before in 0usize..5,
        after in 1usize..5,
        command in "[a-z]{1,12}",
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = PreprocessorChain::new();

        for i in 0..before {
            let calls = calls.clone();
            chain.push(from_fn(format!("pre{}", i), move |c| {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(c.to_string())
            }));
        }
        chain.push(from_fn("veto", |_| None));
        for i in 0..after {
            let calls = calls.clone();
            chain.push(from_fn(format!("post{}", i), move |c| {
                calls.fetch_add(100, Ordering::SeqCst);
                Some(c.to_string())
            }));
        }

        let result = run_chain(&chain, &command);
        prop_assert_eq!(result, ChainResult::Aborted { step: "veto".to_string(), reason: None });
        prop_assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_reorder_keeps_every_step(names in prop::collection::hash_set("[a-z]{1,6}", 1..6)) {
        let names: Vec<String> = names.into_iter().collect();
        let mut chain = PreprocessorChain::new();
        for name in &names {
            chain.push(from_fn(name.clone(), |c| Some(c.to_string())));
        }

        let reversed: Vec<&str> = names.iter().rev().map(String::as_str).collect();
        chain.reorder(&reversed).unwrap();
        prop_assert_eq!(chain.names(), names.iter().rev().cloned().collect::<Vec<_>>());
        prop_assert_eq!(chain.len(), names.len());
    }
}
