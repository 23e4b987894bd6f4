use std::collections::HashMap;

use proptest::prelude::*;
use sealexec::env::{Environment, EnvironmentBuilder};

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,6}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9=/ ._-]{0,12}"
}

proptest! {
    #[test]
    fn last_write_wins_and_order_follows_first_occurrence(
        pairs in proptest::collection::vec((key_strategy(), value_strategy()), 0..20)
    ) {
        let mut env = Environment::new();
        for (k, v) in &pairs {
            env.set(k.clone(), v.clone());
        }

        // Expected: map of last values, order of first appearance.
        let mut last: HashMap<&str, &str> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for (k, v) in &pairs {
            if !last.contains_key(k.as_str()) {
                order.push(k.as_str());
            }
            last.insert(k.as_str(), v.as_str());
        }

        let got: Vec<(&str, &str)> = env.iter().collect();
        let want: Vec<(&str, &str)> = order.iter().map(|k| (*k, last[k])).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn pristine_environment_is_exactly_the_secrets(
        pairs in proptest::collection::vec((key_strategy(), value_strategy()), 0..20)
    ) {
        let plaintext: String = pairs.iter().map(|(k, v)| format!("{k}={v}\n")).collect();
        let env = EnvironmentBuilder::new()
            .pristine(true)
            .secrets(plaintext.as_bytes())
            .build()
            .unwrap();

        let mut expected = Environment::new();
        expected.extend_pairs(pairs.iter().map(|(k, v)| format!("{k}={v}"))).unwrap();
        prop_assert_eq!(env, expected);
    }
}
