// tests/concurrent_settlement.rs

//! Many independent contracts settling under shuffled timings must never
//! lose or duplicate an error record.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use deploydag::Deployment;
use deploydag::types::{Contract, DependencyMap};
use deploydag_test_utils::builders::{dependency_map, deployable};
use deploydag_test_utils::fake_backend::ScriptedBackend;
use deploydag_test_utils::init_tracing;
use proptest::prelude::*;

const WIDTH: usize = 16;

/// Error count, failed names, success count and blocked names of one batch.
type TrialResult = (usize, HashSet<String>, usize, Vec<String>);

fn run_trial(delays_ms: &[u64], failing: &HashSet<usize>, with_tail: bool) -> TrialResult {
    let mut backend = ScriptedBackend::new();
    let mut contracts: Vec<Contract> = Vec::new();
    for i in 0..WIDTH {
        let name = format!("leaf{i}");
        backend = backend.delay(&name, Duration::from_millis(delays_ms[i % delays_ms.len()]));
        if failing.contains(&i) {
            backend = backend.deploy_fails(&name, "reverted");
        }
        contracts.push(deployable(&name));
    }

    // Optional contract that waits on every leaf.
    let deps = if with_tail {
        contracts.push(deployable("tail"));
        let leaves: Vec<String> = (0..WIDTH).map(|i| format!("leaf{i}")).collect();
        let leaf_refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
        dependency_map(&[("tail", leaf_refs.as_slice())])
    } else {
        DependencyMap::new()
    };

    let backend = Arc::new(backend);
    let deployment = Deployment::new(backend.clone());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime");

    let outcome = rt
        .block_on(async {
            tokio::time::timeout(
                Duration::from_secs(10),
                deployment.deploy_all(&mut contracts, &deps),
            )
            .await
        })
        .expect("batch timed out")
        .expect("valid input");

    let names: HashSet<String> = outcome
        .errors
        .iter()
        .map(|e| e.contract().to_string())
        .collect();
    (outcome.errors.len(), names, outcome.succeeded.len(), outcome.blocked)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn errors_are_neither_lost_nor_duplicated(
        delays in proptest::collection::vec(0u64..8, 1..WIDTH),
        failing in proptest::collection::hash_set(0..WIDTH, 0..WIDTH),
        with_tail in any::<bool>(),
    ) {
        init_tracing();

        let (error_count, error_names, succeeded, blocked) =
            run_trial(&delays, &failing, with_tail);

        let expected: HashSet<String> = failing.iter().map(|i| format!("leaf{i}")).collect();
        prop_assert_eq!(error_count, failing.len());
        prop_assert_eq!(error_names, expected);
        prop_assert_eq!(succeeded + error_count + blocked.len(), WIDTH + usize::from(with_tail));

        if with_tail {
            if failing.is_empty() {
                prop_assert!(blocked.is_empty());
            } else {
                prop_assert_eq!(blocked, vec!["tail".to_string()]);
            }
        }
    }
}
