//! Property-based tests for the queue invariants.

use pawsync_engine::{
    backoff, snapshot, EvictionPolicy, OpKind, OpStatus, Operation, OperationDraft,
    OperationQueue, SyncConfig,
};
use proptest::prelude::*;
use serde_json::json;

fn arb_kind() -> impl Strategy<Value = OpKind> {
    prop_oneof![
        Just(OpKind::Create),
        Just(OpKind::Update),
        Just(OpKind::Delete),
    ]
}

fn arb_status() -> impl Strategy<Value = OpStatus> {
    prop_oneof![
        Just(OpStatus::Pending),
        Just(OpStatus::Processing),
        Just(OpStatus::Completed),
        Just(OpStatus::Failed),
    ]
}

fn arb_entity() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("pet".to_string()),
        Just("message".to_string()),
        Just("user".to_string()),
        Just("like".to_string()),
    ]
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    (
        arb_kind(),
        arb_entity(),
        any::<u64>(),
        0u32..10,
        proptest::option::of(any::<u64>()),
        arb_status(),
        proptest::option::of("[a-zA-Z0-9 :]{0,24}"),
        "[a-z ]{0,16}",
    )
        .prop_map(
            |(kind, entity, created_at, retry_count, last_retry_at, status, last_error, text)| {
                let draft = OperationDraft::new(kind, entity, json!({ "text": text })).unwrap();
                let mut op = Operation::from_draft(draft, "placeholder", created_at);
                op.retry_count = retry_count;
                op.last_retry_at = last_retry_at;
                op.status = status;
                op.last_error = last_error;
                op
            },
        )
}

fn arb_queue() -> impl Strategy<Value = Vec<Operation>> {
    proptest::collection::vec(arb_operation(), 0..40).prop_map(|ops| {
        ops.into_iter()
            .enumerate()
            .map(|(i, mut op)| {
                op.id = format!("op_{}", i);
                op
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_queue_never_exceeds_bound(
        max_queue_size in 1usize..20,
        status_aware in any::<bool>(),
        steps in proptest::collection::vec((0u64..5, any::<bool>()), 1..80),
    ) {
        let config = SyncConfig {
            max_queue_size,
            eviction: if status_aware { EvictionPolicy::StatusAware } else { EvictionPolicy::Oldest },
            ..SyncConfig::default()
        };
        let mut queue = OperationQueue::new(config);
        let mut now = 1_000u64;

        for (i, (advance, complete_head)) in steps.into_iter().enumerate() {
            now += advance;
            let draft = OperationDraft::new(OpKind::Create, "pet", json!({})).unwrap();
            queue.enqueue(draft, format!("op_{}", i), now).unwrap();
            prop_assert!(queue.len() <= max_queue_size);

            if complete_head {
                if let Some(id) = queue.select_batch(now).into_iter().next() {
                    queue.mark_processing(&id).unwrap();
                    queue.mark_completed(&id).unwrap();
                }
            }
        }
    }

    #[test]
    fn prop_enqueue_keeps_most_recent(extra in 1usize..30, max_queue_size in 1usize..30) {
        let config = SyncConfig { max_queue_size, ..SyncConfig::default() };
        let mut queue = OperationQueue::new(config);
        let total = max_queue_size + extra;

        for i in 0..total {
            let draft = OperationDraft::new(OpKind::Create, "pet", json!({})).unwrap();
            queue.enqueue(draft, format!("op_{}", i), 1_000).unwrap();
        }

        let expected: Vec<String> = (extra..total).map(|i| format!("op_{}", i)).collect();
        let actual: Vec<String> = queue.operations().iter().map(|op| op.id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_snapshot_roundtrip(ops in arb_queue()) {
        let blob = snapshot::encode(&ops).unwrap();
        let decoded = snapshot::decode(&blob).unwrap();
        prop_assert_eq!(decoded, ops);
    }

    #[test]
    fn prop_backoff_strictly_increasing(base in 1u64..1_000_000, max_retries in 1u32..32) {
        for r in 0..max_retries {
            prop_assert!(backoff::delay_ms(base, r + 1) > backoff::delay_ms(base, r));
        }
    }

    #[test]
    fn prop_selection_is_ordered_and_excludes_terminal(ops in arb_queue(), now in any::<u64>()) {
        let config = SyncConfig::default();
        let queue = OperationQueue::from_operations(ops, config.clone());
        let batch = queue.select_batch(now);

        prop_assert!(batch.len() <= config.batch_size);

        let mut previous = 0u64;
        for id in &batch {
            let op = queue.get(id).unwrap();
            prop_assert!(op.created_at >= previous);
            previous = op.created_at;
            prop_assert!(op.status == OpStatus::Pending || op.status == OpStatus::Failed);
            prop_assert!(!op.is_exhausted(config.max_retries));
        }
    }

    #[test]
    fn prop_completed_never_selected(ops in arb_queue(), now in any::<u64>()) {
        let queue = OperationQueue::from_operations(ops, SyncConfig::default());
        for id in queue.select_batch(now) {
            prop_assert_ne!(queue.get(&id).unwrap().status, OpStatus::Completed);
        }
    }
}
