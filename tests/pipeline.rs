//! Pipeline integration tests against an in-memory ledger
//!
//! Covers the full read -> enrich -> filter flow without a node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use blacklist_core::{
    render_addresses, ArraySlots, Error, MethodDescriptor, OutputFormat, PortError, RetryPolicy,
    ScanConfig,
};
use blacklist_scanner::{Pipeline, ReadOnlyCallPort, StorageReadPort};

const FACTORY: Address = address!("d6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1");
const GAME_A: Address = address!("aa00000000000000000000000000000000000001");
const GAME_B: Address = address!("bb00000000000000000000000000000000000002");
const GAME_C: Address = address!("cc00000000000000000000000000000000000003");

fn word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

fn padded(addr: Address) -> B256 {
    let mut cell = [0u8; 32];
    cell[12..].copy_from_slice(addr.as_slice());
    B256::from(cell)
}

/// A factory with a game list plus one `l2BlockNumber` per game
#[derive(Default)]
struct MockLedger {
    cells: HashMap<U256, B256>,
    l2_blocks: HashMap<Address, U256>,
    failing_slots: HashMap<U256, PortError>,
    flaky_slots: HashMap<U256, AtomicUsize>,
    slow_slots: HashMap<U256, Duration>,
    storage_reads: AtomicUsize,
    calls: AtomicUsize,
}

impl MockLedger {
    fn new(base_slot: U256, games: &[(Address, u64)]) -> Self {
        let slots = ArraySlots::new(base_slot);
        let mut ledger = Self::default();
        ledger
            .cells
            .insert(base_slot, word(U256::from(games.len())));
        for (i, (game, l2_block)) in games.iter().enumerate() {
            ledger.cells.insert(slots.element(i as u64), padded(*game));
            ledger.l2_blocks.insert(*game, U256::from(*l2_block));
        }
        ledger
    }
}

#[async_trait]
impl StorageReadPort for MockLedger {
    async fn read_cell(&self, container: Address, slot: U256) -> Result<B256, PortError> {
        assert_eq!(container, FACTORY);
        self.storage_reads.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.slow_slots.get(&slot) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.failing_slots.get(&slot) {
            return Err(err.clone());
        }
        if let Some(remaining) = self.flaky_slots.get(&slot) {
            let left = remaining.load(Ordering::SeqCst);
            if left > 0 {
                remaining.store(left - 1, Ordering::SeqCst);
                return Err(PortError::Connection("connection reset by peer".into()));
            }
        }
        Ok(self.cells.get(&slot).copied().unwrap_or_default())
    }
}

#[async_trait]
impl ReadOnlyCallPort for MockLedger {
    async fn call(&self, target: Address, method: &MethodDescriptor) -> Result<Bytes, PortError> {
        assert_eq!(method.signature, "l2BlockNumber()");
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.l2_blocks.get(&target) {
            Some(value) => Ok(Bytes::from(value.to_be_bytes::<32>().to_vec())),
            None => Err(PortError::Remote("execution reverted".into())),
        }
    }
}

fn config() -> ScanConfig {
    ScanConfig::new("http://localhost:8545", FACTORY).with_base_slot(U256::from(104))
}

fn run_with(
    ledger: MockLedger,
    config: ScanConfig,
) -> (Arc<MockLedger>, Pipeline<MockLedger, MockLedger>) {
    let ledger = Arc::new(ledger);
    let pipeline = Pipeline::new(config, ledger.clone(), ledger.clone()).unwrap();
    (ledger, pipeline)
}

#[tokio::test]
async fn test_reader_output_in_array_order() {
    let ledger = MockLedger::new(U256::from(104), &[(GAME_A, 1), (GAME_B, 2), (GAME_C, 3)]);
    let (_, pipeline) = run_with(ledger, config());

    let outcome = pipeline.run().await.unwrap();
    assert_eq!(outcome.on_chain_length, 3);
    assert_eq!(outcome.scanned, vec![GAME_A, GAME_B, GAME_C]);
}

#[tokio::test]
async fn test_max_elements_limits_reads() {
    let ledger = MockLedger::new(U256::from(104), &[(GAME_A, 1), (GAME_B, 2), (GAME_C, 3)]);
    let (ledger, pipeline) = run_with(ledger, config().with_max_elements(Some(2)));

    let outcome = pipeline.run().await.unwrap();
    assert_eq!(outcome.scanned, vec![GAME_A, GAME_B]);
    // length + two elements
    assert_eq!(ledger.storage_reads.load(Ordering::SeqCst), 3);
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_threshold_filter_keeps_order() {
    let ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20), (GAME_C, 5)]);
    let (_, pipeline) = run_with(ledger, config().with_threshold(U256::from(10)));

    let outcome = pipeline.run().await.unwrap();
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.retained, vec![GAME_A, GAME_B]);
    assert_eq!(
        render_addresses(&outcome.retained, &OutputFormat::env("BLACKLISTED_GAMES")),
        format!(
            "BLACKLISTED_GAMES={},{}",
            GAME_A.to_checksum(None),
            GAME_B.to_checksum(None)
        )
    );
}

#[tokio::test]
async fn test_element_failure_stops_before_enrichment() {
    let mut ledger =
        MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20), (GAME_C, 5)]);
    let slots = ArraySlots::new(U256::from(104));
    ledger.failing_slots.insert(
        slots.element(1),
        PortError::Connection("connection refused".into()),
    );
    let (ledger, pipeline) = run_with(ledger, config());

    let err = pipeline.run().await.unwrap_err();
    match &err {
        Error::ElementRead { offset, .. } => assert_eq!(*offset, 1),
        other => panic!("expected element read error, got {other:?}"),
    }
    assert!(err.to_string().contains("offset 1"));
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_order_with_many_concurrent_reads() {
    let games: Vec<(Address, u64)> = (1..=40u8)
        .map(|b| (Address::repeat_byte(b), b as u64))
        .collect();
    let mut ledger = MockLedger::new(U256::from(7), &games);
    let slots = ArraySlots::new(U256::from(7));
    for i in 0..games.len() {
        // Even offsets are slow, so completion order interleaves
        if i % 2 == 0 {
            ledger
                .slow_slots
                .insert(slots.element(i as u64), Duration::from_millis(15));
        }
    }
    let (_, pipeline) = run_with(
        ledger,
        config()
            .with_base_slot(U256::from(7))
            .with_concurrency(16)
            .with_threshold(U256::from(21)),
    );

    let outcome = pipeline.run().await.unwrap();
    let expected: Vec<Address> = games.iter().map(|(a, _)| *a).collect();
    assert_eq!(outcome.scanned, expected);
    assert_eq!(outcome.retained, expected[20..].to_vec());
}

#[tokio::test]
async fn test_enrichment_failure_names_address() {
    let mut ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20)]);
    ledger.l2_blocks.remove(&GAME_B);
    let (_, pipeline) = run_with(ledger, config());

    match pipeline.run().await {
        Err(Error::Enrichment { address, source }) => {
            assert_eq!(address, GAME_B);
            assert!(!source.is_transient());
        }
        other => panic!("expected enrichment error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_read_recovers_with_retry() {
    let mut ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20)]);
    let slots = ArraySlots::new(U256::from(104));
    ledger
        .flaky_slots
        .insert(slots.element(0), AtomicUsize::new(2));
    let (_, pipeline) = run_with(
        ledger,
        config().with_retry(RetryPolicy::new(3, 1, false)),
    );

    let outcome = pipeline.run().await.unwrap();
    assert_eq!(outcome.scanned, vec![GAME_A, GAME_B]);
}

#[tokio::test]
async fn test_transient_read_fails_without_retry() {
    let mut ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20)]);
    let slots = ArraySlots::new(U256::from(104));
    ledger
        .flaky_slots
        .insert(slots.element(0), AtomicUsize::new(1));
    let (_, pipeline) = run_with(ledger, config());

    assert!(matches!(
        pipeline.run().await,
        Err(Error::ElementRead { offset: 0, .. })
    ));
}

#[tokio::test]
async fn test_call_timeout_reports_offset() {
    let mut ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10), (GAME_B, 20)]);
    let slots = ArraySlots::new(U256::from(104));
    ledger
        .slow_slots
        .insert(slots.element(1), Duration::from_secs(10));
    let (_, pipeline) = run_with(
        ledger,
        config().with_call_timeout(Duration::from_millis(30)),
    );

    match pipeline.run().await {
        Err(Error::ElementRead { offset, source, .. }) => {
            assert_eq!(offset, 1);
            assert_eq!(source, PortError::Timeout(Duration::from_millis(30)));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deadline_bounds_whole_scan() {
    let mut ledger = MockLedger::new(U256::from(104), &[(GAME_A, 10)]);
    ledger
        .slow_slots
        .insert(U256::from(104), Duration::from_secs(10));
    let (_, pipeline) = run_with(ledger, config().with_deadline(Duration::from_millis(30)));

    assert!(matches!(pipeline.run().await, Err(Error::Deadline(_))));
}

#[tokio::test]
async fn test_invalid_config_rejected_before_io() {
    let ledger = Arc::new(MockLedger::new(U256::from(104), &[(GAME_A, 10)]));
    let result = Pipeline::new(
        config().with_concurrency(0),
        ledger.clone(),
        ledger.clone(),
    );

    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_eq!(ledger.storage_reads.load(Ordering::SeqCst), 0);
}
