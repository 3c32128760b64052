//! End-to-end spin tests
//!
//! Full path from configuration to scored result:
//! - stock machine lifecycle over a primed local supply
//! - deterministic scoring from a scripted source
//! - supply starvation and quota exhaustion as seen by a player
//! - independent machines spinning concurrently

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use slots_core::{Machine, MachineKind, MachineStatus, SlotError, Symbol};
use slots_service::{SlotsConfig, SlotsRuntime};
use slots_supply::{NumberBlock, NumberSource, Quota, ReplenishOutcome, SourceError, SupplyConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replays scripted blocks, then reports a rate limit
struct ScriptedSource {
    blocks: Mutex<VecDeque<Vec<i32>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(blocks: Vec<Vec<i32>>) -> Arc<Self> {
        Arc::new(Self {
            blocks: Mutex::new(blocks.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NumberSource for ScriptedSource {
    async fn fetch_block(
        &self,
        _amount: usize,
        _min: i32,
        _max: i32,
    ) -> Result<NumberBlock, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.blocks.lock().pop_front();
        match next {
            Some(numbers) => Ok(NumberBlock {
                id: "scripted".into(),
                numbers,
                bits_used: 100,
                bits_left: 10_000,
                requests_left: 7,
            }),
            None => Err(SourceError::RateLimited("402: daily request allowance exceeded".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Machine-ready supply with replenishing driven only by the test
fn manual_supply() -> SupplyConfig {
    SupplyConfig {
        low_water_mark: 0,
        ..SlotsConfig::machine_supply()
    }
}

fn config_with(supply: SupplyConfig) -> SlotsConfig {
    SlotsConfig {
        supply,
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STOCK MACHINE LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_classic_spin_cycle() {
    init_logging();
    let mut config = SlotsConfig::default();
    config.supply.replenish_on_start = true;
    let runtime = SlotsRuntime::from_config(config).await.unwrap();
    let service = runtime.service();

    let id = service.create_machine(MachineKind::Classic, "alice").unwrap();
    let machine = service.machine(&id).await.unwrap();
    assert_eq!(machine.status(), MachineStatus::Initialized);
    assert_eq!(machine.domain(), (1, 100));
    assert!(machine.grid().layout().unwrap().is_valid());
    assert_eq!(machine.grid().layout().unwrap().configs().len(), 10);

    assert_eq!(service.spin(&id).await.unwrap().status(), MachineStatus::Spinning);
    assert!(matches!(service.spin(&id).await, Err(SlotError::InvalidState(_))));

    let before = runtime.supply().len();
    let result = service.stop(&id).await.unwrap();
    assert_eq!(result.machine.status(), MachineStatus::Idle);
    assert!(result.machine.grid().is_resolved());
    assert_eq!(result.machine.grid().cell_count(), 9);
    assert!(result.score >= 0);
    assert_eq!(runtime.supply().len(), before - 9);

    assert!(matches!(service.stop(&id).await, Err(SlotError::InvalidState(_))));
    assert_eq!(service.machine(&id).await.unwrap().status(), MachineStatus::Idle);

    service.quit(&id).unwrap();
    assert!(matches!(service.spin(&id).await, Err(SlotError::NotFound(_))));
    assert!(matches!(service.quit(&id), Err(SlotError::NotFound(_))));
}

#[tokio::test]
async fn test_every_stock_machine_stops() {
    init_logging();
    let mut config = SlotsConfig::default();
    config.supply.replenish_on_start = true;
    let runtime = SlotsRuntime::from_config(config).await.unwrap();
    let service = runtime.service();

    for kind in MachineKind::ALL {
        let id = service.create_machine(kind, "bob").unwrap();
        service.spin(&id).await.unwrap();
        let result = service.stop(&id).await.unwrap();
        assert_eq!(result.machine.grid().cell_count(), kind.cell_count());
        assert!(result.machine.grid().is_resolved());
    }
    assert_eq!(service.machines().len(), 3);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DETERMINISTIC SCORING
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_scripted_draw_scores_middle_row() {
    init_logging();
    let source = ScriptedSource::new(vec![
        vec![80, 80, 80, 75, 75, 75, 1, 2, 3],
        vec![1, 1, 1, 26, 40, 51, 1, 1, 1],
    ]);
    let runtime = SlotsRuntime::with_source(config_with(manual_supply()), source)
        .await
        .unwrap();
    let supply = runtime.supply();
    let service = runtime.service();
    assert_eq!(supply.replenish().await, ReplenishOutcome::Appended(9));
    assert_eq!(supply.replenish().await, ReplenishOutcome::Appended(9));

    let id = service.create_machine(MachineKind::Classic, "carol").unwrap();

    service.spin(&id).await.unwrap();
    let win = service.stop(&id).await.unwrap();
    assert_eq!(win.score, 260);
    assert_eq!(win.line_wins.len(), 1);
    assert_eq!(win.line_wins[0].symbol, Symbol::ThreeBells);
    assert_eq!(win.machine.grid().cell(0, 0).unwrap().symbol, Symbol::Empty);
    assert_eq!(win.machine.grid().cell(2, 2).unwrap().symbol, Symbol::Seven);

    // CHERRY, TWO_CHERRIES, BELL: no streak
    service.spin(&id).await.unwrap();
    let loss = service.stop(&id).await.unwrap();
    assert_eq!(loss.score, 0);
    assert!(loss.line_wins.is_empty());
    assert_eq!(loss.machine.score(), 260);
}

#[tokio::test]
async fn test_bet_scales_and_inactive_line_pays_nothing() {
    init_logging();
    let source = ScriptedSource::new(vec![[1; 9].repeat(2)]);
    let runtime = SlotsRuntime::with_source(config_with(manual_supply()), source)
        .await
        .unwrap();
    runtime.supply().replenish().await;
    let service = runtime.service();

    let id = service.create_machine(MachineKind::Classic, "dave").unwrap();
    service.set_bet(&id, 1, 5).await.unwrap();
    service.spin(&id).await.unwrap();
    assert_eq!(service.stop(&id).await.unwrap().score, 500);

    service.deactivate_payline(&id, 1).await.unwrap();
    service.spin(&id).await.unwrap();
    assert_eq!(service.stop(&id).await.unwrap().score, 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUPPLY FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_starved_supply_voids_spin() {
    init_logging();
    let source = ScriptedSource::new(Vec::new());
    let runtime = SlotsRuntime::with_source(config_with(manual_supply()), source)
        .await
        .unwrap();
    let service = runtime.service();
    let id = service.create_machine(MachineKind::Classic, "erin").unwrap();

    service.spin(&id).await.unwrap();
    let err = service.stop(&id).await.unwrap_err();
    assert!(matches!(err, SlotError::Unavailable(_)));

    let machine = service.machine(&id).await.unwrap();
    assert_eq!(machine.status(), MachineStatus::Idle);
    assert_eq!(machine.score(), 0);
    assert!(!machine.grid().is_resolved());
}

#[tokio::test]
async fn test_quota_exhaustion_degrades_then_recovers() {
    init_logging();
    let source = ScriptedSource::new(vec![(1..=18).collect()]);
    let runtime = SlotsRuntime::with_source(config_with(manual_supply()), source.clone())
        .await
        .unwrap();
    let supply = runtime.supply();
    let service = runtime.service();

    assert_eq!(supply.replenish().await, ReplenishOutcome::Appended(18));
    assert_eq!(supply.quota().requests_left, Some(7));

    // the source refuses the next block
    assert!(matches!(
        supply.replenish().await,
        ReplenishOutcome::Failed(SourceError::RateLimited(_))
    ));
    assert_eq!(
        supply.quota(),
        Quota {
            bits_left: Some(0),
            requests_left: Some(0),
        }
    );
    assert_eq!(supply.replenish().await, ReplenishOutcome::QuotaExhausted);
    assert_eq!(source.calls(), 2);

    // existing stock still plays out: two classic spins
    let id = service.create_machine(MachineKind::Classic, "frank").unwrap();
    for _ in 0..2 {
        service.spin(&id).await.unwrap();
        service.stop(&id).await.unwrap();
    }
    assert!(supply.is_empty());

    service.spin(&id).await.unwrap();
    assert!(matches!(service.stop(&id).await, Err(SlotError::Unavailable(_))));
    assert_eq!(source.calls(), 2);

    // external reset lets the cache ask again
    supply.reset_quota(5_000, 1);
    assert!(matches!(supply.replenish().await, ReplenishOutcome::Failed(_)));
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_grid_over_request_cap_is_rejected() {
    init_logging();
    let supply = SupplyConfig {
        max_per_request: 10,
        ..manual_supply()
    };
    let source = ScriptedSource::new(vec![(1..=100).collect()]);
    let runtime = SlotsRuntime::with_source(config_with(supply), source).await.unwrap();
    runtime.supply().replenish().await;
    let service = runtime.service();

    // 15 cells, 10 allowed per request
    assert!(matches!(
        service.create_machine(MachineKind::FiveByThree, "gina"),
        Err(SlotError::InvalidArgument(_))
    ));
    assert!(service.machines().is_empty());

    // a classic machine fits under the cap
    let id = service.create_machine(MachineKind::Classic, "gina").unwrap();
    for _ in 0..3 {
        service.spin(&id).await.unwrap();
        service.stop(&id).await.unwrap();
        assert_eq!(service.machine(&id).await.unwrap().status(), MachineStatus::Idle);
    }
    assert_eq!(runtime.supply().len(), 100 - 27);
}

#[tokio::test]
async fn test_supply_domain_must_fit_machine() {
    init_logging();
    let runtime = SlotsRuntime::from_config(config_with(SupplyConfig::default()))
        .await
        .unwrap();
    assert!(matches!(
        runtime.service().create_machine(MachineKind::Classic, "hank"),
        Err(SlotError::InvalidArgument(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONCURRENCY
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_machines_spin_independently() {
    init_logging();
    let mut supply = manual_supply();
    supply.replenish_on_start = true;
    let runtime = Arc::new(SlotsRuntime::from_config(config_with(supply)).await.unwrap());
    assert_eq!(runtime.supply().len(), 2000);

    let ids: Vec<_> = (0..8)
        .map(|i| {
            runtime
                .service()
                .create_machine(MachineKind::Classic, &format!("player-{}", i))
                .unwrap()
        })
        .collect();

    let mut tasks = Vec::new();
    for id in ids.clone() {
        let runtime = Arc::clone(&runtime);
        tasks.push(tokio::spawn(async move {
            for _ in 0..5 {
                runtime.service().spin(&id).await?;
                runtime.service().stop(&id).await?;
            }
            Ok::<_, SlotError>(())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(runtime.supply().len(), 2000 - 8 * 5 * 9);
    for id in ids {
        let machine = runtime.service().machine(&id).await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Idle);
        assert!(machine.grid().is_resolved());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_spun_machine_round_trips_through_json() {
    init_logging();
    let source = ScriptedSource::new(vec![(1..=20).collect()]);
    let runtime = SlotsRuntime::with_source(config_with(manual_supply()), source)
        .await
        .unwrap();
    runtime.supply().replenish().await;
    let service = runtime.service();

    let id = service.create_machine(MachineKind::FiveByFour, "ivy").unwrap();
    service.spin(&id).await.unwrap();
    let result = service.stop(&id).await.unwrap();

    let json = serde_json::to_string(&result.machine).unwrap();
    let back: Machine = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result.machine);
    assert_eq!(back.id(), id);
    assert_eq!(back.player(), "ivy");
    assert_eq!(back.grid().cell(3, 4).unwrap().value, 20);
    assert_eq!(back.grid().cell(3, 4).unwrap().symbol, Symbol::TwoSevens);
}
