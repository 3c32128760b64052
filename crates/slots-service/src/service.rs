//! Machine operations exposed to players

use std::sync::Arc;

use slots_core::{
    Machine, MachineId, MachineKind, Payline, PaylineStreakScoring, ScoringStrategy, SlotError,
    SlotResult, SpinResult,
};
use slots_supply::RandomSupplyCache;

use crate::store::{InMemoryMachineStore, MachineStore};

pub struct MachineService {
    store: Arc<dyn MachineStore>,
    supply: Arc<RandomSupplyCache>,
    scoring: Arc<dyn ScoringStrategy>,
    default_player: String,
}

impl MachineService {
    pub fn new(store: Arc<dyn MachineStore>, supply: Arc<RandomSupplyCache>) -> Self {
        Self {
            store,
            supply,
            scoring: Arc::new(PaylineStreakScoring),
            default_player: "guest".to_string(),
        }
    }

    /// In-memory store, default scoring
    pub fn in_memory(supply: Arc<RandomSupplyCache>) -> Self {
        Self::new(Arc::new(InMemoryMachineStore::new()), supply)
    }

    pub fn with_scoring(mut self, scoring: Arc<dyn ScoringStrategy>) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_default_player(mut self, player: impl Into<String>) -> Self {
        self.default_player = player.into();
        self
    }

    pub fn supply(&self) -> &Arc<RandomSupplyCache> {
        &self.supply
    }

    /// Create and store a stock machine. A blank player gets the default.
    pub fn create_machine(&self, kind: MachineKind, player: &str) -> SlotResult<MachineId> {
        let player = if player.trim().is_empty() {
            self.default_player.as_str()
        } else {
            player
        };
        self.add_machine(Machine::create(kind, player)?)
    }

    /// Store a custom machine
    ///
    /// Every number the supply can hand out has to resolve on the machine's
    /// layout, so the supply domain must lie inside the machine's. A stop
    /// draws every cell in one request, so the grid must fit the supply cap.
    pub fn add_machine(&self, machine: Machine) -> SlotResult<MachineId> {
        let (supply_low, supply_high) = self.supply.domain();
        let (machine_low, machine_high) = machine.domain();
        if supply_low < machine_low || supply_high > machine_high {
            return Err(SlotError::InvalidArgument(format!(
                "Supply draws {}..={} but machine '{}' only resolves {}..={}",
                supply_low,
                supply_high,
                machine.name(),
                machine_low,
                machine_high
            )));
        }

        let cells = machine.grid().cell_count();
        let cap = self.supply.config().max_per_request;
        if cells > cap {
            return Err(SlotError::InvalidArgument(format!(
                "Machine '{}' needs {} numbers per stop but the supply caps requests at {}",
                machine.name(),
                cells,
                cap
            )));
        }

        let id = machine.id();
        log::info!(
            "[Service] Created {} '{}' for {}",
            id,
            machine.name(),
            machine.player()
        );
        self.store.add(machine)?;
        Ok(id)
    }

    /// Start the reels; returns the machine as it is now
    pub async fn spin(&self, id: &MachineId) -> SlotResult<Machine> {
        let shared = self.store.get(id)?;
        let mut machine = shared.lock().await;
        machine.spin()?;
        Ok(machine.clone())
    }

    /// Stop the reels and score the spin
    pub async fn stop(&self, id: &MachineId) -> SlotResult<SpinResult> {
        let shared = self.store.get(id)?;
        let mut machine = shared.lock().await;
        let result = machine
            .stop_with(&*self.supply, &*self.scoring)
            .await;

        match &result {
            Ok(r) => log::debug!("[Service] {} scored {}", id, r.score),
            Err(e) if e.is_retryable() => log::warn!("[Service] {} spin void: {}", id, e),
            Err(e) => log::error!("[Service] {} stop failed: {}", id, e),
        }
        result
    }

    /// Remove the machine for good
    pub fn quit(&self, id: &MachineId) -> SlotResult<()> {
        self.store.remove(id)?;
        log::info!("[Service] {} quit", id);
        Ok(())
    }

    /// Snapshot of a machine
    pub async fn machine(&self, id: &MachineId) -> SlotResult<Machine> {
        let shared = self.store.get(id)?;
        let machine = shared.lock().await;
        Ok(machine.clone())
    }

    pub fn machines(&self) -> Vec<MachineId> {
        self.store.ids()
    }

    pub async fn activate_payline(&self, id: &MachineId, reference: u32) -> SlotResult<Payline> {
        let shared = self.store.get(id)?;
        let mut machine = shared.lock().await;
        machine.activate_payline(reference).cloned()
    }

    pub async fn deactivate_payline(&self, id: &MachineId, reference: u32) -> SlotResult<Payline> {
        let shared = self.store.get(id)?;
        let mut machine = shared.lock().await;
        machine.deactivate_payline(reference).cloned()
    }

    pub async fn set_bet(&self, id: &MachineId, reference: u32, bet: u32) -> SlotResult<Payline> {
        let shared = self.store.get(id)?;
        let mut machine = shared.lock().await;
        machine.set_bet(reference, bet).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slots_core::MachineStatus;
    use slots_supply::{LocalNumberSource, SupplyConfig};

    fn supply(low: i32, high: i32) -> Arc<RandomSupplyCache> {
        let config = SupplyConfig {
            domain_low: low,
            domain_high: high,
            max_per_request: 20,
            ..Default::default()
        };
        RandomSupplyCache::new(config, Arc::new(LocalNumberSource::new())).unwrap()
    }

    #[test]
    fn test_create_rejects_wider_supply_domain() {
        let service = MachineService::in_memory(supply(1, 1000));
        let err = service.create_machine(MachineKind::Classic, "p").unwrap_err();
        assert!(matches!(err, SlotError::InvalidArgument(_)));
        assert!(service.machines().is_empty());
    }

    #[test]
    fn test_create_accepts_narrower_supply_domain() {
        let service = MachineService::in_memory(supply(1, 50));
        assert!(service.create_machine(MachineKind::Classic, "p").is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_grid_over_request_cap() {
        let config = SupplyConfig {
            domain_low: 1,
            domain_high: 100,
            max_per_request: 10,
            ..Default::default()
        };
        let cache = RandomSupplyCache::new(config, Arc::new(LocalNumberSource::new())).unwrap();
        let service = MachineService::in_memory(cache);

        let err = service.create_machine(MachineKind::FiveByThree, "p").unwrap_err();
        assert!(matches!(err, SlotError::InvalidArgument(_)));
        assert!(matches!(
            service.create_machine(MachineKind::FiveByFour, "p"),
            Err(SlotError::InvalidArgument(_))
        ));
        assert!(service.machines().is_empty());

        // 9 cells fit under the cap and stop cleanly
        let id = service.create_machine(MachineKind::Classic, "p").unwrap();
        service.supply().replenish().await;
        service.spin(&id).await.unwrap();
        assert!(service.stop(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_player_gets_default() {
        let service = MachineService::in_memory(supply(1, 100)).with_default_player("house");
        let id = service.create_machine(MachineKind::Classic, "  ").unwrap();
        assert_eq!(service.machine(&id).await.unwrap().player(), "house");
    }

    #[tokio::test]
    async fn test_unknown_machine_is_not_found() {
        let service = MachineService::in_memory(supply(1, 100));
        let id = MachineId::new();
        assert!(matches!(service.spin(&id).await, Err(SlotError::NotFound(_))));
        assert!(matches!(service.stop(&id).await, Err(SlotError::NotFound(_))));
        assert!(matches!(service.quit(&id), Err(SlotError::NotFound(_))));
        assert!(matches!(service.machine(&id).await, Err(SlotError::NotFound(_))));
        assert!(matches!(
            service.activate_payline(&id, 1).await,
            Err(SlotError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_payline_toggles() {
        let service = MachineService::in_memory(supply(1, 100));
        let id = service.create_machine(MachineKind::FiveByThree, "p").unwrap();

        assert!(!service.deactivate_payline(&id, 1).await.unwrap().is_active());
        assert!(service.activate_payline(&id, 1).await.unwrap().is_active());
        assert_eq!(service.set_bet(&id, 1, 3).await.unwrap().bet(), 3);
        assert!(matches!(
            service.activate_payline(&id, 9).await,
            Err(SlotError::InvalidState(_))
        ));

        let machine = service.machine(&id).await.unwrap();
        assert_eq!(machine.grid().payline(1).unwrap().bet(), 3);
    }

    #[tokio::test]
    async fn test_spin_returns_spinning_snapshot() {
        let service = MachineService::in_memory(supply(1, 100));
        let id = service.create_machine(MachineKind::Classic, "p").unwrap();

        let machine = service.spin(&id).await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Spinning);
        assert!(matches!(service.spin(&id).await, Err(SlotError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_quit_removes() {
        let service = MachineService::in_memory(supply(1, 100));
        let id = service.create_machine(MachineKind::Classic, "p").unwrap();
        service.quit(&id).unwrap();
        assert!(matches!(service.machine(&id).await, Err(SlotError::NotFound(_))));
    }
}
