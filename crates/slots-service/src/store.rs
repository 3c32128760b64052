//! Machine storage

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use slots_core::{Machine, MachineId, SlotError, SlotResult};
use tokio::sync::Mutex;

/// A stored machine. Its own async lock serializes spin/stop on that
/// machine only.
pub type SharedMachine = Arc<Mutex<Machine>>;

pub trait MachineStore: Send + Sync {
    /// Fails with `InvalidState` if the id is taken
    fn add(&self, machine: Machine) -> SlotResult<SharedMachine>;

    fn get(&self, id: &MachineId) -> SlotResult<SharedMachine>;

    fn remove(&self, id: &MachineId) -> SlotResult<()>;

    fn ids(&self) -> Vec<MachineId>;
}

#[derive(Default)]
pub struct InMemoryMachineStore {
    machines: RwLock<HashMap<MachineId, SharedMachine>>,
}

impl InMemoryMachineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.machines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.read().is_empty()
    }
}

fn not_found(id: &MachineId) -> SlotError {
    SlotError::NotFound(format!("Machine {} does not exist", id))
}

impl MachineStore for InMemoryMachineStore {
    fn add(&self, machine: Machine) -> SlotResult<SharedMachine> {
        let mut machines = self.machines.write();
        let id = machine.id();
        if machines.contains_key(&id) {
            return Err(SlotError::InvalidState(format!("Machine {} already exists", id)));
        }

        let shared = Arc::new(Mutex::new(machine));
        machines.insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    fn get(&self, id: &MachineId) -> SlotResult<SharedMachine> {
        self.machines
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn remove(&self, id: &MachineId) -> SlotResult<()> {
        self.machines
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    fn ids(&self) -> Vec<MachineId> {
        self.machines.read().keys().copied().collect()
    }
}
