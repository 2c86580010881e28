// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Live offer set and task-to-offer matching.

use thiserror::Error;
use tether_protocol::mesos::{Offer, OfferId, resource::DiskInfo};
use tracing::debug;

use crate::types::Task;

/// Scalar resource names the matcher understands.
pub const CPUS: &str = "cpus";
pub const MEM: &str = "mem";
pub const DISK: &str = "disk";

/// Errors from offer matching
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("no suitable offer")]
    NoSuitableOffer,
}

/// An offer normalized for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferResource {
    pub offer: Offer,
    /// Sum of `cpus` scalars still available
    pub cpu: f64,
    /// Sum of `mem` scalars still available
    pub mem: f64,
    pub disk: Option<DiskInfo>,
}

impl OfferResource {
    pub fn new(offer: Offer) -> Self {
        let scalar_sum = |name: &str| -> f64 {
            offer
                .resources
                .iter()
                .filter(|r| r.name == name)
                .map(|r| r.scalar_value())
                .sum()
        };
        let cpu = scalar_sum(CPUS);
        let mem = scalar_sum(MEM);
        let disk = offer
            .resources
            .iter()
            .filter(|r| r.name == DISK)
            .find_map(|r| r.disk.clone());

        Self {
            offer,
            cpu,
            mem,
            disk,
        }
    }

    pub fn offer_id(&self) -> Option<&OfferId> {
        self.offer.id.as_ref()
    }

    /// True if the task's summed cpu/mem demands are strictly below what
    /// this offer has left. A task that demands neither never fits.
    fn fits(&self, task: &Task) -> bool {
        let demands = |name: &str| task.resources.iter().any(|r| r.name == name);
        let (wants_cpu, wants_mem) = (demands(CPUS), demands(MEM));
        if !wants_cpu && !wants_mem {
            return false;
        }
        (!wants_cpu || self.cpu > task.demand(CPUS))
            && (!wants_mem || self.mem > task.demand(MEM))
    }
}

/// The offers currently held by the framework.
///
/// Owned by the event controller; not synchronized.
#[derive(Debug, Default)]
pub struct ResourceManager {
    offers: Vec<OfferResource>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live set with a new batch of offers.
    pub fn add_offers(&mut self, offers: Vec<Offer>) {
        self.offers.clear();
        self.offers.extend(offers.into_iter().map(OfferResource::new));
        debug!(offers = self.offers.len(), "Offer set replaced");
    }

    pub fn has_resources(&self) -> bool {
        !self.offers.is_empty()
    }

    /// Claim the first offer (in arrival order) that fits the task.
    ///
    /// The claimed offer is debited by the task's cpu/mem demands and removed
    /// from the live set, so no offer is handed out twice.
    pub fn assign(&mut self, task: &Task) -> Result<OfferResource, ResourceError> {
        let position = self
            .offers
            .iter()
            .position(|candidate| candidate.fits(task))
            .ok_or(ResourceError::NoSuitableOffer)?;

        let mut claimed = self.offers.remove(position);
        claimed.cpu -= task.demand(CPUS);
        claimed.mem -= task.demand(MEM);
        if let Some(disk) = task
            .resources
            .iter()
            .filter(|r| r.name == DISK)
            .find_map(|r| r.disk.clone())
        {
            claimed.disk = Some(disk);
        }

        debug!(
            task_id = %task.id,
            offer_id = ?claimed.offer_id().map(|id| id.value.as_str()),
            cpu_left = claimed.cpu,
            mem_left = claimed.mem,
            "Offer assigned"
        );
        Ok(claimed)
    }

    /// Drop a rescinded offer. Returns `false` if it was not held.
    pub fn remove_offer(&mut self, id: &OfferId) -> bool {
        let before = self.offers.len();
        self.offers.retain(|o| o.offer_id() != Some(id));
        self.offers.len() != before
    }

    pub fn offers(&self) -> &[OfferResource] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn clear(&mut self) {
        self.offers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_protocol::mesos::{AgentId, Resource, Volume, resource::disk_info::Persistence};

    fn offer(id: &str, agent: &str, cpu: f64, mem: f64) -> Offer {
        Offer {
            id: Some(OfferId::new(id)),
            agent_id: Some(AgentId::new(agent)),
            hostname: format!("{}.local", agent),
            resources: vec![
                Resource::new_scalar(CPUS, cpu),
                Resource::new_scalar(MEM, mem),
            ],
            ..Default::default()
        }
    }

    fn task(cpu: f64, mem: f64) -> Task {
        Task::new("t1", "web")
            .with_resource(Resource::new_scalar(CPUS, cpu))
            .with_resource(Resource::new_scalar(MEM, mem))
    }

    #[test]
    fn test_offer_resource_sums_scalars() {
        let mut o = offer("o1", "a1", 1.0, 256.0);
        o.resources.push(Resource::new_scalar(CPUS, 0.5));
        let normalized = OfferResource::new(o);
        assert_eq!(normalized.cpu, 1.5);
        assert_eq!(normalized.mem, 256.0);
        assert!(normalized.disk.is_none());
    }

    #[test]
    fn test_assign_claims_and_debits_offer() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 2.0, 1024.0)]);

        let claimed = rm.assign(&task(1.0, 512.0)).unwrap();

        assert_eq!(claimed.offer_id().unwrap().value, "o1");
        assert_eq!(claimed.offer.agent_id.as_ref().unwrap().value, "A1");
        assert_eq!(claimed.cpu, 1.0);
        assert_eq!(claimed.mem, 512.0);
        assert!(!rm.has_resources());
    }

    #[test]
    fn test_assign_without_fit() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 0.5, 256.0)]);

        assert_eq!(
            rm.assign(&task(1.0, 128.0)).unwrap_err(),
            ResourceError::NoSuitableOffer
        );
        assert_eq!(rm.len(), 1);
    }

    #[test]
    fn test_equal_resources_do_not_fit() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 1.0, 512.0)]);

        assert!(rm.assign(&task(1.0, 128.0)).is_err());
        assert!(rm.assign(&task(0.5, 512.0)).is_err());
        assert!(rm.assign(&task(0.99, 511.0)).is_ok());
    }

    #[test]
    fn test_assign_prefers_earliest_offer() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![
            offer("small", "A1", 0.5, 128.0),
            offer("first", "A2", 4.0, 4096.0),
            offer("second", "A3", 4.0, 4096.0),
        ]);

        let claimed = rm.assign(&task(1.0, 256.0)).unwrap();
        assert_eq!(claimed.offer_id().unwrap().value, "first");

        let remaining: Vec<_> = rm
            .offers()
            .iter()
            .map(|o| o.offer_id().unwrap().value.clone())
            .collect();
        assert_eq!(remaining, vec!["small", "second"]);
    }

    #[test]
    fn test_offer_never_assigned_twice() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 8.0, 8192.0)]);

        assert!(rm.assign(&task(1.0, 128.0)).is_ok());
        assert!(rm.assign(&task(1.0, 128.0)).is_err());
    }

    #[test]
    fn test_add_offers_replaces_live_set() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 1.0, 1.0), offer("o2", "A1", 1.0, 1.0)]);
        rm.add_offers(vec![offer("o3", "A2", 1.0, 1.0)]);

        assert_eq!(rm.len(), 1);
        assert_eq!(rm.offers()[0].offer_id().unwrap().value, "o3");
    }

    #[test]
    fn test_remove_offer() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 1.0, 1.0), offer("o2", "A1", 1.0, 1.0)]);

        assert!(rm.remove_offer(&OfferId::new("o1")));
        assert!(!rm.remove_offer(&OfferId::new("o1")));
        assert_eq!(rm.len(), 1);

        rm.clear();
        assert!(rm.is_empty());
    }

    #[test]
    fn test_task_disk_info_passes_through() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 2.0, 1024.0)]);

        let disk_info = DiskInfo {
            persistence: Some(Persistence {
                id: "vol-1".to_string(),
                principal: None,
            }),
            volume: Some(Volume {
                container_path: "data".to_string(),
                host_path: None,
                mode: tether_protocol::mesos::volume::Mode::Rw as i32,
            }),
        };
        let mut disk = Resource::new_scalar(DISK, 100.0);
        disk.disk = Some(disk_info.clone());

        let claimed = rm.assign(&task(1.0, 128.0).with_resource(disk)).unwrap();
        assert_eq!(claimed.disk, Some(disk_info));
    }

    #[test]
    fn test_split_demand_is_summed() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 0.8, 1024.0)]);

        let split = Task::new("t1", "echo")
            .with_resource(Resource::new_scalar(CPUS, 0.5))
            .with_resource(Resource::new_scalar(CPUS, 0.5))
            .with_resource(Resource::new_scalar(MEM, 128.0));
        assert_eq!(rm.assign(&split).unwrap_err(), ResourceError::NoSuitableOffer);
        assert_eq!(rm.len(), 1);

        rm.add_offers(vec![offer("o2", "A1", 1.5, 1024.0)]);
        let claimed = rm.assign(&split).unwrap();
        assert!((claimed.cpu - 0.5).abs() < 1e-9);
        assert_eq!(claimed.mem, 896.0);
    }

    #[test]
    fn test_task_without_cpu_or_mem_never_fits() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 2.0, 1024.0)]);

        assert_eq!(
            rm.assign(&Task::new("t1", "echo")).unwrap_err(),
            ResourceError::NoSuitableOffer
        );
        assert!(rm.has_resources());
    }

    #[test]
    fn test_single_dimension_demand_fits() {
        let mut rm = ResourceManager::new();
        rm.add_offers(vec![offer("o1", "A1", 2.0, 1024.0)]);

        let cpu_only =
            Task::new("t1", "echo").with_resource(Resource::new_scalar(CPUS, 1.0));
        let claimed = rm.assign(&cpu_only).unwrap();
        assert_eq!(claimed.cpu, 1.0);
        assert_eq!(claimed.mem, 1024.0);
    }
}
