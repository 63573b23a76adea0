use super::Collection;
use crate::gateway::Gateway;

#[derive(Debug, Clone)]
pub struct MaintenanceClient {
    gateway: Gateway,
}

impl MaintenanceClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn incidents(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/incidents/")
    }

    pub fn interventions(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/interventions/")
    }

    pub fn questions(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/questions-maintenance/")
    }
}
