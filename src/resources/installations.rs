use super::Collection;
use crate::gateway::Gateway;

/// Installation service: requests, proposals and accepted installations
#[derive(Debug, Clone)]
pub struct InstallationClient {
    gateway: Gateway,
}

impl InstallationClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn installations(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/installations/")
    }
}
