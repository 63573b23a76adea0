use super::Collection;
use crate::gateway::Gateway;

/// Product service: the solar-equipment catalog
#[derive(Debug, Clone)]
pub struct ProductClient {
    gateway: Gateway,
}

impl ProductClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn categories(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/categories/")
    }

    /// Brands
    pub fn marques(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/marques/")
    }

    pub fn equipements(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/equipements/")
    }
}
