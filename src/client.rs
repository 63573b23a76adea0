use crate::config::{AppConfig, ServiceName};
use crate::error::ClientError;
use crate::gateway::{Gateway, GatewayOptions};
use crate::resources::{InstallationClient, MaintenanceClient, ProductClient, UserClient};
use crate::session::{SessionController, SharedStore};

/// Everything the dashboard needs, wired once at startup.
///
/// One Gateway per backend service, all reading the same injected store.
#[derive(Debug, Clone)]
pub struct AdminClient {
    store: SharedStore,
    session: SessionController,
    users: UserClient,
    products: ProductClient,
    installations: InstallationClient,
    maintenance: MaintenanceClient,
}

impl AdminClient {
    pub fn new(config: &AppConfig, store: SharedStore) -> Result<Self, ClientError> {
        config.validate()?;
        let options = GatewayOptions::from(&config.http);

        let gateway = |service: ServiceName| {
            Gateway::new(
                service,
                config.services.base_for(service),
                store.clone(),
                options.clone(),
            )
        };

        let user_gateway = gateway(ServiceName::User)?;
        Ok(Self {
            session: SessionController::new(user_gateway.clone(), store.clone()),
            users: UserClient::new(user_gateway),
            products: ProductClient::new(gateway(ServiceName::Product)?),
            installations: InstallationClient::new(gateway(ServiceName::Installation)?),
            maintenance: MaintenanceClient::new(gateway(ServiceName::Maintenance)?),
            store,
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn users(&self) -> &UserClient {
        &self.users
    }

    pub fn products(&self) -> &ProductClient {
        &self.products
    }

    pub fn installations(&self) -> &InstallationClient {
        &self.installations
    }

    pub fn maintenance(&self) -> &MaintenanceClient {
        &self.maintenance
    }
}
