use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::ClientError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub services: ServiceEndpoints,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Backend services the dashboard talks to. Each one gets its own Gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    User,
    Product,
    Installation,
    Maintenance,
}

impl ServiceName {
    pub const ALL: [ServiceName; 4] = [
        ServiceName::User,
        ServiceName::Product,
        ServiceName::Installation,
        ServiceName::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::User => "user",
            ServiceName::Product => "product",
            ServiceName::Installation => "installation",
            ServiceName::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base address per backend service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub user: String,
    pub product: String,
    pub installation: String,
    pub maintenance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the durable key/value document. `None` means the
    /// per-user default (`$HOME/.config/dimfaso`).
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Clear the session and report `SessionExpired` when a credentialed call gets a 401
    pub expire_on_unauthorized: bool,
}

impl ServiceEndpoints {
    /// Derive every service address from a single API host
    pub fn under(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            user: format!("{}/user/api", host),
            product: format!("{}/product/api", host),
            installation: format!("{}/installation", host),
            maintenance: format!("{}/maintenance/api", host),
        }
    }

    pub fn base_for(&self, service: ServiceName) -> &str {
        match service {
            ServiceName::User => &self.user,
            ServiceName::Product => &self.product,
            ServiceName::Installation => &self.installation,
            ServiceName::Maintenance => &self.maintenance,
        }
    }

    fn base_for_mut(&mut self, service: ServiceName) -> &mut String {
        match service {
            ServiceName::User => &mut self.user,
            ServiceName::Product => &mut self.product,
            ServiceName::Installation => &mut self.installation,
            ServiceName::Maintenance => &mut self.maintenance,
        }
    }
}

const DEVELOPMENT_HOST: &str = "http://127.0.0.1:8000";
const PRODUCTION_HOST: &str = "https://api.dimfaso.com";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Same defaults as development, but every service lives under `host`
    pub fn for_host(host: &str) -> Self {
        Self {
            services: ServiceEndpoints::under(host),
            ..Self::development()
        }
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // A host override re-derives all four, per-service vars win over it
        if let Some(v) = lookup("DIMFASO_API_HOST") {
            self.services = ServiceEndpoints::under(&v);
        }
        for service in ServiceName::ALL {
            let key = format!("DIMFASO_{}_API", service.as_str().to_uppercase());
            if let Some(v) = lookup(&key) {
                *self.services.base_for_mut(service) = v;
            }
        }

        if let Some(v) = lookup("DIMFASO_CONFIG_DIR") {
            self.storage.dir = Some(PathBuf::from(v));
        }

        if let Some(v) = lookup("DIMFASO_EXPIRE_ON_UNAUTHORIZED") {
            self.http.expire_on_unauthorized = v.parse().unwrap_or(self.http.expire_on_unauthorized);
        }
        if let Some(v) = lookup("DIMFASO_HTTP_USER_AGENT") {
            self.http.user_agent = v;
        }

        self
    }

    /// Every base address must be an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ClientError> {
        for service in ServiceName::ALL {
            let raw = self.services.base_for(service);
            let parsed = url::Url::parse(raw).map_err(|e| {
                ClientError::Config(format!("invalid {} service address '{}': {}", service, raw, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ClientError::Config(format!(
                    "{} service address '{}' must use http or https",
                    service, raw
                )));
            }
        }
        Ok(())
    }

    fn default_user_agent() -> String {
        format!("dimfaso-admin/{}", env!("CARGO_PKG_VERSION"))
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            services: ServiceEndpoints::under(DEVELOPMENT_HOST),
            storage: StorageConfig { dir: None },
            http: HttpConfig {
                user_agent: Self::default_user_agent(),
                expire_on_unauthorized: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            services: ServiceEndpoints::under(PRODUCTION_HOST),
            storage: StorageConfig { dir: None },
            http: HttpConfig {
                user_agent: Self::default_user_agent(),
                expire_on_unauthorized: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            services: ServiceEndpoints::under(PRODUCTION_HOST),
            storage: StorageConfig { dir: None },
            http: HttpConfig {
                user_agent: Self::default_user_agent(),
                expire_on_unauthorized: true,
            },
        }
    }
}
