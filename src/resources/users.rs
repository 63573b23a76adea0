use serde_json::Value;

use super::Collection;
use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway};

/// User service: accounts, role profiles, the connected user and settings
#[derive(Debug, Clone)]
pub struct UserClient {
    gateway: Gateway,
}

impl UserClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn users(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/users/")
    }

    pub fn client_profiles(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/profil-clients/")
    }

    pub fn technicien_profiles(&self) -> Collection {
        Collection::new(self.gateway.clone(), "/profil-techniciens/")
    }

    async fn fetch(&self, request: ApiRequest) -> Result<Value, ClientError> {
        Ok(self.gateway.send(request).await?.body)
    }

    /// The connected user
    pub async fn me(&self) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::get("/users/me/")).await
    }

    pub async fn update_me(&self, payload: Value) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::patch("/users/me/").json(payload)).await
    }

    pub async fn change_my_password(&self, payload: Value) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::post("/users/me/change_password/").json(payload))
            .await
    }

    /// Admin password reset for another account
    pub async fn change_user_password(&self, user_id: &str, payload: Value) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::put(format!("/users/{}/change_password/", user_id)).json(payload))
            .await
    }

    pub async fn create_client_profile(&self, user_id: &str, payload: Value) -> Result<Value, ClientError> {
        self.client_profiles().create(with_user(user_id, payload)?).await
    }

    pub async fn create_technicien_profile(&self, user_id: &str, payload: Value) -> Result<Value, ClientError> {
        self.technicien_profiles().create(with_user(user_id, payload)?).await
    }

    pub async fn client_profile_of(&self, user_id: &str) -> Result<Option<Value>, ClientError> {
        self.client_profiles().find_by_user(user_id).await
    }

    pub async fn technicien_profile_of(&self, user_id: &str) -> Result<Option<Value>, ClientError> {
        self.technicien_profiles().find_by_user(user_id).await
    }

    pub async fn profile(&self) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::get("/profile/")).await
    }

    pub async fn update_profile(&self, payload: Value) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::put("/profile/").json(payload)).await
    }

    pub async fn settings(&self) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::get("/settings/")).await
    }

    pub async fn update_settings(&self, payload: Value) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::put("/settings/").json(payload)).await
    }

    pub async fn roles(&self) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::get("/roles/")).await
    }

    pub async fn permissions(&self) -> Result<Value, ClientError> {
        self.fetch(ApiRequest::get("/permissions/")).await
    }
}

/// Link a profile payload to its user; the caller's own `user` key is overridden
fn with_user(user_id: &str, payload: Value) -> Result<Value, ClientError> {
    let Value::Object(mut map) = payload else {
        return Err(ClientError::InvalidPayload(
            "profile payload must be a JSON object".to_string(),
        ));
    };
    let user = user_id
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(user_id.to_string()));
    map.insert("user".to_string(), user);
    Ok(Value::Object(map))
}
