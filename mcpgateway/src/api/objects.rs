//! CRUD operations shared by every gateway collection

use std::marker::PhantomData;

use super::client::Client;
use super::common::{ApiQueryParams, GatewayApiObject, ListResponse};
use super::error::ApiError;

pub struct ObjectsApi<'a, T> {
    client: &'a Client,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: GatewayApiObject> ObjectsApi<'a, T> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// Lists every object, inactive ones included
    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        let path = format!(
            "{}{}",
            T::api_path(),
            ApiQueryParams::new()
                .add("include_inactive", true)
                .to_query_string()
        );
        let response: ListResponse<T> = self.client.get(&path).await?;
        Ok(response.into_items())
    }

    pub async fn get(&self, id: &str) -> Result<T, ApiError> {
        self.client
            .get(&T::resource_path(id))
            .await
            .map_err(|e| not_found_as::<T>(e, id))
    }

    pub async fn create(&self, request: &T::CreateRequest) -> Result<T, ApiError> {
        let created: T = self.client.post(T::api_path(), request).await?;
        tracing::info!(kind = T::KIND, id = created.object_id(), "created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, request: &T::UpdateRequest) -> Result<T, ApiError> {
        let updated = self
            .client
            .put(&T::resource_path(id), request)
            .await
            .map_err(|e| not_found_as::<T>(e, id))?;
        tracing::info!(kind = T::KIND, id, "updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&T::resource_path(id))
            .await
            .map_err(|e| not_found_as::<T>(e, id))?;
        tracing::info!(kind = T::KIND, id, "deleted");
        Ok(())
    }

    /// Activates or deactivates an object through its toggle endpoint
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), ApiError> {
        if !T::supports_toggle() {
            return Err(ApiError::InvalidConfig(format!(
                "{} objects cannot be enabled or disabled",
                T::KIND
            )));
        }
        let path = format!(
            "{}/toggle{}",
            T::resource_path(id),
            ApiQueryParams::new()
                .add("activate", enabled)
                .to_query_string()
        );
        self.client
            .post_empty(&path)
            .await
            .map_err(|e| not_found_as::<T>(e, id))?;
        tracing::info!(kind = T::KIND, id, enabled, "toggled");
        Ok(())
    }
}

fn not_found_as<T: GatewayApiObject>(err: ApiError, id: &str) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::NotFound(format!("{} {:?}", T::KIND, id)),
        other => other,
    }
}

impl Client {
    pub fn objects<T: GatewayApiObject>(&self) -> ObjectsApi<'_, T> {
        ObjectsApi::new(self)
    }
}
