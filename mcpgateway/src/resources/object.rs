//! Generic resource driven by an `ObjectMapping`
//!
//! Every gateway collection follows the same lifecycle: POST to create,
//! GET to refresh, PUT to update, DELETE to remove, and a toggle endpoint
//! for the active flag. Only the schema and the field copying differ.

use async_trait::async_trait;
use std::marker::PhantomData;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::Schema;
use tfplug::{
    import_state_passthrough_id, Diagnostic, DynamicValue, Resource, ResourceWithConfigure,
};

use super::attrs::{self, api_error_diagnostics, StateWriter};
use crate::api::{ApiError, Client, GatewayApiObject};
use crate::provider_data::McpGatewayProviderData;

type CreateRequestOf<M> = <<M as ObjectMapping>::Object as GatewayApiObject>::CreateRequest;
type UpdateRequestOf<M> = <<M as ObjectMapping>::Object as GatewayApiObject>::UpdateRequest;

/// Binds one gateway object kind to its Terraform schema
pub trait ObjectMapping: Send + Sync + 'static {
    type Object: GatewayApiObject;

    /// Terraform type name, shared by the resource and its data source
    const TYPE_NAME: &'static str;

    fn schema() -> Schema;

    /// Builds the POST body from the planned state
    fn create_request(plan: &DynamicValue) -> Result<CreateRequestOf<Self>, Diagnostic>;

    /// Builds the PUT body from the planned state
    fn update_request(plan: &DynamicValue) -> Result<UpdateRequestOf<Self>, Diagnostic>;

    /// Copies the fields the gateway owns into state
    ///
    /// Sensitive and config-only attributes must not be written here.
    fn write_state(object: &Self::Object, state: &mut StateWriter<'_>);

    /// Active flag as reported by the gateway
    fn enabled(object: &Self::Object) -> Option<bool>;

    /// Cross-attribute checks that schema validators cannot express
    fn validate(_config: &DynamicValue) -> Vec<Diagnostic> {
        vec![]
    }
}

pub struct ObjectResource<M> {
    provider_data: Option<McpGatewayProviderData>,
    _mapping: PhantomData<fn() -> M>,
}

impl<M: ObjectMapping> ObjectResource<M> {
    pub fn new() -> Self {
        Self {
            provider_data: None,
            _mapping: PhantomData,
        }
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| data.client.as_ref())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                )
            })
    }

    fn kind() -> &'static str {
        <M::Object as GatewayApiObject>::KIND
    }

    /// Flips the active flag when the plan asks for something else
    async fn sync_enabled(
        client: &Client,
        id: &str,
        desired: Option<bool>,
        current: Option<bool>,
    ) -> Result<(), ApiError> {
        match desired {
            Some(want)
                if <M::Object as GatewayApiObject>::supports_toggle()
                    && current != Some(want) =>
            {
                client.objects::<M::Object>().set_enabled(id, want).await
            }
            _ => Ok(()),
        }
    }

    /// Re-reads the object, falling back to what the write call returned
    async fn refresh(
        client: &Client,
        object: M::Object,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> M::Object {
        match client.objects::<M::Object>().get(object.object_id()).await {
            Ok(fresh) => fresh,
            Err(e) => {
                diagnostics.push(Diagnostic::warning(
                    format!("Failed to refresh {}", Self::kind()),
                    format!("State was taken from the write response instead: {}", e),
                ));
                object
            }
        }
    }

    fn write(object: &M::Object, state: &mut DynamicValue, diagnostics: &mut Vec<Diagnostic>) {
        let mut writer = StateWriter::new(state);
        writer.string("id", Some(object.object_id()));
        M::write_state(object, &mut writer);
        diagnostics.extend(writer.into_diagnostics());
    }
}

impl<M: ObjectMapping> Default for ObjectResource<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: ObjectMapping> Resource for ObjectResource<M> {
    fn type_name(&self) -> &str {
        M::TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: M::TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: M::schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: M::validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];
        let mut new_state = request.planned_state.clone();

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let body = match M::create_request(&request.planned_state) {
            Ok(body) => body,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        tracing::debug!(request_id = %ctx.request_id(), kind = Self::kind(), "creating");
        let created = match client.objects::<M::Object>().create(&body).await {
            Ok(created) => created,
            Err(e) => {
                diagnostics.extend(api_error_diagnostics(
                    &format!("Failed to create {}", Self::kind()),
                    &e,
                ));
                return CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let id = created.object_id().to_string();

        // Objects are created active; only a deactivation needs a second call
        let desired = attrs::bool(&request.planned_state, "enabled").filter(|enabled| !enabled);
        if let Err(e) = Self::sync_enabled(client, &id, desired, M::enabled(&created)).await {
            diagnostics.extend(api_error_diagnostics(
                &format!("Failed to set enabled on {} {}", Self::kind(), id),
                &e,
            ));
        }

        let object = Self::refresh(client, created, &mut diagnostics).await;
        Self::write(&object, &mut new_state, &mut diagnostics);

        CreateResourceResponse {
            new_state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                };
            }
        };

        let id = match attrs::string(&request.current_state, "id") {
            Some(id) => id,
            None => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                };
            }
        };

        tracing::debug!(request_id = %ctx.request_id(), kind = Self::kind(), %id, "reading");
        match client.objects::<M::Object>().get(&id).await {
            Ok(object) => {
                let mut new_state = request.current_state;
                Self::write(&object, &mut new_state, &mut diagnostics);
                ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(kind = Self::kind(), %id, "removed outside of Terraform");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.extend(api_error_diagnostics(
                    &format!("Failed to read {} {}", Self::kind(), id),
                    &e,
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];
        let mut new_state = request.planned_state.clone();

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let id = match attrs::required_string(&request.prior_state, "id") {
            Ok(id) => id,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let body = match M::update_request(&request.planned_state) {
            Ok(body) => body,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        tracing::debug!(request_id = %ctx.request_id(), kind = Self::kind(), %id, "updating");
        let updated = match client.objects::<M::Object>().update(&id, &body).await {
            Ok(updated) => updated,
            Err(e) => {
                diagnostics.extend(api_error_diagnostics(
                    &format!("Failed to update {} {}", Self::kind(), id),
                    &e,
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let desired = attrs::bool(&request.planned_state, "enabled");
        let prior = attrs::bool(&request.prior_state, "enabled");
        if desired != prior {
            if let Err(e) = Self::sync_enabled(client, &id, desired, prior).await {
                diagnostics.extend(api_error_diagnostics(
                    &format!("Failed to set enabled on {} {}", Self::kind(), id),
                    &e,
                ));
            }
        }

        let object = Self::refresh(client, updated, &mut diagnostics).await;
        Self::write(&object, &mut new_state, &mut diagnostics);

        UpdateResourceResponse {
            new_state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = match attrs::required_string(&request.prior_state, "id") {
            Ok(id) => id,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        tracing::debug!(request_id = %ctx.request_id(), kind = Self::kind(), %id, "deleting");
        match client.objects::<M::Object>().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(kind = Self::kind(), %id, "already deleted");
            }
            Err(e) => diagnostics.extend(api_error_diagnostics(
                &format!("Failed to delete {} {}", Self::kind(), id),
                &e,
            )),
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, attrs::path("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl<M: ObjectMapping> ResourceWithConfigure for ObjectResource<M> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match McpGatewayProviderData::from_provider_data(request.provider_data) {
            Ok(data) => {
                self.provider_data = data;
                ConfigureResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureResourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}
