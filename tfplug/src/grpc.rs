//! gRPC service implementation of the Terraform Plugin Protocol v6.9
//!
//! The service owns the provider behind a lock that is only taken for writing
//! during ConfigureProvider. Resources and data sources are created on demand
//! from the provider's factories and configured with the stored provider data
//! before each call, so concurrent requests never share an instance.

use crate::codec;
use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSource, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::plan_modifier::values_equal;
use crate::proto;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderData, ProviderMetadataRequest,
    ProviderSchemaRequest, ResourceFactory, StopProviderRequest, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, Resource, ResourceSchemaRequest, ResourceWithConfigure,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::{DefaultRequest, PlanModifierRequest, Schema, StringKind, ValidatorRequest};
use crate::types::{
    AttributePath, AttributePathStep, ClientCapabilities, Diagnostic, DiagnosticSeverity,
    DiagnosticsExt, Dynamic, DynamicValue, ServerCapabilities,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

type RpcResult<T> = std::result::Result<Response<T>, Status>;

enum SchemaKey<'a> {
    Provider,
    Resource(&'a str),
    DataSource(&'a str),
}

/// Protocol service wrapping a provider implementation
pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<Option<ProviderData>>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
    schemas: RwLock<HashMap<String, Schema>>,
    root: Context,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
            resources,
            data_sources,
            schemas: RwLock::new(HashMap::new()),
            root: Context::new(),
        }
    }

    /// Root context; cancelled by StopProvider
    pub fn root_context(&self) -> Context {
        self.root.clone()
    }

    async fn schema(&self, key: SchemaKey<'_>) -> Result<Schema, Vec<Diagnostic>> {
        let cache_key = match &key {
            SchemaKey::Provider => "provider".to_string(),
            SchemaKey::Resource(name) => format!("resource.{}", name),
            SchemaKey::DataSource(name) => format!("data.{}", name),
        };
        if let Some(schema) = self.schemas.read().await.get(&cache_key) {
            return Ok(schema.clone());
        }

        let ctx = self.root.child("GetSchema");
        let (schema, diagnostics) = match key {
            SchemaKey::Provider => {
                let response = self
                    .provider
                    .read()
                    .await
                    .schema(ctx, ProviderSchemaRequest)
                    .await;
                (response.schema, response.diagnostics)
            }
            SchemaKey::Resource(name) => {
                let factory = self
                    .resources
                    .get(name)
                    .ok_or_else(|| vec![unknown_type("resource", name)])?;
                let response = factory().schema(ctx, ResourceSchemaRequest).await;
                (response.schema, response.diagnostics)
            }
            SchemaKey::DataSource(name) => {
                let factory = self
                    .data_sources
                    .get(name)
                    .ok_or_else(|| vec![unknown_type("data source", name)])?;
                let response = factory().schema(ctx, DataSourceSchemaRequest).await;
                (response.schema, response.diagnostics)
            }
        };

        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        self.schemas
            .write()
            .await
            .insert(cache_key, schema.clone());
        Ok(schema)
    }

    /// Creates a resource and hands it the provider data
    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .resources
            .get(type_name)
            .ok_or_else(|| vec![unknown_type("resource", type_name)])?;
        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .data_sources
            .get(type_name)
            .ok_or_else(|| vec![unknown_type("data source", type_name)])?;
        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }

    async fn server_capabilities(&self) -> ServerCapabilities {
        let ctx = self.root.child("GetMetadata");
        self.provider
            .read()
            .await
            .metadata(ctx, ProviderMetadataRequest)
            .await
            .server_capabilities
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::ProviderService for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> RpcResult<proto::get_metadata::Response> {
        let mut resources: Vec<_> = self
            .resources
            .keys()
            .map(|name| proto::get_metadata::ResourceMetadata {
                type_name: name.clone(),
            })
            .collect();
        resources.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        let mut data_sources: Vec<_> = self
            .data_sources
            .keys()
            .map(|name| proto::get_metadata::DataSourceMetadata {
                type_name: name.clone(),
            })
            .collect();
        data_sources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(capabilities_to_proto(&self.server_capabilities().await)),
            diagnostics: vec![],
            data_sources,
            resources,
            functions: vec![],
            ephemeral_resources: vec![],
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> RpcResult<proto::get_provider_schema::Response> {
        let mut diagnostics = vec![];

        let provider = match self.schema(SchemaKey::Provider).await {
            Ok(schema) => Some(schema_to_proto(&schema)),
            Err(diags) => {
                diagnostics.extend(diags);
                None
            }
        };

        let mut resource_schemas = HashMap::new();
        for name in self.resources.keys() {
            match self.schema(SchemaKey::Resource(name)).await {
                Ok(schema) => {
                    resource_schemas.insert(name.clone(), schema_to_proto(&schema));
                }
                Err(diags) => diagnostics.extend(diags),
            }
        }

        let mut data_source_schemas = HashMap::new();
        for name in self.data_sources.keys() {
            match self.schema(SchemaKey::DataSource(name)).await {
                Ok(schema) => {
                    data_source_schemas.insert(name.clone(), schema_to_proto(&schema));
                }
                Err(diags) => diagnostics.extend(diags),
            }
        }

        Ok(Response::new(proto::get_provider_schema::Response {
            provider,
            resource_schemas,
            data_source_schemas,
            functions: HashMap::new(),
            ephemeral_resource_schemas: HashMap::new(),
            diagnostics: diagnostics_to_proto(diagnostics),
            provider_meta: None,
            server_capabilities: Some(capabilities_to_proto(&self.server_capabilities().await)),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> RpcResult<proto::validate_provider_config::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ValidateProviderConfig");

        let schema = match self.schema(SchemaKey::Provider).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::validate_provider_config::Response {
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };
        let config = decode_value(req.config.as_ref(), &schema)?;

        let mut diagnostics = validate_attributes(&schema, &config);
        let response = self
            .provider
            .read()
            .await
            .validate(ctx, ValidateProviderConfigRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> RpcResult<proto::validate_resource_config::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ValidateResourceConfig");

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::validate_resource_config::Response {
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };
        let config = decode_value(req.config.as_ref(), &schema)?;

        let mut diagnostics = validate_attributes(&schema, &config);
        // Validation may run before the provider is configured
        if let Some(factory) = self.resources.get(&req.type_name) {
            let response = factory()
                .validate(
                    ctx,
                    ValidateResourceConfigRequest {
                        type_name: req.type_name.clone(),
                        config,
                        client_capabilities: client_capabilities(req.client_capabilities),
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> RpcResult<proto::validate_data_resource_config::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ValidateDataResourceConfig");

        let schema = match self.schema(SchemaKey::DataSource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::validate_data_resource_config::Response {
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };
        let config = decode_value(req.config.as_ref(), &schema)?;

        let mut diagnostics = validate_attributes(&schema, &config);
        if let Some(factory) = self.data_sources.get(&req.type_name) {
            let response = factory()
                .validate(
                    ctx,
                    ValidateDataSourceConfigRequest {
                        type_name: req.type_name.clone(),
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> RpcResult<proto::upgrade_resource_state::Response> {
        let req = request.into_inner();

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::upgrade_resource_state::Response {
                    upgraded_state: None,
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };

        if req.version > schema.version {
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: diagnostics_to_proto(vec![Diagnostic::error(
                    "Unsupported state version",
                    format!(
                        "State for {} has schema version {}, newer than this provider's version {}",
                        req.type_name, req.version, schema.version
                    ),
                )]),
            }));
        }

        let raw = req.raw_state.unwrap_or_default();
        if raw.json.is_empty() && !raw.flatmap.is_empty() {
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: diagnostics_to_proto(vec![Diagnostic::error(
                    "Unsupported state format",
                    "Legacy flatmap state cannot be upgraded by this provider",
                )]),
            }));
        }

        let state = codec::decode_json(&raw.json, &schema.object_type())?;
        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(encode_value(&state, &schema)?),
            diagnostics: vec![],
        }))
    }

    async fn get_resource_identity_schemas(
        &self,
        _request: Request<proto::get_resource_identity_schemas::Request>,
    ) -> RpcResult<proto::get_resource_identity_schemas::Response> {
        Ok(Response::new(proto::get_resource_identity_schemas::Response {
            identity_schemas: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn upgrade_resource_identity(
        &self,
        request: Request<proto::upgrade_resource_identity::Request>,
    ) -> RpcResult<proto::upgrade_resource_identity::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::upgrade_resource_identity::Response {
            upgraded_identity: None,
            diagnostics: diagnostics_to_proto(vec![not_supported(
                "Resource identity",
                &req.type_name,
            )]),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> RpcResult<proto::configure_provider::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ConfigureProvider");
        tracing::debug!(
            request_id = %ctx.request_id(),
            terraform_version = %req.terraform_version,
            "configuring provider"
        );

        let schema = match self.schema(SchemaKey::Provider).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::configure_provider::Response {
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };
        let config = decode_value(req.config.as_ref(), &schema)?;

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    ctx,
                    ConfigureProviderRequest {
                        terraform_version: req.terraform_version,
                        config,
                        client_capabilities: client_capabilities(req.client_capabilities),
                    },
                )
                .await
        };

        if !response.diagnostics.has_errors() {
            *self.provider_data.write().await = response.provider_data;
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> RpcResult<proto::read_resource::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ReadResource");
        tracing::debug!(request_id = %ctx.request_id(), type_name = %req.type_name, "reading resource");

        let failed = |diags: Vec<Diagnostic>,
                      state: Option<proto::DynamicValue>|
         -> RpcResult<proto::read_resource::Response> {
            Ok(Response::new(proto::read_resource::Response {
                new_state: state,
                diagnostics: diagnostics_to_proto(diags),
                private: vec![],
                deferred: None,
                new_identity: None,
            }))
        };

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => return failed(diags, req.current_state),
        };
        let current_state = decode_value(req.current_state.as_ref(), &schema)?;
        let resource = match self.configured_resource(&ctx, &req.type_name).await {
            Ok(resource) => resource,
            Err(diags) => return failed(diags, req.current_state),
        };

        let response = match ctx
            .run(resource.read(
                ctx.clone(),
                ReadResourceRequest {
                    type_name: req.type_name.clone(),
                    current_state,
                    private: req.private.clone(),
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            ))
            .await
        {
            Ok(response) => response,
            Err(e) => return failed(vec![cancelled(e)], req.current_state),
        };

        if response.diagnostics.has_errors() {
            return failed(response.diagnostics, req.current_state);
        }

        // None means the remote object is gone; a null state drops it from state
        let new_state = response.new_state.unwrap_or_else(DynamicValue::null);
        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(encode_value(&new_state, &schema)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            private: response.private,
            deferred: None,
            new_identity: None,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> RpcResult<proto::plan_resource_change::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("PlanResourceChange");
        tracing::debug!(request_id = %ctx.request_id(), type_name = %req.type_name, "planning resource change");

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::plan_resource_change::Response {
                    diagnostics: diagnostics_to_proto(diags),
                    ..Default::default()
                }))
            }
        };

        let prior_state = decode_value(req.prior_state.as_ref(), &schema)?;
        let proposed = decode_value(req.proposed_new_state.as_ref(), &schema)?;
        let config = decode_value(req.config.as_ref(), &schema)?;

        let plan = plan_change(&schema, &prior_state, &proposed, &config);

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_value(&plan.planned_state, &schema)?),
            requires_replace: plan.requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: diagnostics_to_proto(plan.diagnostics),
            legacy_type_system: false,
            deferred: None,
            planned_identity: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> RpcResult<proto::apply_resource_change::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ApplyResourceChange");

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => {
                return Ok(Response::new(proto::apply_resource_change::Response {
                    new_state: req.prior_state,
                    diagnostics: diagnostics_to_proto(diags),
                    ..Default::default()
                }))
            }
        };

        let prior_state = decode_value(req.prior_state.as_ref(), &schema)?;
        let planned_state = decode_value(req.planned_state.as_ref(), &schema)?;
        let config = decode_value(req.config.as_ref(), &schema)?;

        let resource = match self.configured_resource(&ctx, &req.type_name).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::apply_resource_change::Response {
                    new_state: Some(encode_value(&prior_state, &schema)?),
                    diagnostics: diagnostics_to_proto(diags),
                    ..Default::default()
                }))
            }
        };

        let type_name = req.type_name.clone();
        let (new_state, private, diagnostics) = if planned_state.is_null() {
            tracing::info!(request_id = %ctx.request_id(), %type_name, "deleting resource");
            let outcome = ctx
                .run(resource.delete(
                    ctx.clone(),
                    DeleteResourceRequest {
                        type_name,
                        prior_state: prior_state.clone(),
                        planned_private: req.planned_private.clone(),
                    },
                ))
                .await;
            match outcome {
                Ok(response) if !response.diagnostics.has_errors() => {
                    (DynamicValue::null(), vec![], response.diagnostics)
                }
                Ok(response) => (prior_state, req.planned_private, response.diagnostics),
                Err(e) => (prior_state, req.planned_private, vec![cancelled(e)]),
            }
        } else if prior_state.is_null() {
            tracing::info!(request_id = %ctx.request_id(), %type_name, "creating resource");
            let outcome = ctx
                .run(resource.create(
                    ctx.clone(),
                    CreateResourceRequest {
                        type_name,
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                    },
                ))
                .await;
            match outcome {
                Ok(response) if !response.diagnostics.has_errors() => {
                    (response.new_state, response.private, response.diagnostics)
                }
                Ok(response) => (DynamicValue::null(), vec![], response.diagnostics),
                Err(e) => (DynamicValue::null(), vec![], vec![cancelled(e)]),
            }
        } else {
            tracing::info!(request_id = %ctx.request_id(), %type_name, "updating resource");
            let outcome = ctx
                .run(resource.update(
                    ctx.clone(),
                    UpdateResourceRequest {
                        type_name,
                        prior_state: prior_state.clone(),
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                    },
                ))
                .await;
            match outcome {
                Ok(response) if !response.diagnostics.has_errors() => {
                    (response.new_state, response.private, response.diagnostics)
                }
                Ok(response) => (prior_state, req.planned_private, response.diagnostics),
                Err(e) => (prior_state, req.planned_private, vec![cancelled(e)]),
            }
        };

        // Terraform rejects unknown values after apply
        let new_state = DynamicValue::new(new_state.value.null_unknowns());

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_value(&new_state, &schema)?),
            private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
            new_identity: None,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> RpcResult<proto::import_resource_state::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ImportResourceState");
        tracing::info!(request_id = %ctx.request_id(), type_name = %req.type_name, id = %req.id, "importing resource");

        let failed = |diags: Vec<Diagnostic>| -> RpcResult<proto::import_resource_state::Response> {
            Ok(Response::new(proto::import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: diagnostics_to_proto(diags),
                deferred: None,
            }))
        };

        let schema = match self.schema(SchemaKey::Resource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => return failed(diags),
        };
        let resource = match self.configured_resource(&ctx, &req.type_name).await {
            Ok(resource) => resource,
            Err(diags) => return failed(diags),
        };

        let caps = client_capabilities(req.client_capabilities);
        let response = match ctx
            .run(resource.import_state(
                ctx.clone(),
                ImportResourceStateRequest {
                    type_name: req.type_name.clone(),
                    id: req.id.clone(),
                    client_capabilities: caps.clone(),
                },
            ))
            .await
        {
            Ok(response) => response,
            Err(e) => return failed(vec![cancelled(e)]),
        };
        let mut diagnostics = response.diagnostics;
        if diagnostics.has_errors() {
            return failed(diagnostics);
        }

        let mut imported_resources = vec![];
        for imported in response.imported_resources {
            // Fill in the remaining attributes from the remote object
            let read = ctx
                .run(resource.read(
                    ctx.clone(),
                    ReadResourceRequest {
                        type_name: imported.type_name.clone(),
                        current_state: imported.state,
                        private: imported.private.clone(),
                        client_capabilities: caps.clone(),
                    },
                ))
                .await;
            let read = match read {
                Ok(read) => read,
                Err(e) => {
                    diagnostics.push(cancelled(e));
                    return failed(diagnostics);
                }
            };
            let has_errors = read.diagnostics.has_errors();
            diagnostics.extend(read.diagnostics);
            if has_errors {
                return failed(diagnostics);
            }
            let Some(state) = read.new_state else {
                diagnostics.push(Diagnostic::error(
                    "Cannot import non-existent remote object",
                    format!(
                        "No {} with ID {:?} exists on the remote side",
                        imported.type_name, req.id
                    ),
                ));
                return failed(diagnostics);
            };

            imported_resources.push(proto::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: Some(encode_value(&state, &schema)?),
                private: read.private,
                identity: None,
            });
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(diagnostics),
            deferred: None,
        }))
    }

    async fn move_resource_state(
        &self,
        request: Request<proto::move_resource_state::Request>,
    ) -> RpcResult<proto::move_resource_state::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::move_resource_state::Response {
            diagnostics: diagnostics_to_proto(vec![not_supported(
                "Moving resource state",
                &req.target_type_name,
            )]),
            ..Default::default()
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> RpcResult<proto::read_data_source::Response> {
        let req = request.into_inner();
        let ctx = self.root.child("ReadDataSource");
        tracing::debug!(request_id = %ctx.request_id(), type_name = %req.type_name, "reading data source");

        let failed = |diags: Vec<Diagnostic>| -> RpcResult<proto::read_data_source::Response> {
            Ok(Response::new(proto::read_data_source::Response {
                state: None,
                diagnostics: diagnostics_to_proto(diags),
                deferred: None,
            }))
        };

        let schema = match self.schema(SchemaKey::DataSource(&req.type_name)).await {
            Ok(schema) => schema,
            Err(diags) => return failed(diags),
        };
        let config = decode_value(req.config.as_ref(), &schema)?;
        let data_source = match self.configured_data_source(&ctx, &req.type_name).await {
            Ok(data_source) => data_source,
            Err(diags) => return failed(diags),
        };

        let response = match ctx
            .run(data_source.read(
                ctx.clone(),
                ReadDataSourceRequest {
                    type_name: req.type_name.clone(),
                    config,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            ))
            .await
        {
            Ok(response) => response,
            Err(e) => return failed(vec![cancelled(e)]),
        };

        if response.diagnostics.has_errors() {
            return failed(response.diagnostics);
        }

        let state = DynamicValue::new(response.state.value.null_unknowns());
        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_value(&state, &schema)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn validate_ephemeral_resource_config(
        &self,
        request: Request<proto::validate_ephemeral_resource_config::Request>,
    ) -> RpcResult<proto::validate_ephemeral_resource_config::Response> {
        let req = request.into_inner();
        Ok(Response::new(
            proto::validate_ephemeral_resource_config::Response {
                diagnostics: diagnostics_to_proto(vec![unknown_type(
                    "ephemeral resource",
                    &req.type_name,
                )]),
            },
        ))
    }

    async fn open_ephemeral_resource(
        &self,
        request: Request<proto::open_ephemeral_resource::Request>,
    ) -> RpcResult<proto::open_ephemeral_resource::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::open_ephemeral_resource::Response {
            diagnostics: diagnostics_to_proto(vec![unknown_type(
                "ephemeral resource",
                &req.type_name,
            )]),
            ..Default::default()
        }))
    }

    async fn renew_ephemeral_resource(
        &self,
        request: Request<proto::renew_ephemeral_resource::Request>,
    ) -> RpcResult<proto::renew_ephemeral_resource::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::renew_ephemeral_resource::Response {
            diagnostics: diagnostics_to_proto(vec![unknown_type(
                "ephemeral resource",
                &req.type_name,
            )]),
            ..Default::default()
        }))
    }

    async fn close_ephemeral_resource(
        &self,
        request: Request<proto::close_ephemeral_resource::Request>,
    ) -> RpcResult<proto::close_ephemeral_resource::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::close_ephemeral_resource::Response {
            diagnostics: diagnostics_to_proto(vec![unknown_type(
                "ephemeral resource",
                &req.type_name,
            )]),
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<proto::get_functions::Request>,
    ) -> RpcResult<proto::get_functions::Response> {
        Ok(Response::new(proto::get_functions::Response {
            functions: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn call_function(
        &self,
        request: Request<proto::call_function::Request>,
    ) -> RpcResult<proto::call_function::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::call_function::Response {
            result: None,
            error: Some(proto::FunctionError {
                text: format!("Function {:?} is not provided by this provider", req.name),
                function_argument: None,
            }),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> RpcResult<proto::stop_provider::Response> {
        let ctx = self.root.child("StopProvider");
        tracing::info!("stop requested, cancelling outstanding operations");

        let response = self
            .provider
            .read()
            .await
            .stop(ctx, StopProviderRequest)
            .await;
        self.root.cancel();

        Ok(Response::new(proto::stop_provider::Response {
            error: response.error.unwrap_or_default(),
        }))
    }
}

/// Outcome of planning a single resource change
pub(crate) struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the planned state from the proposed new state
///
/// Order matters: defaults first, then unknown marking of computed
/// attributes, then plan modifiers which may restore prior values.
pub(crate) fn plan_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut change = PlannedChange {
        planned_state: proposed.clone(),
        requires_replace: vec![],
        diagnostics: vec![],
    };

    // Destroy
    if proposed.is_null() {
        change.planned_state = DynamicValue::null();
        return change;
    }

    let is_create = prior_state.is_null();
    let has_changes = !values_equal(&prior_state.value, &proposed.value);

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let config_value = config.get(&path).cloned().unwrap_or_default();
        let state_value = prior_state.get(&path).cloned().unwrap_or_default();

        if config_value.is_null() {
            if let (Some(default), true) = (&attr.default, attr.optional && attr.computed) {
                let value = default
                    .default_value(DefaultRequest { path: path.clone() })
                    .value;
                let _ = change.planned_state.set_value(&path, value);
            } else if attr.computed && (is_create || has_changes) {
                let _ = change.planned_state.mark_unknown(&path);
            }
        }

        if attr.plan_modifiers.is_empty() {
            continue;
        }

        let mut plan_value = change.planned_state.get(&path).cloned().unwrap_or_default();
        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: config_value.clone(),
                state_value: state_value.clone(),
                plan_value,
                path: path.clone(),
            });
            plan_value = response.plan_value;
            if response.requires_replace && !change.requires_replace.contains(&path) {
                change.requires_replace.push(path.clone());
            }
            change.diagnostics.extend(response.diagnostics);
        }
        let _ = change.planned_state.set_value(&path, plan_value);
    }

    change
}

/// Schema-level checks shared by every validate RPC
pub(crate) fn validate_attributes(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    if config.is_null() || config.is_unknown() {
        return diagnostics;
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = config.get(&path).cloned().unwrap_or_default();

        match &value {
            Dynamic::Unknown => continue,
            Dynamic::Null => {
                if attr.required {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            format!("The argument \"{}\" is required", attr.name),
                        )
                        .with_attribute(path),
                    );
                }
                continue;
            }
            _ => {}
        }

        if attr.computed && !attr.optional {
            diagnostics.push(
                Diagnostic::error(
                    "Value for unconfigurable attribute",
                    format!("\"{}\" is computed and cannot be set in configuration", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !value.is_fully_known() {
            continue;
        }
        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                value: value.clone(),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

#[allow(clippy::result_large_err)]
fn decode_value(
    value: Option<&proto::DynamicValue>,
    schema: &Schema,
) -> std::result::Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };
    let ty = schema.object_type();
    let decoded = if !value.msgpack.is_empty() {
        codec::decode(&value.msgpack, &ty)
    } else {
        codec::decode_json(&value.json, &ty)
    };
    decoded.map_err(|e| {
        tracing::error!(error = %e, "failed to decode value");
        Status::from(e)
    })
}

#[allow(clippy::result_large_err)]
fn encode_value(
    value: &DynamicValue,
    schema: &Schema,
) -> std::result::Result<proto::DynamicValue, Status> {
    let msgpack = codec::encode(&value.value, &schema.object_type()).map_err(Status::from)?;
    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(proto::schema::Block {
            version: schema.block.version,
            attributes: schema
                .block
                .attributes
                .iter()
                .map(|attr| proto::schema::Attribute {
                    name: attr.name.clone(),
                    r#type: attr.r#type.to_type_bytes(),
                    nested_type: None,
                    description: attr.description.clone(),
                    required: attr.required,
                    optional: attr.optional,
                    computed: attr.computed,
                    sensitive: attr.sensitive,
                    description_kind: proto::StringKind::Plain as i32,
                    deprecated: attr.deprecated,
                    write_only: false,
                })
                .collect(),
            block_types: vec![],
            description: schema.block.description.clone(),
            description_kind: match schema.block.description_kind {
                StringKind::Plain => proto::StringKind::Plain as i32,
                StringKind::Markdown => proto::StringKind::Markdown as i32,
            },
            deprecated: schema.block.deprecated,
        }),
    }
}

fn capabilities_to_proto(caps: &ServerCapabilities) -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: caps.plan_destroy,
        get_provider_schema_optional: caps.get_provider_schema_optional,
        move_resource_state: caps.move_resource_state,
    }
}

fn client_capabilities(caps: Option<proto::ClientCapabilities>) -> ClientCapabilities {
    caps.map(|c| ClientCapabilities {
        deferral_allowed: c.deferral_allowed,
        write_only_attributes_allowed: c.write_only_attributes_allowed,
    })
    .unwrap_or_default()
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::step::Selector;

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|diag| proto::Diagnostic {
            severity: match diag.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid as i32,
            },
            summary: diag.summary,
            detail: diag.detail,
            attribute: diag.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

fn unknown_type(kind: &str, type_name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Unknown {} type", kind),
        format!("The provider does not implement the {} {:?}", kind, type_name),
    )
}

fn not_supported(feature: &str, type_name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("{} is not supported", feature),
        format!("{} is not supported for {:?} by this provider", feature, type_name),
    )
}

fn cancelled(err: TfplugError) -> Diagnostic {
    Diagnostic::error("Operation cancelled", err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::{RequiresReplace, UseStateForUnknown};
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
    use crate::validator::StringLengthValidator;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::at_least(3))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("uri", AttributeType::String)
                    .optional()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("visibility", AttributeType::String)
                    .optional()
                    .computed()
                    .default(StaticDefault::string("public"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn object(pairs: &[(&str, Dynamic)]) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ))
    }

    fn attr(value: &DynamicValue, name: &str) -> Dynamic {
        value.get(&AttributePath::new(name)).cloned().unwrap_or_default()
    }

    #[test]
    fn create_plan_applies_defaults_and_marks_computed_unknown() {
        let config = object(&[("name", "echo".into())]);
        let plan = plan_change(&schema(), &DynamicValue::null(), &config, &config);

        assert_eq!(attr(&plan.planned_state, "id"), Dynamic::Unknown);
        assert_eq!(attr(&plan.planned_state, "updated_at"), Dynamic::Unknown);
        assert_eq!(attr(&plan.planned_state, "visibility"), "public".into());
        assert_eq!(attr(&plan.planned_state, "name"), "echo".into());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn update_plan_keeps_stable_computed_values() {
        let prior = object(&[
            ("id", "t-1".into()),
            ("name", "echo".into()),
            ("visibility", "public".into()),
            ("updated_at", "2024-01-01T00:00:00Z".into()),
        ]);
        let config = object(&[("name", "echo2".into())]);
        let mut proposed = prior.clone();
        proposed
            .set_string(&AttributePath::new("name"), "echo2")
            .unwrap();

        let plan = plan_change(&schema(), &prior, &proposed, &config);

        assert_eq!(attr(&plan.planned_state, "id"), "t-1".into());
        assert_eq!(attr(&plan.planned_state, "updated_at"), Dynamic::Unknown);
        assert_eq!(attr(&plan.planned_state, "visibility"), "public".into());
    }

    #[test]
    fn unchanged_plan_leaves_computed_values_alone() {
        let prior = object(&[
            ("id", "t-1".into()),
            ("name", "echo".into()),
            ("updated_at", "2024-01-01T00:00:00Z".into()),
        ]);
        let config = object(&[("name", "echo".into())]);

        let plan = plan_change(&schema(), &prior, &prior, &config);
        assert_eq!(
            attr(&plan.planned_state, "updated_at"),
            "2024-01-01T00:00:00Z".into()
        );
    }

    #[test]
    fn changed_uri_requires_replace() {
        let prior = object(&[("id", "r-1".into()), ("name", "doc".into()), ("uri", "a://1".into())]);
        let config = object(&[("name", "doc".into()), ("uri", "a://2".into())]);
        let mut proposed = prior.clone();
        proposed.set_string(&AttributePath::new("uri"), "a://2").unwrap();

        let plan = plan_change(&schema(), &prior, &proposed, &config);
        assert_eq!(plan.requires_replace, vec![AttributePath::new("uri")]);
    }

    #[test]
    fn destroy_plan_is_null() {
        let prior = object(&[("id", "r-1".into())]);
        let plan = plan_change(&schema(), &prior, &DynamicValue::null(), &DynamicValue::null());
        assert!(plan.planned_state.is_null());
    }

    #[test]
    fn validation_checks_required_and_validators() {
        let diags = validate_attributes(&schema(), &object(&[]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing required argument");

        let diags = validate_attributes(&schema(), &object(&[("name", "ab".into())]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("minimum length"));

        let diags = validate_attributes(&schema(), &object(&[("name", Dynamic::Unknown)]));
        assert!(diags.is_empty());
    }

    #[test]
    fn validation_rejects_configured_computed_only_attribute() {
        let diags = validate_attributes(
            &schema(),
            &object(&[("name", "echo".into()), ("id", "x".into())]),
        );
        assert!(diags.has_errors());
        assert_eq!(diags[0].attribute, Some(AttributePath::new("id")));
    }

    #[test]
    fn schema_conversion_sets_type_bytes() {
        let proto_schema = schema_to_proto(&schema());
        let block = proto_schema.block.unwrap();
        assert_eq!(block.attributes.len(), 5);
        assert_eq!(block.attributes[0].r#type, b"\"string\"".to_vec());
        assert!(block.attributes[1].required);
    }

    #[test]
    fn diagnostics_carry_attribute_paths() {
        let converted = diagnostics_to_proto(vec![Diagnostic::warning("w", "d")
            .with_attribute(AttributePath::new("tags").index(1))]);
        let path = converted[0].attribute.as_ref().unwrap();
        assert_eq!(path.steps.len(), 2);
        assert_eq!(
            converted[0].severity,
            proto::diagnostic::Severity::Warning as i32
        );
    }
}
