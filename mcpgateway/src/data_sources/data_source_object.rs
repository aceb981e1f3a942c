//! Generic data source looking up one gateway object by id

use async_trait::async_trait;
use std::marker::PhantomData;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::Schema;
use tfplug::{AttributeBuilder, Diagnostic, DynamicValue, SchemaBuilder};

use crate::api::{Client, GatewayApiObject};
use crate::provider_data::McpGatewayProviderData;
use crate::resources::attrs::{self, api_error_diagnostics, StateWriter};
use crate::resources::ObjectMapping;

pub struct ObjectDataSource<M> {
    provider_data: Option<McpGatewayProviderData>,
    _mapping: PhantomData<fn() -> M>,
}

impl<M: ObjectMapping> ObjectDataSource<M> {
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

    /// Read-only view of the resource schema
    ///
    /// `id` becomes the only input; secrets are dropped since the gateway
    /// never returns them.
    pub fn derived_schema() -> Schema {
        let resource = M::schema();
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description(&resource.block.description);

        for attribute in resource.block.attributes {
            if attribute.sensitive {
                continue;
            }
            let derived = AttributeBuilder::new(&attribute.name, attribute.r#type)
                .description(&attribute.description);
            let derived = if attribute.name == "id" {
                derived.required()
            } else {
                derived.computed()
            };
            builder = builder.attribute(derived.build());
        }
        builder.build()
    }

    fn failed(diagnostics: Vec<Diagnostic>) -> ReadDataSourceResponse {
        ReadDataSourceResponse {
            state: DynamicValue::null(),
            diagnostics,
        }
    }
}

impl<M: ObjectMapping> Default for ObjectDataSource<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: ObjectMapping> DataSource for ObjectDataSource<M> {
    fn type_name(&self) -> &str {
        M::TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: M::TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::derived_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let kind = <M::Object as GatewayApiObject>::KIND;

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => return Self::failed(vec![diag]),
        };
        let id = match attrs::required_string(&request.config, "id") {
            Ok(id) => id,
            Err(diag) => return Self::failed(vec![diag]),
        };

        tracing::debug!(request_id = %ctx.request_id(), kind, %id, "looking up");
        match client.objects::<M::Object>().get(&id).await {
            Ok(object) => {
                let mut state = DynamicValue::object();
                let mut writer = StateWriter::new(&mut state);
                writer.string("id", Some(object.object_id()));
                M::write_state(&object, &mut writer);
                let diagnostics = writer.into_diagnostics();
                ReadDataSourceResponse { state, diagnostics }
            }
            Err(e) if e.is_not_found() => Self::failed(vec![Diagnostic::error(
                format!("{} not found", kind),
                format!("No {} with id {:?} exists on the gateway", kind, id),
            )
            .with_attribute(attrs::path("id"))]),
            Err(e) => Self::failed(api_error_diagnostics(
                &format!("Failed to read {} {}", kind, id),
                &e,
            )),
        }
    }
}

#[async_trait]
impl<M: ObjectMapping> DataSourceWithConfigure for ObjectDataSource<M> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match McpGatewayProviderData::from_provider_data(request.provider_data) {
            Ok(data) => {
                self.provider_data = data;
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureDataSourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}
