use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

use super::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use super::plan::plan;
use super::proto::{self, provider_server::Provider};
use super::state::{Reconcile, reconcile};
use super::value::Value;
use crate::config::{self, ConfigError, ProviderConfig};
use crate::data_sources::{self, DataSource};
use crate::octopus::OctopusClient;
use crate::resources::{self, Resource, ResourceError};

/// The provider half of `tfplugin6.Provider`.
///
/// Every RPC reports failures as diagnostics rather than gRPC statuses, so
/// Terraform can attach them to the right resource and attribute.
pub struct ProviderService {
    client: RwLock<Option<Arc<OctopusClient>>>,
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl Default for ProviderService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderService {
    pub fn new() -> Self {
        Self {
            client: RwLock::new(None),
            resources: resources::all().into_iter().map(|r| (r.type_name(), r)).collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    /// A service already configured with a client, skipping ConfigureProvider.
    pub fn with_client(client: OctopusClient) -> Self {
        Self {
            client: RwLock::new(Some(Arc::new(client))),
            ..Self::new()
        }
    }

    async fn client(&self) -> Result<Arc<OctopusClient>, Diagnostic> {
        self.client.read().await.clone().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                ResourceError::NotConfigured.to_string(),
            )
        })
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, Diagnostic> {
        self.resources.get(type_name).cloned().ok_or_else(|| {
            Diagnostic::error(
                "Unsupported resource type",
                ResourceError::UnknownResource(type_name.to_string()).to_string(),
            )
        })
    }

    fn data_source(&self, type_name: &str) -> Result<Arc<dyn DataSource>, Diagnostic> {
        self.data_sources.get(type_name).cloned().ok_or_else(|| {
            Diagnostic::error(
                "Unsupported data source type",
                ResourceError::UnknownDataSource(type_name.to_string()).to_string(),
            )
        })
    }

    fn capabilities() -> proto::ServerCapabilities {
        proto::ServerCapabilities {
            plan_destroy: true,
            get_provider_schema_optional: true,
            move_resource_state: false,
        }
    }

    async fn configure(&self, config: &Value) -> Result<(), Diagnostic> {
        let resolved = ProviderConfig::from_value(config).map_err(config_failure)?;
        let client = resolved.connect().await.map_err(config_failure)?;
        *self.client.write().await = Some(Arc::new(client));
        Ok(())
    }

    async fn read_resource_state(&self, type_name: &str, current: Value) -> Result<Value, Diagnostic> {
        let resource = self.resource(type_name)?;
        if current.is_null() {
            return Ok(Value::Null);
        }
        let client = self.client().await?;

        match resource.read(&client, &current).await {
            Ok(api) => Ok(reconcile(&resource.schema(), Reconcile::Refresh, &current, api)),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    resource = type_name,
                    id = current.get_str("id").unwrap_or_default(),
                    "resource no longer exists, removing it from state"
                );
                Ok(Value::Null)
            }
            Err(e) => Err(failure("read", type_name, &e)),
        }
    }

    async fn apply(&self, type_name: &str, prior: Value, planned: Value) -> Result<Value, Diagnostic> {
        let resource = self.resource(type_name)?;
        let client = self.client().await?;

        if planned.is_null() {
            return match resource.delete(&client, &prior).await {
                Ok(()) => Ok(Value::Null),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(resource = type_name, "resource was already deleted");
                    Ok(Value::Null)
                }
                Err(e) => Err(failure("delete", type_name, &e)),
            };
        }

        let api = if prior.is_null() {
            resource
                .create(&client, &planned)
                .await
                .map_err(|e| failure("create", type_name, &e))?
        } else {
            resource
                .update(&client, &prior, &planned)
                .await
                .map_err(|e| failure("update", type_name, &e))?
        };
        Ok(reconcile(&resource.schema(), Reconcile::Apply, &planned, api))
    }

    async fn read_data(&self, type_name: &str, config: Value) -> Result<Value, Diagnostic> {
        let data_source = self.data_source(type_name)?;
        let client = self.client().await?;
        let state = data_source
            .read(&client, &config)
            .await
            .map_err(|e| failure("read", type_name, &e))?;
        Ok(data_source.schema().conform(state))
    }
}

fn failure(action: &str, type_name: &str, err: &ResourceError) -> Diagnostic {
    let diagnostic = Diagnostic::error(format!("Unable to {action} {type_name}"), err.to_string());
    match err {
        ResourceError::Value(_) => diagnostic.with_bug_report_context(),
        _ => diagnostic,
    }
}

fn config_failure(err: ConfigError) -> Diagnostic {
    let diagnostic = Diagnostic::error("Unable to configure the Octopus Deploy provider", err.to_string());
    match err {
        ConfigError::MissingAddress => diagnostic.at(AttributePath::root("address")),
        ConfigError::SpaceNotFound(_) => diagnostic.at(AttributePath::root("space_id")),
        _ => diagnostic,
    }
}

/// Terraform sends msgpack; JSON only shows up from older clients.
pub fn decode(value: Option<&proto::DynamicValue>, what: &str) -> Result<Value, Diagnostic> {
    let decoded = match value {
        Some(dv) if !dv.msgpack.is_empty() => Value::from_msgpack(&dv.msgpack),
        Some(dv) => Value::from_json(&dv.json),
        None => Ok(Value::Null),
    };
    decoded.map_err(|e| {
        Diagnostic::error(format!("Unable to decode {what}"), e.to_string()).with_bug_report_context()
    })
}

pub fn encode(value: &Value) -> Result<proto::DynamicValue, Diagnostic> {
    let msgpack = value.to_msgpack().map_err(|e| {
        Diagnostic::error("Unable to encode value", e.to_string()).with_bug_report_context()
    })?;
    Ok(proto::DynamicValue {
        msgpack,
        json: Vec::new(),
    })
}

fn single(diagnostic: Diagnostic) -> Vec<proto::Diagnostic> {
    Diagnostics::from(diagnostic).into_proto()
}

/// Encodes a result, turning any failure along the way into diagnostics.
fn respond(result: Result<Value, Diagnostic>) -> (Option<proto::DynamicValue>, Vec<proto::Diagnostic>) {
    match result.and_then(|value| encode(&value)) {
        Ok(encoded) => (Some(encoded), Vec::new()),
        Err(diagnostic) => (None, single(diagnostic)),
    }
}

#[tonic::async_trait]
impl Provider for ProviderService {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> Result<Response<proto::get_metadata::Response>, Status> {
        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(Self::capabilities()),
            diagnostics: Vec::new(),
            data_sources: self
                .data_sources
                .keys()
                .map(|name| proto::get_metadata::DataSourceMetadata {
                    type_name: name.to_string(),
                })
                .collect(),
            resources: self
                .resources
                .keys()
                .map(|name| proto::get_metadata::ResourceMetadata {
                    type_name: name.to_string(),
                })
                .collect(),
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> Result<Response<proto::get_provider_schema::Response>, Status> {
        tracing::debug!(
            resources = self.resources.len(),
            data_sources = self.data_sources.len(),
            "serving provider schema"
        );
        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(config::schema().to_proto()),
            resource_schemas: self
                .resources
                .iter()
                .map(|(name, r)| (name.to_string(), r.schema().to_proto()))
                .collect(),
            data_source_schemas: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.to_string(), d.schema().to_proto()))
                .collect(),
            diagnostics: Vec::new(),
            provider_meta: None,
            server_capabilities: Some(Self::capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> Result<Response<proto::validate_provider_config::Response>, Status> {
        let request = request.into_inner();
        let diagnostics = match decode(request.config.as_ref(), "provider configuration") {
            Ok(config) => config::schema().validate(&config).into_proto(),
            Err(diagnostic) => single(diagnostic),
        };
        Ok(Response::new(proto::validate_provider_config::Response { diagnostics }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> Result<Response<proto::validate_resource_config::Response>, Status> {
        let request = request.into_inner();
        let diagnostics = self
            .resource(&request.type_name)
            .and_then(|resource| {
                let config = decode(request.config.as_ref(), "resource configuration")?;
                Ok(resource.validate(&config).into_proto())
            })
            .unwrap_or_else(single);
        Ok(Response::new(proto::validate_resource_config::Response { diagnostics }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> Result<Response<proto::validate_data_resource_config::Response>, Status> {
        let request = request.into_inner();
        let diagnostics = self
            .data_source(&request.type_name)
            .and_then(|data_source| {
                let config = decode(request.config.as_ref(), "data source configuration")?;
                Ok(data_source.validate(&config).into_proto())
            })
            .unwrap_or_else(single);
        Ok(Response::new(proto::validate_data_resource_config::Response { diagnostics }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let request = request.into_inner();
        let result = self.resource(&request.type_name).and_then(|resource| {
            let raw = request.raw_state.unwrap_or_default();
            if raw.json.is_empty() && !raw.flatmap.is_empty() {
                return Err(Diagnostic::error(
                    "Unable to upgrade resource state",
                    "flatmap state from Terraform 0.11 and earlier is not supported",
                ));
            }
            let state = Value::from_json(&raw.json).map_err(|e| {
                Diagnostic::error("Unable to upgrade resource state", e.to_string()).with_bug_report_context()
            })?;
            Ok(resource.schema().conform(state))
        });

        let (upgraded_state, diagnostics) = respond(result);
        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state,
            diagnostics,
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> Result<Response<proto::configure_provider::Response>, Status> {
        let request = request.into_inner();
        tracing::info!(terraform_version = %request.terraform_version, "configuring provider");

        let result = match decode(request.config.as_ref(), "provider configuration") {
            Ok(config) => self.configure(&config).await,
            Err(diagnostic) => Err(diagnostic),
        };
        let diagnostics = result.err().map(single).unwrap_or_default();
        Ok(Response::new(proto::configure_provider::Response { diagnostics }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> Result<Response<proto::read_resource::Response>, Status> {
        let request = request.into_inner();
        tracing::debug!(resource = %request.type_name, "ReadResource");

        let result = match decode(request.current_state.as_ref(), "current state") {
            Ok(current) => self.read_resource_state(&request.type_name, current).await,
            Err(diagnostic) => Err(diagnostic),
        };
        let (new_state, diagnostics) = respond(result);
        Ok(Response::new(proto::read_resource::Response {
            new_state,
            diagnostics,
            private: request.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> Result<Response<proto::plan_resource_change::Response>, Status> {
        let request = request.into_inner();
        tracing::debug!(resource = %request.type_name, "PlanResourceChange");

        let change = self.resource(&request.type_name).and_then(|resource| {
            let prior = decode(request.prior_state.as_ref(), "prior state")?;
            let proposed = decode(request.proposed_new_state.as_ref(), "proposed state")?;
            let config = decode(request.config.as_ref(), "resource configuration")?;
            Ok(plan(&resource.schema(), &prior, proposed, &config))
        });

        let response = match change.and_then(|change| Ok((encode(&change.planned)?, change.requires_replace))) {
            Ok((planned, requires_replace)) => proto::plan_resource_change::Response {
                planned_state: Some(planned),
                requires_replace: requires_replace.into_iter().map(Into::into).collect(),
                planned_private: request.prior_private,
                diagnostics: Vec::new(),
                legacy_type_system: false,
            },
            Err(diagnostic) => proto::plan_resource_change::Response {
                diagnostics: single(diagnostic),
                ..Default::default()
            },
        };
        Ok(Response::new(response))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> Result<Response<proto::apply_resource_change::Response>, Status> {
        let request = request.into_inner();
        tracing::debug!(resource = %request.type_name, "ApplyResourceChange");

        let decoded = decode(request.prior_state.as_ref(), "prior state").and_then(|prior| {
            let planned = decode(request.planned_state.as_ref(), "planned state")?;
            Ok((prior, planned))
        });
        let result = match decoded {
            Ok((prior, planned)) => self.apply(&request.type_name, prior, planned).await,
            Err(diagnostic) => Err(diagnostic),
        };

        let (new_state, diagnostics) = respond(result);
        Ok(Response::new(proto::apply_resource_change::Response {
            new_state,
            private: request.planned_private,
            diagnostics,
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> Result<Response<proto::import_resource_state::Response>, Status> {
        let request = request.into_inner();
        tracing::info!(resource = %request.type_name, id = %request.id, "importing resource");

        let result = self.resource(&request.type_name).and_then(|resource| {
            let state = resource.import(&request.id).map_err(|e| {
                Diagnostic::error(format!("Unable to import {}", request.type_name), e.to_string())
            })?;
            Ok(resource.schema().conform(state))
        });

        let response = match result.and_then(|state| encode(&state)) {
            Ok(state) => proto::import_resource_state::Response {
                imported_resources: vec![proto::import_resource_state::ImportedResource {
                    type_name: request.type_name,
                    state: Some(state),
                    private: Vec::new(),
                }],
                diagnostics: Vec::new(),
            },
            Err(diagnostic) => proto::import_resource_state::Response {
                imported_resources: Vec::new(),
                diagnostics: single(diagnostic),
            },
        };
        Ok(Response::new(response))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> Result<Response<proto::read_data_source::Response>, Status> {
        let request = request.into_inner();
        tracing::debug!(data_source = %request.type_name, "ReadDataSource");

        let result = match decode(request.config.as_ref(), "data source configuration") {
            Ok(config) => self.read_data(&request.type_name, config).await,
            Err(diagnostic) => Err(diagnostic),
        };
        let (state, diagnostics) = respond(result);
        Ok(Response::new(proto::read_data_source::Response { state, diagnostics }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> Result<Response<proto::stop_provider::Response>, Status> {
        // NOTE: requests are not cancellable mid-flight; in-progress calls run to completion.
        tracing::info!("stop requested");
        Ok(Response::new(proto::stop_provider::Response { error: String::new() }))
    }
}
