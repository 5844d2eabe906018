pub(crate) mod account;
mod channel;
pub(crate) mod common;
pub(crate) mod deployment_target;
mod environment;
pub(crate) mod feed;
mod library_variable_set;
mod lifecycle;
mod project;
mod project_group;
mod space;
mod tag;
mod tag_set;
mod tenant;
mod variable;
pub(crate) mod worker_pool;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::mutex::KeyedMutex;
use crate::octopus::types::{Collection, Document};
use crate::octopus::{OctopusClient, OctopusError};
use crate::terraform::diagnostics::Diagnostics;
use crate::terraform::schema::Schema;
use crate::terraform::value::{Value, ValueError};

pub use account::{
    AccountKind, AccountMapping, AmazonWebServicesAccount, AzureServicePrincipal, AzureSubscriptionAccount,
    GenericOidcAccount, GoogleCloudAccount, SshKeyAccount, TokenAccount, UsernamePasswordAccount,
};
pub use channel::ChannelMapping;
pub use deployment_target::{
    CloudRegion, KubernetesCluster, ListeningTentacle, OfflinePackageDrop, PollingTentacle, SshConnection, TargetKind,
    TargetMapping,
};
pub use environment::EnvironmentMapping;
pub use feed::{
    ArtifactoryGenericFeed, AwsElasticContainerRegistry, DockerContainerRegistry, FeedKind, FeedMapping,
    GitHubRepositoryFeed, HelmFeed, MavenFeed, NuGetFeed,
};
pub use library_variable_set::LibraryVariableSetMapping;
pub use lifecycle::LifecycleMapping;
pub use project::ProjectMapping;
pub use project_group::ProjectGroupMapping;
pub use space::{SpaceMapping, SpaceResource};
pub use tag::TagResource;
pub use tag_set::TagSetMapping;
pub use tenant::TenantMapping;
pub use variable::VariableResource;
pub use worker_pool::{DynamicWorkerPool, StaticWorkerPool, WorkerPoolKind, WorkerPoolMapping};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    #[error("unknown data source type: {0}")]
    UnknownDataSource(String),

    #[error("the provider has not been configured")]
    NotConfigured,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{collection} '{id}' has {field} '{actual}', expected '{expected}'")]
    UnexpectedKind {
        collection: &'static str,
        id: String,
        field: &'static str,
        actual: String,
        expected: &'static str,
    },

    #[error("unable to locate {kind} '{name}' in {parent} after saving it")]
    MissingAfterSave {
        kind: &'static str,
        name: String,
        parent: String,
    },

    #[error(transparent)]
    Octopus(#[from] OctopusError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ResourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::Octopus(e) if e.is_not_found())
    }
}

/// A managed resource type. Implementations return the object as the API
/// reports it; reconciling that with what Terraform planned happens in the
/// protocol layer.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn validate(&self, config: &Value) -> Diagnostics {
        self.schema().validate(config)
    }

    async fn create(&self, client: &OctopusClient, plan: &Value) -> Result<Value, ResourceError>;

    async fn read(&self, client: &OctopusClient, state: &Value) -> Result<Value, ResourceError>;

    async fn update(
        &self,
        client: &OctopusClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ResourceError>;

    async fn delete(&self, client: &OctopusClient, state: &Value) -> Result<(), ResourceError>;

    /// State seeded from an import ID; a read follows to fill the rest.
    fn import(&self, id: &str) -> Result<Value, ResourceError> {
        Ok(Value::object([("id", Value::from(id))]))
    }
}

/// Expand/flatten between Terraform values and one Octopus document type.
pub trait Mapping: Send + Sync + 'static {
    type Dto: Document;

    const TYPE_NAME: &'static str;
    /// Singular noun used in descriptions and logs.
    const DISPLAY: &'static str;
    const COLLECTION: Collection;
    /// Name of the result list in the matching list data source.
    const PLURAL: &'static str;
    const DATA_SOURCE: &'static str;

    /// Updates first read the current document and keep what `preserve`
    /// copies out of it, under the keyed mutex for the document id.
    const PRESERVE_ON_UPDATE: bool = false;

    fn schema() -> Schema;

    fn expand(value: &Value) -> Result<Self::Dto, ResourceError>;

    fn flatten(dto: &Self::Dto) -> Value;

    fn validate(config: &Value) -> Diagnostics {
        Self::schema().validate(config)
    }

    /// Rejects documents of a different kind sharing the same collection.
    fn check(_dto: &Self::Dto) -> Result<(), ResourceError> {
        Ok(())
    }

    fn preserve(_current: &Self::Dto, _planned: &mut Self::Dto) {}
}

/// Plain collection CRUD: expand, POST or PUT, flatten.
pub struct Crud<M>(PhantomData<fn() -> M>);

impl<M> Default for Crud<M> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<M: Mapping> Resource for Crud<M> {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        M::schema()
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        M::validate(config)
    }

    async fn create(&self, client: &OctopusClient, plan: &Value) -> Result<Value, ResourceError> {
        let space = common::space_of(plan);
        let dto = M::expand(plan)?;
        tracing::info!(resource = M::TYPE_NAME, name = %dto.name(), "creating {}", M::DISPLAY);

        let created = client.create(M::COLLECTION, space.as_deref(), &dto).await?;
        M::check(&created)?;
        tracing::info!(
            resource = M::TYPE_NAME,
            id = created.id().unwrap_or_default(),
            "{} created",
            M::DISPLAY
        );
        Ok(M::flatten(&created))
    }

    async fn read(&self, client: &OctopusClient, state: &Value) -> Result<Value, ResourceError> {
        let id = common::required_id(state)?;
        let space = common::space_of(state);
        tracing::debug!(resource = M::TYPE_NAME, id, "reading {}", M::DISPLAY);

        let dto: M::Dto = client.get(M::COLLECTION, space.as_deref(), id).await?;
        M::check(&dto)?;
        Ok(M::flatten(&dto))
    }

    async fn update(
        &self,
        client: &OctopusClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ResourceError> {
        let id = common::required_id(prior)?;
        let space = common::space_of(plan);
        let mut dto = M::expand(plan)?;
        tracing::info!(resource = M::TYPE_NAME, id, "updating {}", M::DISPLAY);

        let updated = if M::PRESERVE_ON_UPDATE {
            let _guard = KeyedMutex::global().lock(id).await;
            let current: M::Dto = client.get(M::COLLECTION, space.as_deref(), id).await?;
            M::preserve(&current, &mut dto);
            client.update(M::COLLECTION, space.as_deref(), id, &dto).await?
        } else {
            client.update(M::COLLECTION, space.as_deref(), id, &dto).await?
        };
        M::check(&updated)?;
        Ok(M::flatten(&updated))
    }

    async fn delete(&self, client: &OctopusClient, state: &Value) -> Result<(), ResourceError> {
        let id = common::required_id(state)?;
        let space = common::space_of(state);
        tracing::info!(resource = M::TYPE_NAME, id, "deleting {}", M::DISPLAY);

        client.delete(M::COLLECTION, space.as_deref(), id).await?;
        Ok(())
    }
}

fn crud<M: Mapping>() -> Arc<dyn Resource> {
    Arc::new(Crud::<M>::default())
}

/// Every managed resource type this provider serves.
pub fn all() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(SpaceResource::default()),
        crud::<EnvironmentMapping>(),
        crud::<ProjectGroupMapping>(),
        crud::<LifecycleMapping>(),
        crud::<ProjectMapping>(),
        crud::<ChannelMapping>(),
        crud::<LibraryVariableSetMapping>(),
        Arc::new(VariableResource),
        crud::<AccountMapping<UsernamePasswordAccount>>(),
        crud::<AccountMapping<TokenAccount>>(),
        crud::<AccountMapping<AmazonWebServicesAccount>>(),
        crud::<AccountMapping<AzureServicePrincipal>>(),
        crud::<AccountMapping<AzureSubscriptionAccount>>(),
        crud::<AccountMapping<SshKeyAccount>>(),
        crud::<AccountMapping<GoogleCloudAccount>>(),
        crud::<AccountMapping<GenericOidcAccount>>(),
        crud::<FeedMapping<NuGetFeed>>(),
        crud::<FeedMapping<DockerContainerRegistry>>(),
        crud::<FeedMapping<HelmFeed>>(),
        crud::<FeedMapping<MavenFeed>>(),
        crud::<FeedMapping<GitHubRepositoryFeed>>(),
        crud::<FeedMapping<ArtifactoryGenericFeed>>(),
        crud::<FeedMapping<AwsElasticContainerRegistry>>(),
        crud::<WorkerPoolMapping<StaticWorkerPool>>(),
        crud::<WorkerPoolMapping<DynamicWorkerPool>>(),
        crud::<TargetMapping<CloudRegion>>(),
        crud::<TargetMapping<ListeningTentacle>>(),
        crud::<TargetMapping<PollingTentacle>>(),
        crud::<TargetMapping<SshConnection>>(),
        crud::<TargetMapping<KubernetesCluster>>(),
        crud::<TargetMapping<OfflinePackageDrop>>(),
        crud::<TenantMapping>(),
        crud::<TagSetMapping>(),
        Arc::new(TagResource),
    ]
}

pub fn find(type_name: &str) -> Result<Arc<dyn Resource>, ResourceError> {
    all()
        .into_iter()
        .find(|r| r.type_name() == type_name)
        .ok_or_else(|| ResourceError::UnknownResource(type_name.to_string()))
}
