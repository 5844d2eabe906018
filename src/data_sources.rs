mod filtered;
mod list;
mod space;

use std::sync::Arc;

use async_trait::async_trait;

use crate::octopus::OctopusClient;
use crate::resources::{
    ChannelMapping, EnvironmentMapping, LibraryVariableSetMapping, LifecycleMapping, ProjectGroupMapping,
    ProjectMapping, ResourceError, SpaceMapping, TagSetMapping, TenantMapping,
};
use crate::terraform::diagnostics::Diagnostics;
use crate::terraform::schema::Schema;
use crate::terraform::value::Value;

pub use filtered::{AccountListing, FeedListing, TargetListing, WorkerPoolListing};
pub use list::{ListDataSource, Listing, Mapped};
pub use space::SpaceDataSource;

/// A read-only lookup. The returned value carries the configuration back
/// with the computed attributes filled in.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn validate(&self, config: &Value) -> Diagnostics {
        self.schema().validate(config)
    }

    async fn read(&self, client: &OctopusClient, config: &Value) -> Result<Value, ResourceError>;
}

fn listing<L: Listing>() -> Arc<dyn DataSource> {
    Arc::new(ListDataSource::<L>::default())
}

/// Every data source this provider serves.
pub fn all() -> Vec<Arc<dyn DataSource>> {
    vec![
        listing::<Mapped<SpaceMapping>>(),
        Arc::new(SpaceDataSource),
        listing::<Mapped<EnvironmentMapping>>(),
        listing::<Mapped<ProjectGroupMapping>>(),
        listing::<Mapped<ProjectMapping>>(),
        listing::<Mapped<LifecycleMapping>>(),
        listing::<Mapped<ChannelMapping>>(),
        listing::<Mapped<LibraryVariableSetMapping>>(),
        listing::<Mapped<TenantMapping>>(),
        listing::<Mapped<TagSetMapping>>(),
        listing::<FeedListing>(),
        listing::<AccountListing>(),
        listing::<WorkerPoolListing>(),
        listing::<TargetListing>(),
    ]
}

pub fn find(type_name: &str) -> Result<Arc<dyn DataSource>, ResourceError> {
    all()
        .into_iter()
        .find(|d| d.type_name() == type_name)
        .ok_or_else(|| ResourceError::UnknownDataSource(type_name.to_string()))
}
