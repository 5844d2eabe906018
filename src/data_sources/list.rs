use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;

use super::DataSource;
use crate::octopus::types::{Collection, DEFAULT_PAGE_SIZE, Document, Resources};
use crate::octopus::{ListQuery, OctopusClient};
use crate::resources::common;
use crate::resources::{Mapping, ResourceError};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

/// A paged collection exposed as a list data source.
pub trait Listing: Send + Sync + 'static {
    type Dto: Document;

    const TYPE_NAME: &'static str;
    const DISPLAY: &'static str;
    const COLLECTION: Collection;
    /// Attribute holding the results.
    const PLURAL: &'static str;

    /// Shape of one result, all computed.
    fn item_attributes() -> Vec<Attribute>;

    fn flatten(dto: &Self::Dto) -> Value;

    /// Extra query arguments beyond the shared paging and name filters.
    fn filters() -> Vec<Attribute> {
        Vec::new()
    }

    fn query(_config: &Value, _query: &mut ListQuery) {}
}

/// Lists the documents of any resource mapping, using its schema.
pub struct Mapped<M>(PhantomData<fn() -> M>);

impl<M: Mapping> Listing for Mapped<M> {
    type Dto = M::Dto;

    const TYPE_NAME: &'static str = M::DATA_SOURCE;
    const DISPLAY: &'static str = M::DISPLAY;
    const COLLECTION: Collection = M::COLLECTION;
    const PLURAL: &'static str = M::PLURAL;

    fn item_attributes() -> Vec<Attribute> {
        M::schema().as_data_source()
    }

    fn flatten(dto: &M::Dto) -> Value {
        M::flatten(dto)
    }
}

pub struct ListDataSource<L>(PhantomData<fn() -> L>);

impl<L> Default for ListDataSource<L> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

/// Data sources get a fresh id on every read.
pub(crate) fn timestamp_id() -> Value {
    Value::from(Utc::now().to_rfc3339())
}

fn query_of(config: &Value) -> ListQuery {
    ListQuery {
        skip: config.get_i64("skip"),
        take: Some(config.get_i64("take").unwrap_or(DEFAULT_PAGE_SIZE)),
        ids: config.get_strings("ids"),
        partial_name: config.get_non_empty("partial_name"),
        filters: Vec::new(),
    }
}

#[async_trait]
impl<L: Listing> DataSource for ListDataSource<L> {
    fn type_name(&self) -> &'static str {
        L::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![
            Attribute::string("id")
                .computed()
                .description("An auto-generated identifier that includes the timestamp when this data source was last modified."),
        ];
        if L::COLLECTION.space_scoped {
            attributes.push(
                Attribute::string("space_id")
                    .optional()
                    .description("The space ID to query. Defaults to the provider's space."),
            );
        }
        attributes.extend([
            common::string_list("ids", "A filter to search by a list of IDs."),
            Attribute::string("partial_name")
                .optional()
                .description("A filter to search by a partial name."),
            Attribute::int("skip")
                .optional()
                .validate(Validator::AtLeast(0))
                .description("A filter to specify the number of items to skip in the response."),
            Attribute::int("take")
                .optional()
                .validate(Validator::AtLeast(1))
                .description("A filter to specify the number of items to take (or return) in the response."),
        ]);
        attributes.extend(L::filters());
        attributes.push(
            Attribute::list_nested(L::PLURAL, L::item_attributes())
                .computed()
                .description(format!("A list of {} that match the filter(s).", L::DISPLAY)),
        );

        Schema::new(format!("Provides information about existing {}s.", L::DISPLAY), attributes)
    }

    async fn read(&self, client: &OctopusClient, config: &Value) -> Result<Value, ResourceError> {
        let space = common::space_of(config);
        let mut query = query_of(config);
        L::query(config, &mut query);
        tracing::debug!(data_source = L::TYPE_NAME, ?query, "listing {}s", L::DISPLAY);

        let page: Resources<L::Dto> = client.list(L::COLLECTION, space.as_deref(), &query).await?;
        tracing::debug!(
            data_source = L::TYPE_NAME,
            count = page.items.len(),
            total = page.total_results,
            "listed {}s",
            L::DISPLAY
        );

        let mut state = config.clone();
        state.set("id", timestamp_id());
        state.set(L::PLURAL, Value::List(page.items.iter().map(L::flatten).collect()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{EnvironmentMapping, SpaceMapping};

    #[test]
    fn test_mapped_schema_uses_resource_attributes() {
        let source = ListDataSource::<Mapped<EnvironmentMapping>>::default();
        assert_eq!(source.type_name(), "octopusdeploy_environments");
        let schema = source.schema();
        let environments = schema.attribute("environments").unwrap();
        assert!(environments.computed && !environments.optional);
        let nested = environments.nested_attributes().unwrap();
        assert!(nested.iter().any(|a| a.name == "allow_dynamic_infrastructure"));
        assert!(nested.iter().all(|a| a.computed && !a.required && !a.optional));
        assert!(schema.attribute("space_id").is_some());
    }

    #[test]
    fn test_system_collections_take_no_space() {
        let schema = ListDataSource::<Mapped<SpaceMapping>>::default().schema();
        assert!(schema.attribute("space_id").is_none());
        assert!(schema.attribute("spaces").is_some());
    }

    #[test]
    fn test_query_defaults_take() {
        let query = query_of(&Value::object([
            ("partial_name", Value::from("Prod")),
            ("ids", Value::strings(["Environments-1"])),
            ("take", Value::Null),
        ]));
        assert_eq!(query.take, Some(100));
        assert_eq!(query.skip, None);
        assert_eq!(query.partial_name.as_deref(), Some("Prod"));
        assert_eq!(query.ids, vec!["Environments-1"]);
    }

    #[test]
    fn test_timestamp_id_is_rfc3339() {
        let id = timestamp_id();
        let id = id.as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(id).is_ok());
    }
}
