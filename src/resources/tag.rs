use async_trait::async_trait;

use super::common;
use super::{Resource, ResourceError};
use crate::mutex::KeyedMutex;
use crate::octopus::types::{TAG_SETS, Tag, TagSet};
use crate::octopus::{OctopusClient, OctopusError};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const TYPE_NAME: &str = "octopusdeploy_tag";

/// A tag lives inside its tag set document; every change is a
/// read-modify-write of the parent under the keyed mutex for its id.
pub struct TagResource;

struct Parent {
    id: String,
    space: Option<String>,
}

impl Parent {
    fn of(value: &Value) -> Result<Self, ResourceError> {
        let id = value
            .get_non_empty("tag_set_id")
            .ok_or_else(|| ResourceError::InvalidConfig("tag_set_id must be configured".to_string()))?;
        Ok(Self {
            id,
            space: value.get_non_empty("tag_set_space_id"),
        })
    }

    async fn fetch(&self, client: &OctopusClient) -> Result<TagSet, ResourceError> {
        Ok(client.get(TAG_SETS, self.space.as_deref(), &self.id).await?)
    }

    async fn save(&self, client: &OctopusClient, set: &TagSet) -> Result<TagSet, ResourceError> {
        Ok(client.update(TAG_SETS, self.space.as_deref(), &self.id, set).await?)
    }
}

fn expand(value: &Value) -> Tag {
    Tag {
        id: value.get_non_empty("id"),
        name: common::string_or_empty(value, "name"),
        canonical_tag_name: String::new(),
        color: common::string_or_empty(value, "color"),
        description: common::string_or_empty(value, "description"),
        sort_order: common::int_or(value, "sort_order", 0),
    }
}

fn flatten(set: &TagSet, tag: &Tag) -> Value {
    Value::object([
        ("id", Value::from(tag.id.clone())),
        ("tag_set_id", Value::from(set.id.clone())),
        ("tag_set_space_id", Value::optional_string(&set.space_id)),
        ("name", Value::from(&tag.name)),
        ("canonical_tag_name", Value::optional_string(&tag.canonical_tag_name)),
        ("color", Value::from(&tag.color)),
        ("description", Value::optional_string(&tag.description)),
        ("sort_order", Value::from(tag.sort_order)),
    ])
}

fn find<'a>(set: &'a TagSet, id: &str) -> Option<&'a Tag> {
    set.tags.iter().find(|tag| tag.id.as_deref() == Some(id))
}

fn not_found(parent: &Parent, id: &str) -> ResourceError {
    OctopusError::NotFound {
        resource: format!("{}/{}/{}", TAG_SETS.path, parent.id, id),
    }
    .into()
}

#[async_trait]
impl Resource for TagResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "This resource manages tags in Octopus Deploy.",
            vec![
                common::id(),
                Attribute::string("tag_set_id")
                    .required()
                    .force_new()
                    .validate(Validator::NotEmpty)
                    .description("The ID of the associated tag set."),
                Attribute::string("tag_set_space_id")
                    .optional()
                    .computed()
                    .force_new()
                    .use_state_for_unknown()
                    .description("The space ID of the associated tag set."),
                common::name("tag"),
                Attribute::string("canonical_tag_name")
                    .computed()
                    .description("The canonical name of the tag, in the form TagSetName/TagName."),
                Attribute::string("color")
                    .required()
                    .validate(Validator::NotEmpty)
                    .description("The color of the tag, e.g. #6e6e6e."),
                common::description("tag"),
                common::sort_order("tag"),
            ],
        )
    }

    async fn create(&self, client: &OctopusClient, plan: &Value) -> Result<Value, ResourceError> {
        let parent = Parent::of(plan)?;
        let tag = expand(plan);
        tracing::info!(resource = TYPE_NAME, tag_set = %parent.id, name = %tag.name, "creating tag");

        let _guard = KeyedMutex::global().lock(&parent.id).await;
        let mut set = parent.fetch(client).await?;
        set.tags.push(Tag { id: None, ..tag.clone() });

        let saved = parent.save(client, &set).await?;
        let created = saved
            .tags
            .iter()
            .find(|t| t.name == tag.name)
            .ok_or_else(|| ResourceError::MissingAfterSave {
                kind: "tag",
                name: tag.name.clone(),
                parent: parent.id.clone(),
            })?;
        tracing::info!(
            resource = TYPE_NAME,
            id = created.id.as_deref().unwrap_or_default(),
            "tag created"
        );
        Ok(flatten(&saved, created))
    }

    async fn read(&self, client: &OctopusClient, state: &Value) -> Result<Value, ResourceError> {
        let id = common::required_id(state)?;
        let parent = Parent::of(state)?;
        tracing::debug!(resource = TYPE_NAME, id, tag_set = %parent.id, "reading tag");

        let set = parent.fetch(client).await?;
        let tag = find(&set, id).ok_or_else(|| not_found(&parent, id))?;
        Ok(flatten(&set, tag))
    }

    async fn update(
        &self,
        client: &OctopusClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ResourceError> {
        let id = common::required_id(prior)?;
        let parent = Parent::of(plan)?;
        tracing::info!(resource = TYPE_NAME, id, tag_set = %parent.id, "updating tag");

        let _guard = KeyedMutex::global().lock(&parent.id).await;
        let mut set = parent.fetch(client).await?;
        let slot = set
            .tags
            .iter_mut()
            .find(|tag| tag.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(&parent, id))?;
        *slot = Tag {
            id: Some(id.to_string()),
            ..expand(plan)
        };

        let saved = parent.save(client, &set).await?;
        let updated = find(&saved, id).ok_or_else(|| ResourceError::MissingAfterSave {
            kind: "tag",
            name: id.to_string(),
            parent: parent.id.clone(),
        })?;
        Ok(flatten(&saved, updated))
    }

    async fn delete(&self, client: &OctopusClient, state: &Value) -> Result<(), ResourceError> {
        let id = common::required_id(state)?;
        let parent = Parent::of(state)?;
        tracing::info!(resource = TYPE_NAME, id, tag_set = %parent.id, "deleting tag");

        let _guard = KeyedMutex::global().lock(&parent.id).await;
        let mut set = match parent.fetch(client).await {
            Ok(set) => set,
            // The tag set went first; its tags went with it.
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        let before = set.tags.len();
        set.tags.retain(|tag| tag.id.as_deref() != Some(id));
        if set.tags.len() == before {
            return Ok(());
        }
        parent.save(client, &set).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ResourceError> {
        match id.split_once('/') {
            Some((tag_set, tag)) if tag_set.starts_with("TagSets-") && !tag.is_empty() => Ok(Value::object([
                ("id", Value::from(id)),
                ("tag_set_id", Value::from(tag_set)),
            ])),
            _ => Err(ResourceError::InvalidConfig(format!(
                "{TYPE_NAME} import must be in the form of TagSets-1/Tags-1, got '{id}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_derives_tag_set() {
        let state = TagResource.import("TagSets-3/Tags-12").unwrap();
        assert_eq!(state.get_str("id"), Some("TagSets-3/Tags-12"));
        assert_eq!(state.get_str("tag_set_id"), Some("TagSets-3"));
        assert!(TagResource.import("Tags-12").is_err());
        assert!(TagResource.import("TagSets-3/").is_err());
    }

    #[test]
    fn test_parent_requires_tag_set_id() {
        assert!(Parent::of(&Value::object([("name", Value::from("EU"))])).is_err());
        let parent = Parent::of(&Value::object([
            ("tag_set_id", Value::from("TagSets-1")),
            ("tag_set_space_id", Value::Unknown),
        ]))
        .unwrap();
        assert_eq!(parent.id, "TagSets-1");
        assert!(parent.space.is_none());
    }

    #[test]
    fn test_flatten_from_parent() {
        let set: TagSet = serde_json::from_value(serde_json::json!({
            "Id": "TagSets-1",
            "SpaceId": "Spaces-1",
            "Name": "Region",
            "Tags": [
                {"Id": "TagSets-1/Tags-1", "Name": "EU", "CanonicalTagName": "Region/EU", "Color": "#333333", "SortOrder": 0},
                {"Id": "TagSets-1/Tags-2", "Name": "US", "CanonicalTagName": "Region/US", "Color": "#6e6e6e", "SortOrder": 1}
            ]
        }))
        .unwrap();
        let tag = find(&set, "TagSets-1/Tags-2").unwrap();
        let value = flatten(&set, tag);
        assert_eq!(value.get_str("canonical_tag_name"), Some("Region/US"));
        assert_eq!(value.get_str("tag_set_space_id"), Some("Spaces-1"));
        assert_eq!(value.get_i64("sort_order"), Some(1));
        assert!(find(&set, "TagSets-1/Tags-9").is_none());
    }
}
