use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, TAG_SETS, TagSet};
use crate::terraform::schema::Schema;
use crate::terraform::value::Value;

pub struct TagSetMapping;

impl Mapping for TagSetMapping {
    type Dto = TagSet;

    const TYPE_NAME: &'static str = "octopusdeploy_tag_set";
    const DISPLAY: &'static str = "tag set";
    const COLLECTION: Collection = TAG_SETS;
    const PLURAL: &'static str = "tag_sets";
    const DATA_SOURCE: &'static str = "octopusdeploy_tag_sets";

    // Tags are managed by octopusdeploy_tag; an update must not drop them.
    const PRESERVE_ON_UPDATE: bool = true;

    fn schema() -> Schema {
        Schema::new(
            "This resource manages tag sets in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
                common::sort_order(Self::DISPLAY),
            ],
        )
    }

    fn expand(value: &Value) -> Result<TagSet, ResourceError> {
        Ok(TagSet {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            sort_order: common::int_or(value, "sort_order", 0),
            tags: Vec::new(),
        })
    }

    fn flatten(set: &TagSet) -> Value {
        Value::object([
            ("id", Value::from(set.id.clone())),
            ("space_id", Value::optional_string(&set.space_id)),
            ("name", Value::from(&set.name)),
            ("description", Value::optional_string(&set.description)),
            ("sort_order", Value::from(set.sort_order)),
        ])
    }

    fn preserve(current: &TagSet, planned: &mut TagSet) {
        planned.tags = current.tags.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octopus::types::Tag;

    #[test]
    fn test_update_keeps_existing_tags() {
        let current = TagSet {
            id: Some("TagSets-1".to_string()),
            name: "Region".to_string(),
            tags: vec![Tag {
                id: Some("TagSets-1/Tags-1".to_string()),
                name: "EU".to_string(),
                color: "#333333".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut planned = TagSetMapping::expand(&Value::object([
            ("id", Value::from("TagSets-1")),
            ("name", Value::from("Regions")),
        ]))
        .unwrap();
        assert!(planned.tags.is_empty());

        TagSetMapping::preserve(&current, &mut planned);
        assert_eq!(planned.name, "Regions");
        assert_eq!(planned.tags, current.tags);
    }

    #[test]
    fn test_flatten_omits_tags() {
        let set = TagSet {
            id: Some("TagSets-1".to_string()),
            name: "Region".to_string(),
            sort_order: 3,
            ..Default::default()
        };
        let value = TagSetMapping::flatten(&set);
        assert_eq!(value.get_i64("sort_order"), Some(3));
        assert!(value.get("tags").is_null());
    }
}
