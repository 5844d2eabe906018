use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, PROJECT_GROUPS, ProjectGroup};
use crate::terraform::schema::Schema;
use crate::terraform::value::Value;

pub struct ProjectGroupMapping;

impl Mapping for ProjectGroupMapping {
    type Dto = ProjectGroup;

    const TYPE_NAME: &'static str = "octopusdeploy_project_group";
    const DISPLAY: &'static str = "project group";
    const COLLECTION: Collection = PROJECT_GROUPS;
    const PLURAL: &'static str = "project_groups";
    const DATA_SOURCE: &'static str = "octopusdeploy_project_groups";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages project groups in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
            ],
        )
    }

    fn expand(value: &Value) -> Result<ProjectGroup, ResourceError> {
        Ok(ProjectGroup {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
        })
    }

    fn flatten(group: &ProjectGroup) -> Value {
        Value::object([
            ("id", Value::from(group.id.clone())),
            ("space_id", Value::optional_string(&group.space_id)),
            ("name", Value::from(&group.name)),
            ("description", Value::optional_string(&group.description)),
        ])
    }
}
