use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, LIBRARY_VARIABLE_SETS, LibraryVariableSet};
use crate::terraform::schema::{Attribute, Schema};
use crate::terraform::value::Value;

const CONTENT_TYPE: &str = "Variables";

pub struct LibraryVariableSetMapping;

impl Mapping for LibraryVariableSetMapping {
    type Dto = LibraryVariableSet;

    const TYPE_NAME: &'static str = "octopusdeploy_library_variable_set";
    const DISPLAY: &'static str = "library variable set";
    const COLLECTION: Collection = LIBRARY_VARIABLE_SETS;
    const PLURAL: &'static str = "library_variable_sets";
    const DATA_SOURCE: &'static str = "octopusdeploy_library_variable_sets";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages library variable sets in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
                Attribute::string("variable_set_id")
                    .computed()
                    .use_state_for_unknown()
                    .description("The ID of the variable set holding this library's variables."),
            ],
        )
    }

    fn expand(value: &Value) -> Result<LibraryVariableSet, ResourceError> {
        Ok(LibraryVariableSet {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            content_type: CONTENT_TYPE.to_string(),
            variable_set_id: common::string_or_empty(value, "variable_set_id"),
        })
    }

    fn flatten(set: &LibraryVariableSet) -> Value {
        Value::object([
            ("id", Value::from(set.id.clone())),
            ("space_id", Value::optional_string(&set.space_id)),
            ("name", Value::from(&set.name)),
            ("description", Value::optional_string(&set.description)),
            ("variable_set_id", Value::optional_string(&set.variable_set_id)),
        ])
    }
}
