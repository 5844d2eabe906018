use async_trait::async_trait;

use super::common;
use super::{Crud, Mapping, Resource, ResourceError};
use crate::octopus::OctopusClient;
use crate::octopus::types::{Collection, SPACES, Space};
use crate::terraform::diagnostics::Diagnostics;
use crate::terraform::schema::{Attribute, Schema};
use crate::terraform::value::Value;

/// Octopus adds a managers team per space on its own; it never belongs in state.
const GENERATED_TEAM_PREFIX: &str = "teams-spacemanagers-";
const ADMINISTRATORS_TEAM: &str = "teams-administrators";

pub struct SpaceMapping;

impl Mapping for SpaceMapping {
    type Dto = Space;

    const TYPE_NAME: &'static str = "octopusdeploy_space";
    const DISPLAY: &'static str = "space";
    const COLLECTION: Collection = SPACES;
    const PLURAL: &'static str = "spaces";
    const DATA_SOURCE: &'static str = "octopusdeploy_spaces";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages spaces in Octopus Deploy.",
            vec![
                common::id(),
                common::name(Self::DISPLAY),
                common::slug(Self::DISPLAY),
                common::description(Self::DISPLAY),
                Attribute::bool("is_default")
                    .default(false)
                    .description("Specifies if this is the default space."),
                Attribute::bool("is_task_queue_stopped")
                    .default(false)
                    .description("Specifies the status of the task queue for this space."),
                Attribute::string_set("space_managers_teams")
                    .optional()
                    .computed()
                    .description("A list of team IDs designated to be managers of this space."),
                Attribute::string_set("space_managers_team_members")
                    .optional()
                    .computed()
                    .description("A list of user IDs designated to be managers of this space."),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Space, ResourceError> {
        let mut teams = value.get_strings("space_managers_teams");
        let members = value.get_strings("space_managers_team_members");
        if teams.is_empty() && members.is_empty() {
            teams.push(ADMINISTRATORS_TEAM.to_string());
        }

        Ok(Space {
            id: value.get_non_empty("id"),
            name: common::string_or_empty(value, "name"),
            slug: common::string_or_empty(value, "slug"),
            description: common::string_or_empty(value, "description"),
            is_default: common::bool_or(value, "is_default", false),
            task_queue_stopped: common::bool_or(value, "is_task_queue_stopped", false),
            space_managers_teams: teams,
            space_managers_team_members: members,
        })
    }

    fn flatten(space: &Space) -> Value {
        let teams = space
            .space_managers_teams
            .iter()
            .filter(|team| !team.starts_with(GENERATED_TEAM_PREFIX));

        Value::object([
            ("id", Value::from(space.id.clone())),
            ("name", Value::from(&space.name)),
            ("slug", Value::optional_string(&space.slug)),
            ("description", Value::optional_string(&space.description)),
            ("is_default", Value::from(space.is_default)),
            ("is_task_queue_stopped", Value::from(space.task_queue_stopped)),
            ("space_managers_teams", Value::strings(teams)),
            ("space_managers_team_members", Value::strings(&space.space_managers_team_members)),
        ])
    }
}

/// Spaces are plain collection CRUD except for delete: Octopus refuses to
/// remove a space whose task queue is still running.
#[derive(Default)]
pub struct SpaceResource {
    inner: Crud<SpaceMapping>,
}

#[async_trait]
impl Resource for SpaceResource {
    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    fn schema(&self) -> Schema {
        self.inner.schema()
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        self.inner.validate(config)
    }

    async fn create(&self, client: &OctopusClient, plan: &Value) -> Result<Value, ResourceError> {
        self.inner.create(client, plan).await
    }

    async fn read(&self, client: &OctopusClient, state: &Value) -> Result<Value, ResourceError> {
        self.inner.read(client, state).await
    }

    async fn update(
        &self,
        client: &OctopusClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ResourceError> {
        self.inner.update(client, prior, plan).await
    }

    async fn delete(&self, client: &OctopusClient, state: &Value) -> Result<(), ResourceError> {
        let id = common::required_id(state)?;

        let mut space: Space = client.get(SPACES, None, id).await?;
        if !space.task_queue_stopped {
            tracing::info!(id, "stopping task queue before deleting space");
            space.task_queue_stopped = true;
            let _: Space = client.update(SPACES, None, id, &space).await?;
        }

        tracing::info!(resource = SpaceMapping::TYPE_NAME, id, "deleting space");
        client.delete(SPACES, None, id).await?;
        Ok(())
    }
}
