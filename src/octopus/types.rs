use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// An Octopus REST collection. Space-scoped collections live under
/// `/api/{space}/{path}`, system collections directly under `/api/{path}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub path: &'static str,
    pub space_scoped: bool,
}

impl Collection {
    pub const fn scoped(path: &'static str) -> Self {
        Self {
            path,
            space_scoped: true,
        }
    }

    pub const fn system(path: &'static str) -> Self {
        Self {
            path,
            space_scoped: false,
        }
    }
}

pub const SPACES: Collection = Collection::system("spaces");
pub const ENVIRONMENTS: Collection = Collection::scoped("environments");
pub const PROJECT_GROUPS: Collection = Collection::scoped("projectgroups");
pub const LIFECYCLES: Collection = Collection::scoped("lifecycles");
pub const PROJECTS: Collection = Collection::scoped("projects");
pub const CHANNELS: Collection = Collection::scoped("channels");
pub const LIBRARY_VARIABLE_SETS: Collection = Collection::scoped("libraryvariablesets");
pub const VARIABLES: Collection = Collection::scoped("variables");
pub const ACCOUNTS: Collection = Collection::scoped("accounts");
pub const FEEDS: Collection = Collection::scoped("feeds");
pub const WORKER_POOLS: Collection = Collection::scoped("workerpools");
pub const MACHINES: Collection = Collection::scoped("machines");
pub const TENANTS: Collection = Collection::scoped("tenants");
pub const TAG_SETS: Collection = Collection::scoped("tagsets");

/// A top-level Octopus document with an id and a name.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> Option<&str>;
    fn name(&self) -> &str;
}

macro_rules! document {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Document for $ty {
                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

document!(
    Space,
    Environment,
    ProjectGroup,
    Lifecycle,
    Project,
    Channel,
    LibraryVariableSet,
    Account,
    Feed,
    WorkerPool,
    Machine,
    Tenant,
    TagSet,
);

/// Page envelope returned by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resources<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_results: i64,
    #[serde(default)]
    pub items_per_page: i64,
}

/// Write-only secret as the API expects it. Reads only report `HasValue`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SensitiveValue {
    pub has_value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl SensitiveValue {
    pub fn new(value: Option<String>) -> Self {
        Self {
            has_value: value.is_some(),
            new_value: value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Space {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_default: bool,
    pub task_queue_stopped: bool,
    pub space_managers_teams: Vec<String>,
    pub space_managers_team_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExtensionSetting {
    pub extension_id: String,
    pub values: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: i64,
    pub use_guided_failure: bool,
    pub allow_dynamic_infrastructure: bool,
    pub extension_settings: Vec<ExtensionSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetentionPeriod {
    pub quantity_to_keep: i64,
    pub should_keep_forever: bool,
    pub unit: String,
}

impl Default for RetentionPeriod {
    fn default() -> Self {
        Self {
            quantity_to_keep: 30,
            should_keep_forever: false,
            unit: "Days".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Phase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub automatic_deployment_targets: Vec<String>,
    pub optional_deployment_targets: Vec<String>,
    pub minimum_environments_before_promotion: i64,
    pub is_optional_phase: bool,
    pub release_retention_policy: Option<RetentionPeriod>,
    pub tentacle_retention_policy: Option<RetentionPeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Lifecycle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub phases: Vec<Phase>,
    pub release_retention_policy: Option<RetentionPeriod>,
    pub tentacle_retention_policy: Option<RetentionPeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConnectivityPolicy {
    pub allow_deployments_to_no_targets: bool,
    pub exclude_unhealthy_targets: bool,
    pub skip_machine_behavior: String,
    pub target_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub lifecycle_id: String,
    pub project_group_id: String,
    pub is_disabled: bool,
    pub auto_create_release: bool,
    pub default_guided_failure_mode: String,
    pub default_to_skip_if_already_installed: bool,
    pub discrete_channel_release: bool,
    pub tenanted_deployment_mode: String,
    pub included_library_variable_set_ids: Vec<String>,
    pub project_connectivity_policy: Option<ConnectivityPolicy>,
    pub variable_set_id: String,
    pub deployment_process_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageReference {
    pub deployment_action: String,
    pub package_reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChannelRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version_range: String,
    pub tag: String,
    pub action_packages: Vec<PackageReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Channel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub project_id: String,
    pub lifecycle_id: Option<String>,
    pub is_default: bool,
    pub rules: Vec<ChannelRule>,
    pub tenant_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LibraryVariableSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub content_type: String,
    pub variable_set_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VariableScope {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub role: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub machine: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channel: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tenant_tag: Vec<String>,
}

impl VariableScope {
    pub fn is_empty(&self) -> bool {
        self.environment.is_empty()
            && self.role.is_empty()
            && self.machine.is_empty()
            && self.channel.is_empty()
            && self.action.is_empty()
            && self.tenant_tag.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Variable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "Type")]
    pub variable_type: String,
    pub is_sensitive: bool,
    pub is_editable: bool,
    pub scope: VariableScope,
}

/// The variable document owned by a project or library variable set. It is
/// always read and written whole, so fields this provider does not manage
/// are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VariableSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub owner_id: String,
    pub space_id: String,
    pub version: i64,
    pub variables: Vec<Variable>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Account {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub account_type: String,
    pub environment_ids: Vec<String>,
    pub tenant_ids: Vec<String>,
    pub tenant_tags: Vec<String>,
    pub tenanted_deployment_participation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_directory_endpoint_base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_management_endpoint_base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_bytes: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_management_endpoint_base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_management_endpoint_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_key: Option<SensitiveValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_subject_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Feed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub feed_type: String,
    pub feed_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<SensitiveValue>,
    pub package_acquisition_location_options: Vec<String>,
    pub download_attempts: i64,
    pub download_retry_backoff_seconds: i64,
    pub enhanced_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SensitiveValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WorkerPool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub worker_pool_type: String,
    pub is_default: bool,
    pub sort_order: i64,
    pub can_add_workers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Endpoint {
    pub communication_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_worker_pool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_net_core_platform: Option<String>,
    #[serde(rename = "ClusterUrl", skip_serializing_if = "Option::is_none")]
    pub cluster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "SkipTlsVerification", skip_serializing_if = "Option::is_none")]
    pub skip_tls_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<KubernetesAuthentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<OfflineDropDestination>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct KubernetesAuthentication {
    pub authentication_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OfflineDropDestination {
    pub destination_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_folder_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Machine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub roles: Vec<String>,
    pub environment_ids: Vec<String>,
    pub tenant_ids: Vec<String>,
    pub tenant_tags: Vec<String>,
    pub tenanted_deployment_participation: String,
    pub is_disabled: bool,
    pub machine_policy_id: String,
    pub thumbprint: String,
    pub uri: String,
    pub shell_name: String,
    pub status: String,
    pub health_status: String,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Tenant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub project_environments: BTreeMap<String, Vec<String>>,
    pub tenant_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub canonical_tag_name: String,
    pub color: String,
    pub description: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TagSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub space_id: String,
    pub name: String,
    pub description: String,
    pub sort_order: i64,
    pub tags: Vec<Tag>,
}
