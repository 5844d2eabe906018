//! List data sources over collections that mix several document kinds.

use super::list::Listing;
use crate::octopus::ListQuery;
use crate::octopus::types::{ACCOUNTS, Account, Collection, FEEDS, Feed, MACHINES, Machine, WORKER_POOLS, WorkerPool};
use crate::resources::{account, common, deployment_target, feed, worker_pool};
use crate::terraform::schema::{Attribute, Validator};
use crate::terraform::value::Value;

const FEED_TYPES: &[&str] = &[
    "ArtifactoryGeneric",
    "AwsElasticContainerRegistry",
    "BuiltIn",
    "Docker",
    "GitHub",
    "Helm",
    "Maven",
    "NuGet",
    "OctopusProject",
];

const ACCOUNT_TYPES: &[&str] = &[
    "AmazonWebServicesAccount",
    "AmazonWebServicesRoleAccount",
    "AzureServicePrincipal",
    "AzureSubscription",
    "GenericOidcAccount",
    "GoogleCloudAccount",
    "None",
    "SshKeyPair",
    "Token",
    "UsernamePassword",
];

const HEALTH_STATUSES: &[&str] = &["HasWarnings", "Healthy", "Unavailable", "Unhealthy", "Unknown"];

const COMMUNICATION_STYLES: &[&str] = &[
    "AzureCloudService",
    "AzureServiceFabricCluster",
    "AzureWebApp",
    "Kubernetes",
    "None",
    "OfflineDrop",
    "Ssh",
    "TentacleActive",
    "TentaclePassive",
];

fn push_list(query: &mut ListQuery, param: &'static str, values: Vec<String>) {
    if !values.is_empty() {
        query.filters.push((param, values.join(",")));
    }
}

pub struct FeedListing;

impl Listing for FeedListing {
    type Dto = Feed;

    const TYPE_NAME: &'static str = "octopusdeploy_feeds";
    const DISPLAY: &'static str = "feed";
    const COLLECTION: Collection = FEEDS;
    const PLURAL: &'static str = "feeds";

    fn item_attributes() -> Vec<Attribute> {
        feed::summary_attributes()
    }

    fn flatten(dto: &Feed) -> Value {
        feed::flatten_summary(dto)
    }

    fn filters() -> Vec<Attribute> {
        vec![
            Attribute::string("feed_type")
                .optional()
                .validate(Validator::OneOf(FEED_TYPES))
                .description("A filter to search by feed type."),
        ]
    }

    fn query(config: &Value, query: &mut ListQuery) {
        if let Some(feed_type) = config.get_non_empty("feed_type") {
            query.filters.push(("feedType", feed_type));
        }
    }
}

pub struct AccountListing;

impl Listing for AccountListing {
    type Dto = Account;

    const TYPE_NAME: &'static str = "octopusdeploy_accounts";
    const DISPLAY: &'static str = "account";
    const COLLECTION: Collection = ACCOUNTS;
    const PLURAL: &'static str = "accounts";

    fn item_attributes() -> Vec<Attribute> {
        account::summary_attributes()
    }

    fn flatten(dto: &Account) -> Value {
        account::flatten_summary(dto)
    }

    fn filters() -> Vec<Attribute> {
        vec![
            Attribute::string("account_type")
                .optional()
                .validate(Validator::OneOf(ACCOUNT_TYPES))
                .description("A filter to search by account type."),
        ]
    }

    fn query(config: &Value, query: &mut ListQuery) {
        if let Some(account_type) = config.get_non_empty("account_type") {
            query.filters.push(("accountType", account_type));
        }
    }
}

pub struct WorkerPoolListing;

impl Listing for WorkerPoolListing {
    type Dto = WorkerPool;

    const TYPE_NAME: &'static str = "octopusdeploy_worker_pools";
    const DISPLAY: &'static str = "worker pool";
    const COLLECTION: Collection = WORKER_POOLS;
    const PLURAL: &'static str = "worker_pools";

    fn item_attributes() -> Vec<Attribute> {
        worker_pool::summary_attributes()
    }

    fn flatten(dto: &WorkerPool) -> Value {
        worker_pool::flatten_summary(dto)
    }
}

pub struct TargetListing;

impl Listing for TargetListing {
    type Dto = Machine;

    const TYPE_NAME: &'static str = "octopusdeploy_deployment_targets";
    const DISPLAY: &'static str = "deployment target";
    const COLLECTION: Collection = MACHINES;
    const PLURAL: &'static str = "deployment_targets";

    fn item_attributes() -> Vec<Attribute> {
        deployment_target::summary_attributes()
    }

    fn flatten(dto: &Machine) -> Value {
        deployment_target::flatten_summary(dto)
    }

    fn filters() -> Vec<Attribute> {
        vec![
            Attribute::string("name").optional().description("A filter to search by name."),
            common::string_list("environments", "A filter to search by a list of environment IDs."),
            common::string_list("roles", "A filter to search by a list of role IDs."),
            common::string_list("tenants", "A filter to search by a list of tenant IDs."),
            common::string_list("tenant_tags", "A filter to search by a list of tenant tags."),
            Attribute::string_list("health_statuses")
                .optional()
                .validate(Validator::OneOf(HEALTH_STATUSES))
                .description("A filter to search by a list of health statuses."),
            Attribute::string_list("communication_styles")
                .optional()
                .validate(Validator::OneOf(COMMUNICATION_STYLES))
                .description("A filter to search by a list of communication styles."),
            Attribute::bool("is_disabled").optional(),
            Attribute::string("thumbprint").optional(),
        ]
    }

    fn query(config: &Value, query: &mut ListQuery) {
        if let Some(name) = config.get_non_empty("name") {
            query.filters.push(("name", name));
        }
        push_list(query, "environmentIds", config.get_strings("environments"));
        push_list(query, "roles", config.get_strings("roles"));
        push_list(query, "tenantIds", config.get_strings("tenants"));
        push_list(query, "tenantTags", config.get_strings("tenant_tags"));
        push_list(query, "healthStatuses", config.get_strings("health_statuses"));
        push_list(query, "commStyles", config.get_strings("communication_styles"));
        if let Some(disabled) = config.get_bool("is_disabled") {
            query.filters.push(("isDisabled", disabled.to_string()));
        }
        if let Some(thumbprint) = config.get_non_empty("thumbprint") {
            query.filters.push(("thumbprint", thumbprint));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_type_filter() {
        let mut query = ListQuery::default();
        FeedListing::query(&Value::object([("feed_type", Value::from("Helm"))]), &mut query);
        assert_eq!(query.filters, vec![("feedType", "Helm".to_string())]);

        let mut query = ListQuery::default();
        FeedListing::query(&Value::object([("feed_type", Value::Null)]), &mut query);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_target_filters_join_lists() {
        let config = Value::object([
            ("environments", Value::strings(["Environments-1", "Environments-2"])),
            ("roles", Value::strings(Vec::<String>::new())),
            ("health_statuses", Value::strings(["Healthy"])),
            ("is_disabled", Value::Bool(false)),
        ]);
        let mut query = ListQuery::default();
        TargetListing::query(&config, &mut query);
        assert_eq!(
            query.filters,
            vec![
                ("environmentIds", "Environments-1,Environments-2".to_string()),
                ("healthStatuses", "Healthy".to_string()),
                ("isDisabled", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_account_summary_keeps_account_type() {
        let account = Account {
            id: Some("Accounts-1".to_string()),
            account_type: "Token".to_string(),
            name: "GitHub".to_string(),
            ..Default::default()
        };
        let value = AccountListing::flatten(&account);
        assert_eq!(value.get_str("account_type"), Some("Token"));
        assert!(AccountListing::item_attributes().iter().all(|a| a.computed));
    }
}
