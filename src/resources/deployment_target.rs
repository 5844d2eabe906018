use std::marker::PhantomData;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{
    Collection, Endpoint, KubernetesAuthentication, MACHINES, Machine, OfflineDropDestination,
};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

/// One `CommunicationStyle` of the machines collection.
pub trait TargetKind: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const DISPLAY: &'static str;
    const COMMUNICATION_STYLE: &'static str;

    fn attributes() -> Vec<Attribute>;

    fn expand_endpoint(value: &Value) -> Endpoint;

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value);
}

pub struct TargetMapping<K>(PhantomData<fn() -> K>);

impl<K: TargetKind> Mapping for TargetMapping<K> {
    type Dto = Machine;

    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const DISPLAY: &'static str = K::DISPLAY;
    const COLLECTION: Collection = MACHINES;
    const PLURAL: &'static str = "deployment_targets";
    const DATA_SOURCE: &'static str = "octopusdeploy_deployment_targets";

    fn schema() -> Schema {
        let mut attributes = vec![
            common::id(),
            common::space_id(K::DISPLAY),
            common::name(K::DISPLAY),
            Attribute::string_list("environments")
                .required()
                .description("A list of environment IDs this deployment target belongs to."),
            Attribute::string_list("roles")
                .required()
                .description("A list of target roles of this deployment target."),
            common::string_list("tenants", "A list of tenant IDs this deployment target can be used for."),
            common::tenant_tags(),
            common::tenanted_deployment_participation(),
            Attribute::bool("is_disabled").default(false),
            Attribute::string("machine_policy_id")
                .optional()
                .computed()
                .description("The machine policy that applies to this deployment target."),
            Attribute::string("shell_name").computed(),
            Attribute::string("status").computed(),
            Attribute::string("health_status").computed(),
        ];
        attributes.extend(K::attributes());
        Schema::new(
            format!("This resource manages {} deployment targets in Octopus Deploy.", K::DISPLAY),
            attributes,
        )
    }

    fn expand(value: &Value) -> Result<Machine, ResourceError> {
        let endpoint = Endpoint {
            communication_style: K::COMMUNICATION_STYLE.to_string(),
            ..K::expand_endpoint(value)
        };
        Ok(Machine {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            roles: value.get_strings("roles"),
            environment_ids: value.get_strings("environments"),
            tenant_ids: value.get_strings("tenants"),
            tenant_tags: value.get_strings("tenant_tags"),
            tenanted_deployment_participation: value
                .get_non_empty("tenanted_deployment_participation")
                .unwrap_or_else(|| "Untenanted".to_string()),
            is_disabled: common::bool_or(value, "is_disabled", false),
            machine_policy_id: common::string_or_empty(value, "machine_policy_id"),
            thumbprint: endpoint.thumbprint.clone().unwrap_or_default(),
            uri: endpoint.uri.clone().unwrap_or_default(),
            endpoint,
            ..Default::default()
        })
    }

    fn flatten(machine: &Machine) -> Value {
        let mut value = flatten_summary(machine);
        if let Value::Object(object) = &mut value {
            object.remove("communication_style");
        }
        K::flatten_endpoint(&machine.endpoint, &mut value);
        value
    }

    fn check(machine: &Machine) -> Result<(), ResourceError> {
        let style = &machine.endpoint.communication_style;
        if style == K::COMMUNICATION_STYLE {
            return Ok(());
        }
        Err(ResourceError::UnexpectedKind {
            collection: MACHINES.path,
            id: machine.id.clone().unwrap_or_default(),
            field: "CommunicationStyle",
            actual: style.clone(),
            expected: K::COMMUNICATION_STYLE,
        })
    }
}

pub(crate) fn summary_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("id"),
        Attribute::string("space_id"),
        Attribute::string("name"),
        Attribute::string("communication_style"),
        Attribute::string_list("environments"),
        Attribute::string_list("roles"),
        Attribute::string_list("tenants"),
        Attribute::string_list("tenant_tags"),
        Attribute::string("tenanted_deployment_participation"),
        Attribute::bool("is_disabled"),
        Attribute::string("machine_policy_id"),
        Attribute::string("shell_name"),
        Attribute::string("status"),
        Attribute::string("health_status"),
    ]
    .into_iter()
    .map(Attribute::into_computed)
    .collect()
}

pub(crate) fn flatten_summary(machine: &Machine) -> Value {
    Value::object([
        ("id", Value::from(machine.id.clone())),
        ("space_id", Value::optional_string(&machine.space_id)),
        ("name", Value::from(&machine.name)),
        ("communication_style", Value::from(&machine.endpoint.communication_style)),
        ("environments", Value::strings(&machine.environment_ids)),
        ("roles", Value::strings(&machine.roles)),
        ("tenants", Value::strings(&machine.tenant_ids)),
        ("tenant_tags", Value::strings(&machine.tenant_tags)),
        (
            "tenanted_deployment_participation",
            Value::optional_string(&machine.tenanted_deployment_participation),
        ),
        ("is_disabled", Value::from(machine.is_disabled)),
        ("machine_policy_id", Value::optional_string(&machine.machine_policy_id)),
        ("shell_name", Value::optional_string(&machine.shell_name)),
        ("status", Value::optional_string(&machine.status)),
        ("health_status", Value::optional_string(&machine.health_status)),
    ])
}

fn tentacle_attributes(url_validator: Validator, url_description: &str) -> Vec<Attribute> {
    vec![
        Attribute::string("tentacle_url")
            .required()
            .validate(url_validator)
            .description(url_description),
        Attribute::string("tentacle_thumbprint")
            .required()
            .validate(Validator::NotEmpty)
            .description("The thumbprint of the Tentacle's certificate."),
    ]
}

pub struct CloudRegion;

impl TargetKind for CloudRegion {
    const TYPE_NAME: &'static str = "octopusdeploy_cloud_region_deployment_target";
    const DISPLAY: &'static str = "cloud region";
    const COMMUNICATION_STYLE: &'static str = "None";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("default_worker_pool_id")
                .optional()
                .description("The worker pool used to run steps targeting this cloud region."),
        ]
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        Endpoint {
            default_worker_pool_id: value.get_non_empty("default_worker_pool_id"),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("default_worker_pool_id", Value::from(endpoint.default_worker_pool_id.clone()));
    }
}

pub struct ListeningTentacle;

impl TargetKind for ListeningTentacle {
    const TYPE_NAME: &'static str = "octopusdeploy_listening_tentacle_deployment_target";
    const DISPLAY: &'static str = "listening tentacle";
    const COMMUNICATION_STYLE: &'static str = "TentaclePassive";

    fn attributes() -> Vec<Attribute> {
        let mut attributes = tentacle_attributes(
            Validator::HttpsUrl,
            "The URL Octopus uses to reach the listening Tentacle, e.g. https://host:10933/.",
        );
        attributes.push(Attribute::string("proxy_id").optional());
        attributes
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        Endpoint {
            uri: value.get_non_empty("tentacle_url"),
            thumbprint: value.get_non_empty("tentacle_thumbprint"),
            proxy_id: value.get_non_empty("proxy_id"),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("tentacle_url", Value::from(endpoint.uri.clone()));
        value.set("tentacle_thumbprint", Value::from(endpoint.thumbprint.clone()));
        value.set("proxy_id", Value::from(endpoint.proxy_id.clone()));
    }
}

pub struct PollingTentacle;

impl TargetKind for PollingTentacle {
    const TYPE_NAME: &'static str = "octopusdeploy_polling_tentacle_deployment_target";
    const DISPLAY: &'static str = "polling tentacle";
    const COMMUNICATION_STYLE: &'static str = "TentacleActive";

    fn attributes() -> Vec<Attribute> {
        tentacle_attributes(
            Validator::NotEmpty,
            "The subscription URL the polling Tentacle connects with, e.g. poll://abcdef0123456789/.",
        )
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        Endpoint {
            uri: value.get_non_empty("tentacle_url"),
            thumbprint: value.get_non_empty("tentacle_thumbprint"),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("tentacle_url", Value::from(endpoint.uri.clone()));
        value.set("tentacle_thumbprint", Value::from(endpoint.thumbprint.clone()));
    }
}

pub struct SshConnection;

impl TargetKind for SshConnection {
    const TYPE_NAME: &'static str = "octopusdeploy_ssh_connection_deployment_target";
    const DISPLAY: &'static str = "SSH connection";
    const COMMUNICATION_STYLE: &'static str = "Ssh";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("host")
                .required()
                .validate(Validator::NotEmpty)
                .description("The hostname or IP address of the SSH target."),
            Attribute::int("port")
                .validate(Validator::AtLeast(1))
                .default(22)
                .description("The SSH port."),
            Attribute::string("fingerprint")
                .required()
                .validate(Validator::NotEmpty)
                .description("The fingerprint of the host key."),
            Attribute::string("account_id")
                .required()
                .validate(Validator::NotEmpty)
                .description("The SSH key or username/password account used to connect."),
            Attribute::string("dot_net_core_platform")
                .optional()
                .description("The .NET Core platform of the target, e.g. linux-x64."),
            Attribute::string("proxy_id").optional(),
        ]
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        Endpoint {
            host: value.get_non_empty("host"),
            port: Some(common::int_or(value, "port", 22)),
            fingerprint: value.get_non_empty("fingerprint"),
            account_id: value.get_non_empty("account_id"),
            dot_net_core_platform: value.get_non_empty("dot_net_core_platform"),
            proxy_id: value.get_non_empty("proxy_id"),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("host", Value::from(endpoint.host.clone()));
        value.set("port", Value::from(endpoint.port.unwrap_or(22)));
        value.set("fingerprint", Value::from(endpoint.fingerprint.clone()));
        value.set("account_id", Value::from(endpoint.account_id.clone()));
        value.set("dot_net_core_platform", Value::from(endpoint.dot_net_core_platform.clone()));
        value.set("proxy_id", Value::from(endpoint.proxy_id.clone()));
    }
}

pub struct KubernetesCluster;

impl TargetKind for KubernetesCluster {
    const TYPE_NAME: &'static str = "octopusdeploy_kubernetes_cluster_deployment_target";
    const DISPLAY: &'static str = "Kubernetes cluster";
    const COMMUNICATION_STYLE: &'static str = "Kubernetes";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("cluster_url")
                .required()
                .validate(Validator::Url)
                .description("The URL of the Kubernetes API server."),
            Attribute::string("namespace").optional(),
            Attribute::bool("skip_tls_verification").default(false),
            Attribute::string("cluster_certificate")
                .optional()
                .description("The certificate used to verify the cluster."),
            Attribute::string("default_worker_pool_id").optional(),
            Attribute::string("proxy_id").optional(),
            Attribute::single_nested(
                "authentication",
                vec![
                    Attribute::string("account_id")
                        .required()
                        .validate(Validator::NotEmpty)
                        .description("The token or username/password account used to authenticate."),
                ],
            )
            .optional()
            .description("Account based authentication against the cluster."),
        ]
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        let account_id = value
            .get_object("authentication")
            .and_then(|auth| auth.get_non_empty("account_id"));
        Endpoint {
            cluster_url: value.get_non_empty("cluster_url"),
            namespace: value.get_non_empty("namespace"),
            skip_tls_verification: Some(common::bool_or(value, "skip_tls_verification", false)),
            cluster_certificate: value.get_non_empty("cluster_certificate"),
            default_worker_pool_id: value.get_non_empty("default_worker_pool_id"),
            proxy_id: value.get_non_empty("proxy_id"),
            authentication: Some(KubernetesAuthentication {
                authentication_type: "KubernetesStandard".to_string(),
                account_id,
            }),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("cluster_url", Value::from(endpoint.cluster_url.clone()));
        value.set("namespace", Value::from(endpoint.namespace.clone()));
        value.set("skip_tls_verification", Value::from(endpoint.skip_tls_verification.unwrap_or(false)));
        value.set("cluster_certificate", Value::from(endpoint.cluster_certificate.clone()));
        value.set("default_worker_pool_id", Value::from(endpoint.default_worker_pool_id.clone()));
        value.set("proxy_id", Value::from(endpoint.proxy_id.clone()));
        let authentication = match endpoint.authentication.as_ref().and_then(|a| a.account_id.clone()) {
            Some(account_id) => Value::object([("account_id", Value::from(account_id))]),
            None => Value::Null,
        };
        value.set("authentication", authentication);
    }
}

const DESTINATION_TYPES: &[&str] = &["Artifact", "FileSystem"];

pub struct OfflinePackageDrop;

impl TargetKind for OfflinePackageDrop {
    const TYPE_NAME: &'static str = "octopusdeploy_offline_package_drop_deployment_target";
    const DISPLAY: &'static str = "offline package drop";
    const COMMUNICATION_STYLE: &'static str = "OfflineDrop";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("applications_directory")
                .required()
                .validate(Validator::NotEmpty),
            Attribute::string("working_directory")
                .required()
                .validate(Validator::NotEmpty),
            Attribute::single_nested(
                "destination",
                vec![
                    Attribute::string("destination_type")
                        .validate(Validator::OneOf(DESTINATION_TYPES))
                        .default("Artifact"),
                    Attribute::string("drop_folder_path")
                        .optional()
                        .description("The folder packages are dropped into when the destination is FileSystem."),
                ],
            )
            .optional()
            .computed(),
        ]
    }

    fn expand_endpoint(value: &Value) -> Endpoint {
        let destination = match value.get_object("destination") {
            Some(d) => OfflineDropDestination {
                destination_type: d
                    .get_non_empty("destination_type")
                    .unwrap_or_else(|| "Artifact".to_string()),
                drop_folder_path: d.get_non_empty("drop_folder_path"),
            },
            None => OfflineDropDestination {
                destination_type: "Artifact".to_string(),
                drop_folder_path: None,
            },
        };
        Endpoint {
            applications_directory: value.get_non_empty("applications_directory"),
            working_directory: value.get_non_empty("working_directory"),
            destination: Some(destination),
            ..Default::default()
        }
    }

    fn flatten_endpoint(endpoint: &Endpoint, value: &mut Value) {
        value.set("applications_directory", Value::from(endpoint.applications_directory.clone()));
        value.set("working_directory", Value::from(endpoint.working_directory.clone()));
        let destination = match &endpoint.destination {
            Some(d) => Value::object([
                ("destination_type", Value::string(&d.destination_type)),
                ("drop_folder_path", Value::from(d.drop_folder_path.clone())),
            ]),
            None => Value::Null,
        };
        value.set("destination", destination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening_plan() -> Value {
        Value::object([
            ("name", Value::from("web-01")),
            ("environments", Value::strings(["Environments-1"])),
            ("roles", Value::strings(["web"])),
            ("tentacle_url", Value::from("https://web-01:10933/")),
            ("tentacle_thumbprint", Value::from("8A7B6C5D4E3F")),
            ("machine_policy_id", Value::Unknown),
            ("status", Value::Unknown),
        ])
    }

    #[test]
    fn test_expand_listening_tentacle() {
        let machine = TargetMapping::<ListeningTentacle>::expand(&listening_plan()).unwrap();
        assert_eq!(machine.endpoint.communication_style, "TentaclePassive");
        assert_eq!(machine.endpoint.uri.as_deref(), Some("https://web-01:10933/"));
        assert_eq!(machine.thumbprint, "8A7B6C5D4E3F");
        assert!(machine.machine_policy_id.is_empty());

        let json = serde_json::to_value(&machine).unwrap();
        assert_eq!(json["Endpoint"]["CommunicationStyle"], "TentaclePassive");
        assert_eq!(json["EnvironmentIds"][0], "Environments-1");
        assert!(json["Endpoint"].get("ProxyId").is_none());
    }

    #[test]
    fn test_listening_tentacle_requires_https() {
        let mut config = listening_plan();
        config.set("tentacle_url", Value::from("http://web-01:10933/"));
        assert!(TargetMapping::<ListeningTentacle>::validate(&config).has_errors());
        assert!(!TargetMapping::<ListeningTentacle>::validate(&listening_plan()).has_errors());
    }

    #[test]
    fn test_flatten_cloud_region() {
        let machine: Machine = serde_json::from_value(serde_json::json!({
            "Id": "Machines-3",
            "Name": "eu-west",
            "Roles": ["cloud"],
            "EnvironmentIds": ["Environments-1"],
            "TenantedDeploymentParticipation": "Untenanted",
            "MachinePolicyId": "MachinePolicies-1",
            "HealthStatus": "Healthy",
            "Status": "Online",
            "Endpoint": {"CommunicationStyle": "None", "DefaultWorkerPoolId": "WorkerPools-1"}
        }))
        .unwrap();
        assert!(TargetMapping::<CloudRegion>::check(&machine).is_ok());
        let value = TargetMapping::<CloudRegion>::flatten(&machine);
        assert_eq!(value.get_str("default_worker_pool_id"), Some("WorkerPools-1"));
        assert_eq!(value.get_str("machine_policy_id"), Some("MachinePolicies-1"));
        assert!(value.get("communication_style").is_null());
        assert!(value.get("shell_name").is_null());
    }

    #[test]
    fn test_check_rejects_polling_tentacle_as_listening() {
        let machine = Machine {
            id: Some("Machines-4".to_string()),
            endpoint: Endpoint {
                communication_style: "TentacleActive".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(TargetMapping::<PollingTentacle>::check(&machine).is_ok());
        assert!(matches!(
            TargetMapping::<ListeningTentacle>::check(&machine),
            Err(ResourceError::UnexpectedKind { field: "CommunicationStyle", .. })
        ));
    }

    #[test]
    fn test_expand_ssh_connection_defaults_port() {
        let planned = Value::object([
            ("name", Value::from("linux-01")),
            ("environments", Value::strings(["Environments-1"])),
            ("roles", Value::strings(["app"])),
            ("host", Value::from("10.0.0.5")),
            ("fingerprint", Value::from("SHA256:abc")),
            ("account_id", Value::from("Accounts-7")),
        ]);
        let machine = TargetMapping::<SshConnection>::expand(&planned).unwrap();
        let json = serde_json::to_value(&machine).unwrap();
        assert_eq!(json["Endpoint"]["CommunicationStyle"], "Ssh");
        assert_eq!(json["Endpoint"]["Port"], 22);
        assert_eq!(json["Endpoint"]["AccountId"], "Accounts-7");
        assert!(json["Endpoint"].get("ClusterUrl").is_none());
    }

    #[test]
    fn test_kubernetes_authentication_round_trip() {
        let machine: Machine = serde_json::from_value(serde_json::json!({
            "Id": "Machines-8",
            "Name": "aks",
            "Endpoint": {
                "CommunicationStyle": "Kubernetes",
                "ClusterUrl": "https://aks.example.com",
                "SkipTlsVerification": true,
                "Authentication": {"AuthenticationType": "KubernetesStandard", "AccountId": "Accounts-3"}
            }
        }))
        .unwrap();
        assert!(TargetMapping::<KubernetesCluster>::check(&machine).is_ok());
        let value = TargetMapping::<KubernetesCluster>::flatten(&machine);
        assert_eq!(value.get_bool("skip_tls_verification"), Some(true));
        assert_eq!(value.get("authentication").get_str("account_id"), Some("Accounts-3"));

        let expanded = TargetMapping::<KubernetesCluster>::expand(&value).unwrap();
        let auth = expanded.endpoint.authentication.unwrap();
        assert_eq!(auth.authentication_type, "KubernetesStandard");
        assert_eq!(auth.account_id.as_deref(), Some("Accounts-3"));
    }

    #[test]
    fn test_offline_drop_defaults_to_artifact_destination() {
        let planned = Value::object([
            ("name", Value::from("drop")),
            ("applications_directory", Value::from("C:\\Apps")),
            ("working_directory", Value::from("C:\\Work")),
            ("destination", Value::Unknown),
        ]);
        let machine = TargetMapping::<OfflinePackageDrop>::expand(&planned).unwrap();
        let destination = machine.endpoint.destination.unwrap();
        assert_eq!(destination.destination_type, "Artifact");
        assert!(destination.drop_folder_path.is_none());
    }
}
