use std::marker::PhantomData;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{ACCOUNTS, Account, Collection, SensitiveValue};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const AZURE_ENVIRONMENTS: &[&str] = &[
    "AzureCloud",
    "AzureChinaCloud",
    "AzureGermanCloud",
    "AzureUSGovernment",
];

const SUBJECT_KEYS: &[&str] = &["space", "environment", "project", "tenant", "runbook", "account", "type"];

/// One `AccountType` of the accounts collection.
pub trait AccountKind: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const DISPLAY: &'static str;
    const ACCOUNT_TYPE: &'static str;

    fn attributes() -> Vec<Attribute>;

    fn expand_into(value: &Value, account: &mut Account);

    fn flatten_into(account: &Account, value: &mut Value);
}

pub struct AccountMapping<K>(PhantomData<fn() -> K>);

fn sensitive(value: &Value, key: &str) -> Option<SensitiveValue> {
    Some(SensitiveValue::new(value.get_string(key)))
}

impl<K: AccountKind> Mapping for AccountMapping<K> {
    type Dto = Account;

    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const DISPLAY: &'static str = K::DISPLAY;
    const COLLECTION: Collection = ACCOUNTS;
    const PLURAL: &'static str = "accounts";
    const DATA_SOURCE: &'static str = "octopusdeploy_accounts";

    fn schema() -> Schema {
        let mut attributes = vec![
            common::id(),
            common::space_id(K::DISPLAY),
            common::name(K::DISPLAY),
            common::description(K::DISPLAY),
            common::string_list("environments", "A list of environment IDs this account can be used in."),
            common::string_list("tenants", "A list of tenant IDs this account can be used for."),
            common::tenant_tags(),
            common::tenanted_deployment_participation(),
        ];
        attributes.extend(K::attributes());
        Schema::new(format!("This resource manages {} accounts in Octopus Deploy.", K::DISPLAY), attributes)
    }

    fn expand(value: &Value) -> Result<Account, ResourceError> {
        let mut account = Account {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            account_type: K::ACCOUNT_TYPE.to_string(),
            environment_ids: value.get_strings("environments"),
            tenant_ids: value.get_strings("tenants"),
            tenant_tags: value.get_strings("tenant_tags"),
            tenanted_deployment_participation: value
                .get_non_empty("tenanted_deployment_participation")
                .unwrap_or_else(|| "Untenanted".to_string()),
            ..Default::default()
        };
        K::expand_into(value, &mut account);
        Ok(account)
    }

    fn flatten(account: &Account) -> Value {
        let mut value = flatten_summary(account);
        if let Value::Object(object) = &mut value {
            object.remove("account_type");
        }
        K::flatten_into(account, &mut value);
        value
    }

    fn check(account: &Account) -> Result<(), ResourceError> {
        if account.account_type == K::ACCOUNT_TYPE {
            return Ok(());
        }
        Err(ResourceError::UnexpectedKind {
            collection: ACCOUNTS.path,
            id: account.id.clone().unwrap_or_default(),
            field: "AccountType",
            actual: account.account_type.clone(),
            expected: K::ACCOUNT_TYPE,
        })
    }
}

/// Attributes every account type shares, as reported by the accounts data source.
pub(crate) fn summary_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("id"),
        Attribute::string("space_id"),
        Attribute::string("name"),
        Attribute::string("description"),
        Attribute::string("account_type"),
        Attribute::string_list("environments"),
        Attribute::string_list("tenants"),
        Attribute::string_list("tenant_tags"),
        Attribute::string("tenanted_deployment_participation"),
    ]
    .into_iter()
    .map(Attribute::into_computed)
    .collect()
}

pub(crate) fn flatten_summary(account: &Account) -> Value {
    Value::object([
        ("id", Value::from(account.id.clone())),
        ("space_id", Value::optional_string(&account.space_id)),
        ("name", Value::from(&account.name)),
        ("description", Value::optional_string(&account.description)),
        ("account_type", Value::from(&account.account_type)),
        ("environments", Value::strings(&account.environment_ids)),
        ("tenants", Value::strings(&account.tenant_ids)),
        ("tenant_tags", Value::strings(&account.tenant_tags)),
        (
            "tenanted_deployment_participation",
            Value::optional_string(&account.tenanted_deployment_participation),
        ),
    ])
}

pub struct UsernamePasswordAccount;

impl AccountKind for UsernamePasswordAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_username_password_account";
    const DISPLAY: &'static str = "username-password";
    const ACCOUNT_TYPE: &'static str = "UsernamePassword";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("username")
                .optional()
                .description("The username associated with this account."),
            Attribute::string("password")
                .optional()
                .sensitive()
                .description("The password associated with this account."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.username = value.get_string("username");
        account.password = sensitive(value, "password");
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        value.set("username", Value::from(account.username.clone()));
        value.set("password", Value::Null);
    }
}

pub struct TokenAccount;

impl AccountKind for TokenAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_token_account";
    const DISPLAY: &'static str = "token";
    const ACCOUNT_TYPE: &'static str = "Token";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("token")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The secret token associated with this resource."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.token = sensitive(value, "token");
    }

    fn flatten_into(_account: &Account, value: &mut Value) {
        value.set("token", Value::Null);
    }
}

pub struct AmazonWebServicesAccount;

impl AccountKind for AmazonWebServicesAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_aws_account";
    const DISPLAY: &'static str = "AWS";
    const ACCOUNT_TYPE: &'static str = "AmazonWebServicesAccount";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("access_key")
                .required()
                .validate(Validator::NotEmpty)
                .description("The access key associated with this AWS account."),
            Attribute::string("secret_key")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The secret key associated with this AWS account."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.access_key = value.get_string("access_key");
        account.secret_key = sensitive(value, "secret_key");
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        value.set("access_key", Value::from(account.access_key.clone()));
        value.set("secret_key", Value::Null);
    }
}

pub struct AzureServicePrincipal;

impl AccountKind for AzureServicePrincipal {
    const TYPE_NAME: &'static str = "octopusdeploy_azure_service_principal";
    const DISPLAY: &'static str = "Azure service principal";
    const ACCOUNT_TYPE: &'static str = "AzureServicePrincipal";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("application_id")
                .required()
                .validate(Validator::Uuid)
                .description("The application ID of this Azure service principal."),
            Attribute::string("tenant_id")
                .required()
                .validate(Validator::Uuid)
                .description("The Azure tenant ID of this service principal."),
            Attribute::string("subscription_id")
                .required()
                .validate(Validator::Uuid)
                .description("The subscription ID of this Azure service principal."),
            Attribute::string("password")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The password associated with this Azure service principal."),
            Attribute::string("azure_environment")
                .optional()
                .computed()
                .validate(Validator::OneOf(AZURE_ENVIRONMENTS))
                .description("The Azure environment associated with this account."),
            Attribute::string("authentication_endpoint")
                .optional()
                .computed()
                .validate(Validator::HttpsUrl)
                .description("The authentication endpoint URI for this Azure service principal."),
            Attribute::string("resource_manager_endpoint")
                .optional()
                .computed()
                .validate(Validator::HttpsUrl)
                .description("The resource manager endpoint URI for this Azure service principal."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.client_id = value.get_string("application_id");
        account.tenant_id = value.get_string("tenant_id");
        account.subscription_number = value.get_string("subscription_id");
        account.password = sensitive(value, "password");
        account.azure_environment = value.get_non_empty("azure_environment");
        account.active_directory_endpoint_base_uri = value.get_non_empty("authentication_endpoint");
        account.resource_management_endpoint_base_uri = value.get_non_empty("resource_manager_endpoint");
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        let optional = |s: &Option<String>| Value::optional_string(s.as_deref().unwrap_or_default());
        value.set("application_id", Value::from(account.client_id.clone()));
        value.set("tenant_id", Value::from(account.tenant_id.clone()));
        value.set("subscription_id", Value::from(account.subscription_number.clone()));
        value.set("password", Value::Null);
        value.set("azure_environment", optional(&account.azure_environment));
        value.set("authentication_endpoint", optional(&account.active_directory_endpoint_base_uri));
        value.set("resource_manager_endpoint", optional(&account.resource_management_endpoint_base_uri));
    }
}

pub struct AzureSubscriptionAccount;

impl AccountKind for AzureSubscriptionAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_azure_subscription_account";
    const DISPLAY: &'static str = "Azure subscription";
    const ACCOUNT_TYPE: &'static str = "AzureSubscription";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("subscription_id")
                .required()
                .validate(Validator::Uuid)
                .description("The subscription ID of this resource."),
            Attribute::string("certificate")
                .optional()
                .computed()
                .sensitive()
                .description("The management certificate associated with this Azure subscription account."),
            Attribute::string("certificate_thumbprint")
                .optional()
                .computed()
                .sensitive()
                .description("The thumbprint of the management certificate associated with this Azure subscription account."),
            Attribute::string("azure_environment")
                .optional()
                .computed()
                .validate(Validator::OneOf(AZURE_ENVIRONMENTS))
                .description("The Azure environment associated with this Azure subscription account."),
            Attribute::string("management_endpoint")
                .optional()
                .description("The management endpoint associated with this Azure subscription account."),
            Attribute::string("storage_endpoint_suffix")
                .optional()
                .description("The storage endpoint suffix associated with this Azure subscription account."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.subscription_number = value.get_string("subscription_id");
        account.certificate_bytes = value.get_non_empty("certificate").map(|c| SensitiveValue::new(Some(c)));
        account.certificate_thumbprint = value.get_non_empty("certificate_thumbprint");
        account.azure_environment = value.get_non_empty("azure_environment");
        account.service_management_endpoint_base_uri = value.get_non_empty("management_endpoint");
        account.service_management_endpoint_suffix = value.get_non_empty("storage_endpoint_suffix");
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        let optional = |s: &Option<String>| Value::optional_string(s.as_deref().unwrap_or_default());
        value.set("subscription_id", Value::from(account.subscription_number.clone()));
        value.set("certificate", Value::Null);
        value.set("certificate_thumbprint", optional(&account.certificate_thumbprint));
        value.set("azure_environment", optional(&account.azure_environment));
        value.set("management_endpoint", optional(&account.service_management_endpoint_base_uri));
        value.set("storage_endpoint_suffix", optional(&account.service_management_endpoint_suffix));
    }
}

pub struct SshKeyAccount;

impl AccountKind for SshKeyAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_ssh_key_account";
    const DISPLAY: &'static str = "SSH key";
    const ACCOUNT_TYPE: &'static str = "SshKeyPair";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("username")
                .required()
                .validate(Validator::NotEmpty)
                .description("The username associated with this SSH key pair."),
            Attribute::string("private_key_file")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The private key file, base64 encoded."),
            Attribute::string("private_key_passphrase")
                .optional()
                .sensitive()
                .description("The passphrase for the private key, if it has one."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.username = value.get_string("username");
        account.private_key_file = sensitive(value, "private_key_file");
        account.private_key_passphrase = value
            .get_non_empty("private_key_passphrase")
            .map(|p| SensitiveValue::new(Some(p)));
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        value.set("username", Value::from(account.username.clone()));
        value.set("private_key_file", Value::Null);
        value.set("private_key_passphrase", Value::Null);
    }
}

pub struct GoogleCloudAccount;

impl AccountKind for GoogleCloudAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_gcp_account";
    const DISPLAY: &'static str = "GCP";
    const ACCOUNT_TYPE: &'static str = "GoogleCloudAccount";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("json_key")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The JSON key associated with this GCP account."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.json_key = sensitive(value, "json_key");
    }

    fn flatten_into(_account: &Account, value: &mut Value) {
        value.set("json_key", Value::Null);
    }
}

pub struct GenericOidcAccount;

impl AccountKind for GenericOidcAccount {
    const TYPE_NAME: &'static str = "octopusdeploy_generic_oidc_account";
    const DISPLAY: &'static str = "generic OIDC";
    const ACCOUNT_TYPE: &'static str = "GenericOidcAccount";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string_list("execution_subject_keys")
                .optional()
                .validate(Validator::OneOf(SUBJECT_KEYS))
                .description("Keys to include in a deployment or runbook."),
            Attribute::string("audience")
                .optional()
                .description("The audience associated with this resource."),
        ]
    }

    fn expand_into(value: &Value, account: &mut Account) {
        account.deployment_subject_keys = Some(value.get_strings("execution_subject_keys"));
        account.audience = value.get_non_empty("audience");
    }

    fn flatten_into(account: &Account, value: &mut Value) {
        let keys = account.deployment_subject_keys.as_deref().unwrap_or_default();
        value.set(
            "execution_subject_keys",
            if keys.is_empty() { Value::Null } else { Value::strings(keys) },
        );
        value.set("audience", Value::from(account.audience.clone()));
    }
}
