use std::marker::PhantomData;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, FEEDS, Feed, SensitiveValue};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

/// One `FeedType` of the feeds collection.
pub trait FeedKind: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const DISPLAY: &'static str;
    const FEED_TYPE: &'static str;
    /// NuGet, Maven and GitHub feeds retry package downloads.
    const RETRIES_DOWNLOADS: bool = false;
    /// ECR feeds authenticate with AWS keys instead of a URI and login.
    const URI_AND_LOGIN: bool = true;

    fn attributes() -> Vec<Attribute> {
        Vec::new()
    }

    fn expand_into(_value: &Value, _feed: &mut Feed) {}

    fn flatten_into(_feed: &Feed, _value: &mut Value) {}
}

pub struct FeedMapping<K>(PhantomData<fn() -> K>);

impl<K: FeedKind> Mapping for FeedMapping<K> {
    type Dto = Feed;

    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const DISPLAY: &'static str = K::DISPLAY;
    const COLLECTION: Collection = FEEDS;
    const PLURAL: &'static str = "feeds";
    const DATA_SOURCE: &'static str = "octopusdeploy_feeds";

    fn schema() -> Schema {
        let mut attributes = vec![
            common::id(),
            common::space_id(K::DISPLAY),
            common::name(K::DISPLAY),
            Attribute::string_list("package_acquisition_location_options")
                .optional()
                .computed(),
        ];
        if K::URI_AND_LOGIN {
            attributes.extend([
                Attribute::string("feed_uri")
                    .required()
                    .validate(Validator::Url)
                    .description("The URI of this feed."),
                Attribute::string("username")
                    .optional()
                    .description("The username associated with this feed."),
                Attribute::string("password")
                    .optional()
                    .sensitive()
                    .description("The password associated with this feed."),
            ]);
        }
        if K::RETRIES_DOWNLOADS {
            attributes.push(
                Attribute::int("download_attempts")
                    .validate(Validator::AtLeast(0))
                    .default(5)
                    .description("The number of times a deployment should attempt to download a package from this feed before failing."),
            );
            attributes.push(
                Attribute::int("download_retry_backoff_seconds")
                    .validate(Validator::AtLeast(0))
                    .default(10)
                    .description("The number of seconds to apply as a linear back off between download attempts."),
            );
        }
        attributes.extend(K::attributes());
        Schema::new(format!("This resource manages {} feeds in Octopus Deploy.", K::DISPLAY), attributes)
    }

    fn expand(value: &Value) -> Result<Feed, ResourceError> {
        let mut feed = Feed {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            feed_type: K::FEED_TYPE.to_string(),
            feed_uri: common::string_or_empty(value, "feed_uri"),
            username: value.get_string("username"),
            password: K::URI_AND_LOGIN.then(|| SensitiveValue::new(value.get_string("password"))),
            package_acquisition_location_options: value.get_strings("package_acquisition_location_options"),
            download_attempts: common::int_or(value, "download_attempts", 5),
            download_retry_backoff_seconds: common::int_or(value, "download_retry_backoff_seconds", 10),
            ..Default::default()
        };
        K::expand_into(value, &mut feed);
        Ok(feed)
    }

    fn flatten(feed: &Feed) -> Value {
        let mut value = flatten_summary(feed);
        if let Value::Object(object) = &mut value {
            object.remove("feed_type");
        }
        if K::URI_AND_LOGIN {
            value.set("password", Value::Null);
        }
        if K::RETRIES_DOWNLOADS {
            value.set("download_attempts", Value::from(feed.download_attempts));
            value.set("download_retry_backoff_seconds", Value::from(feed.download_retry_backoff_seconds));
        }
        K::flatten_into(feed, &mut value);
        value
    }

    fn check(feed: &Feed) -> Result<(), ResourceError> {
        if feed.feed_type == K::FEED_TYPE {
            return Ok(());
        }
        Err(ResourceError::UnexpectedKind {
            collection: FEEDS.path,
            id: feed.id.clone().unwrap_or_default(),
            field: "FeedType",
            actual: feed.feed_type.clone(),
            expected: K::FEED_TYPE,
        })
    }
}

pub(crate) fn summary_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("id"),
        Attribute::string("space_id"),
        Attribute::string("name"),
        Attribute::string("feed_type"),
        Attribute::string("feed_uri"),
        Attribute::string("username"),
        Attribute::string_list("package_acquisition_location_options"),
    ]
    .into_iter()
    .map(Attribute::into_computed)
    .collect()
}

pub(crate) fn flatten_summary(feed: &Feed) -> Value {
    Value::object([
        ("id", Value::from(feed.id.clone())),
        ("space_id", Value::optional_string(&feed.space_id)),
        ("name", Value::from(&feed.name)),
        ("feed_type", Value::from(&feed.feed_type)),
        ("feed_uri", Value::from(&feed.feed_uri)),
        ("username", Value::from(feed.username.clone())),
        (
            "package_acquisition_location_options",
            Value::strings(&feed.package_acquisition_location_options),
        ),
    ])
}

pub struct NuGetFeed;

impl FeedKind for NuGetFeed {
    const TYPE_NAME: &'static str = "octopusdeploy_nuget_feed";
    const DISPLAY: &'static str = "NuGet";
    const FEED_TYPE: &'static str = "NuGet";
    const RETRIES_DOWNLOADS: bool = true;

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::bool("is_enhanced_mode")
                .default(false)
                .description("Generally used for console or web applications rather than for feeds hosted by NuGet.org."),
        ]
    }

    fn expand_into(value: &Value, feed: &mut Feed) {
        feed.enhanced_mode = common::bool_or(value, "is_enhanced_mode", false);
    }

    fn flatten_into(feed: &Feed, value: &mut Value) {
        value.set("is_enhanced_mode", Value::from(feed.enhanced_mode));
    }
}

pub struct DockerContainerRegistry;

impl FeedKind for DockerContainerRegistry {
    const TYPE_NAME: &'static str = "octopusdeploy_docker_container_registry";
    const DISPLAY: &'static str = "Docker container registry";
    const FEED_TYPE: &'static str = "Docker";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("api_version").optional(),
            Attribute::string("registry_path").optional(),
        ]
    }

    fn expand_into(value: &Value, feed: &mut Feed) {
        feed.api_version = value.get_non_empty("api_version");
        feed.registry_path = value.get_non_empty("registry_path");
    }

    fn flatten_into(feed: &Feed, value: &mut Value) {
        value.set("api_version", Value::from(feed.api_version.clone()));
        value.set("registry_path", Value::from(feed.registry_path.clone()));
    }
}

pub struct HelmFeed;

impl FeedKind for HelmFeed {
    const TYPE_NAME: &'static str = "octopusdeploy_helm_feed";
    const DISPLAY: &'static str = "Helm";
    const FEED_TYPE: &'static str = "Helm";
}

pub struct MavenFeed;

impl FeedKind for MavenFeed {
    const TYPE_NAME: &'static str = "octopusdeploy_maven_feed";
    const DISPLAY: &'static str = "Maven";
    const FEED_TYPE: &'static str = "Maven";
    const RETRIES_DOWNLOADS: bool = true;
}

pub struct GitHubRepositoryFeed;

impl FeedKind for GitHubRepositoryFeed {
    const TYPE_NAME: &'static str = "octopusdeploy_github_repository_feed";
    const DISPLAY: &'static str = "GitHub repository";
    const FEED_TYPE: &'static str = "GitHub";
    const RETRIES_DOWNLOADS: bool = true;
}

pub struct ArtifactoryGenericFeed;

impl FeedKind for ArtifactoryGenericFeed {
    const TYPE_NAME: &'static str = "octopusdeploy_artifactory_generic_feed";
    const DISPLAY: &'static str = "Artifactory generic";
    const FEED_TYPE: &'static str = "ArtifactoryGeneric";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("repository")
                .required()
                .validate(Validator::NotEmpty)
                .description("The Artifactory repository to read packages from."),
            Attribute::string("layout_regex")
                .optional()
                .description("A regular expression matching the repository layout."),
        ]
    }

    fn expand_into(value: &Value, feed: &mut Feed) {
        feed.repository = value.get_string("repository");
        feed.layout_regex = value.get_non_empty("layout_regex");
    }

    fn flatten_into(feed: &Feed, value: &mut Value) {
        value.set("repository", Value::from(feed.repository.clone()));
        value.set("layout_regex", Value::from(feed.layout_regex.clone()));
    }
}

pub struct AwsElasticContainerRegistry;

impl FeedKind for AwsElasticContainerRegistry {
    const TYPE_NAME: &'static str = "octopusdeploy_aws_elastic_container_registry";
    const DISPLAY: &'static str = "AWS Elastic Container Registry";
    const FEED_TYPE: &'static str = "AwsElasticContainerRegistry";
    const URI_AND_LOGIN: bool = false;

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("region")
                .required()
                .validate(Validator::NotEmpty)
                .description("The AWS region of the registry."),
            Attribute::string("access_key")
                .required()
                .validate(Validator::NotEmpty)
                .description("The AWS access key used to pull from the registry."),
            Attribute::string("secret_key")
                .required()
                .sensitive()
                .validate(Validator::NotEmpty)
                .description("The AWS secret key used to pull from the registry."),
        ]
    }

    fn expand_into(value: &Value, feed: &mut Feed) {
        feed.region = value.get_string("region");
        feed.access_key = value.get_string("access_key");
        feed.secret_key = Some(SensitiveValue::new(value.get_string("secret_key")));
    }

    fn flatten_into(feed: &Feed, value: &mut Value) {
        value.set("region", Value::from(feed.region.clone()));
        value.set("access_key", Value::from(feed.access_key.clone()));
        value.set("secret_key", Value::Null);
    }
}
