use terraform_provider_octopusdeploy::octopus::types::{ENVIRONMENTS, Environment, Resources, SPACES, Space};
use terraform_provider_octopusdeploy::{Credential, ListQuery, OctopusClient, OctopusError};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_key_client(server: &MockServer, space: Option<&str>) -> OctopusClient {
    OctopusClient::new(
        &server.uri(),
        Credential::ApiKey("API-TEST".to_string()),
        space.map(str::to_string),
    )
    .unwrap()
}

fn environment(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "Id": id,
        "SpaceId": "Spaces-1",
        "Name": name,
        "Slug": name.to_lowercase(),
        "Description": "",
        "SortOrder": 0,
        "UseGuidedFailure": false,
        "AllowDynamicInfrastructure": false,
        "ExtensionSettings": []
    })
}

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/environments/Environments-1"))
        .and(header("X-Octopus-ApiKey", "API-TEST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment("Environments-1", "Development")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let env: Environment = client.get(ENVIRONMENTS, None, "Environments-1").await.unwrap();

    assert_eq!(env.id.as_deref(), Some("Environments-1"));
    assert_eq!(env.name, "Development");
}

#[tokio::test]
async fn test_access_token_uses_bearer_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spaces/Spaces-1"))
        .and(header("Authorization", "Bearer eyJ-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Id": "Spaces-1",
            "Name": "Default",
            "IsDefault": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OctopusClient::new(
        &mock_server.uri(),
        Credential::AccessToken("eyJ-token".to_string()),
        None,
    )
    .unwrap();
    let space: Space = client.get(SPACES, None, "Spaces-1").await.unwrap();

    assert!(space.is_default);
}

#[tokio::test]
async fn test_create_posts_pascal_case_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Spaces-2/environments"))
        .and(header_exists("X-Octopus-ApiKey"))
        .and(body_partial_json(serde_json::json!({
            "Name": "Staging",
            "UseGuidedFailure": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(environment("Environments-7", "Staging")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let created = client
        .create(
            ENVIRONMENTS,
            Some("Spaces-2"),
            &Environment {
                name: "Staging".to_string(),
                use_guided_failure: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("Environments-7"));
}

#[tokio::test]
async fn test_not_found_maps_to_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/environments/Environments-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "ErrorMessage": "The resource 'Environments-404' was not found."
        })))
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let result: Result<Environment, _> = client.get(ENVIRONMENTS, None, "Environments-404").await;

    match result {
        Err(OctopusError::NotFound { resource }) => {
            assert_eq!(resource, "Spaces-1/environments/Environments-404");
        }
        other => panic!("Expected NotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spaces/Spaces-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "ErrorMessage": "You must be logged in to perform this action."
        })))
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, None);
    let result: Result<Space, _> = client.get(SPACES, None, "Spaces-1").await;

    match result {
        Err(OctopusError::Auth { message }) => {
            assert_eq!(message, "You must be logged in to perform this action.");
            assert!(!message.contains("API-TEST"));
        }
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_errors_are_joined() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Spaces-1/environments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ErrorMessage": "There was a problem with your request.",
            "Errors": ["The name 'Staging' is already in use."]
        })))
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let result = client
        .create(
            ENVIRONMENTS,
            None,
            &Environment {
                name: "Staging".to_string(),
                ..Default::default()
            },
        )
        .await;

    match result {
        Err(OctopusError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(
                message,
                "There was a problem with your request.: The name 'Staging' is already in use."
            );
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_sends_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/environments"))
        .and(query_param("partialName", "Prod"))
        .and(query_param("take", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Items": [environment("Environments-3", "Production")],
            "TotalResults": 1,
            "ItemsPerPage": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let query = ListQuery {
        take: Some(5),
        partial_name: Some("Prod".to_string()),
        ..Default::default()
    };
    let page: Resources<Environment> = client.list(ENVIRONMENTS, None, &query).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_results, 1);
    assert_eq!(page.items[0].name, "Production");
}

#[tokio::test]
async fn test_list_all_walks_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/environments"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Items": [environment("Environments-1", "Dev"), environment("Environments-2", "Test")],
            "TotalResults": 3,
            "ItemsPerPage": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/environments"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Items": [environment("Environments-3", "Production")],
            "TotalResults": 3,
            "ItemsPerPage": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    let query = ListQuery {
        take: Some(2),
        ..Default::default()
    };
    let all: Vec<Environment> = client.list_all(ENVIRONMENTS, None, &query).await.unwrap();

    let names: Vec<&str> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Dev", "Test", "Production"]);
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/Spaces-1/environments/Environments-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-1"));
    client.delete(ENVIRONMENTS, None, "Environments-1").await.unwrap();
}

#[tokio::test]
async fn test_system_collections_ignore_space() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Items": [{ "Id": "Spaces-1", "Name": "Default" }],
            "TotalResults": 1,
            "ItemsPerPage": 30
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = api_key_client(&mock_server, Some("Spaces-9"));
    let spaces: Vec<Space> = client.list_all(SPACES, None, &ListQuery::default()).await.unwrap();

    assert_eq!(spaces.len(), 1);
    assert_eq!(spaces[0].name, "Default");
}
