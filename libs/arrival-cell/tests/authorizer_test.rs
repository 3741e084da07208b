use assert_matches::assert_matches;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arrival_cell::{AuthorizationError, EncounterAuthorizer, FhirAuthorizer, FhirCredential};
use shared_utils::test_utils::{MockFhirResponses, TestConfig};

fn credential(base_url: &str) -> FhirCredential {
    FhirCredential {
        base_url: base_url.to_string(),
        access_token: "token-1".to_string(),
    }
}

#[tokio::test]
async fn test_successful_encounter_read_authorizes() {
    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Encounter/E1"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockFhirResponses::encounter_response("E1")))
        .expect(1)
        .mount(&fhir)
        .await;

    let authorizer = FhirAuthorizer::new(TestConfig::trusting(&fhir.uri()).to_arc()).unwrap();

    assert!(authorizer.authorize(&credential(&fhir.uri()), "E1").await.is_ok());
}

#[tokio::test]
async fn test_trailing_slash_on_origin_is_tolerated() {
    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Encounter/E1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fhir)
        .await;

    let authorizer = FhirAuthorizer::new(TestConfig::trusting(&fhir.uri()).to_arc()).unwrap();
    let with_slash = format!("{}/", fhir.uri());

    assert!(authorizer.authorize(&credential(&with_slash), "E1").await.is_ok());
}

#[tokio::test]
async fn test_non_ok_status_is_denied() {
    for status in [201u16, 401, 404, 500] {
        let fhir = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Encounter/E1"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&fhir)
            .await;

        let authorizer = FhirAuthorizer::new(TestConfig::trusting(&fhir.uri()).to_arc()).unwrap();
        let result = authorizer.authorize(&credential(&fhir.uri()), "E1").await;

        assert_matches!(result, Err(AuthorizationError::Denied { .. }), "status {}", status);
    }
}

#[tokio::test]
async fn test_redirect_off_allow_list_is_not_followed() {
    let elsewhere = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Encounter/E1"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/Encounter/E1", elsewhere.uri()).as_str()),
        )
        .expect(1)
        .mount(&fhir)
        .await;

    let authorizer = FhirAuthorizer::new(TestConfig::trusting(&fhir.uri()).to_arc()).unwrap();
    let result = authorizer.authorize(&credential(&fhir.uri()), "E1").await;

    assert_matches!(result, Err(AuthorizationError::Denied { .. }));
}

#[tokio::test]
async fn test_untrusted_origin_is_never_contacted() {
    let fhir = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fhir)
        .await;

    let authorizer = FhirAuthorizer::new(TestConfig::default().to_arc()).unwrap();
    let result = authorizer.authorize(&credential(&fhir.uri()), "E1").await;

    assert_matches!(result, Err(AuthorizationError::UntrustedOrigin(origin)) if origin == fhir.uri());
}

#[tokio::test]
async fn test_origin_prefix_is_not_trusted() {
    let fhir = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fhir)
        .await;

    let authorizer = FhirAuthorizer::new(TestConfig::trusting(&fhir.uri()).to_arc()).unwrap();
    let longer = format!("{}/other-tenant", fhir.uri());

    assert_matches!(
        authorizer.authorize(&credential(&longer), "E1").await,
        Err(AuthorizationError::UntrustedOrigin(_))
    );
}
