use candidatura::error::Error;
use candidatura::models::{CandidaturaStatus, NewCandidatura};
use candidatura::services::{AuthApi, DataApi, FileStore, SupabaseService};
use candidatura::Supabase;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> SupabaseService {
    SupabaseService::new(Supabase::new(&server.uri(), "fake-key"))
}

fn new_candidatura() -> NewCandidatura {
    NewCandidatura {
        name: "Ana Machava".into(),
        age: 22,
        country: Some("Moçambique".into()),
        province: Some("Maputo".into()),
        email: "ana@example.com".into(),
        whatsapp: "+258840000000".into(),
        foto_url: None,
        foto_path: None,
        foto_nome: None,
        termos_aceitos: true,
        status: CandidaturaStatus::Pendente,
        notas: String::new(),
    }
}

#[tokio::test]
async fn create_candidatura_posts_row_and_returns_representation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/candidaturas"))
        .and(header("apikey", "fake-key"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!([{ "nome": "Ana Machava", "status": "pendente" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 17,
            "nome": "Ana Machava",
            "idade": 22,
            "email": "ana@example.com",
            "whatsapp": "+258840000000",
            "foto_url": null,
            "termos_aceitos": true,
            "status": "pendente",
            "notas": "",
            "created_at": "2024-05-01T10:00:00+00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = service(&server)
        .create_candidatura(&new_candidatura())
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 17);
    assert_eq!(rows[0]["status"], "pendente");
}

#[tokio::test]
async fn insert_failure_is_a_database_error_with_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/candidaturas"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "PGRST204",
            "message": "Could not find the 'foto_nome' column of 'candidaturas'"
        })))
        .mount(&server)
        .await;

    let err = service(&server)
        .create_candidatura(&new_candidatura())
        .await
        .unwrap_err();

    match err {
        Error::Database(msg) => assert!(msg.contains("foto_nome")),
        other => panic!("Expected database error, got {:?}", other),
    }
}

#[tokio::test]
async fn get_models_filters_active_and_embeds_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/models"))
        .and(query_param("select", "*,user:users(full_name,email)"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "m-1",
            "user_id": "u-1",
            "is_active": true,
            "bio": "Maputo",
            "user": { "full_name": "Luana", "email": "luana@example.com" }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let models = service(&server).get_models().await.unwrap();
    assert_eq!(models[0].extra["bio"], "Maputo");
}

#[tokio::test]
async fn get_model_by_id_asks_for_a_single_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/models"))
        .and(query_param("id", "eq.m-1"))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m-1",
            "is_active": true,
            "model_services": [{ "service": { "id": 3, "name": "Fotografia" } }]
        })))
        .mount(&server)
        .await;

    let model = service(&server).get_model_by_id("m-1").await.unwrap();
    let service = model.model_services[0].service.as_ref().unwrap();
    assert_eq!(service.id, "3");
    assert_eq!(service.name, "Fotografia");
}

#[tokio::test]
async fn conversation_matches_both_directions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param(
            "or",
            "(and(sender_id.eq.a,receiver_id.eq.b),and(sender_id.eq.b,receiver_id.eq.a))",
        ))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let messages = service(&server).get_conversation("a", "b").await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn upload_returns_path_inside_bucket() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/candidaturas-fotos/fotos/1_rosto.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "candidaturas-fotos/fotos/1_rosto.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let stored = service
        .upload_file("candidaturas-fotos", "fotos/1_rosto.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap();

    assert_eq!(stored, "fotos/1_rosto.png");
    assert_eq!(
        service.public_url("candidaturas-fotos", &stored).unwrap(),
        format!("{}/storage/v1/object/public/candidaturas-fotos/fotos/1_rosto.png", server.uri())
    );
}

#[tokio::test]
async fn sign_in_stores_session_and_later_queries_use_its_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "refresh_token": "refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "ana@example.com" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(header("Authorization", "Bearer user-token"))
        .and(query_param("client_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let mut changes = AuthApi::subscribe(&service);

    let session = service.sign_in("ana@example.com", "secret").await.unwrap();
    assert_eq!(session.user.id, "user-1");
    assert_eq!(service.current_session().unwrap().access_token, "user-token");
    assert!(changes.try_recv().is_ok());

    let bookings = service.get_user_bookings("user-1").await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn sign_in_without_credentials_makes_no_request() {
    let server = MockServer::start().await;

    let err = service(&server).sign_in("", "").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_candidatura_patches_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/candidaturas"))
        .and(query_param("id", "eq.17"))
        .and(body_partial_json(json!({ "status": "aprovada" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 17,
            "nome": "Ana Machava",
            "idade": 22,
            "email": "ana@example.com",
            "whatsapp": "+258840000000",
            "status": "aprovada",
            "notas": "entrevista marcada"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let update = candidatura::models::CandidaturaUpdate {
        status: Some(CandidaturaStatus::Aprovada),
        notas: Some("entrevista marcada".into()),
    };
    let rows = service(&server).update_candidatura("17", &update).await.unwrap();

    assert_eq!(rows[0].status, CandidaturaStatus::Aprovada);
    assert_eq!(rows[0].notas.as_deref(), Some("entrevista marcada"));
}

#[tokio::test]
async fn remove_file_deletes_by_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/photos"))
        .and(body_partial_json(json!({ "prefixes": ["candidaturas/1_rosto.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .remove_file("photos", "candidaturas/1_rosto.png")
        .await
        .unwrap();
}

async fn signed_in(server: &MockServer) -> SupabaseService {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "ana@example.com" }
        })))
        .mount(server)
        .await;

    let service = service(server);
    service.sign_in("ana@example.com", "secret").await.unwrap();
    service
}

#[tokio::test]
async fn get_user_asks_the_backend_with_the_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "ana@example.com",
            "user_metadata": { "full_name": "Ana Machava" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = signed_in(&server).await.get_user().await.unwrap();
    assert_eq!(user.display_name(), "Ana Machava");
}

#[tokio::test]
async fn get_user_with_a_revoked_token_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let err = signed_in(&server).await.get_user().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "{err:?}");
}

#[tokio::test]
async fn signed_in_upload_carries_the_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/photos/candidaturas/1_rosto.png"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "photos/candidaturas/1_rosto.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = signed_in(&server).await;
    let stored = service
        .upload_file("photos", "candidaturas/1_rosto.png", vec![1], "image/png")
        .await
        .unwrap();
    assert_eq!(stored, "candidaturas/1_rosto.png");
}
