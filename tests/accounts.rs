mod common;

use actix_web::{http::StatusCode, test};
use sea_orm::*;
use serde_json::{Value, json};

use common::{PASSWORD, TestContext, init_app};
use learning_platform::models::users::UserRole;
use learning_platform::models::{email_verification_tokens, password_reset_tokens};

#[actix_web::test]
async fn test_register_verify_login_refresh() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);

    // Le rôle envoyé par le client est ignoré, le domaine est normalisé
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/register")
        .set_json(json!({
            "email": "alice@Example.COM",
            "password": "CorrectHorse42",
            "password_confirm": "CorrectHorse42",
            "first_name": "Alice",
            "last_name": "Martin",
            "role": "ADMIN",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["role"], "STUDENT");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["email_verified"], false);

    let verification = ctx
        .recorder
        .wait_for("email_verification", "alice@example.com")
        .await;
    assert!(verification.is_some());

    // Pas de login avant vérification
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .set_json(json!({ "email": "alice@example.com", "password": "CorrectHorse42" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Please verify your email address before logging in."
    );

    let token = email_verification_tokens::Entity::find()
        .one(ctx.db())
        .await
        .unwrap()
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/verify-email")
        .set_json(json!({ "token": token.token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Le token est consommé
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/verify-email")
        .set_json(json!({ "token": token.token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .set_json(json!({ "email": "alice@EXAMPLE.com", "password": "CorrectHorse42" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email_verified"], true);
    let access = body["data"]["tokens"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["tokens"]["refresh"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/profile")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["full_name"], "Alice Martin");

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/token/refresh")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["access"].as_str().is_some());

    // Un access token n'est pas un refresh token
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/token/refresh")
        .set_json(json!({ "refresh": access }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_rejects_duplicate_email_and_weak_password() {
    let ctx = TestContext::new().await;
    ctx.create_user("taken@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/register")
        .set_json(json!({
            "email": "taken@example.com",
            "password": "12345678",
            "password_confirm": "12345678",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"]["details"]["email"][0],
        "user with this email already exists."
    );
    assert!(body["error"]["details"]["password"].is_array());

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/register")
        .set_json(json!({
            "email": "new@example.com",
            "password": "CorrectHorse42",
            "password_confirm": "CorrectHorse43",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Password fields didn't match.");
}

#[actix_web::test]
async fn test_password_reset_token_is_single_use() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("bob@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    // Adresse inconnue : même réponse, aucun email
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/reset")
        .set_json(json!({ "email": "nobody@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/reset")
        .set_json(json!({ "email": "bob@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(ctx.recorder.wait_for("password_reset", "bob@example.com").await.is_some());
    assert!(ctx.recorder.sent_with_template("password_reset").len() == 1);

    let reset = password_reset_tokens::Entity::find()
        .filter(password_reset_tokens::Column::UserId.eq(user.id))
        .one(ctx.db())
        .await
        .unwrap()
        .unwrap();

    let confirm = json!({
        "token": reset.token,
        "new_password": "BrandNewPass99",
        "new_password_confirm": "BrandNewPass99",
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/reset/confirm")
        .set_json(&confirm)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/reset/confirm")
        .set_json(&confirm)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Ancien mot de passe refusé, nouveau accepté
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .set_json(json!({ "email": "bob@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .set_json(json!({ "email": "bob@example.com", "password": "BrandNewPass99" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_change_password_and_profile_update() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("carol@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/change")
        .insert_header(ctx.auth(&user))
        .set_json(json!({
            "old_password": "wrong-password",
            "new_password": "AnotherPass77",
            "new_password_confirm": "AnotherPass77",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/password/change")
        .insert_header(ctx.auth(&user))
        .set_json(json!({
            "old_password": PASSWORD,
            "new_password": "AnotherPass77",
            "new_password_confirm": "AnotherPass77",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri("/api/v1/accounts/profile")
        .insert_header(ctx.auth(&user))
        .set_json(json!({ "bio": "Learning Rust", "phone_number": "0600000000" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["bio"], "Learning Rust");
    assert_eq!(body["data"]["first_name"], "Test");

    let req = test::TestRequest::get().uri("/api/v1/accounts/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_user_management() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let student = ctx.create_user("dave@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/users?role=STUDENT")
        .insert_header(ctx.auth(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["email"], "dave@example.com");

    // Un étudiant n'a pas accès à la gestion des utilisateurs
    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/users")
        .insert_header(ctx.auth(&student))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/accounts/users/{}/update_role", student.id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "role": "INSTRUCTOR" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "User role updated to INSTRUCTOR.");
    assert_eq!(ctx.reload_user(student.id).await.role, UserRole::Instructor);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/accounts/users/{}/deactivate", student.id))
        .insert_header(ctx.auth(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!ctx.reload_user(student.id).await.is_active);

    // Le compte désactivé ne peut plus s'authentifier
    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/profile")
        .insert_header(ctx.auth(&student))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Le dernier admin actif ne peut pas être désactivé
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/accounts/users/{}/deactivate", admin.id))
        .insert_header(ctx.auth(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Cannot deactivate the last active admin.");

    // Ni rétrogradé
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/accounts/users/{}/update_role", admin.id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "role": "STUDENT" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Cannot change the role of the last active admin."
    );
    assert_eq!(ctx.reload_user(admin.id).await.role, UserRole::Admin);

    // Avec un second admin actif, le changement passe
    ctx.create_user("root@example.com", UserRole::Admin).await;
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/accounts/users/{}/update_role", admin.id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "role": "INSTRUCTOR" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_user_list_ordering() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    ctx.create_user("zoe@example.com", UserRole::Student).await;
    ctx.create_user("bob@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/users?ordering=email")
        .insert_header(ctx.auth(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"][0]["email"], "admin@example.com");
    assert_eq!(body["data"][2]["email"], "zoe@example.com");

    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/users?ordering=-email&role=STUDENT")
        .insert_header(ctx.auth(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["email"], "zoe@example.com");
    assert_eq!(body["data"][1]["email"], "bob@example.com");

    // Champ inconnu : ordre par défaut, pas d'erreur
    let req = test::TestRequest::get()
        .uri("/api/v1/accounts/users?ordering=password")
        .insert_header(ctx.auth(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_and_malformed_requests() {
    let ctx = TestContext::new().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/health/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");

    let req = test::TestRequest::post()
        .uri("/api/v1/accounts/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/courses/courses/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
