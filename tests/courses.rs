mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

use common::{TestContext, init_app};
use learning_platform::models::users::UserRole;

#[actix_web::test]
async fn test_course_lifecycle_from_draft_to_published() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("ivy@example.com", UserRole::Instructor).await;
    let student = ctx.create_user("jack@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    // Seuls les instructeurs créent des cours
    let req = test::TestRequest::post()
        .uri("/api/v1/courses/courses")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "title": "Not allowed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Le statut envoyé est ignoré à la création
    let req = test::TestRequest::post()
        .uri("/api/v1/courses/courses")
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({
            "title": "Rust for Network Engineers",
            "description": "Sockets, async and protocols.",
            "price": "49.99",
            "total_seats": 2,
            "status": "PUBLISHED",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["slug"], "rust-for-network-engineers");
    assert_eq!(body["data"]["price"], "49.99");
    assert_eq!(body["data"]["is_free"], false);
    assert_eq!(body["data"]["available_seats"], 2);
    let course_id = body["data"]["id"].as_str().unwrap().to_string();

    // Soumission impossible sans section
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/submit_for_review", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Course must have at least one section before submission."
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/sections", course_id))
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "title": "Introduction" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["order"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/submit_for_review", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Invisible du public tant qu'il n'est pas publié
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/v1/courses/courses").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "PENDING");

    // APPROVED puis PUBLISHED : published_at n'est posé qu'à la publication
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/review", course_id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "status": "APPROVED", "review_notes": "Looks good" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Course approved successfully.");
    assert!(body["data"]["published_at"].is_null());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/review", course_id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "status": "PUBLISHED" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "PUBLISHED");
    assert!(body["data"]["published_at"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/v1/courses/courses?search=network")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Rust for Network Engineers");
    assert_eq!(body["data"][0]["total_classes"], 0);

    // Un cours publié ne repasse pas en revue
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/review", course_id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "status": "REJECTED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_course_ownership_rules() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user("kate@example.com", UserRole::Instructor).await;
    let other = ctx.create_user("liam@example.com", UserRole::Instructor).await;
    let course_id = ctx.create_draft_course(&owner, 10).await;
    let app = init_app!(ctx);

    // Le brouillon d'un autre instructeur est invisible
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&other))
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&owner))
        .set_json(json!({ "title": "Renamed course", "venue": "Room 42" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Course updated successfully.");
    assert_eq!(body["data"]["title"], "Renamed course");
    assert_eq!(body["data"]["venue"], "Room 42");

    let req = test::TestRequest::get()
        .uri("/api/v1/courses/my-courses")
        .insert_header(ctx.auth(&other))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/courses/my-courses")
        .insert_header(ctx.auth(&owner))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_status_edits_follow_the_review_workflow() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("nina@example.com", UserRole::Instructor).await;
    let published_id = ctx.create_published_course(&instructor, &admin, 10).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses/courses")
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "title": "Empty outline", "description": "No sections yet." }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let empty_id = body["data"]["id"].as_str().unwrap().to_string();

    // Pas de PENDING par édition sans section
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/courses/courses/{}", empty_id))
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "status": "PENDING" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"]["status"][0],
        "Course must have at least one section before submission."
    );

    // Un cours publié ne redevient pas brouillon par son instructeur
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/courses/courses/{}", published_id))
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "status": "DRAFT" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", published_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "PUBLISHED");

    // Avec une section, l'édition DRAFT -> PENDING passe
    let draft_id = ctx.create_draft_course(&instructor, 5).await;
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/courses/courses/{}", draft_id))
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "status": "PENDING" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "PENDING");
}

#[actix_web::test]
async fn test_lesson_access_rules() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("mia@example.com", UserRole::Instructor).await;
    let student = ctx.create_user("noah@example.com", UserRole::Student).await;
    let course_id = ctx.create_draft_course(&instructor, 10).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}/sections", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let section_id = body["data"][0]["id"].as_str().unwrap().to_string();
    let lessons_uri = format!(
        "/api/v1/courses/courses/{}/sections/{}/lessons",
        course_id, section_id
    );

    let req = test::TestRequest::post()
        .uri(&lessons_uri)
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "title": "Preview", "lesson_type": "VIDEO", "is_preview": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let preview_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&lessons_uri)
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "title": "Members only", "lesson_type": "TEXT", "content": "Secret" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["order"], 2);
    let private_id = body["data"]["id"].as_str().unwrap().to_string();

    // Deux leçons ne partagent pas le même ordre dans une section
    let req = test::TestRequest::post()
        .uri(&lessons_uri)
        .insert_header(ctx.auth(&instructor))
        .set_json(json!({ "title": "Clash", "order": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Un étudiant ne modifie pas le contenu
    let req = test::TestRequest::post()
        .uri(&lessons_uri)
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "title": "Intruder" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/submit_for_review", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    test::call_service(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/courses/{}/review", course_id))
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "status": "PUBLISHED" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", lessons_uri, preview_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", lessons_uri, private_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", lessons_uri, private_id))
        .insert_header(ctx.auth(&student))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", lessons_uri, private_id))
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["content"], "Secret");
}

#[actix_web::test]
async fn test_categories_admin_only_and_unique() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let student = ctx.create_user("olga@example.com", UserRole::Student).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses/categories")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "name": "Security" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses/categories")
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "name": "Web Development", "icon": "globe" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["slug"], "web-development");
    assert_eq!(body["data"]["course_count"], 0);
    let category_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/courses/categories")
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "name": "Web development" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Category with this name already exists.");

    let req = test::TestRequest::get().uri("/api/v1/courses/categories").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses/categories")
        .insert_header(ctx.auth(&admin))
        .set_json(json!({ "name": "Algorithms" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Tri par nom par défaut, inversable avec ?ordering=
    let req = test::TestRequest::get().uri("/api/v1/courses/categories").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["name"], "Algorithms");

    let req = test::TestRequest::get()
        .uri("/api/v1/courses/categories?ordering=-name")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["name"], "Web Development");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/courses/categories/{}", category_id))
        .insert_header(ctx.auth(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/categories/{}", category_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
