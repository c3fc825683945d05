mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

use common::{TestContext, init_app};
use learning_platform::models::users::UserRole;

#[actix_web::test]
async fn test_seats_stay_within_bounds() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("paul@example.com", UserRole::Instructor).await;
    let first = ctx.create_user("quinn@example.com", UserRole::Student).await;
    let second = ctx.create_user("rose@example.com", UserRole::Student).await;
    let course_id = ctx.create_published_course(&instructor, &admin, 1).await;
    let draft_id = ctx.create_draft_course(&instructor, 5).await;
    let app = init_app!(ctx);

    // Pas d'inscription à un cours non publié
    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "course": draft_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["course"]["available_seats"], 0);
    assert_eq!(body["data"]["course"]["enrollment_count"], 1);
    assert_eq!(body["data"]["course"]["is_full"], true);
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    // Idempotent pour le même étudiant
    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Already enrolled");
    assert_eq!(body["data"]["id"], enrollment_id.as_str());
    assert_eq!(body["data"]["course"]["available_seats"], 0);

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&second))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "This course is full.");

    // Un autre étudiant ne voit pas l'inscription
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/enrollments/enrollments/{}", enrollment_id))
        .insert_header(ctx.auth(&second))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/enrollments/enrollments/{}", enrollment_id))
        .insert_header(ctx.auth(&first))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&second))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["course"]["available_seats"], 0);
    assert_eq!(body["data"]["course"]["total_seats"], 1);
    assert_eq!(body["data"]["course"]["enrollment_count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&first))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_progress_completion_issues_certificate() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("sam@example.com", UserRole::Instructor).await;
    let student = ctx.create_user("tina@example.com", UserRole::Student).await;
    let course_id = ctx.create_published_course(&instructor, &admin, 10).await;
    let other_course_id = ctx.create_published_course(&instructor, &admin, 10).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let section_id = body["data"]["sections"][0]["id"].as_str().unwrap().to_string();
    let lessons_uri = format!(
        "/api/v1/courses/courses/{}/sections/{}/lessons",
        course_id, section_id
    );

    let mut lesson_ids = Vec::new();
    for title in ["Part one", "Part two"] {
        let req = test::TestRequest::post()
            .uri(&lessons_uri)
            .insert_header(ctx.auth(&instructor))
            .set_json(json!({ "title": title, "lesson_type": "VIDEO", "video_duration": 600 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        lesson_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "course": course_id }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/enrollments")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "course": other_course_id }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let other_enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    // La leçon doit appartenir au cours de l'inscription
    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/progress")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "enrollment": other_enrollment_id, "lesson": lesson_ids[0] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Lesson does not belong to this course.");

    let mut progress_ids = Vec::new();
    for lesson_id in &lesson_ids {
        let req = test::TestRequest::post()
            .uri("/api/v1/enrollments/progress")
            .insert_header(ctx.auth(&student))
            .set_json(json!({ "enrollment": enrollment_id, "lesson": lesson_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["completed"], false);
        progress_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    // Même couple inscription/leçon : on récupère l'existant
    let req = test::TestRequest::post()
        .uri("/api/v1/enrollments/progress")
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "enrollment": enrollment_id, "lesson": lesson_ids[0] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["id"], progress_ids[0].as_str());

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/enrollments/progress/{}", progress_ids[0]))
        .insert_header(ctx.auth(&student))
        .set_json(json!({ "watched_duration": 300 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["watched_duration"], 300);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/enrollments/progress/{}/mark_complete", progress_ids[0]))
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Lesson marked as complete");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/enrollments/enrollments/{}", enrollment_id))
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["progress_percentage"], 50.0);
    assert!(body["data"]["completed_at"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/v1/enrollments/certificates")
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/enrollments/progress/{}/mark_complete", progress_ids[1]))
        .insert_header(ctx.auth(&student))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/enrollments/enrollments/{}", enrollment_id))
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["progress_percentage"], 100.0);
    assert!(body["data"]["completed_at"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/v1/enrollments/certificates")
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["course"], course_id.to_string());
    assert_eq!(body["data"][0]["certificate_number"].as_str().unwrap().len(), 12);

    // Marquer à nouveau ne crée pas de second certificat
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/enrollments/progress/{}/mark_complete", progress_ids[1]))
        .insert_header(ctx.auth(&student))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/enrollments/certificates")
        .insert_header(ctx.auth(&student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
}

#[actix_web::test]
async fn test_reviews_keep_course_rating_consistent() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin@example.com", UserRole::Admin).await;
    let instructor = ctx.create_user("uma@example.com", UserRole::Instructor).await;
    let first = ctx.create_user("victor@example.com", UserRole::Student).await;
    let second = ctx.create_user("wendy@example.com", UserRole::Student).await;
    let outsider = ctx.create_user("xavier@example.com", UserRole::Student).await;
    let course_id = ctx.create_published_course(&instructor, &admin, 10).await;
    let app = init_app!(ctx);

    let reviews_uri = format!("/api/v1/courses/courses/{}/reviews", course_id);

    for student in [&first, &second] {
        let req = test::TestRequest::post()
            .uri("/api/v1/enrollments/enrollments")
            .insert_header(ctx.auth(student))
            .set_json(json!({ "course": course_id }))
            .to_request();
        test::call_service(&app, req).await;
    }

    // Il faut être inscrit pour noter
    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(ctx.auth(&outsider))
        .set_json(json!({ "rating": 5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "You must be enrolled in this course to leave a review."
    );

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "rating": 6 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "rating": 4, "review_text": "Solid content" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let first_review = body["data"]["id"].as_str().unwrap().to_string();

    // Une seule note par étudiant
    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "rating": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(ctx.auth(&second))
        .set_json(json!({ "rating": 5 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let second_review = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["average_rating"], 4.5);
    assert_eq!(body["data"]["total_reviews"], 2);

    // Tri par note
    let req = test::TestRequest::get()
        .uri(&format!("{}?ordering=rating", reviews_uri))
        .insert_header(ctx.auth(&first))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["id"], first_review.as_str());

    let req = test::TestRequest::get()
        .uri(&format!("{}?ordering=-rating", reviews_uri))
        .insert_header(ctx.auth(&first))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["id"], second_review.as_str());

    // On ne modifie que sa propre note
    let req = test::TestRequest::patch()
        .uri(&format!("{}/{}", reviews_uri, second_review))
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "rating": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("{}/{}", reviews_uri, first_review))
        .insert_header(ctx.auth(&first))
        .set_json(json!({ "rating": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["average_rating"], 3.5);

    let req = test::TestRequest::delete()
        .uri(&format!("{}/{}", reviews_uri, second_review))
        .insert_header(ctx.auth(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/courses/{}", course_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["average_rating"], 2.0);
    assert_eq!(body["data"]["total_reviews"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/analytics/instructor")
        .insert_header(ctx.auth(&instructor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_courses"], 1);
    assert_eq!(body["data"]["published_courses"], 1);
    assert_eq!(body["data"]["total_enrollments"], 2);
    assert_eq!(body["data"]["total_reviews"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/analytics/admin")
        .insert_header(ctx.auth(&first))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/analytics/admin")
        .insert_header(ctx.auth(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_users"], 5);
    assert_eq!(body["data"]["total_students"], 3);
    assert_eq!(body["data"]["published_courses"], 1);
    assert_eq!(body["data"]["total_enrollments"], 2);
}
