pub mod analytics_service;
pub mod auth_service;
pub mod category_service;
pub mod content_service;
pub mod course_service;
pub mod course_workflow;
pub mod enrollment_service;
pub mod instructor_request_service;
pub mod mail;
pub mod progress_service;
pub mod query;
pub mod review_service;
pub mod token_service;
pub mod user_admin_service;
