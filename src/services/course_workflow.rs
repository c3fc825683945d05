// ============================================================================
// WORKFLOW DES COURS : transitions de statut et places disponibles
// ============================================================================
//
// Cycle de vie : DRAFT -> PENDING -> {APPROVED -> PUBLISHED, REJECTED}
//
// Règles:
//   - Soumission (instructeur propriétaire) : DRAFT -> PENDING, au moins 1 section
//   - Revue admin : depuis PENDING ou APPROVED, vers APPROVED/PUBLISHED/REJECTED
//   - Édition directe par un non-admin : seul DRAFT -> PENDING est permis,
//     avec les mêmes conditions que la soumission
//   - 0 <= available_seats <= total_seats après chaque écriture
//
// Fonctions pures, sans accès BD : testées unitairement ci-dessous.
//
// ============================================================================

use uuid::Uuid;

use crate::models::courses::{self, CourseStatus};
use crate::utils::error::ApiError;

/// Vérifie qu'un cours peut être soumis à la revue
pub fn check_submit(
    course: &courses::Model,
    requester: Uuid,
    section_count: u64,
) -> Result<(), ApiError> {
    if course.instructor_id != requester {
        return Err(ApiError::forbidden(
            "Only the course instructor can submit for review.",
        ));
    }

    if course.status != CourseStatus::Draft {
        return Err(ApiError::bad_request(
            "Only DRAFT courses can be submitted for review.",
        ));
    }

    if section_count == 0 {
        return Err(ApiError::bad_request(
            "Course must have at least one section before submission.",
        ));
    }

    Ok(())
}

/// Vérifie une décision de revue admin
pub fn check_review(current: CourseStatus, target: CourseStatus) -> Result<(), ApiError> {
    if !matches!(current, CourseStatus::Pending | CourseStatus::Approved) {
        return Err(ApiError::bad_request(
            "Only PENDING or APPROVED courses can be reviewed.",
        ));
    }

    if !matches!(
        target,
        CourseStatus::Approved | CourseStatus::Published | CourseStatus::Rejected
    ) {
        return Err(ApiError::field(
            "status",
            "Status must be APPROVED, PUBLISHED, or REJECTED.",
        ));
    }

    Ok(())
}

/// Vérifie un changement de statut fait par édition directe du cours
pub fn check_edit_status(
    current: CourseStatus,
    target: CourseStatus,
    is_admin: bool,
    section_count: u64,
) -> Result<(), ApiError> {
    if is_admin {
        return Ok(());
    }

    if current != CourseStatus::Draft || target != CourseStatus::Pending {
        return Err(ApiError::field(
            "status",
            "You can only move a DRAFT course to PENDING.",
        ));
    }

    if section_count == 0 {
        return Err(ApiError::field(
            "status",
            "Course must have at least one section before submission.",
        ));
    }

    Ok(())
}

/// Ramène les places dans les bornes : total >= 0 et 0 <= available <= total
pub fn clamp_seats(total_seats: i32, available_seats: i32) -> (i32, i32) {
    let total = total_seats.max(0);
    (total, available_seats.clamp(0, total))
}

/// Une place prise à l'inscription (jamais sous 0)
pub fn take_seat(available_seats: i32) -> i32 {
    (available_seats - 1).max(0)
}

/// Une place libérée à la désinscription (jamais au-dessus du total)
pub fn release_seat(available_seats: i32, total_seats: i32) -> i32 {
    (available_seats + 1).min(total_seats).max(0)
}

/// `published_at` n'est posé qu'à la première publication
pub fn published_at_after(
    target: CourseStatus,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    now: chrono::DateTime<chrono::Utc>,
) -> Option<chrono::DateTime<chrono::Utc>> {
    match (target, published_at) {
        (CourseStatus::Published, None) => Some(now),
        (_, existing) => existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn course(status: CourseStatus, instructor_id: Uuid) -> courses::Model {
        let now = Utc::now();
        courses::Model {
            id: Uuid::new_v4(),
            title: "Rust 101".to_string(),
            slug: "rust-101".to_string(),
            description: String::new(),
            short_description: String::new(),
            instructor_id,
            category_id: None,
            difficulty_level: Default::default(),
            price_cents: 0,
            is_free: true,
            thumbnail: None,
            preview_video: String::new(),
            duration_hours: 0,
            requirements: String::new(),
            learning_outcomes: String::new(),
            target_audience: String::new(),
            who_can_join: String::new(),
            status,
            reviewed_by: None,
            review_notes: String::new(),
            reviewed_at: None,
            enrollment_count: 0,
            average_rating: 0.0,
            total_reviews: 0,
            total_seats: 30,
            available_seats: 30,
            class_starts: None,
            admission_deadline: None,
            schedule: String::new(),
            venue: String::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    #[test]
    fn test_submit_requires_owner_draft_and_sections() {
        let owner = Uuid::new_v4();
        let draft = course(CourseStatus::Draft, owner);

        assert!(matches!(
            check_submit(&draft, Uuid::new_v4(), 1),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            check_submit(&draft, owner, 0),
            Err(ApiError::BadRequest(_))
        ));
        assert!(check_submit(&draft, owner, 1).is_ok());

        let pending = course(CourseStatus::Pending, owner);
        assert!(matches!(
            check_submit(&pending, owner, 3),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_review_transitions() {
        use CourseStatus::*;

        for current in [Pending, Approved] {
            for target in [Approved, Published, Rejected] {
                assert!(check_review(current, target).is_ok());
            }
            assert!(matches!(
                check_review(current, Draft),
                Err(ApiError::Validation(_))
            ));
        }

        for current in [Draft, Published, Rejected] {
            assert!(matches!(
                check_review(current, Published),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_edit_status_rules() {
        use CourseStatus::*;

        assert!(check_edit_status(Draft, Pending, false, 1).is_ok());
        assert!(check_edit_status(Draft, Pending, false, 0).is_err());
        assert!(check_edit_status(Pending, Draft, false, 1).is_err());
        assert!(check_edit_status(Draft, Published, false, 1).is_err());

        // Pas de retour en arrière hors du cycle de vie
        for current in [Approved, Published, Rejected] {
            assert!(check_edit_status(current, Draft, false, 1).is_err());
            assert!(check_edit_status(current, Pending, false, 1).is_err());
        }

        assert!(check_edit_status(Pending, Published, true, 0).is_ok());
        assert!(check_edit_status(Published, Draft, true, 0).is_ok());
    }

    #[test]
    fn test_seat_bookkeeping_stays_in_bounds() {
        let total = 2;
        let mut available = total;

        // plus d'inscriptions que de places puis autant de désinscriptions
        for _ in 0..5 {
            available = take_seat(available);
            assert!((0..=total).contains(&available));
        }
        assert_eq!(available, 0);

        for _ in 0..5 {
            available = release_seat(available, total);
            assert!((0..=total).contains(&available));
        }
        assert_eq!(available, total);
    }

    #[test]
    fn test_clamp_seats() {
        assert_eq!(clamp_seats(10, 15), (10, 10));
        assert_eq!(clamp_seats(10, -3), (10, 0));
        assert_eq!(clamp_seats(-1, 4), (0, 0));
        assert_eq!(clamp_seats(30, 12), (30, 12));
    }

    #[test]
    fn test_published_at_set_once() {
        let first = Utc::now() - Duration::days(3);
        let now = Utc::now();

        assert_eq!(published_at_after(CourseStatus::Published, None, now), Some(now));
        assert_eq!(
            published_at_after(CourseStatus::Published, Some(first), now),
            Some(first)
        );
        assert_eq!(published_at_after(CourseStatus::Approved, None, now), None);
    }
}
