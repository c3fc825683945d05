// ============================================================================
// DEMANDES INSTRUCTEUR
// ============================================================================
//
// Workflow:
//   1. Un STUDENT soumet une demande (une seule PENDING à la fois)
//   2. Tous les admins actifs sont notifiés par email
//   3. Un admin approuve ou rejette (définitif)
//   4. Approbation : le rôle du user passe à INSTRUCTOR
//   5. Le demandeur reçoit un email avec la décision
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::models::dto::InstructorRequestResponse;
use crate::models::instructor_requests::{self, Entity as InstructorRequests, InstructorRequestStatus};
use crate::models::requests::{InstructorRequestCreate, InstructorRequestFilters, InstructorRequestReview};
use crate::models::users::{self, Entity as Users, UserRole};
use crate::services::auth_service::display_name;
use crate::services::mail::{
    EmailDispatcher, InstructorApprovedEmail, InstructorRejectedEmail,
    InstructorRequestNotificationEmail,
};
use crate::services::query::{icontains, parse_ordering, search_term, users_by_id};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};

pub struct InstructorRequestService;

impl InstructorRequestService {
    /// Admins : toutes les demandes. Les autres : seulement les leurs.
    pub async fn list(
        db: &DatabaseConnection,
        user: &users::Model,
        filters: &InstructorRequestFilters,
        params: &PageParams,
    ) -> Result<Page<InstructorRequestResponse>, ApiError> {
        let mut query = InstructorRequests::find();

        if !user.is_admin() {
            query = query.filter(instructor_requests::Column::UserId.eq(user.id));
        }
        if let Some(status) = filters.status {
            query = query.filter(instructor_requests::Column::Status.eq(status));
        }
        // Recherche sur le demandeur : email, prénom, nom
        if let Some(term) = search_term(&filters.search) {
            query = query.inner_join(Users).filter(
                Condition::any()
                    .add(icontains((Users, users::Column::Email), term))
                    .add(icontains((Users, users::Column::FirstName), term))
                    .add(icontains((Users, users::Column::LastName), term)),
            );
        }

        let (column, order) = parse_ordering(
            filters.ordering.as_deref(),
            &[
                ("created_at", instructor_requests::Column::CreatedAt),
                ("updated_at", instructor_requests::Column::UpdatedAt),
            ],
            (instructor_requests::Column::CreatedAt, Order::Desc),
        );

        let paginator = query
            .order_by(column, order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let requests = paginator.fetch_page(params.page() - 1).await?;

        let data = Self::to_responses(db, &requests).await?;
        Ok(Page::new(data, count, params))
    }

    /// Demande visible par l'appelant (la sienne, ou n'importe laquelle pour un admin)
    pub async fn find_visible(
        db: &DatabaseConnection,
        user: &users::Model,
        id: Uuid,
    ) -> Result<instructor_requests::Model, ApiError> {
        InstructorRequests::find_by_id(id)
            .one(db)
            .await?
            .filter(|request| user.is_admin() || request.user_id == user.id)
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get(
        db: &DatabaseConnection,
        user: &users::Model,
        id: Uuid,
    ) -> Result<InstructorRequestResponse, ApiError> {
        let request = Self::find_visible(db, user, id).await?;
        Self::to_response(db, &request).await
    }

    pub async fn create(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        user: &users::Model,
        input: InstructorRequestCreate,
    ) -> Result<InstructorRequestResponse, ApiError> {
        // 1. Règles métier
        match user.role {
            UserRole::Instructor => return Err(ApiError::non_field("You are already an instructor.")),
            UserRole::Admin => {
                return Err(ApiError::non_field("Admins cannot request the instructor role."));
            }
            UserRole::Student => {}
        }

        let pending = InstructorRequests::find()
            .filter(instructor_requests::Column::UserId.eq(user.id))
            .filter(instructor_requests::Column::Status.eq(InstructorRequestStatus::Pending))
            .count(db)
            .await?;
        if pending > 0 {
            return Err(ApiError::non_field(
                "You already have a pending instructor request.",
            ));
        }

        input.validate()?;

        // 2. Création
        let now = Utc::now();
        let request = instructor_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            status: Set(InstructorRequestStatus::Pending),
            reason: Set(input.reason),
            qualifications: Set(input.qualifications),
            teaching_interests: Set(input.teaching_interests),
            reviewed_by: Set(None),
            review_notes: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            reviewed_at: Set(None),
        }
        .insert(db)
        .await?;

        log::info!("Instructor request {} submitted by {}", request.id, user.email);

        // 3. Notification des admins
        Self::notify_admins(db, config, mailer, &request, user).await?;

        Ok(InstructorRequestResponse::build(&request, user, None))
    }

    async fn notify_admins(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        request: &instructor_requests::Model,
        applicant: &users::Model,
    ) -> Result<(), ApiError> {
        let admins = Users::find()
            .filter(users::Column::Role.eq(UserRole::Admin))
            .filter(users::Column::IsActive.eq(true))
            .all(db)
            .await?;

        if admins.is_empty() {
            log::warn!("No active admins found to notify about request {}", request.id);
            return Ok(());
        }

        let email = InstructorRequestNotificationEmail {
            applicant_name: display_name(applicant),
            applicant_email: applicant.email.clone(),
            reason: request.reason.clone(),
            qualifications: request.qualifications.clone(),
            teaching_interests: request.teaching_interests.clone(),
            site_name: config.site_name.clone(),
            site_url: config.frontend_url.clone(),
            admin_url: format!("{}/admin/instructor-requests", config.frontend_url),
        };

        for admin in &admins {
            mailer.dispatch(&admin.email, &email);
        }

        Ok(())
    }

    /// Décision admin : APPROVED (promotion INSTRUCTOR) ou REJECTED
    pub async fn review(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        admin: &users::Model,
        id: Uuid,
        input: InstructorRequestReview,
    ) -> Result<InstructorRequestResponse, ApiError> {
        let request = Self::find_visible(db, admin, id).await?;

        // 1. Une demande ne se révise qu'une fois
        if request.status != InstructorRequestStatus::Pending {
            return Err(ApiError::bad_request("This request has already been reviewed."));
        }

        if input.status == InstructorRequestStatus::Pending {
            return Err(ApiError::field(
                "status",
                "Status must be either APPROVED or REJECTED.",
            ));
        }

        // 2. Demande + rôle dans la même transaction
        let now = Utc::now();
        let txn = db.begin().await?;

        let mut active: instructor_requests::ActiveModel = request.into();
        active.status = Set(input.status);
        active.review_notes = Set(input.review_notes);
        active.reviewed_by = Set(Some(admin.id));
        active.reviewed_at = Set(Some(now));
        active.updated_at = Set(now);
        let request = active.update(&txn).await?;

        let applicant = Users::find_by_id(request.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("user {} not found", request.user_id)))?;

        let applicant = if request.status == InstructorRequestStatus::Approved {
            let mut user: users::ActiveModel = applicant.into();
            user.role = Set(UserRole::Instructor);
            user.updated_at = Set(now);
            user.update(&txn).await?
        } else {
            applicant
        };

        txn.commit().await?;

        log::info!(
            "Instructor request {} {} by {}",
            request.id,
            request.status.as_str(),
            admin.email
        );

        // 3. Email de décision
        Self::send_decision(config, mailer, &request, &applicant);

        Ok(InstructorRequestResponse::build(&request, &applicant, Some(admin)))
    }

    fn send_decision(
        config: &AppConfig,
        mailer: &EmailDispatcher,
        request: &instructor_requests::Model,
        applicant: &users::Model,
    ) {
        match request.status {
            InstructorRequestStatus::Approved => mailer.dispatch(
                &applicant.email,
                &InstructorApprovedEmail {
                    user_name: display_name(applicant),
                    site_name: config.site_name.clone(),
                    site_url: config.frontend_url.clone(),
                    dashboard_url: format!("{}/instructor/dashboard", config.frontend_url),
                },
            ),
            InstructorRequestStatus::Rejected => mailer.dispatch(
                &applicant.email,
                &InstructorRejectedEmail {
                    user_name: display_name(applicant),
                    site_name: config.site_name.clone(),
                    site_url: config.frontend_url.clone(),
                    review_notes: request.review_notes.clone(),
                },
            ),
            InstructorRequestStatus::Pending => {}
        }
    }

    async fn to_response(
        db: &DatabaseConnection,
        request: &instructor_requests::Model,
    ) -> Result<InstructorRequestResponse, ApiError> {
        let mut responses = Self::to_responses(db, std::slice::from_ref(request)).await?;
        responses
            .pop()
            .ok_or_else(|| ApiError::Internal(format!("user {} not found", request.user_id)))
    }

    async fn to_responses(
        db: &DatabaseConnection,
        requests: &[instructor_requests::Model],
    ) -> Result<Vec<InstructorRequestResponse>, ApiError> {
        let ids = requests
            .iter()
            .flat_map(|r| std::iter::once(r.user_id).chain(r.reviewed_by));
        let users = users_by_id(db, ids).await?;

        Ok(requests
            .iter()
            .filter_map(|request| {
                let user = users.get(&request.user_id)?;
                let reviewer = request.reviewed_by.and_then(|id| users.get(&id));
                Some(InstructorRequestResponse::build(request, user, reviewer))
            })
            .collect())
    }
}
