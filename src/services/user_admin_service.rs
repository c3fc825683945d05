// Gestion des utilisateurs par les admins : liste, rôle, (dés)activation

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::dto::UserResponse;
use crate::models::requests::UserFilters;
use crate::models::users::{self, Entity as Users, UserRole};
use crate::services::query::{icontains, parse_ordering, search_term};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};

pub struct UserAdminService;

impl UserAdminService {
    pub async fn list(
        db: &DatabaseConnection,
        filters: &UserFilters,
        params: &PageParams,
    ) -> Result<Page<UserResponse>, ApiError> {
        let mut query = Users::find();

        if let Some(role) = filters.role {
            query = query.filter(users::Column::Role.eq(role));
        }
        if let Some(is_active) = filters.is_active {
            query = query.filter(users::Column::IsActive.eq(is_active));
        }
        if let Some(email_verified) = filters.email_verified {
            query = query.filter(users::Column::EmailVerified.eq(email_verified));
        }
        if let Some(term) = search_term(&filters.search) {
            query = query.filter(
                Condition::any()
                    .add(icontains(users::Column::Email, term))
                    .add(icontains(users::Column::FirstName, term))
                    .add(icontains(users::Column::LastName, term)),
            );
        }

        let (column, order) = parse_ordering(
            filters.ordering.as_deref(),
            &[
                ("date_joined", users::Column::DateJoined),
                ("last_login", users::Column::LastLogin),
                ("email", users::Column::Email),
            ],
            (users::Column::DateJoined, Order::Desc),
        );

        let paginator = query
            .order_by(column, order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let users = paginator.fetch_page(params.page() - 1).await?;

        Ok(Page::new(users.iter().map(UserResponse::from).collect(), count, params))
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<users::Model, ApiError> {
        Users::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    /// Refuse de retirer le rôle ADMIN au dernier admin actif
    pub async fn update_role(
        db: &DatabaseConnection,
        id: Uuid,
        role: UserRole,
    ) -> Result<users::Model, ApiError> {
        let txn = db.begin().await?;

        let user = Users::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))?;

        if user.is_admin()
            && user.is_active
            && role != UserRole::Admin
            && Self::active_admin_count(&txn).await? <= 1
        {
            return Err(ApiError::bad_request(
                "Cannot change the role of the last active admin.",
            ));
        }

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        let user = active.update(&txn).await?;
        txn.commit().await?;

        log::info!("Role of {} updated to {}", user.email, role);
        Ok(user)
    }

    /// Refuse de désactiver le dernier admin actif
    pub async fn deactivate(db: &DatabaseConnection, id: Uuid) -> Result<users::Model, ApiError> {
        let txn = db.begin().await?;

        let user = Users::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))?;

        if user.is_admin() && Self::active_admin_count(&txn).await? <= 1 {
            return Err(ApiError::bad_request("Cannot deactivate the last active admin."));
        }

        let user = Self::set_active(&txn, user, false).await?;
        txn.commit().await?;

        log::info!("User {} deactivated", user.email);
        Ok(user)
    }

    pub async fn activate(db: &DatabaseConnection, id: Uuid) -> Result<users::Model, ApiError> {
        let user = Self::get(db, id).await?;
        let user = Self::set_active(db, user, true).await?;

        log::info!("User {} activated", user.email);
        Ok(user)
    }

    async fn active_admin_count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
        Users::find()
            .filter(users::Column::Role.eq(UserRole::Admin))
            .filter(users::Column::IsActive.eq(true))
            .count(conn)
            .await
    }

    async fn set_active<C: ConnectionTrait>(
        conn: &C,
        user: users::Model,
        is_active: bool,
    ) -> Result<users::Model, DbErr> {
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        active.update(conn).await
    }
}
