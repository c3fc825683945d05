// Catégories de cours : lecture publique, écriture réservée aux admins

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;
use validator::Validate;

use crate::models::categories::{self, Entity as Categories};
use crate::models::courses::{self, CourseStatus};
use crate::models::dto::CategoryResponse;
use crate::models::requests::{CategoryFilters, CategoryInput};
use crate::services::query::{icontains, parse_ordering, search_term};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};
use crate::utils::slug::slugify;

pub struct CategoryService;

impl CategoryService {
    pub async fn published_course_count<C: ConnectionTrait>(
        db: &C,
        category_id: Uuid,
    ) -> Result<u64, DbErr> {
        courses::Entity::find()
            .filter(courses::Column::CategoryId.eq(category_id))
            .filter(courses::Column::Status.eq(CourseStatus::Published))
            .count(db)
            .await
    }

    async fn to_response(
        db: &DatabaseConnection,
        category: &categories::Model,
    ) -> Result<CategoryResponse, DbErr> {
        let count = Self::published_course_count(db, category.id).await?;
        Ok(CategoryResponse::build(category, count))
    }

    /// Catégories actives, triées par nom sauf `?ordering=name|created_at`
    pub async fn list(
        db: &DatabaseConnection,
        filters: &CategoryFilters,
        params: &PageParams,
    ) -> Result<Page<CategoryResponse>, ApiError> {
        let mut query = Categories::find().filter(categories::Column::IsActive.eq(true));

        if let Some(term) = search_term(&filters.search) {
            query = query.filter(
                Condition::any()
                    .add(icontains(categories::Column::Name, term))
                    .add(icontains(categories::Column::Description, term)),
            );
        }

        let (column, order) = parse_ordering(
            filters.ordering.as_deref(),
            &[
                ("name", categories::Column::Name),
                ("created_at", categories::Column::CreatedAt),
            ],
            (categories::Column::Name, Order::Asc),
        );

        let paginator = query
            .order_by(column, order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let mut data = Vec::with_capacity(rows.len());
        for category in &rows {
            data.push(Self::to_response(db, category).await?);
        }

        Ok(Page::new(data, count, params))
    }

    async fn find_active(db: &DatabaseConnection, id: Uuid) -> Result<categories::Model, ApiError> {
        Categories::find_by_id(id)
            .filter(categories::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<CategoryResponse, ApiError> {
        let category = Self::find_active(db, id).await?;
        Ok(Self::to_response(db, &category).await?)
    }

    /// Le slug est dérivé du nom et doit être unique
    async fn check_name(
        db: &DatabaseConnection,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<String, ApiError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(ApiError::field("name", "Category name must contain letters or digits."));
        }

        let mut query = Categories::find().filter(
            Condition::any()
                .add(categories::Column::Slug.eq(slug.as_str()))
                .add(categories::Column::Name.eq(name.trim())),
        );
        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }

        if query.count(db).await? > 0 {
            return Err(ApiError::field("name", "Category with this name already exists."));
        }

        Ok(slug)
    }

    pub async fn create(
        db: &DatabaseConnection,
        input: CategoryInput,
    ) -> Result<CategoryResponse, ApiError> {
        input.validate()?;

        let name = input
            .name
            .ok_or_else(|| ApiError::field("name", "This field is required."))?;
        let slug = Self::check_name(db, &name, None).await?;

        let now = Utc::now();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            slug: Set(slug),
            description: Set(input.description.unwrap_or_default()),
            icon: Set(input.icon.unwrap_or_default()),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        log::info!("Category created: {}", category.name);
        Ok(Self::to_response(db, &category).await?)
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        input: CategoryInput,
        partial: bool,
    ) -> Result<CategoryResponse, ApiError> {
        input.validate()?;

        let category = Categories::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))?;

        if !partial && input.name.is_none() {
            return Err(ApiError::field("name", "This field is required."));
        }

        let mut active: categories::ActiveModel = category.into();

        if let Some(name) = input.name {
            active.slug = Set(Self::check_name(db, &name, Some(id)).await?);
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let category = active.update(db).await?;
        Ok(Self::to_response(db, &category).await?)
    }

    /// Les cours de la catégorie gardent leurs données (category_id -> NULL)
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
        let result = Categories::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ApiError::not_found("Not found."));
        }

        log::info!("Category {} deleted", id);
        Ok(())
    }
}
