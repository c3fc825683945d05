// Petits utilitaires de requêtes partagés par les services

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{categories, users};

/// Recherche insensible à la casse : LOWER(col) LIKE '%terme%'
pub fn icontains<T: IntoColumnRef>(column: T, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

/// Terme de recherche non vide, sinon None
pub fn search_term(search: &Option<String>) -> Option<&str> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
}

/// `?ordering=` : champ parmi `allowed`, préfixe `-` pour l'ordre décroissant.
/// Champ absent ou inconnu : `default`.
pub fn parse_ordering<C: Copy>(
    value: Option<&str>,
    allowed: &[(&str, C)],
    default: (C, Order),
) -> (C, Order) {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return default;
    };

    let (field, order) = match raw.strip_prefix('-') {
        Some(field) => (field, Order::Desc),
        None => (raw, Order::Asc),
    };

    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| (*column, order))
        .unwrap_or(default)
}

/// Charge des utilisateurs par id (pour les réponses qui les embarquent)
pub async fn users_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, users::Model>, DbErr> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?;

    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

pub async fn categories_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, categories::Model>, DbErr> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let categories = categories::Entity::find()
        .filter(categories::Column::Id.is_in(ids))
        .all(db)
        .await?;

    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ordering_whitelist() {
        let allowed = [("name", categories::Column::Name), ("created_at", categories::Column::CreatedAt)];
        let default = || (categories::Column::Name, Order::Asc);

        assert!(matches!(
            parse_ordering(Some("-created_at"), &allowed, default()),
            (categories::Column::CreatedAt, Order::Desc)
        ));
        assert!(matches!(
            parse_ordering(Some(" name "), &allowed, default()),
            (categories::Column::Name, Order::Asc)
        ));
        assert!(matches!(
            parse_ordering(Some("-is_active"), &allowed, default()),
            (categories::Column::Name, Order::Asc)
        ));
        assert!(matches!(parse_ordering(None, &allowed, default()), (categories::Column::Name, Order::Asc)));
    }
}
