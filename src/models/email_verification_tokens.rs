// ============================================================================
// MODÈLE : EMAIL VERIFICATION TOKENS
// ============================================================================
//
// Colonnes de la table email_verification_tokens:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, NOT NULL, FK vers users, ON DELETE CASCADE)
//   - token (VARCHAR, UNIQUE) - 32 octets aléatoires, base64 URL-safe
//   - created_at (TIMESTAMPTZ)
//   - expires_at (TIMESTAMPTZ) - created_at + 24 heures par défaut
//
// Workflow:
//   1. User s'inscrit via POST /api/v1/accounts/register
//   2. Backend crée le user avec email_verified = false
//   3. Backend supprime les anciens tokens du user et en insère un nouveau
//   4. Backend envoie l'email avec le lien contenant le token
//   5. Frontend appelle POST /api/v1/accounts/verify-email avec le token
//   6. Backend vérifie: token existe, pas expiré
//   7. Backend met users.email_verified = true et SUPPRIME le token
//
// Points d'attention:
//   - Usage unique : le token est supprimé une fois consommé (pas de flag used)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_verification_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(unique)]
    pub token: String,

    pub created_at: DateTimeUtc,

    pub expires_at: DateTimeUtc,
}

impl Model {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() > self.expires_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
