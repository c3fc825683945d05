// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Colonnes de la table password_reset_tokens:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, NOT NULL, FK vers users, ON DELETE CASCADE)
//   - token (VARCHAR, UNIQUE) - 32 octets aléatoires, base64 URL-safe
//   - created_at (TIMESTAMPTZ)
//   - expires_at (TIMESTAMPTZ) - created_at + 1 heure par défaut
//   - used (BOOLEAN)
//
// Workflow:
//   1. User demande un reset via POST /api/v1/accounts/password/reset
//   2. Backend supprime les tokens existants du user et en génère un nouveau
//   3. Backend envoie l'email avec le lien contenant le token
//   4. Frontend envoie POST /api/v1/accounts/password/reset/confirm
//   5. Backend vérifie: token existe, pas expiré, pas utilisé
//   6. Backend change le password et met used = true
//
// Points d'attention:
//   - Un token utilisé compte comme expiré
//   - La réponse à la demande de reset ne révèle jamais si l'email existe
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(unique)]
    pub token: String,

    pub created_at: DateTimeUtc,

    pub expires_at: DateTimeUtc,

    pub used: bool,
}

impl Model {
    /// Expiré si la date est passée OU si le token a déjà servi
    pub fn is_expired(&self) -> bool {
        self.used || chrono::Utc::now() > self.expires_at
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
