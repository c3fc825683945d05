// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table créée par le crate `migration`.
//
// Liste des modules:
//   - users : Utilisateurs (rôle STUDENT / INSTRUCTOR / ADMIN)
//   - email_verification_tokens : Tokens de vérification email (expire 24h)
//   - password_reset_tokens : Tokens de reset password (expire 1h)
//   - instructor_requests : Demandes de promotion instructeur
//   - categories : Catégories de cours
//   - courses : Cours (workflow DRAFT -> PENDING -> APPROVED/PUBLISHED/REJECTED)
//   - sections, lessons : Contenu d'un cours
//   - reviews : Avis et notes des étudiants
//   - enrollments, lesson_progress, certificates : Inscriptions et suivi
//   - dto : Data Transfer Objects pour les réponses API
//   - requests : Corps de requête et filtres (validator)
//   - health : Health check API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Clés primaires UUID, dates en UTC
//   - Les suppressions en cascade sont portées par les clés étrangères
//
// ============================================================================

pub mod categories;
pub mod certificates;
pub mod courses;
pub mod dto;
pub mod email_verification_tokens;
pub mod enrollments;
pub mod health;
pub mod instructor_requests;
pub mod lesson_progress;
pub mod lessons;
pub mod password_reset_tokens;
pub mod requests;
pub mod reviews;
pub mod sections;
pub mod users;
