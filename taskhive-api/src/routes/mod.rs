/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check endpoint
/// - `auth`: registration, login, token refresh
/// - `projects`: project CRUD and archiving
/// - `members`: membership management and ownership transfer
/// - `invitations`: token-addressed project invitations
/// - `tasks`: task CRUD, comments, and attachment metadata

pub mod auth;
pub mod health;
pub mod invitations;
pub mod members;
pub mod projects;
pub mod tasks;
