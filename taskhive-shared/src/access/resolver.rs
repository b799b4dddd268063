/// Role resolver
///
/// Determines a user's effective role within a project from the membership
/// table. Consistent with the table at time of call; results are never cached
/// across requests.
///
/// # Missing owner row repair
///
/// Legacy data could contain a project whose owner has no membership row. The
/// resolver treats the project's `owner_id` as authoritative in that case:
/// it backfills the missing owner membership transactionally and returns
/// Owner, so the divergence cannot persist.
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{ProjectMember, ProjectRole};
use crate::models::project::Project;

/// Resolves the user's effective role in a project
///
/// Returns None when the project does not exist or the user has no relation
/// to it. Never errs on "no access"; database failures propagate.
///
/// # Example
///
/// ```no_run
/// # use taskhive_shared::access::resolver::resolve_role;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
/// # async fn example(pool: PgPool, user_id: Uuid, project_id: Uuid) -> Result<(), sqlx::Error> {
/// match resolve_role(&pool, user_id, project_id).await? {
///     Some(role) => println!("role: {}", role.as_str()),
///     None => println!("no access"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn resolve_role(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Option<ProjectRole>, sqlx::Error> {
    if let Some(role) = ProjectMember::get_role(pool, project_id, user_id).await? {
        return Ok(Some(role));
    }

    let Some(project) = Project::find_by_id(pool, project_id).await? else {
        return Ok(None);
    };

    if project.owner_id == user_id {
        backfill_owner_membership(pool, project_id, user_id).await?;
        return Ok(Some(ProjectRole::Owner));
    }

    Ok(None)
}

/// Repairs a missing owner membership row
///
/// `ON CONFLICT DO NOTHING` keeps the repair idempotent under concurrent
/// resolution of the same project.
async fn backfill_owner_membership(
    pool: &PgPool,
    project_id: Uuid,
    owner_id: Uuid,
) -> Result<(), sqlx::Error> {
    tracing::warn!(
        project_id = %project_id,
        owner_id = %owner_id,
        "Owner membership row missing; backfilling"
    );

    sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id, role)
        VALUES ($1, $2, 'owner')
        ON CONFLICT (project_id, user_id) DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    // resolve_role is a thin composition over ProjectMember::get_role and the
    // backfill insert; it is exercised end-to-end by integration tests against
    // a database. The pure decision logic it feeds lives in the evaluator.
}
