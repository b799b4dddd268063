//! Shared fixtures for API integration tests
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` in the environment (a `.env`
//! file works). Every test builds its own users and project and deletes
//! them afterwards, so the suite can run concurrently against one database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::Config;
use taskhive_shared::auth::jwt::{create_token, Claims, TokenType};
use taskhive_shared::models::membership::{CreateMember, ProjectMember, ProjectRole};
use taskhive_shared::models::project::{CreateProject, Project};
use taskhive_shared::models::user::{CreateUser, User};

/// One project with an owner, a member, and a user outside the project
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub project: Project,
    pub owner: User,
    pub member: User,
    pub outsider: User,
    jwt_secret: String,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut config = Config::from_env().expect("test configuration");
        // The whole suite arrives from one client address.
        config.rate_limit.max_requests = 100_000;

        let db = PgPool::connect(&config.database.url)
            .await
            .expect("test database connection");

        let owner = create_user(&db, "owner").await;
        let member = create_user(&db, "member").await;
        let outsider = create_user(&db, "outsider").await;

        let project = Project::create(
            &db,
            CreateProject {
                owner_id: owner.id,
                name: format!("Test project {}", Uuid::new_v4()),
                description: None,
                color: None,
            },
        )
        .await
        .expect("test project");

        ProjectMember::create(
            &db,
            CreateMember {
                project_id: project.id,
                user_id: member.id,
                role: ProjectRole::Member,
            },
        )
        .await
        .expect("member row");

        let jwt_secret = config.jwt.secret.clone();
        let app = build_router(AppState::new(db.clone(), config));

        TestContext {
            db,
            app,
            project,
            owner,
            member,
            outsider,
            jwt_secret,
        }
    }

    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(user.id, TokenType::Access);
        create_token(&claims, &self.jwt_secret).expect("access token")
    }

    /// Sends an authenticated request and returns the status and JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: &User,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token_for(user)));

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().call(request).await.expect("response");
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    /// Removes everything the context created
    pub async fn cleanup(self) {
        // Members, invitations, tasks, comments, and attachments go with
        // the project via CASCADE.
        Project::delete(&self.db, self.project.id)
            .await
            .expect("project cleanup");

        for user in [self.owner, self.member, self.outsider] {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user.id)
                .execute(&self.db)
                .await
                .expect("user cleanup");
        }
    }
}

async fn create_user(db: &PgPool, label: &str) -> User {
    User::create(
        db,
        CreateUser {
            email: format!("{}-{}@example.com", label, Uuid::new_v4()),
            password_hash: "integration-test-hash".to_string(),
            name: Some(label.to_string()),
        },
    )
    .await
    .expect("test user")
}
