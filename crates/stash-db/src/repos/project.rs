//! Project repository.

use stash_core::classification::KnownProject;
use stash_core::entities::{ActivityMetadata, Project};
use stash_core::enums::{ActivityType, ProjectStatus};
use stash_core::errors::CoreError;
use stash_core::ids::PREFIX_PROJECT;

use crate::error::DatabaseError;
use crate::events::StoreEvent;
use crate::helpers::{format_datetime, now, parse_datetime, parse_enum, parse_json, to_json};
use crate::repos::activity::{NewActivity, insert_activity};
use crate::service::StashService;

const SELECT_COLS: &str = "id, name, outcome, status, sections, created_at, updated_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        outcome: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        sections: parse_json(&row.get::<String>(4)?, "projects.sections")?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Insert a fully built project on `conn` (a plain connection or a transaction).
pub(crate) async fn insert_project(
    conn: &libsql::Connection,
    project: &Project,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        libsql::params![
            project.id.as_str(),
            project.name.as_str(),
            project.outcome.as_str(),
            project.status.as_str(),
            to_json(&project.sections)?,
            format_datetime(&project.created_at),
            format_datetime(&project.updated_at)
        ],
    )
    .await?;
    Ok(())
}

impl StashService {
    /// Build (but do not insert) an active project with a fresh id.
    pub(crate) async fn new_project_record(
        &self,
        name: &str,
        outcome: &str,
    ) -> Result<Project, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("project name must not be empty".into()).into());
        }
        let now = now();
        Ok(Project {
            id: self.db().generate_id(PREFIX_PROJECT).await?,
            name: name.to_string(),
            outcome: outcome.trim().to_string(),
            status: ProjectStatus::Active,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create an active project by hand, logging a `user-create-project` activity.
    ///
    /// Names are not unique; creating a second "Errands" yields a second project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if `name` is blank, or `DatabaseError` if the INSERT fails.
    pub async fn create_project(&self, name: &str, outcome: &str) -> Result<Project, DatabaseError> {
        let project = self.new_project_record(name, outcome).await?;
        let activity = self
            .new_activity_record(NewActivity {
                activity_type: ActivityType::UserCreateProject,
                description: format!("Created project \"{}\"", project.name),
                detail: None,
                metadata: ActivityMetadata {
                    project_id: Some(project.id.clone()),
                    project_name: Some(project.name.clone()),
                    ..Default::default()
                },
            })
            .await?;

        let tx = self.db().conn().transaction().await?;
        insert_project(&tx, &project).await?;
        insert_activity(&tx, &activity).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project.id, name = %project.name, "project created");
        self.publish(StoreEvent::ProjectCreated {
            project_id: project.id.clone(),
        });
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no project has this id.
    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_project(&row)
    }

    /// List projects in creation order, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(
        &self,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = match status {
            Some(status) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM projects WHERE status = ?1
                             ORDER BY created_at, rowid LIMIT {limit}"
                        ),
                        [status.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM projects
                             ORDER BY created_at, rowid LIMIT {limit}"
                        ),
                        (),
                    )
                    .await?
            }
        };

        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// The `{id, name}` context sent to the classifier: every project that is not archived.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn known_projects(&self) -> Result<Vec<KnownProject>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name FROM projects WHERE status <> 'archived'
                 ORDER BY created_at, rowid",
                (),
            )
            .await?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(KnownProject {
                id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(projects)
    }
}
