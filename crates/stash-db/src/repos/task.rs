//! Task repository: create, filter, update, complete, subtasks and categories.

use stash_core::classification::Tags;
use stash_core::entities::{ActivityMetadata, Subtask, Task};
use stash_core::enums::{ActivityType, EntityType, GtdList, TaskStatus};
use stash_core::errors::CoreError;
use stash_core::ids::{PREFIX_SUBTASK, PREFIX_TASK};

use crate::error::DatabaseError;
use crate::events::StoreEvent;
use crate::helpers::{
    format_datetime, get_opt_string, now, parse_datetime, parse_enum, parse_json, to_json,
};
use crate::repos::activity::{NewActivity, insert_activity};
use crate::service::StashService;
use crate::updates::task::TaskUpdate;

const SELECT_COLS: &str = "id, title, description, status, list, project_id, tags, \
     original_thought, category, subtasks, created_at, updated_at";

/// A task to create; id, status and timestamps are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub list: GtdList,
    pub project_id: Option<String>,
    pub tags: Tags,
    pub original_thought: Option<String>,
}

/// Rows fetched per query by [`StashService::list_all_tasks`].
const TASK_PAGE_SIZE: u32 = 200;

/// Filter criteria for task queries.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub list: Option<GtdList>,
    pub status: Option<TaskStatus>,
    /// Only tasks without a category.
    pub uncategorized: bool,
    pub limit: Option<u32>,
    /// Rows to skip, in creation order.
    pub offset: u32,
}

fn row_to_task(row: &libsql::Row) -> Result<Task, DatabaseError> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: get_opt_string(row, 2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        list: parse_enum(&row.get::<String>(4)?)?,
        project_id: get_opt_string(row, 5)?,
        tags: parse_json(&row.get::<String>(6)?, "tasks.tags")?,
        original_thought: get_opt_string(row, 7)?,
        category: get_opt_string(row, 8)?,
        subtasks: parse_json(&row.get::<String>(9)?, "tasks.subtasks")?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

/// Insert a fully built task on `conn` (a plain connection or a transaction).
pub(crate) async fn insert_task(conn: &libsql::Connection, task: &Task) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO tasks ({SELECT_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        libsql::params![
            task.id.as_str(),
            task.title.as_str(),
            task.description.as_deref(),
            task.status.as_str(),
            task.list.as_str(),
            task.project_id.as_deref(),
            to_json(&task.tags)?,
            task.original_thought.as_deref(),
            task.category.as_deref(),
            to_json(&task.subtasks)?,
            format_datetime(&task.created_at),
            format_datetime(&task.updated_at)
        ],
    )
    .await?;
    Ok(())
}

impl StashService {
    /// Build (but do not insert) a `todo` task with a fresh id.
    pub(crate) async fn new_task_record(&self, new: NewTask) -> Result<Task, DatabaseError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(CoreError::Validation("task title must not be empty".into()).into());
        }
        let now = now();
        Ok(Task {
            id: self.db().generate_id(PREFIX_TASK).await?,
            title: title.to_string(),
            description: new.description,
            status: TaskStatus::Todo,
            list: new.list,
            project_id: new.project_id,
            tags: new.tags,
            original_thought: new.original_thought,
            category: None,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a `todo` task.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the title is blank, or `DatabaseError` if the INSERT fails.
    pub async fn create_task(&self, new: NewTask) -> Result<Task, DatabaseError> {
        let task = self.new_task_record(new).await?;
        insert_task(self.db().conn(), &task).await?;
        self.publish(StoreEvent::TaskChanged {
            task_id: task.id.clone(),
        });
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no task has this id.
    pub async fn get_task(&self, id: &str) -> Result<Task, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM tasks WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_task(&row)
    }

    /// List tasks in creation order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref project_id) = filter.project_id {
            params.push(libsql::Value::Text(project_id.clone()));
            conditions.push(format!("project_id = ?{}", params.len()));
        }
        if let Some(list) = filter.list {
            params.push(libsql::Value::Text(list.as_str().to_string()));
            conditions.push(format!("list = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        if filter.uncategorized {
            conditions.push("(category IS NULL OR category = '')".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM tasks {where_clause}
             ORDER BY created_at, rowid LIMIT {limit} OFFSET {offset}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(row_to_task(&row)?);
        }
        Ok(tasks)
    }

    /// Every task matching `filter`, fetched page by page; `limit` and `offset` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_all_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError> {
        self.collect_task_pages(filter, TASK_PAGE_SIZE).await
    }

    async fn collect_task_pages(
        &self,
        filter: &TaskFilter,
        page_size: u32,
    ) -> Result<Vec<Task>, DatabaseError> {
        let mut page = TaskFilter {
            limit: Some(page_size),
            offset: 0,
            ..filter.clone()
        };
        let mut tasks = Vec::new();
        loop {
            let batch = self.list_tasks(&page).await?;
            let last = batch.len() < page_size as usize;
            tasks.extend(batch);
            if last {
                return Ok(tasks);
            }
            page.offset += page_size;
        }
    }

    /// Distinct non-empty categories already used in a project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn project_categories(&self, project_id: &str) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT DISTINCT category FROM tasks
                 WHERE project_id = ?1 AND category IS NOT NULL AND category <> ''
                 ORDER BY category",
                [project_id],
            )
            .await?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(row.get::<String>(0)?);
        }
        Ok(categories)
    }

    /// Apply a partial update, logging a `user-update` activity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the task does not exist.
    pub async fn update_task(
        &self,
        task_id: &str,
        update: TaskUpdate,
    ) -> Result<Task, DatabaseError> {
        let current = self.get_task(task_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref title) = update.title {
            if title.trim().is_empty() {
                return Err(CoreError::Validation("task title must not be empty".into()).into());
            }
            sets.push(format!("title = ?{idx}"));
            params.push(title.trim().to_string().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(description.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(list) = update.list {
            sets.push(format!("list = ?{idx}"));
            params.push(list.as_str().into());
            idx += 1;
        }
        if let Some(ref project_id) = update.project_id {
            sets.push(format!("project_id = ?{idx}"));
            params.push(project_id.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(ref category) = update.category {
            sets.push(format!("category = ?{idx}"));
            params.push(category.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(ref tags) = update.tags {
            sets.push(format!("tags = ?{idx}"));
            params.push(to_json(tags)?.into());
            idx += 1;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(format_datetime(&now()).into());
        idx += 1;

        params.push(task_id.into());
        let sql = format!("UPDATE tasks SET {} WHERE id = ?{idx}", sets.join(", "));

        let activity = self
            .new_activity_record(NewActivity {
                activity_type: ActivityType::UserUpdate,
                description: format!("Updated task \"{}\"", current.title),
                detail: Some(to_json(&update)?),
                metadata: ActivityMetadata {
                    project_id: current.project_id.clone(),
                    task_id: Some(task_id.to_string()),
                    ..Default::default()
                },
            })
            .await?;

        let tx = self.db().conn().transaction().await?;
        tx.execute(&sql, libsql::params_from_iter(params)).await?;
        insert_activity(&tx, &activity).await?;
        tx.commit().await?;

        self.publish(StoreEvent::TaskChanged {
            task_id: task_id.to_string(),
        });
        self.get_task(task_id).await
    }

    /// Mark a task done, logging a `user-complete` activity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` with `InvalidTransition` if the task is already done.
    pub async fn complete_task(&self, task_id: &str) -> Result<Task, DatabaseError> {
        let current = self.get_task(task_id).await?;

        if !current.status.can_transition_to(TaskStatus::Done) {
            return Err(CoreError::InvalidTransition {
                entity_type: EntityType::Task.to_string(),
                id: task_id.to_string(),
                from: current.status.to_string(),
                to: TaskStatus::Done.to_string(),
            }
            .into());
        }

        let now = now();
        let activity = self
            .new_activity_record(NewActivity {
                activity_type: ActivityType::UserComplete,
                description: format!("Completed \"{}\"", current.title),
                detail: None,
                metadata: ActivityMetadata {
                    project_id: current.project_id.clone(),
                    task_id: Some(task_id.to_string()),
                    ..Default::default()
                },
            })
            .await?;

        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            libsql::params![TaskStatus::Done.as_str(), format_datetime(&now), task_id],
        )
        .await?;
        insert_activity(&tx, &activity).await?;
        tx.commit().await?;

        tracing::info!(task_id, "task completed");
        self.publish(StoreEvent::TaskChanged {
            task_id: task_id.to_string(),
        });

        Ok(Task {
            status: TaskStatus::Done,
            updated_at: now,
            ..current
        })
    }

    /// Append subtasks (new ids, not completed) after the existing ones.
    ///
    /// Returns the updated task and the subtasks that were added.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if any title is blank; nothing is written in that case.
    pub async fn append_subtasks(
        &self,
        task_id: &str,
        titles: &[String],
    ) -> Result<(Task, Vec<Subtask>), DatabaseError> {
        let current = self.get_task(task_id).await?;
        if titles.iter().any(|title| title.trim().is_empty()) {
            return Err(CoreError::Validation("subtask titles must not be empty".into()).into());
        }

        let mut added = Vec::with_capacity(titles.len());
        for title in titles {
            added.push(Subtask {
                id: self.db().generate_id(PREFIX_SUBTASK).await?,
                title: title.trim().to_string(),
                completed: false,
            });
        }

        let mut subtasks = current.subtasks.clone();
        subtasks.extend(added.iter().cloned());
        let now = now();
        self.db()
            .conn()
            .execute(
                "UPDATE tasks SET subtasks = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![to_json(&subtasks)?, format_datetime(&now), task_id],
            )
            .await?;

        self.publish(StoreEvent::TaskChanged {
            task_id: task_id.to_string(),
        });
        Ok((
            Task {
                subtasks,
                updated_at: now,
                ..current
            },
            added,
        ))
    }

    /// Stamp categories onto tasks, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if any task id does not exist; the
    /// transaction is rolled back and no task changes.
    pub async fn assign_categories(
        &self,
        assignments: &[(String, String)],
    ) -> Result<u32, DatabaseError> {
        let now = format_datetime(&now());
        let tx = self.db().conn().transaction().await?;
        let mut updated = 0u32;
        for (task_id, category) in assignments {
            let changed = tx
                .execute(
                    "UPDATE tasks SET category = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![category.as_str(), now.as_str(), task_id.as_str()],
                )
                .await?;
            if changed == 0 {
                tx.rollback().await?;
                return Err(DatabaseError::NoResult);
            }
            updated += 1;
        }
        tx.commit().await?;

        for (task_id, _) in assignments {
            self.publish(StoreEvent::TaskChanged {
                task_id: task_id.clone(),
            });
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::repos::activity::ActivityFilter;
    use crate::test_support::helpers::test_service;
    use crate::updates::task::TaskUpdateBuilder;

    fn new_task(title: &str, project_id: Option<&str>) -> NewTask {
        NewTask {
            title: title.into(),
            project_id: project_id.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_task_roundtrip() {
        let svc = test_service().await;

        let task = svc
            .create_task(NewTask {
                original_thought: Some("buy milk".into()),
                ..new_task("Buy milk", Some("prj-1"))
            })
            .await
            .unwrap();

        assert!(task.id.starts_with("tsk-"));
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.list, GtdList::Next);

        let fetched = svc.get_task(&task.id).await.unwrap();
        assert_eq!(fetched, task);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let svc = test_service().await;
        assert!(svc.create_task(new_task("  ", None)).await.is_err());
    }

    #[tokio::test]
    async fn filter_by_project_list_and_status() {
        let svc = test_service().await;
        svc.create_task(new_task("A", Some("prj-1"))).await.unwrap();
        let b = svc
            .create_task(NewTask {
                list: GtdList::Someday,
                ..new_task("B", Some("prj-1"))
            })
            .await
            .unwrap();
        svc.create_task(new_task("C", Some("prj-2"))).await.unwrap();
        svc.complete_task(&b.id).await.unwrap();

        let in_project = svc
            .list_tasks(&TaskFilter {
                project_id: Some("prj-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_project.len(), 2);

        let someday_done = svc
            .list_tasks(&TaskFilter {
                list: Some(GtdList::Someday),
                status: Some(TaskStatus::Done),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(someday_done.len(), 1);
        assert_eq!(someday_done[0].title, "B");
    }

    #[tokio::test]
    async fn update_task_partial_and_logged() {
        let svc = test_service().await;
        let task = svc.create_task(new_task("Original", None)).await.unwrap();

        let update = TaskUpdateBuilder::new()
            .title("Renamed")
            .list(GtdList::Waiting)
            .build();
        let updated = svc.update_task(&task.id, update).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.list, GtdList::Waiting);
        assert_eq!(updated.tags, task.tags);

        let log = svc
            .list_activities(&ActivityFilter {
                activity_type: Some(ActivityType::UserUpdate),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn complete_task_once() {
        let svc = test_service().await;
        let task = svc.create_task(new_task("Finish", None)).await.unwrap();

        let done = svc.complete_task(&task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Done);

        let again = svc.complete_task(&task.id).await;
        assert!(matches!(
            again,
            Err(DatabaseError::Core(CoreError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn subtasks_are_appended_after_existing() {
        let svc = test_service().await;
        let task = svc.create_task(new_task("Plan trip", None)).await.unwrap();

        svc.append_subtasks(&task.id, &["Book flights".into()]).await.unwrap();
        let (updated, added) = svc
            .append_subtasks(&task.id, &["Book hotel".into(), "Pack".into()])
            .await
            .unwrap();

        assert_eq!(added.len(), 2);
        assert!(added.iter().all(|s| s.id.starts_with("sub-") && !s.completed));
        let titles: Vec<_> = updated.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Book flights", "Book hotel", "Pack"]);
        assert_eq!(svc.get_task(&task.id).await.unwrap().subtasks, updated.subtasks);
    }

    #[tokio::test]
    async fn assign_categories_is_all_or_nothing() {
        let svc = test_service().await;
        let a = svc.create_task(new_task("A", Some("prj-1"))).await.unwrap();

        let result = svc
            .assign_categories(&[
                (a.id.clone(), "Outside".into()),
                ("tsk-missing".into(), "Outside".into()),
            ])
            .await;
        assert!(matches!(result, Err(DatabaseError::NoResult)));
        assert_eq!(svc.get_task(&a.id).await.unwrap().category, None);

        let updated = svc
            .assign_categories(&[(a.id.clone(), "Outside".into())])
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(
            svc.project_categories("prj-1").await.unwrap(),
            vec!["Outside".to_string()]
        );
    }

    #[tokio::test]
    async fn uncategorized_filter() {
        let svc = test_service().await;
        let a = svc.create_task(new_task("A", Some("prj-1"))).await.unwrap();
        svc.create_task(new_task("B", Some("prj-1"))).await.unwrap();
        svc.assign_categories(&[(a.id, "Done soon".into())]).await.unwrap();

        let open = svc
            .list_tasks(&TaskFilter {
                project_id: Some("prj-1".into()),
                uncategorized: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "B");
    }

    #[tokio::test]
    async fn paging_collects_every_task_in_order() {
        let svc = test_service().await;
        for title in ["A", "B", "C", "D", "E"] {
            svc.create_task(new_task(title, Some("prj-1"))).await.unwrap();
        }
        let filter = TaskFilter {
            project_id: Some("prj-1".into()),
            limit: Some(1),
            ..Default::default()
        };

        for page_size in [2, 5, 10] {
            let tasks = svc.collect_task_pages(&filter, page_size).await.unwrap();
            let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
            assert_eq!(titles, vec!["A", "B", "C", "D", "E"], "page size {page_size}");
        }

        let second_page = svc
            .list_tasks(&TaskFilter {
                limit: Some(2),
                offset: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = second_page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "D"]);
        assert_eq!(svc.list_all_tasks(&filter).await.unwrap().len(), 5);
    }
}
