use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::rc::Rc;

use crate::models::{
    Category, CategoryPatch, CategoryRef, NewCategory, NewTask, Priority, Task, TaskPatch,
};
use crate::store::memory::default_categories;
use crate::store::{CategoryStore, StoreError, TaskStore};

/// Task rows joined to their category so a renamed category shows its current name
const TASK_SELECT: &str = "SELECT tasks.id, tasks.title, tasks.description, tasks.priority, \
     tasks.category_id, COALESCE(categories.name, tasks.category_name), tasks.due_date, \
     tasks.completed, tasks.created_at, tasks.completed_at, tasks.archived \
     FROM tasks LEFT JOIN categories ON categories.id = tasks.category_id";

const CATEGORY_COLUMNS: &str = "id, name, color, task_count";

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Shared SQLite connection holding the `tasks` and `categories` tables
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Private in-memory database, used by tests
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                priority        TEXT NOT NULL DEFAULT 'medium',
                category_id     INTEGER,
                category_name   TEXT NOT NULL,
                due_date        TEXT,
                completed       INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                completed_at    TEXT,
                archived        INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id              INTEGER PRIMARY KEY,
                name            TEXT NOT NULL,
                color           TEXT NOT NULL,
                task_count      INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_category_name ON tasks(category_name)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_categories_name ON categories(name)",
            [],
        )?;

        Ok(())
    }

    /// Insert the bundled categories into an empty table
    pub fn seed_categories_if_empty(&self) -> Result<(), StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        for category in default_categories()? {
            self.conn.execute(
                "INSERT INTO categories (id, name, color, task_count) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![category.id, category.name, category.color, category.task_count],
            )?;
        }
        tracing::info!("seeded default categories");
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn next_id(&self, table: &str) -> Result<i64, StoreError> {
        let sql = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        let category_id: Option<i64> = row.get(4)?;
        let category_name: String = row.get(5)?;
        let category = match category_id {
            Some(id) => CategoryRef::ById {
                id,
                name: category_name,
            },
            None => CategoryRef::ByName(category_name),
        };

        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            priority: row.get(3)?,
            category,
            due_date: row.get(6)?,
            completed: row.get::<_, i64>(7)? != 0,
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
            archived: row.get::<_, i64>(10)? != 0,
        })
    }

    fn row_to_category(row: &rusqlite::Row) -> Result<Category, rusqlite::Error> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            task_count: row.get(3)?,
        })
    }

    fn get_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let sql = format!("{} WHERE tasks.id = ?1", TASK_SELECT);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_task)
            .optional()?)
    }

    fn get_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_category)
            .optional()?)
    }

    fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let sql = format!(
            "SELECT {} FROM categories WHERE name = ?1 ORDER BY id LIMIT 1",
            CATEGORY_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![name], Self::row_to_category)
            .optional()?)
    }

    /// Resolve a name reference to the category row, if one exists
    fn resolve_category(&self, category: CategoryRef) -> Result<CategoryRef, StoreError> {
        match category {
            CategoryRef::ByName(name) => Ok(match self.get_category_by_name(&name)? {
                Some(found) => CategoryRef::ById {
                    id: found.id,
                    name: found.name,
                },
                None => CategoryRef::ByName(name),
            }),
            resolved => Ok(resolved),
        }
    }

    fn write_task(&self, task: &Task) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (id, title, description, priority, category_id, category_name,
                                           due_date, completed, created_at, completed_at, archived)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                task.id,
                task.title,
                task.description,
                task.priority,
                task.category.id(),
                task.category.name(),
                task.due_date,
                if task.completed { 1 } else { 0 },
                task.created_at,
                task.completed_at,
                if task.archived { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    fn write_category(&self, category: &Category) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO categories (id, name, color, task_count) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![category.id, category.name, category.color, category.task_count],
        )?;
        Ok(())
    }
}

/// Task store over the `tasks` table
pub struct SqliteTaskStore {
    db: Rc<Database>,
}

impl SqliteTaskStore {
    pub fn new(db: Rc<Database>) -> Self {
        Self { db }
    }
}

impl TaskStore for SqliteTaskStore {
    fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("{} ORDER BY tasks.id ASC", TASK_SELECT);
        let mut stmt = self.db.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], Database::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        self.db.get_task(id)
    }

    fn create(&mut self, mut data: NewTask) -> Result<Task, StoreError> {
        data.category = self.db.resolve_category(data.category)?;
        let id = self.db.next_id("tasks")?;
        let task = data.into_task(id, Utc::now());
        self.db.write_task(&task)?;
        tracing::debug!(id, "inserted task row");
        Ok(task)
    }

    fn update(&mut self, id: i64, mut patch: TaskPatch) -> Result<Task, StoreError> {
        let mut task = self
            .db
            .get_task(id)?
            .ok_or_else(|| StoreError::task_not_found(id))?;

        if let Some(category) = patch.category.take() {
            patch.category = Some(self.db.resolve_category(category)?);
        }
        patch.apply(&mut task, Utc::now());
        self.db.write_task(&task)?;
        tracing::debug!(id, "updated task row");
        Ok(task)
    }

    fn delete(&mut self, id: i64) -> Result<Task, StoreError> {
        let task = self
            .db
            .get_task(id)?
            .ok_or_else(|| StoreError::task_not_found(id))?;
        self.db
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        tracing::debug!(id, "deleted task row");
        Ok(task)
    }
}

/// Category store over the `categories` table
pub struct SqliteCategoryStore {
    db: Rc<Database>,
}

impl SqliteCategoryStore {
    pub fn new(db: Rc<Database>) -> Self {
        Self { db }
    }
}

impl CategoryStore for SqliteCategoryStore {
    fn get_all(&self) -> Result<Vec<Category>, StoreError> {
        let sql = format!("SELECT {} FROM categories ORDER BY id ASC", CATEGORY_COLUMNS);
        let mut stmt = self.db.conn.prepare(&sql)?;
        let categories = stmt
            .query_map([], Database::row_to_category)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        self.db.get_category(id)
    }

    fn create(&mut self, data: NewCategory) -> Result<Category, StoreError> {
        let id = self.db.next_id("categories")?;
        let category = data.into_category(id);
        self.db.write_category(&category)?;
        Ok(category)
    }

    fn update(&mut self, id: i64, patch: CategoryPatch) -> Result<Category, StoreError> {
        let mut category = self
            .db
            .get_category(id)?
            .ok_or_else(|| StoreError::category_not_found(id))?;
        patch.apply(&mut category);
        self.db.write_category(&category)?;
        Ok(category)
    }

    fn delete(&mut self, id: i64) -> Result<Category, StoreError> {
        let category = self
            .db
            .get_category(id)?
            .ok_or_else(|| StoreError::category_not_found(id))?;
        self.db
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", rusqlite::params![id])?;
        Ok(category)
    }

    fn update_task_count(&mut self, name: &str, count: u32) -> Result<Option<Category>, StoreError> {
        self.db.conn.execute(
            "UPDATE categories SET task_count = ?1 WHERE name = ?2",
            rusqlite::params![count, name],
        )?;
        self.db.get_category_by_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use pretty_assertions::assert_eq;

    fn stores() -> (SqliteTaskStore, SqliteCategoryStore) {
        let db = Rc::new(Database::in_memory().unwrap());
        db.seed_categories_if_empty().unwrap();
        (
            SqliteTaskStore::new(Rc::clone(&db)),
            SqliteCategoryStore::new(db),
        )
    }

    #[test]
    fn task_contract() {
        contract::create_assigns_next_id(&mut stores().0);
        contract::create_then_get_round_trips(&mut stores().0);
        contract::completion_toggles_completed_at(&mut stores().0);
        contract::unknown_ids_are_not_found(&mut stores().0);
        contract::delete_returns_removed(&mut stores().0);
    }

    #[test]
    fn category_contract() {
        contract::category_crud(&mut stores().1);
    }

    #[test]
    fn known_category_names_resolve_to_rows() {
        let (mut tasks, categories) = stores();
        let work = categories
            .get_all()
            .unwrap()
            .into_iter()
            .find(|c| c.name == "work")
            .unwrap();

        let created = tasks.create(NewTask::new("Standup")).unwrap();
        assert_eq!(
            created.category,
            CategoryRef::ById {
                id: work.id,
                name: "work".to_string()
            }
        );

        let mut data = NewTask::new("Unfiled");
        data.category = CategoryRef::ByName("misc".to_string());
        let created = tasks.create(data).unwrap();
        assert_eq!(created.category, CategoryRef::ByName("misc".to_string()));
    }

    #[test]
    fn renamed_category_shows_on_existing_tasks() {
        let (mut tasks, mut categories) = stores();
        let created = tasks.create(NewTask::new("Standup")).unwrap();
        let id = created.category.id().unwrap();

        categories
            .update(
                id,
                CategoryPatch {
                    name: Some("office".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let expected = CategoryRef::ById {
            id,
            name: "office".to_string(),
        };
        assert_eq!(tasks.get_all().unwrap()[0].category, expected);
        assert_eq!(tasks.get_by_id(created.id).unwrap().unwrap().category, expected);

        // an edit that leaves the category alone keeps following the row
        let edited = tasks.update(created.id, TaskPatch::completed(true)).unwrap();
        assert_eq!(edited.category, expected);
    }

    #[test]
    fn seeding_is_idempotent() {
        let db = Database::in_memory().unwrap();
        db.seed_categories_if_empty().unwrap();
        db.seed_categories_if_empty().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count as usize, default_categories().unwrap().len());
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.db");
        let path = path.to_str().unwrap();

        let id = {
            let mut store = SqliteTaskStore::new(Rc::new(Database::new(path).unwrap()));
            let mut data = NewTask::new("Persisted");
            data.priority = Priority::Low;
            data.due_date = chrono::NaiveDate::from_ymd_opt(2031, 3, 4);
            store.create(data).unwrap().id
        };

        let store = SqliteTaskStore::new(Rc::new(Database::new(path).unwrap()));
        let task = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(task.title, "Persisted");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.due_date, chrono::NaiveDate::from_ymd_opt(2031, 3, 4));
    }
}
