//! SQLite storage implementation.
//!
//! Writes go through [`SqliteStorage::mutate`], which wraps the closure in
//! an IMMEDIATE transaction and logs what it touched once committed.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, ToSql, Transaction};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    new_id, parse_timestamp, CompanyKey, Contact, ContactPatch, Deal, DealPatch, NewContact,
    NewDeal, NewPipeline, NewStage, NewTask, Pipeline, PipelineCatalog, PipelineWithStages,
    RelatedTo, Stage, Task, TaskPatch, TaskStatus,
};
use crate::storage::listing::{ListOptions, CONTACT_SORTS, DEAL_SORTS, TASK_SORTS};
use crate::storage::now_timestamp;
use crate::storage::schema::apply_schema;

/// Most tasks returned for one company profile.
pub const COMPANY_TASK_LIMIT: usize = 200;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation, tracking which records it touched.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Who asked for it (`api`, `cli`, ...).
    pub actor: String,
    /// `(entity, id)` pairs written by the operation.
    pub touched: Vec<(&'static str, String)>,
}

impl MutationContext {
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            touched: Vec::new(),
        }
    }

    /// Note that `entity` `id` was written.
    pub fn record(&mut self, entity: &'static str, id: &str) {
        self.touched.push((entity, id.to_string()));
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5000)))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation inside an IMMEDIATE transaction.
    ///
    /// The transaction commits only if the closure succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);
        let result = f(&tx, &mut ctx)?;
        tx.commit()?;

        debug!(op = %ctx.op_name, actor = %ctx.actor, touched = ?ctx.touched, "Mutation committed");
        Ok(result)
    }

    /// Whether the store holds no records at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_empty(&self) -> Result<bool> {
        let total: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM contacts) + (SELECT COUNT(*) FROM deals)
                  + (SELECT COUNT(*) FROM pipelines) + (SELECT COUNT(*) FROM tasks)",
            [],
            |row| row.get(0),
        )?;
        Ok(total == 0)
    }

    /// Delete every record. Schema and migration history stay.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub fn clear_all(&mut self, actor: &str) -> Result<()> {
        self.mutate("clear_all", actor, |tx, _ctx| {
            tx.execute_batch(
                "DELETE FROM tasks; DELETE FROM deals; DELETE FROM stages;
                 DELETE FROM pipelines; DELETE FROM contacts;",
            )?;
            Ok(())
        })
    }

    // ==================
    // Contact Operations
    // ==================

    /// List contacts, optionally filtered by a substring of name, email or phone.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_contacts(&self, opts: &ListOptions) -> Result<Vec<Contact>> {
        let column = opts.sort_column(CONTACT_SORTS, "updated_at");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        let where_clause = if let Some(q) = &opts.search {
            params.push(Box::new(like_pattern(q)));
            " WHERE lower(ifnull(c.first_name, '') || ' ' || ifnull(c.last_name, '') || ' ' ||
                          ifnull(c.email, '') || ' ' || ifnull(c.phone, '')) LIKE ? ESCAPE '\\'"
        } else {
            ""
        };

        let sql = format!(
            "{CONTACT_SELECT}{where_clause} ORDER BY {column} {}, c.id ASC LIMIT ? OFFSET ?",
            opts.order.as_sql()
        );
        params.push(Box::new(opts.limit));
        params.push(Box::new(opts.offset));

        query_all(&self.conn, &sql, &params, map_contact_row)
    }

    /// Get a contact by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        fetch_contact(&self.conn, id)
    }

    /// Create a contact and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_contact(&mut self, input: &NewContact, actor: &str) -> Result<Contact> {
        let id = new_id("ct");
        let now = now_timestamp();

        self.mutate("create_contact", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO contacts (id, first_name, last_name, email, phone, title, address, company, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                rusqlite::params![
                    id,
                    input.first_name,
                    input.last_name,
                    input.email,
                    input.phone,
                    input.title,
                    input.address,
                    input.company,
                    now
                ],
            )?;
            ctx.record("contact", &id);
            fetch_contact(tx, &id)?.ok_or_else(|| Error::ContactNotFound { id: id.clone() })
        })
    }

    /// Apply a partial update. `None` fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContactNotFound`] if no contact has this ID.
    pub fn update_contact(&mut self, id: &str, patch: &ContactPatch, actor: &str) -> Result<Contact> {
        let mut update = UpdateBuilder::new();
        update.set("first_name", patch.first_name.clone());
        update.set("last_name", patch.last_name.clone());
        update.set("email", patch.email.clone());
        update.set("phone", patch.phone.clone());
        update.set("title", patch.title.clone());
        update.set("address", patch.address.clone());
        update.set("company", patch.company.clone());
        update.touch("updated_at");

        self.mutate("update_contact", actor, |tx, ctx| {
            if update.execute(tx, "contacts", id)? == 0 {
                return Err(Error::ContactNotFound { id: id.to_string() });
            }
            ctx.record("contact", id);
            fetch_contact(tx, id)?.ok_or_else(|| Error::ContactNotFound { id: id.to_string() })
        })
    }

    /// Hard-delete a contact. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_contact(&mut self, id: &str, actor: &str) -> Result<bool> {
        self.mutate("delete_contact", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM contacts WHERE id = ?1", [id])?;
            if rows > 0 {
                ctx.record("contact", id);
            }
            Ok(rows > 0)
        })
    }

    /// Contacts whose company normalizes to `key`, ordered by last name
    /// then first name, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn contacts_for_company(&self, key: &CompanyKey) -> Result<Vec<Contact>> {
        let sql = format!(
            "{CONTACT_SELECT} WHERE c.company IS NOT NULL
             ORDER BY c.last_name COLLATE NOCASE ASC, c.first_name COLLATE NOCASE ASC, c.id ASC"
        );
        let contacts = query_all(&self.conn, &sql, &[], map_contact_row)?;
        Ok(contacts
            .into_iter()
            .filter(|contact| contact.company_key().as_ref() == Some(key))
            .collect())
    }

    // ==================
    // Deal Operations
    // ==================

    /// List deals with their stage and pipeline names.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_deals(&self, opts: &ListOptions) -> Result<Vec<Deal>> {
        let column = opts.sort_column(DEAL_SORTS, "updated_at");
        let sql = format!(
            "{DEAL_SELECT} ORDER BY {column} {}, d.id ASC LIMIT ?1 OFFSET ?2",
            opts.order.as_sql()
        );
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(opts.limit), Box::new(opts.offset)];
        query_all(&self.conn, &sql, &params, map_deal_row)
    }

    /// Get a deal by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_deal(&self, id: &str) -> Result<Option<Deal>> {
        fetch_deal(&self.conn, id)
    }

    /// Create a deal. The stage must exist and belong to the pipeline; a
    /// missing pipeline is taken from the stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown or mismatched
    /// pipeline/stage, or a database error.
    pub fn create_deal(&mut self, input: &NewDeal, actor: &str) -> Result<Deal> {
        let id = new_id("deal");
        let now = now_timestamp();

        self.mutate("create_deal", actor, |tx, ctx| {
            let (pipeline_id, stage_id) =
                resolve_placement(tx, input.pipeline_id.as_deref(), input.stage_id.as_deref())?;

            tx.execute(
                "INSERT INTO deals (id, name, amount, pipeline_id, stage_id, company, owner, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    id,
                    input.name,
                    input.amount.unwrap_or(0.0),
                    pipeline_id,
                    stage_id,
                    input.company,
                    input.owner,
                    now
                ],
            )?;
            ctx.record("deal", &id);
            fetch_deal(tx, &id)?.ok_or_else(|| Error::DealNotFound { id: id.clone() })
        })
    }

    /// Apply a partial update, keeping pipeline and stage consistent.
    ///
    /// Moving to a new stage alone also moves the deal to that stage's
    /// pipeline. Moving to a new pipeline alone keeps the current stage
    /// only if it belongs there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DealNotFound`] if no deal has this ID, or
    /// [`Error::Validation`] for an inconsistent placement.
    pub fn update_deal(&mut self, id: &str, patch: &DealPatch, actor: &str) -> Result<Deal> {
        self.mutate("update_deal", actor, |tx, ctx| {
            let existing =
                fetch_deal(tx, id)?.ok_or_else(|| Error::DealNotFound { id: id.to_string() })?;

            let mut update = UpdateBuilder::new();
            update.set("name", patch.name.clone());
            update.set("amount", patch.amount);
            update.set("company", patch.company.clone());
            update.set("owner", patch.owner.clone());

            match (patch.pipeline_id.as_deref(), patch.stage_id.as_deref()) {
                (pipeline, Some(stage)) => {
                    let (pipeline_id, stage_id) = resolve_placement(tx, pipeline, Some(stage))?;
                    update.set("pipeline_id", pipeline_id);
                    update.set("stage_id", stage_id);
                }
                (Some(pipeline), None) => {
                    // A dangling current stage is not held against the move.
                    let current_stage = match existing.stage_id.as_deref() {
                        Some(stage) if stage_pipeline(tx, stage)?.is_some() => Some(stage),
                        _ => None,
                    };
                    let (pipeline_id, _) = resolve_placement(tx, Some(pipeline), current_stage)?;
                    update.set("pipeline_id", pipeline_id);
                }
                (None, None) => {}
            }
            update.touch("updated_at");

            if update.execute(tx, "deals", id)? == 0 {
                return Err(Error::DealNotFound { id: id.to_string() });
            }
            ctx.record("deal", id);
            fetch_deal(tx, id)?.ok_or_else(|| Error::DealNotFound { id: id.to_string() })
        })
    }

    /// Hard-delete a deal. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_deal(&mut self, id: &str, actor: &str) -> Result<bool> {
        self.mutate("delete_deal", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM deals WHERE id = ?1", [id])?;
            if rows > 0 {
                ctx.record("deal", id);
            }
            Ok(rows > 0)
        })
    }

    /// Deals whose company normalizes to `key`, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn deals_for_company(&self, key: &CompanyKey) -> Result<Vec<Deal>> {
        let sql = format!(
            "{DEAL_SELECT} WHERE d.company IS NOT NULL ORDER BY d.updated_at DESC, d.id ASC"
        );
        let deals = query_all(&self.conn, &sql, &[], map_deal_row)?;
        Ok(deals
            .into_iter()
            .filter(|deal| deal.company_key().as_ref() == Some(key))
            .collect())
    }

    // ==================
    // Task Operations
    // ==================

    /// List tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks(&self, opts: &ListOptions) -> Result<Vec<Task>> {
        let column = opts.sort_column(TASK_SORTS, "due_at");
        let sql = format!(
            "{TASK_SELECT} ORDER BY {column} {}, t.id ASC LIMIT ?1 OFFSET ?2",
            opts.order.as_sql()
        );
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(opts.limit), Box::new(opts.offset)];
        query_all(&self.conn, &sql, &params, map_task_row)
    }

    /// Get a task by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        fetch_task(&self.conn, id)
    }

    /// Create a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_task(&mut self, input: &NewTask, actor: &str) -> Result<Task> {
        let id = new_id("task");
        let now = now_timestamp();
        let due_at = input.due_at.map(crate::storage::format_timestamp);
        let (related_type, related_id) = input.related.to_columns();

        self.mutate("create_task", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO tasks (id, subject, due_at, related_type, related_id, owner, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    input.subject,
                    due_at,
                    related_type,
                    related_id,
                    input.owner,
                    input.status.as_str(),
                    now
                ],
            )?;
            ctx.record("task", &id);
            fetch_task(tx, &id)?.ok_or_else(|| Error::TaskNotFound { id: id.clone() })
        })
    }

    /// Apply a partial update. `None` fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if no task has this ID.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch, actor: &str) -> Result<Task> {
        let mut update = UpdateBuilder::new();
        update.set("subject", patch.subject.clone());
        update.set("due_at", patch.due_at.map(crate::storage::format_timestamp));
        if let Some(related) = &patch.related {
            let (kind, related_id) = related.to_columns();
            update.set_nullable("related_type", kind.map(str::to_string));
            update.set_nullable("related_id", related_id.map(str::to_string));
        }
        update.set("owner", patch.owner.clone());
        update.set("status", patch.status.map(|s| s.as_str().to_string()));

        // Tasks carry no updated_at, so an empty patch changes nothing.
        self.mutate("update_task", actor, |tx, ctx| {
            let changed = update.execute(tx, "tasks", id)?;
            let task =
                fetch_task(tx, id)?.ok_or_else(|| Error::TaskNotFound { id: id.to_string() })?;
            if changed > 0 {
                ctx.record("task", id);
            }
            Ok(task)
        })
    }

    /// Hard-delete a task. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_task(&mut self, id: &str, actor: &str) -> Result<bool> {
        self.mutate("delete_task", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            if rows > 0 {
                ctx.record("task", id);
            }
            Ok(rows > 0)
        })
    }

    /// Tasks about the company `key`, soonest due first, undated last,
    /// capped at [`COMPANY_TASK_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn company_tasks(&self, key: &CompanyKey) -> Result<Vec<Task>> {
        let sql = format!(
            "{TASK_SELECT} WHERE t.related_type IS NOT NULL AND t.related_id IS NOT NULL
             ORDER BY t.due_at IS NULL, t.due_at ASC, t.created_at ASC, t.id ASC"
        );
        let tasks = query_all(&self.conn, &sql, &[], map_task_row)?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.related.is_company(key))
            .take(COMPANY_TASK_LIMIT)
            .collect())
    }

    // ==================
    // Pipeline Operations
    // ==================

    /// Every pipeline (by name) and every stage (by order index).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pipeline_catalog(&self) -> Result<PipelineCatalog> {
        let pipelines = query_all(
            &self.conn,
            "SELECT id, name FROM pipelines ORDER BY name ASC, id ASC",
            &[],
            map_pipeline_row,
        )?;
        let stages = query_all(
            &self.conn,
            &format!("{STAGE_SELECT} ORDER BY order_index ASC, id ASC"),
            &[],
            map_stage_row,
        )?;
        Ok(PipelineCatalog { pipelines, stages })
    }

    /// Create a pipeline with its initial stages.
    ///
    /// Stages without an explicit `order_index` take their list position.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    pub fn create_pipeline(&mut self, input: &NewPipeline, actor: &str) -> Result<PipelineWithStages> {
        let pipeline = Pipeline {
            id: new_id("pl"),
            name: input.name.clone(),
        };

        self.mutate("create_pipeline", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO pipelines (id, name) VALUES (?1, ?2)",
                rusqlite::params![pipeline.id, pipeline.name],
            )?;
            ctx.record("pipeline", &pipeline.id);

            let mut stages = Vec::with_capacity(input.stages.len());
            for (position, stage) in (0_i64..).zip(&input.stages) {
                let order_index = stage.order_index.unwrap_or(position);
                stages.push(insert_stage(tx, ctx, &pipeline.id, stage, order_index)?);
            }
            stages.sort_by_key(|stage| stage.order_index);

            Ok(PipelineWithStages {
                pipeline: pipeline.clone(),
                stages,
            })
        })
    }

    /// Delete a pipeline and its stages. Deals keep their references.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_pipeline(&mut self, id: &str, actor: &str) -> Result<bool> {
        self.mutate("delete_pipeline", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM pipelines WHERE id = ?1", [id])?;
            if rows > 0 {
                ctx.record("pipeline", id);
            }
            Ok(rows > 0)
        })
    }

    /// Add a stage to a pipeline, at the end unless `order_index` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the pipeline does not exist.
    pub fn create_stage(&mut self, pipeline_id: &str, input: &NewStage, actor: &str) -> Result<Stage> {
        self.mutate("create_stage", actor, |tx, ctx| {
            if !pipeline_exists(tx, pipeline_id)? {
                return Err(Error::Validation("Unknown pipeline.".to_string()));
            }
            let order_index = match input.order_index {
                Some(index) => index,
                None => tx.query_row(
                    "SELECT COALESCE(MAX(order_index) + 1, 0) FROM stages WHERE pipeline_id = ?1",
                    [pipeline_id],
                    |row| row.get(0),
                )?,
            };
            insert_stage(tx, ctx, pipeline_id, input, order_index)
        })
    }

    /// Delete a stage. Deals keep their references.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_stage(&mut self, id: &str, actor: &str) -> Result<bool> {
        self.mutate("delete_stage", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM stages WHERE id = ?1", [id])?;
            if rows > 0 {
                ctx.record("stage", id);
            }
            Ok(rows > 0)
        })
    }
}

// ==================
// Queries & Row Mapping
// ==================

const CONTACT_SELECT: &str = "SELECT c.id, c.first_name, c.last_name, c.email, c.phone, c.title, c.address, c.company, c.created_at, c.updated_at
     FROM contacts c";

const DEAL_SELECT: &str = "SELECT d.id, d.name, d.amount, d.pipeline_id, d.stage_id, d.company, d.owner, d.created_at, d.updated_at,
            s.name AS stage_name, p.name AS pipeline_name
     FROM deals d
     LEFT JOIN stages s ON s.id = d.stage_id
     LEFT JOIN pipelines p ON p.id = d.pipeline_id";

const TASK_SELECT: &str = "SELECT t.id, t.subject, t.due_at, t.related_type, t.related_id, t.owner, t.status, t.created_at
     FROM tasks t";

const STAGE_SELECT: &str = "SELECT id, pipeline_id, name, order_index, probability FROM stages";

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    params: &[Box<dyn ToSql>],
    map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
    let rows = stmt.query_map(param_refs.as_slice(), map)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn fetch_contact(conn: &Connection, id: &str) -> Result<Option<Contact>> {
    let sql = format!("{CONTACT_SELECT} WHERE c.id = ?1");
    Ok(conn.query_row(&sql, [id], map_contact_row).optional()?)
}

fn fetch_deal(conn: &Connection, id: &str) -> Result<Option<Deal>> {
    let sql = format!("{DEAL_SELECT} WHERE d.id = ?1");
    Ok(conn.query_row(&sql, [id], map_deal_row).optional()?)
}

fn fetch_task(conn: &Connection, id: &str) -> Result<Option<Task>> {
    let sql = format!("{TASK_SELECT} WHERE t.id = ?1");
    Ok(conn.query_row(&sql, [id], map_task_row).optional()?)
}

fn pipeline_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn
        .prepare("SELECT 1 FROM pipelines WHERE id = ?1")?
        .exists([id])?)
}

/// Pipeline of a stage, or `None` if the stage does not exist.
fn stage_pipeline(conn: &Connection, stage_id: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT pipeline_id FROM stages WHERE id = ?1", [stage_id], |row| {
            row.get(0)
        })
        .optional()?)
}

/// Check a deal's pipeline/stage pair and fill in the pipeline from the stage.
fn resolve_placement(
    conn: &Connection,
    pipeline_id: Option<&str>,
    stage_id: Option<&str>,
) -> Result<(Option<String>, Option<String>)> {
    match (pipeline_id, stage_id) {
        (_, Some(stage)) => {
            let owner = stage_pipeline(conn, stage)?
                .ok_or_else(|| Error::Validation("Unknown stage.".to_string()))?;
            if let Some(pipeline) = pipeline_id {
                if pipeline != owner {
                    return Err(Error::Validation(
                        "Stage does not belong to the selected pipeline.".to_string(),
                    ));
                }
            }
            Ok((Some(owner), Some(stage.to_string())))
        }
        (Some(pipeline), None) => {
            if pipeline_exists(conn, pipeline)? {
                Ok((Some(pipeline.to_string()), None))
            } else {
                Err(Error::Validation("Unknown pipeline.".to_string()))
            }
        }
        (None, None) => Ok((None, None)),
    }
}

fn insert_stage(
    tx: &Transaction,
    ctx: &mut MutationContext,
    pipeline_id: &str,
    input: &NewStage,
    order_index: i64,
) -> Result<Stage> {
    let stage = Stage {
        id: new_id("st"),
        pipeline_id: pipeline_id.to_string(),
        name: input.name.clone(),
        order_index,
        probability: input.probability,
    };
    tx.execute(
        "INSERT INTO stages (id, pipeline_id, name, order_index, probability) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            stage.id,
            stage.pipeline_id,
            stage.name,
            stage.order_index,
            stage.probability
        ],
    )?;
    ctx.record("stage", &stage.id);
    Ok(stage)
}

/// Escape LIKE wildcards and wrap in `%...%`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<chrono::DateTime<chrono::Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .as_deref()
        .and_then(parse_timestamp))
}

fn map_contact_row(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        title: row.get(5)?,
        address: row.get(6)?,
        company: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
        updated_at: timestamp_column(row, 9)?,
    })
}

fn map_deal_row(row: &rusqlite::Row) -> rusqlite::Result<Deal> {
    Ok(Deal {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
        pipeline_id: row.get(3)?,
        stage_id: row.get(4)?,
        company: row.get(5)?,
        owner: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
        stage_name: row.get(9)?,
        pipeline_name: row.get(10)?,
    })
}

fn map_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let related_type: Option<String> = row.get(3)?;
    let related_id: Option<String> = row.get(4)?;
    let status: Option<String> = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        subject: row.get(1)?,
        due_at: timestamp_column(row, 2)?,
        related: RelatedTo::from_columns(related_type.as_deref(), related_id.as_deref()),
        owner: row.get(5)?,
        status: status.as_deref().map(TaskStatus::from_stored).unwrap_or_default(),
        created_at: timestamp_column(row, 7)?,
    })
}

fn map_pipeline_row(row: &rusqlite::Row) -> rusqlite::Result<Pipeline> {
    Ok(Pipeline {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn map_stage_row(row: &rusqlite::Row) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        pipeline_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
        probability: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
    })
}

/// Dynamic `UPDATE ... SET` built from the fields a patch carries.
struct UpdateBuilder {
    set_clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl UpdateBuilder {
    fn new() -> Self {
        Self {
            set_clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Set `column` if `value` is present; absent leaves it unchanged.
    fn set<T: ToSql + 'static>(&mut self, column: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set_clauses.push(format!("{column} = ?"));
            self.params.push(Box::new(v));
        }
    }

    /// Set `column`, writing NULL for `None`.
    fn set_nullable<T: ToSql + 'static>(&mut self, column: &str, value: Option<T>) {
        self.set_clauses.push(format!("{column} = ?"));
        self.params.push(Box::new(value));
    }

    /// Stamp `column` with the current time.
    fn touch(&mut self, column: &str) {
        self.set_clauses.push(format!("{column} = ?"));
        self.params.push(Box::new(now_timestamp()));
    }

    fn is_empty(&self) -> bool {
        self.set_clauses.is_empty()
    }

    /// Run against `table` for row `id`; returns the number of rows changed.
    fn execute(&self, conn: &Connection, table: &str, id: &str) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let sql = format!("UPDATE {table} SET {} WHERE id = ?", self.set_clauses.join(", "));
        let mut param_refs: Vec<&dyn ToSql> = self.params.iter().map(AsRef::as_ref).collect();
        param_refs.push(&id);
        Ok(conn.execute(&sql, param_refs.as_slice())?)
    }
}
