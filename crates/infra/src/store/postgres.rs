//! Postgres-backed stores.
//!
//! Each commit runs inside one SQL transaction, so a change set is applied
//! completely or not at all. Container ids come from a `BIGSERIAL` column.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use depot_core::{ContainerId, ContainerItemId, Entity, ItemId, WorkOrderId};
use depot_inventory::{Container, ContainerItem, WorkOrder};

use super::{ChangeSet, Committed, ContainerStore, Store, StoreError, StoreResult};

/// Schema used by the Postgres stores.
///
/// Columns carry no length limits; field rules belong to the command handlers.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS containers (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id          BIGSERIAL PRIMARY KEY,
        sku         TEXT NOT NULL,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS container_items (
        id           BIGSERIAL PRIMARY KEY,
        container_id BIGINT NOT NULL REFERENCES containers (id),
        item_id      BIGINT NOT NULL REFERENCES items (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS work_orders (
        id    UUID PRIMARY KEY,
        title TEXT NOT NULL
    )
    "#,
];

/// Create the tables if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(backend)?;
    }
    Ok(())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn stale<E: Entity>(id: &E::Id) -> StoreError {
    StoreError::Stale {
        entity_type: E::TYPE_NAME,
        id: id.to_string(),
    }
}

fn container_from_row(row: &PgRow) -> StoreResult<Container> {
    let id: i64 = row.try_get("id").map_err(backend)?;
    let name: String = row.try_get("name").map_err(backend)?;
    let description: String = row.try_get("description").map_err(backend)?;
    Ok(Container::restore(ContainerId::new(id), name, description, Vec::new()))
}

/// Container store backed by the `containers` / `container_items` tables.
#[derive(Debug, Clone)]
pub struct PostgresContainerStore {
    pool: PgPool,
}

impl PostgresContainerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store<Container> for PostgresContainerStore {
    async fn find(&self, id: &ContainerId) -> StoreResult<Option<Container>> {
        let row = sqlx::query("SELECT id, name, description FROM containers WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(container_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Container>> {
        let rows = sqlx::query("SELECT id, name, description FROM containers ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(container_from_row).collect()
    }

    #[instrument(skip_all, fields(changes = changes.len()))]
    async fn commit(&self, changes: ChangeSet<Container>) -> StoreResult<Committed<Container>> {
        let (added, modified, removed) = changes.into_parts();
        let affected = added.len() + modified.len() + removed.len();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let mut committed = Vec::with_capacity(added.len());
        for mut c in added {
            let row = sqlx::query(
                "INSERT INTO containers (name, description) VALUES ($1, $2) RETURNING id",
            )
            .bind(c.name())
            .bind(c.description())
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
            let id: i64 = row.try_get("id").map_err(backend)?;
            c.assign_id(ContainerId::new(id));
            committed.push(c);
        }

        for c in &modified {
            let result =
                sqlx::query("UPDATE containers SET name = $1, description = $2 WHERE id = $3")
                    .bind(c.name())
                    .bind(c.description())
                    .bind(c.id_typed().get())
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;
            if result.rows_affected() == 0 {
                return Err(stale::<Container>(&c.id_typed()));
            }
        }

        for c in &removed {
            sqlx::query("DELETE FROM container_items WHERE container_id = $1")
                .bind(c.id_typed().get())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
            let result = sqlx::query("DELETE FROM containers WHERE id = $1")
                .bind(c.id_typed().get())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
            if result.rows_affected() == 0 {
                return Err(stale::<Container>(&c.id_typed()));
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(Committed {
            added: committed,
            affected,
        })
    }
}

#[async_trait]
impl ContainerStore for PostgresContainerStore {
    async fn find_with_items(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        let Some(mut container) = self.find(&id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT id, container_id, item_id FROM container_items WHERE container_id = $1 ORDER BY id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let items = rows
            .iter()
            .map(|row| -> StoreResult<ContainerItem> {
                Ok(ContainerItem::new(
                    ContainerItemId::new(row.try_get("id").map_err(backend)?),
                    ContainerId::new(row.try_get("container_id").map_err(backend)?),
                    ItemId::new(row.try_get("item_id").map_err(backend)?),
                ))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        container.set_items(items);
        Ok(Some(container))
    }

    async fn exists_by_name_excluding(
        &self,
        name: &str,
        exclude: Option<ContainerId>,
    ) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM containers WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)) AS taken",
        )
        .bind(name)
        .bind(exclude.map(|id| id.get()))
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        row.try_get("taken").map_err(backend)
    }
}

/// Work order store backed by the `work_orders` table.
#[derive(Debug, Clone)]
pub struct PostgresWorkOrderStore {
    pool: PgPool,
}

impl PostgresWorkOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn work_order_from_row(row: &PgRow) -> StoreResult<WorkOrder> {
    let id: Uuid = row.try_get("id").map_err(backend)?;
    let title: String = row.try_get("title").map_err(backend)?;
    Ok(WorkOrder::new(WorkOrderId::from_uuid(id), title))
}

#[async_trait]
impl Store<WorkOrder> for PostgresWorkOrderStore {
    async fn find(&self, id: &WorkOrderId) -> StoreResult<Option<WorkOrder>> {
        let row = sqlx::query("SELECT id, title FROM work_orders WHERE id = $1")
            .bind(Uuid::from(*id))
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(work_order_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<WorkOrder>> {
        let rows = sqlx::query("SELECT id, title FROM work_orders ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(work_order_from_row).collect()
    }

    #[instrument(skip_all, fields(changes = changes.len()))]
    async fn commit(&self, changes: ChangeSet<WorkOrder>) -> StoreResult<Committed<WorkOrder>> {
        let (added, modified, removed) = changes.into_parts();
        let affected = added.len() + modified.len() + removed.len();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        for w in &added {
            sqlx::query("INSERT INTO work_orders (id, title) VALUES ($1, $2)")
                .bind(Uuid::from(w.id_typed()))
                .bind(w.title())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        for w in &modified {
            let result = sqlx::query("UPDATE work_orders SET title = $1 WHERE id = $2")
                .bind(w.title())
                .bind(Uuid::from(w.id_typed()))
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
            if result.rows_affected() == 0 {
                return Err(stale::<WorkOrder>(&w.id_typed()));
            }
        }

        for w in &removed {
            let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
                .bind(Uuid::from(w.id_typed()))
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
            if result.rows_affected() == 0 {
                return Err(stale::<WorkOrder>(&w.id_typed()));
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(Committed { added, affected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_columns_leave_length_rules_to_handlers() {
        let containers = SCHEMA
            .iter()
            .find(|s| s.contains("CREATE TABLE IF NOT EXISTS containers"))
            .unwrap();
        assert!(!containers.contains("VARCHAR"));
        assert!(containers.contains("name        TEXT NOT NULL"));
    }
}
