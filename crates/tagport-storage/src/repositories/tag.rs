#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::messages::AssignMessages;
use crate::models::{Partner, Tag, TagStatus, Vehicle};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tagport_reader::traits::TagAssigner;
use tagport_reader::{AssignResponse, AssignTarget, ReaderError, Result as ReaderResult};
use tracing::{debug, info};

/// Repository trait for tags and the records they can be bound to.
pub trait TagRepository: Send + Sync {
    async fn find_by_uid(&self, uid: &str) -> StorageResult<Option<Tag>>;

    /// Tags bound to `target`, newest first.
    async fn find_by_owner(&self, target: AssignTarget) -> StorageResult<Vec<Tag>>;

    async fn set_status(&self, uid: &str, status: TagStatus) -> StorageResult<()>;

    async fn create_partner(&self, name: &str) -> StorageResult<i64>;

    async fn create_vehicle(&self, plate: &str) -> StorageResult<i64>;

    async fn find_partner(&self, id: i64) -> StorageResult<Option<Partner>>;

    async fn find_vehicle(&self, id: i64) -> StorageResult<Option<Vehicle>>;

    /// Bind tag `uid` to `target`.
    ///
    /// Rules, checked in order:
    /// 1. An unknown target is rejected.
    /// 2. An unknown tag is created `active` and bound to the target.
    /// 3. An `active` tag bound to any record is rejected as in use.
    /// 4. An `active` tag bound to nothing is rejected as inconsistent.
    /// 5. Any other tag is rebound to the target and made `active`.
    ///
    /// Rejections are `Ok` with `success == false`; `Err` means the database
    /// failed and nothing was changed.
    async fn assign(&self, target: AssignTarget, uid: &str) -> StorageResult<AssignResponse>;

    /// Take back the tag linked to `target`: the tag becomes `inactive`
    /// and loses its owner, and the target's link is cleared, all in one
    /// transaction. Returns the uid of the revoked tag, or `None` when the
    /// target had none. An unknown target is `NotFound`.
    async fn revoke(&self, target: AssignTarget) -> StorageResult<Option<String>>;
}

/// SQLite implementation of [`TagRepository`].
///
/// Also serves as the assignment workflow's [`TagAssigner`].
#[derive(Debug, Clone)]
pub struct SqliteTagRepository {
    pool: SqlitePool,
}

impl SqliteTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn target_exists(
    tx: &mut Transaction<'_, Sqlite>,
    target: AssignTarget,
) -> StorageResult<bool> {
    let sql = match target {
        AssignTarget::Partner(_) => "SELECT COUNT(*) FROM partners WHERE id = ?",
        AssignTarget::Vehicle(_) => "SELECT COUNT(*) FROM vehicles WHERE id = ?",
    };
    let (count,): (i64,) = sqlx::query_as(sql)
        .bind(target.id())
        .fetch_one(&mut **tx)
        .await?;
    Ok(count > 0)
}

async fn link_target(
    tx: &mut Transaction<'_, Sqlite>,
    target: AssignTarget,
    tag_id: i64,
) -> StorageResult<()> {
    let sql = match target {
        AssignTarget::Partner(_) => "UPDATE partners SET tag_id = ? WHERE id = ?",
        AssignTarget::Vehicle(_) => "UPDATE vehicles SET tag_id = ? WHERE id = ?",
    };
    sqlx::query(sql)
        .bind(tag_id)
        .bind(target.id())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Clear every back-reference to `tag_id`.
async fn unlink_tag(tx: &mut Transaction<'_, Sqlite>, tag_id: i64) -> StorageResult<()> {
    for sql in [
        "UPDATE partners SET tag_id = NULL WHERE tag_id = ?",
        "UPDATE vehicles SET tag_id = NULL WHERE tag_id = ?",
    ] {
        sqlx::query(sql).bind(tag_id).execute(&mut **tx).await?;
    }
    Ok(())
}

/// The `tag_id` back-reference of `target`. `None` when the target does
/// not exist.
async fn linked_tag(
    tx: &mut Transaction<'_, Sqlite>,
    target: AssignTarget,
) -> StorageResult<Option<Option<i64>>> {
    let sql = match target {
        AssignTarget::Partner(_) => "SELECT tag_id FROM partners WHERE id = ?",
        AssignTarget::Vehicle(_) => "SELECT tag_id FROM vehicles WHERE id = ?",
    };
    let row: Option<(Option<i64>,)> = sqlx::query_as(sql)
        .bind(target.id())
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|(tag_id,)| tag_id))
}

fn owner_columns(target: AssignTarget) -> (Option<i64>, Option<i64>) {
    match target {
        AssignTarget::Partner(id) => (Some(id), None),
        AssignTarget::Vehicle(id) => (None, Some(id)),
    }
}

impl TagRepository for SqliteTagRepository {
    async fn find_by_uid(&self, uid: &str) -> StorageResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, uid, status, partner_id, vehicle_id, created_at, updated_at
            FROM tags
            WHERE uid = ?
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn find_by_owner(&self, target: AssignTarget) -> StorageResult<Vec<Tag>> {
        let (partner_id, vehicle_id) = owner_columns(target);
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, uid, status, partner_id, vehicle_id, created_at, updated_at
            FROM tags
            WHERE partner_id = ? OR vehicle_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(partner_id)
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn set_status(&self, uid: &str, status: TagStatus) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE tags SET status = ?, updated_at = datetime('now') WHERE uid = ?",
        )
        .bind(status.as_str())
        .bind(uid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Tag", "uid", uid));
        }

        Ok(())
    }

    async fn create_partner(&self, name: &str) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO partners (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn create_vehicle(&self, plate: &str) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO vehicles (plate) VALUES (?)")
            .bind(plate)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_partner(&self, id: i64) -> StorageResult<Option<Partner>> {
        let partner =
            sqlx::query_as::<_, Partner>("SELECT id, name, tag_id FROM partners WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(partner)
    }

    async fn find_vehicle(&self, id: i64) -> StorageResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT id, plate, tag_id FROM vehicles WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    async fn assign(&self, target: AssignTarget, uid: &str) -> StorageResult<AssignResponse> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(StorageError::Validation("tag uid must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        if !target_exists(&mut tx, target).await? {
            let message = match target {
                AssignTarget::Partner(_) => AssignMessages::PARTNER_NOT_FOUND,
                AssignTarget::Vehicle(_) => AssignMessages::VEHICLE_NOT_FOUND,
            };
            return Ok(AssignResponse::rejected(message));
        }

        let existing = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, uid, status, partner_id, vehicle_id, created_at, updated_at
            FROM tags
            WHERE uid = ?
            "#,
        )
        .bind(uid)
        .fetch_optional(&mut *tx)
        .await?;

        let (partner_id, vehicle_id) = owner_columns(target);
        let tag_id = match existing {
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO tags (uid, status, partner_id, vehicle_id)
                    VALUES (?, 'active', ?, ?)
                    "#,
                )
                .bind(uid)
                .bind(partner_id)
                .bind(vehicle_id)
                .execute(&mut *tx)
                .await?;
                result.last_insert_rowid()
            }
            Some(tag) if tag.is_active() => {
                debug!(uid, owner = ?tag.owner(), "Active tag refused");
                let message = if tag.owner().is_some() {
                    AssignMessages::TAG_IN_USE
                } else {
                    AssignMessages::TAG_ACTIVE_UNASSIGNED
                };
                return Ok(AssignResponse::rejected(message));
            }
            Some(tag) => {
                sqlx::query(
                    r#"
                    UPDATE tags
                    SET status = 'active', partner_id = ?, vehicle_id = ?,
                        updated_at = datetime('now')
                    WHERE id = ?
                    "#,
                )
                .bind(partner_id)
                .bind(vehicle_id)
                .bind(tag.id)
                .execute(&mut *tx)
                .await?;
                unlink_tag(&mut tx, tag.id).await?;
                tag.id
            }
        };

        link_target(&mut tx, target, tag_id).await?;
        tx.commit().await?;

        info!(%target, uid, "Tag bound");
        Ok(AssignResponse::accepted(AssignMessages::ASSIGNED))
    }

    async fn revoke(&self, target: AssignTarget) -> StorageResult<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let Some(linked) = linked_tag(&mut tx, target).await? else {
            return Err(StorageError::not_found(target.kind(), "id", target.id().to_string()));
        };
        let Some(tag_id) = linked else {
            debug!(%target, "No tag to revoke");
            return Ok(None);
        };

        let uid: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE tags
            SET status = 'inactive', partner_id = NULL, vehicle_id = NULL,
                updated_at = datetime('now')
            WHERE id = ?
            RETURNING uid
            "#,
        )
        .bind(tag_id)
        .fetch_optional(&mut *tx)
        .await?;
        unlink_tag(&mut tx, tag_id).await?;
        tx.commit().await?;

        let uid = uid.map(|(uid,)| uid);
        info!(%target, uid = ?uid, "Tag revoked");
        Ok(uid)
    }
}

impl TagAssigner for SqliteTagRepository {
    async fn assign(&self, target: AssignTarget, tag: &str) -> ReaderResult<AssignResponse> {
        TagRepository::assign(self, target, tag)
            .await
            .map_err(|e| ReaderError::assignment(e.to_string()))
    }
}
