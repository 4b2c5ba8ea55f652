//! SQLite dungeon store
//!
//! Implements `DungeonRepositoryPort` over a `SqlitePool`. Tables are created
//! on startup; object positions are stored room-local.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::application::ports::outbound::{DungeonFilter, DungeonRepositoryPort};
use crate::domain::entities::{
    Archetype, Dungeon, DungeonStatus, Faction, NewRoomObject, PaletteEntry, Room, RoomGroup,
    RoomObject, Template, TemplateObject, INITIAL_REVISION,
};
use crate::domain::value_objects::{
    ArchetypeId, CategoryId, DungeonId, FactionId, GroupId, ItemTypeId, ObjectId, Orientation,
    RoomId, TemplateId, UserId, Vec3,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS archetypes (
        archetype_id INTEGER PRIMARY KEY,
        archetype_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS factions (
        faction_id INTEGER PRIMARY KEY,
        faction_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dungeons (
        dungeon_id INTEGER PRIMARY KEY,
        dungeon_name TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        archetype_id INTEGER NOT NULL,
        faction_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rooms (
        room_id INTEGER PRIMARY KEY,
        dungeon_id INTEGER NOT NULL,
        room_name TEXT NOT NULL,
        origin_x REAL NOT NULL DEFAULT 0,
        origin_y REAL NOT NULL DEFAULT 0,
        origin_z REAL NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS room_groups (
        group_id INTEGER PRIMARY KEY,
        room_id INTEGER NOT NULL,
        group_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS room_objects (
        object_id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id INTEGER NOT NULL,
        type_id INTEGER NOT NULL,
        group_id INTEGER NOT NULL DEFAULT 0,
        x REAL NOT NULL,
        y REAL NOT NULL,
        z REAL NOT NULL,
        yaw REAL NOT NULL,
        pitch REAL NOT NULL,
        roll REAL NOT NULL,
        radius REAL NOT NULL,
        revision INTEGER NOT NULL DEFAULT 1,
        object_name TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_room_objects_room ON room_objects (room_id)",
    r#"
    CREATE TABLE IF NOT EXISTS templates (
        template_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        template_name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        room_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS template_objects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        template_id INTEGER NOT NULL,
        type_id INTEGER NOT NULL,
        x REAL NOT NULL,
        y REAL NOT NULL,
        z REAL NOT NULL,
        yaw REAL NOT NULL,
        pitch REAL NOT NULL,
        roll REAL NOT NULL,
        radius REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS item_groups (
        group_id INTEGER PRIMARY KEY,
        category_id INTEGER NOT NULL,
        group_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS item_types (
        type_id INTEGER PRIMARY KEY,
        group_id INTEGER NOT NULL,
        type_name TEXT NOT NULL
    )
    "#,
];

const ROOM_OBJECT_COLUMNS: &str = "object_id, room_id, type_id, group_id, x, y, z, yaw, pitch, roll, radius, revision, object_name";

#[derive(FromRow)]
struct RoomObjectRow {
    object_id: i64,
    room_id: i64,
    type_id: i64,
    group_id: i64,
    x: f64,
    y: f64,
    z: f64,
    yaw: f64,
    pitch: f64,
    roll: f64,
    radius: f64,
    revision: i64,
    object_name: Option<String>,
}

impl From<RoomObjectRow> for RoomObject {
    fn from(row: RoomObjectRow) -> Self {
        RoomObject {
            id: ObjectId::new(row.object_id),
            room_id: RoomId::new(row.room_id),
            type_id: ItemTypeId::new(row.type_id),
            group_id: GroupId::new(row.group_id),
            position: Vec3::new(row.x, row.y, row.z),
            orientation: Orientation::new(row.yaw, row.pitch, row.roll),
            radius: row.radius,
            revision: row.revision,
            name: row.object_name,
        }
    }
}

type DungeonRow = (i64, String, i64, i64, i64);
type RoomRow = (i64, i64, String, f64, f64, f64);
type TemplateRow = (i64, i64, String, String, i64);

fn dungeon_from_row((id, name, status, archetype_id, faction_id): DungeonRow) -> Dungeon {
    Dungeon {
        id: DungeonId::new(id),
        name,
        status: DungeonStatus::from_code(status),
        archetype_id: ArchetypeId::new(archetype_id),
        faction_id: FactionId::new(faction_id),
    }
}

fn room_from_row((id, dungeon_id, name, x, y, z): RoomRow) -> Room {
    Room {
        id: RoomId::new(id),
        dungeon_id: DungeonId::new(dungeon_id),
        name,
        origin: Vec3::new(x, y, z),
    }
}

fn template_from_row((id, owner_id, name, description, room_id): TemplateRow) -> Template {
    Template {
        id: TemplateId::new(id),
        owner_id: UserId::new(owner_id),
        name,
        description,
        room_id: RoomId::new(room_id),
    }
}

pub struct SqliteDungeonStore {
    pool: SqlitePool,
}

impl SqliteDungeonStore {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .context("Failed to create dungeon store schema")?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DungeonRepositoryPort for SqliteDungeonStore {
    async fn list_archetypes(&self) -> Result<Vec<Archetype>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT archetype_id, archetype_name FROM archetypes ORDER BY archetype_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Archetype {
                id: ArchetypeId::new(id),
                name,
            })
            .collect())
    }

    async fn list_factions(&self) -> Result<Vec<Faction>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT faction_id, faction_name FROM factions ORDER BY faction_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Faction {
                id: FactionId::new(id),
                name,
            })
            .collect())
    }

    async fn list_palette(&self, category_id: CategoryId) -> Result<Vec<PaletteEntry>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT t.type_id, t.type_name
            FROM item_types t
            JOIN item_groups g ON g.group_id = t.group_id
            WHERE g.category_id = ?
            ORDER BY t.type_id
            "#,
        )
        .bind(category_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(type_id, name)| PaletteEntry {
                type_id: ItemTypeId::new(type_id),
                name,
            })
            .collect())
    }

    async fn list_item_types(&self) -> Result<Vec<ItemTypeId>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT type_id FROM item_types")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| ItemTypeId::new(id)).collect())
    }

    async fn list_dungeons(&self, filter: DungeonFilter) -> Result<Vec<Dungeon>> {
        const SELECT: &str =
            "SELECT dungeon_id, dungeon_name, status, archetype_id, faction_id FROM dungeons";

        let rows: Vec<DungeonRow> = match filter {
            DungeonFilter::All => {
                sqlx::query_as(&format!("{SELECT} ORDER BY dungeon_id"))
                    .fetch_all(&self.pool)
                    .await?
            }
            DungeonFilter::ById(id) => {
                sqlx::query_as(&format!("{SELECT} WHERE dungeon_id = ?"))
                    .bind(id.value())
                    .fetch_all(&self.pool)
                    .await?
            }
            DungeonFilter::ByArchetypeAndFaction {
                archetype_id,
                faction_id,
            } => {
                sqlx::query_as(&format!(
                    "{SELECT} WHERE archetype_id = ? AND faction_id = ? ORDER BY dungeon_id"
                ))
                .bind(archetype_id.value())
                .bind(faction_id.value())
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(dungeon_from_row).collect())
    }

    async fn get_dungeon(&self, id: DungeonId) -> Result<Option<Dungeon>> {
        let row: Option<DungeonRow> = sqlx::query_as(
            "SELECT dungeon_id, dungeon_name, status, archetype_id, faction_id FROM dungeons WHERE dungeon_id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(dungeon_from_row))
    }

    async fn list_rooms(&self, dungeon_id: DungeonId) -> Result<Vec<Room>> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            "SELECT room_id, dungeon_id, room_name, origin_x, origin_y, origin_z FROM rooms WHERE dungeon_id = ? ORDER BY room_id",
        )
        .bind(dungeon_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(room_from_row).collect())
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(
            "SELECT room_id, dungeon_id, room_name, origin_x, origin_y, origin_z FROM rooms WHERE room_id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(room_from_row))
    }

    async fn list_room_groups(&self, room_id: RoomId) -> Result<Vec<RoomGroup>> {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT group_id, room_id, group_name FROM room_groups WHERE room_id = ? ORDER BY group_id",
        )
        .bind(room_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, room_id, name)| RoomGroup {
                id: GroupId::new(id),
                room_id: RoomId::new(room_id),
                name,
            })
            .collect())
    }

    async fn first_group_for_room(&self, room_id: RoomId) -> Result<Option<GroupId>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT group_id FROM room_groups WHERE room_id = ? ORDER BY group_id LIMIT 1",
        )
        .bind(room_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| GroupId::new(id)))
    }

    async fn list_room_objects(&self, room_id: RoomId) -> Result<Vec<RoomObject>> {
        let rows: Vec<RoomObjectRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_OBJECT_COLUMNS} FROM room_objects WHERE room_id = ? ORDER BY object_id"
        ))
        .bind(room_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RoomObject::from).collect())
    }

    async fn get_object(&self, id: ObjectId) -> Result<Option<RoomObject>> {
        let row: Option<RoomObjectRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_OBJECT_COLUMNS} FROM room_objects WHERE object_id = ?"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RoomObject::from))
    }

    async fn create_object(&self, object: &NewRoomObject) -> Result<ObjectId> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_objects
                (room_id, type_id, group_id, x, y, z, yaw, pitch, roll, radius, revision)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(object.room_id.value())
        .bind(object.type_id.value())
        .bind(object.group_id.value())
        .bind(object.position.x)
        .bind(object.position.y)
        .bind(object.position.z)
        .bind(object.orientation.yaw)
        .bind(object.orientation.pitch)
        .bind(object.orientation.roll)
        .bind(object.radius)
        .bind(INITIAL_REVISION)
        .execute(&self.pool)
        .await
        .context("Failed to insert room object")?;

        Ok(ObjectId::new(result.last_insert_rowid()))
    }

    async fn delete_object(&self, id: ObjectId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM room_objects WHERE object_id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_object_radius(&self, id: ObjectId, radius: f64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE room_objects SET radius = ?, revision = revision + 1 WHERE object_id = ?",
        )
        .bind(radius)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_object_position(&self, id: ObjectId, position: Vec3) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE room_objects SET x = ?, y = ?, z = ?, revision = revision + 1 WHERE object_id = ?",
        )
        .bind(position.x)
        .bind(position.y)
        .bind(position.z)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_object_orientation(
        &self,
        id: ObjectId,
        orientation: Orientation,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE room_objects SET yaw = ?, pitch = ?, roll = ?, revision = revision + 1 WHERE object_id = ?",
        )
        .bind(orientation.yaw)
        .bind(orientation.pitch)
        .bind(orientation.roll)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_object_name(&self, id: ObjectId, name: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE room_objects SET object_name = ?, revision = revision + 1 WHERE object_id = ?",
        )
        .bind(name)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_templates(&self, owner_id: UserId) -> Result<Vec<Template>> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            "SELECT template_id, user_id, template_name, description, room_id FROM templates WHERE user_id = ? ORDER BY template_id",
        )
        .bind(owner_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(template_from_row).collect())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<Template>> {
        let row: Option<TemplateRow> = sqlx::query_as(
            "SELECT template_id, user_id, template_name, description, room_id FROM templates WHERE template_id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(template_from_row))
    }

    async fn create_template(
        &self,
        owner_id: UserId,
        name: &str,
        description: &str,
        room_id: RoomId,
    ) -> Result<TemplateId> {
        let result = sqlx::query(
            "INSERT INTO templates (user_id, template_name, description, room_id) VALUES (?, ?, ?, ?)",
        )
        .bind(owner_id.value())
        .bind(name)
        .bind(description)
        .bind(room_id.value())
        .execute(&self.pool)
        .await
        .context("Failed to insert template")?;

        Ok(TemplateId::new(result.last_insert_rowid()))
    }

    async fn update_template(&self, id: TemplateId, name: &str, description: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE templates SET template_name = ?, description = ? WHERE template_id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_template(&self, id: TemplateId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM template_objects WHERE template_id = ?")
            .bind(id.value())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM templates WHERE template_id = ?")
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

        tx.commit().await.context("Failed to delete template")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_template_objects(&self, template_id: TemplateId) -> Result<Vec<TemplateObject>> {
        let rows: Vec<(i64, f64, f64, f64, f64, f64, f64, f64)> = sqlx::query_as(
            "SELECT type_id, x, y, z, yaw, pitch, roll, radius FROM template_objects WHERE template_id = ? ORDER BY id",
        )
        .bind(template_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(type_id, x, y, z, yaw, pitch, roll, radius)| TemplateObject {
                template_id,
                type_id: ItemTypeId::new(type_id),
                position: Vec3::new(x, y, z),
                orientation: Orientation::new(yaw, pitch, roll),
                radius,
            })
            .collect())
    }

    async fn add_template_object(&self, object: &TemplateObject) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO template_objects
                (template_id, type_id, x, y, z, yaw, pitch, roll, radius)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(object.template_id.value())
        .bind(object.type_id.value())
        .bind(object.position.x)
        .bind(object.position.y)
        .bind(object.position.z)
        .bind(object.orientation.yaw)
        .bind(object.orientation.pitch)
        .bind(object.orientation.roll)
        .bind(object.radius)
        .execute(&self.pool)
        .await
        .context("Failed to insert template object")?;

        Ok(())
    }
}
