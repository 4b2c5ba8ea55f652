//! Dungeon Service - Read-only lookups that populate the dungeon editor UI
//!
//! Nothing here depends on an editing session; every call is a query against
//! the repository shaped into a rowset.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::application::dto::Rowset;
use crate::application::ports::outbound::{DungeonFilter, DungeonRepositoryPort};
use crate::domain::entities::PaletteEntry;
use crate::domain::value_objects::{CategoryId, DungeonId, UserId};

/// Dungeon service trait defining the read-only use cases
#[async_trait]
pub trait DungeonService: Send + Sync {
    async fn get_archetypes(&self) -> Result<Rowset>;

    async fn get_factions(&self) -> Result<Rowset>;

    async fn get_dungeons(&self, filter: DungeonFilter) -> Result<Rowset>;

    /// Templates authored by the calling user
    async fn get_templates(&self, owner_id: UserId) -> Result<Rowset>;

    async fn get_rooms(&self, dungeon_id: DungeonId) -> Result<Rowset>;

    /// Object types offered in the placement palette
    async fn get_room_object_palette(&self) -> Result<Vec<PaletteEntry>>;
}

/// Default implementation of DungeonService backed by a repository
pub struct DungeonServiceImpl {
    repository: Arc<dyn DungeonRepositoryPort>,
    palette_category: CategoryId,
}

impl DungeonServiceImpl {
    pub fn new(repository: Arc<dyn DungeonRepositoryPort>, palette_category: CategoryId) -> Self {
        Self {
            repository,
            palette_category,
        }
    }
}

#[async_trait]
impl DungeonService for DungeonServiceImpl {
    #[instrument(skip(self))]
    async fn get_archetypes(&self) -> Result<Rowset> {
        let archetypes = self
            .repository
            .list_archetypes()
            .await
            .context("Failed to list archetypes")?;

        let mut rowset = Rowset::new(&["archetypeID", "archetypeName"]);
        for archetype in archetypes {
            rowset.push(vec![archetype.id.value().into(), archetype.name.into()]);
        }
        Ok(rowset)
    }

    #[instrument(skip(self))]
    async fn get_factions(&self) -> Result<Rowset> {
        let factions = self
            .repository
            .list_factions()
            .await
            .context("Failed to list factions")?;

        let mut rowset = Rowset::new(&["factionID", "factionName"]);
        for faction in factions {
            rowset.push(vec![faction.id.value().into(), faction.name.into()]);
        }
        Ok(rowset)
    }

    #[instrument(skip(self))]
    async fn get_dungeons(&self, filter: DungeonFilter) -> Result<Rowset> {
        let dungeons = self
            .repository
            .list_dungeons(filter)
            .await
            .context("Failed to list dungeons")?;
        debug!(count = dungeons.len(), "Fetched dungeons");

        let mut rowset = Rowset::new(&[
            "dungeonID",
            "dungeonName",
            "status",
            "archetypeID",
            "factionID",
        ]);
        for dungeon in dungeons {
            rowset.push(vec![
                dungeon.id.value().into(),
                dungeon.name.into(),
                dungeon.status.code().into(),
                dungeon.archetype_id.value().into(),
                dungeon.faction_id.value().into(),
            ]);
        }
        Ok(rowset)
    }

    #[instrument(skip(self))]
    async fn get_templates(&self, owner_id: UserId) -> Result<Rowset> {
        let templates = self
            .repository
            .list_templates(owner_id)
            .await
            .context("Failed to list templates")?;

        let mut rowset = Rowset::new(&[
            "templateID",
            "templateName",
            "description",
            "userID",
            "roomID",
        ]);
        for template in templates {
            rowset.push(vec![
                template.id.value().into(),
                template.name.into(),
                template.description.into(),
                template.owner_id.value().into(),
                template.room_id.value().into(),
            ]);
        }
        Ok(rowset)
    }

    #[instrument(skip(self))]
    async fn get_rooms(&self, dungeon_id: DungeonId) -> Result<Rowset> {
        let rooms = self
            .repository
            .list_rooms(dungeon_id)
            .await
            .context("Failed to list rooms")?;

        let mut rowset = Rowset::new(&["roomID", "roomName", "dungeonID"]);
        for room in rooms {
            rowset.push(vec![
                room.id.value().into(),
                room.name.into(),
                room.dungeon_id.value().into(),
            ]);
        }
        Ok(rowset)
    }

    #[instrument(skip(self))]
    async fn get_room_object_palette(&self) -> Result<Vec<PaletteEntry>> {
        self.repository
            .list_palette(self.palette_category)
            .await
            .context("Failed to load the object palette")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::CallValue;
    use crate::infrastructure::persistence::fixtures::{self, CELESTIAL_CATEGORY};

    async fn service() -> DungeonServiceImpl {
        let store = fixtures::seeded_store().await;
        DungeonServiceImpl::new(store, CELESTIAL_CATEGORY)
    }

    #[tokio::test]
    async fn test_get_archetypes() {
        let rowset = service().await.get_archetypes().await.unwrap();

        assert_eq!(rowset.header, vec!["archetypeID", "archetypeName"]);
        assert_eq!(rowset.len(), 2);
        assert_eq!(rowset.get(0, "archetypeName"), Some(&"Combat Site".into()));
    }

    #[tokio::test]
    async fn test_get_dungeons_filters() {
        let service = service().await;

        let all = service.get_dungeons(DungeonFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let one = service
            .get_dungeons(DungeonFilter::ById(fixtures::RELEASED_DUNGEON))
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0, "status"), Some(&CallValue::Int(1)));

        let by_pair = service
            .get_dungeons(DungeonFilter::ByArchetypeAndFaction {
                archetype_id: fixtures::COMBAT_ARCHETYPE,
                faction_id: fixtures::PIRATE_FACTION,
            })
            .await
            .unwrap();
        assert_eq!(by_pair.len(), 1);
        assert_eq!(
            by_pair.get(0, "dungeonID"),
            Some(&CallValue::Int(fixtures::WORKING_DUNGEON.value()))
        );
    }

    #[tokio::test]
    async fn test_get_templates_only_returns_callers_templates() {
        let store = fixtures::seeded_store().await;
        store
            .create_template(UserId::new(1), "Mine", "", fixtures::MAIN_ROOM)
            .await
            .unwrap();
        store
            .create_template(UserId::new(2), "Theirs", "", fixtures::MAIN_ROOM)
            .await
            .unwrap();
        let service = DungeonServiceImpl::new(store, CELESTIAL_CATEGORY);

        let rowset = service.get_templates(UserId::new(1)).await.unwrap();

        assert_eq!(rowset.len(), 1);
        assert_eq!(rowset.get(0, "templateName"), Some(&"Mine".into()));
    }

    #[tokio::test]
    async fn test_get_rooms_of_dungeon() {
        let rowset = service()
            .await
            .get_rooms(fixtures::WORKING_DUNGEON)
            .await
            .unwrap();

        assert_eq!(rowset.len(), 2);
        assert_eq!(
            rowset.get(0, "roomID"),
            Some(&CallValue::Int(fixtures::MAIN_ROOM.value()))
        );
    }

    #[tokio::test]
    async fn test_palette_only_contains_celestials() {
        let palette = service().await.get_room_object_palette().await.unwrap();

        let ids: Vec<_> = palette.iter().map(|entry| entry.type_id).collect();
        assert_eq!(ids, vec![fixtures::BEACON_TYPE, fixtures::RUINS_TYPE]);
    }
}
