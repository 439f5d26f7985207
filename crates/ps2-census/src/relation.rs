//! Relationships between records
//!
//! Each relation is a zero-sized descriptor passed to
//! [`Client::resolve_relationship`], which returns a proxy without
//! performing any I/O.

use crate::client::Client;
use crate::entity::Entity;
use crate::error::Result;
use crate::filter::Filter;
use crate::models::{Character, Faction, Item, Outfit, OutfitMember, Title};
use crate::proxy::{InstanceProxy, SequenceProxy};

/// A traversal from a record of type `S` to related records
pub trait Relation<S: Entity> {
    type Proxy;

    fn proxy(&self, client: &Client, source: &S) -> Result<Self::Proxy>;
}

/// The faction a character belongs to
#[derive(Debug, Clone, Copy)]
pub struct CharacterFaction;

impl Relation<Character> for CharacterFaction {
    type Proxy = InstanceProxy<Faction>;

    fn proxy(&self, client: &Client, source: &Character) -> Result<Self::Proxy> {
        Ok(client.instance_proxy(source.faction_id))
    }
}

/// The title a character has equipped, if any
#[derive(Debug, Clone, Copy)]
pub struct CharacterTitle;

impl Relation<Character> for CharacterTitle {
    type Proxy = InstanceProxy<Title>;

    fn proxy(&self, client: &Client, source: &Character) -> Result<Self::Proxy> {
        Ok(match source.equipped_title_id() {
            Some(id) => client.instance_proxy(id),
            None => InstanceProxy::absent(),
        })
    }
}

/// The outfit membership of a character
#[derive(Debug, Clone, Copy)]
pub struct CharacterMembership;

impl Relation<Character> for CharacterMembership {
    type Proxy = InstanceProxy<OutfitMember>;

    fn proxy(&self, client: &Client, source: &Character) -> Result<Self::Proxy> {
        Ok(client.instance_proxy(source.character_id))
    }
}

/// The character leading an outfit
#[derive(Debug, Clone, Copy)]
pub struct OutfitLeader;

impl Relation<Outfit> for OutfitLeader {
    type Proxy = InstanceProxy<Character>;

    fn proxy(&self, client: &Client, source: &Outfit) -> Result<Self::Proxy> {
        Ok(client.instance_proxy(source.leader_character_id))
    }
}

/// Every membership of an outfit, ordered by rank
#[derive(Debug, Clone, Copy)]
pub struct OutfitMembers;

impl Relation<Outfit> for OutfitMembers {
    type Proxy = SequenceProxy<OutfitMember>;

    fn proxy(&self, client: &Client, source: &Outfit) -> Result<Self::Proxy> {
        let filter = Filter::new()
            .eq("outfit_id", source.outfit_id)
            .sort("rank_ordinal", true);
        let limit = u32::try_from(source.member_count).unwrap_or(u32::MAX).max(1);
        Ok(client.sequence_proxy(filter, limit, 0))
    }
}

/// The character behind an outfit membership
#[derive(Debug, Clone, Copy)]
pub struct MemberCharacter;

impl Relation<OutfitMember> for MemberCharacter {
    type Proxy = InstanceProxy<Character>;

    fn proxy(&self, client: &Client, source: &OutfitMember) -> Result<Self::Proxy> {
        Ok(client.instance_proxy(source.character_id))
    }
}

/// The outfit of a membership
#[derive(Debug, Clone, Copy)]
pub struct MemberOutfit;

impl Relation<OutfitMember> for MemberOutfit {
    type Proxy = InstanceProxy<Outfit>;

    fn proxy(&self, client: &Client, source: &OutfitMember) -> Result<Self::Proxy> {
        Ok(client.instance_proxy(source.outfit_id))
    }
}

/// The faction restricted to an item, absent for common pool items
#[derive(Debug, Clone, Copy)]
pub struct ItemFaction;

impl Relation<Item> for ItemFaction {
    type Proxy = InstanceProxy<Faction>;

    fn proxy(&self, client: &Client, source: &Item) -> Result<Self::Proxy> {
        Ok(match source.faction_id {
            Some(id) if id != 0 => client.instance_proxy(id),
            _ => InstanceProxy::absent(),
        })
    }
}

/// Items restricted to a faction, at most `limit` of them
#[derive(Debug, Clone, Copy)]
pub struct FactionItems {
    pub limit: u32,
}

impl Relation<Faction> for FactionItems {
    type Proxy = SequenceProxy<Item>;

    fn proxy(&self, client: &Client, source: &Faction) -> Result<Self::Proxy> {
        let filter = Filter::new().eq("faction_id", source.faction_id);
        Ok(client.sequence_proxy(filter, self.limit.max(1), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EntityKind;
    use crate::proxy::ProxyState;
    use crate::testing::{character, faction, item, outfit, outfit_member, title, MockSource};
    use std::sync::Arc;

    fn setup() -> (Arc<MockSource>, Client) {
        let source = Arc::new(MockSource::new());
        let client = Client::with_source(source.clone());
        (source, client)
    }

    #[tokio::test]
    async fn test_character_faction_is_lazy_and_cached() {
        let (source, client) = setup();
        source.insert(EntityKind::Character, character(1, "Auroram", 3, 0));
        source.insert(EntityKind::Faction, faction(3, "Terran Republic"));

        let auroram = client.get_by_id::<Character>(1).await.unwrap().unwrap();
        let proxy = client
            .resolve_relationship(auroram.as_ref(), CharacterFaction)
            .unwrap();
        assert_eq!(proxy.state(), ProxyState::Unresolved);
        assert_eq!(source.one_calls(), 1);

        let tr = proxy.resolve().await.unwrap().unwrap();
        assert_eq!(tr.faction_id, 3);
        assert_eq!(source.one_calls(), 2);

        // Same cache effects as a direct lookup
        client.get_by_id::<Faction>(3).await.unwrap().unwrap();
        assert_eq!(source.one_calls(), 2);
    }

    #[tokio::test]
    async fn test_character_without_title() {
        let (source, client) = setup();
        source.insert(EntityKind::Character, character(1, "Auroram", 3, 0));
        source.insert(EntityKind::Character, character(2, "Higby", 1, 8));
        source.insert(EntityKind::Title, title(8, "Major"));

        let auroram = client.get_by_id::<Character>(1).await.unwrap().unwrap();
        let proxy = client
            .resolve_relationship(auroram.as_ref(), CharacterTitle)
            .unwrap();
        assert!(proxy.resolve().await.unwrap().is_none());

        let higby = client.get_by_id::<Character>(2).await.unwrap().unwrap();
        let proxy = client
            .resolve_relationship(higby.as_ref(), CharacterTitle)
            .unwrap();
        assert_eq!(proxy.resolve().await.unwrap().unwrap().title_id, 8);
        assert_eq!(source.one_calls(), 3);
    }

    #[tokio::test]
    async fn test_outfit_members_and_leader() {
        let (source, client) = setup();
        source.insert(EntityKind::Outfit, outfit(100, "Test Outfit", 1));
        source.insert(EntityKind::Character, character(1, "Leader", 2, 0));
        for (character_id, rank) in [(1, 1), (2, 5), (3, 8)] {
            source.insert(EntityKind::OutfitMember, outfit_member(100, character_id, rank));
        }
        source.insert(EntityKind::OutfitMember, outfit_member(200, 4, 1));

        let outfit = client
            .get_by_name::<Outfit>("test outfit", "en")
            .await
            .unwrap()
            .unwrap();

        let leader = client
            .resolve_relationship(outfit.as_ref(), OutfitLeader)
            .unwrap()
            .resolve()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(leader.name.first, "Leader");

        let members = client
            .resolve_relationship(outfit.as_ref(), OutfitMembers)
            .unwrap()
            .resolve()
            .await
            .unwrap();
        let ids: Vec<u64> = members.iter().map(|m| m.character_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(client.cache_stats(EntityKind::OutfitMember).entries, 0);

        let member_character = client
            .resolve_relationship(members[1].as_ref(), MemberCharacter)
            .unwrap();
        assert!(member_character.resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_faction_items_and_item_faction() {
        let (source, client) = setup();
        source.insert(EntityKind::Faction, faction(2, "New Conglomerate"));
        source.insert(EntityKind::Item, item(10, "Gauss SAW", Some(2)));
        source.insert(EntityKind::Item, item(11, "NS-11A", None));
        source.insert(EntityKind::Item, item(12, "Jackhammer", Some(2)));

        let nc = client.get_by_id::<Faction>(2).await.unwrap().unwrap();
        let items = client
            .resolve_relationship(nc.as_ref(), FactionItems { limit: 10 })
            .unwrap()
            .resolve()
            .await
            .unwrap();
        assert_eq!(items.len(), 2);

        let proxy = client
            .resolve_relationship(items[0].as_ref(), ItemFaction)
            .unwrap();
        let faction = proxy.resolve().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&faction, &nc));

        let common = client.get_by_id::<Item>(11).await.unwrap().unwrap();
        let proxy = client
            .resolve_relationship(common.as_ref(), ItemFaction)
            .unwrap();
        assert!(proxy.resolve().await.unwrap().is_none());
    }
}
