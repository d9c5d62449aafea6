//! Presence registry
//!
//! ユーザー ID → 接続中のアクター群の対応表。ロックは持たず、ハブが
//! `RwLock` で保護して所有します。ユーザーは登録済みのアクターが 1 つ以上ある間だけオンラインです。

use std::{collections::HashMap, sync::Arc};

use crate::domain::{ConnectionId, UserId};

use super::Client;

/// Result of removing a connection from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection was not registered
    NotRegistered,
    /// The user still has other connections
    StillOnline,
    /// The user's last connection was removed
    WentOffline,
}

#[derive(Debug, Default)]
pub struct Presence {
    users: HashMap<UserId, HashMap<ConnectionId, Arc<Client>>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns `true` if it is the user's first connection.
    pub fn insert(&mut self, client: Arc<Client>) -> bool {
        let connections = self.users.entry(client.user_id().clone()).or_default();
        let first = connections.is_empty();
        connections.insert(client.id(), client);
        first
    }

    pub fn remove(&mut self, user_id: &UserId, connection_id: ConnectionId) -> Departure {
        let Some(connections) = self.users.get_mut(user_id) else {
            return Departure::NotRegistered;
        };
        if connections.remove(&connection_id).is_none() {
            return Departure::NotRegistered;
        }
        if connections.is_empty() {
            self.users.remove(user_id);
            Departure::WentOffline
        } else {
            Departure::StillOnline
        }
    }

    pub fn clients_of(&self, user_id: &UserId) -> Vec<Arc<Client>> {
        self.users
            .get(user_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot the connections of every listed user. Offline users are skipped.
    pub fn clients_of_users<'a>(
        &self,
        user_ids: impl IntoIterator<Item = &'a UserId>,
    ) -> Vec<Arc<Client>> {
        user_ids
            .into_iter()
            .filter_map(|user_id| self.users.get(user_id))
            .flat_map(|connections| connections.values().cloned())
            .collect()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn connections_of(&self, user_id: &UserId) -> usize {
        self.users.get(user_id).map_or(0, HashMap::len)
    }

    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.users.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn connection_count(&self) -> usize {
        self.users.values().map(HashMap::len).sum()
    }

    /// Remove and return every connection.
    pub fn drain(&mut self) -> Vec<Arc<Client>> {
        self.users
            .drain()
            .flat_map(|(_, connections)| connections.into_values())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hub::ClientConfig, test_support::user};

    fn client(user_id: &str) -> Arc<Client> {
        Client::new(user(user_id), ClientConfig::default())
    }

    #[test]
    fn test_first_connection_reports_first() {
        // テスト項目: 最初の接続のみ first として報告される
        // given (前提条件):
        let mut presence = Presence::new();

        // when (操作):
        let first = presence.insert(client("alice"));
        let second = presence.insert(client("alice"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(presence.connections_of(&user("alice")), 2);
        assert_eq!(presence.connection_count(), 2);
    }

    #[test]
    fn test_user_is_online_until_last_connection_leaves() {
        // テスト項目: 最後の接続が外れるまでオンラインのまま
        // given (前提条件):
        let mut presence = Presence::new();
        let phone = client("alice");
        let laptop = client("alice");
        presence.insert(phone.clone());
        presence.insert(laptop.clone());

        // when (操作):
        let after_phone = presence.remove(&user("alice"), phone.id());
        let online_between = presence.is_online(&user("alice"));
        let after_laptop = presence.remove(&user("alice"), laptop.id());

        // then (期待する結果):
        assert_eq!(after_phone, Departure::StillOnline);
        assert!(online_between);
        assert_eq!(after_laptop, Departure::WentOffline);
        assert!(!presence.is_online(&user("alice")));
        assert!(presence.online_users().is_empty());
    }

    #[test]
    fn test_removing_unknown_connection() {
        // テスト項目: 未登録の接続の削除は NotRegistered になる（二重削除も安全）
        // given (前提条件):
        let mut presence = Presence::new();
        let alice = client("alice");
        presence.insert(alice.clone());
        presence.remove(&user("alice"), alice.id());

        // when (操作):
        let again = presence.remove(&user("alice"), alice.id());
        let stranger = presence.remove(&user("bob"), client("bob").id());

        // then (期待する結果):
        assert_eq!(again, Departure::NotRegistered);
        assert_eq!(stranger, Departure::NotRegistered);
    }

    #[test]
    fn test_clients_of_users_skips_offline() {
        // テスト項目: オフラインのユーザーは配信対象から外れる
        // given (前提条件):
        let mut presence = Presence::new();
        presence.insert(client("alice"));
        presence.insert(client("alice"));
        presence.insert(client("carol"));

        // when (操作):
        let targets = presence.clients_of_users(&[user("alice"), user("bob")]);

        // then (期待する結果):
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|c| c.user_id() == &user("alice")));
    }

    #[test]
    fn test_drain_empties_registry() {
        // テスト項目: drain で全接続が取り出され、レジストリは空になる
        // given (前提条件):
        let mut presence = Presence::new();
        presence.insert(client("alice"));
        presence.insert(client("bob"));

        // when (操作):
        let drained = presence.drain();

        // then (期待する結果):
        assert_eq!(drained.len(), 2);
        assert_eq!(presence.connection_count(), 0);
        assert!(!presence.is_online(&user("bob")));
    }
}
