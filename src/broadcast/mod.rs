//! Per-room broadcast groups.
//!
//! Each room has its own independently locked subscriber map, so join,
//! leave, and fan-out in one room never block traffic in another. Group
//! membership here is connection state only; durable room participation
//! lives in [`crate::db::RoomRegistry`].

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;
use tracing::{info, warn};

use crate::websocket::ServerEvent;

/// Send half of a subscriber's outbound event channel.
pub type SubscriberHandle = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Default)]
struct RoomGroup {
    members: RwLock<HashMap<Uuid, SubscriberHandle>>,
}

#[derive(Debug, Default)]
pub struct BroadcastGroups {
    // Outer lock guards the room map; membership traffic goes through
    // each group's own lock. Lock order is always outer before inner.
    groups: RwLock<HashMap<i64, Arc<RoomGroup>>>,
}

impl BroadcastGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `room_id`'s group, creating the group on
    /// first join.
    ///
    /// The outer lock is held across the member insert; otherwise a
    /// concurrent last-member `leave` could observe the group empty and
    /// drop it from the map after the joiner fetched it, stranding the
    /// new member in an orphaned group that `broadcast` never sees.
    pub async fn join(&self, room_id: i64, conn_id: Uuid, handle: SubscriberHandle) {
        {
            let groups = self.groups.read().await;
            if let Some(group) = groups.get(&room_id) {
                group.members.write().await.insert(conn_id, handle);
                info!("Connection {} joined room {} group", conn_id, room_id);
                return;
            }
        }

        let mut groups = self.groups.write().await;
        let group = groups.entry(room_id).or_default().clone();
        group.members.write().await.insert(conn_id, handle);
        info!("Connection {} joined room {} group", conn_id, room_id);
    }

    /// Remove `conn_id` from `room_id`'s group. Idempotent: leaving twice,
    /// or leaving a room never joined, is a no-op.
    pub async fn leave(&self, room_id: i64, conn_id: Uuid) -> bool {
        let group = {
            let groups = self.groups.read().await;
            match groups.get(&room_id) {
                Some(group) => group.clone(),
                None => return false,
            }
        };

        let (removed, now_empty) = {
            let mut members = group.members.write().await;
            let removed = members.remove(&conn_id).is_some();
            (removed, members.is_empty())
        };

        if removed {
            info!("Connection {} left room {} group", conn_id, room_id);
        }

        if now_empty {
            let mut groups = self.groups.write().await;
            if let Some(group) = groups.get(&room_id) {
                // Re-check under the outer lock; a new member may have
                // joined since the emptiness was observed.
                if group.members.read().await.is_empty() {
                    groups.remove(&room_id);
                }
            }
        }

        removed
    }

    /// Deliver `event` to every handle in `room_id`'s group at the time of
    /// the call. Delivery to each handle is independent: a dead handle is
    /// logged and lazily removed, never allowed to fail the rest of the
    /// fan-out. Returns the number of successful deliveries.
    pub async fn broadcast(&self, room_id: i64, event: &ServerEvent) -> usize {
        let group = {
            let groups = self.groups.read().await;
            match groups.get(&room_id) {
                Some(group) => group.clone(),
                None => return 0,
            }
        };

        // Snapshot the membership so senders never hold the lock across
        // join/leave traffic.
        let snapshot: Vec<(Uuid, SubscriberHandle)> = group
            .members
            .read()
            .await
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (conn_id, handle) in snapshot {
            if handle.send(event.clone()).is_err() {
                warn!(
                    "Failed to deliver to connection {} in room {}, dropping handle",
                    conn_id, room_id
                );
                dead.push(conn_id);
            } else {
                delivered += 1;
            }
        }

        if !dead.is_empty() {
            let mut members = group.members.write().await;
            for conn_id in dead {
                members.remove(&conn_id);
            }
        }

        delivered
    }

    /// Current subscriber count of a room's group.
    pub async fn member_count(&self, room_id: i64) -> usize {
        let groups = self.groups.read().await;
        match groups.get(&room_id) {
            Some(group) => group.members.read().await.len(),
            None => 0,
        }
    }

    /// Number of rooms with at least one live group entry.
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }
}
