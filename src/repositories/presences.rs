use crate::models::identities::IdentityRef;
use hashbrown::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Default)]
struct Presences {
    by_identity: HashMap<IdentityRef, HashSet<Uuid>>,
    by_connection: HashMap<Uuid, IdentityRef>,
}

/// Who is connected to this process. Starts empty on every boot.
#[derive(Default)]
pub struct PresenceTracker {
    inner: Mutex<Presences>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Presences> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true when this is the identity's first live connection.
    pub fn set_online(&self, identity: IdentityRef, connection_id: Uuid) -> bool {
        let mut presences = self.lock();
        if let Some(previous) = presences.by_connection.insert(connection_id, identity.clone()) {
            if let Some(connections) = presences.by_identity.get_mut(&previous) {
                connections.remove(&connection_id);
                if connections.is_empty() {
                    presences.by_identity.remove(&previous);
                }
            }
        }
        let connections = presences.by_identity.entry(identity).or_default();
        connections.insert(connection_id);
        connections.len() == 1
    }

    /// Returns the identity and whether it has no connections left.
    pub fn set_offline(&self, connection_id: Uuid) -> Option<(IdentityRef, bool)> {
        let mut presences = self.lock();
        let identity = presences.by_connection.remove(&connection_id)?;
        let went_offline = match presences.by_identity.get_mut(&identity) {
            Some(connections) => {
                connections.remove(&connection_id);
                connections.is_empty()
            }
            None => true,
        };
        if went_offline {
            presences.by_identity.remove(&identity);
        }
        Some((identity, went_offline))
    }

    pub fn is_online(&self, identity: &IdentityRef) -> bool {
        self.lock().by_identity.contains_key(identity)
    }

    pub fn online_count(&self) -> usize {
        self.lock().by_identity.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_until_last_connection_closes() {
        let presences = PresenceTracker::new();
        let customer = IdentityRef::customer("c-1");
        let (tab_1, tab_2) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(presences.set_online(customer.clone(), tab_1));
        assert!(!presences.set_online(customer.clone(), tab_2));
        assert!(presences.is_online(&customer));

        assert_eq!(presences.set_offline(tab_1), Some((customer.clone(), false)));
        assert!(presences.is_online(&customer));
        assert_eq!(presences.set_offline(tab_2), Some((customer.clone(), true)));
        assert!(!presences.is_online(&customer));
        assert_eq!(presences.online_count(), 0);
    }

    #[test]
    fn unknown_connection_goes_offline_quietly() {
        let presences = PresenceTracker::new();
        assert_eq!(presences.set_offline(Uuid::new_v4()), None);
    }

    #[test]
    fn kinds_sharing_an_id_are_tracked_separately() {
        let presences = PresenceTracker::new();
        presences.set_online(IdentityRef::customer("1"), Uuid::new_v4());
        assert!(!presences.is_online(&IdentityRef::seller("1")));
        assert_eq!(presences.online_count(), 1);
    }

    #[test]
    fn rebinding_a_connection_moves_it() {
        let presences = PresenceTracker::new();
        let connection_id = Uuid::new_v4();
        presences.set_online(IdentityRef::customer("1"), connection_id);
        presences.set_online(IdentityRef::customer("2"), connection_id);
        assert!(!presences.is_online(&IdentityRef::customer("1")));
        assert!(presences.is_online(&IdentityRef::customer("2")));
    }
}
