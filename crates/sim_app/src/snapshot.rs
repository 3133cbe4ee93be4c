//! The per-tick snapshot published to the network layer.

use serde::{Deserialize, Serialize};
use sim_types::{EntitySnapshot, PlayerSnapshot, SoundEvent, WorldState};
use uuid::Uuid;

/// Complete outward view of a match after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub match_id: Uuid,
    pub tick: u64,
    /// Connected players, in ID order.
    pub players: Vec<PlayerSnapshot>,
    /// Live entities with resolved world transforms, in ID order.
    pub entities: Vec<EntitySnapshot>,
    pub world: WorldState,
    /// Sounds requested during the tick, in request order.
    pub sounds: Vec<SoundEvent>,
}

impl TickSnapshot {
    /// Encode as MessagePack with named fields.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    /// Decode a snapshot produced by [`TickSnapshot::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid snapshot.
    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
