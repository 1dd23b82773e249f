//! Wire протокол репликации (ron frames)
//!
//! Authority → observer: `ReplicationFrame` (Spawn / Field / Despawn packets)
//! Observer → authority: `ClientRequest`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::components::{DeathFlag, Health, SphereAttack};
use crate::config::SphereAttackConfig;
use crate::error::WireError;
use crate::net::{ControllerId, NetId};
use bevy::prelude::Transform;

/// Reliable RPC: observer просит authority нажать/отпустить сферу
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphereAction {
    Activate,
    Deactivate,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    Sphere(SphereAction),
}

/// Одно реплицированное поле
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Position([f32; 3]),
    CurrentHealth(f32),
    IsDead(bool),
    SphereRadius(f32),
    SphereCooldown(f32),
    SphereActive(bool),
}

/// Снимок всех реплицированных полей entity
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ReplicatedSnapshot {
    pub position: [f32; 3],
    pub health: f32,
    pub is_dead: bool,
    pub sphere_radius: f32,
    pub sphere_cooldown: f32,
    pub sphere_active: bool,
}

impl ReplicatedSnapshot {
    pub fn capture(transform: &Transform, health: &Health, death: &DeathFlag, sphere: &SphereAttack) -> Self {
        Self {
            position: transform.translation.to_array(),
            health: health.current(),
            is_dead: death.is_dead(),
            sphere_radius: sphere.current_radius(),
            sphere_cooldown: sphere.current_cooldown(),
            sphere_active: sphere.is_active(),
        }
    }

    /// Все поля (для spawn / initial sync)
    pub fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Position(self.position),
            FieldValue::CurrentHealth(self.health),
            FieldValue::IsDead(self.is_dead),
            FieldValue::SphereRadius(self.sphere_radius),
            FieldValue::SphereCooldown(self.sphere_cooldown),
            FieldValue::SphereActive(self.sphere_active),
        ]
    }

    /// Только изменившиеся поля относительно `self`
    pub fn diff(&self, newer: &Self) -> Vec<FieldValue> {
        newer
            .fields()
            .into_iter()
            .zip(self.fields())
            .filter(|(new, old)| new != old)
            .map(|(new, _)| new)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub net_id: NetId,
    pub controller: Option<ControllerId>,
    pub max_health: f32,
    pub sphere: SphereAttackConfig,
    pub snapshot: ReplicatedSnapshot,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Packet {
    Spawn(SpawnRecord),
    Field { net_id: NetId, value: FieldValue },
    Despawn { net_id: NetId },
}

/// Всё, что authority отправил observer за один шаг
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReplicationFrame {
    pub packets: Vec<Packet>,
}

impl ReplicationFrame {
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, WireError> {
    Ok(ron::to_string(message)?.into_bytes())
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(ron::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ReplicatedSnapshot {
        ReplicatedSnapshot {
            position: [0.0, 0.0, 0.0],
            health: 100.0,
            is_dead: false,
            sphere_radius: 100.0,
            sphere_cooldown: 0.0,
            sphere_active: false,
        }
    }

    #[test]
    fn test_snapshot_diff_only_changed_fields() {
        let old = snapshot();
        let new = ReplicatedSnapshot {
            health: 50.0,
            sphere_active: true,
            ..old
        };

        assert_eq!(
            old.diff(&new),
            vec![FieldValue::CurrentHealth(50.0), FieldValue::SphereActive(true)]
        );
        assert!(new.diff(&new).is_empty());
    }

    #[test]
    fn test_frame_survives_wire() {
        let frame = ReplicationFrame {
            packets: vec![
                Packet::Spawn(SpawnRecord {
                    net_id: NetId(3),
                    controller: Some(ControllerId(1)),
                    max_health: 100.0,
                    sphere: SphereAttackConfig::default(),
                    snapshot: snapshot(),
                }),
                Packet::Field {
                    net_id: NetId(3),
                    value: FieldValue::SphereRadius(433.33334),
                },
                Packet::Despawn { net_id: NetId(2) },
            ],
        };

        let bytes = encode(&frame).unwrap();
        let decoded: ReplicationFrame = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result: Result<ReplicationFrame, WireError> = decode(b"(packets: [Bogus])");
        assert!(matches!(result, Err(WireError::Decode(_))));

        let result: Result<ClientRequest, WireError> = decode(&[0xff, 0xfe]);
        assert!(matches!(result, Err(WireError::Utf8(_))));
    }
}
