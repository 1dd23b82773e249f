//! Spawn игрового персонажа

use bevy::prelude::*;

use crate::combat::QueryCategory;
use crate::components::{Controller, DeathFlag, Health, LocallyControlled, PlayerCharacter, PlayerInput, SphereAttack};
use crate::config::{GameplayConfig, SphereAttackConfig};
use crate::error::GameplayError;
use crate::net::{ControllerId, LocalController, NetId, NetIdAllocator, NetRole};

/// Полный набор компонентов персонажа (без controller)
pub fn player_bundle(net_id: NetId, position: Vec3, max_health: f32, sphere: SphereAttackConfig) -> impl Bundle {
    (
        PlayerCharacter,
        net_id,
        Transform::from_translation(position),
        Health::new(max_health),
        DeathFlag::default(),
        SphereAttack::new(sphere),
        QueryCategory::Pawn,
    )
}

/// Локальный игрок этого процесса получает LocallyControlled + PlayerInput
pub(crate) fn is_local(controller: Option<ControllerId>, local: LocalController) -> bool {
    controller.is_some() && controller == local.0
}

/// Spawn персонажа на authority. `controller = None` — бот/манекен.
pub fn spawn_player(
    world: &mut World,
    controller: Option<ControllerId>,
    position: Vec3,
) -> Result<Entity, GameplayError> {
    let role = *world.resource::<NetRole>();
    if !role.is_authority() {
        return Err(GameplayError::NotAuthority);
    }

    let config = world.resource::<GameplayConfig>().clone();
    let local = *world.resource::<LocalController>();
    let net_id = world.resource_mut::<NetIdAllocator>().allocate();

    let mut entity = world.spawn(player_bundle(net_id, position, config.max_health, config.sphere));
    if let Some(controller) = controller {
        entity.insert(Controller(controller));
    }
    if is_local(controller, local) {
        entity.insert((LocallyControlled, PlayerInput::default()));
    }

    crate::log_info(&format!(
        "Spawned player {:?} ({:?}, controller {:?}) at {}",
        entity.id(),
        net_id,
        controller,
        position
    ));

    Ok(entity.id())
}
