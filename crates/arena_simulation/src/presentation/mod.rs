//! Presentation hooks
//!
//! Ядро поднимает zero-argument нотификации, UI/анимация (host) их потребляет.
//! Ragdoll/камера/видимость мешей — у host; ECS только выставляет маркеры.

use bevy::prelude::*;

use crate::combat::HealthUpdated;
use crate::components::{LocallyControlled, PlayerInput};
use crate::net::client::DeathFlagChanged;
use crate::net::{is_observer, NetRole};
use crate::GameplaySet;

pub mod hud;

pub use hud::{update_hud_readout, HudReadout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum HookKind {
    HealthChanged,
    SphereRadiusChanged,
    CooldownChanged,
    EnemyOverlapChanged,
    DeathEntered,
    DeathExited,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationHook {
    pub entity: Entity,
    pub kind: HookKind,
}

impl PresentationHook {
    pub fn new(entity: Entity, kind: HookKind) -> Self {
        Self { entity, kind }
    }
}

/// Маркер: персонаж в ragdoll режиме (physics simulation у host)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Ragdoll;

/// Журнал hooks за шаги с последнего `drain()` (host UI забирает его)
#[derive(Resource, Debug, Default)]
pub struct PresentationLog {
    entries: Vec<PresentationHook>,
}

impl PresentationLog {
    pub fn entries(&self) -> &[PresentationHook] {
        &self.entries
    }

    pub fn drain(&mut self) -> Vec<PresentationHook> {
        std::mem::take(&mut self.entries)
    }

    pub fn count(&self, kind: HookKind) -> usize {
        self.entries.iter().filter(|hook| hook.kind == kind).count()
    }
}

/// System: HealthUpdated → HealthChanged hook для локального игрока
///
/// Работает в обеих ролях: authority получает нотификацию синхронно,
/// observer — по приходу реплицированного значения.
pub fn react_to_health_updates(
    role: Res<NetRole>,
    mut updates: EventReader<HealthUpdated>,
    local_players: Query<(), With<LocallyControlled>>,
    mut hooks: EventWriter<PresentationHook>,
) {
    for update in updates.read() {
        let is_local = local_players.contains(update.entity);

        if role.is_authority() {
            crate::log(&format!("{:?} now has {} health remaining", update.entity, update.current));
        } else if is_local {
            crate::log(&format!("You now have {} health remaining", update.current));
        }

        if is_local {
            hooks.write(PresentationHook::new(update.entity, HookKind::HealthChanged));
        }
    }
}

/// System (observer): переход DeathFlag → ragdoll / восстановление
///
/// true: Ragdoll маркер, ввод локального игрока отключён (death mode)
/// false: Ragdoll снят, ввод включён
pub fn present_death_transitions(
    mut commands: Commands,
    mut transitions: EventReader<DeathFlagChanged>,
    mut local_inputs: Query<&mut PlayerInput, With<LocallyControlled>>,
    mut hooks: EventWriter<PresentationHook>,
) {
    for transition in transitions.read() {
        let Ok(mut entity_commands) = commands.get_entity(transition.entity) else {
            continue;
        };

        if transition.is_dead {
            entity_commands.insert(Ragdoll);
            hooks.write(PresentationHook::new(transition.entity, HookKind::DeathEntered));
        } else {
            entity_commands.remove::<Ragdoll>();
            hooks.write(PresentationHook::new(transition.entity, HookKind::DeathExited));
        }

        if let Ok(mut input) = local_inputs.get_mut(transition.entity) {
            input.enabled = !transition.is_dead;
        }
    }
}

/// System: копим hooks в PresentationLog
pub fn record_presentation_hooks(mut hooks: EventReader<PresentationHook>, mut log: ResMut<PresentationLog>) {
    log.entries.extend(hooks.read().copied());
}

pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PresentationHook>()
            .init_resource::<PresentationLog>()
            .init_resource::<HudReadout>();

        app.add_systems(
            Update,
            (
                // Порядок hooks за кадр: health → death
                (
                    react_to_health_updates,
                    present_death_transitions.run_if(is_observer),
                )
                    .chain()
                    .in_set(GameplaySet::Present),
                (update_hud_readout, record_presentation_hooks).in_set(GameplaySet::Record),
            ),
        );
    }
}
