//! Sphere attack системы
//!
//! Authority:
//! 1. local_sphere_intents — ввод listen-server игрока → SphereCommand
//! 2. execute_sphere_commands — activate / deactivate (release → SphereReleased)
//! 3. tick_sphere_attacks — рост радиуса и cooldown
//! 4. sweep_released_spheres — point-in-sphere query → DamageReceived
//!
//! Observer:
//! - observe_sphere_overlaps — debug draw + локальный (информационный) подсчёт врагов

use bevy::prelude::*;

use crate::combat::{DamageKind, DamageReceived, QueryCategory, SpatialQuery};
use crate::components::{Controller, LocallyControlled, PlayerInput, SphereAttack};
use crate::net::{NetRole, SphereAction};
use crate::presentation::{HookKind, PresentationHook};
use crate::SimulationDelta;

/// Event: локальный игрок нажал/отпустил кнопку spell
///
/// Observer отправляет его на сервер как request, authority исполняет сразу.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphereInputIntent {
    pub pressed: bool,
}

impl SphereInputIntent {
    pub fn action(&self) -> SphereAction {
        if self.pressed {
            SphereAction::Activate
        } else {
            SphereAction::Deactivate
        }
    }
}

/// Event: authority команда для конкретного caster
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphereCommand {
    pub caster: Entity,
    pub action: SphereAction,
}

/// Event: сфера отпущена, нужно нанести урон
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SphereReleased {
    pub caster: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub damage: f32,
}

/// Event: observer просит рендер нарисовать debug сферу на этот кадр
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SphereDebugDraw {
    pub caster: Entity,
    pub center: Vec3,
    pub radius: f32,
}

/// System (authority): ввод локального игрока → SphereCommand
pub fn local_sphere_intents(
    mut intents: EventReader<SphereInputIntent>,
    local_players: Query<(Entity, &PlayerInput), With<LocallyControlled>>,
    mut commands_out: EventWriter<SphereCommand>,
) {
    for intent in intents.read() {
        for (caster, input) in local_players.iter() {
            if !input.enabled {
                continue;
            }
            commands_out.write(SphereCommand {
                caster,
                action: intent.action(),
            });
        }
    }
}

/// System (authority): исполнение SphereCommand
///
/// Release фиксирует радиус и позицию caster в момент deactivate,
/// сброс радиуса/старт cooldown происходит сразу.
pub fn execute_sphere_commands(
    role: Res<NetRole>,
    mut sphere_commands: EventReader<SphereCommand>,
    mut casters: Query<(&mut SphereAttack, &Transform)>,
    mut released: EventWriter<SphereReleased>,
) {
    for command in sphere_commands.read() {
        let Ok((mut sphere, transform)) = casters.get_mut(command.caster) else {
            crate::log_warning(&format!("SphereCommand: {:?} has no SphereAttack", command.caster));
            continue;
        };

        match command.action {
            SphereAction::Activate => {
                if let Err(error) = sphere.activate(*role) {
                    crate::log(&format!("Sphere activate for {:?} ignored: {}", command.caster, error));
                }
            }
            SphereAction::Deactivate => match sphere.deactivate(*role) {
                Ok(release) => {
                    crate::log_info(&format!(
                        "💥 {:?} released sphere (radius {:.1}, damage {})",
                        command.caster, release.radius, release.damage
                    ));
                    released.write(SphereReleased {
                        caster: command.caster,
                        center: transform.translation,
                        radius: release.radius,
                        damage: release.damage,
                    });
                }
                Err(error) => {
                    crate::log(&format!("Sphere deactivate for {:?} ignored: {}", command.caster, error));
                }
            },
        }
    }
}

/// System (authority): рост радиуса и cooldown
pub fn tick_sphere_attacks(role: Res<NetRole>, delta: Res<SimulationDelta>, mut spheres: Query<&mut SphereAttack>) {
    for mut sphere in spheres.iter_mut() {
        if !sphere.is_active() && !sphere.is_in_cooldown() {
            continue;
        }
        if let Err(error) = sphere.step(*role, delta.0) {
            crate::log(&format!("Sphere step ignored: {}", error));
        }
    }
}

/// System (authority): damage sweep для отпущенных сфер
pub fn sweep_released_spheres(
    mut released: EventReader<SphereReleased>,
    spatial: SpatialQuery,
    controllers: Query<&Controller>,
    mut damage: EventWriter<DamageReceived>,
) {
    for release in released.read() {
        let instigator = controllers.get(release.caster).ok().map(|controller| controller.0);

        let hits = spatial.overlap_sphere(release.center, release.radius, QueryCategory::Pawn, &[release.caster]);

        crate::log(&format!(
            "Sphere sweep from {:?}: {} target(s) within {:.1}",
            release.caster,
            hits.len(),
            release.radius
        ));

        for hit in hits {
            damage.write(DamageReceived {
                target: hit.entity,
                amount: release.damage,
                kind: DamageKind::SphereBlast,
                instigator,
                causer: Some(release.caster),
            });
        }
    }
}

/// System (observer): визуализация активной сферы и подсчёт врагов для HUD
///
/// Подсчёт только информационный (урон считает authority).
pub fn observe_sphere_overlaps(
    mut casters: Query<(Entity, &Transform, &mut SphereAttack, Has<LocallyControlled>)>,
    spatial: SpatialQuery,
    mut debug_draw: EventWriter<SphereDebugDraw>,
    mut hooks: EventWriter<PresentationHook>,
) {
    for (caster, transform, mut sphere, locally_controlled) in casters.iter_mut() {
        if sphere.is_active() {
            debug_draw.write(SphereDebugDraw {
                caster,
                center: transform.translation,
                radius: sphere.current_radius(),
            });

            if locally_controlled {
                let count = spatial.count_in_sphere(
                    transform.translation,
                    sphere.current_radius(),
                    QueryCategory::Pawn,
                    &[caster],
                );
                if sphere.set_observed_targets(count) {
                    hooks.write(PresentationHook::new(caster, HookKind::EnemyOverlapChanged));
                }
            }
        } else if sphere.observed_targets() != 0 {
            sphere.set_observed_targets(0);
            hooks.write(PresentationHook::new(caster, HookKind::EnemyOverlapChanged));
        }
    }
}
