//! Интеграционные тесты: health → death → respawn на authority

mod common;

use arena_simulation::{
    create_headless_app, spawn_player, step, ControllerId, DamageKind, DamageReceived, DeathFlag, EntityDied,
    GameplayConfig, Health, HookKind, HudReadout, LocalController, NavBoundsConfig, NetRole, PlayerRespawned,
    PresentationLog, ProjectileHit,
};
use bevy::prelude::*;
use common::{current_events, Session};

fn listen_server(config: GameplayConfig) -> (App, Entity) {
    let mut app = create_headless_app(NetRole::Authority, config);
    app.world_mut().resource_mut::<LocalController>().0 = Some(ControllerId(1));
    let host = spawn_player(app.world_mut(), Some(ControllerId(1)), Vec3::ZERO).unwrap();
    (app, host)
}

#[test]
fn test_listen_server_local_hooks_are_synchronous() {
    let (mut app, host) = listen_server(GameplayConfig::default());
    let shooter = spawn_player(app.world_mut(), None, Vec3::new(5.0, 0.0, 0.0)).unwrap();

    app.world_mut().send_event(ProjectileHit::new(shooter, host));
    step(&mut app, 0.1);

    let log = app.world().resource::<PresentationLog>();
    assert_eq!(log.count(HookKind::HealthChanged), 1);
    assert_eq!(app.world().get::<Health>(host).unwrap().current(), 80.0);
    assert_eq!(app.world().resource::<HudReadout>().health_fraction, 0.8);

    // Урон по чужому персонажу: hook не поднимается
    app.world_mut().send_event(ProjectileHit::new(host, shooter));
    step(&mut app, 0.1);
    assert_eq!(app.world().resource::<PresentationLog>().count(HookKind::HealthChanged), 1);
}

#[test]
fn test_full_death_and_relocate_cycle() {
    let config = GameplayConfig {
        respawn_delay: 2.0,
        navigation: NavBoundsConfig {
            min: [-50.0, -50.0],
            max: [50.0, 50.0],
            floor: 0.0,
        },
        ..Default::default()
    };
    let (mut app, host) = listen_server(config);

    for _ in 0..4 {
        app.world_mut().send_event(DamageReceived {
            target: host,
            amount: 30.0,
            kind: DamageKind::Generic,
            instigator: None,
            causer: None,
        });
    }
    step(&mut app, 0.5);

    assert_eq!(app.world().get::<Health>(host).unwrap().current(), 0.0);
    assert!(app.world().get::<DeathFlag>(host).unwrap().is_dead());
    assert_eq!(current_events::<EntityDied>(&app).len(), 1);

    for _ in 0..3 {
        step(&mut app, 0.5);
        assert!(app.world().get::<DeathFlag>(host).unwrap().is_dead());
    }
    step(&mut app, 0.5);

    let respawned = current_events::<PlayerRespawned>(&app);
    assert_eq!(respawned.len(), 1);
    let position = respawned[0].position;
    assert!((-50.0..=50.0).contains(&position.x));
    assert!((-50.0..=50.0).contains(&position.z));
    assert_eq!(app.world().get::<Transform>(host).unwrap().translation, position);
    assert_eq!(app.world().get::<Health>(host).unwrap().current(), 100.0);
    assert!(!app.world().get::<DeathFlag>(host).unwrap().is_dead());
}

#[test]
fn test_network_kill_by_projectiles() {
    let mut session = Session::new(GameplayConfig::default());
    let client = session.connect(Some(ControllerId(2)));
    let shooter = session.spawn(Some(ControllerId(1)), Vec3::ZERO);
    let victim = session.spawn(Some(ControllerId(2)), Vec3::new(0.0, 0.0, 30.0));
    session.tick(0.1);
    session.hooks(client);

    for _ in 0..5 {
        session.send_server(ProjectileHit::new(shooter, victim));
        session.tick(0.1);
    }

    assert!(session.server_get::<DeathFlag>(victim).is_dead());
    assert!(session.client_get::<DeathFlag>(client, victim).is_dead());

    let hooks = session.hooks(client);
    assert_eq!(hooks.iter().filter(|kind| **kind == HookKind::HealthChanged).count(), 5);
    assert_eq!(hooks.last(), Some(&HookKind::DeathEntered));
}
