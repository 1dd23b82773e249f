//! Headless arena сессия
//!
//! Authority + два observer App'а в одном процессе (loopback transport).
//! Игрок 1 заряжает сферу, игрока 2 добивают снарядами, затем respawn.
//!
//! Использование: `arena_simulation [config.ron]`

use arena_simulation::logger::init_logger;
use arena_simulation::{
    connect_observer, create_headless_app, log_error, log_info, spawn_player, step, world_snapshot, ControllerId,
    GameplayConfig, HudReadout, NetRole, PresentationLog, ProjectileHit, SphereInputIntent,
};
use bevy::prelude::*;

const DT: f32 = 1.0 / 30.0;
const TICKS: u32 = 30 * 9;

/// Logger ставится первым: ошибка конфига должна дойти до консоли
fn startup(config_path: Option<String>) -> Option<GameplayConfig> {
    init_logger();

    let loaded = match config_path {
        Some(path) => GameplayConfig::load(path),
        None => Ok(GameplayConfig::default()),
    };
    match loaded {
        Ok(config) => {
            log_info(&format!("Starting arena session (seed: {})", config.seed));
            Some(config)
        }
        Err(error) => {
            log_error(&format!("Config error: {}", error));
            None
        }
    }
}

fn main() {
    let Some(config) = startup(std::env::args().nth(1)) else {
        std::process::exit(1);
    };

    let mut server = create_headless_app(NetRole::Authority, config.clone());
    let mut clients = [
        create_headless_app(NetRole::Observer, config.clone()),
        create_headless_app(NetRole::Observer, config),
    ];
    for (index, client) in clients.iter_mut().enumerate() {
        connect_observer(server.world_mut(), client.world_mut(), Some(ControllerId(index as u32 + 1)));
    }

    let spawned = (
        spawn_player(server.world_mut(), Some(ControllerId(1)), Vec3::ZERO),
        spawn_player(server.world_mut(), Some(ControllerId(2)), Vec3::new(250.0, 0.0, 0.0)),
        spawn_player(server.world_mut(), None, Vec3::new(0.0, 0.0, 400.0)),
    );
    let (Ok(caster), Ok(victim), Ok(_dummy)) = spawned else {
        log_error("Failed to spawn players");
        std::process::exit(1);
    };

    for tick in 0..TICKS {
        match tick {
            0 => {
                clients[0].world_mut().send_event(SphereInputIntent { pressed: true });
            }
            30 => {
                clients[0].world_mut().send_event(SphereInputIntent { pressed: false });
            }
            60 | 70 | 80 => {
                server.world_mut().send_event(ProjectileHit::new(caster, victim));
            }
            _ => {}
        }

        step(&mut server, DT);
        for client in clients.iter_mut() {
            step(client, DT);
        }

        for (index, client) in clients.iter_mut().enumerate() {
            let hooks = client.world_mut().resource_mut::<PresentationLog>().drain();
            if hooks.is_empty() {
                continue;
            }
            let hud = *client.world().resource::<HudReadout>();
            log_info(&format!(
                "[tick {:>3}] client {}: {:?} | HUD hp {:.2} sphere {:.2} cd {:.1}s enemies {} dead {}",
                tick,
                index + 1,
                hooks.iter().map(|hook| hook.kind).collect::<Vec<_>>(),
                hud.health_fraction,
                hud.sphere_fraction,
                hud.cooldown_remaining,
                hud.enemies_in_range,
                hud.dead
            ));
        }
    }

    let server_state = world_snapshot(server.world_mut());
    let client_state = world_snapshot(clients[1].world_mut());
    match (server_state, client_state) {
        (Ok(server_state), Ok(client_state)) => {
            log_info(&format!("Observer in sync with authority: {}", server_state == client_state));
        }
        (Err(error), _) | (_, Err(error)) => log_error(&format!("Snapshot failed: {}", error)),
    }

    log_info("Session complete!");
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_simulation::logger;

    #[test]
    fn test_startup_installs_logger_before_config_error() {
        let config = startup(Some("/nonexistent/arena.ron".to_string()));

        assert!(config.is_none());
        assert!(logger::is_initialized());
    }

    #[test]
    fn test_startup_defaults_without_path() {
        assert_eq!(startup(None), Some(GameplayConfig::default()));
    }
}
