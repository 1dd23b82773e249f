//! Общий harness: authority + observers в одном тесте

#![allow(dead_code)]

use arena_simulation::net::NetEntityMap;
use arena_simulation::{
    connect_observer, create_headless_app, spawn_player, step, ControllerId, GameplayConfig, NetId, NetRole,
    PresentationLog, HookKind,
};
use bevy::prelude::*;

pub struct Session {
    pub server: App,
    pub clients: Vec<App>,
    config: GameplayConfig,
}

impl Session {
    pub fn new(config: GameplayConfig) -> Self {
        Self {
            server: create_headless_app(NetRole::Authority, config.clone()),
            clients: Vec::new(),
            config,
        }
    }

    /// Новый observer, управляющий `controller`. Возвращает индекс клиента.
    pub fn connect(&mut self, controller: Option<ControllerId>) -> usize {
        let mut client = create_headless_app(NetRole::Observer, self.config.clone());
        connect_observer(self.server.world_mut(), client.world_mut(), controller);
        self.clients.push(client);
        self.clients.len() - 1
    }

    pub fn spawn(&mut self, controller: Option<ControllerId>, position: Vec3) -> Entity {
        spawn_player(self.server.world_mut(), controller, position).unwrap()
    }

    /// Шаг authority, затем всех observers
    pub fn tick(&mut self, dt: f32) {
        step(&mut self.server, dt);
        for client in self.clients.iter_mut() {
            step(client, dt);
        }
    }

    pub fn net_id(&self, server_entity: Entity) -> NetId {
        *self.server.world().get::<NetId>(server_entity).unwrap()
    }

    /// Proxy entity на клиенте для server entity
    pub fn proxy(&self, client: usize, server_entity: Entity) -> Entity {
        self.clients[client]
            .world()
            .resource::<NetEntityMap>()
            .get(self.net_id(server_entity))
            .unwrap()
    }

    pub fn client_get<T: Component>(&self, client: usize, server_entity: Entity) -> &T {
        self.clients[client]
            .world()
            .get::<T>(self.proxy(client, server_entity))
            .unwrap()
    }

    pub fn server_get<T: Component>(&self, entity: Entity) -> &T {
        self.server.world().get::<T>(entity).unwrap()
    }

    pub fn hooks(&mut self, client: usize) -> Vec<HookKind> {
        self.clients[client]
            .world_mut()
            .resource_mut::<PresentationLog>()
            .drain()
            .into_iter()
            .map(|hook| hook.kind)
            .collect()
    }

    pub fn send_client<E: Event>(&mut self, client: usize, event: E) {
        self.clients[client].world_mut().send_event(event);
    }

    pub fn send_server<E: Event>(&mut self, event: E) {
        self.server.world_mut().send_event(event);
    }
}

pub fn current_events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}
