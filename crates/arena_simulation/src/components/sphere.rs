//! Sphere attack — заряжаемая AoE атака
//!
//! Два ортогональных флага: `active` (зарядка) и `current_cooldown > 0`.
//! Cooldown тикает независимо от зарядки.

use bevy::prelude::*;

use crate::config::SphereAttackConfig;
use crate::error::GameplayError;
use crate::net::NetRole;

/// Что release сферы должен нанести (sweep выполняет система)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereRelease {
    /// Радиус в момент release (до сброса)
    pub radius: f32,
    pub damage: f32,
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SphereAttack {
    config: SphereAttackConfig,

    /// Инвариант: initial_radius ≤ current_radius ≤ max_radius
    current_radius: f32,

    /// Инвариант: 0 ≤ current_cooldown ≤ config.cooldown
    current_cooldown: f32,

    active: bool,

    /// Client-local кэш числа врагов в сфере (не реплицируется)
    observed_targets: u32,
}

impl Default for SphereAttack {
    fn default() -> Self {
        Self::new(SphereAttackConfig::default())
    }
}

impl SphereAttack {
    pub fn new(config: SphereAttackConfig) -> Self {
        Self {
            config,
            current_radius: config.initial_radius,
            current_cooldown: 0.0,
            active: false,
            observed_targets: 0,
        }
    }

    pub fn config(&self) -> &SphereAttackConfig {
        &self.config
    }

    pub fn current_radius(&self) -> f32 {
        self.current_radius
    }

    pub fn current_cooldown(&self) -> f32 {
        self.current_cooldown
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_in_cooldown(&self) -> bool {
        self.current_cooldown > 0.0
    }

    pub fn observed_targets(&self) -> u32 {
        self.observed_targets
    }

    /// 0.0 = initial radius, 1.0 = max radius
    pub fn normalized_radius(&self) -> f32 {
        let span = self.config.max_radius - self.config.initial_radius;
        if span <= 0.0 {
            return 1.0;
        }
        (self.current_radius - self.config.initial_radius) / span
    }

    /// 1.0 = cooldown только начался, 0.0 = готово
    pub fn normalized_cooldown(&self) -> f32 {
        if self.config.cooldown <= 0.0 {
            return 0.0;
        }
        self.current_cooldown / self.config.cooldown
    }

    /// Начать зарядку. Граница: cooldown == 0 разрешает.
    pub fn activate(&mut self, role: NetRole) -> Result<(), GameplayError> {
        if !role.is_authority() {
            return Err(GameplayError::NotAuthority);
        }
        if self.is_in_cooldown() {
            return Err(GameplayError::OnCooldown {
                remaining: self.current_cooldown,
            });
        }

        self.active = true;
        Ok(())
    }

    /// Release: возвращает параметры sweep, сбрасывает радиус, запускает cooldown.
    pub fn deactivate(&mut self, role: NetRole) -> Result<SphereRelease, GameplayError> {
        if !role.is_authority() {
            return Err(GameplayError::NotAuthority);
        }
        if !self.active {
            return Err(GameplayError::NotActive);
        }

        let release = SphereRelease {
            radius: self.current_radius,
            damage: self.config.damage,
        };

        self.current_radius = self.config.initial_radius;
        self.current_cooldown = self.config.cooldown;
        self.active = false;

        Ok(release)
    }

    /// Интеграция за шаг симуляции. dt ≤ 0 — no-op.
    pub fn step(&mut self, role: NetRole, dt: f32) -> Result<(), GameplayError> {
        if !role.is_authority() {
            return Err(GameplayError::NotAuthority);
        }
        if !(dt > 0.0) {
            return Ok(());
        }

        if self.active {
            self.current_radius = (self.current_radius + self.config.growth_rate * dt)
                .clamp(self.config.initial_radius, self.config.max_radius);
        }

        if self.is_in_cooldown() {
            self.current_cooldown = (self.current_cooldown - dt).clamp(0.0, self.config.cooldown);
        }

        Ok(())
    }

    pub(crate) fn mirror_radius(&mut self, radius: f32) -> bool {
        let radius = radius.clamp(self.config.initial_radius, self.config.max_radius);
        if radius == self.current_radius {
            return false;
        }
        self.current_radius = radius;
        true
    }

    pub(crate) fn mirror_cooldown(&mut self, cooldown: f32) -> bool {
        let cooldown = cooldown.clamp(0.0, self.config.cooldown);
        if cooldown == self.current_cooldown {
            return false;
        }
        self.current_cooldown = cooldown;
        true
    }

    pub(crate) fn mirror_active(&mut self, active: bool) -> bool {
        if active == self.active {
            return false;
        }
        self.active = active;
        true
    }

    /// `true` если число изменилось
    pub(crate) fn set_observed_targets(&mut self, count: u32) -> bool {
        if count == self.observed_targets {
            return false;
        }
        self.observed_targets = count;
        true
    }
}
