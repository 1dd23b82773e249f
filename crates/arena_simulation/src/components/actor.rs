//! Компоненты игрока: PlayerCharacter, Health, DeathFlag, Controller

use bevy::prelude::*;

use crate::combat::QueryCategory;
use crate::components::SphereAttack;
use crate::error::GameplayError;
use crate::net::{ControllerId, NetRole};

/// Игровой персонаж (человек или бот)
///
/// Required Components: Health, DeathFlag, SphereAttack, Transform, QueryCategory::Pawn.
/// Значения из GameplayConfig проставляются в `spawn_player`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health, DeathFlag, SphereAttack, Transform, QueryCategory)]
pub struct PlayerCharacter;

/// Мутация здоровья (все пути изменения Health проходят через неё)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthMutation {
    Set(f32),
    Damage(f32),
    Heal(f32),
    RestoreToMax,
}

/// Результат успешной мутации
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthChange {
    pub previous: f32,
    pub current: f32,
}

/// Здоровье
///
/// Инвариант: 0 ≤ current ≤ max, max > 0 и не меняется после создания.
/// Мутирует только authority; observer получает значение через репликацию.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// current / max (для HUD)
    pub fn normalized(&self) -> f32 {
        self.current / self.max
    }

    /// Clamp в [0, max]. NaN превращается в 0.
    fn clamped(&self, value: f32) -> f32 {
        value.max(0.0).min(self.max)
    }

    pub fn set_current(&mut self, role: NetRole, value: f32) -> Result<HealthChange, GameplayError> {
        if !role.is_authority() {
            return Err(GameplayError::NotAuthority);
        }

        let previous = self.current;
        self.current = self.clamped(value);

        Ok(HealthChange {
            previous,
            current: self.current,
        })
    }

    /// Отрицательный amount не валидируется: становится лечением
    pub fn damage(&mut self, role: NetRole, amount: f32) -> Result<HealthChange, GameplayError> {
        self.set_current(role, self.current - amount)
    }

    pub fn heal(&mut self, role: NetRole, amount: f32) -> Result<HealthChange, GameplayError> {
        self.set_current(role, self.current + amount)
    }

    pub fn restore_to_max(&mut self, role: NetRole) -> Result<HealthChange, GameplayError> {
        self.set_current(role, self.max)
    }

    pub fn apply(&mut self, role: NetRole, mutation: HealthMutation) -> Result<HealthChange, GameplayError> {
        match mutation {
            HealthMutation::Set(value) => self.set_current(role, value),
            HealthMutation::Damage(amount) => self.damage(role, amount),
            HealthMutation::Heal(amount) => self.heal(role, amount),
            HealthMutation::RestoreToMax => self.restore_to_max(role),
        }
    }

    /// Observer: применить реплицированное значение. `true` если изменилось.
    pub(crate) fn mirror(&mut self, value: f32) -> bool {
        let value = self.clamped(value);
        if value == self.current {
            return false;
        }
        self.current = value;
        true
    }
}

/// Флаг смерти
///
/// Выводится из Health == 0 на authority, но реплицируется отдельно:
/// observers переключают presentation по переходу флага, не пересчитывая health.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct DeathFlag {
    is_dead: bool,
}

impl DeathFlag {
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Переход alive → dead. `Ok(false)` если уже мертв (idempotent).
    pub fn mark_dead(&mut self, role: NetRole) -> Result<bool, GameplayError> {
        self.transition(role, true)
    }

    /// Переход dead → alive. `Ok(false)` если уже жив.
    pub fn clear(&mut self, role: NetRole) -> Result<bool, GameplayError> {
        self.transition(role, false)
    }

    fn transition(&mut self, role: NetRole, is_dead: bool) -> Result<bool, GameplayError> {
        if !role.is_authority() {
            return Err(GameplayError::NotAuthority);
        }
        Ok(self.mirror(is_dead))
    }

    pub(crate) fn mirror(&mut self, is_dead: bool) -> bool {
        if self.is_dead == is_dead {
            return false;
        }
        self.is_dead = is_dead;
        true
    }
}

/// Кем управляется персонаж (отсутствует у ботов/манекенов)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Controller(pub ControllerId);

/// Маркер: персонаж управляется локальным игроком этого процесса
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LocallyControlled;

/// Состояние ввода локального игрока (death mode отключает ввод)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInput {
    pub enabled: bool,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH: NetRole = NetRole::Authority;

    #[test]
    fn test_health_set_current_clamps() {
        let mut health = Health::new(100.0);

        for (input, expected) in [(-50.0, 0.0), (0.0, 0.0), (42.5, 42.5), (100.0, 100.0), (250.0, 100.0)] {
            health.set_current(AUTH, input).unwrap();
            assert_eq!(health.current(), expected, "set_current({})", input);
        }
    }

    #[test]
    fn test_health_damage_then_heal_returns_to_original() {
        let mut health = Health::new(100.0);
        health.set_current(AUTH, 60.0).unwrap();

        health.damage(AUTH, 25.0).unwrap();
        assert_eq!(health.current(), 35.0);

        health.heal(AUTH, 25.0).unwrap();
        assert_eq!(health.current(), 60.0);
    }

    #[test]
    fn test_health_damage_overkill_clamps_to_zero() {
        let mut health = Health::new(100.0);

        let change = health.damage(AUTH, 150.0).unwrap();
        assert_eq!(change, HealthChange { previous: 100.0, current: 0.0 });
        assert!(health.is_depleted());
    }

    #[test]
    fn test_health_restore_to_max() {
        let mut health = Health::new(80.0);
        health.damage(AUTH, 79.0).unwrap();

        health.restore_to_max(AUTH).unwrap();
        assert_eq!(health.current(), 80.0);
        assert_eq!(health.normalized(), 1.0);
    }

    #[test]
    fn test_health_negative_heal_is_damage() {
        let mut health = Health::new(100.0);

        health.heal(AUTH, -30.0).unwrap();
        assert_eq!(health.current(), 70.0);
    }

    #[test]
    fn test_health_observer_mutation_ignored() {
        let mut health = Health::new(100.0);

        assert_eq!(health.damage(NetRole::Observer, 40.0), Err(GameplayError::NotAuthority));
        assert_eq!(health.apply(NetRole::Observer, HealthMutation::Set(1.0)), Err(GameplayError::NotAuthority));
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn test_health_mirror_reports_change_once() {
        let mut health = Health::new(100.0);

        assert!(health.mirror(70.0));
        assert!(!health.mirror(70.0)); // Дубликат — no-op
        assert_eq!(health.current(), 70.0);
    }

    #[test]
    fn test_death_flag_transitions_once() {
        let mut flag = DeathFlag::default();

        assert_eq!(flag.mark_dead(AUTH), Ok(true));
        assert_eq!(flag.mark_dead(AUTH), Ok(false));
        assert!(flag.is_dead());

        assert_eq!(flag.clear(NetRole::Observer), Err(GameplayError::NotAuthority));
        assert!(flag.is_dead());

        assert_eq!(flag.clear(AUTH), Ok(true));
        assert!(!flag.is_dead());
    }
}
