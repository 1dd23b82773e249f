//! Spatial query: "все entities категории C в радиусе R от точки P, кроме E"
//!
//! Point-in-sphere по world-space позиции (Transform.translation) в момент запроса.
//! Без интерполяции, без частичного overlap. Граница включительна (distance ≤ R).

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Категория для spatial queries (аналог collision object type)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Component)]
pub enum QueryCategory {
    /// Персонажи — цели sphere attack
    #[default]
    Pawn,
    /// Декорации/объекты мира, не получают урон от сферы
    Prop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    pub entity: Entity,
    pub position: Vec3,
}

pub fn point_in_sphere(point: Vec3, center: Vec3, radius: f32) -> bool {
    point.distance_squared(center) <= radius * radius
}

#[derive(SystemParam)]
pub struct SpatialQuery<'w, 's> {
    bodies: Query<'w, 's, (Entity, &'static Transform, &'static QueryCategory)>,
}

impl SpatialQuery<'_, '_> {
    /// Hits отсортированы по Entity (детерминированный порядок урона)
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        category: QueryCategory,
        exclude: &[Entity],
    ) -> Vec<SpatialHit> {
        let mut hits: Vec<SpatialHit> = self
            .bodies
            .iter()
            .filter(|(entity, transform, body_category)| {
                **body_category == category
                    && !exclude.contains(entity)
                    && point_in_sphere(transform.translation, center, radius)
            })
            .map(|(entity, transform, _)| SpatialHit {
                entity,
                position: transform.translation,
            })
            .collect();

        hits.sort_by_key(|hit| hit.entity);
        hits
    }

    pub fn count_in_sphere(&self, center: Vec3, radius: f32, category: QueryCategory, exclude: &[Entity]) -> u32 {
        self.overlap_sphere(center, radius, category, exclude).len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn test_point_in_sphere_boundary_inclusive() {
        let center = Vec3::ZERO;

        assert!(point_in_sphere(Vec3::new(3.0, 4.0, 0.0), center, 5.0));
        assert!(point_in_sphere(Vec3::new(0.0, 0.0, 5.0), center, 5.0));
        assert!(!point_in_sphere(Vec3::new(0.0, 0.0, 5.01), center, 5.0));
    }

    #[derive(Resource, Default)]
    struct Found(Vec<Entity>);

    fn query_around_origin(spatial: SpatialQuery, exclude: Query<Entity, With<Name>>, mut found: ResMut<Found>) {
        let excluded: Vec<Entity> = exclude.iter().collect();
        found.0 = spatial
            .overlap_sphere(Vec3::ZERO, 10.0, QueryCategory::Pawn, &excluded)
            .into_iter()
            .map(|hit| hit.entity)
            .collect();
    }

    #[test]
    fn test_overlap_filters_category_exclusion_and_range() {
        let mut world = World::new();
        world.init_resource::<Found>();

        let near = world
            .spawn((Transform::from_xyz(5.0, 0.0, 0.0), QueryCategory::Pawn))
            .id();
        world.spawn((Transform::from_xyz(50.0, 0.0, 0.0), QueryCategory::Pawn));
        world.spawn((Transform::from_xyz(1.0, 0.0, 0.0), QueryCategory::Prop));
        world.spawn((Transform::IDENTITY, QueryCategory::Pawn, Name::new("caster")));

        world.run_system_once(query_around_origin).unwrap();

        assert_eq!(world.resource::<Found>().0, vec![near]);
    }
}
