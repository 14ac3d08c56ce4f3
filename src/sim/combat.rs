//! Projectile flight and hit resolution
//!
//! Pure functions over projectiles and targets. Removal and scoring are left
//! to the caller so that nothing is deleted while a list is being scanned.

use glam::Vec2;

use super::capability::{Damageable, Movable};
use super::state::Projectile;
use crate::heading_vec;
use crate::map::GridMap;

/// Result of moving a projectile one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    /// Still going
    Flying,
    /// Next position was blocked; the projectile did not move
    Blocked,
    /// Moved, and has now covered its maximum range
    Spent,
}

/// One target damaged by a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Index into the target slice
    pub index: usize,
    pub damage: i32,
    pub killed: bool,
}

/// What a projectile did to the targets this tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub hits: Vec<Hit>,
}

impl Outcome {
    /// A projectile that hit anything is used up
    pub fn consumed(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn kills(&self) -> impl Iterator<Item = usize> + '_ {
        self.hits.iter().filter(|h| h.killed).map(|h| h.index)
    }
}

/// Point-radius overlap test
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) <= radius * radius
}

/// Integrate one tick of flight, culling at walls and at max range
pub fn advance(projectile: &mut Projectile, map: &GridMap) -> Flight {
    let step = heading_vec(projectile.angle) * projectile.speed;
    if !projectile.try_move(map, step) {
        return Flight::Blocked;
    }
    projectile.traveled += projectile.speed;
    if projectile.traveled >= projectile.max_range {
        Flight::Spent
    } else {
        Flight::Flying
    }
}

/// Apply a projectile to live targets at its current position.
///
/// A plain projectile damages the first live target (in slice order) within
/// `hit_radius`. A splash projectile instead triggers when any live target is
/// inside its splash radius and damages all of them.
pub fn resolve_projectile<T>(projectile: &Projectile, targets: &mut [T], hit_radius: f32) -> Outcome
where
    T: Damageable + Movable,
{
    let mut outcome = Outcome::default();
    match projectile.splash {
        None => {
            if let Some((index, target)) = targets
                .iter_mut()
                .enumerate()
                .find(|(_, t)| t.is_alive() && within(t.position(), projectile.pos, hit_radius))
            {
                let killed = target.apply_damage(projectile.damage);
                outcome.hits.push(Hit {
                    index,
                    damage: projectile.damage,
                    killed,
                });
            }
        }
        Some(radius) => {
            for (index, target) in targets.iter_mut().enumerate() {
                if target.is_alive() && within(target.position(), projectile.pos, radius) {
                    let killed = target.apply_damage(projectile.damage);
                    outcome.hits.push(Hit {
                        index,
                        damage: projectile.damage,
                        killed,
                    });
                }
            }
        }
    }
    outcome
}
