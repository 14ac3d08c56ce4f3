//! Read-only archetype tables
//!
//! Fish, tool and power-up archetypes are shared by every instance of their
//! kind and never change during a session. Instances refer to them by index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ammunition / tackle kinds, the keys of the player's resource pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ammo {
    Bait,
    Darts,
    Nets,
    Harpoons,
}

/// Index into [`Catalog::fish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishKindId(pub u16);

/// Index into [`Catalog::tools`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(pub u16);

/// Index into [`Catalog::power_ups`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUpId(pub u16);

/// What happens when a fish reaches the player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackPolicy {
    /// Any contact ends the session
    #[default]
    Contact,
    /// Contact deals the archetype's damage, then waits `cooldown_ticks`
    Bite { cooldown_ticks: u32 },
}

/// A kind of fish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishArchetype {
    pub name: String,
    /// Distance per tick before patrol/chase factors
    pub speed: f32,
    pub health: i32,
    /// Damage per bite (unused by `Contact` fish)
    #[serde(default)]
    pub damage: i32,
    pub points: u64,
    /// Relative spawn frequency
    pub spawn_weight: u32,
    #[serde(default)]
    pub attack: AttackPolicy,
}

/// How a tool emits projectiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FiringPattern {
    Single,
    /// `pellets` projectiles fanned evenly across `spread` radians
    Spread { pellets: u32, spread: f32 },
    /// One projectile that damages everything within `radius` when it connects
    Splash { radius: f32 },
}

/// A kind of weapon/tackle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolArchetype {
    pub name: String,
    pub damage: i32,
    pub cooldown_ticks: u32,
    pub ammo: Ammo,
    pub pattern: FiringPattern,
    /// Distance per tick
    pub projectile_speed: f32,
    pub max_range: f32,
}

/// Player attribute a power-up scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    MoveSpeed,
    Damage,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpArchetype {
    pub name: String,
    pub effect: EffectKind,
    pub multiplier: f32,
    pub duration_ticks: u32,
}

/// Contents of an item pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPayload {
    Tool { tool: ToolId },
    Ammo { ammo: Ammo, amount: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEntry {
    pub payload: ItemPayload,
    pub weight: u32,
}

/// Starting state of the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub health: i32,
    pub tools: Vec<ToolId>,
    pub equipped: Option<ToolId>,
    pub ammo: BTreeMap<Ammo, u32>,
}

/// Errors from loading or validating a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} table is empty")]
    EmptyTable(&'static str),

    #[error("{table} entry {name:?} has invalid {field}")]
    InvalidStat {
        table: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("fish spawn weights sum to zero")]
    NoSpawnWeight,

    #[error("unknown tool id {0}")]
    UnknownTool(u16),

    #[error("loadout equips tool {0} it does not own")]
    EquippedNotOwned(u16),
}

/// All archetype tables plus the default loadout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub fish: Vec<FishArchetype>,
    pub tools: Vec<ToolArchetype>,
    pub power_ups: Vec<PowerUpArchetype>,
    /// Weighted table for item pickups (kill drops and ambient spawns)
    #[serde(default)]
    pub drops: Vec<DropEntry>,
    pub loadout: Loadout,
    /// Resource whose exhaustion can end the session
    pub primary_ammo: Ammo,
}

impl Catalog {
    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.fish.is_empty() {
            return Err(CatalogError::EmptyTable("fish"));
        }
        if self.tools.is_empty() {
            return Err(CatalogError::EmptyTable("tools"));
        }

        for f in &self.fish {
            let bad = |field| CatalogError::InvalidStat {
                table: "fish",
                name: f.name.clone(),
                field,
            };
            if !(f.speed.is_finite() && f.speed >= 0.0) {
                return Err(bad("speed"));
            }
            if f.health <= 0 {
                return Err(bad("health"));
            }
            if f.damage < 0 {
                return Err(bad("damage"));
            }
        }
        if self.fish.iter().map(|f| u64::from(f.spawn_weight)).sum::<u64>() == 0 {
            return Err(CatalogError::NoSpawnWeight);
        }

        for t in &self.tools {
            let bad = |field| CatalogError::InvalidStat {
                table: "tools",
                name: t.name.clone(),
                field,
            };
            if t.damage <= 0 {
                return Err(bad("damage"));
            }
            if !(t.projectile_speed.is_finite() && t.projectile_speed > 0.0) {
                return Err(bad("projectile_speed"));
            }
            if !(t.max_range.is_finite() && t.max_range > 0.0) {
                return Err(bad("max_range"));
            }
            match t.pattern {
                FiringPattern::Single => {}
                FiringPattern::Spread { pellets, spread } => {
                    if pellets == 0 || !spread.is_finite() {
                        return Err(bad("pattern"));
                    }
                }
                FiringPattern::Splash { radius } => {
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(bad("pattern"));
                    }
                }
            }
        }

        for p in &self.power_ups {
            if !(p.multiplier.is_finite() && p.multiplier > 0.0) {
                return Err(CatalogError::InvalidStat {
                    table: "power_ups",
                    name: p.name.clone(),
                    field: "multiplier",
                });
            }
        }

        for d in &self.drops {
            if let ItemPayload::Tool { tool } = d.payload {
                self.check_tool(tool)?;
            }
        }
        for &tool in &self.loadout.tools {
            self.check_tool(tool)?;
        }
        if let Some(eq) = self.loadout.equipped {
            if !self.loadout.tools.contains(&eq) {
                return Err(CatalogError::EquippedNotOwned(eq.0));
            }
        }
        Ok(())
    }

    fn check_tool(&self, id: ToolId) -> Result<(), CatalogError> {
        if self.tool(id).is_some() {
            Ok(())
        } else {
            Err(CatalogError::UnknownTool(id.0))
        }
    }

    pub fn fish(&self, id: FishKindId) -> Option<&FishArchetype> {
        self.fish.get(usize::from(id.0))
    }

    pub fn tool(&self, id: ToolId) -> Option<&ToolArchetype> {
        self.tools.get(usize::from(id.0))
    }

    pub fn power_up(&self, id: PowerUpId) -> Option<&PowerUpArchetype> {
        self.power_ups.get(usize::from(id.0))
    }

    /// Weighted fish pick; `roll` is uniform in [0, 1)
    pub fn pick_fish(&self, roll: f32) -> Option<FishKindId> {
        pick_weighted(self.fish.iter().map(|f| f.spawn_weight), roll)
            .map(|i| FishKindId(i as u16))
    }

    /// Weighted drop pick; `roll` is uniform in [0, 1)
    pub fn pick_drop(&self, roll: f32) -> Option<ItemPayload> {
        pick_weighted(self.drops.iter().map(|d| d.weight), roll).map(|i| self.drops[i].payload)
    }
}

/// Walk cumulative weights until the scaled roll falls inside one
fn pick_weighted(weights: impl Iterator<Item = u32> + Clone, roll: f32) -> Option<usize> {
    let total: u64 = weights.clone().map(u64::from).sum();
    if total == 0 {
        return None;
    }
    let target = (f64::from(roll.clamp(0.0, 1.0)) * total as f64) as u64;
    let mut acc = 0u64;
    let mut last = None;
    for (i, w) in weights.enumerate() {
        if w == 0 {
            continue;
        }
        acc += u64::from(w);
        last = Some(i);
        if target < acc {
            return Some(i);
        }
    }
    // roll == 1.0 lands past the end
    last
}

impl Default for Catalog {
    fn default() -> Self {
        let rod = ToolId(0);
        Self {
            fish: vec![
                FishArchetype {
                    name: "perch".into(),
                    speed: 0.05,
                    health: 2,
                    damage: 0,
                    points: 1,
                    spawn_weight: 70,
                    attack: AttackPolicy::Contact,
                },
                FishArchetype {
                    name: "pike".into(),
                    speed: 0.08,
                    health: 4,
                    damage: 15,
                    points: 3,
                    spawn_weight: 20,
                    attack: AttackPolicy::Bite { cooldown_ticks: 30 },
                },
                FishArchetype {
                    name: "golden carp".into(),
                    speed: 0.1,
                    health: 6,
                    damage: 0,
                    points: 5,
                    spawn_weight: 10,
                    attack: AttackPolicy::Contact,
                },
            ],
            tools: vec![
                ToolArchetype {
                    name: "rod".into(),
                    damage: 1,
                    cooldown_ticks: 4,
                    ammo: Ammo::Bait,
                    pattern: FiringPattern::Single,
                    projectile_speed: 0.6,
                    max_range: 8.0,
                },
                ToolArchetype {
                    name: "speargun".into(),
                    damage: 3,
                    cooldown_ticks: 10,
                    ammo: Ammo::Darts,
                    pattern: FiringPattern::Single,
                    projectile_speed: 0.9,
                    max_range: 12.0,
                },
                ToolArchetype {
                    name: "net launcher".into(),
                    damage: 1,
                    cooldown_ticks: 15,
                    ammo: Ammo::Nets,
                    pattern: FiringPattern::Spread {
                        pellets: 5,
                        spread: 0.6,
                    },
                    projectile_speed: 0.5,
                    max_range: 5.0,
                },
                ToolArchetype {
                    name: "harpoon cannon".into(),
                    damage: 4,
                    cooldown_ticks: 25,
                    ammo: Ammo::Harpoons,
                    pattern: FiringPattern::Splash { radius: 1.5 },
                    projectile_speed: 0.7,
                    max_range: 10.0,
                },
            ],
            power_ups: vec![
                PowerUpArchetype {
                    name: "turbo fins".into(),
                    effect: EffectKind::MoveSpeed,
                    multiplier: 1.5,
                    duration_ticks: 300,
                },
                PowerUpArchetype {
                    name: "sharp hooks".into(),
                    effect: EffectKind::Damage,
                    multiplier: 2.0,
                    duration_ticks: 200,
                },
                PowerUpArchetype {
                    name: "quick reel".into(),
                    effect: EffectKind::Reload,
                    multiplier: 2.0,
                    duration_ticks: 250,
                },
            ],
            drops: vec![
                DropEntry {
                    payload: ItemPayload::Ammo {
                        ammo: Ammo::Bait,
                        amount: 5,
                    },
                    weight: 40,
                },
                DropEntry {
                    payload: ItemPayload::Ammo {
                        ammo: Ammo::Darts,
                        amount: 3,
                    },
                    weight: 20,
                },
                DropEntry {
                    payload: ItemPayload::Ammo {
                        ammo: Ammo::Nets,
                        amount: 2,
                    },
                    weight: 15,
                },
                DropEntry {
                    payload: ItemPayload::Ammo {
                        ammo: Ammo::Harpoons,
                        amount: 1,
                    },
                    weight: 10,
                },
                DropEntry {
                    payload: ItemPayload::Tool { tool: ToolId(1) },
                    weight: 6,
                },
                DropEntry {
                    payload: ItemPayload::Tool { tool: ToolId(2) },
                    weight: 5,
                },
                DropEntry {
                    payload: ItemPayload::Tool { tool: ToolId(3) },
                    weight: 4,
                },
            ],
            loadout: Loadout {
                health: 100,
                tools: vec![rod],
                equipped: Some(rod),
                ammo: BTreeMap::from([(Ammo::Bait, 20)]),
            },
            primary_ammo: Ammo::Bait,
        }
    }
}
