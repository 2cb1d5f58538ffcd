//! Multi-ore drill: extracts every ore type under and around its footprint at once.
//!
//! A single shared `warmup` scalar models the rotor speed. Each discovered
//! ore type gets its own progress accumulator, advanced every tick in
//! proportion to how many tiles carry that ore, and its own completion
//! threshold that grows with the ore's hardness.
//!
//! # Tick order
//!
//! 1. No ores discovered: idle.
//! 2. Dump timer: push held items downstream.
//! 3. Backpressure: storage full or inputs missing halts extraction entirely.
//! 4. Warmup eases toward the target speed; every ore accumulates progress.
//! 5. Ores past their threshold emit one item each into storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::{BlockContext, TICKS_PER_SECOND};
use crate::error::{GameError, Result};
use crate::inventory::{ItemSink, ItemStorage};
use crate::math::{fixed_serde, lerp_delta, ratio, Fixed};
use crate::resources::{ResourceId, ResourceRegistry};
use crate::tiles::{footprint, perimeter, TileCoord, TileMap};

/// Tuning parameters for a multi-ore drill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiDrillConfig {
    /// Footprint edge length in tiles.
    pub size: u8,
    /// Base ticks per item for a zero-hardness ore on one tile.
    #[serde(with = "fixed_serde")]
    pub drill_time: Fixed,
    /// Extra ticks per item per point of hardness.
    #[serde(with = "fixed_serde")]
    pub hardness_multiplier: Fixed,
    /// Speed multiplier while the optional boost liquid is supplied.
    #[serde(with = "fixed_serde")]
    pub liquid_boost: Fixed,
    /// Warmup easing rate per tick.
    #[serde(with = "fixed_serde")]
    pub warmup_speed: Fixed,
    /// Maximum held units per ore type.
    pub item_capacity: u32,
    /// Ticks between dumps.
    #[serde(with = "fixed_serde")]
    pub dump_time: Fixed,
}

impl Default for MultiDrillConfig {
    fn default() -> Self {
        Self {
            size: 2,
            drill_time: Fixed::from_num(280),
            hardness_multiplier: Fixed::from_num(50),
            liquid_boost: ratio(18, 10),
            warmup_speed: ratio(1, 100),
            item_capacity: 10,
            dump_time: Fixed::from_num(5),
        }
    }
}

impl MultiDrillConfig {
    /// Check parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming `block` and the first bad field.
    pub fn validate(&self, block: &str) -> Result<()> {
        let reason = if self.size == 0 {
            "size must be at least 1"
        } else if self.drill_time <= Fixed::ZERO {
            "drill_time must be positive"
        } else if self.hardness_multiplier < Fixed::ZERO {
            "hardness_multiplier must not be negative"
        } else if self.liquid_boost < Fixed::ONE {
            "liquid_boost must be at least 1"
        } else if self.warmup_speed <= Fixed::ZERO || self.warmup_speed > Fixed::ONE {
            "warmup_speed must be within (0, 1]"
        } else if self.item_capacity == 0 {
            "item_capacity must be non-zero"
        } else if self.dump_time <= Fixed::ZERO {
            "dump_time must be positive"
        } else {
            return Ok(());
        };

        tracing::warn!(block, reason, "Rejected multi drill config");
        Err(GameError::invalid_config(block, reason))
    }

    /// Static block stats for tooltips and balance reports.
    #[must_use]
    pub fn stats(&self) -> MultiDrillStats {
        let area = Fixed::from_num(u32::from(self.size) * u32::from(self.size));
        MultiDrillStats {
            base_speed: Fixed::from_num(TICKS_PER_SECOND) / self.drill_time * area,
            boost_effect: self.liquid_boost * self.liquid_boost,
            item_capacity: self.item_capacity,
        }
    }
}

/// Display stats of a multi-ore drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDrillStats {
    /// Items per second with a full footprint of one soft ore.
    #[serde(with = "fixed_serde")]
    pub base_speed: Fixed,
    /// Throughput multiplier shown for the boost liquid.
    #[serde(with = "fixed_serde")]
    pub boost_effect: Fixed,
    /// Maximum held units per ore type.
    pub item_capacity: u32,
}

/// Something that happened during a drill update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillEvent {
    /// One unit was extracted into storage.
    Mined {
        /// The extracted ore.
        resource: ResourceId,
    },
    /// One unit left storage for the downstream sink.
    Dumped {
        /// The dumped ore.
        resource: ResourceId,
    },
    /// Backpressure halted extraction this tick.
    Stalled,
}

/// Count ore tiles under and along the edges of a footprint.
#[must_use]
pub fn count_ores<M: TileMap + ?Sized>(
    map: &M,
    origin: TileCoord,
    size: u8,
) -> BTreeMap<ResourceId, u32> {
    let mut counts = BTreeMap::new();
    for tile in footprint(origin, size).into_iter().chain(perimeter(origin, size)) {
        if let Some(drop) = map.drop_at(tile) {
            *counts.entry(drop).or_insert(0) += 1;
        }
    }
    counts
}

/// Check whether a drill placed here would find anything to extract.
#[must_use]
pub fn can_place_on<M: TileMap + ?Sized>(map: &M, origin: TileCoord, size: u8) -> bool {
    footprint(origin, size)
        .into_iter()
        .chain(perimeter(origin, size))
        .any(|tile| map.drop_at(tile).is_some())
}

/// A placed multi-ore drill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDrill {
    config: MultiDrillConfig,
    origin: TileCoord,
    ores: BTreeMap<ResourceId, u32>,
    #[serde(with = "fixed_map_serde")]
    progress: BTreeMap<ResourceId, Fixed>,
    /// Current fraction of full rotor speed.
    #[serde(with = "fixed_serde")]
    pub warmup: Fixed,
    #[serde(with = "fixed_serde")]
    time_drilled: Fixed,
    #[serde(with = "fixed_serde")]
    dump_timer: Fixed,
    items: ItemStorage,
    stalled: bool,
}

impl MultiDrill {
    /// Create a drill with no ores discovered yet.
    ///
    /// Call [`MultiDrill::on_proximity_update`] once the surrounding tiles are known.
    #[must_use]
    pub fn new(config: MultiDrillConfig, origin: TileCoord) -> Self {
        Self {
            config,
            origin,
            ores: BTreeMap::new(),
            progress: BTreeMap::new(),
            warmup: Fixed::ZERO,
            time_drilled: Fixed::ZERO,
            dump_timer: Fixed::ZERO,
            items: ItemStorage::new(),
            stalled: false,
        }
    }

    /// Create a drill and discover its ores in one step.
    #[must_use]
    pub fn placed<M: TileMap + ?Sized>(config: MultiDrillConfig, origin: TileCoord, map: &M) -> Self {
        let mut drill = Self::new(config, origin);
        drill.on_proximity_update(map);
        drill
    }

    /// Tuning parameters.
    #[must_use]
    pub const fn config(&self) -> &MultiDrillConfig {
        &self.config
    }

    /// Anchor tile.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Discovered ore types and their tile counts.
    #[must_use]
    pub const fn ores(&self) -> &BTreeMap<ResourceId, u32> {
        &self.ores
    }

    /// Progress toward the next unit of `resource`.
    #[must_use]
    pub fn progress(&self, resource: ResourceId) -> Fixed {
        self.progress.get(&resource).copied().unwrap_or(Fixed::ZERO)
    }

    /// All progress accumulators.
    #[must_use]
    pub const fn progress_map(&self) -> &BTreeMap<ResourceId, Fixed> {
        &self.progress
    }

    /// Accumulated rotor travel, for animation.
    #[must_use]
    pub const fn time_drilled(&self) -> Fixed {
        self.time_drilled
    }

    /// Held items.
    #[must_use]
    pub const fn items(&self) -> &ItemStorage {
        &self.items
    }

    /// Held items, mutably, for collaborators that pull from the drill.
    pub fn items_mut(&mut self) -> &mut ItemStorage {
        &mut self.items
    }

    /// Whether the last update was halted by backpressure.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Rediscover ores after placement or a change to nearby tiles.
    ///
    /// All progress is discarded, even for ore types still present.
    pub fn on_proximity_update<M: TileMap + ?Sized>(&mut self, map: &M) {
        self.ores = count_ores(map, self.origin, self.config.size);
        self.progress.clear();
        tracing::debug!(
            x = self.origin.x,
            y = self.origin.y,
            ore_types = self.ores.len(),
            "Drill ores rebuilt"
        );
    }

    /// Ticks of progress needed for one unit of `resource`.
    ///
    /// Saturates at `Fixed::MAX` for extreme multipliers.
    #[must_use]
    pub fn delay(&self, resource: ResourceId, registry: &ResourceRegistry) -> Fixed {
        let hardness = Fixed::saturating_from_num(registry.hardness(resource));
        self.config
            .drill_time
            .saturating_add(self.config.hardness_multiplier.saturating_mul(hardness))
    }

    /// Discovered ore types in id order, for icons.
    #[must_use]
    pub fn ore_icons(&self) -> Vec<ResourceId> {
        self.ores.keys().copied().collect()
    }

    /// Static stats for this drill's configuration.
    #[must_use]
    pub fn stats(&self) -> MultiDrillStats {
        self.config.stats()
    }

    /// Advance the drill by one tick.
    pub fn update<S: ItemSink + ?Sized>(
        &mut self,
        ctx: &BlockContext,
        registry: &ResourceRegistry,
        sink: &mut S,
    ) -> Vec<DrillEvent> {
        let mut events = Vec::new();
        if self.ores.is_empty() {
            return events;
        }

        let delta = ctx.scaled_delta();
        self.dump(delta, sink, &mut events);
        self.time_drilled += self.warmup * delta;

        let capacity = u32::try_from(self.ores.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.config.item_capacity);

        if self.items.total() >= capacity || !ctx.inputs_valid {
            self.warmup = lerp_delta(self.warmup, Fixed::ZERO, self.config.warmup_speed, delta);
            if !self.stalled {
                tracing::debug!(
                    x = self.origin.x,
                    y = self.origin.y,
                    held = self.items.total(),
                    "Drill stalled"
                );
            }
            self.stalled = true;
            events.push(DrillEvent::Stalled);
            return events;
        }
        self.stalled = false;

        let boost = if ctx.boost_valid {
            self.config.liquid_boost
        } else {
            Fixed::ONE
        };
        let speed = boost * ctx.efficiency;
        self.warmup = lerp_delta(self.warmup, speed, self.config.warmup_speed, delta);

        for (resource, count) in &self.ores {
            let gained = delta * Fixed::from_num(*count) * speed * self.warmup;
            let progress = self.progress.entry(*resource).or_insert(Fixed::ZERO);
            *progress = progress.saturating_add(gained);
        }

        let ores: Vec<ResourceId> = self.ores.keys().copied().collect();
        for resource in ores {
            let delay = self.delay(resource, registry);
            let progress = self.progress(resource);
            if progress >= delay && self.items.get(resource) < self.config.item_capacity {
                self.items.add(resource, 1);
                self.progress.insert(resource, progress - delay);
                tracing::trace!(resource = registry.key(resource), "Drill mined item");
                events.push(DrillEvent::Mined { resource });
            }
        }

        events
    }

    /// Offer one of each held item downstream whenever the dump timer fires.
    fn dump<S: ItemSink + ?Sized>(&mut self, delta: Fixed, sink: &mut S, events: &mut Vec<DrillEvent>) {
        self.dump_timer += delta;
        if self.dump_timer < self.config.dump_time {
            return;
        }
        self.dump_timer = Fixed::ZERO;

        let held: Vec<ResourceId> = self.items.iter().map(|(resource, _)| resource).collect();
        for resource in held {
            if sink.accept(resource) {
                self.items.remove(resource, 1);
                events.push(DrillEvent::Dumped { resource });
            }
        }
    }

    /// Encode the state persisted beyond the base block. The drill persists nothing.
    #[must_use]
    pub fn write_extra(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Restore persisted state. Warmup and progress always restart from zero.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveFormat`] if any extra data is present.
    pub fn read_extra(&mut self, bytes: &[u8]) -> Result<()> {
        if !bytes.is_empty() {
            return Err(GameError::SaveFormat(format!(
                "drill persists no extra data, got {} bytes",
                bytes.len()
            )));
        }
        self.warmup = Fixed::ZERO;
        self.progress.clear();
        self.dump_timer = Fixed::ZERO;
        self.stalled = false;
        Ok(())
    }
}

/// Serde adapter for `BTreeMap<ResourceId, Fixed>` using raw bits.
mod fixed_map_serde {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::math::Fixed;
    use crate::resources::ResourceId;

    pub fn serialize<S>(map: &BTreeMap<ResourceId, Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bits: BTreeMap<ResourceId, i64> = map.iter().map(|(k, v)| (*k, v.to_bits())).collect();
        bits.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<ResourceId, Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = BTreeMap::<ResourceId, i64>::deserialize(deserializer)?;
        Ok(bits.into_iter().map(|(k, v)| (k, Fixed::from_bits(v))).collect())
    }
}
