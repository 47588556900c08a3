//! Light registry with named lights, groups and performance caps
//!
//! Lights are created from presets, registered under a unique key and
//! optionally placed in a group. Groups allow bulk changes such as dimming
//! every artwork spotlight at once. The caps keep the scene within what the
//! renderer can afford: shadow casters beyond the budget lose their shadows
//! and point or spot lights beyond theirs are removed, oldest kept first.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::animation::{AnimationOwner, AnimationScheduler, AnimationSpec, AnimationTarget, Easing};
use crate::core::config::LightingConfig;
use crate::foundation::collections::{AnimationGroupId, LightId};
use crate::foundation::color::Color;
use crate::foundation::math::{constants::PI, Vec3};
use crate::render::lighting::light::{Light, LightKind, LightSpec, AMBIENT_GROUP, ARTWORK_GROUP, MAIN_GROUP};
use crate::render::resources::ResourceError;

/// Partial update applied by [`LightManager::update_light`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightUpdate {
    /// New colour
    pub color: Option<Color>,
    /// New intensity
    pub intensity: Option<f32>,
    /// New position
    pub position: Option<Vec3>,
    /// New aim point
    pub target: Option<Vec3>,
}

/// Named lighting atmospheres applied to the "ambient" and "main" groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMood {
    /// Golden, low contrast
    Warm,
    /// Blue tinted
    Cool,
    /// Dark surroundings, bright key
    Dramatic,
    /// Even white light
    Soft,
}

impl SceneMood {
    /// Look a mood up by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "warm" => Some(Self::Warm),
            "cool" => Some(Self::Cool),
            "dramatic" => Some(Self::Dramatic),
            "soft" => Some(Self::Soft),
            _ => None,
        }
    }

    /// (ambient colour, ambient intensity, main colour, main intensity)
    const fn settings(self) -> (u32, f32, u32, f32) {
        match self {
            Self::Warm => (0xffd700, 0.5, 0xffa500, 0.8),
            Self::Cool => (0x87ceeb, 0.4, 0xadd8e6, 0.8),
            Self::Dramatic => (0x000000, 0.1, 0xffffff, 1.2),
            Self::Soft => (0xffffff, 0.6, 0xffffff, 0.6),
        }
    }
}

/// Light counts reported by [`LightManager::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightStats {
    /// All lights
    pub total: usize,
    /// Ambient lights
    pub ambient: usize,
    /// Directional lights
    pub directional: usize,
    /// Point lights
    pub point: usize,
    /// Spot lights
    pub spot: usize,
    /// Hemisphere lights
    pub hemisphere: usize,
    /// Lights currently casting shadows
    pub shadow_casters: usize,
    /// Non-empty groups
    pub groups: usize,
}

/// Registry of scene lights
pub struct LightManager {
    config: LightingConfig,
    lights: SlotMap<LightId, Light>,
    keys: HashMap<String, LightId>,
    order: Vec<LightId>,
    groups: HashMap<String, Vec<LightId>>,
}

impl LightManager {
    /// Create an empty manager
    pub fn new(config: LightingConfig) -> Self {
        Self {
            config,
            lights: SlotMap::with_key(),
            keys: HashMap::new(),
            order: Vec::new(),
            groups: HashMap::new(),
        }
    }

    // ===== Creation =====

    /// Create a light from a preset request and register it under `key`.
    ///
    /// A key that is already registered returns the existing light
    /// unchanged.
    pub fn create_light(&mut self, key: &str, spec: &LightSpec) -> Result<LightId, ResourceError> {
        if let Some(&existing) = self.keys.get(key) {
            log::warn!("Light '{}' already exists; returning the registered light", key);
            return Ok(existing);
        }

        let mut light = spec
            .build(key, self.config.shadow_map_size)
            .ok_or_else(|| ResourceError::UnknownLightType(spec.preset.clone()))?;
        if !self.config.enable_shadows {
            light.shadow = None;
        }

        let group = light.group.clone();
        let id = self.lights.insert(light);
        self.keys.insert(key.to_string(), id);
        self.order.push(id);
        self.groups.entry(group).or_default().push(id);
        log::debug!("Created light '{}' from preset '{}'", key, spec.preset);
        Ok(id)
    }

    /// Create a spotlight aimed at an artwork, registered under
    /// `artwork_spot_<artwork_id>` in the "artworks" group
    pub fn create_artwork_spotlight(
        &mut self,
        artwork_id: &str,
        position: Vec3,
        target: Vec3,
    ) -> Result<LightId, ResourceError> {
        let spec = LightSpec::preset("spotlight")
            .color(0xffffff)
            .intensity(1.5)
            .position(position)
            .target(target)
            .cone(PI / 8.0, 0.5)
            .distance(8.0)
            .shadow(false)
            .group(ARTWORK_GROUP);
        self.create_light(&format!("artwork_spot_{artwork_id}"), &spec)
    }

    // ===== Lookup =====

    /// Light by id
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id)
    }

    /// Light by id, for mutation
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id)
    }

    /// Id registered under `key`
    pub fn id_for(&self, key: &str) -> Option<LightId> {
        self.keys.get(key).copied()
    }

    /// Light registered under `key`
    pub fn get(&self, key: &str) -> Option<&Light> {
        self.id_for(key).and_then(|id| self.lights.get(id))
    }

    /// Whether the id still resolves
    pub fn contains(&self, id: LightId) -> bool {
        self.lights.contains_key(id)
    }

    /// Members of a group, in creation order
    pub fn group(&self, name: &str) -> &[LightId] {
        self.groups.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every light in creation order
    pub fn iter(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.order
            .iter()
            .filter_map(move |&id| self.lights.get(id).map(|light| (id, light)))
    }

    /// Number of registered lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether no light is registered
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    // ===== Updates =====

    /// Apply a partial update to the light under `key`
    pub fn update_light(&mut self, key: &str, update: &LightUpdate) -> Result<(), ResourceError> {
        let light = self
            .id_for(key)
            .and_then(|id| self.lights.get_mut(id))
            .ok_or_else(|| ResourceError::UnknownLightKey(key.to_string()))?;
        if let Some(color) = update.color {
            light.color = color;
        }
        if let Some(intensity) = update.intensity {
            light.intensity = intensity;
        }
        if let Some(position) = update.position {
            light.position = position;
        }
        if let Some(target) = update.target {
            light.target = Some(target);
        }
        Ok(())
    }

    /// Set the intensity of every light in `group`; returns how many changed
    pub fn set_group_intensity(&mut self, group: &str, intensity: f32) -> usize {
        self.for_group(group, |light| light.intensity = intensity)
    }

    /// Set the colour of every light in `group`; returns how many changed
    pub fn set_group_color(&mut self, group: &str, color: Color) -> usize {
        self.for_group(group, |light| light.color = color)
    }

    fn for_group(&mut self, group: &str, mut apply: impl FnMut(&mut Light)) -> usize {
        let Some(members) = self.groups.get(group) else {
            return 0;
        };
        let mut changed = 0;
        for &id in members {
            if let Some(light) = self.lights.get_mut(id) {
                apply(light);
                changed += 1;
            }
        }
        changed
    }

    /// Ramp every light in `group` to `intensity` over `duration` seconds.
    /// Each ramp joins `completion` when given.
    pub fn animate_group_intensity(
        &self,
        scheduler: &mut AnimationScheduler,
        group: &str,
        intensity: f32,
        duration: f32,
        owner: AnimationOwner,
        completion: Option<AnimationGroupId>,
    ) -> usize {
        let mut started = 0;
        for &id in self.group(group) {
            let Some(light) = self.lights.get(id) else {
                continue;
            };
            let mut spec = AnimationSpec::scalar(AnimationTarget::LightIntensity(id), light.intensity, intensity, duration)
                .with_easing(Easing::QuadInOut)
                .owned_by(owner);
            if let Some(completion) = completion {
                spec = spec.in_group(completion);
            }
            scheduler.animate(spec);
            started += 1;
        }
        started
    }

    /// Apply a named atmosphere to the "ambient" and "main" groups
    pub fn set_scene_mood(&mut self, mood: SceneMood) {
        let (ambient_color, ambient_intensity, main_color, main_intensity) = mood.settings();
        self.set_group_color(AMBIENT_GROUP, Color::from_hex(ambient_color));
        self.set_group_intensity(AMBIENT_GROUP, ambient_intensity);
        self.set_group_color(MAIN_GROUP, Color::from_hex(main_color));
        self.set_group_intensity(MAIN_GROUP, main_intensity);
        log::info!("Scene mood set to {:?}", mood);
    }

    // ===== Removal =====

    /// Remove the light under `key`
    pub fn remove_light(&mut self, key: &str) -> Result<(), ResourceError> {
        let id = self
            .id_for(key)
            .ok_or_else(|| ResourceError::UnknownLightKey(key.to_string()))?;
        self.remove_id(id);
        Ok(())
    }

    /// Remove a light by id; returns whether it existed
    pub fn remove_id(&mut self, id: LightId) -> bool {
        let Some(light) = self.lights.remove(id) else {
            return false;
        };
        self.keys.remove(&light.key);
        self.order.retain(|other| *other != id);
        if let Some(members) = self.groups.get_mut(&light.group) {
            members.retain(|other| *other != id);
            if members.is_empty() {
                self.groups.remove(&light.group);
            }
        }
        log::trace!("Removed light '{}'", light.key);
        true
    }

    /// Remove every light in `group`; returns the removed ids
    pub fn remove_group(&mut self, group: &str) -> Vec<LightId> {
        let members = self.groups.get(group).cloned().unwrap_or_default();
        for &id in &members {
            self.remove_id(id);
        }
        members
    }

    /// Remove every light
    pub fn clear(&mut self) {
        let count = self.lights.len();
        self.lights.clear();
        self.keys.clear();
        self.order.clear();
        self.groups.clear();
        log::debug!("Cleared {} lights", count);
    }

    // ===== Performance caps =====

    /// Keep shadows on the first `max_shadow_lights` casters and strip them
    /// from the rest; returns how many were demoted
    pub fn optimize_shadows(&mut self) -> usize {
        let budget = if self.config.enable_shadows {
            self.config.max_shadow_lights
        } else {
            0
        };
        let mut kept = 0;
        let mut demoted = 0;
        for &id in &self.order {
            let Some(light) = self.lights.get_mut(id) else {
                continue;
            };
            if !light.casts_shadow() {
                continue;
            }
            if kept < budget {
                kept += 1;
            } else {
                light.shadow = None;
                demoted += 1;
            }
        }
        if demoted > 0 {
            log::info!("Disabled shadows on {} lights over the budget of {}", demoted, budget);
        }
        demoted
    }

    /// Remove point lights beyond `max_point_lights`; returns the removed ids
    pub fn limit_point_lights(&mut self) -> Vec<LightId> {
        self.limit_kind(self.config.max_point_lights, |kind| matches!(kind, LightKind::Point { .. }))
    }

    /// Remove spot lights beyond `max_spot_lights`; returns the removed ids
    pub fn limit_spot_lights(&mut self) -> Vec<LightId> {
        self.limit_kind(self.config.max_spot_lights, |kind| matches!(kind, LightKind::Spot { .. }))
    }

    fn limit_kind(&mut self, cap: usize, is_kind: impl Fn(&LightKind) -> bool) -> Vec<LightId> {
        let excess: Vec<LightId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.lights.get(id).is_some_and(|light| is_kind(&light.kind)))
            .skip(cap)
            .collect();
        for &id in &excess {
            self.remove_id(id);
        }
        if !excess.is_empty() {
            log::info!("Removed {} lights over the cap of {}", excess.len(), cap);
        }
        excess
    }

    /// Apply every cap; returns the ids of removed lights
    pub fn enforce_caps(&mut self) -> Vec<LightId> {
        let mut removed = self.limit_point_lights();
        removed.extend(self.limit_spot_lights());
        self.optimize_shadows();
        removed
    }

    /// Light counts
    pub fn stats(&self) -> LightStats {
        let mut stats = LightStats {
            total: self.lights.len(),
            groups: self.groups.len(),
            ..LightStats::default()
        };
        for light in self.lights.values() {
            match light.kind {
                LightKind::Ambient => stats.ambient += 1,
                LightKind::Directional => stats.directional += 1,
                LightKind::Point { .. } => stats.point += 1,
                LightKind::Spot { .. } => stats.spot += 1,
                LightKind::Hemisphere { .. } => stats.hemisphere += 1,
            }
            if light.casts_shadow() {
                stats.shadow_casters += 1;
            }
        }
        stats
    }
}

impl Default for LightManager {
    fn default() -> Self {
        Self::new(LightingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lit_manager() -> LightManager {
        let mut manager = LightManager::default();
        manager
            .create_light("hall-ambient", &LightSpec::preset("ambient").group(AMBIENT_GROUP))
            .expect("preset");
        manager
            .create_light("hall-main", &LightSpec::preset("main").group(MAIN_GROUP))
            .expect("preset");
        for i in 0..3 {
            manager
                .create_artwork_spotlight(&i.to_string(), Vec3::new(0.0, 5.0, 2.0), Vec3::zeros())
                .expect("preset");
        }
        manager
    }

    #[test]
    fn test_group_intensity_changes_only_members() {
        let mut manager = lit_manager();
        let changed = manager.set_group_intensity(ARTWORK_GROUP, 0.5);
        assert_eq!(changed, 3);
        for &id in manager.group(ARTWORK_GROUP) {
            assert_relative_eq!(manager.light(id).expect("live").intensity, 0.5);
        }
        assert_relative_eq!(manager.get("hall-ambient").expect("live").intensity, 0.4);
        assert_relative_eq!(manager.get("hall-main").expect("live").intensity, 0.8);
    }

    #[test]
    fn test_artwork_spotlight_defaults() {
        let mut manager = LightManager::default();
        let id = manager
            .create_artwork_spotlight("7", Vec3::new(1.0, 5.0, 0.0), Vec3::new(1.0, 2.0, -7.9))
            .expect("preset");
        let light = manager.light(id).expect("live");
        assert_eq!(light.key, "artwork_spot_7");
        assert_eq!(light.group, ARTWORK_GROUP);
        assert!(!light.casts_shadow());
        match light.kind {
            LightKind::Spot { angle, penumbra, distance, .. } => {
                assert_relative_eq!(angle, PI / 8.0);
                assert_relative_eq!(penumbra, 0.5);
                assert_relative_eq!(distance, 8.0);
            }
            other => panic!("expected a spot light, got {other:?}"),
        }
    }

    #[test]
    fn test_existing_key_returns_same_light() {
        let mut manager = LightManager::default();
        let first = manager.create_light("a", &LightSpec::preset("point")).expect("preset");
        let second = manager
            .create_light("a", &LightSpec::preset("ambient").intensity(9.0))
            .expect("existing");
        assert_eq!(first, second);
        assert_eq!(manager.len(), 1);
        assert!(matches!(manager.get("a").expect("live").kind, LightKind::Point { .. }));
    }

    #[test]
    fn test_unknown_light_type_is_rejected() {
        let mut manager = LightManager::default();
        let result = manager.create_light("laser", &LightSpec::preset("laser"));
        assert!(matches!(result, Err(ResourceError::UnknownLightType(kind)) if kind == "laser"));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_spot_cap_keeps_oldest() {
        let mut manager = LightManager::new(LightingConfig {
            max_spot_lights: 2,
            ..LightingConfig::default()
        });
        let ids: Vec<LightId> = (0..4)
            .map(|i| manager.create_light(&format!("s{i}"), &LightSpec::preset("spot")).expect("preset"))
            .collect();

        let removed = manager.limit_spot_lights();
        assert_eq!(removed, ids[2..].to_vec());
        assert!(manager.contains(ids[0]) && manager.contains(ids[1]));
        assert!(manager.id_for("s3").is_none());
    }

    #[test]
    fn test_shadow_budget_demotes_later_casters() {
        let mut manager = LightManager::new(LightingConfig {
            max_shadow_lights: 1,
            ..LightingConfig::default()
        });
        manager.create_light("key", &LightSpec::preset("main")).expect("preset");
        manager.create_light("spot", &LightSpec::preset("spotlight")).expect("preset");
        assert_eq!(manager.stats().shadow_casters, 2);

        assert_eq!(manager.optimize_shadows(), 1);
        assert!(manager.get("key").expect("live").casts_shadow());
        assert!(!manager.get("spot").expect("live").casts_shadow());
    }

    #[test]
    fn test_scene_mood_updates_ambient_and_main() {
        let mut manager = lit_manager();
        manager.set_scene_mood(SceneMood::Dramatic);

        let ambient = manager.get("hall-ambient").expect("live");
        assert_eq!(ambient.color.to_hex(), 0x000000);
        assert_relative_eq!(ambient.intensity, 0.1);
        let main = manager.get("hall-main").expect("live");
        assert_relative_eq!(main.intensity, 1.2);
        assert_eq!(SceneMood::from_name("soft"), Some(SceneMood::Soft));
    }

    #[test]
    fn test_remove_group_forgets_keys() {
        let mut manager = lit_manager();
        let removed = manager.remove_group(ARTWORK_GROUP);
        assert_eq!(removed.len(), 3);
        assert!(manager.group(ARTWORK_GROUP).is_empty());
        assert!(manager.id_for("artwork_spot_0").is_none());
        assert_eq!(manager.stats().total, 2);
    }

    #[test]
    fn test_group_ramp_goes_through_scheduler() {
        let manager = lit_manager();
        let mut scheduler = AnimationScheduler::new();
        let started =
            manager.animate_group_intensity(&mut scheduler, ARTWORK_GROUP, 0.0, 1.0, AnimationOwner::Engine, None);
        assert_eq!(started, 3);
        assert_eq!(scheduler.active_count(), 3);
    }
}
