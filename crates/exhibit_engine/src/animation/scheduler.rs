//! Tween scheduler
//!
//! Every time-based change in the engine (fades, highlight scaling, light
//! ramps, camera flights) is a record in one [`AnimationScheduler`]. The
//! scheduler never touches the scene itself: [`AnimationScheduler::advance`]
//! produces samples and the engine context applies them. That keeps the
//! ownership rules simple. Whoever destroys a node first cancels every
//! animation that targets it, so no sample can outlive its target.
//!
//! Animations may join a completion group. The group's tag is reported once
//! every member has run to the end; a group that lost a member to
//! cancellation never reports.

use slotmap::SlotMap;

use crate::animation::easing::Easing;
use crate::foundation::collections::{AnimationGroupId, AnimationId, LightId, NodeId};
use crate::foundation::math::{utils, Vec3};

/// Property an animation drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    /// Opacity multiplier of a scene node
    NodeOpacity(NodeId),
    /// Uniform scale of a scene node
    NodeScale(NodeId),
    /// Intensity of a light
    LightIntensity(LightId),
    /// Camera position
    CameraPosition,
    /// Camera look-at point
    CameraTarget,
}

impl AnimationTarget {
    /// Whether this target belongs to `node`
    pub fn touches_node(&self, node: NodeId) -> bool {
        matches!(*self, Self::NodeOpacity(id) | Self::NodeScale(id) if id == node)
    }

    /// Whether this target belongs to `light`
    pub fn touches_light(&self, light: LightId) -> bool {
        matches!(*self, Self::LightIntensity(id) if id == light)
    }

    /// Whether this target is part of the camera
    pub const fn is_camera(&self) -> bool {
        matches!(self, Self::CameraPosition | Self::CameraTarget)
    }
}

/// Value carried by an animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatedValue {
    /// Single number
    Scalar(f32),
    /// 3-component vector
    Vector(Vec3),
}

impl AnimatedValue {
    /// Interpolate toward `other`; mismatched kinds jump to `other`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(utils::lerp(a, b, t)),
            (Self::Vector(a), Self::Vector(b)) => Self::Vector(utils::lerp_vec3(a, b, t)),
            (_, other) => other,
        }
    }

    /// Scalar payload, if any
    pub const fn as_scalar(self) -> Option<f32> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Vector(_) => None,
        }
    }

    /// Vector payload, if any
    pub const fn as_vector(self) -> Option<Vec3> {
        match self {
            Self::Vector(value) => Some(value),
            Self::Scalar(_) => None,
        }
    }
}

/// Subsystem an animation belongs to, used for bulk cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationOwner {
    /// Scene manager (transitions, camera commands)
    Engine,
    /// Hall instance with the given serial number
    Hall(u64),
    /// Hover/selection highlights and popups
    Interaction,
    /// Camera flights started by navigation
    Navigation,
}

/// Event reported when a completion group finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTag {
    /// Outgoing hall faded to black
    FadeOutFinished,
    /// Intro of the hall with this serial number finished
    IntroFinished(u64),
    /// Incoming hall fully faded in
    FadeInFinished,
    /// Camera flight finished
    CameraFlightFinished,
    /// A light group reached its new intensity
    LightRampFinished,
}

/// Parameters of one animation
#[derive(Debug, Clone, Copy)]
pub struct AnimationSpec {
    /// Property to drive
    pub target: AnimationTarget,
    /// Value at the start
    pub from: AnimatedValue,
    /// Value at the end
    pub to: AnimatedValue,
    /// Length in seconds; zero completes on the next advance
    pub duration: f32,
    /// Curve
    pub easing: Easing,
    /// Owning subsystem
    pub owner: AnimationOwner,
    /// Completion group to join
    pub group: Option<AnimationGroupId>,
}

impl AnimationSpec {
    /// Scalar animation owned by the engine
    pub const fn scalar(target: AnimationTarget, from: f32, to: f32, duration: f32) -> Self {
        Self::new(target, AnimatedValue::Scalar(from), AnimatedValue::Scalar(to), duration)
    }

    /// Vector animation owned by the engine
    pub const fn vector(target: AnimationTarget, from: Vec3, to: Vec3, duration: f32) -> Self {
        Self::new(target, AnimatedValue::Vector(from), AnimatedValue::Vector(to), duration)
    }

    const fn new(target: AnimationTarget, from: AnimatedValue, to: AnimatedValue, duration: f32) -> Self {
        Self {
            target,
            from,
            to,
            duration,
            easing: Easing::QuadInOut,
            owner: AnimationOwner::Engine,
            group: None,
        }
    }

    /// Set the curve
    pub const fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the owner
    pub const fn owned_by(mut self, owner: AnimationOwner) -> Self {
        self.owner = owner;
        self
    }

    /// Join a completion group
    pub const fn in_group(mut self, group: AnimationGroupId) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Debug)]
struct Animation {
    spec: AnimationSpec,
    elapsed: f32,
}

#[derive(Debug)]
struct CompletionGroup {
    tag: CompletionTag,
    remaining: usize,
    broken: bool,
}

/// Value produced for one target during an advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSample {
    /// Property to write
    pub target: AnimationTarget,
    /// Value to write
    pub value: AnimatedValue,
}

/// Output of one [`AnimationScheduler::advance`]
#[derive(Debug, Default)]
pub struct AnimationFrame {
    /// Values to apply, in animation start order
    pub samples: Vec<AnimationSample>,
    /// Groups that finished during this advance
    pub completed: Vec<CompletionTag>,
}

/// Owner of every running animation
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Animation>,
    order: Vec<AnimationId>,
    groups: SlotMap<AnimationGroupId, CompletionGroup>,
}

impl AnimationScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a completion group. A group nobody joins reports on the next
    /// advance.
    pub fn begin_group(&mut self, tag: CompletionTag) -> AnimationGroupId {
        self.groups.insert(CompletionGroup {
            tag,
            remaining: 0,
            broken: false,
        })
    }

    /// Start an animation. A running animation on the same target is
    /// cancelled first, so the newest request always wins.
    pub fn animate(&mut self, spec: AnimationSpec) -> AnimationId {
        self.cancel_where(|target| *target == spec.target);

        let mut spec = spec;
        if let Some(group) = spec.group {
            match self.groups.get_mut(group) {
                Some(group) => group.remaining += 1,
                None => {
                    log::warn!("Animation joined a completion group that no longer exists");
                    spec.group = None;
                }
            }
        }

        let id = self.animations.insert(Animation { spec, elapsed: 0.0 });
        self.order.push(id);
        id
    }

    /// Step every animation by `dt` seconds
    pub fn advance(&mut self, dt: f32) -> AnimationFrame {
        let mut frame = AnimationFrame::default();
        let mut finished = Vec::new();

        for &id in &self.order {
            let Some(animation) = self.animations.get_mut(id) else {
                continue;
            };
            animation.elapsed += dt.max(0.0);
            let spec = &animation.spec;
            let t = if spec.duration <= 0.0 {
                1.0
            } else {
                (animation.elapsed / spec.duration).min(1.0)
            };
            let value = if t >= 1.0 {
                spec.to
            } else {
                spec.from.lerp(spec.to, spec.easing.apply(t))
            };
            frame.samples.push(AnimationSample {
                target: spec.target,
                value,
            });
            if t >= 1.0 {
                finished.push(id);
            }
        }

        for id in finished {
            if let Some(animation) = self.animations.remove(id) {
                self.release_member(animation.spec.group, false);
            }
        }
        self.order.retain(|id| self.animations.contains_key(*id));

        let done: Vec<AnimationGroupId> = self
            .groups
            .iter()
            .filter(|(_, group)| group.remaining == 0)
            .map(|(id, _)| id)
            .collect();
        for id in done {
            if let Some(group) = self.groups.remove(id) {
                if group.broken {
                    log::debug!("Dropping cancelled completion group {:?}", group.tag);
                } else {
                    frame.completed.push(group.tag);
                }
            }
        }

        frame
    }

    fn release_member(&mut self, group: Option<AnimationGroupId>, cancelled: bool) {
        let Some(group) = group.and_then(|id| self.groups.get_mut(id)) else {
            return;
        };
        group.remaining = group.remaining.saturating_sub(1);
        group.broken |= cancelled;
    }

    /// Stop one animation without completing it
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        let Some(animation) = self.animations.remove(id) else {
            return false;
        };
        self.order.retain(|other| *other != id);
        self.release_member(animation.spec.group, true);
        true
    }

    /// Stop every animation matching `predicate`; returns how many stopped
    pub fn cancel_where(&mut self, predicate: impl Fn(&AnimationTarget) -> bool) -> usize {
        self.cancel_matching(|animation| predicate(&animation.spec.target))
    }

    /// Stop every animation started by `owner`
    pub fn cancel_owner(&mut self, owner: AnimationOwner) -> usize {
        self.cancel_matching(|animation| animation.spec.owner == owner)
    }

    /// Drop a completion group so it never reports, even if all of its
    /// members finish
    pub fn abandon_group(&mut self, group: AnimationGroupId) {
        if let Some(group) = self.groups.get_mut(group) {
            group.broken = true;
        }
    }

    fn cancel_matching(&mut self, predicate: impl Fn(&Animation) -> bool) -> usize {
        let doomed: Vec<AnimationId> = self
            .animations
            .iter()
            .filter(|(_, animation)| predicate(animation))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.cancel(id);
        }
        doomed.len()
    }

    /// Whether any animation drives `target`
    pub fn is_animating(&self, target: AnimationTarget) -> bool {
        self.animations.values().any(|animation| animation.spec.target == target)
    }

    /// Whether `owner` has animations running
    pub fn has_owner(&self, owner: AnimationOwner) -> bool {
        self.animations.values().any(|animation| animation.spec.owner == owner)
    }

    /// Number of running animations
    pub fn active_count(&self) -> usize {
        self.animations.len()
    }

    /// Whether `group` can still report: it is open and lost no member
    pub fn is_group_live(&self, group: AnimationGroupId) -> bool {
        self.groups.get(group).is_some_and(|group| !group.broken)
    }

    /// Number of groups still waiting to report
    pub fn pending_groups(&self) -> usize {
        self.groups.len()
    }

    /// Drop every animation and group without reporting
    pub fn clear(&mut self) {
        self.animations.clear();
        self.order.clear();
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    fn node(n: u64) -> NodeId {
        NodeId::from(KeyData::from_ffi(n))
    }

    fn scalar_of(frame: &AnimationFrame, target: AnimationTarget) -> Option<f32> {
        frame
            .samples
            .iter()
            .rev()
            .find(|sample| sample.target == target)
            .and_then(|sample| sample.value.as_scalar())
    }

    #[test]
    fn test_linear_progress_and_completion() {
        let mut scheduler = AnimationScheduler::new();
        let target = AnimationTarget::NodeOpacity(node(1));
        scheduler.animate(AnimationSpec::scalar(target, 0.0, 1.0, 1.0).with_easing(Easing::Linear));

        let frame = scheduler.advance(0.25);
        assert_relative_eq!(scalar_of(&frame, target).expect("sampled"), 0.25, epsilon = 1e-6);
        assert_eq!(scheduler.active_count(), 1);

        let frame = scheduler.advance(1.0);
        assert_relative_eq!(scalar_of(&frame, target).expect("sampled"), 1.0);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_group_reports_once_all_members_finish() {
        let mut scheduler = AnimationScheduler::new();
        let group = scheduler.begin_group(CompletionTag::FadeOutFinished);
        scheduler.animate(AnimationSpec::scalar(AnimationTarget::NodeOpacity(node(1)), 1.0, 0.0, 0.5).in_group(group));
        scheduler.animate(AnimationSpec::scalar(AnimationTarget::NodeOpacity(node(2)), 1.0, 0.0, 1.0).in_group(group));

        assert!(scheduler.advance(0.6).completed.is_empty());
        let frame = scheduler.advance(0.6);
        assert_eq!(frame.completed, vec![CompletionTag::FadeOutFinished]);
        assert!(scheduler.advance(0.1).completed.is_empty());
    }

    #[test]
    fn test_empty_group_reports_on_next_advance() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.begin_group(CompletionTag::IntroFinished(3));
        assert_eq!(scheduler.advance(0.0).completed, vec![CompletionTag::IntroFinished(3)]);
    }

    #[test]
    fn test_cancelled_group_never_reports() {
        let mut scheduler = AnimationScheduler::new();
        let group = scheduler.begin_group(CompletionTag::IntroFinished(1));
        scheduler.animate(
            AnimationSpec::scalar(AnimationTarget::NodeOpacity(node(1)), 0.0, 1.0, 1.0)
                .owned_by(AnimationOwner::Hall(1))
                .in_group(group),
        );
        scheduler.animate(AnimationSpec::scalar(AnimationTarget::NodeScale(node(2)), 1.0, 2.0, 0.1).in_group(group));

        assert!(scheduler.is_group_live(group));
        assert_eq!(scheduler.cancel_owner(AnimationOwner::Hall(1)), 1);
        assert!(!scheduler.is_group_live(group));
        let frame = scheduler.advance(1.0);
        assert!(frame.completed.is_empty());
        assert_eq!(scheduler.pending_groups(), 0);
    }

    #[test]
    fn test_new_animation_replaces_one_on_same_target() {
        let mut scheduler = AnimationScheduler::new();
        let target = AnimationTarget::NodeScale(node(4));
        scheduler.animate(AnimationSpec::scalar(target, 1.0, 1.05, 0.3));
        scheduler.animate(AnimationSpec::scalar(target, 1.05, 1.0, 0.3));
        assert_eq!(scheduler.active_count(), 1);

        let frame = scheduler.advance(1.0);
        assert_eq!(frame.samples.len(), 1);
        assert_relative_eq!(scalar_of(&frame, target).expect("sampled"), 1.0);
    }

    #[test]
    fn test_replacing_a_member_breaks_its_group() {
        let mut scheduler = AnimationScheduler::new();
        let group = scheduler.begin_group(CompletionTag::IntroFinished(2));
        scheduler.animate(
            AnimationSpec::vector(AnimationTarget::CameraPosition, Vec3::zeros(), Vec3::new(0.0, 2.0, 8.0), 1.0)
                .in_group(group),
        );
        scheduler.animate(AnimationSpec::vector(
            AnimationTarget::CameraPosition,
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
            0.5,
        ));

        assert!(!scheduler.is_group_live(group));
        assert!(scheduler.advance(1.0).completed.is_empty());
        assert!(!scheduler.is_group_live(group));
    }

    #[test]
    fn test_cancel_where_matches_node_targets() {
        let mut scheduler = AnimationScheduler::new();
        let doomed = node(7);
        scheduler.animate(AnimationSpec::scalar(AnimationTarget::NodeOpacity(doomed), 0.0, 1.0, 1.0));
        scheduler.animate(AnimationSpec::scalar(AnimationTarget::NodeScale(doomed), 1.0, 1.1, 1.0));
        scheduler.animate(AnimationSpec::vector(
            AnimationTarget::CameraPosition,
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            1.0,
        ));

        assert_eq!(scheduler.cancel_where(|target| target.touches_node(doomed)), 2);
        assert!(scheduler.is_animating(AnimationTarget::CameraPosition));
        assert!(!scheduler.is_animating(AnimationTarget::NodeOpacity(doomed)));
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let mut scheduler = AnimationScheduler::new();
        let target = AnimationTarget::CameraTarget;
        scheduler.animate(AnimationSpec::vector(target, Vec3::zeros(), Vec3::new(0.0, 4.0, 30.0), 0.0));
        let frame = scheduler.advance(0.0);
        assert_eq!(frame.samples[0].value.as_vector(), Some(Vec3::new(0.0, 4.0, 30.0)));
        assert_eq!(scheduler.active_count(), 0);
    }
}
