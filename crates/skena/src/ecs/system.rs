//! # System — Functions That Operate on the Scene
//!
//! A system is just a function that takes `&mut Scene` and the frame delta.
//! Systems are bucketed by [`Phase`] and run in the order they were
//! registered. There is no priority or dependency mechanism: registration
//! order is the schedule.
//!
//! ```text
//! simulate_scene(dt):  PreUpdate[0], PreUpdate[1], … Update[0], Update[1], …
//! render_scene(dt):    Render[0], Render[1], …
//! ```
//!
//! ## Reactive Systems
//!
//! A reactive system is a plain `fn(&mut Scene, EntityId)` attached to one
//! component type. [`Reaction::OnAdd`] callbacks fire right after the
//! component is constructed and its mask bit is set; [`Reaction::OnRemove`]
//! callbacks fire right before the bit is cleared and the value destroyed.

use super::entity::EntityId;
use super::scene::Scene;

/// Callback attached to a component type with
/// [`Scene::register_reactive_system`].
pub type ReactiveFn = fn(&mut Scene, EntityId);

/// Which edge of a component's lifetime a reactive system observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reaction {
    OnAdd,
    OnRemove,
}

/// Per-frame execution bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
pub enum Phase {
    PreUpdate,
    Update,
    Render,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::PreUpdate, Phase::Update, Phase::Render];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A system that can be executed on a [`Scene`].
///
/// Any `FnMut(&mut Scene, f32)` implements this trait, so plain functions and
/// closures both work.
pub trait System {
    fn run(&mut self, scene: &mut Scene, dt: f32);
}

impl<F: FnMut(&mut Scene, f32)> System for F {
    fn run(&mut self, scene: &mut Scene, dt: f32) {
        (self)(scene, dt);
    }
}

/// A boxed [`System`] with a short name for diagnostics.
struct NamedSystem {
    #[cfg(any(feature = "diagnostics", test))]
    name: String,
    system: Box<dyn System>,
}

/// Per-system timing recorded during a single run.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug, serde::Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// An ordered list of systems.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<NamedSystem>,
    /// Per-system timings from the most recent `run()` call.
    #[cfg(feature = "diagnostics")]
    pub(crate) timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to the end of the schedule.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(NamedSystem {
            #[cfg(any(feature = "diagnostics", test))]
            name: short_system_name(std::any::type_name::<S>()),
            system: Box::new(system),
        });
    }

    /// Move every system of `other` to the end of this schedule.
    pub(crate) fn append(&mut self, other: &mut Schedule) {
        self.systems.append(&mut other.systems);
    }

    /// Run all systems in order.
    pub fn run(&mut self, scene: &mut Scene, dt: f32) {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for ns in &mut self.systems {
                let start = std::time::Instant::now();
                ns.system.run(scene, dt);
                self.timings.push(SystemTiming {
                    name: ns.name.clone(),
                    duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for ns in &mut self.systems {
                ns.system.run(scene, dt);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last segment (e.g. `game::movement_system` → `movement_system`,
/// `{{closure}}` → `<closure>`).
#[cfg(any(feature = "diagnostics", test))]
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_system(_scene: &mut Scene, _dt: f32) {}

    #[test]
    fn schedule_captures_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(dummy_system);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.systems[0].name, "dummy_system");
    }

    #[test]
    fn closure_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(|_scene: &mut Scene, _dt: f32| {});
        assert_eq!(schedule.systems[0].name, "<closure>");
    }

    #[test]
    fn runs_in_registration_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut schedule = Schedule::new();
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            schedule.add_system(move |_: &mut Scene, dt: f32| log.borrow_mut().push((tag, dt)));
        }

        let mut scene = Scene::new();
        schedule.run(&mut scene, 0.5);
        assert_eq!(*log.borrow(), vec![("a", 0.5), ("b", 0.5), ("c", 0.5)]);
    }

    #[test]
    fn append_moves_systems() {
        let mut a = Schedule::new();
        let mut b = Schedule::new();
        a.add_system(dummy_system);
        b.add_system(dummy_system);
        b.add_system(dummy_system);
        a.append(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
    }
}
