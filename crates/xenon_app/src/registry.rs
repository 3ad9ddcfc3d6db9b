//! Diagnostics registry
//!
//! An application-owned list of live UI roots for debugging tools: scene
//! graph dumps, element lookup and health checks. Entries hold weak
//! references, so registering a root never keeps it alive.

use std::rc::Weak;

use serde::Serialize;
use slotmap::{new_key_type, SlotMap};
use xenon_core::{Rect, SceneRoot, SceneSnapshot, Viewport};

use crate::binding::RenderBinding;
use crate::error::Result;

new_key_type! {
    /// Handle for a registered root
    pub struct RegistryKey;
}

/// Point-in-time view of a binding
#[derive(Clone, Debug)]
pub(crate) struct Inspection {
    pub ready: bool,
    pub dirty: bool,
    pub viewport: Viewport,
    pub frames: u64,
    pub snapshot: Option<SceneSnapshot>,
}

/// Type-erased read access to a binding
pub(crate) trait Inspect {
    /// `None` while the binding is borrowed elsewhere
    fn inspect(&self) -> Option<Inspection>;
}

struct Entry {
    label: String,
    target: Weak<dyn Inspect>,
}

/// Scene of one registered root
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RootSnapshot {
    pub label: String,
    pub scene: SceneSnapshot,
}

/// Health summary of one registered root
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RootDiagnostics {
    pub label: String,
    /// The binding still exists
    pub alive: bool,
    /// A root is mounted
    pub ready: bool,
    pub dirty: bool,
    pub node_count: usize,
    pub frames: u64,
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

/// Registry of live UI roots
#[derive(Default)]
pub struct XenonRegistry {
    entries: SlotMap<RegistryKey, Entry>,
}

impl XenonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: SceneRoot + 'static>(
        &mut self,
        label: impl Into<String>,
        binding: &RenderBinding<R>,
    ) -> RegistryKey {
        let label = label.into();
        tracing::debug!(%label, "root registered");
        self.entries.insert(Entry {
            label,
            target: binding.inspector(),
        })
    }

    pub fn unregister(&mut self, key: RegistryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose binding is gone, returning how many were removed
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.target.strong_count() > 0);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned dead roots");
        }
        removed
    }

    fn inspections(&self) -> impl Iterator<Item = (&str, Option<Inspection>)> + '_ {
        self.entries.values().map(|entry| {
            let inspection = entry.target.upgrade().and_then(|target| target.inspect());
            (entry.label.as_str(), inspection)
        })
    }

    /// Scenes of every live, mounted root
    pub fn snapshot(&self) -> Vec<RootSnapshot> {
        self.inspections()
            .filter_map(|(label, inspection)| {
                let scene = inspection?.snapshot?;
                Some(RootSnapshot {
                    label: label.to_string(),
                    scene,
                })
            })
            .collect()
    }

    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Text dump of every scene graph, also logged at info level
    pub fn print_scene_graph(&self) -> String {
        let mut out = String::new();
        for root in self.snapshot() {
            out.push_str(&format!("== {} ==\n", root.label));
            out.push_str(&root.scene.render_tree());
        }
        tracing::info!("scene graph:\n{out}");
        out
    }

    /// Absolute bounds of the first element with `id` in any root
    pub fn element_position(&self, id: &str) -> Option<Rect> {
        self.snapshot()
            .iter()
            .find_map(|root| root.scene.find(id).map(|node| node.bounds))
    }

    pub fn diagnose(&self) -> Vec<RootDiagnostics> {
        self.entries
            .values()
            .map(|entry| {
                let target = entry.target.upgrade();
                let alive = target.is_some();
                let inspection = target.and_then(|target| target.inspect());
                let Some(inspection) = inspection else {
                    if alive {
                        tracing::warn!(label = %entry.label, "root busy during diagnosis");
                    }
                    return RootDiagnostics {
                        label: entry.label.clone(),
                        alive,
                        ready: false,
                        dirty: false,
                        node_count: 0,
                        frames: 0,
                        width: 0.0,
                        height: 0.0,
                        dpr: 0.0,
                    };
                };
                RootDiagnostics {
                    label: entry.label.clone(),
                    alive,
                    ready: inspection.ready,
                    dirty: inspection.dirty,
                    node_count: inspection.snapshot.as_ref().map_or(0, |s| s.node_count()),
                    frames: inspection.frames,
                    width: inspection.viewport.width,
                    height: inspection.viewport.height,
                    dpr: inspection.viewport.dpr,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::OffscreenSurface;
    use xenon_core::Color;
    use xenon_layout::{div, RenderTree};
    use xenon_platform::FrameTime;

    fn mounted(width: u32) -> RenderBinding<RenderTree> {
        let binding = RenderBinding::new(OffscreenSurface::new(width, 50, 1.0).unwrap());
        let ui = div().child(div().id("play").size(20.0, 10.0).bg(Color::GREEN));
        binding.mount(RenderTree::from_element(ui, Default::default()).unwrap());
        binding
    }

    #[test]
    fn test_snapshot_and_lookup() {
        let mut registry = XenonRegistry::new();
        let a = mounted(100);
        registry.register("panel", &a);
        a.run_pipeline(FrameTime { timestamp_ms: 0.0, frame: 1 }).unwrap();

        let snapshots = registry.snapshot();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].label, "panel");
        assert_eq!(
            registry.element_position("play"),
            Some(Rect::new(0.0, 0.0, 20.0, 10.0))
        );
        assert_eq!(registry.element_position("missing"), None);

        let json = registry.snapshot_json().unwrap();
        assert!(json.contains("\"play\""));
        assert!(registry.print_scene_graph().contains("div#play"));
    }

    #[test]
    fn test_diagnose_and_prune() {
        let mut registry = XenonRegistry::new();
        let a = mounted(100);
        let b = mounted(80);
        registry.register("a", &a);
        registry.register("b", &b);

        a.run_pipeline(FrameTime { timestamp_ms: 0.0, frame: 1 }).unwrap();
        drop(b);

        let report = registry.diagnose();
        assert_eq!(report.len(), 2);
        assert!(report[0].alive && report[0].ready);
        assert_eq!(report[0].node_count, 2);
        assert_eq!(report[0].frames, 1);
        assert_eq!((report[0].width, report[0].height), (100.0, 50.0));
        assert!(!report[1].alive);

        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.prune(), 0);
    }
}
