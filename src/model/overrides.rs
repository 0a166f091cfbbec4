use crate::common::collections::HashMap;
use crate::layout_engine::LayoutError;
use crate::model::{Rect, WindowId};

/// Cache mapping tiled windows to the geometry the engine last assigned them.
///
/// An observed geometry is diffed against this value to tell user-driven
/// changes apart from echoes of our own requests.
#[derive(Clone, Default, Debug)]
pub struct GeometryOverrides(HashMap<WindowId, Rect>);

impl GeometryOverrides {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, wid: WindowId, geometry: Rect) -> Option<Rect> {
        self.0.insert(wid, geometry)
    }

    pub fn get(&self, wid: WindowId) -> Option<Rect> { self.0.get(&wid).copied() }

    pub fn get_mut(&mut self, wid: WindowId) -> Option<&mut Rect> { self.0.get_mut(&wid) }

    /// Like [`get`](Self::get), for callers that believe `wid` is tiled.
    pub fn require(&self, wid: WindowId) -> Result<Rect, LayoutError> {
        self.get(wid).ok_or(LayoutError::MissingOverride(wid))
    }

    pub fn remove(&mut self, wid: WindowId) -> Option<Rect> { self.0.remove(&wid) }

    pub fn contains(&self, wid: WindowId) -> bool { self.0.contains_key(&wid) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn clear(&mut self) { self.0.clear(); }
}
