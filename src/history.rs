//! Linear undo/redo over full element-collection snapshots.
//!
//! Snapshots are kept serialized (rmp-serde is compact) as a list with a
//! current index. The live [`ElementStore`] always equals the snapshot at
//! the current index; `push` truncates any redo branch, so history never
//! branches. One entry is recorded per committed mutation - continuous drags
//! coalesce into a single entry at gesture end.

use anyhow::Result;

use crate::element::ElementStore;

/// Maximum retained history entries
const MAX_HISTORY: usize = 100;

pub struct History {
    /// Serialized store snapshots; `snapshots[index]` mirrors the live store.
    snapshots: Vec<Vec<u8>>,
    index: usize,
}

impl History {
    /// Seed history with the store's current state so index 0 is always a
    /// valid undo target.
    pub fn new(store: &ElementStore) -> Result<Self> {
        Ok(Self {
            snapshots: vec![store.snapshot()?],
            index: 0,
        })
    }

    /// Record the store after a committed mutation. Any redo entries beyond
    /// the current index are discarded.
    pub fn push(&mut self, store: &ElementStore) -> Result<()> {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(store.snapshot()?);
        self.index += 1;

        while self.snapshots.len() > MAX_HISTORY {
            self.snapshots.remove(0);
            self.index -= 1;
        }
        Ok(())
    }

    /// Step back one entry and restore it into the live store. Returns false
    /// at the oldest entry.
    pub fn undo(&mut self, store: &mut ElementStore) -> Result<bool> {
        if self.index == 0 {
            return Ok(false);
        }
        self.index -= 1;
        *store = ElementStore::from_snapshot(&self.snapshots[self.index])?;
        Ok(true)
    }

    /// Step forward one entry. Returns false at the newest entry.
    pub fn redo(&mut self, store: &mut ElementStore) -> Result<bool> {
        if self.index + 1 >= self.snapshots.len() {
            return Ok(false);
        }
        self.index += 1;
        *store = ElementStore::from_snapshot(&self.snapshots[self.index])?;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// The live store must equal this snapshot at all times.
    #[cfg(test)]
    pub fn current_snapshot(&self) -> &[u8] {
        &self.snapshots[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind, ElementStore, Rgb, ShapeType, StrokeStyle};
    use crate::geometry::Rect;
    use proptest::prelude::*;

    fn rect_element(x: f32) -> Element {
        Element::new(
            0,
            Rect::new(x, 0.0, 10.0, 10.0),
            ElementKind::Shape {
                shape: ShapeType::Rectangle,
                stroke_color: Rgb::BLACK,
                fill_color: None,
                stroke_width: 1.0,
                stroke_style: StrokeStyle::Solid,
            },
        )
    }

    fn assert_live_matches_index(history: &History, store: &ElementStore) {
        let at_index = ElementStore::from_snapshot(history.current_snapshot()).unwrap();
        assert_eq!(&at_index, store);
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut store = ElementStore::new();
        let mut history = History::new(&store).unwrap();

        store.add(rect_element(1.0));
        history.push(&store).unwrap();
        let with_one = store.clone();

        assert!(history.undo(&mut store).unwrap());
        assert!(store.is_empty());
        assert!(history.redo(&mut store).unwrap());
        assert_eq!(store, with_one);
    }

    #[test]
    fn undo_at_start_and_redo_at_end_are_noops() {
        let mut store = ElementStore::new();
        let mut history = History::new(&store).unwrap();

        assert!(!history.undo(&mut store).unwrap());
        assert!(!history.redo(&mut store).unwrap());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn push_truncates_redo_branch() {
        let mut store = ElementStore::new();
        let mut history = History::new(&store).unwrap();

        store.add(rect_element(1.0));
        history.push(&store).unwrap();
        store.add(rect_element(2.0));
        history.push(&store).unwrap();

        assert!(history.undo(&mut store).unwrap());
        assert_eq!(store.len(), 1);

        // New mutation while an undone entry is pending: the redo branch dies.
        store.add(rect_element(3.0));
        history.push(&store).unwrap();
        assert!(!history.can_redo());

        assert!(history.redo(&mut store).is_ok_and(|did| !did));
        assert_eq!(store.len(), 2);
    }

    proptest! {
        // For any sequence of add/remove mutations and undo/redo steps, the
        // live store equals the snapshot at the current history index.
        #[test]
        fn live_store_always_matches_current_index(ops in prop::collection::vec(0u8..4, 1..40)) {
            let mut store = ElementStore::new();
            let mut history = History::new(&store).unwrap();
            let mut next_x = 0.0f32;

            for op in ops {
                match op {
                    0 => {
                        store.add(rect_element(next_x));
                        next_x += 1.0;
                        history.push(&store).unwrap();
                    }
                    1 => {
                        let first_id = store.iter().next().map(|el| el.id);
                        if let Some(id) = first_id {
                            store.remove(id);
                            history.push(&store).unwrap();
                        }
                    }
                    2 => {
                        history.undo(&mut store).unwrap();
                    }
                    _ => {
                        history.redo(&mut store).unwrap();
                    }
                }
                assert_live_matches_index(&history, &store);
            }
        }

        // undo immediately followed by redo restores the exact prior state.
        #[test]
        fn undo_redo_is_identity(count in 1usize..12) {
            let mut store = ElementStore::new();
            let mut history = History::new(&store).unwrap();
            for i in 0..count {
                store.add(rect_element(i as f32));
                history.push(&store).unwrap();
            }
            let before = store.clone();
            prop_assert!(history.undo(&mut store).unwrap());
            prop_assert!(history.redo(&mut store).unwrap());
            prop_assert_eq!(before, store);
        }
    }
}
