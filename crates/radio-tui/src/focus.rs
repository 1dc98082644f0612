//! FocusRing: keyboard focus cycling between panes.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_and_sets() {
        let mut ring = FocusRing::new(vec![ComponentId::StationList, ComponentId::NowPlaying]);
        assert!(ring.is_focused(ComponentId::StationList));
        assert_eq!(ring.next(), Some(ComponentId::NowPlaying));
        assert_eq!(ring.next(), Some(ComponentId::StationList));
        ring.set(ComponentId::NowPlaying);
        assert!(ring.is_focused(ComponentId::NowPlaying));
        ring.set(ComponentId::HelpOverlay);
        assert!(ring.is_focused(ComponentId::NowPlaying));
    }
}
