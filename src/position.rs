use std::sync::RwLock;

use crate::navdata::Coordinates;

/// Source of the aircraft's present position and true track
pub trait PositionProvider: Send + Sync {
    fn position(&self) -> Coordinates;

    fn true_track(&self) -> f64;
}

/// Position held in memory and updated by whoever owns it
#[derive(Debug)]
pub struct StaticPosition {
    state: RwLock<(Coordinates, f64)>,
}

impl StaticPosition {
    pub fn new(position: Coordinates, true_track: f64) -> Self {
        Self {
            state: RwLock::new((position, true_track)),
        }
    }

    pub fn set(&self, position: Coordinates, true_track: f64) {
        // A poisoned lock still holds a usable position
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = (position, true_track);
    }

    fn read(&self) -> (Coordinates, f64) {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl PositionProvider for StaticPosition {
    fn position(&self) -> Coordinates {
        self.read().0
    }

    fn true_track(&self) -> f64 {
        self.read().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_position() {
        let ppos = StaticPosition::new(Coordinates::new(10.0, 20.0), 90.0);
        ppos.set(Coordinates::new(11.0, 21.0), 180.0);
        assert_eq!(ppos.position(), Coordinates::new(11.0, 21.0));
        assert_eq!(ppos.true_track(), 180.0);
    }
}
