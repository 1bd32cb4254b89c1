/// Collectible counters for one scene.
///
/// `collected` only ever grows and never passes `total`. Hearts are a
/// subset of the collectibles with their own counter and a one-shot
/// "all hearts" celebration.

use crate::domain::tile::{TileLayers, ZoneKind};

/// What a single pickup amounted to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collected {
    Item,
    Heart,
    /// The heart that completed the set; the love message is due.
    LastHeart,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionTracker {
    pub total: usize,
    pub collected: usize,
    pub hearts_total: usize,
    pub hearts_collected: usize,
    love_shown: bool,
}

impl CollectionTracker {
    pub fn new(items: usize, hearts: usize) -> Self {
        CollectionTracker {
            total: items + hearts,
            collected: 0,
            hearts_total: hearts,
            hearts_collected: 0,
            love_shown: false,
        }
    }

    /// Count collectibles as loaded.
    pub fn from_layers(layers: &TileLayers) -> Self {
        CollectionTracker::new(
            layers.layer(ZoneKind::Item).count(),
            layers.layer(ZoneKind::HeartItem).count(),
        )
    }

    /// Record one pickup. `None` for non-collectible zones or a full tally.
    pub fn collect(&mut self, kind: ZoneKind) -> Option<Collected> {
        if !kind.is_collectible() || self.collected >= self.total {
            return None;
        }
        self.collected += 1;
        if kind != ZoneKind::HeartItem {
            return Some(Collected::Item);
        }
        self.hearts_collected = (self.hearts_collected + 1).min(self.hearts_total);
        if self.hearts_collected == self.hearts_total && !self.love_shown {
            self.love_shown = true;
            Some(Collected::LastHeart)
        } else {
            Some(Collected::Heart)
        }
    }

    pub fn all_collected(&self) -> bool {
        self.collected == self.total
    }
}
