/// Tile content tags and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ContentTag {
    #[default]
    None,
    Floor,
    Ladder,
    Egg,
    Grain,
}

impl ContentTag {
    /// Walls and standing surfaces.
    pub fn is_floor(self) -> bool {
        matches!(self, ContentTag::Floor)
    }

    pub fn is_ladder(self) -> bool {
        matches!(self, ContentTag::Ladder)
    }

    /// Something Harry can stand on without falling (floor or a ladder top).
    pub fn is_support(self) -> bool {
        matches!(self, ContentTag::Floor | ContentTag::Ladder)
    }

    /// Eggs and grain: removed when eaten, never restored within a level.
    pub fn is_consumable(self) -> bool {
        matches!(self, ContentTag::Egg | ContentTag::Grain)
    }

    /// Empty space or a consumable; nothing to stand on.
    pub fn is_open(self) -> bool {
        !self.is_support()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_and_consumables_are_disjoint() {
        for tag in [ContentTag::None, ContentTag::Floor, ContentTag::Ladder, ContentTag::Egg, ContentTag::Grain] {
            assert!(!(tag.is_support() && tag.is_consumable()), "{tag:?}");
            assert_eq!(tag.is_open(), !tag.is_support());
        }
    }
}
