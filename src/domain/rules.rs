/// Level rules: win and death predicates.
///
/// Pure functions; the Level calls them once per tick after every mover
/// has been updated.
///
/// ### Win
/// ┌──────────────────────────────┬──────────┐
/// │ Condition                     │ Won?     │
/// ├──────────────────────────────┼──────────┤
/// │ collected == total            │ YES      │
/// │ easy mode, collected > 0      │ YES      │
/// │ otherwise                     │ NO       │
/// └──────────────────────────────┴──────────┘
///
/// ### Hen collision
/// ┌──────────────────────────────────────┬──────────┐
/// │ Condition (priority order)            │ Fatal?   │
/// ├──────────────────────────────────────┼──────────┤
/// │ hens friendly                         │ NO       │
/// │ inset boxes do not overlap            │ NO       │
/// │ jumpable, overlap only in hen's head  │ NO       │
/// │ otherwise                             │ YES      │
/// └──────────────────────────────────────┴──────────┘
///
/// ### Lift squish
/// Riding a lift with the feet above the disappear line.

use crate::config::RulesConfig;

use super::entity::Body;
use super::geometry::TileSize;

pub fn all_eggs_collected(collected: usize, total: usize, easy_mode: bool) -> bool {
    collected == total || (easy_mode && collected > 0)
}

/// Harry touching any hen under the configured leniency.
pub fn check_collision<'a>(
    harry: &Body,
    hens: impl IntoIterator<Item = &'a Body>,
    rules: &RulesConfig,
    ts: TileSize,
) -> bool {
    if rules.hens_friendly {
        return false;
    }
    let mine = harry.rect().inset(rules.collision_inset);
    hens.into_iter().any(|hen| {
        let Some(overlap) = mine.intersection(&hen.rect().inset(rules.collision_inset)) else {
            return false;
        };
        // Landing on a hen's head is survivable in jumpable mode.
        !(rules.hens_jumpable && overlap.bottom() <= hen.y + ts.height)
    })
}

/// Carried past the top of the lift shaft.
pub fn check_lift_death(harry: &Body, on_lift: bool, disappear_y: i32) -> bool {
    on_lift && harry.bottom() < disappear_y
}
