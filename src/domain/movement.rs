/// Tile queries shared by every mover.
///
/// ## Probe convention
///
/// Harry and Hens are two tiles tall; their tile `(tx, ty)` is the one their
/// feet occupy. Probes are relative to that tile:
///
/// ```text
///   (tx, ty-2)   above the head     ladder here  => can climb up
///   (tx, ty-1)   head
///   (tx, ty)     feet               floor beside => wall
///   (tx, ty+1)   under foot         ladder here  => can climb down
/// ```
///
/// Ladders stick up two tiles above the floor they lead to, and the ladder
/// tile inside that floor row is a "landable ladder".
///
/// Nothing here mutates state and nothing fails: off-map probes read as
/// `ContentTag::None`.

use super::entity::{Body, Direction, Moves};
use super::geometry::TileSize;
use super::tile::ContentTag;
use super::tile_map::TileMap;

/// Content `rows` tile-rows below the entity's tile.
pub fn element_below(map: &TileMap, ts: TileSize, body: &Body, rows: i32) -> ContentTag {
    element_below_after(map, ts, body, 0, rows)
}

/// Same as `element_below`, as if the body had already moved `dy` pixels.
pub fn element_below_after(map: &TileMap, ts: TileSize, body: &Body, dy: i32, rows: i32) -> ContentTag {
    let (tx, ty) = ts.pixel_to_tile(body.center_x(), body.center_y() + dy);
    map.tile_at(tx, ty + rows)
}

/// Content of the neighbouring tile in `dir`, using the probe convention.
pub fn element_toward(map: &TileMap, ts: TileSize, body: &Body, dir: Direction) -> ContentTag {
    let (tx, ty) = body.tile(ts);
    match dir {
        Direction::Up => map.tile_at(tx, ty - 2),
        Direction::Down => map.tile_at(tx, ty + 1),
        Direction::Left => map.tile_at(tx - 1, ty),
        Direction::Right => map.tile_at(tx + 1, ty),
    }
}

/// Harry's legal directions from his current tile.
///
/// Up/down need a ladder above the head or under foot. Sideways:
///   - standing on a ladder tile, a side is open when the tile under that
///     side is floor, or when the other side has floor underneath and this
///     side has nothing to stand on (stepping off into the air);
///   - otherwise a side is open unless a floor tile sits at foot height.
///
/// A move already in flight is always allowed to finish.
pub fn possible_directions(map: &TileMap, ts: TileSize, body: &Body) -> Moves {
    let (tx, ty) = body.tile(ts);
    let mut moves = Moves {
        up: element_toward(map, ts, body, Direction::Up).is_ladder(),
        down: element_toward(map, ts, body, Direction::Down).is_ladder(),
        left: false,
        right: false,
    };

    if map.tile_at(tx, ty).is_ladder() {
        let under_left = map.tile_at(tx - 1, ty + 1);
        let under_right = map.tile_at(tx + 1, ty + 1);
        moves.left = under_left.is_floor() || (under_right.is_floor() && under_left.is_open());
        moves.right = under_right.is_floor() || (under_left.is_floor() && under_right.is_open());
    } else {
        moves.left = !map.tile_at(tx - 1, ty).is_floor();
        moves.right = !map.tile_at(tx + 1, ty).is_floor();
    }

    if !body.is_aligned(ts) {
        if let Some(dir) = body.travel() {
            moves.set(dir, true);
        }
    }
    moves
}

/// Directions a Hen will consider: ladders as for Harry, and sideways only
/// where the next tile over has floor or ladder underneath.
pub fn supported_directions(map: &TileMap, ts: TileSize, body: &Body) -> Moves {
    let (tx, ty) = body.tile(ts);
    Moves {
        up: element_toward(map, ts, body, Direction::Up).is_ladder(),
        down: element_toward(map, ts, body, Direction::Down).is_ladder(),
        left: map.tile_at(tx - 1, ty + 1).is_support(),
        right: map.tile_at(tx + 1, ty + 1).is_support(),
    }
}
