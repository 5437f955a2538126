/// TileGrid: the two tile layers of the world.
///
///   - `foreground`: what occupies a cell (rock, ore, player, empty)
///   - `background`: cosmetic fill, `Background` below the surface
///
/// Both layers are `rows[y][x]`, same size, allocated once and never resized.
/// Indexing outside the grid panics. Callers check `in_bounds` first.

use super::tile::TileType;

#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    foreground: Vec<Vec<TileType>>,
    background: Vec<Vec<TileType>>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        TileGrid {
            width,
            height,
            foreground: vec![vec![TileType::Empty; width]; height],
            background: vec![vec![TileType::Empty; width]; height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Is the signed coordinate inside the grid?
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> TileType {
        self.check(x, y);
        self.foreground[y][x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, tile: TileType) {
        self.check(x, y);
        self.foreground[y][x] = tile;
    }

    #[inline]
    pub fn background(&self, x: usize, y: usize) -> TileType {
        self.check(x, y);
        self.background[y][x]
    }

    #[inline]
    pub fn set_background(&mut self, x: usize, y: usize, tile: TileType) {
        self.check(x, y);
        self.background[y][x] = tile;
    }

    /// Move whatever is at `from` into `to`, leaving `from` empty.
    pub fn move_tile(&mut self, from: (usize, usize), to: (usize, usize)) {
        let tile = self.get(from.0, from.1);
        self.set(from.0, from.1, TileType::Empty);
        self.set(to.0, to.1, tile);
    }

    /// All cells currently holding `tile`, row by row.
    pub fn positions_of(&self, tile: TileType) -> Vec<(usize, usize)> {
        let mut found = vec![];
        for (y, row) in self.foreground.iter().enumerate() {
            for (x, t) in row.iter().enumerate() {
                if *t == tile {
                    found.push((x, y));
                }
            }
        }
        found
    }

    fn check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "grid access out of range: ({x}, {y}) in {}x{}",
            self.width,
            self.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_empty() {
        let g = TileGrid::new(3, 2);
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.get(2, 1), TileType::Empty);
        assert_eq!(g.background(0, 0), TileType::Empty);
    }

    #[test]
    fn bounds_check_covers_all_edges() {
        let g = TileGrid::new(4, 3);
        assert!(g.in_bounds(0, 0));
        assert!(g.in_bounds(3, 2));
        assert!(!g.in_bounds(-1, 0));
        assert!(!g.in_bounds(0, -1));
        assert!(!g.in_bounds(4, 0));
        assert!(!g.in_bounds(0, 3));
    }

    #[test]
    fn layers_are_independent() {
        let mut g = TileGrid::new(2, 2);
        g.set(1, 1, TileType::DIRT);
        g.set_background(1, 1, TileType::Background);
        assert_eq!(g.get(1, 1), TileType::DIRT);
        assert_eq!(g.background(1, 1), TileType::Background);
        assert_eq!(g.get(0, 1), TileType::Empty);
    }

    #[test]
    fn move_tile_clears_source() {
        let mut g = TileGrid::new(2, 1);
        g.set(0, 0, TileType::Player);
        g.move_tile((0, 0), (1, 0));
        assert_eq!(g.get(0, 0), TileType::Empty);
        assert_eq!(g.positions_of(TileType::Player), vec![(1, 0)]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_access_panics() {
        let g = TileGrid::new(2, 2);
        g.get(2, 0);
    }
}
