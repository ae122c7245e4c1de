//! Procedural tunnel lane
//!
//! The lane is a sequence of columns. Each column has an open band of rows
//! around a center that does a bounded random walk. Only the columns around
//! the play window exist; they live in a fixed ring and are regenerated as
//! the window slides forward.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::TunnelSettings;

/// Upper bound on columns or rows kept on each side of the window
pub const MAX_HALF_EXTENT: i32 = 1024;

/// One vertical slice of the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelColumn {
    pub index: i32,
    /// Row of the lane center
    pub center_offset: i32,
    pub half_width: i32,
}

impl TunnelColumn {
    /// Open rows, inclusive
    #[inline]
    pub fn band(&self) -> (i32, i32) {
        (
            self.center_offset - self.half_width,
            self.center_offset + self.half_width,
        )
    }

    #[inline]
    pub fn is_open(&self, row: i32) -> bool {
        let (lo, hi) = self.band();
        (lo..=hi).contains(&row)
    }
}

/// Tiles needed to cover half of `view`, plus two, capped at MAX_HALF_EXTENT
fn half_extent(view: f32, tile: f32) -> i32 {
    let tiles = (view / tile / 2.0).ceil();
    let tiles = if tiles.is_nan() { 0.0 } else { tiles };
    tiles.clamp(0.0, (MAX_HALF_EXTENT - 2) as f32) as i32 + 2
}

/// Grid dimensions of the tunnel, in tiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunnelGeometry {
    /// Columns on each side of the window center
    pub half_cols: i32,
    /// Rows above and below row 0
    pub half_rows: i32,
    pub half_width: i32,
    pub margin: i32,
    /// World size of one tile
    pub tile: Vec2,
    /// Vertical padding kept between a spawn point and the walls
    pub spawn_padding: f32,
}

impl TunnelGeometry {
    pub fn from_settings(settings: &TunnelSettings) -> Self {
        let tile = Vec2::new(
            settings.tile_width * settings.tunnel_scale,
            settings.tile_height * settings.tunnel_scale,
        );
        Self {
            half_cols: half_extent(settings.view_width, tile.x),
            half_rows: half_extent(settings.view_height, tile.y),
            half_width: settings.half_width as i32,
            margin: settings.wall_margin as i32,
            tile,
            spawn_padding: settings.spawn_padding,
        }
    }

    /// Half width actually used: shrunk until band and margins fit
    pub fn effective_half_width(&self) -> i32 {
        let room = (self.half_rows - self.margin).max(0);
        self.half_width.clamp(0, room)
    }

    /// Allowed range for the lane center
    pub fn center_bounds(&self) -> (i32, i32) {
        let hw = self.effective_half_width();
        let lo = -self.half_rows + hw + self.margin;
        let hi = self.half_rows - hw - self.margin;
        if lo > hi { (0, 0) } else { (lo, hi) }
    }
}

/// Sliding window of generated columns
#[derive(Debug, Clone)]
pub struct TunnelGenerator {
    geometry: TunnelGeometry,
    ring: Vec<Option<TunnelColumn>>,
    /// Column at the middle of the window
    window_center: i32,
    /// Lane center the next generated column gets
    walk: i32,
    half_width: i32,
    bounds: (i32, i32),
    rng: Pcg32,
}

impl TunnelGenerator {
    pub fn new(geometry: TunnelGeometry, seed: u64) -> Self {
        let half_width = geometry.effective_half_width();
        if half_width != geometry.half_width {
            log::warn!(
                "Tunnel half width {} does not fit {} rows with margin {}, using {}",
                geometry.half_width,
                geometry.half_rows,
                geometry.margin,
                half_width
            );
        }
        let slots = (2 * geometry.half_cols.max(0) + 2) as usize;
        Self {
            geometry,
            ring: vec![None; slots],
            window_center: 0,
            walk: 0,
            half_width,
            bounds: geometry.center_bounds(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn geometry(&self) -> &TunnelGeometry {
        &self.geometry
    }

    pub fn window_center(&self) -> i32 {
        self.window_center
    }

    pub fn window_left(&self) -> i32 {
        self.window_center - self.geometry.half_cols
    }

    /// Newest column of the window
    pub fn leading_index(&self) -> i32 {
        self.window_center + self.geometry.half_cols
    }

    /// Generate the whole window around `center`
    pub fn fill_window(&mut self, center: i32) {
        self.ring.iter_mut().for_each(|slot| *slot = None);
        self.window_center = center;
        for index in self.window_left()..=self.leading_index() {
            self.generate_column(index);
        }
    }

    /// Record the band for `index`, then step the walk by -1, 0 or +1
    pub fn generate_column(&mut self, index: i32) -> TunnelColumn {
        let column = TunnelColumn {
            index,
            center_offset: self.walk,
            half_width: self.half_width,
        };
        let slot = self.slot(index);
        self.ring[slot] = Some(column);

        let (lo, hi) = self.bounds;
        self.walk = (self.walk + self.rng.random_range(-1..=1)).clamp(lo, hi);
        column
    }

    fn clear_column(&mut self, index: i32) {
        let slot = self.slot(index);
        if self.ring[slot].is_some_and(|c| c.index == index) {
            self.ring[slot] = None;
        }
    }

    /// Slide the window forward to `new_center`, one column at a time
    pub fn advance_window(&mut self, new_center: i32) {
        if new_center < self.window_center {
            log::debug!(
                "Ignoring backward window move {} -> {}",
                self.window_center,
                new_center
            );
            return;
        }
        while self.window_center < new_center {
            self.window_center += 1;
            self.clear_column(self.window_center - self.geometry.half_cols - 1);
            self.generate_column(self.window_center + self.geometry.half_cols);
        }
    }

    /// Column at `index` if it is inside the window
    pub fn column(&self, index: i32) -> Option<&TunnelColumn> {
        self.ring[self.slot(index)]
            .as_ref()
            .filter(|c| c.index == index)
    }

    /// Live columns, oldest first
    pub fn columns(&self) -> impl Iterator<Item = &TunnelColumn> {
        (self.window_left()..=self.leading_index()).filter_map(|i| self.column(i))
    }

    /// World position of the lane center in `index`
    pub fn tunnel_center(&self, index: i32) -> Vec2 {
        let center = self.column(index).map_or(0, |c| c.center_offset);
        self.cell_center(index, center)
    }

    /// Random world point strictly inside the open band of `index`
    pub fn free_position_in_column<R: Rng>(&self, index: i32, rng: &mut R) -> Option<Vec2> {
        let column = self.column(index)?;
        let (lo, hi) = column.band();
        let tile = self.geometry.tile;
        let bottom = lo as f32 * tile.y;
        let top = (hi + 1) as f32 * tile.y;

        let span = top - bottom;
        let padding = if span > self.geometry.spawn_padding * 2.0 {
            self.geometry.spawn_padding
        } else {
            span / 4.0
        };
        let (min, max) = (bottom + padding, top - padding);
        let y = if min < max {
            rng.random_range(min..max)
        } else {
            (bottom + top) / 2.0
        };
        Some(Vec2::new((index as f32 + 0.5) * tile.x, y))
    }

    fn cell_center(&self, col: i32, row: i32) -> Vec2 {
        let tile = self.geometry.tile;
        Vec2::new((col as f32 + 0.5) * tile.x, (row as f32 + 0.5) * tile.y)
    }

    #[inline]
    fn slot(&self, index: i32) -> usize {
        index.rem_euclid(self.ring.len() as i32) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geometry(half_rows: i32, half_width: i32, margin: i32) -> TunnelGeometry {
        TunnelGeometry {
            half_cols: 4,
            half_rows,
            half_width,
            margin,
            tile: Vec2::new(100.0, 100.0),
            spawn_padding: 50.0,
        }
    }

    #[test]
    fn test_default_geometry() {
        let geo = TunnelGeometry::from_settings(&TunnelSettings::default());
        // 1920 / 100 / 2 = 9.6 -> 10, plus 2
        assert_eq!(geo.half_cols, 12);
        // 1080 / 100 / 2 = 5.4 -> 6, plus 2
        assert_eq!(geo.half_rows, 8);
        assert_eq!(geo.center_bounds(), (-4, 4));
    }

    #[test]
    fn test_huge_view_is_capped() {
        let settings = TunnelSettings {
            view_width: 1e30,
            view_height: 1e30,
            tile_width: 1e-3,
            tile_height: 1e-3,
            ..TunnelSettings::default()
        };
        let geo = TunnelGeometry::from_settings(&settings);
        assert_eq!(geo.half_cols, MAX_HALF_EXTENT);
        assert_eq!(geo.half_rows, MAX_HALF_EXTENT);

        let mut generator = TunnelGenerator::new(geo, 3);
        generator.fill_window(0);
        assert_eq!(generator.columns().count(), 2 * MAX_HALF_EXTENT as usize + 1);
    }

    #[test]
    fn test_window_covers_range() {
        let mut generator = TunnelGenerator::new(geometry(8, 2, 2), 7);
        generator.fill_window(0);
        assert_eq!(generator.columns().count(), 9);
        assert!(generator.column(-4).is_some());
        assert!(generator.column(5).is_none());

        generator.advance_window(3);
        assert_eq!(generator.columns().count(), 9);
        assert!(generator.column(-2).is_none());
        assert!(generator.column(-1).is_some());
        assert!(generator.column(7).is_some());
        assert_eq!(generator.leading_index(), 7);
    }

    #[test]
    fn test_walk_is_continuous() {
        let mut generator = TunnelGenerator::new(geometry(8, 2, 2), 99);
        generator.fill_window(0);
        let mut prev = generator.column(generator.leading_index()).map(|c| c.center_offset);
        for step in 1..200 {
            generator.advance_window(step);
            let cur = generator.column(generator.leading_index()).map(|c| c.center_offset);
            let (a, b) = (prev.unwrap(), cur.unwrap());
            assert!((a - b).abs() <= 1);
            prev = cur;
        }
    }

    #[test]
    fn test_backward_move_ignored() {
        let mut generator = TunnelGenerator::new(geometry(8, 2, 2), 1);
        generator.fill_window(10);
        let before: Vec<_> = generator.columns().copied().collect();
        generator.advance_window(4);
        let after: Vec<_> = generator.columns().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_degenerate_geometry_clamps() {
        let geo = geometry(3, 10, 2);
        assert_eq!(geo.effective_half_width(), 1);
        assert_eq!(geo.center_bounds(), (0, 0));

        let geo = geometry(1, 4, 3);
        assert_eq!(geo.effective_half_width(), 0);
        let mut generator = TunnelGenerator::new(geo, 3);
        generator.fill_window(0);
        assert!(generator.columns().all(|c| c.band() == (0, 0)));
    }

    #[test]
    fn test_free_position_inside_band() {
        let mut generator = TunnelGenerator::new(geometry(8, 2, 2), 5);
        generator.fill_window(0);
        let mut rng = Pcg32::seed_from_u64(11);
        for index in generator.window_left()..=generator.leading_index() {
            let column = *generator.column(index).unwrap();
            let (lo, hi) = column.band();
            for _ in 0..20 {
                let p = generator.free_position_in_column(index, &mut rng).unwrap();
                assert!(p.y > lo as f32 * 100.0 && p.y < (hi + 1) as f32 * 100.0);
                assert_eq!(p.x, (index as f32 + 0.5) * 100.0);
            }
        }
        assert!(generator.free_position_in_column(100, &mut rng).is_none());
    }

    #[test]
    fn test_same_seed_same_tunnel() {
        let mut a = TunnelGenerator::new(geometry(8, 2, 2), 42);
        let mut b = TunnelGenerator::new(geometry(8, 2, 2), 42);
        a.fill_window(0);
        b.fill_window(0);
        a.advance_window(50);
        b.advance_window(50);
        assert!(a.columns().eq(b.columns()));
    }

    proptest! {
        #[test]
        fn prop_band_in_bounds_with_constant_width(
            seed in any::<u64>(),
            half_rows in 0i32..20,
            half_width in 0i32..10,
            margin in 0i32..5,
            steps in 1i32..300,
        ) {
            let geo = geometry(half_rows, half_width, margin);
            let width = geo.effective_half_width();
            let mut generator = TunnelGenerator::new(geo, seed);
            generator.fill_window(0);
            for step in 0..steps {
                generator.advance_window(step);
                let column = generator.column(generator.leading_index()).copied();
                prop_assert!(column.is_some());
                let column = column.unwrap();
                let (lo, hi) = column.band();
                prop_assert!(lo >= -half_rows && hi <= half_rows);
                prop_assert_eq!(hi - lo, 2 * width);
            }
        }
    }
}
