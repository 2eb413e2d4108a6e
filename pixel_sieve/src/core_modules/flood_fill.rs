// THEORY:
// The `flood_fill` module is the engine of the sieve. It decides, per pixel,
// whether the pixel takes part in the color average, under one of two policies:
//
// 1.  **Independent**: every pixel is tested on its own. White, black and fully
//     transparent pixels are rejected wherever they are.
// 2.  **Border-contiguous**: only rejected pixels reachable from the image edge
//     through a 4-connected chain of rejected pixels are excluded. This removes a
//     white or transparent background while keeping pure-colored details that
//     sit inside the subject.
//
// Algorithm (border-contiguous):
// -   **Seeding**: every border pixel is tested. The ones found invalid form the
//     initial worklist.
// -   **Growing**: a breadth-first search pops a pixel, tests each untested
//     neighbor it admits and pushes the neighbors found invalid.
// -   **Fixed point**: the worklist drains after at most width * height tests,
//     because a pixel is tested once and never un-tested. The reached set is the
//     union of the border-seeded components, so the final partition does not
//     depend on the order in which the worklist is processed.

use crate::core_modules::pixel::pixel::{Pixel, PixelState};
use crate::core_modules::pixel_grid::PixelGrid;
use serde::{Deserialize, Serialize};

/// How invalidity spreads from one pixel to its neighbor during the flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Any invalid neighbor is reached, whatever class made it invalid.
    #[default]
    AnyInvalid,
    /// A neighbor is reached only when it shares an invalid class (white, black,
    /// transparent) with the pixel it is reached from.
    MatchingClass,
}

impl Propagation {
    fn admits(self, from: &Pixel, to: &Pixel) -> bool {
        match self {
            Propagation::AnyInvalid => true,
            Propagation::MatchingClass => from.classification().shares_class(&to.classification()),
        }
    }
}

/// Selects the filtering policy for a batch. Immutable once a batch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterProfile {
    /// `true` for the border-contiguous policy, `false` for the independent one.
    pub contiguous: bool,
    /// Only consulted by the border-contiguous policy.
    pub propagation: Propagation,
}

impl FilterProfile {
    pub fn independent() -> Self {
        Self {
            contiguous: false,
            propagation: Propagation::default(),
        }
    }

    pub fn contiguous(propagation: Propagation) -> Self {
        Self {
            contiguous: true,
            propagation,
        }
    }
}

impl Default for FilterProfile {
    fn default() -> Self {
        Self::contiguous(Propagation::AnyInvalid)
    }
}

pub mod flood_fill {
    use super::*; // Make the profile types from the parent module available.

    /// Filters `grid` in place under `profile`.
    pub fn apply(grid: &mut PixelGrid, profile: &FilterProfile) {
        if profile.contiguous {
            filter_contiguous(grid, profile.propagation);
        } else {
            filter_independent(grid);
        }
    }

    /// Tests every pixel on its own.
    pub fn filter_independent(grid: &mut PixelGrid) {
        for pixel in grid.pixels_mut() {
            pixel.test();
        }
    }

    /// Excludes the invalid pixels connected to the border.
    pub fn filter_contiguous(grid: &mut PixelGrid, propagation: Propagation) {
        let seeds = test_border(grid);
        flood_from(grid, seeds, propagation);
    }

    /// Tests every border pixel and returns the border indices.
    pub(crate) fn test_border(grid: &mut PixelGrid) -> Vec<usize> {
        let border = grid.border_indices();
        let pixels = grid.pixels_mut();
        for &index in &border {
            pixels[index].test();
        }
        border
    }

    /// Grows the invalid region from the invalid pixels among `seeds`.
    /// Returns the number of pixels newly tested while growing.
    pub(crate) fn flood_from(
        grid: &mut PixelGrid,
        seeds: impl IntoIterator<Item = usize>,
        propagation: Propagation,
    ) -> usize {
        let mut queue: std::collections::VecDeque<usize> = seeds
            .into_iter()
            .filter(|&index| grid.pixels()[index].state() == PixelState::Invalid)
            .collect();
        let mut tested = 0;

        while let Some(current) = queue.pop_front() {
            // Check all 4 direct neighbors (not diagonals).
            for neighbor in grid.neighbors(current).into_iter().flatten() {
                let pixels = grid.pixels();
                if pixels[neighbor].is_tested() || !propagation.admits(&pixels[current], &pixels[neighbor]) {
                    continue;
                }

                tested += 1;
                if grid.pixels_mut()[neighbor].test() == PixelState::Invalid {
                    queue.push_back(neighbor);
                }
            }
        }

        tested
    }
}

#[cfg(test)]
mod tests {
    use super::flood_fill::*;
    use super::*;
    use proptest::prelude::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const CLEAR: [u8; 4] = [40, 80, 120, 0];
    const RED: [u8; 4] = [200, 50, 50, 255];

    fn grid_from(width: u32, height: u32, cells: &[[u8; 4]]) -> PixelGrid {
        let bytes: Vec<u8> = cells.iter().flatten().copied().collect();
        PixelGrid::from_rgba_bytes(width, height, &bytes).expect("buffer matches dimensions")
    }

    fn states(grid: &PixelGrid) -> Vec<PixelState> {
        grid.pixels().iter().map(|p| p.state()).collect()
    }

    fn counted(grid: &PixelGrid) -> usize {
        grid.pixels().iter().filter(|p| p.counts()).count()
    }

    /// 5x5 white border, a red ring, and `center` in the middle.
    fn ringed(center: [u8; 4]) -> PixelGrid {
        let mut cells = vec![WHITE; 25];
        for y in 1..4 {
            for x in 1..4 {
                cells[y * 5 + x] = RED;
            }
        }
        cells[12] = center;
        grid_from(5, 5, &cells)
    }

    #[test]
    fn independent_rejects_every_pure_pixel() {
        let mut grid = ringed(BLACK);
        filter_independent(&mut grid);
        assert_eq!(counted(&grid), 8);
        assert_eq!(grid.get(2, 2).map(|p| p.state()), Some(PixelState::Invalid));
    }

    #[test]
    fn contiguous_keeps_enclosed_black_center() {
        let mut grid = ringed(BLACK);
        filter_contiguous(&mut grid, Propagation::AnyInvalid);
        assert_eq!(counted(&grid), 9);
        assert_eq!(grid.get(2, 2).map(|p| p.state()), Some(PixelState::Untested));
    }

    #[test]
    fn contiguous_floods_through_a_border_channel() {
        // Interior white pixel touching the white border is background too.
        let mut cells = vec![RED; 9];
        cells[0] = WHITE;
        cells[1] = WHITE;
        cells[4] = WHITE;
        let mut grid = grid_from(3, 3, &cells);
        filter_contiguous(&mut grid, Propagation::AnyInvalid);

        assert_eq!(grid.get(1, 1).map(|p| p.state()), Some(PixelState::Invalid));
        assert_eq!(counted(&grid), 6);
    }

    #[test]
    fn any_invalid_crosses_classes_matching_does_not() {
        // White border at the left, then a black column, then red.
        let cells = [
            WHITE, BLACK, RED, RED, //
            WHITE, BLACK, BLACK, RED, //
            WHITE, BLACK, RED, RED,
        ];

        let mut any = grid_from(4, 3, &cells);
        filter_contiguous(&mut any, Propagation::AnyInvalid);
        assert_eq!(any.get(2, 1).map(|p| p.state()), Some(PixelState::Invalid));

        // The black pixels on the border still seed their own fill.
        let mut matching = grid_from(4, 3, &cells);
        filter_contiguous(&mut matching, Propagation::MatchingClass);
        assert_eq!(matching.get(2, 1).map(|p| p.state()), Some(PixelState::Invalid));

        // Without a black border pixel, white never floods into black.
        let enclosed = [
            WHITE, WHITE, WHITE, WHITE, //
            WHITE, BLACK, RED, WHITE, //
            WHITE, WHITE, WHITE, WHITE,
        ];
        let mut any = grid_from(4, 3, &enclosed);
        filter_contiguous(&mut any, Propagation::AnyInvalid);
        assert_eq!(any.get(1, 1).map(|p| p.state()), Some(PixelState::Invalid));

        let mut matching = grid_from(4, 3, &enclosed);
        filter_contiguous(&mut matching, Propagation::MatchingClass);
        assert!(matching.get(1, 1).is_some_and(|p| p.counts()));
    }

    #[test]
    fn transparent_background_is_removed() {
        let mut cells = vec![CLEAR; 16];
        cells[5] = RED;
        cells[6] = RED;
        let mut grid = grid_from(4, 4, &cells);
        filter_contiguous(&mut grid, Propagation::MatchingClass);
        assert_eq!(counted(&grid), 2);
    }

    #[test]
    fn refiltering_changes_nothing() {
        let mut grid = ringed(BLACK);
        // A border pixel already settled as valid stays valid.
        grid.pixels_mut()[0].force_state(PixelState::Valid);
        filter_contiguous(&mut grid, Propagation::AnyInvalid);
        let first = grid.clone();

        filter_contiguous(&mut grid, Propagation::AnyInvalid);
        assert_eq!(grid, first);
        assert_eq!(grid.pixels()[0].state(), PixelState::Valid);

        // A later independent pass only settles what was still untested.
        filter_independent(&mut grid);
        for (after, before) in grid.pixels().iter().zip(first.pixels()) {
            if before.is_tested() {
                assert_eq!(after.state(), before.state());
            }
        }
        assert_eq!(grid.get(2, 2).map(|p| p.state()), Some(PixelState::Invalid));
    }

    #[test]
    fn empty_grid_is_a_no_op() {
        let mut grid = grid_from(0, 0, &[]);
        apply(&mut grid, &FilterProfile::default());
        assert!(grid.is_empty());
    }

    #[test]
    fn apply_dispatches_on_profile() {
        let mut contiguous = ringed(BLACK);
        apply(&mut contiguous, &FilterProfile::default());
        let mut independent = ringed(BLACK);
        apply(&mut independent, &FilterProfile::independent());
        assert_eq!(counted(&contiguous), 9);
        assert_eq!(counted(&independent), 8);
    }

    fn sample() -> impl Strategy<Value = [u8; 4]> {
        prop_oneof![
            Just(WHITE),
            Just(BLACK),
            Just(CLEAR),
            Just([255, 255, 255, 0]),
            any::<[u8; 4]>(),
        ]
    }

    fn arbitrary_grid() -> impl Strategy<Value = PixelGrid> {
        (1u32..12, 1u32..12).prop_flat_map(|(width, height)| {
            prop::collection::vec(sample(), (width * height) as usize)
                .prop_map(move |cells| grid_from(width, height, &cells))
        })
    }

    fn propagation() -> impl Strategy<Value = Propagation> {
        prop_oneof![Just(Propagation::AnyInvalid), Just(Propagation::MatchingClass)]
    }

    proptest! {
        #[test]
        fn independent_matches_classification(grid in arbitrary_grid()) {
            let mut grid = grid;
            filter_independent(&mut grid);
            for pixel in grid.pixels() {
                let [r, g, b, a] = pixel.rgba();
                let pure = (r == 255 && g == 255 && b == 255) || (r == 0 && g == 0 && b == 0) || a == 0;
                prop_assert_eq!(pixel.counts(), !pure);
            }
        }

        #[test]
        fn contiguous_keeps_at_least_as_many(grid in arbitrary_grid(), propagation in propagation()) {
            let mut contiguous = grid.clone();
            filter_contiguous(&mut contiguous, propagation);
            let mut independent = grid;
            filter_independent(&mut independent);

            prop_assert!(counted(&contiguous) >= counted(&independent));
            // Every pixel the contiguous policy rejects, the independent one rejects too.
            for (c, i) in contiguous.pixels().iter().zip(independent.pixels()) {
                prop_assert!(c.counts() || !i.counts());
            }
        }

        #[test]
        fn flood_fill_ignores_seed_order(
            (grid, order) in arbitrary_grid().prop_flat_map(|grid| {
                let border = grid.border_indices();
                (Just(grid), Just(border).prop_shuffle())
            }),
            propagation in propagation(),
        ) {
            let mut reference = grid.clone();
            filter_contiguous(&mut reference, propagation);

            let mut shuffled = grid;
            test_border(&mut shuffled);
            let tested = flood_from(&mut shuffled, order, propagation);

            prop_assert!(tested <= shuffled.len());
            prop_assert_eq!(states(&shuffled), states(&reference));
        }
    }
}
