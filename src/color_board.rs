use std::cmp::Ordering;
use std::collections::HashMap;

use crate::thread_palette::ThreadColor;

/// Per-image grid of resolved thread colors plus the set of colors actually used.
///
/// Cells point into a registry keyed by thread code, so each color is stored once no
/// matter how many stitches use it. Display order is derived on demand by [`colors`].
///
/// [`colors`]: ColorBoard::colors
#[derive(Debug, Clone, Default)]
pub struct ColorBoard {
    width: u32,
    height: u32,
    cells: Vec<Option<usize>>,
    registry: Vec<ThreadColor>,
    slot_by_code: HashMap<String, usize>,
    stitch_counts: Vec<u32>,
}

impl ColorBoard {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; (width as usize) * (height as usize)],
            ..Self::default()
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Register `color` if its code is new, then point cell (x, y) at it.
    ///
    /// Returns false and leaves the board untouched for an empty color or a coordinate
    /// outside the grid.
    pub fn set_color(&mut self, x: u32, y: u32, color: &ThreadColor) -> bool {
        if color.code.is_empty() {
            return false;
        }
        let Some(cell) = self.cell_index(x, y) else {
            return false;
        };

        let slot = self.register(color);
        if let Some(previous) = self.cells[cell].replace(slot) {
            self.stitch_counts[previous] -= 1;
        }
        self.stitch_counts[slot] += 1;
        true
    }

    pub fn color_at(&self, x: u32, y: u32) -> Option<&ThreadColor> {
        let cell = self.cell_index(x, y)?;
        self.cells[cell].map(|slot| &self.registry[slot])
    }

    /// Distinct colors on the board in display order (see [`compare_codes`]).
    pub fn colors(&self) -> Vec<ThreadColor> {
        let mut colors = self.registry.clone();
        colors.sort_by(|a, b| compare_codes(&a.code, &b.code));
        colors
    }

    /// Number of cells currently holding the thread with this code.
    pub fn stitch_count(&self, code: &str) -> u32 {
        self.slot_by_code
            .get(code)
            .map(|&slot| self.stitch_counts[slot])
            .unwrap_or(0)
    }

    /// Number of distinct colors registered.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn register(&mut self, color: &ThreadColor) -> usize {
        if let Some(&slot) = self.slot_by_code.get(&color.code) {
            return slot;
        }
        let slot = self.registry.len();
        self.registry.push(color.clone());
        self.stitch_counts.push(0);
        self.slot_by_code.insert(color.code.clone(), slot);
        slot
    }

    fn cell_index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

/// Thread code ordering used by every legend.
///
/// Two integer codes compare numerically, an integer code sorts before anything else,
/// and the rest compare as strings. Numerically equal codes ("05" vs "5") fall back to
/// string order.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(code: &str) -> ThreadColor {
        ThreadColor::new(code, [1, 2, 3], "S")
    }

    #[test]
    fn colors_use_mixed_code_order() {
        let mut board = ColorBoard::new(4, 1);
        for (x, code) in ["310", "B5200", "5", "Ecru"].iter().enumerate() {
            assert!(board.set_color(x as u32, 0, &thread(code)));
        }

        let codes: Vec<String> = board.colors().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["5", "310", "B5200", "Ecru"]);
    }

    #[test]
    fn registry_dedups_by_code() {
        let mut board = ColorBoard::new(3, 3);
        let black = thread("310");
        let also_black = ThreadColor::new("310", [9, 9, 9], "Z");

        board.set_color(0, 0, &black);
        board.set_color(1, 1, &black);
        board.set_color(2, 2, &also_black);

        assert_eq!(board.len(), 1);
        assert_eq!(board.stitch_count("310"), 3);
        // The first registration wins.
        assert_eq!(board.color_at(2, 2).unwrap().symbol, "S");
    }

    #[test]
    fn unset_cells_report_nothing() {
        let mut board = ColorBoard::new(2, 2);
        board.set_color(0, 0, &thread("1"));

        assert!(board.color_at(0, 0).is_some());
        assert!(board.color_at(1, 0).is_none());
        assert!(board.color_at(5, 5).is_none());
    }

    #[test]
    fn empty_color_and_out_of_range_writes_are_ignored() {
        let mut board = ColorBoard::new(2, 2);
        assert!(!board.set_color(0, 0, &thread("")));
        assert!(!board.set_color(2, 0, &thread("1")));
        assert!(board.is_empty());
    }

    #[test]
    fn overwriting_a_cell_moves_its_stitch() {
        let mut board = ColorBoard::new(1, 1);
        board.set_color(0, 0, &thread("1"));
        board.set_color(0, 0, &thread("2"));

        assert_eq!(board.stitch_count("1"), 0);
        assert_eq!(board.stitch_count("2"), 1);
        assert_eq!(board.color_at(0, 0).unwrap().code, "2");
        // Registration is permanent even when no stitch uses the color anymore.
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn compare_codes_cases() {
        assert_eq!(compare_codes("5", "310"), Ordering::Less);
        assert_eq!(compare_codes("3865", "B5200"), Ordering::Less);
        assert_eq!(compare_codes("White", "3865"), Ordering::Greater);
        assert_eq!(compare_codes("Ecru", "White"), Ordering::Less);
        assert_eq!(compare_codes("5", "5"), Ordering::Equal);
    }
}
