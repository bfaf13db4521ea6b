//! Full-screen character grid composed once per tick and flushed as a whole.
//!
//! Every placement helper clips at the buffer edges; nothing here can panic on
//! oversized input, which keeps a shrinking terminal from taking the timer down.

/// Blank cell value.
pub const BLANK: char = ' ';

/// Spaces between columns in [`Frame::place_grid`].
pub const GRID_COLUMN_GAP: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<Vec<char>>,
}

fn line_len(line: &str) -> usize {
    line.chars().count()
}

fn block_width<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .map(|line| line_len(line.as_ref()))
        .max()
        .unwrap_or(0)
}

impl Frame {
    /// Create a blank frame. A zero dimension produces an empty buffer that
    /// silently ignores every write.
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            (0, 0)
        } else {
            (width, height)
        };
        Self {
            width,
            height,
            cells: vec![vec![BLANK; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn row(&self, y: usize) -> Option<String> {
        self.cells.get(y).map(|row| row.iter().collect())
    }

    /// Blank the grid at the new size, reusing the rows when the size is
    /// unchanged (the common case between two redraws).
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            self.clear();
        } else {
            *self = Self::new(width, height);
        }
    }

    fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(BLANK);
        }
    }

    fn put(&mut self, x: isize, y: isize, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(cell) = self
            .cells
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *cell = ch;
        }
    }

    fn put_line(&mut self, x: isize, y: isize, line: &str) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        for (offset, ch) in line.chars().enumerate() {
            let col = x + offset as isize;
            if col >= self.width as isize {
                break;
            }
            self.put(col, y, ch);
        }
    }

    /// Center a block of lines vertically, and each line horizontally on its own.
    pub fn place_centered<S: AsRef<str>>(&mut self, lines: &[S]) {
        let start_y = self.height.saturating_sub(lines.len()) / 2;
        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let start_x = self.width.saturating_sub(line_len(line)) / 2;
            self.put_line(start_x as isize, (start_y + idx) as isize, line);
        }
    }

    /// Center an art block as a unit so glyph columns stay aligned. When the
    /// art does not fit, the plain `fallback` text is centered instead; partial
    /// glyphs are never drawn.
    pub fn place_centered_art<A, F>(&mut self, art: &[A], fallback: &[F])
    where
        A: AsRef<str>,
        F: AsRef<str>,
    {
        let art_width = block_width(art);
        if art.len() > self.height || art_width > self.width {
            self.place_centered(fallback);
            return;
        }
        let start_y = (self.height - art.len()) / 2;
        let start_x = (self.width - art_width) / 2;
        for (idx, line) in art.iter().enumerate() {
            self.put_line(start_x as isize, (start_y + idx) as isize, line.as_ref());
        }
    }

    /// Anchor the last line to the bottom row at column 0. Lines pushed above
    /// the top edge are dropped, long lines are cut at the right edge.
    pub fn place_bottom_left<S: AsRef<str>>(&mut self, lines: &[S]) {
        let start_y = self.height as isize - lines.len() as isize;
        for (idx, line) in lines.iter().enumerate() {
            self.put_line(0, start_y + idx as isize, line.as_ref());
        }
    }

    /// Lay items out row by row in `columns` columns, each cell padded to the
    /// widest item plus [`GRID_COLUMN_GAP`], with the block centered. Items
    /// that would not fit whole are skipped.
    pub fn place_grid<S: AsRef<str>>(&mut self, items: &[S], columns: usize) {
        if items.is_empty() {
            return;
        }
        let columns = columns.max(1);
        let rows = items.len().div_ceil(columns);
        let cell_width = block_width(items);
        let total_width = cell_width * columns + (columns - 1) * GRID_COLUMN_GAP;
        let start_x = (self.width as isize - total_width as isize) / 2;
        let start_y = (self.height as isize - rows as isize) / 2;

        for (idx, item) in items.iter().enumerate() {
            let row = (idx / columns) as isize;
            let col = (idx % columns) as isize;
            let x = start_x + col * (cell_width + GRID_COLUMN_GAP) as isize;
            let y = start_y + row;
            let fits = x >= 0
                && y >= 0
                && (y as usize) < self.height
                && x as usize + cell_width <= self.width;
            if !fits {
                continue;
            }
            let padded = format!("{:<cell_width$}", item.as_ref());
            self.put_line(x, y, &padded);
        }
    }

    /// Rows joined by `\n`, without a trailing newline.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for (idx, row) in self.cells.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.extend(row.iter());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(frame: &Frame) -> Vec<String> {
        frame.serialize().split('\n').map(str::to_string).collect()
    }

    #[test]
    fn new_frame_is_blank_and_rectangular() {
        let frame = Frame::new(4, 2);
        assert_eq!(frame.serialize(), "    \n    ");
        assert!(rows(&frame).iter().all(|row| row.chars().count() == 4));
    }

    #[test]
    fn zero_dimension_is_a_noop_buffer() {
        let mut frame = Frame::new(0, 5);
        assert!(frame.is_empty());
        assert_eq!(frame.height(), 0);
        frame.place_centered(&["hello"]);
        frame.place_bottom_left(&["hint"]);
        frame.place_grid(&["a", "b"], 2);
        assert_eq!(frame.serialize(), "");
    }

    #[test]
    fn place_centered_single_line() {
        let mut frame = Frame::new(10, 3);
        frame.place_centered(&["ABC"]);
        assert_eq!(frame.row(1).as_deref(), Some("   ABC    "));
        assert_eq!(frame.cell(3, 1), Some('A'));
        assert_eq!(frame.row(0).as_deref(), Some("          "));
    }

    #[test]
    fn place_centered_centers_each_line_independently() {
        let mut frame = Frame::new(7, 4);
        frame.place_centered(&["a", "bcd"]);
        assert_eq!(frame.row(1).as_deref(), Some("   a   "));
        assert_eq!(frame.row(2).as_deref(), Some("  bcd  "));
    }

    #[test]
    fn place_centered_truncates_overflow() {
        let mut frame = Frame::new(4, 1);
        frame.place_centered(&["abcdefgh", "second"]);
        assert_eq!(frame.serialize(), "abcd");
    }

    #[test]
    fn place_centered_art_draws_block_aligned() {
        let mut frame = Frame::new(9, 5);
        frame.place_centered_art(&["#  ", "###"], &["fallback"]);
        assert_eq!(frame.row(1).as_deref(), Some("   #     "));
        assert_eq!(frame.row(2).as_deref(), Some("   ###   "));
    }

    #[test]
    fn place_centered_art_falls_back_when_too_tall() {
        let art = ["#####", "#   #", "#   #", "#   #", "#####"];
        let mut frame = Frame::new(20, 3);
        frame.place_centered_art(&art, &["00:05"]);
        assert_eq!(frame.row(1).as_deref(), Some("       00:05        "));
        assert!(!frame.serialize().contains('#'));
    }

    #[test]
    fn place_centered_art_falls_back_when_too_wide() {
        let mut frame = Frame::new(4, 3);
        frame.place_centered_art(&["######"], &["ok"]);
        assert_eq!(frame.row(1).as_deref(), Some(" ok "));
    }

    #[test]
    fn place_bottom_left_anchors_last_line() {
        let mut frame = Frame::new(6, 3);
        frame.place_bottom_left(&["top", "bottom-line"]);
        assert_eq!(frame.row(1).as_deref(), Some("top   "));
        assert_eq!(frame.row(2).as_deref(), Some("bottom"));
    }

    #[test]
    fn place_bottom_left_drops_lines_above_top() {
        let mut frame = Frame::new(3, 1);
        frame.place_bottom_left(&["one", "two"]);
        assert_eq!(frame.serialize(), "two");
    }

    #[test]
    fn place_grid_lays_out_rows_then_columns() {
        let mut frame = Frame::new(12, 4);
        frame.place_grid(&["ab", "cde", "f"], 2);
        // total width 3 * 2 + 2 = 8, start_x = 2, two rows, start_y = 1
        assert_eq!(frame.row(1).as_deref(), Some("  ab   cde  "));
        assert_eq!(frame.row(2).as_deref(), Some("  f         "));
        assert_eq!(frame.cell(2, 1), Some('a'));
        assert_eq!(frame.cell(7, 1), Some('c'));
        assert_eq!(frame.cell(2, 2), Some('f'));
    }

    #[test]
    fn place_grid_skips_items_that_do_not_fit() {
        let mut frame = Frame::new(5, 1);
        frame.place_grid(&["abcdef"], 1);
        assert_eq!(frame.serialize(), "     ");

        let mut frame = Frame::new(3, 1);
        frame.place_grid(&["a", "b", "c"], 1);
        // three rows centered on one: only the middle item lands on screen
        assert_eq!(frame.serialize(), " b ");
    }

    #[test]
    fn place_grid_treats_zero_columns_as_one() {
        let mut frame = Frame::new(3, 2);
        frame.place_grid(&["x", "y"], 0);
        assert_eq!(frame.row(0).as_deref(), Some(" x "));
        assert_eq!(frame.row(1).as_deref(), Some(" y "));
    }

    #[test]
    fn resize_clears_previous_content() {
        let mut frame = Frame::new(5, 2);
        frame.place_centered(&["hello"]);
        frame.resize(3, 3);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.serialize(), "   \n   \n   ");
    }

    #[test]
    fn resize_to_same_size_leaves_no_stale_content() {
        let mut frame = Frame::new(3, 1);
        frame.place_centered(&["abc"]);
        frame.resize(3, 1);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.serialize(), "   ");
    }

    #[test]
    fn serialize_has_no_trailing_newline() {
        let frame = Frame::new(2, 3);
        assert!(!frame.serialize().ends_with('\n'));
        assert_eq!(frame.serialize().matches('\n').count(), 2);
    }
}
