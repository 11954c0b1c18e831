use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Number of rows on the grid (letters `A` through `J`).
pub const ROWS: u8 = 10;
/// Number of columns on the grid (`1` through `10`).
pub const COLS: u8 = 10;

/// Matcher for cell tokens: one row letter followed by one or two digits.
/// The numeric range check happens after the match.
static CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-j][0-9]{1,2}$").unwrap());

/// A single coordinate on the 10x10 grid.
///
/// Cells are normalized on construction: two cells are equal iff their
/// (uppercase row, integer column) forms match, so `"a1"`, `"A1"` and `"A01"`
/// all parse to the same cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Row index, `0..ROWS`, displayed as the letters `A`..`J`.
    row: u8,
    /// Column number, `1..=COLS`.
    col: u8,
}

impl Cell {
    /// Construct a cell from a row index (`0..ROWS`) and a column number
    /// (`1..=COLS`). Returns `None` when either is out of bounds.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < ROWS && (1..=COLS).contains(&col) {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// The row letter, `A`..`J`.
    pub fn row_letter(self) -> char {
        (b'A' + self.row) as char
    }

    /// The column number, `1..=10`.
    pub fn column(self) -> u8 {
        self.col
    }

    /// Iterate every cell of the grid in row-major order.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..ROWS).flat_map(|row| (1..=COLS).map(move |col| Cell { row, col }))
    }

    /// Iterate the orthogonally adjacent in-bounds cells, at most 4 of them.
    pub fn neighbors(self) -> Neighbors {
        Neighbors {
            cell: self,
            step: NeighborStep::Up,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.col)
    }
}

/// Error produced when a string is not a valid cell coordinate.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("not a valid cell; expected a coordinate like D4 (A1-J10)")]
pub struct ParseCellError;

impl FromStr for Cell {
    type Err = ParseCellError;

    /// Accepts exactly one letter A-J followed by an integer 1-10,
    /// case-insensitive, 2-3 characters total.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !CELL.is_match(s) {
            return Err(ParseCellError);
        }
        let row = s.as_bytes()[0].to_ascii_uppercase() - b'A';
        let col: u8 = s[1..].parse().map_err(|_| ParseCellError)?;
        Cell::new(row, col).ok_or(ParseCellError)
    }
}

/// Iterator over the in-bounds orthogonal neighbors of a [`Cell`].
#[derive(Debug)]
pub struct Neighbors {
    cell: Cell,
    step: NeighborStep,
}

#[derive(Debug, Copy, Clone)]
enum NeighborStep {
    Up,
    Down,
    Left,
    Right,
    End,
}

impl Iterator for Neighbors {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        loop {
            match self.step {
                NeighborStep::Up => {
                    self.step = NeighborStep::Down;
                    if let Some(row) = self.cell.row.checked_sub(1) {
                        return Cell::new(row, self.cell.col);
                    }
                }
                NeighborStep::Down => {
                    self.step = NeighborStep::Left;
                    if let Some(cell) = Cell::new(self.cell.row + 1, self.cell.col) {
                        return Some(cell);
                    }
                }
                NeighborStep::Left => {
                    self.step = NeighborStep::Right;
                    if let Some(cell) = Cell::new(self.cell.row, self.cell.col.wrapping_sub(1)) {
                        return Some(cell);
                    }
                }
                NeighborStep::Right => {
                    self.step = NeighborStep::End;
                    if let Some(cell) = Cell::new(self.cell.row, self.cell.col + 1) {
                        return Some(cell);
                    }
                }
                NeighborStep::End => return None,
            }
        }
    }
}
