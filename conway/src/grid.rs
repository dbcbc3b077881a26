// grid.rs - Grid types for Conway's Game of Life

use serde::{Deserialize, Serialize};

use crate::error::LifeError;

/// Liveness layer: `true` is alive.
pub type CellGrid = Grid<bool>;

/// Per-cell counter layer (maturity, dead time, fade).
pub type CounterGrid = Grid<u32>;

// Neighbour offsets of the Moore neighbourhood
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// Rectangular row-major matrix.
///
/// Serialized as a nested array of rows so stored recordings stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<T>>", try_from = "Vec<Vec<T>>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Clone + Deserialize<'de>"
))]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Grid of `rows x cols` default values (dead / zero).
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }

    /// Reset every cell to the default value.
    pub fn reset(&mut self) {
        self.fill(T::default());
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Nested-row copy of the grid.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(<[T]>::to_vec).collect()
    }
}

impl<T> Grid<T> {
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn same_dims<U>(&self, other: &Grid<U>) -> bool {
        self.dims() == other.dims()
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.offset(row, col).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.offset(row, col).map(|i| &mut self.cells[i])
    }

    /// Write a cell; returns `false` when the coordinate is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.get_mut(row, col) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Iterate over the rows as slices.
    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.cells.chunks(self.cols.max(1))
    }
}

impl Grid<bool> {
    /// Parse rows of `#`/`O` (alive) and `.` (dead).
    pub fn parse(lines: &[&str]) -> Result<Self, LifeError> {
        let rows = lines
            .iter()
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .map(|(col, ch)| match ch {
                        '#' | 'O' => Ok(true),
                        '.' => Ok(false),
                        found => Err(LifeError::BadPatternChar { row, col, found }),
                    })
                    .collect::<Result<Vec<bool>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from(rows)
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.get(row, col).copied().unwrap_or(false)
    }

    /// Coordinates of all live cells in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| (i / self.cols, i % self.cols))
            .collect()
    }

    /// Live Moore neighbours of a cell. Edges do not wrap.
    pub fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for &(dr, dc) in &NEIGHBORS {
            let (Some(nr), Some(nc)) = (row.checked_add_signed(dr), col.checked_add_signed(dc))
            else {
                continue;
            };
            if self.is_alive(nr, nc) {
                count += 1;
            }
        }
        count
    }
}

impl<T> From<Grid<T>> for Vec<Vec<T>> {
    fn from(grid: Grid<T>) -> Self {
        let cols = grid.cols.max(1);
        let mut cells = grid.cells.into_iter();
        (0..grid.rows)
            .map(|_| cells.by_ref().take(cols).collect())
            .collect()
    }
}

impl<T> TryFrom<Vec<Vec<T>>> for Grid<T> {
    type Error = LifeError;

    fn try_from(rows: Vec<Vec<T>>) -> Result<Self, Self::Error> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if row_count == 0 || col_count == 0 {
            return Err(LifeError::InvalidDimensions {
                rows: row_count,
                cols: col_count,
            });
        }

        let mut cells = Vec::with_capacity(row_count * col_count);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != col_count {
                return Err(LifeError::RaggedRows {
                    row,
                    expected: col_count,
                    actual: values.len(),
                });
            }
            cells.extend(values);
        }

        Ok(Self {
            rows: row_count,
            cols: col_count,
            cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_access_is_harmless() {
        let mut grid = CellGrid::new(3, 4);
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 4), None);
        assert!(!grid.set(5, 5, true));
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn neighbours_do_not_wrap() {
        let grid = Grid::parse(&["#..", "...", "..#"]).unwrap();
        assert_eq!(grid.live_neighbors(1, 1), 2);
        assert_eq!(grid.live_neighbors(0, 0), 0);
        assert_eq!(grid.live_neighbors(2, 0), 0);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = CellGrid::try_from(vec![vec![true, false], vec![true]]).unwrap_err();
        assert_eq!(
            err,
            LifeError::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
        assert!(CellGrid::try_from(Vec::<Vec<bool>>::new()).is_err());
    }

    #[test]
    fn serializes_as_nested_rows() {
        let grid = Grid::parse(&["#.", ".#"]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[true,false],[false,true]]");

        let back: CellGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert!(serde_json::from_str::<CellGrid>("[[true],[true,false]]").is_err());
    }

    #[test]
    fn parse_rejects_unknown_markers() {
        assert_eq!(
            Grid::parse(&[".x"]).unwrap_err(),
            LifeError::BadPatternChar {
                row: 0,
                col: 1,
                found: 'x'
            }
        );
    }
}
