use std::ops::{Deref, DerefMut};

use thiserror::Error;

use super::common::{Direction, Position};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalkError {
    #[error("Grid needs at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("Cell {0:?} is outside the grid")]
    OutOfBounds(Position),
}

#[derive(Debug, Clone)]
pub(crate) struct Cell {
    pub(crate) occupied: bool,
    // Moves not yet tried from this cell, excluding the one it was entered by
    pub(crate) options: Vec<Direction>,
    pub(crate) entry: Option<Direction>,
}

impl Cell {
    fn fresh() -> Self {
        Self {
            occupied: false,
            options: Direction::ALL.to_vec(),
            entry: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.occupied = false;
        self.entry = None;
        // capacity is already four, no allocation here
        self.options.clear();
        self.options.extend(Direction::ALL);
    }

    pub(crate) fn remove_option(&mut self, direction: Direction) {
        self.options.retain(|d| *d != direction);
    }

    pub(crate) fn is_stuck(&self) -> bool {
        self.options.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct Row {
    cells: Vec<Cell>,
}

impl Deref for Row {
    type Target = Vec<Cell>;

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl DerefMut for Row {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cells
    }
}

#[derive(Debug)]
pub struct Grid {
    rows: Vec<Row>,
    dimension: (usize, usize),
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Result<Self, WalkError> {
        if rows == 0 || cols == 0 {
            return Err(WalkError::EmptyGrid { rows, cols });
        }

        let rows = (0..rows)
            .map(|_| Row {
                cells: vec![Cell::fresh(); cols],
            })
            .collect::<Vec<_>>();

        Ok(Self {
            dimension: (cols, rows.len()),
            rows,
        })
    }

    pub fn reset(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                cell.reset();
            }
        }
    }

    pub fn dimension(&self) -> (usize, usize) {
        self.dimension
    }

    pub fn cell_count(&self) -> usize {
        self.dimension.0 * self.dimension.1
    }

    pub fn in_bounds(&self, position: &Position) -> bool {
        position.x < self.dimension.0 && position.y < self.dimension.1
    }

    pub fn is_occupied(&self, position: &Position) -> Result<bool, WalkError> {
        if !self.in_bounds(position) {
            return Err(WalkError::OutOfBounds(*position));
        }

        Ok(self.rows[position.y][position.x].occupied)
    }

    pub(crate) fn cell(&self, position: Position) -> &Cell {
        &self.rows[position.y][position.x]
    }

    pub(crate) fn cell_mut(&mut self, position: Position) -> &mut Cell {
        &mut self.rows[position.y][position.x]
    }
}
