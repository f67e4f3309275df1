use tracing::{debug, info};

use super::common::{Direction, Position};
use super::grid::{Grid, WalkError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Exploring,
    Backtracking,
    Found,
    Exhausted,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Found | SearchState::Exhausted)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEvent {
    Started(Position),
    Advanced(Position),
    Rejected { from: Position, direction: Direction },
    Backtracked(Position),
    Finished(SearchState),
}

#[derive(Debug)]
pub struct WalkSnapshot {
    pub path: Vec<Position>,
    pub state: SearchState,
    // The last probe that bounced off the grid edge or the path itself,
    // cleared again when the walk grows.
    pub rejected: Option<(Position, Direction)>,
}

pub fn is_impossible(x: usize, y: usize, rows: usize, cols: usize) -> bool {
    // A walk alternates checkerboard colors, so on a grid with an odd
    // number of cells it has to start on the majority color.
    if (rows * cols) % 2 == 1 && x % 2 != y % 2 {
        return true;
    }

    // Starting inside a single-row or single-column strip cuts it in two.
    if rows == 1 && cols > 2 && 0 < x && x < cols - 1 {
        return true;
    }
    if cols == 1 && rows > 2 && 0 < y && y < rows - 1 {
        return true;
    }

    false
}

pub fn find_valid_start(rows: usize, cols: usize) -> Position {
    loop {
        let x = fastrand::usize(0..cols);
        let y = fastrand::usize(0..rows);
        let position = Position::new(x, y);

        debug!("start candidate {:?}", position);

        if is_impossible(position.x, position.y, rows, cols) {
            continue;
        }

        break position;
    }
}

#[derive(Debug)]
pub struct WalkSearch {
    grid: Grid,
    path: Vec<Position>,
    start: Position,
    state: SearchState,
    rejected: Option<(Position, Direction)>,
}

impl WalkSearch {
    pub fn new(rows: usize, cols: usize) -> Result<Self, WalkError> {
        let grid = Grid::new(rows, cols)?;
        let start = find_valid_start(rows, cols);
        info!("walk starts at {:?}", start);
        Ok(Self::from_grid(grid, start))
    }

    pub fn with_start(rows: usize, cols: usize, start: Position) -> Result<Self, WalkError> {
        let grid = Grid::new(rows, cols)?;
        if !grid.in_bounds(&start) {
            return Err(WalkError::OutOfBounds(start));
        }
        Ok(Self::from_grid(grid, start))
    }

    fn from_grid(grid: Grid, start: Position) -> Self {
        let path = Vec::with_capacity(grid.cell_count());
        Self {
            grid,
            path,
            start,
            state: SearchState::Exploring,
            rejected: None,
        }
    }

    // One push, one rejected probe or one pop per call, so a driver can
    // redraw between any two moves of the search.
    pub fn step(&mut self) -> StepEvent {
        if self.state.is_terminal() {
            return StepEvent::Finished(self.state);
        }

        match self.path.last().copied() {
            // A fresh search places its starting cell first.
            None => {
                let start = self.start;
                self.grid.cell_mut(start).occupied = true;
                self.path.push(start);
                if self.covers_grid() {
                    self.state = SearchState::Found;
                    return StepEvent::Finished(self.state);
                }
                self.state = SearchState::Exploring;
                StepEvent::Started(start)
            }
            // Dead end: undo the cell and hand control back to its predecessor.
            Some(current) if self.grid.cell(current).is_stuck() => {
                let entry = self.grid.cell(current).entry;
                self.grid.cell_mut(current).reset();
                self.path.pop();

                match (self.path.last().copied(), entry) {
                    (Some(previous), Some(entry)) => {
                        // The move that led into the dead end is spent.
                        self.grid.cell_mut(previous).remove_option(entry);
                        self.state = SearchState::Backtracking;
                        StepEvent::Backtracked(current)
                    }
                    _ => {
                        // The starting cell itself ran out of moves.
                        self.rejected = None;
                        self.state = SearchState::Exhausted;
                        StepEvent::Finished(self.state)
                    }
                }
            }
            Some(current) => {
                let options = &self.grid.cell(current).options;
                let direction = options[fastrand::usize(..options.len())];
                let target = current.offset(direction);

                if !self.grid.in_bounds(&target) || self.grid.cell(target).occupied {
                    self.grid.cell_mut(current).remove_option(direction);
                    self.rejected = Some((current, direction));
                    self.state = SearchState::Exploring;
                    debug!("rejected {:?} from {:?}", direction, current);
                    return StepEvent::Rejected { from: current, direction };
                }

                let cell = self.grid.cell_mut(target);
                cell.occupied = true;
                cell.entry = Some(direction);
                // It may not turn straight back into the cell it came from.
                cell.remove_option(direction.reverse());
                self.path.push(target);
                self.rejected = None;

                if self.covers_grid() {
                    self.state = SearchState::Found;
                    info!("covered all {} cells", self.path.len());
                    return StepEvent::Finished(self.state);
                }
                self.state = SearchState::Exploring;
                StepEvent::Advanced(target)
            }
        }
    }

    pub fn run_to_completion(&mut self) -> SearchState {
        while !self.state.is_terminal() {
            self.step();
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.grid.reset();
        self.path.clear();
        self.rejected = None;
        let (cols, rows) = self.grid.dimension();
        self.start = find_valid_start(rows, cols);
        self.state = SearchState::Exploring;
        info!("walk restarts at {:?}", self.start);
    }

    pub fn snapshot(&self) -> WalkSnapshot {
        WalkSnapshot {
            path: self.path.clone(),
            state: self.state,
            rejected: self.rejected,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dimension(&self) -> (usize, usize) {
        self.grid.dimension()
    }

    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }

    fn covers_grid(&self) -> bool {
        self.path.len() == self.grid.cell_count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_walk_invariants(search: &WalkSearch) {
        let mut seen = HashSet::new();
        for position in search.path() {
            assert!(seen.insert(*position), "cell {:?} visited twice", position);
        }

        for pair in search.path().windows(2) {
            let distance = pair[0].x.abs_diff(pair[1].x) + pair[0].y.abs_diff(pair[1].y);
            assert_eq!(
                distance, 1,
                "cells {:?} and {:?} are not adjacent",
                pair[0], pair[1]
            );
        }

        let (cols, rows) = search.dimension();
        for y in 0..rows {
            for x in 0..cols {
                let position = Position::new(x, y);
                let occupied = search.grid().is_occupied(&position).unwrap();
                assert_eq!(occupied, seen.contains(&position));
            }
        }
    }

    #[test]
    fn feasibility_rules() {
        // single-row strip: interior starts split the strip
        assert!(is_impossible(2, 0, 1, 5));
        assert!(!is_impossible(0, 0, 1, 5));
        assert!(!is_impossible(4, 0, 1, 5));
        // single-column strip, symmetric
        assert!(is_impossible(0, 2, 5, 1));
        assert!(!is_impossible(0, 0, 5, 1));
        // odd cell count: minority-color starts can never cover the grid
        assert!(is_impossible(0, 1, 3, 3));
        assert!(is_impossible(1, 0, 3, 3));
        assert!(!is_impossible(0, 0, 3, 3));
        assert!(!is_impossible(1, 1, 3, 3));
        // even cell count: the parity rule never fires
        assert!(!is_impossible(1, 0, 2, 2));
        assert!(!is_impossible(0, 1, 4, 6));
    }

    #[test]
    fn find_valid_start_only_returns_feasible_cells() {
        fastrand::seed(5);
        for _ in 0..200 {
            let rows = fastrand::usize(1..=6);
            let cols = fastrand::usize(1..=6);
            let start = find_valid_start(rows, cols);
            assert!(start.x < cols && start.y < rows);
            assert!(!is_impossible(start.x, start.y, rows, cols));
        }
    }

    #[test]
    fn single_cell_grid_is_found_immediately() {
        let mut search = WalkSearch::new(1, 1).unwrap();

        assert_eq!(search.step(), StepEvent::Finished(SearchState::Found));
        assert_eq!(search.path(), &[Position::new(0, 0)]);
        assert!(search.finished());

        // further steps are no-ops
        assert_eq!(search.step(), StepEvent::Finished(SearchState::Found));
        assert_eq!(search.path().len(), 1);
    }

    #[test]
    fn strip_walk_from_the_end_is_the_only_path() {
        fastrand::seed(9);
        let mut search = WalkSearch::with_start(1, 5, Position::new(0, 0)).unwrap();

        assert_eq!(search.run_to_completion(), SearchState::Found);

        let expected: Vec<_> = (0..5).map(|x| Position::new(x, 0)).collect();
        assert_eq!(search.path(), expected.as_slice());
    }

    #[test]
    fn interior_start_on_a_strip_exhausts() {
        fastrand::seed(11);
        let mut search = WalkSearch::with_start(1, 5, Position::new(2, 0)).unwrap();

        assert_eq!(search.run_to_completion(), SearchState::Exhausted);

        // every mutation was undone on the way out
        assert!(search.path().is_empty());
        for x in 0..5 {
            let position = Position::new(x, 0);
            assert!(!search.grid().is_occupied(&position).unwrap());
            assert_eq!(search.grid.cell(position).options.len(), 4);
        }
    }

    #[test]
    fn rejected_probe_is_reported_and_cleared() {
        fastrand::seed(2);
        let mut search = WalkSearch::with_start(1, 2, Position::new(0, 0)).unwrap();

        assert_eq!(search.step(), StepEvent::Started(Position::new(0, 0)));

        loop {
            match search.step() {
                StepEvent::Rejected { from, direction } => {
                    assert_eq!(from, Position::new(0, 0));
                    assert_eq!(search.snapshot().rejected, Some((from, direction)));
                }
                StepEvent::Finished(state) => {
                    assert_eq!(state, SearchState::Found);
                    break;
                }
                event => panic!("unexpected {:?}", event),
            }
        }

        // the final push cleared the probe
        assert_eq!(search.snapshot().rejected, None);
        assert_eq!(
            search.path(),
            &[Position::new(0, 0), Position::new(1, 0)]
        );
    }

    #[test]
    fn reset_clears_prior_run() {
        fastrand::seed(3);
        let mut search = WalkSearch::with_start(1, 5, Position::new(0, 0)).unwrap();
        assert_eq!(search.run_to_completion(), SearchState::Found);

        search.reset();

        assert!(search.path().is_empty());
        assert_eq!(search.state(), SearchState::Exploring);
        for x in 0..5 {
            let position = Position::new(x, 0);
            assert!(!search.grid().is_occupied(&position).unwrap());
            assert_eq!(search.grid.cell(position).options.len(), 4);
            assert_eq!(search.grid.cell(position).entry, None);
        }

        // the fresh start is feasible again, so the strip is still solvable
        assert_eq!(search.run_to_completion(), SearchState::Found);
        assert_eq!(search.path().len(), 5);
    }

    #[test]
    fn full_grid_walk_covers_every_cell() {
        fastrand::seed(7);
        let mut search = WalkSearch::new(5, 5).unwrap();

        assert_eq!(search.run_to_completion(), SearchState::Found);
        assert_eq!(search.path().len(), 25);
        assert_walk_invariants(&search);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            WalkSearch::new(0, 5).unwrap_err(),
            WalkError::EmptyGrid { rows: 0, cols: 5 }
        );
        assert_eq!(
            WalkSearch::with_start(3, 0, Position::new(0, 0)).unwrap_err(),
            WalkError::EmptyGrid { rows: 3, cols: 0 }
        );
        assert_eq!(
            WalkSearch::with_start(3, 3, Position::new(3, 0)).unwrap_err(),
            WalkError::OutOfBounds(Position::new(3, 0))
        );
    }

    #[test]
    fn fuzz_small_grids_terminate() {
        for seed in 0..32 {
            fastrand::seed(seed);
            let rows = fastrand::usize(1..=6);
            let cols = fastrand::usize(1..=6);
            let mut search = WalkSearch::new(rows, cols).unwrap();

            let mut steps = 0u32;
            while !search.finished() {
                search.step();
                assert_walk_invariants(&search);
                steps += 1;
                assert!(
                    steps <= 200_000,
                    "search on a {}x{} grid did not halt",
                    rows,
                    cols
                );
            }

            match search.state() {
                SearchState::Found => assert_eq!(search.path().len(), rows * cols),
                SearchState::Exhausted => assert!(search.path().is_empty()),
                state => panic!("non-terminal state {:?} after completion", state),
            }
        }
    }
}
