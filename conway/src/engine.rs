// engine.rs - Cellular automaton engine with maturity, dead-time and fade tracking

use tracing::{debug, warn};

use crate::error::{LifeError, RuleParseError};
use crate::grid::{CellGrid, CounterGrid};
use crate::patterns::Pattern;
use crate::rng::Sampler;
use crate::rules::RuleSet;

/// Default ghost-trail length in ticks.
pub const DEFAULT_FADE_DURATION: u32 = 5;

/// Emitted once per [`Engine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    pub generation: u64,
    pub population: usize,
}

/// Full deep copy of the engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSnapshot {
    grid: CellGrid,
    maturity: CounterGrid,
    dead: CounterGrid,
    fade: CounterGrid,
    generation: u64,
    rules: RuleSet,
}

impl GenerationSnapshot {
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn maturity(&self) -> &CounterGrid {
        &self.maturity
    }

    pub fn dead(&self) -> &CounterGrid {
        &self.dead
    }

    pub fn fade(&self) -> &CounterGrid {
        &self.fade
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn rows(&self) -> usize {
        self.grid.row_count()
    }

    pub fn cols(&self) -> usize {
        self.grid.col_count()
    }
}

/// Owns the live grid and its three tracking layers.
///
/// All four grids always share the same dimensions.
#[derive(Debug, Clone)]
pub struct Engine {
    grid: CellGrid,
    next_grid: CellGrid,
    maturity: CounterGrid,
    dead: CounterGrid,
    fade: CounterGrid,
    generation: u64,
    rules: RuleSet,
    fade_duration: u32,
}

fn check_dims(rows: usize, cols: usize) -> Result<(), LifeError> {
    if rows == 0 || cols == 0 {
        return Err(LifeError::InvalidDimensions { rows, cols });
    }
    Ok(())
}

impl Engine {
    pub fn new(rows: usize, cols: usize) -> Result<Self, LifeError> {
        check_dims(rows, cols)?;
        Ok(Self {
            grid: CellGrid::new(rows, cols),
            next_grid: CellGrid::new(rows, cols),
            maturity: CounterGrid::new(rows, cols),
            dead: CounterGrid::new(rows, cols),
            fade: CounterGrid::new(rows, cols),
            generation: 0,
            rules: RuleSet::CONWAY,
            fade_duration: DEFAULT_FADE_DURATION,
        })
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_fade_duration(mut self, ticks: u32) -> Self {
        self.fade_duration = ticks;
        self
    }

    pub fn rows(&self) -> usize {
        self.grid.row_count()
    }

    pub fn cols(&self) -> usize {
        self.grid.col_count()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn maturity(&self) -> &CounterGrid {
        &self.maturity
    }

    pub fn dead(&self) -> &CounterGrid {
        &self.dead
    }

    pub fn fade(&self) -> &CounterGrid {
        &self.fade
    }

    pub fn population(&self) -> usize {
        self.grid.population()
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    pub fn fade_duration(&self) -> u32 {
        self.fade_duration
    }

    pub fn set_fade_duration(&mut self, ticks: u32) {
        self.fade_duration = ticks;
    }

    /// Advance one generation.
    pub fn step(&mut self) -> TickInfo {
        let (rows, cols) = self.grid.dims();
        for row in 0..rows {
            for col in 0..cols {
                let count = self.grid.live_neighbors(row, col);
                let next_state = self.rules.next_state(self.grid.is_alive(row, col), count);
                self.next_grid.set(row, col, next_state);
            }
        }

        let before = self.grid.cells();
        let after = self.next_grid.cells();
        let layers = self
            .maturity
            .cells_mut()
            .iter_mut()
            .zip(self.dead.cells_mut())
            .zip(self.fade.cells_mut());

        for ((&was_alive, &is_alive), ((maturity, dead), fade)) in before.iter().zip(after).zip(layers) {
            *maturity = match (was_alive, is_alive) {
                (true, true) => *maturity + 1,   // Survived
                _ => 0,                          // Born, died or stayed dead
            };
            *dead = match (was_alive, is_alive) {
                (false, false) => *dead + 1,
                _ => 0,
            };
            *fade = fade.saturating_sub(1);
            if was_alive && !is_alive {
                *fade = self.fade_duration;
            } else if is_alive {
                *fade = 0;
            }
        }

        std::mem::swap(&mut self.grid, &mut self.next_grid);
        self.generation += 1;

        TickInfo {
            generation: self.generation,
            population: self.grid.population(),
        }
    }

    /// Out-of-range reads are dead.
    pub fn get_cell(&self, row: usize, col: usize) -> bool {
        self.grid.is_alive(row, col)
    }

    pub fn maturity_at(&self, row: usize, col: usize) -> u32 {
        self.maturity.get(row, col).copied().unwrap_or(0)
    }

    pub fn dead_at(&self, row: usize, col: usize) -> u32 {
        self.dead.get(row, col).copied().unwrap_or(0)
    }

    pub fn fade_at(&self, row: usize, col: usize) -> u32 {
        self.fade.get(row, col).copied().unwrap_or(0)
    }

    /// Out-of-range writes are ignored.
    pub fn set_cell(&mut self, row: usize, col: usize, alive: bool) {
        if !self.grid.set(row, col, alive) {
            return;
        }
        if alive {
            self.dead.set(row, col, 0);
            self.fade.set(row, col, 0);
        } else {
            self.maturity.set(row, col, 0);
        }
    }

    pub fn toggle_cell(&mut self, row: usize, col: usize) {
        let alive = self.get_cell(row, col);
        self.set_cell(row, col, !alive);
    }

    /// Reinitialize every layer to `rows x cols`. Content is not preserved.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<(), LifeError> {
        check_dims(rows, cols)?;
        debug!(rows, cols, "resizing grid");
        self.reinit(rows, cols);
        Ok(())
    }

    fn reinit(&mut self, rows: usize, cols: usize) {
        self.grid = CellGrid::new(rows, cols);
        self.next_grid = CellGrid::new(rows, cols);
        self.maturity = CounterGrid::new(rows, cols);
        self.dead = CounterGrid::new(rows, cols);
        self.fade = CounterGrid::new(rows, cols);
        self.generation = 0;
    }

    pub fn clear(&mut self) {
        self.grid.reset();
        self.maturity.reset();
        self.dead.reset();
        self.fade.reset();
        self.generation = 0;
    }

    /// Replace the grid with random cells, alive with probability `density`.
    ///
    /// The same `seed` always produces the same grid.
    pub fn randomize(&mut self, density: f64, seed: Option<u64>) {
        debug!(density, ?seed, "randomizing grid");
        self.clear();
        self.sprinkle(density, seed, |_, _| true);
    }

    pub fn invert(&mut self) {
        let (rows, cols) = self.grid.dims();
        for row in 0..rows {
            for col in 0..cols {
                self.toggle_cell(row, col);
            }
        }
    }

    /// Seed the border band of width `max(1, min(rows, cols) / 10)`.
    pub fn fill_edges(&mut self, density: f64, seed: Option<u64>) {
        let (rows, cols) = self.grid.dims();
        let band = (rows.min(cols) / 10).max(1);
        self.sprinkle(density, seed, |row, col| {
            row < band || col < band || row >= rows - band || col >= cols - band
        });
    }

    /// Seed the disc of radius `min(rows, cols) / 6` around the centre.
    pub fn fill_center(&mut self, density: f64, seed: Option<u64>) {
        let (rows, cols) = self.grid.dims();
        let radius = rows.min(cols) as f64 / 6.0;
        let (center_row, center_col) = (rows as f64 / 2.0, cols as f64 / 2.0);
        self.sprinkle(density, seed, |row, col| {
            let dr = row as f64 + 0.5 - center_row;
            let dc = col as f64 + 0.5 - center_col;
            dr * dr + dc * dc <= radius * radius
        });
    }

    // Bring cells inside `region` to life with probability `density`; others untouched
    fn sprinkle(&mut self, density: f64, seed: Option<u64>, region: impl Fn(usize, usize) -> bool) {
        let density = density.clamp(0.0, 1.0);
        let mut sampler = Sampler::from_seed(seed);
        let (rows, cols) = self.grid.dims();
        for row in 0..rows {
            for col in 0..cols {
                if region(row, col) && sampler.chance(density) {
                    self.set_cell(row, col, true);
                }
            }
        }
    }

    /// Write a pattern's live cells with its top-left corner at `(row, col)`,
    /// clipping anything outside the grid.
    pub fn stamp(&mut self, pattern: &Pattern, row: usize, col: usize) {
        for &(dr, dc) in pattern.cells {
            self.set_cell(row + dr, col + dc, true);
        }
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        GenerationSnapshot {
            grid: self.grid.clone(),
            maturity: self.maturity.clone(),
            dead: self.dead.clone(),
            fade: self.fade.clone(),
            generation: self.generation,
            rules: self.rules,
        }
    }

    /// Adopt a snapshot, including its dimensions. May move `generation` backwards.
    pub fn restore(&mut self, snapshot: &GenerationSnapshot) {
        let (rows, cols) = snapshot.grid.dims();
        self.grid = snapshot.grid.clone();
        self.next_grid = CellGrid::new(rows, cols);
        self.maturity = snapshot.maturity.clone();
        self.dead = snapshot.dead.clone();
        self.fade = snapshot.fade.clone();
        self.generation = snapshot.generation;
        self.rules = snapshot.rules;
    }

    /// Display a replayed frame. Tracking layers start over from zero.
    pub fn load_frame(&mut self, grid: &CellGrid, generation: u64) {
        let (rows, cols) = grid.dims();
        if rows == 0 || cols == 0 {
            warn!(rows, cols, "ignoring empty frame");
            return;
        }
        if self.grid.dims() == (rows, cols) {
            self.maturity.reset();
            self.dead.reset();
            self.fade.reset();
        } else {
            self.reinit(rows, cols);
        }
        self.grid.cells_mut().copy_from_slice(grid.cells());
        self.generation = generation;
    }

    /// Parse and apply a `B<digits>/S<digits>` rule string.
    ///
    /// On failure the engine falls back to `B3/S23` and the parse error is returned
    /// so the caller can tell the user.
    pub fn set_rules_from_string(&mut self, rule: &str) -> Result<(), RuleParseError> {
        match rule.parse::<RuleSet>() {
            Ok(rules) => {
                self.rules = rules;
                Ok(())
            }
            Err(err) => {
                warn!(rule, %err, "invalid rule string, falling back to B3/S23");
                self.rules = RuleSet::CONWAY;
                Err(err)
            }
        }
    }

    pub fn rules_as_string(&self) -> String {
        self.rules.to_string()
    }
}
