use rayon::prelude::*;
use thiserror::Error;

const FILLED: char = '*';
const BLANK: char = ' ';
const BORDER: char = '|';

const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

// Terminal cells are roughly twice as tall as wide, so the column count is
// doubled to keep the rendered set from looking squashed.
const STRETCH: f64 = 2.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidViewport {
    #[error("plane bounds must satisfy lower < upper on both axes")]
    EmptyPlane,
    #[error("line count must be positive")]
    NoLines,
    #[error("iteration limit must be positive")]
    NoIterationBudget,
}

/// The fixed region of the complex plane rendered by `/work`, plus the
/// escape-iteration budget. Immutable once built; every render call over the
/// same viewport produces byte-identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    lower_r: f64,
    upper_i: f64,
    lines: usize,
    columns: usize,
    step_r: f64,
    step_i: f64,
    limit: usize,
}

impl Viewport {
    pub fn new(
        lower_r: f64,
        lower_i: f64,
        upper_r: f64,
        upper_i: f64,
        lines: usize,
        limit: usize,
    ) -> Result<Self, InvalidViewport> {
        // The comparisons also reject NaN bounds.
        if !(upper_r > lower_r) || !(upper_i > lower_i) {
            return Err(InvalidViewport::EmptyPlane);
        }
        if lines == 0 {
            return Err(InvalidViewport::NoLines);
        }
        if limit == 0 {
            return Err(InvalidViewport::NoIterationBudget);
        }

        let width = upper_r - lower_r;
        let height = upper_i - lower_i;
        let columns = (width / height * lines as f64 * STRETCH) as usize;

        Ok(Self {
            lower_r,
            upper_i,
            lines,
            columns,
            step_r: width / columns as f64,
            step_i: height / lines as f64,
            limit,
        })
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Renders the membership grid as text: one line per row, wrapped in a
    /// leading and trailing border glyph. Rows only depend on their own
    /// imaginary coordinate, so they are computed in parallel; the collect
    /// preserves row order regardless of completion order.
    pub fn render(&self) -> String {
        let rows: Vec<String> = (0..self.lines)
            .into_par_iter()
            .map(|line| self.render_line(self.upper_i - line as f64 * self.step_i))
            .collect();

        format!("{BORDER}{}{BORDER}", rows.join("\n"))
    }

    fn render_line(&self, ci: f64) -> String {
        (0..self.columns)
            .map(|column| self.lower_r + column as f64 * self.step_r)
            .map(|cr| match self.escape_margin(cr, ci) < self.limit * 95 / 100 {
                true => FILLED,
                false => BLANK,
            })
            .collect()
    }

    /// Escape-time test for c = (cr, ci), iterating z ← z² + c from z₀ = c.
    ///
    /// Returns the iterations left in the budget when the orbit left the
    /// escape radius: 0 means the point survived the whole budget and is
    /// treated as a set member, a count near the limit means it escaped
    /// almost immediately.
    pub fn escape_margin(&self, cr: f64, ci: f64) -> usize {
        let mut zr = cr;
        let mut zi = ci;

        let mut zr2 = zr * zr;
        let mut zi2 = zi * zi;

        let mut remaining = self.limit;
        while remaining > 0 && zr2 + zi2 < ESCAPE_RADIUS_SQUARED {
            remaining -= 1;

            // zi first: its formula needs the old zr, zr's needs only the
            // squares saved above.
            zi = 2.0 * zr * zi + ci;
            zr = zr2 - zi2 + cr;

            zr2 = zr * zr;
            zi2 = zi * zi;
        }
        remaining
    }
}
