//! Text chart of the cumulative win-rate curve against the best arm's true
//! win rate.

const CURVE: char = '*';
const REFERENCE: char = '-';

/// Render `curve` (values in [0, 1]) into a `width` x `height` character grid
/// with a horizontal line at `reference`. Long curves are downsampled by
/// taking the value at the end of each column's span of trials.
pub fn render(curve: &[f64], reference: f64, width: usize, height: usize) -> String {
    if curve.is_empty() {
        return "no trials run\n".to_string();
    }
    let width = width.clamp(2, curve.len().max(2));
    let height = height.max(2);
    let row_of = |value: f64| -> usize {
        let value = value.clamp(0.0, 1.0);
        ((1.0 - value) * (height - 1) as f64).round() as usize
    };

    let mut grid = vec![vec![' '; width]; height];
    let reference_row = row_of(reference);
    for cell in &mut grid[reference_row] {
        *cell = REFERENCE;
    }
    for (column, cell_value) in sample_columns(curve, width).into_iter().enumerate() {
        grid[row_of(cell_value)][column] = CURVE;
    }

    let mut out = String::new();
    for (row, cells) in grid.iter().enumerate() {
        let label = if row == 0 {
            "1.00".to_string()
        } else if row == height - 1 {
            "0.00".to_string()
        } else if row == reference_row {
            format!("{reference:.2}")
        } else {
            String::new()
        };
        out.push_str(&format!("{label:>5} |"));
        out.extend(cells.iter());
        out.push('\n');
    }
    out.push_str(&format!("{:>5} +{}\n", "", "-".repeat(width)));
    let last = format!("trial {}", curve.len());
    let gap = (width + 1).saturating_sub("trial 1".len() + last.len());
    out.push_str(&format!("{:>6} trial 1{}{last}\n", "", " ".repeat(gap)));
    out
}

fn sample_columns(curve: &[f64], width: usize) -> Vec<f64> {
    let n = curve.len();
    (0..width)
        .map(|column| {
            let end = ((column + 1) * n).div_ceil(width).clamp(1, n);
            curve[end - 1]
        })
        .collect()
}
