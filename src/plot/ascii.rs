//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid with deterministic output (handy for golden
//! tests). One plot per profile fit:
//!
//! - fitted samples: `o`
//! - fitted model curve: `-` line

use crate::domain::ModelFit;
use crate::models::predict;

/// Plot the samples a model was fitted to, with the fitted curve overlaid.
pub fn render_fit_plot(title: &str, x: &[f64], y: &[f64], fit: Option<&ModelFit>, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    let (x_min, x_max) = extent(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let curve = fit.map(|f| sample_curve(f, x_min, x_max, width.max(2)));
    render_plot(title, &points, curve.as_deref(), x_min, x_max, width, height)
}

fn render_plot(
    title: &str,
    points: &[(f64, f64)],
    curve_points: Option<&[(f64, f64)]>,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let curve_y = curve_points.unwrap_or(&[]).iter().map(|p| p.1);
    let (y_min, y_max) = extent(points.iter().map(|p| p.1).chain(curve_y)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    if let Some(curve) = curve_points {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {title} | x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// `(min, max)` of finite values, if they span a non-empty interval.
fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (hi > lo).then_some((lo, hi))
}

fn sample_curve(fit: &ModelFit, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = x_min + u * (x_max - x_min);
            (x, predict(fit.model, x, &fit.params))
        })
        .filter(|(_, y)| y.is_finite())
        .collect()
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Bresenham line; only blank cells are drawn over.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, ProfileModel};

    fn flat_line(level: f64) -> ModelFit {
        ModelFit {
            model: ProfileModel::Linear,
            params: vec![0.0, level],
            covariance: None,
            std_errors: None,
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                n: 2,
                dof: 0,
            },
            iterations: 0,
            termination: "closed-form least squares".to_string(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_fit_plot("ln mass vs R", &[1.0, 10.0], &[100.0, 110.0], Some(&flat_line(100.0)), 10, 5);
        let expected = concat!(
            "Plot: ln mass vs R | x=[1.000, 10.000] | y=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_without_fit_shows_points_only() {
        let txt = render_fit_plot("mass vs z", &[-1.0, 0.0, 1.0], &[1.0, 3.0, 1.0], None, 11, 5);
        let body: String = txt.lines().skip(1).collect();
        assert!(!body.contains('-'));
        assert_eq!(body.matches('o').count(), 3);
    }
}
