//! Heatmaps of the similarity matrix (display only).

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::core::similarity::SimilarityMatrix;

const LOW: (u8, u8, u8) = (75, 29, 91);
const HIGH: (u8, u8, u8) = (237, 176, 129);

/// Dark purple at 0, light orange at 1.
fn color_at(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(lerp(LOW.0, HIGH.0), lerp(LOW.1, HIGH.1), lerp(LOW.2, HIGH.2))
}

/// Cumulative block edges for cluster sizes, e.g. [3, 2, 4] -> [3, 5].
pub fn block_edges(sizes: &[usize]) -> Vec<usize> {
    let mut edges = Vec::with_capacity(sizes.len().saturating_sub(1));
    let mut acc = 0;
    for &s in sizes.iter().take(sizes.len().saturating_sub(1)) {
        acc += s;
        edges.push(acc);
    }
    edges
}

/// Render `matrix` as a heatmap, row 0 at the top. `edges` are drawn as
/// block boundaries after the given row/column counts.
pub fn render_similarity_heatmap(
    out_path: &Path,
    matrix: &SimilarityMatrix,
    title: &str,
    edges: &[usize],
) -> Result<(), Box<dyn Error>> {
    let n = matrix.n();
    let (lo, hi) = matrix
        .as_slice()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let size = n as f64;

    let root = BitMapBackend::new(out_path, (1000, 960)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..size, 0.0..size)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("subject")
        .y_desc("subject")
        .y_label_formatter(&|y| format!("{:.0}", size - y))
        .draw()?;

    chart.draw_series(
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                let color = color_at((matrix.get(i, j) - lo) / span);
                let top = size - i as f64;
                Rectangle::new(
                    [(j as f64, top - 1.0), (j as f64 + 1.0, top)],
                    color.filled(),
                )
            }),
    )?;

    for &edge in edges {
        let e = edge as f64;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(e, 0.0), (e, size)],
            WHITE.stroke_width(2),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, size - e), (size, size - e)],
            WHITE.stroke_width(2),
        )))?;
    }

    root.present()?;
    Ok(())
}
