//! Scatter chart widget.
//!
//! The size dimension is drawn as three tertile buckets, each its own
//! dataset with a distinct marker and colour. The selected point is drawn
//! last, on top, as a solid block.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType};
use ratatui::Frame;
use valuescreen_core::chart::{ChartSpec, ScatterPoint};

use crate::theme::Theme;

pub const BUCKET_NAMES: [&str; 3] = ["low", "mid", "high"];
const BUCKET_MARKERS: [Marker; 3] = [Marker::Braille, Marker::Dot, Marker::Block];

/// Tertile bucket (0, 1, 2) of every point's size, by rank.
///
/// Equal sizes always share a bucket.
pub fn size_buckets(points: &[ScatterPoint]) -> Vec<usize> {
    let n = points.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| points[a].size.total_cmp(&points[b].size));

    let mut buckets = vec![0; n];
    let mut rank = 0;
    while rank < n {
        // Ties take the bucket of their first rank.
        let bucket = (rank * 3 / n).min(2);
        let size = points[order[rank]].size;
        while rank < n && points[order[rank]].size == size {
            buckets[order[rank]] = bucket;
            rank += 1;
        }
    }
    buckets
}

/// Inclusive `[min, max]` size range of each bucket, `None` when empty.
pub fn bucket_ranges(points: &[ScatterPoint], buckets: &[usize]) -> [Option<(f64, f64)>; 3] {
    let mut ranges = [None; 3];
    for (p, &b) in points.iter().zip(buckets) {
        ranges[b] = Some(match ranges[b] {
            None => (p.size, p.size),
            Some((lo, hi)) => (f64::min(lo, p.size), f64::max(hi, p.size)),
        });
    }
    ranges
}

/// Padded axis bounds over the given values.
pub fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo).abs() * 0.05).max(0.5);
    [lo - pad, hi + pad]
}

/// Draw the chart for `points` into `area`. `selected` indexes `points`.
pub fn render(
    f: &mut Frame,
    area: Rect,
    spec: &ChartSpec,
    points: &[ScatterPoint],
    selected: Option<usize>,
    theme: &Theme,
) {
    let buckets = size_buckets(points);
    let ranges = bucket_ranges(points, &buckets);

    let series: Vec<Vec<(f64, f64)>> = (0..3)
        .map(|b| {
            points
                .iter()
                .zip(&buckets)
                .filter(|(_, pb)| **pb == b)
                .map(|(p, _)| (p.x, p.y))
                .collect()
        })
        .collect();
    let highlight: Vec<(f64, f64)> = selected
        .and_then(|i| points.get(i))
        .map(|p| vec![(p.x, p.y)])
        .unwrap_or_default();

    let mut datasets = Vec::with_capacity(4);
    for (b, data) in series.iter().enumerate() {
        let label = match ranges[b] {
            Some((lo, hi)) => format!("{} {}: {lo:.1}..{hi:.1}", BUCKET_NAMES[b], spec.size),
            None => format!("{} {}", BUCKET_NAMES[b], spec.size),
        };
        datasets.push(
            Dataset::default()
                .name(label)
                .marker(BUCKET_MARKERS[b])
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.bucket_color(b)))
                .data(data),
        );
    }
    if !highlight.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(theme.highlight())
                .data(&highlight),
        );
    }

    let x_bounds = bounds(points.iter().map(|p| p.x));
    let y_bounds = bounds(points.iter().map(|p| p.y));

    let chart = Chart::new(datasets)
        .style(theme.canvas())
        .block(Block::bordered().title(Span::styled(spec.title.clone(), theme.highlight())))
        .x_axis(
            Axis::default()
                .title(Span::styled(spec.x, theme.muted()))
                .style(theme.muted())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, theme)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y, theme.muted()))
                .style(theme.muted())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, theme)),
        );

    f.render_widget(chart, area);
}

fn axis_labels(b: [f64; 2], theme: &Theme) -> Vec<Span<'static>> {
    let mid = (b[0] + b[1]) / 2.0;
    [b[0], mid, b[1]]
        .into_iter()
        .map(|v| Span::styled(format!("{v:.1}"), theme.muted()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: &str, size: f64) -> ScatterPoint {
        ScatterPoint {
            identifier: id.into(),
            x: 0.0,
            y: 0.0,
            size,
        }
    }

    #[test]
    fn six_points_split_evenly() {
        let points: Vec<_> = [30.0, 10.0, 50.0, 20.0, 60.0, 40.0]
            .iter()
            .enumerate()
            .map(|(i, &s)| pt(&i.to_string(), s))
            .collect();
        assert_eq!(size_buckets(&points), vec![1, 0, 2, 0, 2, 1]);
    }

    #[test]
    fn ties_share_a_bucket() {
        let points = vec![pt("a", 5.0), pt("b", 5.0), pt("c", 5.0)];
        assert_eq!(size_buckets(&points), vec![0, 0, 0]);
    }

    #[test]
    fn single_point_is_low_bucket() {
        assert_eq!(size_buckets(&[pt("a", 12.0)]), vec![0]);
        assert!(size_buckets(&[]).is_empty());
    }

    #[test]
    fn ranges_follow_buckets() {
        let points = vec![pt("a", 10.0), pt("b", 20.0), pt("c", 30.0)];
        let buckets = size_buckets(&points);
        let ranges = bucket_ranges(&points, &buckets);
        assert_eq!(ranges[0], Some((10.0, 10.0)));
        assert_eq!(ranges[2], Some((30.0, 30.0)));
    }

    #[test]
    fn bounds_pad_and_default() {
        assert_eq!(bounds(std::iter::empty()), [0.0, 1.0]);
        let b = bounds([1.0, 3.0].into_iter());
        assert!(b[0] < 1.0 && b[1] > 3.0);
    }
}
