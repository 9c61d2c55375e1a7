//! Chart kinds and scatter-point extraction.
//!
//! Every chart plots revenue growth on x against one valuation metric on y,
//! with the trailing P/E as the size dimension.

use crate::table::{ColumnValues, Identifier, WideTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GROWTH_COLUMN: &str = "Quarterly Revenue Growth (yoy) %";
pub const SIZE_COLUMN: &str = "Trailing P/E";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    RatioVsGrowthVsPe,
    DividendVsGrowthVsPe,
    PriceToBookVsGrowthVsPe,
    EvEbitdaVsGrowthVsPe,
}

/// Axis assignment and title for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub x: &'static str,
    pub y: &'static str,
    pub size: &'static str,
    pub title: String,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::RatioVsGrowthVsPe,
        ChartKind::DividendVsGrowthVsPe,
        ChartKind::PriceToBookVsGrowthVsPe,
        ChartKind::EvEbitdaVsGrowthVsPe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::RatioVsGrowthVsPe => "ratio-vs-growth-vs-pe",
            ChartKind::DividendVsGrowthVsPe => "dividend-vs-growth-vs-pe",
            ChartKind::PriceToBookVsGrowthVsPe => "price-to-book-vs-growth-vs-pe",
            ChartKind::EvEbitdaVsGrowthVsPe => "ev-ebitda-vs-growth-vs-pe",
        }
    }

    /// Short alias accepted on the command line.
    pub fn alias(self) -> &'static str {
        match self {
            ChartKind::RatioVsGrowthVsPe => "valuePS",
            ChartKind::DividendVsGrowthVsPe => "valueDiv",
            ChartKind::PriceToBookVsGrowthVsPe => "valuePB",
            ChartKind::EvEbitdaVsGrowthVsPe => "valueEBITDA",
        }
    }

    pub fn y_column(self) -> &'static str {
        match self {
            ChartKind::RatioVsGrowthVsPe => "Price/Sales (ttm)",
            ChartKind::DividendVsGrowthVsPe => "Trailing Annual Dividend Yield %",
            ChartKind::PriceToBookVsGrowthVsPe => "Price/Book (mrq)",
            ChartKind::EvEbitdaVsGrowthVsPe => "Enterprise Value/EBITDA",
        }
    }

    pub fn spec(self) -> ChartSpec {
        let y = self.y_column();
        ChartSpec {
            x: GROWTH_COLUMN,
            y,
            size: SIZE_COLUMN,
            title: format!("{GROWTH_COLUMN} vs. {y} vs. {SIZE_COLUMN}"),
        }
    }

    /// Next kind in display order, wrapping around.
    pub fn next(self) -> ChartKind {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChartKind(pub String);

impl fmt::Display for UnknownChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chart kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownChartKind {}

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.name() == s || k.alias() == s)
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

/// Usage text listing every valid chart kind.
pub fn usage() -> String {
    let mut out = String::from("valid chart kinds:\n");
    for kind in ChartKind::ALL {
        out.push_str(&format!(
            "  {:<32} (alias {:<12}) {}\n",
            kind.name(),
            kind.alias(),
            kind.spec().title
        ));
    }
    out
}

/// One plotted row. `identifier` is the hover label.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub identifier: Identifier,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Points for a chart, in table row order. Rows missing any of the three
/// values (or holding them as text) are skipped.
pub fn scatter_points(table: &WideTable, kind: ChartKind) -> Vec<ScatterPoint> {
    let spec = kind.spec();
    let (Some(xs), Some(ys), Some(sizes)) = (
        float_cells(table, spec.x),
        float_cells(table, spec.y),
        float_cells(table, spec.size),
    ) else {
        tracing::warn!(chart = %kind, "table lacks a numeric column for this chart");
        return Vec::new();
    };

    table
        .identifiers()
        .iter()
        .enumerate()
        .filter_map(|(row, id)| {
            let x = xs[row].filter(|v| v.is_finite())?;
            let y = ys[row].filter(|v| v.is_finite())?;
            let size = sizes[row].filter(|v| v.is_finite())?;
            Some(ScatterPoint {
                identifier: id.clone(),
                x,
                y,
                size,
            })
        })
        .collect()
}

fn float_cells<'a>(table: &'a WideTable, name: &str) -> Option<&'a [Option<f64>]> {
    match &table.column(name)?.values {
        ColumnValues::Float(v) => Some(v),
        ColumnValues::Text(_) => None,
    }
}
