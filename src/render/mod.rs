//! 绘制 GPU 使用率与 GPU 内存的时间序列图

use std::collections::VecDeque;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::error::{Error, Result};
use crate::store::SampleStore;

pub const DEFAULT_PLOT_FILE: &str = "gpu_stats_plot.svg";

/// 画布尺寸 (宽, 高)
pub const PLOT_SIZE: (u32, u32) = (1000, 500);

const FONT: &str = "sans-serif";

#[derive(Debug, Clone)]
pub struct SnapshotRenderer {
    path: PathBuf,
    size: (u32, u32),
}

/// 单个子图的描述
struct Panel<'a, T> {
    title: &'a str,
    y_desc: &'a str,
    color: RGBColor,
    floor: u64, // y 轴最小上限
    values: &'a VecDeque<T>,
}

impl SnapshotRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: PLOT_SIZE,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 绘制并保存, 没有数据时不生成文件并返回 `None`
    pub fn render(&self, store: &SampleStore) -> Result<Option<PathBuf>> {
        if !store.has_gpu_data() {
            info!("No GPU data to plot.");
            return Ok(None);
        }

        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let panels = root.split_evenly((1, 2));
        let timestamps = store.timestamps();

        draw_panel(
            &panels[0],
            timestamps,
            Panel {
                title: "GPU Utilization Over Time",
                y_desc: "GPU Utilization (%)",
                color: BLUE,
                floor: 100,
                values: store.utilization(),
            },
        )?;
        draw_panel(
            &panels[1],
            timestamps,
            Panel {
                title: "GPU Memory Usage Over Time",
                y_desc: "GPU Memory Used (MB)",
                color: RED,
                floor: 0,
                values: store.memory(),
            },
        )?;

        root.present().map_err(render_error)?;
        info!("Plot saved as {}", self.path.display());
        Ok(Some(self.path.clone()))
    }
}

fn draw_panel<DB, T>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    timestamps: &VecDeque<String>,
    panel: Panel<'_, T>,
) -> Result<()>
where
    DB: DrawingBackend,
    T: Copy + Into<u64>,
{
    let max = panel.values.iter().map(|value| Into::<u64>::into(*value)).max().unwrap_or(0);
    // 坐标轴用 f64, 接近 u64::MAX 的读数也能生成刻度
    let y_max = y_upper_bound(max, panel.floor) as f64;
    let points: Vec<(usize, f64)> = panel
        .values
        .iter()
        .enumerate()
        .map(|(idx, value)| (idx, Into::<u64>::into(*value) as f64))
        .collect();

    let x_max = points.len().max(2) - 1;

    let label_at = |idx: &usize| timestamps.get(*idx).cloned().unwrap_or_else(|| idx.to_string());
    let value_label = |value: &f64| format!("{:.0}", value);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..x_max, 0f64..y_max)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc(panel.y_desc)
        .x_labels(8)
        .x_label_formatter(&label_at)
        .y_label_formatter(&value_label)
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(LineSeries::new(points, panel.color.stroke_width(2)))
        .map_err(render_error)?;

    Ok(())
}

/// 留出 10% 的余量, 且不低于 `floor`
fn y_upper_bound(max: u64, floor: u64) -> u64 {
    max.saturating_add(max / 10).max(floor).max(1).saturating_add(1)
}

fn render_error<E: Display>(err: E) -> Error {
    Error::Render(err.to_string())
}
