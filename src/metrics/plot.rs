//! # 能量分布图
//!
//! 绘制每个候选结构相对参考的能量散点图 (PNG)。
//!
//! ## 依赖关系
//! - 被 `commands/evaluate.rs` 调用
//! - 使用 `plotters` crate

use crate::error::{EvalError, Result};
use std::path::Path;

/// 稳定阈值参考线 (eV/atom)，与指标 `frac_stable` 一致
const STABILITY_LINE_EV: f64 = 0.1;

/// 绘制能量高于参考的散点图
///
/// `values[i]` 为第 i 个结构相对参考的能量 (eV/atom)；None（被拒绝或
/// 无同式参考）的结构不出现在图中。
pub fn plot_energy_above_reference(values: &[Option<f64>], output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|e| (i + 1, e)))
        .collect();

    if points.is_empty() {
        return Err(EvalError::Other(
            "No energy data to plot (no compatible structures with reference entries)".to_string(),
        ));
    }

    let y_min = points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let y_max = points
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs() * 0.1).max(0.05);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| EvalError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Energy Above Reference", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            0.5..(values.len() as f64 + 0.5),
            (y_min - y_margin)..(y_max + y_margin),
        )
        .map_err(|e| EvalError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Structure")
        .y_desc("E above reference (eV/atom)")
        .draw()
        .map_err(|e| EvalError::Other(e.to_string()))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|(x, y)| Circle::new((*x as f64, *y), 4, RED.filled())),
        )
        .map_err(|e| EvalError::Other(e.to_string()))?
        .label("candidates")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

    // 稳定阈值参考线
    chart
        .draw_series(LineSeries::new(
            [
                (0.5, STABILITY_LINE_EV),
                (values.len() as f64 + 0.5, STABILITY_LINE_EV),
            ],
            GREEN.stroke_width(2),
        ))
        .map_err(|e| EvalError::Other(e.to_string()))?
        .label("stability threshold")
        .legend(|(x, y)| {
            plotters::prelude::PathElement::new([(x, y), (x + 20, y)], GREEN.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| EvalError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| EvalError::Other(e.to_string()))?;

    Ok(())
}
