//! Visualization utilities for mobile_mpc
//!
//! Plot calls only record layers; everything is drawn onto a single gnuplot
//! axes when the figure is shown or saved.

use std::f64::consts::PI;

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{MpcError, MpcResult, Obstacles, Point2D, Pose2D};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const SAFETY_MARGIN: &str = GRAY;
    pub const START: &str = GREEN;
    pub const REFERENCE: &str = BLUE;
    pub const TRAJECTORY: &str = RED;
    pub const HORIZON: &str = ORANGE;
    pub const ROBOT: &str = "#00AAAA";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    /// Legend entry, empty for none
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::TRAJECTORY, "Trajectory")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Line { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// Polygon approximation of a circle, closed
fn circle_outline(center: &Point2D, radius: f64, segments: usize) -> (Vec<f64>, Vec<f64>) {
    (0..=segments)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / segments as f64;
            (center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .unzip()
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    layers: Vec<Layer>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            layers: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Number of recorded plot layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Plot a pose sequence as a line
    pub fn plot_poses(&mut self, poses: &[Pose2D], style: &PathStyle) -> &mut Self {
        let (x, y) = poses.iter().map(|p| (p.x, p.y)).unzip();
        self.layers.push(Layer::Line { x, y, style: style.clone() });
        self
    }

    /// Reference trajectory
    pub fn plot_reference(&mut self, reference: &[Pose2D]) -> &mut Self {
        self.plot_poses(reference, &PathStyle::new(colors::REFERENCE, "Reference").with_line_width(1.0))
    }

    /// Trajectory the robot actually drove
    pub fn plot_trajectory(&mut self, states: &[Pose2D]) -> &mut Self {
        self.plot_poses(states, &PathStyle::default())
    }

    /// Predicted states of one MPC plan
    pub fn plot_horizon(&mut self, predicted: &[Pose2D]) -> &mut Self {
        self.plot_poses(predicted, &PathStyle::new(colors::HORIZON, "Predicted horizon"))
    }

    /// Plot multiple points
    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let (x, y) = points.iter().map(|p| (p.x, p.y)).unzip();
        self.layers.push(Layer::Points { x, y, style: style.clone() });
        self
    }

    /// Plot obstacles, each with its safety margin circle when given
    pub fn plot_obstacles(&mut self, obstacles: &Obstacles, safety_margin: Option<f64>) -> &mut Self {
        if obstacles.is_empty() {
            return self;
        }
        self.layers.push(Layer::Points {
            x: obstacles.x_coords(),
            y: obstacles.y_coords(),
            style: PointStyle::new(colors::OBSTACLE, "Obstacles").with_symbol('S'),
        });
        if let Some(margin) = safety_margin {
            for (i, obstacle) in obstacles.iter().enumerate() {
                let (x, y) = circle_outline(obstacle, margin, 48);
                let caption = if i == 0 { "Safety margin" } else { "" };
                let style = PathStyle::new(colors::SAFETY_MARGIN, caption).with_line_width(1.0);
                self.layers.push(Layer::Line { x, y, style });
            }
        }
        self
    }

    /// Plot robot pose with direction indicator
    pub fn plot_robot(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        self.plot_points(&[pose.position()], &PointStyle::new(colors::ROBOT, "Robot").with_size(size));

        let arrow_len = size * 0.5;
        let end_x = pose.x + arrow_len * pose.yaw.cos();
        let end_y = pose.y + arrow_len * pose.yaw.sin();
        self.layers.push(Layer::Line {
            x: vec![pose.x, end_x],
            y: vec![pose.y, end_y],
            style: PathStyle::new(colors::ROBOT, ""),
        });
        self
    }

    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_points(&[point], &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> MpcResult<()> {
        self.render();
        self.figure
            .show()
            .map(|_| ())
            .map_err(|e| MpcError::Visualization(e.to_string()))
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> MpcResult<()> {
        self.render();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| MpcError::Visualization(e.to_string()))
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str) -> MpcResult<()> {
        self.render();
        self.figure
            .save_to_svg(path, 800, 600)
            .map_err(|e| MpcError::Visualization(e.to_string()))
    }

    fn render(&mut self) {
        self.figure.clear_axes();
        let axes = self.figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Line { x, y, style } => {
                    axes.lines(x, y, &[
                        Caption(style.caption.as_str()),
                        Color(style.color.as_str()),
                        LineWidth(style.line_width),
                    ]);
                }
                Layer::Points { x, y, style } => {
                    axes.points(x, y, &[
                        Caption(style.caption.as_str()),
                        Color(style.color.as_str()),
                        PointSymbol(style.symbol),
                        PointSize(style.size),
                    ]);
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualizer_creation() {
        let vis = Visualizer::new();
        assert!(vis.aspect_ratio.is_some());
        assert_eq!(vis.layer_count(), 0);
    }

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::RED, "Test Path").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::RED);
    }

    #[test]
    fn test_obstacles_with_margins() {
        let obstacles = Obstacles::from(vec![(1.0, 1.0), (-1.0, 0.0)]);
        let mut vis = Visualizer::new();
        vis.plot_obstacles(&obstacles, Some(0.5));
        // one point layer plus one circle per obstacle
        assert_eq!(vis.layer_count(), 3);

        let mut bare = Visualizer::new();
        bare.plot_obstacles(&Obstacles::new(), Some(0.5));
        assert_eq!(bare.layer_count(), 0);
    }

    #[test]
    fn test_circle_outline_closed() {
        let (x, y) = circle_outline(&Point2D::new(1.0, -1.0), 0.5, 16);
        assert_eq!(x.len(), 17);
        assert!((x[0] - x[16]).abs() < 1e-12 && (y[0] - y[16]).abs() < 1e-12);
        for (px, py) in x.iter().zip(&y) {
            let r = ((px - 1.0).powi(2) + (py + 1.0).powi(2)).sqrt();
            assert!((r - 0.5).abs() < 1e-12);
        }
    }
}
