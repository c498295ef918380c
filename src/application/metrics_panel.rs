// Metrics panel - stateful elevation chart for the active line, drawn into a display list
use crate::domain::entities::LineId;
use crate::domain::geodesy::LineReadout;
use crate::domain::profile::ElevationProfile;
use serde::Serialize;

pub const DEFAULT_WIDTH: u32 = 380;
pub const DEFAULT_HEIGHT: u32 = 190;

const PAD_LEFT: f64 = 44.0;
const PAD_RIGHT: f64 = 12.0;
const PAD_TOP: f64 = 8.0;
const PAD_BOTTOM: f64 = 12.0;
const HEADER_GAP: f64 = 6.0;
const FOOTER_BAND: f64 = 24.0;
const GRID_ROWS: usize = 4;
const MAX_DOTS: usize = 18;
const MIN_SPAN: f64 = 1e-6;

const TITLE: &str = "Elevation profile (m)";
const NO_DATA: &str = "No elevation data";

const PANEL_BASE: Rgba = Rgba::new(18, 16, 29, 0.9);
const BACKGROUND_TOP: Rgba = Rgba::new(255, 255, 255, 0.06);
const BACKGROUND_BOTTOM: Rgba = Rgba::new(255, 255, 255, 0.02);
const TITLE_COLOR: Rgba = Rgba::new(234, 234, 242, 0.9);
const GRID_COLOR: Rgba = Rgba::new(255, 255, 255, 0.06);
const LABEL_COLOR: Rgba = Rgba::new(255, 255, 255, 0.65);
const PLACEHOLDER_COLOR: Rgba = Rgba::new(255, 255, 255, 0.5);
const STATUS_COLOR: Rgba = Rgba::new(255, 255, 255, 0.7);
const FILL_TOP: Rgba = Rgba::new(30, 136, 229, 0.40);
const FILL_BOTTOM: Rgba = Rgba::new(30, 136, 229, 0.03);
const CURVE_COLOR: Rgba = Rgba::new(30, 136, 229, 1.0);
const CURVE_GLOW: Rgba = Rgba::new(30, 136, 229, 0.7);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Channel-wise blend, `t = 0` gives `self`
    pub fn mix(self, other: Rgba, t: f64) -> Rgba {
        let channel = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
        Rgba {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    QuadTo { ctrl: Point, to: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Solid base with a vertical gradient laid over it
    Background {
        rect: Rect,
        fill: Rgba,
        top: Rgba,
        bottom: Rgba,
    },
    /// `at` is the text baseline; right-aligned text ends at `at.x`
    Text {
        at: Point,
        text: String,
        size: f64,
        color: Rgba,
        align: TextAlign,
    },
    GridLine {
        from: Point,
        to: Point,
        color: Rgba,
    },
    /// Polygon under `outline` closed at `baseline_y`, gradient from `gradient_top_y` down
    AreaFill {
        outline: Vec<Point>,
        baseline_y: f64,
        gradient_top_y: f64,
        top: Rgba,
        bottom: Rgba,
    },
    Curve {
        path: Vec<PathSegment>,
        stroke: Rgba,
        width: f64,
        glow: Option<Rgba>,
    },
    Dot {
        center: Point,
        radius: f64,
        color: Rgba,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelFrame {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    pub visible: bool,
    pub active_line: Option<LineId>,
    pub readout: Option<LineReadout>,
    pub refreshing: bool,
    pub profile: ElevationProfile,
}

#[derive(Debug, Clone)]
pub struct MetricsPanel {
    width: u32,
    height: u32,
    visible: bool,
    active_line: Option<LineId>,
    profile: ElevationProfile,
    readout: Option<LineReadout>,
    last_frame: Option<PanelFrame>,
}

impl Default for MetricsPanel {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl MetricsPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            visible: false,
            active_line: None,
            profile: ElevationProfile::default(),
            readout: None,
            last_frame: None,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.redraw();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.active_line = None;
    }

    /// Drops the live readout; the stored series stays until the next publish
    pub fn reset(&mut self) {
        self.readout = None;
        self.redraw_if_visible();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_active_line(&mut self, line: LineId) {
        self.active_line = Some(line);
    }

    pub fn active_line(&self) -> Option<LineId> {
        self.active_line
    }

    pub fn set_readout(&mut self, readout: LineReadout) {
        self.readout = Some(readout);
        self.redraw_if_visible();
    }

    /// Always stored, even while hidden; only a visible panel redraws
    pub fn publish_profile(&mut self, profile: ElevationProfile) {
        self.profile = profile;
        self.redraw_if_visible();
    }

    pub fn profile(&self) -> &ElevationProfile {
        &self.profile
    }

    /// What the surface currently shows; a panel never drawn yields a fresh frame
    pub fn frame(&self) -> PanelFrame {
        self.last_frame.clone().unwrap_or_else(|| self.draw())
    }

    pub fn snapshot(&self, refreshing: bool) -> PanelSnapshot {
        PanelSnapshot {
            visible: self.visible,
            active_line: self.active_line,
            readout: self.readout,
            refreshing,
            profile: self.profile.clone(),
        }
    }

    fn redraw_if_visible(&mut self) {
        if self.visible {
            self.redraw();
        }
    }

    fn redraw(&mut self) {
        self.last_frame = Some(self.draw());
    }

    pub fn draw(&self) -> PanelFrame {
        let (w, h) = (self.width as f64, self.height as f64);
        let plot = Rect {
            x: PAD_LEFT,
            y: PAD_TOP + HEADER_GAP,
            w: w - PAD_LEFT - PAD_RIGHT,
            h: h - PAD_TOP - PAD_BOTTOM - FOOTER_BAND,
        };

        let mut commands = vec![DrawCommand::Background {
            rect: Rect { x: 0.0, y: 0.0, w, h },
            fill: PANEL_BASE,
            top: BACKGROUND_TOP,
            bottom: BACKGROUND_BOTTOM,
        }];

        commands.push(text(Point::new(plot.x, plot.y - 2.0), TITLE, 12.0, TITLE_COLOR));
        if let Some(readout) = self.readout {
            commands.push(DrawCommand::Text {
                at: Point::new(plot.right(), plot.y - 2.0),
                text: format!("{:.2} km  {:.1}°", readout.distance_km, readout.bearing_deg),
                size: 11.0,
                color: LABEL_COLOR,
                align: TextAlign::Right,
            });
        }

        for i in 0..=GRID_ROWS {
            let y = plot.y + plot.h * i as f64 / GRID_ROWS as f64;
            commands.push(DrawCommand::GridLine {
                from: Point::new(plot.x, y),
                to: Point::new(plot.right(), y),
                color: GRID_COLOR,
            });
        }

        if !self.draw_series(&plot, &mut commands) {
            commands.push(text(
                Point::new(plot.x + 8.0, plot.y + plot.h / 2.0),
                NO_DATA,
                12.0,
                PLACEHOLDER_COLOR,
            ));
        }

        if !self.profile.status.is_empty() {
            commands.push(text(
                Point::new(plot.x, plot.bottom() + 25.0),
                &self.profile.status,
                11.0,
                STATUS_COLOR,
            ));
        }

        PanelFrame {
            width: self.width,
            height: self.height,
            commands,
        }
    }

    /// Axis labels, fills, curves and dots; false when there is nothing to plot
    fn draw_series(&self, plot: &Rect, commands: &mut Vec<DrawCommand>) -> bool {
        let distances = &self.profile.distances_km;
        let elevations = &self.profile.elevations_m;
        if distances.len() < 2 || elevations.len() != distances.len() {
            return false;
        }

        let valid = elevations.iter().flatten().copied().filter(|z| z.is_finite());
        let Some((zmin, zmax)) = valid.fold(None, |range: Option<(f64, f64)>, z| {
            Some(range.map_or((z, z), |(lo, hi)| (lo.min(z), hi.max(z))))
        }) else {
            return false;
        };
        let span = (zmax - zmin).max(MIN_SPAN);
        let xmax = self.profile.total_distance_km().max(MIN_SPAN);

        for i in 0..=GRID_ROWS {
            let t = i as f64 / GRID_ROWS as f64;
            commands.push(text(
                Point::new(6.0, plot.y + plot.h * t + 3.0),
                &format!("{:.0}", zmax - (zmax - zmin) * t),
                11.0,
                LABEL_COLOR,
            ));
        }
        commands.push(text(
            Point::new(plot.x, plot.bottom() + 11.0),
            "0 km",
            10.0,
            LABEL_COLOR,
        ));
        commands.push(DrawCommand::Text {
            at: Point::new(plot.right(), plot.bottom() + 11.0),
            text: format!("{:.2} km", xmax),
            size: 10.0,
            color: LABEL_COLOR,
            align: TextAlign::Right,
        });

        // Absent samples split the series into separately drawn runs
        let mut runs: Vec<Vec<Point>> = Vec::new();
        let mut current = Vec::new();
        for (d, z) in distances.iter().zip(elevations) {
            match z.filter(|z| z.is_finite()) {
                Some(z) => current.push(Point::new(
                    plot.x + plot.w * (d / xmax),
                    plot.y + plot.h * (1.0 - (z - zmin) / span),
                )),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }

        for run in runs.iter().filter(|run| run.len() >= 2) {
            commands.push(DrawCommand::AreaFill {
                outline: run.clone(),
                baseline_y: plot.bottom(),
                gradient_top_y: plot.y,
                top: FILL_TOP,
                bottom: FILL_BOTTOM,
            });
            commands.push(DrawCommand::Curve {
                path: smooth_path(run),
                stroke: CURVE_COLOR,
                width: 2.0,
                glow: Some(CURVE_GLOW),
            });
        }

        // Dots only decorate runs that got a curve
        let points: Vec<Point> = runs
            .into_iter()
            .filter(|run| run.len() >= 2)
            .flatten()
            .collect();
        if points.len() >= 2 {
            let step = points.len().div_ceil(MAX_DOTS);
            for center in points.into_iter().step_by(step) {
                commands.push(DrawCommand::Dot {
                    center,
                    radius: 2.0,
                    color: CURVE_COLOR,
                });
            }
        }
        true
    }
}

fn text(at: Point, text: &str, size: f64, color: Rgba) -> DrawCommand {
    DrawCommand::Text {
        at,
        text: text.to_string(),
        size,
        color,
        align: TextAlign::Left,
    }
}

/// Quadratic curve through the midpoints between consecutive points, ending on the last point
pub fn smooth_path(points: &[Point]) -> Vec<PathSegment> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut path = vec![PathSegment::MoveTo(*first)];
    path.extend(rest.windows(2).map(|pair| PathSegment::QuadTo {
        ctrl: pair[0],
        to: pair[0].midpoint(pair[1]),
    }));
    if let Some(last) = rest.last() {
        path.push(PathSegment::QuadTo {
            ctrl: *last,
            to: *last,
        });
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with(distances: Vec<f64>, elevations: Vec<Option<f64>>) -> MetricsPanel {
        let mut panel = MetricsPanel::default();
        panel.publish_profile(ElevationProfile {
            distances_km: distances,
            elevations_m: elevations,
            status: "Local DEM: Min 0 m  Max 0 m  +0/-0 m".to_string(),
        });
        panel
    }

    fn count(frame: &PanelFrame, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        frame.commands.iter().filter(|c| pred(c)).count()
    }

    fn has_text(frame: &PanelFrame, wanted: &str) -> bool {
        frame
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == wanted))
    }

    #[test]
    fn test_empty_series_shows_placeholder() {
        let frame = MetricsPanel::default().draw();
        assert!(has_text(&frame, NO_DATA));
        assert!(has_text(&frame, TITLE));
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::GridLine { .. })), 5);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Curve { .. })), 0);

        let mismatched = panel_with(vec![0.0, 1.0, 2.0], vec![Some(1.0), Some(2.0)]).draw();
        assert!(has_text(&mismatched, NO_DATA));
    }

    #[test]
    fn test_single_valid_point_draws_no_curve() {
        let frame = panel_with(vec![0.0, 1.0, 2.0], vec![None, Some(100.0), None]).draw();

        assert!(!has_text(&frame, NO_DATA));
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::GridLine { .. })), 5);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Curve { .. })), 0);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::AreaFill { .. })), 0);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Dot { .. })), 0);
        assert!(has_text(&frame, "100"));
        assert!(has_text(&frame, "0 km"));
        assert!(has_text(&frame, "2.00 km"));
    }

    #[test]
    fn test_gap_splits_curve_into_runs() {
        let frame = panel_with(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![Some(100.0), Some(110.0), None, Some(130.0), Some(90.0)],
        )
        .draw();

        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Curve { .. })), 2);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::AreaFill { .. })), 2);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Dot { .. })), 4);
        assert!(has_text(&frame, "130"));
        assert!(has_text(&frame, "90"));
    }

    #[test]
    fn test_isolated_samples_get_no_dots() {
        let frame = panel_with(vec![0.0, 1.0, 2.0], vec![Some(100.0), None, Some(120.0)]).draw();
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Curve { .. })), 0);
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Dot { .. })), 0);

        let mixed = panel_with(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![Some(100.0), None, Some(120.0), Some(125.0), Some(110.0)],
        )
        .draw();
        assert_eq!(count(&mixed, |c| matches!(c, DrawCommand::Curve { .. })), 1);
        assert_eq!(count(&mixed, |c| matches!(c, DrawCommand::Dot { .. })), 3);
    }

    #[test]
    fn test_dot_density_is_capped() {
        let distances: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let elevations = (0..40).map(|i| Some(100.0 + i as f64)).collect();
        let frame = panel_with(distances, elevations).draw();
        assert_eq!(count(&frame, |c| matches!(c, DrawCommand::Dot { .. })), 14);
    }

    #[test]
    fn test_curve_stays_inside_plot() {
        let frame = panel_with(vec![0.0, 0.5, 1.0], vec![Some(10.0), Some(20.0), Some(15.0)]).draw();
        for command in &frame.commands {
            if let DrawCommand::Dot { center, .. } = command {
                assert!(center.x >= PAD_LEFT && center.x <= 380.0 - PAD_RIGHT);
                assert!(center.y >= 14.0 && center.y <= 14.0 + 146.0);
            }
        }
    }

    #[test]
    fn test_draw_is_pure() {
        let panel = panel_with(vec![0.0, 1.0], vec![Some(5.0), Some(6.0)]);
        assert_eq!(panel.draw(), panel.draw());
    }

    #[test]
    fn test_readout_in_header() {
        let mut panel = MetricsPanel::default();
        panel.set_readout(LineReadout {
            distance_km: 12.3456,
            bearing_deg: 90.0,
        });
        assert!(has_text(&panel.draw(), "12.35 km  90.0°"));

        panel.reset();
        assert!(!has_text(&panel.draw(), "12.35 km  90.0°"));
    }

    #[test]
    fn test_hidden_panel_stores_without_redrawing() {
        let mut panel = MetricsPanel::default();
        panel.set_active_line(LineId(3));
        panel.show();
        let shown = panel.frame();

        panel.hide();
        assert_eq!(panel.active_line(), None);
        panel.publish_profile(ElevationProfile::failed(vec![0.0, 1.0]));
        assert_eq!(panel.profile().status, "Elevation fetch failed");
        assert_eq!(panel.frame(), shown);

        panel.show();
        assert!(has_text(&panel.frame(), "Elevation fetch failed"));
    }

    #[test]
    fn test_smooth_path_segments() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(4.0, 0.0),
        ];
        assert_eq!(
            smooth_path(&pts),
            vec![
                PathSegment::MoveTo(pts[0]),
                PathSegment::QuadTo {
                    ctrl: pts[1],
                    to: Point::new(3.0, 1.0)
                },
                PathSegment::QuadTo {
                    ctrl: pts[2],
                    to: pts[2]
                },
            ]
        );
        assert!(smooth_path(&[]).is_empty());
    }
}
