// SVG rendering of the metrics panel display list
use crate::application::metrics_panel::{DrawCommand, PanelFrame, PathSegment, Point, Rgba, TextAlign};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const GRADIENT_BANDS: usize = 12;
const CURVE_STEPS: usize = 8;
const GLOW_WIDTH: u32 = 6;
const GLOW_FADE: f64 = 0.35;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

pub fn render_svg(frame: &PanelFrame) -> anyhow::Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (frame.width, frame.height)).into_drawing_area();
        for command in &frame.commands {
            draw_command(&root, command)?;
        }
        root.present()?;
    }
    Ok(svg)
}

fn draw_command(root: &Area<'_>, command: &DrawCommand) -> anyhow::Result<()> {
    match command {
        DrawCommand::Background {
            rect,
            fill,
            top,
            bottom,
        } => {
            root.draw(&Rectangle::new(
                [px(rect.x, rect.y), px(rect.right(), rect.bottom())],
                color(*fill).filled(),
            ))?;
            let band = rect.h / GRADIENT_BANDS as f64;
            for i in 0..GRADIENT_BANDS {
                let y0 = rect.y + band * i as f64;
                let shade = top.mix(*bottom, (i as f64 + 0.5) / GRADIENT_BANDS as f64);
                root.draw(&Rectangle::new(
                    [px(rect.x, y0), px(rect.right(), y0 + band)],
                    color(shade).filled(),
                ))?;
            }
        }
        DrawCommand::Text {
            at,
            text,
            size,
            color: fill,
            align,
        } => {
            let h_pos = match align {
                TextAlign::Left => HPos::Left,
                TextAlign::Right => HPos::Right,
            };
            let style = ("sans-serif", *size)
                .into_font()
                .color(&color(*fill))
                .pos(Pos::new(h_pos, VPos::Bottom));
            root.draw(&Text::new(text.as_str(), px(at.x, at.y), style))?;
        }
        DrawCommand::GridLine { from, to, color: stroke } => {
            root.draw(&PathElement::new(
                vec![px(from.x, from.y), px(to.x, to.y)],
                color(*stroke).stroke_width(1),
            ))?;
        }
        DrawCommand::AreaFill {
            outline,
            baseline_y,
            gradient_top_y,
            top,
            bottom,
        } => {
            let (Some(first), Some(last)) = (outline.first(), outline.last()) else {
                return Ok(());
            };
            let band = (baseline_y - gradient_top_y) / GRADIENT_BANDS as f64;
            for i in 0..GRADIENT_BANDS {
                let lo = gradient_top_y + band * i as f64;
                let hi = lo + band;
                let mut polygon: Vec<(i32, i32)> = clamp_outline(outline, lo, hi)
                    .into_iter()
                    .map(|p| px(p.x, p.y))
                    .collect();
                polygon.push(px(last.x, hi));
                polygon.push(px(first.x, hi));

                let shade = top.mix(*bottom, (i as f64 + 0.5) / GRADIENT_BANDS as f64);
                root.draw(&Polygon::new(polygon, color(shade).filled()))?;
            }
        }
        DrawCommand::Curve {
            path,
            stroke,
            width,
            glow,
        } => {
            let points: Vec<(i32, i32)> = flatten(path).into_iter().map(|p| px(p.x, p.y)).collect();
            if let Some(glow) = glow {
                let faded = Rgba { a: glow.a * GLOW_FADE, ..*glow };
                root.draw(&PathElement::new(
                    points.clone(),
                    color(faded).stroke_width(GLOW_WIDTH),
                ))?;
            }
            root.draw(&PathElement::new(
                points,
                color(*stroke).stroke_width(width.round().max(1.0) as u32),
            ))?;
        }
        DrawCommand::Dot {
            center,
            radius,
            color: fill,
        } => {
            root.draw(&Circle::new(
                px(center.x, center.y),
                radius.round().max(1.0) as i32,
                color(*fill).filled(),
            ))?;
        }
    }
    Ok(())
}

fn px(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn color(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

/// Samples every quadratic segment into straight pieces
fn flatten(path: &[PathSegment]) -> Vec<Point> {
    let mut points = Vec::new();
    for segment in path {
        match *segment {
            PathSegment::MoveTo(p) => points.push(p),
            PathSegment::QuadTo { ctrl, to } => {
                let Some(&from) = points.last() else {
                    points.push(to);
                    continue;
                };
                for step in 1..=CURVE_STEPS {
                    let t = step as f64 / CURVE_STEPS as f64;
                    let u = 1.0 - t;
                    points.push(Point::new(
                        u * u * from.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                        u * u * from.y + 2.0 * u * t * ctrl.y + t * t * to.y,
                    ));
                }
            }
        }
    }
    points
}

/// Outline with every y clamped into [lo, hi], adding the points where it crosses either bound
fn clamp_outline(outline: &[Point], lo: f64, hi: f64) -> Vec<Point> {
    let clamp = |p: Point| Point::new(p.x, p.y.clamp(lo, hi));
    let mut clamped = Vec::with_capacity(outline.len() * 2);
    for pair in outline.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        clamped.push(clamp(a));

        let mut crossings: Vec<f64> = [lo, hi]
            .into_iter()
            .filter(|bound| (a.y - bound) * (b.y - bound) < 0.0)
            .map(|bound| (bound - a.y) / (b.y - a.y))
            .collect();
        crossings.sort_by(|x, y| x.total_cmp(y));
        for t in crossings {
            clamped.push(clamp(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)));
        }
    }
    if let Some(last) = outline.last() {
        clamped.push(clamp(*last));
    }
    clamped
}
