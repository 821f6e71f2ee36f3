use crate::core::{Affine, Canvas, Point, Rgba8};
use crate::error::{MathmotionError, MathmotionResult};
use crate::scene::{Pose, SceneObject, Shape};

/// One captured still: straight RGBA8, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Capture surface for the frame simulator.
///
/// `capture` is a pure function of the post-update scene state; the simulator
/// calls it exactly once per frame, after all objects have been updated. A
/// capture error is fatal to the whole render session.
pub trait RenderBackend {
    fn canvas(&self) -> Canvas;
    fn capture(&mut self, objects: &[SceneObject]) -> MathmotionResult<FrameRgba>;
}

const DISC_SEGMENTS: usize = 32;
// Arrow head proportions follow the usual 20%-of-length helper arrows.
const ARROW_HEAD_RATIO: f64 = 0.2;
const ARROW_HEAD_ANGLE: f64 = 2.6;
// Vertical world extent mapped onto the canvas height.
const WORLD_HEIGHT_UNITS: f64 = 8.0;

/// CPU rasterizer drawing wireframe primitives into an RGBA8 buffer.
///
/// World space is an orthographic XY plane centered on the canvas, y up;
/// the z component of swept directions is ignored at projection time.
pub struct CpuBackend {
    canvas: Canvas,
    clear: Rgba8,
    world_to_screen: Affine,
}

impl CpuBackend {
    pub fn new(canvas: Canvas) -> MathmotionResult<Self> {
        Canvas::new(canvas.width, canvas.height)?;
        let scale = f64::from(canvas.height) / WORLD_HEIGHT_UNITS;
        let world_to_screen = Affine::translate((
            f64::from(canvas.width) / 2.0,
            f64::from(canvas.height) / 2.0,
        )) * Affine::scale_non_uniform(scale, -scale);
        Ok(Self {
            canvas,
            clear: Rgba8::rgb(18, 20, 28),
            world_to_screen,
        })
    }

    pub fn with_clear_color(mut self, clear: Rgba8) -> Self {
        self.clear = clear;
        self
    }
}

impl RenderBackend for CpuBackend {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn capture(&mut self, objects: &[SceneObject]) -> MathmotionResult<FrameRgba> {
        let len = (self.canvas.width as usize)
            .checked_mul(self.canvas.height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| MathmotionError::render("capture surface exceeds addressable size"))?;

        let mut raster = Raster {
            width: self.canvas.width,
            height: self.canvas.height,
            data: vec![0u8; len],
        };
        raster.clear(self.clear);

        for object in objects {
            draw_object(&mut raster, self.world_to_screen, object);
        }

        Ok(FrameRgba {
            width: raster.width,
            height: raster.height,
            data: raster.data,
        })
    }
}

struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    fn clear(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    fn put_pixel(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.data[offset] = color.r;
        self.data[offset + 1] = color.g;
        self.data[offset + 2] = color.b;
        self.data[offset + 3] = color.a;
    }

    /// DDA line in screen space.
    fn draw_line(&mut self, from: Point, to: Point, color: Rgba8) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs()).ceil() as i64;
        if steps == 0 {
            self.put_pixel(from.x.round() as i64, from.y.round() as i64, color);
            return;
        }
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = from.x + dx * t;
            let y = from.y + dy * t;
            self.put_pixel(x.round() as i64, y.round() as i64, color);
        }
    }
}

fn draw_object(raster: &mut Raster, xform: Affine, object: &SceneObject) {
    match *object.shape() {
        Shape::Disc { radius, color } => {
            let angle = match object.pose() {
                Pose::Spin { angle } => angle,
                _ => 0.0,
            };
            draw_disc(raster, xform, radius, angle, color);
        }
        Shape::Arrow { length, color } => {
            let direction = match object.pose() {
                Pose::Sweep { direction } => direction,
                _ => [0.0, 1.0, 0.0],
            };
            draw_arrow(raster, xform, direction, length, color);
        }
        Shape::Grid {
            size,
            divisions,
            center_color,
            line_color,
        } => {
            let angle = match object.pose() {
                Pose::Spin { angle } => angle,
                _ => 0.0,
            };
            draw_grid(raster, xform, size, divisions, angle, center_color, line_color);
        }
        Shape::Empty => {}
    }
}

/// Wireframe fan: perimeter segments plus a spoke to every perimeter vertex,
/// all rotated by the current spin angle.
fn draw_disc(raster: &mut Raster, xform: Affine, radius: f64, angle: f64, color: Rgba8) {
    let center = xform * Point::ORIGIN;
    let vertex = |i: usize| {
        let theta = angle + (i as f64 / DISC_SEGMENTS as f64) * std::f64::consts::TAU;
        xform * Point::new(radius * theta.cos(), radius * theta.sin())
    };
    for i in 0..DISC_SEGMENTS {
        let a = vertex(i);
        let b = vertex(i + 1);
        raster.draw_line(a, b, color);
        raster.draw_line(center, a, color);
    }
}

fn draw_arrow(raster: &mut Raster, xform: Affine, direction: [f64; 3], length: f64, color: Rgba8) {
    let origin = xform * Point::ORIGIN;
    let tip_world = Point::new(direction[0] * length, direction[1] * length);
    let tip = xform * tip_world;
    raster.draw_line(origin, tip, color);

    let heading = direction[1].atan2(direction[0]);
    let head_len = length * ARROW_HEAD_RATIO;
    for side in [-1.0, 1.0] {
        let barb_angle = heading + side * ARROW_HEAD_ANGLE;
        let barb = Point::new(
            tip_world.x + head_len * barb_angle.cos(),
            tip_world.y + head_len * barb_angle.sin(),
        );
        raster.draw_line(tip, xform * barb, color);
    }
}

/// Reference grid with highlighted center lines. Rotation about the vertical
/// axis appears as horizontal foreshortening under the orthographic camera.
fn draw_grid(
    raster: &mut Raster,
    xform: Affine,
    size: f64,
    divisions: u32,
    angle: f64,
    center_color: Rgba8,
    line_color: Rgba8,
) {
    if divisions == 0 {
        return;
    }
    let half = size / 2.0;
    let step = size / f64::from(divisions);
    let foreshorten = angle.cos();

    for i in 0..=divisions {
        let offset = -half + f64::from(i) * step;
        let color = if offset.abs() < step * 1e-6 {
            center_color
        } else {
            line_color
        };
        raster.draw_line(
            xform * Point::new(offset * foreshorten, -half),
            xform * Point::new(offset * foreshorten, half),
            color,
        );
        raster.draw_line(
            xform * Point::new(-half * foreshorten, offset),
            xform * Point::new(half * foreshorten, offset),
            color,
        );
    }
}
