#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, ensure};
use js_sys::Uint8Array;
use postcard::to_allocvec;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use slither_core::{
    ChainShapes, GRID_SPACING, MovementPattern, Palette, Point2, Simulation, SimulationConfig,
    Viewport,
};
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

#[wasm_bindgen]
pub struct SimHandle {
    inner: Rc<RefCell<Session>>,
}

struct Session {
    simulation: Simulation,
    snapshot_format: SnapshotFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct InitOptions {
    seed: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    segments: Option<usize>,
    speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<SimulationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_format: Option<SnapshotFormat>,
}

impl InitOptions {
    fn into_config(self) -> Result<(SimulationConfig, SnapshotFormat)> {
        let mut config = self.config.unwrap_or_default();
        if let Some(width) = self.width {
            config.viewport_width = width;
        }
        if let Some(height) = self.height {
            config.viewport_height = height;
        }
        if let Some(segments) = self.segments {
            config.segments = segments;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        config.rng_seed = match normalize_seed(self.seed)? {
            Some(seed) => Some(seed),
            None => config.rng_seed.or_else(|| Some(random_seed())),
        };
        Ok((config, self.snapshot_format.unwrap_or_default()))
    }
}

#[wasm_bindgen]
impl SimHandle {
    #[wasm_bindgen(js_name = start)]
    pub fn start_js(&self) {
        self.inner.borrow_mut().simulation.start();
    }

    #[wasm_bindgen(js_name = stop)]
    pub fn stop_js(&self) {
        self.inner.borrow_mut().simulation.stop();
    }

    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&self) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .simulation
            .reset()
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running_js(&self) -> bool {
        self.inner.borrow().simulation.is_running()
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed_js(&self, speed: f64) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .simulation
            .set_speed(speed)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setSegments)]
    pub fn set_segments_js(&self, segments: u32) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .simulation
            .set_segments(segments as usize)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setPatternActive)]
    pub fn set_pattern_active_js(&self, name: &str, active: bool) -> Result<(), JsValue> {
        let pattern = MovementPattern::ALL
            .into_iter()
            .find(|pattern| pattern.name() == name)
            .ok_or_else(|| js_error(format!("unknown movement pattern `{name}`")))?;
        self.inner
            .borrow_mut()
            .simulation
            .set_pattern_active(pattern, active);
        Ok(())
    }

    /// Advance one animation frame and return the frame events.
    #[wasm_bindgen(js_name = frame)]
    pub fn frame_js(&self) -> Result<JsValue, JsValue> {
        let events = self
            .inner
            .borrow_mut()
            .simulation
            .frame()
            .map_err(js_error)?;
        to_value(&events).map_err(js_error)
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot_js(&self) -> Result<JsValue, JsValue> {
        let session = self.inner.borrow();
        encode_snapshot(&session.simulation, session.snapshot_format)
    }

    /// Clear `ctx`, draw the background grid and the current chain.
    #[wasm_bindgen(js_name = draw)]
    pub fn draw_js(&self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let session = self.inner.borrow();
        let viewport = session.simulation.viewport();
        let palette = Palette::default();
        clear_canvas(ctx, viewport, &palette);
        let shapes = session.simulation.shapes();
        if !shapes.intersects(viewport) {
            return Ok(());
        }
        draw_chain(ctx, &shapes, &palette)
    }
}

#[wasm_bindgen]
pub fn init_sim(options: JsValue) -> Result<SimHandle, JsValue> {
    let options = if options.is_null() || options.is_undefined() {
        InitOptions::default()
    } else {
        from_value::<InitOptions>(options).map_err(js_error)?
    };

    let (config, snapshot_format) = options.into_config().map_err(js_error)?;
    debug!(seed = ?config.rng_seed, segments = config.segments, "initializing simulation");
    let simulation = Simulation::new(config).map_err(js_error)?;
    Ok(SimHandle {
        inner: Rc::new(RefCell::new(Session {
            simulation,
            snapshot_format,
        })),
    })
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("slither-web {}", env!("CARGO_PKG_VERSION"))
}

#[wasm_bindgen]
pub fn default_init_options() -> Result<JsValue, JsValue> {
    to_value(&InitOptions::default()).map_err(js_error)
}

fn clear_canvas(ctx: &CanvasRenderingContext2d, viewport: Viewport, palette: &Palette) {
    ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
    ctx.set_stroke_style(&JsValue::from_str(&palette.grid.to_hex()));
    ctx.set_line_width(palette.grid_width);

    let mut x = 0.0;
    while x < viewport.width {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, viewport.height);
        ctx.stroke();
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y < viewport.height {
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(viewport.width, y);
        ctx.stroke();
        y += GRID_SPACING;
    }
}

fn trace_polygon(ctx: &CanvasRenderingContext2d, points: &[Point2]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for point in rest {
        ctx.line_to(point.x, point.y);
    }
    ctx.close_path();
}

fn draw_chain(
    ctx: &CanvasRenderingContext2d,
    shapes: &ChainShapes,
    palette: &Palette,
) -> Result<(), JsValue> {
    ctx.save();

    let gradient = ctx.create_linear_gradient(
        shapes.gradient.from.x,
        shapes.gradient.from.y,
        shapes.gradient.to.x,
        shapes.gradient.to.y,
    );
    for (offset, color) in [0.0_f32, 0.5, 1.0].into_iter().zip(palette.body) {
        gradient.add_color_stop(offset, &color.to_hex())?;
    }

    trace_polygon(ctx, &shapes.body);
    ctx.set_fill_style(&gradient);
    ctx.fill();
    ctx.set_stroke_style(&JsValue::from_str(&palette.outline.to_hex()));
    ctx.set_line_width(palette.outline_width);
    ctx.stroke();

    ctx.set_stroke_style(&JsValue::from_str(&palette.scales.to_hex()));
    ctx.set_line_width(palette.scale_width);
    for scale in &shapes.scales {
        ctx.begin_path();
        ctx.move_to(scale.from.x, scale.from.y);
        ctx.line_to(scale.to.x, scale.to.y);
        ctx.stroke();
    }

    let center = shapes.head_center;
    let head_gradient =
        ctx.create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, shapes.head_radius)?;
    head_gradient.add_color_stop(0.0, &palette.head[0].to_hex())?;
    head_gradient.add_color_stop(1.0, &palette.head[1].to_hex())?;
    trace_polygon(ctx, &shapes.head);
    ctx.set_fill_style(&head_gradient);
    ctx.fill();

    ctx.restore();
    Ok(())
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * (1_u64 << 53) as f64) as u64
}

fn normalize_seed(seed: Option<f64>) -> Result<Option<u64>> {
    let Some(value) = seed else {
        return Ok(None);
    };
    ensure!(value.is_finite(), "seed must be a finite number");
    ensure!(value >= 0.0, "seed must be non-negative");
    let truncated = value.floor();
    ensure!(
        truncated <= u64::MAX as f64,
        "seed must be representable as u64"
    );
    Ok(Some(truncated as u64))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn encode_snapshot(simulation: &Simulation, format: SnapshotFormat) -> Result<JsValue, JsValue> {
    let snapshot = simulation.snapshot();
    match format {
        SnapshotFormat::Json => to_value(&snapshot).map_err(js_error),
        SnapshotFormat::Binary => {
            let bytes = to_allocvec(&snapshot).map_err(js_error)?;
            Ok(Uint8Array::from(bytes.as_slice()).into())
        }
    }
}
