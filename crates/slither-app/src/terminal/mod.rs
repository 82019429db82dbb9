use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend, TestBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph,
        canvas::{Canvas, Line as CanvasLine},
    },
};
use slither_core::{ChainShapes, MAX_SEGMENTS, Palette, Point2, Rgb, Simulation, Viewport};
use tracing::{info, warn};

use crate::renderer::{Renderer, RendererContext};

const TARGET_FRAME_HZ: f32 = 60.0;
const MAX_FRAMES_PER_TICK: usize = 30;
const UI_TICK_MILLIS: u64 = 33;
const DEFAULT_HEADLESS_FRAMES: usize = 12;
const MAX_HEADLESS_FRAMES: usize = 360;
const SPEED_STEP: f64 = 0.1;
const SEGMENT_STEP: usize = 5;

pub struct TerminalRenderer {
    frame_interval: Duration,
    draw_interval: Duration,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_secs_f32(1.0 / TARGET_FRAME_HZ),
            draw_interval: Duration::from_millis(UI_TICK_MILLIS),
        }
    }
}

impl Renderer for TerminalRenderer {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn run(&self, ctx: RendererContext) -> Result<()> {
        if std::env::var_os("SLITHER_TERMINAL_HEADLESS").is_some() {
            let backend = TestBackend::new(100, 40);
            let mut terminal = Terminal::new(backend).context("failed to build test backend")?;
            let app = self.run_headless(ctx, &mut terminal, self.headless_frame_budget())?;
            info!(
                target = "slither::terminal",
                frames = app.simulation.frame_count(),
                spawns = app.simulation.spawn_count(),
                pattern = app.simulation.current_spawn().pattern.name(),
                "Terminal headless run completed"
            );
            return Ok(());
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to build terminal backend")?;
        terminal.hide_cursor().ok();

        let result = run_event_loop(self, &mut terminal, ctx);

        terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }

        result
    }
}

impl TerminalRenderer {
    fn run_headless<B: Backend>(
        &self,
        ctx: RendererContext,
        terminal: &mut Terminal<B>,
        frames: usize,
    ) -> Result<TerminalApp> {
        let mut app = TerminalApp::new(self, ctx);
        app.simulation.start();
        for _ in 0..frames {
            app.step_once();
            terminal.draw(|frame| app.draw(frame))?;
        }
        Ok(app)
    }

    fn headless_frame_budget(&self) -> usize {
        std::env::var("SLITHER_TERMINAL_HEADLESS_FRAMES")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .map(|value| value.min(MAX_HEADLESS_FRAMES))
            .unwrap_or(DEFAULT_HEADLESS_FRAMES)
    }
}

fn run_event_loop(
    renderer: &TerminalRenderer,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ctx: RendererContext,
) -> Result<()> {
    let mut app = TerminalApp::new(renderer, ctx);
    app.simulation.start();

    loop {
        let now = Instant::now();
        app.maybe_step(now);

        if now.duration_since(app.last_draw) >= app.draw_interval {
            terminal.draw(|frame| app.draw(frame))?;
            app.last_draw = now;
        }

        let timeout = app
            .frame_interval
            .saturating_sub(Instant::now().duration_since(now));
        if event::poll(timeout).unwrap_or(false)
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)
        {
            break;
        }
    }

    Ok(())
}

struct TerminalApp {
    simulation: Simulation,
    palette: Palette,
    frame_interval: Duration,
    draw_interval: Duration,
    accumulator: Duration,
    last_tick: Instant,
    last_draw: Instant,
    status: Option<String>,
}

impl TerminalApp {
    fn new(renderer: &TerminalRenderer, ctx: RendererContext) -> Self {
        let now = Instant::now();
        Self {
            simulation: ctx.simulation,
            palette: Palette::default(),
            frame_interval: renderer.frame_interval,
            draw_interval: renderer.draw_interval,
            accumulator: Duration::ZERO,
            last_tick: now,
            last_draw: now - renderer.draw_interval,
            status: None,
        }
    }

    fn maybe_step(&mut self, now: Instant) {
        self.accumulator += now.duration_since(self.last_tick);
        self.last_tick = now;

        let mut frames = 0;
        while self.accumulator >= self.frame_interval && frames < MAX_FRAMES_PER_TICK {
            self.accumulator -= self.frame_interval;
            self.step_once();
            frames += 1;
        }
        if frames == MAX_FRAMES_PER_TICK {
            self.accumulator = Duration::ZERO;
        }
    }

    fn step_once(&mut self) {
        match self.simulation.frame() {
            Ok(events) if events.respawned => {
                let spawn = self.simulation.current_spawn();
                self.status = Some(format!("respawned: {} from {}", spawn.pattern, spawn.side));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(?err, "frame failed");
                self.status = Some(err.to_string());
            }
        }
    }

    /// Returns `true` when the session should end.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char(' ') => {
                if self.simulation.is_running() {
                    self.simulation.stop();
                } else {
                    self.simulation.start();
                }
            }
            KeyCode::Char('r') => {
                let result = self.simulation.reset();
                self.apply(result, "reset");
                self.simulation.start();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let speed = self.simulation.config().speed + SPEED_STEP;
                let result = self.simulation.set_speed(speed);
                self.apply(result, "speed");
            }
            KeyCode::Char('-') => {
                let speed = (self.simulation.config().speed - SPEED_STEP).max(0.0);
                let result = self.simulation.set_speed(speed);
                self.apply(result, "speed");
            }
            KeyCode::Char(']') => {
                let segments = (self.simulation.config().segments + SEGMENT_STEP).min(MAX_SEGMENTS);
                let result = self.simulation.set_segments(segments);
                self.apply(result, "segments");
                self.simulation.start();
            }
            KeyCode::Char('[') => {
                let segments = self.simulation.config().segments.saturating_sub(SEGMENT_STEP).max(2);
                let result = self.simulation.set_segments(segments);
                self.apply(result, "segments");
                self.simulation.start();
            }
            _ => {}
        }
        false
    }

    fn apply<E: std::fmt::Display>(&mut self, result: Result<(), E>, action: &str) {
        self.status = match result {
            Ok(()) => None,
            Err(err) => {
                warn!(action, %err, "control rejected");
                Some(format!("{action}: {err}"))
            }
        };
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(frame.area());

        let viewport = self.simulation.viewport();
        let lines = canvas_lines(&self.simulation.shapes(), viewport, &self.palette);
        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title("slither"))
            .marker(Marker::Braille)
            .x_bounds([0.0, viewport.width])
            .y_bounds([0.0, viewport.height])
            .paint(|ctx| {
                for line in &lines {
                    ctx.draw(line);
                }
            });
        frame.render_widget(canvas, chunks[0]);

        let config = self.simulation.config();
        let spawn = self.simulation.current_spawn();
        let state = if self.simulation.is_running() {
            Span::styled("running", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::styled("stopped", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        };
        let mut summary = vec![
            state,
            Span::raw(format!(
                "  pattern {}  side {}  spawns {}  speed {:.1}  segments {}",
                spawn.pattern,
                spawn.side,
                self.simulation.spawn_count(),
                config.speed,
                config.segments,
            )),
        ];
        if let Some(status) = &self.status {
            summary.push(Span::styled(format!("  {status}"), Style::default().fg(Color::Red)));
        }
        let help = Line::from("space start/stop  r reset  +/- speed  [/] segments  q quit");
        let status = Paragraph::new(vec![Line::from(summary), help])
            .block(Block::default().borders(Borders::ALL).title("status"));
        frame.render_widget(status, chunks[1]);
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Canvas y grows upward; the animation's y grows downward.
fn canvas_line(from: Point2, to: Point2, viewport: Viewport, color: Color) -> CanvasLine {
    CanvasLine::new(from.x, viewport.height - from.y, to.x, viewport.height - to.y, color)
}

fn closed_outline(points: &[Point2], viewport: Viewport, color: Color) -> Vec<CanvasLine> {
    (0..points.len())
        .map(|i| canvas_line(points[i], points[(i + 1) % points.len()], viewport, color))
        .collect()
}

/// Line primitives approximating the body outline, scales and head.
fn canvas_lines(shapes: &ChainShapes, viewport: Viewport, palette: &Palette) -> Vec<CanvasLine> {
    let mut lines = closed_outline(&shapes.body, viewport, color(palette.body[1]));
    lines.extend(
        shapes
            .scales
            .iter()
            .map(|scale| canvas_line(scale.from, scale.to, viewport, color(palette.scales))),
    );
    lines.extend(closed_outline(&shapes.head, viewport, color(palette.head[0])));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use slither_core::SimulationConfig;

    fn app() -> TerminalApp {
        let simulation = Simulation::new(SimulationConfig {
            rng_seed: Some(77),
            ..SimulationConfig::default()
        })
        .expect("simulation");
        TerminalApp::new(&TerminalRenderer::default(), RendererContext { simulation })
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn canvas_lines_flip_the_y_axis() {
        let viewport = Viewport::new(100.0, 50.0);
        let line = canvas_line(Point2::new(1.0, 10.0), Point2::new(2.0, 50.0), viewport, Color::White);
        assert_eq!((line.x1, line.y1, line.x2, line.y2), (1.0, 40.0, 2.0, 0.0));
    }

    #[test]
    fn every_shape_edge_becomes_a_line() {
        let app = app();
        let shapes = app.simulation.shapes();
        let lines = canvas_lines(&shapes, app.simulation.viewport(), &app.palette);
        assert_eq!(lines.len(), shapes.body.len() + shapes.scales.len() + shapes.head.len());
    }

    #[test]
    fn keys_drive_the_simulation() {
        let mut app = app();
        assert!(!app.simulation.is_running());
        assert!(!app.handle_key(press(KeyCode::Char(' '))));
        assert!(app.simulation.is_running());

        app.handle_key(press(KeyCode::Char('+')));
        assert!((app.simulation.config().speed - 0.6).abs() < 1e-12);

        app.handle_key(press(KeyCode::Char(']')));
        assert_eq!(app.simulation.config().segments, 50);
        assert_eq!(app.simulation.chain().segment_count(), 50);
        assert!(app.simulation.is_running());

        for _ in 0..20 {
            app.handle_key(press(KeyCode::Char('[')));
        }
        assert_eq!(app.simulation.config().segments, 2);

        for _ in 0..20 {
            app.handle_key(press(KeyCode::Char('-')));
        }
        assert_eq!(app.simulation.config().speed, 0.0);

        assert!(app.handle_key(press(KeyCode::Char('q'))));
    }

    #[test]
    fn headless_draw_shows_status_line() {
        let renderer = TerminalRenderer::default();
        let simulation = Simulation::new(SimulationConfig {
            rng_seed: Some(4),
            ..SimulationConfig::default()
        })
        .expect("simulation");
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        let app = renderer
            .run_headless(RendererContext { simulation }, &mut terminal, 8)
            .expect("headless run");
        assert_eq!(app.simulation.frame_count(), 8);

        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("running"));
        assert!(text.contains("q quit"));
    }
}
