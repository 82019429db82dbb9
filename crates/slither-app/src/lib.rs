//! Shared application plumbing for the slither drivers.

pub mod config;
pub mod headless;
pub mod png;
pub mod terminal;

pub mod renderer {
    use anyhow::Result;
    use slither_core::Simulation;

    /// Shared context passed to renderer implementations.
    pub struct RendererContext {
        pub simulation: Simulation,
    }

    pub trait Renderer {
        /// Stable identifier describing the renderer implementation (e.g., "terminal", "png").
        fn name(&self) -> &'static str;

        /// Launch the renderer; blocks until the rendering session completes.
        fn run(&self, ctx: RendererContext) -> Result<()>;
    }
}

pub use config::{ConfigOverrides, load_config, resolve_config};
pub use headless::{HeadlessRenderer, HeadlessReport};
pub use png::PngRenderer;
pub use terminal::TerminalRenderer;
