// cli.rs - Command-line interface configuration
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "lattice-viewer")]
#[command(about = "Free-flight viewer for an instanced icosahedron lattice", long_about = None)]
pub struct Cli {
    /// Lattice cells along each axis
    #[arg(long, default_value_t = 36)]
    pub lattice: u32,

    /// World-space distance between lattice cells
    #[arg(long, default_value_t = 30)]
    pub spacing: u32,

    /// Camera physics tick rate in Hz
    #[arg(long = "tick-hz", default_value_t = 240.0)]
    pub tick_hz: f32,
}
