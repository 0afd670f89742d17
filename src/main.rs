//! Plexus entry point
//!
//! Native headless runner: steps a session for a fixed number of frames and
//! reports the buffers that would be handed to the rasterizer.
//!
//! Usage: `plexus [config.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Plexus (native) starting...");

    if let Err(e) = native::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host page owns the animation loop on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;
    use std::time::{Instant, SystemTime, UNIX_EPOCH};

    use chrono::Timelike;

    use plexus::config::{Background, SimConfig};
    use plexus::consts::DEFAULT_FRAMES;
    use plexus::renderer::{pack_edges, pack_points};
    use plexus::sim::{FrameInput, Session, clock_offset};

    /// Frames between progress reports
    const REPORT_EVERY: u64 = 100;

    /// Hour on the local wall clock. chrono reads the zone from the OS and
    /// falls back to UTC when the local offset cannot be determined.
    fn local_hour() -> u32 {
        chrono::Local::now().hour()
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args().skip(1);

        let config = match args.next() {
            Some(path) => SimConfig::load(&path)?,
            None => {
                log::info!("Using default config");
                SimConfig::default()
            }
        };
        let frames = match args.next() {
            Some(s) => s
                .parse::<u64>()
                .map_err(|e| format!("Invalid frame count '{}': {}", s, e))?,
            None => DEFAULT_FRAMES,
        };

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        let hour = local_hour();
        log::debug!("Local hour {}", hour);

        let mut session = Session::new(config)?.with_clock_offset(clock_offset(now_ms));
        if Background::for_hour(hour) == Background::Dark {
            session.set_background(Background::Dark);
        }

        let start = Instant::now();
        let input = FrameInput::default();
        let mut total_segments = 0usize;
        for _ in 0..frames {
            session.update(&input);
            total_segments += session.edges().segment_count();
            if session.tick() % REPORT_EVERY == 0 {
                log::info!(
                    "tick {}: {} segments",
                    session.tick(),
                    session.edges().segment_count()
                );
            }
        }
        let elapsed = start.elapsed();

        let frame = session.frame(elapsed.as_secs_f64() * 1000.0);
        let points = pack_points(session.particles());
        let edges = pack_edges(frame.edges);

        log::info!(
            "{} frames in {:.2?} ({:.1} avg segments/frame)",
            frames,
            elapsed,
            total_segments as f64 / frames.max(1) as f64
        );
        log::info!(
            "Last frame: {} point bytes, {} edge bytes, {} uniform bytes, background {}",
            bytemuck::cast_slice::<_, u8>(&points[..]).len(),
            bytemuck::cast_slice::<_, u8>(&edges[..]).len(),
            bytemuck::bytes_of(&frame.uniforms).len(),
            session.background().as_str()
        );
        Ok(())
    }

}
