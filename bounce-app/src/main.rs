use anyhow::Context;
use maplet_bounce::prelude::*;

/// Prints every frame instead of drawing it
struct LogSurface {
    frames: usize,
}

impl RenderSurface for LogSurface {
    fn supports_3d_transforms(&self) -> bool {
        true
    }

    fn apply_frame(&mut self, marker: MarkerId, frame: &Frame) {
        self.frames += 1;
        log::trace!("{} z={} {}", marker, frame.z_index, frame.icon.style(""));
    }

    fn bounce_ended(&mut self, marker: MarkerId) {
        log::info!("{} came to rest", marker);
    }
}

fn place(engine: &mut BounceEngine<LogSurface>, x: i32, y: i32) -> anyhow::Result<MarkerId> {
    let marker = engine.create_marker();
    let (icon_w, icon_h) = maplet_bounce::constants::MARKER_ICON_SIZE;
    let (shadow_w, shadow_h) = maplet_bounce::constants::MARKER_SHADOW_SIZE;
    engine
        .attach(
            marker,
            MarkerGeometry::new(PixelPoint::new(x, y), Size::new(icon_w, icon_h))
                .with_shadow(Size::new(shadow_w, shadow_h)),
        )
        .with_context(|| format!("attaching {marker}"))?;
    Ok(marker)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut engine = BounceEngine::new(LogSurface { frames: 0 });
    engine.set_default_options_json(serde_json::json!({ "bounceHeight": 20 }))?;

    let harbour = place(&mut engine, 120, 300)?;
    let station = place(&mut engine, 260, 340)?;
    let museum = place(&mut engine, 400, 280)?;
    let ferry = place(&mut engine, 520, 310)?;
    engine.set_options(museum, &BounceOptions::new().elastic(false).bounce_speed(40))?;

    let driver = BounceDriver::new(engine);
    let handle = driver.spawn();

    driver.with_engine(|engine| -> Result<()> {
        engine.bounce(harbour, Cycles::Unbounded)?;
        engine.bounce(station, Cycles::from_count(Some(3)))?;
        engine.bounce(museum, Cycles::Unbounded)
    })?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // the ferry stops everything else once their current phases play out
    driver.with_engine(|engine| {
        engine.bounce_with(ferry, BounceRequest::new(Cycles::Unbounded).exclusive())?;
        log::info!("bouncing: {:?}", engine.bouncing_markers());
        Ok::<_, BounceError>(())
    })?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    driver.with_engine(|engine| engine.stop_all_bouncing());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let frames = driver.with_engine(|engine| engine.surface().frames);
    log::info!("drew {} frames", frames);

    driver.shutdown();
    handle.await.context("driver task failed")?;
    Ok(())
}
