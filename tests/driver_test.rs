#![cfg(feature = "tokio-runtime")]

use maplet_bounce::prelude::*;
use std::num::NonZeroU32;

fn driver(elastic: bool) -> (BounceDriver<RecordingSurface>, MarkerId) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut engine =
        BounceEngine::with_cache(RecordingSurface::new(true), Arc::new(TimelineCache::new()));
    let marker = engine
        .create_marker_with_options(&BounceOptions::new().elastic(elastic))
        .unwrap();
    engine
        .attach(
            marker,
            MarkerGeometry::new(PixelPoint::new(40, 80), Size::new(25, 41))
                .with_shadow(Size::new(41, 41)),
        )
        .unwrap();
    (BounceDriver::new(engine), marker)
}

#[tokio::test(start_paused = true)]
async fn test_driver_plays_bounce_in_tokio_time() {
    let (driver, marker) = driver(false);
    let handle = driver.spawn();

    driver
        .with_engine(|engine| engine.bounce(marker, Cycles::Times(NonZeroU32::new(1).unwrap())))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let drawn = driver.with_engine(|engine| engine.surface().frames.len());
    assert!(drawn > 0 && drawn < 30, "drew {drawn} frames by 200ms");

    tokio::time::sleep(Duration::from_millis(400)).await;
    driver.with_engine(|engine| {
        assert_eq!(engine.surface().frames.len(), 30);
        assert_eq!(engine.surface().ended, vec![marker]);
        assert!(!engine.is_bouncing(marker));
    });

    driver.shutdown();
    handle.await.unwrap();
    assert!(!driver.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_tick_fires_due_callbacks() {
    let (driver, marker) = driver(true);
    driver
        .with_engine(|engine| engine.bounce(marker, Cycles::Unbounded))
        .unwrap();

    // step 0 is due immediately
    assert_eq!(driver.tick(), 1);
    assert_eq!(driver.tick(), 0);

    tokio::time::sleep(Duration::from_millis(390)).await;
    assert!(driver.tick() > 0);
    driver.with_engine(|engine| {
        assert!(engine.surface().frames.len() >= 30);
        assert_eq!(engine.state(marker).unwrap(), BounceState::Bouncing(Phase::Resize));
    });
}

#[tokio::test(start_paused = true)]
async fn test_idle_driver_shuts_down() {
    let (driver, _) = driver(true);
    let handle = driver.spawn();
    assert!(driver.is_running());

    tokio::time::sleep(Duration::from_millis(10)).await;
    driver.shutdown();
    handle.await.unwrap();
}
