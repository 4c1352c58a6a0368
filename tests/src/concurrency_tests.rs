//! Interrupt-side writer racing the consumer-side reader

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ppm_core::*;

/// Feed frames whose channels all carry the same width
fn uniform_frame(input: &PpmInput, t: &mut u32, width: u16) {
    let mut pulse = |w: u32| {
        input.on_edge(Level::Low, *t);
        *t = t.wrapping_add(w);
        input.on_edge(Level::High, *t);
        *t = t.wrapping_add(300);
    };
    pulse(9_000);
    for _ in 0..6 {
        pulse(u32::from(width));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshot_is_never_torn() {
    let input = Arc::new(PpmInput::new());
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let input = input.clone();
        let done = done.clone();
        tokio::task::spawn_blocking(move || {
            let mut t = 0u32;
            for i in 0..20_000u32 {
                let width = 900 + (i % 700) as u16;
                uniform_frame(&input, &mut t, width);
            }
            done.store(true, Ordering::Release);
        })
    };

    let consumer = {
        let input = input.clone();
        let done = done.clone();
        tokio::task::spawn_blocking(move || {
            let mut seen = 0u32;
            while !done.load(Ordering::Acquire) || input.frame_pending() {
                if let Some(frame) = input.snapshot() {
                    let first = frame.values()[0];
                    assert!(
                        frame.values().iter().all(|&w| w == first),
                        "torn frame: {:?}",
                        frame
                    );
                    seen += 1;
                }
            }
            seen
        })
    };

    producer.await.unwrap();
    let seen = consumer.await.unwrap();

    assert!(seen > 0);
    assert_eq!(input.stats().frames, 20_000);
    assert_eq!(input.stats().partial_frames, 0);
}

#[tokio::test]
async fn consumer_sees_latest_frame_only() {
    let input = PpmInput::new();
    let mut t = 0u32;
    for width in [1000, 1100, 1200] {
        uniform_frame(&input, &mut t, width);
    }

    assert_eq!(input.snapshot(), Some(RawFrame([1200; 6])));
    assert_eq!(input.snapshot(), None);
    assert_eq!(input.stats().frames, 3);
}
