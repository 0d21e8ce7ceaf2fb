// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use volt_clock::ClockSource;

// Pinned for reproducibility; see volt-core's gate properties.
const SEED_BYTES: [u8; 32] = [
    0x43, 0x4c, 0x4f, 0x43, 0x4b, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0,
];

fn runner() -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::default(), rng)
}

#[test]
fn documented_example_toggles_exactly_twice() {
    let mut clk = ClockSource::new("clk", 1000).expect("clock");
    let edges = clk.update(2500);
    let times: Vec<u64> = edges.iter().map(|e| e.at_ms).collect();
    assert_eq!(times, [1000, 2000]);
}

#[test]
fn toggle_count_is_whole_intervals_crossed() {
    let strategy = (1_u64..500, 0_u64..20_000);
    runner()
        .run(&strategy, |(interval, elapsed)| {
            let mut clk = ClockSource::new("clk", interval).expect("clock");
            let edges = clk.update(elapsed);
            prop_assert_eq!(edges.len() as u64, elapsed / interval);
            for (k, edge) in edges.iter().enumerate() {
                prop_assert_eq!(edge.at_ms, (k as u64 + 1) * interval);
            }
            Ok(())
        })
        .expect("one toggle per interval");
}

#[test]
fn split_updates_match_a_single_update() {
    let strategy = (1_u64..200, 0_u64..5_000, 0_u64..5_000);
    runner()
        .run(&strategy, |(interval, a, b)| {
            let (early, late) = (a.min(b), a.max(b));
            let mut split = ClockSource::new("split", interval).expect("clock");
            let mut whole = ClockSource::new("whole", interval).expect("clock");
            let mut n = split.update(early).len();
            n += split.update(late).len();
            prop_assert_eq!(n, whole.update(late).len());
            prop_assert_eq!(split.signal(), whole.signal());
            Ok(())
        })
        .expect("catch-up is path independent");
}

#[test]
fn stop_start_preserves_the_grid() {
    let strategy = (1_u64..200, 0_u64..5_000, 0_u64..5_000);
    runner()
        .run(&strategy, |(interval, a, b)| {
            let (paused_until, end) = (a.min(b), a.max(b));
            let mut clk = ClockSource::new("clk", interval).expect("clock");
            clk.stop();
            prop_assert!(clk.update(paused_until).is_empty());
            clk.start();
            let edges = clk.update(end);
            prop_assert_eq!(
                edges.len() as u64,
                end / interval - paused_until / interval
            );
            for edge in &edges {
                prop_assert_eq!(edge.at_ms % interval, 0);
            }
            Ok(())
        })
        .expect("toggles stay on the original grid");
}
