//! Cross-crate scheduling scenarios
//!
//! Exercises the ticker, registry, scheduler, and host mixin together the
//! way an application drives them: through scripted refreshes only.

use std::sync::Arc;

use parking_lot::Mutex;

use tempo_ticker::TickEvent;

/// Records every dispatch an item sees; shared between the test body and
/// the registered callback
#[derive(Clone, Default)]
pub struct DeltaRecorder {
    events: Arc<Mutex<Vec<TickEvent>>>,
}

impl DeltaRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl FnMut(&TickEvent) + Send + 'static {
        let sink = self.events.clone();
        move |event: &TickEvent| sink.lock().push(*event)
    }

    pub fn events(&self) -> Vec<TickEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn last(&self) -> Option<TickEvent> {
        self.events.lock().last().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use tempo_core::{CallbackId, VirtualTime, MIN_TIME_SCALE};
    use tempo_sched::DelayedScheduler;
    use tempo_ticker::TickerHost;

    use super::*;
    use crate::harness::{ScriptedDriver, FRAME_STEP};

    #[test]
    fn test_scale_composition_grid() {
        let scales = [0.5, 1.0, 2.0, 5.0];
        for &local in &scales {
            for &global in &scales {
                let rig = ScriptedDriver::new();
                let ticker = rig.registry.get_ticker("grid", false);
                ticker.set_time_scale(local);
                rig.registry.set_global_time_scale(global);

                rig.step(FRAME_STEP);

                let expected = (16_000.0 * local * global) as i64;
                let got = ticker.time().as_micros();
                assert!(
                    (got - expected).abs() <= 1,
                    "L={local} Gs={global}: got {got}us, expected {expected}us"
                );
            }
        }
    }

    #[test]
    fn test_local_zero_sleeps_global_zero_floors_to_epsilon() {
        // Local scale 0 is a sleep request: time is frozen outright
        let rig = ScriptedDriver::new();
        let ticker = rig.registry.get_ticker("frozen", false);
        ticker.set_time_scale(0.0);
        rig.run_frames(10, FRAME_STEP);
        assert!(!ticker.is_running());
        assert_eq!(ticker.time(), VirtualTime::ZERO);

        // Global scale 0 is floored: time crawls at epsilon speed
        let rig = ScriptedDriver::new();
        let ticker = rig.registry.get_ticker("crawling", false);
        rig.registry.set_global_time_scale(0.0);
        assert_eq!(rig.registry.global_time_scale(), MIN_TIME_SCALE);
        rig.run_frames(10, FRAME_STEP);
        assert!(ticker.is_running());
        assert!(ticker.time().as_micros() <= 1);
    }

    #[test]
    fn test_two_tickers_report_scaled_item_deltas() {
        let rig = ScriptedDriver::new();
        let x = rig.registry.get_ticker("x", false);
        let y = rig.registry.get_ticker("y", false);
        x.set_time_scale(1.0);
        y.set_time_scale(0.5);
        rig.registry.set_global_time_scale(2.0);

        let on_x = DeltaRecorder::new();
        let on_y = DeltaRecorder::new();
        x.add(CallbackId::next(), on_x.callback());
        y.add(CallbackId::next(), on_y.callback());

        rig.step(FRAME_STEP);

        let ex = on_x.last().expect("x dispatched");
        let ey = on_y.last().expect("y dispatched");
        assert_eq!(ex.item_time.as_millis(), 32);
        assert_eq!(ey.item_time.as_millis(), 16);
        assert_eq!(x.time().as_millis(), 32);
        assert_eq!(y.time().as_millis(), 16);
    }

    #[test]
    fn test_remove_all_silences_arbitrary_add_remove_sequences() {
        let rig = ScriptedDriver::new();
        let ticker = rig.registry.get_ticker("churn", false);
        let recorder = DeltaRecorder::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut live: Vec<CallbackId> = Vec::new();

        for _ in 0..200 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let id = CallbackId::next();
                ticker.add(id, recorder.callback());
                live.push(id);
            } else {
                let idx = rng.gen_range(0..live.len());
                ticker.remove(live.swap_remove(idx));
            }
            if rng.gen_bool(0.1) {
                rig.step(FRAME_STEP);
            }
        }

        ticker.remove_all();
        assert_eq!(ticker.active_items(), 0);

        let fired_before = recorder.count();
        rig.run_frames(20, FRAME_STEP);
        assert_eq!(recorder.count(), fired_before);
    }

    #[test]
    fn test_sleep_gap_contributes_no_virtual_time_under_jitter() {
        let rig = ScriptedDriver::new();
        let ticker = rig.registry.get_ticker("anim", false);
        rig.run_jittered(120, FRAME_STEP, 2_000, 3);

        let before = ticker.time();
        ticker.sleep();
        rig.run_jittered(60, Duration::from_secs(1), 5_000, 4);
        ticker.wake();
        let after = ticker.time();
        assert_eq!(after, before);

        // And it resumes normally afterwards
        rig.step(FRAME_STEP);
        assert_eq!((ticker.time() - before).as_millis(), 16);
    }

    #[test]
    fn test_backgrounding_freezes_delayed_calls() {
        let rig = ScriptedDriver::new();
        let sched = DelayedScheduler::new(&rig.registry);
        let fired = Arc::new(Mutex::new(false));
        let sink = fired.clone();
        sched.call(CallbackId::next(), move || *sink.lock() = true, 0.1);

        rig.run_frames(3, FRAME_STEP);

        // App goes to background for a minute
        rig.registry.store_time_before_sleep();
        rig.clock.advance(Duration::from_secs(60));
        rig.registry.restore_time_after_sleep();

        // The gap contributed nothing: still 52ms of virtual delay left
        rig.run_frames(3, FRAME_STEP);
        assert!(!*fired.lock());
        rig.run_frames(1, FRAME_STEP);
        assert!(*fired.lock());
    }

    #[test]
    fn test_host_entities_pause_independently() {
        let rig = ScriptedDriver::new();
        let mut hero = TickerHost::named(rig.registry.clone(), "hero");
        let mut boss = TickerHost::named(rig.registry.clone(), "boss");
        let hero_rec = DeltaRecorder::new();
        let boss_rec = DeltaRecorder::new();
        hero.add_ticker(hero_rec.callback());
        boss.add_ticker(boss_rec.callback());

        rig.run_frames(2, FRAME_STEP);
        boss.pause_tickers();
        rig.run_frames(2, FRAME_STEP);

        assert_eq!(hero_rec.count(), 4);
        assert_eq!(boss_rec.count(), 2);
        assert_eq!(hero.ticker_time().as_millis(), 64);
        assert_eq!(boss.ticker_time().as_millis(), 32);

        boss.resume_tickers();
        rig.run_frames(1, FRAME_STEP);
        assert_eq!(boss_rec.count(), 3);
        assert_eq!(boss.ticker_time().as_millis(), 48);
    }

    #[tokio::test]
    async fn test_wait_spans_background_gap() {
        let rig = ScriptedDriver::new();
        let sched = DelayedScheduler::new(&rig.registry);
        let fut = sched.wait(0.05);

        rig.run_frames(2, FRAME_STEP);
        rig.registry.store_time_before_sleep();
        rig.clock.advance(Duration::from_secs(10));
        rig.registry.restore_time_after_sleep();
        rig.run_frames(2, FRAME_STEP);

        fut.await.expect("wait resolves after 64ms of virtual time");
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        // 0 = add, 1 = remove newest, 2 = run a frame
        proptest! {
            #[test]
            fn prop_remove_all_silences_any_churn_sequence(
                ops in prop::collection::vec(0u8..=2, 1..80),
            ) {
                let rig = ScriptedDriver::new();
                let ticker = rig.registry.get_ticker("churn", false);
                let recorder = DeltaRecorder::new();
                let mut live: Vec<CallbackId> = Vec::new();

                for op in ops {
                    match op {
                        0 => {
                            let id = CallbackId::next();
                            ticker.add(id, recorder.callback());
                            live.push(id);
                        }
                        1 => {
                            if let Some(id) = live.pop() {
                                ticker.remove(id);
                            }
                        }
                        _ => rig.step(FRAME_STEP),
                    }
                }

                ticker.remove_all();
                prop_assert_eq!(ticker.active_items(), 0);

                let fired = recorder.count();
                rig.run_frames(5, FRAME_STEP);
                prop_assert_eq!(recorder.count(), fired);
            }
        }
    }
}
