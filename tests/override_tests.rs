//! Integration tests for the override controller

mod common;
use common::*;

use traffic_sequencer::{Indication, ModeCell, OverrideMode, Phase, Trigger};

#[test]
fn triggers_keep_overrides_mutually_exclusive() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);

    let steps = [
        (Trigger::Red, OverrideMode::RedOverride),
        (Trigger::Blink, OverrideMode::BlinkOverride),
        (Trigger::PowerOff, OverrideMode::PowerOff),
        (Trigger::Red, OverrideMode::RedOverride),
        (Trigger::Red, OverrideMode::Normal),
        (Trigger::PowerOff, OverrideMode::PowerOff),
        (Trigger::Blink, OverrideMode::BlinkOverride),
        (Trigger::Blink, OverrideMode::Normal),
    ];

    for (trigger, expected) in steps {
        timer.advance(TestDuration(50));
        assert_eq!(light.activate_or_toggle(trigger).unwrap(), expected);
        assert_eq!(light.mode(), expected);
        assert_eq!(mode.load(), expected);
        light.poll().unwrap();
        assert_eq!(light.mode(), expected);
    }
}

#[test]
fn red_override_holds_red_and_pauses_cycle() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 2500);
    assert_eq!(light.active_phase(), Some(Phase::Green));

    light.activate_or_toggle(Trigger::Red).unwrap();

    assert_eq!(light.output().levels(), [255, 0, 0]);
    assert_eq!(light.active_phase(), None);
    assert!(!light.scheduler().is_pending(light.sequencer_task()));

    let changes = run_until(&mut light, &timer, 10_000);
    assert!(changes.is_empty());
    assert_eq!(light.output().levels(), [255, 0, 0]);
}

#[test]
fn power_off_darkens_every_lamp() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);

    light.activate_or_toggle(Trigger::PowerOff).unwrap();
    assert_eq!(light.output().levels(), [0, 0, 0]);

    light.set_brightness(200);
    run_until(&mut light, &timer, 5000);
    assert_eq!(light.output().levels(), [0, 0, 0]);
    assert_eq!(light.status().indication, Indication::Off);
}

#[test]
fn deactivating_any_override_resumes_at_red() {
    let triggers = [Trigger::Red, Trigger::Blink, Trigger::PowerOff];

    let engage_points = [
        (1000, Phase::Red),
        (2000, Phase::Yellow),
        (3000, Phase::Green),
        (4500, Phase::GreenBlink),
        (5900, Phase::FinishGreen),
        (6000, Phase::Yellow2),
    ];

    for (engage_at, phase) in engage_points {
        for trigger in triggers {
            let timer = MockTimeSource::new();
            let mode = ModeCell::new();
            let mut light = started_light(&timer, &mode);
            run_until(&mut light, &timer, engage_at);
            assert_eq!(light.active_phase(), Some(phase));

            light.activate_or_toggle(trigger).unwrap();
            run_until(&mut light, &timer, engage_at + 700);
            assert_eq!(
                light.activate_or_toggle(trigger).unwrap(),
                OverrideMode::Normal
            );

            let resume_at = engage_at + 700 + 2000;
            assert_eq!(light.output().levels(), [0, 0, 0]);
            assert_eq!(light.pending_phase(), Phase::Red);
            assert_eq!(
                light.scheduler().next_due(light.sequencer_task()),
                Some(TestInstant(resume_at))
            );

            let changes = run_until(&mut light, &timer, resume_at);
            assert_eq!(
                changes,
                [(resume_at, Some(Phase::Red))],
                "{:?} engaged at {}",
                trigger,
                engage_at
            );
            assert_eq!(light.output().levels(), [255, 0, 0]);
        }
    }
}

#[test]
fn same_trigger_twice_returns_to_normal_with_entry_armed() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 1000);

    light.activate_or_toggle(Trigger::PowerOff).unwrap();
    light.activate_or_toggle(Trigger::PowerOff).unwrap();

    assert_eq!(light.mode(), OverrideMode::Normal);
    let task = light.sequencer_task();
    assert!(light.scheduler().is_pending(task));
    assert_eq!(light.scheduler().next_due(task), Some(TestInstant(3000)));
    assert_eq!(light.pending_phase(), Phase::Red);
}

#[test]
fn blink_override_alternates_every_half_second() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 3000);
    assert_eq!(light.active_phase(), Some(Phase::Green));

    light.activate_or_toggle(Trigger::Blink).unwrap();
    assert_eq!(light.output().levels(), [0, 0, 0]);

    let mut samples = Vec::new();
    for t in [3499, 3500, 3999, 4000, 4500, 5000] {
        run_until(&mut light, &timer, t);
        samples.push(light.output().levels());
    }
    assert_eq!(
        samples,
        [
            [0, 0, 0],
            [255, 255, 255],
            [255, 255, 255],
            [0, 0, 0],
            [255, 255, 255],
            [0, 0, 0],
        ]
    );
    assert_eq!(light.active_phase(), None);

    run_until(&mut light, &timer, 5200);
    light.activate_or_toggle(Trigger::Blink).unwrap();
    assert!(!light.scheduler().is_enabled(light.blink_task()));

    let changes = run_until(&mut light, &timer, 7200);
    assert_eq!(changes, [(7200, Some(Phase::Red))]);
    assert_eq!(light.output().levels(), [255, 0, 0]);
}

#[test]
fn switching_from_blink_to_red_stops_blinking() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);

    light.activate_or_toggle(Trigger::Blink).unwrap();
    run_until(&mut light, &timer, 500);
    assert_eq!(light.output().levels(), [255, 255, 255]);

    light.activate_or_toggle(Trigger::Red).unwrap();
    assert_eq!(light.output().levels(), [255, 0, 0]);

    run_until(&mut light, &timer, 3000);
    assert_eq!(light.output().levels(), [255, 0, 0]);
    assert!(!light.scheduler().is_enabled(light.blink_task()));
}

#[test]
fn override_follows_brightness() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    light.set_brightness(80);

    light.activate_or_toggle(Trigger::Blink).unwrap();
    run_until(&mut light, &timer, 500);

    assert_eq!(light.output().levels(), [80, 80, 80]);
}

#[test]
fn interrupt_published_mode_applies_on_next_poll() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 1000);

    // Interrupt handler side
    mode.toggle(Trigger::PowerOff);
    assert_eq!(light.mode(), OverrideMode::Normal);
    assert_eq!(light.output().levels(), [255, 0, 0]);

    timer.advance(TestDuration(1));
    light.poll().unwrap();
    assert_eq!(light.mode(), OverrideMode::PowerOff);
    assert_eq!(light.output().levels(), [0, 0, 0]);

    run_until(&mut light, &timer, 1500);
    mode.toggle(Trigger::PowerOff);
    timer.advance(TestDuration(1));
    light.poll().unwrap();

    assert_eq!(light.mode(), OverrideMode::Normal);
    assert_eq!(
        light.scheduler().next_due(light.sequencer_task()),
        Some(TestInstant(3501))
    );
}

#[test]
fn double_press_between_polls_restarts_cycle_at_red() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 1000);
    let reports = light.sink().reports().len();

    // Both presses land in interrupt context before the loop wakes
    mode.toggle(Trigger::PowerOff);
    mode.toggle(Trigger::PowerOff);
    timer.advance(TestDuration(1));
    light.poll().unwrap();

    assert_eq!(light.mode(), OverrideMode::Normal);
    assert_eq!(light.output().levels(), [0, 0, 0]);
    assert_eq!(light.pending_phase(), Phase::Red);
    assert_eq!(
        light.scheduler().next_due(light.sequencer_task()),
        Some(TestInstant(3001))
    );
    assert_eq!(light.sink().reports().len(), reports + 1);
    assert_eq!(
        light.sink().last().map(|report| report.to_string()).as_deref(),
        Some("MODE:NORMAL, LED:OFF, Brightness:255")
    );

    let changes = run_until(&mut light, &timer, 3001);
    assert_eq!(changes, [(3001, Some(Phase::Red))]);
}

#[test]
fn override_reentered_between_polls_is_reported_again() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    light.activate_or_toggle(Trigger::Blink).unwrap();
    run_until(&mut light, &timer, 700);
    assert_eq!(light.output().levels(), [255, 255, 255]);
    let reports = light.sink().reports().len();

    mode.toggle(Trigger::Blink);
    mode.toggle(Trigger::Blink);
    light.poll().unwrap();

    // Blink pattern starts over from dark
    assert_eq!(light.mode(), OverrideMode::BlinkOverride);
    assert_eq!(light.output().levels(), [0, 0, 0]);
    assert_eq!(
        light.scheduler().next_due(light.blink_task()),
        Some(TestInstant(1200))
    );
    assert_eq!(light.sink().reports().len(), reports + 1);
    assert!(!light.scheduler().is_pending(light.sequencer_task()));
}

#[test]
fn button_press_also_applies_unpolled_interrupt_toggles() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 1000);

    mode.toggle(Trigger::Red);
    assert_eq!(
        light.activate_or_toggle(Trigger::Red).unwrap(),
        OverrideMode::Normal
    );

    assert_eq!(light.pending_phase(), Phase::Red);
    assert_eq!(
        light.scheduler().next_due(light.sequencer_task()),
        Some(TestInstant(3000))
    );
}

#[test]
fn override_published_before_start_is_applied_at_start() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    mode.toggle(Trigger::Red);

    let mut light = new_light(&timer, &mode);
    light.start().unwrap();
    light.poll().unwrap();

    assert_eq!(light.mode(), OverrideMode::RedOverride);
    assert_eq!(light.active_phase(), None);
    assert_eq!(light.output().levels(), [255, 0, 0]);
}

#[test]
fn every_transition_publishes_status() {
    let timer = MockTimeSource::new();
    let mode = ModeCell::new();
    let mut light = started_light(&timer, &mode);
    run_until(&mut light, &timer, 100);
    assert!(light.sink().reports().is_empty());

    light.activate_or_toggle(Trigger::Blink).unwrap();
    light.activate_or_toggle(Trigger::PowerOff).unwrap();
    light.activate_or_toggle(Trigger::PowerOff).unwrap();

    let lines: Vec<_> = light
        .sink()
        .reports()
        .iter()
        .map(|report| report.to_string())
        .collect();
    assert_eq!(
        lines,
        [
            "MODE:Blink Mode, LED:Blinking, Brightness:255",
            "MODE:Power OFF, LED:OFF, Brightness:255",
            "MODE:NORMAL, LED:OFF, Brightness:255",
        ]
    );
}
