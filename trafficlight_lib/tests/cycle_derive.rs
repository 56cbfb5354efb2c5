extern crate trafficlight_lib;

use std::sync::Arc;
use std::time::Duration;

use trafficlight_lib::config::ControllerConfigBuilder;
use trafficlight_lib::controller::PhaseController;
use trafficlight_lib::phase::Cycle;

#[derive(Cycle, Clone, Copy, Debug, PartialEq)]
enum Signal {
    Red,
    Green,
    Amber,
}

#[derive(Cycle, Clone, Copy, Debug, PartialEq)]
enum Lone {
    Only,
}

#[test]
fn test_derived_rotation_wraps() {
    assert_eq!(Signal::VARIANTS, &[Signal::Red, Signal::Green, Signal::Amber]);
    assert_eq!(Signal::initial(), Signal::Red);
    assert_eq!(Signal::Red.next(), Signal::Green);
    assert_eq!(Signal::Green.next(), Signal::Amber);
    assert_eq!(Signal::Amber.next(), Signal::Red);
    assert_eq!(Signal::Amber.index(), 2);
}

#[test]
fn test_single_variant_rotates_to_itself() {
    assert_eq!(Lone::Only.next(), Lone::Only);
    assert_eq!(Lone::Only.index(), 0);
}

#[test]
fn test_controller_cycles_through_derived_states() {
    let config = ControllerConfigBuilder::new()
        .dwell(Duration::from_millis(20), Duration::from_millis(30))
        .thread_name("three-phase")
        .build()
        .unwrap();
    let light = Arc::new(PhaseController::<Signal>::with_config(config));
    assert_eq!(light.current_phase(), Signal::Red);

    let subscription = light.subscribe();
    let handle = light.start().unwrap();
    let phases: Vec<Signal> = (0..6).map(|_| subscription.next_change().phase).collect();
    handle.join().unwrap();

    assert_eq!(
        phases,
        vec![
            Signal::Green,
            Signal::Amber,
            Signal::Red,
            Signal::Green,
            Signal::Amber,
            Signal::Red,
        ]
    );
}
