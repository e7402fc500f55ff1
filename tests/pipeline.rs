//! Input-normalization scenarios through the public mapping API.

use drone_hud::config::Config;
use drone_hud::controller::command::CommandMapper;
use drone_hud::controller::mapper::{AxisId, ControllerState};

/// Mapper over a [-1, 1] device range with a 0.1 deadzone.
fn unit_range_mapper() -> CommandMapper {
    let config = Config::from_toml(
        r#"
        [controller]
        deadzone = 0.1
        axis_min = -1.0
        axis_max = 1.0

        [command]
        reverse = []
        "#,
    )
    .unwrap();
    CommandMapper::from_config(&config.controller, &config.command)
}

fn roll_for(raw: f32) -> i32 {
    let mut state = ControllerState::new();
    state.set_axis(AxisId::RightStickX, raw);
    unit_range_mapper().map(&state).roll
}

#[test]
fn test_inside_deadzone_is_zero() {
    assert_eq!(roll_for(0.05), 0);
    assert_eq!(roll_for(-0.05), 0);
    assert_eq!(roll_for(0.1), 0);
}

#[test]
fn test_midpoint_of_usable_range() {
    assert_eq!(roll_for(0.55), 50);
    assert_eq!(roll_for(-0.55), -50);
}

#[test]
fn test_extremes_and_clamping() {
    assert_eq!(roll_for(1.0), 100);
    assert_eq!(roll_for(-1.0), -100);
    assert_eq!(roll_for(7.5), 100);
    assert_eq!(roll_for(-7.5), -100);
}

#[test]
fn test_monotonic_outside_deadzone() {
    let mut previous = roll_for(0.11);
    let mut raw = 0.11;
    while raw <= 1.0 {
        let value = roll_for(raw);
        assert!(value >= previous, "{} < {} at raw {}", value, previous, raw);
        previous = value;
        raw += 0.01;
    }
}
