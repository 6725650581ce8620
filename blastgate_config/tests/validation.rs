use blastgate_config::{MAX_GATES, load_toml};
use rstest::rstest;

const SIX_GATES: &str = r#"
[[gates]]
servo_pin = 5
button_pin = 4
label = "table saw"

[[gates]]
servo_pin = 6
button_pin = 7

[[gates]]
servo_pin = 9
button_pin = 8

[[gates]]
servo_pin = 10
button_pin = 13

[[gates]]
servo_pin = 11
button_pin = 16

[[gates]]
servo_pin = 12
button_pin = 17

[collector]
on_pin = 20
off_pin = 21
"#;

#[test]
fn minimal_config_gets_documented_defaults() {
    let cfg = load_toml(SIX_GATES).expect("parse TOML");
    cfg.validate().expect("valid config should pass");

    assert_eq!(cfg.gates.len(), 6);
    assert_eq!(cfg.gates[0].label.as_deref(), Some("table saw"));
    assert!(cfg.gates[1].label.is_none());
    assert_eq!(cfg.timing.debounce_ms, 30);
    assert_eq!(cfg.timing.move_ms, 750);
    assert_eq!(cfg.timing.collector_pulse_ms, 500);
    assert_eq!(cfg.servo.min_pulse_us, 400);
    assert_eq!(cfg.servo.max_pulse_us, 2500);
    assert!(!cfg.input.active_low);
    assert!(cfg.feedback.enabled);
    assert!(cfg.beeper.is_none());
}

#[rstest]
#[case("[timing]\ndebounce_ms = 0\n", "timing.debounce_ms must be >= 1")]
#[case("[timing]\nmove_ms = 0\n", "timing.move_ms must be >= 1")]
#[case("[timing]\nmove_ms = 600000\n", "timing.move_ms is unreasonably large")]
#[case("[timing]\npoll_hz = 0\n", "timing.poll_hz must be > 0")]
#[case("[servo]\nmin_pulse_us = 2500\nmax_pulse_us = 400\n", "min_pulse_us must be <")]
#[case("[knob]\nchannel = 8\n", "knob.channel must be in 0..=7")]
#[case("[beeper]\npin = 20\n", "pin 20 assigned twice")]
#[case("[store]\npath = \"  \"\n", "store.path must not be empty")]
fn rejects_out_of_range_sections(#[case] extra: &str, #[case] needle: &str) {
    let toml = format!("{SIX_GATES}\n{extra}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn rejects_shared_button_and_servo_pin() {
    let toml = r#"
[[gates]]
servo_pin = 5
button_pin = 5

[collector]
on_pin = 20
off_pin = 21
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate pin");
    assert!(format!("{err}").contains("gates[0].button_pin"));
}

#[test]
fn rejects_empty_gate_list() {
    let toml = r#"
gates = []

[collector]
on_pin = 20
off_pin = 21
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_more_gates_than_the_store_holds() {
    let mut toml = String::new();
    for i in 0..=MAX_GATES {
        // pins are not checked before the count, so reuse is fine here
        toml.push_str(&format!("[[gates]]\nservo_pin = {}\nbutton_pin = {}\n", i % 200, 201));
    }
    toml.push_str("[collector]\non_pin = 250\noff_pin = 251\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("too many gates");
    assert!(format!("{err}").contains("at most 126"));
}

#[test]
fn missing_collector_is_a_parse_error() {
    let toml = r#"
[[gates]]
servo_pin = 5
button_pin = 4
"#;
    assert!(load_toml(toml).is_err());
}
