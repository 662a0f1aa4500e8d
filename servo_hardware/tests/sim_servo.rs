use rstest::rstest;
use servo_hardware::{Actuator, FeedbackModel, FeedbackSensor, SimulatedServo};

#[rstest]
#[case(500, 0)]
#[case(1500, 511)]
#[case(1800, 664)]
#[case(2500, 1023)]
fn default_model_is_linear(#[case] pulse: u16, #[case] reading: u16) {
    let servo = SimulatedServo::new();
    let mut act = servo.actuator();
    let mut sensor = servo.sensor();
    act.attach(18, 500, 2500).unwrap();
    act.write(pulse).unwrap();
    assert_eq!(sensor.read(0).unwrap(), reading);
}

#[rstest]
#[case(100, 0)]
#[case(3000, 1023)]
fn model_clamps_to_adc_range(#[case] position: i64, #[case] reading: u16) {
    assert_eq!(FeedbackModel::default().reading_at(position), reading);
}

#[test]
fn writes_are_limited_to_attach_bounds() {
    let servo = SimulatedServo::new();
    let mut act = servo.actuator();
    act.attach(18, 1000, 2000).unwrap();
    act.write(2400).unwrap();
    assert_eq!(servo.target_us(), Some(2000));
    assert_eq!(servo.position_us(), 2000);
}

#[test]
fn displaced_horn_stays_put_while_detached() {
    let servo = SimulatedServo::new().with_slew(20);
    let mut act = servo.actuator();
    let mut sensor = servo.sensor();
    act.attach(18, 500, 2500).unwrap();
    act.write(1500).unwrap();
    act.detach().unwrap();

    servo.displace(1800);
    for _ in 0..10 {
        assert_eq!(sensor.read(0).unwrap(), 664);
    }
    assert_eq!(servo.reads(), 10);

    act.attach(18, 500, 2500).unwrap();
    act.write(1500).unwrap();
    let _ = sensor.read(0).unwrap();
    assert_eq!(servo.position_us(), 1780);
}
