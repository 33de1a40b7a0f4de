use crate::sim::{ScenarioError, SimTime};

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
    assert_eq!(SimTime::from_secs_f64(1.1), SimTime(1_100_000_000));
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime(u64::MAX).saturating_add(SimTime(1)), SimTime(u64::MAX));
}

#[test]
fn sim_time_parses_unit_suffixes() {
    assert_eq!("2ms".parse::<SimTime>().unwrap(), SimTime::from_millis(2));
    assert_eq!("1.1s".parse::<SimTime>().unwrap(), SimTime(1_100_000_000));
    assert_eq!("500us".parse::<SimTime>().unwrap(), SimTime::from_micros(500));
    assert_eq!("10ns".parse::<SimTime>().unwrap(), SimTime(10));
    assert_eq!(" 3 ".parse::<SimTime>().unwrap(), SimTime::from_secs(3));
}

#[test]
fn sim_time_rejects_garbage() {
    for bad in ["", "abc", "2 fortnights", "-1s", "1.2.3s"] {
        let err = bad.parse::<SimTime>().expect_err(bad);
        assert!(matches!(err, ScenarioError::InvalidTime(_)), "{bad}: {err:?}");
    }
}

#[test]
fn sim_time_displays_as_seconds() {
    assert_eq!(SimTime(1_100_000_000).to_string(), "1.1s");
    assert_eq!(SimTime::ZERO.to_string(), "0s");
}
