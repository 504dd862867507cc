//! Integration tests for Duration

mod common;
use common::*;

use clock_engine::{Duration, InvalidDuration, Unit};
use pretty_assertions::assert_eq;

#[test]
fn renders_zero_padded_fields() {
    assert_eq!(hms(2, 5, 9).to_text().as_str(), "02:05:09");
    assert_eq!(hms(0, 0, 0).to_string(), "00:00:00");
    assert_eq!(hms(9, 59, 59).to_string(), "09:59:59");
}

#[test]
fn text_has_two_digit_minutes_and_seconds_for_small_values() {
    for hour in [0, 1, 9, 10, 99] {
        for minute in 0..60 {
            for second in [0, 1, 9, 10, 59] {
                let text = hms(hour, minute, second).to_string();
                let fields: Vec<&str> = text.split(':').collect();
                assert_eq!(fields.len(), 3);
                assert!(fields.iter().all(|field| field.len() == 2), "{}", text);
            }
        }
    }
}

#[test]
fn hours_past_two_digits_are_not_truncated() {
    assert_eq!(hms(100, 0, 0).to_string(), "100:00:00");
    assert_eq!(hms(1234, 5, 6).to_string(), "1234:05:06");
}

#[test]
fn sixty_unit_seconds_make_one_minute() {
    let mut duration = Duration::ZERO;
    for _ in 0..60 {
        duration = duration.checked_add(Duration::ONE_SECOND).unwrap();
    }
    assert_eq!(duration, hms(0, 1, 0));
}

#[test]
fn add_carries_through_minutes_into_hours() {
    assert_eq!(hms(0, 59, 59).checked_add(hms(0, 0, 1)).unwrap(), hms(1, 0, 0));
}

#[test]
fn add_carries_seconds_and_minutes_independently() {
    assert_eq!(hms(1, 30, 45).checked_add(hms(2, 45, 30)).unwrap(), hms(4, 16, 15));
    assert_eq!(hms(5, 59, 59).checked_add(hms(0, 0, 1)).unwrap(), hms(6, 0, 0));
}

#[test]
fn add_fails_when_hours_overflow() {
    let max = hms(i64::from(u32::MAX), 59, 59);
    assert!(matches!(
        max.checked_add(Duration::ONE_SECOND),
        Err(InvalidDuration::OutOfRange { unit: Unit::Hour, .. })
    ));
}

#[test]
fn subtract_borrows_from_hours_when_minutes_are_empty() {
    assert_eq!(hms(1, 0, 0).checked_sub(hms(0, 0, 1)).unwrap(), hms(0, 59, 59));
}

#[test]
fn subtract_borrows_from_minutes_first() {
    assert_eq!(hms(0, 2, 0).checked_sub(hms(0, 0, 1)).unwrap(), hms(0, 1, 59));
    assert_eq!(hms(3, 10, 5).checked_sub(hms(1, 20, 10)).unwrap(), hms(1, 49, 55));
}

#[test]
fn subtract_to_exact_zero() {
    assert_eq!(hms(0, 0, 1).checked_sub(Duration::ONE_SECOND).unwrap(), Duration::ZERO);
    assert!(hms(2, 3, 4).checked_sub(hms(2, 3, 4)).unwrap().is_zero());
}

#[test]
fn subtract_below_zero_is_an_underflow() {
    assert_eq!(
        Duration::ZERO.checked_sub(Duration::ONE_SECOND),
        Err(InvalidDuration::Underflow)
    );
    assert_eq!(hms(0, 30, 0).checked_sub(hms(1, 0, 0)), Err(InvalidDuration::Underflow));
}

#[test]
fn counting_down_an_hour_reaches_zero_in_3600_steps() {
    let mut duration = hms(1, 0, 0);
    let mut steps = 0;
    while !duration.is_zero() {
        duration = duration.checked_sub(Duration::ONE_SECOND).unwrap();
        steps += 1;
    }
    assert_eq!(steps, 3600);
}

#[test]
fn construction_rejects_negative_components() {
    assert!(matches!(
        Duration::new(0, 0, -1),
        Err(InvalidDuration::Negative { unit: Unit::Second, value: -1 })
    ));
}

#[test]
fn single_pass_normalization_leaves_a_second_carry_in_minutes() {
    // Both fields overflow: minutes carry first, then seconds, without a second pass.
    let duration = hms(0, 60, 3600);
    assert_eq!(
        (duration.hour(), duration.minute(), duration.second()),
        (1, 60, 0)
    );
    assert_eq!(duration.to_string(), "01:60:00");
}

#[test]
fn arithmetic_on_an_unnormalized_minute_field_normalizes_it() {
    let duration = hms(0, 59, 60);
    assert_eq!(duration.checked_add(Duration::ZERO).unwrap(), hms(1, 0, 0));
}

#[test]
fn equality_compares_every_component() {
    assert_eq!(hms(1, 2, 3), hms(1, 2, 3));
    assert_ne!(hms(1, 2, 3), hms(1, 2, 4));
    assert_ne!(hms(1, 2, 3), hms(1, 3, 3));
    assert_ne!(hms(1, 2, 3), hms(2, 2, 3));
}

#[test]
fn parses_text_fields() {
    assert_eq!("02:05:09".parse::<Duration>().unwrap(), hms(2, 5, 9));
    assert_eq!(" 0:0:75 ".parse::<Duration>().unwrap(), hms(0, 1, 15));
    assert_eq!("1:a:3".parse::<Duration>(), Err(InvalidDuration::Malformed));
}

#[test]
fn error_messages_name_the_component() {
    let err = Duration::new(0, -2, 0).unwrap_err();
    assert_eq!(err.to_string(), "invalid value provided for minute: -2");
}
