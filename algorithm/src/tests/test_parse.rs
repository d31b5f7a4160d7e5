use crate::parse_int_prefix;

#[test]
fn parse_plain_integer() {
    assert_eq!(parse_int_prefix("4473"), Some(4473));
}

#[test]
fn parse_truncates_at_first_non_digit() {
    assert_eq!(parse_int_prefix("545.4"), Some(545));
    assert_eq!(parse_int_prefix("  -12m"), Some(-12));
    assert_eq!(parse_int_prefix("+7"), Some(7));
}

#[test]
fn parse_rejects_non_numbers() {
    assert_eq!(parse_int_prefix("testing"), None);
    assert_eq!(parse_int_prefix(""), None);
    assert_eq!(parse_int_prefix("-"), None);
}
