use csv_reconcile::normalize::normalize_key;
use proptest::prelude::*;

#[test]
fn literal_contract_values() {
    assert_eq!(normalize_key(Some("12,345.00")).as_deref(), Some("1234500"));
    assert_eq!(normalize_key(Some("12345.00")).as_deref(), Some("1234500"));
    assert_eq!(normalize_key(Some("12345")).as_deref(), Some("12345"));
    assert_eq!(normalize_key(Some(" 123 ")).as_deref(), Some("123"));
    assert_eq!(normalize_key(Some("")).as_deref(), Some(""));
    assert_eq!(normalize_key(None), None);
    assert_eq!(normalize_key(Some(",.")).as_deref(), Some(",."));
}

#[test]
fn formatted_variants_normalize_equal() {
    let variants = ["1 234,00", "1.234,00", "1,234.00", "1234,00"];
    for variant in variants {
        assert_eq!(
            normalize_key(Some(variant)),
            normalize_key(Some("1234.00")),
            "variant {variant:?}"
        );
    }
}

#[test]
fn textual_keys_stay_case_sensitive() {
    assert_ne!(normalize_key(Some("abc")), normalize_key(Some("ABC")));
}

proptest! {
    #[test]
    fn normalization_is_idempotent(value in any::<String>()) {
        let once = normalize_key(Some(value.as_str()));
        let twice = normalize_key(once.as_deref());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalized_values_never_keep_edge_whitespace_or_interior_spaces(value in any::<String>()) {
        if let Some(normalized) = normalize_key(Some(value.as_str())) {
            prop_assert!(!normalized.contains(' '));
            prop_assert_eq!(normalized.trim(), normalized.as_str());
        }
    }
}
