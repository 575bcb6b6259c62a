//! Property tests for value round trips.

use proptest::prelude::*;
use regkey::{ops, Access, KeyOptions, MemoryBackend, RegKey, RegValue, RootKey};

fn key() -> RegKey<MemoryBackend> {
    let (key, _) = RegKey::create_with(
        MemoryBackend::new(),
        RootKey::CurrentUser,
        "Prop",
        KeyOptions::write(),
    )
    .unwrap();
    key
}

proptest! {
    #[test]
    fn test_dword_round_trip(value in any::<u32>()) {
        let key = key();
        key.set_dword("v", value).unwrap();
        prop_assert_eq!(key.get_dword("v").unwrap(), value);
    }

    #[test]
    fn test_string_round_trip(value in "[^\\x00]*") {
        let key = key();
        key.set_string("v", &value).unwrap();
        prop_assert_eq!(key.get_string("v").unwrap(), value);
    }

    #[test]
    fn test_multi_string_round_trip(values in prop::collection::vec("[^\\x00]+", 0..8)) {
        let key = key();
        key.set_multi_string("v", &values).unwrap();
        prop_assert_eq!(key.get_multi_string("v").unwrap(), values);
    }

    #[test]
    fn test_unexpanded_text_is_literal(value in "[^\\x00]*") {
        let key = key();
        key.set_expand_string("v", &value).unwrap();
        prop_assert_eq!(
            key.get_expand_string("v", regkey::ExpandMode::DontExpand).unwrap(),
            value
        );
    }

    #[test]
    fn test_path_separators_are_equivalent(
        segments in prop::collection::vec("[A-Za-z0-9 _.-]{1,12}", 1..5)
    ) {
        let backend = MemoryBackend::new();
        let forward = segments.join("/");
        let backward = segments.join("\\");
        ops::set(&backend, RootKey::CurrentUser, &forward, "v", 1u32, Access(0)).unwrap();
        prop_assert_eq!(
            ops::query(&backend, RootKey::CurrentUser, &backward, "v", Access(0)).unwrap(),
            Some(RegValue::Dword(1))
        );
    }
}
