//! Handle lifecycle and value access through the in-memory store.

use regkey::{
    Access, ErrorKind, ExpandMode, KeyOptions, MemoryBackend, RegKey, RegValue, RegistryError,
    RootKey, ValueKind,
};

fn create(backend: &MemoryBackend, path: &str) -> RegKey<MemoryBackend> {
    let (key, _) = RegKey::create_with(backend.clone(), RootKey::CurrentUser, path, KeyOptions::write())
        .expect("create key");
    key
}

#[test]
fn test_create_set_get_delete_scenario() {
    let backend = MemoryBackend::new();
    let (key, created) = RegKey::create_with(
        backend.clone(),
        RootKey::CurrentUser,
        "App\\Settings",
        KeyOptions::write(),
    )
    .unwrap();
    assert!(created);
    key.set_dword("Version", 3).unwrap();
    assert_eq!(key.get_dword("Version").unwrap(), 3);
    drop(key);

    let app = RegKey::open_with(backend.clone(), RootKey::CurrentUser, "App", KeyOptions::read())
        .unwrap();
    app.delete_key("Settings", Access::WOW64_64KEY).unwrap();

    let err = RegKey::open_with(backend.clone(), RootKey::CurrentUser, "App\\Settings", KeyOptions::read())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.code(), 2);
}

#[test]
fn test_create_existing_reports_not_created() {
    let backend = MemoryBackend::new();
    create(&backend, "App");
    let (_, created) =
        RegKey::create_with(backend.clone(), RootKey::CurrentUser, "app", KeyOptions::write()).unwrap();
    assert!(!created);
}

#[test]
fn test_path_separators_reach_same_location() {
    let backend = MemoryBackend::new();
    create(&backend, "App/Settings").set_string("Name", "x").unwrap();

    let key = RegKey::open_with(backend.clone(), RootKey::CurrentUser, "App\\Settings", KeyOptions::read())
        .unwrap();
    assert_eq!(key.get_string("Name").unwrap(), "x");
    assert_eq!(key.location(), "HKEY_CURRENT_USER\\App\\Settings");

    let key = RegKey::open_with(backend, RootKey::CurrentUser, "/App//Settings/", KeyOptions::read())
        .unwrap();
    assert_eq!(key.get_string("Name").unwrap(), "x");
}

#[test]
fn test_roots_are_separate() {
    let backend = MemoryBackend::new();
    create(&backend, "App");
    let err = RegKey::open_with(backend, RootKey::LocalMachine, "App", KeyOptions::read()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_every_path_releases_handles() {
    let backend = MemoryBackend::new();
    {
        let key = create(&backend, "App");
        let _ = key.get_dword("Missing");
        let _ = key.get_string("Missing");
        let mut other = RegKey::new(backend.clone());
        let _ = other.open(RootKey::CurrentUser, "Nope", KeyOptions::read());
        assert_eq!(backend.open_handles(), 1);
    }
    assert_eq!(backend.open_handles(), 0);
}

#[test]
fn test_closed_key_fails_without_host_call() {
    let backend = MemoryBackend::new();
    let mut key = create(&backend, "App");
    key.close();

    for err in [
        key.get_dword("a").unwrap_err(),
        key.get_string("a").unwrap_err(),
        key.get_multi_string("a").unwrap_err(),
        key.query_value_type("a").unwrap_err(),
        key.set_dword("a", 1).unwrap_err(),
        key.delete_tree("").unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert_eq!(err.code(), 0);
    }
}

#[test]
fn test_value_round_trips() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");

    key.set_dword("Zero", 0).unwrap();
    key.set_dword("Max", u32::MAX).unwrap();
    key.set_string("Name", "中文 \\ % \" ' \t").unwrap();
    key.set_string("Empty", "").unwrap();
    key.set_multi_string("List", &["one", "two", "three"]).unwrap();
    key.set_multi_string::<&str>("None", &[]).unwrap();

    assert_eq!(key.get_dword("Zero").unwrap(), 0);
    assert_eq!(key.get_dword("Max").unwrap(), u32::MAX);
    assert_eq!(key.get_string("Name").unwrap(), "中文 \\ % \" ' \t");
    assert_eq!(key.get_string("Empty").unwrap(), "");
    assert_eq!(key.get_multi_string("List").unwrap(), vec!["one", "two", "three"]);
    assert!(key.get_multi_string("None").unwrap().is_empty());
}

#[test]
fn test_value_names_are_case_insensitive() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_dword("Version", 1).unwrap();
    key.set_dword("VERSION", 2).unwrap();
    assert_eq!(key.get_dword("version").unwrap(), 2);
    assert_eq!(key.enum_values().unwrap().len(), 1);
}

#[test]
fn test_expand_string_modes() {
    let backend = MemoryBackend::new();
    backend.set_env("REGKEY_TEST_HOME", "C:\\Users\\ata");
    let key = create(&backend, "App");
    key.set_expand_string("Path", "%REGKEY_TEST_HOME%\\bin;%REGKEY_UNDEFINED_VAR%")
        .unwrap();

    assert_eq!(
        key.get_expand_string("Path", ExpandMode::DontExpand).unwrap(),
        "%REGKEY_TEST_HOME%\\bin;%REGKEY_UNDEFINED_VAR%"
    );
    assert_eq!(
        key.get_expand_string("Path", ExpandMode::Expand).unwrap(),
        "C:\\Users\\ata\\bin;%REGKEY_UNDEFINED_VAR%"
    );
    assert_eq!(key.query_value_type("Path").unwrap(), ValueKind::ExpandString);
}

#[test]
fn test_string_getters_are_kind_strict() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_expand_string("Expand", "x").unwrap();
    key.set_dword("Number", 1).unwrap();

    let err = key.get_string("Expand").unwrap_err();
    assert!(matches!(err, RegistryError::TypeMismatch { found: ValueKind::ExpandString, .. }));
    assert_eq!(err.code(), 1630);
    assert!(key.get_multi_string("Number").is_err());
    assert!(key.get_expand_string("Number", ExpandMode::Expand).is_err());
}

#[test]
fn test_get_value_dispatches_on_kind() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_value("d", &RegValue::Dword(9)).unwrap();
    key.set_value("s", &RegValue::from("text")).unwrap();
    key.set_value("e", &RegValue::ExpandString("%X%".into())).unwrap();
    key.set_value("m", &RegValue::from(vec!["a".to_string()])).unwrap();

    assert_eq!(key.get_value("d").unwrap(), RegValue::Dword(9));
    assert_eq!(key.get_value("s").unwrap(), RegValue::String("text".into()));
    assert_eq!(key.get_value("e").unwrap(), RegValue::ExpandString("%X%".into()));
    assert_eq!(key.get_value("m").unwrap(), RegValue::MultiString(vec!["a".into()]));
    assert!(key.get_value("missing").unwrap_err().is_not_found());
}

#[test]
fn test_delete_value_is_idempotent() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_string("keep", "1").unwrap();
    key.set_string("drop", "2").unwrap();

    key.delete_value("drop").unwrap();
    key.delete_value("drop").unwrap();
    key.delete_value("never-existed").unwrap();

    assert!(key.get_string("drop").unwrap_err().is_not_found());
    assert_eq!(key.get_string("keep").unwrap(), "1");
}

#[test]
fn test_default_value_uses_empty_name() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_string("", "default").unwrap();
    assert_eq!(key.get_string("").unwrap(), "default");
}

#[test]
fn test_invalid_arguments_are_local() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");

    let err = key.set_string("Name", "a\0b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = key.set_multi_string("List", &["a", ""]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = key.get_dword("bad\0name").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = RegKey::open_with(backend.clone(), RootKey::CurrentUser, "a\0b", KeyOptions::read())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_read_only_key_cannot_write() {
    let backend = MemoryBackend::new();
    create(&backend, "App");
    let key = RegKey::open_with(backend, RootKey::CurrentUser, "App", KeyOptions::read()).unwrap();

    let err = key.set_dword("Version", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostFailure);
    assert_eq!(err.code(), 5);
    assert!(err.to_string().contains("HKEY_CURRENT_USER\\App"));
}

#[test]
fn test_delete_key_with_children_is_refused() {
    let backend = MemoryBackend::new();
    create(&backend, "App/Settings/Deep");
    let (app, _) = RegKey::create_with(
        backend.clone(),
        RootKey::CurrentUser,
        "App",
        KeyOptions::write().with_access(Access::DELETE),
    )
    .unwrap();

    let err = app.delete_key("Settings", Access(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostFailure);
    assert!(app.delete_key("Missing", Access(0)).unwrap_err().is_not_found());

    app.delete_tree("Settings").unwrap();
    assert!(app.enum_sub_keys().unwrap().is_empty());
}

#[test]
fn test_handle_to_deleted_key_fails() {
    let backend = MemoryBackend::new();
    let settings = create(&backend, "App/Settings");
    let app = create(&backend, "App");
    app.delete_key("Settings", Access(0)).unwrap();

    let err = settings.set_dword("x", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostFailure);
    assert_eq!(err.code(), 1018);
}

#[test]
fn test_volatile_keys() {
    let backend = MemoryBackend::new();
    let (volatile, _) = RegKey::create_with(
        backend.clone(),
        RootKey::CurrentUser,
        "Session",
        KeyOptions::write().volatile(),
    )
    .unwrap();

    let err = volatile.create_sub_key("Stable", KeyOptions::write()).unwrap_err();
    assert_eq!(err.code(), 1021);
    let (child, created) = volatile
        .create_sub_key("Temp", KeyOptions::write().volatile())
        .unwrap();
    assert!(created);
    assert!(child.is_valid());
}

#[test]
fn test_empty_multi_string_entry_writes_nothing() {
    let backend = MemoryBackend::new();
    let key = create(&backend, "App");
    key.set_multi_string("List", &["keep"]).unwrap();

    let err = key.set_multi_string("List", &["a", "", "b"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.code(), 0);
    assert_eq!(key.get_multi_string("List").unwrap(), vec!["keep"]);
}

#[test]
fn test_default_options_open_read_only() {
    let backend = MemoryBackend::new();
    assert_eq!(KeyOptions::default(), KeyOptions::read());
    create(&backend, "App");

    let key = RegKey::open_with(backend.clone(), RootKey::CurrentUser, "App", KeyOptions::default())
        .unwrap();
    let err = key.set_dword("n", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostFailure);
    assert_eq!(err.code(), 5);
}
