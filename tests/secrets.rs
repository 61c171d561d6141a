//! Property tests for `KEY` / `KEY_FILE` indirection.

use backup_config_resolver::sources::secret;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,12}[A-Z0-9]"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "\\PC{0,40}"
}

proptest! {
    #[test]
    fn inline_value_is_returned(key in key_strategy(), value in value_strategy()) {
        let lookup = HashMap::from([(key.clone(), value.clone())]);
        prop_assert_eq!(secret::resolve(&lookup, &key), Some(value));
    }

    #[test]
    fn file_contents_are_returned_verbatim(key in key_strategy(), value in value_strategy()) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret");
        fs::write(&path, &value).unwrap();

        let lookup = HashMap::from([(
            format!("{key}_FILE"),
            path.to_string_lossy().into_owned(),
        )]);
        prop_assert_eq!(secret::resolve(&lookup, &key), Some(value));
    }

    #[test]
    fn both_set_is_absent(key in key_strategy(), value in value_strategy()) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret");
        fs::write(&path, "from file").unwrap();

        let lookup = HashMap::from([
            (key.clone(), value),
            (format!("{key}_FILE"), path.to_string_lossy().into_owned()),
        ]);
        prop_assert_eq!(secret::resolve(&lookup, &key), None);
    }
}

#[test]
fn unreadable_file_is_absent() {
    let temp_dir = TempDir::new().unwrap();
    let lookup = HashMap::from([(
        "SSH_PASSWORD_FILE".to_string(),
        temp_dir.path().join("missing").to_string_lossy().into_owned(),
    )]);
    assert_eq!(secret::resolve(&lookup, "SSH_PASSWORD"), None);
}
