//! Property tests for manifest permission editing

use proptest::prelude::*;
use xwalk_migrate::{ensure_permissions, ManifestDocument, REQUIRED_PERMISSIONS};

const CHILDREN: [&str; 6] = [
    r#"<uses-permission android:name="android.permission.INTERNET" />"#,
    r#"<uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />"#,
    r#"<uses-permission android:name="android.permission.ACCESS_WIFI_STATE"/>"#,
    r#"<application android:label="@string/app_name"><activity android:name="Main" /></application>"#,
    "<!-- generated -->",
    r#"<uses-sdk android:minSdkVersion="14" />"#,
];

fn manifest(children: &[usize]) -> String {
    let mut xml = String::from(
        "<?xml version='1.0' encoding='utf-8'?>\n\
         <manifest package=\"com.example\" xmlns:android=\"http://schemas.android.com/apk/res/android\">",
    );
    for index in children {
        xml.push_str("\n    ");
        xml.push_str(CHILDREN[*index]);
    }
    xml.push_str("\n</manifest>\n");
    xml
}

fn count(document: &ManifestDocument, name: &str) -> usize {
    document
        .permissions()
        .iter()
        .filter(|decl| decl.name == name)
        .count()
}

proptest! {
    #[test]
    fn ensure_declares_each_required_permission_once(
        children in prop::collection::vec(0..CHILDREN.len(), 0..10)
    ) {
        let mut document = ManifestDocument::parse(&manifest(&children)).unwrap();
        ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        for name in REQUIRED_PERMISSIONS {
            prop_assert_eq!(count(&document, name), 1);
        }
        let internet = children.iter().filter(|i| **i == 0).count();
        prop_assert_eq!(count(&document, "android.permission.INTERNET"), internet);
    }

    #[test]
    fn ensure_is_idempotent(children in prop::collection::vec(0..CHILDREN.len(), 0..10)) {
        let mut document = ManifestDocument::parse(&manifest(&children)).unwrap();
        ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        let once = document.to_xml().unwrap();

        let mut reparsed = ManifestDocument::parse(&once).unwrap();
        let edit = ensure_permissions(&mut reparsed, &REQUIRED_PERMISSIONS).unwrap();

        prop_assert!(!edit.changed());
        prop_assert_eq!(reparsed.to_xml().unwrap(), once);
    }

    #[test]
    fn unrelated_permissions_get_both_in_order(
        children in prop::collection::vec(prop_oneof![Just(0usize), Just(3), Just(4), Just(5)], 0..8)
    ) {
        let mut document = ManifestDocument::parse(&manifest(&children)).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        prop_assert_eq!(edit.added, REQUIRED_PERMISSIONS.to_vec());
    }
}
