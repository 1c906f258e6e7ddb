//! Property tests for module naming.

use std::path::Path;

use proptest::prelude::*;

use dtswatch::models::Module;

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_\\-]{1,10}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: names derived from any relative path are stable and well-formed.
    #[test]
    fn property_module_names_are_identifiers(
        dirs in proptest::collection::vec(segment(), 0..=3),
        stem in segment(),
    ) {
        let root = Path::new("/project/types");
        let mut relative = dirs.clone();
        relative.push(format!("{stem}.d.ts"));
        let relative = relative.join("/");

        let module = Module::new(&root.join(&relative), root).unwrap();

        prop_assert_eq!(&module.relative_path, &relative);
        let expected_path = format!("/{}.js", relative.strip_suffix(".d.ts").unwrap());
        prop_assert_eq!(&module.module_path, &expected_path);
        prop_assert!(module
            .module_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert!(!module.module_name.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert!(module.module_name.matches('_').count() >= dirs.len());
    }
}
