#![no_main]
use imgdescr::{xml::from_str, Description};
use libfuzzer_sys::fuzz_target;

const BASE: &str = r#"<image schemaversion="7.4" name="fuzz">
    <preferences><version>1.0.0</version><type image="oem" filesystem="xfs"/></preferences>
    <users><user name="root" home="/root"/></users>
    <repository type="rpm-md" alias="main"><source path="obs://main"/></repository>
    <packages type="image"><package name="vim"/><package name="mc"/></packages>
    <packages type="bootstrap"><package name="glibc"/></packages>
</image>"#;

fuzz_target!(|data: &[u8]| {
    if let Ok(derived) = std::str::from_utf8(data) {
        if let Ok(descr) = Description::new(derived, Some(BASE)) {
            // Each merge step feeds the next one
            let out = descr.to_xml_string();
            assert!(from_str(&out).is_ok(), "unparseable output:\n{out}");
        }
    }
});
