use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const BASE: &str = r#"<image schemaversion="7.4" name="base">
    <users>
        <user name="root" home="/root"/>
    </users>
    <packages type="image">
        <package name="vim"/>
        <package name="kernel-default"/>
    </packages>
</image>"#;

const DERIVED: &str = r#"<image schemaversion="7.4" name="derived">
    <inherit path="base.xml"/>
    <add>
        <packages type="image">
            <package name="humperdoo"/>
        </packages>
    </add>
    <remove>
        <package name="vim"/>
    </remove>
</image>"#;

fn appliance(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(dir.join("base.xml"), BASE)?;
    fs::write(dir.join("config.xml"), DERIVED)?;
    Ok(())
}

#[test]
fn test_resolve_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("resolve").arg(temp.path().join("config.xml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml version=\"1.0\" ?>\n<image"))
        .stdout(predicate::str::contains("<package name=\"humperdoo\"/>"))
        .stdout(predicate::str::contains("\"vim\"").not());
    Ok(())
}

#[test]
fn test_resolve_directory_to_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;
    let output = temp.path().join("resolved.xml");

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("resolve").arg(temp.path()).arg("-o").arg(&output);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output)?;
    assert!(written.contains("humperdoo"));
    assert!(written.ends_with("</image>\n"));
    Ok(())
}

#[test]
fn test_chain_lists_root_first() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("chain").arg(temp.path().join("config.xml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"base\.xml\n.*config\.xml\n$")?);
    Ok(())
}

#[test]
fn test_chain_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("chain").arg("--json").arg(temp.path().join("base.xml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"paths\""))
        .stdout(predicate::str::contains("\"trivial\": true"));
    Ok(())
}

#[test]
fn test_substitute_with_exec() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;
    let config = temp.path().join("config.xml");
    let copy = temp.path().join("seen.xml");

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("substitute")
        .arg(&config)
        .arg("--exec")
        .arg("cp")
        .arg(&config)
        .arg(&copy);
    cmd.assert().success();

    let seen = fs::read_to_string(&copy)?;
    assert!(seen.contains("humperdoo"));
    assert!(!seen.contains("<inherit"));
    assert_eq!(fs::read_to_string(&config)?, DERIVED);
    assert!(!temp.path().join("config.xml.orig").exists());
    Ok(())
}

#[test]
fn test_substitute_waits_for_enter() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("substitute").arg(temp.path()).write_stdin("\n");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("press Enter"));
    assert_eq!(fs::read_to_string(temp.path().join("config.xml"))?, DERIVED);
    Ok(())
}

#[test]
fn test_missing_ancestor_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("config.xml"), DERIVED)?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("resolve").arg(temp.path().join("config.xml"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unable to find inherited description"));
    Ok(())
}

#[test]
fn test_malformed_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let broken = temp.path().join("broken.xml");
    fs::write(&broken, "<image><packages></image>")?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.arg("resolve").arg(&broken);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("mismatched closing tag"));
    Ok(())
}

#[test]
fn test_cwd_anchor() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    appliance(temp.path())?;

    let mut cmd = Command::cargo_bin("imgdescr")?;
    cmd.current_dir(temp.path())
        .args(["--relative-to", "cwd", "resolve", "config.xml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("humperdoo"));
    Ok(())
}
