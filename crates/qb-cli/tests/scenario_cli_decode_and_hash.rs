use assert_cmd::prelude::*;
use predicates::prelude::*;

fn repo_root() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

#[test]
fn decode_prints_reload_summary() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("qb-cli")?;
    cmd.args(["decode", &qb_testkit::reload_payload(&[4, 5])]);

    cmd.assert().success().stdout(predicate::str::contains(
        "event=reload questions=2 indices=[4, 5] remaining_ms=60000",
    ));
    Ok(())
}

#[test]
fn decode_reads_stdin_when_payload_omitted() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("qb-cli")?;
    cmd.arg("decode")
        .write_stdin(format!("{}\n", qb_testkit::answer_payload(7, true)));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("event=answer index=7 is_correct=true"));
    Ok(())
}

#[test]
fn malformed_payload_decodes_to_null_without_failing() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("qb-cli")?;
    cmd.args(["decode", r#"{"Ranking":{"users":[]}}"#]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("event=null"))
        .stderr(predicate::str::contains("reason=unrecognised payload"));
    Ok(())
}

#[test]
fn config_hash_prints_hash_and_canonical_json() -> anyhow::Result<()> {
    let root = repo_root().canonicalize()?;
    let base = root.join("config/board.yaml");

    let loaded = qb_config::load_layered_yaml(&[base.to_string_lossy().as_ref()])?;

    let mut cmd = assert_cmd::Command::cargo_bin("qb-cli")?;
    cmd.arg("config-hash").arg(&base);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "config_hash={}",
            loaded.config_hash
        )))
        .stdout(predicate::str::contains(loaded.canonical_json));
    Ok(())
}

#[test]
fn config_hash_requires_paths() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("qb-cli")?;
    cmd.arg("config-hash");
    cmd.assert().failure();
    Ok(())
}
