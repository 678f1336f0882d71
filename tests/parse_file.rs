use hacceptance::prelude::*;

fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(name)
}

#[test]
fn parses_auth_login_fixture() -> Result<()> {
    let script = parse_file(fixture("auth-login.txtar"))?;

    let expected = Script::new(vec![
        Step::invocation("gh", ["auth", "login"]),
        Step::expectation(
            "? Where do you use GitHub?  [Use arrows to move, type to filter]\n\
             > GitHub.com\n  Other\n",
        ),
        Step::select("Other"),
        Step::expectation("? Where do you use GitHub? Other\n? Hostname:\n"),
        Step::say("my.ghes.com"),
        Step::expectation(
            "? Where do you use GitHub? Other\n\
             ? Hostname: my.ghes.com\n\
             ? What is your preferred protocol for Git operations on this host?  [Use arrows to move, type to filter]\n\
             > HTTPS\n  SSH\n",
        ),
        Step::select("HTTPS"),
        Step::expectation(
            "? Where do you use GitHub? Other\n\
             ? Hostname: my.ghes.com\n\
             ? What is your preferred protocol for Git operations on this host? HTTPS\n\
             ? Authenticate Git with your GitHub credentials? (Y/n)\n",
        ),
    ]);

    assert_eq!(script, expected);
    Ok(())
}

#[test]
fn actions_are_classified() -> Result<()> {
    let script = parse_file(fixture("auth-login.txtar"))?;
    let actions: Vec<&str> = script
        .steps()
        .iter()
        .filter(|step| step.is_action())
        .map(Step::kind)
        .collect();
    assert_eq!(actions, vec!["select", "say", "select"]);
    Ok(())
}

#[test]
fn missing_script_file_is_a_setup_error() {
    let err = parse_file(fixture("does-not-exist.txtar")).unwrap_err();
    assert!(matches!(err, HarnessError::Setup(_)), "got {err:?}");
}
