mod common;

use common::{TestEnv, WORLD_SOCKETS_XML};
use predicates::prelude::*;
use predicates::str::contains;

const EXCEPTED_XML: &str = r#"<?xml version="1.0"?>
<suite>
  <test name="No world sockets" section="service">
    <search>
      <keyword socket="0[0-9]{2}[2-7]"/>
    </search>
    <except>
      <keyword args="foo /system/bin/foo -o a b c"/>
      <keyword socket="foo stream 0666 system 59876 u:object_r:seclabel:s0"/>
    </except>
  </test>
  <test name="No oom writes outside early-init" section="on">
    <search lazy="true">
      <keyword command="write /proc/[0-9]+/oom_score_adj .*"/>
    </search>
    <except>
      <keyword args="early-init"/>
      <keyword command="oom_score_adj"/>
    </except>
  </test>
</suite>
"#;

#[test]
fn verify_fails_with_unexcused_violation() {
    let env = TestEnv::new();
    let rules = env.write("rules.xml", WORLD_SOCKETS_XML);
    env.cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("Failed test(No world sockets):"))
        .stderr(contains("11:\tservice foo /system/bin/foo -o a b c"))
        .stderr(contains(
            "\t\tsocket(16) : foo stream 0666 system 59876 u:object_r:seclabel:s0",
        ));
}

#[test]
fn verify_passes_when_exceptions_cover_everything() {
    let env = TestEnv::new();
    let rules = env.write("rules.xml", EXCEPTED_XML);
    env.cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap()])
        .assert()
        .success()
        .stderr(contains("Failed test").not());
}

#[test]
fn exit_code_counts_failed_tests_across_suites() {
    let env = TestEnv::new();
    let first = env.write("a.xml", WORLD_SOCKETS_XML);
    let second = env.write(
        "b.json",
        r#"{"tests": [
            {"name": "no oneshot", "section": "service", "searches": [{"keywords": {"oneshot": "true"}}]},
            {"name": "no shell", "section": "service", "searches": [{"keywords": {"user": "shell"}}]}
        ]}"#,
    );
    env.cmd()
        .args([
            "verify",
            env.rc(),
            "--assert",
            first.to_str().unwrap(),
            "--assert",
            second.to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(contains("Failed test(no oneshot):"))
        .stderr(contains("Failed test(no shell)").not());
}

#[test]
fn bad_pattern_in_rule_fails_only_that_test() {
    let env = TestEnv::new();
    let rules = env.write(
        "rules.xml",
        r#"<suite>
  <test name="bad" section="service"><search><keyword priority="~3"/></search></test>
  <test name="fine" section="service"><search><keyword user="nobody"/></search></test>
</suite>"#,
    );
    env.cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(contains("Failed test(bad):"))
        .stderr(contains("unknown operator"))
        .stderr(contains("Failed test(fine)").not());
}

#[test]
fn gen_prints_exception_skeletons() {
    let env = TestEnv::new();
    let rules = env.write("rules.xml", WORLD_SOCKETS_XML);
    let out = env
        .cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap(), "--gen"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<!-- Failed test(No world sockets) -->"));
    assert!(text.contains("<keyword args=\"foo /system/bin/foo -o a b c\" />"));
    assert!(text.contains(
        "<keyword socket=\"foo stream 0666 system 59876 u:object_r:seclabel:s0\" />"
    ));
}

#[test]
fn generated_exceptions_make_the_suite_pass() {
    let env = TestEnv::new();
    let rules = env.write("rules.xml", WORLD_SOCKETS_XML);
    let out = env
        .cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap(), "--gen"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let skeleton = String::from_utf8(out).unwrap();
    let patched = WORLD_SOCKETS_XML.replace("    </search>\n", &format!("    </search>\n{skeleton}"));
    let patched_rules = env.write("patched.xml", &patched);
    env.cmd()
        .args(["verify", env.rc(), "--assert", patched_rules.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn malformed_rule_file_aborts() {
    let env = TestEnv::new();
    let rules = env.write("rules.xml", "<suite><test section=\"daemon\"/></suite>");
    env.cmd()
        .args(["verify", env.rc(), "--assert", rules.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("invalid rule file"));
}
