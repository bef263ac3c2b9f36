use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INIT_RC: &str = r#"import /init.environ.rc
import /init.usb.rc

on early-init
    write /proc/1/oom_score_adj -1000
    mkdir /dev/foo 0755 root root

on boot
    chmod 0660 /dev/bar

service foo /system/bin/foo -o a b c
    class core
    user system
    group system root media 59876
    priority -20
    socket foo stream 0666 system 59876 u:object_r:seclabel:s0
    disabled

service bar /system/bin/bar
    user media
    priority 5
    socket bar stream 0660 system
    oneshot
"#;

pub const WORLD_SOCKETS_XML: &str = r#"<?xml version="1.0"?>
<suite>
  <test name="No world sockets" section="service">
    <search>
      <keyword socket="0[0-9]{2}[2-7]"/>
    </search>
  </test>
</suite>
"#;

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub init_rc: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let init_rc = write_fixture(&root, "init.rc", INIT_RC);
        Self {
            _tmp: tmp,
            root,
            init_rc,
        }
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        write_fixture(&self.root, name, contents)
    }

    pub fn rc(&self) -> &str {
        self.init_rc.to_str().expect("init.rc path utf8")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("isearch");
        cmd.env_remove("ISEARCH_LOG").env_remove("RUST_LOG");
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}
