// tests/dispatch.rs

//! End-to-end dispatch through the public API, with a fake installer that creates
//! environments holding a single `tool-1` program.

#![cfg(unix)]

use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;
use toolpin::cli::dispatcher::{self, DispatchError};
use toolpin::core::config::{Config, ConfigError};
use toolpin::core::hash::fingerprint;
use toolpin::core::lock;
use toolpin::models::RequirementSet;
use toolpin::state::{AppState, Options};
use toolpin::system::env::EnvError;
use toolpin::system::executor::ExecutionError;
use toolpin::system::installer::{FreezeRequest, InstallRequest, PackageInstaller};

/// `tool-1` appends its arguments to `$OUT` and exits 3 when asked to `fail`.
const TOOL_SCRIPT: &str = "#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"$OUT\"\n[ \"$1\" = fail ] && exit 3\nexit 0\n";

#[derive(Debug, Default, Clone)]
struct FakeInstaller {
    calls: Rc<RefCell<Vec<String>>>,
    /// Exit code returned by `install`, if it should fail.
    install_failure: Option<i32>,
}

impl PackageInstaller for FakeInstaller {
    fn create_env(
        &self,
        path: &Path,
        prompt: &str,
        _python_version: &str,
        _quiet: bool,
    ) -> Result<(), ExecutionError> {
        fs::create_dir_all(path.join("bin")).unwrap();
        self.calls.borrow_mut().push(format!("venv {}", prompt));
        Ok(())
    }

    fn install(&self, python: &Path, request: &InstallRequest<'_>) -> Result<(), ExecutionError> {
        if let Some(code) = self.install_failure {
            return Err(ExecutionError::NonZeroExitStatus {
                command: "uv pip install".to_string(),
                code,
            });
        }
        let tool = python.parent().unwrap().join("tool-1");
        fs::write(&tool, TOOL_SCRIPT).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        self.calls
            .borrow_mut()
            .push(format!("install {}", request.requirements.join(",")));
        Ok(())
    }

    fn freeze(&self, request: &FreezeRequest<'_>) -> Result<String, ExecutionError> {
        self.calls.borrow_mut().push("freeze".to_string());
        Ok(request
            .requirements
            .iter()
            .map(|r| format!("{}==1.0\n", r))
            .collect())
    }

    fn check_installable(
        &self,
        _python: &Path,
        specs: &[String],
        _quiet: bool,
    ) -> Result<(), ExecutionError> {
        self.calls
            .borrow_mut()
            .push(format!("check {}", specs.join(",")));
        Ok(())
    }
}

struct Project {
    dir: TempDir,
    installer: FakeInstaller,
}

impl Project {
    fn new(tool_section: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let manifest = format!(
            "[tool.toolpin]\nenv = {{ OUT = \"{}\" }}\n{}",
            out.display(),
            tool_section
        );
        fs::write(dir.path().join("pyproject.toml"), manifest).unwrap();
        Self {
            dir,
            installer: FakeInstaller::default(),
        }
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("pyproject.toml")
    }

    fn options(&self, cmd: Option<&str>, args: &[&str]) -> Options {
        Options {
            manifest_path: self.manifest(),
            install_dir: self.dir.path().join(".toolpin"),
            quiet: true,
            wrapper_args: vec!["tp".to_string()],
            cmd: cmd.map(str::to_string),
            cmd_args: args.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    fn state(&self, options: Options) -> AppState {
        let config = Config::load(&self.manifest()).unwrap();
        AppState::new(options, config, Box::new(self.installer.clone())).with_python_version("3.12")
    }

    fn run(&self, cmd: &str, args: &[&str]) -> anyhow::Result<()> {
        dispatcher::dispatch(&self.state(self.options(Some(cmd), args)))
    }

    fn output(&self) -> String {
        fs::read_to_string(self.dir.path().join("out.txt")).unwrap_or_default()
    }

    fn calls(&self) -> Vec<String> {
        self.installer.calls.borrow().clone()
    }

    fn venvs(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.dir.path().join(".toolpin").join("venvs")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

const TOOL_1: &str = r#"
tool-1 = ["req2", "req1"]
[tool.toolpin.aliases]
alias-1 = "tool-1 arg"
alias-fail = "tool-1 fail"
alias-steps = ["tool-1 fail", "tool-1 after"]
pycowsay-hi = "echo hi"
pycowsay-hello = "echo hello"
"#;

#[test]
fn test_alias_runs_in_its_context() {
    let project = Project::new(TOOL_1);
    project.run("alias-1", &["extra value"]).unwrap();

    assert_eq!(project.output(), "arg extra value\n");
    let set = RequirementSet::new(vec!["req1".into(), "req2".into()], None, None);
    assert_eq!(project.venvs(), vec![format!("tool-1-{}-py3.12", fingerprint(&set))]);
    assert_eq!(project.calls(), vec!["venv px-tool-1", "install req1,req2"]);
    assert!(project.dir.path().join(".toolpin").join("tool-1").exists());
}

#[test]
fn test_installed_context_is_reused() {
    let project = Project::new(TOOL_1);
    project.run("alias-1", &[]).unwrap();
    project.run("tool-1", &["direct"]).unwrap();

    assert_eq!(project.output(), "arg\ndirect\n");
    assert_eq!(project.calls().len(), 2);
}

#[test]
fn test_force_install_reinstalls() {
    let project = Project::new(TOOL_1);
    project.run("alias-1", &[]).unwrap();
    let mut options = project.options(Some("alias-1"), &[]);
    options.force_install = true;
    dispatcher::dispatch(&project.state(options)).unwrap();
    assert_eq!(project.calls().len(), 4);
}

#[test]
fn test_child_exit_code_is_preserved() {
    let project = Project::new(TOOL_1);
    let err = project.run("alias-fail", &[]).unwrap_err();
    let code = err
        .chain()
        .find_map(|c| c.downcast_ref::<ExecutionError>())
        .and_then(ExecutionError::exit_code);
    assert_eq!(code, Some(3));
}

#[test]
fn test_ambiguous_abbreviation_fails() {
    let project = Project::new(TOOL_1);
    let err = project.run("pycow", &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DispatchError>(),
        Some(DispatchError::Ambiguous { candidates, .. }) if candidates.len() == 2
    ));
    assert!(project.calls().is_empty());
}

#[test]
fn test_unknown_command_without_main_fails() {
    let project = Project::new(TOOL_1);
    let err = project.run("does-not-exist", &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DispatchError>(),
        Some(DispatchError::Unknown(cmd)) if cmd == "does-not-exist"
    ));
}

#[test]
fn test_missing_program_in_main_falls_through_to_unknown() {
    let project = Project::new("main = [\"uv\"]\n");
    let err = project.run("toolpin-missing-program", &[]).unwrap_err();
    assert!(matches!(err.downcast_ref::<DispatchError>(), Some(DispatchError::Unknown(_))));
}

#[test]
fn test_missing_command_fails() {
    let project = Project::new(TOOL_1);
    let err = dispatcher::dispatch(&project.state(project.options(None, &[]))).unwrap_err();
    assert!(matches!(err.downcast_ref::<DispatchError>(), Some(DispatchError::MissingCommand)));
}

#[test]
fn test_post_install_runs_once_after_install() {
    let project = Project::new(
        "tool-1 = { requirements = [\"req\"], post-install = \"tool-1 post-install\" }\n",
    );
    project.run("tool-1", &["first"]).unwrap();
    project.run("tool-1", &["second"]).unwrap();
    assert_eq!(project.output(), "post-install\nfirst\nsecond\n");
}

#[test]
fn test_install_context() {
    let project = Project::new(TOOL_1);
    let mut options = project.options(None, &[]);
    options.install_context = Some("tool-1".to_string());
    dispatcher::dispatch(&project.state(options)).unwrap();
    assert_eq!(project.venvs().len(), 1);

    let mut options = project.options(None, &[]);
    options.install_context = Some("nope".to_string());
    let err = dispatcher::dispatch(&project.state(options)).unwrap_err();
    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::UnknownContext(_))));
}

#[test]
fn test_lock_pins_and_installs_every_lockable_context() {
    let project = Project::new("tool-1 = [\"req\"]\neditable = [\"-e .\"]\n");
    let mut options = project.options(None, &[]);
    options.lock = true;
    dispatcher::dispatch(&project.state(options)).unwrap();

    let lock_file = lock::read_lock_file(&project.dir.path().join("tp.lock")).unwrap();
    assert_eq!(lock_file.keys().collect::<Vec<_>>(), vec!["tool-1"]);
    assert_eq!(lock_file["tool-1"].requirements, vec!["req==1.0"]);

    let pinned = RequirementSet::new(vec!["req==1.0".into()], None, None);
    assert_eq!(project.venvs(), vec![format!("tool-1-{}-py3.12", fingerprint(&pinned))]);

    // A locked, installed context is neither re-resolved nor reinstalled.
    let calls = project.calls().len();
    project.run("tool-1", &["x"]).unwrap();
    assert_eq!(project.calls().len(), calls);
}

#[test]
fn test_clean_removes_stale_environments() {
    let project = Project::new(TOOL_1);
    project.run("alias-1", &[]).unwrap();
    let stale = project.dir.path().join(".toolpin").join("venvs").join("tool-1-stale-py3.12");
    fs::create_dir_all(&stale).unwrap();

    let mut options = project.options(None, &[]);
    options.clean = true;
    dispatcher::dispatch(&project.state(options)).unwrap();

    assert!(!stale.exists());
    assert_eq!(project.venvs().len(), 1);
}

#[test]
fn test_add_requirement_updates_manifest() {
    let project = Project::new(TOOL_1);
    let mut options = project.options(None, &[]);
    options.add = Some("tool-1:req3".to_string());
    dispatcher::dispatch(&project.state(options)).unwrap();

    let config = Config::load(&project.manifest()).unwrap();
    assert_eq!(config.get_requirements("tool-1").requirements, vec!["req1", "req2", "req3"]);
    assert_eq!(project.calls().last().map(String::as_str), Some("check req3"));

    let mut options = project.options(None, &[]);
    options.add = Some("tool-1:req1>=2".to_string());
    assert!(dispatcher::dispatch(&project.state(options)).is_err());
}

#[test]
fn test_multi_command_alias_stops_at_first_failure() {
    let project = Project::new(TOOL_1);
    let err = project.run("alias-steps", &[]).unwrap_err();
    assert_eq!(project.output(), "fail\n");
    let code = err
        .chain()
        .find_map(|c| c.downcast_ref::<ExecutionError>())
        .and_then(ExecutionError::exit_code);
    assert_eq!(code, Some(3));
}

#[test]
fn test_failed_installation_carries_installer_exit_code() {
    let mut project = Project::new(TOOL_1);
    project.installer.install_failure = Some(5);
    let err = project.run("alias-1", &[]).unwrap_err();

    let installation = err.chain().find_map(|c| c.downcast_ref::<EnvError>());
    assert!(matches!(
        installation,
        Some(EnvError::Installation { name, code: 5, .. }) if name == "tool-1"
    ));
    assert_eq!(project.output(), "");
}
