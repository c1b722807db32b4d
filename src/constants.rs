// src/constants.rs

/// The manifest read when `--toml` is not given (resolved against the current directory).
pub const DEFAULT_MANIFEST_FILENAME: &str = "pyproject.toml";

/// The `[tool.<section>]` table holding the configuration.
pub const TOOL_SECTION: &str = "toolpin";

/// The lock cache, stored next to the manifest.
pub const LOCK_FILENAME: &str = "tp.lock";

/// The install directory used when neither `--install-dir` nor the env var is set.
pub const DEFAULT_INSTALL_DIRNAME: &str = ".toolpin";

/// Sub-directory of the install directory holding one environment per context.
pub const VENVS_DIRNAME: &str = "venvs";

/// Default directory (relative to the manifest) scanned for `*.py` scripts.
pub const DEFAULT_SCRIPTS_DIR: &str = "bin";

/// The default tool context.
pub const MAIN_CONTEXT: &str = "main";

/// Tools provided in the `main` context when the manifest declares no context at all.
pub const DEFAULT_TOOLS: &[&str] = &["uv"];

/// Placeholder replaced by the manifest directory in `cwd` and `dir` values.
pub const PROJECT_DIR_TOKEN: &str = "@PROJECT_DIR";

/// Marker that re-invokes the wrapper itself inside alias commands.
pub const SELF_REFERENCE: &str = "tp@";

/// Prompt prefix of the environments created by the installer.
pub const ENV_PROMPT_PREFIX: &str = "px-";

// --- Environment variables ---

pub const INSTALL_DIR_ENV_VAR: &str = "TOOLPIN_INSTALL_DIR";
pub const UV_ENV_VAR: &str = "TOOLPIN_UV";
pub const PYTHON_VERSION_ENV_VAR: &str = "TOOLPIN_PYTHON";
