//! System-wide constants and default paths.

/// Default data directory: the operator's working directory.
pub const DEFAULT_DATA_DIR: &str = ".";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "MINIBOX_DATA_DIR";

/// File name of the state index inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Suffix appended to the state file path to form its lock file.
pub const STATE_LOCK_SUFFIX: &str = ".lock";

/// Directory holding one subdirectory per container.
pub const CONTAINERS_DIR_NAME: &str = "containers";

/// Container filesystem root, relative to the container directory.
pub const ROOTFS_DIR_NAME: &str = "rootfs";

/// Resource limit descriptor, relative to the container directory.
pub const LIMITS_FILE_NAME: &str = "limits.json";

/// Generated entry-point script, relative to the container directory.
pub const ENTRYPOINT_FILE_NAME: &str = "run.sh";

/// Combined stdout/stderr of the entry point.
pub const LOG_FILE_NAME: &str = "container.log";

/// Prefix of in-progress container directories.
pub const STAGING_PREFIX: &str = ".staging-";

/// Permission bits of the generated entry-point script.
pub const ENTRYPOINT_MODE: u32 = 0o755;

/// How long the placeholder workload idles after greeting.
pub const ENTRYPOINT_IDLE_SECS: u64 = 3600;

/// Default CPU ceiling, in percent of one core.
pub const DEFAULT_CPU_PERCENT: u32 = 50;

/// Default memory ceiling in MiB.
pub const DEFAULT_MEMORY_MB: u64 = 256;

/// Default disk quota in MiB.
pub const DEFAULT_DISK_MB: u64 = 500;

/// Bytes per MiB, used for every MB-denominated limit.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Longest accepted container name.
pub const MAX_NAME_LEN: usize = 64;
