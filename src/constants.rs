//! Global constants used throughout the chart-vendor codebase.
//!
//! File names and path conventions of the vendored layout live here so that the
//! fetch engine, the lock generator and the tests agree on them.

/// Default vendoring configuration file.
pub const DEFAULT_CONFIG_FILE: &str = ".charts.yml";

/// Default root directory the charts are vendored into.
pub const DEFAULT_CHARTS_ROOT: &str = "charts";

/// Requirements file written when a chart declares dependencies.
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";

/// Lock file written for every chart and every dependency.
pub const REQUIREMENTS_LOCK_FILE: &str = "requirements.lock";

/// Subdirectory of a chart holding its dependencies.
pub const DEPENDENCIES_DIR: &str = "charts";

/// Subdirectory of the charts root holding local patch files per chart.
pub const LOCAL_PATCHES_DIR: &str = "patches";

/// File pattern of local patch files.
pub const LOCAL_PATCH_GLOB: &str = "*.patch";

/// Chart manifest that patches may never modify.
pub const PROTECTED_MANIFEST: &str = "Chart.yaml";

/// Directory of value overrides that patches may never modify.
pub const PROTECTED_OVERRIDES_DIR: &str = "values_overrides";

/// Executable used for the include and exclude filter stages.
pub const FILTERDIFF_BINARY: &str = "filterdiff";

/// Executable used for the apply stage.
pub const PATCH_BINARY: &str = "patch";

/// Repository index file name.
pub const REPOSITORY_INDEX_FILE: &str = "index.yaml";
