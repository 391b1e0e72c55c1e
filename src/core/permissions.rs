use std::path::Path;

use crate::command;
use crate::error::Result;

/// Open up group access on a cloned tree so the deploy service user can
/// pull into it.
///
/// `mode` is a symbolic chmod mode, `g+rwX` by default: read/write on files,
/// traverse on directories (and on files that are already executable).
pub fn relax_group_permissions(path: &Path, mode: &str) -> Result<()> {
    let target = path.to_string_lossy().to_string();
    command::run("chmod", &["-R", mode, &target]).map(|_| ())
}
