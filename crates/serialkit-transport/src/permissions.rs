use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

/// Best-effort: make sure the process can read and write `path`.
///
/// Checks direct access first; if that fails, attempts a `su -c chmod` on
/// rooted systems and re-checks. Returns `false` when access could not be
/// established — callers must refuse to open the device in that case.
pub fn ensure_access(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    if has_read_write_access(path) {
        return true;
    }

    // Reject anything that is not a plain /dev node before handing the
    // string to a shell.
    if !is_valid_device_path(path) {
        warn!(?path, "refusing privilege escalation for invalid device path");
        return false;
    }

    let Some(path_str) = path.to_str() else {
        warn!(?path, "device path is not valid UTF-8");
        return false;
    };

    match Command::new("su")
        .arg("-c")
        .arg(format!("chmod 666 {path_str}"))
        .output()
    {
        Ok(output) if output.status.success() => {
            let granted = has_read_write_access(path);
            if granted {
                debug!(?path, "granted device access via su");
            } else {
                warn!(?path, "chmod succeeded but device is still inaccessible");
            }
            granted
        }
        Ok(output) => {
            warn!(?path, status = ?output.status, "su chmod failed");
            false
        }
        Err(err) => {
            warn!(?path, %err, "unable to run su");
            false
        }
    }
}

#[cfg(unix)]
fn has_read_write_access(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string for the call.
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn has_read_write_access(_path: &Path) -> bool {
    false
}

/// Only paths under `/dev/` built from alphanumerics, underscores and
/// slashes are eligible for escalation; anything else could smuggle shell
/// metacharacters into the chmod command.
fn is_valid_device_path(path: &Path) -> bool {
    let Some(s) = path.to_str() else {
        return false;
    };
    if !s.starts_with("/dev/") || s.contains("..") {
        return false;
    }
    s[5..]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
        && s.len() > 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_device_paths() {
        assert!(is_valid_device_path(Path::new("/dev/ttyUSB0")));
        assert!(is_valid_device_path(Path::new("/dev/tty/serial_1")));
    }

    #[test]
    fn rejects_paths_outside_dev() {
        assert!(!is_valid_device_path(Path::new("/tmp/ttyUSB0")));
        assert!(!is_valid_device_path(Path::new("dev/ttyUSB0")));
    }

    #[test]
    fn rejects_traversal_and_metacharacters() {
        assert!(!is_valid_device_path(Path::new("/dev/../etc/passwd")));
        assert!(!is_valid_device_path(Path::new("/dev/tty; rm -rf /")));
        assert!(!is_valid_device_path(Path::new("/dev/tty$(reboot)")));
        assert!(!is_valid_device_path(Path::new("/dev/")));
    }

    #[test]
    fn readable_writable_file_passes_direct_check() {
        let dir = std::env::temp_dir().join(format!("serialkit-perm-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("node");
        std::fs::write(&file, b"").unwrap();

        assert!(ensure_access(&file));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn inaccessible_invalid_path_is_refused() {
        // Not under /dev and not accessible: must refuse without escalating.
        assert!(!ensure_access("/nonexistent/ttyUSB0"));
    }
}
