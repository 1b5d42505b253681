//! Filesystem moves that never drop data.

use std::io;
use std::path::Path;

/// Move `src` to `dst`, creating `dst`'s parent directories.
///
/// Tries a rename first. When that fails (e.g. across filesystems) the tree
/// is copied, and `src` is only removed once the copy is complete. A failed
/// copy leaves `src` untouched.
pub fn move_path(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                source = %src.display(),
                destination = %dst.display(),
                error = %rename_err,
                "rename failed, copying instead"
            );
            if let Err(copy_err) = copy_recursive(src, dst) {
                let _ = remove_path(dst);
                return Err(copy_err);
            }
            remove_path(src)
        }
    }
}

/// Copy a file, symlink, or directory tree. Symlinks are copied as links.
pub fn copy_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(src)?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        let dest = std::fs::read_link(src)?;
        copy_symlink(&dest, dst)
    } else if file_type.is_dir() {
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        std::fs::set_permissions(dst, meta.permissions())
    } else {
        std::fs::copy(src, dst).map(|_| ())
    }
}

/// Remove a file, symlink, or directory tree.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Whether anything (including a dangling symlink) occupies `path`.
pub fn is_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(unix)]
fn copy_symlink(dest: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(dest, link)
}

#[cfg(windows)]
fn copy_symlink(dest: &Path, link: &Path) -> io::Result<()> {
    if dest.is_dir() {
        std::os::windows::fs::symlink_dir(dest, link)
    } else {
        std::os::windows::fs::symlink_file(dest, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn move_creates_parents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, "aaa").unwrap();
        let dst = temp.path().join("deep/nested/a.txt");

        move_path(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "aaa");
    }

    #[test]
    fn copy_recursive_copies_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"aaa").unwrap();
        fs::write(src.join("sub/b.txt"), b"bbb").unwrap();

        let dst = temp.path().join("out");
        copy_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"aaa");
        assert_eq!(fs::read(dst.join("sub/b.txt")).unwrap(), b"bbb");
        assert!(src.join("a.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_recursive_keeps_symlinks_as_links() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink("/nowhere/at/all", &link).unwrap();

        let dst = temp.path().join("copy");
        copy_recursive(&link, &dst).unwrap();

        assert_eq!(
            fs::read_link(&dst).unwrap(),
            Path::new("/nowhere/at/all").to_path_buf()
        );
    }

    #[cfg(unix)]
    #[test]
    fn is_occupied_sees_dangling_symlink() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("dangling");
        std::os::unix::fs::symlink(temp.path().join("missing"), &link).unwrap();

        assert!(!link.exists());
        assert!(is_occupied(&link));
    }

    #[test]
    fn remove_path_handles_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir_all(dir.join("x")).unwrap();

        remove_path(&dir).unwrap();

        assert!(!is_occupied(&dir));
    }
}
