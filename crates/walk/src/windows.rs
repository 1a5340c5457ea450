//! Win32 enumeration strategies.

use std::ffi::OsString;
use std::io;
use std::iter::once;
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

use timestamp::{EntryTime, Timestamp};
use windows::Win32::Foundation::{ERROR_NO_MORE_FILES, HANDLE};
use windows::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_REPARSE_POINT, FIND_FIRST_EX_FLAGS, FindClose,
    FindExInfoBasic, FindExSearchNameMatch, FindFirstFileExW, FindFirstFileW, FindNextFileW,
    WIN32_FIND_DATAW,
};
use windows::core::PCWSTR;

use crate::{Entry, EntryKind, Visitor, WalkError};

/// The Win32 set of mutually exclusive enumeration strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStrategy {
    /// `FindFirstFileW`/`FindNextFileW` with the standard info level.
    Find,
    /// `FindFirstFileExW` with `FindExInfoBasic`, which skips the 8.3 short
    /// name lookup.
    FindBasic,
}

impl WalkStrategy {
    /// Selector names accepted on the command line, in declaration order.
    pub const NAMES: [&'static str; 2] = ["find", "find-basic"];

    /// Resolves a selector name to its strategy.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "find" => Some(Self::Find),
            "find-basic" => Some(Self::FindBasic),
            _ => None,
        }
    }

    /// Selector name of this strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::FindBasic => "find-basic",
        }
    }

    /// Recursively enumerates `root`, surfacing every entry to `visitor` in
    /// depth-first order.
    pub fn walk(&self, root: &Path, visitor: &mut dyn Visitor) -> Result<(), WalkError> {
        let pattern: Vec<u16> = root
            .join("*")
            .as_os_str()
            .encode_wide()
            .chain(once(0))
            .collect();
        let name = PCWSTR::from_raw(pattern.as_ptr());

        let mut data = WIN32_FIND_DATAW::default();
        let handle = match self {
            Self::Find => unsafe { FindFirstFileW(name, &raw mut data) },
            Self::FindBasic => unsafe {
                FindFirstFileExW(
                    name,
                    FindExInfoBasic,
                    (&raw mut data).cast(),
                    FindExSearchNameMatch,
                    None,
                    FIND_FIRST_EX_FLAGS(0),
                )
            },
        }
        .map_err(|error| WalkError::open_dir(root.to_path_buf(), to_io_error(&error)))?;
        let handle = SearchHandle(handle);

        loop {
            let file_name = file_name(&data);
            if file_name != "." && file_name != ".." {
                let kind = entry_kind(&data);
                let times = if kind == EntryKind::Other {
                    None
                } else {
                    Some(EntryTime::new(
                        Timestamp::from_native_ticks(
                            data.ftLastWriteTime.dwHighDateTime,
                            data.ftLastWriteTime.dwLowDateTime,
                        ),
                        Timestamp::from_native_ticks(
                            data.ftLastAccessTime.dwHighDateTime,
                            data.ftLastAccessTime.dwLowDateTime,
                        ),
                    ))
                };
                let entry = Entry {
                    path: root.join(&file_name),
                    kind,
                    times,
                };
                visitor.entry(&entry)?;
                if entry.kind.is_dir() {
                    self.walk(&entry.path, visitor)?;
                }
            }

            if let Err(error) = unsafe { FindNextFileW(handle.0, &raw mut data) } {
                if error.code() == ERROR_NO_MORE_FILES.to_hresult() {
                    break;
                }
                return Err(WalkError::read_entry(
                    root.to_path_buf(),
                    to_io_error(&error),
                ));
            }
        }
        Ok(())
    }
}

/// Closes the wrapped search handle exactly once, also on error paths.
struct SearchHandle(HANDLE);

impl Drop for SearchHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = FindClose(self.0);
        }
    }
}

fn file_name(data: &WIN32_FIND_DATAW) -> OsString {
    let len = data
        .cFileName
        .iter()
        .position(|&u| u == 0)
        .unwrap_or(data.cFileName.len());
    OsString::from_wide(&data.cFileName[..len])
}

fn entry_kind(data: &WIN32_FIND_DATAW) -> EntryKind {
    if data.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT.0 != 0 {
        EntryKind::Other
    } else if data.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY.0 != 0 {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn to_io_error(error: &windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(error.code().0 & 0xFFFF)
}
