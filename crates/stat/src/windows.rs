//! Win32 stat strategies.

use std::io;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use timestamp::{EntryTime, Timestamp};
use windows::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
use windows::Win32::Storage::FileSystem::{
    BY_HANDLE_FILE_INFORMATION, CreateFileW, FILE_FLAG_BACKUP_SEMANTICS, FILE_SHARE_MODE,
    GetFileAttributesExW, GetFileAttributesW, GetFileExInfoStandard, GetFileInformationByHandle,
    INVALID_FILE_ATTRIBUTES, OPEN_EXISTING, WIN32_FILE_ATTRIBUTE_DATA,
};
use windows::core::PCWSTR;

use crate::StatError;

/// The Win32 set of mutually exclusive stat strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatStrategy {
    /// `GetFileAttributesW`. The primitive exposes no timestamps, so the
    /// strategy reports `{nonexistent, nonexistent}` by contract.
    Attributes,
    /// `GetFileAttributesExW` with the standard info level; reports both
    /// timestamps from the FILETIME fields.
    AttributesEx,
    /// `CreateFileW` followed by `GetFileInformationByHandle`; the handle is
    /// closed by an RAII guard on every exit path.
    Handle,
}

impl StatStrategy {
    /// Selector names accepted on the command line, in declaration order.
    pub const NAMES: [&'static str; 3] = ["attrs", "attrs-ex", "handle"];

    /// Resolves a selector name to its strategy.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "attrs" => Some(Self::Attributes),
            "attrs-ex" => Some(Self::AttributesEx),
            "handle" => Some(Self::Handle),
            _ => None,
        }
    }

    /// Selector name of this strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Attributes => "attrs",
            Self::AttributesEx => "attrs-ex",
            Self::Handle => "handle",
        }
    }

    /// Queries the entry's timestamp pair through this strategy's primitive.
    pub fn entry_time(&self, path: &Path) -> Result<EntryTime, StatError> {
        let wide = wide_path(path);
        let name = PCWSTR::from_raw(wide.as_ptr());
        match self {
            Self::Attributes => {
                let attrs = unsafe { GetFileAttributesW(name) };
                if attrs == INVALID_FILE_ATTRIBUTES {
                    return Err(StatError::new(
                        "GetFileAttributesW()",
                        path,
                        io::Error::last_os_error(),
                    ));
                }
                Ok(EntryTime::nonexistent())
            }
            Self::AttributesEx => {
                let mut data = WIN32_FILE_ATTRIBUTE_DATA::default();
                unsafe {
                    GetFileAttributesExW(
                        name,
                        GetFileExInfoStandard,
                        (&raw mut data).cast(),
                    )
                }
                .map_err(|error| {
                    StatError::new("GetFileAttributesExW()", path, to_io_error(error))
                })?;
                Ok(EntryTime::new(
                    from_filetime(&data.ftLastWriteTime),
                    from_filetime(&data.ftLastAccessTime),
                ))
            }
            Self::Handle => {
                // FILE_FLAG_BACKUP_SEMANTICS is required to open a directory.
                let handle = unsafe {
                    CreateFileW(
                        name,
                        0,
                        FILE_SHARE_MODE(0),
                        None,
                        OPEN_EXISTING,
                        FILE_FLAG_BACKUP_SEMANTICS,
                        None,
                    )
                }
                .map_err(|error| StatError::new("CreateFileW()", path, to_io_error(error)))?;
                let handle = OwnedHandle(handle);

                let mut info = BY_HANDLE_FILE_INFORMATION::default();
                unsafe { GetFileInformationByHandle(handle.0, &raw mut info) }.map_err(
                    |error| {
                        StatError::new("GetFileInformationByHandle()", path, to_io_error(error))
                    },
                )?;
                Ok(EntryTime::new(
                    from_filetime(&info.ftLastWriteTime),
                    from_filetime(&info.ftLastAccessTime),
                ))
            }
        }
    }
}

/// Closes the wrapped handle exactly once, also on error paths.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

fn wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str().encode_wide().chain(once(0)).collect()
}

fn from_filetime(ft: &FILETIME) -> Timestamp {
    Timestamp::from_native_ticks(ft.dwHighDateTime, ft.dwLowDateTime)
}

fn to_io_error(error: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(error.code().0 & 0xFFFF)
}
