//! Top-level error and process exit codes.
//!
//! Every fatal condition maps to a fixed exit code so that scripts and tests
//! can tell failures apart:
//!
//! | Code | Condition |
//! |---|---|
//! | 1 | file not found |
//! | 2 | directory not found |
//! | 3 | no date in post |
//! | 4 | posts are not ordered |
//! | 6 | no media directory |
//! | 8 | missing or incorrect config value |
//! | 9 | error writing config |
//! | 10 | error reading config |
//! | 11 | incorrect date format |
//! | 12 | missing external tool |
//! | 13 | other I/O or thumbnail failure |

use crate::config::ConfigError;
use crate::dating::DatingError;
use crate::diary::DiaryError;
use crate::export::ExportError;
use crate::gallery::GalleryError;
use crate::imaging::BackendError;
use crate::index::IndexError;
use crate::naming::NamingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Diary(#[from] DiaryError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const OTHER: u8 = 13;

fn config_code(e: &ConfigError) -> u8 {
    match e {
        ConfigError::Validation(_) => 8,
        ConfigError::Write { .. } | ConfigError::Serialize(_) => 9,
        ConfigError::Read { .. } | ConfigError::Toml(_) => 10,
    }
}

fn diary_code(e: &DiaryError) -> u8 {
    match e {
        DiaryError::FileNotFound(_) => 1,
        DiaryError::NoDateInPost { .. } => 3,
        DiaryError::IncorrectDateFormat(_) => 11,
        DiaryError::Io(_) => OTHER,
    }
}

fn dating_code(e: &DatingError) -> u8 {
    match e {
        DatingError::OrderingViolation { .. } => 4,
        DatingError::Undated { .. } => 3,
    }
}

fn naming_code(e: &NamingError) -> u8 {
    match e {
        NamingError::UndatedPost { .. } => 3,
    }
}

fn backend_code(e: &BackendError) -> u8 {
    match e {
        BackendError::MissingTool(_) => 12,
        BackendError::Io(_) | BackendError::ProcessingFailed(_) => OTHER,
    }
}

impl Error {
    /// Process exit code of this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Gallery(e) => match e {
                GalleryError::DirectoryNotFound(_) => 2,
                GalleryError::MissingSourceDir => 6,
                GalleryError::Diary(e) => diary_code(e),
                GalleryError::Dating(e) => dating_code(e),
                GalleryError::Naming(e) => naming_code(e),
                GalleryError::Index(IndexError::IncorrectDateFormat(_)) => 11,
                GalleryError::Config(e) => config_code(e),
                GalleryError::Thumbnail(e) => backend_code(e),
                GalleryError::Io(_) => OTHER,
            },
            Error::Export(e) => match e {
                ExportError::DirectoryNotFound(_) => 2,
                ExportError::Dating(e) => dating_code(e),
                ExportError::Naming(e) => naming_code(e),
                ExportError::Diary(e) => diary_code(e),
                ExportError::Io(_) | ExportError::Json { .. } => OTHER,
            },
            Error::Config(e) => config_code(e),
            Error::Diary(e) => diary_code(e),
            Error::Index(IndexError::IncorrectDateFormat(_)) => 11,
            Error::Backend(e) => backend_code(e),
            Error::Io(_) => OTHER,
        }
    }
}
