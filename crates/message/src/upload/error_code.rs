use std::fmt;

use crate::error::UploadedFileError;

/// Status of a file upload, as reported by whatever received the multipart body.
///
/// The numeric codes are fixed; `5` is deliberately not a code.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum UploadError {
    /// The upload succeeded.
    #[default]
    Ok,
    /// The file exceeds the server-wide size limit.
    IniSize,
    /// The file exceeds the size limit declared by the form.
    FormSize,
    /// The file was only partially uploaded.
    Partial,
    /// No file was uploaded.
    NoFile,
    /// There was no temporary directory to receive the file.
    NoTmpDir,
    /// The file could not be written to disk.
    CantWrite,
    /// An extension stopped the upload.
    Extension,
}

impl UploadError {
    pub fn code(self) -> i64 {
        match self {
            UploadError::Ok => 0,
            UploadError::IniSize => 1,
            UploadError::FormSize => 2,
            UploadError::Partial => 3,
            UploadError::NoFile => 4,
            UploadError::NoTmpDir => 6,
            UploadError::CantWrite => 7,
            UploadError::Extension => 8,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, UploadedFileError> {
        match code {
            0 => Ok(UploadError::Ok),
            1 => Ok(UploadError::IniSize),
            2 => Ok(UploadError::FormSize),
            3 => Ok(UploadError::Partial),
            4 => Ok(UploadError::NoFile),
            6 => Ok(UploadError::NoTmpDir),
            7 => Ok(UploadError::CantWrite),
            8 => Ok(UploadError::Extension),
            code => Err(UploadedFileError::InvalidErrorCode { code }),
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, UploadError::Ok)
    }

    pub fn message(self) -> &'static str {
        match self {
            UploadError::Ok => "there is no error, the file uploaded with success",
            UploadError::IniSize => "the uploaded file exceeds the maximum upload size",
            UploadError::FormSize => "the uploaded file exceeds the maximum size specified by the form",
            UploadError::Partial => "the uploaded file was only partially uploaded",
            UploadError::NoFile => "no file was uploaded",
            UploadError::NoTmpDir => "missing a temporary folder",
            UploadError::CantWrite => "failed to write file to disk",
            UploadError::Extension => "a server extension stopped the file upload",
        }
    }
}

impl TryFrom<i64> for UploadError {
    type Error = UploadedFileError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_codes() {
        for code in [0, 1, 2, 3, 4, 6, 7, 8] {
            assert_eq!(UploadError::from_code(code).unwrap().code(), code);
        }
        assert_eq!(UploadError::try_from(7).unwrap(), UploadError::CantWrite);
        assert!(UploadError::default().is_ok());
    }

    #[test]
    fn test_unknown_codes() {
        for code in [-1, 5, 9, 100] {
            let err = UploadError::from_code(code).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }
}
