use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

/// Error from LAPACK
#[derive(Error, Debug)]
pub enum Error {
    /// An argument passed to a LAPACK subroutine was invalid.
    /// This means a bug in the wrapper, not in caller code.
    #[error("Invalid value for LAPACK argument #{}", -return_code)]
    LapackInvalidValue { return_code: i32 },

    /// The computation itself failed, e.g. a zero pivot in `dgetrf` or a
    /// non-converged SVD. `return_code` is LAPACK's positive `info`.
    #[error("Computational failure in LAPACK subroutine: return_code = {}", return_code)]
    LapackComputationalFailure { return_code: i32 },

    /// The buffer length does not match the layout it was passed with.
    #[error("Invalid shape of input array")]
    InvalidShape,
}

pub trait AsLapackResult {
    fn as_lapack_result(self) -> Result<()>;
}

impl AsLapackResult for i32 {
    fn as_lapack_result(self) -> Result<()> {
        if self > 0 {
            return Err(Error::LapackComputationalFailure { return_code: self });
        }
        if self < 0 {
            return Err(Error::LapackInvalidValue { return_code: self });
        }
        Ok(())
    }
}
