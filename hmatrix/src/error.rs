use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

/// Numerical failure surfaced to the caller of a driver.
///
/// Contract violations — shape mismatches, undefined dispatch triples —
/// are panics, not errors: they indicate caller bugs and abort with a
/// diagnostic naming the variants and dimensions involved.
#[derive(Error, Debug)]
pub enum Error {
    /// A LAPACK routine on a dense leaf reported `info != 0`. Typical
    /// recovery is retrying with a larger rank or a different
    /// admissibility.
    #[error(transparent)]
    Lapack(#[from] hlax::Error),
}
