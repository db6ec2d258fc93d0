//! Sparse connectivity input in Matrix Market format.

use nalgebra_sparse::io::{load_coo_from_matrix_market_file, load_coo_from_matrix_market_str};
use nalgebra_sparse::CsrMatrix;
use std::path::Path;
use tracing::debug;

use crate::{EngineError, Result};

/// Load a weight matrix from a Matrix Market file.
///
/// Rows index pre-synaptic neurons, columns post-synaptic neurons.
/// Duplicate entries are summed.
pub fn load_matrix_market<P: AsRef<Path>>(path: P) -> Result<CsrMatrix<f64>> {
    let path = path.as_ref();
    let coo = load_coo_from_matrix_market_file::<f64, _>(path).map_err(|e| {
        EngineError::MatrixMarket {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    let csr = CsrMatrix::from(&coo);
    debug!(
        path = %path.display(),
        rows = csr.nrows(),
        cols = csr.ncols(),
        nnz = csr.nnz(),
        "loaded sparse matrix"
    );
    Ok(csr)
}

/// Parse a weight matrix from Matrix Market text
pub fn parse_matrix_market(data: &str) -> Result<CsrMatrix<f64>> {
    let coo = load_coo_from_matrix_market_str::<f64>(data).map_err(|e| EngineError::MatrixMarket {
        path: "<memory>".to_string(),
        message: e.to_string(),
    })?;
    Ok(CsrMatrix::from(&coo))
}
